//! Login credentials and the access token they are exchanged for
//!
//! Both secrets are held in `SecretString`, so neither can leak through
//! `Debug` formatting or a stray `tracing` field.

use crate::error::{CliError, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::Path;

/// Environment variable holding the login identity (an email address).
pub const USERNAME_ENV: &str = "FLORENCE_USERNAME";

/// Environment variable holding the login secret.
pub const PASSWORD_ENV: &str = "FLORENCE_PASSWORD";

/// Identity and secret used once per run to obtain an access token
pub struct Credentials {
    identity: String,
    secret: SecretString,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("identity", &self.identity)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Shape of a credentials file
#[derive(Deserialize)]
struct CredentialsFile {
    email: String,
    password: String,
}

impl Credentials {
    pub fn new(identity: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            secret: SecretString::from(secret.into()),
        }
    }

    /// Read `FLORENCE_USERNAME` and `FLORENCE_PASSWORD`
    pub fn from_env() -> Result<Self> {
        let identity = non_empty_env(USERNAME_ENV);
        let secret = non_empty_env(PASSWORD_ENV);

        match (identity, secret) {
            (Some(identity), Some(secret)) => Ok(Self::new(identity, secret)),
            _ => Err(CliError::credentials(format!(
                "a username and password are required; export {} and {} or pass --credentials <file>",
                USERNAME_ENV, PASSWORD_ENV
            ))),
        }
    }

    /// Read a JSON file of the form `{"email": "...", "password": "..."}`
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CliError::credentials(format!("cannot read '{}': {}", path.display(), e))
        })?;
        let file: CredentialsFile = serde_json::from_str(&raw).map_err(|e| {
            CliError::credentials(format!(
                "'{}' must contain \"email\" and \"password\" fields ({})",
                path.display(),
                e
            ))
        })?;

        Ok(Self::new(file.email, file.password))
    }

    /// Use the file when one is given, otherwise the environment
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::from_env(),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub(crate) fn secret(&self) -> &str {
        self.secret.expose_secret()
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Bearer token sent as `X-Florence-Token` on every authenticated call
///
/// Obtained once per run; there is no refresh.
#[derive(Clone)]
pub struct AccessToken(SecretString);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    pub(crate) fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_debug_never_shows_secret() {
        let creds = Credentials::new("publisher@example.com", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("publisher@example.com"));
        assert!(!debug.contains("hunter2"));

        let token = AccessToken::new("abc123");
        assert!(!format!("{:?}", token).contains("abc123"));
        assert_eq!(token.expose(), "abc123");
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"email": "publisher@example.com", "password": "pw"}}"#).unwrap();

        let creds = Credentials::from_file(file.path()).unwrap();
        assert_eq!(creds.identity(), "publisher@example.com");
        assert_eq!(creds.secret(), "pw");
    }

    #[test]
    fn test_from_file_missing_fields() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"email": "publisher@example.com"}}"#).unwrap();

        let err = Credentials::from_file(file.path()).unwrap_err();
        assert!(matches!(err, CliError::Credentials(_)));
        assert!(!err.to_string().contains("pw"));
    }

    #[test]
    #[serial]
    fn test_from_env_requires_both() {
        std::env::set_var(USERNAME_ENV, "publisher@example.com");
        std::env::remove_var(PASSWORD_ENV);
        assert!(Credentials::from_env().is_err());

        std::env::set_var(PASSWORD_ENV, "pw");
        let creds = Credentials::from_env().unwrap();
        assert_eq!(creds.identity(), "publisher@example.com");

        std::env::remove_var(USERNAME_ENV);
        std::env::remove_var(PASSWORD_ENV);
    }
}
