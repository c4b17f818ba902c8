//! API request and response types
//!
//! Wire shapes of the login, recipe, dataset job and dataset instance APIs.
//! Fields the loader never reads are left out; missing optional fields
//! default rather than failing the whole parse.

use serde::{Deserialize, Serialize};

/// Body of the login request
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// One page of a listing endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,

    /// Number of items across all pages; absent on unpaginated endpoints
    #[serde(default)]
    pub total_count: Option<u64>,
}

// ============================================================================
// Recipes
// ============================================================================

/// A recipe as listed by the recipe API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeItem {
    pub id: String,

    #[serde(default)]
    pub alias: Option<String>,

    #[serde(default)]
    pub format: Option<String>,

    #[serde(default)]
    pub files: Vec<RecipeFile>,

    #[serde(default)]
    pub output_instances: Vec<OutputInstance>,
}

impl RecipeItem {
    /// Dataset id of the first declared output instance
    pub fn output_dataset_id(&self) -> Option<&str> {
        self.output_instances.first().and_then(|o| o.dataset_id.as_deref())
    }

    /// Alias name jobs must use for their file, taken from the first recipe file
    pub fn file_alias(&self) -> Option<&str> {
        self.files.first().and_then(|f| f.description.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeFile {
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputInstance {
    #[serde(default)]
    pub dataset_id: Option<String>,

    #[serde(default)]
    pub editions: Vec<String>,

    #[serde(default)]
    pub title: Option<String>,
}

// ============================================================================
// Jobs
// ============================================================================

/// Job lifecycle states as reported by the jobs API
///
/// This client only ever moves a job from `Created` to `Submitted`; anything
/// the import process sets afterwards is reported as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Created,
    Submitted,
    #[serde(other)]
    Other,
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JobState::Created => "created",
            JobState::Submitted => "submitted",
            JobState::Other => "other",
        };
        f.write_str(name)
    }
}

/// A file reference attached to a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFile {
    pub alias_name: String,
    pub url: String,
}

/// Body of the create-job request
#[derive(Debug, Serialize)]
pub struct NewJob {
    pub recipe: String,
    pub state: JobState,
    pub links: serde_json::Map<String, serde_json::Value>,
    pub files: Vec<JobFile>,
}

/// Body of the state-transition request
#[derive(Debug, Serialize)]
pub struct JobStateUpdate {
    pub state: JobState,
}

/// A job as returned by the listing and lookup endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct JobDocument {
    pub id: String,

    #[serde(default)]
    pub recipe: String,

    #[serde(default)]
    pub state: Option<JobState>,

    #[serde(default)]
    pub links: JobLinks,

    #[serde(default)]
    pub files: Vec<JobFile>,
}

impl JobDocument {
    /// Id of the first dataset instance linked to this job
    pub fn instance_id(&self) -> Option<&str> {
        self.links.instances.first().and_then(|l| l.id.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobLinks {
    #[serde(default)]
    pub instances: Vec<Link>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub href: Option<String>,
}

// ============================================================================
// Instances
// ============================================================================

/// A dataset instance created by the import process
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceDocument {
    pub id: String,

    #[serde(default)]
    pub state: Option<String>,

    #[serde(default)]
    pub total_observations: Option<u64>,

    #[serde(default)]
    pub total_inserted_observations: Option<u64>,
}
