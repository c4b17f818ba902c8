//! API endpoint URL builders
//!
//! Every endpoint is the API root with a well-known suffix appended.

/// Build login URL
pub fn login_url(api_root: &str) -> String {
    format!("{}/zebedee/login", api_root)
}

/// Build recipe catalog URL
pub fn recipes_url(api_root: &str) -> String {
    format!("{}/recipes", api_root)
}

/// Build single recipe URL
pub fn recipe_url(api_root: &str, recipe_id: &str) -> String {
    format!("{}/recipes/{}", api_root, recipe_id)
}

/// Build chunk upload URL
pub fn upload_url(api_root: &str) -> String {
    format!("{}/upload", api_root)
}

/// Build dataset instances listing URL
pub fn instances_url(api_root: &str) -> String {
    format!("{}/dataset/instances", api_root)
}

/// Build single dataset instance URL
pub fn instance_url(api_root: &str, instance_id: &str) -> String {
    format!("{}/dataset/instances/{}", api_root, instance_id)
}

/// Build dataset jobs URL
pub fn jobs_url(api_root: &str) -> String {
    format!("{}/dataset/jobs", api_root)
}

/// Build single dataset job URL
pub fn job_url(api_root: &str, job_id: &str) -> String {
    format!("{}/dataset/jobs/{}", api_root, job_id)
}

/// Build the URL an assembled upload is addressable at
pub fn storage_locator_url(bucket_url: &str, resumable_identifier: &str) -> String {
    format!("{}/{}", bucket_url, resumable_identifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "https://publishing.example.com";

    #[test]
    fn test_fixed_endpoints() {
        assert_eq!(login_url(ROOT), "https://publishing.example.com/zebedee/login");
        assert_eq!(recipes_url(ROOT), "https://publishing.example.com/recipes");
        assert_eq!(upload_url(ROOT), "https://publishing.example.com/upload");
        assert_eq!(instances_url(ROOT), "https://publishing.example.com/dataset/instances");
        assert_eq!(jobs_url(ROOT), "https://publishing.example.com/dataset/jobs");
    }

    #[test]
    fn test_id_endpoints() {
        assert_eq!(
            job_url(ROOT, "b1f2"),
            "https://publishing.example.com/dataset/jobs/b1f2"
        );
        assert_eq!(
            recipe_url(ROOT, "r-9"),
            "https://publishing.example.com/recipes/r-9"
        );
        assert_eq!(
            instance_url(ROOT, "i-1"),
            "https://publishing.example.com/dataset/instances/i-1"
        );
    }

    #[test]
    fn test_storage_locator_url() {
        assert_eq!(
            storage_locator_url("https://bucket.example.com/uploads", "010124093000-v4csv"),
            "https://bucket.example.com/uploads/010124093000-v4csv"
        );
    }
}
