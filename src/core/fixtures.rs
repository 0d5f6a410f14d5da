//! Shared test fixtures.

use super::types::{EnvironmentConfig, EnvironmentSpec};
use std::path::{Path, PathBuf};

/// A complete, deploy-flagged record whose names derive from `env`.
pub fn spec(env: &str) -> EnvironmentSpec {
    EnvironmentSpec {
        environment_type: Some(env.to_string()),
        stack_name: Some(format!("site-{}", env)),
        branch: Some(if env == "prod" { "main" } else { "develop" }.to_string()),
        bucket_name: Some(format!("site-{}-web", env)),
        pipeline_name: Some(format!("site-{}-pipeline", env)),
        pipeline_bucket: Some(format!("site-{}-artifacts", env)),
        public_access: false,
        index_file: Some("index.html".to_string()),
        error_file: Some("index.html".to_string()),
        github_repo_owner: Some("acme".to_string()),
        github_repo_name: Some("site".to_string()),
        github_access_token_ref: Some("github-token".to_string()),
        is_deploy: true,
        description: None,
        env_file: None,
        fallback_status_404: None,
        fallback_status_403: None,
    }
}

/// Validated config for `spec(env)`.
pub fn env_config(env: &str) -> EnvironmentConfig {
    spec(env).to_builder().build().expect("fixture spec is complete")
}

/// Write a dotenv file under `dir` and return its path.
pub fn write_env_file(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join(".env");
    std::fs::write(&path, contents).expect("write env file");
    path
}
