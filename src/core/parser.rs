//! YAML parsing and validation of sitestack.yaml.
//!
//! Structural checks:
//! - Version must be "1.0"
//! - Name must not be empty
//! - Every deploy-flagged environment must be complete and well-named
//! - Deploy-flagged environments must not share stack, bucket or pipeline names

use super::selector;
use super::types::AppConfig;
use crate::error::{Result, SynthError};
use std::path::Path;

/// Validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Parse a sitestack.yaml file from disk.
pub fn parse_config_file(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SynthError::io(path, e))?;
    parse_config(&content)
}

/// Parse a sitestack.yaml from a string.
pub fn parse_config(yaml: &str) -> Result<AppConfig> {
    Ok(serde_yaml_ng::from_str(yaml)?)
}

/// Validate a parsed config. Returns a list of errors (empty = valid).
pub fn validate_config(config: &AppConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.version != "1.0" {
        errors.push(ValidationError::new(format!(
            "version must be \"1.0\", got \"{}\"",
            config.version
        )));
    }

    if config.name.trim().is_empty() {
        errors.push(ValidationError::new("name must not be empty"));
    }

    match selector::select_deployable(&config.environments) {
        Ok(selected) => errors.extend(selector::check_collisions(&selected)),
        Err(SynthError::Invalid(env_errors)) => errors.extend(env_errors),
        Err(other) => errors.push(ValidationError::new(other.to_string())),
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
version: "1.0"
name: site
environments:
  - environment_type: dev
    stack_name: site-dev
    branch: develop
    bucket_name: site-dev-web
    pipeline_name: site-dev-pipeline
    pipeline_bucket: site-dev-artifacts
    index_file: index.html
    error_file: index.html
    github_repo_owner: acme
    github_repo_name: site
    github_access_token_ref: github-token
    is_deploy: true
  - environment_type: prod
    is_deploy: false
"#;

    #[test]
    fn test_parse_valid() {
        let config = parse_config(VALID).unwrap();
        assert_eq!(config.name, "site");
        assert_eq!(config.environments.len(), 2);
        let errors = validate_config(&config);
        assert!(
            errors.is_empty(),
            "unexpected errors: {:?}",
            errors.iter().map(|e| &e.message).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_inert_environment_may_be_incomplete() {
        let config = parse_config(VALID).unwrap();
        assert!(config.environments[1].bucket_name.is_none());
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn test_bad_version() {
        let yaml = r#"
version: "2.0"
name: site
environments: []
"#;
        let config = parse_config(yaml).unwrap();
        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| e.message.contains("version")));
    }

    #[test]
    fn test_empty_name() {
        let yaml = r#"
version: "1.0"
name: ""
"#;
        let config = parse_config(yaml).unwrap();
        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| e.message.contains("name must not be empty")));
    }

    #[test]
    fn test_incomplete_deploy_environment() {
        let yaml = r#"
version: "1.0"
name: site
environments:
  - environment_type: dev
    stack_name: site-dev
    is_deploy: true
"#;
        let config = parse_config(yaml).unwrap();
        let errors = validate_config(&config);
        assert!(errors
            .iter()
            .any(|e| e.message == "environment 'site-dev': bucket_name must not be empty"));
    }

    #[test]
    fn test_collision_reported() {
        let mut config = parse_config(VALID).unwrap();
        let mut twin = config.environments[0].clone();
        twin.stack_name = Some("site-dev-2".to_string());
        twin.pipeline_bucket = Some("site-dev-artifacts-2".to_string());
        twin.pipeline_name = Some("site-dev-pipeline-2".to_string());
        config.environments.push(twin);
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("site-dev-web"));
    }

    #[test]
    fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitestack.yaml");
        std::fs::write(&path, VALID).unwrap();
        let config = parse_config_file(&path).unwrap();
        assert_eq!(config.name, "site");
    }

    #[test]
    fn test_parse_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_config_file(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, SynthError::Io { .. }));
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let result = parse_config("not: [valid: yaml: {{");
        assert!(matches!(result, Err(SynthError::Yaml(_))));
    }
}
