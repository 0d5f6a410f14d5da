//! Built-in dev/prod environment list, used to scaffold new projects.
//!
//! dev is flagged for deploy and tracks `develop`; prod is present but inert
//! and tracks `main`.

use super::types::{AppConfig, EnvironmentSpec};

/// Secret name the scaffolded config points at for the GitHub token.
pub const DEFAULT_TOKEN_SECRET: &str = "github-access-token";

/// Starter dotenv content written next to a scaffolded config.
pub const DEFAULT_ENV_CONTENTS: &str = "# Build-time variables, passed to every build stage as PLAINTEXT.\nVITE_APP_TITLE=my-site\n";

/// One environment record named after `app` and `environment_type`.
pub fn environment(app: &str, environment_type: &str, branch: &str, is_deploy: bool) -> EnvironmentSpec {
    let prefix = format!("{}-{}", app, environment_type);
    EnvironmentSpec {
        environment_type: Some(environment_type.to_string()),
        stack_name: Some(prefix.clone()),
        branch: Some(branch.to_string()),
        bucket_name: Some(format!("{}-web", prefix)),
        pipeline_name: Some(format!("{}-pipeline", prefix)),
        pipeline_bucket: Some(format!("{}-artifacts", prefix)),
        public_access: false,
        index_file: Some("index.html".to_string()),
        error_file: Some("index.html".to_string()),
        github_repo_owner: Some("my-org".to_string()),
        github_repo_name: Some(app.to_string()),
        github_access_token_ref: Some(DEFAULT_TOKEN_SECRET.to_string()),
        is_deploy,
        ..EnvironmentSpec::default()
    }
}

/// The default environment list: dev (deployed) then prod (inert).
pub fn default_environments(app: &str) -> Vec<EnvironmentSpec> {
    vec![
        environment(app, "dev", "develop", true),
        environment(app, "prod", "main", false),
    ]
}

/// A complete starter configuration for `app`.
pub fn default_app(app: &str) -> AppConfig {
    AppConfig {
        version: "1.0".to_string(),
        name: app.to_string(),
        description: Some(format!("Static site infrastructure for {}", app)),
        env_file: None,
        environments: default_environments(app),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::{parse_config, validate_config};
    use crate::core::selector::select;

    #[test]
    fn test_default_order_and_flags() {
        let envs = default_environments("shop");
        let types: Vec<_> = envs
            .iter()
            .map(|e| e.environment_type.as_deref().unwrap())
            .collect();
        assert_eq!(types, vec!["dev", "prod"]);
        assert!(envs[0].is_deploy);
        assert!(!envs[1].is_deploy);
        assert_eq!(envs[1].branch.as_deref(), Some("main"));
    }

    #[test]
    fn test_default_app_is_valid() {
        let app = default_app("shop");
        assert!(validate_config(&app).is_empty());
        let selected = select(&app.environments).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].stack_name, "shop-dev");
    }

    #[test]
    fn test_default_app_survives_yaml() {
        let yaml = serde_yaml_ng::to_string(&default_app("shop")).unwrap();
        let parsed = parse_config(&yaml).unwrap();
        assert_eq!(parsed.environments, default_environments("shop"));
    }

    #[test]
    fn test_env_contents_parse() {
        let vars = crate::core::envfile::parse_env(
            DEFAULT_ENV_CONTENTS.as_bytes(),
            std::path::Path::new(".env"),
        )
        .unwrap();
        assert_eq!(vars.len(), 1);
    }
}
