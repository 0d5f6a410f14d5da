//! CodeBuild buildspec for the site build.
//!
//! install → build → post_build (CDN invalidation), artifacts `dist/**/*`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const BUILDSPEC_VERSION: &str = "0.2";
pub const ARTIFACT_BASE_DIRECTORY: &str = "dist";
pub const ARTIFACT_FILES: &str = "**/*";
pub const INVALIDATION_PATHS: &str = "/*";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSpec {
    pub version: String,
    pub phases: Phases,
    pub artifacts: Artifacts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phases {
    pub install: Phase,
    pub build: Phase,
    pub post_build: Phase,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    #[serde(
        rename = "runtime-versions",
        default,
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub runtime_versions: IndexMap<String, String>,
    pub commands: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifacts {
    #[serde(rename = "base-directory")]
    pub base_directory: String,
    pub files: Vec<String>,
}

impl BuildSpec {
    /// Buildspec for an npm-built static site.
    ///
    /// `distribution_id` is spliced verbatim into the invalidation command;
    /// pass a `${LogicalId}` placeholder when the result goes through `Fn::Sub`.
    pub fn static_site(distribution_id: &str) -> Self {
        Self {
            version: BUILDSPEC_VERSION.to_string(),
            phases: Phases {
                install: Phase {
                    runtime_versions: IndexMap::from([(
                        "nodejs".to_string(),
                        "latest".to_string(),
                    )]),
                    commands: vec![
                        "echo \"installing npm dependencies\"".to_string(),
                        "npm install".to_string(),
                    ],
                },
                build: Phase {
                    runtime_versions: IndexMap::new(),
                    commands: vec![
                        "echo \"building app\"".to_string(),
                        "npm run build".to_string(),
                    ],
                },
                post_build: Phase {
                    runtime_versions: IndexMap::new(),
                    commands: vec![
                        "echo \"creating cloudfront invalidation\"".to_string(),
                        invalidation_command(distribution_id),
                    ],
                },
            },
            artifacts: Artifacts {
                base_directory: ARTIFACT_BASE_DIRECTORY.to_string(),
                files: vec![ARTIFACT_FILES.to_string()],
            },
        }
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml_ng::Error> {
        serde_yaml_ng::to_string(self)
    }
}

/// `aws cloudfront create-invalidation` for every path.
pub fn invalidation_command(distribution_id: &str) -> String {
    format!(
        "aws cloudfront create-invalidation --distribution-id {} --paths '{}'",
        distribution_id, INVALIDATION_PATHS
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order_and_commands() {
        let spec = BuildSpec::static_site("${Distribution}");
        assert_eq!(spec.version, "0.2");
        assert_eq!(spec.phases.install.commands.last().unwrap(), "npm install");
        assert_eq!(spec.phases.build.commands.last().unwrap(), "npm run build");
        assert_eq!(
            spec.phases.post_build.commands.last().unwrap(),
            "aws cloudfront create-invalidation --distribution-id ${Distribution} --paths '/*'"
        );
    }

    #[test]
    fn test_yaml_shape() {
        let yaml = BuildSpec::static_site("E123").to_yaml().unwrap();
        let value: serde_yaml_ng::Value = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(value["version"].as_str(), Some("0.2"));
        assert_eq!(
            value["phases"]["install"]["runtime-versions"]["nodejs"].as_str(),
            Some("latest")
        );
        assert!(value["phases"]["build"].get("runtime-versions").is_none());
        assert_eq!(value["artifacts"]["base-directory"].as_str(), Some("dist"));
        assert_eq!(value["artifacts"]["files"][0].as_str(), Some("**/*"));

        let phases: Vec<_> = value["phases"]
            .as_mapping()
            .unwrap()
            .keys()
            .filter_map(|k| k.as_str())
            .collect();
        assert_eq!(phases, vec!["install", "build", "post_build"]);
    }

    #[test]
    fn test_yaml_roundtrip_keeps_command() {
        let spec = BuildSpec::static_site("E123");
        let back: BuildSpec = serde_yaml_ng::from_str(&spec.to_yaml().unwrap()).unwrap();
        assert_eq!(back, spec);
    }
}
