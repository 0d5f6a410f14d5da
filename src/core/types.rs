//! Configuration schema, validated environment records, manifest and plan types.
//!
//! `AppConfig` / `EnvironmentSpec` mirror `sitestack.yaml` one-to-one and may
//! be incomplete. `EnvironmentConfig` is only obtainable through
//! [`EnvironmentConfigBuilder::build`], so every field a composer reads has
//! already been checked.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use super::parser::ValidationError;
use super::rules;

// ============================================================================
// Top-level sitestack.yaml
// ============================================================================

/// Root configuration: the ordered list of environments to consider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Schema version (must be "1.0")
    pub version: String,

    /// Application name
    pub name: String,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Default environment-variable file for build stages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_file: Option<String>,

    /// Environment records, in deployment order
    #[serde(default)]
    pub environments: Vec<EnvironmentSpec>,
}

/// Default env file, relative to the directory holding sitestack.yaml.
pub const DEFAULT_ENV_FILE: &str = "config/.env";

/// Default status served with the SPA fallback page for an origin 404.
pub const DEFAULT_FALLBACK_STATUS_404: u16 = 404;

/// Default status served with the SPA fallback page for an origin 403.
///
/// Behind an origin access identity a missing key surfaces as 403, so it is
/// answered like a 404.
pub const DEFAULT_FALLBACK_STATUS_403: u16 = 404;

// ============================================================================
// Environments
// ============================================================================

/// One environment record as written in the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSpec {
    #[serde(default)]
    pub environment_type: Option<String>,

    /// CloudFormation stack name
    #[serde(default)]
    pub stack_name: Option<String>,

    /// Git branch the pipeline tracks
    #[serde(default)]
    pub branch: Option<String>,

    /// Site bucket
    #[serde(default)]
    pub bucket_name: Option<String>,

    #[serde(default)]
    pub pipeline_name: Option<String>,

    /// Pipeline artifact store bucket
    #[serde(default)]
    pub pipeline_bucket: Option<String>,

    /// Relax the public-policy block on the site bucket
    #[serde(default)]
    pub public_access: bool,

    #[serde(default)]
    pub index_file: Option<String>,

    #[serde(default)]
    pub error_file: Option<String>,

    #[serde(default)]
    pub github_repo_owner: Option<String>,

    #[serde(default)]
    pub github_repo_name: Option<String>,

    /// Secrets Manager secret holding the GitHub token (name or ARN)
    #[serde(default)]
    pub github_access_token_ref: Option<String>,

    /// Only flagged environments are synthesized
    #[serde(default)]
    pub is_deploy: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Overrides the app-level env file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_file: Option<String>,

    /// Status served with the SPA fallback page for an origin 404
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_status_404: Option<u16>,

    /// Status served with the SPA fallback page for an origin 403
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_status_403: Option<u16>,
}

impl EnvironmentSpec {
    /// Label used in diagnostics: stack name, environment type, or list position.
    pub fn label(&self, position: usize) -> String {
        self.stack_name
            .as_deref()
            .or(self.environment_type.as_deref())
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{}", position))
    }

    /// Seed a builder with this record's values.
    pub fn to_builder(&self) -> EnvironmentConfigBuilder {
        EnvironmentConfigBuilder {
            environment_type: self.environment_type.clone(),
            stack_name: self.stack_name.clone(),
            branch: self.branch.clone(),
            bucket_name: self.bucket_name.clone(),
            pipeline_name: self.pipeline_name.clone(),
            pipeline_bucket: self.pipeline_bucket.clone(),
            public_access: self.public_access,
            index_file: self.index_file.clone(),
            error_file: self.error_file.clone(),
            github_repo_owner: self.github_repo_owner.clone(),
            github_repo_name: self.github_repo_name.clone(),
            github_access_token_ref: self.github_access_token_ref.clone(),
            description: self.description.clone(),
            env_file: self.env_file.clone().map(PathBuf::from),
            fallback_status_404: self.fallback_status_404,
            fallback_status_403: self.fallback_status_403,
        }
    }
}

/// Reference to a Secrets Manager secret. Never holds the secret itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRef(String);

impl SecretRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// CloudFormation dynamic reference, resolved at deploy time.
    pub fn dynamic_reference(&self) -> String {
        format!("{{{{resolve:secretsmanager:{}:SecretString:::}}}}", self.0)
    }
}

impl fmt::Display for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A deployable environment with every naming field checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentConfig {
    pub environment_type: String,
    pub stack_name: String,
    pub branch: String,
    pub bucket_name: String,
    pub pipeline_name: String,
    pub pipeline_bucket: String,
    pub public_access: bool,
    pub index_file: String,
    pub error_file: String,
    pub github_repo_owner: String,
    pub github_repo_name: String,
    pub github_access_token_ref: SecretRef,
    pub description: String,
    pub env_file: Option<PathBuf>,
    pub fallback_status_404: u16,
    pub fallback_status_403: u16,
}

impl EnvironmentConfig {
    pub fn builder() -> EnvironmentConfigBuilder {
        EnvironmentConfigBuilder::default()
    }

    /// Name of the CodeBuild project for this stack.
    pub fn build_project_name(&self) -> String {
        format!("{}-codebuild", self.stack_name)
    }
}

/// Builder for [`EnvironmentConfig`]; `build` reports every problem at once.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentConfigBuilder {
    environment_type: Option<String>,
    stack_name: Option<String>,
    branch: Option<String>,
    bucket_name: Option<String>,
    pipeline_name: Option<String>,
    pipeline_bucket: Option<String>,
    public_access: bool,
    index_file: Option<String>,
    error_file: Option<String>,
    github_repo_owner: Option<String>,
    github_repo_name: Option<String>,
    github_access_token_ref: Option<String>,
    description: Option<String>,
    env_file: Option<PathBuf>,
    fallback_status_404: Option<u16>,
    fallback_status_403: Option<u16>,
}

macro_rules! string_setters {
    ($($field:ident),* $(,)?) => {
        $(
            pub fn $field(mut self, value: impl Into<String>) -> Self {
                self.$field = Some(value.into());
                self
            }
        )*
    };
}

impl EnvironmentConfigBuilder {
    string_setters!(
        environment_type,
        stack_name,
        branch,
        bucket_name,
        pipeline_name,
        pipeline_bucket,
        index_file,
        error_file,
        github_repo_owner,
        github_repo_name,
        github_access_token_ref,
        description,
    );

    pub fn public_access(mut self, value: bool) -> Self {
        self.public_access = value;
        self
    }

    pub fn env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = Some(path.into());
        self
    }

    pub fn fallback_status_404(mut self, status: u16) -> Self {
        self.fallback_status_404 = Some(status);
        self
    }

    pub fn fallback_status_403(mut self, status: u16) -> Self {
        self.fallback_status_403 = Some(status);
        self
    }

    /// Validate and produce the config. Errors are not prefixed; callers add context.
    pub fn build(self) -> Result<EnvironmentConfig, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let mut required = |field: &str, value: Option<String>| -> String {
            match value.map(|v| v.trim().to_string()) {
                Some(v) if !v.is_empty() => v,
                _ => {
                    errors.push(ValidationError::new(format!("{} must not be empty", field)));
                    String::new()
                }
            }
        };

        let environment_type = required("environment_type", self.environment_type);
        let stack_name = required("stack_name", self.stack_name);
        let branch = required("branch", self.branch);
        let bucket_name = required("bucket_name", self.bucket_name);
        let pipeline_name = required("pipeline_name", self.pipeline_name);
        let pipeline_bucket = required("pipeline_bucket", self.pipeline_bucket);
        let index_file = required("index_file", self.index_file);
        let error_file = required("error_file", self.error_file);
        let github_repo_owner = required("github_repo_owner", self.github_repo_owner);
        let github_repo_name = required("github_repo_name", self.github_repo_name);
        let token_ref = required("github_access_token_ref", self.github_access_token_ref);

        if !stack_name.is_empty() {
            errors.extend(rules::check_stack_name(&stack_name));
        }
        if !bucket_name.is_empty() {
            errors.extend(rules::check_bucket_name("bucket_name", &bucket_name));
        }
        if !pipeline_bucket.is_empty() {
            errors.extend(rules::check_bucket_name("pipeline_bucket", &pipeline_bucket));
        }
        if !bucket_name.is_empty() && bucket_name == pipeline_bucket {
            errors.push(ValidationError::new(format!(
                "bucket_name and pipeline_bucket are both '{}'",
                bucket_name
            )));
        }
        if !pipeline_name.is_empty() {
            errors.extend(rules::check_pipeline_name(&pipeline_name));
        }
        if !token_ref.is_empty() {
            errors.extend(rules::check_secret_ref(&token_ref));
        }

        let fallback_status_404 = self.fallback_status_404.unwrap_or(DEFAULT_FALLBACK_STATUS_404);
        let fallback_status_403 = self.fallback_status_403.unwrap_or(DEFAULT_FALLBACK_STATUS_403);
        for (field, status) in [
            ("fallback_status_404", fallback_status_404),
            ("fallback_status_403", fallback_status_403),
        ] {
            if !(200..=599).contains(&status) {
                errors.push(ValidationError::new(format!(
                    "{} must be between 200 and 599, got {}",
                    field, status
                )));
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let description = self
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| {
                format!("Static site infrastructure stack for {}", environment_type)
            });

        Ok(EnvironmentConfig {
            environment_type,
            stack_name,
            branch,
            bucket_name,
            pipeline_name,
            pipeline_bucket,
            public_access: self.public_access,
            index_file,
            error_file,
            github_repo_owner,
            github_repo_name,
            github_access_token_ref: SecretRef(token_ref),
            description,
            env_file: self.env_file,
            fallback_status_404,
            fallback_status_403,
        })
    }
}

// ============================================================================
// Build variables
// ============================================================================

/// A build-time variable, shaped `{value: string}` per key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildVariable {
    pub value: String,
}

/// Ordered build variables keyed by name.
pub type BuildVariables = IndexMap<String, BuildVariable>;

// ============================================================================
// Manifest
// ============================================================================

/// Record of the last synth run, written next to the templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthManifest {
    /// Schema version
    pub schema: String,

    /// Generator version
    pub generator: String,

    /// Application name
    pub app: String,

    /// Per-stack entries, in synth order
    pub stacks: IndexMap<String, StackEntry>,
}

/// Manifest entry for one synthesized stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackEntry {
    pub environment_type: String,

    /// Template file name relative to the output directory
    pub template_file: String,

    /// BLAKE3 of the template JSON
    pub template_hash: String,

    /// Per-resource digests, in declaration order
    pub resources: IndexMap<String, ResourceEntry>,

    #[serde(default)]
    pub outputs: Vec<String>,
}

/// Manifest entry for one logical resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceEntry {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub hash: String,
}

// ============================================================================
// Plan
// ============================================================================

/// Action CloudFormation will take on a logical resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanAction {
    Create,
    Update,
    Destroy,
    NoOp,
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "CREATE"),
            Self::Update => write!(f, "UPDATE"),
            Self::Destroy => write!(f, "DESTROY"),
            Self::NoOp => write!(f, "NO-OP"),
        }
    }
}

/// A single planned change.
#[derive(Debug, Clone)]
pub struct PlannedChange {
    pub stack: String,
    pub logical_id: String,
    pub resource_type: String,
    pub action: PlanAction,
    pub description: String,
}

/// Changes across all stacks, with summary counts.
#[derive(Debug, Clone, Default)]
pub struct ExecutionPlan {
    pub changes: Vec<PlannedChange>,
    pub to_create: u32,
    pub to_update: u32,
    pub to_destroy: u32,
    pub unchanged: u32,
}
