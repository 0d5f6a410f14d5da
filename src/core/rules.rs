//! Naming rules enforced before composition.
//!
//! S3 bucket names, CloudFormation stack names and logical IDs, CodePipeline
//! names, and Secrets Manager references.

use super::parser::ValidationError;
use regex::Regex;
use std::sync::LazyLock;

static BUCKET_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9.-]{1,61}[a-z0-9]$").expect("static regex"));

static IPV4_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}$").expect("static regex"));

static STACK_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9-]{0,127}$").expect("static regex"));

static PIPELINE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9.@_-]{1,100}$").expect("static regex"));

static LOGICAL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{1,255}$").expect("static regex"));

static SECRET_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9/_+=.@:-]{1,2048}$").expect("static regex"));

/// Prefixes GitHub uses for issued tokens.
const GITHUB_TOKEN_PREFIXES: &[&str] = &["ghp_", "gho_", "ghu_", "ghs_", "ghr_", "github_pat_"];

/// Check an S3 bucket name. `field` names the config key in messages.
pub fn check_bucket_name(field: &str, name: &str) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if !BUCKET_NAME.is_match(name) {
        errors.push(ValidationError::new(format!(
            "{} '{}' must be 3-63 chars of lowercase letters, digits, '.' or '-', starting and ending with a letter or digit",
            field, name
        )));
    }
    if name.contains("..") {
        errors.push(ValidationError::new(format!(
            "{} '{}' must not contain adjacent periods",
            field, name
        )));
    }
    if IPV4_LIKE.is_match(name) {
        errors.push(ValidationError::new(format!(
            "{} '{}' must not be formatted as an IP address",
            field, name
        )));
    }
    if name.starts_with("xn--") || name.ends_with("-s3alias") {
        errors.push(ValidationError::new(format!(
            "{} '{}' uses a reserved prefix or suffix",
            field, name
        )));
    }
    errors
}

/// Check a CloudFormation stack name.
pub fn check_stack_name(name: &str) -> Vec<ValidationError> {
    if STACK_NAME.is_match(name) {
        return Vec::new();
    }
    vec![ValidationError::new(format!(
        "stack_name '{}' must start with a letter and contain only letters, digits and '-' (max 128)",
        name
    ))]
}

/// Check a CodePipeline pipeline name.
pub fn check_pipeline_name(name: &str) -> Vec<ValidationError> {
    if PIPELINE_NAME.is_match(name) {
        return Vec::new();
    }
    vec![ValidationError::new(format!(
        "pipeline_name '{}' may contain only letters, digits and '.@_-' (max 100)",
        name
    ))]
}

/// Check a secret reference; literal GitHub tokens are rejected.
pub fn check_secret_ref(reference: &str) -> Vec<ValidationError> {
    if GITHUB_TOKEN_PREFIXES
        .iter()
        .any(|prefix| reference.starts_with(prefix))
    {
        return vec![ValidationError::new(
            "github_access_token_ref looks like an inline GitHub token; give the Secrets Manager secret name instead"
                .to_string(),
        )];
    }
    if !SECRET_REF.is_match(reference) {
        return vec![ValidationError::new(format!(
            "github_access_token_ref '{}' is not a valid secret name or ARN",
            reference
        ))];
    }
    Vec::new()
}

/// True if `id` is a valid CloudFormation logical ID or output name.
pub fn is_logical_id(id: &str) -> bool {
    LOGICAL_ID.is_match(id)
}
