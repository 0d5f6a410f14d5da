//! Environment selection: pick deploy-flagged records and validate them.
//!
//! Order of the input list is preserved. Records without `is_deploy` are
//! never validated or composed.

use super::parser::ValidationError;
use super::types::{EnvironmentConfig, EnvironmentSpec};
use crate::error::{Result, SynthError};
use std::collections::HashMap;

/// Select deploy-flagged environments, converting each to a validated config.
///
/// Fails with every problem found across all selected records.
pub fn select_deployable(specs: &[EnvironmentSpec]) -> Result<Vec<EnvironmentConfig>> {
    let mut selected = Vec::new();
    let mut errors = Vec::new();

    for (idx, spec) in specs.iter().enumerate() {
        if !spec.is_deploy {
            tracing::debug!(environment = %spec.label(idx + 1), "skipping, not flagged for deploy");
            continue;
        }
        match spec.to_builder().build() {
            Ok(env) => selected.push(env),
            Err(env_errors) => {
                let label = spec.label(idx + 1);
                errors.extend(env_errors.into_iter().map(|e| {
                    ValidationError::new(format!("environment '{}': {}", label, e.message))
                }));
            }
        }
    }

    if errors.is_empty() {
        Ok(selected)
    } else {
        Err(SynthError::Invalid(errors))
    }
}

/// Report physical names shared between selected environments.
///
/// Site and artifact buckets share one namespace.
pub fn check_collisions(envs: &[EnvironmentConfig]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut stacks: HashMap<&str, &str> = HashMap::new();
    let mut buckets: HashMap<&str, &str> = HashMap::new();
    let mut pipelines: HashMap<&str, &str> = HashMap::new();

    for env in envs {
        let owner = env.stack_name.as_str();
        if let Some(first) = stacks.insert(owner, owner) {
            errors.push(ValidationError::new(format!(
                "stack name '{}' is declared more than once",
                first
            )));
        }
        for bucket in [env.bucket_name.as_str(), env.pipeline_bucket.as_str()] {
            if let Some(first) = buckets.get(bucket) {
                errors.push(ValidationError::new(format!(
                    "bucket '{}' is used by both '{}' and '{}'",
                    bucket, first, owner
                )));
            } else {
                buckets.insert(bucket, owner);
            }
        }
        if let Some(first) = pipelines.get(env.pipeline_name.as_str()) {
            errors.push(ValidationError::new(format!(
                "pipeline '{}' is used by both '{}' and '{}'",
                env.pipeline_name, first, owner
            )));
        } else {
            pipelines.insert(env.pipeline_name.as_str(), owner);
        }
    }

    errors
}

/// Select deploy-flagged environments and reject cross-environment collisions.
pub fn select(specs: &[EnvironmentSpec]) -> Result<Vec<EnvironmentConfig>> {
    let selected = select_deployable(specs)?;
    let errors = check_collisions(&selected);
    if errors.is_empty() {
        Ok(selected)
    } else {
        Err(SynthError::Invalid(errors))
    }
}
