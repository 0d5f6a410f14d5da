//! Stack assembly: select environments, compose each stack, compute deploy order.
//!
//! select → for each environment: load build variables → bucket →
//! distribution → pipeline → outputs → DAG check
//!
//! Build variables are loaded before the first resource of a stack is
//! declared, so a bad env file never leaves a partial stack behind.

use super::envfile;
use super::resolver;
use super::selector;
use super::types::{AppConfig, BuildVariables, EnvironmentConfig, DEFAULT_ENV_FILE};
use crate::error::Result;
use crate::resources::template::Template;
use crate::resources::{bucket, distribution, outputs, pipeline, stack::Stack};
use std::path::{Path, PathBuf};

/// A fully composed stack, ready to be written.
#[derive(Debug, Clone)]
pub struct SynthesizedStack {
    pub stack_name: String,
    pub environment_type: String,
    pub template: Template,
    /// Topological order of logical IDs
    pub deploy_order: Vec<String>,
}

impl SynthesizedStack {
    /// Number of resources of a CloudFormation type.
    pub fn count_of_type(&self, resource_type: &str) -> usize {
        self.template
            .resources
            .values()
            .filter(|r| r.resource_type == resource_type)
            .count()
    }
}

/// Where to find env files for a synth run.
#[derive(Debug, Clone)]
pub struct SynthContext<'a> {
    /// Directory relative paths are resolved against (the config file's directory)
    pub base_dir: &'a Path,
    /// App-level env file, if the config names one
    pub default_env_file: Option<&'a str>,
}

impl SynthContext<'_> {
    /// Env file for `env`: its own override, else the app default, else `config/.env`.
    pub fn env_file_for(&self, env: &EnvironmentConfig) -> PathBuf {
        let path = env
            .env_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(self.default_env_file.unwrap_or(DEFAULT_ENV_FILE)));
        if path.is_absolute() {
            path
        } else {
            self.base_dir.join(path)
        }
    }
}

/// Synthesize every deploy-flagged environment of `app`, in list order.
pub fn synth_app(app: &AppConfig, base_dir: &Path) -> Result<Vec<SynthesizedStack>> {
    let ctx = SynthContext {
        base_dir,
        default_env_file: app.env_file.as_deref(),
    };
    let selected = selector::select(&app.environments)?;
    if selected.is_empty() {
        tracing::warn!(app = %app.name, "no environment is flagged for deploy");
    }
    synth_environments(&selected, &ctx)
}

/// Compose each environment in turn; the first failure aborts the run.
pub fn synth_environments(
    envs: &[EnvironmentConfig],
    ctx: &SynthContext<'_>,
) -> Result<Vec<SynthesizedStack>> {
    let mut stacks = Vec::with_capacity(envs.len());
    for env in envs {
        tracing::info!(stack = %env.stack_name, environment = %env.environment_type, "synthesizing stack");
        let stack = compose_stack(env, &ctx.env_file_for(env))?;
        tracing::debug!(stack = %stack.stack_name, resources = stack.template.resources.len(), "stack composed");
        stacks.push(stack);
    }
    Ok(stacks)
}

/// Load build variables from `env_file`, then compose the stack.
pub fn compose_stack(env: &EnvironmentConfig, env_file: &Path) -> Result<SynthesizedStack> {
    let vars = envfile::load_env_file(env_file)?;
    compose_with_variables(env, &vars)
}

/// Compose the stack for one environment from already-loaded variables.
pub fn compose_with_variables(
    env: &EnvironmentConfig,
    vars: &BuildVariables,
) -> Result<SynthesizedStack> {
    let mut stack = Stack::new(&env.stack_name, &env.description);

    let site = bucket::compose_web_bucket(&mut stack, env)?;
    let cdn = distribution::compose_distribution(&mut stack, &site, env)?;
    pipeline::compose_pipeline(&mut stack, &site, &cdn, env, vars)?;
    outputs::emit_outputs(&mut stack, &site, &cdn)?;

    let deploy_order = resolver::build_deploy_order(stack.name(), stack.resources())?;

    Ok(SynthesizedStack {
        stack_name: env.stack_name.clone(),
        environment_type: env.environment_type.clone(),
        template: stack.to_template(),
        deploy_order,
    })
}
