//! CLI subcommands: init, validate, list, synth, diff.

use crate::core::{defaults, parser, planner, state, synth, types};
use crate::error::{Result, SynthError};
use clap::Subcommand;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "sitestack.yaml";
pub const DEFAULT_OUT_DIR: &str = "synth.out";

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new sitestack project
    Init {
        /// Directory to initialize (default: current)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Application name, used as the prefix of every generated name
        #[arg(short, long, default_value = "my-site")]
        name: String,
    },

    /// Validate sitestack.yaml without synthesizing
    Validate {
        /// Path to sitestack.yaml
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        file: PathBuf,
    },

    /// List environments and whether each is deployed
    List {
        /// Path to sitestack.yaml
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        file: PathBuf,
    },

    /// Synthesize CloudFormation templates for every deploy-flagged environment
    Synth {
        /// Path to sitestack.yaml
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        file: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = DEFAULT_OUT_DIR)]
        out: PathBuf,
    },

    /// Show what a synth would change relative to the last one
    Diff {
        /// Path to sitestack.yaml
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        file: PathBuf,

        /// Output directory of the previous synth
        #[arg(short, long, default_value = DEFAULT_OUT_DIR)]
        out: PathBuf,
    },
}

impl Default for Commands {
    fn default() -> Self {
        Self::Synth {
            file: PathBuf::from(DEFAULT_CONFIG_FILE),
            out: PathBuf::from(DEFAULT_OUT_DIR),
        }
    }
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Init { path, name } => cmd_init(&path, &name),
        Commands::Validate { file } => cmd_validate(&file),
        Commands::List { file } => cmd_list(&file),
        Commands::Synth { file, out } => cmd_synth(&file, &out),
        Commands::Diff { file, out } => cmd_diff(&file, &out),
    }
}

fn cmd_init(path: &Path, name: &str) -> Result<()> {
    let config_path = path.join(DEFAULT_CONFIG_FILE);
    if config_path.exists() {
        return Err(SynthError::io(
            &config_path,
            std::io::Error::new(std::io::ErrorKind::AlreadyExists, "already exists"),
        ));
    }

    let app = defaults::default_app(name);
    let errors = parser::validate_config(&app);
    if !errors.is_empty() {
        return Err(SynthError::Invalid(errors));
    }

    let env_path = path.join(types::DEFAULT_ENV_FILE);
    if let Some(env_dir) = env_path.parent() {
        std::fs::create_dir_all(env_dir).map_err(|e| SynthError::io(env_dir, e))?;
    }

    let yaml = serde_yaml_ng::to_string(&app)?;
    std::fs::write(&config_path, yaml).map_err(|e| SynthError::io(&config_path, e))?;

    let env_created = !env_path.exists();
    if env_created {
        std::fs::write(&env_path, defaults::DEFAULT_ENV_CONTENTS)
            .map_err(|e| SynthError::io(&env_path, e))?;
    }

    println!("Initialized sitestack project at {}", path.display());
    println!("  Created: {}", config_path.display());
    if env_created {
        println!("  Created: {}", env_path.display());
    }
    Ok(())
}

fn cmd_validate(file: &Path) -> Result<()> {
    let config = parse_and_validate(file)?;
    let deployed = config.environments.iter().filter(|e| e.is_deploy).count();
    println!(
        "OK: {} ({} environments, {} deployed)",
        config.name,
        config.environments.len(),
        deployed
    );
    Ok(())
}

fn cmd_list(file: &Path) -> Result<()> {
    let config = parser::parse_config_file(file)?;
    println!("{}:", config.name);
    for line in list_lines(&config) {
        println!("{}", line);
    }
    Ok(())
}

/// One line per environment record; unlabeled records are numbered from 1.
fn list_lines(config: &types::AppConfig) -> Vec<String> {
    config
        .environments
        .iter()
        .enumerate()
        .map(|(index, env)| {
            let flag = if env.is_deploy { "deploy" } else { "skip" };
            format!(
                "  {:<8} {:<20} branch={}",
                flag,
                env.label(index + 1),
                env.branch.as_deref().unwrap_or("?")
            )
        })
        .collect()
}

fn cmd_synth(file: &Path, out: &Path) -> Result<()> {
    let config = parse_and_validate(file)?;
    let stacks = synth::synth_app(&config, config_dir(file))?;
    let manifest = state::write_output(out, &config.name, &stacks)?;

    for stack in &stacks {
        println!(
            "{} ({}): {} resources, {} outputs",
            stack.stack_name,
            stack.environment_type,
            stack.template.resources.len(),
            stack.template.outputs.len()
        );
    }
    println!(
        "Synthesized {} stack(s) into {}",
        manifest.stacks.len(),
        out.display()
    );
    Ok(())
}

fn cmd_diff(file: &Path, out: &Path) -> Result<()> {
    let config = parse_and_validate(file)?;
    let stacks = synth::synth_app(&config, config_dir(file))?;
    let previous = state::load_manifest(out)?;

    if let Some(manifest) = &previous {
        for stack in state::detect_drift(out, manifest) {
            tracing::warn!(stack = %stack, "template on disk differs from the last synth");
        }
    }

    let plan = planner::plan(&stacks, previous.as_ref())?;
    print_plan(&config.name, &plan);
    Ok(())
}

/// Parse and validate a config file, printing every problem found.
fn parse_and_validate(file: &Path) -> Result<types::AppConfig> {
    let config = parser::parse_config_file(file)?;
    let errors = parser::validate_config(&config);
    if errors.is_empty() {
        return Ok(config);
    }
    for e in &errors {
        eprintln!("  ERROR: {}", e);
    }
    Err(SynthError::Invalid(errors))
}

/// Directory relative env-file paths are resolved against.
fn config_dir(file: &Path) -> &Path {
    file.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
}

/// Display a plan to stdout.
fn print_plan(app: &str, plan: &types::ExecutionPlan) {
    println!("Planning: {} ({} resources)", app, plan.changes.len());
    println!();

    let mut current_stack = String::new();
    for change in &plan.changes {
        if change.stack != current_stack {
            current_stack.clone_from(&change.stack);
            println!("{}:", current_stack);
        }
        let symbol = match change.action {
            types::PlanAction::Create => "+",
            types::PlanAction::Update => "~",
            types::PlanAction::Destroy => "-",
            types::PlanAction::NoOp => " ",
        };
        println!("  {} {}", symbol, change.description);
    }

    println!();
    println!(
        "Plan: {} to add, {} to change, {} to destroy, {} unchanged.",
        plan.to_create, plan.to_update, plan.to_destroy, plan.unchanged
    );
}
