//! sitestack CLI: static site infrastructure synthesized as CloudFormation.

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "sitestack",
    version,
    about = "S3 hosting, CloudFront CDN and CodePipeline CI/CD for static sites, synthesized as CloudFormation"
)]
struct Cli {
    /// Defaults to `synth` when omitted
    #[command(subcommand)]
    command: Option<sitestack::cli::Commands>,
}

/// Log to stderr so stdout carries only command output. `RUST_LOG` overrides.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()
        .ok();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    if let Err(e) = sitestack::cli::dispatch(cli.command.unwrap_or_default()) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
