//! `ragdoll` - chat with a persona from the terminal.

mod helper;
mod shell;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ragdoll_application::{Providers, SessionOptions, open_cache};
use ragdoll_core::persona::PersonaConfig;
use ragdoll_core::persona::preset::DEFAULT_ART_STYLE;
use ragdoll_infrastructure::{load_persona_config, load_settings};

use crate::shell::Shell;

const VERBOSE_FILTER: &str = "warn,ragdoll=info,ragdoll_core=info,ragdoll_infrastructure=info,ragdoll_interaction=info,ragdoll_application=info";

#[derive(Parser)]
#[command(name = "ragdoll")]
#[command(about = "Ask a persona questions answered from its knowledge source", long_about = None)]
struct Cli {
    /// Persona TOML file; missing keys fall back to the Arthas preset
    #[arg(long)]
    persona: Option<PathBuf>,

    /// `.env` file to load instead of `./.env`
    #[arg(long)]
    env_file: Option<PathBuf>,
}

/// `RUST_LOG` wins; otherwise `VERBOSE` picks between warnings only and
/// progress messages.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { VERBOSE_FILTER } else { "warn" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = load_settings(cli.env_file.as_deref())?;
    init_tracing(settings.verbose);

    let config = match &cli.persona {
        Some(path) => load_persona_config(path).await?,
        None => PersonaConfig {
            art_style: DEFAULT_ART_STYLE.to_string(),
            ..PersonaConfig::default()
        },
    };

    let providers = Providers::from_settings(&settings)?;
    let cache = open_cache(&settings)?;
    let options = SessionOptions::from_settings(&settings);

    let mut shell = Shell::new(config, providers, cache, options)?;
    shell.run().await
}
