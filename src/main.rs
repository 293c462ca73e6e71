use anyhow::Result;
use clap::Parser;
use rectbind::cli::CliState;
use rectbind::config::AppConfig;
use std::env;
use std::path::PathBuf;

/// Drive native bindings from a small script language
#[derive(Debug, Parser)]
#[command(name = "rectbind", version, about)]
struct Args {
    /// Configuration file (created with defaults if missing)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory to scan for binding libraries
    #[arg(long)]
    plugin_dir: Option<PathBuf>,

    /// Script to run; starts the REPL when omitted
    script: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::load()?,
    };
    config.apply_env_overrides();
    if let Some(dir) = args.plugin_dir {
        config.plugins.dir = dir;
        config.plugins.enabled = true;
    }

    // Initialize logging based on config
    let default_directive = format!("rectbind={}", config.logging.level.to_lowercase());
    let env_override = env::var("RUST_LOG").unwrap_or_default();
    let combined_filter = if env_override.trim().is_empty() {
        default_directive.clone()
    } else if env_override.contains("rectbind") {
        env_override
    } else {
        format!("{},{}", env_override, default_directive)
    };

    tracing_subscriber::fmt()
        .with_env_filter(combined_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut cli = CliState::new_with_config(config)?;

    match args.script {
        Some(path) => {
            for line in cli.run_script(&path).await? {
                println!("{}", line);
            }
        }
        None => cli.run_repl().await?,
    }
    Ok(())
}
