use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use wrl_agent::config::AgentConfig;
use wrl_agent::demo;

#[derive(Parser)]
#[command(name = "wrl-agent")]
#[command(about = "WristLink demo agent - wearable controller against a simulated phone host")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "wrl_agent={},wrl_core={}",
            args.log_level, args.log_level
        ))
        .init();

    info!("Starting wrl-agent");

    // Load configuration
    let config = if let Some(config_path) = &args.config {
        AgentConfig::load_from_file(config_path)?
    } else {
        AgentConfig::load_from_env()
    };
    config.validate()?;

    demo::run(config).await
}
