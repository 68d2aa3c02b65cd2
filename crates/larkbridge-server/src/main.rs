//! `larkbridge` binary

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "larkbridge", version, about = "Lark/Feishu bot bridge with MCP tool calling")]
struct Cli {
    /// YAML settings file (defaults to ~/.config/larkbridge/config.yaml when present)
    #[arg(short, long, env = "LARKBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Listen port, overriding settings and SERVER_PORT
    #[arg(short, long)]
    port: Option<u16>,
}

fn init_tracing(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "info" }));

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

#[tokio::main]
async fn main() {
    // Before parsing so `env` arguments see .env values
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    let settings = match larkbridge_server::load_settings(cli.config.as_deref(), cli.port) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("fatal: {e}");
            process::exit(1);
        }
    };

    init_tracing(settings.debug_mode);
    if let Ok(path) = dotenv {
        info!(path = %path.display(), "loaded .env");
    }
    info!(
        model = %settings.model.default_model,
        tool_servers = settings.mcp.servers.len(),
        debug = settings.debug_mode,
        "starting larkbridge"
    );

    if let Err(e) = larkbridge_server::serve(settings).await {
        error!(error = %e, "server failed");
        process::exit(1);
    }
}
