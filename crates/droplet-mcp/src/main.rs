//! droplet-mcp - Entry Point
//!
//! Runs the MCP server over stdio (for desktop assistants) or streamable HTTP.

use anyhow::{Context, Result};
use argh::FromArgs;
use droplet_mcp::api::factory::{ClientFactory, TokenClientFactory};
use droplet_mcp::config::{self, ServerConfig};
use droplet_mcp::server::{self, DropletMcpServer};
use droplet_mcp::tools::ToolRegistry;
use std::path::PathBuf;
use std::sync::Arc;

/// droplet-mcp - Manage DigitalOcean droplets from AI assistants
#[derive(FromArgs)]
struct Args {
    /// run in stdio mode (reads JSON-RPC from stdin, writes to stdout)
    #[argh(switch)]
    stdio: bool,

    /// HTTP port (only used without --stdio, default from config: 8080)
    #[argh(option, short = 'p')]
    port: Option<u16>,

    /// path to a YAML config file (default: ~/.droplet-mcp/config.yaml)
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// base URL of the DigitalOcean API
    #[argh(option)]
    api_url: Option<String>,

    /// print version and exit
    #[argh(switch, short = 'V')]
    version: bool,
}

/// Stdio mode writes logs to ~/.droplet-mcp/mcp-stdio.log so stdout stays
/// clean for JSON-RPC. HTTP mode logs to stderr.
fn init_logging(stdio: bool) -> Result<()> {
    let env = env_logger::Env::default().default_filter_or("info");
    if stdio {
        let dir = config::config_dir();
        std::fs::create_dir_all(&dir).ok();
        let log_path = dir.join("mcp-stdio.log");
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Failed to open log file {}", log_path.display()))?;
        drop(
            env_logger::Builder::from_env(env)
                .target(env_logger::Target::Pipe(Box::new(log_file)))
                .try_init(),
        );
        log::info!(
            "MCP stdio server starting (logs redirected to {})",
            log_path.display()
        );
    } else {
        drop(
            env_logger::Builder::from_env(env)
                .target(env_logger::Target::Stderr)
                .try_init(),
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Args = argh::from_env();

    if args.version {
        println!("{} {}", droplet_mcp::SERVER_NAME, droplet_mcp::SERVER_VERSION);
        return Ok(());
    }

    init_logging(args.stdio)?;

    let mut config = ServerConfig::load(args.config.as_deref())?;
    if let Some(url) = args.api_url {
        config.api_url = url;
    }
    if let Some(port) = args.port {
        config.http_port = port;
    }
    config.validate()?;

    if config.api_token.is_none() {
        log::warn!(
            "{} not set; tool calls will fail unless requests carry a bearer token",
            config::TOKEN_ENV
        );
    }
    log::info!("DigitalOcean API: {}", config.api_url);

    let registry = Arc::new(ToolRegistry::builtin()?);
    let factory: Arc<dyn ClientFactory> = Arc::new(TokenClientFactory::new(
        &config.client_options(),
        config.api_token.clone(),
    )?);

    if args.stdio {
        server::run_stdio(DropletMcpServer::new(registry, factory)).await?;
    } else {
        log::info!("Starting MCP server on HTTP port {}...", config.http_port);
        let shutdown = async {
            tokio::signal::ctrl_c().await.ok();
            log::info!("Shutdown requested");
        };
        server::run_http(
            registry,
            factory,
            &config.bind_address,
            config.http_port,
            shutdown,
        )
        .await?;
    }

    Ok(())
}
