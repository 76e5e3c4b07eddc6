mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use navremote::{
    ActionBus, Dispatcher, DispatcherConfig, DispatcherDeps, HistoryStore, JsonTripDecoder,
    PROTOCOL_VERSION, TcpTransport,
};
use tokio::signal;
use tracing::info;
use tracing::level_filters::LevelFilter;

use config::Config;

/// Serve a navigation session's trip history to peers on the local network
#[derive(Parser, Debug)]
#[command(name = "navremote-service", version, about, long_about = None)]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/navremote/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the history directory
    #[arg(long)]
    history_dir: Option<PathBuf>,

    /// Override the transport port
    #[arg(long)]
    port: Option<u16>,

    /// Answer failed requests with an error response
    #[arg(long)]
    error_responses: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        logger::init(LevelFilter::DEBUG);
    } else {
        logger::init_tracing();
    }

    let mut cfg = Config::from_config(cli.config.as_ref()).context("loading configuration")?;
    if let Some(dir) = cli.history_dir {
        cfg.history.directory = dir;
    }
    if let Some(port) = cli.port {
        cfg.transport.port = port;
    }
    cfg.dispatch.error_responses |= cli.error_responses;

    if cli.print_config {
        print!("{cfg}");
        return Ok(());
    }

    run(cfg).await
}

async fn run(cfg: Config) -> Result<()> {
    // The session writes here; make sure it exists before peers ask for it.
    tokio::fs::create_dir_all(&cfg.history.directory).await.with_context(|| {
        format!("creating history directory {}", cfg.history.directory.display())
    })?;

    let addr: SocketAddr = cfg
        .listen_addr()
        .parse()
        .with_context(|| format!("invalid listen address {}", cfg.listen_addr()))?;
    let transport = Arc::new(TcpTransport::bind(addr).await?);
    let bus = Arc::new(ActionBus::new());

    let deps = DispatcherDeps {
        history: HistoryStore::new(&cfg.history.directory),
        transport: transport.clone(),
        decoder: Arc::new(JsonTripDecoder),
    };
    let dispatcher_config =
        DispatcherConfig::default().with_error_responses(cfg.dispatch.error_responses);

    // All subscriptions must exist before the transport accepts input.
    let dispatcher = Dispatcher::new(deps, dispatcher_config).start(&bus);
    let server = transport.serve(bus).await;

    info!(
        "navremote-service {} (protocol v{}) ready on {}",
        env!("CARGO_PKG_VERSION"),
        PROTOCOL_VERSION,
        transport.local_addr()
    );

    signal::ctrl_c().await.context("waiting for Ctrl+C")?;
    info!("Ctrl+C received, shutting down.");

    server.abort();
    dispatcher.shutdown().await;
    Ok(())
}
