//! Edge router
//!
//! Terminates HTTP(S) and hands each request to the first route whose
//! matcher accepts it. Routes come from a rules file that can be reloaded
//! without restarting.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌──────────────────────────────────────────────────────┐
//!                              │                     EDGE ROUTER                       │
//!                              │                                                       │
//!     Client Request           │  ┌─────────┐    ┌─────────┐    ┌──────────────┐      │
//!     ─────────────────────────┼─▶│  http   │───▶│ routing │───▶│   handlers   │──────┼──▶ Upstream /
//!                              │  │ server  │    │ (table) │    │ static/proxy │      │    Filesystem
//!                              │  └─────────┘    └────▲────┘    └──────────────┘      │
//!                              │                      │ swap                          │
//!                              │                ┌─────┴─────┐    ┌─────────┐         │
//!     rules file ──────────────┼───────────────▶│  reload   │◀───│  rules  │         │
//!                              │                │  worker   │    │ parser  │         │
//!                              │                └─────▲─────┘    └─────────┘         │
//!                              │                      │ trigger                        │
//!                              │        SIGHUP / file watcher / POST /admin/reload    │
//!                              │                                                       │
//!                              │  ┌─────────────────────────────────────────────────┐ │
//!                              │  │  config · observability · lifecycle · admin     │ │
//!                              │  └─────────────────────────────────────────────────┘ │
//!                              └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use edge_router::config::{load_config, validate_config, EdgeConfig};
use edge_router::lifecycle::{self, signals::wait_for_termination, Shutdown};
use edge_router::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "edge-router")]
#[command(about = "Host-based HTTP edge router with hot-reloadable rules", long_about = None)]
struct Args {
    /// Settings file (TOML). Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rules file, overriding `rules.path`.
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// Listen address, overriding `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => EdgeConfig::default(),
    };
    if let Some(rules) = args.rules {
        config.rules.path = rules;
    }
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    if args.verbose {
        config.observability.log_level = "debug".to_string();
    }
    if let Err(errors) = validate_config(&config) {
        for error in &errors {
            eprintln!("invalid configuration: {}", error);
        }
        return Err("configuration rejected".into());
    }

    init_logging(&config.observability.log_level)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "edge-router starting");

    let shutdown = Shutdown::new();
    let edge = lifecycle::start(config, &shutdown).await?;

    wait_for_termination().await;
    tracing::info!("Shutting down");
    shutdown.trigger();
    edge.wait().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
