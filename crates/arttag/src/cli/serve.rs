//! The `arttag serve` command: run the HTTP analysis service.

use std::sync::Arc;

use anyhow::Context;
use arttag_core::{ArtTagger, Config};
use clap::Args;

use crate::server;

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind (overrides `server.host`)
    #[arg(long, env = "ARTTAG_HOST")]
    pub host: Option<String>,

    /// Port to listen on (overrides `server.port`)
    #[arg(short, long, env = "ARTTAG_PORT")]
    pub port: Option<u16>,

    /// Disable CORS headers
    #[arg(long)]
    pub no_cors: bool,
}

/// Execute the serve command.
///
/// The taxonomy is fully embedded before the listener binds; a failure to load
/// either encoder aborts startup.
pub async fn execute(args: ServeArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.no_cors {
        config.server.enable_cors = false;
    }

    let tagger = tokio::task::spawn_blocking({
        let config = config.clone();
        move || ArtTagger::load(&config)
    })
    .await
    .context("Model loading task panicked")?
    .context("Failed to initialize the tagger")?;

    if !tagger.is_ready() {
        tracing::warn!("No taxonomy category could be embedded; /analyze will return 503");
    }

    let state = Arc::new(server::AppState::new(tagger, config.server.clone()));
    server::start_server(state).await
}
