//! Transcription controller entry point.
//!
//! Loads the configuration, wires the bus to its producers and consumers,
//! and runs until Ctrl+C or a `stop` command.
//!
//! # Usage
//!
//! ```text
//! transcribe-controller [OPTIONS]
//!
//! Options:
//!   --config    <PATH>  TOML configuration file [env: TRANSCRIBE_CONFIG] [default: app.toml]
//!   --ws-url    <URL>   Transcription server URL (beats WS_URL and the file)
//!   --http-port <PORT>  HTTP trigger port (beats the file)
//! ```
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load + validate AppConfig
//!  └─ EventBus::with_shutdown()
//!  └─ spawn
//!       ├─ Dispatcher::run        (command queue consumer)
//!       ├─ NetworkClient::spawn   (connection task + send task)
//!       ├─ http_api::serve        (HTTP producer)
//!       └─ PdfWatcher::start      (watcher producer, optional)
//!  └─ wait for shutdown → stop producers → stop client → join (bounded)
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use transcribe_controller::application::clipboard::Clipboard;
use transcribe_controller::application::dispatcher::Dispatcher;
use transcribe_controller::application::inbound::ClipboardResponder;
use transcribe_controller::application::pdf_submission::{FilePattern, PdfSubmitter};
use transcribe_controller::bus::{EventBus, Shutdown};
use transcribe_controller::infrastructure::clipboard::system::SystemClipboard;
use transcribe_controller::infrastructure::http_api;
use transcribe_controller::infrastructure::network::{NetworkClient, NetworkClientConfig};
use transcribe_controller::infrastructure::pdf_watcher::{PdfWatcher, DEFAULT_DEBOUNCE};
use transcribe_controller::infrastructure::storage::config::{load_config, AppConfig};
use transcribe_controller::infrastructure::storage::user_store::JsonUserStore;

/// Upper bound on how long teardown waits for tasks to finish.
const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(5);

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Audio transcription controller.
///
/// Bridges local input sources to a remote transcription server over a
/// reconnecting WebSocket connection.
#[derive(Debug, Parser)]
#[command(
    name = "transcribe-controller",
    about = "Command bus and resilient WebSocket client for the transcription server",
    version
)]
struct Cli {
    /// Path to the TOML configuration file.  A missing file means defaults.
    #[arg(long, default_value = "app.toml", env = "TRANSCRIBE_CONFIG")]
    config: PathBuf,

    /// Transcription server URL, overriding the file and `WS_URL`.
    #[arg(long)]
    ws_url: Option<String>,

    /// HTTP trigger port, overriding the file.
    #[arg(long)]
    http_port: Option<u16>,
}

impl Cli {
    /// Applies the flags that were given on top of `config`.
    fn apply_to(&self, config: &mut AppConfig) {
        if let Some(url) = &self.ws_url {
            config.network.ws_url = url.clone();
        }
        if let Some(port) = self.http_port {
            config.http.port = port;
        }
    }

    /// Resolves the effective configuration: file, then environment, then
    /// flags.
    fn resolve_config(&self) -> anyhow::Result<AppConfig> {
        let mut config = load_config(&self.config)
            .with_context(|| format!("failed to load config from {}", self.config.display()))?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        self.apply_to(&mut config);
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    // `RUST_LOG` wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!(
        "transcription controller starting (server={}, http={}:{})",
        config.network.ws_url, config.http.host, config.http.port
    );

    let shutdown = Shutdown::new();
    let (bus, commands, outbound) = EventBus::with_shutdown(shutdown.clone()).split();

    let clipboard: Arc<dyn Clipboard> = Arc::new(SystemClipboard::new());

    // ── Dispatcher ────────────────────────────────────────────────────────────
    let dispatcher = Dispatcher::new(
        bus.outbound_sender(),
        Arc::clone(&clipboard),
        Arc::new(JsonUserStore::new(&config.storage.user_data_file)),
        PdfSubmitter::new(config.pdf.submitter_config()),
    );
    let dispatcher_task = tokio::spawn(dispatcher.run(commands));

    // ── Network client ────────────────────────────────────────────────────────
    let client = Arc::new(NetworkClient::new(
        NetworkClientConfig {
            url: config.network.ws_url.clone(),
            backoff: config.network.backoff_policy(),
            connect_timeout: config.network.connect_timeout(),
        },
        shutdown.clone(),
        Arc::new(ClipboardResponder::new(Arc::clone(&clipboard))),
    ));
    let network_tasks = client.spawn(outbound);

    // ── HTTP API ──────────────────────────────────────────────────────────────
    let addr = config.http.socket_addr()?;
    let listener = http_api::bind(addr)
        .await
        .with_context(|| format!("failed to bind HTTP API on {addr}"))?;
    let app = http_api::router(bus.command_sender(), &config.http.cors_origin);
    let http_task = tokio::spawn(http_api::serve(listener, app, shutdown.clone()));

    // ── Folder watcher ────────────────────────────────────────────────────────
    let watcher = if config.pdf.watch {
        match PdfWatcher::start(
            &config.pdf.dir,
            FilePattern::new(&config.pdf.pattern),
            bus.command_sender(),
            DEFAULT_DEBOUNCE,
        ) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                warn!("automatic PDF submission disabled: {e}");
                None
            }
        }
    } else {
        info!("automatic PDF submission off; use POST /check_pdf");
        None
    };

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("received Ctrl+C; initiating graceful shutdown");
                    shutdown.trigger();
                }
                Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
            }
        });
    }

    info!("transcription controller ready");
    shutdown.triggered().await;

    // ── Teardown ──────────────────────────────────────────────────────────────
    drop(watcher);
    client.stop().await;

    let joined = tokio::time::timeout(TEARDOWN_TIMEOUT, async {
        network_tasks.join().await;
        if let Err(e) = dispatcher_task.await {
            error!("dispatcher task panicked: {e}");
        }
        match http_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("HTTP API failed: {e}"),
            Err(e) => error!("HTTP API task panicked: {e}"),
        }
    })
    .await;
    if joined.is_err() {
        warn!("tasks did not finish within {TEARDOWN_TIMEOUT:?}; exiting anyway");
    }

    info!("transcription controller stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
