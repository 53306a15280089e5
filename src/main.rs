use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use callscribe::audio::{AudioBackend, AudioBackendConfig, SilenceBackend};
use callscribe::{
    create_router, AnalysisRequestor, AppState, BackendFactory, CaptureSessionConfig, Config,
    Coordinator, CoordinatorConfig, HttpTranscriber,
};

#[derive(Parser, Debug)]
#[command(name = "callscribe", about = "Call audio capture and transcription service")]
struct Args {
    /// Configuration file (without extension)
    #[arg(long, default_value = "config/callscribe")]
    config: String,

    /// Override the HTTP bind address from the config file
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)
        .with_context(|| format!("Failed to load config '{}'", args.config))?;

    info!("{} starting", cfg.service.name);

    let capture_config = CaptureSessionConfig {
        cadence: Duration::from_millis(cfg.capture.cadence_ms),
        stop_grace: Duration::from_millis(cfg.capture.stop_grace_ms),
        sample_rate: cfg.capture.sample_rate,
        channels: cfg.capture.channels,
    };

    let transcriber = Arc::new(HttpTranscriber::new(
        cfg.transcription.endpoint.clone(),
        cfg.transcription.model.clone(),
        cfg.settings.api_key.clone(),
        cfg.settings.language.clone(),
    ));

    if cfg.settings.api_key.trim().is_empty() {
        warn!("No API key configured: segments will be captured but not transcribed");
    }

    // Reference wiring: a host integration replaces this factory with real
    // tab/microphone capture
    let backend_config = AudioBackendConfig {
        sample_rate: cfg.capture.sample_rate,
        channels: cfg.capture.channels,
        buffer_duration_ms: 100,
    };
    let backend_factory: BackendFactory = Box::new(move |source| {
        Ok(Box::new(SilenceBackend::new(source, backend_config.clone())) as Box<dyn AudioBackend>)
    });

    let coordinator = Coordinator::spawn(
        CoordinatorConfig {
            capture: capture_config,
            settings: cfg.settings.clone(),
            state_path: PathBuf::from(&cfg.storage.state_path),
            export_dir: PathBuf::from(&cfg.storage.export_dir),
            export_delay: Duration::from_millis(cfg.storage.export_delay_ms),
        },
        backend_factory,
        transcriber,
    )
    .await;

    if cfg.settings.auto_start || cfg.settings.auto_stop {
        // PresenceDetector::run needs a page probe, which only a host
        // integration can supply; the reference binary exposes auto start
        // via POST /recording/auto-start instead
        warn!("auto_start/auto_stop are set but no presence probe is wired in this binary");
    }

    let state = AppState {
        coordinator,
        requestor: Arc::new(AnalysisRequestor::new(cfg.analysis.clone())),
        settings: cfg.settings.clone(),
        export_dir: PathBuf::from(&cfg.storage.export_dir),
    };

    let router = create_router(state);

    let bind = args.bind.unwrap_or_else(|| {
        format!("{}:{}", cfg.service.http.bind, cfg.service.http.port)
    });
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;

    info!("HTTP server listening on {}", bind);
    axum::serve(listener, router)
        .await
        .context("HTTP server failed")?;

    Ok(())
}
