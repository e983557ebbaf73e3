//! Application entry point — persona stage.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] (defaults when no file exists).
//! 3. Create the [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the [`GenerationGateway`] from config.
//! 5. Create the worker channels (`request`, `message`).
//! 6. Spawn the [`GenerationWorker`] on the runtime.
//! 7. Run [`eframe::run_native`], which blocks the main thread until the
//!    window is closed.
//! 8. Close the request channel and give the worker 2 s to wind down.

use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;

use persona_stage::{
    app::StageApp,
    config::AppConfig,
    generation::{GatewayMessage, GenerationGateway, GenerationRequest, GenerationWorker},
};

/// Upper bound on how long shutdown waits for an in-flight generation call.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let size = [config.ui.screen_width as f32, config.ui.screen_height as f32];
    let vp = egui::ViewportBuilder::default()
        .with_title(config.ui.window_title.clone())
        .with_inner_size(size)
        .with_min_inner_size([320.0, 240.0]);

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("persona stage starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e:#}); using defaults");
        AppConfig::default()
    });
    log::info!(
        "{} personas configured, performing up to {}",
        config.personalities.len(),
        config.num_characters
    );

    // 3. Tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("failed to create tokio runtime: {e}");
            return Err(eframe::Error::AppCreation(Box::new(e)));
        }
    };

    // 4. Gateway (falls back to canned text when no model is available)
    let gateway = GenerationGateway::from_config(&config);
    if !gateway.available() {
        if config.has_model() {
            log::warn!("no usable model at {:?}; monologues will use fallback text", config.model_path);
        } else {
            log::info!("no model_path configured; monologues will use fallback text");
        }
    }

    // 5. Channels
    let (request_tx, request_rx) = mpsc::channel::<GenerationRequest>(4);
    let (message_tx, message_rx) = mpsc::channel::<GatewayMessage>(16);

    // 6. Worker
    rt.spawn(GenerationWorker::new(gateway).run(request_rx, message_tx));

    // 7. UI (blocks until the window is closed)
    let options = native_options(&config);
    let title = config.ui.window_title.clone();
    let result = eframe::run_native(
        &title,
        options,
        Box::new(move |cc| Ok(Box::new(StageApp::new(cc, &config, request_tx, message_rx)))),
    );

    // 8. Shutdown: the app (and with it request_tx) is gone, so the worker
    //    exits after its current call.
    log::info!("window closed; stopping generation worker");
    rt.shutdown_timeout(SHUTDOWN_TIMEOUT);
    result
}
