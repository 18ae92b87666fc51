//! `keyglow run`

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use keyglow::config::Config;
use keyglow::context::{LightingContext, Snapshot};
use keyglow::daemon::Daemon;
use keyglow::input;
use keyglow::logging::LogHandle;
use keyglow_device::LightingDevice;
use tokio::sync::mpsc;
use tracing::info;

use super::CommandResult;

/// Run the lighting daemon until Ctrl-C.
pub async fn run(config_path: PathBuf, log: LogHandle) -> CommandResult {
    // No keyboard is the one fatal startup error
    let keyboard = super::open_keyboard().await?;
    let (rows, cols) = keyboard.grid_dimensions();

    info!("Config: {}", config_path.display());
    let config = Config::load_or_default(&config_path);
    let ctx = Arc::new(LightingContext::new(
        config_path,
        Snapshot::load(config, rows, cols),
    ));

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })
    .ok();

    let (tx, rx) = mpsc::unbounded_channel();
    let readers = input::spawn_readers(tx, Arc::clone(&running));
    info!("{} input reader(s) started", readers.len());

    Daemon::new(ctx, keyboard)
        .with_log_handle(log)
        .run(rx, running)
        .await
}
