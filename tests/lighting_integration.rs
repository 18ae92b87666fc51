//! End-to-end daemon tests against the in-memory device.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use keyglow::config::Config;
use keyglow::context::{LightingContext, Snapshot};
use keyglow::daemon::Daemon;
use keyglow::input::KeyEvent;
use keyglow::workspace::{StaticWorkspaces, WorkspaceError, WorkspaceSource};
use keyglow_device::{CellBuffer, MemoryDevice, Rgb};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;

const ROWS: usize = 6;
const COLS: usize = 22;

const CONFIG: &str = r#"
pywal = false

[key_positions]
numbers = [[1, 1], [1, 2], [1, 3], [1, 4]]

[modes.base]
rules = [{ keys = "all", color = [10, 10, 10] }]

[modes.super]
rules = [
    { keys = "numbers", condition = "non_empty_workspaces", value = true, color = [255, 0, 0] },
]

[modes.q_d]
rules = [{ keys = ["q", "d"], color = [0, 0, 255] }]

[modes.q]
rules = [{ keys = "q", color = [0, 255, 0] }]
"#;

/// Answers once, then fails every query
#[derive(Default)]
struct FailsAfterFirst {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl WorkspaceSource for FailsAfterFirst {
    async fn non_empty_workspaces(&self) -> Result<BTreeSet<String>, WorkspaceError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(["1".to_string()].into_iter().collect())
        } else {
            Err(WorkspaceError::Unavailable("window manager gone".into()))
        }
    }
}

fn occupied_1_and_3() -> Arc<dyn WorkspaceSource> {
    let workspaces: BTreeSet<String> = ["1", "3"].iter().map(|s| s.to_string()).collect();
    Arc::new(StaticWorkspaces(workspaces))
}

struct Harness {
    ctx: Arc<LightingContext>,
    device: MemoryDevice,
    tx: UnboundedSender<KeyEvent>,
    running: Arc<AtomicBool>,
    task: JoinHandle<anyhow::Result<()>>,
}

impl Harness {
    fn start(config_path: &Path, watch_files: bool) -> Self {
        Self::start_with(config_path, watch_files, occupied_1_and_3())
    }

    fn start_with(config_path: &Path, watch_files: bool, source: Arc<dyn WorkspaceSource>) -> Self {
        let config = Config::load(config_path).unwrap();
        let ctx = Arc::new(LightingContext::new(
            config_path,
            Snapshot::load(config, ROWS, COLS),
        ));
        let device = MemoryDevice::new(ROWS, COLS);

        let mut daemon =
            Daemon::new(Arc::clone(&ctx), device.clone()).with_workspace_source(source);
        if !watch_files {
            daemon = daemon.without_file_watch();
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let running = Arc::new(AtomicBool::new(true));
        let task = tokio::spawn(daemon.run(rx, Arc::clone(&running)));
        Self {
            ctx,
            device,
            tx,
            running,
            task,
        }
    }

    async fn wait_for(&self, what: &str, pred: impl Fn(&CellBuffer) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if self.device.last_frame().is_some_and(|f| pred(&f)) {
                return;
            }
            assert!(Instant::now() < deadline, "timed out waiting for {what}");
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    /// Drop the sender, as if every input reader had exited
    fn close_input(&mut self) {
        let (closed, _) = mpsc::unbounded_channel();
        self.tx = closed;
    }

    async fn stop(self) -> MemoryDevice {
        self.running.store(false, Ordering::SeqCst);
        self.task.await.unwrap().unwrap();
        self.device
    }
}

fn write_config(dir: &tempfile::TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, content).unwrap();
    path
}

/// Atomic replace, so the watcher never sees a half-written file
fn replace_file(path: &Path, content: &str) {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, content).unwrap();
    std::fs::rename(&tmp, path).unwrap();
}

fn count(frame: &CellBuffer, color: Rgb) -> usize {
    frame.cells().iter().filter(|c| **c == color).count()
}

#[tokio::test]
async fn test_initial_frame_and_final_blank() {
    let dir = tempfile::tempdir().unwrap();
    let h = Harness::start(&write_config(&dir, CONFIG), false);

    h.wait_for("base frame", |f| count(f, Rgb::new(10, 10, 10)) == ROWS * COLS)
        .await;

    let device = h.stop().await;
    let last = device.last_frame().unwrap();
    assert_eq!(count(&last, Rgb::BLACK), ROWS * COLS);
}

#[tokio::test]
async fn test_super_shows_workspaces() {
    let dir = tempfile::tempdir().unwrap();
    let h = Harness::start(&write_config(&dir, CONFIG), false);
    h.tx.send(KeyEvent::down("super")).unwrap();

    h.wait_for("workspace frame", |f| count(f, Rgb::RED) == 2).await;
    let frame = h.device.last_frame().unwrap();
    assert_eq!(frame.get(1, 1), Some(Rgb::RED));
    assert_eq!(frame.get(1, 2), Some(Rgb::BLACK));
    assert_eq!(frame.get(1, 3), Some(Rgb::RED));

    // Releasing a modifier re-renders base
    h.tx.send(KeyEvent::up("super")).unwrap();
    h.wait_for("base frame", |f| count(f, Rgb::new(10, 10, 10)) == ROWS * COLS)
        .await;
    h.stop().await;
}

#[tokio::test]
async fn test_combo_then_sticky_release() {
    let dir = tempfile::tempdir().unwrap();
    let h = Harness::start(&write_config(&dir, CONFIG), false);

    h.tx.send(KeyEvent::down("q")).unwrap();
    h.wait_for("q mode", |f| f.get(2, 1) == Some(Rgb::GREEN)).await;

    h.tx.send(KeyEvent::down("d")).unwrap();
    h.wait_for("q_d mode", |f| count(f, Rgb::BLUE) == 2).await;

    // d still held: no "d" mode, so base
    h.tx.send(KeyEvent::up("q")).unwrap();
    h.wait_for("base after release", |f| {
        count(f, Rgb::new(10, 10, 10)) == ROWS * COLS
    })
    .await;

    // Last non-modifier release keeps the previous frame
    let flushes = h.device.flush_count();
    h.tx.send(KeyEvent::up("d")).unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(h.device.flush_count(), flushes);
    h.stop().await;
}

#[tokio::test]
async fn test_config_reload_from_file_watch() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, CONFIG);
    let h = Harness::start(&path, true);
    h.wait_for("base frame", |f| f.get(0, 0) == Some(Rgb::new(10, 10, 10)))
        .await;

    let updated = CONFIG.replace("[10, 10, 10]", "[0, 255, 0]");
    replace_file(&path, &updated);
    h.wait_for("reloaded frame", |f| count(f, Rgb::GREEN) == ROWS * COLS)
        .await;

    // A broken file keeps the current configuration
    replace_file(&path, "modes = [");
    tokio::time::sleep(Duration::from_millis(600)).await;
    h.tx.send(KeyEvent::down("ctrl")).unwrap();
    h.tx.send(KeyEvent::up("ctrl")).unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(count(&h.device.last_frame().unwrap(), Rgb::GREEN), ROWS * COLS);
    h.stop().await;
}

#[tokio::test]
async fn test_failed_workspace_query_disables_workspace_rules() {
    let dir = tempfile::tempdir().unwrap();
    let h = Harness::start_with(
        &write_config(&dir, CONFIG),
        false,
        Arc::new(FailsAfterFirst::default()),
    );
    h.wait_for("base frame", |f| count(f, Rgb::new(10, 10, 10)) == ROWS * COLS)
        .await;

    // The first poll fails and clears the set
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(h.ctx.workspaces(), None);

    // super only has the workspace rule, which is now a no-op
    h.tx.send(KeyEvent::down("super")).unwrap();
    h.wait_for("blank super frame", |f| count(f, Rgb::BLACK) == ROWS * COLS)
        .await;
    assert_eq!(h.device.last_frame().unwrap().get(1, 1), Some(Rgb::BLACK));
    h.stop().await;
}

#[tokio::test]
async fn test_input_loss_returns_to_base() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::start(&write_config(&dir, CONFIG), false);

    h.tx.send(KeyEvent::down("q")).unwrap();
    h.wait_for("q mode", |f| f.get(2, 1) == Some(Rgb::GREEN)).await;

    h.close_input();
    h.wait_for("base after input loss", |f| {
        count(f, Rgb::new(10, 10, 10)) == ROWS * COLS
    })
    .await;
    assert_eq!(h.ctx.current_mode(), "base");
    h.stop().await;
}
