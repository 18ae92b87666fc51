//! Daemon loop: input events + change flags → frames.
//!
//! - key events are handled as they arrive and re-rendered synchronously
//! - config, palette and i3 flags are polled every tick
//! - workspaces are re-queried every second, reconnecting to i3/sway
//!   if the connection is down
//!
//! On shutdown the watchers are dropped, the writer drains, and one black
//! frame is written.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use keyglow_device::LightingDevice;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::context::LightingContext;
use crate::input::KeyEvent;
use crate::logging::LogHandle;
use crate::sink::{self, FrameSink};
use crate::watcher::FlagWatcher;
use crate::workspace::{self, I3Client, WorkspaceSource};

/// Flag poll interval
pub const TICK: Duration = Duration::from_millis(250);

/// Workspace poll interval
pub const WORKSPACE_POLL: Duration = Duration::from_secs(1);

/// Where workspace occupancy comes from when tracking is enabled
enum SourceFactory {
    /// Locate i3/sway and subscribe to window events
    Discover,
    /// Use a fixed source (tests, previews)
    Fixed(Arc<dyn WorkspaceSource>),
}

/// Workspace source plus its event listener, following the config switch
struct WorkspaceTracker {
    factory: SourceFactory,
    enabled: bool,
    source: Option<Arc<dyn WorkspaceSource>>,
    listener: Option<JoinHandle<()>>,
    events: Arc<AtomicBool>,
    /// Connection failures after the first are logged at debug
    warned: bool,
}

impl WorkspaceTracker {
    fn new(factory: SourceFactory) -> Self {
        Self {
            factory,
            enabled: false,
            source: None,
            listener: None,
            events: Arc::new(AtomicBool::new(false)),
            warned: false,
        }
    }

    /// Start or stop tracking
    async fn configure(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            if self.source.is_some() {
                info!("Workspace tracking disabled");
            }
            self.stop();
            return;
        }
        self.warned = false;
        self.connect().await;
    }

    /// Attach a source while tracking is on and none is connected, and
    /// restart the event listener if it ended.
    async fn connect(&mut self) {
        if !self.enabled {
            return;
        }
        if self.source.is_none() {
            match &self.factory {
                SourceFactory::Fixed(source) => self.source = Some(Arc::clone(source)),
                SourceFactory::Discover => match I3Client::connect().await {
                    Ok(client) => {
                        info!("Tracking workspaces via i3/sway IPC");
                        self.source = Some(Arc::new(client));
                        self.warned = false;
                    }
                    Err(e) if !self.warned => {
                        warn!("Workspace tracking unavailable, retrying: {e}");
                        self.warned = true;
                    }
                    Err(e) => debug!("i3/sway still unavailable: {e}"),
                },
            }
        }
        let discovered = matches!(self.factory, SourceFactory::Discover);
        let listening = self
            .listener
            .as_ref()
            .is_some_and(|listener| !listener.is_finished());
        if discovered && self.source.is_some() && !listening {
            self.listener = Some(workspace::spawn_window_listener(Arc::clone(&self.events)));
        }
    }

    fn stop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
        self.source = None;
    }

    fn take_event(&self) -> bool {
        self.events.swap(false, Ordering::SeqCst)
    }

    /// Re-query occupancy. Returns true if it changed.
    ///
    /// A failed query clears the set, so workspace rules stop painting
    /// until the source answers again.
    async fn refresh(&mut self, ctx: &LightingContext) -> bool {
        let next = match self.source.clone() {
            Some(source) => match source.non_empty_workspaces().await {
                Ok(set) => Some(set),
                Err(e) => {
                    warn!("Error getting workspaces: {e}");
                    if matches!(self.factory, SourceFactory::Discover) {
                        // Reconnect on a later poll
                        self.stop();
                        self.warned = true;
                    }
                    None
                }
            },
            None => None,
        };
        if ctx.workspaces() == next {
            return false;
        }
        debug!("Updated workspaces: {next:?}");
        ctx.set_workspaces(next);
        true
    }
}

impl Drop for WorkspaceTracker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// File watchers for the config and palette files
#[derive(Default)]
struct Watchers {
    config: Option<FlagWatcher>,
    palette: Option<FlagWatcher>,
}

impl Watchers {
    fn watch(path: &std::path::Path, what: &str) -> Option<FlagWatcher> {
        FlagWatcher::new(path)
            .map_err(|e| warn!("Cannot watch {what} file {}: {e}", path.display()))
            .ok()
    }

    /// (Re)create the palette watcher if the palette path changed
    fn follow_palette(&mut self, ctx: &LightingContext) {
        let settings = ctx.settings();
        if !settings.pywal {
            self.palette = None;
            return;
        }
        let path = settings.palette_path();
        if self.palette.as_ref().map(FlagWatcher::path) != Some(path.as_path()) {
            self.palette = Self::watch(&path, "palette");
        }
    }
}

/// The long-running lighting service
pub struct Daemon<D> {
    ctx: Arc<LightingContext>,
    device: D,
    factory: SourceFactory,
    log: Option<LogHandle>,
    watch_files: bool,
}

impl<D: LightingDevice + 'static> Daemon<D> {
    pub fn new(ctx: Arc<LightingContext>, device: D) -> Self {
        Self {
            ctx,
            device,
            factory: SourceFactory::Discover,
            log: None,
            watch_files: true,
        }
    }

    /// Use a fixed workspace source instead of i3 discovery
    pub fn with_workspace_source(mut self, source: Arc<dyn WorkspaceSource>) -> Self {
        self.factory = SourceFactory::Fixed(source);
        self
    }

    /// Re-apply the config log level on reload
    pub fn with_log_handle(mut self, log: LogHandle) -> Self {
        self.log = Some(log);
        self
    }

    /// Disable config/palette file watching
    pub fn without_file_watch(mut self) -> Self {
        self.watch_files = false;
        self
    }

    /// Run until `running` is cleared.
    pub async fn run(
        self,
        mut events: UnboundedReceiver<KeyEvent>,
        running: Arc<AtomicBool>,
    ) -> anyhow::Result<()> {
        let Self {
            ctx,
            device,
            factory,
            log,
            watch_files,
        } = self;

        let settings = ctx.settings();
        if let Some(log) = &log {
            log.apply_config_level(settings.log_level());
        }

        let mut watchers = Watchers::default();
        if watch_files {
            watchers.config = Watchers::watch(ctx.config_path(), "config");
            watchers.follow_palette(&ctx);
        }

        let mut workspaces = WorkspaceTracker::new(factory);
        workspaces.configure(settings.workspace_tracking).await;
        workspaces.refresh(&ctx).await;

        let sink = FrameSink::spawn(device);
        sink.submit(ctx.render_current());
        info!("Ready. Ctrl+C to stop.");

        let mut tick = tokio::time::interval(TICK);
        let mut workspace_poll = tokio::time::interval(WORKSPACE_POLL);
        let mut input_open = true;

        while running.load(Ordering::SeqCst) {
            tokio::select! {
                event = events.recv(), if input_open => match event {
                    Some(event) => {
                        let transition = ctx.handle_key(&event.key, event.state);
                        if transition.refresh_workspaces {
                            workspaces.refresh(&ctx).await;
                        }
                        if transition.refresh {
                            sink.submit(ctx.render_current());
                        }
                    }
                    None => {
                        warn!("All input readers stopped");
                        input_open = false;
                        ctx.clear_keys();
                        sink.submit(ctx.render_current());
                    }
                },
                _ = tick.tick() => {
                    let mut dirty = false;

                    if watchers.config.as_ref().is_some_and(FlagWatcher::take) {
                        match ctx.reload_config() {
                            Ok(snapshot) => {
                                if let Some(log) = &log {
                                    log.apply_config_level(snapshot.settings.log_level());
                                }
                                workspaces.configure(snapshot.settings.workspace_tracking).await;
                                workspaces.refresh(&ctx).await;
                                if watch_files {
                                    watchers.follow_palette(&ctx);
                                }
                                dirty = true;
                            }
                            Err(e) => warn!("Error reloading config: {e}"),
                        }
                    }

                    if watchers.palette.as_ref().is_some_and(FlagWatcher::take) {
                        info!("Pywal colors updated");
                        ctx.reload_palette();
                        dirty = true;
                    }

                    if workspaces.take_event() && workspaces.refresh(&ctx).await {
                        dirty = true;
                    }

                    if dirty {
                        sink.submit(ctx.render_current());
                    }
                },
                _ = workspace_poll.tick() => {
                    workspaces.connect().await;
                    if workspaces.refresh(&ctx).await {
                        sink.submit(ctx.render_current());
                    }
                },
            }
        }

        info!("Shutting down");
        drop(watchers);
        drop(workspaces);
        if let Some(mut device) = sink.close().await {
            sink::blank(&mut device).await;
        }
        info!("Done.");
        Ok(())
    }
}
