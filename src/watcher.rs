//! File-change flags.
//!
//! Watches the parent directory of one file (inotify via `notify`) and
//! raises an [`AtomicBool`] when that file is created or modified. The
//! daemon loop consumes the flag with [`FlagWatcher::take`].

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

/// Level-triggered "file changed" flag
pub struct FlagWatcher {
    _watcher: RecommendedWatcher,
    flag: Arc<AtomicBool>,
    path: PathBuf,
}

impl FlagWatcher {
    /// Watch `path`. Its directory is created if missing so a file that
    /// does not exist yet is picked up once written.
    pub fn new(path: &Path) -> notify::Result<Self> {
        let dir = match path.parent() {
            Some(d) if !d.as_os_str().is_empty() => d.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(notify::Error::io)?;

        let file_name: Option<OsString> = path.file_name().map(|n| n.to_os_string());
        let flag = Arc::new(AtomicBool::new(false));
        let event_flag = Arc::clone(&flag);

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                        return;
                    }
                    let hit = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if hit {
                        event_flag.store(true, Ordering::SeqCst);
                    }
                }
                Err(e) => warn!("File watch error: {e}"),
            },
            Config::default(),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        debug!("Watching {}", path.display());

        Ok(Self {
            _watcher: watcher,
            flag,
            path: path.to_path_buf(),
        })
    }

    /// Consume the flag: true if the file changed since the last call
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::SeqCst)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait_for(w: &FlagWatcher) -> bool {
        let deadline = Instant::now() + Duration::from_secs(3);
        while Instant::now() < deadline {
            if w.take() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        false
    }

    #[test]
    fn test_flag_raised_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("colors");
        let w = FlagWatcher::new(&path).unwrap();
        assert!(!w.take());

        std::fs::write(&path, "#000000\n").unwrap();
        assert!(wait_for(&w));
        // Consumed
        assert!(!w.take());
    }

    #[test]
    fn test_other_files_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let w = FlagWatcher::new(&dir.path().join("config.toml")).unwrap();
        std::fs::write(dir.path().join("other.txt"), "x").unwrap();
        std::thread::sleep(Duration::from_millis(300));
        assert!(!w.take());
    }

    #[test]
    fn test_missing_directory_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wal").join("colors");
        let w = FlagWatcher::new(&path).unwrap();
        assert!(dir.path().join("wal").is_dir());
        assert_eq!(w.path(), path.as_path());
    }
}
