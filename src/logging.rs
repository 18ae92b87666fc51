//! Log setup.
//!
//! Level precedence: `RUST_LOG`, then `--log-level`, then the config
//! file's `log` switch. Only the last one can change at runtime; the filter
//! sits behind a reload layer so a config reload can re-apply it.

use tracing::{debug, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

/// Handle for adjusting the log level after startup
#[derive(Clone)]
pub struct LogHandle {
    handle: reload::Handle<EnvFilter, Registry>,
    /// Level fixed by `RUST_LOG` or `--log-level`
    pinned: bool,
}

impl LogHandle {
    /// Apply the level implied by the config file, unless pinned.
    pub fn apply_config_level(&self, level: &str) {
        if self.pinned {
            return;
        }
        match self.handle.reload(EnvFilter::new(level)) {
            Ok(()) => debug!("Log level set to {level}"),
            Err(e) => warn!("Failed to change log level: {e}"),
        }
    }
}

/// Install the global subscriber.
///
/// `config_level` is used when neither `RUST_LOG` nor `cli_level` is set.
pub fn init(cli_level: Option<&str>, config_level: &str) -> LogHandle {
    let (filter, pinned) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => match cli_level {
            Some(level) => (EnvFilter::new(level), true),
            None => (EnvFilter::new(config_level), false),
        },
    };
    let (filter, handle) = reload::Layer::new(filter);

    // A second init (tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init();

    LogHandle { handle, pinned }
}
