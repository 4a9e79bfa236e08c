//! Configuration file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::{load_config, ConfigError};
use crate::config::schema::GatewayConfig;

const POLL_INTERVAL: Duration = Duration::from_secs(2);
const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Watches the configuration file and feeds validated configs into the
/// reload channel. Files that fail to parse or validate never reach the
/// channel; the active snapshot keeps serving.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<GatewayConfig>,
}

impl ConfigWatcher {
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<GatewayConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned watcher must stay alive for events to
    /// keep flowing.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, update_tx } = self;
        let watch_path = path.clone();
        let mut debounce = Debounce::new(DEBOUNCE_WINDOW);

        let mut watcher = RecommendedWatcher::new(
            move |event: notify::Result<Event>| match event {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    if debounce.admit() {
                        reload_file(&path, &update_tx);
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Filesystem watch failed"),
            },
            Config::default().with_poll_interval(POLL_INTERVAL),
        )?;

        watcher.watch(&watch_path, RecursiveMode::NonRecursive)?;
        tracing::info!(path = %watch_path.display(), "Watching configuration file for changes");
        Ok(watcher)
    }
}

/// Editors and atomic saves fire several filesystem events per change;
/// only the first event within the window triggers a reload.
struct Debounce {
    window: Duration,
    last: Option<Instant>,
}

impl Debounce {
    fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    fn admit(&mut self) -> bool {
        if self.last.is_some_and(|t| t.elapsed() < self.window) {
            return false;
        }
        self.last = Some(Instant::now());
        true
    }
}

/// Reload the file and queue the config if it passes validation.
fn reload_file(path: &Path, update_tx: &mpsc::UnboundedSender<GatewayConfig>) {
    match load_config(path) {
        Ok(config) => {
            tracing::info!(
                path = %path.display(),
                routes = config.routes.len(),
                clusters = config.clusters.len(),
                "Configuration changed, queuing reload"
            );
            let _ = update_tx.send(config);
        }
        Err(ConfigError::Validation(errors)) => {
            for error in &errors {
                tracing::error!(path = %path.display(), %error, "Rejected configuration change");
            }
        }
        Err(e) => {
            tracing::error!(
                path = %path.display(),
                error = %e,
                "Unreadable configuration change, keeping the active one"
            );
        }
    }
}
