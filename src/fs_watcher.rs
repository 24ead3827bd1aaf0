use crossbeam::channel::{Sender, unbounded};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::warn;

const DEBOUNCE: Duration = Duration::from_millis(250);

/// Watches the settings file and sends its path whenever it changes.
pub struct WatchWorker {
    _thread: thread::JoinHandle<()>,
}

impl WatchWorker {
    pub fn start(file: PathBuf, tx: Sender<PathBuf>) -> Self {
        let handle = thread::spawn(move || {
            let (inner_tx, inner_rx) = unbounded::<notify::Result<Event>>();

            let mut watcher = match RecommendedWatcher::new(
                move |res| {
                    let _ = inner_tx.send(res);
                },
                Config::default(),
            ) {
                Ok(w) => w,
                Err(e) => {
                    warn!("settings watcher unavailable: {e}");
                    return;
                }
            };

            // Editors often replace the file, so watch the directory instead
            let dir = watch_dir(&file);
            if let Err(e) = watcher.watch(&dir, RecursiveMode::NonRecursive) {
                warn!(dir = %dir.display(), "cannot watch settings directory: {e}");
                return;
            }

            let mut last_fire = Instant::now()
                .checked_sub(Duration::from_secs(1))
                .unwrap_or_else(Instant::now);

            while let Ok(res) = inner_rx.recv() {
                let Ok(event) = res else { continue };

                if !is_relevant(&event, &file) {
                    continue;
                }

                if last_fire.elapsed() < DEBOUNCE {
                    continue;
                }
                last_fire = Instant::now();

                if tx.send(file.clone()).is_err() {
                    break;
                }
            }
        });

        Self { _thread: handle }
    }
}

fn watch_dir(file: &Path) -> PathBuf {
    match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn is_relevant(event: &Event, file: &Path) -> bool {
    if matches!(event.kind, EventKind::Access(_) | EventKind::Other) {
        return false;
    }
    event
        .paths
        .iter()
        .any(|p| p.file_name().is_some() && p.file_name() == file.file_name())
}
