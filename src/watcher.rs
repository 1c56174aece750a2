//! Override-file change watcher
//!
//! Polls a file's modification time on a background thread and invokes a
//! callback when it advances. A missing file is not an event; neither is
//! the first observation of an existing file.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime};

use tracing::{debug, info, warn};

const STOP_JOIN_BUDGET: Duration = Duration::from_secs(1);

pub struct ConfigWatcher {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ConfigWatcher {
    pub fn spawn<F>(path: PathBuf, interval: Duration, mut on_change: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let handle = thread::spawn(move || {
            info!(path = %path.display(), "watching for edits");
            let mut known = mtime_of(&path);
            while flag.load(Ordering::SeqCst) {
                thread::sleep(interval);
                let current = mtime_of(&path);
                match (known, current) {
                    (Some(old), Some(new)) if new > old => {
                        debug!(path = %path.display(), "file changed");
                        on_change();
                    }
                    _ => {}
                }
                known = current.or(known);
            }
        });

        Self {
            running,
            handle: Some(handle),
        }
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        let Some(handle) = self.handle.take() else {
            return;
        };
        let deadline = Instant::now() + STOP_JOIN_BUDGET;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                warn!("watcher did not stop in time, detaching");
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        let _ = handle.join();
    }
}

impl Drop for ConfigWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn mtime_of(path: &std::path::Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|meta| meta.modified()).ok()
}
