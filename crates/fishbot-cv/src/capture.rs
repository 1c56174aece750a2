//! Screen capture
//!
//! Synchronous region grabs via the platform capture backend, plus an
//! optional background thread that keeps only the latest frame in a
//! single-slot buffer so consumers never block on the backend and never
//! read a backlog of stale frames.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use image::DynamicImage;
use tracing::{debug, error, info, warn};
use xcap::Monitor;

use fishbot_core::{CaptureRegion, Frame};

/// Failures grabbing the screen.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("no monitors available for capture")]
    NoMonitors,
    #[error("capture of {0:?} produced an empty frame")]
    EmptyFrame(CaptureRegion),
    #[error(transparent)]
    Backend(#[from] xcap::XCapError),
}

/// Verify a monitor exists before spinning anything up.
pub fn ensure_available() -> Result<(), CaptureError> {
    let monitors = Monitor::all()?;
    if monitors.is_empty() {
        return Err(CaptureError::NoMonitors);
    }
    Ok(())
}

/// Grab `region` from whichever monitor contains its origin, falling back
/// to the first monitor when the origin lies outside every display.
pub fn grab_region(region: CaptureRegion) -> Result<Frame, CaptureError> {
    let monitors = Monitor::all()?;
    let monitor = monitors
        .iter()
        .find(|m| monitor_contains(m, region.left, region.top))
        .or_else(|| monitors.first())
        .ok_or(CaptureError::NoMonitors)?;

    let mon_x = monitor.x()?;
    let mon_y = monitor.y()?;
    let screenshot = monitor.capture_image()?;

    // Crop relative to the monitor's own origin.
    let crop_x = (region.left - mon_x).max(0) as u32;
    let crop_y = (region.top - mon_y).max(0) as u32;
    let crop_w = region.width.min(screenshot.width().saturating_sub(crop_x));
    let crop_h = region.height.min(screenshot.height().saturating_sub(crop_y));
    if crop_w == 0 || crop_h == 0 {
        return Err(CaptureError::EmptyFrame(region));
    }

    let cropped = image::imageops::crop_imm(&screenshot, crop_x, crop_y, crop_w, crop_h).to_image();
    let rgb = DynamicImage::ImageRgba8(cropped).to_rgb8();
    Ok(Frame::new(rgb, region.left, region.top))
}

fn monitor_contains(monitor: &Monitor, x: i32, y: i32) -> bool {
    let (Ok(mx), Ok(my), Ok(mw), Ok(mh)) =
        (monitor.x(), monitor.y(), monitor.width(), monitor.height())
    else {
        return false;
    };
    x >= mx && x < mx + mw as i32 && y >= my && y < my + mh as i32
}

const DEFAULT_INTERVAL: Duration = Duration::from_millis(33);
const WORKER_ERROR_BACKOFF: Duration = Duration::from_millis(100);
const STOP_JOIN_BUDGET: Duration = Duration::from_secs(1);

/// Background capture loop with a latest-wins frame slot.
pub struct AsyncCapture {
    slot: Arc<Mutex<Option<Frame>>>,
    region: Arc<Mutex<CaptureRegion>>,
    running: Arc<AtomicBool>,
    interval: Duration,
    handle: Option<JoinHandle<()>>,
}

impl AsyncCapture {
    /// `fps = None` falls back to roughly 30 grabs per second.
    pub fn new(region: CaptureRegion, fps: Option<u32>) -> Self {
        let interval = fps
            .filter(|fps| *fps > 0)
            .map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
            .unwrap_or(DEFAULT_INTERVAL);
        Self {
            slot: Arc::new(Mutex::new(None)),
            region: Arc::new(Mutex::new(region)),
            running: Arc::new(AtomicBool::new(false)),
            interval,
            handle: None,
        }
    }

    pub fn start(&mut self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let slot = Arc::clone(&self.slot);
        let region = Arc::clone(&self.region);
        let running = Arc::clone(&self.running);
        let interval = self.interval;

        self.handle = Some(thread::spawn(move || {
            info!("capture worker started");
            while running.load(Ordering::SeqCst) {
                let target = match region.lock() {
                    Ok(region) => *region,
                    Err(_) => break,
                };
                match grab_region(target) {
                    Ok(frame) => {
                        if let Ok(mut slot) = slot.lock() {
                            *slot = Some(frame);
                        }
                        thread::sleep(interval);
                    }
                    Err(err) => {
                        // Transient backend hiccups are normal around
                        // display reconfiguration; keep trying.
                        debug!(%err, "capture failed");
                        thread::sleep(WORKER_ERROR_BACKOFF);
                    }
                }
            }
            info!("capture worker stopped");
        }));
    }

    /// Signal the worker and wait a bounded time for it to exit. A worker
    /// wedged inside the backend is detached rather than waited on.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        let Some(handle) = self.handle.take() else {
            return;
        };
        let deadline = Instant::now() + STOP_JOIN_BUDGET;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                warn!("capture worker did not stop in time, detaching");
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        let _ = handle.join();
    }

    /// Private copy of the most recent frame, if any has landed yet.
    pub fn latest(&self) -> Option<Frame> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }

    pub fn update_region(&self, region: CaptureRegion) {
        if let Ok(mut current) = self.region.lock() {
            *current = region;
        }
        // Drop the stale frame so nobody acts on the old geometry.
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for AsyncCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Frame source for the detector: serves from the background worker when
/// one is running, grabs synchronously otherwise.
pub struct CaptureService {
    region: CaptureRegion,
    worker: Option<AsyncCapture>,
}

impl CaptureService {
    pub fn new(region: CaptureRegion, fps: Option<u32>, background: bool) -> Self {
        let worker = background.then(|| {
            let mut worker = AsyncCapture::new(region, fps);
            worker.start();
            worker
        });
        Self { region, worker }
    }

    pub fn region(&self) -> CaptureRegion {
        self.region
    }

    pub fn capture(&mut self) -> Option<Frame> {
        if let Some(worker) = &self.worker {
            if let Some(frame) = worker.latest() {
                return Some(frame);
            }
            // Worker has not produced anything yet; fall through to a
            // synchronous grab so the first cycle is not starved.
        }
        match grab_region(self.region) {
            Ok(frame) => Some(frame),
            Err(err) => {
                error!(%err, "screen capture failed");
                None
            }
        }
    }

    pub fn update_region(&mut self, region: CaptureRegion) {
        self.region = region;
        if let Some(worker) = &self.worker {
            worker.update_region(region);
        }
    }

    pub fn shutdown(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn async_capture_stop_without_start_is_a_no_op() {
        let mut capture = AsyncCapture::new(CaptureRegion::default(), Some(30));
        capture.stop();
        assert!(!capture.is_running());
        assert!(capture.latest().is_none());
    }

    #[test]
    fn update_region_clears_the_stale_frame() {
        let capture = AsyncCapture::new(CaptureRegion::default(), None);
        {
            let mut slot = capture.slot.lock().unwrap();
            *slot = Some(Frame::new(image::RgbImage::new(4, 4), 0, 0));
        }
        capture.update_region(CaptureRegion::new(100, 50, 800, 600));
        assert!(capture.latest().is_none());
        assert_eq!(*capture.region.lock().unwrap(), CaptureRegion::new(100, 50, 800, 600));
    }

    #[test]
    fn fps_zero_falls_back_to_default_interval() {
        let capture = AsyncCapture::new(CaptureRegion::default(), Some(0));
        assert_eq!(capture.interval, DEFAULT_INTERVAL);
    }
}
