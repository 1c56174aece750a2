//! Bot assembly and control loop
//!
//! Wires the capture service, detector, input backend and state machine
//! together, paces the perception loop and tears everything down in an
//! order that cannot leave keys held or threads running.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use fishbot_core::traits::{InputControl, Vision};
use fishbot_core::{
    BotConfig, CaptureRegion, Result, RoiRegistry, SessionStats, StateId, StateMachine,
};
use fishbot_cv::{capture, load_templates, CaptureService, DetectionConfig, Detector};

use crate::controller::EnigoControl;
use crate::watcher::ConfigWatcher;

const OVERRIDE_POLL_INTERVAL: Duration = Duration::from_secs(2);
const CAPTURE_MISS_BACKOFF: Duration = Duration::from_millis(100);

/// Optional stopping conditions for an unattended run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunLimits {
    pub max_cycles: Option<u32>,
    pub run_for: Option<Duration>,
}

pub struct FishingBot {
    config: BotConfig,
    region: CaptureRegion,
    detector: Detector,
    input: EnigoControl,
    machine: StateMachine,
    stats: SessionStats,
    watcher: Option<ConfigWatcher>,
    limits: RunLimits,
    stop: Arc<AtomicBool>,
}

impl FishingBot {
    pub fn new(
        config: BotConfig,
        region: CaptureRegion,
        assets_dir: PathBuf,
        override_dir: PathBuf,
        background_capture: bool,
        limits: RunLimits,
    ) -> Result<Self> {
        capture::ensure_available()?;

        let rois = Arc::new(Mutex::new(RoiRegistry::with_default_bindings(&override_dir)));

        let detection = DetectionConfig {
            assets_dir,
            ..DetectionConfig::default()
        };
        let templates = load_templates(&detection)?;

        let service = CaptureService::new(region, Some(config.target_fps), background_capture);
        let mut detector = Detector::new(templates, Arc::clone(&rois), Some(service));
        detector.update_region(region);

        let input = EnigoControl::new(config.move_settle_delay)?;

        // React to hand edits of the region override file while running.
        let override_path = rois
            .lock()
            .map_err(|_| anyhow::anyhow!("region registry poisoned"))?
            .override_path(region.width, region.height);
        let watcher_rois = Arc::clone(&rois);
        let watcher = ConfigWatcher::spawn(override_path, OVERRIDE_POLL_INTERVAL, move || {
            if let Ok(mut rois) = watcher_rois.lock() {
                rois.reload();
            }
        });

        Ok(Self {
            config,
            region,
            detector,
            input,
            machine: StateMachine::new(),
            stats: SessionStats::new(),
            watcher: Some(watcher),
            limits,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Flag that asks the control loop to stop after the current frame,
    /// shutting down cleanly. Safe to set from a signal handler.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Run the fishing cycle until a limit is hit.
    pub fn run(&mut self) -> Result<()> {
        info!(
            left = self.region.left,
            top = self.region.top,
            width = self.region.width,
            height = self.region.height,
            "starting session"
        );
        self.stats.start_session();
        self.machine.set_state(StateId::Starting, true);

        let deadline = self.limits.run_for.map(|budget| Instant::now() + budget);
        let frame_interval = self.config.frame_interval();

        loop {
            if let Some(reason) = stop_reason(&self.stop, self.stats.cycles(), self.limits, deadline)
            {
                info!(reason, "stopping");
                break;
            }

            let started = Instant::now();
            let Some(frame) = self.detector.capture() else {
                warn!("no frame available");
                thread::sleep(CAPTURE_MISS_BACKOFF);
                continue;
            };

            let mut ctx = fishbot_core::state::Ctx {
                vision: &mut self.detector,
                input: &mut self.input,
                config: &self.config,
                stats: &mut self.stats,
                screen: self.region,
            };
            self.machine.handle(&mut ctx, &frame);

            // Hand back the unused part of the frame budget.
            if let Some(interval) = frame_interval {
                let elapsed = started.elapsed();
                if elapsed < interval {
                    thread::sleep(interval - elapsed);
                }
            }
        }

        self.shutdown();
        Ok(())
    }

    fn shutdown(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            watcher.stop();
        }
        self.detector.shutdown();
        self.input.release_all_controls();

        match serde_json::to_string(&self.stats.summary()) {
            Ok(report) => info!(%report, "session report"),
            Err(err) => error!(%err, "could not serialize the session report"),
        }
        info!(
            elapsed = self.stats.elapsed_formatted(),
            cycles = self.stats.cycles(),
            caught = self.stats.fish_caught(),
            escaped = self.stats.fish_escaped(),
            rod_breaks = self.stats.rod_breaks(),
            timeouts = self.stats.timeouts(),
            fish_per_hour = format!("{:.1}", self.stats.fish_per_hour()),
            "session totals"
        );
    }
}

/// Why the control loop should stop now, if at all. The stop flag wins
/// over the optional run limits.
fn stop_reason(
    stop: &AtomicBool,
    cycles: u32,
    limits: RunLimits,
    deadline: Option<Instant>,
) -> Option<&'static str> {
    if stop.load(Ordering::SeqCst) {
        return Some("stop requested");
    }
    if limits.max_cycles.is_some_and(|max| cycles >= max) {
        return Some("cycle limit reached");
    }
    if deadline.is_some_and(|d| Instant::now() >= d) {
        return Some("time limit reached");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_run_is_stopped_by_the_flag_alone() {
        let stop = AtomicBool::new(false);
        assert_eq!(stop_reason(&stop, 10_000, RunLimits::default(), None), None);

        stop.store(true, Ordering::SeqCst);
        assert_eq!(
            stop_reason(&stop, 10_000, RunLimits::default(), None),
            Some("stop requested")
        );
    }

    #[test]
    fn cycle_limit_stops_once_reached() {
        let stop = AtomicBool::new(false);
        let limits = RunLimits {
            max_cycles: Some(5),
            run_for: None,
        };
        assert_eq!(stop_reason(&stop, 4, limits, None), None);
        assert_eq!(stop_reason(&stop, 5, limits, None), Some("cycle limit reached"));
    }

    #[test]
    fn past_deadline_stops_the_loop() {
        let stop = AtomicBool::new(false);
        let deadline = Instant::now() - Duration::from_millis(1);
        assert_eq!(
            stop_reason(&stop, 0, RunLimits::default(), Some(deadline)),
            Some("time limit reached")
        );
        let later = Instant::now() + Duration::from_secs(60);
        assert_eq!(stop_reason(&stop, 0, RunLimits::default(), Some(later)), None);
    }
}
