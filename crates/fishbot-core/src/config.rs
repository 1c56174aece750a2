//! Bot configuration
//!
//! Pacing, delays, per-state soft timeouts and cycle policies. All delays
//! are owned here so tests can run the cycle without wall-clock waits.

use std::collections::HashMap;
use std::time::Duration;

use crate::state::{StateId, TimeoutPolicy};

/// Runtime configuration for the fishing cycle.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Skip the post-catch result screen and restart the cycle immediately.
    pub quick_finish: bool,
    /// Control-loop pacing; 0 disables pacing entirely.
    pub target_fps: u32,
    /// Generic settle pause between probe and action.
    pub default_delay: Duration,
    /// Pause after positioning the cursor before acting on it.
    pub move_settle_delay: Duration,
    /// Pause after a click for the UI to respond.
    pub post_click_delay: Duration,
    /// Wait after the interact key before the fishing UI is up.
    pub enter_fishing_delay: Duration,
    /// Pause after casting before watching for a bite.
    pub casting_delay: Duration,
    /// Pause on the result screen before restarting the cycle.
    pub finish_wait_delay: Duration,
    /// How long FINISHING waits for the result screen to render before
    /// assuming it was already dismissed.
    pub finish_grace: Duration,
    /// Debounce between held-direction switches in the minigame.
    pub switch_delay: Duration,
    /// Pause before re-checking the rod after an escaped fish.
    pub minigame_fail_delay: Duration,
    /// Soft per-state timeouts; states without an entry never time out.
    pub state_timeouts: HashMap<StateId, Duration>,
    /// What the machine does when a state exceeds its soft timeout.
    pub timeout_policy: TimeoutPolicy,
}

impl BotConfig {
    /// Per-frame time budget for the control loop.
    pub fn frame_interval(&self) -> Option<Duration> {
        if self.target_fps == 0 {
            None
        } else {
            Some(Duration::from_secs_f64(1.0 / self.target_fps as f64))
        }
    }

    /// Delay-free configuration for tests and dry runs.
    pub fn instantaneous() -> Self {
        Self {
            default_delay: Duration::ZERO,
            move_settle_delay: Duration::ZERO,
            post_click_delay: Duration::ZERO,
            enter_fishing_delay: Duration::ZERO,
            casting_delay: Duration::ZERO,
            finish_wait_delay: Duration::ZERO,
            finish_grace: Duration::ZERO,
            switch_delay: Duration::ZERO,
            minigame_fail_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        let state_timeouts = HashMap::from([
            (StateId::Starting, Duration::from_secs(8)),
            (StateId::CheckingRod, Duration::from_secs(13)),
            (StateId::CastingBait, Duration::from_secs(13)),
            (StateId::WaitingForBite, Duration::from_secs(23)),
            (StateId::PlayingMinigame, Duration::from_secs(28)),
            (StateId::Finishing, Duration::from_secs(8)),
        ]);
        Self {
            quick_finish: false,
            target_fps: 60,
            default_delay: Duration::from_millis(300),
            move_settle_delay: Duration::from_millis(500),
            post_click_delay: Duration::from_secs(1),
            enter_fishing_delay: Duration::from_secs(2),
            casting_delay: Duration::from_millis(300),
            finish_wait_delay: Duration::from_millis(300),
            finish_grace: Duration::from_secs(2),
            switch_delay: Duration::from_millis(500),
            minigame_fail_delay: Duration::from_secs(2),
            state_timeouts,
            timeout_policy: TimeoutPolicy::Ignore,
        }
    }
}
