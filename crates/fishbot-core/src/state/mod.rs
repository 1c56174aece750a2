//! Fishing-cycle state machine
//!
//! A fixed set of named states, each consuming one captured frame and
//! returning the next state. The dispatch table is built once at startup;
//! transitions are logged and re-entrant returns are no-ops unless forced.

pub mod casting_bait;
pub mod checking_rod;
pub mod finishing;
pub mod playing_minigame;
pub mod starting;
pub mod waiting_for_bite;

pub use casting_bait::CastingBait;
pub use checking_rod::CheckingRod;
pub use finishing::Finishing;
pub use playing_minigame::PlayingMinigame;
pub use starting::Starting;
pub use waiting_for_bite::WaitingForBite;

use std::collections::HashMap;
use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::BotConfig;
use crate::frame::Frame;
use crate::geometry::CaptureRegion;
use crate::retry::RetryHandler;
use crate::session::SessionStats;
use crate::traits::{InputControl, Vision};

/// The six states of the fishing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateId {
    Starting,
    CheckingRod,
    CastingBait,
    WaitingForBite,
    PlayingMinigame,
    Finishing,
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StateId::Starting => "STARTING",
            StateId::CheckingRod => "CHECKING_ROD",
            StateId::CastingBait => "CASTING_BAIT",
            StateId::WaitingForBite => "WAITING_FOR_BITE",
            StateId::PlayingMinigame => "PLAYING_MINIGAME",
            StateId::Finishing => "FINISHING",
        };
        f.write_str(name)
    }
}

/// What the machine does when a state exceeds its soft timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeoutPolicy {
    /// Detect and log only.
    Ignore,
    /// Count the timeout, release held input and force-reset to STARTING.
    Restart,
}

/// Collaborators every state works against for one frame.
pub struct Ctx<'a> {
    pub vision: &'a mut dyn Vision,
    pub input: &'a mut dyn InputControl,
    pub config: &'a BotConfig,
    pub stats: &'a mut SessionStats,
    pub screen: CaptureRegion,
}

/// One state of the cycle: consume a frame, return the next state.
pub trait BotState {
    fn handle(&mut self, ctx: &mut Ctx<'_>, frame: &Frame) -> StateId;

    /// Called when the machine (re-)enters this state.
    fn on_enter(&mut self) {}
}

/// Sleep helper that tolerates the delay-free test configuration.
pub(crate) fn pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}

/// Click `pos` and confirm the prompt actually went away, retrying with
/// backoff. Returns false when the screen never changed.
pub(crate) fn confirm_click(
    ctx: &mut Ctx<'_>,
    retry: &RetryHandler,
    template: &str,
    pos: (i32, i32),
) -> bool {
    let settle = ctx.config.default_delay;
    let result = retry.execute(
        || {
            ctx.input.click_at(pos.0, pos.1);
            pause(settle);
            let Some(frame) = ctx.vision.capture() else {
                return Ok(false);
            };
            Ok(ctx.vision.find(&frame, template, 5).is_none())
        },
        |confirmed| *confirmed,
        |attempt, delay| debug!(attempt, ?delay, template, "retrying confirm click"),
    );
    matches!(result, Ok(Some(true)))
}

/// Deterministic cycle of states keyed by [`StateId`]. The table is
/// populated once; `handle` runs the current state against each frame.
pub struct StateMachine {
    states: HashMap<StateId, Box<dyn BotState>>,
    current: Option<StateId>,
    entered_at: Option<Instant>,
}

impl StateMachine {
    /// Build the full dispatch table for the fishing cycle.
    pub fn new() -> Self {
        let mut states: HashMap<StateId, Box<dyn BotState>> = HashMap::new();
        states.insert(StateId::Starting, Box::new(Starting::new()));
        states.insert(StateId::CheckingRod, Box::new(CheckingRod::new()));
        states.insert(StateId::CastingBait, Box::new(CastingBait::new()));
        states.insert(StateId::WaitingForBite, Box::new(WaitingForBite::new()));
        states.insert(StateId::PlayingMinigame, Box::new(PlayingMinigame::new()));
        states.insert(StateId::Finishing, Box::new(Finishing::new()));
        Self {
            states,
            current: None,
            entered_at: None,
        }
    }

    pub fn current(&self) -> Option<StateId> {
        self.current
    }

    pub fn entered_at(&self) -> Option<Instant> {
        self.entered_at
    }

    /// Switch to `next`. Re-entering the active state is a no-op unless
    /// `force` requests a reset. Returns whether a transition happened.
    pub fn set_state(&mut self, next: StateId, force: bool) -> bool {
        if !force && self.current == Some(next) {
            return false;
        }

        match self.current {
            None => info!(state = %next, "starting state machine"),
            Some(prev) if prev != next => info!(from = %prev, to = %next, "changing state"),
            Some(_) => info!(state = %next, "forcing state reset"),
        }

        self.current = Some(next);
        self.entered_at = Some(Instant::now());
        if let Some(state) = self.states.get_mut(&next) {
            state.on_enter();
        }
        true
    }

    /// True when the active state has exceeded its configured soft timeout.
    pub fn timed_out(&self, config: &BotConfig) -> bool {
        let (Some(current), Some(entered_at)) = (self.current, self.entered_at) else {
            return false;
        };
        config
            .state_timeouts
            .get(&current)
            .is_some_and(|limit| entered_at.elapsed() > *limit)
    }

    /// Feed one frame to the active state and apply its transition.
    pub fn handle(&mut self, ctx: &mut Ctx<'_>, frame: &Frame) {
        let Some(current) = self.current else {
            return;
        };

        if self.timed_out(ctx.config) {
            warn!(state = %current, policy = ?ctx.config.timeout_policy, "state timed out");
            match ctx.config.timeout_policy {
                TimeoutPolicy::Ignore => {}
                TimeoutPolicy::Restart => {
                    ctx.stats.add_timeout();
                    ctx.input.release_all_controls();
                    self.set_state(StateId::Starting, true);
                    return;
                }
            }
        }

        let next = self
            .states
            .get_mut(&current)
            .expect("dispatch table covers every state")
            .handle(ctx, frame);
        self.set_state(next, false);
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
