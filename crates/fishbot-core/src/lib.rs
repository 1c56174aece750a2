//! Fishbot Domain Library
//!
//! Resolution-aware geometry, adaptive detection thresholds, retry/backoff,
//! session accounting and the fishing-cycle state machine. Perception and
//! input delivery live behind the traits in [`traits`] so the cycle logic
//! stays testable without a screen or a game window.

pub mod config;
pub mod frame;
pub mod geometry;
pub mod retry;
pub mod roi;
pub mod session;
pub mod state;
pub mod threshold;

// Re-export commonly used types
pub use config::BotConfig;
pub use frame::Frame;
pub use geometry::{CaptureRegion, Rect, BASE_HEIGHT, BASE_WIDTH};
pub use retry::RetryHandler;
pub use roi::{RoiBinding, RoiRegistry};
pub use session::SessionStats;
pub use state::{BotState, StateId, StateMachine, TimeoutPolicy};
pub use threshold::ThresholdTracker;

// Error handling
pub type Result<T> = anyhow::Result<T>;

/// Collaborator seams for the perception/action cycle
pub mod traits {
    use crate::frame::Frame;

    /// Keyboard keys the bot drives. `Char` keys are game bindings
    /// (interact, menu, movement); `Esc` dismisses result screens.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Key {
        Char(char),
        Esc,
    }

    /// Mouse buttons the bot drives.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum MouseButton {
        Left,
        Right,
    }

    /// Trait for locating UI templates in captured frames.
    pub trait Vision {
        /// Search `frame` for `template`; `radius` enables the concentric
        /// ring fallback around the template's search region. Returns the
        /// match center in screen coordinates.
        fn find(&mut self, frame: &Frame, template: &str, radius: u32) -> Option<(i32, i32)>;

        /// Grab the latest frame of the capture region.
        fn capture(&mut self) -> Option<Frame>;
    }

    /// Trait for synthetic input delivery. Implementations log and swallow
    /// delivery errors; a dropped key event is a transient fault the retry
    /// layer compensates for.
    pub trait InputControl {
        fn move_to(&mut self, x: i32, y: i32);
        fn click(&mut self, button: MouseButton);
        fn click_at(&mut self, x: i32, y: i32);
        fn press_key(&mut self, key: Key);
        fn key_down(&mut self, key: Key);
        fn key_up(&mut self, key: Key);
        fn release_all_controls(&mut self);
    }
}
