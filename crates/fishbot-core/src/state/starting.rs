//! STARTING: find a fishing spot and enter fishing mode

use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::{pause, BotState, Ctx, StateId};
use crate::frame::Frame;
use crate::traits::Key;

/// How often the bot nudges movement while searching for a spot.
const SEARCH_NUDGE_INTERVAL: Duration = Duration::from_secs(2);
/// Length of one diagonal movement tap.
const NUDGE_TAP: Duration = Duration::from_millis(100);

/// Base-resolution confirm point of the reconnect prompt.
const RECONNECT_CONFIRM: (i32, i32) = (1100, 795);

pub struct Starting {
    last_nudge: Option<Instant>,
}

impl Starting {
    pub fn new() -> Self {
        Self { last_nudge: None }
    }
}

impl Default for Starting {
    fn default() -> Self {
        Self::new()
    }
}

impl BotState for Starting {
    fn handle(&mut self, ctx: &mut Ctx<'_>, frame: &Frame) -> StateId {
        if ctx.vision.find(frame, "connect_server", 5).is_some() {
            let (x, y) = ctx.screen.to_screen(RECONNECT_CONFIRM.0, RECONNECT_CONFIRM.1);
            ctx.input.move_to(x, y);
            pause(ctx.config.move_settle_delay);
            ctx.input.move_to(x, y);
            pause(ctx.config.move_settle_delay);
            ctx.input.click(crate::traits::MouseButton::Left);
            pause(ctx.config.post_click_delay);
            info!("confirmed server reconnect prompt");
        }

        if let Some(pos) = ctx.vision.find(frame, "fishing_spot_btn", 5) {
            info!(?pos, "fishing spot detected, entering fishing mode");
            pause(ctx.config.move_settle_delay);
            ctx.input.press_key(Key::Char('f'));
            pause(ctx.config.enter_fishing_delay);
            return StateId::CheckingRod;
        }

        if ctx.vision.find(frame, "level_check", 5).is_some() {
            info!("already in fishing mode, skipping interaction");
            return StateId::CheckingRod;
        }

        // No spot on screen: nudge diagonally every couple of seconds to
        // bring one into view.
        let due = self
            .last_nudge
            .map_or(true, |t| t.elapsed() >= SEARCH_NUDGE_INTERVAL);
        if due {
            debug!("searching for fishing spot");
            ctx.input.key_down(Key::Char('s'));
            ctx.input.key_down(Key::Char('d'));
            pause(NUDGE_TAP);
            ctx.input.key_up(Key::Char('s'));
            ctx.input.key_up(Key::Char('d'));
            self.last_nudge = Some(Instant::now());
        }

        StateId::Starting
    }

    fn on_enter(&mut self) {
        self.last_nudge = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BotConfig;
    use crate::geometry::CaptureRegion;
    use crate::session::SessionStats;
    use crate::state::test_support::*;
    use crate::traits::MouseButton;

    fn run(vision: &mut FakeVision, input: &mut FakeInput) -> StateId {
        let config = BotConfig::instantaneous();
        let mut stats = SessionStats::new();
        let frame = test_frame();
        let mut ctx = Ctx {
            vision,
            input,
            config: &config,
            stats: &mut stats,
            screen: CaptureRegion::default(),
        };
        Starting::new().handle(&mut ctx, &frame)
    }

    #[test]
    fn fishing_spot_transitions_without_reconnect_click() {
        let mut vision = FakeVision::with(&[("fishing_spot_btn", (1460, 567))]);
        let mut input = FakeInput::default();

        let next = run(&mut vision, &mut input);

        assert_eq!(next, StateId::CheckingRod);
        assert_eq!(input.events, vec![InputEvent::PressKey(Key::Char('f'))]);
    }

    #[test]
    fn reconnect_prompt_is_clicked_first() {
        let mut vision = FakeVision::with(&[
            ("connect_server", (1196, 796)),
            ("fishing_spot_btn", (1460, 567)),
        ]);
        let mut input = FakeInput::default();

        let next = run(&mut vision, &mut input);

        assert_eq!(next, StateId::CheckingRod);
        assert_eq!(
            &input.events[..3],
            &[
                InputEvent::MoveTo(1100, 795),
                InputEvent::MoveTo(1100, 795),
                InputEvent::Click(MouseButton::Left),
            ]
        );
    }

    #[test]
    fn already_fishing_skips_interaction() {
        let mut vision = FakeVision::with(&[("level_check", (1125, 999))]);
        let mut input = FakeInput::default();

        let next = run(&mut vision, &mut input);

        assert_eq!(next, StateId::CheckingRod);
        assert!(input.events.is_empty());
    }

    #[test]
    fn no_spot_nudges_and_stays() {
        let mut vision = FakeVision::default();
        let mut input = FakeInput::default();

        let next = run(&mut vision, &mut input);

        assert_eq!(next, StateId::Starting);
        assert_eq!(
            input.events,
            vec![
                InputEvent::KeyDown(Key::Char('s')),
                InputEvent::KeyDown(Key::Char('d')),
                InputEvent::KeyUp(Key::Char('s')),
                InputEvent::KeyUp(Key::Char('d')),
            ]
        );
    }

    #[test]
    fn nudges_are_rate_limited() {
        let mut state = Starting::new();
        let config = BotConfig::instantaneous();
        let mut stats = SessionStats::new();
        let mut vision = FakeVision::default();
        let mut input = FakeInput::default();
        let frame = test_frame();

        for _ in 0..3 {
            let mut ctx = Ctx {
                vision: &mut vision,
                input: &mut input,
                config: &config,
                stats: &mut stats,
                screen: CaptureRegion::default(),
            };
            state.handle(&mut ctx, &frame);
        }

        // Only the first frame inside the interval taps the keys.
        assert_eq!(input.events.len(), 4);
    }
}
