//! PLAYING_MINIGAME: steer the fish with held direction keys

use std::time::Duration;

use tracing::info;

use super::{confirm_click, pause, BotState, Ctx, StateId};
use crate::frame::Frame;
use crate::retry::RetryHandler;
use crate::traits::Key;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Left,
    Right,
}

impl Direction {
    fn template(self) -> &'static str {
        match self {
            Direction::Left => "left_arrow",
            Direction::Right => "right_arrow",
        }
    }

    fn key(self) -> Key {
        match self {
            Direction::Left => Key::Char('a'),
            Direction::Right => Key::Char('d'),
        }
    }
}

pub struct PlayingMinigame {
    held: Option<Direction>,
    retry: RetryHandler,
}

impl PlayingMinigame {
    pub fn new() -> Self {
        Self {
            held: None,
            retry: RetryHandler::new(
                3,
                Duration::from_millis(300),
                Duration::from_secs(2),
                true,
            ),
        }
    }

    /// Hold the key for `direction` while its arrow prompt is visible,
    /// switching sides with a debounce so opposing prompts cannot flutter
    /// the keys.
    fn handle_arrow(&mut self, ctx: &mut Ctx<'_>, frame: &Frame, direction: Direction) {
        if ctx.vision.find(frame, direction.template(), 0).is_none() {
            return;
        }
        if self.held == Some(direction) {
            return;
        }

        if let Some(previous) = self.held.take() {
            info!(from = ?previous, to = ?direction, "switching held direction");
            ctx.input.key_up(previous.key());
        } else {
            info!(?direction, "holding direction");
        }
        ctx.input.key_down(direction.key());
        self.held = Some(direction);
        pause(ctx.config.switch_delay);
    }

    fn release_held(&mut self, ctx: &mut Ctx<'_>) {
        ctx.input.release_all_controls();
        self.held = None;
    }

    /// Shared exit path once the minigame has resolved.
    fn finish(&mut self, ctx: &mut Ctx<'_>, failed: bool) -> StateId {
        ctx.stats.add_cycle();
        if ctx.config.quick_finish {
            info!("quick finishing");
            ctx.input.press_key(Key::Esc);
            pause(ctx.config.finish_wait_delay);
            return StateId::Starting;
        }
        if failed {
            // An escaped fish can take the rod with it.
            pause(ctx.config.minigame_fail_delay);
            StateId::CheckingRod
        } else {
            StateId::Finishing
        }
    }
}

impl Default for PlayingMinigame {
    fn default() -> Self {
        Self::new()
    }
}

impl BotState for PlayingMinigame {
    fn handle(&mut self, ctx: &mut Ctx<'_>, frame: &Frame) -> StateId {
        if ctx.vision.find(frame, "success", 1).is_some() {
            info!("fish caught");
            ctx.stats.add_catch();
            self.release_held(ctx);
            return self.finish(ctx, false);
        }

        if ctx.vision.find(frame, "failure", 1).is_some() {
            info!("fish got away");
            ctx.stats.add_escape();
            self.release_held(ctx);
            return self.finish(ctx, true);
        }

        if let Some(pos) = ctx.vision.find(frame, "continue", 5) {
            info!("continue prompt mid-minigame, instant catch");
            self.release_held(ctx);
            ctx.stats.add_catch();
            if !confirm_click(ctx, &self.retry, "continue", pos) {
                info!("continue click never confirmed, finishing anyway");
            }
            return self.finish(ctx, false);
        }

        self.handle_arrow(ctx, frame, Direction::Left);
        self.handle_arrow(ctx, frame, Direction::Right);
        StateId::PlayingMinigame
    }

    fn on_enter(&mut self) {
        self.held = None;
    }
}
