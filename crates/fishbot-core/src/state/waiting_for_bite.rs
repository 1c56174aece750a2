//! WAITING_FOR_BITE: watch for the bite indicator

use tracing::info;

use super::{pause, BotState, Ctx, StateId};
use crate::frame::Frame;
use crate::traits::MouseButton;

pub struct WaitingForBite;

impl WaitingForBite {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WaitingForBite {
    fn default() -> Self {
        Self::new()
    }
}

impl BotState for WaitingForBite {
    fn handle(&mut self, ctx: &mut Ctx<'_>, frame: &Frame) -> StateId {
        if ctx.vision.find(frame, "exclamation", 5).is_none() {
            return StateId::WaitingForBite;
        }

        info!("bite detected, hooking");
        ctx.input.click(MouseButton::Left);
        pause(ctx.config.default_delay);
        StateId::PlayingMinigame
    }
}
