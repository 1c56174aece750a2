//! FINISHING: dismiss the result screen and restart the cycle

use std::time::{Duration, Instant};

use tracing::info;

use super::{confirm_click, pause, BotState, Ctx, StateId};
use crate::frame::Frame;
use crate::retry::RetryHandler;

pub struct Finishing {
    entered: Option<Instant>,
    retry: RetryHandler,
}

impl Finishing {
    pub fn new() -> Self {
        Self {
            entered: None,
            retry: RetryHandler::new(
                3,
                Duration::from_millis(300),
                Duration::from_secs(2),
                true,
            ),
        }
    }
}

impl Default for Finishing {
    fn default() -> Self {
        Self::new()
    }
}

impl BotState for Finishing {
    fn handle(&mut self, ctx: &mut Ctx<'_>, frame: &Frame) -> StateId {
        let entered = *self.entered.get_or_insert_with(Instant::now);

        if let Some(pos) = ctx.vision.find(frame, "continue", 5) {
            if !confirm_click(ctx, &self.retry, "continue", pos) {
                info!("continue click never confirmed, restarting anyway");
            }
            pause(ctx.config.finish_wait_delay);
            self.entered = None;
            return StateId::Starting;
        }

        // Give the result screen a moment to render before concluding it
        // was already dismissed.
        if entered.elapsed() < ctx.config.finish_grace {
            return StateId::Finishing;
        }

        info!("result screen already gone");
        self.entered = None;
        StateId::Starting
    }

    fn on_enter(&mut self) {
        self.entered = Some(Instant::now());
    }
}
