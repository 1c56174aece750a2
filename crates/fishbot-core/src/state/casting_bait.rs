//! CASTING_BAIT: cast the line

use tracing::info;

use super::{pause, BotState, Ctx, StateId};
use crate::frame::Frame;
use crate::traits::MouseButton;

pub struct CastingBait;

impl CastingBait {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CastingBait {
    fn default() -> Self {
        Self::new()
    }
}

impl BotState for CastingBait {
    fn handle(&mut self, ctx: &mut Ctx<'_>, _frame: &Frame) -> StateId {
        info!("casting bait");
        ctx.input.click(MouseButton::Left);
        pause(ctx.config.casting_delay);
        StateId::WaitingForBite
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BotConfig;
    use crate::geometry::CaptureRegion;
    use crate::session::SessionStats;
    use crate::state::test_support::*;

    #[test]
    fn casting_clicks_and_waits_for_bite() {
        let config = BotConfig::instantaneous();
        let mut stats = SessionStats::new();
        let mut vision = FakeVision::default();
        let mut input = FakeInput::default();
        let frame = test_frame();
        let mut ctx = Ctx {
            vision: &mut vision,
            input: &mut input,
            config: &config,
            stats: &mut stats,
            screen: CaptureRegion::default(),
        };

        let next = CastingBait::new().handle(&mut ctx, &frame);

        assert_eq!(next, StateId::WaitingForBite);
        assert_eq!(input.events, vec![InputEvent::Click(MouseButton::Left)]);
    }
}
