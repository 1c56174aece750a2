//! CHECKING_ROD: verify rod integrity, replace a broken rod

use tracing::{info, warn};

use super::{pause, BotState, Ctx, StateId};
use crate::frame::Frame;
use crate::traits::{Key, MouseButton};

/// Rod quality tiers, probed best to worst.
const ROD_TIERS: [&str; 3] = ["flex_rod", "sturdy_rod", "reg_rod"];
/// Base-resolution position of the replacement rod in the equipment menu.
const REPLACEMENT_ROD: (i32, i32) = (1650, 580);
/// Search radius that absorbs small detection-window drift on the rod HUD.
const ROD_SEARCH_RADIUS: u32 = 5;

pub struct CheckingRod;

impl CheckingRod {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CheckingRod {
    fn default() -> Self {
        Self::new()
    }
}

impl BotState for CheckingRod {
    fn handle(&mut self, ctx: &mut Ctx<'_>, frame: &Frame) -> StateId {
        pause(ctx.config.default_delay);

        let rod_ok = ROD_TIERS
            .iter()
            .any(|tier| ctx.vision.find(frame, tier, ROD_SEARCH_RADIUS).is_some());

        if rod_ok {
            pause(ctx.config.default_delay);
            info!("rod ok");
            return StateId::CastingBait;
        }

        warn!("broken rod, replacing");
        ctx.stats.add_rod_break();
        pause(ctx.config.default_delay);

        ctx.input.press_key(Key::Char('m'));
        pause(ctx.config.post_click_delay);

        let (x, y) = ctx.screen.to_screen(REPLACEMENT_ROD.0, REPLACEMENT_ROD.1);
        ctx.input.move_to(x, y);
        pause(ctx.config.move_settle_delay);
        ctx.input.move_to(x, y);
        pause(ctx.config.move_settle_delay);
        ctx.input.click(MouseButton::Left);
        pause(ctx.config.post_click_delay);

        info!("rod replaced");
        StateId::CastingBait
    }
}
