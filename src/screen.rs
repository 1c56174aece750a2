//! Capture-region discovery
//!
//! Locates the game window and derives the client-area rectangle the bot
//! captures and clicks inside. Window frames on the reference platform
//! carry an 8 px border and a 32 px title bar, so a windowed client area
//! is the reported window rectangle shrunk by 16x39 pixels.

use clap::ValueEnum;
use tracing::{info, warn};
use xcap::{Monitor, Window};

use fishbot_core::{CaptureRegion, BASE_HEIGHT, BASE_WIDTH};

pub const GAME_WINDOW_TITLE: &str = "Blue Protocol: Star Resonance";

/// Window frame insets applied in windowed mode.
const FRAME_BORDER: i32 = 8;
const FRAME_TITLE_BAR: i32 = 32;
const FRAME_WIDTH_LOSS: u32 = 16;
const FRAME_HEIGHT_LOSS: u32 = 39;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WindowMode {
    /// Use the game window's client area when the window is found,
    /// otherwise the primary monitor.
    Auto,
    /// Capture the primary monitor.
    Fullscreen,
    /// Capture the game window's client area; error when it is missing.
    Windowed,
}

/// Resolve where to capture. `custom` pins the region size regardless of
/// what is on screen.
pub fn resolve_capture_region(
    mode: WindowMode,
    custom: Option<(u32, u32)>,
) -> fishbot_core::Result<CaptureRegion> {
    if let Some((width, height)) = custom {
        let origin = primary_origin();
        info!(width, height, "using fixed capture resolution");
        return Ok(CaptureRegion::new(origin.0, origin.1, width, height));
    }

    match mode {
        WindowMode::Fullscreen => Ok(primary_region()),
        WindowMode::Windowed => {
            game_window_region()?.ok_or_else(|| {
                anyhow::anyhow!("game window \"{GAME_WINDOW_TITLE}\" not found")
            })
        }
        WindowMode::Auto => match game_window_region() {
            Ok(Some(region)) => Ok(region),
            Ok(None) => {
                info!("game window not found, capturing the primary monitor");
                Ok(primary_region())
            }
            Err(err) => {
                warn!(%err, "window enumeration failed, capturing the primary monitor");
                Ok(primary_region())
            }
        },
    }
}

/// Client area of the game window, or `None` when no window matches.
fn game_window_region() -> fishbot_core::Result<Option<CaptureRegion>> {
    for window in Window::all()? {
        let title = match window.title() {
            Ok(title) => title,
            Err(_) => continue,
        };
        if !title.contains(GAME_WINDOW_TITLE) {
            continue;
        }
        if window.is_minimized().unwrap_or(false) {
            warn!("game window is minimized, ignoring it");
            continue;
        }

        let x = window.x()?;
        let y = window.y()?;
        let width = window.width()?;
        let height = window.height()?;

        let region = if covers_a_monitor(x, y, width, height) {
            // Borderless fullscreen reports no frame to subtract.
            CaptureRegion::new(x, y, width, height)
        } else {
            CaptureRegion::new(
                x + FRAME_BORDER,
                y + FRAME_TITLE_BAR,
                width.saturating_sub(FRAME_WIDTH_LOSS),
                height.saturating_sub(FRAME_HEIGHT_LOSS),
            )
        };
        info!(
            left = region.left,
            top = region.top,
            width = region.width,
            height = region.height,
            "found game window"
        );
        return Ok(Some(region));
    }
    Ok(None)
}

fn covers_a_monitor(x: i32, y: i32, width: u32, height: u32) -> bool {
    let Ok(monitors) = Monitor::all() else {
        return false;
    };
    monitors.iter().any(|m| {
        matches!(
            (m.x(), m.y(), m.width(), m.height()),
            (Ok(mx), Ok(my), Ok(mw), Ok(mh))
                if mx == x && my == y && mw == width && mh == height
        )
    })
}

fn primary_region() -> CaptureRegion {
    let Ok(monitors) = Monitor::all() else {
        return fallback_region();
    };
    let primary = monitors
        .iter()
        .find(|m| m.is_primary().unwrap_or(false))
        .or_else(|| monitors.first());
    match primary {
        Some(m) => match (m.x(), m.y(), m.width(), m.height()) {
            (Ok(x), Ok(y), Ok(w), Ok(h)) => CaptureRegion::new(x, y, w, h),
            _ => fallback_region(),
        },
        None => fallback_region(),
    }
}

fn primary_origin() -> (i32, i32) {
    let region = primary_region();
    (region.left, region.top)
}

fn fallback_region() -> CaptureRegion {
    warn!("no monitor information, assuming {BASE_WIDTH}x{BASE_HEIGHT} at the origin");
    CaptureRegion::new(0, 0, BASE_WIDTH, BASE_HEIGHT)
}
