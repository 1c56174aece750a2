//! Fishing automation for Blue Protocol: Star Resonance.

mod bot;
mod controller;
mod screen;
mod watcher;

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use fishbot_core::{BotConfig, Result, TimeoutPolicy};

use bot::{FishingBot, RunLimits};
use screen::WindowMode;

#[derive(Parser)]
#[command(name = "fishbot", about = "Automated fishing for Blue Protocol: Star Resonance")]
struct Cli {
    /// Where to find the game on screen.
    #[arg(long, value_enum, default_value_t = WindowMode::Auto)]
    window: WindowMode,

    /// Fixed capture resolution as WIDTHxHEIGHT, overriding discovery.
    #[arg(long, value_parser = parse_resolution)]
    resolution: Option<(u32, u32)>,

    /// Control-loop pacing in frames per second; 0 disables pacing.
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Dismiss the result screen with Escape instead of waiting for the
    /// continue prompt.
    #[arg(long)]
    quick_finish: bool,

    /// What to do when a state exceeds its timeout.
    #[arg(long, value_enum, default_value_t = OnTimeout::Ignore)]
    on_timeout: OnTimeout,

    /// Stop after this many completed fishing cycles.
    #[arg(long)]
    max_cycles: Option<u32>,

    /// Stop after this many seconds.
    #[arg(long)]
    run_secs: Option<u64>,

    /// Directory holding the reference template images.
    #[arg(long, default_value = "assets/templates")]
    assets_dir: PathBuf,

    /// Directory holding per-resolution region override files.
    #[arg(long, default_value = "config")]
    config_dir: PathBuf,

    /// Capture synchronously instead of on a background thread.
    #[arg(long)]
    no_async_capture: bool,

    /// Verbose logging (RUST_LOG still takes precedence).
    #[arg(long)]
    debug: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OnTimeout {
    Ignore,
    Restart,
}

fn parse_resolution(value: &str) -> std::result::Result<(u32, u32), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got \"{value}\""))?;
    let width: u32 = width.trim().parse().map_err(|_| format!("bad width in \"{value}\""))?;
    let height: u32 = height.trim().parse().map_err(|_| format!("bad height in \"{value}\""))?;
    if width == 0 || height == 0 {
        return Err("resolution dimensions must be non-zero".to_string());
    }
    Ok((width, height))
}

fn init_logging(debug: bool) {
    let default_level = if debug { "fishbot=debug,info" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let region = screen::resolve_capture_region(cli.window, cli.resolution)?;

    let config = BotConfig {
        quick_finish: cli.quick_finish,
        target_fps: cli.fps,
        timeout_policy: match cli.on_timeout {
            OnTimeout::Ignore => TimeoutPolicy::Ignore,
            OnTimeout::Restart => TimeoutPolicy::Restart,
        },
        ..BotConfig::default()
    };

    let limits = RunLimits {
        max_cycles: cli.max_cycles,
        run_for: cli.run_secs.map(Duration::from_secs),
    };

    let mut bot = FishingBot::new(
        config,
        region,
        cli.assets_dir,
        cli.config_dir,
        !cli.no_async_capture,
        limits,
    )?;

    // Ctrl-C asks the loop to stop so held keys are released and the
    // session report still gets written.
    let stop = bot.stop_handle();
    ctrlc::set_handler(move || {
        info!("interrupt received");
        stop.store(true, Ordering::SeqCst);
    })?;

    bot.run()
}
