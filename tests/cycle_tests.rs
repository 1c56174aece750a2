//! End-to-end runs of the fishing cycle against scripted vision and input.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use image::RgbImage;

use fishbot_core::state::Ctx;
use fishbot_core::traits::{InputControl, Key, MouseButton, Vision};
use fishbot_core::{BotConfig, CaptureRegion, Frame, SessionStats, StateId, StateMachine};

/// Vision backed by a set of currently visible templates. Templates in
/// `hide_on_capture` disappear the moment a fresh frame is grabbed, which
/// is how a prompt that was really clicked behaves.
#[derive(Default)]
struct ScriptedVision {
    visible: HashMap<String, (i32, i32)>,
    hide_on_capture: HashSet<String>,
}

impl ScriptedVision {
    fn show(&mut self, template: &str, pos: (i32, i32)) {
        self.visible.insert(template.to_string(), pos);
    }

    fn hide(&mut self, template: &str) {
        self.visible.remove(template);
    }

    fn clear(&mut self) {
        self.visible.clear();
    }
}

impl Vision for ScriptedVision {
    fn find(&mut self, _frame: &Frame, template: &str, _radius: u32) -> Option<(i32, i32)> {
        self.visible.get(template).copied()
    }

    fn capture(&mut self) -> Option<Frame> {
        for template in self.hide_on_capture.drain() {
            self.visible.remove(&template);
        }
        Some(frame())
    }
}

#[derive(Default)]
struct RecordingInput {
    clicks: u32,
    keys_pressed: Vec<Key>,
    held: HashSet<char>,
    releases: u32,
}

impl InputControl for RecordingInput {
    fn move_to(&mut self, _x: i32, _y: i32) {}

    fn click(&mut self, _button: MouseButton) {
        self.clicks += 1;
    }

    fn click_at(&mut self, _x: i32, _y: i32) {
        self.clicks += 1;
    }

    fn press_key(&mut self, key: Key) {
        self.keys_pressed.push(key);
    }

    fn key_down(&mut self, key: Key) {
        if let Key::Char(c) = key {
            self.held.insert(c);
        }
    }

    fn key_up(&mut self, key: Key) {
        if let Key::Char(c) = key {
            self.held.remove(&c);
        }
    }

    fn release_all_controls(&mut self) {
        self.held.clear();
        self.releases += 1;
    }
}

fn frame() -> Frame {
    Frame::new(RgbImage::new(1920, 1080), 0, 0)
}

fn step(
    machine: &mut StateMachine,
    vision: &mut ScriptedVision,
    input: &mut RecordingInput,
    config: &BotConfig,
    stats: &mut SessionStats,
) {
    let frame = frame();
    let mut ctx = Ctx {
        vision,
        input,
        config,
        stats,
        screen: CaptureRegion::default(),
    };
    machine.handle(&mut ctx, &frame);
}

#[test]
fn caught_fish_walks_every_state_and_counts_one_cycle() {
    let config = BotConfig::instantaneous();
    let mut stats = SessionStats::new();
    let mut vision = ScriptedVision::default();
    let mut input = RecordingInput::default();
    let mut machine = StateMachine::new();

    stats.start_session();
    machine.set_state(StateId::Starting, true);

    // A fishing spot is on screen; the bot enters fishing mode.
    vision.show("fishing_spot_btn", (1460, 567));
    step(&mut machine, &mut vision, &mut input, &config, &mut stats);
    assert_eq!(machine.current(), Some(StateId::CheckingRod));
    assert_eq!(input.keys_pressed, vec![Key::Char('f')]);

    // The rod HUD shows an intact rod.
    vision.clear();
    vision.show("reg_rod", (1700, 1000));
    step(&mut machine, &mut vision, &mut input, &config, &mut stats);
    assert_eq!(machine.current(), Some(StateId::CastingBait));

    // Cast.
    vision.clear();
    step(&mut machine, &mut vision, &mut input, &config, &mut stats);
    assert_eq!(machine.current(), Some(StateId::WaitingForBite));
    assert_eq!(input.clicks, 1);

    // No bite yet.
    step(&mut machine, &mut vision, &mut input, &config, &mut stats);
    assert_eq!(machine.current(), Some(StateId::WaitingForBite));

    // Bite indicator pops; the bot hooks.
    vision.show("exclamation", (955, 509));
    step(&mut machine, &mut vision, &mut input, &config, &mut stats);
    assert_eq!(machine.current(), Some(StateId::PlayingMinigame));
    assert_eq!(input.clicks, 2);

    // Steer left while the prompt shows.
    vision.clear();
    vision.show("left_arrow", (850, 540));
    step(&mut machine, &mut vision, &mut input, &config, &mut stats);
    assert_eq!(machine.current(), Some(StateId::PlayingMinigame));
    assert!(input.held.contains(&'a'));

    // The fish lands.
    vision.hide("left_arrow");
    vision.show("success", (995, 685));
    step(&mut machine, &mut vision, &mut input, &config, &mut stats);
    assert_eq!(machine.current(), Some(StateId::Finishing));
    assert!(input.held.is_empty());
    assert_eq!(stats.fish_caught(), 1);
    assert_eq!(stats.cycles(), 1);

    // Dismiss the result screen; the prompt vanishes once clicked.
    vision.clear();
    vision.show("continue", (1592, 979));
    vision.hide_on_capture.insert("continue".to_string());
    step(&mut machine, &mut vision, &mut input, &config, &mut stats);
    assert_eq!(machine.current(), Some(StateId::Starting));

    assert_eq!(stats.fish_escaped(), 0);
    assert_eq!(stats.rod_breaks(), 0);
}

#[test]
fn escaped_fish_rechecks_the_rod_and_replaces_a_broken_one() {
    let config = BotConfig::instantaneous();
    let mut stats = SessionStats::new();
    let mut vision = ScriptedVision::default();
    let mut input = RecordingInput::default();
    let mut machine = StateMachine::new();

    stats.start_session();
    machine.set_state(StateId::PlayingMinigame, true);

    // The fish gets away.
    vision.show("failure", (1324, 680));
    step(&mut machine, &mut vision, &mut input, &config, &mut stats);
    assert_eq!(machine.current(), Some(StateId::CheckingRod));
    assert_eq!(stats.fish_escaped(), 1);
    assert_eq!(stats.cycles(), 1);

    // No rod tier matches: the rod broke and gets replaced.
    vision.clear();
    step(&mut machine, &mut vision, &mut input, &config, &mut stats);
    assert_eq!(machine.current(), Some(StateId::CastingBait));
    assert_eq!(stats.rod_breaks(), 1);
    assert!(input.keys_pressed.contains(&Key::Char('m')));
}

#[test]
fn quick_finish_skips_the_result_screen() {
    let mut config = BotConfig::instantaneous();
    config.quick_finish = true;
    let mut stats = SessionStats::new();
    let mut vision = ScriptedVision::default();
    let mut input = RecordingInput::default();
    let mut machine = StateMachine::new();

    machine.set_state(StateId::PlayingMinigame, true);
    vision.show("success", (995, 685));
    step(&mut machine, &mut vision, &mut input, &config, &mut stats);

    assert_eq!(machine.current(), Some(StateId::Starting));
    assert_eq!(input.keys_pressed, vec![Key::Esc]);
    assert_eq!(stats.fish_caught(), 1);
}

#[test]
fn timeout_restart_policy_resets_mid_minigame() {
    let mut config = BotConfig::instantaneous();
    config.timeout_policy = fishbot_core::TimeoutPolicy::Restart;
    config
        .state_timeouts
        .insert(StateId::WaitingForBite, Duration::ZERO);
    let mut stats = SessionStats::new();
    let mut vision = ScriptedVision::default();
    let mut input = RecordingInput::default();
    let mut machine = StateMachine::new();

    machine.set_state(StateId::WaitingForBite, true);
    std::thread::sleep(Duration::from_millis(5));
    step(&mut machine, &mut vision, &mut input, &config, &mut stats);

    assert_eq!(machine.current(), Some(StateId::Starting));
    assert_eq!(stats.timeouts(), 1);
    assert_eq!(input.releases, 1);
}
