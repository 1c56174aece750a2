//! Synthetic keyboard and mouse delivery
//!
//! Thin adapter over the OS input backend. Delivery failures are logged
//! and swallowed; the cycle retries around missed events anyway. Held keys
//! are tracked so a shutdown or timeout reset can release everything.

use std::collections::HashSet;
use std::thread;
use std::time::Duration;

use enigo::{Button, Coordinate, Direction, Enigo, Keyboard, Mouse, Settings};
use tracing::{debug, warn};

use fishbot_core::traits::{InputControl, Key, MouseButton};
use fishbot_core::Result;

pub struct EnigoControl {
    enigo: Enigo,
    held: HashSet<Key>,
    /// Pause between positioning the cursor and clicking through it.
    move_settle: Duration,
}

impl EnigoControl {
    pub fn new(move_settle: Duration) -> Result<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|err| anyhow::anyhow!("input backend unavailable: {err}"))?;
        Ok(Self {
            enigo,
            held: HashSet::new(),
            move_settle,
        })
    }

    fn backend_key(key: Key) -> enigo::Key {
        match key {
            Key::Char(c) => enigo::Key::Unicode(c),
            Key::Esc => enigo::Key::Escape,
        }
    }

    fn backend_button(button: MouseButton) -> Button {
        match button {
            MouseButton::Left => Button::Left,
            MouseButton::Right => Button::Right,
        }
    }
}

impl InputControl for EnigoControl {
    fn move_to(&mut self, x: i32, y: i32) {
        if let Err(err) = self.enigo.move_mouse(x, y, Coordinate::Abs) {
            warn!(x, y, %err, "mouse move failed");
        }
    }

    fn click(&mut self, button: MouseButton) {
        if let Err(err) = self.enigo.button(Self::backend_button(button), Direction::Click) {
            warn!(?button, %err, "mouse click failed");
        }
    }

    fn click_at(&mut self, x: i32, y: i32) {
        self.move_to(x, y);
        if !self.move_settle.is_zero() {
            thread::sleep(self.move_settle);
        }
        self.click(MouseButton::Left);
    }

    fn press_key(&mut self, key: Key) {
        if let Err(err) = self.enigo.key(Self::backend_key(key), Direction::Click) {
            warn!(?key, %err, "key press failed");
        }
    }

    fn key_down(&mut self, key: Key) {
        match self.enigo.key(Self::backend_key(key), Direction::Press) {
            Ok(()) => {
                self.held.insert(key);
            }
            Err(err) => warn!(?key, %err, "key down failed"),
        }
    }

    fn key_up(&mut self, key: Key) {
        self.held.remove(&key);
        if let Err(err) = self.enigo.key(Self::backend_key(key), Direction::Release) {
            warn!(?key, %err, "key up failed");
        }
    }

    fn release_all_controls(&mut self) {
        let held: Vec<Key> = self.held.drain().collect();
        if !held.is_empty() {
            debug!(count = held.len(), "releasing held keys");
        }
        for key in held {
            if let Err(err) = self.enigo.key(Self::backend_key(key), Direction::Release) {
                warn!(?key, %err, "key release failed");
            }
        }
    }
}
