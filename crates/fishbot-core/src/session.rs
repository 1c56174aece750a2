//! Session accounting
//!
//! Counters mutated by the states and the state machine, reported when the
//! bot stops and reset for the next session.

use std::time::{Duration, Instant};

use serde::Serialize;

/// Running counters for one bot session.
#[derive(Debug, Default)]
pub struct SessionStats {
    cycles: u32,
    fish_caught: u32,
    fish_escaped: u32,
    rod_breaks: u32,
    timeouts: u32,
    session_start: Option<Instant>,
    catch_times: Vec<Instant>,
}

/// Snapshot of the counters plus derived rates.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatsSummary {
    pub cycles: u32,
    pub fish_caught: u32,
    pub fish_escaped: u32,
    pub rod_breaks: u32,
    pub timeouts: u32,
    pub catch_rate: f64,
    pub fish_per_hour: f64,
    pub catches_last_hour: u32,
    pub elapsed: String,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_session(&mut self) {
        self.session_start = Some(Instant::now());
        self.catch_times.clear();
    }

    pub fn add_cycle(&mut self) {
        self.cycles += 1;
    }

    pub fn add_catch(&mut self) {
        self.fish_caught += 1;
        self.catch_times.push(Instant::now());
    }

    pub fn add_escape(&mut self) {
        self.fish_escaped += 1;
    }

    pub fn add_rod_break(&mut self) {
        self.rod_breaks += 1;
    }

    pub fn add_timeout(&mut self) {
        self.timeouts += 1;
    }

    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    pub fn fish_caught(&self) -> u32 {
        self.fish_caught
    }

    pub fn fish_escaped(&self) -> u32 {
        self.fish_escaped
    }

    pub fn rod_breaks(&self) -> u32 {
        self.rod_breaks
    }

    pub fn timeouts(&self) -> u32 {
        self.timeouts
    }

    pub fn elapsed(&self) -> Duration {
        self.session_start.map_or(Duration::ZERO, |s| s.elapsed())
    }

    pub fn elapsed_formatted(&self) -> String {
        let total = self.elapsed().as_secs();
        format!(
            "{:02}:{:02}:{:02}",
            total / 3600,
            (total % 3600) / 60,
            total % 60
        )
    }

    /// Catches as a percentage of finished minigames.
    pub fn catch_rate(&self) -> f64 {
        let total = self.fish_caught + self.fish_escaped;
        if total == 0 {
            return 0.0;
        }
        self.fish_caught as f64 / total as f64 * 100.0
    }

    pub fn fish_per_hour(&self) -> f64 {
        let hours = self.elapsed().as_secs_f64() / 3600.0;
        if hours < 0.001 {
            return 0.0;
        }
        self.fish_caught as f64 / hours
    }

    pub fn catches_last_hour(&self) -> u32 {
        let hour = Duration::from_secs(3600);
        self.catch_times
            .iter()
            .filter(|t| t.elapsed() <= hour)
            .count() as u32
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            cycles: self.cycles,
            fish_caught: self.fish_caught,
            fish_escaped: self.fish_escaped,
            rod_breaks: self.rod_breaks,
            timeouts: self.timeouts,
            catch_rate: (self.catch_rate() * 10.0).round() / 10.0,
            fish_per_hour: (self.fish_per_hour() * 10.0).round() / 10.0,
            catches_last_hour: self.catches_last_hour(),
            elapsed: self.elapsed_formatted(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
