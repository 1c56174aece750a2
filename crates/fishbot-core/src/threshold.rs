//! Adaptive per-template acceptance thresholds
//!
//! Every match attempt above the diagnostic floor feeds a bounded history;
//! once a template has enough signal its acceptance bar is recomputed from
//! the recent confidences instead of staying at the global default. Clamping
//! keeps a pathological run from making a template un-matchable or trivially
//! matchable.

use std::collections::{HashMap, VecDeque};

use tracing::debug;

/// Observations kept per template (oldest dropped first).
const HISTORY_CAPACITY: usize = 20;
/// Observations required before the threshold starts adapting.
const MIN_SAMPLES: usize = 5;

#[derive(Debug, Clone, Copy)]
struct Observation {
    matched: bool,
    confidence: f32,
}

#[derive(Debug)]
struct TemplateHistory {
    samples: VecDeque<Observation>,
    threshold: f32,
}

/// Rolling match-outcome history and the derived acceptance threshold for
/// each template. Never persisted; resets with the process.
#[derive(Debug)]
pub struct ThresholdTracker {
    base_precision: f32,
    min_precision: f32,
    max_precision: f32,
    histories: HashMap<String, TemplateHistory>,
}

impl ThresholdTracker {
    pub fn new(base_precision: f32, min_precision: f32, max_precision: f32) -> Self {
        Self {
            base_precision,
            min_precision,
            max_precision,
            histories: HashMap::new(),
        }
    }

    /// Current acceptance bar for `template`. Unobserved templates use the
    /// global base precision.
    pub fn threshold(&self, template: &str) -> f32 {
        self.histories
            .get(template)
            .map(|h| h.threshold)
            .unwrap_or(self.base_precision)
    }

    /// Number of recorded observations for `template`.
    pub fn observations(&self, template: &str) -> usize {
        self.histories.get(template).map_or(0, |h| h.samples.len())
    }

    /// Record one match outcome and recompute the threshold when there is
    /// enough signal.
    pub fn record(&mut self, template: &str, matched: bool, confidence: f32) {
        let base = self.base_precision;
        let history = self
            .histories
            .entry(template.to_string())
            .or_insert_with(|| TemplateHistory {
                samples: VecDeque::with_capacity(HISTORY_CAPACITY),
                threshold: base,
            });

        if history.samples.len() == HISTORY_CAPACITY {
            history.samples.pop_front();
        }
        history.samples.push_back(Observation {
            matched,
            confidence,
        });

        if history.samples.len() < MIN_SAMPLES {
            return;
        }

        let successes: Vec<f32> = history
            .samples
            .iter()
            .filter(|o| o.matched)
            .map(|o| o.confidence)
            .collect();
        if successes.is_empty() {
            // No positive signal yet; keep the previous bar.
            return;
        }
        let failures: Vec<f32> = history
            .samples
            .iter()
            .filter(|o| !o.matched)
            .map(|o| o.confidence)
            .collect();

        let avg_success = successes.iter().sum::<f32>() / successes.len() as f32;
        let raw = if failures.is_empty() {
            avg_success - 0.10
        } else {
            let avg_failure = failures.iter().sum::<f32>() / failures.len() as f32;
            (avg_success + avg_failure) / 2.0 - 0.05
        };

        let new_threshold = raw.clamp(self.min_precision, self.max_precision);
        if (new_threshold - history.threshold).abs() > f32::EPSILON {
            debug!(
                template,
                old = history.threshold,
                new = new_threshold,
                "adaptive threshold updated"
            );
        }
        history.threshold = new_threshold;
    }
}

impl Default for ThresholdTracker {
    fn default() -> Self {
        Self::new(0.65, 0.50, 0.85)
    }
}
