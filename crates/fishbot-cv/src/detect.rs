//! Region-constrained template detection
//!
//! Each lookup searches the template's registered region first, then (when
//! the caller allows it) concentric rings of region-sized tiles around it.
//! Match outcomes above the diagnostic floor feed the adaptive per-template
//! thresholds in [`ThresholdTracker`].

use std::sync::{Arc, Mutex};

use image::imageops;
use tracing::{debug, warn};

use fishbot_core::traits::Vision;
use fishbot_core::{CaptureRegion, Frame, Rect, RoiRegistry, ThresholdTracker};

use crate::capture::CaptureService;
use crate::template::matcher::best_match;
use crate::template::{Template, TemplateSet};

/// Confidences below this carry no signal about the template at all and
/// are excluded from threshold adaptation.
const DIAGNOSTIC_FLOOR: f32 = 0.3;

/// Template locator over captured frames.
pub struct Detector {
    templates: TemplateSet,
    rois: Arc<Mutex<RoiRegistry>>,
    thresholds: ThresholdTracker,
    capture: Option<CaptureService>,
}

impl Detector {
    pub fn new(
        templates: TemplateSet,
        rois: Arc<Mutex<RoiRegistry>>,
        capture: Option<CaptureService>,
    ) -> Self {
        Self {
            templates,
            rois,
            thresholds: ThresholdTracker::default(),
            capture,
        }
    }

    /// Rescale templates and regions for a new capture geometry.
    pub fn update_region(&mut self, region: CaptureRegion) {
        self.templates.scale_to(region.width, region.height);
        if let Ok(mut rois) = self.rois.lock() {
            rois.update_resolution(region.width, region.height);
        }
        if let Some(capture) = &mut self.capture {
            capture.update_region(region);
        }
    }

    pub fn shutdown(&mut self) {
        if let Some(capture) = &mut self.capture {
            capture.shutdown();
        }
    }

    pub fn thresholds(&self) -> &ThresholdTracker {
        &self.thresholds
    }

    fn locate(&mut self, frame: &Frame, name: &str, radius: u32) -> Option<(i32, i32)> {
        let Some(template) = self.templates.scaled(name) else {
            warn!(name, "unknown template");
            return None;
        };

        let roi = self.rois.lock().ok().and_then(|rois| rois.resolve(name));

        // Candidate windows in search order. No registered region means one
        // full-frame search; the ring fallback only makes sense relative to
        // a region.
        let mut candidates: Vec<Rect> = Vec::new();
        match roi {
            Some(rect) => {
                candidates.push(rect);
                // Pixel-step rings absorb small systematic drift of the UI
                // element out of its registered region.
                for (dx, dy) in ring_offsets(radius) {
                    candidates.push(rect.offset(dx, dy));
                }
            }
            None => {
                candidates.push(Rect::new(0, 0, frame.width(), frame.height()));
            }
        }

        let threshold = self.thresholds.threshold(name);
        let mut best_seen = 0.0f32;

        for rect in candidates {
            let Some(window) = rect.clamped_to(frame.width(), frame.height()) else {
                continue;
            };
            let Some(hit) = match_in_rect(template, frame, window) else {
                continue;
            };
            if hit.confidence >= threshold {
                self.thresholds.record(name, true, hit.confidence);
                debug!(
                    name,
                    x = hit.x,
                    y = hit.y,
                    confidence = hit.confidence,
                    threshold,
                    "template matched"
                );
                return Some((hit.x, hit.y));
            }
            best_seen = best_seen.max(hit.confidence);
        }

        if best_seen >= DIAGNOSTIC_FLOOR {
            // A near miss still tells us how this template scores here.
            self.thresholds.record(name, false, best_seen);
            debug!(name, confidence = best_seen, threshold, "template below threshold");
        }
        None
    }
}

impl Vision for Detector {
    fn find(&mut self, frame: &Frame, template: &str, radius: u32) -> Option<(i32, i32)> {
        self.locate(frame, template, radius)
    }

    fn capture(&mut self) -> Option<Frame> {
        self.capture.as_mut().and_then(|capture| capture.capture())
    }
}

struct WindowHit {
    /// Match center in screen coordinates.
    x: i32,
    y: i32,
    confidence: f32,
}

/// Best correlation of `template` inside one window of `frame`, reported
/// as a screen-space center.
fn match_in_rect(template: &Template, frame: &Frame, window: Rect) -> Option<WindowHit> {
    let crop = imageops::crop_imm(
        &frame.image,
        window.x as u32,
        window.y as u32,
        window.width,
        window.height,
    )
    .to_image();
    let gray = imageops::grayscale(&crop);

    let hit = best_match(&gray, &template.gray, template.mask.as_ref())?;
    let (tw, th) = template.gray.dimensions();
    Some(WindowHit {
        x: frame.left + window.x + hit.x as i32 + tw as i32 / 2,
        y: frame.top + window.y + hit.y as i32 + th as i32 / 2,
        confidence: hit.confidence,
    })
}

/// Offsets of the concentric rings around a region, in single-pixel steps.
/// Ring `r` is walked top edge, bottom edge, then the side columns.
fn ring_offsets(radius: u32) -> Vec<(i32, i32)> {
    let mut offsets = Vec::new();
    for r in 1..=radius as i32 {
        for x in -r..=r {
            offsets.push((x, -r));
        }
        for x in -r..=r {
            offsets.push((x, r));
        }
        for y in (-r + 1)..r {
            offsets.push((-r, y));
        }
        for y in (-r + 1)..r {
            offsets.push((r, y));
        }
    }
    offsets
}
