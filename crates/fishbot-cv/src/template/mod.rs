//! Reference templates and resolution scaling

pub mod loader;
pub mod matcher;

pub use loader::load_templates;

use std::collections::HashMap;

use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};
use tracing::{debug, info, warn};

use fishbot_core::{BASE_HEIGHT, BASE_WIDTH};

/// Relative deviation from the base resolution below which templates are
/// used as authored, bit-identical.
const IDENTITY_TOLERANCE: f64 = 0.01;
/// Templates smaller than this after scaling keep their authored size.
const MIN_SCALED_SIDE: u32 = 4;

/// One reference image, optionally with a transparency mask used as a
/// match mask. Immutable after load.
#[derive(Debug, Clone)]
pub struct Template {
    pub name: String,
    pub image: RgbImage,
    pub gray: GrayImage,
    pub mask: Option<GrayImage>,
}

impl Template {
    pub fn new(name: String, image: RgbImage, mask: Option<GrayImage>) -> Self {
        let gray = imageops::grayscale(&image);
        Self {
            name,
            image,
            gray,
            mask,
        }
    }

    fn scaled(&self, sx: f64, sy: f64, filter: FilterType) -> Self {
        let new_w = (self.image.width() as f64 * sx) as u32;
        let new_h = (self.image.height() as f64 * sy) as u32;
        if new_w < MIN_SCALED_SIDE || new_h < MIN_SCALED_SIDE {
            warn!(
                name = self.name,
                new_w, new_h, "template too small after scaling, keeping original"
            );
            return self.clone();
        }
        let image = imageops::resize(&self.image, new_w, new_h, filter);
        let mask = self
            .mask
            .as_ref()
            .map(|m| imageops::resize(m, new_w, new_h, filter));
        Self::new(self.name.clone(), image, mask)
    }
}

/// Templates at their authored size plus the variant scaled for the active
/// capture resolution.
#[derive(Debug, Default)]
pub struct TemplateSet {
    base: HashMap<String, Template>,
    scaled: HashMap<String, Template>,
}

impl TemplateSet {
    pub fn new(base: HashMap<String, Template>) -> Self {
        Self {
            scaled: base.clone(),
            base,
        }
    }

    pub fn len(&self) -> usize {
        self.base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.base.contains_key(name)
    }

    /// Template variant scaled for the active resolution.
    pub fn scaled(&self, name: &str) -> Option<&Template> {
        self.scaled.get(name).or_else(|| self.base.get(name))
    }

    /// Re-derive every scaled variant for a new capture resolution.
    /// Within 1% of the base resolution in both axes the authored images
    /// are reused unchanged.
    pub fn scale_to(&mut self, width: u32, height: u32) {
        let sx = width as f64 / BASE_WIDTH as f64;
        let sy = height as f64 / BASE_HEIGHT as f64;

        if (sx - 1.0).abs() < IDENTITY_TOLERANCE && (sy - 1.0).abs() < IDENTITY_TOLERANCE {
            debug!("templates at base resolution");
            self.scaled = self.base.clone();
            return;
        }

        // Triangle filtering widens its support when shrinking, so the same
        // filter gives area-averaged downscales and linear upscales.
        let filter = FilterType::Triangle;

        info!(width, height, sx, sy, "scaling templates");
        self.scaled = self
            .base
            .iter()
            .map(|(name, template)| (name.clone(), template.scaled(sx, sy, filter)))
            .collect();
    }
}
