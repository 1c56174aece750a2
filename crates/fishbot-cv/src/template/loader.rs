//! Template loading

use std::collections::HashMap;
use std::path::Path;

use image::{DynamicImage, GrayImage, RgbImage};
use tracing::{info, warn};

use crate::config::DetectionConfig;
use crate::Result;

use super::{Template, TemplateSet};

/// Load every template named in the manifest. Missing or unreadable
/// files are logged and skipped so a partial asset set still runs; an
/// empty result is an error because the detector would be blind.
pub fn load_templates(config: &DetectionConfig) -> Result<TemplateSet> {
    let mut base = HashMap::new();

    for name in config.manifest.keys() {
        let path = match config.template_path(name) {
            Some(path) => path,
            None => continue,
        };
        match load_one(name, &path) {
            Ok(template) => {
                base.insert(name.clone(), template);
            }
            Err(err) => {
                warn!(name, path = %path.display(), %err, "skipping template");
            }
        }
    }

    if base.is_empty() {
        anyhow::bail!(
            "no templates loaded from {}",
            config.assets_dir.display()
        );
    }

    info!(count = base.len(), "templates loaded");
    Ok(TemplateSet::new(base))
}

fn load_one(name: &str, path: &Path) -> Result<Template> {
    let image = image::open(path)?;
    let (rgb, mask) = split_alpha(image);
    Ok(Template::new(name.to_string(), rgb, mask))
}

/// Separate color from transparency. The alpha channel becomes a match
/// mask only when some pixel is actually transparent; fully opaque art
/// matches faster without one.
fn split_alpha(image: DynamicImage) -> (RgbImage, Option<GrayImage>) {
    let rgba = match image {
        DynamicImage::ImageRgba8(rgba) => rgba,
        DynamicImage::ImageLumaA8(_) | DynamicImage::ImageLumaA16(_) | DynamicImage::ImageRgba16(_) | DynamicImage::ImageRgba32F(_) => image.to_rgba8(),
        other => return (other.to_rgb8(), None),
    };

    let mask = GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        image::Luma([rgba.get_pixel(x, y).0[3]])
    });
    let rgb = DynamicImage::ImageRgba8(rgba).to_rgb8();

    if mask.pixels().all(|p| p.0[0] == u8::MAX) {
        (rgb, None)
    } else {
        (rgb, Some(mask))
    }
}
