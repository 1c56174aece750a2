//! Masked normalized cross-correlation
//!
//! Zero-mean normalized cross-correlation over single-channel crops,
//! optionally restricted to the opaque pixels of a transparency mask.
//! Scores follow TM_CCOEFF_NORMED semantics; negative correlation floors
//! at zero confidence.

use image::GrayImage;

/// Mask values at or above this count as opaque.
const MASK_OPAQUE: u8 = 128;
const NORM_EPSILON: f32 = 1e-6;

/// Best-scoring template position within a search crop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchScore {
    /// Top-left offset of the match inside the search crop.
    pub x: u32,
    pub y: u32,
    /// Normalized correlation confidence in `0..=1`.
    pub confidence: f32,
}

/// Slide `template` over `search` and return the best correlation. `None`
/// when the crop is smaller than the template in either dimension, the
/// mask hides everything, or the template carries no signal.
pub fn best_match(
    search: &GrayImage,
    template: &GrayImage,
    mask: Option<&GrayImage>,
) -> Option<MatchScore> {
    let (tw, th) = template.dimensions();
    let (sw, sh) = search.dimensions();
    if tw == 0 || th == 0 || sw < tw || sh < th {
        return None;
    }

    // Pixels participating in the correlation.
    let coords: Vec<(u32, u32)> = (0..th)
        .flat_map(|y| (0..tw).map(move |x| (x, y)))
        .filter(|&(x, y)| {
            mask.map_or(true, |m| m.get_pixel(x, y).0[0] >= MASK_OPAQUE)
        })
        .collect();
    if coords.is_empty() {
        return None;
    }

    let template_values: Vec<f32> = coords
        .iter()
        .map(|&(x, y)| template.get_pixel(x, y).0[0] as f32)
        .collect();
    let template_mean = template_values.iter().sum::<f32>() / template_values.len() as f32;
    let template_dev: Vec<f32> = template_values.iter().map(|v| v - template_mean).collect();
    let template_norm = template_dev.iter().map(|d| d * d).sum::<f32>().sqrt();
    if template_norm < NORM_EPSILON {
        // Flat template: correlation is undefined.
        return None;
    }

    let mut best: Option<MatchScore> = None;
    let mut window = vec![0.0f32; coords.len()];

    for oy in 0..=(sh - th) {
        for ox in 0..=(sw - tw) {
            for (slot, &(x, y)) in window.iter_mut().zip(&coords) {
                *slot = search.get_pixel(ox + x, oy + y).0[0] as f32;
            }
            let window_mean = window.iter().sum::<f32>() / window.len() as f32;

            let mut numerator = 0.0f32;
            let mut window_norm_sq = 0.0f32;
            for (value, dev) in window.iter().zip(&template_dev) {
                let window_dev = value - window_mean;
                numerator += window_dev * dev;
                window_norm_sq += window_dev * window_dev;
            }
            if window_norm_sq.sqrt() < NORM_EPSILON {
                continue;
            }

            let score = numerator / (template_norm * window_norm_sq.sqrt());
            let confidence = score.clamp(0.0, 1.0);
            if best.map_or(true, |b| confidence > b.confidence) {
                best = Some(MatchScore {
                    x: ox,
                    y: oy,
                    confidence,
                });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    /// 8x8 quadrant pattern: bright top-left and bottom-right.
    fn quadrants() -> GrayImage {
        GrayImage::from_fn(8, 8, |x, y| {
            if (x < 4) == (y < 4) {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }

    fn embed(canvas_w: u32, canvas_h: u32, patch: &GrayImage, at: (u32, u32)) -> GrayImage {
        let mut canvas = GrayImage::from_pixel(canvas_w, canvas_h, Luma([32]));
        image::imageops::replace(&mut canvas, patch, at.0 as i64, at.1 as i64);
        canvas
    }

    #[test]
    fn exact_embedding_scores_one_at_its_position() {
        let template = quadrants();
        let search = embed(32, 24, &template, (11, 7));

        let hit = best_match(&search, &template, None).unwrap();
        assert_eq!((hit.x, hit.y), (11, 7));
        assert!(hit.confidence > 0.99);
    }

    #[test]
    fn crop_smaller_than_template_cannot_match() {
        let template = quadrants();
        let search = GrayImage::new(4, 12);
        assert!(best_match(&search, &template, None).is_none());
    }

    #[test]
    fn flat_template_has_no_signal() {
        let template = GrayImage::from_pixel(8, 8, Luma([90]));
        let search = GrayImage::new(16, 16);
        assert!(best_match(&search, &template, None).is_none());
    }

    #[test]
    fn partial_inversion_halves_the_confidence() {
        // Columns alternate 0/255 with equal counts; inverting two of
        // eight rows keeps the window mean and energy while flipping a
        // quarter of the correlation mass: expected score (6 - 2) / 8 = 0.5.
        let template = GrayImage::from_fn(8, 8, |x, _| {
            if x % 2 == 0 {
                Luma([255])
            } else {
                Luma([0])
            }
        });
        let window = GrayImage::from_fn(8, 8, |x, y| {
            let inverted = y >= 6;
            let bright = (x % 2 == 0) != inverted;
            if bright {
                Luma([255])
            } else {
                Luma([0])
            }
        });

        let hit = best_match(&window, &template, None).unwrap();
        assert!((hit.confidence - 0.5).abs() < 1e-3, "got {}", hit.confidence);
    }

    #[test]
    fn mask_excludes_disagreeing_pixels() {
        let template = quadrants();
        let mut search = embed(16, 16, &template, (3, 5));
        // Corrupt the bottom-right quadrant of the embedded patch.
        for y in 9..13 {
            for x in 7..11 {
                search.put_pixel(x, y, Luma([17]));
            }
        }

        let unmasked = best_match(&search, &template, None).unwrap();
        assert!(unmasked.confidence < 0.99);

        // Mask out exactly the corrupted quadrant.
        let mask = GrayImage::from_fn(8, 8, |x, y| {
            if x >= 4 && y >= 4 {
                Luma([0])
            } else {
                Luma([255])
            }
        });
        let masked = best_match(&search, &template, Some(&mask)).unwrap();
        assert_eq!((masked.x, masked.y), (3, 5));
        assert!(masked.confidence > 0.99);
    }

    #[test]
    fn fully_transparent_mask_matches_nothing() {
        let template = quadrants();
        let mask = GrayImage::from_pixel(8, 8, Luma([0]));
        let search = embed(16, 16, &template, (0, 0));
        assert!(best_match(&search, &template, Some(&mask)).is_none());
    }
}
