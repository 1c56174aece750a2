//! Resolution-scaled region registry
//!
//! Named search regions are authored at 1920x1080 and rescaled to the active
//! capture resolution. Users can pin a region to an exact rectangle through
//! a per-resolution override file; overrides are stored as final pixels and
//! applied verbatim, never re-scaled.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::geometry::{Rect, BASE_HEIGHT, BASE_WIDTH};

/// Override file used before overrides became resolution-scoped.
const LEGACY_OVERRIDE_FILE: &str = "user_rois.json";

/// A region entry: either a rectangle or an alias to another entry's
/// region. Aliases resolve one level deep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoiBinding {
    Rect(Rect),
    Alias(String),
}

/// Registry of named search regions, kept in sync with the active capture
/// resolution.
#[derive(Debug)]
pub struct RoiRegistry {
    base: HashMap<String, RoiBinding>,
    scaled: HashMap<String, RoiBinding>,
    overrides: HashMap<String, Rect>,
    width: u32,
    height: u32,
    override_dir: PathBuf,
}

impl RoiRegistry {
    pub fn new(base: HashMap<String, RoiBinding>, override_dir: impl AsRef<Path>) -> Self {
        let mut registry = Self {
            scaled: base.clone(),
            base,
            overrides: HashMap::new(),
            width: BASE_WIDTH,
            height: BASE_HEIGHT,
            override_dir: override_dir.as_ref().to_path_buf(),
        };
        registry.reload();
        registry
    }

    /// Registry seeded with the game's stock regions.
    pub fn with_default_bindings(override_dir: impl AsRef<Path>) -> Self {
        Self::new(default_bindings(), override_dir)
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Path of the override file scoped to the given resolution.
    pub fn override_path(&self, width: u32, height: u32) -> PathBuf {
        self.override_dir
            .join(format!("user_rois_{}x{}.json", width, height))
    }

    /// Resolve a name to its current rectangle, following one alias hop.
    pub fn resolve(&self, name: &str) -> Option<Rect> {
        match self.scaled.get(name)? {
            RoiBinding::Rect(rect) => Some(*rect),
            RoiBinding::Alias(target) => match self.scaled.get(target)? {
                RoiBinding::Rect(rect) => Some(*rect),
                RoiBinding::Alias(_) => None,
            },
        }
    }

    /// Rescale every base region to the new resolution, then re-apply any
    /// user overrides stored for it. Seeds a default override file when the
    /// resolution has none, so downstream tooling always has a file to edit.
    pub fn update_resolution(&mut self, width: u32, height: u32) {
        let changed = width != self.width || height != self.height;
        self.width = width;
        self.height = height;

        if changed && (width != BASE_WIDTH || height != BASE_HEIGHT) {
            info!(width, height, "regions scaled");
        }

        self.reload();
        self.seed_override_file();
    }

    /// Rebuild the scaled map from the base regions, re-read the override
    /// file for the current resolution and apply it. Falls back to migrating
    /// the legacy single-resolution file the first time a resolution is
    /// seen. Called again by the config watcher on hot reload.
    pub fn reload(&mut self) {
        let sx = self.width as f64 / BASE_WIDTH as f64;
        let sy = self.height as f64 / BASE_HEIGHT as f64;
        self.scaled = self
            .base
            .iter()
            .map(|(name, binding)| {
                let binding = match binding {
                    RoiBinding::Rect(rect) => RoiBinding::Rect(rect.scaled(sx, sy)),
                    RoiBinding::Alias(target) => RoiBinding::Alias(target.clone()),
                };
                (name.clone(), binding)
            })
            .collect();
        self.overrides = self.load_overrides();
        self.apply_overrides();
    }

    fn load_overrides(&mut self) -> HashMap<String, Rect> {
        let path = self.override_path(self.width, self.height);
        if path.exists() {
            match read_override_file(&path) {
                Ok(overrides) => {
                    info!(
                        count = overrides.len(),
                        path = %path.display(),
                        "loaded custom regions"
                    );
                    return overrides;
                }
                Err(err) => {
                    warn!(path = %path.display(), %err, "ignoring malformed override file");
                    return HashMap::new();
                }
            }
        }

        // One-time forward migration of the legacy single-resolution file.
        let legacy = self.override_dir.join(LEGACY_OVERRIDE_FILE);
        if legacy.exists() {
            match read_override_file(&legacy) {
                Ok(overrides) => {
                    info!(
                        count = overrides.len(),
                        from = %legacy.display(),
                        to = %path.display(),
                        "migrating legacy custom regions"
                    );
                    if let Err(err) = write_override_file(&path, &overrides) {
                        warn!(%err, "failed to persist migrated regions");
                    }
                    return overrides;
                }
                Err(err) => {
                    warn!(path = %legacy.display(), %err, "ignoring malformed legacy override file");
                }
            }
        }

        debug!(width = self.width, height = self.height, "no custom regions");
        HashMap::new()
    }

    fn apply_overrides(&mut self) {
        for (name, rect) in &self.overrides {
            if self.scaled.contains_key(name) {
                debug!(name, ?rect, "applied custom region");
                self.scaled
                    .insert(name.clone(), RoiBinding::Rect(*rect));
            }
        }
    }

    /// Write a default override file seeded from the scaled base regions
    /// when none exists for the current resolution.
    fn seed_override_file(&self) {
        let path = self.override_path(self.width, self.height);
        if path.exists() {
            return;
        }
        let seed: HashMap<String, Rect> = self
            .scaled
            .iter()
            .filter_map(|(name, binding)| match binding {
                RoiBinding::Rect(rect) => Some((name.clone(), *rect)),
                RoiBinding::Alias(_) => None,
            })
            .collect();
        match write_override_file(&path, &seed) {
            Ok(()) => info!(path = %path.display(), "seeded default override file"),
            Err(err) => warn!(path = %path.display(), %err, "failed to seed override file"),
        }
    }

    /// Persist `overrides` for the current resolution and apply them.
    pub fn save_overrides(&mut self, overrides: HashMap<String, Rect>) -> crate::Result<()> {
        let path = self.override_path(self.width, self.height);
        write_override_file(&path, &overrides)?;
        self.overrides = overrides;
        self.apply_overrides();
        Ok(())
    }
}

fn read_override_file(path: &Path) -> crate::Result<HashMap<String, Rect>> {
    let raw = fs::read_to_string(path)?;
    let parsed: HashMap<String, [i32; 4]> = serde_json::from_str(&raw)?;
    parsed
        .into_iter()
        .map(|(name, [x, y, w, h])| {
            if w <= 0 || h <= 0 {
                anyhow::bail!("region '{}' has non-positive size {}x{}", name, w, h);
            }
            Ok((name, Rect::new(x, y, w as u32, h as u32)))
        })
        .collect()
}

fn write_override_file(path: &Path, overrides: &HashMap<String, Rect>) -> crate::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let serializable: HashMap<&String, [i32; 4]> = overrides
        .iter()
        .map(|(name, r)| (name, [r.x, r.y, r.width as i32, r.height as i32]))
        .collect();
    fs::write(path, serde_json::to_string_pretty(&serializable)?)?;
    Ok(())
}

/// Stock search regions, authored at 1920x1080.
pub fn default_bindings() -> HashMap<String, RoiBinding> {
    let rects = [
        ("fishing_spot_btn", Rect::new(1400, 540, 121, 55)),
        ("broken_rod", Rect::new(1635, 982, 250, 63)),
        ("reg_rod", Rect::new(1638, 985, 210, 33)),
        ("sturdy_rod", Rect::new(1637, 984, 194, 37)),
        ("flex_rod", Rect::new(1637, 984, 204, 36)),
        ("new_rod", Rect::new(1624, 563, 185, 65)),
        ("exclamation", Rect::new(929, 438, 52, 142)),
        ("left_arrow", Rect::new(740, 490, 220, 100)),
        ("right_arrow", Rect::new(960, 490, 220, 100)),
        ("failure", Rect::new(973, 630, 702, 101)),
        ("success", Rect::new(710, 620, 570, 130)),
        ("continue", Rect::new(1439, 942, 306, 75)),
        ("level_check", Rect::new(1101, 985, 48, 29)),
        ("connect_server", Rect::new(1057, 763, 279, 67)),
    ];
    rects
        .into_iter()
        .map(|(name, rect)| (name.to_string(), RoiBinding::Rect(rect)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn bindings_with_alias() -> HashMap<String, RoiBinding> {
        let mut bindings = default_bindings();
        bindings.insert(
            "success_glow".to_string(),
            RoiBinding::Alias("success".to_string()),
        );
        bindings
    }

    #[test]
    fn resolves_scaled_base_regions() {
        let dir = TempDir::new().unwrap();
        let mut registry = RoiRegistry::with_default_bindings(dir.path());
        registry.update_resolution(2560, 1440);
        let rect = registry.resolve("fishing_spot_btn").unwrap();
        assert_eq!(
            rect,
            Rect::new(1400, 540, 121, 55).scaled(2560.0 / 1920.0, 1440.0 / 1080.0)
        );
    }

    #[test]
    fn unknown_name_resolves_to_none() {
        let dir = TempDir::new().unwrap();
        let registry = RoiRegistry::with_default_bindings(dir.path());
        assert!(registry.resolve("no_such_template").is_none());
    }

    #[test]
    fn alias_follows_one_hop() {
        let dir = TempDir::new().unwrap();
        let registry = RoiRegistry::new(bindings_with_alias(), dir.path());
        assert_eq!(
            registry.resolve("success_glow"),
            registry.resolve("success")
        );
    }

    #[test]
    fn override_replaces_scaled_rect_verbatim() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("user_rois_2560x1440.json");
        fs::write(&path, r#"{"continue": [10, 20, 30, 40]}"#).unwrap();

        let mut registry = RoiRegistry::with_default_bindings(dir.path());
        registry.update_resolution(2560, 1440);
        assert_eq!(
            registry.resolve("continue").unwrap(),
            Rect::new(10, 20, 30, 40)
        );
        // Other regions still come from scaling.
        assert_ne!(
            registry.resolve("success").unwrap(),
            Rect::new(710, 620, 570, 130)
        );
    }

    #[test]
    fn legacy_file_is_migrated_to_scoped_name() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("user_rois.json"),
            r#"{"failure": [1, 2, 3, 4]}"#,
        )
        .unwrap();

        let registry = RoiRegistry::with_default_bindings(dir.path());
        assert_eq!(
            registry.resolve("failure").unwrap(),
            Rect::new(1, 2, 3, 4)
        );
        assert!(dir.path().join("user_rois_1920x1080.json").exists());
    }

    #[test]
    fn malformed_override_file_is_treated_as_empty() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("user_rois_1920x1080.json"), "{not json").unwrap();

        let registry = RoiRegistry::with_default_bindings(dir.path());
        assert_eq!(
            registry.resolve("failure").unwrap(),
            Rect::new(973, 630, 702, 101)
        );
    }

    #[test]
    fn seeds_default_override_file_per_resolution() {
        let dir = TempDir::new().unwrap();
        let mut registry = RoiRegistry::with_default_bindings(dir.path());
        registry.update_resolution(1280, 720);

        let seeded = read_override_file(&dir.path().join("user_rois_1280x720.json")).unwrap();
        assert_eq!(
            seeded["level_check"],
            Rect::new(1101, 985, 48, 29).scaled(1280.0 / 1920.0, 720.0 / 1080.0)
        );
    }

    #[test]
    fn reload_picks_up_edited_overrides() {
        let dir = TempDir::new().unwrap();
        let mut registry = RoiRegistry::with_default_bindings(dir.path());
        registry.update_resolution(1920, 1080);

        fs::write(
            dir.path().join("user_rois_1920x1080.json"),
            r#"{"exclamation": [900, 400, 80, 160]}"#,
        )
        .unwrap();
        registry.reload();
        assert_eq!(
            registry.resolve("exclamation").unwrap(),
            Rect::new(900, 400, 80, 160)
        );
    }
}
