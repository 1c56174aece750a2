//! Detection configuration

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Which reference images the detector loads and where they live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    pub assets_dir: PathBuf,
    /// Template name -> image file name inside `assets_dir`.
    pub manifest: HashMap<String, String>,
}

impl DetectionConfig {
    pub fn template_path(&self, name: &str) -> Option<PathBuf> {
        self.manifest.get(name).map(|file| self.assets_dir.join(file))
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        let manifest = [
            ("fishing_spot_btn", "fishing_spot_btn.png"),
            ("broken_rod", "broken_rod.png"),
            ("new_rod", "new_rod.png"),
            ("reg_rod", "reg_pole.png"),
            ("sturdy_rod", "sturdy_pole.png"),
            ("flex_rod", "flex_pole.png"),
            ("exclamation", "exclamation.png"),
            ("left_arrow", "left_arrow.png"),
            ("right_arrow", "right_arrow.png"),
            ("failure", "fish_escaped.png"),
            ("success", "success.png"),
            ("continue", "continue.png"),
            ("level_check", "level_check.png"),
            ("connect_server", "connect.png"),
        ]
        .into_iter()
        .map(|(name, file)| (name.to_string(), file.to_string()))
        .collect();

        Self {
            assets_dir: PathBuf::from("assets/templates"),
            manifest,
        }
    }
}
