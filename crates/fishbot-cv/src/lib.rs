//! Fishbot Computer Vision Library
//!
//! Screen capture and template detection for the fishing cycle: loads
//! reference images authored at 1920x1080, rescales them to the active
//! capture resolution and searches region-constrained crops of each frame
//! with masked normalized cross-correlation.

pub mod capture;
pub mod config;
pub mod detect;
pub mod template;

// Re-export commonly used types
pub use capture::{AsyncCapture, CaptureError, CaptureService};
pub use config::DetectionConfig;
pub use detect::Detector;
pub use template::{load_templates, Template, TemplateSet};

// Error handling
pub type Result<T> = anyhow::Result<T>;
