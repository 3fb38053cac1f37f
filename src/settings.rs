//! Runtime settings for the customizer.
//!
//! There are no configuration files: an application builds a [`Settings`]
//! (usually from `Settings::default()`) and hands it to
//! [`crate::app::run_customizer`].

use std::path::PathBuf;

use crate::{design::Color, material::MaterialPreset};

/// 50 MB, as advertised next to the model upload.
pub const MAX_MODEL_BYTES: u64 = 50 * 1024 * 1024;
/// 10 MB, as advertised next to the texture upload.
pub const MAX_TEXTURE_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Settings {
    pub default_color: Color,
    pub default_material: MaterialPreset,
    /// Relative model paths and glTF side files are resolved against this.
    pub asset_root: PathBuf,
    /// Where native exports are written.
    pub export_dir: PathBuf,
    pub max_model_bytes: u64,
    pub max_texture_bytes: u64,
    /// Page URL and origin used for share/embed links when there is no
    /// browser location to read them from.
    pub page_url: String,
    pub origin: String,
    pub studio_clear_colour: wgpu::Color,
    pub export_background: wgpu::Color,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_color: Color::default(),
            default_material: MaterialPreset::default(),
            asset_root: PathBuf::from("./assets"),
            export_dir: PathBuf::from("./exports"),
            max_model_bytes: MAX_MODEL_BYTES,
            max_texture_bytes: MAX_TEXTURE_BYTES,
            page_url: "http://localhost:5173/".to_string(),
            origin: "http://localhost:5173".to_string(),
            // gray-50 to gray-200, the studio backdrop
            studio_clear_colour: wgpu::Color {
                r: 0.92,
                g: 0.93,
                b: 0.94,
                a: 1.0,
            },
            export_background: wgpu::Color::WHITE,
        }
    }
}
