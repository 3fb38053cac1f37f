//! The design configuration and the changes that can be applied to it.
//!
//! A [`DesignConfig`] is an immutable value. Every user interaction is
//! expressed as a [`DesignChange`] and applied with [`DesignConfig::apply`],
//! which returns the next configuration. Rendering only ever reads a
//! configuration; it never writes one.

use std::{fmt, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::DesignError,
    material::MaterialPreset,
    resources::data_url::{self, DataUrl},
};

/// A colour as the user entered it.
///
/// The string is stored verbatim: reading it back returns exactly what was
/// set. It is only interpreted when painting the scene.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    pub const DEFAULT: &'static str = "#3B82F6";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse `#RGB` or `#RRGGBB` (case-insensitive).
    pub fn to_rgb8(&self) -> Result<[u8; 3], DesignError> {
        let invalid = || DesignError::InvalidColor(self.0.clone());
        let hex = self.0.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
        match hex.len() {
            3 => {
                let mut rgb = [0u8; 3];
                for (i, c) in hex.chars().enumerate() {
                    let v = channel(&c.to_string())?;
                    rgb[i] = v * 17;
                }
                Ok(rgb)
            }
            6 => Ok([
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            ]),
            _ => Err(invalid()),
        }
    }

    /// Linear-space RGBA for the shader. The surface is sRGB, so the hex
    /// value has to be linearized before it is written into a uniform.
    pub fn to_linear_rgba(&self) -> Result<[f32; 4], DesignError> {
        let [r, g, b] = self.to_rgb8()?;
        Ok([srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b), 1.0])
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Color {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

fn srgb_to_linear(channel: u8) -> f32 {
    let c = channel as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// An image embedded as a `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureData(String);

impl TextureData {
    pub fn from_data_url(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        Self(data_url::encode(mime_type, bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn decode(&self) -> Result<DataUrl, crate::error::DataUrlError> {
        data_url::decode(&self.0)
    }
}

/// Where a garment model comes from: a URL (http, blob) or a local path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelSource(String);

impl ModelSource {
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Anything with a scheme is fetched, everything else is a file path.
    pub fn is_remote(&self) -> bool {
        ["http://", "https://", "blob:", "data:"]
            .iter()
            .any(|scheme| self.0.starts_with(scheme))
    }

    /// Resolve a URI referenced from inside the asset (e.g. `scene.bin`)
    /// relative to this source. URLs are split on `/`, file paths with the
    /// platform's own separators.
    pub fn join(&self, relative: &str) -> ModelSource {
        let relative_source = ModelSource::new(relative);
        if relative_source.is_remote() {
            return relative_source;
        }
        if self.is_remote() {
            return match self.0.rfind('/') {
                Some(idx) => ModelSource(format!("{}/{}", &self.0[..idx], relative)),
                None => relative_source,
            };
        }
        match Path::new(&self.0).parent() {
            Some(dir) => ModelSource(dir.join(relative).to_string_lossy().into_owned()),
            None => relative_source,
        }
    }
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One logical change to a design.
#[derive(Debug, Clone, PartialEq)]
pub enum DesignChange {
    SetColor(Color),
    SetTexture(TextureData),
    ClearTexture,
    SetMaterial(MaterialPreset),
    SetModel(ModelSource),
    ClearModel,
}

/// The user's current customization.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DesignConfig {
    color: Color,
    texture: Option<TextureData>,
    material: MaterialPreset,
    model: Option<ModelSource>,
}

impl DesignConfig {
    pub fn new(color: Color, material: MaterialPreset) -> Self {
        Self {
            color,
            material,
            ..Default::default()
        }
    }

    pub fn color(&self) -> &Color {
        &self.color
    }

    pub fn texture(&self) -> Option<&TextureData> {
        self.texture.as_ref()
    }

    pub fn material(&self) -> MaterialPreset {
        self.material
    }

    pub fn model(&self) -> Option<&ModelSource> {
        self.model.as_ref()
    }

    /// Return the configuration that results from `change`.
    #[must_use]
    pub fn apply(&self, change: DesignChange) -> DesignConfig {
        let mut next = self.clone();
        match change {
            DesignChange::SetColor(color) => next.color = color,
            DesignChange::SetTexture(texture) => next.texture = Some(texture),
            DesignChange::ClearTexture => next.texture = None,
            DesignChange::SetMaterial(material) => next.material = material,
            DesignChange::SetModel(model) => next.model = Some(model),
            DesignChange::ClearModel => next.model = None,
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn colours_read_back_verbatim() {
        for value in ["#ff0000", "#ABCDEF", "not a colour", ""] {
            let design = DesignConfig::default().apply(DesignChange::SetColor(Color::new(value)));
            assert_eq!(design.color().as_str(), value);
        }
    }

    #[test]
    fn hex_colours_parse() {
        assert_eq!(Color::new("#3B82F6").to_rgb8(), Ok([0x3b, 0x82, 0xf6]));
        assert_eq!(Color::new("#fff").to_rgb8(), Ok([255, 255, 255]));
        assert!(Color::new("#12345").to_rgb8().is_err());
        assert!(Color::new("red").to_rgb8().is_err());
        assert!(Color::new("#gg0000").to_rgb8().is_err());

        let [r, g, b, a] = Color::new("#ffffff").to_linear_rgba().unwrap();
        assert_relative_eq!(r + g + b + a, 4.0);
        assert_relative_eq!(Color::new("#808080").to_linear_rgba().unwrap()[0], 0.2158605, epsilon = 1e-5);
    }

    #[test]
    fn changes_touch_one_field() {
        let base = DesignConfig::default()
            .apply(DesignChange::SetModel(ModelSource::new("shirt.glb")))
            .apply(DesignChange::SetTexture(TextureData::from_data_url("data:image/png;base64,AA==")));
        let silk = base.apply(DesignChange::SetMaterial(MaterialPreset::Silk));
        assert_eq!(silk.material(), MaterialPreset::Silk);
        assert_eq!(silk.model(), base.model());
        assert_eq!(silk.texture(), base.texture());
        assert_eq!(silk.color(), base.color());

        let cleared = silk
            .apply(DesignChange::ClearTexture)
            .apply(DesignChange::ClearModel);
        assert_eq!(cleared.texture(), None);
        assert_eq!(cleared.model(), None);
        assert_eq!(base.material(), MaterialPreset::Cotton);
    }

    #[test]
    fn relative_side_files_resolve_next_to_the_model() {
        let expected = Path::new("models").join("shirt.bin");
        assert_eq!(
            ModelSource::new("models/shirt.gltf").join("shirt.bin").as_str(),
            expected.to_string_lossy()
        );
        assert_eq!(ModelSource::new("shirt.gltf").join("shirt.bin").as_str(), "shirt.bin");
        assert_eq!(
            ModelSource::new("https://cdn.example/m/shirt.gltf")
                .join("shirt.bin")
                .as_str(),
            "https://cdn.example/m/shirt.bin"
        );
        assert!(ModelSource::new("https://cdn.example/a.glb").is_remote());
        assert!(!ModelSource::new("a.glb").is_remote());
    }

    #[test]
    #[cfg(windows)]
    fn dropped_windows_paths_keep_their_directory() {
        assert_eq!(
            ModelSource::new(r"C:\models\shirt.gltf").join("shirt.bin").as_str(),
            r"C:\models\shirt.bin"
        );
    }
}
