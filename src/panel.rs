//! The customization panel: tabs, swatches and upload validation.
//!
//! Controls here never touch the scene. They turn user input into
//! [`DesignChange`]s that the coordinator applies.

use std::path::Path;

use crate::{
    design::{Color, DesignChange, ModelSource, TextureData},
    error::UploadError,
};

pub const COLOR_PRESETS: [&str; 12] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7", "#DDA0DD", "#FFA07A", "#98D8C8",
    "#F7DC6F", "#BB8FCE", "#85C1E9", "#F8C471",
];

const MODEL_EXTENSIONS: [&str; 2] = ["glb", "gltf"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    Model,
    #[default]
    Colors,
    Textures,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Model, Tab::Colors, Tab::Textures];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Model => "Model",
            Tab::Colors => "Colors",
            Tab::Textures => "Textures",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelState {
    pub tab: Tab,
    pub show_color_picker: bool,
}

impl PanelState {
    pub fn select(&mut self, tab: Tab) {
        self.tab = tab;
    }

    pub fn toggle_color_picker(&mut self) {
        self.show_color_picker = !self.show_color_picker;
    }
}

/// The swatch after `current`, wrapping around. Colours that are not a
/// swatch start over at the first one.
pub fn next_swatch(current: &Color) -> Color {
    let next = COLOR_PRESETS
        .iter()
        .position(|swatch| swatch.eq_ignore_ascii_case(current.as_str()))
        .map_or(0, |idx| (idx + 1) % COLOR_PRESETS.len());
    Color::new(COLOR_PRESETS[next])
}

/// What a dropped or picked file is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Model,
    Texture,
}

impl UploadKind {
    /// Guess from the file extension. `None` for anything else.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        if has_model_extension(file_name) {
            Some(UploadKind::Model)
        } else if image::ImageFormat::from_path(Path::new(file_name)).is_ok() {
            Some(UploadKind::Texture)
        } else {
            None
        }
    }
}

fn has_model_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            MODEL_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}

fn check_size(file_name: &str, size: u64, limit: u64) -> Result<(), UploadError> {
    if size > limit {
        return Err(UploadError::TooLarge {
            file_name: file_name.to_string(),
            size,
            limit,
        });
    }
    Ok(())
}

/// Accept a model upload and point the design at `source`.
pub fn model_upload(
    file_name: &str,
    size: u64,
    limit: u64,
    source: ModelSource,
) -> Result<DesignChange, UploadError> {
    if !has_model_extension(file_name) {
        return Err(UploadError::UnsupportedModel {
            file_name: file_name.to_string(),
        });
    }
    check_size(file_name, size, limit)?;
    Ok(DesignChange::SetModel(source))
}

/// Accept a texture upload and embed it as a data URL.
///
/// The reported MIME type is used when it names a format the image decoder
/// reads; otherwise the type is sniffed from the bytes. Formats that cannot
/// be decoded (SVG among them) are rejected here instead of failing later.
pub fn texture_upload(
    file_name: &str,
    mime_type: Option<&str>,
    bytes: &[u8],
    limit: u64,
) -> Result<DesignChange, UploadError> {
    check_size(file_name, bytes.len() as u64, limit)?;
    let format = mime_type
        .and_then(image::ImageFormat::from_mime_type)
        .or_else(|| image::guess_format(bytes).ok())
        .filter(|format| format.reading_enabled())
        .ok_or_else(|| UploadError::UnsupportedImage {
            file_name: file_name.to_string(),
        })?;
    Ok(DesignChange::SetTexture(TextureData::from_bytes(
        format.to_mime_type(),
        bytes,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn colors_is_the_default_tab() {
        assert_eq!(PanelState::default().tab, Tab::Colors);
    }

    #[test]
    fn swatches_wrap() {
        assert_eq!(next_swatch(&Color::new("#f8c471")).as_str(), "#FF6B6B");
        assert_eq!(next_swatch(&Color::new("#FF6B6B")).as_str(), "#4ECDC4");
        assert_eq!(next_swatch(&Color::default()).as_str(), "#FF6B6B");
    }

    #[test]
    fn models_need_a_gltf_extension() {
        let source = ModelSource::new("blob:abc");
        assert!(model_upload("Shirt.GLB", 10, 100, source.clone()).is_ok());
        assert_eq!(
            model_upload("shirt.obj", 10, 100, source.clone()),
            Err(UploadError::UnsupportedModel {
                file_name: "shirt.obj".to_string()
            })
        );
        assert!(matches!(
            model_upload("shirt.glb", 101, 100, source),
            Err(UploadError::TooLarge { size: 101, .. })
        ));
    }

    #[test]
    fn texture_type_is_sniffed_without_mime() {
        let change = texture_upload("logo", None, PNG_SIGNATURE, 1024).unwrap();
        let DesignChange::SetTexture(texture) = change else {
            panic!("expected a texture");
        };
        assert!(texture.as_str().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn non_images_are_rejected() {
        assert_eq!(
            texture_upload("notes.txt", Some("text/plain"), b"hello", 1024),
            Err(UploadError::UnsupportedImage {
                file_name: "notes.txt".to_string()
            })
        );
    }

    #[test]
    fn svg_is_rejected_at_upload() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"/>"#;
        assert_eq!(
            texture_upload("logo.svg", Some("image/svg+xml"), svg, 1024),
            Err(UploadError::UnsupportedImage {
                file_name: "logo.svg".to_string()
            })
        );
        assert_eq!(UploadKind::from_file_name("logo.svg"), None);
    }

    #[test]
    fn reported_type_is_normalised() {
        let change = texture_upload("photo.jpg", Some("image/jpeg"), b"\xff\xd8\xff", 1024).unwrap();
        let DesignChange::SetTexture(texture) = change else {
            panic!("expected a texture");
        };
        assert!(texture.as_str().starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn drops_are_sorted_by_extension() {
        assert_eq!(UploadKind::from_file_name("a.gltf"), Some(UploadKind::Model));
        assert_eq!(UploadKind::from_file_name("a.jpeg"), Some(UploadKind::Texture));
        assert_eq!(UploadKind::from_file_name("a.zip"), None);
    }
}
