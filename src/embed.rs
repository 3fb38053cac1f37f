//! Embed snippets for third-party pages.
//!
//! The design is serialized as JSON into a `config` query parameter. The
//! same encoding is read back by [`EmbedConfig::from_query`] when the
//! customizer itself is opened from an embed URL.

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

use crate::{
    design::{Color, DesignChange, DesignConfig, ModelSource},
    error::EmbedError,
    material::MaterialPreset,
    share::encode_component,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedSize {
    pub width: u32,
    pub height: u32,
}

impl EmbedSize {
    pub const SMALL: EmbedSize = EmbedSize::new(400, 300);
    pub const MEDIUM: EmbedSize = EmbedSize::new(800, 600);
    pub const LARGE: EmbedSize = EmbedSize::new(1200, 900);

    pub const PRESETS: [(&'static str, EmbedSize); 3] = [
        ("Small", EmbedSize::SMALL),
        ("Medium", EmbedSize::MEDIUM),
        ("Large", EmbedSize::LARGE),
    ];

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for EmbedSize {
    fn default() -> Self {
        Self::MEDIUM
    }
}

/// What an embedded customizer starts with. Field order is the JSON order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedConfig {
    pub model_url: String,
    pub default_color: String,
    pub default_material: MaterialPreset,
    pub width: u32,
    pub height: u32,
}

impl EmbedConfig {
    pub fn from_design(design: &DesignConfig, size: EmbedSize) -> Self {
        Self {
            model_url: design
                .model()
                .map(|model| model.as_str().to_string())
                .unwrap_or_default(),
            default_color: design.color().as_str().to_string(),
            default_material: design.material(),
            width: size.width,
            height: size.height,
        }
    }

    pub fn to_json(&self) -> Result<String, EmbedError> {
        Ok(serde_json::to_string(self)?)
    }

    /// The `config` value, JSON escaped with `encodeURIComponent` rules.
    pub fn to_query(&self) -> Result<String, EmbedError> {
        Ok(encode_component(&self.to_json()?))
    }

    /// Read the config out of a query string such as `?config=...&x=1`.
    pub fn from_query(query: &str) -> Result<Self, EmbedError> {
        let value = query
            .trim_start_matches('?')
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find_map(|(key, value)| (key == "config").then_some(value))
            .ok_or(EmbedError::MissingConfig)?;
        let json = percent_decode_str(value).decode_utf8()?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn size(&self) -> EmbedSize {
        EmbedSize::new(self.width, self.height)
    }

    /// Seed `design` with this config. An empty model URL leaves the model
    /// unset.
    pub fn apply_to(&self, design: &DesignConfig) -> DesignConfig {
        let design = design
            .apply(DesignChange::SetColor(Color::new(self.default_color.clone())))
            .apply(DesignChange::SetMaterial(self.default_material));
        if self.model_url.is_empty() {
            design.apply(DesignChange::ClearModel)
        } else {
            design.apply(DesignChange::SetModel(ModelSource::new(self.model_url.clone())))
        }
    }
}

/// Toggles shown under "Advanced Options". They are carried along but do
/// not change the generated snippets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmbedOptions {
    pub enable_ar: bool,
    pub show_export: bool,
    pub allow_upload: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedOption {
    EnableAr,
    ShowExport,
    AllowUpload,
}

impl EmbedOption {
    pub fn label(self) -> &'static str {
        match self {
            EmbedOption::EnableAr => "Enable AR mode",
            EmbedOption::ShowExport => "Show export buttons",
            EmbedOption::AllowUpload => "Allow model upload",
        }
    }
}

impl EmbedOptions {
    pub fn toggle(&mut self, option: EmbedOption) {
        let flag = match option {
            EmbedOption::EnableAr => &mut self.enable_ar,
            EmbedOption::ShowExport => &mut self.show_export,
            EmbedOption::AllowUpload => &mut self.allow_upload,
        };
        *flag = !*flag;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbedGenerator {
    pub size: EmbedSize,
    pub show_advanced: bool,
    pub options: EmbedOptions,
}

impl EmbedGenerator {
    pub fn set_width(&mut self, width: u32) {
        self.size.width = width;
    }

    pub fn set_height(&mut self, height: u32) {
        self.size.height = height;
    }

    pub fn config(&self, design: &DesignConfig) -> EmbedConfig {
        EmbedConfig::from_design(design, self.size)
    }

    /// HTML iframe pointing at `<origin>/embed`.
    pub fn iframe_snippet(&self, origin: &str, design: &DesignConfig) -> Result<String, EmbedError> {
        let query = self.config(design).to_query()?;
        let EmbedSize { width, height } = self.size;
        Ok(format!(
            r#"<!-- 3D Apparel Customizer Embed -->
<iframe
  src="{origin}/embed?config={query}"
  width="{width}"
  height="{height}"
  frameborder="0"
  allowfullscreen
  style="border-radius: 12px; box-shadow: 0 10px 25px rgba(0,0,0,0.1);"
></iframe>"#
        ))
    }

    /// Usage of the reusable `ApparelCustomizer` component.
    pub fn component_snippet(&self, design: &DesignConfig) -> String {
        let model_url = design.model().map(ModelSource::as_str).unwrap_or_default();
        let color = design.color();
        let material = design.material().id();
        let EmbedSize { width, height } = self.size;
        format!(
            r#"import React from 'react';
import {{ ApparelCustomizer }} from '@your-domain/apparel-customizer';

function MyCustomizer() {{
  return (
    <ApparelCustomizer
      modelUrl="{model_url}"
      defaultColor="{color}"
      defaultMaterial="{material}"
      width={{{width}}}
      height={{{height}}}
      onDesignChange={{(design) => console.log('Design updated:', design)}}
      onExport={{(imageData) => console.log('Design exported:', imageData)}}
    />
  );
}}

export default MyCustomizer;"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes_in_field_order() {
        let config = EmbedConfig::from_design(&DesignConfig::default(), EmbedSize::default());
        assert_eq!(
            config.to_json().unwrap(),
            r##"{"modelUrl":"","defaultColor":"#3B82F6","defaultMaterial":"cotton","width":800,"height":600}"##
        );
    }

    #[test]
    fn query_survives_other_parameters() {
        let design = DesignConfig::default()
            .apply(DesignChange::SetModel(ModelSource::new("models/tee.glb")))
            .apply(DesignChange::SetMaterial(MaterialPreset::Silk));
        let config = EmbedConfig::from_design(&design, EmbedSize::SMALL);
        let query = format!("?lang=en&config={}&x=1", config.to_query().unwrap());
        assert_eq!(EmbedConfig::from_query(&query).unwrap(), config);
    }

    #[test]
    fn missing_config_is_reported() {
        assert!(matches!(
            EmbedConfig::from_query("?lang=en"),
            Err(EmbedError::MissingConfig)
        ));
    }

    #[test]
    fn unknown_material_is_rejected() {
        let query = format!(
            "config={}",
            encode_component(
                r##"{"modelUrl":"","defaultColor":"#fff","defaultMaterial":"wool","width":1,"height":1}"##
            )
        );
        assert!(matches!(
            EmbedConfig::from_query(&query),
            Err(EmbedError::Json(_))
        ));
    }

    #[test]
    fn advanced_options_do_not_change_snippets() {
        let design = DesignConfig::default();
        let mut generator = EmbedGenerator::default();
        let before = generator.iframe_snippet("https://a.test", &design).unwrap();
        generator.options.toggle(EmbedOption::AllowUpload);
        generator.show_advanced = true;
        assert_eq!(
            generator.iframe_snippet("https://a.test", &design).unwrap(),
            before
        );
    }

    #[test]
    fn component_snippet_uses_jsx_braces() {
        let snippet = EmbedGenerator::default().component_snippet(&DesignConfig::default());
        assert!(snippet.contains("      width={800}\n      height={600}\n"));
        assert!(snippet.contains(r#"modelUrl="""#));
    }
}
