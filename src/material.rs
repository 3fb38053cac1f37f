//! Material presets and their surface properties.
//!
//! Every garment surface is described by two physically based parameters:
//! roughness (0 = mirror, 1 = fully diffuse) and metalness. The table is
//! fixed; presets are identified by lowercase ids on the wire (`cotton`,
//! `denim`, `silk`, `leather`).

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::DesignError;

/// Roughness/metalness pair uploaded to the material uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceProperties {
    pub roughness: f32,
    pub metalness: f32,
}

/// A named bundle of surface properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialPreset {
    #[default]
    Cotton,
    Denim,
    Silk,
    Leather,
}

impl MaterialPreset {
    /// All presets in the order they are offered in the panel.
    pub const ALL: [MaterialPreset; 4] = [
        MaterialPreset::Cotton,
        MaterialPreset::Denim,
        MaterialPreset::Silk,
        MaterialPreset::Leather,
    ];

    pub fn surface(self) -> SurfaceProperties {
        let (roughness, metalness) = match self {
            MaterialPreset::Cotton => (0.8, 0.1),
            MaterialPreset::Denim => (0.9, 0.0),
            MaterialPreset::Silk => (0.2, 0.1),
            MaterialPreset::Leather => (0.4, 0.2),
        };
        SurfaceProperties {
            roughness,
            metalness,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            MaterialPreset::Cotton => "cotton",
            MaterialPreset::Denim => "denim",
            MaterialPreset::Silk => "silk",
            MaterialPreset::Leather => "leather",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            MaterialPreset::Cotton => "Cotton",
            MaterialPreset::Denim => "Denim",
            MaterialPreset::Silk => "Silk",
            MaterialPreset::Leather => "Leather",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            MaterialPreset::Cotton => "Soft, breathable fabric",
            MaterialPreset::Denim => "Durable, classic material",
            MaterialPreset::Silk => "Luxurious, smooth texture",
            MaterialPreset::Leather => "Premium, glossy finish",
        }
    }
}

impl FromStr for MaterialPreset {
    type Err = DesignError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        MaterialPreset::ALL
            .into_iter()
            .find(|preset| preset.id() == id)
            .ok_or_else(|| DesignError::UnknownMaterial(id.to_string()))
    }
}

impl fmt::Display for MaterialPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_map_to_their_surface() {
        let table: Vec<_> = MaterialPreset::ALL
            .into_iter()
            .map(|preset| (preset.id(), preset.surface()))
            .collect();
        assert_eq!(
            table,
            vec![
                ("cotton", SurfaceProperties { roughness: 0.8, metalness: 0.1 }),
                ("denim", SurfaceProperties { roughness: 0.9, metalness: 0.0 }),
                ("silk", SurfaceProperties { roughness: 0.2, metalness: 0.1 }),
                ("leather", SurfaceProperties { roughness: 0.4, metalness: 0.2 }),
            ]
        );
    }

    #[test]
    fn ids_parse_back() {
        for preset in MaterialPreset::ALL {
            assert_eq!(preset.id().parse::<MaterialPreset>(), Ok(preset));
        }
        assert_eq!(
            "velvet".parse::<MaterialPreset>(),
            Err(DesignError::UnknownMaterial("velvet".to_string()))
        );
        assert!("Cotton".parse::<MaterialPreset>().is_err());
    }

    #[test]
    fn serializes_as_lowercase_id() {
        assert_eq!(serde_json::to_string(&MaterialPreset::Leather).unwrap(), "\"leather\"");
    }
}
