// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Runtime settings.
//!
//! Settings load from an optional YAML file. Every field has a default, so an
//! empty file (or none at all) gives a working server.

use crate::error::Result;
use crate::models::element::SizeLimits;
use crate::render::compositor::CompositorOptions;
use crate::scene::placement::PlacementAdapter;
use crate::util::geometry::{Dimensions, MappingProfile};
use crate::util::validation::ValidatorConfig;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub realtime_bind: String,
    /// HTTP worker threads.
    pub workers: usize,
    pub max_upload_bytes: usize,
    /// Largest accepted render width or height.
    pub max_texture_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
            realtime_bind: "0.0.0.0:3001".to_string(),
            workers: 4,
            max_upload_bytes: 10 * 1024 * 1024,
            max_texture_size: 8192,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Garment models (`.glb`).
    pub assets: PathBuf,
    pub uploads: PathBuf,
    /// Rendered textures and their layer logs.
    pub outputs: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            assets: PathBuf::from("assets"),
            uploads: PathBuf::from("uploads"),
            outputs: PathBuf::from("outputs"),
        }
    }
}

impl PathsConfig {
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.assets, &self.uploads, &self.outputs] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Size of the 2D editor canvas in editor pixels.
    pub editor: Dimensions,
    /// Texture size used when a render request omits one.
    pub texture: Dimensions,
    pub size_limits: SizeLimits,
    /// Bounds for a text block's font size in editor pixels.
    pub font_size_limits: SizeLimits,
    pub default_element_width: f64,
    pub default_element_height: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            editor: Dimensions::new(400.0, 500.0),
            texture: Dimensions::new(2048.0, 2048.0),
            size_limits: SizeLimits::default(),
            font_size_limits: SizeLimits { min: 4.0, max: 512.0 },
            default_element_width: 80.0,
            default_element_height: 80.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontsConfig {
    /// Font family name to TTF/OTF file.
    pub families: HashMap<String, PathBuf>,
    /// Used for families with no entry.
    pub default_font: Option<PathBuf>,
}

/// Mapping and 3D calibration for one garment model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GarmentProfile {
    pub mapping: MappingProfile,
    pub placement: PlacementAdapter,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub paths: PathsConfig,
    pub canvas: CanvasConfig,
    pub validator: ValidatorConfig,
    /// Profile for garments without an entry in `garments`.
    pub mapping: MappingProfile,
    pub garments: BTreeMap<String, GarmentProfile>,
    pub fonts: FontsConfig,
    pub compositor: CompositorOptions,
}

impl Settings {
    /// Load settings from a YAML file, or defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let yaml = std::fs::read_to_string(path)?;
        let settings = Self::from_yaml(&yaml)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Apply environment overrides (`PORT`).
    pub fn apply_env(&mut self) {
        if let Ok(port) = std::env::var("PORT") {
            self.override_port(&port);
        }
    }

    /// Replace the port of the HTTP bind address. Non-numeric values are
    /// ignored with a warning.
    pub fn override_port(&mut self, port: &str) {
        let Ok(port) = port.trim().parse::<u16>() else {
            log::warn!("Ignoring invalid PORT value '{}'", port);
            return;
        };
        let host = self.server.bind.rsplit_once(':').map(|(host, _)| host).unwrap_or("0.0.0.0");
        self.server.bind = format!("{}:{}", host, port);
    }

    /// Profile for a garment type, falling back to the default mapping.
    pub fn garment(&self, model_type: &str) -> GarmentProfile {
        self.garments.get(model_type).cloned().unwrap_or_else(|| GarmentProfile {
            mapping: self.mapping.clone(),
            placement: PlacementAdapter::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::element::Side;
    use crate::util::geometry::MappingPolicy;

    #[test]
    fn test_empty_yaml_is_default() {
        let settings = Settings::from_yaml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.server.bind, "0.0.0.0:3000");
        assert_eq!(settings.server.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(settings.canvas.editor, Dimensions::new(400.0, 500.0));
        assert_eq!(settings.canvas.font_size_limits.max, 512.0);
        assert!(settings.compositor.text_shadow);
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let yaml = r#"
server:
  workers: 2
validator:
  edge_margin: 8.0
garments:
  hoodie:
    mapping:
      policy: proportional
      regions:
        FRONT:
          bounds: [0.0, 0.0, 0.5, 1.0]
      safe_range: { min: 0.1, max: 0.9 }
    placement:
      bounds: { min: [-1.0, 0.0, -0.3], max: [1.0, 2.0, 0.3] }
fonts:
  families:
    Arial: /fonts/arial.ttf
"#;
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.server.workers, 2);
        assert_eq!(settings.server.bind, "0.0.0.0:3000");
        assert_eq!(settings.validator.edge_margin, 8.0);
        assert_eq!(settings.validator.min_size, 20.0);

        let hoodie = settings.garment("hoodie");
        assert_eq!(hoodie.mapping.policy, MappingPolicy::Proportional);
        assert_eq!(hoodie.mapping.region(Side::Front).bounds, [0.0, 0.0, 0.5, 1.0]);
        assert_eq!(hoodie.placement.bounds.max[2], 0.3);

        let tshirt = settings.garment("tshirt");
        assert_eq!(tshirt.mapping, MappingProfile::default());
        assert_eq!(settings.fonts.families["Arial"], PathBuf::from("/fonts/arial.ttf"));
    }

    #[test]
    fn test_port_override() {
        let mut settings = Settings::default();
        settings.override_port("8080");
        assert_eq!(settings.server.bind, "0.0.0.0:8080");
        settings.override_port("not-a-port");
        assert_eq!(settings.server.bind, "0.0.0.0:8080");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        std::fs::write(&path, "paths:\n  outputs: /tmp/renders\n").unwrap();
        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.paths.outputs, PathBuf::from("/tmp/renders"));
        assert_eq!(settings.paths.uploads, PathBuf::from("uploads"));
        assert!(Settings::load(Some(&dir.path().join("missing.yaml"))).is_err());
    }
}
