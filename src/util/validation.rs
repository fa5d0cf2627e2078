// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Placement checks.
//!
//! The validator is advisory: it never rejects or changes a placement, it
//! only describes what may print badly. All checks are independent, so
//! several warnings can fire at once; a clean placement yields an empty list.

use super::geometry::Mapper;
use crate::models::element::{EditorTransform, Side};
use serde::{Deserialize, Serialize};

/// Thresholds for the placement checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Distance from 0 or 100 (percent) that counts as "near the edge".
    pub edge_margin: f64,
    /// Smallest printable width/height in editor pixels.
    pub min_size: f64,
    /// Largest width/height that still fits the print area.
    pub max_size: f64,
    pub aspect_min: f64,
    pub aspect_max: f64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            edge_margin: 5.0,
            min_size: 20.0,
            max_size: 300.0,
            aspect_min: 0.2,
            aspect_max: 5.0,
        }
    }
}

/// Produces warnings for a proposed placement.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidatorConfig,
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Edge, size and aspect-ratio checks.
    pub fn validate(&self, transform: &EditorTransform, side: Side) -> Vec<String> {
        let cfg = &self.config;
        let mut warnings = Vec::new();

        if transform.x < cfg.edge_margin {
            warnings.push(format!("Too close to the left edge of the {}", side));
        }
        if transform.x > 100.0 - cfg.edge_margin {
            warnings.push(format!("Too close to the right edge of the {}", side));
        }
        if transform.y < cfg.edge_margin {
            warnings.push(format!("Too close to the top edge of the {}", side));
        }
        if transform.y > 100.0 - cfg.edge_margin {
            warnings.push(format!("Too close to the bottom edge of the {}", side));
        }

        if transform.width < cfg.min_size || transform.height < cfg.min_size {
            warnings.push("Design may be too small to print clearly".to_string());
        }
        if transform.width > cfg.max_size || transform.height > cfg.max_size {
            warnings.push("Design may be too large for the print area".to_string());
        }

        let aspect = transform.width / transform.height;
        if !(cfg.aspect_min..=cfg.aspect_max).contains(&aspect) {
            warnings.push(format!("Unusual aspect ratio {:.2} - may not print well", aspect));
        }

        warnings
    }

    /// [`Validator::validate`] plus a warning whenever the 3D preview will
    /// clamp the position into the garment's safe zone.
    pub fn validate_placement(&self, mapper: &Mapper<'_>, transform: &EditorTransform, side: Side) -> Vec<String> {
        let mut warnings = self.validate(transform, side);
        if !mapper.in_safe_zone(transform, side) {
            warnings.push("Outside the recommended print area; the preview is clamped to it".to_string());
        }
        warnings
    }
}
