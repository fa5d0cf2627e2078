// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project state.
//!
//! A project is one customization session: the garment model, its base
//! fabric color, and the ordered list of placed elements. Element order is
//! paint order; later elements draw on top.

use super::color::Color;
use super::element::Element;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fabric texture tiled over the base color, under every element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FabricPattern {
    pub asset_ref: String,
    /// 0.0 (invisible) to 1.0.
    pub opacity: f32,
}

/// Complete project data, as held by the session and sent to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub model_type: String,
    /// Resolved garment model asset.
    pub model_path: String,
    pub base_color: Color,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<FabricPattern>,
    pub elements: Vec<Element>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Project {
    /// Create an empty project with a fresh id.
    pub fn new(model_type: String, model_path: String, base_color: Color) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            model_type,
            model_path,
            base_color,
            pattern: None,
            elements: Vec::new(),
            created_at: now,
            last_updated: now,
        }
    }

    /// Bump `last_updated`; called on every mutation.
    pub fn touch(&mut self) {
        self.last_updated = Utc::now();
    }

    pub fn element(&self, id: Uuid) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn element_mut(&mut self, id: Uuid) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    /// Remove an element, returning it if it existed.
    pub fn remove_element(&mut self, id: Uuid) -> Option<Element> {
        let index = self.elements.iter().position(|e| e.id == id)?;
        Some(self.elements.remove(index))
    }
}
