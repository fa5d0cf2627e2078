// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The layer log.
//!
//! A render is recorded as an ordered list of drawing operations with the
//! exact texture-space parameters used. Replaying the log reproduces the
//! texture without the project that produced it.

use crate::models::color::Color;
use serde::{Deserialize, Serialize};

/// One drawing operation on the texture canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Layer {
    /// Flat fill of the whole canvas.
    BaseColor { color: Color },
    /// Image tiled from the top-left corner across the whole canvas.
    Pattern { asset: String, opacity: f32 },
    /// Image drawn into a center-anchored rect, rotated about its center.
    #[serde(rename_all = "camelCase")]
    Sticker {
        asset: String,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        /// Degrees, clockwise.
        rotation: f64,
    },
    /// Text drawn with its top-left corner at `(x, y)`.
    #[serde(rename_all = "camelCase")]
    Text {
        text: String,
        x: f64,
        y: f64,
        font_size: f32,
        font_family: String,
        color: Color,
    },
}

impl Layer {
    /// Image asset this layer needs loaded before drawing, if any.
    pub fn asset(&self) -> Option<&str> {
        match self {
            Layer::Sticker { asset, .. } | Layer::Pattern { asset, .. } => Some(asset),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Layer::BaseColor { .. } => "baseColor",
            Layer::Pattern { .. } => "pattern",
            Layer::Sticker { .. } => "sticker",
            Layer::Text { .. } => "text",
        }
    }
}
