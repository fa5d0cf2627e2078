// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Design element data structures.
//!
//! This module defines the stickers and text blocks placed on a garment,
//! their editor-space transform, and the partial transforms clients send
//! while dragging.

use super::color::Color;
use crate::util::geometry::UvRect;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Garment surface an element targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    #[default]
    Front,
    Back,
    Left,
    Right,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Side::Front => "front",
            Side::Back => "back",
            Side::Left => "left",
            Side::Right => "right",
        };
        f.write_str(name)
    }
}

/// Hard bounds for an element's pixel size in editor space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeLimits {
    pub min: f64,
    pub max: f64,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self { min: 1.0, max: 2048.0 }
    }
}

impl SizeLimits {
    /// Clamp `value` into the range. NaN collapses to `min`.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            self.min
        } else {
            value.clamp(self.min, self.max)
        }
    }
}

/// Position (percent, origin top-left), size (editor pixels) and
/// rotation (degrees) on the 2D editor canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EditorTransform {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub rotation: f64,
}

impl EditorTransform {
    pub fn new(x: f64, y: f64, width: f64, height: f64, rotation: f64) -> Self {
        Self { x, y, width, height, rotation }
    }

    /// Clamp into the stored invariants: position in [0,100], size within
    /// `limits`, rotation in [0,360). NaN collapses to the lower bound.
    pub fn clamped(self, limits: &SizeLimits) -> Self {
        let position = SizeLimits { min: 0.0, max: 100.0 };
        let rotation = if self.rotation.is_finite() {
            self.rotation.rem_euclid(360.0)
        } else {
            0.0
        };
        Self {
            x: position.clamp(self.x),
            y: position.clamp(self.y),
            width: limits.clamp(self.width),
            height: limits.clamp(self.height),
            // rem_euclid can round up to exactly 360.0 for tiny negatives
            rotation: if rotation >= 360.0 { 0.0 } else { rotation },
        }
    }

    /// Shallow merge: fields present in `patch` replace ours.
    pub fn merged(self, patch: &TransformPatch) -> Self {
        Self {
            x: patch.x.unwrap_or(self.x),
            y: patch.y.unwrap_or(self.y),
            width: patch.width.unwrap_or(self.width),
            height: patch.height.unwrap_or(self.height),
            rotation: patch.rotation.unwrap_or(self.rotation),
        }
    }
}

/// A partial transform; unspecified fields stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
}

impl TransformPatch {
    /// The stored values for the fields this patch touched.
    pub fn settled(&self, transform: &EditorTransform, side: Side) -> Self {
        Self {
            x: self.x.map(|_| transform.x),
            y: self.y.map(|_| transform.y),
            width: self.width.map(|_| transform.width),
            height: self.height.map(|_| transform.height),
            rotation: self.rotation.map(|_| transform.rotation),
            side: self.side.map(|_| side),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_none()
            && self.y.is_none()
            && self.width.is_none()
            && self.height.is_none()
            && self.rotation.is_none()
            && self.side.is_none()
    }
}

/// What an element draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    #[serde(rename_all = "camelCase")]
    Sticker {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sticker_id: Option<String>,
        /// URL or identifier of the source image, owned by the asset store.
        asset_ref: String,
    },
    #[serde(rename_all = "camelCase")]
    Text {
        content: String,
        font_size: f32,
        font_family: String,
        color: Color,
    },
}

impl ElementKind {
    /// Keep a text block's font size within `font_limits`.
    pub fn clamped(self, font_limits: &SizeLimits) -> Self {
        match self {
            ElementKind::Text { content, font_size, font_family, color } => ElementKind::Text {
                content,
                font_size: font_limits.clamp(f64::from(font_size)) as f32,
                font_family,
                color,
            },
            sticker => sticker,
        }
    }
}

/// One placed design element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: Uuid,
    #[serde(flatten)]
    pub kind: ElementKind,
    #[serde(default)]
    pub side: Side,
    #[serde(flatten)]
    pub transform: EditorTransform,
    /// Derived from `transform` and `side`; never edited directly.
    #[serde(default)]
    pub uv: UvRect,
    /// Validator output for the current transform.
    #[serde(default)]
    pub warnings: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Element {
    /// Create an element with a fresh id. The derived fields start empty.
    pub fn new(kind: ElementKind, side: Side, transform: EditorTransform) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            side,
            transform,
            uv: UvRect::default(),
            warnings: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, ElementKind::Text { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_position_and_size() {
        let limits = SizeLimits { min: 10.0, max: 500.0 };
        let t = EditorTransform::new(-5.0, 140.0, 2.0, 9000.0, 370.0).clamped(&limits);
        assert_eq!(t.x, 0.0);
        assert_eq!(t.y, 100.0);
        assert_eq!(t.width, 10.0);
        assert_eq!(t.height, 500.0);
        assert!((t.rotation - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_clamp_negative_rotation_and_nan() {
        let limits = SizeLimits::default();
        let t = EditorTransform::new(f64::NAN, 50.0, 80.0, 80.0, -90.0).clamped(&limits);
        assert_eq!(t.x, 0.0);
        assert_eq!(t.rotation, 270.0);
        let tiny = EditorTransform::new(50.0, 50.0, 80.0, 80.0, -1e-20).clamped(&limits);
        assert!(tiny.rotation < 360.0);
    }

    #[test]
    fn test_font_size_is_clamped() {
        let limits = SizeLimits { min: 4.0, max: 512.0 };
        let text = |font_size: f32| ElementKind::Text {
            content: "Hi".into(),
            font_size,
            font_family: "Arial".into(),
            color: Color::BLACK,
        };
        let size = |kind: ElementKind| match kind {
            ElementKind::Text { font_size, .. } => font_size,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(size(text(40000.0).clamped(&limits)), 512.0);
        assert_eq!(size(text(f32::NAN).clamped(&limits)), 4.0);
        assert_eq!(size(text(48.0).clamped(&limits)), 48.0);

        let sticker = ElementKind::Sticker { sticker_id: None, asset_ref: "/uploads/a.png".into() };
        assert_eq!(sticker.clone().clamped(&limits), sticker);
    }

    #[test]
    fn test_sequential_patches_merge() {
        let t = EditorTransform::new(50.0, 50.0, 100.0, 100.0, 0.0);
        let t = t.merged(&TransformPatch { x: Some(10.0), ..Default::default() });
        let t = t.merged(&TransformPatch { y: Some(20.0), ..Default::default() });
        assert_eq!(t.x, 10.0);
        assert_eq!(t.y, 20.0);
        assert_eq!(t.width, 100.0);
    }

    #[test]
    fn test_element_json_shape() {
        let element = Element::new(
            ElementKind::Sticker { sticker_id: Some("s1".into()), asset_ref: "/uploads/a.png".into() },
            Side::Back,
            EditorTransform::new(50.0, 40.0, 100.0, 80.0, 15.0),
        );
        let value = serde_json::to_value(&element).unwrap();
        assert_eq!(value["type"], "sticker");
        assert_eq!(value["assetRef"], "/uploads/a.png");
        assert_eq!(value["side"], "BACK");
        assert_eq!(value["x"], 50.0);
        assert_eq!(value["rotation"], 15.0);

        let back: Element = serde_json::from_value(value).unwrap();
        assert_eq!(back, element);
    }

    #[test]
    fn test_patch_skips_absent_fields() {
        let patch = TransformPatch { x: Some(10.0), ..Default::default() };
        assert_eq!(serde_json::to_string(&patch).unwrap(), r#"{"x":10.0}"#);
        assert!(!patch.is_empty());
        assert!(TransformPatch::default().is_empty());
    }
}
