// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Coordinate mapping between editor, UV and texture pixel space.
//!
//! Editor space is the 2D authoring canvas: position in percent with the
//! origin at the top-left, size in editor pixels. UV space is the
//! normalized [0,1]x[0,1] surface parameterization of the garment mesh.
//! Texture pixel space is absolute pixels on the rendered texture.
//!
//! A [`MappingProfile`] names exactly one [`MappingPolicy`]. Preview
//! (`to_uv`) and export (`to_texture_pixels`) both read the same profile, so
//! the two paths always agree on where an element lands.
//!
//! Every function here is pure: identical inputs give bit-identical outputs.

use crate::models::element::{EditorTransform, Side};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Width and height of a canvas, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }
}

/// How editor percentages relate to the texture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingPolicy {
    /// The whole editor canvas is the printable area; percentages are used
    /// unchanged as texture fractions.
    #[default]
    PassThrough,
    /// Each side owns a sub-rectangle of the UV square and editor
    /// percentages are remapped into it.
    Proportional,
}

/// The part of the UV square reserved for one garment side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SideRegion {
    /// `[min_u, min_v, max_u, max_v]`.
    pub bounds: [f64; 4],
    pub flip_u: bool,
    pub flip_v: bool,
    /// Quarter turns applied to editor coordinates (0..=3). Each turn
    /// rotates content 90 degrees counterclockwise on the texture.
    pub quarter_turns: u8,
    pub offset: [f64; 2],
}

impl Default for SideRegion {
    fn default() -> Self {
        Self {
            bounds: [0.0, 0.0, 1.0, 1.0],
            flip_u: false,
            flip_v: false,
            quarter_turns: 0,
            offset: [0.0, 0.0],
        }
    }
}

impl SideRegion {
    pub fn width(&self) -> f64 {
        self.bounds[2] - self.bounds[0]
    }

    pub fn height(&self) -> f64 {
        self.bounds[3] - self.bounds[1]
    }

    /// Editor fraction (0-1) to UV coordinate inside this region.
    fn forward(&self, mut u: f64, mut v: f64) -> (f64, f64) {
        if self.flip_u {
            u = 1.0 - u;
        }
        if self.flip_v {
            v = 1.0 - v;
        }
        (u, v) = match self.quarter_turns % 4 {
            1 => (v, 1.0 - u),
            2 => (1.0 - u, 1.0 - v),
            3 => (1.0 - v, u),
            _ => (u, v),
        };
        (
            self.bounds[0] + u * self.width() + self.offset[0],
            self.bounds[1] + v * self.height() + self.offset[1],
        )
    }

    /// Inverse of [`SideRegion::forward`].
    fn inverse(&self, u: f64, v: f64) -> (f64, f64) {
        let mut u = (u - self.bounds[0] - self.offset[0]) / self.width();
        let mut v = (v - self.bounds[1] - self.offset[1]) / self.height();
        (u, v) = match self.quarter_turns % 4 {
            1 => (1.0 - v, u),
            2 => (1.0 - u, 1.0 - v),
            3 => (v, 1.0 - u),
            _ => (u, v),
        };
        if self.flip_u {
            u = 1.0 - u;
        }
        if self.flip_v {
            v = 1.0 - v;
        }
        (u, v)
    }

    /// Degrees, clockwise, that the turn adds to an element's rotation.
    fn turn_degrees(&self) -> f64 {
        -f64::from(self.quarter_turns % 4) * 90.0
    }

    /// Scale from editor fractions of an element's own width and height to
    /// units of `target`. An odd number of turns lays the element's width
    /// along the v axis.
    fn span(&self, target: Dimensions) -> (f64, f64) {
        let along_u = self.width() * target.width;
        let along_v = self.height() * target.height;
        if self.quarter_turns % 2 == 1 {
            (along_v, along_u)
        } else {
            (along_u, along_v)
        }
    }
}

/// Inclusive range UV positions are clamped into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafeRange {
    pub min: f64,
    pub max: f64,
}

impl Default for SafeRange {
    fn default() -> Self {
        Self { min: 0.15, max: 0.85 }
    }
}

impl SafeRange {
    pub fn extent(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Per-garment mapping configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingProfile {
    pub policy: MappingPolicy,
    /// Only consulted under [`MappingPolicy::Proportional`]. Sides without
    /// an entry use the full UV square.
    pub regions: BTreeMap<Side, SideRegion>,
    pub safe_range: SafeRange,
}

impl Default for MappingProfile {
    fn default() -> Self {
        Self {
            policy: MappingPolicy::PassThrough,
            regions: BTreeMap::new(),
            safe_range: SafeRange::default(),
        }
    }
}

impl MappingProfile {
    /// The region a side maps into under this profile's policy.
    pub fn region(&self, side: Side) -> SideRegion {
        match self.policy {
            MappingPolicy::PassThrough => SideRegion::default(),
            MappingPolicy::Proportional => self.regions.get(&side).copied().unwrap_or_default(),
        }
    }
}

/// An element's placement in UV space, used for the 3D preview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UvRect {
    #[serde(rename = "uvX")]
    pub u: f64,
    #[serde(rename = "uvY")]
    pub v: f64,
    #[serde(rename = "uvWidth")]
    pub width: f64,
    #[serde(rename = "uvHeight")]
    pub height: f64,
    #[serde(rename = "uvRotationRad")]
    pub rotation: f64,
}

/// Absolute pixel rectangle on the texture. `(x, y)` is the center, not the
/// top-left corner; rasterizers translate by `-width/2, -height/2`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub fn top_left(&self) -> (f64, f64) {
        (self.x - self.width / 2.0, self.y - self.height / 2.0)
    }
}

/// Convert pixel coordinates to normalized coordinates (0.0 to 1.0).
pub fn normalize_coordinates(pixel_x: f64, pixel_y: f64, dims: Dimensions) -> (f64, f64) {
    (pixel_x / dims.width, pixel_y / dims.height)
}

/// Convert normalized coordinates to pixel coordinates.
pub fn denormalize_coordinates(u: f64, v: f64, dims: Dimensions) -> (f64, f64) {
    (u * dims.width, v * dims.height)
}

/// Clamp a UV value into the safe range. Idempotent; NaN maps to `range.min`.
pub fn clamp_uv(value: f64, range: SafeRange) -> f64 {
    // max/min rather than f64::clamp: a misconfigured range must not panic
    value.max(range.min).min(range.max)
}

/// Converts element transforms between spaces for one garment profile and
/// one editor canvas size.
#[derive(Debug, Clone, Copy)]
pub struct Mapper<'a> {
    pub profile: &'a MappingProfile,
    pub editor: Dimensions,
}

impl<'a> Mapper<'a> {
    pub fn new(profile: &'a MappingProfile, editor: Dimensions) -> Self {
        Self { profile, editor }
    }

    /// UV placement for the 3D preview.
    ///
    /// Position is clamped per axis into the safe range so a decal never
    /// wraps onto a neighboring surface patch; size is clamped to the safe
    /// range's extent. Rotation is converted to radians without clamping.
    pub fn to_uv(&self, transform: &EditorTransform, side: Side) -> UvRect {
        let region = self.profile.region(side);
        let safe = self.profile.safe_range;
        let (u, v) = region.forward(transform.x / 100.0, transform.y / 100.0);
        let (span_w, span_h) = region.span(Dimensions::new(1.0, 1.0));
        let width = transform.width / self.editor.width * span_w;
        let height = transform.height / self.editor.height * span_h;

        let rect = UvRect {
            u: clamp_uv(u, safe),
            v: clamp_uv(v, safe),
            width: width.max(0.0).min(safe.extent()),
            height: height.max(0.0).min(safe.extent()),
            rotation: self.texture_rotation(transform, side).to_radians(),
        };
        log::debug!("to_uv {:?} {:?} -> {:?}", side, transform, rect);
        rect
    }

    /// Rotation in degrees (clockwise, in [0, 360)) an element is drawn with
    /// on the texture. The preview uses the same angle in radians.
    pub fn texture_rotation(&self, transform: &EditorTransform, side: Side) -> f64 {
        let degrees = (transform.rotation + self.profile.region(side).turn_degrees()).rem_euclid(360.0);
        if degrees >= 360.0 {
            0.0
        } else {
            degrees
        }
    }

    /// Whether `to_uv` leaves this placement's position unclamped.
    pub fn in_safe_zone(&self, transform: &EditorTransform, side: Side) -> bool {
        let (u, v) = self.profile.region(side).forward(transform.x / 100.0, transform.y / 100.0);
        let safe = self.profile.safe_range;
        safe.contains(u) && safe.contains(v)
    }

    /// Center-anchored pixel rectangle on a texture of size `texture`.
    ///
    /// Width and height scale independently per axis, so a sticker keeps its
    /// aspect ratio only when editor and texture share an aspect ratio.
    pub fn to_texture_pixels(&self, transform: &EditorTransform, side: Side, texture: Dimensions) -> PixelRect {
        let region = self.profile.region(side);
        let (u, v) = region.forward(transform.x / 100.0, transform.y / 100.0);
        let (x, y) = denormalize_coordinates(u, v, texture);
        let (span_w, span_h) = region.span(texture);
        PixelRect {
            x,
            y,
            width: transform.width * (span_w / self.editor.width),
            height: transform.height * (span_h / self.editor.height),
        }
    }

    /// Inverse of [`Mapper::to_texture_pixels`], for verifying exports and
    /// loading designs saved in texture space. `rotation` is in degrees.
    pub fn texture_to_editor(&self, rect: &PixelRect, rotation: f64, side: Side, texture: Dimensions) -> EditorTransform {
        let region = self.profile.region(side);
        let (u, v) = normalize_coordinates(rect.x, rect.y, texture);
        let (u, v) = region.inverse(u, v);
        let (span_w, span_h) = region.span(texture);
        EditorTransform {
            x: u * 100.0,
            y: v * 100.0,
            width: rect.width * self.editor.width / span_w,
            height: rect.height * self.editor.height / span_h,
            rotation: (rotation - region.turn_degrees()).rem_euclid(360.0),
        }
    }

    /// Pixel rectangle (center-anchored) a side occupies on the texture.
    pub fn side_region_pixels(&self, side: Side, texture: Dimensions) -> PixelRect {
        let region = self.profile.region(side);
        PixelRect {
            x: (region.bounds[0] + region.width() / 2.0) * texture.width,
            y: (region.bounds[1] + region.height() / 2.0) * texture.height,
            width: region.width() * texture.width,
            height: region.height() * texture.height,
        }
    }
}

/// Check a profile for regions that cannot map cleanly onto `texture`.
pub fn validate_profile(profile: &MappingProfile, texture: Dimensions) -> Vec<String> {
    let mut issues = Vec::new();
    let safe = profile.safe_range;
    if !(0.0..=1.0).contains(&safe.min) || !(0.0..=1.0).contains(&safe.max) || safe.min >= safe.max {
        issues.push(format!("safe range [{}, {}] is not an ordered sub-range of [0, 1]", safe.min, safe.max));
    }

    if profile.policy == MappingPolicy::PassThrough {
        return issues;
    }

    for (side, region) in &profile.regions {
        let [min_u, min_v, max_u, max_v] = region.bounds;
        if min_u < 0.0 || min_v < 0.0 || max_u > 1.0 || max_v > 1.0 || min_u >= max_u || min_v >= max_v {
            issues.push(format!("{:?}: UV bounds {:?} are not a sub-rectangle of [0, 1]", side, region.bounds));
            continue;
        }
        let region_aspect = (region.width() * texture.width) / (region.height() * texture.height);
        if (region_aspect - texture.aspect()).abs() > 0.1 {
            issues.push(format!("{:?}: UV aspect ratio doesn't match texture aspect ratio", side));
        }
    }
    issues
}
