// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Decal placement on the garment mesh.
//!
//! Positions come from the mapper's [`UvRect`] only; the editor transform is
//! never consulted here, so the 3D preview and the exported texture are
//! driven by the same numbers.

use crate::models::element::Side;
use crate::util::geometry::UvRect;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::{FRAC_PI_2, PI};

/// Axis-aligned bounds of a mesh in its local space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self { min: [-0.5, -0.5, -0.5], max: [0.5, 0.5, 0.5] }
    }
}

impl BoundingBox {
    pub fn size(&self) -> [f64; 3] {
        [self.max[0] - self.min[0], self.max[1] - self.min[1], self.max[2] - self.min[2]]
    }

    pub fn center(&self) -> [f64; 3] {
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
            (self.min[2] + self.max[2]) / 2.0,
        ]
    }
}

/// Horizontal axis a side faces along. The vertical in-plane axis is
/// always Y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalAxis {
    X,
    Z,
}

/// Per-side calibration against a specific mesh's layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SideCalibration {
    pub normal_axis: NormalAxis,
    /// +1 pushes the decal out along the positive axis, -1 along the negative.
    pub normal_sign: f64,
    /// Mirror the horizontal in-plane axis (seen from behind).
    pub mirror_u: bool,
    /// Extra turn about Y so the decal faces outward, radians.
    pub rotation_offset: f64,
    /// Gap between decal and surface.
    pub epsilon: f64,
    /// Scene units per whole UV fraction of size.
    pub units_per_uv: f64,
}

impl Default for SideCalibration {
    fn default() -> Self {
        Self::for_side(Side::Front)
    }
}

impl SideCalibration {
    /// Default calibration for a garment modelled facing +Z.
    pub fn for_side(side: Side) -> Self {
        let (normal_axis, normal_sign, mirror_u, rotation_offset) = match side {
            Side::Front => (NormalAxis::Z, 1.0, false, 0.0),
            Side::Back => (NormalAxis::Z, -1.0, true, PI),
            Side::Left => (NormalAxis::X, -1.0, false, -FRAC_PI_2),
            Side::Right => (NormalAxis::X, 1.0, true, FRAC_PI_2),
        };
        Self { normal_axis, normal_sign, mirror_u, rotation_offset, epsilon: 0.01, units_per_uv: 1.2 }
    }
}

/// Where to draw one decal in mesh-local space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecalPlacement {
    pub position: [f64; 3],
    pub scale: [f64; 3],
    /// Euler angles (x, y, z) in radians.
    pub rotation: [f64; 3],
}

/// Computes decal anchors for one mesh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementAdapter {
    pub bounds: BoundingBox,
    /// Sides without an entry use [`SideCalibration::for_side`].
    pub calibration: BTreeMap<Side, SideCalibration>,
}

impl PlacementAdapter {
    pub fn new(bounds: BoundingBox) -> Self {
        Self { bounds, calibration: BTreeMap::new() }
    }

    pub fn calibration(&self, side: Side) -> SideCalibration {
        self.calibration.get(&side).copied().unwrap_or_else(|| SideCalibration::for_side(side))
    }

    pub fn place(&self, uv: &UvRect, side: Side) -> DecalPlacement {
        let cal = self.calibration(side);
        let size = self.bounds.size();
        let center = self.bounds.center();

        let mirror = if cal.mirror_u { -1.0 } else { 1.0 };
        let y = center[1] + (0.5 - uv.v) * size[1];
        let position = match cal.normal_axis {
            NormalAxis::Z => [
                center[0] + mirror * (uv.u - 0.5) * size[0],
                y,
                center[2] + cal.normal_sign * (size[2] / 2.0 + cal.epsilon),
            ],
            NormalAxis::X => [
                center[0] + cal.normal_sign * (size[0] / 2.0 + cal.epsilon),
                y,
                center[2] + mirror * (uv.u - 0.5) * size[2],
            ],
        };

        DecalPlacement {
            position,
            scale: [uv.width * cal.units_per_uv, uv.height * cal.units_per_uv, 1.0],
            rotation: [0.0, cal.rotation_offset, uv.rotation],
        }
    }
}
