// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Preview camera control.
//!
//! Views that need to move the camera receive a [`CameraHandle`] rather
//! than reaching for shared global state.

use crate::models::element::Side;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};
use std::sync::{Arc, Mutex};

/// Named viewpoints around the garment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraView {
    Front,
    Back,
    Left,
    Right,
    Top,
}

impl From<Side> for CameraView {
    fn from(side: Side) -> Self {
        match side {
            Side::Front => CameraView::Front,
            Side::Back => CameraView::Back,
            Side::Left => CameraView::Left,
            Side::Right => CameraView::Right,
        }
    }
}

pub trait CameraController: Send {
    fn snap_to(&mut self, view: CameraView);
    fn reset(&mut self);
    /// Zoom by `delta` steps; positive zooms in.
    fn set_zoom(&mut self, delta: f32);
}

pub type CameraHandle = Arc<Mutex<dyn CameraController>>;

/// Orbit camera that rotates around a target point.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitRig {
    pub target: [f32; 3],
    pub distance: f32,
    /// Horizontal angle (radians).
    pub azimuth: f32,
    /// Vertical angle (radians), clamped to avoid flipping.
    pub elevation: f32,
    home_distance: f32,
    min_distance: f32,
    max_distance: f32,
}

const ZOOM_STEP: f32 = 0.9;
const HOME_ELEVATION: f32 = 0.15;

impl Default for OrbitRig {
    fn default() -> Self {
        Self::new([0.0, 0.0, 0.0], 3.0)
    }
}

impl OrbitRig {
    pub fn new(target: [f32; 3], distance: f32) -> Self {
        Self {
            target,
            distance,
            azimuth: 0.0,
            elevation: HOME_ELEVATION,
            home_distance: distance,
            min_distance: distance * 0.25,
            max_distance: distance * 3.0,
        }
    }

    pub fn handle(self) -> CameraHandle {
        Arc::new(Mutex::new(self))
    }

    /// Camera position in world space.
    pub fn eye_position(&self) -> [f32; 3] {
        let (sin_elev, cos_elev) = self.elevation.sin_cos();
        let (sin_azim, cos_azim) = self.azimuth.sin_cos();
        [
            self.target[0] + self.distance * cos_elev * sin_azim,
            self.target[1] + self.distance * sin_elev,
            self.target[2] + self.distance * cos_elev * cos_azim,
        ]
    }

    /// Rotate by the given deltas (radians).
    pub fn rotate(&mut self, delta_azimuth: f32, delta_elevation: f32) {
        self.azimuth += delta_azimuth;
        let limit = FRAC_PI_2 - 0.01;
        self.elevation = (self.elevation + delta_elevation).clamp(-limit, limit);
    }
}

impl CameraController for OrbitRig {
    fn snap_to(&mut self, view: CameraView) {
        let (azimuth, elevation) = match view {
            CameraView::Front => (0.0, HOME_ELEVATION),
            CameraView::Back => (PI, HOME_ELEVATION),
            CameraView::Left => (-FRAC_PI_2, HOME_ELEVATION),
            CameraView::Right => (FRAC_PI_2, HOME_ELEVATION),
            CameraView::Top => (0.0, FRAC_PI_2 - 0.01),
        };
        self.azimuth = azimuth;
        self.elevation = elevation;
    }

    fn reset(&mut self) {
        self.snap_to(CameraView::Front);
        self.distance = self.home_distance;
    }

    fn set_zoom(&mut self, delta: f32) {
        self.distance = (self.distance * ZOOM_STEP.powf(delta)).clamp(self.min_distance, self.max_distance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_to_back_looks_from_negative_z() {
        let mut rig = OrbitRig::default();
        rig.snap_to(CameraView::Back);
        let eye = rig.eye_position();
        assert!(eye[2] < 0.0);
        assert!(eye[0].abs() < 1e-5);
    }

    #[test]
    fn test_zoom_is_clamped_and_reset_restores() {
        let mut rig = OrbitRig::new([0.0, 1.0, 0.0], 4.0);
        rig.set_zoom(1.0);
        assert!(rig.distance < 4.0);
        rig.set_zoom(100.0);
        assert_eq!(rig.distance, 1.0);
        rig.set_zoom(-100.0);
        assert_eq!(rig.distance, 12.0);

        rig.rotate(1.0, 5.0);
        rig.reset();
        assert_eq!(rig.distance, 4.0);
        assert_eq!(rig.azimuth, 0.0);
        assert_eq!(rig.elevation, HOME_ELEVATION);
    }

    #[test]
    fn test_handle_drives_shared_rig() {
        let rig = Arc::new(Mutex::new(OrbitRig::default()));
        let handle: CameraHandle = rig.clone();
        handle.lock().unwrap().snap_to(CameraView::from(Side::Right));
        assert_eq!(rig.lock().unwrap().azimuth, FRAC_PI_2);
        handle.lock().unwrap().reset();
        assert_eq!(rig.lock().unwrap().azimuth, 0.0);
    }
}
