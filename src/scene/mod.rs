// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! 3D preview support: decal anchors and camera control.

pub mod camera;
pub mod placement;

use crate::models::element::Element;
use camera::{CameraHandle, CameraView};
use placement::{DecalPlacement, PlacementAdapter};

/// A garment preview: where decals go and which way the camera looks.
pub struct Preview {
    adapter: PlacementAdapter,
    camera: CameraHandle,
}

impl Preview {
    pub fn new(adapter: PlacementAdapter, camera: CameraHandle) -> Self {
        Self { adapter, camera }
    }

    /// Decal anchor for an element, from its derived UV rect.
    pub fn place(&self, element: &Element) -> DecalPlacement {
        self.adapter.place(&element.uv, element.side)
    }

    /// Turn the camera to face the side an element is on.
    pub fn focus(&self, element: &Element) {
        match self.camera.lock() {
            Ok(mut camera) => camera.snap_to(CameraView::from(element.side)),
            Err(_) => log::warn!("Camera lock poisoned; focus ignored"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::element::{EditorTransform, ElementKind, Side};
    use crate::util::geometry::{Dimensions, Mapper, MappingProfile};
    use camera::OrbitRig;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_preview_uses_derived_uv() {
        let profile = MappingProfile::default();
        let mapper = Mapper::new(&profile, Dimensions::new(400.0, 500.0));
        let mut element = Element::new(
            ElementKind::Sticker { sticker_id: None, asset_ref: "/uploads/a.png".into() },
            Side::Back,
            EditorTransform::new(50.0, 50.0, 100.0, 100.0, 0.0),
        );
        element.uv = mapper.to_uv(&element.transform, element.side);

        let rig = Arc::new(Mutex::new(OrbitRig::default()));
        let preview = Preview::new(PlacementAdapter::default(), rig.clone());
        let placement = preview.place(&element);
        assert!(placement.position[2] < 0.0);
        assert!((placement.scale[0] - 0.25 * 1.2).abs() < 1e-12);

        preview.focus(&element);
        assert_eq!(rig.lock().unwrap().azimuth, std::f32::consts::PI);
    }
}
