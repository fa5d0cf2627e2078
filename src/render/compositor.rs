// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Texture compositing.
//!
//! Compositing runs in two steps. [`Compositor::plan`] turns a project into
//! a layer log using the garment's mapping profile, and
//! [`Compositor::execute`] draws a layer log onto a fresh canvas. Replaying
//! a stored log is just `execute` again.
//!
//! Sticker images are loaded in parallel before drawing starts; drawing
//! itself is sequential in log order, so load timing never affects the
//! result. A layer whose asset fails to load is logged and skipped.

use super::layers::Layer;
use super::raster::{draw_image, fill, tile_image};
use super::text::draw_text;
use crate::error::{CustomizerError, Result};
use crate::io::assets::{AssetSource, FontSource};
use crate::models::element::ElementKind;
use crate::models::project::Project;
use crate::util::geometry::{Dimensions, Mapper, PixelRect};
use ab_glyph::FontArc;
use image::RgbaImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorOptions {
    /// Draw a faint drop shadow under text.
    pub text_shadow: bool,
}

impl Default for CompositorOptions {
    fn default() -> Self {
        Self { text_shadow: true }
    }
}

/// A finished texture and the layers that produced it.
#[derive(Debug, Clone)]
pub struct Composite {
    pub image: RgbaImage,
    /// Only layers that were actually drawn.
    pub layers: Vec<Layer>,
}

/// Draws layer logs using shared asset and font sources.
#[derive(Clone)]
pub struct Compositor {
    assets: Arc<dyn AssetSource>,
    fonts: Arc<dyn FontSource>,
    options: CompositorOptions,
}

impl Compositor {
    pub fn new(assets: Arc<dyn AssetSource>, fonts: Arc<dyn FontSource>, options: CompositorOptions) -> Self {
        Self { assets, fonts, options }
    }

    /// Translate a project into texture-space layers, in paint order.
    pub fn plan(project: &Project, mapper: &Mapper<'_>, texture: Dimensions) -> Vec<Layer> {
        let mut layers = Vec::with_capacity(project.elements.len() + 2);
        layers.push(Layer::BaseColor { color: project.base_color });
        if let Some(pattern) = &project.pattern {
            layers.push(Layer::Pattern { asset: pattern.asset_ref.clone(), opacity: pattern.opacity });
        }

        for element in &project.elements {
            match &element.kind {
                ElementKind::Sticker { asset_ref, .. } => {
                    let rect = mapper.to_texture_pixels(&element.transform, element.side, texture);
                    layers.push(Layer::Sticker {
                        asset: asset_ref.clone(),
                        x: rect.x,
                        y: rect.y,
                        width: rect.width,
                        height: rect.height,
                        rotation: mapper.texture_rotation(&element.transform, element.side),
                    });
                }
                ElementKind::Text { content, font_size, font_family, color } => {
                    let rect = mapper.to_texture_pixels(&element.transform, element.side, texture);
                    let scale = (texture.width / mapper.editor.width) as f32;
                    layers.push(Layer::Text {
                        text: content.clone(),
                        x: rect.x,
                        y: rect.y,
                        font_size: font_size * scale,
                        font_family: font_family.clone(),
                        color: *color,
                    });
                }
            }
        }
        layers
    }

    /// Plan and draw a project.
    pub fn compose(&self, project: &Project, mapper: &Mapper<'_>, width: u32, height: u32) -> Result<Composite> {
        self.compose_cancellable(project, mapper, width, height, &AtomicBool::new(false))
    }

    /// Like [`Compositor::compose`], checking `cancel` between layers.
    pub fn compose_cancellable(
        &self,
        project: &Project,
        mapper: &Mapper<'_>,
        width: u32,
        height: u32,
        cancel: &AtomicBool,
    ) -> Result<Composite> {
        let layers = Self::plan(project, mapper, Dimensions::new(width as f64, height as f64));
        self.execute_cancellable(&layers, width, height, cancel)
    }

    /// Reproduce a texture from a stored layer log.
    pub fn recreate_from_layers(&self, layers: &[Layer], width: u32, height: u32) -> Result<Composite> {
        self.execute(layers, width, height)
    }

    pub fn execute(&self, layers: &[Layer], width: u32, height: u32) -> Result<Composite> {
        self.execute_cancellable(layers, width, height, &AtomicBool::new(false))
    }

    pub fn execute_cancellable(
        &self,
        layers: &[Layer],
        width: u32,
        height: u32,
        cancel: &AtomicBool,
    ) -> Result<Composite> {
        if width == 0 || height == 0 {
            return Err(CustomizerError::InvalidRequest(format!("texture size {}x{} is empty", width, height)));
        }

        let images = self.preload_images(layers);
        let mut fonts: HashMap<&str, Option<FontArc>> = HashMap::new();
        let mut canvas = RgbaImage::new(width, height);
        let mut drawn = Vec::with_capacity(layers.len());

        for (index, layer) in layers.iter().enumerate() {
            if cancel.load(Ordering::Relaxed) {
                log::info!("Render cancelled after {} of {} layers", index, layers.len());
                return Err(CustomizerError::RenderCancelled);
            }

            match layer {
                Layer::BaseColor { color } => fill(&mut canvas, color.to_rgba()),
                Layer::Pattern { asset, opacity } => {
                    let Some(src) = loaded(&images, index) else {
                        continue;
                    };
                    log::debug!("Tiling pattern {} at opacity {}", asset, opacity);
                    tile_image(&mut canvas, src, opacity.clamp(0.0, 1.0));
                }
                Layer::Sticker { asset, x, y, width, height, rotation } => {
                    let Some(src) = loaded(&images, index) else {
                        continue;
                    };
                    let rect = PixelRect { x: *x, y: *y, width: *width, height: *height };
                    log::debug!("Drawing sticker {} at {:?}", asset, rect);
                    draw_image(&mut canvas, src, &rect, *rotation, 1.0);
                }
                Layer::Text { text, x, y, font_size, font_family, color } => {
                    let font = fonts.entry(font_family.as_str()).or_insert_with(|| {
                        self.fonts
                            .load_font(font_family)
                            .map_err(|e| log::warn!("Skipping text layers in font {}: {}", font_family, e))
                            .ok()
                    });
                    let Some(font) = font else {
                        continue;
                    };
                    let shadow = self.options.text_shadow;
                    if !draw_text(&mut canvas, font, text, *font_size, *x, *y, color.to_rgba(), shadow) {
                        continue;
                    }
                }
            }
            drawn.push(layer.clone());
        }

        Ok(Composite { image: canvas, layers: drawn })
    }

    /// Decode every image asset concurrently. The result is indexed like
    /// `layers`; non-sticker entries hold an unused error.
    fn preload_images(&self, layers: &[Layer]) -> Vec<Result<RgbaImage>> {
        layers
            .par_iter()
            .map(|layer| match layer.asset() {
                Some(asset) => self.assets.load_image(asset),
                None => Err(CustomizerError::InvalidRequest(format!("{} layer has no image", layer.kind()))),
            })
            .collect()
    }
}

/// The preloaded image for layer `index`, logging why it is missing.
fn loaded(images: &[Result<RgbaImage>], index: usize) -> Option<&RgbaImage> {
    match images.get(index)? {
        Ok(image) => Some(image),
        Err(e) => {
            log::warn!("Skipping layer {}: {}", index, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::color::Color;
    use crate::models::element::{EditorTransform, Element, Side};
    use crate::models::project::FabricPattern;
    use crate::render::text::tests::fixture_font;
    use crate::util::geometry::{MappingPolicy, MappingProfile, SideRegion};
    use image::Rgba;
    use std::collections::BTreeMap;
    use std::time::{Duration, Instant};

    /// Solid-color stickers named `"r,g,b"`. Earlier names load slower so
    /// later assets resolve first.
    struct SolidAssets;

    impl AssetSource for SolidAssets {
        fn load_image(&self, asset: &str) -> Result<RgbaImage> {
            if asset == "broken" {
                return Err(CustomizerError::AssetLoad { asset: asset.into(), reason: "missing".into() });
            }
            let parts: Vec<u8> = asset.split(',').filter_map(|p| p.parse().ok()).collect();
            let &[r, g, b] = parts.as_slice() else {
                return Err(CustomizerError::AssetLoad { asset: asset.into(), reason: "bad name".into() });
            };
            std::thread::sleep(Duration::from_millis(u64::from(r) / 10));
            Ok(RgbaImage::from_pixel(4, 4, Rgba([r, g, b, 255])))
        }
    }

    struct NoFonts;

    impl FontSource for NoFonts {
        fn load_font(&self, family: &str) -> Result<FontArc> {
            Err(CustomizerError::AssetLoad { asset: family.into(), reason: "no fonts".into() })
        }
    }

    struct FixtureFont;

    impl FontSource for FixtureFont {
        fn load_font(&self, _family: &str) -> Result<FontArc> {
            Ok(fixture_font())
        }
    }

    fn compositor() -> Compositor {
        Compositor::new(Arc::new(SolidAssets), Arc::new(NoFonts), CompositorOptions::default())
    }

    fn sticker(asset: &str, x: f64, y: f64) -> Element {
        Element::new(
            ElementKind::Sticker { sticker_id: None, asset_ref: asset.into() },
            Side::Front,
            EditorTransform::new(x, y, 100.0, 100.0, 0.0),
        )
    }

    fn project(elements: Vec<Element>) -> Project {
        let mut project = Project::new("tshirt".into(), "tshirt.glb".into(), Color::rgb(10, 20, 30));
        project.elements = elements;
        project
    }

    fn editor() -> Dimensions {
        Dimensions::new(400.0, 500.0)
    }

    #[test]
    fn test_paint_order_follows_elements() {
        // Same position: the last element must end up on top even though
        // the first asset takes longest to load.
        let profile = MappingProfile::default();
        let mapper = Mapper::new(&profile, editor());
        let p = project(vec![sticker("250,0,0", 50.0, 50.0), sticker("0,250,0", 50.0, 50.0), sticker("0,0,250", 50.0, 50.0)]);

        let out = compositor().compose(&p, &mapper, 200, 200).unwrap();
        assert_eq!(*out.image.get_pixel(100, 100), Rgba([0, 0, 250, 255]));
        assert_eq!(*out.image.get_pixel(0, 0), Rgba([10, 20, 30, 255]));
        assert_eq!(out.layers.len(), 4);
    }

    #[test]
    fn test_broken_asset_is_skipped() {
        let profile = MappingProfile::default();
        let mapper = Mapper::new(&profile, editor());
        let p = project(vec![sticker("200,0,0", 20.0, 20.0), sticker("broken", 50.0, 50.0), sticker("0,0,200", 80.0, 80.0)]);

        let out = compositor().compose(&p, &mapper, 200, 200).unwrap();
        assert_eq!(*out.image.get_pixel(40, 40), Rgba([200, 0, 0, 255]));
        assert_eq!(*out.image.get_pixel(160, 160), Rgba([0, 0, 200, 255]));
        assert_eq!(*out.image.get_pixel(100, 100), Rgba([10, 20, 30, 255]));
        assert_eq!(out.layers.len(), 3);
        assert!(out.layers.iter().all(|l| l.asset() != Some("broken")));
    }

    #[test]
    fn test_missing_font_skips_text_only() {
        let profile = MappingProfile::default();
        let mapper = Mapper::new(&profile, editor());
        let text = Element::new(
            ElementKind::Text {
                content: "Hi".into(),
                font_size: 24.0,
                font_family: "Arial".into(),
                color: Color::BLACK,
            },
            Side::Front,
            EditorTransform::new(10.0, 10.0, 100.0, 30.0, 0.0),
        );
        let p = project(vec![text, sticker("0,200,0", 50.0, 50.0)]);

        let out = compositor().compose(&p, &mapper, 100, 100).unwrap();
        assert_eq!(out.layers.len(), 2);
        assert_eq!(*out.image.get_pixel(50, 50), Rgba([0, 200, 0, 255]));
    }

    #[test]
    fn test_text_layer_is_top_left_and_scaled() {
        let profile = MappingProfile::default();
        let mapper = Mapper::new(&profile, editor());
        let text = Element::new(
            ElementKind::Text {
                content: "Hi".into(),
                font_size: 20.0,
                font_family: "Arial".into(),
                color: Color::BLACK,
            },
            Side::Front,
            EditorTransform::new(25.0, 10.0, 100.0, 30.0, 45.0),
        );
        let layers = Compositor::plan(&project(vec![text]), &mapper, Dimensions::new(800.0, 1000.0));
        match &layers[1] {
            Layer::Text { x, y, font_size, .. } => {
                assert_eq!((*x, *y), (200.0, 100.0));
                assert_eq!(*font_size, 40.0);
            }
            other => panic!("expected text layer, got {:?}", other),
        }
    }

    #[test]
    fn test_replay_and_repeat_are_identical() {
        let profile = MappingProfile::default();
        let mapper = Mapper::new(&profile, editor());
        let mut rotated = sticker("90,120,200", 40.0, 60.0);
        rotated.transform.rotation = 33.0;
        let p = project(vec![sticker("200,10,10", 30.0, 30.0), rotated]);
        let c = compositor();

        let first = c.compose(&p, &mapper, 128, 128).unwrap();
        let second = c.compose(&p, &mapper, 128, 128).unwrap();
        let replay = c.recreate_from_layers(&first.layers, 128, 128).unwrap();
        assert_eq!(first.image.as_raw(), second.image.as_raw());
        assert_eq!(first.image.as_raw(), replay.image.as_raw());
    }

    #[test]
    fn test_cancel_and_empty_size() {
        let profile = MappingProfile::default();
        let mapper = Mapper::new(&profile, editor());
        let p = project(vec![sticker("1,2,3", 50.0, 50.0)]);
        let cancel = AtomicBool::new(true);
        assert!(matches!(
            compositor().compose_cancellable(&p, &mapper, 64, 64, &cancel),
            Err(CustomizerError::RenderCancelled)
        ));
        assert!(matches!(compositor().compose(&p, &mapper, 0, 64), Err(CustomizerError::InvalidRequest(_))));
    }

    #[test]
    fn test_pattern_sits_between_base_and_stickers() {
        let profile = MappingProfile::default();
        let mapper = Mapper::new(&profile, editor());
        let mut p = project(vec![sticker("200,0,0", 50.0, 50.0)]);
        p.pattern = Some(FabricPattern { asset_ref: "0,0,250".into(), opacity: 1.0 });
        let c = compositor();

        let out = c.compose(&p, &mapper, 100, 100).unwrap();
        assert_eq!(out.layers[1].kind(), "pattern");
        assert_eq!(*out.image.get_pixel(2, 2), Rgba([0, 0, 250, 255]));
        assert_eq!(*out.image.get_pixel(50, 50), Rgba([200, 0, 0, 255]));

        let replay = c.recreate_from_layers(&out.layers, 100, 100).unwrap();
        assert_eq!(out.image.as_raw(), replay.image.as_raw());

        p.pattern = Some(FabricPattern { asset_ref: "broken".into(), opacity: 1.0 });
        let out = c.compose(&p, &mapper, 100, 100).unwrap();
        assert_eq!(*out.image.get_pixel(2, 2), Rgba([10, 20, 30, 255]));
        assert!(out.layers.iter().all(|l| l.kind() != "pattern"));
    }

    #[test]
    fn test_quarter_turned_region_rotates_export_like_preview() {
        let mut regions = BTreeMap::new();
        regions.insert(Side::Back, SideRegion { bounds: [0.5, 0.0, 1.0, 1.0], quarter_turns: 1, ..Default::default() });
        let profile = MappingProfile { policy: MappingPolicy::Proportional, regions, ..Default::default() };
        let mapper = Mapper::new(&profile, editor());

        let mut back = sticker("1,2,3", 50.0, 50.0);
        back.side = Side::Back;
        back.transform.width = 200.0;
        back.transform.height = 50.0;
        let preview = mapper.to_uv(&back.transform, Side::Back);

        let layers = Compositor::plan(&project(vec![back]), &mapper, Dimensions::new(2048.0, 2048.0));
        match &layers[1] {
            Layer::Sticker { rotation, width, height, .. } => {
                assert!((rotation.to_radians() - preview.rotation).abs() < 1e-12);
                assert!(width > height);
            }
            other => panic!("expected sticker layer, got {:?}", other),
        }
    }

    #[test]
    fn test_oversized_text_is_skipped_quickly() {
        let profile = MappingProfile::default();
        let mapper = Mapper::new(&profile, editor());
        let huge = Element::new(
            ElementKind::Text {
                content: "WWWW".into(),
                font_size: 40000.0,
                font_family: "Mono".into(),
                color: Color::BLACK,
            },
            Side::Front,
            EditorTransform::new(10.0, 10.0, 100.0, 30.0, 0.0),
        );
        let c = Compositor::new(Arc::new(SolidAssets), Arc::new(FixtureFont), CompositorOptions::default());

        let started = Instant::now();
        let out = c.compose(&project(vec![huge]), &mapper, 2048, 2048).unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(out.layers.len(), 1);
        assert_eq!(*out.image.get_pixel(1024, 1024), Rgba([10, 20, 30, 255]));
    }
}
