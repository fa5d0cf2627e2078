// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Text layer rasterization.
//!
//! Text is anchored at its top-left corner, unlike stickers which are
//! center-anchored. Lines split on `'\n'` and stack by the font's line
//! height.

use super::raster::blend_pixel_at;
use ab_glyph::{point, Font, FontArc, GlyphId, ScaleFont};
use image::{Rgba, RgbaImage};

/// Shadow drawn under text: color, offset in pixels.
const SHADOW_COLOR: Rgba<u8> = Rgba([0, 0, 0, 77]);
const SHADOW_OFFSET: i64 = 1;

/// Text whose ink box exceeds the canvas by this factor on either axis is
/// not drawn.
const MAX_EXTENT_FACTOR: usize = 2;

/// Lay out `text` with its top-left corner at the origin. Returns
/// positioned glyphs as `(id, x, baseline_y)`.
pub fn layout_text(font: &FontArc, text: &str, font_size: f32) -> Vec<(GlyphId, f32, f32)> {
    let scaled = font.as_scaled(font_size);
    let ascent = scaled.ascent();
    let line_height = scaled.height() + scaled.line_gap();

    let mut glyphs = Vec::new();
    for (line_idx, line) in text.split('\n').enumerate() {
        let baseline = ascent + line_idx as f32 * line_height;
        let mut cursor_x = 0.0f32;
        let mut last_glyph: Option<GlyphId> = None;
        for ch in line.chars() {
            let glyph_id = font.glyph_id(ch);
            if let Some(prev) = last_glyph {
                cursor_x += scaled.kern(prev, glyph_id);
            }
            glyphs.push((glyph_id, cursor_x, baseline));
            cursor_x += scaled.h_advance(glyph_id);
            last_glyph = Some(glyph_id);
        }
    }
    glyphs
}

/// Per-pixel coverage of a laid-out string, relative to the layout origin.
struct Coverage {
    min_x: i64,
    min_y: i64,
    width: usize,
    height: usize,
    values: Vec<f32>,
}

fn rasterize_coverage(font: &FontArc, text: &str, font_size: f32, max_width: usize, max_height: usize) -> Option<Coverage> {
    let outlined: Vec<_> = layout_text(font, text, font_size)
        .into_iter()
        .filter_map(|(id, x, y)| font.outline_glyph(id.with_scale_and_position(font_size, point(x, y))))
        .collect();
    if outlined.is_empty() {
        return None;
    }

    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;
    for glyph in &outlined {
        let b = glyph.px_bounds();
        min_x = min_x.min(b.min.x);
        min_y = min_y.min(b.min.y);
        max_x = max_x.max(b.max.x);
        max_y = max_y.max(b.max.y);
    }

    let min_x = min_x.floor() as i64;
    let min_y = min_y.floor() as i64;
    let width = (max_x.ceil() as i64 - min_x).max(0) as usize;
    let height = (max_y.ceil() as i64 - min_y).max(0) as usize;
    if width == 0 || height == 0 {
        return None;
    }
    if width > max_width || height > max_height {
        log::warn!(
            "Text at size {} needs {}x{} px, more than the {}x{} limit; not drawn",
            font_size,
            width,
            height,
            max_width,
            max_height
        );
        return None;
    }

    // Max-combine so overlapping glyphs don't double-darken
    let mut values = vec![0.0f32; width * height];
    for glyph in &outlined {
        let b = glyph.px_bounds();
        let gx0 = b.min.x as i64 - min_x;
        let gy0 = b.min.y as i64 - min_y;
        glyph.draw(|px, py, cov| {
            let x = gx0 + px as i64;
            let y = gy0 + py as i64;
            if x >= 0 && y >= 0 && (x as usize) < width && (y as usize) < height {
                let idx = y as usize * width + x as usize;
                values[idx] = values[idx].max(cov);
            }
        });
    }

    Some(Coverage { min_x, min_y, width, height, values })
}

fn paint_coverage(canvas: &mut RgbaImage, coverage: &Coverage, origin_x: i64, origin_y: i64, color: Rgba<u8>) {
    for row in 0..coverage.height {
        for col in 0..coverage.width {
            let cov = coverage.values[row * coverage.width + col];
            if cov <= 0.001 {
                continue;
            }
            blend_pixel_at(
                canvas,
                origin_x + coverage.min_x + col as i64,
                origin_y + coverage.min_y + row as i64,
                color,
                cov,
            );
        }
    }
}

/// Draw `text` with its top-left corner at `(x, y)`. Returns false when
/// nothing was drawn: no visible glyphs, or text far larger than the canvas.
pub fn draw_text(
    canvas: &mut RgbaImage,
    font: &FontArc,
    text: &str,
    font_size: f32,
    x: f64,
    y: f64,
    color: Rgba<u8>,
    shadow: bool,
) -> bool {
    if font_size <= 0.0 || !font_size.is_finite() {
        return false;
    }
    let max_width = canvas.width() as usize * MAX_EXTENT_FACTOR;
    let max_height = canvas.height() as usize * MAX_EXTENT_FACTOR;
    let Some(coverage) = rasterize_coverage(font, text, font_size, max_width, max_height) else {
        return false;
    };

    let origin_x = x.round() as i64;
    let origin_y = y.round() as i64;
    if shadow {
        paint_coverage(canvas, &coverage, origin_x + SHADOW_OFFSET, origin_y + SHADOW_OFFSET, SHADOW_COLOR);
    }
    paint_coverage(canvas, &coverage, origin_x, origin_y, color);
    true
}
