// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Pixel-level drawing primitives for the texture canvas.

use crate::util::geometry::PixelRect;
use image::{Rgba, RgbaImage};

/// Fill the whole canvas with one color.
pub fn fill(canvas: &mut RgbaImage, color: Rgba<u8>) {
    for pixel in canvas.pixels_mut() {
        *pixel = color;
    }
}

/// Source-over blend of `top` onto `base`, with `top`'s alpha scaled by
/// `opacity`.
pub fn blend_over(base: Rgba<u8>, top: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    if top[3] == 0 || opacity <= 0.0 {
        return base;
    }
    if opacity >= 1.0 && top[3] == 255 {
        return top;
    }

    let top_a = (top[3] as f32 / 255.0) * opacity.min(1.0);
    let base_a = base[3] as f32 / 255.0;
    let out_a = top_a + base_a * (1.0 - top_a);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let mut out = [0u8; 4];
    for c in 0..3 {
        let t = top[c] as f32 / 255.0;
        let b = base[c] as f32 / 255.0;
        let v = (t * top_a + b * base_a * (1.0 - top_a)) / out_a;
        out[c] = (v * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba(out)
}

/// Blend one pixel if it lies on the canvas.
pub fn blend_pixel_at(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>, opacity: f32) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    let base = *canvas.get_pixel(x, y);
    canvas.put_pixel(x, y, blend_over(base, color, opacity));
}

/// Bilinear sample with coordinates clamped to the image edge.
fn bilinear_sample(img: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    let max_x = img.width() as i64 - 1;
    let max_y = img.height() as i64 - 1;
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let fx = (x - x0 as f64) as f32;
    let fy = (y - y0 as f64) as f32;

    let sample = |sx: i64, sy: i64| -> [f32; 4] {
        let p = img.get_pixel(sx.clamp(0, max_x) as u32, sy.clamp(0, max_y) as u32);
        [p[0] as f32, p[1] as f32, p[2] as f32, p[3] as f32]
    };

    let tl = sample(x0, y0);
    let tr = sample(x0 + 1, y0);
    let bl = sample(x0, y0 + 1);
    let br = sample(x0 + 1, y0 + 1);

    let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;
    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = lerp(tl[c], tr[c], fx);
        let bot = lerp(bl[c], br[c], fx);
        out[c] = lerp(top, bot, fy).round().clamp(0.0, 255.0) as u8;
    }
    Rgba(out)
}

/// Draw `src` stretched into the center-anchored `rect`, rotated clockwise
/// by `rotation_deg` about the rect's center.
///
/// Each covered destination pixel is mapped back through the inverse
/// rotation into the source image, so the result has no holes.
pub fn draw_image(canvas: &mut RgbaImage, src: &RgbaImage, rect: &PixelRect, rotation_deg: f64, opacity: f32) {
    if src.width() == 0 || src.height() == 0 || rect.width <= 0.0 || rect.height <= 0.0 {
        return;
    }

    let (sin, cos) = rotation_deg.to_radians().sin_cos();
    let half_w = rect.width / 2.0;
    let half_h = rect.height / 2.0;

    // Axis-aligned bounds of the rotated rect
    let extent_x = (half_w * cos).abs() + (half_h * sin).abs();
    let extent_y = (half_w * sin).abs() + (half_h * cos).abs();
    let x_start = ((rect.x - extent_x).floor() as i64).max(0);
    let y_start = ((rect.y - extent_y).floor() as i64).max(0);
    let x_end = ((rect.x + extent_x).ceil() as i64).min(canvas.width() as i64);
    let y_end = ((rect.y + extent_y).ceil() as i64).min(canvas.height() as i64);

    let scale_x = src.width() as f64 / rect.width;
    let scale_y = src.height() as f64 / rect.height;

    for py in y_start..y_end {
        let dy = py as f64 + 0.5 - rect.y;
        for px in x_start..x_end {
            let dx = px as f64 + 0.5 - rect.x;
            let local_x = dx * cos + dy * sin;
            let local_y = -dx * sin + dy * cos;
            if local_x.abs() > half_w || local_y.abs() > half_h {
                continue;
            }

            let sx = (local_x + half_w) * scale_x - 0.5;
            let sy = (local_y + half_h) * scale_y - 0.5;
            let color = bilinear_sample(src, sx, sy);
            blend_pixel_at(canvas, px, py, color, opacity);
        }
    }
}

/// Repeat `src` at its native size from the top-left corner until the
/// canvas is covered.
pub fn tile_image(canvas: &mut RgbaImage, src: &RgbaImage, opacity: f32) {
    if src.width() == 0 || src.height() == 0 || opacity <= 0.0 {
        return;
    }
    let (tile_w, tile_h) = src.dimensions();
    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        let top = *src.get_pixel(x % tile_w, y % tile_h);
        *pixel = blend_over(*pixel, top, opacity);
    }
}
