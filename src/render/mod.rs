// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Texture rendering: pixel primitives, text, layer logs and compositing.

pub mod compositor;
pub mod layers;
pub mod raster;
pub mod text;
