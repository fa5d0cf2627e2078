// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Stickerwear - garment customizer backend.
//!
//! Maps stickers and text placed on a 2D editor canvas onto garment UV
//! space, checks them against print-safe zones, keeps live projects in sync
//! between collaborators and rasterizes the final texture.

pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod render;
pub mod scene;
pub mod server;
pub mod session;
pub mod util;

pub use error::{CustomizerError, Result};
