// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations for assets, uploads and project files.

pub mod assets;
pub mod serialization;
pub mod upload;
