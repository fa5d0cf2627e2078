// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project and design element data model.

pub mod color;
pub mod element;
pub mod project;
