// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Network front ends: the HTTP/JSON API and the real-time channel.

pub mod http;
pub mod realtime;
