// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error types for the customizer.
//!
//! Placement warnings are not errors and never appear here; they are
//! returned as data by [`crate::util::validation`].

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using [`CustomizerError`].
pub type Result<T> = std::result::Result<T, CustomizerError>;

/// Errors that can occur while editing or rendering a project.
#[derive(Error, Debug)]
pub enum CustomizerError {
    /// The referenced project has no live state.
    #[error("project {0} not found")]
    ProjectNotFound(Uuid),

    /// The referenced element does not exist in the project.
    #[error("element {element} not found in project {project}")]
    ElementNotFound {
        /// The project that was searched.
        project: Uuid,
        /// The missing element id.
        element: Uuid,
    },

    /// No garment model asset is registered for the requested type.
    #[error("model type '{0}' not found")]
    ModelNotFound(String),

    /// An upload failed the type or size filter.
    #[error("invalid asset: {0}")]
    InvalidAsset(String),

    /// A layer asset (image or font) could not be loaded at compositing time.
    #[error("failed to load asset {asset}: {reason}")]
    AssetLoad {
        /// The asset reference.
        asset: String,
        /// Why loading failed.
        reason: String,
    },

    /// A color string could not be parsed.
    #[error("invalid color '{0}'")]
    InvalidColor(String),

    /// A request body or parameter was malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A render job was cancelled before it finished.
    #[error("render cancelled")]
    RenderCancelled,

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or encoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML (de)serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CustomizerError {
    /// HTTP status code this error is surfaced as.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ProjectNotFound(_) | Self::ElementNotFound { .. } => 404,
            Self::ModelNotFound(_)
            | Self::InvalidAsset(_)
            | Self::InvalidColor(_)
            | Self::InvalidRequest(_) => 400,
            Self::RenderCancelled => 409,
            Self::AssetLoad { .. }
            | Self::Io(_)
            | Self::Image(_)
            | Self::Json(_)
            | Self::Yaml(_) => 500,
        }
    }
}
