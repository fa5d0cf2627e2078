// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project and layer-log serialization.
//!
//! This module handles exporting and importing projects in YAML and JSON
//! formats, and storing the layer log written next to each rendered texture.

use crate::error::Result;
use crate::models::project::Project;
use crate::render::layers::Layer;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Export a project to YAML format.
pub fn export_yaml(project: &Project, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(project)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

/// Export a project to JSON format.
pub fn export_json(project: &Project, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(project)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Import a project from YAML format.
pub fn import_yaml(path: &Path) -> Result<Project> {
    let yaml = std::fs::read_to_string(path)?;
    let project = serde_yaml::from_str(&yaml)?;
    Ok(project)
}

/// Import a project from JSON format.
pub fn import_json(path: &Path) -> Result<Project> {
    let json = std::fs::read_to_string(path)?;
    let project = serde_json::from_str(&json)?;
    Ok(project)
}

/// Import a project, picking the format from the file extension
/// (`.yaml`/`.yml`, anything else is read as JSON).
pub fn import_project(path: &Path) -> Result<Project> {
    match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("yaml") | Some("yml") => import_yaml(path),
        _ => import_json(path),
    }
}

/// On-disk layer log for one rendered texture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerLog {
    pub width: u32,
    pub height: u32,
    pub layers: Vec<Layer>,
}

pub fn export_layers(log: &LayerLog, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(log)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn import_layers(path: &Path) -> Result<LayerLog> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::color::Color;
    use crate::models::element::{EditorTransform, Element, ElementKind, Side};

    fn sample() -> Project {
        let mut project = Project::new("tshirt".into(), "assets/tshirt.glb".into(), Color::rgb(200, 30, 30));
        project.elements.push(Element::new(
            ElementKind::Text {
                content: "Hello".into(),
                font_size: 48.0,
                font_family: "Arial".into(),
                color: Color::BLACK,
            },
            Side::Back,
            EditorTransform::new(30.0, 20.0, 120.0, 40.0, 0.0),
        ));
        project
    }

    #[test]
    fn test_project_survives_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let project = sample();

        let yaml = dir.path().join("design.yaml");
        export_yaml(&project, &yaml).unwrap();
        assert_eq!(import_project(&yaml).unwrap(), project);

        let json = dir.path().join("design.json");
        export_json(&project, &json).unwrap();
        assert_eq!(import_project(&json).unwrap(), project);
    }

    #[test]
    fn test_import_missing_or_malformed() {
        let dir = tempfile::tempdir().unwrap();
        assert!(import_json(&dir.path().join("nope.json")).is_err());
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{\"id\": 5}").unwrap();
        assert!(import_project(&bad).is_err());
    }

    #[test]
    fn test_layer_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.layers.json");
        let log = LayerLog { width: 64, height: 32, layers: vec![Layer::BaseColor { color: Color::WHITE }] };
        export_layers(&log, &path).unwrap();
        assert_eq!(import_layers(&path).unwrap(), log);
    }
}
