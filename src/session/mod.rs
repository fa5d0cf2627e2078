// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Live project state.
//!
//! The session owns every active project. Each project sits behind its own
//! mutex, which doubles as that project's mutation queue: a mutation and the
//! broadcast announcing it happen under the same lock, so subscribers see
//! changes in the order they were applied. Renders work on a cloned
//! snapshot and never hold the lock while drawing.

pub mod hub;

use crate::config::{GarmentProfile, Settings};
use crate::error::{CustomizerError, Result};
use crate::io::assets::{AssetResolver, AssetSource, FontSource, FontStore, ModelInfo, ModelLibrary, UploadStore};
use crate::io::serialization::{export_layers, LayerLog};
use crate::models::color::Color;
use crate::models::element::{EditorTransform, Element, ElementKind, Side, TransformPatch};
use crate::models::project::{FabricPattern, Project};
use crate::render::compositor::Compositor;
use crate::scene::placement::DecalPlacement;
use crate::util::geometry::Mapper;
use crate::util::validation::Validator;
use chrono::Utc;
use hub::{ClientId, DesignAction, Hub, ServerEvent};
use image::RgbaImage;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use uuid::Uuid;

/// URL prefix rendered textures are served under.
pub const OUTPUT_URL_PREFIX: &str = "/outputs/";

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// A new element before it has an id or derived fields.
#[derive(Debug, Clone, PartialEq)]
pub struct NewElement {
    pub kind: ElementKind,
    pub side: Side,
    pub transform: EditorTransform,
}

/// A finished render.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub project_id: Uuid,
    pub texture_url: String,
    pub texture_path: PathBuf,
    pub layers_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub image: RgbaImage,
}

/// Handle to a render running on its own thread.
pub struct RenderJob {
    cancel: Arc<AtomicBool>,
    done: Receiver<Result<RenderOutput>>,
}

impl RenderJob {
    /// Ask the job to stop at the next layer boundary.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Block until the job finishes.
    pub fn wait(self) -> Result<RenderOutput> {
        self.done
            .recv()
            .map_err(|_| CustomizerError::InvalidRequest("render worker exited without a result".to_string()))?
    }
}

/// 3D anchor of one element, for the preview.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementPlacement {
    pub element_id: Uuid,
    pub side: Side,
    #[serde(flatten)]
    pub placement: DecalPlacement,
}

/// Authoritative state for all active projects.
///
/// Projects live in memory for the lifetime of the process and are never
/// evicted.
pub struct Session {
    settings: Settings,
    resolver: Arc<dyn AssetResolver>,
    compositor: Compositor,
    validator: Validator,
    hub: Arc<Hub>,
    projects: RwLock<HashMap<Uuid, Arc<Mutex<Project>>>>,
    last_stamp: Mutex<i64>,
}

impl Session {
    pub fn new(
        settings: Settings,
        resolver: Arc<dyn AssetResolver>,
        assets: Arc<dyn AssetSource>,
        fonts: Arc<dyn FontSource>,
    ) -> Self {
        let compositor = Compositor::new(assets, fonts, settings.compositor.clone());
        let validator = Validator::new(settings.validator.clone());
        Self {
            settings,
            resolver,
            compositor,
            validator,
            hub: Arc::new(Hub::new()),
            projects: RwLock::new(HashMap::new()),
            last_stamp: Mutex::new(0),
        }
    }

    /// Build a session backed by the configured directories.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        settings.paths.ensure_dirs()?;
        let library = ModelLibrary::scan(&settings.paths.assets)?;
        let uploads = UploadStore::new(settings.paths.uploads.clone());
        let fonts = FontStore::new(settings.fonts.families.clone(), settings.fonts.default_font.clone());
        Ok(Self::new(settings, Arc::new(library), Arc::new(uploads), Arc::new(fonts)))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    pub fn list_models(&self) -> Vec<ModelInfo> {
        self.resolver.available()
    }

    fn project_handle(&self, id: Uuid) -> Result<Arc<Mutex<Project>>> {
        let projects = match self.projects.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let handle = projects.get(&id).cloned();
        handle.ok_or(CustomizerError::ProjectNotFound(id))
    }

    /// Recompute an element's UV rect and warnings from its transform.
    fn derive(&self, element: &mut Element, garment: &GarmentProfile) {
        let mapper = Mapper::new(&garment.mapping, self.settings.canvas.editor);
        element.uv = mapper.to_uv(&element.transform, element.side);
        element.warnings = self.validator.validate_placement(&mapper, &element.transform, element.side);
    }

    pub fn create_project(&self, model_type: &str, base_color: Color) -> Result<Project> {
        let model_path = self.resolver.resolve(model_type)?;
        let project = Project::new(model_type.to_string(), model_path, base_color);
        let id = project.id;

        match self.projects.write() {
            Ok(mut projects) => projects.insert(id, Arc::new(Mutex::new(project.clone()))),
            Err(poisoned) => poisoned.into_inner().insert(id, Arc::new(Mutex::new(project.clone()))),
        };
        log::info!("Created project {} ({})", id, model_type);
        self.hub.broadcast_all(ServerEvent::ProjectCreated { project_id: id, project: project.clone() });
        Ok(project)
    }

    /// Snapshot of a project.
    pub fn get_project(&self, id: Uuid) -> Result<Project> {
        let handle = self.project_handle(id)?;
        let project = lock(&handle).clone();
        Ok(project)
    }

    pub fn add_element(&self, project_id: Uuid, request: NewElement) -> Result<Element> {
        let handle = self.project_handle(project_id)?;
        let mut project = lock(&handle);
        let garment = self.settings.garment(&project.model_type);

        let canvas = &self.settings.canvas;
        let transform = request.transform.clamped(&canvas.size_limits);
        let kind = request.kind.clamped(&canvas.font_size_limits);
        let mut element = Element::new(kind, request.side, transform);
        self.derive(&mut element, &garment);

        project.elements.push(element.clone());
        project.touch();
        self.hub.broadcast(
            project_id,
            ServerEvent::DesignUpdate { project_id, element: element.clone(), action: DesignAction::Add },
            None,
        );
        log::debug!("Added {} to project {}", element.id, project_id);
        Ok(element)
    }

    /// Shallow-merge `patch` into an element. The broadcast carries the
    /// clamped values for the patched fields and skips `origin`, which
    /// already applied the change locally.
    pub fn transform_element(
        &self,
        project_id: Uuid,
        element_id: Uuid,
        patch: &TransformPatch,
        origin: Option<ClientId>,
    ) -> Result<Element> {
        let handle = self.project_handle(project_id)?;
        let mut project = lock(&handle);
        let garment = self.settings.garment(&project.model_type);
        let limits = self.settings.canvas.size_limits;

        let element = project
            .element_mut(element_id)
            .ok_or(CustomizerError::ElementNotFound { project: project_id, element: element_id })?;
        element.transform = element.transform.merged(patch).clamped(&limits);
        if let Some(side) = patch.side {
            element.side = side;
        }
        self.derive(element, &garment);
        let element = element.clone();
        project.touch();

        self.hub.broadcast(
            project_id,
            ServerEvent::ElementTransformed {
                project_id,
                element_id,
                transform: patch.settled(&element.transform, element.side),
                uv: element.uv,
                warnings: element.warnings.clone(),
            },
            origin,
        );
        Ok(element)
    }

    pub fn remove_element(&self, project_id: Uuid, element_id: Uuid) -> Result<Element> {
        let handle = self.project_handle(project_id)?;
        let mut project = lock(&handle);
        let element = project
            .remove_element(element_id)
            .ok_or(CustomizerError::ElementNotFound { project: project_id, element: element_id })?;
        project.touch();
        self.hub.broadcast(
            project_id,
            ServerEvent::DesignUpdate { project_id, element: element.clone(), action: DesignAction::Remove },
            None,
        );
        log::debug!("Removed {} from project {}", element_id, project_id);
        Ok(element)
    }

    /// Set the fabric color. Broadcast to every subscriber, sender included.
    pub fn set_base_color(&self, project_id: Uuid, color: Color) -> Result<Color> {
        let handle = self.project_handle(project_id)?;
        let mut project = lock(&handle);
        project.base_color = color;
        project.touch();
        self.hub.broadcast(project_id, ServerEvent::ColorChanged { project_id, color }, None);
        Ok(color)
    }

    /// Set or clear the tiled fabric pattern. Opacity is clamped to [0, 1].
    pub fn set_pattern(&self, project_id: Uuid, pattern: Option<FabricPattern>) -> Result<Option<FabricPattern>> {
        let pattern = pattern.map(|p| FabricPattern {
            opacity: if p.opacity.is_nan() { 1.0 } else { p.opacity.clamp(0.0, 1.0) },
            ..p
        });
        let handle = self.project_handle(project_id)?;
        let mut project = lock(&handle);
        project.pattern = pattern.clone();
        project.touch();
        self.hub.broadcast(project_id, ServerEvent::PatternChanged { project_id, pattern: pattern.clone() }, None);
        Ok(pattern)
    }

    /// Subscribe a client and send it the current state.
    pub fn join(&self, client: ClientId, project_id: Uuid) -> Result<Project> {
        let handle = self.project_handle(project_id)?;
        let project = lock(&handle);
        if !self.hub.join(client, project_id) {
            return Err(CustomizerError::InvalidRequest(format!("client {} is not connected", client)));
        }
        let snapshot = project.clone();
        self.hub.send_to(client, ServerEvent::ProjectState(snapshot.clone()));
        log::info!("Client {} joined project {}", client, project_id);
        Ok(snapshot)
    }

    /// 3D anchors for every element, from their stored UV rects.
    pub fn placements(&self, project_id: Uuid) -> Result<Vec<ElementPlacement>> {
        let project = self.get_project(project_id)?;
        let garment = self.settings.garment(&project.model_type);
        Ok(project
            .elements
            .iter()
            .map(|e| ElementPlacement {
                element_id: e.id,
                side: e.side,
                placement: garment.placement.place(&e.uv, e.side),
            })
            .collect())
    }

    /// Millisecond timestamp, strictly increasing across calls.
    fn next_stamp(&self) -> i64 {
        let mut last = lock(&self.last_stamp);
        let now = Utc::now().timestamp_millis();
        *last = if now > *last { now } else { *last + 1 };
        *last
    }

    fn check_texture_size(&self, width: u32, height: u32) -> Result<()> {
        let max = self.settings.server.max_texture_size;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(CustomizerError::InvalidRequest(format!(
                "texture size {}x{} must be between 1 and {}",
                width, height, max
            )));
        }
        Ok(())
    }

    /// Render a snapshot of the project on a worker thread.
    pub fn start_render(&self, project_id: Uuid, width: u32, height: u32) -> Result<RenderJob> {
        self.check_texture_size(width, height)?;
        let project = self.get_project(project_id)?;
        let garment = self.settings.garment(&project.model_type);
        let editor = self.settings.canvas.editor;
        let outputs = self.settings.paths.outputs.clone();
        let compositor = self.compositor.clone();
        let hub = Arc::clone(&self.hub);
        let stem = format!("{}-{}", project_id, self.next_stamp());

        let cancel = Arc::new(AtomicBool::new(false));
        let worker_cancel = Arc::clone(&cancel);
        let (tx, rx) = channel();

        std::thread::spawn(move || {
            let result = (|| -> Result<RenderOutput> {
                let mapper = Mapper::new(&garment.mapping, editor);
                let composite = compositor.compose_cancellable(&project, &mapper, width, height, &worker_cancel)?;

                std::fs::create_dir_all(&outputs)?;
                let texture_file = format!("{}.png", stem);
                let texture_path = outputs.join(&texture_file);
                let layers_path = outputs.join(format!("{}.layers.json", stem));
                composite.image.save(&texture_path)?;
                export_layers(&LayerLog { width, height, layers: composite.layers }, &layers_path)?;

                let texture_url = format!("{}{}", OUTPUT_URL_PREFIX, texture_file);
                log::info!("Rendered project {} to {}", project_id, texture_path.display());
                hub.broadcast(
                    project_id,
                    ServerEvent::RenderComplete { project_id, texture_url: texture_url.clone(), width, height },
                    None,
                );
                Ok(RenderOutput {
                    project_id,
                    texture_url,
                    texture_path,
                    layers_path,
                    width,
                    height,
                    image: composite.image,
                })
            })();
            if let Err(e) = &result {
                log::warn!("Render of project {} failed: {}", project_id, e);
            }
            let _ = tx.send(result);
        });

        Ok(RenderJob { cancel, done: rx })
    }

    /// Render and wait for the result.
    pub fn render(&self, project_id: Uuid, width: u32, height: u32) -> Result<RenderOutput> {
        self.start_render(project_id, width, height)?.wait()
    }
}
