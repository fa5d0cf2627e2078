// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! HTTP/JSON API.
//!
//! [`route`] maps a request onto session operations and returns a response
//! value without touching sockets; [`spawn`] runs it on `tiny_http` worker
//! threads. Successful JSON bodies carry `"success": true`, failures
//! `{"success": false, "error": "..."}` with the status from
//! [`CustomizerError::status_code`].

use crate::error::{CustomizerError, Result};
use crate::io::assets::UploadStore;
use crate::io::upload::store_upload;
use crate::models::color::Color;
use crate::models::element::{EditorTransform, ElementKind, Side, TransformPatch};
use crate::models::project::FabricPattern;
use crate::session::hub::ClientId;
use crate::session::{NewElement, Session};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use uuid::Uuid;

/// Extra room for multipart framing on top of the upload limit.
const BODY_OVERHEAD: usize = 64 * 1024;

/// Header a real-time client puts on its HTTP mutations so it is left out
/// of the resulting broadcast.
pub const CLIENT_ID_HEADER: &str = "X-Client-Id";

/// Request headers the router cares about.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RequestContext<'a> {
    pub content_type: Option<&'a str>,
    /// Real-time client that sent the request, if it said so.
    pub client: Option<ClientId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    File { path: PathBuf, content_type: &'static str },
    Empty,
}

/// A response ready to be written to the client.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Body,
}

impl ApiResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body: Body::Json(body) }
    }

    fn error(status: u16, message: &str) -> Self {
        Self { status, body: Body::Json(json!({ "success": false, "error": message })) }
    }

    fn from_error(err: &CustomizerError) -> Self {
        let status = err.status_code();
        if status >= 500 {
            log::error!("Request failed: {}", err);
        }
        Self::error(status, &err.to_string())
    }

    /// The JSON body, if any.
    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            Body::Json(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateProjectRequest {
    #[serde(default = "default_model_type")]
    model_type: String,
    #[serde(default)]
    base_color: Option<String>,
}

fn default_model_type() -> String {
    "tshirt".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StickerRequest {
    #[serde(default)]
    sticker_id: Option<String>,
    sticker_url: String,
    x: f64,
    y: f64,
    width: Option<f64>,
    height: Option<f64>,
    #[serde(default)]
    rotation: f64,
    #[serde(default)]
    side: Side,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextRequest {
    text: String,
    x: f64,
    y: f64,
    #[serde(default = "default_font_size")]
    font_size: f32,
    #[serde(default = "default_font_family")]
    font_family: String,
    #[serde(default)]
    color: Option<String>,
    width: Option<f64>,
    height: Option<f64>,
    #[serde(default)]
    rotation: f64,
    #[serde(default)]
    side: Side,
}

fn default_font_size() -> f32 {
    48.0
}

fn default_font_family() -> String {
    "Arial".to_string()
}

#[derive(Debug, Deserialize)]
struct ColorRequest {
    color: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PatternRequest {
    /// Omitted or null clears the pattern.
    #[serde(default)]
    pattern_url: Option<String>,
    #[serde(default = "default_opacity")]
    opacity: f32,
}

fn default_opacity() -> f32 {
    1.0
}

#[derive(Debug, Default, Deserialize)]
struct RenderRequest {
    width: Option<u32>,
    height: Option<u32>,
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let body = if body.iter().all(u8::is_ascii_whitespace) { &b"{}"[..] } else { body };
    serde_json::from_slice(body).map_err(|e| CustomizerError::InvalidRequest(e.to_string()))
}

fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| CustomizerError::InvalidRequest(format!("'{}' is not a valid id", raw)))
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("glb") => "model/gltf-binary",
        Some("gltf") => "model/gltf+json",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

fn static_file(dir: &Path, name: &str) -> ApiResponse {
    if name.is_empty() || name == "." || name == ".." || name.contains('\\') {
        return ApiResponse::error(404, "Not found");
    }
    let path = dir.join(name);
    if !path.is_file() {
        return ApiResponse::error(404, "Not found");
    }
    let content_type = content_type_for(&path);
    ApiResponse { status: 200, body: Body::File { path, content_type } }
}

/// Handle one request against the session.
pub fn route(session: &Session, method: &Method, url: &str, context: &RequestContext, body: &[u8]) -> ApiResponse {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    log::debug!("{} {}", method, path);

    let paths = &session.settings().paths;
    let result = match (method, segments.as_slice()) {
        (Method::Options, _) => return ApiResponse { status: 204, body: Body::Empty },
        (Method::Get, ["uploads", name]) => return static_file(&paths.uploads, name),
        (Method::Get, ["outputs", name]) => return static_file(&paths.outputs, name),
        (Method::Get, ["assets", name]) => return static_file(&paths.assets, name),

        (Method::Get, ["api", "models"]) => Ok(json!({ "success": true, "models": session.list_models() })),
        (Method::Post, ["api", "project", "create"]) => create_project(session, body),
        (Method::Get, ["api", "project", id]) => parse_id(id)
            .and_then(|id| session.get_project(id))
            .map(|project| json!({ "success": true, "project": project })),
        (Method::Post, ["api", "sticker", "upload"]) => upload_sticker(session, context.content_type, body),
        (Method::Post, ["api", "project", id, "sticker"]) => parse_id(id).and_then(|id| add_sticker(session, id, body)),
        (Method::Post, ["api", "project", id, "text"]) => parse_id(id).and_then(|id| add_text(session, id, body)),
        (Method::Put, ["api", "project", id, "color"]) => parse_id(id).and_then(|id| set_color(session, id, body)),
        (Method::Put, ["api", "project", id, "pattern"]) => parse_id(id).and_then(|id| set_pattern(session, id, body)),
        (Method::Post, ["api", "project", id, "render"]) => parse_id(id).and_then(|id| render(session, id, body)),
        (Method::Get, ["api", "project", id, "placements"]) => parse_id(id)
            .and_then(|id| session.placements(id))
            .map(|placements| json!({ "success": true, "placements": placements })),
        (Method::Patch, ["api", "project", id, "element", element_id]) => parse_id(id).and_then(|id| {
            let element_id = parse_id(element_id)?;
            let patch: TransformPatch = parse_body(body)?;
            let element = session.transform_element(id, element_id, &patch, context.client)?;
            Ok(json!({ "success": true, "element": element }))
        }),
        (Method::Delete, ["api", "project", id, "element", element_id]) => parse_id(id).and_then(|id| {
            let element = session.remove_element(id, parse_id(element_id)?)?;
            Ok(json!({ "success": true, "element": element }))
        }),
        _ => return ApiResponse::error(404, "Not found"),
    };

    match result {
        Ok(value) => ApiResponse::ok(value),
        Err(e) => ApiResponse::from_error(&e),
    }
}

fn create_project(session: &Session, body: &[u8]) -> Result<Value> {
    let req: CreateProjectRequest = parse_body(body)?;
    let color = match req.base_color.as_deref() {
        Some(raw) => Color::parse(raw)?,
        None => Color::WHITE,
    };
    let project = session.create_project(&req.model_type, color)?;
    Ok(json!({ "success": true, "projectId": project.id, "project": project }))
}

fn upload_sticker(session: &Session, content_type: Option<&str>, body: &[u8]) -> Result<Value> {
    let settings = session.settings();
    let store = UploadStore::new(settings.paths.uploads.clone());
    let stored = store_upload(&store, content_type.unwrap_or(""), body, settings.server.max_upload_bytes)?;
    Ok(json!({
        "success": true,
        "stickerId": stored.sticker_id,
        "stickerUrl": stored.sticker_url,
        "filename": stored.filename,
    }))
}

fn add_sticker(session: &Session, project_id: Uuid, body: &[u8]) -> Result<Value> {
    let req: StickerRequest = parse_body(body)?;
    let canvas = &session.settings().canvas;
    let request = NewElement {
        kind: ElementKind::Sticker { sticker_id: req.sticker_id, asset_ref: req.sticker_url },
        side: req.side,
        transform: EditorTransform::new(
            req.x,
            req.y,
            req.width.unwrap_or(canvas.default_element_width),
            req.height.unwrap_or(canvas.default_element_height),
            req.rotation,
        ),
    };
    let element = session.add_element(project_id, request)?;
    Ok(json!({ "success": true, "element": element }))
}

fn add_text(session: &Session, project_id: Uuid, body: &[u8]) -> Result<Value> {
    let req: TextRequest = parse_body(body)?;
    let color = match req.color.as_deref() {
        Some(raw) => Color::parse(raw)?,
        None => Color::BLACK,
    };
    let canvas = &session.settings().canvas;
    let request = NewElement {
        kind: ElementKind::Text {
            content: req.text,
            font_size: req.font_size,
            font_family: req.font_family,
            color,
        },
        side: req.side,
        transform: EditorTransform::new(
            req.x,
            req.y,
            req.width.unwrap_or(canvas.default_element_width),
            req.height.unwrap_or(canvas.default_element_height),
            req.rotation,
        ),
    };
    let element = session.add_element(project_id, request)?;
    Ok(json!({ "success": true, "element": element }))
}

fn set_color(session: &Session, project_id: Uuid, body: &[u8]) -> Result<Value> {
    let req: ColorRequest = parse_body(body)?;
    let color = session.set_base_color(project_id, Color::parse(&req.color)?)?;
    Ok(json!({ "success": true, "color": color }))
}

fn set_pattern(session: &Session, project_id: Uuid, body: &[u8]) -> Result<Value> {
    let req: PatternRequest = parse_body(body)?;
    let pattern = req.pattern_url.map(|asset_ref| FabricPattern { asset_ref, opacity: req.opacity });
    let pattern = session.set_pattern(project_id, pattern)?;
    Ok(json!({ "success": true, "pattern": pattern }))
}

fn render(session: &Session, project_id: Uuid, body: &[u8]) -> Result<Value> {
    let req: RenderRequest = parse_body(body)?;
    let texture = session.settings().canvas.texture;
    let width = req.width.unwrap_or(texture.width as u32);
    let height = req.height.unwrap_or(texture.height as u32);
    let output = session.render(project_id, width, height)?;
    Ok(json!({
        "success": true,
        "textureUrl": output.texture_url,
        "width": output.width,
        "height": output.height,
    }))
}

fn header(name: &str, value: &str) -> Option<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}

fn read_body(request: &mut Request, limit: usize) -> Result<Vec<u8>> {
    if request.body_length().is_some_and(|len| len > limit) {
        return Err(CustomizerError::InvalidAsset(format!("request body exceeds {} bytes", limit)));
    }
    let mut body = Vec::new();
    request.as_reader().take(limit as u64 + 1).read_to_end(&mut body)?;
    if body.len() > limit {
        return Err(CustomizerError::InvalidAsset(format!("request body exceeds {} bytes", limit)));
    }
    Ok(body)
}

fn header_value(request: &Request, name: &'static str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.equiv(name))
        .map(|h| h.value.as_str().trim().to_string())
}

fn handle_request(session: &Session, mut request: Request) {
    let limit = session.settings().server.max_upload_bytes + BODY_OVERHEAD;
    let content_type = header_value(&request, "Content-Type");
    let client = header_value(&request, CLIENT_ID_HEADER).and_then(|raw| match raw.parse::<ClientId>() {
        Ok(id) => Some(id),
        Err(_) => {
            log::debug!("Ignoring malformed {} '{}'", CLIENT_ID_HEADER, raw);
            None
        }
    });
    let context = RequestContext { content_type: content_type.as_deref(), client };

    let response = match read_body(&mut request, limit) {
        Ok(body) => route(session, request.method(), request.url(), &context, &body),
        Err(e) => ApiResponse::from_error(&e),
    };

    let cors = [
        header("Access-Control-Allow-Origin", "*"),
        header("Access-Control-Allow-Methods", "GET, POST, PUT, PATCH, DELETE, OPTIONS"),
        header("Access-Control-Allow-Headers", "Content-Type, X-Client-Id"),
    ];
    let status = StatusCode(response.status);
    let result = match response.body {
        Body::Json(value) => {
            let mut out = Response::from_string(value.to_string()).with_status_code(status);
            for h in cors.into_iter().chain([header("Content-Type", "application/json")]).flatten() {
                out.add_header(h);
            }
            request.respond(out)
        }
        Body::File { path, content_type } => match std::fs::File::open(&path) {
            Ok(file) => {
                let mut out = Response::from_file(file).with_status_code(status);
                for h in cors.into_iter().chain([header("Content-Type", content_type)]).flatten() {
                    out.add_header(h);
                }
                request.respond(out)
            }
            Err(e) => {
                log::error!("Failed to open {}: {}", path.display(), e);
                request.respond(Response::empty(500))
            }
        },
        Body::Empty => {
            let mut out = Response::empty(status);
            for h in cors.into_iter().flatten() {
                out.add_header(h);
            }
            request.respond(out)
        }
    };
    if let Err(e) = result {
        log::warn!("Failed to send response: {}", e);
    }
}

/// Bind the HTTP API and start `workers` threads serving it.
pub fn spawn(session: Arc<Session>, bind: &str, workers: usize) -> Result<Vec<JoinHandle<()>>> {
    let server = Server::http(bind)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::AddrNotAvailable, format!("{}: {}", bind, e)))?;
    let server = Arc::new(server);
    log::info!("HTTP API listening on {}", bind);

    let handles = (0..workers.max(1))
        .map(|_| {
            let server = Arc::clone(&server);
            let session = Arc::clone(&session);
            std::thread::spawn(move || loop {
                match server.recv() {
                    Ok(request) => handle_request(&session, request),
                    Err(e) => {
                        log::error!("HTTP accept failed: {}", e);
                        break;
                    }
                }
            })
        })
        .collect();
    Ok(handles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::upload::tests::{multipart, png_bytes, BOUNDARY};
    use crate::config::Settings;
    use crate::session::hub::ServerEvent;
    use crate::session::tests::session_with;

    fn call_as(session: &Session, client: Option<ClientId>, method: Method, url: &str, body: Value) -> ApiResponse {
        let body = if body.is_null() { String::new() } else { body.to_string() };
        let context = RequestContext { content_type: Some("application/json"), client };
        route(session, &method, url, &context, body.as_bytes())
    }

    fn call(session: &Session, method: Method, url: &str, body: Value) -> ApiResponse {
        call_as(session, None, method, url, body)
    }

    fn session_in(dir: &Path) -> Session {
        let mut settings = Settings::default();
        settings.paths.outputs = dir.join("outputs");
        settings.paths.uploads = dir.join("uploads");
        settings.paths.assets = dir.join("assets");
        session_with(settings)
    }

    fn create(session: &Session) -> String {
        let resp = call(session, Method::Post, "/api/project/create", json!({ "modelType": "tshirt", "baseColor": "#00ff00" }));
        assert_eq!(resp.status, 200);
        let body = resp.json().unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["project"]["baseColor"], "#00ff00");
        body["projectId"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_create_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(dir.path());
        let id = create(&session);

        let resp = call(&session, Method::Get, &format!("/api/project/{}", id), Value::Null);
        assert_eq!(resp.status, 200);
        assert_eq!(resp.json().unwrap()["project"]["modelType"], "tshirt");

        let resp = call(&session, Method::Post, "/api/project/create", json!({ "modelType": "mug" }));
        assert_eq!(resp.status, 400);
        assert_eq!(resp.json().unwrap()["success"], false);

        let resp = call(&session, Method::Get, &format!("/api/project/{}", Uuid::new_v4()), Value::Null);
        assert_eq!(resp.status, 404);
    }

    #[test]
    fn test_missing_project_sticker_is_404_and_harmless() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(dir.path());
        let id = create(&session);

        let sticker = json!({ "stickerUrl": "/uploads/a.png", "x": 50, "y": 50, "width": 100, "height": 100 });
        let resp = call(&session, Method::Post, &format!("/api/project/{}/sticker", Uuid::new_v4()), sticker);
        assert_eq!(resp.status, 404);

        let resp = call(&session, Method::Get, &format!("/api/project/{}", id), Value::Null);
        assert!(resp.json().unwrap()["project"]["elements"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_element_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(dir.path());
        let id = create(&session);

        let sticker = json!({ "stickerId": "s1", "stickerUrl": "/uploads/a.png", "x": 2, "y": 2, "width": 100, "height": 100 });
        let resp = call(&session, Method::Post, &format!("/api/project/{}/sticker", id), sticker);
        assert_eq!(resp.status, 200);
        let element = resp.json().unwrap()["element"].clone();
        assert_eq!(element["type"], "sticker");
        assert!(!element["warnings"].as_array().unwrap().is_empty());
        let element_id = element["id"].as_str().unwrap().to_string();

        let text = json!({ "text": "Hi", "x": 50, "y": 20 });
        let resp = call(&session, Method::Post, &format!("/api/project/{}/text", id), text);
        assert_eq!(resp.status, 200);
        let text = &resp.json().unwrap()["element"];
        assert_eq!(text["fontSize"], 48.0);
        assert_eq!(text["fontFamily"], "Arial");
        assert_eq!(text["color"], "#000000");

        let url = format!("/api/project/{}/element/{}", id, element_id);
        let resp = call(&session, Method::Patch, &url, json!({ "x": 10 }));
        assert_eq!(resp.json().unwrap()["element"]["x"], 10.0);
        assert_eq!(resp.json().unwrap()["element"]["y"], 2.0);

        let resp = call(&session, Method::Delete, &url, Value::Null);
        assert_eq!(resp.status, 200);
        let resp = call(&session, Method::Delete, &url, Value::Null);
        assert_eq!(resp.status, 404);
    }

    #[test]
    fn test_color_and_render() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(dir.path());
        let id = create(&session);

        let resp = call(&session, Method::Put, &format!("/api/project/{}/color", id), json!({ "color": "#123" }));
        assert_eq!(resp.json().unwrap()["color"], "#112233");
        let resp = call(&session, Method::Put, &format!("/api/project/{}/color", id), json!({ "color": "blue" }));
        assert_eq!(resp.status, 400);

        let resp = call(&session, Method::Post, &format!("/api/project/{}/render", id), json!({ "width": 32, "height": 16 }));
        assert_eq!(resp.status, 200);
        let body = resp.json().unwrap();
        assert_eq!(body["width"], 32);
        let texture_url = body["textureUrl"].as_str().unwrap().to_string();
        assert!(texture_url.starts_with(&format!("/outputs/{}-", id)));

        let resp = call(&session, Method::Get, &texture_url, Value::Null);
        assert!(matches!(resp.body, Body::File { content_type: "image/png", .. }));
    }

    #[test]
    fn test_upload_route() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(dir.path());
        std::fs::create_dir_all(dir.path().join("uploads")).unwrap();

        let body = multipart("sticker", "logo.png", "image/png", &png_bytes());
        let content_type = format!("multipart/form-data; boundary={}", BOUNDARY);
        let context = RequestContext { content_type: Some(&content_type), client: None };
        let resp = route(&session, &Method::Post, "/api/sticker/upload", &context, &body);
        assert_eq!(resp.status, 200);
        let url = resp.json().unwrap()["stickerUrl"].as_str().unwrap().to_string();
        assert!(url.starts_with("/uploads/sticker-"));

        let bad = multipart("sticker", "notes.txt", "text/plain", b"hi");
        let resp = route(&session, &Method::Post, "/api/sticker/upload", &context, &bad);
        assert_eq!(resp.status, 400);
    }

    #[test]
    fn test_patch_skips_the_sending_client() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(dir.path());
        let id = create(&session);
        let project_id = parse_id(&id).unwrap();
        let sticker = json!({ "stickerUrl": "/uploads/a.png", "x": 50, "y": 50 });
        let resp = call(&session, Method::Post, &format!("/api/project/{}/sticker", id), sticker);
        let element_id = resp.json().unwrap()["element"]["id"].as_str().unwrap().to_string();

        let (editor, rx_editor) = session.hub().connect();
        let (viewer, rx_viewer) = session.hub().connect();
        session.join(editor, project_id).unwrap();
        session.join(viewer, project_id).unwrap();
        rx_editor.try_iter().count();
        rx_viewer.try_iter().count();

        let url = format!("/api/project/{}/element/{}", id, element_id);
        let resp = call_as(&session, Some(editor), Method::Patch, &url, json!({ "y": 30 }));
        assert_eq!(resp.status, 200);
        assert!(rx_editor.try_recv().is_err());
        assert!(matches!(rx_viewer.try_recv(), Ok(ServerEvent::ElementTransformed { .. })));

        call(&session, Method::Patch, &url, json!({ "y": 40 }));
        assert!(rx_editor.try_recv().is_ok());
        assert!(rx_viewer.try_recv().is_ok());
    }

    #[test]
    fn test_pattern_route() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(dir.path());
        let id = create(&session);
        let url = format!("/api/project/{}/pattern", id);

        let resp = call(&session, Method::Put, &url, json!({ "patternUrl": "/uploads/dots.png", "opacity": 0.4 }));
        assert_eq!(resp.status, 200);
        let pattern = &resp.json().unwrap()["pattern"];
        assert_eq!(pattern["assetRef"], "/uploads/dots.png");
        assert!((pattern["opacity"].as_f64().unwrap() - 0.4).abs() < 1e-6);

        let resp = call(&session, Method::Get, &format!("/api/project/{}", id), Value::Null);
        assert_eq!(resp.json().unwrap()["project"]["pattern"]["assetRef"], "/uploads/dots.png");

        let resp = call(&session, Method::Put, &url, json!({}));
        assert!(resp.json().unwrap()["pattern"].is_null());
        let resp = call(&session, Method::Get, &format!("/api/project/{}", id), Value::Null);
        assert!(resp.json().unwrap()["project"].get("pattern").is_none());

        let resp = call(&session, Method::Put, &format!("/api/project/{}/pattern", Uuid::new_v4()), json!({}));
        assert_eq!(resp.status, 404);
    }

    #[test]
    fn test_huge_font_size_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(dir.path());
        let id = create(&session);
        let text = json!({ "text": "Big", "x": 50, "y": 50, "fontSize": 40000 });
        let resp = call(&session, Method::Post, &format!("/api/project/{}/text", id), text);
        assert_eq!(resp.status, 200);
        let max = session.settings().canvas.font_size_limits.max;
        assert_eq!(resp.json().unwrap()["element"]["fontSize"], max);
    }

    #[test]
    fn test_misc_routes() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(dir.path());
        let resp = call(&session, Method::Get, "/api/models", Value::Null);
        assert_eq!(resp.json().unwrap()["models"].as_array().unwrap().len(), 2);
        assert_eq!(call(&session, Method::Get, "/nope", Value::Null).status, 404);
        assert_eq!(call(&session, Method::Get, "/uploads/..", Value::Null).status, 404);
        assert_eq!(call(&session, Method::Options, "/api/models", Value::Null).status, 204);
        assert_eq!(call(&session, Method::Get, "/api/project/not-a-uuid", Value::Null).status, 400);
    }
}
