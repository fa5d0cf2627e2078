// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Sticker uploads.
//!
//! Parses `multipart/form-data` bodies, filters the uploaded file by size,
//! declared type, extension and actual content, then stores accepted files
//! in the uploads directory under a fresh name. Nothing touches the disk
//! until every check has passed.

use super::assets::UploadStore;
use crate::error::{CustomizerError, Result};
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Form field the sticker file is sent in.
pub const UPLOAD_FIELD: &str = "sticker";

const ALLOWED_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif", "glb", "gltf"];

/// One part of a multipart body.
#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Result of a successful upload, as returned to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUpload {
    pub sticker_id: Uuid,
    pub sticker_url: String,
    pub filename: String,
}

/// Extract the boundary from a `multipart/form-data` content type.
pub fn boundary_from_content_type(content_type: &str) -> Option<String> {
    let mut params = content_type.split(';').map(str::trim);
    let mime = params.next()?;
    if !mime.eq_ignore_ascii_case("multipart/form-data") {
        return None;
    }
    params
        .filter_map(|p| p.split_once('='))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("boundary"))
        .map(|(_, v)| v.trim().trim_matches('"').to_string())
        .filter(|b| !b.is_empty())
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack.get(from..)?.windows(needle.len()).position(|w| w == needle).map(|p| p + from)
}

fn invalid(msg: &str) -> CustomizerError {
    CustomizerError::InvalidRequest(format!("malformed multipart body: {}", msg))
}

/// Split a multipart body into its parts.
pub fn parse_multipart(body: &[u8], boundary: &str) -> Result<Vec<FormPart>> {
    let delimiter = format!("--{}", boundary).into_bytes();
    let mut closing = b"\r\n".to_vec();
    closing.extend_from_slice(&delimiter);

    let mut pos = find(body, &delimiter, 0).ok_or_else(|| invalid("boundary not found"))?;
    let mut parts = Vec::new();
    loop {
        pos += delimiter.len();
        if body[pos..].starts_with(b"--") {
            break;
        }
        if body[pos..].starts_with(b"\r\n") {
            pos += 2;
        }

        let header_end = find(body, b"\r\n\r\n", pos).ok_or_else(|| invalid("part headers not terminated"))?;
        let headers = String::from_utf8_lossy(&body[pos..header_end]);
        let data_start = header_end + 4;
        let data_end = find(body, &closing, data_start).ok_or_else(|| invalid("part not terminated"))?;

        parts.push(parse_part_headers(&headers, body[data_start..data_end].to_vec())?);
        pos = data_end + 2;
    }
    Ok(parts)
}

fn parse_part_headers(headers: &str, data: Vec<u8>) -> Result<FormPart> {
    let mut name = None;
    let mut filename = None;
    let mut content_type = None;

    for line in headers.split("\r\n") {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.eq_ignore_ascii_case("content-disposition") {
            for param in value.split(';').map(str::trim) {
                let Some((k, v)) = param.split_once('=') else {
                    continue;
                };
                let v = v.trim().trim_matches('"').to_string();
                match k.trim() {
                    "name" => name = Some(v),
                    "filename" => filename = Some(v),
                    _ => {}
                }
            }
        } else if key.eq_ignore_ascii_case("content-type") {
            content_type = Some(value.trim().to_ascii_lowercase());
        }
    }

    let name = name.ok_or_else(|| invalid("part without a name"))?;
    Ok(FormPart { name, filename, content_type, data })
}

/// Check an uploaded file and return its normalized extension.
pub fn check_upload(part: &FormPart, max_bytes: usize) -> Result<String> {
    let reject = |msg: String| -> Result<String> {
        log::warn!("Rejected upload {:?}: {}", part.filename, msg);
        Err(CustomizerError::InvalidAsset(msg))
    };

    if part.data.is_empty() {
        return reject("uploaded file is empty".to_string());
    }
    if part.data.len() > max_bytes {
        return reject(format!("file is larger than {} bytes", max_bytes));
    }

    let extension = part
        .filename
        .as_deref()
        .and_then(|f| Path::new(f).extension())
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return reject(format!("extension '{}' is not allowed", extension));
    }

    let content_type = part.content_type.as_deref().unwrap_or("");
    let type_ok = content_type.starts_with("image/")
        || content_type == "model/gltf-binary"
        || content_type == "model/gltf+json";
    if !type_ok {
        return reject(format!("content type '{}' is not allowed", content_type));
    }

    let content_ok = match extension.as_str() {
        "glb" => part.data.starts_with(b"glTF"),
        "gltf" => serde_json::from_slice::<serde_json::Value>(&part.data).is_ok_and(|v| v.is_object()),
        // jpg and jpeg both name ImageFormat::Jpeg
        _ => match (image::guess_format(&part.data), ImageFormat::from_extension(&extension)) {
            (Ok(sniffed), Some(claimed)) => sniffed == claimed,
            _ => false,
        },
    };
    if !content_ok {
        return reject(format!("file content does not match .{}", extension));
    }
    Ok(extension)
}

/// Parse a multipart request body and store its sticker file.
pub fn store_upload(store: &UploadStore, content_type: &str, body: &[u8], max_bytes: usize) -> Result<StoredUpload> {
    let boundary = boundary_from_content_type(content_type)
        .ok_or_else(|| CustomizerError::InvalidRequest("expected multipart/form-data".to_string()))?;
    let parts = parse_multipart(body, &boundary)?;
    let part = parts
        .iter()
        .find(|p| p.name == UPLOAD_FIELD && p.filename.is_some())
        .ok_or_else(|| CustomizerError::InvalidAsset("No file uploaded".to_string()))?;

    let extension = check_upload(part, max_bytes)?;
    let sticker_id = Uuid::new_v4();
    let filename = format!("{}-{}.{}", UPLOAD_FIELD, sticker_id, extension);
    std::fs::create_dir_all(store.dir())?;
    std::fs::write(store.dir().join(&filename), &part.data)?;

    log::info!("Stored upload {} ({} bytes)", filename, part.data.len());
    Ok(StoredUpload { sticker_id, sticker_url: store.url_for(&filename), filename })
}
