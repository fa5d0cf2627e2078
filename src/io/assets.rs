// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Asset lookup: garment models, sticker images and fonts.
//!
//! The compositor and session only see the traits defined here, so tests
//! can substitute in-memory sources.

use crate::error::{CustomizerError, Result};
use ab_glyph::FontArc;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Loads decoded sticker images by asset reference.
pub trait AssetSource: Send + Sync {
    fn load_image(&self, asset: &str) -> Result<RgbaImage>;
}

/// Loads fonts by family name.
pub trait FontSource: Send + Sync {
    fn load_font(&self, family: &str) -> Result<FontArc>;
}

/// Resolves a garment type to a concrete model asset.
pub trait AssetResolver: Send + Sync {
    fn resolve(&self, model_type: &str) -> Result<String>;
    fn available(&self) -> Vec<ModelInfo>;
}

/// One garment model found in the asset library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub product_type: String,
    pub name: String,
    pub filename: String,
    #[serde(skip)]
    pub path: PathBuf,
}

/// Guess the product type from a model file stem.
pub fn infer_product_type(stem: &str) -> String {
    let name = stem.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| name.contains(w));

    // "sweatshirt" contains "shirt", so hoodies are checked first
    if has(&["hoodie", "sweatshirt"]) {
        "hoodie".to_string()
    } else if has(&["tshirt", "t-shirt", "shirt"]) {
        "tshirt".to_string()
    } else if has(&["mug", "cup"]) {
        "mug".to_string()
    } else if has(&["cap", "hat"]) {
        "cap".to_string()
    } else {
        name.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
    }
}

/// Garment models keyed by product type.
#[derive(Debug, Clone, Default)]
pub struct ModelLibrary {
    models: BTreeMap<String, ModelInfo>,
}

impl ModelLibrary {
    /// Scan `dir` for `.glb` files. A missing directory yields an empty
    /// library. When two files infer the same type, the later one in
    /// name order wins.
    pub fn scan(dir: &Path) -> Result<Self> {
        let mut library = Self::default();
        if !dir.is_dir() {
            log::warn!("Model directory {} does not exist", dir.display());
            return Ok(library);
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("glb")))
            .collect();
        paths.sort();

        for path in paths {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let filename = path.file_name().and_then(|s| s.to_str()).unwrap_or(stem).to_string();
            library.insert(ModelInfo {
                product_type: infer_product_type(stem),
                name: stem.to_string(),
                filename,
                path: path.clone(),
            });
        }

        if library.models.is_empty() {
            log::warn!("No .glb models found in {}", dir.display());
        } else {
            log::info!("Loaded {} garment models from {}", library.models.len(), dir.display());
        }
        Ok(library)
    }

    pub fn insert(&mut self, info: ModelInfo) {
        self.models.insert(info.product_type.clone(), info);
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl AssetResolver for ModelLibrary {
    fn resolve(&self, model_type: &str) -> Result<String> {
        self.models
            .get(model_type)
            .map(|m| m.path.to_string_lossy().into_owned())
            .ok_or_else(|| CustomizerError::ModelNotFound(model_type.to_string()))
    }

    fn available(&self) -> Vec<ModelInfo> {
        self.models.values().cloned().collect()
    }
}

/// Sticker images stored in the uploads directory and referenced by their
/// public URL (`/uploads/<file>`) or bare file name.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

/// URL prefix uploaded files are served under.
pub const UPLOAD_URL_PREFIX: &str = "/uploads/";

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Public URL of a stored file.
    pub fn url_for(&self, filename: &str) -> String {
        format!("{}{}", UPLOAD_URL_PREFIX, filename)
    }

    /// Disk path for an asset reference. Only single file names inside the
    /// uploads directory resolve; anything with a path separator or `..`
    /// is rejected.
    pub fn path_for(&self, asset: &str) -> Option<PathBuf> {
        let name = asset.strip_prefix(UPLOAD_URL_PREFIX).unwrap_or(asset);
        let name = name.split(['?', '#']).next().unwrap_or(name);
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return None;
        }
        Some(self.dir.join(name))
    }
}

impl AssetSource for UploadStore {
    fn load_image(&self, asset: &str) -> Result<RgbaImage> {
        let path = self.path_for(asset).ok_or_else(|| CustomizerError::AssetLoad {
            asset: asset.to_string(),
            reason: "not an uploaded file".to_string(),
        })?;
        let img = image::open(&path).map_err(|e| CustomizerError::AssetLoad {
            asset: asset.to_string(),
            reason: e.to_string(),
        })?;
        Ok(img.to_rgba8())
    }
}

/// Fonts loaded from configured files, cached after first use.
pub struct FontStore {
    files: HashMap<String, PathBuf>,
    default_font: Option<PathBuf>,
    cache: Mutex<HashMap<PathBuf, FontArc>>,
}

impl FontStore {
    pub fn new(files: HashMap<String, PathBuf>, default_font: Option<PathBuf>) -> Self {
        Self { files, default_font, cache: Mutex::new(HashMap::new()) }
    }

    fn path_for(&self, family: &str) -> Option<&PathBuf> {
        self.files
            .get(family)
            .or_else(|| self.files.iter().find(|(name, _)| name.eq_ignore_ascii_case(family)).map(|(_, p)| p))
            .or(self.default_font.as_ref())
    }
}

impl FontSource for FontStore {
    fn load_font(&self, family: &str) -> Result<FontArc> {
        let path = self.path_for(family).ok_or_else(|| CustomizerError::AssetLoad {
            asset: family.to_string(),
            reason: "no font configured for this family and no default font".to_string(),
        })?;

        if let Ok(cache) = self.cache.lock() {
            if let Some(font) = cache.get(path) {
                return Ok(font.clone());
            }
        }

        let bytes = std::fs::read(path).map_err(|e| CustomizerError::AssetLoad {
            asset: family.to_string(),
            reason: format!("{}: {}", path.display(), e),
        })?;
        let font = FontArc::try_from_vec(bytes).map_err(|e| CustomizerError::AssetLoad {
            asset: family.to_string(),
            reason: e.to_string(),
        })?;
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(path.clone(), font.clone());
        }
        Ok(font)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_infer_product_type() {
        assert_eq!(infer_product_type("TShirt_Final"), "tshirt");
        assert_eq!(infer_product_type("grey-sweatshirt"), "hoodie");
        assert_eq!(infer_product_type("coffee_mug"), "mug");
        assert_eq!(infer_product_type("baseball-cap"), "cap");
        assert_eq!(infer_product_type("Tote Bag 2"), "totebag2");
    }

    #[test]
    fn test_scan_and_resolve() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tshirt.glb"), b"glTF").unwrap();
        std::fs::write(dir.path().join("Hoodie.GLB"), b"glTF").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let library = ModelLibrary::scan(dir.path()).unwrap();
        assert_eq!(library.len(), 2);
        assert!(library.resolve("tshirt").unwrap().ends_with("tshirt.glb"));
        assert!(library.resolve("hoodie").is_ok());
        assert!(matches!(library.resolve("mug"), Err(CustomizerError::ModelNotFound(t)) if t == "mug"));

        let types: Vec<String> = library.available().into_iter().map(|m| m.product_type).collect();
        assert_eq!(types, vec!["hoodie".to_string(), "tshirt".to_string()]);
    }

    #[test]
    fn test_scan_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let library = ModelLibrary::scan(&dir.path().join("missing")).unwrap();
        assert!(library.is_empty());
    }

    #[test]
    fn test_upload_store_paths() {
        let store = UploadStore::new("/srv/uploads");
        assert_eq!(store.path_for("/uploads/a.png"), Some(PathBuf::from("/srv/uploads/a.png")));
        assert_eq!(store.path_for("a.png?v=2"), Some(PathBuf::from("/srv/uploads/a.png")));
        assert_eq!(store.path_for("/uploads/../secret"), None);
        assert_eq!(store.path_for(".."), None);
        assert_eq!(store.url_for("a.png"), "/uploads/a.png");
    }

    #[test]
    fn test_upload_store_loads_image() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::from_pixel(3, 2, Rgba([9, 8, 7, 255])).save(dir.path().join("s.png")).unwrap();
        let store = UploadStore::new(dir.path());

        let img = store.load_image("/uploads/s.png").unwrap();
        assert_eq!(img.dimensions(), (3, 2));
        assert!(matches!(store.load_image("/uploads/missing.png"), Err(CustomizerError::AssetLoad { .. })));
    }

    #[test]
    fn test_font_store_without_fonts_fails() {
        let store = FontStore::new(HashMap::new(), None);
        assert!(matches!(store.load_font("Arial"), Err(CustomizerError::AssetLoad { .. })));

        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("bogus.ttf");
        std::fs::write(&bogus, b"not a font").unwrap();
        let store = FontStore::new(HashMap::new(), Some(bogus));
        assert!(store.load_font("Arial").is_err());
    }
}
