// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Stickerwear - garment customizer backend.
//!
//! By default runs the HTTP API and the real-time channel. With `--project`
//! it renders a saved project file to a texture and exits; with `--replay`
//! it redraws a texture from a stored layer log.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stickerwear::config::Settings;
use stickerwear::io::assets::{FontStore, UploadStore};
use stickerwear::io::serialization::{export_layers, import_layers, import_project, LayerLog};
use stickerwear::render::compositor::Compositor;
use stickerwear::server::{http, realtime};
use stickerwear::session::Session;
use stickerwear::util::geometry::{validate_profile, Mapper};

#[derive(Parser, Debug)]
#[command(name = "stickerwear", about = "Garment customizer backend")]
struct Args {
    /// Settings file (YAML). Defaults are used when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// HTTP bind address, overriding the settings and PORT.
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,

    /// Real-time channel bind address.
    #[arg(long, value_name = "ADDR")]
    realtime_bind: Option<String>,

    /// Render this project file (JSON or YAML) instead of serving.
    #[arg(short, long, value_name = "FILE", conflicts_with = "replay")]
    project: Option<PathBuf>,

    /// Redraw a texture from a `.layers.json` log instead of serving.
    #[arg(long, value_name = "FILE")]
    replay: Option<PathBuf>,

    /// Output PNG for offline rendering.
    #[arg(short, long, value_name = "FILE", default_value = "texture.png")]
    output: PathBuf,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,
}

fn offline_compositor(settings: &Settings) -> Compositor {
    let uploads = UploadStore::new(settings.paths.uploads.clone());
    let fonts = FontStore::new(settings.fonts.families.clone(), settings.fonts.default_font.clone());
    Compositor::new(Arc::new(uploads), Arc::new(fonts), settings.compositor.clone())
}

fn render_project(settings: &Settings, args: &Args, path: &Path) -> Result<()> {
    let project = import_project(path).with_context(|| format!("Failed to read project {}", path.display()))?;
    let texture = settings.canvas.texture;
    let width = args.width.unwrap_or(texture.width as u32);
    let height = args.height.unwrap_or(texture.height as u32);

    let garment = settings.garment(&project.model_type);
    let mapper = Mapper::new(&garment.mapping, settings.canvas.editor);
    let composite = offline_compositor(settings).compose(&project, &mapper, width, height)?;

    composite
        .image
        .save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    let log_path = args.output.with_extension("layers.json");
    export_layers(&LayerLog { width, height, layers: composite.layers }, &log_path)?;
    log::info!("Wrote {} and {}", args.output.display(), log_path.display());
    Ok(())
}

fn replay_layers(settings: &Settings, args: &Args, path: &Path) -> Result<()> {
    let log = import_layers(path).with_context(|| format!("Failed to read layer log {}", path.display()))?;
    let composite = offline_compositor(settings).recreate_from_layers(&log.layers, log.width, log.height)?;
    composite
        .image
        .save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    log::info!("Replayed {} layers into {}", composite.layers.len(), args.output.display());
    Ok(())
}

fn serve(settings: Settings) -> Result<()> {
    let http_bind = settings.server.bind.clone();
    let realtime_bind = settings.server.realtime_bind.clone();
    let workers = settings.server.workers;

    let session = Arc::new(Session::from_settings(settings).context("Failed to prepare session")?);
    log::info!("{} garment models available", session.list_models().len());

    let _realtime = realtime::spawn(Arc::clone(&session), &realtime_bind).context("Failed to start real-time channel")?;
    let handles = http::spawn(session, &http_bind, workers).context("Failed to start HTTP API")?;
    for handle in handles {
        if handle.join().is_err() {
            log::error!("HTTP worker panicked");
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())
        .with_context(|| format!("Failed to load settings from {:?}", args.config))?;
    settings.apply_env();
    if let Some(bind) = &args.bind {
        settings.server.bind = bind.clone();
    }
    if let Some(bind) = &args.realtime_bind {
        settings.server.realtime_bind = bind.clone();
    }

    let texture = settings.canvas.texture;
    for warning in validate_profile(&settings.mapping, texture) {
        log::warn!("Default mapping: {}", warning);
    }
    for (name, garment) in &settings.garments {
        for warning in validate_profile(&garment.mapping, texture) {
            log::warn!("Garment '{}': {}", name, warning);
        }
    }

    match (&args.project, &args.replay) {
        (Some(path), _) => render_project(&settings, &args, path),
        (_, Some(path)) => replay_layers(&settings, &args, path),
        _ => serve(settings),
    }
}
