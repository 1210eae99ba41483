#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

mod app;
mod aspect;
mod config;
mod cropper;
mod error;
mod export;
mod prefs;
mod preview;
mod selection;
mod viewport;

use std::path::PathBuf;

use clap::Parser;
use eframe::egui;

use crate::app::ImageTrimmer;
use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(version, about = "Crop images to a free or fixed aspect ratio")]
struct Args {
    /// Image to open on startup.
    image: Option<PathBuf>,

    /// JSON file overriding the default settings.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> eframe::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => AppConfig::load(path).unwrap_or_else(|e| {
            log::warn!("Ignoring config {}: {}", path.display(), e);
            AppConfig::default()
        }),
        None => AppConfig::default(),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_drag_and_drop(true),
        ..Default::default()
    };
    eframe::run_native(
        "Image Trimmer",
        options,
        Box::new(move |cc| Ok(Box::new(ImageTrimmer::new(cc, &config, args.image.as_deref())))),
    )
}
