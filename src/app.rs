use std::path::Path;

use eframe::egui;

use crate::aspect::{PRESETS, ratio_matches};
use crate::config::AppConfig;
use crate::cropper::{CropEvent, Cropper};
use crate::prefs::Preferences;
use crate::preview::Preview;
use crate::selection::CropRegion;

const LAST_CROP_SIZE: egui::Vec2 = egui::vec2(240.0, 240.0);

/// Most recent crop, kept beside the cropper after the dialog closes.
struct LastCrop {
    region: CropRegion,
    preview: Preview,
}

/// Top-level window: aspect ratio controls around the cropper.
pub struct ImageTrimmer {
    prefs: Preferences,
    /// Preferences as last written to storage.
    saved_prefs: Preferences,
    aspect_ratio: Option<f32>,
    cropper: Cropper,
    last_crop: Option<LastCrop>,
    status: Option<String>,
}

impl ImageTrimmer {
    pub fn new(cc: &eframe::CreationContext<'_>, config: &AppConfig, image: Option<&Path>) -> Self {
        let prefs = Preferences::load(cc.storage, config);
        let mut this = Self::with_prefs(config, prefs);
        if let Some(path) = image {
            if let Err(e) = this.cropper.load_path(&cc.egui_ctx, path) {
                log::warn!("Failed to open {}: {}", path.display(), e);
            }
        }
        this
    }

    /// Restore a custom ratio typed in an earlier session, otherwise start free.
    pub fn with_prefs(config: &AppConfig, prefs: Preferences) -> Self {
        let aspect_ratio = prefs.custom_ratio().ratio();
        Self {
            saved_prefs: prefs.clone(),
            prefs,
            aspect_ratio,
            cropper: Cropper::new(config),
            last_crop: None,
            status: None,
        }
    }

    fn record_crop(&mut self, ctx: &egui::Context, event: CropEvent) {
        let CropEvent::Completed { region, image } = event;
        self.last_crop = Some(LastCrop {
            region,
            preview: Preview::new(ctx, image),
        });
        self.status = None;
    }

    /// Write preferences as soon as they differ from what storage holds,
    /// instead of waiting for eframe's periodic save.
    fn persist_prefs(&mut self, storage: &mut dyn eframe::Storage) -> bool {
        if self.prefs == self.saved_prefs {
            return false;
        }
        self.prefs.store(storage);
        storage.flush();
        self.saved_prefs = self.prefs.clone();
        true
    }

    fn last_crop_panel(&mut self, ui: &mut egui::Ui) {
        let Some(last) = &mut self.last_crop else {
            return;
        };
        ui.heading("Preview");
        last.preview.image_ui(ui, LAST_CROP_SIZE);
        ui.label(format!("Format: {}", self.prefs.output_format));
        if ui.button("Download").clicked() {
            match last.preview.download(&self.prefs) {
                Ok(Some(path)) => self.status = Some(format!("Saved {}", path.display())),
                Ok(None) => {}
                Err(e) => {
                    log::error!("Download failed: {}", e);
                    self.status = Some(format!("Download failed: {}", e));
                }
            }
        }
    }

    pub fn aspect_ratio(&self) -> Option<f32> {
        self.aspect_ratio
    }

    pub fn select_preset(&mut self, ratio: Option<f32>) {
        self.aspect_ratio = ratio;
    }

    pub fn set_custom_width(&mut self, text: String) {
        self.prefs.custom_width = text;
        self.apply_custom_ratio();
    }

    pub fn set_custom_height(&mut self, text: String) {
        self.prefs.custom_height = text;
        self.apply_custom_ratio();
    }

    // An incomplete pair keeps whatever ratio was active.
    fn apply_custom_ratio(&mut self) {
        if let Some(ratio) = self.prefs.custom_ratio().ratio() {
            self.aspect_ratio = Some(ratio);
        }
    }

    fn aspect_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            ui.label("Aspect Ratio:");
            for (label, ratio) in PRESETS {
                let selected = ratio_matches(self.aspect_ratio, *ratio);
                if ui.selectable_label(selected, *label).clicked() {
                    self.select_preset(*ratio);
                }
            }

            ui.separator();

            let mut width = self.prefs.custom_width.clone();
            if ui
                .add(
                    egui::TextEdit::singleline(&mut width)
                        .hint_text("Width")
                        .desired_width(56.0),
                )
                .changed()
            {
                self.set_custom_width(width);
            }
            ui.label(":");
            let mut height = self.prefs.custom_height.clone();
            if ui
                .add(
                    egui::TextEdit::singleline(&mut height)
                        .hint_text("Height")
                        .desired_width(56.0),
                )
                .changed()
            {
                self.set_custom_height(height);
            }
        });
    }

    fn status_line(&self) -> String {
        if let Some(status) = self.status.as_deref().or(self.cropper.status()) {
            return status.to_owned();
        }
        match &self.last_crop {
            Some(LastCrop { region, .. }) => format!(
                "Last crop: {} × {} px at ({}, {})",
                region.width, region.height, region.x, region.y
            ),
            None => self
                .cropper
                .file_name()
                .map(str::to_owned)
                .unwrap_or_default(),
        }
    }
}

impl eframe::App for ImageTrimmer {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        self.prefs.store(storage);
    }

    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        let modal_open = self.cropper.is_preview_open();

        egui::TopBottomPanel::top("aspect_panel").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.heading("Image Trimmer");
            ui.add_enabled_ui(!modal_open, |ui| self.aspect_controls(ui));
            ui.add_space(4.0);
        });

        egui::TopBottomPanel::bottom("status_panel").show(ctx, |ui| {
            ui.label(self.status_line());
        });

        if self.last_crop.is_some() {
            egui::SidePanel::right("last_crop_panel")
                .resizable(false)
                .show(ctx, |ui| {
                    ui.add_enabled_ui(!modal_open, |ui| self.last_crop_panel(ui));
                });
        }

        let event = egui::CentralPanel::default()
            .show(ctx, |ui| {
                let ratio = self.aspect_ratio;
                self.cropper.show(ui, ratio, &mut self.prefs)
            })
            .inner;
        if let Some(event) = event {
            self.record_crop(ctx, event);
            ctx.request_repaint();
        }

        if let Some(storage) = frame.storage_mut() {
            self.persist_prefs(storage);
        }
    }
}
