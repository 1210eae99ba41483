use std::path::Path;

use eframe::egui;
use image::DynamicImage;

use crate::aspect::{normalized_aspect, ratio_matches};
use crate::config::AppConfig;
use crate::error::Result;
use crate::prefs::Preferences;
use crate::preview::{Preview, PreviewAction, to_color_image};
use crate::selection::{CropRegion, CropSelection, ResizeHandle, hit_test};
use crate::viewport::Viewport;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "webp"];

/// What the pointer is doing between drag start and drag stop.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Drag {
    Pan,
    Handle(ResizeHandle),
    /// Drawing a fresh selection from this normalised point.
    Select(egui::Pos2),
}

/// Raised towards the shell after a successful crop.
#[derive(Clone, Debug)]
pub enum CropEvent {
    Completed {
        region: CropRegion,
        image: DynamicImage,
    },
}

pub struct Cropper {
    image: Option<DynamicImage>,
    texture: Option<egui::TextureHandle>,
    file_name: Option<String>,
    selection: CropSelection,
    drag: Option<Drag>,
    viewport: Viewport,
    ratio: Option<f32>,
    preview: Option<Preview>,
    status: Option<String>,
}

impl Cropper {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            image: None,
            texture: None,
            file_name: None,
            selection: CropSelection::full(),
            drag: None,
            viewport: Viewport::from_config(config),
            ratio: None,
            preview: None,
            status: None,
        }
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn is_preview_open(&self) -> bool {
        self.preview.is_some()
    }

    pub fn load_path(&mut self, ctx: &egui::Context, path: &Path) -> Result<()> {
        let image = image::open(path)?;
        log::info!(
            "Loaded {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        self.file_name = path.file_name().map(|n| n.to_string_lossy().into_owned());
        self.set_image(ctx, image);
        Ok(())
    }

    pub fn set_image(&mut self, ctx: &egui::Context, image: DynamicImage) {
        self.texture = Some(ctx.load_texture("image", to_color_image(&image), egui::TextureOptions::LINEAR));
        self.image = Some(image);
        self.selection = CropSelection::full();
        self.drag = None;
        self.preview = None;
        self.status = None;
        self.viewport.reset();
        self.fit_selection();
    }

    fn open_path(&mut self, ctx: &egui::Context, path: &Path) {
        if let Err(e) = self.load_path(ctx, path) {
            log::warn!("Failed to open {}: {}", path.display(), e);
            self.status = Some(format!("Could not open {}: {}", path.display(), e));
        }
    }

    fn open_dialog(&mut self, ctx: &egui::Context) {
        // Cancelling the dialog leaves everything as it was.
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Image", IMAGE_EXTENSIONS)
            .pick_file()
        {
            self.open_path(ctx, &path);
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.first().and_then(|f| f.path.clone()));
        if let Some(path) = dropped {
            self.open_path(ctx, &path);
        }
    }

    /// Follow the shell's aspect ratio, refitting the selection when it changes.
    pub fn set_ratio(&mut self, ratio: Option<f32>) {
        if ratio_matches(self.ratio, ratio) {
            return;
        }
        self.ratio = ratio;
        self.fit_selection();
    }

    fn fit_selection(&mut self) {
        if let (Some(image), Some(ratio)) = (&self.image, self.ratio) {
            let norm = normalized_aspect(ratio, image.width() as f32, image.height() as f32);
            self.selection.fit_aspect(norm);
        }
    }

    /// Copy the selected pixels at the image's native resolution.
    pub fn crop(&self) -> Option<Result<(CropRegion, DynamicImage)>> {
        let image = self.image.as_ref()?;
        Some(
            self.selection
                .pixel_region(image.width(), image.height())
                .map(|r| (r, image.crop_imm(r.x, r.y, r.width, r.height))),
        )
    }

    fn crop_to_preview(&mut self, ctx: &egui::Context) -> Option<CropEvent> {
        match self.crop()? {
            Ok((region, cropped)) => {
                log::info!(
                    "Cropped {}x{} at ({}, {})",
                    region.width,
                    region.height,
                    region.x,
                    region.y
                );
                self.preview = Some(Preview::new(ctx, cropped.clone()));
                Some(CropEvent::Completed {
                    region,
                    image: cropped,
                })
            }
            Err(e) => {
                log::error!("Crop failed: {}", e);
                self.status = Some(format!("Crop failed: {}", e));
                None
            }
        }
    }

    fn download(&mut self, prefs: &Preferences) {
        let Some(preview) = &mut self.preview else {
            return;
        };
        match preview.download(prefs) {
            Ok(Some(path)) => self.status = Some(format!("Saved {}", path.display())),
            Ok(None) => {}
            Err(e) => {
                log::error!("Download failed: {}", e);
                self.status = Some(format!("Download failed: {}", e));
            }
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui, ratio: Option<f32>, prefs: &mut Preferences) -> Option<CropEvent> {
        let ctx = ui.ctx().clone();
        self.set_ratio(ratio);

        let mut event = None;
        let modal_open = self.preview.is_some();

        if !modal_open {
            self.handle_dropped_files(&ctx);
        }

        ui.add_enabled_ui(!modal_open, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Open Image…").clicked() {
                    self.open_dialog(&ctx);
                }
                if let Some(name) = &self.file_name {
                    ui.label(name.as_str());
                }

                if self.image.is_some() {
                    ui.separator();
                    if ui
                        .add_enabled(self.viewport.can_zoom_out(), egui::Button::new("-"))
                        .clicked()
                    {
                        self.viewport.zoom_out();
                    }
                    ui.label(format!("{}%", self.viewport.percent()));
                    if ui
                        .add_enabled(self.viewport.can_zoom_in(), egui::Button::new("+"))
                        .clicked()
                    {
                        self.viewport.zoom_in();
                    }
                    if ui.button("Reset View").clicked() {
                        self.viewport.reset();
                    }
                    ui.separator();
                    if ui.button("Crop Image").clicked() {
                        event = self.crop_to_preview(&ctx);
                    }
                }
            });
        });

        ui.separator();

        if self.texture.is_some() {
            self.canvas(ui, !modal_open);
        } else {
            ui.centered_and_justified(|ui| {
                ui.label("Open an image or drop one here");
            });
        }

        let action = match &mut self.preview {
            Some(preview) => preview.show(&ctx, prefs),
            None => PreviewAction::None,
        };
        match action {
            PreviewAction::None => {}
            PreviewAction::Close => self.preview = None,
            PreviewAction::Download => self.download(prefs),
        }

        event
    }

    fn canvas(&mut self, ui: &mut egui::Ui, interactive: bool) {
        let Some(texture) = &self.texture else {
            return;
        };
        let (canvas, response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::drag());
        let painter = ui.painter_at(canvas);

        let image_rect = self.viewport.layout(canvas, texture.size_vec2());
        painter.image(
            texture.id(),
            image_rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );

        if interactive {
            self.handle_pointer(ui, &response, image_rect);
        }

        paint_selection(&painter, image_rect, self.selection.to_screen(image_rect));
    }

    fn begin_drag(&self, press: egui::Pos2, space_held: bool, image_rect: egui::Rect) -> Option<Drag> {
        if space_held {
            return Some(Drag::Pan);
        }
        match hit_test(press, self.selection.to_screen(image_rect)) {
            Some(handle) => Some(Drag::Handle(handle)),
            None if image_rect.contains(press) => {
                let origin = (press - image_rect.min) / image_rect.size();
                Some(Drag::Select(origin.to_pos2()))
            }
            None => None,
        }
    }

    fn handle_pointer(&mut self, ui: &egui::Ui, response: &egui::Response, image_rect: egui::Rect) {
        let space_held = ui.input(|i| i.key_down(egui::Key::Space)) && !ui.ctx().wants_keyboard_input();
        let display_size = image_rect.size();
        let to_norm = |pos: egui::Pos2| ((pos - image_rect.min) / display_size).to_pos2();

        if response.drag_started() {
            // The drag only starts past egui's threshold; begin where the button went down.
            let press = ui
                .input(|i| i.pointer.press_origin())
                .or_else(|| response.interact_pointer_pos());
            self.drag = press.and_then(|pos| self.begin_drag(pos, space_held, image_rect));
        }

        if response.dragged() {
            match self.drag {
                Some(Drag::Pan) => self.viewport.pan_by(response.drag_delta()),
                Some(Drag::Handle(handle)) => {
                    self.selection
                        .drag(handle, response.drag_delta(), display_size, self.ratio);
                }
                Some(Drag::Select(origin)) => {
                    if let Some(pos) = response.interact_pointer_pos() {
                        let norm_aspect = self.ratio.map(|r| normalized_aspect(r, display_size.x, display_size.y));
                        self.selection = CropSelection::spanning(origin, to_norm(pos), norm_aspect);
                    }
                }
                None => {}
            }
        }

        if response.drag_stopped() {
            self.drag = None;
        }

        let cursor = match self.drag {
            Some(Drag::Pan) => Some(egui::CursorIcon::Grabbing),
            _ if space_held && response.hovered() => Some(egui::CursorIcon::Grab),
            Some(Drag::Handle(ResizeHandle::Center)) => Some(egui::CursorIcon::Move),
            Some(Drag::Select(_)) => Some(egui::CursorIcon::Crosshair),
            _ => None,
        };
        if let Some(cursor) = cursor {
            ui.ctx().set_cursor_icon(cursor);
        }
    }
}

fn paint_selection(painter: &egui::Painter, image_rect: egui::Rect, crop: egui::Rect) {
    // Dim the area outside the crop.
    let overlay_color = egui::Color32::from_black_alpha(150);
    let bands = [
        egui::Rect::from_min_max(image_rect.min, egui::pos2(image_rect.max.x, crop.min.y)),
        egui::Rect::from_min_max(egui::pos2(image_rect.min.x, crop.max.y), image_rect.max),
        egui::Rect::from_min_max(
            egui::pos2(image_rect.min.x, crop.min.y),
            egui::pos2(crop.min.x, crop.max.y),
        ),
        egui::Rect::from_min_max(
            egui::pos2(crop.max.x, crop.min.y),
            egui::pos2(image_rect.max.x, crop.max.y),
        ),
    ];
    for band in bands {
        painter.rect_filled(band, 0.0, overlay_color);
    }

    painter.rect_stroke(crop, 0.0, egui::Stroke::new(1.0, egui::Color32::WHITE));

    let handle_radius = 6.0;
    let handle_stroke = egui::Stroke::new(1.0, egui::Color32::BLACK);
    let handle_fill = egui::Color32::WHITE;

    let handles = [
        crop.min,
        crop.max,
        egui::pos2(crop.min.x, crop.max.y),
        egui::pos2(crop.max.x, crop.min.y),
        crop.center_top(),
        crop.center_bottom(),
        crop.left_center(),
        crop.right_center(),
    ];
    for pos in handles {
        painter.circle(pos, handle_radius, handle_fill, handle_stroke);
    }
}
