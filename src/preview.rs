use std::path::PathBuf;

use eframe::egui;
use image::DynamicImage;

use crate::error::{Error, Result};
use crate::export::{self, OutputFormat, Quality};
use crate::prefs::Preferences;

const MAX_PREVIEW_SIZE: egui::Vec2 = egui::vec2(480.0, 360.0);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreviewAction {
    None,
    Close,
    Download,
}

struct Encoded {
    format: OutputFormat,
    quality: Quality,
    result: Result<Vec<u8>>,
}

/// Modal showing the cropped raster with output settings.
pub struct Preview {
    image: DynamicImage,
    texture: egui::TextureHandle,
    encoded: Option<Encoded>,
}

pub fn to_color_image(image: &DynamicImage) -> egui::ColorImage {
    let size = [image.width() as _, image.height() as _];
    let image_buffer = image.to_rgba8();
    let pixels = image_buffer.as_flat_samples();
    egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice())
}

/// Size that fits `size` inside `bounds` without upscaling.
fn fit_within(size: egui::Vec2, bounds: egui::Vec2) -> egui::Vec2 {
    if size.x <= 0.0 || size.y <= 0.0 {
        return egui::Vec2::ZERO;
    }
    let scale = (bounds.x / size.x).min(bounds.y / size.y).min(1.0);
    size * scale
}

impl Preview {
    pub fn new(ctx: &egui::Context, image: DynamicImage) -> Self {
        let texture = ctx.load_texture("preview", to_color_image(&image), egui::TextureOptions::LINEAR);
        Self {
            image,
            texture,
            encoded: None,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    /// Draw the cropped image scaled down to fit `bounds`.
    pub fn image_ui(&self, ui: &mut egui::Ui, bounds: egui::Vec2) {
        let size = fit_within(self.texture.size_vec2(), bounds);
        ui.add(egui::Image::new((self.texture.id(), size)));
        ui.label(format!("{} × {} px", self.image.width(), self.image.height()));
    }

    /// Ask for a destination and write the encoded file there.
    /// `Ok(None)` means the dialog was cancelled.
    pub fn download(&mut self, prefs: &Preferences) -> Result<Option<PathBuf>> {
        let format = prefs.output_format;
        let bytes = match self.encoded(format, prefs.quality) {
            Ok(bytes) => bytes,
            Err(e) => return Err(Error::Encode(e.to_string())),
        };
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(format.default_file_name())
            .add_filter(format.to_string(), &[format.extension()])
            .save_file()
        else {
            return Ok(None);
        };
        export::save(bytes, &path)?;
        log::info!("Saved {} ({})", path.display(), format.mime_type());
        Ok(Some(path))
    }

    /// Encoded file for the given settings, re-encoding only when they change.
    pub fn encoded(&mut self, format: OutputFormat, quality: Quality) -> &Result<Vec<u8>> {
        let stale = !matches!(
            &self.encoded,
            Some(e) if e.format == format && (!format.is_lossy() || e.quality == quality)
        );
        if stale {
            self.encoded = None;
        }
        let image = &self.image;
        let encoded = self.encoded.get_or_insert_with(|| {
            let result = export::encode(image, format, quality);
            if let Err(e) = &result {
                log::error!("Failed to encode preview as {}: {}", format, e);
            }
            Encoded {
                format,
                quality,
                result,
            }
        });
        &encoded.result
    }

    pub fn show(&mut self, ctx: &egui::Context, prefs: &mut Preferences) -> PreviewAction {
        let mut action = PreviewAction::None;

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            return PreviewAction::Close;
        }

        // Dim everything behind the dialog.
        let backdrop = egui::LayerId::new(egui::Order::PanelResizeLine, egui::Id::new("preview_backdrop"));
        ctx.layer_painter(backdrop)
            .rect_filled(ctx.screen_rect(), 0.0, egui::Color32::from_black_alpha(128));

        let mut open = true;
        egui::Window::new("Preview")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .open(&mut open)
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| self.image_ui(ui, MAX_PREVIEW_SIZE));

                ui.separator();

                ui.horizontal(|ui| {
                    ui.label("Format:");
                    egui::ComboBox::from_id_salt("preview_format")
                        .selected_text(prefs.output_format.to_string())
                        .show_ui(ui, |ui| {
                            for format in OutputFormat::ALL {
                                ui.selectable_value(&mut prefs.output_format, format, format.to_string());
                            }
                        });
                });

                ui.horizontal(|ui| {
                    let mut quality = prefs.quality.get();
                    let slider = egui::Slider::new(&mut quality, Quality::MIN..=Quality::MAX)
                        .step_by(0.01)
                        .text("Quality");
                    let response = ui.add_enabled(prefs.output_format.is_lossy(), slider);
                    if response.changed() {
                        prefs.quality = Quality::new(quality);
                    }
                });

                let size_label = match self.encoded(prefs.output_format, prefs.quality) {
                    Ok(bytes) => format!("File size: {}", export::format_size(bytes.len())),
                    Err(e) => format!("Encoding failed: {}", e),
                };
                ui.label(size_label);

                ui.add_space(8.0);
                ui.vertical_centered(|ui| {
                    if ui.button("Download").clicked() {
                        action = PreviewAction::Download;
                    }
                });
            });

        if !open {
            action = PreviewAction::Close;
        }
        action
    }
}
