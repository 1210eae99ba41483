use eframe::egui;

use crate::config::AppConfig;

/// Gap kept between the canvas border and the image at 100 % zoom.
pub const PADDING: f32 = 20.0;

/// Display transform of the image on the canvas. Only affects what is drawn;
/// the crop selection lives in image space.
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    zoom: f32,
    pan: egui::Vec2,
    min_zoom: f32,
    max_zoom: f32,
    step: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.1, 3.0, 0.1)
    }
}

impl Viewport {
    pub fn new(min_zoom: f32, max_zoom: f32, step: f32) -> Self {
        Self {
            zoom: 1.0_f32.clamp(min_zoom, max_zoom),
            pan: egui::Vec2::ZERO,
            min_zoom,
            max_zoom,
            step,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.min_zoom, config.max_zoom, config.zoom_step)
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        // Round to the step grid so repeated +/- does not drift.
        let snapped = (zoom / self.step).round() * self.step;
        self.zoom = snapped.clamp(self.min_zoom, self.max_zoom);
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + self.step);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - self.step);
    }

    pub fn can_zoom_in(&self) -> bool {
        self.zoom < self.max_zoom
    }

    pub fn can_zoom_out(&self) -> bool {
        self.zoom > self.min_zoom
    }

    /// Zoom as a whole percentage for the toolbar label.
    pub fn percent(&self) -> i32 {
        (self.zoom * 100.0).round() as i32
    }

    pub fn pan_by(&mut self, delta: egui::Vec2) {
        self.pan += delta;
    }

    pub fn reset(&mut self) {
        self.zoom = 1.0_f32.clamp(self.min_zoom, self.max_zoom);
        self.pan = egui::Vec2::ZERO;
    }

    /// Screen rect of the image inside `canvas`: fitted with padding, scaled
    /// by zoom around the canvas centre, then shifted by the pan offset.
    pub fn layout(&self, canvas: egui::Rect, image_size: egui::Vec2) -> egui::Rect {
        if image_size.x <= 0.0 || image_size.y <= 0.0 {
            return egui::Rect::from_center_size(canvas.center(), egui::Vec2::ZERO);
        }
        let max_size = (canvas.size() - egui::vec2(PADDING * 2.0, PADDING * 2.0)).max(egui::Vec2::ZERO);
        let fit = (max_size.x / image_size.x).min(max_size.y / image_size.y);
        let display_size = image_size * fit * self.zoom;
        egui::Rect::from_center_size(canvas.center() + self.pan, display_size)
    }
}
