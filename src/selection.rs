use eframe::egui;

use crate::error::{Error, Result};

/// Pointer tolerance around edges and corners, in screen points.
const HIT_TOLERANCE: f32 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ResizeHandle {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Top,
    Bottom,
    Left,
    Right,
    Center, // Moving
}

/// Crop region in image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// The crop selection in normalised image coordinates (0.0-1.0), so it is
/// independent of zoom, pan and window size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropSelection {
    rect: egui::Rect,
}

impl Default for CropSelection {
    fn default() -> Self {
        Self::full()
    }
}

impl CropSelection {
    pub fn full() -> Self {
        Self {
            rect: egui::Rect::from_min_max(egui::Pos2::ZERO, egui::pos2(1.0, 1.0)),
        }
    }

    pub fn from_rect(rect: egui::Rect) -> Self {
        let mut selection = Self { rect };
        selection.clamp();
        selection
    }

    /// Selection dragged out from `origin` to `corner` on the bare image.
    /// With an aspect the height follows the width (or vice versa, whichever
    /// is larger) and the result shrinks to stay inside the image.
    pub fn spanning(origin: egui::Pos2, corner: egui::Pos2, norm_aspect: Option<f32>) -> Self {
        let origin = origin.clamp(egui::Pos2::ZERO, egui::pos2(1.0, 1.0));
        let corner = corner.clamp(egui::Pos2::ZERO, egui::pos2(1.0, 1.0));
        let Some(norm_aspect) = norm_aspect.filter(|a| a.is_finite() && *a > 0.0) else {
            return Self::from_rect(egui::Rect::from_two_pos(origin, corner));
        };

        let sign = egui::vec2(
            if corner.x >= origin.x { 1.0 } else { -1.0 },
            if corner.y >= origin.y { 1.0 } else { -1.0 },
        );
        let w = (corner.x - origin.x).abs().max((corner.y - origin.y).abs() * norm_aspect);
        let mut dim = egui::vec2(w, w / norm_aspect);

        let room_x = if sign.x > 0.0 { 1.0 - origin.x } else { origin.x };
        let room_y = if sign.y > 0.0 { 1.0 - origin.y } else { origin.y };
        if dim.x > room_x {
            dim *= room_x / dim.x;
        }
        if dim.y > room_y {
            dim *= room_y / dim.y;
        }

        let far = origin + egui::vec2(dim.x * sign.x, dim.y * sign.y);
        Self::from_rect(egui::Rect::from_two_pos(origin, far))
    }

    pub fn to_screen(&self, image_rect: egui::Rect) -> egui::Rect {
        egui::Rect::from_min_max(
            image_rect.lerp_inside(self.rect.min.to_vec2()),
            image_rect.lerp_inside(self.rect.max.to_vec2()),
        )
    }

    /// Refit the selection to `norm_aspect` (see [`crate::aspect::normalized_aspect`])
    /// around its current centre, keeping the larger side and staying in bounds.
    pub fn fit_aspect(&mut self, norm_aspect: f32) {
        if !(norm_aspect.is_finite() && norm_aspect > 0.0) {
            return;
        }
        let center = self.rect.center();
        let max_dim = self.rect.width().max(self.rect.height());

        let (mut new_w, mut new_h) = if norm_aspect >= 1.0 {
            (max_dim, max_dim / norm_aspect)
        } else {
            (max_dim * norm_aspect, max_dim)
        };

        if new_w > 1.0 {
            new_w = 1.0;
            new_h = new_w / norm_aspect;
        }
        if new_h > 1.0 {
            new_h = 1.0;
            new_w = new_h * norm_aspect;
        }

        self.rect = egui::Rect::from_center_size(center, egui::vec2(new_w, new_h));

        self.slide_inside();
        self.clamp();
    }

    // Translate back into [0,1]² before clamping so the shape survives.
    fn slide_inside(&mut self) {
        let rect = &mut self.rect;
        if rect.min.x < 0.0 {
            *rect = rect.translate(egui::vec2(-rect.min.x, 0.0));
        }
        if rect.min.y < 0.0 {
            *rect = rect.translate(egui::vec2(0.0, -rect.min.y));
        }
        if rect.max.x > 1.0 {
            *rect = rect.translate(egui::vec2(1.0 - rect.max.x, 0.0));
        }
        if rect.max.y > 1.0 {
            *rect = rect.translate(egui::vec2(0.0, 1.0 - rect.max.y));
        }
    }

    /// Apply a pointer drag of `delta` screen points on `handle`.
    ///
    /// `display_size` is the on-screen size of the whole image and `ratio`
    /// the active width/height constraint, if any.
    pub fn drag(
        &mut self,
        handle: ResizeHandle,
        delta: egui::Vec2,
        display_size: egui::Vec2,
        ratio: Option<f32>,
    ) {
        if display_size.x <= 0.0 || display_size.y <= 0.0 {
            return;
        }
        let delta_norm = delta / display_size;

        match (handle, ratio) {
            (ResizeHandle::Center, _) => self.translate_within(delta_norm),
            (_, Some(ratio)) => {
                let norm_aspect = ratio * (display_size.y / display_size.x);
                self.constrained_resize(handle, delta_norm, display_size, ratio, norm_aspect);
            }
            (_, None) => self.free_resize(handle, delta_norm),
        }

        self.clamp();
    }

    fn translate_within(&mut self, delta_norm: egui::Vec2) {
        let rect = &self.rect;
        let mut delta = delta_norm;
        if rect.min.x + delta.x < 0.0 {
            delta.x = -rect.min.x;
        }
        if rect.max.x + delta.x > 1.0 {
            delta.x = 1.0 - rect.max.x;
        }
        if rect.min.y + delta.y < 0.0 {
            delta.y = -rect.min.y;
        }
        if rect.max.y + delta.y > 1.0 {
            delta.y = 1.0 - rect.max.y;
        }
        self.rect = self.rect.translate(delta);
    }

    fn free_resize(&mut self, handle: ResizeHandle, delta_norm: egui::Vec2) {
        let rect = &mut self.rect;
        match handle {
            ResizeHandle::TopLeft => rect.min += delta_norm,
            ResizeHandle::TopRight => {
                rect.min.y += delta_norm.y;
                rect.max.x += delta_norm.x;
            }
            ResizeHandle::BottomLeft => {
                rect.min.x += delta_norm.x;
                rect.max.y += delta_norm.y;
            }
            ResizeHandle::BottomRight => rect.max += delta_norm,
            ResizeHandle::Top => rect.min.y += delta_norm.y,
            ResizeHandle::Bottom => rect.max.y += delta_norm.y,
            ResizeHandle::Left => rect.min.x += delta_norm.x,
            ResizeHandle::Right => rect.max.x += delta_norm.x,
            ResizeHandle::Center => {}
        }
    }

    fn constrained_resize(
        &mut self,
        handle: ResizeHandle,
        delta_norm: egui::Vec2,
        display_size: egui::Vec2,
        ratio: f32,
        norm_aspect: f32,
    ) {
        let rect = &mut self.rect;
        match handle {
            ResizeHandle::TopLeft
            | ResizeHandle::TopRight
            | ResizeHandle::BottomLeft
            | ResizeHandle::BottomRight => {
                // Anchor is the opposite corner; sign says which way the rect grows.
                let (anchor, corner, sign) = match handle {
                    ResizeHandle::TopLeft => (rect.max, rect.min, egui::vec2(-1.0, -1.0)),
                    ResizeHandle::TopRight => (
                        egui::pos2(rect.min.x, rect.max.y),
                        egui::pos2(rect.max.x, rect.min.y),
                        egui::vec2(1.0, -1.0),
                    ),
                    ResizeHandle::BottomLeft => (
                        egui::pos2(rect.max.x, rect.min.y),
                        egui::pos2(rect.min.x, rect.max.y),
                        egui::vec2(-1.0, 1.0),
                    ),
                    _ => (rect.min, rect.max, egui::vec2(1.0, 1.0)),
                };
                let corner = corner + delta_norm;

                let raw_screen = egui::vec2(
                    (corner.x - anchor.x).abs() * display_size.x,
                    (corner.y - anchor.y).abs() * display_size.y,
                );

                // Project the dragged size onto the ratio direction (ratio, 1).
                let u = egui::vec2(ratio, 1.0);
                let lambda = raw_screen.dot(u) / u.length_sq();
                let constrained = u * lambda.max(0.0);
                let mut dim = constrained / display_size;

                // Shrink uniformly rather than clamp so the ratio holds at the edges.
                let room_x = if sign.x > 0.0 { 1.0 - anchor.x } else { anchor.x };
                let room_y = if sign.y > 0.0 { 1.0 - anchor.y } else { anchor.y };
                let mut scale: f32 = 1.0;
                if dim.x > room_x {
                    scale = scale.min(room_x / dim.x);
                }
                if dim.y > room_y {
                    scale = scale.min(room_y / dim.y);
                }
                dim *= scale;

                let far = anchor + egui::vec2(dim.x * sign.x, dim.y * sign.y);
                *rect = egui::Rect::from_two_pos(anchor, far);
            }
            // Edge drags keep the opposite edge fixed and centre the other axis.
            ResizeHandle::Left | ResizeHandle::Right => {
                let left = handle == ResizeHandle::Left;
                let anchor_x = if left { rect.max.x } else { rect.min.x };
                let room = if left { anchor_x } else { 1.0 - anchor_x };
                let dragged = if left {
                    rect.width() - delta_norm.x
                } else {
                    rect.width() + delta_norm.x
                };
                let mut new_w = dragged.clamp(0.0, room);
                let mut new_h = new_w / norm_aspect;
                if new_h > 1.0 {
                    new_h = 1.0;
                    new_w = new_h * norm_aspect;
                }
                let min_x = if left { anchor_x - new_w } else { anchor_x };
                let center_y = rect.center().y;
                *rect = egui::Rect::from_min_size(
                    egui::pos2(min_x, center_y - new_h * 0.5),
                    egui::vec2(new_w, new_h),
                );
                self.slide_inside();
            }
            ResizeHandle::Top | ResizeHandle::Bottom => {
                let top = handle == ResizeHandle::Top;
                let anchor_y = if top { rect.max.y } else { rect.min.y };
                let room = if top { anchor_y } else { 1.0 - anchor_y };
                let dragged = if top {
                    rect.height() - delta_norm.y
                } else {
                    rect.height() + delta_norm.y
                };
                let mut new_h = dragged.clamp(0.0, room);
                let mut new_w = new_h * norm_aspect;
                if new_w > 1.0 {
                    new_w = 1.0;
                    new_h = new_w / norm_aspect;
                }
                let min_y = if top { anchor_y - new_h } else { anchor_y };
                let center_x = rect.center().x;
                *rect = egui::Rect::from_min_size(
                    egui::pos2(center_x - new_w * 0.5, min_y),
                    egui::vec2(new_w, new_h),
                );
                self.slide_inside();
            }
            ResizeHandle::Center => {}
        }
    }

    fn clamp(&mut self) {
        let rect = &mut self.rect;
        if rect.min.x > rect.max.x {
            std::mem::swap(&mut rect.min.x, &mut rect.max.x);
        }
        if rect.min.y > rect.max.y {
            std::mem::swap(&mut rect.min.y, &mut rect.max.y);
        }
        rect.min = rect.min.clamp(egui::Pos2::ZERO, egui::pos2(1.0, 1.0));
        rect.max = rect.max.clamp(egui::Pos2::ZERO, egui::pos2(1.0, 1.0));
    }

    /// Pixel rectangle of the selection on an image of the given size,
    /// at least one pixel and always inside the image.
    pub fn pixel_region(&self, width: u32, height: u32) -> Result<CropRegion> {
        if width == 0 || height == 0 {
            return Err(Error::EmptySelection);
        }
        let w = width as f32;
        let h = height as f32;

        let x = ((self.rect.min.x * w).round().max(0.0) as u32).min(width - 1);
        let y = ((self.rect.min.y * h).round().max(0.0) as u32).min(height - 1);
        let region_w = ((self.rect.width() * w).round().max(1.0) as u32).min(width - x);
        let region_h = ((self.rect.height() * h).round().max(1.0) as u32).min(height - y);

        Ok(CropRegion {
            x,
            y,
            width: region_w,
            height: region_h,
        })
    }
}

pub fn hit_test(pos: egui::Pos2, rect: egui::Rect) -> Option<ResizeHandle> {
    let min = rect.min;
    let max = rect.max;

    if pos.distance(min) < HIT_TOLERANCE {
        return Some(ResizeHandle::TopLeft);
    }
    if pos.distance(egui::pos2(max.x, min.y)) < HIT_TOLERANCE {
        return Some(ResizeHandle::TopRight);
    }
    if pos.distance(egui::pos2(min.x, max.y)) < HIT_TOLERANCE {
        return Some(ResizeHandle::BottomLeft);
    }
    if pos.distance(max) < HIT_TOLERANCE {
        return Some(ResizeHandle::BottomRight);
    }

    let within_y = pos.y > min.y && pos.y < max.y;
    let within_x = pos.x > min.x && pos.x < max.x;
    if (pos.x - min.x).abs() < HIT_TOLERANCE && within_y {
        return Some(ResizeHandle::Left);
    }
    if (pos.x - max.x).abs() < HIT_TOLERANCE && within_y {
        return Some(ResizeHandle::Right);
    }
    if (pos.y - min.y).abs() < HIT_TOLERANCE && within_x {
        return Some(ResizeHandle::Top);
    }
    if (pos.y - max.y).abs() < HIT_TOLERANCE && within_x {
        return Some(ResizeHandle::Bottom);
    }

    if rect.contains(pos) {
        return Some(ResizeHandle::Center);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(min: (f32, f32), max: (f32, f32)) -> egui::Rect {
        egui::Rect::from_min_max(egui::pos2(min.0, min.1), egui::pos2(max.0, max.1))
    }

    fn norm(sel: &CropSelection) -> egui::Rect {
        sel.to_screen(rect((0.0, 0.0), (1.0, 1.0)))
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn fit_aspect_keeps_major_side_and_centre() {
        let mut sel = CropSelection::from_rect(rect((0.25, 0.25), (0.75, 0.75)));
        sel.fit_aspect(2.0);
        let r = norm(&sel);
        assert!(approx(r.width(), 0.5));
        assert!(approx(r.height(), 0.25));
        assert!(approx(r.center().x, 0.5));
        assert!(approx(r.center().y, 0.5));
    }

    #[test]
    fn fit_aspect_shrinks_full_selection_into_bounds() {
        let mut sel = CropSelection::full();
        sel.fit_aspect(0.5);
        let r = norm(&sel);
        assert!(approx(r.width(), 0.5));
        assert!(approx(r.height(), 1.0));
        assert!(r.min.x >= 0.0 && r.max.x <= 1.0);
    }

    #[test]
    fn fit_aspect_slides_back_inside() {
        let mut sel = CropSelection::from_rect(rect((0.6, 0.0), (1.0, 0.2)));
        sel.fit_aspect(0.5);
        let r = norm(&sel);
        assert!(approx(r.height(), 0.4));
        assert!(approx(r.width(), 0.2));
        assert!(r.min.y >= 0.0);
        assert!(r.max.x <= 1.0);
    }

    #[test]
    fn fit_aspect_ignores_invalid_ratio() {
        let mut sel = CropSelection::full();
        sel.fit_aspect(f32::NAN);
        sel.fit_aspect(0.0);
        assert_eq!(sel, CropSelection::full());
    }

    #[test]
    fn free_corner_drag_moves_one_corner() {
        let mut sel = CropSelection::full();
        sel.drag(
            ResizeHandle::BottomRight,
            egui::vec2(-50.0, -20.0),
            egui::vec2(100.0, 100.0),
            None,
        );
        let r = norm(&sel);
        assert!(approx(r.max.x, 0.5));
        assert!(approx(r.max.y, 0.8));
        assert_eq!(r.min, egui::Pos2::ZERO);
    }

    #[test]
    fn move_is_stopped_at_the_border() {
        let mut sel = CropSelection::from_rect(rect((0.1, 0.1), (0.5, 0.5)));
        sel.drag(
            ResizeHandle::Center,
            egui::vec2(-100.0, 30.0),
            egui::vec2(100.0, 100.0),
            None,
        );
        let r = norm(&sel);
        assert!(approx(r.min.x, 0.0));
        assert!(approx(r.width(), 0.4));
        assert!(approx(r.min.y, 0.4));
    }

    #[test]
    fn crossing_handles_never_inverts_rect() {
        let mut sel = CropSelection::from_rect(rect((0.4, 0.4), (0.6, 0.6)));
        sel.drag(
            ResizeHandle::Left,
            egui::vec2(50.0, 0.0),
            egui::vec2(100.0, 100.0),
            None,
        );
        let r = norm(&sel);
        assert!(r.min.x <= r.max.x);
        assert!(approx(r.min.x, 0.6));
        assert!(approx(r.max.x, 0.9));
    }

    #[test]
    fn constrained_corner_drag_keeps_ratio() {
        let display = egui::vec2(200.0, 100.0);
        let mut sel = CropSelection::from_rect(rect((0.0, 0.0), (0.25, 0.5)));
        sel.drag(ResizeHandle::BottomRight, egui::vec2(30.0, 5.0), display, Some(1.0));
        let r = norm(&sel);
        let screen_w = r.width() * display.x;
        let screen_h = r.height() * display.y;
        assert!(approx(screen_w / screen_h, 1.0));
        assert_eq!(r.min, egui::Pos2::ZERO);
    }

    #[test]
    fn constrained_corner_drag_stops_at_border_with_ratio() {
        let display = egui::vec2(100.0, 100.0);
        let mut sel = CropSelection::from_rect(rect((0.5, 0.5), (0.7, 0.7)));
        sel.drag(ResizeHandle::BottomRight, egui::vec2(200.0, 100.0), display, Some(2.0));
        let r = norm(&sel);
        assert!(r.max.x <= 1.0 && r.max.y <= 1.0);
        assert!(approx(r.width() / r.height(), 2.0));
        assert!(approx(r.max.x, 1.0));
    }

    #[test]
    fn constrained_edge_drag_recentres_other_axis() {
        let display = egui::vec2(100.0, 100.0);
        let mut sel = CropSelection::from_rect(rect((0.2, 0.2), (0.6, 0.6)));
        sel.drag(ResizeHandle::Right, egui::vec2(20.0, 0.0), display, Some(1.0));
        let r = norm(&sel);
        assert!(approx(r.width(), 0.6));
        assert!(approx(r.height(), 0.6));
        assert!(approx(r.center().y, 0.4));
    }

    #[test]
    fn constrained_edge_drag_stops_at_border_with_ratio() {
        let display = egui::vec2(100.0, 100.0);
        let mut sel = CropSelection::from_rect(rect((0.2, 0.2), (0.6, 0.6)));
        sel.drag(ResizeHandle::Right, egui::vec2(60.0, 0.0), display, Some(1.0));
        let r = norm(&sel);
        assert!(approx(r.min.x, 0.2));
        assert!(approx(r.max.x, 1.0));
        assert!(approx(r.width() / r.height(), 1.0));
        assert!(r.min.y >= 0.0 && r.max.y <= 1.0);
    }

    #[test]
    fn constrained_top_drag_limited_by_room_above() {
        let display = egui::vec2(100.0, 100.0);
        let mut sel = CropSelection::from_rect(rect((0.4, 0.1), (0.6, 0.3)));
        sel.drag(ResizeHandle::Top, egui::vec2(0.0, -50.0), display, Some(1.0));
        let r = norm(&sel);
        assert!(approx(r.min.y, 0.0));
        assert!(approx(r.max.y, 0.3));
        assert!(approx(r.width(), 0.3));
        assert!(approx(r.center().x, 0.5));
    }

    #[test]
    fn constrained_edge_drag_slides_centred_axis_inside() {
        let display = egui::vec2(100.0, 100.0);
        let mut sel = CropSelection::from_rect(rect((0.7, 0.3), (0.9, 0.5)));
        sel.drag(ResizeHandle::Bottom, egui::vec2(0.0, 30.0), display, Some(1.0));
        let r = norm(&sel);
        assert!(approx(r.height(), 0.5));
        assert!(approx(r.width(), 0.5));
        assert!(approx(r.max.x, 1.0));
        assert!(approx(r.min.y, 0.3));
    }

    #[test]
    fn constrained_edge_drag_on_wide_display_keeps_screen_ratio() {
        let display = egui::vec2(200.0, 100.0);
        let mut sel = CropSelection::from_rect(rect((0.1, 0.1), (0.3, 0.5)));
        sel.drag(ResizeHandle::Right, egui::vec2(300.0, 0.0), display, Some(16.0 / 9.0));
        let r = norm(&sel);
        let screen_ratio = (r.width() * display.x) / (r.height() * display.y);
        assert!(approx(screen_ratio, 16.0 / 9.0));
        assert!(r.max.x <= 1.0 && r.max.y <= 1.0 && r.min.y >= 0.0);
    }

    #[test]
    fn spanning_free_selection_in_any_direction() {
        let sel = CropSelection::spanning(egui::pos2(0.6, 0.7), egui::pos2(0.2, 0.1), None);
        assert_eq!(norm(&sel), rect((0.2, 0.1), (0.6, 0.7)));
    }

    #[test]
    fn spanning_with_aspect_fits_inside_image() {
        let sel = CropSelection::spanning(egui::pos2(0.5, 0.5), egui::pos2(0.9, 0.6), Some(0.5));
        let r = norm(&sel);
        // Width 0.4 would need height 0.8; only 0.5 fits below the origin.
        assert!(approx(r.height(), 0.5));
        assert!(approx(r.width(), 0.25));
        assert_eq!(r.min, egui::pos2(0.5, 0.5));
    }

    #[test]
    fn hit_test_prefers_corners_then_edges() {
        let r = rect((100.0, 100.0), (200.0, 200.0));
        assert_eq!(hit_test(egui::pos2(102.0, 101.0), r), Some(ResizeHandle::TopLeft));
        assert_eq!(hit_test(egui::pos2(199.0, 198.0), r), Some(ResizeHandle::BottomRight));
        assert_eq!(hit_test(egui::pos2(150.0, 105.0), r), Some(ResizeHandle::Top));
        assert_eq!(hit_test(egui::pos2(195.0, 150.0), r), Some(ResizeHandle::Right));
        assert_eq!(hit_test(egui::pos2(150.0, 150.0), r), Some(ResizeHandle::Center));
        assert_eq!(hit_test(egui::pos2(20.0, 20.0), r), None);
    }

    #[test]
    fn pixel_region_covers_whole_image() {
        let region = CropSelection::full().pixel_region(640, 480).unwrap();
        assert_eq!(
            region,
            CropRegion {
                x: 0,
                y: 0,
                width: 640,
                height: 480
            }
        );
    }

    #[test]
    fn pixel_region_is_at_least_one_pixel_inside_image() {
        let sel = CropSelection::from_rect(rect((1.0, 1.0), (1.0, 1.0)));
        let region = sel.pixel_region(10, 10).unwrap();
        assert_eq!(region.x, 9);
        assert_eq!(region.y, 9);
        assert_eq!(region.width, 1);
        assert_eq!(region.height, 1);
    }

    #[test]
    fn pixel_region_rejects_empty_image() {
        assert!(matches!(
            CropSelection::full().pixel_region(0, 10),
            Err(Error::EmptySelection)
        ));
    }
}
