use cubehost_common::{Pointer, SurfaceSize};

/// Placement of the fixed-size frame inside a resizable window.
///
/// The frame keeps its aspect ratio and is centred; the leftover bands stay
/// at the clear colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    surface: SurfaceSize,
    window_width: u32,
    window_height: u32,
}

impl Viewport {
    pub fn new(surface: SurfaceSize, window_width: u32, window_height: u32) -> Self {
        Self {
            surface,
            window_width,
            window_height,
        }
    }

    pub fn resize(&mut self, window_width: u32, window_height: u32) {
        self.window_width = window_width;
        self.window_height = window_height;
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    /// Fraction of clip space the frame covers on each axis.
    pub fn scale(&self) -> [f32; 2] {
        if self.window_width == 0 || self.window_height == 0 || self.surface.height == 0 {
            return [1.0, 1.0];
        }
        let frame_aspect = self.surface.width as f32 / self.surface.height as f32;
        let window_aspect = self.window_width as f32 / self.window_height as f32;
        if window_aspect > frame_aspect {
            [frame_aspect / window_aspect, 1.0]
        } else {
            [1.0, window_aspect / frame_aspect]
        }
    }

    /// Map a window position in physical pixels to surface coordinates.
    ///
    /// Returns `None` for positions in the letterbox bands.
    pub fn to_surface(&self, x: f64, y: f64) -> Option<Pointer> {
        let [sx, sy] = self.scale();
        let shown_w = self.window_width as f64 * sx as f64;
        let shown_h = self.window_height as f64 * sy as f64;
        if shown_w <= 0.0 || shown_h <= 0.0 {
            return None;
        }
        let left = (self.window_width as f64 - shown_w) / 2.0;
        let top = (self.window_height as f64 - shown_h) / 2.0;
        let u = (x - left) / shown_w * self.surface.width as f64;
        let v = (y - top) / shown_h * self.surface.height as f64;
        let pointer = Pointer {
            x: u as f32,
            y: v as f32,
        };
        self.surface
            .contains(pointer.x, pointer.y)
            .then_some(pointer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> SurfaceSize {
        SurfaceSize::new(800, 600)
    }

    #[test]
    fn matching_window_fills_clip_space() {
        let vp = Viewport::new(surface(), 800, 600);
        assert_eq!(vp.scale(), [1.0, 1.0]);
        assert_eq!(vp.to_surface(400.0, 300.0), Some(Pointer { x: 400.0, y: 300.0 }));
    }

    #[test]
    fn wide_window_pillarboxes() {
        let vp = Viewport::new(surface(), 1600, 600);
        let [sx, sy] = vp.scale();
        assert!((sx - 0.5).abs() < 1e-6);
        assert_eq!(sy, 1.0);
        // Frame occupies x in [400, 1200).
        assert_eq!(vp.to_surface(100.0, 300.0), None);
        assert_eq!(vp.to_surface(400.0, 0.0), Some(Pointer { x: 0.0, y: 0.0 }));
        assert_eq!(vp.to_surface(800.0, 300.0), Some(Pointer { x: 400.0, y: 300.0 }));
    }

    #[test]
    fn tall_window_letterboxes() {
        let mut vp = Viewport::new(surface(), 800, 600);
        vp.resize(400, 600);
        let [sx, sy] = vp.scale();
        assert_eq!(sx, 1.0);
        assert!((sy - 0.5).abs() < 1e-6);
        // Frame occupies y in [150, 450), at half scale.
        assert_eq!(vp.to_surface(200.0, 100.0), None);
        assert_eq!(vp.to_surface(200.0, 300.0), Some(Pointer { x: 400.0, y: 300.0 }));
    }

    #[test]
    fn minimised_window_maps_nothing() {
        let vp = Viewport::new(surface(), 0, 0);
        assert_eq!(vp.scale(), [1.0, 1.0]);
        assert_eq!(vp.to_surface(0.0, 0.0), None);
    }
}
