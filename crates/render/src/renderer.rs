use crate::frame::{Frame, RenderError};
use cubehost_common::{FrameRequest, SurfaceSize};

/// Anything that turns a frame request into an RGBA frame.
///
/// The module owns the pixel memory; the returned frame borrows it until the
/// next call.
pub trait RenderModule {
    /// Size of the frames this module produces.
    fn surface(&self) -> SurfaceSize;

    /// Render one frame for the given request.
    fn render(&mut self, request: &FrameRequest) -> Result<Frame<'_>, RenderError>;
}

/// In-process module that fills the surface with one request-derived colour.
///
/// Red tracks the rotation percentage, green the selection, blue the frame
/// counter. Every request is recorded for inspection.
#[derive(Debug)]
pub struct SolidFillModule {
    size: SurfaceSize,
    buffer: Vec<u8>,
    requests: Vec<FrameRequest>,
}

impl SolidFillModule {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            buffer: vec![0; size.byte_len()],
            requests: Vec::new(),
        }
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> &[FrameRequest] {
        &self.requests
    }

    pub fn last_request(&self) -> Option<&FrameRequest> {
        self.requests.last()
    }

    /// Colour written for a request.
    pub fn colour_for(request: &FrameRequest) -> [u8; 4] {
        let r = (request.angle_percent as u32 * 255 / 100) as u8;
        let g = request.selection.clamp(0, 255) as u8;
        let b = (request.frame % 256) as u8;
        [r, g, b, 255]
    }
}

impl RenderModule for SolidFillModule {
    fn surface(&self) -> SurfaceSize {
        self.size
    }

    fn render(&mut self, request: &FrameRequest) -> Result<Frame<'_>, RenderError> {
        let colour = Self::colour_for(request);
        for px in self.buffer.chunks_exact_mut(4) {
            px.copy_from_slice(&colour);
        }
        self.requests.push(*request);
        tracing::trace!(frame = request.frame, "solid fill rendered");
        Frame::new(self.size, &self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_fill_records_requests() {
        let mut module = SolidFillModule::new(SurfaceSize::new(4, 3));
        let req = FrameRequest {
            frame: 5,
            selection: 30,
            angle_percent: 100,
            ..FrameRequest::default()
        };
        let frame = module.render(&req).unwrap();
        assert_eq!(frame.pixels().len(), 4 * 3 * 4);
        assert_eq!(frame.pixel(3, 2), Some([255, 30, 5, 255]));
        assert_eq!(module.requests().len(), 1);
        assert_eq!(module.last_request(), Some(&req));
    }

    #[test]
    fn solid_fill_reports_surface() {
        let module = SolidFillModule::new(SurfaceSize::default());
        assert_eq!(module.surface(), SurfaceSize::new(800, 600));
    }
}
