use cubehost_common::SurfaceSize;

/// Errors from producing or reading a frame.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(
        "frame at offset {offset} ({len} bytes) exceeds module memory of {memory_len} bytes"
    )]
    OutOfBounds {
        offset: u32,
        len: usize,
        memory_len: usize,
    },
    #[error("frame buffer holds {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("module call failed")]
    Call(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("module returned {0}, expected an i32 memory offset")]
    BadReturn(String),
}

/// Read-only RGBA view of one rendered frame.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    size: SurfaceSize,
    pixels: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Wrap a buffer that must be exactly one frame long.
    pub fn new(size: SurfaceSize, pixels: &'a [u8]) -> Result<Self, RenderError> {
        if pixels.len() != size.byte_len() {
            return Err(RenderError::SizeMismatch {
                expected: size.byte_len(),
                actual: pixels.len(),
            });
        }
        Ok(Self { size, pixels })
    }

    /// View one frame inside a module's linear memory at `offset`.
    pub fn from_memory(
        memory: &'a [u8],
        offset: u32,
        size: SurfaceSize,
    ) -> Result<Self, RenderError> {
        let len = size.byte_len();
        let start = offset as usize;
        let out_of_bounds = || RenderError::OutOfBounds {
            offset,
            len,
            memory_len: memory.len(),
        };
        let end = start.checked_add(len).ok_or_else(out_of_bounds)?;
        let pixels = memory.get(start..end).ok_or_else(out_of_bounds)?;
        Ok(Self { size, pixels })
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    /// Raw RGBA bytes, row-major, no padding.
    pub fn pixels(&self) -> &'a [u8] {
        self.pixels
    }

    /// RGBA value at a pixel, or `None` off the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let i = (y as usize * self.size.width as usize + x as usize) * 4;
        let p = &self.pixels[i..i + 4];
        Some([p[0], p[1], p[2], p[3]])
    }
}
