//! wgpu presenter for module frames.
//!
//! Each frame returned by the render module is copied into a texture and
//! drawn as a letterboxed quad, so the window can be resized without
//! stretching the image.
//!
//! # Invariants
//! - The presenter never calls the render module; it only shows what it is given.
//! - Window coordinates map back to surface coordinates through the same
//!   viewport used for drawing.

mod gpu;
mod shaders;
mod viewport;

pub use gpu::BlitRenderer;
pub use viewport::Viewport;
