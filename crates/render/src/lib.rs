//! Rendering interface between the session and a pixel-producing module.
//!
//! # Invariants
//! - A `Frame` always covers exactly width × height × 4 bytes.
//! - Frames borrow module memory; they are consumed before the next call.
//!
//! `SolidFillModule` implements the interface without an external binary so
//! the session and hosts can run headless in tests and dry runs.

mod frame;
mod renderer;

pub use frame::{Frame, RenderError};
pub use renderer::{RenderModule, SolidFillModule};
