//! Shared types for the cube host.
//!
//! # Invariants
//! - The selection sub-index never leaves `0..=26`.
//! - A `FrameRequest` is a plain snapshot; it owns no module state.

pub mod config;
pub mod types;

pub use config::{ConfigError, ContractKind, HostConfig};
pub use types::{
    CUBES_PER_FACE, FaceLayout, FrameRequest, InputCode, MAX_ANGLE_PERCENT, MAX_SUB_INDEX,
    MAX_SURFACE_DIMENSION, NEUTRAL_MODE, POINTER_SENTINEL, Pointer, Selection, SurfaceSize,
};
