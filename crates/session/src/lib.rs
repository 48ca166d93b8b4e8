//! Session: the single owner of all input accumulators.
//!
//! # Invariants
//! - All state mutations flow through `Session::apply` and the render step.
//! - One-shot fields are neutral after every render.
//! - At most one rotation sweep runs at a time; input is rejected while it runs.

pub mod session;
pub mod sweep;

pub use session::{Outcome, Session, SessionConfig};
pub use sweep::{RotationSweep, SweepState, SweepStep};
