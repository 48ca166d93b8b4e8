//! Input mapping: keyboard characters and clicks become host actions.
//!
//! # Invariants
//! - The session consumes actions, never raw window events.
//! - Each key maps to exactly one action; unmapped keys map to `Action::Noop`.

pub mod action;
pub mod keymap;

pub use action::Action;
pub use keymap::KeyMap;
