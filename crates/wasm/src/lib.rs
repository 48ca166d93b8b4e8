//! WebAssembly host for the external render module.
//!
//! The module is opaque: the host only knows that it exports a `render`
//! function returning an offset into its `memory` export, where one RGBA frame
//! is waiting.
//!
//! # Invariants
//! - The `render` signature is checked against the configured call contract
//!   once, at load time.
//! - Frames are bounds-checked against current memory before being read.

mod contract;
mod inspect;
mod module;

pub use contract::{CallArg, Field, ParamKind, fields};
pub use inspect::{ExportInfo, ModuleSummary, inspect};
pub use module::{LoadError, LoadOptions, MEMORY_EXPORT, RENDER_EXPORT, WasmModule};
