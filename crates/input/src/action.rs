use cubehost_common::{InputCode, Pointer};

/// A logical action produced by a key press or click.
///
/// Window backends and the headless CLI both translate their events into
/// actions, so the session logic is shared between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Move the orientation accumulators one step and tag the frame.
    Orient(InputCode),
    /// Move the selection sub-index by a signed delta.
    StepSelection(i32),
    /// Select a face (zero-based) and reset the sub-index.
    SelectFace(u8),
    /// Start a rotation sweep.
    Rotate,
    /// Adjust the rotation percentage by a signed delta.
    NudgeAngle(i8),
    /// Surface-local click, visible to the module for one frame.
    Click(Pointer),
    /// Unmapped input. Still produces a frame.
    Noop,
}
