use cubehost_common::MAX_ANGLE_PERCENT;

/// Percentages visited by one rotation sweep: 1, 1 + jump, ... up to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationSweep {
    next: u8,
    jump: u8,
}

impl RotationSweep {
    pub fn new(jump: u8) -> Self {
        Self {
            next: 1,
            jump: jump.max(1),
        }
    }
}

impl Iterator for RotationSweep {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.next > MAX_ANGLE_PERCENT {
            return None;
        }
        let current = self.next;
        self.next = current.saturating_add(self.jump);
        Some(current)
    }
}

/// Re-entrancy guard for the sweep. `Idle -> Rotating` on a rotate action,
/// `Rotating -> Idle` once the step sequence is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepState {
    #[default]
    Idle,
    Rotating(RotationSweep),
}

/// Result of advancing the sweep by one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepStep {
    /// No sweep in progress.
    Idle,
    /// The percentage was set; render a frame, then yield.
    Step(u8),
    /// The sweep ended and the rotation trigger is set; render once more.
    Finished,
}
