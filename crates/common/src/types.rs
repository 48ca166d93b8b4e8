use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Number of sub-elements addressable on one face.
pub const CUBES_PER_FACE: u8 = 27;

/// Highest valid sub-index within a face.
pub const MAX_SUB_INDEX: u8 = CUBES_PER_FACE - 1;

/// Value passed for each pointer coordinate when no click is pending.
pub const POINTER_SENTINEL: f32 = -1.0;

/// Neutral value of the auxiliary mode field.
pub const NEUTRAL_MODE: i32 = -1;

/// Upper bound of the rotation percentage.
pub const MAX_ANGLE_PERCENT: u8 = 100;

/// Largest surface side a frame texture may have on a GPU meeting the
/// default wgpu limits.
pub const MAX_SURFACE_DIMENSION: u32 = 8192;

/// Fixed-size drawing surface the module renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Length of one RGBA frame in bytes.
    pub fn byte_len(self) -> usize {
        self.pixel_count() * 4
    }

    /// Whether a surface-local coordinate lies on the surface.
    pub fn contains(self, x: f32, y: f32) -> bool {
        x >= 0.0 && y >= 0.0 && x < self.width as f32 && y < self.height as f32
    }
}

impl Default for SurfaceSize {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

/// One-shot code identifying which orientation key produced the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(i32)]
pub enum InputCode {
    #[default]
    Neutral = 0,
    /// `w`: A increases.
    PitchUp = 1,
    /// `a`: B decreases.
    YawLeft = 2,
    /// `s`: A decreases.
    PitchDown = 3,
    /// `d`: B increases.
    YawRight = 4,
    /// `j`: C increases.
    RollForward = 5,
    /// `k`: C decreases.
    RollBack = 6,
}

impl InputCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Unit direction this code moves the orientation accumulators in.
    pub fn direction(self) -> Vec3 {
        match self {
            Self::Neutral => Vec3::ZERO,
            Self::PitchUp => Vec3::X,
            Self::YawLeft => Vec3::NEG_Y,
            Self::PitchDown => Vec3::NEG_X,
            Self::YawRight => Vec3::Y,
            Self::RollForward => Vec3::Z,
            Self::RollBack => Vec3::NEG_Z,
        }
    }
}

/// How many faces the module lays out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaceLayout {
    #[default]
    Seven,
    /// Historical layout with an extra detached face.
    Eight,
}

impl FaceLayout {
    pub fn face_count(self) -> u8 {
        match self {
            Self::Seven => 7,
            Self::Eight => 8,
        }
    }
}

impl std::str::FromStr for FaceLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "seven" | "7" => Ok(Self::Seven),
            "eight" | "8" => Ok(Self::Eight),
            other => Err(format!("unknown face layout `{other}` (expected 7 or 8)")),
        }
    }
}

/// Face plus sub-element selection. The sub-index saturates at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    face: u8,
    sub_index: u8,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn face(&self) -> u8 {
        self.face
    }

    pub fn sub_index(&self) -> u8 {
        self.sub_index
    }

    /// Move the sub-index by `delta`, clamped to `0..=MAX_SUB_INDEX`.
    pub fn step(&mut self, delta: i32) {
        let next = (self.sub_index as i32).saturating_add(delta);
        self.sub_index = next.clamp(0, MAX_SUB_INDEX as i32) as u8;
    }

    /// Select a face and reset the sub-index.
    pub fn select_face(&mut self, face: u8) {
        self.face = face;
        self.sub_index = 0;
    }

    /// `face * 27 + sub_index`, as passed to the module.
    pub fn composite(&self) -> i32 {
        self.face as i32 * CUBES_PER_FACE as i32 + self.sub_index as i32
    }
}

/// Surface-local click position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pointer {
    pub x: f32,
    pub y: f32,
}

/// Everything the module receives for one frame.
///
/// Field order here is documentation only; the wire order is decided by the
/// call contract that flattens this record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameRequest {
    /// Frame counter (`dt`), incremented after every render.
    pub frame: u64,
    /// Orientation key that triggered this frame, or neutral.
    pub input: InputCode,
    /// Orientation accumulators: x = A, y = B, z = C.
    pub orientation: Vec3,
    /// Click pending for this frame only.
    pub pointer: Option<Pointer>,
    /// Composite selection index.
    pub selection: i32,
    /// Set for the single frame following a completed rotation sweep.
    pub rotate: bool,
    /// Rotation progress in percent.
    pub angle_percent: u8,
    /// Auxiliary mode, `NEUTRAL_MODE` unless set for this frame.
    pub mode: i32,
}

impl FrameRequest {
    /// Pointer coordinates with the sentinel substituted when no click is pending.
    pub fn pointer_coords(&self) -> (f32, f32) {
        match self.pointer {
            Some(p) => (p.x, p.y),
            None => (POINTER_SENTINEL, POINTER_SENTINEL),
        }
    }
}

impl Default for FrameRequest {
    fn default() -> Self {
        Self {
            frame: 0,
            input: InputCode::Neutral,
            orientation: Vec3::ZERO,
            pointer: None,
            selection: 0,
            rotate: false,
            angle_percent: 0,
            mode: NEUTRAL_MODE,
        }
    }
}
