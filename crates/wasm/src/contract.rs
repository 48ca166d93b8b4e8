//! Call contracts: how a `FrameRequest` is laid out as positional arguments.

use cubehost_common::{ContractKind, FrameRequest};
use wasmtime::{Val, ValType};

/// One positional argument slot of the `render` export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Frame,
    Input,
    OrientationA,
    OrientationB,
    OrientationC,
    PointerX,
    PointerY,
    Selection,
    Rotate,
    AnglePercent,
    Mode,
}

const CANONICAL: [Field; 11] = [
    Field::Frame,
    Field::Input,
    Field::OrientationA,
    Field::OrientationB,
    Field::OrientationC,
    Field::PointerX,
    Field::PointerY,
    Field::Selection,
    Field::Rotate,
    Field::AnglePercent,
    Field::Mode,
];

const LEGACY: [Field; 6] = [
    Field::Input,
    Field::OrientationA,
    Field::OrientationB,
    Field::OrientationC,
    Field::PointerX,
    Field::PointerY,
];

/// Argument order for a contract.
pub fn fields(kind: ContractKind) -> &'static [Field] {
    match kind {
        ContractKind::Canonical => &CANONICAL,
        ContractKind::Legacy => &LEGACY,
    }
}

/// A request value before it is narrowed to the parameter's wasm type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CallArg {
    Int(i64),
    Float(f64),
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Self::Frame => "dt",
            Self::Input => "input",
            Self::OrientationA => "a",
            Self::OrientationB => "b",
            Self::OrientationC => "c",
            Self::PointerX => "x",
            Self::PointerY => "y",
            Self::Selection => "selection",
            Self::Rotate => "rotate",
            Self::AnglePercent => "angle_percent",
            Self::Mode => "mode",
        }
    }

    /// Read this field out of a request.
    pub fn value(self, request: &FrameRequest) -> CallArg {
        let (x, y) = request.pointer_coords();
        match self {
            Self::Frame => CallArg::Int(request.frame as i64),
            Self::Input => CallArg::Int(request.input.code() as i64),
            Self::OrientationA => CallArg::Float(request.orientation.x as f64),
            Self::OrientationB => CallArg::Float(request.orientation.y as f64),
            Self::OrientationC => CallArg::Float(request.orientation.z as f64),
            Self::PointerX => CallArg::Float(x as f64),
            Self::PointerY => CallArg::Float(y as f64),
            Self::Selection => CallArg::Int(request.selection as i64),
            Self::Rotate => CallArg::Int(request.rotate as i64),
            Self::AnglePercent => CallArg::Int(request.angle_percent as i64),
            Self::Mode => CallArg::Int(request.mode as i64),
        }
    }
}

/// Numeric wasm parameter types the host can pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    I32,
    I64,
    F32,
    F64,
}

impl ParamKind {
    /// `None` for vector and reference types.
    pub fn from_val_type(ty: &ValType) -> Option<Self> {
        match ty {
            ValType::I32 => Some(Self::I32),
            ValType::I64 => Some(Self::I64),
            ValType::F32 => Some(Self::F32),
            ValType::F64 => Some(Self::F64),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    /// Narrow an argument to this type. Integers truncate toward zero and
    /// wrap to 32 bits, so fractional pointer coordinates reach an `i32`
    /// parameter the same way a browser would pass them.
    pub fn encode(self, arg: CallArg) -> Val {
        match (self, arg) {
            (Self::I32, CallArg::Int(v)) => Val::I32(v as i32),
            (Self::I32, CallArg::Float(v)) => Val::I32(wrap_to_i32(v)),
            (Self::I64, CallArg::Int(v)) => Val::I64(v),
            (Self::I64, CallArg::Float(v)) => {
                Val::I64(if v.is_finite() { v.trunc() as i64 } else { 0 })
            }
            (Self::F32, CallArg::Int(v)) => Val::F32((v as f32).to_bits()),
            (Self::F32, CallArg::Float(v)) => Val::F32((v as f32).to_bits()),
            (Self::F64, CallArg::Int(v)) => Val::F64((v as f64).to_bits()),
            (Self::F64, CallArg::Float(v)) => Val::F64(v.to_bits()),
        }
    }
}

fn wrap_to_i32(v: f64) -> i32 {
    if !v.is_finite() {
        return 0;
    }
    let wrapped = v.trunc().rem_euclid(4_294_967_296.0);
    wrapped as u32 as i32
}

/// Flatten a request into typed arguments for the given parameter list.
///
/// `params` must have one entry per contract field; this is checked at load.
pub fn encode_request(
    kind: ContractKind,
    params: &[ParamKind],
    request: &FrameRequest,
) -> Vec<Val> {
    fields(kind)
        .iter()
        .zip(params)
        .map(|(field, param)| param.encode(field.value(request)))
        .collect()
}
