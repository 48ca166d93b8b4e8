//! Host configuration, loadable from YAML and overridden by command-line flags.

use crate::types::{FaceLayout, MAX_ANGLE_PERCENT, MAX_SURFACE_DIMENSION, SurfaceSize};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Argument layout of the module's `render` export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractKind {
    /// dt, input, A, B, C, x, y, selection, rotate, percent, mode.
    #[default]
    Canonical,
    /// input, A, B, C, x, y. Historical pointer-driven builds.
    Legacy,
}

impl ContractKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Canonical => "canonical",
            Self::Legacy => "legacy",
        }
    }
}

impl std::fmt::Display for ContractKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ContractKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "canonical" => Ok(Self::Canonical),
            "legacy" => Ok(Self::Legacy),
            other => Err(format!("unknown contract `{other}` (expected canonical or legacy)")),
        }
    }
}

/// Errors from loading or validating a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("surface must be non-empty, got {width}x{height}")]
    EmptySurface { width: u32, height: u32 },
    #[error("surface {width}x{height} exceeds the {max} pixel limit per side")]
    SurfaceTooLarge { width: u32, height: u32, max: u32 },
    #[error("orientation step must be finite and positive, got {0}")]
    InvalidStep(f32),
    #[error("sweep jump must be within 1..=100, got {0}")]
    InvalidSweepJump(u8),
}

/// Settings shared by the desktop and CLI hosts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Path of the precompiled module.
    pub module_path: PathBuf,
    pub contract: ContractKind,
    pub surface: SurfaceSize,
    pub faces: FaceLayout,
    /// Orientation delta applied per key press.
    pub orientation_step: f32,
    /// Percentage increment between rotation sweep steps.
    pub sweep_jump: u8,
    /// Pause between sweep steps. Zero yields for one event-loop turn only.
    pub sweep_interval_ms: u64,
    /// Forward clicks to the module as one-frame pointer coordinates.
    pub pointer_input: bool,
    /// Satisfy unknown module imports with stubs that trap when called.
    pub trap_unknown_imports: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            module_path: PathBuf::from("out.wasm"),
            contract: ContractKind::Canonical,
            surface: SurfaceSize::default(),
            faces: FaceLayout::Seven,
            orientation_step: 0.05,
            sweep_jump: 15,
            sweep_interval_ms: 0,
            pointer_input: false,
            trap_unknown_imports: false,
        }
    }
}

impl HostConfig {
    /// Read and validate a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&text)?;
        tracing::debug!(path = %path.display(), "loaded host configuration");
        Ok(config)
    }

    /// Parse and validate YAML text. Missing keys take their defaults.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.surface.width == 0 || self.surface.height == 0 {
            return Err(ConfigError::EmptySurface {
                width: self.surface.width,
                height: self.surface.height,
            });
        }
        if self.surface.width > MAX_SURFACE_DIMENSION
            || self.surface.height > MAX_SURFACE_DIMENSION
        {
            return Err(ConfigError::SurfaceTooLarge {
                width: self.surface.width,
                height: self.surface.height,
                max: MAX_SURFACE_DIMENSION,
            });
        }
        if !self.orientation_step.is_finite() || self.orientation_step <= 0.0 {
            return Err(ConfigError::InvalidStep(self.orientation_step));
        }
        if self.sweep_jump == 0 || self.sweep_jump > MAX_ANGLE_PERCENT {
            return Err(ConfigError::InvalidSweepJump(self.sweep_jump));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = HostConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.contract, ContractKind::Canonical);
        assert_eq!(config.faces.face_count(), 7);
        assert_eq!(config.sweep_jump, 15);
        assert!(!config.pointer_input);
    }

    #[test]
    fn contract_parses_from_flag_text() {
        assert_eq!("legacy".parse(), Ok(ContractKind::Legacy));
        assert_eq!("Canonical".parse(), Ok(ContractKind::Canonical));
        assert!("eleven".parse::<ContractKind>().is_err());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = HostConfig::from_yaml("contract: legacy\npointer_input: true\n").unwrap();
        assert_eq!(config.contract, ContractKind::Legacy);
        assert!(config.pointer_input);
        assert_eq!(config.surface, SurfaceSize::default());
        assert_eq!(config.module_path, PathBuf::from("out.wasm"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = HostConfig::from_yaml("colour: red\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = HostConfig::from_yaml("sweep_jump: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSweepJump(0)));

        let err = HostConfig::from_yaml("surface: { width: 0, height: 600 }\n").unwrap_err();
        assert!(matches!(err, ConfigError::EmptySurface { width: 0, .. }));

        let err = HostConfig::from_yaml("orientation_step: -0.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidStep(_)));
    }

    #[test]
    fn oversized_surface_is_rejected() {
        let config = HostConfig::from_yaml("surface: { width: 2560, height: 1440 }\n").unwrap();
        assert_eq!(config.surface, SurfaceSize::new(2560, 1440));

        let err = HostConfig::from_yaml("surface: { width: 8193, height: 600 }\n").unwrap_err();
        assert!(matches!(err, ConfigError::SurfaceTooLarge { width: 8193, max: 8192, .. }));

        let err = HostConfig::from_yaml("surface: { width: 800, height: 16384 }\n").unwrap_err();
        assert!(matches!(err, ConfigError::SurfaceTooLarge { height: 16384, .. }));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "module_path: build/cube.wasm").unwrap();
        writeln!(file, "faces: eight").unwrap();
        writeln!(file, "sweep_interval_ms: 16").unwrap();

        let config = HostConfig::load(file.path()).unwrap();
        assert_eq!(config.module_path, PathBuf::from("build/cube.wasm"));
        assert_eq!(config.faces, FaceLayout::Eight);
        assert_eq!(config.sweep_interval_ms, 16);
    }

    #[test]
    fn load_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        let err = HostConfig::load(&missing).unwrap_err();
        assert!(err.to_string().contains("nope.yaml"));
    }
}
