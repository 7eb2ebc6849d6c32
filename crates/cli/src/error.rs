//! Structured CLI errors with meaningful exit codes.
//!
//! Exit code scheme:
//! - 0:  success
//! - 2:  clap arg parse error (automatic, before our code runs)
//! - 10: pipeline error (bad directives, out-of-range draw buffers)
//! - 11: I/O error (unreadable pack or config)
//! - 12: input error (bad scene name, invalid manifest)
//! - 13: serialization error

use composite_core::{PackError, PipelineError};
use std::fmt;

/// Errors produced by CLI operations, each mapped to a distinct exit code.
pub enum CliError {
    Pipeline(PipelineError),
    Io(String),
    Input(String),
    Serialization(String),
}

impl CliError {
    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Pipeline(_) => 10,
            CliError::Io(_) => 11,
            CliError::Input(_) => 12,
            CliError::Serialization(_) => 13,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Pipeline(e) => write!(f, "{e}"),
            CliError::Io(msg) => write!(f, "{msg}"),
            CliError::Input(msg) => write!(f, "{msg}"),
            CliError::Serialization(msg) => write!(f, "{msg}"),
        }
    }
}

impl From<PackError> for CliError {
    fn from(e: PackError) -> Self {
        match e {
            PackError::Io { .. } | PackError::NotFound(_) | PackError::Release { .. } => {
                CliError::Io(e.to_string())
            }
            PackError::Manifest { .. } => CliError::Input(e.to_string()),
        }
    }
}

impl From<PipelineError> for CliError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Pack(pack) => CliError::from(pack),
            other => CliError::Pipeline(other),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_error_exit_code_is_10() {
        let err = CliError::from(PipelineError::DuplicateDrawBuffer {
            program: "composite".into(),
            index: 1,
        });
        assert_eq!(err.exit_code(), 10);
        assert!(err.to_string().contains("composite"));
    }

    #[test]
    fn missing_pack_exit_code_is_11() {
        let err = CliError::from(PackError::NotFound("vivid".into()));
        assert_eq!(err.exit_code(), 11);
        assert!(err.to_string().contains("vivid"));
    }

    #[test]
    fn invalid_manifest_exit_code_is_12() {
        let err = CliError::from(PackError::Manifest {
            path: "pack.json".into(),
            message: "expected value".into(),
        });
        assert_eq!(err.exit_code(), 12);
    }

    #[test]
    fn serialization_error_exit_code_is_13() {
        let err = CliError::Serialization("json fail".into());
        assert_eq!(err.exit_code(), 13);
    }

    #[test]
    fn pack_error_inside_pipeline_error_routes_by_kind() {
        let err = CliError::from(PipelineError::Pack(PackError::Io {
            path: "shaders".into(),
            message: "permission denied".into(),
        }));
        assert_eq!(err.exit_code(), 11);
        assert!(err.to_string().contains("permission denied"));
    }

    #[test]
    fn from_serde_json_error_routes_to_serialization() {
        let bad_json = serde_json::from_str::<serde_json::Value>("{invalid");
        let cli_err = CliError::from(bad_json.unwrap_err());
        assert_eq!(cli_err.exit_code(), 13);
    }
}
