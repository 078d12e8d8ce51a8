// This module defines the error taxonomy for shader-analyzer using the thiserror crate.
// AnalyzerError covers every way a run can stop: a native library or one of its entry
// points could not be resolved, the HLSL compile failed, the selected API is missing an
// input it needs, a per-platform backend call failed, an output file could not be
// opened, the command line was inconsistent, or an input file could not be read. Each
// variant carries the context needed to print the same message the tool has always
// printed. AnalyzerResult<T> is the convenience alias used throughout the crate.

//! Error types for shader-analyzer.
//!
//! Every failure is fatal for the run. Errors are reported once by the binary
//! and turned into exit status 1.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for a shader-analyzer run.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// A native library could not be loaded or is missing an entry point.
    #[error("{reason}")]
    CollaboratorUnavailable {
        reason: String,
    },

    /// The HLSL compile reported failure. Diagnostics were already emitted.
    #[error("Compilation failed for {entry_point} ({profile})")]
    Compile {
        entry_point: String,
        profile: String,
    },

    /// The selected API cannot run with the inputs at hand.
    #[error("Missing {what}")]
    MissingInput {
        what: &'static str,
    },

    /// A backend call failed for one platform; `message` is the backend's last error.
    #[error("ERROR: {message}")]
    Generation {
        platform: String,
        stage: GenerationStage,
        message: String,
    },

    #[error("Failed to open output file: {}", .path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{reason}")]
    Config {
        reason: String,
    },

    /// An input file could not be read. `what` is "source", "bytecode" or
    /// "root signature".
    #[error("{} from: {}", read_failure(.what), .path.display())]
    InputRead {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn read_failure(what: &str) -> String {
    match what {
        "source" => "Failed to read source".to_string(),
        other => format!("Unable to load {}", other),
    }
}

/// Per-platform stage at which a [`AnalyzerError::Generation`] occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStage {
    CreateContext,
    CreateArtifact,
    ExtractText,
}

impl AnalyzerError {
    pub(crate) fn unavailable(reason: impl Into<String>) -> Self {
        Self::CollaboratorUnavailable { reason: reason.into() }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::Config { reason: reason.into() }
    }
}

/// Result type alias for analyzer operations.
pub type AnalyzerResult<T> = Result<T, AnalyzerError>;
