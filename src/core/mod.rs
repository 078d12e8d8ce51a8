// This module gathers the pieces every stage of shader-analyzer shares: the error
// taxonomy, the compilation unit and platform descriptors that flow from the frontend
// to the backend driver, the frontend/generation configuration bags, the run session
// with its statistics, the user-facing reporter, and in-memory stub collaborators
// used to drive the pipeline in tests without the native libraries.

//! Shared infrastructure for shader-analyzer.
//!
//! # Key Components
//!
//! - `error`: [`AnalyzerError`] and [`AnalyzerResult`]
//! - `unit`: [`CompilationUnit`], [`PlatformDescriptor`], [`Platform`]
//! - `options`: [`FrontendOptions`], [`GenerationOptions`] and their defaults
//! - `session`: [`RunSession`] statistics for a generate pass
//! - `report`: the [`Reporter`] sink for diagnostics and listings
//! - `test_utils`: stub frontend and backend (`test-utils` feature)

pub mod error;
pub mod options;
pub mod report;
pub mod session;
/// In-memory collaborators for driving the pipeline in tests.
///
/// Only built for this crate's own tests or with the `test-utils` feature.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod unit;

pub use error::{AnalyzerError, AnalyzerResult, GenerationStage};

pub use options::{
    parse_dx_flags,
    FrontendOptions,
    GenerationOptions,
    ShaderMacro,
    SourceKind,
};

pub use report::{Reporter, StdoutReporter};

pub use session::{RunSession, SessionStats};

pub use unit::{CompilationUnit, Platform, PlatformDescriptor};
