//! shader-analyzer - Intel GPU ISA from HLSL or DXBC.
//!
//! The tool takes a shader, either HLSL source or compiled DXBC, resolves its
//! root signature and asks the Intel GPU compiler library for the ISA it would
//! generate on each supported platform. The disassembly for every platform is
//! written to `<prefix><platform>.asm`.
//!
//! # Primary Usage
//!
//! ```ignore
//! use shader_analyzer::core::StdoutReporter;
//! use shader_analyzer::pipeline::{self, NativeLoader};
//!
//! let stats = pipeline::run(&NativeLoader, &config, &mut StdoutReporter)?;
//! println!("{}", stats);
//! ```
//!
//! # Architecture
//!
//! - [`core`] - Errors, data model, configuration, session statistics
//! - [`frontend`] - HLSL compile adapter and root signature resolution
//! - [`backend`] - ISA backend contract, dx11/dx12 strategies, owned handles
//! - [`driver`] - Per-platform generation loop and output files
//! - [`pipeline`] - Top-level operations used by the binary
//! - [`cli`] - Command line parsing

pub mod backend;
pub mod cli;
pub mod core;
pub mod driver;
pub mod frontend;
pub mod pipeline;

pub use backend::{Api, GeneratorContext, IsaBackend, ShaderArtifact};
pub use crate::core::{
    AnalyzerError, AnalyzerResult, CompilationUnit, FrontendOptions, GenerationOptions,
    Platform, PlatformDescriptor, SessionStats,
};
pub use frontend::FrontendCompiler;
pub use pipeline::{CollaboratorLoader, NativeLoader, RunConfig};
