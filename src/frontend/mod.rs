// This module is the frontend half of the pipeline: everything between the HLSL text
// (or a precompiled DXBC file) and the bytes handed to the ISA backend. The
// FrontendCompiler trait captures the two calls shader-analyzer needs from the D3D
// compiler library, compile and blob-part extraction, so the orchestration code can be
// exercised against in-memory stubs. compile_from_source is the adapter that runs the
// primary compile, surfaces diagnostics, and immediately hands the bytecode to the root
// signature resolver using the same compiler instance. The native binding lives in the
// d3d submodule and the macro table construction in macros.

//! HLSL frontend: compile adapter and root signature resolution.
//!
//! # Key Components
//!
//! - [`FrontendCompiler`]: contract of the HLSL compiler library
//! - [`compile_from_source`]: primary compile followed by root signature resolution
//! - [`resolver::resolve_root_signature`]: embedded / recompiled / absent fallback chain
//! - [`d3d::D3dCompiler`]: `d3dcompiler_47` loaded at run time

pub mod d3d;
pub mod macros;
pub mod resolver;

pub use d3d::D3dCompiler;
pub use macros::MacroTable;
pub use resolver::resolve_root_signature;

use crate::core::{
    AnalyzerError, AnalyzerResult, CompilationUnit, FrontendOptions, Reporter, ShaderMacro,
};

/// Parts of a DXBC container that can be pulled out without recompiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobPart {
    RootSignature,
}

impl BlobPart {
    /// Value of the matching `D3D_BLOB_PART` enumerator.
    pub fn to_raw(self) -> u32 {
        match self {
            Self::RootSignature => 11,
        }
    }
}

/// One call into the HLSL compiler.
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
    /// Raw source bytes, passed to the compiler unchanged.
    pub source: &'a [u8],
    pub file_name: &'a str,
    pub defines: &'a [ShaderMacro],
    pub entry_point: &'a str,
    pub profile: &'a str,
    pub flags1: u32,
    pub flags2: u32,
}

/// What the HLSL compiler handed back.
///
/// Success and diagnostics are independent: a failed compile may carry no text and
/// a successful one may carry warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOutput {
    pub succeeded: bool,
    pub code: Option<Vec<u8>>,
    pub diagnostics: Option<String>,
}

/// Contract of the HLSL compiler library.
pub trait FrontendCompiler {
    /// Compile `request.source`. Errors are reserved for requests that could not be
    /// issued at all; a compile the library rejected is `succeeded == false`.
    fn compile(&self, request: &CompileRequest<'_>) -> AnalyzerResult<CompileOutput>;

    /// Extract a part from a DXBC container, or `None` if the library reports failure.
    fn extract_blob_part(&self, bytecode: &[u8], part: BlobPart) -> Option<Vec<u8>>;
}

impl<T: FrontendCompiler + ?Sized> FrontendCompiler for &T {
    fn compile(&self, request: &CompileRequest<'_>) -> AnalyzerResult<CompileOutput> {
        (**self).compile(request)
    }

    fn extract_blob_part(&self, bytecode: &[u8], part: BlobPart) -> Option<Vec<u8>> {
        (**self).extract_blob_part(bytecode, part)
    }
}

pub(crate) fn report_diagnostics(output: &CompileOutput, reporter: &mut dyn Reporter) {
    if let Some(text) = &output.diagnostics {
        reporter.report(text);
    }
}

/// Compile the unit's HLSL source and resolve its root signature.
///
/// On success `unit.bytecode` holds the compiled DXBC. `unit.root_signature` is filled
/// when one is embedded or can be compiled from `rootsig_entry`/`rootsig_profile`;
/// failing to find one is not an error here.
pub fn compile_from_source(
    frontend: &dyn FrontendCompiler,
    opts: &FrontendOptions,
    unit: &mut CompilationUnit,
    reporter: &mut dyn Reporter,
) -> AnalyzerResult<()> {
    let source = unit
        .source_text
        .as_deref()
        .ok_or_else(|| AnalyzerError::config("No HLSL source to compile"))?;
    let profile = opts
        .profile
        .as_deref()
        .ok_or_else(|| AnalyzerError::config("Missing --profile"))?;

    log::info!("Compiling {} ({}) from {}", opts.entry_point, profile, opts.file_name);
    let output = frontend.compile(&CompileRequest {
        source,
        file_name: &opts.file_name,
        defines: &opts.defines,
        entry_point: &opts.entry_point,
        profile,
        flags1: opts.flags,
        flags2: 0,
    })?;

    report_diagnostics(&output, reporter);
    if !output.succeeded {
        return Err(AnalyzerError::Compile {
            entry_point: opts.entry_point.clone(),
            profile: profile.to_string(),
        });
    }

    let Some(code) = output.code else {
        log::warn!("Compiler reported success without producing bytecode");
        return Ok(());
    };
    log::debug!("Compiled {} bytes of DXBC", code.len());

    let resolved = resolve_root_signature(frontend, &code, Some(source), opts, reporter);
    unit.bytecode = code;
    match resolved {
        Ok(Some(root_signature)) => unit.root_signature = root_signature,
        Ok(None) => {}
        Err(err) => log::warn!("No root signature resolved: {}", err),
    }

    Ok(())
}
