// This module composes the frontend and the backend driver into the three top-level
// operations of the tool. list_platforms opens the ISA backend and prints every
// platform it knows. prepare_unit turns the input file into a CompilationUnit: HLSL is
// compiled (which also resolves the root signature), DXBC is read as-is and only the
// embedded root signature is extracted, and a root signature file fills the gap when
// neither produced one. generate opens the backend, narrows the enumerated platforms
// to the requested ones and hands everything to the driver. Native libraries are
// obtained through CollaboratorLoader so tests can substitute in-memory stubs.

//! Top-level operations: list platforms, prepare inputs, generate ISA.

use std::fs;
use std::path::{Path, PathBuf};

use crate::backend::{IgcLibrary, IsaBackend};
use crate::core::{
    AnalyzerError, AnalyzerResult, CompilationUnit, FrontendOptions, GenerationOptions,
    PlatformDescriptor, Reporter, RunSession, SessionStats, SourceKind,
};
use crate::driver;
use crate::frontend::{self, D3dCompiler, FrontendCompiler};

/// Source of the native collaborators for a run.
pub trait CollaboratorLoader {
    fn load_frontend(&self, library: &Path) -> AnalyzerResult<Box<dyn FrontendCompiler + '_>>;

    fn load_backend(&self, library: &Path) -> AnalyzerResult<Box<dyn IsaBackend + '_>>;
}

/// Loads the real libraries from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeLoader;

impl CollaboratorLoader for NativeLoader {
    fn load_frontend(&self, library: &Path) -> AnalyzerResult<Box<dyn FrontendCompiler + '_>> {
        Ok(Box::new(D3dCompiler::load(library)?))
    }

    fn load_backend(&self, library: &Path) -> AnalyzerResult<Box<dyn IsaBackend + '_>> {
        Ok(Box::new(IgcLibrary::load(library)?))
    }
}

/// Everything a generate run needs, validated from the command line.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub source_kind: SourceKind,
    pub input_file: PathBuf,
    pub frontend: FrontendOptions,
    pub generation: GenerationOptions,
}

/// Print every platform the backend supports, one per line.
pub fn list_platforms(
    loader: &dyn CollaboratorLoader,
    opts: &GenerationOptions,
    reporter: &mut dyn Reporter,
) -> AnalyzerResult<Vec<PlatformDescriptor>> {
    let backend = loader.load_backend(&opts.library)?;
    let platforms = backend.enumerate_platforms();
    for platform in &platforms {
        reporter.report(&platform.name);
    }
    Ok(platforms)
}

fn read_input(what: &'static str, path: &Path) -> AnalyzerResult<Vec<u8>> {
    fs::read(path).map_err(|source| AnalyzerError::InputRead {
        what,
        path: path.to_path_buf(),
        source,
    })
}

/// Produce the bytecode and root signature for a run.
pub fn prepare_unit(
    loader: &dyn CollaboratorLoader,
    config: &RunConfig,
    reporter: &mut dyn Reporter,
) -> AnalyzerResult<CompilationUnit> {
    let mut unit = match config.source_kind {
        SourceKind::Hlsl => {
            let source = read_input("source", &config.input_file)?;
            if config.frontend.profile.is_none() {
                return Err(AnalyzerError::config("Missing --profile"));
            }
            let mut unit = CompilationUnit::from_source(source);

            let compiler = loader.load_frontend(&config.frontend.library)?;
            frontend::compile_from_source(compiler.as_ref(), &config.frontend, &mut unit, reporter)?;
            unit
        }
        SourceKind::Dxbc => {
            let mut unit =
                CompilationUnit::from_bytecode(read_input("bytecode", &config.input_file)?);

            let compiler = loader.load_frontend(&config.frontend.library)?;
            if let Some(root_signature) = frontend::resolve_root_signature(
                compiler.as_ref(),
                &unit.bytecode,
                None,
                &config.frontend,
                reporter,
            )? {
                unit.root_signature = root_signature;
            }
            unit
        }
    };

    if !unit.has_root_signature() {
        if let Some(path) = &config.generation.rootsig_file {
            log::debug!("Loading root signature from {}", path.display());
            unit.root_signature = read_input("root signature", path)?;
        }
    }

    Ok(unit)
}

/// Generate ISA for every selected platform and return the run statistics.
pub fn generate(
    loader: &dyn CollaboratorLoader,
    mut unit: CompilationUnit,
    opts: &GenerationOptions,
) -> AnalyzerResult<SessionStats> {
    let backend = loader.load_backend(&opts.library)?;
    unit.platforms = driver::select_platforms(backend.enumerate_platforms(), &opts.asic_filter);
    if unit.platforms.is_empty() {
        log::warn!("No platforms selected");
    }

    let mut session = RunSession::new();
    driver::run(backend.as_ref(), opts.api, &unit, &opts.isa_prefix, &mut session)?;

    let stats = session.into_stats();
    log::debug!("{}", stats);
    Ok(stats)
}

/// Prepare the inputs and generate ISA.
pub fn run(
    loader: &dyn CollaboratorLoader,
    config: &RunConfig,
    reporter: &mut dyn Reporter,
) -> AnalyzerResult<SessionStats> {
    let unit = prepare_unit(loader, config, reporter)?;
    generate(loader, unit, &config.generation)
}
