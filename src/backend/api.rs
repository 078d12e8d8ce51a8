// This module defines the two generation strategies the Intel GPU compiler exposes. Both
// go through the same four lifecycle operations (create context, create artifact,
// destroy artifact, destroy context) so the backend driver is written once against Api
// and never branches on the variant itself. The variants differ in their input
// requirements, checked once per run before any platform is touched: dx11 only needs
// DXBC bytecode, dx12 additionally needs a root signature, and the input record handed
// to create-shader carries exactly what the variant needs.

//! dx11 / dx12 generation strategies.

use std::fmt;
use std::str::FromStr;

use super::{GeneratorContext, IsaBackend, OpaqueHandle, ShaderArtifact, ShaderInput};
use crate::core::{
    AnalyzerError, AnalyzerResult, CompilationUnit, GenerationStage, PlatformDescriptor,
};

/// Generation strategy, selected once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Api {
    /// Bytecode only.
    Dx11,
    /// Bytecode plus root signature.
    Dx12,
}

impl Api {
    /// Verify that `unit` holds every input this API needs.
    pub fn check_inputs(self, unit: &CompilationUnit) -> AnalyzerResult<()> {
        if unit.bytecode.is_empty() {
            return Err(AnalyzerError::MissingInput { what: "shader bytecode" });
        }
        if self == Self::Dx12 && !unit.has_root_signature() {
            return Err(AnalyzerError::MissingInput { what: "root signature" });
        }
        Ok(())
    }

    /// Input record for the create-shader call.
    pub fn shader_input(self, unit: &CompilationUnit) -> ShaderInput<'_> {
        match self {
            Self::Dx11 => ShaderInput::Dx11 { bytecode: &unit.bytecode },
            Self::Dx12 => ShaderInput::Dx12 {
                bytecode: &unit.bytecode,
                root_signature: &unit.root_signature,
            },
        }
    }

    pub fn create_context<'b>(
        self,
        backend: &'b dyn IsaBackend,
        platform: &PlatformDescriptor,
    ) -> AnalyzerResult<GeneratorContext<'b>> {
        match backend.create_compiler(self, platform.id) {
            Some(raw) => Ok(GeneratorContext::new(backend, self, platform.clone(), raw)),
            None => Err(generation_error(backend, platform, GenerationStage::CreateContext)),
        }
    }

    pub fn create_artifact<'c, 'b>(
        self,
        context: &'c GeneratorContext<'b>,
        unit: &CompilationUnit,
    ) -> AnalyzerResult<ShaderArtifact<'c, 'b>> {
        let backend = context.backend();
        match backend.create_shader(context.raw(), &self.shader_input(unit)) {
            Some(raw) => Ok(ShaderArtifact::new(context, raw)),
            None => Err(generation_error(
                backend,
                context.platform(),
                GenerationStage::CreateArtifact,
            )),
        }
    }

    pub fn destroy_artifact(self, backend: &dyn IsaBackend, shader: OpaqueHandle) {
        backend.delete_shader(self, shader);
    }

    pub fn destroy_context(self, backend: &dyn IsaBackend, compiler: OpaqueHandle) {
        backend.delete_compiler(self, compiler);
    }
}

/// Build a generation error from the backend's last error. Call this before any
/// other backend call, since the next call overwrites it.
pub(crate) fn generation_error(
    backend: &dyn IsaBackend,
    platform: &PlatformDescriptor,
    stage: GenerationStage,
) -> AnalyzerError {
    let message = backend.last_error();
    log::debug!("{:?} failed for {}: {}", stage, platform, message);
    AnalyzerError::Generation { platform: platform.name.clone(), stage, message }
}

impl FromStr for Api {
    type Err = AnalyzerError;

    fn from_str(s: &str) -> AnalyzerResult<Self> {
        if s.eq_ignore_ascii_case("dx11") {
            Ok(Self::Dx11)
        } else if s.eq_ignore_ascii_case("dx12") {
            Ok(Self::Dx12)
        } else {
            Err(AnalyzerError::config(format!("Unrecognized API: {}", s)))
        }
    }
}

impl fmt::Display for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dx11 => "dx11",
            Self::Dx12 => "dx12",
        })
    }
}
