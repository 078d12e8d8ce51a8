// This module is the backend half of the pipeline. IsaBackend captures the calls the
// driver makes into the Intel GPU compiler library: platform enumeration, per-API
// compiler context and shader creation/deletion, ISA text and binary retrieval, and
// the library-global last error string. Api is the generation strategy (dx11 or dx12)
// that decides which inputs are required and which input record the backend receives.
// GeneratorContext and ShaderArtifact own the opaque backend handles and delete them
// on drop, with the artifact borrowing its context so it can never outlive it. The
// native binding to the library's function table lives in the igc submodule.

//! ISA backend contract, generation strategies and handle ownership.

pub mod api;
pub mod handle;
pub mod igc;

pub use api::Api;
pub use handle::{GeneratorContext, ShaderArtifact};
pub use igc::IgcLibrary;

use std::ffi::c_void;

use crate::core::{Platform, PlatformDescriptor};

/// Opaque compiler or shader handle issued by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpaqueHandle(*mut c_void);

impl OpaqueHandle {
    pub fn from_raw(raw: *mut c_void) -> Self {
        Self(raw)
    }

    pub fn as_raw(self) -> *mut c_void {
        self.0
    }
}

/// Input record handed to the backend's create-shader call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderInput<'a> {
    Dx11 {
        bytecode: &'a [u8],
    },
    Dx12 {
        bytecode: &'a [u8],
        root_signature: &'a [u8],
    },
}

impl ShaderInput<'_> {
    pub fn api(&self) -> Api {
        match self {
            Self::Dx11 { .. } => Api::Dx11,
            Self::Dx12 { .. } => Api::Dx12,
        }
    }
}

/// Contract of the Intel GPU compiler library.
///
/// Calls that fail leave their reason in [`IsaBackend::last_error`], which is
/// overwritten by the next call, so it must be read right after the failure.
pub trait IsaBackend {
    /// Every platform the library can generate for, in the library's order.
    fn enumerate_platforms(&self) -> Vec<PlatformDescriptor>;

    fn create_compiler(&self, api: Api, platform: Platform) -> Option<OpaqueHandle>;

    fn delete_compiler(&self, api: Api, compiler: OpaqueHandle);

    fn create_shader(&self, compiler: OpaqueHandle, input: &ShaderInput<'_>) -> Option<OpaqueHandle>;

    fn delete_shader(&self, api: Api, shader: OpaqueHandle);

    /// Disassembly for a created shader, without the NUL terminator.
    fn isa_text(&self, shader: OpaqueHandle) -> Option<Vec<u8>>;

    /// Machine code for a created shader.
    fn isa_binary(&self, shader: OpaqueHandle) -> Option<Vec<u8>>;

    fn last_error(&self) -> String;
}

impl<T: IsaBackend + ?Sized> IsaBackend for &T {
    fn enumerate_platforms(&self) -> Vec<PlatformDescriptor> {
        (**self).enumerate_platforms()
    }

    fn create_compiler(&self, api: Api, platform: Platform) -> Option<OpaqueHandle> {
        (**self).create_compiler(api, platform)
    }

    fn delete_compiler(&self, api: Api, compiler: OpaqueHandle) {
        (**self).delete_compiler(api, compiler)
    }

    fn create_shader(&self, compiler: OpaqueHandle, input: &ShaderInput<'_>) -> Option<OpaqueHandle> {
        (**self).create_shader(compiler, input)
    }

    fn delete_shader(&self, api: Api, shader: OpaqueHandle) {
        (**self).delete_shader(api, shader)
    }

    fn isa_text(&self, shader: OpaqueHandle) -> Option<Vec<u8>> {
        (**self).isa_text(shader)
    }

    fn isa_binary(&self, shader: OpaqueHandle) -> Option<Vec<u8>> {
        (**self).isa_binary(shader)
    }

    fn last_error(&self) -> String {
        (**self).last_error()
    }
}
