//! Owned backend handles.
//!
//! A [`GeneratorContext`] deletes its compiler on drop and a [`ShaderArtifact`]
//! deletes its shader on drop. The artifact borrows the context, so the shader is
//! always deleted before the compiler that produced it.

use super::{Api, IsaBackend, OpaqueHandle};
use crate::core::PlatformDescriptor;

/// Compiler context for one platform.
pub struct GeneratorContext<'b> {
    backend: &'b dyn IsaBackend,
    api: Api,
    platform: PlatformDescriptor,
    raw: OpaqueHandle,
}

impl<'b> GeneratorContext<'b> {
    pub(crate) fn new(
        backend: &'b dyn IsaBackend,
        api: Api,
        platform: PlatformDescriptor,
        raw: OpaqueHandle,
    ) -> Self {
        Self { backend, api, platform, raw }
    }

    pub fn backend(&self) -> &'b dyn IsaBackend {
        self.backend
    }

    pub fn api(&self) -> Api {
        self.api
    }

    pub fn platform(&self) -> &PlatformDescriptor {
        &self.platform
    }

    pub fn raw(&self) -> OpaqueHandle {
        self.raw
    }
}

impl Drop for GeneratorContext<'_> {
    fn drop(&mut self) {
        log::trace!("Deleting {} compiler for {}", self.api, self.platform);
        self.api.destroy_context(self.backend, self.raw);
    }
}

/// Shader generated by a [`GeneratorContext`].
pub struct ShaderArtifact<'c, 'b> {
    context: &'c GeneratorContext<'b>,
    raw: OpaqueHandle,
}

impl<'c, 'b> ShaderArtifact<'c, 'b> {
    pub(crate) fn new(context: &'c GeneratorContext<'b>, raw: OpaqueHandle) -> Self {
        Self { context, raw }
    }

    pub fn raw(&self) -> OpaqueHandle {
        self.raw
    }

    /// ISA disassembly up to its NUL terminator.
    pub fn isa_text(&self) -> Option<Vec<u8>> {
        self.context.backend.isa_text(self.raw)
    }

    pub fn isa_binary(&self) -> Option<Vec<u8>> {
        self.context.backend.isa_binary(self.raw)
    }
}

impl Drop for ShaderArtifact<'_, '_> {
    fn drop(&mut self) {
        log::trace!("Deleting {} shader for {}", self.context.api, self.context.platform);
        self.context.api.destroy_artifact(self.context.backend, self.raw);
    }
}
