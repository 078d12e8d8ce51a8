//! In-memory collaborators for exercising the pipeline without native libraries.
//!
//! [`StubFrontend`] and [`StubBackend`] answer from tables configured up front and
//! count every call, so tests can assert on exactly which collaborator calls a run
//! made and in which order.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ffi::c_void;
use std::path::Path;

use crate::backend::{Api, IsaBackend, OpaqueHandle, ShaderInput};
use crate::core::{AnalyzerError, AnalyzerResult, Platform, PlatformDescriptor};
use crate::frontend::{BlobPart, CompileOutput, CompileRequest, FrontendCompiler};
use crate::pipeline::CollaboratorLoader;

#[derive(Debug, Default)]
struct FrontendLog {
    compiles: Vec<(String, String)>,
    last_source: Option<Vec<u8>>,
    extracts: usize,
}

/// HLSL compiler keyed by entry point.
#[derive(Debug, Default)]
pub struct StubFrontend {
    outputs: HashMap<String, CompileOutput>,
    embedded: HashMap<Vec<u8>, Vec<u8>>,
    log: RefCell<FrontendLog>,
}

impl StubFrontend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiling `entry_point` succeeds with `code`.
    pub fn compiles(mut self, entry_point: &str, code: &[u8]) -> Self {
        let output = self.outputs.entry(entry_point.to_string()).or_default();
        output.succeeded = true;
        output.code = Some(code.to_vec());
        self
    }

    /// Compiling `entry_point` fails with `diagnostics`.
    pub fn fail_compile(mut self, entry_point: &str, diagnostics: &str) -> Self {
        let output = self.outputs.entry(entry_point.to_string()).or_default();
        output.succeeded = false;
        output.code = None;
        output.diagnostics = Some(diagnostics.to_string());
        self
    }

    pub fn with_diagnostics(mut self, entry_point: &str, diagnostics: &str) -> Self {
        let output = self.outputs.entry(entry_point.to_string()).or_default();
        output.diagnostics = Some(diagnostics.to_string());
        self
    }

    /// `bytecode` carries an embedded root signature.
    pub fn embeds(mut self, bytecode: &[u8], root_signature: &[u8]) -> Self {
        self.embedded.insert(bytecode.to_vec(), root_signature.to_vec());
        self
    }

    pub fn compile_calls(&self) -> usize {
        self.log.borrow().compiles.len()
    }

    pub fn compile_calls_for(&self, entry_point: &str) -> usize {
        self.log.borrow().compiles.iter().filter(|(entry, _)| entry == entry_point).count()
    }

    pub fn last_profile(&self) -> Option<String> {
        self.log.borrow().compiles.last().map(|(_, profile)| profile.clone())
    }

    /// Source bytes of the last compile request.
    pub fn last_source(&self) -> Option<Vec<u8>> {
        self.log.borrow().last_source.clone()
    }

    pub fn extract_calls(&self) -> usize {
        self.log.borrow().extracts
    }
}

impl FrontendCompiler for StubFrontend {
    fn compile(&self, request: &CompileRequest<'_>) -> AnalyzerResult<CompileOutput> {
        let mut log = self.log.borrow_mut();
        log.compiles.push((request.entry_point.to_string(), request.profile.to_string()));
        log.last_source = Some(request.source.to_vec());
        drop(log);
        Ok(self.outputs.get(request.entry_point).cloned().unwrap_or_default())
    }

    fn extract_blob_part(&self, bytecode: &[u8], part: BlobPart) -> Option<Vec<u8>> {
        self.log.borrow_mut().extracts += 1;
        match part {
            BlobPart::RootSignature => self.embedded.get(bytecode).cloned(),
        }
    }
}

/// A call the stub backend received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    CreateCompiler(Api, String),
    CreateShader(Api, String),
    IsaText(String),
    DeleteShader(Api, String),
    DeleteCompiler(Api, String),
}

#[derive(Debug, Default)]
struct BackendState {
    calls: Vec<BackendCall>,
    last_error: String,
    /// Handle value -> platform name, for both compilers and shaders.
    handles: HashMap<usize, String>,
    next_handle: usize,
    last_input: Option<(Api, Vec<u8>, Vec<u8>)>,
}

/// ISA backend that returns fixed text per platform.
#[derive(Debug, Default)]
pub struct StubBackend {
    platforms: Vec<PlatformDescriptor>,
    isa: HashMap<String, Vec<u8>>,
    fail_context: HashMap<String, String>,
    fail_shader: HashMap<String, String>,
    no_text: HashMap<String, String>,
    state: RefCell<BackendState>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enumerate `name` with ISA text `isa`. Platform tags follow insertion order.
    pub fn platform(mut self, name: &str, isa: &str) -> Self {
        let id = Platform::from_raw(self.platforms.len() as i32);
        self.platforms.push(PlatformDescriptor::new(id, name));
        self.isa.insert(name.to_string(), isa.as_bytes().to_vec());
        self
    }

    pub fn fail_context(mut self, name: &str, error: &str) -> Self {
        self.fail_context.insert(name.to_string(), error.to_string());
        self
    }

    pub fn fail_shader(mut self, name: &str, error: &str) -> Self {
        self.fail_shader.insert(name.to_string(), error.to_string());
        self
    }

    pub fn no_isa_text(mut self, name: &str, error: &str) -> Self {
        self.no_text.insert(name.to_string(), error.to_string());
        self
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.borrow().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&BackendCall) -> bool) -> usize {
        self.state.borrow().calls.iter().filter(|call| pred(call)).count()
    }

    /// API, bytecode and root signature of the last create-shader call.
    pub fn last_input(&self) -> Option<(Api, Vec<u8>, Vec<u8>)> {
        self.state.borrow().last_input.clone()
    }

    /// Handles issued but not yet deleted.
    pub fn live_handles(&self) -> usize {
        self.state.borrow().handles.len()
    }

    fn name_for_id(&self, platform: Platform) -> String {
        self.platforms
            .iter()
            .find(|p| p.id == platform)
            .map(|p| p.name.clone())
            .unwrap_or_default()
    }

    fn issue(&self, name: &str) -> OpaqueHandle {
        let mut state = self.state.borrow_mut();
        state.next_handle += 1;
        let value = state.next_handle;
        state.handles.insert(value, name.to_string());
        OpaqueHandle::from_raw(value as *mut c_void)
    }

    fn name_of(&self, handle: OpaqueHandle) -> String {
        let key = handle.as_raw() as usize;
        self.state.borrow().handles.get(&key).cloned().unwrap_or_default()
    }

    fn release(&self, handle: OpaqueHandle) -> String {
        let key = handle.as_raw() as usize;
        self.state.borrow_mut().handles.remove(&key).unwrap_or_default()
    }

    fn record(&self, call: BackendCall) {
        self.state.borrow_mut().calls.push(call);
    }

    fn set_error(&self, error: &str) {
        self.state.borrow_mut().last_error = error.to_string();
    }
}

impl IsaBackend for StubBackend {
    fn enumerate_platforms(&self) -> Vec<PlatformDescriptor> {
        self.platforms.clone()
    }

    fn create_compiler(&self, api: Api, platform: Platform) -> Option<OpaqueHandle> {
        let name = self.name_for_id(platform);
        self.record(BackendCall::CreateCompiler(api, name.clone()));
        if let Some(error) = self.fail_context.get(&name) {
            self.set_error(error);
            return None;
        }
        Some(self.issue(&name))
    }

    fn delete_compiler(&self, api: Api, compiler: OpaqueHandle) {
        let name = self.release(compiler);
        self.record(BackendCall::DeleteCompiler(api, name));
    }

    fn create_shader(&self, compiler: OpaqueHandle, input: &ShaderInput<'_>) -> Option<OpaqueHandle> {
        let name = self.name_of(compiler);
        let (bytecode, root_signature) = match *input {
            ShaderInput::Dx11 { bytecode } => (bytecode, &[][..]),
            ShaderInput::Dx12 { bytecode, root_signature } => (bytecode, root_signature),
        };
        self.state.borrow_mut().last_input =
            Some((input.api(), bytecode.to_vec(), root_signature.to_vec()));
        self.record(BackendCall::CreateShader(input.api(), name.clone()));

        if let Some(error) = self.fail_shader.get(&name) {
            self.set_error(error);
            return None;
        }
        Some(self.issue(&name))
    }

    fn delete_shader(&self, api: Api, shader: OpaqueHandle) {
        let name = self.release(shader);
        self.record(BackendCall::DeleteShader(api, name));
    }

    fn isa_text(&self, shader: OpaqueHandle) -> Option<Vec<u8>> {
        let name = self.name_of(shader);
        self.record(BackendCall::IsaText(name.clone()));
        if let Some(error) = self.no_text.get(&name) {
            self.set_error(error);
            return None;
        }
        self.isa.get(&name).cloned()
    }

    fn isa_binary(&self, shader: OpaqueHandle) -> Option<Vec<u8>> {
        let name = self.name_of(shader);
        self.isa.get(&name).map(|text| text.iter().rev().copied().collect())
    }

    fn last_error(&self) -> String {
        self.state.borrow().last_error.clone()
    }
}

/// Hands out borrowed stubs in place of the native libraries.
pub struct StubLoader<'a> {
    frontend: Option<&'a StubFrontend>,
    backend: Option<&'a StubBackend>,
    frontend_loads: Cell<usize>,
    backend_loads: Cell<usize>,
}

impl<'a> StubLoader<'a> {
    pub fn new(frontend: &'a StubFrontend, backend: &'a StubBackend) -> Self {
        Self {
            frontend: Some(frontend),
            backend: Some(backend),
            frontend_loads: Cell::new(0),
            backend_loads: Cell::new(0),
        }
    }

    /// Loading the frontend library fails as if it were missing.
    pub fn without_frontend(mut self) -> Self {
        self.frontend = None;
        self
    }

    /// Loading the backend library fails as if it were missing.
    pub fn without_backend(mut self) -> Self {
        self.backend = None;
        self
    }

    pub fn frontend_loads(&self) -> usize {
        self.frontend_loads.get()
    }

    pub fn backend_loads(&self) -> usize {
        self.backend_loads.get()
    }
}

impl CollaboratorLoader for StubLoader<'_> {
    fn load_frontend(&self, library: &Path) -> AnalyzerResult<Box<dyn FrontendCompiler + '_>> {
        self.frontend_loads.set(self.frontend_loads.get() + 1);
        match self.frontend {
            Some(frontend) => Ok(Box::new(frontend)),
            None => Err(AnalyzerError::unavailable(format!(
                "Failed to load D3D compiler dll from: {}",
                library.display()
            ))),
        }
    }

    fn load_backend(&self, library: &Path) -> AnalyzerResult<Box<dyn IsaBackend + '_>> {
        self.backend_loads.set(self.backend_loads.get() + 1);
        match self.backend {
            Some(backend) => Ok(Box::new(backend)),
            None => Err(AnalyzerError::unavailable(format!("Failed to load: {}", library.display()))),
        }
    }
}
