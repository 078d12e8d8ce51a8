// This module binds the Intel GPU compiler library (IntelGpuCompiler64/32) at run time.
// The library exports a single symbol, OpenCompiler, which fills a versioned function
// table; interface version 1 holds one set of four lifecycle callbacks per API (dx11 and
// dx12) plus the shared callbacks for platform enumeration, ISA text/binary retrieval
// and the global last error string. The table is copied out and validated once, so a
// library that leaves a slot empty is rejected before any platform work starts.
// Platform enumeration uses the library's two-call idiom: ask for the count with an
// empty buffer, then fill a buffer of that size.

//! Native Intel GPU compiler binding.

use std::ffi::{c_char, c_void, CStr};
use std::path::Path;
use std::ptr;
use std::slice;

use libloading::Library;

use super::{Api, IsaBackend, OpaqueHandle, ShaderInput};
use crate::core::{AnalyzerError, AnalyzerResult, Platform, PlatformDescriptor};

const OPEN_COMPILER_SYMBOL: &[u8] = b"OpenCompiler\0";
const INTERFACE_VERSION: u32 = 1;

#[repr(C)]
#[derive(Clone, Copy)]
struct RawPlatformInfo {
    identifier: i32,
    platform_name: *const c_char,
}

#[repr(C)]
struct ShaderInputDx11V1 {
    dxbc_bin: *const c_void,
}

#[repr(C)]
struct ShaderInputDx12V1 {
    dxbc_bin: *const c_void,
    root_signature: *const c_void,
    root_signature_size: usize,
}

type PfnCreateCompiler = unsafe extern "system" fn(i32, *mut *mut c_void) -> bool;
type PfnDeleteCompiler = unsafe extern "system" fn(*mut *mut c_void);
type PfnCreateShaderDx11 =
    unsafe extern "system" fn(*mut c_void, *const ShaderInputDx11V1, *mut *mut c_void) -> bool;
type PfnCreateShaderDx12 =
    unsafe extern "system" fn(*mut c_void, *const ShaderInputDx12V1, *mut *mut c_void) -> bool;
type PfnDeleteShader = unsafe extern "system" fn(*mut *mut c_void);
type PfnGetIsaText = unsafe extern "system" fn(*mut c_void, *mut usize) -> *const c_char;
type PfnGetIsaBinary = unsafe extern "system" fn(*mut c_void, *mut usize) -> *const c_void;
type PfnGetLastError = unsafe extern "system" fn() -> *const c_char;
type PfnEnumPlatforms = unsafe extern "system" fn(*mut RawPlatformInfo, usize) -> usize;

#[repr(C)]
#[derive(Clone, Copy)]
struct RawApiFunctions<CreateShader> {
    create_compiler: Option<PfnCreateCompiler>,
    delete_compiler: Option<PfnDeleteCompiler>,
    create_shader: Option<CreateShader>,
    delete_shader: Option<PfnDeleteShader>,
}

/// `SFunctionTable_V1` as filled by `OpenCompiler`.
#[repr(C)]
#[derive(Clone, Copy)]
struct RawFunctionTable {
    dx11: RawApiFunctions<PfnCreateShaderDx11>,
    dx12: RawApiFunctions<PfnCreateShaderDx12>,
    enum_platforms: Option<PfnEnumPlatforms>,
    get_isa_text: Option<PfnGetIsaText>,
    get_isa_binary: Option<PfnGetIsaBinary>,
    get_last_error: Option<PfnGetLastError>,
}

#[repr(C)]
struct OpenCompilerDesc {
    interface_version: u32,
    compiler_funcs: *mut RawFunctionTable,
}

type PfnOpenCompiler = unsafe extern "system" fn(*mut OpenCompilerDesc) -> bool;

#[derive(Clone, Copy)]
struct ApiFunctions<CreateShader> {
    create_compiler: PfnCreateCompiler,
    delete_compiler: PfnDeleteCompiler,
    create_shader: CreateShader,
    delete_shader: PfnDeleteShader,
}

impl<CreateShader: Copy> RawApiFunctions<CreateShader> {
    fn validate(&self, api: Api) -> AnalyzerResult<ApiFunctions<CreateShader>> {
        match (self.create_compiler, self.delete_compiler, self.create_shader, self.delete_shader) {
            (Some(create_compiler), Some(delete_compiler), Some(create_shader), Some(delete_shader)) => {
                Ok(ApiFunctions { create_compiler, delete_compiler, create_shader, delete_shader })
            }
            _ => Err(incomplete_table(&format!("{} callbacks", api))),
        }
    }
}

fn incomplete_table(what: &str) -> AnalyzerError {
    AnalyzerError::unavailable(format!("OpenCompiler returned no {}", what))
}

/// Copy ISA text out of backend-owned memory.
///
/// The text is a C string: it ends at the first NUL within `size` bytes, or at
/// `size` when there is none. Nothing after the first NUL is kept.
unsafe fn copy_backend_text(data: *const u8, size: usize) -> Vec<u8> {
    if data.is_null() {
        return Vec::new();
    }
    let bytes = slice::from_raw_parts(data, size);
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    bytes[..end].to_vec()
}

/// The Intel GPU compiler library with its opened function table.
pub struct IgcLibrary {
    dx11: ApiFunctions<PfnCreateShaderDx11>,
    dx12: ApiFunctions<PfnCreateShaderDx12>,
    enum_platforms: PfnEnumPlatforms,
    get_isa_text: PfnGetIsaText,
    get_isa_binary: PfnGetIsaBinary,
    get_last_error: PfnGetLastError,
    _library: Library,
}

impl IgcLibrary {
    /// Load the library, call `OpenCompiler` and validate the returned table.
    pub fn load(path: &Path) -> AnalyzerResult<Self> {
        log::debug!("Loading ISA backend from {}", path.display());
        let library = unsafe { Library::new(path) }.map_err(|e| {
            log::debug!("{}", e);
            AnalyzerError::unavailable(format!("Failed to load: {}", path.display()))
        })?;

        let open_compiler = unsafe {
            *library.get::<PfnOpenCompiler>(OPEN_COMPILER_SYMBOL).map_err(|_| {
                AnalyzerError::unavailable("GetProcAddress failed for: OpenCompiler")
            })?
        };

        let mut table = RawFunctionTable {
            dx11: RawApiFunctions {
                create_compiler: None,
                delete_compiler: None,
                create_shader: None,
                delete_shader: None,
            },
            dx12: RawApiFunctions {
                create_compiler: None,
                delete_compiler: None,
                create_shader: None,
                delete_shader: None,
            },
            enum_platforms: None,
            get_isa_text: None,
            get_isa_binary: None,
            get_last_error: None,
        };
        let mut desc = OpenCompilerDesc {
            interface_version: INTERFACE_VERSION,
            compiler_funcs: &mut table,
        };

        if !unsafe { open_compiler(&mut desc) } {
            return Err(AnalyzerError::unavailable("OpenCompiler failed"));
        }

        Ok(Self {
            dx11: table.dx11.validate(Api::Dx11)?,
            dx12: table.dx12.validate(Api::Dx12)?,
            enum_platforms: table.enum_platforms.ok_or_else(|| incomplete_table("EnumPlatforms"))?,
            get_isa_text: table.get_isa_text.ok_or_else(|| incomplete_table("GetIsaText"))?,
            get_isa_binary: table.get_isa_binary.ok_or_else(|| incomplete_table("GetIsaBinary"))?,
            get_last_error: table.get_last_error.ok_or_else(|| incomplete_table("GetLastError"))?,
            _library: library,
        })
    }
}

impl IsaBackend for IgcLibrary {
    fn enumerate_platforms(&self) -> Vec<PlatformDescriptor> {
        let count = unsafe { (self.enum_platforms)(ptr::null_mut(), 0) };
        let mut raw = vec![
            RawPlatformInfo { identifier: 0, platform_name: ptr::null() };
            count
        ];
        let filled = unsafe { (self.enum_platforms)(raw.as_mut_ptr(), raw.len()) };
        raw.truncate(filled.min(count));
        log::debug!("Backend reports {} platforms", raw.len());

        raw.iter()
            .map(|info| {
                let name = if info.platform_name.is_null() {
                    String::new()
                } else {
                    unsafe { CStr::from_ptr(info.platform_name) }.to_string_lossy().into_owned()
                };
                PlatformDescriptor::new(Platform::from_raw(info.identifier), name)
            })
            .collect()
    }

    fn create_compiler(&self, api: Api, platform: Platform) -> Option<OpaqueHandle> {
        let create = match api {
            Api::Dx11 => self.dx11.create_compiler,
            Api::Dx12 => self.dx12.create_compiler,
        };
        let mut compiler = ptr::null_mut();
        let ok = unsafe { create(platform.to_raw(), &mut compiler) };
        ok.then(|| OpaqueHandle::from_raw(compiler))
    }

    fn delete_compiler(&self, api: Api, compiler: OpaqueHandle) {
        let delete = match api {
            Api::Dx11 => self.dx11.delete_compiler,
            Api::Dx12 => self.dx12.delete_compiler,
        };
        let mut raw = compiler.as_raw();
        unsafe { delete(&mut raw) };
    }

    fn create_shader(&self, compiler: OpaqueHandle, input: &ShaderInput<'_>) -> Option<OpaqueHandle> {
        let mut shader = ptr::null_mut();
        let ok = match *input {
            ShaderInput::Dx11 { bytecode } => {
                let record = ShaderInputDx11V1 { dxbc_bin: bytecode.as_ptr() as *const c_void };
                unsafe { (self.dx11.create_shader)(compiler.as_raw(), &record, &mut shader) }
            }
            ShaderInput::Dx12 { bytecode, root_signature } => {
                let record = ShaderInputDx12V1 {
                    dxbc_bin: bytecode.as_ptr() as *const c_void,
                    root_signature: root_signature.as_ptr() as *const c_void,
                    root_signature_size: root_signature.len(),
                };
                unsafe { (self.dx12.create_shader)(compiler.as_raw(), &record, &mut shader) }
            }
        };
        ok.then(|| OpaqueHandle::from_raw(shader))
    }

    fn delete_shader(&self, api: Api, shader: OpaqueHandle) {
        let delete = match api {
            Api::Dx11 => self.dx11.delete_shader,
            Api::Dx12 => self.dx12.delete_shader,
        };
        let mut raw = shader.as_raw();
        unsafe { delete(&mut raw) };
    }

    fn isa_text(&self, shader: OpaqueHandle) -> Option<Vec<u8>> {
        let mut size = 0usize;
        let text = unsafe { (self.get_isa_text)(shader.as_raw(), &mut size) };
        if text.is_null() {
            return None;
        }
        Some(unsafe { copy_backend_text(text as *const u8, size) })
    }

    fn isa_binary(&self, shader: OpaqueHandle) -> Option<Vec<u8>> {
        let mut size = 0usize;
        let data = unsafe { (self.get_isa_binary)(shader.as_raw(), &mut size) };
        if data.is_null() {
            return None;
        }
        let bytes = unsafe { slice::from_raw_parts(data as *const u8, size) };
        Some(bytes.to_vec())
    }

    fn last_error(&self) -> String {
        let text = unsafe { (self.get_last_error)() };
        if text.is_null() {
            return String::new();
        }
        unsafe { CStr::from_ptr(text) }.to_string_lossy().into_owned()
    }
}
