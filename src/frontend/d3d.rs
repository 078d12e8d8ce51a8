// This module binds the D3D HLSL compiler (d3dcompiler_47 or a compatible library) at
// run time with libloading. Two exports are resolved when the library is opened:
// D3DCompile for source compiles and D3DGetBlobPart for pulling the root signature out
// of a DXBC container. Results come back as ID3DBlob COM objects; Blob wraps them and
// releases the reference on drop, so every exit path gives the memory back to the
// library. Defines are passed through a MacroTable, which owns the null-terminated
// D3D_SHADER_MACRO array for the duration of the call.

//! Native D3D compiler binding.

use std::ffi::{c_char, c_void, CString};
use std::path::Path;
use std::ptr::{self, NonNull};
use std::slice;

use libloading::Library;

use super::macros::{MacroTable, RawShaderMacro};
use super::{BlobPart, CompileOutput, CompileRequest, FrontendCompiler};
use crate::core::{AnalyzerError, AnalyzerResult};

/// `D3D_COMPILE_STANDARD_FILE_INCLUDE`: resolve `#include` relative to the source file.
const STANDARD_FILE_INCLUDE: *mut c_void = 1 as *mut c_void;

type D3DCompileFn = unsafe extern "system" fn(
    src_data: *const c_void,
    src_data_size: usize,
    source_name: *const c_char,
    defines: *const RawShaderMacro,
    include: *mut c_void,
    entry_point: *const c_char,
    target: *const c_char,
    flags1: u32,
    flags2: u32,
    code: *mut *mut RawBlob,
    error_msgs: *mut *mut RawBlob,
) -> i32;

type D3DGetBlobPartFn = unsafe extern "system" fn(
    src_data: *const c_void,
    src_data_size: usize,
    part: u32,
    flags: u32,
    blob: *mut *mut RawBlob,
) -> i32;

/// `ID3DBlob` vtable.
#[repr(C)]
#[allow(dead_code)]
struct BlobVtbl {
    query_interface:
        unsafe extern "system" fn(*mut RawBlob, *const c_void, *mut *mut c_void) -> i32,
    add_ref: unsafe extern "system" fn(*mut RawBlob) -> u32,
    release: unsafe extern "system" fn(*mut RawBlob) -> u32,
    get_buffer_pointer: unsafe extern "system" fn(*mut RawBlob) -> *mut c_void,
    get_buffer_size: unsafe extern "system" fn(*mut RawBlob) -> usize,
}

#[repr(C)]
struct RawBlob {
    vtbl: *const BlobVtbl,
}

/// Owned `ID3DBlob` reference.
struct Blob(NonNull<RawBlob>);

impl Blob {
    /// Take ownership of a reference returned through an out-parameter.
    unsafe fn from_raw(raw: *mut RawBlob) -> Option<Self> {
        NonNull::new(raw).map(Self)
    }

    fn as_bytes(&self) -> &[u8] {
        let raw = self.0.as_ptr();
        unsafe {
            let vtbl = &*(*raw).vtbl;
            let data = (vtbl.get_buffer_pointer)(raw) as *const u8;
            let size = (vtbl.get_buffer_size)(raw);
            if data.is_null() || size == 0 {
                &[]
            } else {
                slice::from_raw_parts(data, size)
            }
        }
    }

    /// Message blobs are NUL-terminated C strings.
    fn to_text(&self) -> String {
        let bytes = self.as_bytes();
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        String::from_utf8_lossy(&bytes[..end]).into_owned()
    }
}

impl Drop for Blob {
    fn drop(&mut self) {
        let raw = self.0.as_ptr();
        unsafe {
            ((*(*raw).vtbl).release)(raw);
        }
    }
}

fn succeeded(hr: i32) -> bool {
    hr >= 0
}

fn c_string(what: &str, value: &str) -> AnalyzerResult<CString> {
    CString::new(value)
        .map_err(|_| AnalyzerError::config(format!("{} contains a NUL byte", what)))
}

/// The D3D compiler library, loaded for the lifetime of the run.
pub struct D3dCompiler {
    compile: D3DCompileFn,
    get_blob_part: D3DGetBlobPartFn,
    _library: Library,
}

impl D3dCompiler {
    /// Load the library and resolve `D3DCompile` and `D3DGetBlobPart`.
    pub fn load(path: &Path) -> AnalyzerResult<Self> {
        log::debug!("Loading D3D compiler from {}", path.display());
        let library = unsafe { Library::new(path) }.map_err(|e| {
            log::debug!("{}", e);
            AnalyzerError::unavailable(format!(
                "Failed to load D3D compiler dll from: {}",
                path.display()
            ))
        })?;

        unsafe {
            let compile = *library
                .get::<D3DCompileFn>(b"D3DCompile\0")
                .map_err(|_| AnalyzerError::unavailable("GetProcAddress failed for D3DCompile"))?;
            let get_blob_part = *library
                .get::<D3DGetBlobPartFn>(b"D3DGetBlobPart\0")
                .map_err(|_| {
                    AnalyzerError::unavailable("GetProcAddress failed for D3DGetBlobPart")
                })?;

            Ok(Self { compile, get_blob_part, _library: library })
        }
    }
}

impl FrontendCompiler for D3dCompiler {
    fn compile(&self, request: &CompileRequest<'_>) -> AnalyzerResult<CompileOutput> {
        let macros = MacroTable::new(request.defines)?;
        let file_name = c_string("Source file name", request.file_name)?;
        let entry_point = c_string("Entry point", request.entry_point)?;
        let profile = c_string("Profile", request.profile)?;

        let mut code = ptr::null_mut();
        let mut messages = ptr::null_mut();
        let (hr, code, messages) = unsafe {
            let hr = (self.compile)(
                request.source.as_ptr() as *const c_void,
                request.source.len(),
                file_name.as_ptr(),
                macros.as_ptr(),
                STANDARD_FILE_INCLUDE,
                entry_point.as_ptr(),
                profile.as_ptr(),
                request.flags1,
                request.flags2,
                &mut code,
                &mut messages,
            );
            (hr, Blob::from_raw(code), Blob::from_raw(messages))
        };

        log::trace!("D3DCompile({}, {}) -> {:#010x}", request.entry_point, request.profile, hr);
        Ok(CompileOutput {
            succeeded: succeeded(hr),
            code: code.map(|blob| blob.as_bytes().to_vec()),
            diagnostics: messages.map(|blob| blob.to_text()),
        })
    }

    fn extract_blob_part(&self, bytecode: &[u8], part: BlobPart) -> Option<Vec<u8>> {
        let mut blob = ptr::null_mut();
        let (hr, blob) = unsafe {
            let hr = (self.get_blob_part)(
                bytecode.as_ptr() as *const c_void,
                bytecode.len(),
                part.to_raw(),
                0,
                &mut blob,
            );
            (hr, Blob::from_raw(blob))
        };

        log::trace!("D3DGetBlobPart({:?}) -> {:#010x}", part, hr);
        if succeeded(hr) {
            blob.map(|blob| blob.as_bytes().to_vec())
        } else {
            None
        }
    }
}
