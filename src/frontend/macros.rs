//! `D3D_SHADER_MACRO` table construction.
//!
//! The compiler walks the define array until it hits an entry whose name and
//! definition are both null, so the table always ends with that sentinel.

use std::ffi::{c_char, CString};
use std::ptr;

use crate::core::{AnalyzerError, AnalyzerResult, ShaderMacro};

/// Layout of `D3D_SHADER_MACRO`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawShaderMacro {
    pub name: *const c_char,
    pub definition: *const c_char,
}

impl RawShaderMacro {
    const SENTINEL: Self = Self { name: ptr::null(), definition: ptr::null() };

    pub fn is_sentinel(&self) -> bool {
        self.name.is_null() && self.definition.is_null()
    }
}

/// Null-terminated define array plus the strings it points into.
pub struct MacroTable {
    _strings: Vec<(CString, CString)>,
    entries: Vec<RawShaderMacro>,
}

impl MacroTable {
    pub fn new(defines: &[ShaderMacro]) -> AnalyzerResult<Self> {
        let strings = defines
            .iter()
            .map(|m| {
                let name = CString::new(m.name.as_str());
                let definition = CString::new(m.definition.as_str());
                match (name, definition) {
                    (Ok(name), Ok(definition)) => Ok((name, definition)),
                    _ => Err(AnalyzerError::config(format!(
                        "Macro definition contains a NUL byte: {}",
                        m.name.escape_default()
                    ))),
                }
            })
            .collect::<AnalyzerResult<Vec<_>>>()?;

        // CString keeps its heap buffer when the Vec moves, so the pointers stay valid.
        let mut entries: Vec<_> = strings
            .iter()
            .map(|(name, definition)| RawShaderMacro {
                name: name.as_ptr(),
                definition: definition.as_ptr(),
            })
            .collect();
        entries.push(RawShaderMacro::SENTINEL);

        Ok(Self { _strings: strings, entries })
    }

    /// Entries including the trailing sentinel.
    pub fn entries(&self) -> &[RawShaderMacro] {
        &self.entries
    }

    pub fn as_ptr(&self) -> *const RawShaderMacro {
        self.entries.as_ptr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn table_ends_with_null_sentinel() {
        let table = MacroTable::new(&[
            ShaderMacro::new("USE_FOG", "1"),
            ShaderMacro::new("LIGHTS", ""),
        ])
        .unwrap();

        let entries = table.entries();
        assert_eq!(entries.len(), 3);
        assert!(entries[2].is_sentinel());

        let name = unsafe { CStr::from_ptr(entries[0].name) };
        let definition = unsafe { CStr::from_ptr(entries[1].definition) };
        assert_eq!(name.to_str().unwrap(), "USE_FOG");
        assert_eq!(definition.to_str().unwrap(), "");
    }

    #[test]
    fn empty_define_list_is_just_the_sentinel() {
        let table = MacroTable::new(&[]).unwrap();
        assert_eq!(table.entries().len(), 1);
        assert!(table.entries()[0].is_sentinel());
    }

    #[test]
    fn interior_nul_is_rejected() {
        assert!(MacroTable::new(&[ShaderMacro::new("A\0B", "1")]).is_err());
    }
}
