// This module defines the two configuration bags built once from the command line:
// FrontendOptions (everything the HLSL compiler and the root signature resolver need)
// and GenerationOptions (API selection, platform filter, output prefix and library
// paths for the ISA backend). Defaults match the long-standing behaviour of the tool:
// entry point "main", root signature profile "rootsig_1_0", d3dcompiler_47 as the
// frontend library and "./isa_" as the output prefix. The module also provides the
// small parsers the command line relies on: source kind, -D macro definitions, and
// C-style numeric flags.

//! Frontend and generation configuration.

use std::path::PathBuf;
use std::str::FromStr;

use super::error::{AnalyzerError, AnalyzerResult};
use crate::backend::Api;

pub const DEFAULT_ENTRY_POINT: &str = "main";
pub const DEFAULT_ROOTSIG_PROFILE: &str = "rootsig_1_0";
pub const DEFAULT_FRONTEND_LIBRARY: &str = "d3dcompiler_47.dll";
pub const DEFAULT_ISA_PREFIX: &str = "./isa_";

#[cfg(target_pointer_width = "64")]
pub const DEFAULT_BACKEND_LIBRARY: &str = "IntelGpuCompiler64.dll";
#[cfg(not(target_pointer_width = "64"))]
pub const DEFAULT_BACKEND_LIBRARY: &str = "IntelGpuCompiler32.dll";

/// What kind of input file the run starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// HLSL text, compiled by the frontend library.
    Hlsl,
    /// Precompiled DXBC bytecode.
    Dxbc,
}

impl FromStr for SourceKind {
    type Err = AnalyzerError;

    fn from_str(s: &str) -> AnalyzerResult<Self> {
        if s.eq_ignore_ascii_case("hlsl") {
            Ok(Self::Hlsl)
        } else if s.eq_ignore_ascii_case("dxbc") {
            Ok(Self::Dxbc)
        } else {
            Err(AnalyzerError::config(format!("Source language: '{}' not recognized", s)))
        }
    }
}

/// A preprocessor definition passed to the HLSL compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderMacro {
    pub name: String,
    pub definition: String,
}

impl ShaderMacro {
    pub fn new(name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self { name: name.into(), definition: definition.into() }
    }

    /// Parse a `NAME=VALUE` definition. Only the first `=` splits; without one the
    /// replacement text is empty.
    pub fn parse(def: &str) -> Self {
        match def.split_once('=') {
            Some((name, value)) => Self::new(name, value),
            None => Self::new(def, ""),
        }
    }
}

/// Options consumed by the frontend compiler adapter and the root signature resolver.
#[derive(Debug, Clone)]
pub struct FrontendOptions {
    pub defines: Vec<ShaderMacro>,
    /// Name reported to the compiler for diagnostics and include resolution.
    pub file_name: String,
    pub entry_point: String,
    pub profile: Option<String>,
    pub flags: u32,
    pub library: PathBuf,
    /// Entry point of the root signature definition, usually a macro name.
    pub rootsig_entry: Option<String>,
    pub rootsig_profile: Option<String>,
}

impl Default for FrontendOptions {
    fn default() -> Self {
        Self {
            defines: Vec::new(),
            file_name: String::new(),
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            profile: None,
            flags: 0,
            library: PathBuf::from(DEFAULT_FRONTEND_LIBRARY),
            rootsig_entry: None,
            rootsig_profile: Some(DEFAULT_ROOTSIG_PROFILE.to_string()),
        }
    }
}

impl FrontendOptions {
    /// Entry point and profile for the root signature fallback compile, if both are set.
    pub fn rootsig_target(&self) -> Option<(&str, &str)> {
        match (&self.rootsig_entry, &self.rootsig_profile) {
            (Some(entry), Some(profile)) => Some((entry.as_str(), profile.as_str())),
            _ => None,
        }
    }
}

/// Options consumed by the backend driver.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub api: Api,
    /// Case-insensitive platform names; empty selects every enumerated platform.
    pub asic_filter: Vec<String>,
    pub isa_prefix: String,
    pub library: PathBuf,
    pub rootsig_file: Option<PathBuf>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            api: Api::Dx11,
            asic_filter: Vec::new(),
            isa_prefix: DEFAULT_ISA_PREFIX.to_string(),
            library: PathBuf::from(DEFAULT_BACKEND_LIBRARY),
            rootsig_file: None,
        }
    }
}

/// Parse compile flags with C `strtoul(s, NULL, 0)` base rules: `0x` selects hex,
/// a leading `0` selects octal, anything else is decimal.
pub fn parse_dx_flags(text: &str) -> AnalyzerResult<u32> {
    let trimmed = text.trim();
    let (digits, radix) = if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        (hex, 16)
    } else if trimmed.len() > 1 && trimmed.starts_with('0') {
        (&trimmed[1..], 8)
    } else {
        (trimmed, 10)
    };

    u32::from_str_radix(digits, radix)
        .map_err(|_| AnalyzerError::config(format!("Invalid value for --DXFlags: '{}'", text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dx_flags_follow_c_base_rules() {
        assert_eq!(parse_dx_flags("0x800").unwrap(), 0x800);
        assert_eq!(parse_dx_flags("0X1f").unwrap(), 0x1f);
        assert_eq!(parse_dx_flags("010").unwrap(), 8);
        assert_eq!(parse_dx_flags("0").unwrap(), 0);
        assert_eq!(parse_dx_flags("2048").unwrap(), 2048);
        assert!(parse_dx_flags("fast").is_err());
        assert!(parse_dx_flags("09").is_err());
    }

    #[test]
    fn macro_definitions_split_on_first_equals() {
        assert_eq!(ShaderMacro::parse("FOO=1"), ShaderMacro::new("FOO", "1"));
        assert_eq!(ShaderMacro::parse("EXPR=a=b"), ShaderMacro::new("EXPR", "a=b"));
        assert_eq!(ShaderMacro::parse("BARE"), ShaderMacro::new("BARE", ""));
    }

    #[test]
    fn source_kind_is_case_insensitive() {
        assert_eq!("HLSL".parse::<SourceKind>().unwrap(), SourceKind::Hlsl);
        assert_eq!("dxbc".parse::<SourceKind>().unwrap(), SourceKind::Dxbc);
        let err = "glsl".parse::<SourceKind>().unwrap_err();
        assert_eq!(err.to_string(), "Source language: 'glsl' not recognized");
    }

    #[test]
    fn rootsig_target_needs_entry_and_profile() {
        let mut opts = FrontendOptions::default();
        assert_eq!(opts.rootsig_target(), None);
        opts.rootsig_entry = Some("RS".into());
        assert_eq!(opts.rootsig_target(), Some(("RS", "rootsig_1_0")));
        opts.rootsig_profile = None;
        assert_eq!(opts.rootsig_target(), None);
    }
}
