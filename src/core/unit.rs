// This module holds the data model that flows through a run. CompilationUnit owns the
// DXBC bytecode, the (possibly empty) root signature, the HLSL text when compiling from
// source, and the ordered list of platforms to generate for. PlatformDescriptor pairs
// the backend's platform tag with its display name, which also names the output file.
// Platform mirrors the backend's platform enumeration but keeps unknown tags so newer
// backend libraries still round-trip through the driver.

//! Compilation unit and platform descriptors.

use std::fmt;

/// Platform tag understood by the Intel GPU compiler backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Skylake.
    Skl,
    /// Kabylake.
    Kbl,
    /// Icelake LP.
    IclLp,
    /// Tag reported by a newer backend that this build does not know by name.
    Other(i32),
}

impl Platform {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::Skl,
            1 => Self::Kbl,
            2 => Self::IclLp,
            other => Self::Other(other),
        }
    }

    pub fn to_raw(self) -> i32 {
        match self {
            Self::Skl => 0,
            Self::Kbl => 1,
            Self::IclLp => 2,
            Self::Other(raw) => raw,
        }
    }
}

/// A platform as enumerated by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDescriptor {
    pub id: Platform,
    pub name: String,
}

impl PlatformDescriptor {
    pub fn new(id: Platform, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

impl fmt::Display for PlatformDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Everything the backend driver needs for one run.
///
/// The frontend stage fills `bytecode` and, when one can be found, `root_signature`.
/// The platform list is filled from the backend enumeration just before generation.
#[derive(Debug, Clone, Default)]
pub struct CompilationUnit {
    pub bytecode: Vec<u8>,
    pub root_signature: Vec<u8>,
    /// HLSL source exactly as read from disk; it is never transcoded.
    pub source_text: Option<Vec<u8>>,
    pub platforms: Vec<PlatformDescriptor>,
}

impl CompilationUnit {
    pub fn from_bytecode(bytecode: Vec<u8>) -> Self {
        Self { bytecode, ..Self::default() }
    }

    pub fn from_source(source_text: Vec<u8>) -> Self {
        Self { source_text: Some(source_text), ..Self::default() }
    }

    pub fn has_root_signature(&self) -> bool {
        !self.root_signature.is_empty()
    }
}
