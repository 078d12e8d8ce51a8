//! Command line for the `shader-analyzer` binary.
//!
//! Typical invocations:
//!
//! ```text
//! shader-analyzer -s hlsl -p ps_5_0 -f main shader.hlsl
//! shader-analyzer -s dxbc --api dx12 --rootsig_file rs.bin shader.dxbc
//! shader-analyzer --list-asics
//! ```

use std::path::PathBuf;

use clap::Parser;

use crate::core::{
    options::{
        DEFAULT_BACKEND_LIBRARY, DEFAULT_ENTRY_POINT, DEFAULT_FRONTEND_LIBRARY,
        DEFAULT_ISA_PREFIX, DEFAULT_ROOTSIG_PROFILE,
    },
    parse_dx_flags, AnalyzerError, AnalyzerResult, FrontendOptions, GenerationOptions,
    ShaderMacro,
};
use crate::pipeline::RunConfig;

#[derive(Parser, Debug)]
#[command(
    name = "shader-analyzer",
    version,
    about = "Generate Intel GPU ISA disassembly from HLSL or DXBC",
    after_help = "To compile hlsl use:  -s hlsl -p <profile> -f <function> <filename>\n\
                  To compile dxbc use:  -s dxbc <filename>"
)]
pub struct Cli {
    /// List the platforms supported by the ISA backend and exit
    #[arg(short = 'l', long = "list-asics")]
    pub list_asics: bool,

    /// Only generate for this platform (repeatable, case-insensitive)
    #[arg(short = 'c', long = "asic", value_name = "NAME")]
    pub asics: Vec<String>,

    /// Generation API: dx11 or dx12
    #[arg(long = "api", default_value = "dx11")]
    pub api: String,

    /// Source language of the input file: hlsl or dxbc
    #[arg(short = 's', default_value = "dxbc", value_name = "LANG")]
    pub source: String,

    /// Root signature to use when none is embedded or compiled
    #[arg(long = "rootsig_file", value_name = "PATH")]
    pub rootsig_file: Option<PathBuf>,

    /// Profile used to compile the root signature from HLSL
    #[arg(long = "rootsig_profile", default_value = DEFAULT_ROOTSIG_PROFILE)]
    pub rootsig_profile: String,

    /// Root signature entry point (usually a #define) in the HLSL source
    #[arg(long = "rootsig_macro", value_name = "NAME")]
    pub rootsig_macro: Option<String>,

    /// Prefix for the generated <prefix><platform>.asm files
    #[arg(long = "isa", value_name = "PREFIX", default_value = DEFAULT_ISA_PREFIX)]
    pub isa_prefix: String,

    /// Preprocessor definition NAME[=VALUE] (repeatable)
    #[arg(short = 'D', value_name = "NAME=VALUE")]
    pub defines: Vec<String>,

    /// HLSL target profile, e.g. ps_5_0
    #[arg(short = 'p', long = "profile")]
    pub profile: Option<String>,

    /// HLSL entry point
    #[arg(short = 'f', long = "function", default_value = DEFAULT_ENTRY_POINT)]
    pub function: String,

    /// D3DCompile flags (decimal, 0x hex or 0 octal)
    #[arg(long = "DXFlags", alias = "dxflags", value_name = "FLAGS")]
    pub dx_flags: Option<String>,

    /// Path of the D3D compiler library
    #[arg(
        long = "DXLocation",
        alias = "dxlocation",
        value_name = "PATH",
        default_value = DEFAULT_FRONTEND_LIBRARY
    )]
    pub dx_location: PathBuf,

    /// Path of the Intel GPU compiler library
    #[arg(long = "backend", value_name = "PATH", default_value = DEFAULT_BACKEND_LIBRARY)]
    pub backend: PathBuf,

    /// Input file (HLSL source or DXBC bytecode)
    pub input: Option<PathBuf>,
}

/// What the command line asked for.
#[derive(Debug, Clone)]
pub enum Command {
    ListPlatforms(GenerationOptions),
    Generate(RunConfig),
}

impl Cli {
    fn generation_options(&self) -> AnalyzerResult<GenerationOptions> {
        Ok(GenerationOptions {
            api: self.api.parse()?,
            asic_filter: self.asics.clone(),
            isa_prefix: self.isa_prefix.clone(),
            library: self.backend.clone(),
            rootsig_file: self.rootsig_file.clone(),
        })
    }

    /// Validate the options into a command. Nothing native is touched here.
    pub fn into_command(self) -> AnalyzerResult<Command> {
        if self.list_asics {
            return Ok(Command::ListPlatforms(GenerationOptions {
                library: self.backend,
                ..GenerationOptions::default()
            }));
        }

        let generation = self.generation_options()?;
        let input_file = self
            .input
            .ok_or_else(|| AnalyzerError::config("No input filename"))?;
        let source_kind = self.source.parse()?;
        let flags = match &self.dx_flags {
            Some(text) => parse_dx_flags(text)?,
            None => 0,
        };

        let frontend = FrontendOptions {
            defines: self.defines.iter().map(|def| ShaderMacro::parse(def)).collect(),
            file_name: input_file.display().to_string(),
            entry_point: self.function,
            profile: self.profile,
            flags,
            library: self.dx_location,
            rootsig_entry: self.rootsig_macro,
            rootsig_profile: Some(self.rootsig_profile),
        };

        Ok(Command::Generate(RunConfig { source_kind, input_file, frontend, generation }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Api;
    use crate::core::SourceKind;

    fn parse(args: &[&str]) -> AnalyzerResult<Command> {
        let mut argv = vec!["shader-analyzer"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().into_command()
    }

    #[test]
    fn defaults_match_dxbc_dx11() {
        let Command::Generate(config) = parse(&["shader.dxbc"]).unwrap() else {
            panic!("expected generate");
        };
        assert_eq!(config.source_kind, SourceKind::Dxbc);
        assert_eq!(config.generation.api, Api::Dx11);
        assert_eq!(config.generation.isa_prefix, "./isa_");
        assert_eq!(config.frontend.entry_point, "main");
        assert_eq!(config.frontend.rootsig_profile.as_deref(), Some("rootsig_1_0"));
        assert_eq!(config.frontend.library, PathBuf::from("d3dcompiler_47.dll"));
        assert!(config.generation.asic_filter.is_empty());
    }

    #[test]
    fn hlsl_options_are_collected() {
        let command = parse(&[
            "-s", "HLSL", "-p", "cs_5_1", "-f", "CSMain", "-D", "TILE=16", "-D", "FAST",
            "--DXFlags", "0x800", "--api", "DX12", "--rootsig_macro", "RS",
            "-c", "skl", "--asic", "KBL", "--isa", "out/", "shader.hlsl",
        ])
        .unwrap();
        let Command::Generate(config) = command else {
            panic!("expected generate");
        };

        assert_eq!(config.source_kind, SourceKind::Hlsl);
        assert_eq!(config.generation.api, Api::Dx12);
        assert_eq!(config.generation.asic_filter, ["skl", "KBL"]);
        assert_eq!(config.generation.isa_prefix, "out/");
        assert_eq!(config.frontend.profile.as_deref(), Some("cs_5_1"));
        assert_eq!(config.frontend.entry_point, "CSMain");
        assert_eq!(config.frontend.flags, 0x800);
        assert_eq!(config.frontend.file_name, "shader.hlsl");
        assert_eq!(config.frontend.rootsig_target(), Some(("RS", "rootsig_1_0")));
        assert_eq!(
            config.frontend.defines,
            [ShaderMacro::new("TILE", "16"), ShaderMacro::new("FAST", "")]
        );
    }

    #[test]
    fn lowercase_dx_options_are_accepted() {
        let command = parse(&["--dxflags", "010", "--dxlocation", "d3dcompiler_46.dll", "a.dxbc"])
            .unwrap();
        let Command::Generate(config) = command else {
            panic!("expected generate");
        };
        assert_eq!(config.frontend.flags, 8);
        assert_eq!(config.frontend.library, PathBuf::from("d3dcompiler_46.dll"));
    }

    #[test]
    fn list_asics_needs_no_input() {
        let command = parse(&["--list-asics", "--backend", "igc.so"]).unwrap();
        let Command::ListPlatforms(opts) = command else {
            panic!("expected list");
        };
        assert_eq!(opts.library, PathBuf::from("igc.so"));
    }

    #[test]
    fn config_errors() {
        assert_eq!(parse(&[]).unwrap_err().to_string(), "No input filename");
        assert_eq!(
            parse(&["--api", "metal", "a.dxbc"]).unwrap_err().to_string(),
            "Unrecognized API: metal"
        );
        assert_eq!(
            parse(&["-s", "spirv", "a.spv"]).unwrap_err().to_string(),
            "Source language: 'spirv' not recognized"
        );
        assert!(parse(&["--DXFlags", "lots", "a.dxbc"]).is_err());
    }
}
