// This module is the backend driver. For each selected platform it runs the same fixed
// sequence: create a compiler context, create the shader, pull the ISA text, write it
// to "<prefix><platform>.asm", then delete the shader and the context. Platforms are
// processed one at a time in enumeration order, and the first failure stops the whole
// run. The input check for the active API happens once, before the first platform.
// Handle deletion is tied to GeneratorContext/ShaderArtifact drops, so a failure at
// any stage still releases whatever the backend already handed out. The module also
// owns platform selection (case-insensitive name filter that keeps enumeration order)
// and the output file naming.

//! Backend driver: per-platform ISA generation.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::backend::{api::generation_error, Api, IsaBackend};
use crate::core::{
    AnalyzerError, AnalyzerResult, CompilationUnit, GenerationStage, PlatformDescriptor,
    RunSession,
};

/// Narrow `platforms` to those named in `filter`, compared case-insensitively.
///
/// The result keeps the enumeration order of `platforms`, not the order of `filter`.
/// An empty filter keeps every platform.
pub fn select_platforms(
    platforms: Vec<PlatformDescriptor>,
    filter: &[String],
) -> Vec<PlatformDescriptor> {
    if filter.is_empty() {
        return platforms;
    }

    platforms
        .into_iter()
        .filter(|platform| {
            filter
                .iter()
                .any(|name| name.eq_ignore_ascii_case(&platform.name))
        })
        .collect()
}

/// Output path for a platform: `{prefix}{platform name}.asm`.
pub fn isa_file_name(prefix: &str, platform: &PlatformDescriptor) -> PathBuf {
    PathBuf::from(format!("{}{}.asm", prefix, platform.name))
}

fn write_isa(path: &Path, text: &[u8]) -> AnalyzerResult<()> {
    let to_error = |source| AnalyzerError::OutputWrite { path: path.to_path_buf(), source };
    let mut file = File::create(path).map_err(to_error)?;
    file.write_all(text).map_err(to_error)?;
    log::info!("Wrote {} ({} bytes)", path.display(), text.len());
    Ok(())
}

/// Generate ISA for every platform in `unit.platforms`.
pub fn run(
    backend: &dyn IsaBackend,
    api: Api,
    unit: &CompilationUnit,
    isa_prefix: &str,
    session: &mut RunSession,
) -> AnalyzerResult<()> {
    api.check_inputs(unit)?;

    for platform in &unit.platforms {
        generate_platform(backend, api, unit, platform, isa_prefix, session)?;
    }

    Ok(())
}

fn generate_platform(
    backend: &dyn IsaBackend,
    api: Api,
    unit: &CompilationUnit,
    platform: &PlatformDescriptor,
    isa_prefix: &str,
    session: &mut RunSession,
) -> AnalyzerResult<()> {
    log::debug!("Generating {} ISA for {}", api, platform);

    let context = api.create_context(backend, platform)?;
    let artifact = api.create_artifact(&context, unit)?;
    let text = artifact
        .isa_text()
        .ok_or_else(|| generation_error(backend, platform, GenerationStage::ExtractText))?;

    let path = isa_file_name(isa_prefix, platform);
    write_isa(&path, &text)?;
    session.record_platform_written(&platform.name, &path, text.len());

    drop(artifact);
    drop(context);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Platform;

    fn enumerated() -> Vec<PlatformDescriptor> {
        vec![
            PlatformDescriptor::new(Platform::Skl, "SKL"),
            PlatformDescriptor::new(Platform::Kbl, "KBL"),
            PlatformDescriptor::new(Platform::IclLp, "ICLLP"),
            PlatformDescriptor::new(Platform::Other(3), "TGLLP"),
            PlatformDescriptor::new(Platform::Other(4), "DG2"),
        ]
    }

    #[test]
    fn filter_keeps_enumeration_order() {
        let filter = vec!["tgllp".to_string(), "Skl".to_string()];
        let selected = select_platforms(enumerated(), &filter);

        let names: Vec<_> = selected.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["SKL", "TGLLP"]);
        assert_eq!(selected[1].id, Platform::Other(3));
    }

    #[test]
    fn empty_filter_selects_everything() {
        assert_eq!(select_platforms(enumerated(), &[]).len(), 5);
    }

    #[test]
    fn unknown_names_select_nothing() {
        assert!(select_platforms(enumerated(), &["XeHP".to_string()]).is_empty());
    }

    #[test]
    fn file_name_is_prefix_and_platform() {
        let skl = PlatformDescriptor::new(Platform::Skl, "SKL");
        assert_eq!(isa_file_name("./isa_", &skl), PathBuf::from("./isa_SKL.asm"));
        assert_eq!(isa_file_name("", &skl), PathBuf::from("SKL.asm"));
    }
}
