//! Root signature resolution.
//!
//! A DX12 shader needs a root signature. It is looked up in order:
//! 1. embedded in the DXBC container (`D3DGetBlobPart`),
//! 2. compiled from the same HLSL source using the root signature entry point and
//!    profile, when both are configured and source text is available,
//! 3. otherwise there is none, which is a valid outcome.

use super::{report_diagnostics, BlobPart, CompileRequest, FrontendCompiler};
use crate::core::{AnalyzerError, AnalyzerResult, FrontendOptions, Reporter};

/// Find the root signature belonging to `bytecode`.
///
/// Returns `Ok(None)` when nothing is embedded and no fallback compile is configured.
/// A fallback compile that the library rejects is returned as
/// [`AnalyzerError::Compile`] after its diagnostics have been reported.
pub fn resolve_root_signature(
    frontend: &dyn FrontendCompiler,
    bytecode: &[u8],
    source: Option<&[u8]>,
    opts: &FrontendOptions,
    reporter: &mut dyn Reporter,
) -> AnalyzerResult<Option<Vec<u8>>> {
    if let Some(embedded) = frontend.extract_blob_part(bytecode, BlobPart::RootSignature) {
        log::debug!("Using embedded root signature ({} bytes)", embedded.len());
        return Ok(Some(embedded));
    }

    let (Some(source), Some((entry_point, profile))) = (source, opts.rootsig_target()) else {
        log::debug!("No embedded root signature and no fallback configured");
        return Ok(None);
    };

    log::info!("Compiling root signature {} ({})", entry_point, profile);
    let output = frontend.compile(&CompileRequest {
        source,
        file_name: &opts.file_name,
        defines: &opts.defines,
        entry_point,
        profile,
        flags1: opts.flags,
        flags2: 0,
    })?;

    report_diagnostics(&output, reporter);
    if !output.succeeded {
        return Err(AnalyzerError::Compile {
            entry_point: entry_point.to_string(),
            profile: profile.to_string(),
        });
    }

    Ok(output.code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_utils::StubFrontend;

    fn with_rootsig_macro() -> FrontendOptions {
        FrontendOptions {
            file_name: "shader.hlsl".into(),
            rootsig_entry: Some("MyRS".into()),
            ..FrontendOptions::default()
        }
    }

    #[test]
    fn embedded_root_signature_skips_fallback_compile() {
        let frontend = StubFrontend::new()
            .embeds(b"DXBC", b"embedded")
            .compiles("MyRS", b"compiled");

        let resolved = resolve_root_signature(
            &frontend, b"DXBC", Some(&b"src"[..]), &with_rootsig_macro(), &mut Vec::new(),
        )
        .unwrap();

        assert_eq!(resolved.as_deref(), Some(&b"embedded"[..]));
        assert_eq!(frontend.compile_calls_for("MyRS"), 0);
    }

    #[test]
    fn absent_without_fallback_configuration() {
        let frontend = StubFrontend::new().compiles("MyRS", b"compiled");
        let opts = FrontendOptions {
            rootsig_entry: None,
            rootsig_profile: None,
            ..FrontendOptions::default()
        };

        let resolved =
            resolve_root_signature(&frontend, b"DXBC", Some(&b"src"[..]), &opts, &mut Vec::new())
                .unwrap();

        assert_eq!(resolved, None);
        assert_eq!(frontend.compile_calls(), 0);
    }

    #[test]
    fn fallback_compiles_root_signature_once() {
        let frontend = StubFrontend::new().compiles("MyRS", b"compiled");

        let resolved = resolve_root_signature(
            &frontend, b"DXBC", Some(&b"src"[..]), &with_rootsig_macro(), &mut Vec::new(),
        )
        .unwrap();

        assert_eq!(resolved.as_deref(), Some(&b"compiled"[..]));
        assert_eq!(frontend.compile_calls_for("MyRS"), 1);
        assert_eq!(frontend.last_profile().as_deref(), Some("rootsig_1_0"));
    }

    #[test]
    fn fallback_failure_is_a_compile_error() {
        let frontend = StubFrontend::new().fail_compile("MyRS", "undeclared identifier");
        let mut reports = Vec::new();

        let err = resolve_root_signature(
            &frontend, b"DXBC", Some(&b"src"[..]), &with_rootsig_macro(), &mut reports,
        )
        .unwrap_err();

        assert!(matches!(err, AnalyzerError::Compile { ref entry_point, .. } if entry_point == "MyRS"));
        assert_eq!(reports, vec!["undeclared identifier".to_string()]);
        assert_eq!(frontend.compile_calls_for("MyRS"), 1);
    }

    #[test]
    fn bytecode_input_has_no_source_to_recompile() {
        let frontend = StubFrontend::new().compiles("MyRS", b"compiled");

        let resolved =
            resolve_root_signature(&frontend, b"DXBC", None, &with_rootsig_macro(), &mut Vec::new())
                .unwrap();

        assert_eq!(resolved, None);
        assert_eq!(frontend.compile_calls(), 0);
        assert_eq!(frontend.extract_calls(), 1);
    }
}
