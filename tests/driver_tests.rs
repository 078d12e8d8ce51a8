//! Per-platform generation against the stub backend.

use std::fs;
use std::path::Path;

use shader_analyzer::core::test_utils::{BackendCall, StubBackend};
use shader_analyzer::core::{GenerationStage, RunSession};
use shader_analyzer::driver;
use shader_analyzer::{AnalyzerError, Api, CompilationUnit, IsaBackend};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn prefix_in(dir: &Path) -> String {
    format!("{}/isa_", dir.display())
}

fn unit_for(backend: &StubBackend, bytecode: &[u8], root_signature: &[u8]) -> CompilationUnit {
    CompilationUnit {
        bytecode: bytecode.to_vec(),
        root_signature: root_signature.to_vec(),
        platforms: backend.enumerate_platforms(),
        ..CompilationUnit::default()
    }
}

fn two_platforms() -> StubBackend {
    StubBackend::new()
        .platform("SKL", "// SKL isa\nmov (8) r1 r2\n")
        .platform("KBL", "// KBL isa\nadd (16) r3 r4 r5\n")
}

#[test]
fn dx11_writes_one_file_per_platform() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let prefix = prefix_in(dir.path());
    let backend = two_platforms();
    let unit = unit_for(&backend, b"DXBC", b"");
    let mut session = RunSession::new();

    driver::run(&backend, Api::Dx11, &unit, &prefix, &mut session).unwrap();

    let skl = fs::read_to_string(dir.path().join("isa_SKL.asm")).unwrap();
    let kbl = fs::read_to_string(dir.path().join("isa_KBL.asm")).unwrap();
    assert_eq!(skl, "// SKL isa\nmov (8) r1 r2\n");
    assert_eq!(kbl, "// KBL isa\nadd (16) r3 r4 r5\n");

    let stats = session.stats();
    assert_eq!(stats.platforms_processed, 2);
    assert_eq!(stats.files_written.len(), 2);
    assert_eq!(stats.largest_isa_platform, "KBL");
}

#[test]
fn every_handle_is_released_in_order() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let backend = two_platforms();
    let unit = unit_for(&backend, b"DXBC", b"");

    driver::run(&backend, Api::Dx11, &unit, &prefix_in(dir.path()), &mut RunSession::new())
        .unwrap();

    let expected = ["SKL", "KBL"]
        .iter()
        .flat_map(|name| {
            let name = name.to_string();
            [
                BackendCall::CreateCompiler(Api::Dx11, name.clone()),
                BackendCall::CreateShader(Api::Dx11, name.clone()),
                BackendCall::IsaText(name.clone()),
                BackendCall::DeleteShader(Api::Dx11, name.clone()),
                BackendCall::DeleteCompiler(Api::Dx11, name),
            ]
        })
        .collect::<Vec<_>>();
    assert_eq!(backend.calls(), expected);
    assert_eq!(backend.live_handles(), 0);
}

#[test]
fn dx12_hands_both_inputs_to_the_backend() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let backend = StubBackend::new().platform("SKL", "isa");
    let unit = unit_for(&backend, b"DXBC", b"RTS0");

    driver::run(&backend, Api::Dx12, &unit, &prefix_in(dir.path()), &mut RunSession::new())
        .unwrap();

    assert_eq!(
        backend.last_input(),
        Some((Api::Dx12, b"DXBC".to_vec(), b"RTS0".to_vec()))
    );
    assert_eq!(
        backend.count(|call| matches!(call, BackendCall::CreateCompiler(Api::Dx12, _))),
        1
    );
}

#[test]
fn dx12_without_root_signature_touches_no_platform() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let backend = two_platforms();
    let unit = unit_for(&backend, b"DXBC", b"");

    let err = driver::run(&backend, Api::Dx12, &unit, &prefix_in(dir.path()), &mut RunSession::new())
        .unwrap_err();

    assert!(matches!(err, AnalyzerError::MissingInput { what: "root signature" }));
    assert_eq!(err.to_string(), "Missing root signature");
    assert!(backend.calls().is_empty());
    assert!(!dir.path().join("isa_SKL.asm").exists());
}

#[test]
fn empty_bytecode_is_rejected_for_either_api() {
    init_logging();
    let backend = two_platforms();
    let unit = unit_for(&backend, b"", b"RTS0");

    for api in [Api::Dx11, Api::Dx12] {
        let err = driver::run(&backend, api, &unit, "unused_", &mut RunSession::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing shader bytecode");
    }
    assert!(backend.calls().is_empty());
}

#[test]
fn failure_on_second_platform_keeps_first_output() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let backend = two_platforms().fail_shader("KBL", "unsupported opcode dcl_uav_typed");
    let unit = unit_for(&backend, b"DXBC", b"");
    let mut session = RunSession::new();

    let err = driver::run(&backend, Api::Dx11, &unit, &prefix_in(dir.path()), &mut session)
        .unwrap_err();

    match &err {
        AnalyzerError::Generation { platform, stage, message } => {
            assert_eq!(platform, "KBL");
            assert_eq!(*stage, GenerationStage::CreateArtifact);
            assert_eq!(message, "unsupported opcode dcl_uav_typed");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.to_string(), "ERROR: unsupported opcode dcl_uav_typed");

    assert!(dir.path().join("isa_SKL.asm").exists());
    assert!(!dir.path().join("isa_KBL.asm").exists());
    assert_eq!(session.stats().platforms_processed, 1);

    // The KBL context was still deleted after its shader failed.
    assert_eq!(
        backend.count(|call| *call == BackendCall::DeleteCompiler(Api::Dx11, "KBL".into())),
        1
    );
    assert_eq!(backend.live_handles(), 0);
}

#[test]
fn context_failure_stops_before_any_shader() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let backend = two_platforms().fail_context("SKL", "platform not supported");
    let unit = unit_for(&backend, b"DXBC", b"");

    let err = driver::run(&backend, Api::Dx11, &unit, &prefix_in(dir.path()), &mut RunSession::new())
        .unwrap_err();

    assert!(matches!(
        err,
        AnalyzerError::Generation { stage: GenerationStage::CreateContext, .. }
    ));
    assert_eq!(err.to_string(), "ERROR: platform not supported");
    assert_eq!(backend.calls(), vec![BackendCall::CreateCompiler(Api::Dx11, "SKL".into())]);
    assert_eq!(backend.live_handles(), 0);
}

#[test]
fn missing_isa_text_reports_last_error() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let backend = StubBackend::new()
        .platform("SKL", "isa")
        .no_isa_text("SKL", "no disassembly available");
    let unit = unit_for(&backend, b"DXBC", b"");

    let err = driver::run(&backend, Api::Dx11, &unit, &prefix_in(dir.path()), &mut RunSession::new())
        .unwrap_err();

    assert!(matches!(
        err,
        AnalyzerError::Generation { stage: GenerationStage::ExtractText, .. }
    ));
    assert_eq!(err.to_string(), "ERROR: no disassembly available");
    assert!(!dir.path().join("isa_SKL.asm").exists());
    assert_eq!(backend.live_handles(), 0);
}

#[test]
fn unwritable_prefix_is_an_output_error() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let backend = StubBackend::new().platform("SKL", "isa");
    let unit = unit_for(&backend, b"DXBC", b"");
    let prefix = format!("{}/missing/isa_", dir.path().display());

    let err = driver::run(&backend, Api::Dx11, &unit, &prefix, &mut RunSession::new())
        .unwrap_err();

    assert!(matches!(err, AnalyzerError::OutputWrite { .. }));
    assert!(err.to_string().starts_with("Failed to open output file: "));
    assert_eq!(backend.live_handles(), 0);
}

#[test]
fn repeated_runs_produce_identical_files() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let prefix = prefix_in(dir.path());
    let backend = two_platforms();
    let unit = unit_for(&backend, b"DXBC", b"");

    driver::run(&backend, Api::Dx11, &unit, &prefix, &mut RunSession::new()).unwrap();
    let first = fs::read(dir.path().join("isa_KBL.asm")).unwrap();
    driver::run(&backend, Api::Dx11, &unit, &prefix, &mut RunSession::new()).unwrap();
    let second = fs::read(dir.path().join("isa_KBL.asm")).unwrap();

    assert_eq!(first, second);
}

#[test]
fn no_selected_platforms_is_not_an_error() {
    init_logging();
    let backend = two_platforms();
    let unit = CompilationUnit {
        platforms: Vec::new(),
        ..unit_for(&backend, b"DXBC", b"")
    };
    let mut session = RunSession::new();

    driver::run(&backend, Api::Dx11, &unit, "unused_", &mut session).unwrap();

    assert!(backend.calls().is_empty());
    assert_eq!(session.stats().platforms_processed, 0);
}

#[test]
fn artifact_exposes_binary_and_releases_before_context() {
    init_logging();
    let backend = StubBackend::new().platform("SKL", "abc");
    let unit = unit_for(&backend, b"DXBC", b"");
    let platform = &unit.platforms[0];

    {
        let context = Api::Dx11.create_context(&backend, platform).unwrap();
        let artifact = Api::Dx11.create_artifact(&context, &unit).unwrap();
        assert_eq!(artifact.isa_binary(), Some(b"cba".to_vec()));
        assert_eq!(context.platform().name, "SKL");
        assert_eq!(backend.live_handles(), 2);
    }

    assert_eq!(
        backend.calls()[2..],
        [
            BackendCall::DeleteShader(Api::Dx11, "SKL".into()),
            BackendCall::DeleteCompiler(Api::Dx11, "SKL".into()),
        ]
    );
    assert_eq!(backend.live_handles(), 0);
}
