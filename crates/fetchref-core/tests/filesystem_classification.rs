use std::sync::{Arc, Mutex};

use fetchref_core::{
    Advisory, AdvisorySink, DirRef, ErrorClass, ModuleOrDirPolicy, ParserKind, Ref, RefError,
    RefParser, SourceOrModuleRef, SourceRef,
};
use tempfile::TempDir;

const MODULE: &str = "buf.build/acme/weather";

fn parser_in(dir: &TempDir, kind: ParserKind) -> RefParser {
    RefParser::builder(kind).working_dir(dir.path()).build()
}

#[test]
fn existing_directory_wins_over_module_coordinate() {
    let workspace = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(workspace.path().join(MODULE)).unwrap();

    let parser = parser_in(&workspace, ParserKind::SourceOrModule);
    assert_eq!(
        parser.get_source_or_module_ref(MODULE).unwrap(),
        SourceOrModuleRef::Source(SourceRef::Dir(DirRef::new(MODULE)))
    );
}

#[test]
fn missing_directory_means_module() {
    let workspace = tempfile::tempdir().unwrap();

    let parser = parser_in(&workspace, ParserKind::SourceOrModule);
    match parser.get_source_or_module_ref(MODULE).unwrap() {
        SourceOrModuleRef::Module(module) => {
            assert_eq!(module.coordinate.to_string(), MODULE);
        }
        other => panic!("expected module, got {other:?}"),
    }
}

#[test]
fn module_remote_with_port_is_a_module() {
    let workspace = tempfile::tempdir().unwrap();

    let parser = parser_in(&workspace, ParserKind::Generic);
    match parser.get_ref("localhost:8080/acme/weather:main").unwrap() {
        Ref::Module(module) => {
            assert_eq!(module.coordinate.remote, "localhost:8080");
            assert_eq!(module.coordinate.reference.as_deref(), Some("main"));
        }
        other => panic!("expected module, got {other:?}"),
    }
}

#[test]
fn generic_parser_probes_the_same_way() {
    let workspace = tempfile::tempdir().unwrap();
    let parser = parser_in(&workspace, ParserKind::Generic);
    assert!(matches!(parser.get_ref(MODULE).unwrap(), Ref::Module(_)));

    std::fs::create_dir_all(workspace.path().join(MODULE)).unwrap();
    assert!(matches!(
        parser.get_ref(MODULE).unwrap(),
        Ref::Source(SourceRef::Dir(_))
    ));
}

#[test]
fn explicit_policy_ignores_the_filesystem() {
    let workspace = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(workspace.path().join(MODULE)).unwrap();

    let parser = RefParser::builder(ParserKind::SourceOrModule)
        .working_dir(workspace.path())
        .module_or_dir(ModuleOrDirPolicy::Module)
        .build();
    assert!(matches!(
        parser.get_source_or_module_ref(MODULE).unwrap(),
        SourceOrModuleRef::Module(_)
    ));
}

#[test]
fn explicit_format_disambiguates() {
    let workspace = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(workspace.path().join(MODULE)).unwrap();

    let parser = parser_in(&workspace, ParserKind::SourceOrModule);
    let value = format!("{MODULE}#format=mod");
    assert!(matches!(
        parser.get_source_or_module_ref(&value).unwrap(),
        SourceOrModuleRef::Module(_)
    ));
}

#[test]
fn proto_path_that_is_a_directory_fails() {
    let workspace = tempfile::tempdir().unwrap();
    std::fs::create_dir(workspace.path().join("weather.proto")).unwrap();

    let parser = parser_in(&workspace, ParserKind::Generic);
    let err = parser.get_ref("weather.proto").unwrap_err();
    assert!(matches!(err, RefError::ProtoFileIsDirectory { .. }));
    assert_eq!(err.class(), ErrorClass::Inference);

    let absolute = workspace.path().join("weather.proto");
    let err = RefParser::new()
        .get_ref(absolute.to_str().unwrap())
        .unwrap_err();
    assert!(matches!(err, RefError::ProtoFileIsDirectory { .. }));
}

#[test]
fn proto_file_resolves_when_not_a_directory() {
    let workspace = tempfile::tempdir().unwrap();
    std::fs::write(workspace.path().join("weather.proto"), "syntax = \"proto3\";\n").unwrap();

    let parser = parser_in(&workspace, ParserKind::SourceOrModule);
    match parser.get_source_or_module_ref("weather.proto#include_package_files").unwrap() {
        SourceOrModuleRef::ProtoFile(proto_file) => {
            assert_eq!(proto_file.path, "weather.proto");
            assert!(proto_file.include_package_files);
        }
        other => panic!("expected proto file, got {other:?}"),
    }
}

#[derive(Debug, Default)]
struct CountingSink {
    advisories: Mutex<Vec<Advisory>>,
}

impl AdvisorySink for CountingSink {
    fn advise(&self, advisory: &Advisory) {
        self.advisories.lock().unwrap().push(advisory.clone());
    }
}

#[test]
fn one_advisory_per_legacy_resolution() {
    let sink = Arc::new(CountingSink::default());
    let parser = RefParser::builder(ParserKind::Generic)
        .module_or_dir(ModuleOrDirPolicy::Dir)
        .advisory_sink(sink.clone())
        .build();

    parser.get_ref("image#format=jsongz").unwrap();
    parser.get_ref("image.json#compression=gzip").unwrap();
    parser.get_source_ref("proto#format=targz").unwrap();

    let advisories = sink.advisories.lock().unwrap();
    let spellings: Vec<String> = advisories.iter().map(Advisory::replacement_spelling).collect();
    assert_eq!(
        spellings,
        ["format=json,compression=gzip", "format=tar,compression=gzip"]
    );
}

#[test]
fn parsers_resolve_concurrently() {
    let workspace = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(workspace.path().join(MODULE)).unwrap();
    let parser = Arc::new(parser_in(&workspace, ParserKind::Generic));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let parser = Arc::clone(&parser);
            std::thread::spawn(move || {
                (
                    parser.get_ref(MODULE).unwrap(),
                    parser.get_ref("image.yaml.zst").unwrap(),
                )
            })
        })
        .collect();

    for handle in handles {
        let (module_or_dir, message) = handle.join().unwrap();
        assert!(matches!(module_or_dir, Ref::Source(SourceRef::Dir(_))));
        assert!(matches!(message, Ref::Message(_)));
    }
}
