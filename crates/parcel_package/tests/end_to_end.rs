//! Configuration → resolver → packaging, with fake analysis and boundaries.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use parcel_common::TargetPath;
use parcel_config::{load_config, ParcelConfig};
use parcel_package::{
    open_resolver, AppletDescriptor, ArchiveEntry, ArchiveWriter, BoundaryError,
    ComponentDescriptor, PackageError, Packager, PackagerOptions, Uploader,
};
use parcel_resolve::{from_fn, DirectLookup, Lookups, ResolveError};

type Edges = &'static [(&'static str, &'static str)];

/// Answers from `edges` (file name → path under the search root).
fn table(edges: Edges, calls: Arc<AtomicUsize>) -> impl DirectLookup {
    from_fn(move |req| {
        calls.fetch_add(1, Ordering::SeqCst);
        let name = req.target.file_name().unwrap_or_default();
        Ok(edges
            .iter()
            .filter(|(from, _)| *from == name)
            .map(|(_, to)| TargetPath::new(req.search_root.join(to)))
            .collect())
    })
}

const UNIT_UNIT: Edges = &[
    ("Tokenizer.class", "org/example/Helper.class"),
    ("A.class", "org/example/B.class"),
    ("Viewer.class", "org/example/ui/Panel.class"),
];
const UNIT_ARCHIVE: Edges = &[
    ("Helper.class", "nlp.jar"),
    ("Helper.class", "runtime-core.jar"),
    ("B.class", "lib1.jar"),
    ("Panel.class", "swing-x.jar"),
];
const ARCHIVE_ARCHIVE: Edges = &[("nlp.jar", "ext/model.jar"), ("lib1.jar", "lib2.jar")];

struct Project {
    dir: tempfile::TempDir,
    calls: Arc<AtomicUsize>,
}

impl Project {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let files = [
            "classes/org/example/Tokenizer.class",
            "classes/org/example/Helper.class",
            "classes/org/example/A.class",
            "classes/org/example/B.class",
            "classes/org/example/tokens.txt",
            "classes/org/example/ui/Viewer.class",
            "classes/org/example/ui/Panel.class",
            "classes/org/example/ui/icon.png",
            "lib/nlp.jar",
            "lib/runtime-core.jar",
            "lib/ext/model.jar",
            "lib/extra.jar",
            "lib/lib1.jar",
            "lib/lib2.jar",
            "lib/swing-x.jar",
        ];
        for file in files {
            let path = dir.path().join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, file.as_bytes()).unwrap();
        }
        std::fs::write(
            dir.path().join("parcel.toml"),
            r#"
[roots]
units = "classes"
archives = "lib"
cache = ".parcel"

[package]
platform_prefixes = ["Runtime-"]
output_dir = "out"
"#,
        )
        .unwrap();
        Self {
            dir,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn config(&self) -> ParcelConfig {
        load_config(self.dir.path()).unwrap()
    }

    fn lookups(&self) -> Lookups {
        Lookups::new(
            table(UNIT_UNIT, Arc::clone(&self.calls)),
            table(UNIT_ARCHIVE, Arc::clone(&self.calls)),
            table(ARCHIVE_ARCHIVE, Arc::clone(&self.calls)),
        )
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn unit(&self, name: &str) -> TargetPath {
        TargetPath::new(self.dir.path().join("classes/org/example").join(name))
    }

    fn archive(&self, name: &str) -> PathBuf {
        TargetPath::new(self.dir.path().join("lib").join(name)).into_path_buf()
    }

    fn out(&self, name: &str) -> PathBuf {
        self.dir.path().join("out").join(name)
    }
}

/// Writes a placeholder file per archive and remembers what it was asked for.
#[derive(Default)]
struct RecordingWriter {
    written: Mutex<Vec<(PathBuf, Vec<String>, Vec<String>)>>,
    fail_on: Option<&'static str>,
}

impl ArchiveWriter for RecordingWriter {
    fn write_archive(
        &self,
        archive: &Path,
        manifest: &[(&str, &str)],
        entries: &[ArchiveEntry],
    ) -> Result<(), BoundaryError> {
        std::fs::write(archive, b"partial")?;
        if self
            .fail_on
            .is_some_and(|name| archive.file_name().is_some_and(|n| n == name))
        {
            return Err("disk full".into());
        }
        self.written.lock().unwrap().push((
            archive.to_path_buf(),
            manifest.iter().map(|(k, v)| format!("{k}: {v}")).collect(),
            entries.iter().map(|e| e.name.clone()).collect(),
        ));
        Ok(())
    }
}

#[derive(Default)]
struct RecordingUploader {
    uploads: Mutex<Vec<(String, BTreeSet<PathBuf>)>>,
}

impl Uploader for RecordingUploader {
    fn upload(
        &self,
        component: &ComponentDescriptor,
        files: &BTreeSet<PathBuf>,
    ) -> Result<(), BoundaryError> {
        self.uploads
            .lock()
            .unwrap()
            .push((component.class_name.clone(), files.clone()));
        Ok(())
    }
}

fn packager<'r>(resolver: &'r parcel_resolve::Resolver, config: &ParcelConfig) -> Packager<'r> {
    Packager::new(resolver, PackagerOptions::from_config(&config.package, false))
}

fn tokenizer() -> ComponentDescriptor {
    ComponentDescriptor::new("org.example.Tokenizer")
        .with_resource("tokens.txt")
        .with_archive_dep("extra.jar")
        .with_applet(AppletDescriptor::new("org.example.ui.Viewer").with_resource("icon.png"))
}

#[test]
fn dependency_scenario() {
    let p = Project::new();
    let resolver = open_resolver(&p.config(), p.lookups()).unwrap();

    assert_eq!(
        resolver.deep_unit_deps(p.unit("A.class")).unwrap(),
        BTreeSet::from([p.unit("A.class"), p.unit("B.class")])
    );
    assert!(resolver.deep_archive_deps_of_unit(p.unit("A.class")).unwrap().is_empty());
    assert_eq!(
        resolver.deep_archive_deps_of_unit(p.unit("B.class")).unwrap(),
        BTreeSet::from([
            TargetPath::new(p.archive("lib1.jar")),
            TargetPath::new(p.archive("lib2.jar")),
        ])
    );
}

#[test]
fn second_open_is_served_from_cache() {
    let p = Project::new();
    open_resolver(&p.config(), p.lookups()).unwrap();
    let first = p.calls();
    assert!(first > 0);
    assert!(p.dir.path().join(".parcel/dependencies-cache/unit-to-unit").is_dir());

    let resolver = open_resolver(&p.config(), p.lookups()).unwrap();
    assert_eq!(p.calls(), first);
    assert_eq!(
        resolver.deep_unit_deps(p.unit("Tokenizer.class")).unwrap().len(),
        2
    );
}

#[test]
fn install_builds_archives_and_uploads_closure() {
    let p = Project::new();
    let config = p.config();
    let resolver = open_resolver(&config, p.lookups()).unwrap();
    let writer = RecordingWriter::default();
    let uploader = RecordingUploader::default();

    packager(&resolver, &config)
        .install(&tokenizer(), &writer, &uploader)
        .unwrap();

    let written = writer.written.lock().unwrap();
    assert_eq!(written.len(), 2);
    let (component, manifest, entries) = &written[0];
    assert_eq!(component, &p.out("org.example.Tokenizer.jar"));
    assert!(manifest.contains(&"isComponent: true".to_string()));
    assert_eq!(
        entries,
        &vec![
            "org/example/Helper.class".to_string(),
            "org/example/Tokenizer.class".to_string(),
            "org/example/tokens.txt".to_string(),
        ]
    );
    let (applet, applet_manifest, applet_entries) = &written[1];
    assert_eq!(applet, &p.out("org.example.ui.viewer.jar"));
    assert!(!applet_manifest.contains(&"isComponent: true".to_string()));
    assert_eq!(
        applet_entries,
        &vec![
            "org/example/ui/Panel.class".to_string(),
            "org/example/ui/Viewer.class".to_string(),
            "org/example/ui/icon.png".to_string(),
        ]
    );

    let uploads = uploader.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    let (name, files) = &uploads[0];
    assert_eq!(name, "org.example.Tokenizer");
    assert_eq!(
        files,
        &BTreeSet::from([
            p.out("org.example.Tokenizer.jar"),
            p.out("org.example.ui.viewer.jar"),
            p.archive("nlp.jar"),
            p.archive("ext/model.jar"),
            p.archive("extra.jar"),
            p.archive("swing-x.jar"),
        ])
    );
    assert!(!files.contains(&p.archive("runtime-core.jar")));
}

#[test]
fn missing_declared_file_aborts_before_writing() {
    let p = Project::new();
    let config = p.config();
    let resolver = open_resolver(&config, p.lookups()).unwrap();
    let writer = RecordingWriter::default();
    let uploader = RecordingUploader::default();

    let descriptor = ComponentDescriptor::new("org.example.A").with_archive_dep("nowhere.jar");
    let err = packager(&resolver, &config)
        .install(&descriptor, &writer, &uploader)
        .unwrap_err();
    match err {
        PackageError::MissingDeclaredFile { component, name, .. } => {
            assert_eq!(component, "org.example.A");
            assert_eq!(name, "nowhere.jar");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(writer.written.lock().unwrap().is_empty());
    assert!(uploader.uploads.lock().unwrap().is_empty());
}

#[test]
fn failed_write_removes_partial_archive() {
    let p = Project::new();
    let config = p.config();
    let resolver = open_resolver(&config, p.lookups()).unwrap();
    let writer = RecordingWriter {
        fail_on: Some("org.example.A.jar"),
        ..RecordingWriter::default()
    };
    let uploader = RecordingUploader::default();

    let err = packager(&resolver, &config)
        .install(&ComponentDescriptor::new("org.example.A"), &writer, &uploader)
        .unwrap_err();
    assert!(matches!(err, PackageError::Write { .. }));
    assert!(!p.out("org.example.A.jar").exists());
    assert!(uploader.uploads.lock().unwrap().is_empty());
}

#[test]
fn batch_continues_past_failures() {
    let p = Project::new();
    let config = p.config();
    let resolver = open_resolver(&config, p.lookups()).unwrap();
    let writer = RecordingWriter::default();
    let uploader = RecordingUploader::default();

    let descriptors = [
        ComponentDescriptor::new("org.example.Missing"),
        ComponentDescriptor::new("org.example.A"),
    ];
    let report = packager(&resolver, &config).install_all(&descriptors, &writer, &uploader);

    assert!(!report.is_success());
    assert_eq!(report.installed, vec!["org.example.A".to_string()]);
    assert_eq!(report.failed.len(), 1);
    let (name, err) = &report.failed[0];
    assert_eq!(name, "org.example.Missing");
    assert!(matches!(
        err,
        PackageError::Resolve(ResolveError::UnknownTarget { .. })
    ));
    assert_eq!(uploader.uploads.lock().unwrap().len(), 1);
}

#[test]
fn analysis_failure_names_the_unit() {
    let p = Project::new();
    let mut config = p.config();
    config.roots.cache = None;
    let lookups = Lookups::new(
        from_fn(|req| {
            if req.target.file_name() == Some("Helper.class") {
                Err(parcel_resolve::AnalysisError::External("corrupt constant pool".into()))
            } else {
                Ok(BTreeSet::new())
            }
        }),
        table(&[], Arc::clone(&p.calls)),
        table(&[], Arc::clone(&p.calls)),
    );
    let err = open_resolver(&config, lookups).unwrap_err();
    let PackageError::Resolve(err) = err else {
        panic!("expected a resolve error");
    };
    assert_eq!(err.target(), Some(&p.unit("Helper.class")));
}
