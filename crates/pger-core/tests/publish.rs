//! End-to-end publishing against a temporary repository.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use pger_core::index::{FullIndex, LatestIndex};
use pger_core::io::sha256_file;
use pger_core::{NullReporter, PublishError, Publisher, RepositoryLayout};
use pger_schema::manifest::parse_creation_date;
use pger_schema::{Manifest, ManifestError, ManifestFields};
use tempfile::{TempDir, tempdir};

struct Fixture {
    _tmp: TempDir,
    layout: RepositoryLayout,
    content: PathBuf,
}

fn fixture() -> Fixture {
    let tmp = tempdir().unwrap();
    let layout = RepositoryLayout::new(tmp.path().join("repository"));
    let content = tmp.path().join("demo_src");
    std::fs::create_dir_all(&content).unwrap();
    std::fs::write(content.join("hello.txt"), "hello, world\n").unwrap();
    Fixture {
        _tmp: tmp,
        layout,
        content,
    }
}

fn fields(version: &str) -> ManifestFields {
    ManifestFields {
        version: Some(version.to_string()),
        dependencies: vec!["libc".into()],
        builder: Some("ci".into()),
        ..ManifestFields::new("demo")
    }
}

/// Archive member paths plus the parsed `manifest.json` snapshot.
fn read_archive(path: &Path) -> (Vec<String>, Manifest) {
    let mut archive = tar::Archive::new(GzDecoder::new(File::open(path).unwrap()));
    let mut names = Vec::new();
    let mut snapshot = None;
    for entry in archive.entries().unwrap() {
        let mut entry = entry.unwrap();
        let name = entry.path().unwrap().to_string_lossy().into_owned();
        if name == "manifest.json" {
            let mut json = String::new();
            entry.read_to_string(&mut json).unwrap();
            snapshot = Some(Manifest::from_json(&json).unwrap());
        }
        names.push(name);
    }
    (names, snapshot.expect("archive has no manifest.json"))
}

#[test]
fn publish_first_version() {
    let fx = fixture();
    let created = parse_creation_date("2024-05-01 12:00:00").unwrap();

    let outcome = Publisher::new(&fx.layout, &NullReporter)
        .publish_at(&fx.content, fields("1.0.0"), created)
        .unwrap();

    assert_eq!(outcome.archive_path, fx.layout.packages_dir().join("demo-1.0.0.pger"));
    assert!(outcome.archive_path.is_file());

    let (names, snapshot) = read_archive(&outcome.archive_path);
    assert!(names.iter().any(|n| n == "demo_src/hello.txt"), "{names:?}");
    assert!(names.iter().any(|n| n == "manifest.json"));
    assert!(!snapshot.is_sealed());
    assert_eq!(snapshot.version, "1.0.0");
    assert_eq!(snapshot.creation_date, created);

    assert_eq!(outcome.digest(), &sha256_file(&outcome.archive_path).unwrap());
    assert_eq!(outcome.digest().as_str().len(), 64);

    let latest = LatestIndex::load(fx.layout.latest_index_path()).unwrap();
    assert_eq!(latest.len(), 1);
    let entry = latest.find("demo").unwrap();
    assert_eq!(entry.version, "1.0.0");
    assert_eq!(entry.dependencies, vec!["libc"]);

    let full = FullIndex::load(fx.layout.full_index_path()).unwrap();
    assert_eq!(full.len(), 1);
    assert_eq!(full.entries().next().unwrap().id, "demo-1.0.0");
    let recorded = full.find("demo", "1.0.0").unwrap();
    assert_eq!(recorded, &outcome.manifest);
    assert_eq!(recorded.supported_os, vec!["linux"]);
    assert_eq!(recorded.supported_arch, vec!["x86_64"]);
    assert_eq!(recorded.builder.as_deref(), Some("ci"));
}

#[test]
fn publish_second_version() {
    let fx = fixture();
    let publisher = Publisher::new(&fx.layout, &NullReporter);

    let first = publisher.publish(&fx.content, fields("1.0.0")).unwrap();
    let second = publisher.publish(&fx.content, fields("2.0.0")).unwrap();

    let latest = LatestIndex::load(fx.layout.latest_index_path()).unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest.find("demo").unwrap().version, "2.0.0");

    let full = FullIndex::load(fx.layout.full_index_path()).unwrap();
    let ids: Vec<&str> = full.entries().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["demo-1.0.0", "demo-2.0.0"]);
    assert_eq!(full.find("demo", "1.0.0").unwrap().sha256, first.manifest.sha256);
    assert_eq!(full.find("demo", "2.0.0").unwrap().sha256, second.manifest.sha256);

    assert!(first.archive_path.is_file());
    assert!(second.archive_path.is_file());
}

#[test]
fn republishing_same_version_overwrites_full_record() {
    let fx = fixture();
    let publisher = Publisher::new(&fx.layout, &NullReporter);

    publisher.publish(&fx.content, fields("1.0.0")).unwrap();
    std::fs::write(fx.content.join("extra.txt"), "more").unwrap();
    let again = publisher.publish(&fx.content, fields("1.0.0")).unwrap();

    let full = FullIndex::load(fx.layout.full_index_path()).unwrap();
    assert_eq!(full.len(), 1);
    assert_eq!(full.find("demo", "1.0.0").unwrap().sha256, again.manifest.sha256);
}

#[test]
fn missing_content_writes_no_archive() {
    let fx = fixture();
    let missing = fx.content.with_file_name("not_there");

    let err = Publisher::new(&fx.layout, &NullReporter)
        .publish(&missing, fields("1.0.0"))
        .unwrap_err();

    assert!(matches!(err, PublishError::ContentNotFound(ref p) if p == &missing));
    assert!(!fx.layout.packages_dir().join("demo-1.0.0.pger").exists());
    assert!(LatestIndex::load(fx.layout.latest_index_path()).unwrap().is_empty());
    assert!(FullIndex::load(fx.layout.full_index_path()).unwrap().is_empty());
}

#[test]
fn corrupt_index_is_rebuilt_on_publish() {
    let fx = fixture();
    std::fs::create_dir_all(fx.layout.root()).unwrap();
    std::fs::write(fx.layout.latest_index_path(), "<packages><package>").unwrap();

    Publisher::new(&fx.layout, &NullReporter)
        .publish(&fx.content, fields("1.0.0"))
        .unwrap();

    let latest = LatestIndex::load(fx.layout.latest_index_path()).unwrap();
    assert_eq!(latest.len(), 1);
}

#[test]
fn path_like_name_is_refused_before_anything_is_written() {
    let fx = fixture();

    let err = Publisher::new(&fx.layout, &NullReporter)
        .publish(&fx.content, ManifestFields::new("../../escaped"))
        .unwrap_err();

    assert!(matches!(
        err,
        PublishError::Manifest(ManifestError::InvalidField { field: "name", .. })
    ));
    let tmp_root = fx.layout.root().parent().unwrap();
    assert!(!tmp_root.join("escaped-1.0.0.pger").exists());
    assert!(LatestIndex::load(fx.layout.latest_index_path()).unwrap().is_empty());
}

#[test]
fn unrelated_unreadable_entries_survive_a_publish() {
    let fx = fixture();
    std::fs::create_dir_all(fx.layout.root()).unwrap();
    std::fs::write(
        fx.layout.latest_index_path(),
        "<packages><package><name>legacy</name><version>0.9</version>\
         <creation_date>2023-01-01T00:00:00</creation_date></package></packages>",
    )
    .unwrap();

    Publisher::new(&fx.layout, &NullReporter)
        .publish(&fx.content, fields("1.0.0"))
        .unwrap();

    let latest = LatestIndex::load(fx.layout.latest_index_path()).unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest.unreadable(), 1);
    let xml = std::fs::read_to_string(fx.layout.latest_index_path()).unwrap();
    assert!(xml.contains("<name>legacy</name>"));
}
