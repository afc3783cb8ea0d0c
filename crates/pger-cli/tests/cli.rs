//! Integration tests for the pger command-line tool.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// Test context with a scratch repository, cache and content directory
struct TestContext {
    temp_dir: TempDir,
    repository: PathBuf,
    cache: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let repository = temp_dir.path().join("repository");
        let cache = temp_dir.path().join("cache");
        Self {
            temp_dir,
            repository,
            cache,
        }
    }

    fn content_dir(&self) -> PathBuf {
        let dir = self.temp_dir.path().join("demo_src");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("hello.txt"), "hello").unwrap();
        dir
    }

    fn pger_cmd(&self) -> Command {
        let bin_path = env!("CARGO_BIN_EXE_pger");
        let mut cmd = Command::new(bin_path);
        cmd.env("HOME", self.temp_dir.path());
        cmd.env("PGER_REPOSITORY", &self.repository);
        cmd.env("PGER_CACHE", &self.cache);
        cmd.env_remove("RUST_LOG");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.pger_cmd().args(args).output().expect("failed to run pger")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_help_command() {
    let ctx = TestContext::new();
    let output = ctx.run(&["--help"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Usage:"));
}

#[test]
fn test_version_command() {
    let ctx = TestContext::new();
    assert!(ctx.run(&["--version"]).status.success());
}

#[test]
fn test_publish_then_list() {
    let ctx = TestContext::new();
    let content = ctx.content_dir();
    let content = content.to_str().unwrap();

    let output = ctx.run(&["publish", content, "demo", "-d", "libc,zlib"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(ctx.repository.join("packages/demo-1.0.0.pger").is_file());
    assert!(ctx.repository.join("list.xml").is_file());
    assert!(ctx.repository.join("full_list.xml").is_file());

    let output = ctx.run(&["publish", content, "demo", "--version", "2.0.0"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let latest = stdout(&ctx.run(&["list"]));
    assert!(latest.contains("demo"));
    assert!(latest.contains("2.0.0"));
    assert!(!latest.contains("1.0.0"));

    let full = stdout(&ctx.run(&["list", "--full"]));
    assert!(full.contains("1.0.0"));
    assert!(full.contains("2.0.0"));
    assert!(full.contains("linux / x86_64"));
}

#[test]
fn test_quiet_publish_prints_digest_matching_hash() {
    let ctx = TestContext::new();
    let content = ctx.content_dir();

    let output = ctx.run(&["publish", content.to_str().unwrap(), "demo", "--quiet"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let digest = stdout(&output).trim().to_string();
    assert_eq!(digest.len(), 64);

    let archive = ctx.repository.join("packages/demo-1.0.0.pger");
    let hashed = stdout(&ctx.run(&["hash", archive.to_str().unwrap()]));
    assert!(hashed.starts_with(&digest));
}

#[test]
fn test_publish_rejects_path_like_name() {
    let ctx = TestContext::new();
    let content = ctx.content_dir();

    let output = ctx.run(&["publish", content.to_str().unwrap(), "../escaped"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("invalid value"));
    assert!(!ctx.repository.join("escaped-1.0.0.pger").exists());
}

#[test]
fn test_publish_missing_content_fails() {
    let ctx = TestContext::new();
    let missing = ctx.temp_dir.path().join("nope");

    let output = ctx.run(&["publish", missing.to_str().unwrap(), "demo"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Content directory not found"));
    assert!(!ctx.repository.join("packages/demo-1.0.0.pger").exists());
}

#[test]
fn test_interactive_publish_reads_stdin() {
    let ctx = TestContext::new();
    let content = ctx.content_dir();

    let mut child = ctx
        .pger_cmd()
        .args(["publish", content.to_str().unwrap(), "demo", "--interactive"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn pger");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"3.1.4\n\nlinux,freebsd\n\nci\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success(), "{}", stderr(&output));

    assert!(ctx.repository.join("packages/demo-3.1.4.pger").is_file());
    let full = std::fs::read_to_string(ctx.repository.join("full_list.xml")).unwrap();
    assert!(full.contains(r#"<package id="demo-3.1.4">"#));
    assert!(full.contains("<os>freebsd</os>"));
    assert!(full.contains("<builder>ci</builder>"));
}

#[test]
fn test_list_empty_repository() {
    let ctx = TestContext::new();
    let output = ctx.run(&["list"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("No packages published."));
}

#[test]
fn test_state_lifecycle() {
    let ctx = TestContext::new();

    assert!(ctx.run(&["state", "register", "p", "--build"]).status.success());
    assert!(ctx.cache.join("pges.xml").is_file());

    let output = ctx.run(&["state", "set", "p", "--in-cache", "true"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let ledger = std::fs::read_to_string(ctx.cache.join("pges.xml")).unwrap();
    assert!(ledger.contains("<pge>p<in_cache>True</in_cache><installed>False</installed><built>False</built></pge>"));

    let shown = stdout(&ctx.run(&["state", "show", "p"]));
    assert!(shown.contains("True"));

    let listed = stdout(&ctx.run(&["state", "list"]));
    assert!(listed.contains('p'));

    assert!(ctx.run(&["state", "remove", "p"]).status.success());
    assert!(!ctx.run(&["state", "show", "p"]).status.success());
}

#[test]
fn test_state_soft_failures() {
    let ctx = TestContext::new();

    // Re-registering is a notice.
    assert!(ctx.run(&["state", "register", "p"]).status.success());
    let again = ctx.run(&["state", "register", "p"]);
    assert!(again.status.success());
    assert!(stderr(&again).contains("already registered"));

    // A blank name is refused.
    let blank = ctx.run(&["state", "register", " "]);
    assert!(!blank.status.success());
    assert!(stderr(&blank).contains("blank"));

    // Removing an unknown package is a notice.
    assert!(ctx.run(&["state", "remove", "ghost"]).status.success());

    // Updating an unknown package fails and leaves the ledger alone.
    let before = std::fs::read(ctx.cache.join("pges.xml")).unwrap();
    let output = ctx.run(&["state", "set", "ghost", "--installed", "true"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("ghost"));
    assert_eq!(std::fs::read(ctx.cache.join("pges.xml")).unwrap(), before);
}

#[test]
fn test_require_build_adds_flag() {
    let ctx = TestContext::new();
    ctx.run(&["state", "register", "p"]);

    assert!(ctx.run(&["state", "require-build", "p"]).status.success());
    let ledger = std::fs::read_to_string(ctx.cache.join("pges.xml")).unwrap();
    assert!(ledger.contains("<built>False</built>"));
}

#[test]
fn test_manifest_command_reads_xml() {
    let ctx = TestContext::new();
    let path = ctx.temp_dir.path().join("manifest.xml");
    std::fs::write(
        &path,
        "<manifest><name>tool</name><version>0.3</version>\
         <creationDate>2024-01-02 03:04:05</creationDate><sha256></sha256>\
         <dependencies/><supportedOS><os>linux</os></supportedOS>\
         <supportedArch><arch>x86_64</arch></supportedArch></manifest>",
    )
    .unwrap();

    let output = ctx.run(&["manifest", path.to_str().unwrap(), "--json"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let json = stdout(&output);
    assert!(json.contains(r#""name": "tool""#));
    assert!(json.contains(r#""creation_date": "2024-01-02 03:04:05""#));
}

#[test]
fn test_debug_log_goes_to_stderr() {
    let ctx = TestContext::new();
    let output = ctx
        .pger_cmd()
        .env("RUST_LOG", "debug")
        .args(["state", "list"])
        .output()
        .expect("failed to run pger");

    assert!(output.status.success());
    let err = stderr(&output);
    assert!(err.contains("Repository root"));
    assert!(err.contains("Ledger directory"));
    assert!(!stdout(&output).contains("Repository root"));
}
