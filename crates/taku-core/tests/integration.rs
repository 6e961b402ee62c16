//! Integration tests for taku-core.
//!
//! These exercise the script lifecycle across several simulated hosts that
//! share one scripts root, the way a synced root is used in practice.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use taku_core::{
    CreationSource, FixedHost, HostFacts, InstallOutcome, InstallTarget, Installer,
    ProcessRunner, ScriptRegistry, TakuError, UninstallOutcome,
};

struct Workspace {
    _tmp: tempfile::TempDir,
    registry: ScriptRegistry,
    base: PathBuf,
}

fn workspace() -> Workspace {
    let tmp = tempfile::tempdir().unwrap();
    let base = tmp.path().to_path_buf();
    Workspace {
        registry: ScriptRegistry::new(base.join("scripts")),
        base,
        _tmp: tmp,
    }
}

/// Records every argv and returns a fixed exit code.
struct Recorder {
    calls: RefCell<Vec<Vec<String>>>,
    code: i32,
}

impl Recorder {
    fn new(code: i32) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            code,
        }
    }
}

impl ProcessRunner for Recorder {
    fn run(&self, argv: &[String]) -> taku_core::Result<i32> {
        self.calls.borrow_mut().push(argv.to_vec());
        Ok(self.code)
    }
}

fn dir_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

// ═══════════════════════════════════════════════════════════════════════
//  End-to-end
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn deploy_lifecycle_on_one_host() {
    let ws = workspace();
    let bin = ws.base.join("bin");

    ws.registry
        .create("deploy", &CreationSource::Literal(b"echo deploy".to_vec()))
        .unwrap();

    let host = FixedHost::new("ci-1");
    let installer = Installer::new(&ws.registry, &host, ws.base.join("unused"));
    let outcomes = installer
        .install(&InstallTarget::parse("deploy"), Some("deploy-prod"), Some(&bin))
        .unwrap();
    assert!(matches!(outcomes[0], InstallOutcome::Installed { .. }));
    assert!(bin.join("deploy-prod").is_file());

    let meta = ws.registry.store().load("deploy").unwrap();
    assert_eq!(meta.hosts().len(), 1);
    assert_eq!(
        meta.host_facts("ci-1"),
        Some(HostFacts::new("deploy-prod", dir_str(&bin)))
    );

    let outcome = installer.uninstall("deploy").unwrap();
    assert!(matches!(outcome, UninstallOutcome::Uninstalled { .. }));
    assert!(!bin.join("deploy-prod").exists());

    let script = ws.registry.read("deploy").unwrap();
    assert_eq!(script.content, b"#!/usr/bin/env bash\necho deploy");
    assert!(script.metadata.unwrap().get("ci-1").is_none());
}

// ═══════════════════════════════════════════════════════════════════════
//  Per-host isolation
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn uninstall_on_one_host_keeps_the_other() {
    let ws = workspace();
    ws.registry.create("tool", &CreationSource::Default).unwrap();

    let mut meta = ws.registry.store().load("tool").unwrap();
    meta.set("description", "shared tool");
    ws.registry.store().save("tool", &meta).unwrap();

    let bin_a = ws.base.join("a-bin");
    let bin_b = ws.base.join("b-bin");
    let host_a = FixedHost::new("host-a");
    let host_b = FixedHost::new("host-b");
    let on_a = Installer::new(&ws.registry, &host_a, &bin_a);
    let on_b = Installer::new(&ws.registry, &host_b, &bin_b);

    on_b.install(&InstallTarget::parse("tool"), None, None).unwrap();
    on_a.install(&InstallTarget::parse("tool"), None, None).unwrap();
    on_a.uninstall("tool").unwrap();

    assert!(!bin_a.join("tool").exists());
    assert!(bin_b.join("tool").is_file());

    let meta = ws.registry.store().load("tool").unwrap();
    assert!(meta.host_facts("host-a").is_none());
    assert_eq!(
        meta.host_facts("host-b"),
        Some(HostFacts::new("tool", dir_str(&bin_b)))
    );
    assert_eq!(
        meta.get("description").and_then(|v| v.as_str()),
        Some("shared tool")
    );
}

#[test]
fn second_host_uninstall_without_install_is_soft() {
    let ws = workspace();
    ws.registry.create("tool", &CreationSource::Default).unwrap();

    let host_a = FixedHost::new("host-a");
    let host_b = FixedHost::new("host-b");
    Installer::new(&ws.registry, &host_a, ws.base.join("bin"))
        .install(&InstallTarget::parse("tool"), None, None)
        .unwrap();

    let before = std::fs::read_to_string(ws.registry.store().path("tool")).unwrap();
    let outcome = Installer::new(&ws.registry, &host_b, ws.base.join("bin"))
        .uninstall("tool")
        .unwrap();
    let after = std::fs::read_to_string(ws.registry.store().path("tool")).unwrap();

    assert!(matches!(outcome, UninstallOutcome::NotInstalled { .. }));
    assert_eq!(before, after);
    assert!(ws.base.join("bin").join("tool").exists());
}

// ═══════════════════════════════════════════════════════════════════════
//  Delete
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn delete_uninstalls_then_removes() {
    let ws = workspace();
    let bin = ws.base.join("bin");
    ws.registry.create("test", &CreationSource::Default).unwrap();

    let host = FixedHost::new("laptop");
    let installer = Installer::new(&ws.registry, &host, &bin);
    installer.install(&InstallTarget::parse("test"), None, None).unwrap();

    let outcome = ws.registry.delete("test", &installer).unwrap();
    assert!(matches!(outcome, Some(UninstallOutcome::Uninstalled { .. })));
    assert!(!ws.registry.script_dir("test").exists());
    assert!(!bin.join("test").exists());
}

#[test]
fn delete_not_installed_script() {
    let ws = workspace();
    ws.registry.create("test", &CreationSource::Default).unwrap();

    let host = FixedHost::new("laptop");
    let installer = Installer::new(&ws.registry, &host, ws.base.join("bin"));
    let outcome = ws.registry.delete("test", &installer).unwrap();

    assert!(matches!(outcome, Some(UninstallOutcome::NotInstalled { .. })));
    assert!(!ws.registry.script_dir("test").exists());
}

#[test]
fn delete_with_corrupt_metadata_still_deletes() {
    let ws = workspace();
    ws.registry.create("test", &CreationSource::Default).unwrap();
    std::fs::write(ws.registry.store().path("test"), "[[[").unwrap();

    let host = FixedHost::new("laptop");
    let installer = Installer::new(&ws.registry, &host, ws.base.join("bin"));
    let outcome = ws.registry.delete("test", &installer).unwrap();

    assert!(outcome.is_none());
    assert!(!ws.registry.script_dir("test").exists());
}

#[test]
fn delete_missing_script_fails() {
    let ws = workspace();
    let host = FixedHost::new("laptop");
    let installer = Installer::new(&ws.registry, &host, ws.base.join("bin"));

    let err = ws.registry.delete("ghost", &installer).unwrap_err();
    assert!(matches!(err, TakuError::ScriptNotFound(_)));
}

// ═══════════════════════════════════════════════════════════════════════
//  Edit and run
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn edit_passes_absolute_path_to_editor() {
    let ws = workspace();
    let path = ws.registry.create("test", &CreationSource::Default).unwrap();
    let runner = Recorder::new(0);

    ws.registry
        .edit("test", &["nano".to_string()], &runner)
        .unwrap();

    let calls = runner.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0][0], "nano");
    assert_eq!(
        calls[0][1],
        std::path::absolute(&path).unwrap().to_string_lossy()
    );
}

#[cfg(unix)]
#[test]
fn edit_tolerates_editor_failure_and_restores_mode() {
    use std::os::unix::fs::PermissionsExt;

    let ws = workspace();
    let path = ws.registry.create("test", &CreationSource::Default).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
    let runner = Recorder::new(1);

    ws.registry
        .edit("test", &["vim".to_string()], &runner)
        .unwrap();

    assert_eq!(runner.calls.borrow().len(), 1);
    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o755);
}

#[test]
fn edit_missing_script_fails() {
    let ws = workspace();
    let runner = Recorder::new(0);
    let err = ws
        .registry
        .edit("test", &["nano".to_string()], &runner)
        .unwrap_err();
    assert_eq!(err.to_string(), "script `test` not found");
    assert!(runner.calls.borrow().is_empty());
}

#[test]
fn run_forwards_args_and_exit_code() {
    let ws = workspace();
    let path = ws.registry.create("test", &CreationSource::Default).unwrap();
    let runner = Recorder::new(7);

    let code = ws
        .registry
        .run("test", &["arg1".to_string(), "arg2".to_string()], &runner)
        .unwrap();

    assert_eq!(code, 7);
    let calls = runner.calls.borrow();
    assert_eq!(
        calls[0][0],
        std::path::absolute(&path).unwrap().to_string_lossy()
    );
    assert_eq!(calls[0][1..], ["arg1".to_string(), "arg2".to_string()]);
}

#[cfg(unix)]
#[test]
fn installed_launcher_runs_script_through_taku() {
    let ws = workspace();
    ws.registry.create("hello", &CreationSource::Default).unwrap();

    let host = FixedHost::new("laptop");
    let installer =
        Installer::new(&ws.registry, &host, ws.base.join("bin")).with_launcher("my-taku");
    installer
        .install(&InstallTarget::parse("hello"), None, None)
        .unwrap();

    let body = std::fs::read_to_string(ws.base.join("bin").join("hello")).unwrap();
    let root = std::path::absolute(ws.registry.root()).unwrap();
    assert_eq!(
        body,
        format!(
            "#!/usr/bin/env bash\nexport TAKU_SCRIPTS=\"{}\"\nexec my-taku run \"hello\" -- \"$@\"\n",
            root.display()
        )
    );
}
