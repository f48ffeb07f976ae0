use cfgkeeper::fs::backup_path_for;

mod helpers;
use helpers::{Capture, TestRoot};

#[test]
fn create_edit_save_reopen() {
    let root = TestRoot::new();
    let path = root.cfg("cfg.toml");
    {
        let mut cfg = root.builder().create(&path, 3).unwrap();
        let h = cfg.acquire_handle().unwrap();
        cfg.store_mut(h).unwrap().set("section.key", "value");
        cfg.release_handle(h).unwrap();
        cfg.save(true).unwrap();
    }
    assert!(path.exists());
    assert!(!backup_path_for(&path).exists(), "backup is session-scoped");
    assert!(root.staged_files().is_empty());

    let mut cfg = root.builder().open(&path, false, false).unwrap();
    assert_eq!(cfg.version(), 3);
    let h = cfg.acquire_handle().unwrap();
    assert_eq!(cfg.store(h).unwrap().get("section.key").as_deref(), Some("value"));
    cfg.release_handle(h).unwrap();
}

#[test]
fn remove_with_open_handle_keeps_working_copy_until_released() {
    let root = TestRoot::new();
    let path = root.cfg("cfg.toml");
    let cap = Capture::default();
    let mut cfg = root
        .builder()
        .with_audit(cap.audit_box())
        .with_facts(cap.facts_box())
        .create(&path, 1)
        .unwrap();
    cfg.save(true).unwrap();
    cfg.save(false).unwrap();
    assert!(path.exists() && cfg.backup_path().exists());

    let h = cfg.acquire_handle().unwrap();
    cfg.remove().unwrap();

    assert_eq!(cap.defects().len(), 1, "open handle during remove is a defect");
    assert!(!path.exists());
    assert!(!cfg.backup_path().exists());
    assert!(cfg.temp_path().exists(), "working copy stays while a handle uses it");
    let removes = cap.events("config.remove");
    assert_eq!(removes.last().map(|(d, _)| d.as_str()), Some("warn"));

    assert_eq!(
        cfg.discard_working_copy().unwrap_err().kind,
        cfgkeeper::types::ErrorKind::Logic
    );
    cfg.release_handle(h).unwrap();
    cfg.discard_working_copy().unwrap();
    assert!(!cfg.temp_path().exists());
    assert!(root.staged_files().is_empty());
}

#[test]
fn remove_without_handles_deletes_everything() {
    let root = TestRoot::new();
    let path = root.cfg("cfg.toml");
    let mut cfg = root.builder().create(&path, 1).unwrap();
    cfg.save(true).unwrap();
    cfg.remove().unwrap();
    assert!(!path.exists());
    assert!(!cfg.backup_path().exists());
    assert!(!cfg.temp_path().exists());
    // Removing again is fine: missing files are not failures.
    cfg.remove().unwrap();
}

#[test]
fn interrupted_session_is_recovered_from_backup() {
    let root = TestRoot::new();
    let path = root.cfg("cfg.toml");
    let (backup_bytes, temp, temp_bytes) = {
        let mut cfg = root.builder().create(&path, 1).unwrap();
        cfg.save(true).unwrap();
        let h = cfg.acquire_handle().unwrap();
        cfg.store_mut(h).unwrap().set("draft.title", "unsaved work");
        cfg.release_handle(h).unwrap();
        cfg.save(false).unwrap();
        (
            std::fs::read(cfg.backup_path()).unwrap(),
            cfg.temp_path().to_path_buf(),
            std::fs::read(cfg.temp_path()).unwrap(),
        )
    };
    // A crash skips the session's cleanup: put back the backup and working copy it would leave.
    std::fs::write(backup_path_for(&path), &backup_bytes).unwrap();
    std::fs::write(&temp, &temp_bytes).unwrap();
    let original = std::fs::read_to_string(&path).unwrap();
    assert!(!original.contains("draft"));

    let mut cfg = root.builder().open(&path, true, false).unwrap();
    let h = cfg.acquire_handle().unwrap();
    assert_eq!(
        cfg.store(h).unwrap().get("draft.title").as_deref(),
        Some("unsaved work")
    );
    cfg.release_handle(h).unwrap();
    cfg.save(true).unwrap();
    drop(cfg);
    assert!(std::fs::read_to_string(&path).unwrap().contains("unsaved work"));
    assert!(!backup_path_for(&path).exists());
}
