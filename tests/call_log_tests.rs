// Call log store tests against a real folder

mod common;

use anyhow::Result;
use call_capture::calllog::{CallLogStore, DeleteOutcome};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_delete_removes_file_and_entry() -> Result<()> {
    let dir = TempDir::new()?;
    let path = common::call_fixture(dir.path(), "Recording_20240101_120000.wav")?;

    let mut store = CallLogStore::new(dir.path());
    store.add(path.clone());

    let outcome = store.delete(&path)?;
    assert_eq!(
        outcome,
        DeleteOutcome {
            file_removed: true,
            entry_removed: true
        }
    );
    assert!(!path.exists());
    assert!(store.is_empty());

    Ok(())
}

#[test]
fn test_delete_missing_file_still_drops_entry() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("gone.wav");

    let mut store = CallLogStore::new(dir.path());
    store.add(path.clone());

    let outcome = store.delete(&path)?;
    assert!(!outcome.file_removed);
    assert!(outcome.entry_removed);
    assert!(store.is_empty());

    Ok(())
}

#[test]
fn test_delete_unknown_path_changes_nothing() -> Result<()> {
    let dir = TempDir::new()?;
    let kept = common::call_fixture(dir.path(), "kept.wav")?;

    let mut store = CallLogStore::new(dir.path());
    store.add(kept.clone());

    let outcome = store.delete(&dir.path().join("unknown.wav"))?;
    assert_eq!(outcome, DeleteOutcome::default());
    assert_eq!(store.entries(), &[kept.clone()]);
    assert!(kept.exists());

    Ok(())
}

#[test]
fn test_search_preserves_store_order() {
    let mut store = CallLogStore::new("/recordings");
    store.add("/recordings/call_b.wav");
    store.add("/recordings/meeting.wav");
    store.add("/recordings/call_a.wav");

    assert_eq!(
        store.search("call"),
        vec![
            PathBuf::from("/recordings/call_b.wav"),
            PathBuf::from("/recordings/call_a.wav"),
        ]
    );
    assert!(store.search("voicemail").is_empty());
}

#[test]
fn test_export_as_text_writes_one_path_per_line() -> Result<()> {
    let dir = TempDir::new()?;
    let mut store = CallLogStore::new(dir.path());
    store.add("/recordings/first.wav");
    store.add("/recordings/second.wav");

    let out = dir.path().join("log.txt");
    store.export_as_text(&out)?;

    let text = fs::read_to_string(&out)?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines, vec!["/recordings/first.wav", "/recordings/second.wav"]);

    Ok(())
}

#[test]
fn test_export_empty_log_creates_empty_file() -> Result<()> {
    let dir = TempDir::new()?;
    let store = CallLogStore::new(dir.path());

    let out = dir.path().join("empty.txt");
    store.export_as_text(&out)?;
    assert_eq!(fs::read_to_string(&out)?, "");

    Ok(())
}

#[test]
fn test_export_logs_uses_timestamped_name() -> Result<()> {
    let dir = TempDir::new()?;
    let mut store = CallLogStore::new(dir.path());
    store.add("/recordings/a.wav");

    let path = store.export_logs(dir.path())?;
    let name = path.file_name().unwrap().to_string_lossy().to_string();

    assert!(name.starts_with("CallLogs_"), "{}", name);
    assert!(name.ends_with(".txt"), "{}", name);
    // CallLogs_yyyyMMdd_HHmmss.txt
    assert_eq!(name.len(), "CallLogs_20240101_120000.txt".len());
    assert_eq!(fs::read_to_string(&path)?, "/recordings/a.wav\n");

    Ok(())
}

#[test]
fn test_import_copies_into_managed_folder() -> Result<()> {
    let source = TempDir::new()?;
    let managed = TempDir::new()?;
    let a = common::call_fixture(source.path(), "alice.wav")?;
    let b = common::call_fixture(source.path(), "bob.wav")?;

    let mut store = CallLogStore::new(managed.path());
    let imported = store.import_files(&[&a, &b])?;

    let expected = vec![managed.path().join("alice.wav"), managed.path().join("bob.wav")];
    assert_eq!(imported, expected);
    assert_eq!(store.entries(), expected.as_slice());
    assert!(expected.iter().all(|p| p.is_file()));
    // Sources are copied, not moved
    assert!(a.exists() && b.exists());

    Ok(())
}

#[test]
fn test_import_stops_at_first_failure() -> Result<()> {
    let source = TempDir::new()?;
    let managed = TempDir::new()?;
    let a = common::call_fixture(source.path(), "alice.wav")?;
    let missing = source.path().join("missing.wav");
    let c = common::call_fixture(source.path(), "carol.wav")?;

    let mut store = CallLogStore::new(managed.path());
    let result = store.import_files(&[a, missing, c]);

    assert!(result.is_err());
    assert_eq!(store.entries(), &[managed.path().join("alice.wav")]);
    assert!(managed.path().join("alice.wav").exists());
    assert!(!managed.path().join("carol.wav").exists());

    Ok(())
}

#[test]
fn test_import_overwrites_same_name() -> Result<()> {
    let source = TempDir::new()?;
    let managed = TempDir::new()?;
    let incoming = common::write_tone_wav(&source.path().join("call.wav"), 1.0, 44100, 1)?;
    common::call_fixture(managed.path(), "call.wav")?;

    let mut store = CallLogStore::new(managed.path());
    store.import_files(&[&incoming])?;

    assert_eq!(
        fs::metadata(managed.path().join("call.wav"))?.len(),
        fs::metadata(&incoming)?.len()
    );

    Ok(())
}

#[test]
fn test_export_files_copies_every_entry() -> Result<()> {
    let managed = TempDir::new()?;
    let dest = TempDir::new()?;
    let a = common::call_fixture(managed.path(), "a.wav")?;
    let b = common::call_fixture(managed.path(), "b.wav")?;

    let mut store = CallLogStore::new(managed.path());
    store.add(a);
    store.add(b);

    let target = dest.path().join("backup");
    let exported = store.export_files(&target)?;

    assert_eq!(exported, vec![target.join("a.wav"), target.join("b.wav")]);
    assert_eq!(common::wav_files_in(&target).len(), 2);
    // Exporting does not change the log
    assert_eq!(store.len(), 2);

    Ok(())
}

#[test]
fn test_load_existing_and_prune_missing() -> Result<()> {
    let dir = TempDir::new()?;
    let first = common::call_fixture(dir.path(), "Recording_20240101_090000.wav")?;
    let second = common::call_fixture(dir.path(), "Recording_20240101_100000.wav")?;
    fs::write(dir.path().join("notes.txt"), "not audio")?;

    let mut store = CallLogStore::new(dir.path());
    assert_eq!(store.load_existing()?, 2);
    assert_eq!(store.entries(), &[first.clone(), second.clone()]);

    fs::remove_file(&first)?;
    let pruned = store.prune_missing();
    assert_eq!(pruned, vec![first]);
    assert_eq!(store.entries(), &[second]);

    Ok(())
}

#[test]
fn test_import_from_managed_folder_keeps_file() -> Result<()> {
    let managed = TempDir::new()?;
    let source = TempDir::new()?;
    let existing = common::call_fixture(managed.path(), "Recording_20240101_090000.wav")?;
    let outside = common::call_fixture(source.path(), "later.wav")?;
    let size = fs::metadata(&existing)?.len();

    let mut store = CallLogStore::new(managed.path());
    store.load_existing()?;

    let result = store.import_files(&[&existing, &outside]);
    let err = result.expect_err("importing a file onto itself must fail");
    assert!(err.to_string().contains("already in"), "{}", err);

    assert_eq!(fs::metadata(&existing)?.len(), size);
    assert_eq!(store.entries(), &[existing]);
    assert!(!managed.path().join("later.wav").exists());

    Ok(())
}

#[test]
fn test_export_into_managed_folder_keeps_files() -> Result<()> {
    let managed = TempDir::new()?;
    let a = common::call_fixture(managed.path(), "a.wav")?;
    let b = common::call_fixture(managed.path(), "b.wav")?;
    let size = fs::metadata(&a)?.len();

    let mut store = CallLogStore::new(managed.path());
    store.add(a.clone());
    store.add(b.clone());

    assert!(store.export_files(managed.path()).is_err());

    assert_eq!(fs::metadata(&a)?.len(), size);
    assert_eq!(fs::metadata(&b)?.len(), size);
    assert_eq!(store.len(), 2);

    Ok(())
}
