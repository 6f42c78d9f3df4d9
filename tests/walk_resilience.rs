#![cfg(unix)]

use std::fs;
use std::os::unix::fs::{symlink, PermissionsExt};

use tempfile::tempdir;

use file_batch::fs_op::{
    rename_extensions, rewrite_text_when, walk, EntryKind, Rewrite, TraversalMode,
};

// An unreadable subdirectory is skipped and counted; its siblings are still
// processed.
#[test]
fn unreadable_subdirectory_does_not_stop_the_batch() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    let locked = tmp.path().join("locked");
    let open = tmp.path().join("open");
    fs::create_dir(&locked)?;
    fs::create_dir(&open)?;
    fs::write(locked.join("hidden.txt"), "x")?;
    fs::write(open.join("visible.txt"), "x")?;
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))?;

    // Running as root the restriction has no effect; nothing to test then.
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))?;
        return Ok(());
    }

    let result = rename_extensions(tmp.path(), ".txt", ".data", TraversalMode::Recursive);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))?;
    let report = result?;

    assert!(open.join("visible.data").exists());
    assert!(locked.join("hidden.txt").exists());
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.skipped, 1);
    assert!(report.is_clean());
    Ok(())
}

#[test]
fn unreadable_file_is_a_read_failure() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    let secret = tmp.path().join("secret.txt");
    fs::write(&secret, "x")?;
    fs::write(tmp.path().join("plain.txt"), "x")?;
    fs::set_permissions(&secret, fs::Permissions::from_mode(0o000))?;

    if fs::File::open(&secret).is_ok() {
        fs::set_permissions(&secret, fs::Permissions::from_mode(0o644))?;
        return Ok(());
    }

    let report = rewrite_text_when(tmp.path(), TraversalMode::Shallow, |_, _| {
        Rewrite::Changed("y".to_string())
    })?;
    fs::set_permissions(&secret, fs::Permissions::from_mode(0o644))?;

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.failures[0].path, secret);
    assert_eq!(fs::read_to_string(&secret)?, "x");
    Ok(())
}

// Symlinks are classified by what they point at but never descended into
// unless links are followed.
#[test]
fn symlinked_directory_is_not_descended() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    let outside = tempdir()?;
    fs::write(outside.path().join("far.txt"), "x")?;
    symlink(outside.path(), tmp.path().join("link"))?;
    fs::write(tmp.path().join("near.txt"), "x")?;

    let entries: Vec<_> = walk(tmp.path(), TraversalMode::Recursive)?.collect::<Result<_, _>>()?;
    let link = entries
        .iter()
        .find(|e| e.path().ends_with("link"))
        .expect("link entry");
    assert_eq!(link.kind(), EntryKind::Directory);
    assert!(!entries.iter().any(|e| e.path().ends_with("far.txt")));

    rename_extensions(tmp.path(), ".txt", ".data", TraversalMode::Recursive)?;
    assert!(outside.path().join("far.txt").exists());
    assert!(tmp.path().join("near.data").exists());
    Ok(())
}

#[test]
fn dangling_symlink_is_neither_file_nor_failure() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    symlink(tmp.path().join("gone.txt"), tmp.path().join("dangling.txt"))?;

    let report = rename_extensions(tmp.path(), ".txt", ".data", TraversalMode::Shallow)?;

    assert_eq!(report.visited, 0);
    assert!(report.is_clean());
    assert!(fs::symlink_metadata(tmp.path().join("dangling.txt")).is_ok());
    Ok(())
}
