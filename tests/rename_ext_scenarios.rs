use std::fs;
use std::path::Path;

use tempfile::tempdir;

use file_batch::fs_op::{rename_extensions, FailureKind, FsOpError, TraversalMode};

fn names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// Top-level .txt files become .data; everything else is left alone.
#[test]
fn shallow_rename_changes_only_matching_files() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    for name in ["a.txt", "b.txt", "c.md"] {
        fs::write(tmp.path().join(name), name)?;
    }

    let report = rename_extensions(tmp.path(), ".txt", ".data", TraversalMode::Shallow)?;

    assert_eq!(names(tmp.path()), ["a.data", "b.data", "c.md"]);
    assert_eq!(fs::read_to_string(tmp.path().join("a.data"))?, "a.txt");
    assert_eq!(report.visited, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.unchanged, 1);
    assert!(report.is_clean());
    Ok(())
}

#[test]
fn shallow_rename_ignores_nested_files() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    fs::create_dir(tmp.path().join("x"))?;
    fs::write(tmp.path().join("x").join("d.txt"), "deep")?;

    let report = rename_extensions(tmp.path(), ".txt", ".data", TraversalMode::Shallow)?;

    assert!(tmp.path().join("x").join("d.txt").exists());
    assert!(!tmp.path().join("x").join("d.data").exists());
    assert_eq!(report.visited, 0);
    Ok(())
}

#[test]
fn recursive_rename_reaches_nested_files() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    let nested = tmp.path().join("x").join("y");
    fs::create_dir_all(&nested)?;
    fs::write(tmp.path().join("x").join("d.txt"), "deep")?;
    fs::write(nested.join("e.txt"), "deeper")?;

    let report = rename_extensions(tmp.path(), ".txt", ".data", TraversalMode::Recursive)?;

    assert!(tmp.path().join("x").join("d.data").exists());
    assert!(!tmp.path().join("x").join("d.txt").exists());
    assert_eq!(fs::read_to_string(nested.join("e.data"))?, "deeper");
    assert_eq!(report.succeeded, 2);
    Ok(())
}

#[test]
fn second_run_renames_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    fs::write(tmp.path().join("a.txt"), "a")?;
    fs::write(tmp.path().join("b.md"), "b")?;

    rename_extensions(tmp.path(), ".txt", ".data", TraversalMode::Recursive)?;
    let before = names(tmp.path());
    let report = rename_extensions(tmp.path(), ".txt", ".data", TraversalMode::Recursive)?;

    assert_eq!(names(tmp.path()), before);
    assert_eq!(report.succeeded, 0);
    assert_eq!(report.unchanged, 2);
    Ok(())
}

// Directories named like a match and near-miss extensions stay untouched.
#[test]
fn directories_and_near_misses_are_not_renamed() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    fs::create_dir(tmp.path().join("notes.txt"))?;
    for name in ["a.TXT", "b.txtx", "c.txt.gz", "dtxt"] {
        fs::write(tmp.path().join(name), "x")?;
    }

    let report = rename_extensions(tmp.path(), ".txt", ".data", TraversalMode::Recursive)?;

    assert_eq!(
        names(tmp.path()),
        ["a.TXT", "b.txtx", "c.txt.gz", "dtxt", "notes.txt"]
    );
    assert_eq!(report.succeeded, 0);
    Ok(())
}

#[test]
fn existing_target_is_reported_and_kept() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    fs::write(tmp.path().join("a.txt"), "new")?;
    fs::write(tmp.path().join("a.data"), "old")?;
    fs::write(tmp.path().join("b.txt"), "b")?;

    let report = rename_extensions(tmp.path(), ".txt", ".data", TraversalMode::Shallow)?;

    assert_eq!(fs::read_to_string(tmp.path().join("a.data"))?, "old");
    assert!(tmp.path().join("a.txt").exists());
    assert!(tmp.path().join("b.data").exists());
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.failures[0].kind, FailureKind::TargetExists);
    assert_eq!(report.failures[0].path, tmp.path().join("a.txt"));
    Ok(())
}

#[test]
fn bad_roots_are_distinguished() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    let file = tmp.path().join("plain.txt");
    fs::write(&file, "x")?;

    let missing = rename_extensions(tmp.path().join("nope"), ".txt", ".data", TraversalMode::Shallow);
    assert!(matches!(missing, Err(FsOpError::RootNotFound(_))));

    let not_dir = rename_extensions(&file, ".txt", ".data", TraversalMode::Shallow);
    assert!(matches!(not_dir, Err(FsOpError::NotADirectory(_))));

    let bad_ext = rename_extensions(tmp.path(), "txt", ".data", TraversalMode::Shallow);
    assert!(matches!(bad_ext, Err(FsOpError::InvalidExtension(_))));
    assert!(file.exists());
    Ok(())
}
