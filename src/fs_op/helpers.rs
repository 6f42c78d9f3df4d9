use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Build a temp-file path next to `target`. The suffix mixes the pid, the
/// current time and a process-wide counter so concurrent callers never
/// collide.
fn temp_sibling(target: &Path) -> PathBuf {
    use std::time::{SystemTime, UNIX_EPOCH};
    static NEXT_TEMP_ID: AtomicU64 = AtomicU64::new(0);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let pid = std::process::id() as u128;
    let seq = NEXT_TEMP_ID.fetch_add(1, Ordering::Relaxed) as u128;
    let raw = format!("{:x}{:x}{:x}", pid, nanos, seq);
    let suffix = &raw[raw.len().saturating_sub(12)..];
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    dir.join(format!(".tmp_atomic_write.{}", suffix))
}

/// Copy permission bits from `src` to `dst`. Ownership, timestamps and
/// extended attributes are left alone.
fn copy_permissions(src: &Path, dst: &Path) -> io::Result<()> {
    fs::set_permissions(dst, fs::metadata(src)?.permissions())
}

fn resolve_link(path: &Path) -> io::Result<PathBuf> {
    match fs::symlink_metadata(path) {
        Ok(md) if md.file_type().is_symlink() => fs::canonicalize(path),
        _ => Ok(path.to_path_buf()),
    }
}

/// Replace the contents of `target` with `data` by writing a temporary file
/// in the same directory and renaming it into place, so readers see either
/// the old or the new content and never a partial write.
///
/// The original file's permissions are carried over to the replacement.
/// When `target` is a symlink the file it points at is replaced and the
/// link itself is kept. On failure the temporary file is removed and
/// `target` is untouched.
pub fn atomic_replace(target: &Path, data: &[u8]) -> io::Result<()> {
    let resolved = resolve_link(target)?;
    let target = resolved.as_path();
    let tmp = temp_sibling(target);
    let result = fs::write(&tmp, data)
        .and_then(|_| {
            if target.exists() {
                copy_permissions(target, &tmp)
            } else {
                Ok(())
            }
        })
        .and_then(|_| fs::rename(&tmp, target));
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn leftovers(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(".tmp_atomic_write."))
            .count()
    }

    #[test]
    fn replaces_content_without_leftovers() {
        let td = tempdir().expect("tempdir");
        let p = td.path().join("f.txt");
        fs::write(&p, "old").expect("write");
        atomic_replace(&p, b"new content").expect("replace");
        assert_eq!(fs::read_to_string(&p).unwrap(), "new content");
        assert_eq!(leftovers(td.path()), 0, "temp file left behind");
    }

    #[test]
    fn failed_rename_cleans_up_temp_file() {
        let td = tempdir().expect("tempdir");
        // Renaming a file over a non-empty directory fails on every platform.
        let target = td.path().join("occupied");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("inner"), "x").unwrap();
        assert!(atomic_replace(&target, b"data").is_err());
        assert_eq!(leftovers(td.path()), 0, "temp file left behind");
        assert!(target.join("inner").exists());
    }

    #[cfg(unix)]
    #[test]
    fn replacement_keeps_mode_bits() {
        use std::os::unix::fs::PermissionsExt;
        let td = tempdir().expect("tempdir");
        let p = td.path().join("run.sh");
        fs::write(&p, "old").unwrap();
        fs::set_permissions(&p, fs::Permissions::from_mode(0o640)).unwrap();
        atomic_replace(&p, b"new").expect("replace");
        assert_eq!(fs::metadata(&p).unwrap().permissions().mode() & 0o777, 0o640);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_target_keeps_the_link() {
        let td = tempdir().expect("tempdir");
        let real_dir = td.path().join("real");
        fs::create_dir(&real_dir).unwrap();
        let real = real_dir.join("t.txt");
        let link = td.path().join("link.txt");
        fs::write(&real, "old").unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        atomic_replace(&link, b"new").expect("replace");

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&real).unwrap(), "new");
        assert_eq!(leftovers(td.path()), 0);
        assert_eq!(leftovers(&real_dir), 0);
    }

    #[test]
    fn temp_names_are_unique() {
        let p = Path::new("/t/a.txt");
        let a = temp_sibling(p);
        let b = temp_sibling(p);
        assert_ne!(a, b);
        assert_eq!(a.parent(), Some(Path::new("/t")));
    }
}
