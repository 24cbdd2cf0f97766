//! Reading and persisting config files.

use crate::error::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Read a config file as text.
///
/// Returns `Ok(None)` if the file doesn't exist.
/// Returns `Err` if the file exists but can't be read.
pub fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::ReadFile {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Longest symlink chain followed before giving up.
const MAX_SYMLINK_HOPS: usize = 40;

/// Replace the file at `path` with `contents`.
///
/// Missing parent directories are created. The new contents are written to a
/// temporary file in the same directory and renamed over the target, so
/// readers see either the old or the new file. If `path` is a symlink, the
/// file it points to is replaced and the link stays. An existing file keeps
/// its permissions; a new one is created readable by the owner only.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let write_err = |e: std::io::Error| Error::WriteFile {
        path: path.to_path_buf(),
        source: e,
    };
    let target = resolve_symlinks(path).map_err(write_err)?;

    let dir = match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| Error::CreateDir {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(contents).map_err(write_err)?;
    if let Ok(existing) = std::fs::metadata(&target) {
        tmp.as_file()
            .set_permissions(existing.permissions())
            .map_err(write_err)?;
    }
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(&target).map_err(|e| write_err(e.error))?;

    tracing::debug!(path = %path.display(), target = %target.display(), bytes = contents.len(), "saved config file");
    Ok(())
}

/// Follow `path` through any symlinks to the file that would be written.
/// Dangling links resolve to their missing destination.
fn resolve_symlinks(path: &Path) -> std::io::Result<PathBuf> {
    let mut current = path.to_path_buf();
    for _ in 0..MAX_SYMLINK_HOPS {
        match std::fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => {
                let link = std::fs::read_link(&current)?;
                current = match current.parent() {
                    Some(parent) => parent.join(link),
                    None => link,
                };
            }
            Ok(_) => return Ok(current),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(current),
            Err(e) => return Err(e),
        }
    }
    Err(std::io::Error::other("too many levels of symbolic links"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_optional_missing() {
        let temp = tempfile::tempdir().unwrap();
        let result = read_optional(&temp.path().join("missing")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_write_atomic_creates_parents() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("a").join("b").join("config");

        write_atomic(&path, b"hello\n").unwrap();
        assert_eq!(read_optional(&path).unwrap().as_deref(), Some("hello\n"));

        write_atomic(&path, b"bye\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "bye\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_through_symlink() {
        use std::os::unix::fs::{symlink, PermissionsExt};

        let temp = tempfile::tempdir().unwrap();
        let real = temp.path().join("dotfiles").join("netrc");
        std::fs::create_dir_all(real.parent().unwrap()).unwrap();
        std::fs::write(&real, "old\n").unwrap();
        std::fs::set_permissions(&real, std::fs::Permissions::from_mode(0o640)).unwrap();
        let link = temp.path().join(".netrc");
        symlink("dotfiles/netrc", &link).unwrap();

        write_atomic(&link, b"new\n").unwrap();

        assert!(std::fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(std::fs::read_to_string(&real).unwrap(), "new\n");
        let mode = std::fs::metadata(&real).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_dangling_symlink_creates_target() {
        let temp = tempfile::tempdir().unwrap();
        let link = temp.path().join("settings.xml");
        std::os::unix::fs::symlink(temp.path().join("m2").join("settings.xml"), &link).unwrap();

        write_atomic(&link, b"<settings/>\n").unwrap();

        assert!(std::fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(std::fs::read_to_string(&link).unwrap(), "<settings/>\n");
    }

    #[test]
    fn test_read_optional_directory_is_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = read_optional(temp.path()).unwrap_err();
        assert!(matches!(err, Error::ReadFile { .. }));
    }
}
