//! Output writing: derive the output path and write it atomically.
//!
//! Text goes to a temporary file inside the destination directory, which is
//! renamed over the final path only after the write succeeds. A failed write
//! therefore leaves neither a truncated output nor a stray temp file.

use crate::error::FileError;
use crate::pipeline::input::SourceFile;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// `<dest_dir>/<stem>.<extension>`.
pub fn output_path_for(dest_dir: &Path, source: &SourceFile, extension: &str) -> PathBuf {
    dest_dir.join(format!("{}.{}", source.stem(), extension))
}

/// Write `text` as the full UTF-8 contents of `source`'s output file,
/// replacing any existing file.
pub fn write_output(
    dest_dir: &Path,
    source: &SourceFile,
    text: &str,
    extension: &str,
) -> Result<PathBuf, FileError> {
    let path = output_path_for(dest_dir, source, extension);
    write_atomic(&path, text.as_bytes()).map_err(|e| FileError::WriteFailed {
        path: path.clone(),
        detail: e.to_string(),
    })?;
    Ok(path)
}

/// Write `bytes` to `path` through a sibling temp file and rename.
///
/// A new file gets the same mode a plain create would (0666 less the umask);
/// an overwritten file keeps its existing mode.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = temp_file_in(dir)?;
    if let Ok(meta) = std::fs::metadata(path) {
        if meta.is_file() {
            tmp.as_file().set_permissions(meta.permissions())?;
        }
    }
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    // On failure the returned error still owns the temp file, which is
    // deleted when dropped.
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(unix)]
fn temp_file_in(dir: &Path) -> std::io::Result<NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;
    // The mode is passed to open(2), so the umask still applies.
    tempfile::Builder::new()
        .permissions(std::fs::Permissions::from_mode(0o666))
        .tempfile_in(dir)
}

#[cfg(not(unix))]
fn temp_file_in(dir: &Path) -> std::io::Result<NamedTempFile> {
    NamedTempFile::new_in(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn output_name_uses_stem_and_new_extension() {
        let src = SourceFile::new("in/Report.PDF");
        assert_eq!(
            output_path_for(Path::new("out"), &src, "md"),
            PathBuf::from("out/Report.md")
        );
    }

    #[test]
    fn writes_utf8_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let src = SourceFile::new("in/doc.pdf");

        write_output(dir.path(), &src, "first", "md").unwrap();
        let path = write_output(dir.path(), &src, "日本語 ✓", "md").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "日本語 ✓");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1, "no temp files left");
    }

    #[test]
    fn failed_write_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let src = SourceFile::new("in/doc.pdf");
        // A directory squatting on the output path makes the rename fail.
        fs::create_dir(dir.path().join("doc.md")).unwrap();
        fs::write(dir.path().join("doc.md/keep"), b"x").unwrap();

        let err = write_output(dir.path(), &src, "text", "md").unwrap_err();
        assert!(matches!(err, FileError::WriteFailed { .. }));

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("doc.md")]);
    }

    #[cfg(unix)]
    fn mode(path: &Path) -> u32 {
        use std::os::unix::fs::PermissionsExt;
        fs::metadata(path).unwrap().permissions().mode() & 0o777
    }

    #[cfg(unix)]
    #[test]
    fn new_output_mode_matches_plain_create() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("plain.md");
        fs::write(&plain, "x").unwrap();

        let out = write_output(dir.path(), &SourceFile::new("in/doc.pdf"), "x", "md").unwrap();
        assert_eq!(mode(&out), mode(&plain));
    }

    #[cfg(unix)]
    #[test]
    fn overwrite_keeps_existing_mode() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("doc.md");
        fs::write(&target, "old").unwrap();
        fs::set_permissions(&target, fs::Permissions::from_mode(0o640)).unwrap();

        write_output(dir.path(), &SourceFile::new("in/doc.pdf"), "new", "md").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
        assert_eq!(mode(&target), 0o640);
    }
}
