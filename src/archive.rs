//! ZIP packing and unpacking for uploads and downloads.

use std::fs::{self, File};
use std::io::{self, Cursor};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("invalid ZIP archive: {0}")]
    Invalid(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Unpack an uploaded archive into `dest`, keeping only its Python files.
///
/// Entries without an enclosed name (absolute paths, `..` traversal) are
/// skipped, as are macOS metadata directories. Returns the relative paths
/// written, in archive order.
pub fn extract_zip(bytes: &[u8], dest: &Path) -> Result<Vec<String>, ArchiveError> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| ArchiveError::Invalid(e.to_string()))?;

    let mut written = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| ArchiveError::Invalid(e.to_string()))?;
        if entry.is_dir() {
            continue;
        }
        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!(name = entry.name(), "skipping unsafe archive entry");
            continue;
        };
        let is_python = relative.extension().is_some_and(|e| e == "py");
        let is_metadata = relative
            .components()
            .any(|c| c.as_os_str().to_string_lossy().starts_with("__MACOSX"));
        if !is_python || is_metadata {
            continue;
        }

        let target = dest.join(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        written.push(relative.to_string_lossy().replace('\\', "/"));
    }
    Ok(written)
}

/// Pack a directory tree into a ZIP at `dest`, entry names relative to
/// `src`, deflate compression.
pub fn zip_dir(src: &Path, dest: &Path) -> Result<usize, ArchiveError> {
    let file = File::create(dest)?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut count = 0;
    add_dir_entries(&mut writer, src, src, options, &mut count)?;
    writer
        .finish()
        .map_err(|e| ArchiveError::Invalid(e.to_string()))?;
    Ok(count)
}

fn add_dir_entries(
    writer: &mut ZipWriter<File>,
    root: &Path,
    dir: &Path,
    options: SimpleFileOptions,
    count: &mut usize,
) -> Result<(), ArchiveError> {
    let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            add_dir_entries(writer, root, &path, options, count)?;
            continue;
        }
        let name = path
            .strip_prefix(root)
            .map_err(|e| ArchiveError::Invalid(e.to_string()))?
            .to_string_lossy()
            .replace('\\', "/");
        writer
            .start_file(name, options)
            .map_err(|e| ArchiveError::Invalid(e.to_string()))?;
        let mut input = File::open(&path)?;
        io::copy(&mut input, writer)?;
        *count += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = ZipWriter::new(&mut cursor);
        let options = SimpleFileOptions::default();
        for (name, content) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn extracts_python_files_with_structure() {
        let bytes = build_zip(&[
            ("main.py", "x = 1\n"),
            ("pkg/util.py", "y = 2\n"),
            ("README.md", "nope"),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let written = extract_zip(&bytes, dir.path()).unwrap();

        assert_eq!(written, vec!["main.py", "pkg/util.py"]);
        assert_eq!(fs::read_to_string(dir.path().join("pkg/util.py")).unwrap(), "y = 2\n");
        assert!(!dir.path().join("README.md").exists());
    }

    #[test]
    fn skips_traversal_entries() {
        let bytes = build_zip(&[("../escape.py", "x = 1\n"), ("ok.py", "y = 2\n")]);
        let dir = tempfile::tempdir().unwrap();
        let written = extract_zip(&bytes, dir.path()).unwrap();

        assert_eq!(written, vec!["ok.py"]);
        assert!(!dir.path().parent().unwrap().join("escape.py").exists());
    }

    #[test]
    fn skips_macos_metadata() {
        let bytes = build_zip(&[("__MACOSX/._x.py", "junk"), ("x.py", "x = 1\n")]);
        let dir = tempfile::tempdir().unwrap();
        let written = extract_zip(&bytes, dir.path()).unwrap();
        assert_eq!(written, vec!["x.py"]);
    }

    #[test]
    fn rejects_non_zip_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_zip(b"definitely not a zip", dir.path()).unwrap_err();
        assert!(matches!(err, ArchiveError::Invalid(_)));
    }

    #[test]
    fn zip_dir_round_trips() {
        let src = tempfile::tempdir().unwrap();
        fs::create_dir_all(src.path().join("pkg")).unwrap();
        fs::write(src.path().join("a.py"), "a = 1\n").unwrap();
        fs::write(src.path().join("pkg/b.py"), "b = 2\n").unwrap();

        let out = tempfile::tempdir().unwrap();
        let zip_path = out.path().join("out.zip");
        let count = zip_dir(src.path(), &zip_path).unwrap();
        assert_eq!(count, 2);

        let extracted = tempfile::tempdir().unwrap();
        let bytes = fs::read(&zip_path).unwrap();
        let written = extract_zip(&bytes, extracted.path()).unwrap();
        assert_eq!(written, vec!["a.py", "pkg/b.py"]);
    }

    #[test]
    fn zip_of_empty_dir_has_no_entries() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let count = zip_dir(src.path(), &out.path().join("empty.zip")).unwrap();
        assert_eq!(count, 0);
    }
}
