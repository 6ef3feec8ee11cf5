use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// Byte order mark some editors prepend to UTF-8 files.
const UTF8_BOM: &str = "\u{feff}";

/// Read a source document, replacing invalid UTF-8 and dropping a leading BOM.
///
/// # Errors
/// Returns an error if the file cannot be read.
pub fn read_document(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(text.strip_prefix(UTF8_BOM).unwrap_or(&text).to_owned())
}

/// Write generated output next to its siblings, atomically.
///
/// Missing parent directories are created. The content goes to a temp file in
/// the target directory first and is renamed over `path`, so readers never see
/// a half-written artifact.
///
/// # Errors
/// Returns an error if a directory cannot be created or the write/rename fails.
pub fn write_output(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let temp_path = parent.join(format!(
        ".{}.esdev-tmp.{}",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("out"),
        std::process::id()
    ));

    {
        let mut file = File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }

    match fs::rename(&temp_path, path) {
        Ok(()) => Ok(()),
        Err(e) => {
            // Windows refuses to rename over an existing file.
            if cfg!(windows) {
                fs::copy(&temp_path, path)?;
                let _ = fs::remove_file(&temp_path);
                Ok(())
            } else {
                let _ = fs::remove_file(&temp_path);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_document_strips_bom() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("README.md");
        fs::write(&path, "\u{feff}# Title\n").unwrap();

        assert_eq!(read_document(&path).unwrap(), "# Title\n");
    }

    #[test]
    fn test_read_document_invalid_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.md");
        fs::write(&path, [b'#', b' ', 0x80, b'x']).unwrap();

        let content = read_document(&path).unwrap();
        assert!(content.starts_with("# "));
        assert!(content.contains('\u{FFFD}'));
    }

    #[test]
    fn test_write_output_creates_parents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("nested").join("page.html");

        write_output(&path, b"<p>hi</p>").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "<p>hi</p>");

        write_output(&path, b"<p>again</p>").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "<p>again</p>");
    }

    #[test]
    fn test_write_output_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stories.js");

        write_output(&path, b"export {}").unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["stories.js".to_string()]);
    }
}
