use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

pub fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Check that `path` is an existing PDF file and return its absolute path.
pub fn validate_input_file(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        bail!("File not found: {}", path.display());
    }
    if !path.is_file() {
        bail!("Path is not a file: {}", path.display());
    }
    if !has_pdf_extension(path) {
        bail!("File is not a PDF: {}", path.display());
    }

    let absolute = path
        .canonicalize()
        .with_context(|| format!("File is not readable: {}", path.display()))?;
    debug!(path = %absolute.display(), "validated input file");
    Ok(absolute)
}

/// `<output_dir>/<stem><suffix>.<ext>`
pub fn output_path(input: &Path, output_dir: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let ext = input
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("pdf");
    output_dir.join(format!("{}{}.{}", stem, suffix, ext))
}

/// Create the output directory if needed and return its absolute path.
pub fn ensure_output_dir(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Cannot create output directory {}", dir.display()))?;

    let metadata = std::fs::metadata(dir)
        .with_context(|| format!("Cannot access output directory {}", dir.display()))?;
    if metadata.permissions().readonly() {
        bail!("Output directory is not writable: {}", dir.display());
    }

    Ok(dir.canonicalize()?)
}

/// PDF files directly inside `dir`, sorted by name, skipping files whose name
/// ends with `processed_suffix` (earlier output of this tool).
pub fn find_pdf_files(dir: &Path, processed_suffix: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut skipped = 0;

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry =
            entry.with_context(|| format!("Failed to read directory: {}", dir.display()))?;
        let path = entry.path();
        if !entry.file_type().is_file() || !has_pdf_extension(path) {
            continue;
        }
        if is_processed(path, processed_suffix) {
            skipped += 1;
            continue;
        }
        files.push(path.to_path_buf());
    }

    debug!(
        dir = %dir.display(),
        found = files.len(),
        skipped,
        "searched for PDF files"
    );
    Ok(files)
}

fn is_processed(path: &Path, processed_suffix: &str) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(processed_suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_output_path() {
        let output = output_path(Path::new("/docs/report.pdf"), Path::new("out"), "_edit");
        assert_eq!(output, PathBuf::from("out/report_edit.pdf"));
    }

    #[test]
    fn test_output_path_keeps_extension_case() {
        let output = output_path(Path::new("SCAN.PDF"), Path::new("out"), "_trim");
        assert_eq!(output, PathBuf::from("out/SCAN_trim.PDF"));
    }

    #[test]
    fn test_validate_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("a.pdf");
        let txt = dir.path().join("a.txt");
        fs::write(&pdf, b"%PDF-1.5").unwrap();
        fs::write(&txt, b"text").unwrap();

        assert!(validate_input_file(&pdf).unwrap().is_absolute());
        assert!(validate_input_file(&txt)
            .unwrap_err()
            .to_string()
            .contains("not a PDF"));
        assert!(validate_input_file(&dir.path().join("missing.pdf"))
            .unwrap_err()
            .to_string()
            .contains("File not found"));
        assert!(validate_input_file(dir.path())
            .unwrap_err()
            .to_string()
            .contains("not a file"));
    }

    #[test]
    fn test_find_pdf_files_skips_processed() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.PDF", "a_edit.pdf", "notes.txt"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        let files = find_pdf_files(dir.path(), "_edit.pdf").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);
    }

    #[test]
    fn test_ensure_output_dir_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out").join("nested");
        let created = ensure_output_dir(&target).unwrap();
        assert!(created.is_dir());
        assert!(created.is_absolute());
    }
}
