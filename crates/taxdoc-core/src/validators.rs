//! Upload checks run before any processing.

use std::path::Path;

use crate::error::{Result, TaxdocError};
use crate::models::config::FileConfig;

/// Reject files that are missing, empty, too large or of a disallowed type.
pub fn validate_upload(path: &Path, config: &FileConfig) -> Result<()> {
    let reject = |reason: String| TaxdocError::InvalidUpload {
        path: path.to_path_buf(),
        reason,
    };

    let metadata = std::fs::metadata(path).map_err(|e| reject(e.to_string()))?;
    if !metadata.is_file() {
        return Err(reject("not a regular file".to_string()));
    }
    if metadata.len() == 0 {
        return Err(reject("file is empty".to_string()));
    }
    if metadata.len() > config.max_size_bytes {
        return Err(reject(format!(
            "file is {} bytes, limit is {}",
            metadata.len(),
            config.max_size_bytes
        )));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    if !config
        .allowed_extensions
        .iter()
        .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(&extension))
    {
        return Err(reject(format!("file type {:?} is not allowed", extension)));
    }

    Ok(())
}

/// File name reduced to `[A-Za-z0-9._-]`, without any directory part.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_accepts_allowed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "Statement.PDF", b"%PDF-1.5");
        assert!(validate_upload(&path, &FileConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_extension_size_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = FileConfig {
            max_size_bytes: 4,
            ..FileConfig::default()
        };

        let exe = write(&dir, "tool.exe", b"MZ");
        assert!(matches!(
            validate_upload(&exe, &config),
            Err(TaxdocError::InvalidUpload { .. })
        ));

        let big = write(&dir, "scan.png", b"0123456789");
        assert!(validate_upload(&big, &config).is_err());

        let empty = write(&dir, "blank.jpg", b"");
        assert!(validate_upload(&empty, &config).is_err());

        assert!(validate_upload(&dir.path().join("missing.png"), &config).is_err());
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("my bill (1).pdf"), "my_bill__1_.pdf");
        assert_eq!(sanitize_filename("C:\\scans\\jan.png"), "jan.png");
        assert_eq!(sanitize_filename(".."), "upload");
    }
}
