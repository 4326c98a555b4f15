//! First-page images for OCR of scanned PDFs.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;
use tracing::{debug, info};

use super::{PdfExtractor, Result};
use crate::error::PdfError;
use crate::models::config::PdfConfig;

/// A page image on disk; removed when dropped.
pub struct PageImage {
    _dir: TempDir,
    path: PathBuf,
}

impl PageImage {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Check if pdftoppm (poppler-utils) is available.
pub fn is_pdftoppm_available(command: &str) -> bool {
    Command::new(command)
        .arg("-v")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Render page 1 of `pdf_path` to PNG with `pdftoppm`.
pub fn rasterize_first_page(pdf_path: &Path, command: &str, dpi: u32) -> Result<PageImage> {
    let dir = scratch_dir()?;
    let prefix = dir.path().join("page");

    let output = Command::new(command)
        .args(["-png", "-r", &dpi.to_string(), "-f", "1", "-l", "1"])
        .arg(pdf_path)
        .arg(&prefix)
        .output()
        .map_err(|e| PdfError::ImageExtraction(format!("could not run {}: {}", command, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PdfError::ImageExtraction(format!(
            "{} failed: {}",
            command,
            stderr.trim()
        )));
    }

    // pdftoppm pads the page number depending on the page count
    let mut rendered: Vec<PathBuf> = std::fs::read_dir(dir.path())
        .map_err(|e| PdfError::ImageExtraction(e.to_string()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().map(|ext| ext == "png").unwrap_or(false))
        .collect();
    rendered.sort();

    let path = rendered
        .into_iter()
        .next()
        .ok_or_else(|| PdfError::ImageExtraction("pdftoppm produced no image".to_string()))?;

    debug!("Rendered {} at {} dpi", pdf_path.display(), dpi);
    Ok(PageImage { _dir: dir, path })
}

/// Image of the first page: rendered when `pdftoppm` is available, otherwise
/// the first embedded image.
pub fn page_image(pdf_path: &Path, pdf: &PdfExtractor, config: &PdfConfig) -> Result<PageImage> {
    if is_pdftoppm_available(&config.pdftoppm_command) {
        return rasterize_first_page(pdf_path, &config.pdftoppm_command, config.render_dpi);
    }

    info!("pdftoppm not found, using the embedded page image");
    let image = pdf.first_page_image()?;

    let dir = scratch_dir()?;
    let path = dir.path().join("page-1.png");
    image
        .save(&path)
        .map_err(|e| PdfError::ImageExtraction(e.to_string()))?;

    Ok(PageImage { _dir: dir, path })
}

fn scratch_dir() -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix("taxdoc-pdf-")
        .tempdir()
        .map_err(|e| PdfError::ImageExtraction(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_pdftoppm() {
        assert!(!is_pdftoppm_available("taxdoc-no-such-pdftoppm"));

        let result = rasterize_first_page(Path::new("scan.pdf"), "taxdoc-no-such-pdftoppm", 150);
        assert!(matches!(result, Err(PdfError::ImageExtraction(_))));
    }

    #[test]
    fn test_page_image_is_removed_on_drop() {
        let dir = scratch_dir().unwrap();
        let path = dir.path().join("page-1.png");
        std::fs::write(&path, b"png").unwrap();

        let page = PageImage { _dir: dir, path: path.clone() };
        assert!(page.path().exists());
        drop(page);
        assert!(!path.exists());
    }
}
