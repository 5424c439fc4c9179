//! Image input: validation, loading, and directory scanning

use image::DynamicImage;
use nutriscan_types::{Error, Result, ScanError};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Supported image extensions
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp", "tif", "tiff"];

/// Check if a path has a supported image extension
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Validate an image file exists, has a supported extension, and decodes
pub fn validate_image(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.display().to_string()));
    }

    if !path.is_file() {
        return Err(Error::InvalidImageFormat(format!(
            "{} is not a file",
            path.display()
        )));
    }

    if !is_supported_image(path) {
        return Err(Error::InvalidImageFormat(format!(
            "Unsupported image format: {}",
            path.display()
        )));
    }

    image::open(path)?;
    Ok(())
}

/// Decode an image for scanning. Any read or decode failure is `InvalidImage`.
pub fn load_image(path: &Path) -> std::result::Result<DynamicImage, ScanError> {
    image::open(path).map_err(|e| ScanError::InvalidImage(format!("{}: {}", path.display(), e)))
}

/// Decode an in-memory image, e.g. an uploaded file
pub fn load_image_bytes(bytes: &[u8]) -> std::result::Result<DynamicImage, ScanError> {
    if bytes.is_empty() {
        return Err(ScanError::InvalidImage("empty image data".to_string()));
    }
    image::load_from_memory(bytes).map_err(|e| ScanError::InvalidImage(e.to_string()))
}

/// Recursively collect supported images, sorted by file name
pub fn scan_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(Error::FileNotFound(dir.display().to_string()));
    }

    if !dir.is_dir() {
        return Err(Error::InvalidImageFormat(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let mut images: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && is_supported_image(path))
        .collect();

    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()).then_with(|| a.cmp(b)));

    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use tempfile::tempdir;

    fn write_png(path: &Path) {
        GrayImage::from_pixel(4, 4, Luma([200])).save(path).unwrap();
    }

    #[test]
    fn test_is_supported_image() {
        assert!(is_supported_image(Path::new("label.jpg")));
        assert!(is_supported_image(Path::new("label.JPEG")));
        assert!(is_supported_image(Path::new("label.png")));
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("label")));
    }

    #[test]
    fn test_validate_image() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("ok.png");
        write_png(&good);
        assert!(validate_image(&good).is_ok());

        assert!(matches!(
            validate_image(&dir.path().join("missing.png")),
            Err(Error::FileNotFound(_))
        ));
        assert!(matches!(validate_image(dir.path()), Err(Error::InvalidImageFormat(_))));

        let corrupt = dir.path().join("corrupt.png");
        std::fs::write(&corrupt, b"definitely not a png").unwrap();
        assert!(validate_image(&corrupt).is_err());
    }

    #[test]
    fn test_load_image_maps_to_invalid_image() {
        let dir = tempdir().unwrap();
        let corrupt = dir.path().join("corrupt.jpg");
        std::fs::write(&corrupt, b"\x00\x01\x02").unwrap();

        assert!(matches!(load_image(&corrupt), Err(ScanError::InvalidImage(_))));
        assert!(matches!(
            load_image(&dir.path().join("absent.png")),
            Err(ScanError::InvalidImage(_))
        ));
        assert!(matches!(load_image_bytes(&[]), Err(ScanError::InvalidImage(_))));
        assert!(matches!(load_image_bytes(b"garbage"), Err(ScanError::InvalidImage(_))));
    }

    #[test]
    fn test_scan_directory_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        write_png(&dir.path().join("b.png"));
        write_png(&sub.join("a.png"));
        write_png(&dir.path().join("c.png"));
        std::fs::write(dir.path().join("readme.txt"), "x").unwrap();

        let images = scan_directory(dir.path()).unwrap();
        let names: Vec<_> = images
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.png", "b.png", "c.png"]);
    }

    #[test]
    fn test_scan_directory_errors() {
        let dir = tempdir().unwrap();
        assert!(scan_directory(&dir.path().join("nope")).is_err());
        let file = dir.path().join("file.png");
        write_png(&file);
        assert!(matches!(scan_directory(&file), Err(Error::InvalidImageFormat(_))));
    }
}
