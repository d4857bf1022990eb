//! Writing rendered images to disk.

use std::path::Path;

use image::RgbImage;

use crate::error::QrError;
use crate::generator::encode_png;

/// Save `img` as PNG at `output_path`, whatever its extension.
///
/// The PNG is fully encoded in memory before the file is touched.
///
/// # Errors
///
/// Returns an error if encoding fails or the file cannot be written.
pub fn save_png(img: &RgbImage, output_path: &Path) -> Result<(), QrError> {
    let bytes = encode_png(img)?;
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            return Err(QrError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("output directory {} does not exist", parent.display()),
            )));
        }
    }
    std::fs::write(output_path, bytes).map_err(QrError::Io)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_png_regardless_of_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qr.jpg");
        let img = RgbImage::from_pixel(3, 3, image::Rgb([1, 2, 3]));
        save_png(&img, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), image::ImageFormat::Png);
    }

    #[test]
    fn missing_parent_directory_fails() {
        let img = RgbImage::new(1, 1);
        let err = save_png(&img, Path::new("/nonexistent/dir/qr.png")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
