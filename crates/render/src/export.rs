use std::path::{Path, PathBuf};

use crate::backend::{CaptureError, CapturedFrame};

/// File name the screenshot trigger writes to.
pub const SCREENSHOT_FILE: &str = "screenshot.png";

/// Encode a captured frame as PNG at `path`.
pub fn save_png(frame: &CapturedFrame, path: impl AsRef<Path>) -> Result<(), CaptureError> {
    let expected = frame.width as usize * frame.height as usize * 4;
    if frame.rgba.len() != expected {
        return Err(CaptureError::SizeMismatch {
            expected,
            actual: frame.rgba.len(),
        });
    }
    let image = image::RgbaImage::from_raw(frame.width, frame.height, frame.rgba.clone()).ok_or(
        CaptureError::SizeMismatch {
            expected,
            actual: frame.rgba.len(),
        },
    )?;
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    image.save_with_format(path, image::ImageFormat::Png)?;
    tracing::info!(path = %path.display(), width = frame.width, height = frame.height, "screenshot saved");
    Ok(())
}

/// Save into `dir` under [`SCREENSHOT_FILE`], returning the written path.
pub fn save_screenshot(frame: &CapturedFrame, dir: impl AsRef<Path>) -> Result<PathBuf, CaptureError> {
    let path = dir.as_ref().join(SCREENSHOT_FILE);
    save_png(frame, &path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32) -> CapturedFrame {
        let mut rgba = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = if (x + y) % 2 == 0 { 255 } else { 0 };
                rgba.extend_from_slice(&[v, v, v, 255]);
            }
        }
        CapturedFrame { width, height, rgba }
    }

    #[test]
    fn writes_decodable_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_screenshot(&checker(4, 2), dir.path().join("shots")).unwrap();
        assert!(path.ends_with(SCREENSHOT_FILE));
        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (4, 2));
        assert_eq!(decoded.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(decoded.get_pixel(1, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn rejects_short_buffers() {
        let mut frame = checker(4, 2);
        frame.rgba.truncate(10);
        let dir = tempfile::tempdir().unwrap();
        let err = save_png(&frame, dir.path().join("x.png")).unwrap_err();
        assert!(matches!(
            err,
            CaptureError::SizeMismatch {
                expected: 32,
                actual: 10
            }
        ));
    }
}
