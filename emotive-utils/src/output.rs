//! Screenshot naming and PNG encoding.

use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone};
use image::{ExtendedColorType, ImageEncoder, RgbImage, codecs::png::PngEncoder};
use log::debug;

/// `screenshot_<YYYYMMDD_HHMMSS>.png` for the given timestamp.
pub fn screenshot_file_name<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("screenshot_{}.png", at.format("%Y%m%d_%H%M%S"))
}

/// Full screenshot path inside `dir` for the current local time.
pub fn screenshot_path(dir: &Path) -> PathBuf {
    dir.join(screenshot_file_name(&Local::now()))
}

/// Encode `image` as PNG at `path`, creating parent directories as needed.
pub fn save_png(image: &RgbImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let writer = BufWriter::new(file);
    PngEncoder::new(writer)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgb8,
        )
        .with_context(|| format!("failed to encode PNG {}", path.display()))?;

    debug!(
        "Wrote {}x{} PNG to {}",
        image.width(),
        image.height(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    #[test]
    fn file_name_uses_compact_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(screenshot_file_name(&at), "screenshot_20240309_070501.png");
    }

    #[test]
    fn save_png_creates_missing_directories() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("nested").join("shot.png");
        let image = RgbImage::from_pixel(8, 4, image::Rgb([10, 20, 30]));

        save_png(&image, &path).expect("save png");

        let decoded = image::open(&path).expect("decode png").to_rgb8();
        assert_eq!(decoded.dimensions(), (8, 4));
        assert_eq!(decoded.get_pixel(3, 2), &image::Rgb([10, 20, 30]));
    }
}
