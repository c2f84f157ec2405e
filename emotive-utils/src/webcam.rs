//! Webcam frame sources.
//!
//! The capture loop only sees the [`FrameSource`] and [`CameraOpener`] traits;
//! [`WebcamCapture`] / [`NokhwaOpener`] are the real device implementations.
//! Camera handles are not `Send`, so a source must be opened on the thread that
//! reads from it.

use anyhow::{Context, Result, anyhow};
use image::RgbImage;
use log::{debug, info, warn};
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{CameraIndex, RequestedFormat, RequestedFormatType, Resolution},
};

/// A device that yields RGB frames on demand.
pub trait FrameSource {
    /// Read the next frame. `Ok(None)` means no frame was ready this time.
    fn read_frame(&mut self) -> Result<Option<RgbImage>>;

    /// Release the underlying device. Called exactly once when capture ends.
    fn release(&mut self) -> Result<()>;
}

/// Opens frame sources by camera index.
pub trait CameraOpener: Send + Sync {
    fn open(&self, index: u32) -> Result<Box<dyn FrameSource>>;
}

/// Opens real webcams through `nokhwa`, requesting a preferred resolution.
#[derive(Debug, Clone, Copy)]
pub struct NokhwaOpener {
    pub width: u32,
    pub height: u32,
}

impl CameraOpener for NokhwaOpener {
    fn open(&self, index: u32) -> Result<Box<dyn FrameSource>> {
        let capture = WebcamCapture::open(index, self.width, self.height)?;
        Ok(Box::new(capture))
    }
}

/// An open webcam stream.
pub struct WebcamCapture {
    camera: Camera,
    device_index: u32,
    streaming: bool,
}

impl WebcamCapture {
    /// Open `device_index` and start streaming.
    ///
    /// The requested resolution is a hint; drivers that refuse it keep their default.
    pub fn open(device_index: u32, width: u32, height: u32) -> Result<Self> {
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);

        debug!(
            "Opening webcam device {} (preferred {}x{})",
            device_index, width, height
        );

        let mut camera = Camera::new(CameraIndex::Index(device_index), requested)
            .with_context(|| format!("failed to open webcam device {device_index}"))?;

        camera
            .open_stream()
            .with_context(|| format!("failed to open stream for webcam device {device_index}"))?;

        if let Err(e) = camera.set_resolution(Resolution::new(width, height)) {
            warn!(
                "Webcam {} rejected {}x{}: {}. Using camera default.",
                device_index, width, height, e
            );
        }

        let actual = camera.resolution();
        info!(
            "Webcam device {} opened: {}x{} @ {} fps",
            device_index,
            actual.width(),
            actual.height(),
            camera.frame_rate()
        );

        Ok(Self {
            camera,
            device_index,
            streaming: true,
        })
    }
}

impl FrameSource for WebcamCapture {
    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        let frame = self
            .camera
            .frame()
            .context("failed to capture webcam frame")?;
        let decoded = frame
            .decode_image::<RgbFormat>()
            .context("failed to decode webcam frame")?;
        let (width, height) = (decoded.width(), decoded.height());
        if width == 0 || height == 0 {
            return Ok(None);
        }

        let image = RgbImage::from_raw(width, height, decoded.into_raw())
            .ok_or_else(|| anyhow!("webcam buffer does not match {width}x{height}"))?;
        Ok(Some(image))
    }

    fn release(&mut self) -> Result<()> {
        if !self.streaming {
            return Ok(());
        }
        self.streaming = false;
        self.camera
            .stop_stream()
            .with_context(|| format!("failed to stop webcam device {}", self.device_index))?;
        info!("Webcam device {} released", self.device_index);
        Ok(())
    }
}

impl Drop for WebcamCapture {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!("{e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Requires webcam hardware
    fn captures_and_releases_default_camera() {
        let opener = NokhwaOpener {
            width: 640,
            height: 480,
        };
        let mut source = opener.open(0).expect("open webcam");
        let frame = source
            .read_frame()
            .expect("read frame")
            .expect("frame available");
        assert!(frame.width() > 0 && frame.height() > 0);
        source.release().expect("release");
    }
}
