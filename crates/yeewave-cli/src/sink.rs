//! PNG frame sink.

use std::fs;
use std::path::{Path, PathBuf};

use image::{GrayImage, ImageError, ImageFormat};
use yeewave_core::frame::{Frame, FrameSink, SinkError};

const FORMAT: ImageFormat = ImageFormat::Png;

/// Writes each frame to `<directory>/<name>.png` as 8-bit grayscale.
pub struct PngSink {
    directory: PathBuf,
}

impl PngSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        let extension = FORMAT.extensions_str().first().copied().unwrap_or("png");
        self.directory.join(name).with_extension(extension)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

/// Convert `frame` into a grayscale image, `x` across and `y` down.
pub fn to_image(frame: &Frame<'_>) -> Result<GrayImage, SinkError> {
    let (width, height) = (frame.width(), frame.height());
    if width == 0 || height == 0 {
        return Err(SinkError::Rejected(format!("{} has no pixels", frame.name)));
    }
    let too_large = || SinkError::Rejected(format!("{} is {}x{} pixels, too large", frame.name, width, height));
    let w = u32::try_from(width).map_err(|_| too_large())?;
    let h = u32::try_from(height).map_err(|_| too_large())?;
    GrayImage::from_raw(w, h, frame.to_grayscale()).ok_or_else(too_large)
}

impl FrameSink for PngSink {
    fn write_frame(&mut self, frame: &Frame<'_>) -> Result<(), SinkError> {
        let img = to_image(frame)?;
        fs::create_dir_all(&self.directory)?;
        img.save_with_format(self.path_for(&frame.name), FORMAT)
            .map_err(|e| match e {
                ImageError::IoError(io) => SinkError::Io(io),
                other => SinkError::Rejected(other.to_string()),
            })
    }
}
