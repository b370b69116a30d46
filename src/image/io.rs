//! Owned pixel buffers plus decode and JSON helpers used at the crate boundary.
//!
//! - `ImageBufU8`: validated owned 8-bit buffer, borrowed as an `ImageU8`.
//! - `decode_image` / `load_image`: PNG/JPEG bytes or files into an `ImageBufU8`.
//! - `write_json_file`: pretty-print a serializable value to disk.
//!
//! The compression core itself never decodes; callers hand it a view.
use super::ImageU8;
use crate::error::{CompressError, ImageIoError};
use image::{ColorType, DynamicImage};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Owned 8-bit interleaved buffer with borrowed view conversion.
#[derive(Clone, Debug)]
pub struct ImageBufU8 {
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<u8>,
}

impl ImageBufU8 {
    /// Wrap raw interleaved bytes, checking geometry against the buffer length.
    pub fn new(
        width: usize,
        height: usize,
        channels: usize,
        data: Vec<u8>,
    ) -> Result<Self, CompressError> {
        let invalid = |reason| CompressError::InvalidImage {
            width,
            height,
            channels,
            reason,
        };
        if width == 0 || height == 0 {
            return Err(invalid("image must not be empty"));
        }
        if !(1..=4).contains(&channels) {
            return Err(invalid("channel count must be between 1 and 4"));
        }
        if data.len() != width * height * channels {
            return Err(invalid("buffer length does not match geometry"));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Image width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Interleaved channels per pixel
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Borrow as a read-only `ImageU8` view
    pub fn as_view(&self) -> ImageU8<'_> {
        ImageU8 {
            w: self.width,
            h: self.height,
            channels: self.channels,
            stride: self.width * self.channels,
            data: &self.data,
        }
    }

    /// Convert a decoded image, keeping gray inputs single-channel and
    /// widening everything else to 8-bit RGB(A).
    pub fn from_dynamic(img: DynamicImage) -> Result<Self, CompressError> {
        let (width, height) = (img.width() as usize, img.height() as usize);
        let color = img.color();
        let (channels, data) = match color {
            ColorType::L8 | ColorType::L16 => (1, img.into_luma8().into_raw()),
            ColorType::La8 | ColorType::La16 => (2, img.into_luma_alpha8().into_raw()),
            c if c.has_alpha() => (4, img.into_rgba8().into_raw()),
            _ => (3, img.into_rgb8().into_raw()),
        };
        Self::new(width, height, channels, data)
    }
}

/// Decode encoded image bytes (any format enabled on the `image` crate).
pub fn decode_image(bytes: &[u8]) -> Result<ImageBufU8, ImageIoError> {
    let img = image::load_from_memory(bytes)?;
    Ok(ImageBufU8::from_dynamic(img)?)
}

/// Load and decode an image file from disk.
pub fn load_image(path: &Path) -> Result<ImageBufU8, ImageIoError> {
    let bytes = fs::read(path).map_err(|source| ImageIoError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_image(&bytes)
}

/// Write raw bytes to `path`, creating parent directories.
pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), ImageIoError> {
    ensure_parent_dir(path)?;
    fs::write(path, bytes).map_err(|source| ImageIoError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), ImageIoError> {
    let json = serde_json::to_string_pretty(value)?;
    write_bytes(path, json.as_bytes())
}

fn ensure_parent_dir(path: &Path) -> Result<(), ImageIoError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| ImageIoError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}
