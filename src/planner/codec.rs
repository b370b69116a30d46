//! Codec collaborator used to emit the final encoded buffer.
use crate::error::{CompressError, CompressResult};
use crate::image::{ImageU8, ImageView};
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

/// Lossy encoder driven by an integer quality in `[0, 100]`.
pub trait ImageEncoder: Send + Sync {
    /// Short format name used in logs and reports.
    fn format(&self) -> &'static str;

    /// Encode `image` at `quality`.
    fn encode(&self, image: &ImageU8<'_>, quality: u8) -> CompressResult<Vec<u8>>;
}

/// Baseline JPEG through `image::codecs::jpeg`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JpegEncoderBackend;

impl ImageEncoder for JpegEncoderBackend {
    fn format(&self) -> &'static str {
        "jpeg"
    }

    fn encode(&self, image: &ImageU8<'_>, quality: u8) -> CompressResult<Vec<u8>> {
        let (samples, color) = packed_color_samples(image);
        let mut out = Vec::new();
        // libjpeg treats quality 0 as 1
        JpegEncoder::new_with_quality(&mut out, quality.max(1))
            .encode(&samples, image.w as u32, image.h as u32, color)
            .map_err(|e| CompressError::EncodeFailure {
                quality,
                reason: e.to_string(),
            })?;
        Ok(out)
    }
}

/// Tightly packed color samples with any alpha channel dropped.
fn packed_color_samples(image: &ImageU8<'_>) -> (Vec<u8>, ExtendedColorType) {
    let (keep, color) = match image.channels {
        1 | 2 => (1, ExtendedColorType::L8),
        _ => (3, ExtendedColorType::Rgb8),
    };
    let mut samples = Vec::with_capacity(image.w * image.h * keep);
    for row in image.rows() {
        if keep == image.channels {
            samples.extend_from_slice(row);
        } else {
            for px in row.chunks_exact(image.channels) {
                samples.extend_from_slice(&px[..keep]);
            }
        }
    }
    (samples, color)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(w: usize, h: usize, channels: usize, data: &[u8]) -> ImageU8<'_> {
        ImageU8 {
            w,
            h,
            channels,
            stride: w * channels,
            data,
        }
    }

    #[test]
    fn alpha_is_dropped_before_encoding() {
        let data = [1u8, 2, 3, 255, 4, 5, 6, 0];
        let (samples, color) = packed_color_samples(&view(2, 1, 4, &data));
        assert_eq!(samples, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(color, ExtendedColorType::Rgb8);

        let data = [9u8, 255, 8, 0];
        let (samples, color) = packed_color_samples(&view(2, 1, 2, &data));
        assert_eq!(samples, vec![9, 8]);
        assert_eq!(color, ExtendedColorType::L8);
    }

    #[test]
    fn jpeg_output_has_markers() {
        let data = vec![128u8; 16 * 16 * 3];
        let bytes = JpegEncoderBackend.encode(&view(16, 16, 3, &data), 0).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(&bytes[bytes.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn higher_quality_is_not_smaller_on_texture() {
        let mut data = vec![0u8; 64 * 64];
        for (i, v) in data.iter_mut().enumerate() {
            *v = ((i * 37 + (i / 64) * 11) % 256) as u8;
        }
        let img = view(64, 64, 1, &data);
        let low = JpegEncoderBackend.encode(&img, 10).unwrap();
        let high = JpegEncoderBackend.encode(&img, 95).unwrap();
        assert!(high.len() > low.len());
    }
}
