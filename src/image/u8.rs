use crate::error::{CompressError, CompressResult};

/// Borrowed 8-bit interleaved image (1 to 4 channels, row-major).
///
/// Channel order for 3/4-channel buffers is RGB(A).
#[derive(Clone, Copy, Debug)]
pub struct ImageU8<'a> {
    pub w: usize,
    pub h: usize,
    pub channels: usize,
    pub stride: usize, // bytes between rows
    pub data: &'a [u8],
}

impl<'a> ImageU8<'a> {
    /// Check that the geometry is non-empty and fits inside `data`.
    ///
    /// The fields are public, so a hand-built view can claim more rows than
    /// its buffer holds; row access on such a view would panic.
    pub fn validate(&self) -> CompressResult<()> {
        let invalid = |reason| CompressError::InvalidImage {
            width: self.w,
            height: self.h,
            channels: self.channels,
            reason,
        };
        if self.w == 0 || self.h == 0 {
            return Err(invalid("image must not be empty"));
        }
        if !(1..=4).contains(&self.channels) {
            return Err(invalid("channel count must be between 1 and 4"));
        }
        let row_len = self
            .w
            .checked_mul(self.channels)
            .ok_or_else(|| invalid("row length overflows"))?;
        if self.stride < row_len {
            return Err(invalid("stride is shorter than a row"));
        }
        let needed = self
            .stride
            .checked_mul(self.h - 1)
            .and_then(|n| n.checked_add(row_len))
            .ok_or_else(|| invalid("buffer length overflows"))?;
        if self.data.len() < needed {
            return Err(invalid("buffer is shorter than the declared geometry"));
        }
        Ok(())
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, c: usize) -> u8 {
        self.data[y * self.stride + x * self.channels + c]
    }

    /// ITU-R BT.601 luma of pixel (x, y), rounded to the nearest integer.
    ///
    /// Alpha is ignored; two-channel buffers are treated as gray + alpha.
    #[inline]
    pub fn luma(&self, x: usize, y: usize) -> u8 {
        let base = y * self.stride + x * self.channels;
        match self.channels {
            1 | 2 => self.data[base],
            _ => {
                let r = self.data[base] as u32;
                let g = self.data[base + 1] as u32;
                let b = self.data[base + 2] as u32;
                ((r * 299 + g * 587 + b * 114 + 500) / 1000) as u8
            }
        }
    }
}

impl<'a> crate::image::traits::ImageView for ImageU8<'a> {
    type Pixel = u8;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn channels(&self) -> usize {
        self.channels
    }
    #[inline]
    fn stride(&self) -> usize {
        self.stride
    }
    #[inline]
    fn row(&self, y: usize) -> &[u8] {
        let start = y * self.stride;
        &self.data[start..start + self.w * self.channels]
    }
}
