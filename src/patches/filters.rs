//! Separable smoothing filters with symmetric border extension.
use crate::image::{ImageF32, ImageView, ImageViewMut};

/// Trait implemented by separable 1D filters used for local statistics.
pub trait SeparableFilter {
    /// Return the 1D taps (in left-to-right order), centred on the middle tap.
    fn taps(&self) -> &[f32];
}

/// Simple wrapper around a static filter kernel.
#[derive(Clone, Copy, Debug)]
pub struct StaticSeparableFilter {
    taps: &'static [f32],
}

impl Default for StaticSeparableFilter {
    fn default() -> Self {
        BOX_3TAP
    }
}

impl StaticSeparableFilter {
    pub const fn new(taps: &'static [f32]) -> Self {
        Self { taps }
    }
}

impl SeparableFilter for StaticSeparableFilter {
    #[inline]
    fn taps(&self) -> &[f32] {
        self.taps
    }
}

/// Normalised 3-tap box filter; applied on both axes it is the 3×3 mean.
pub const BOX_3TAP: StaticSeparableFilter =
    StaticSeparableFilter::new(&[1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0]);

/// Mirror index `i` into `[0, n)`, repeating the edge sample (`ba|abcd|dc`).
#[inline]
pub(crate) fn symmetric(i: isize, n: usize) -> usize {
    let n = n as isize;
    let mut i = i;
    // a single reflection suffices while the radius is below the length;
    // looping keeps tiny inputs in range as well
    while i < 0 || i >= n {
        if i < 0 {
            i = -i - 1;
        }
        if i >= n {
            i = 2 * n - i - 1;
        }
    }
    i as usize
}

/// Apply `filter` horizontally then vertically.
pub fn apply(filter: &dyn SeparableFilter, src: &ImageF32) -> ImageF32 {
    let taps = filter.taps();
    let radius = (taps.len() / 2) as isize;
    let (w, h) = (src.w, src.h);

    let mut horiz = ImageF32::new(w, h);
    for y in 0..h {
        let src_row = src.row(y);
        let dst_row = horiz.row_mut(y);
        for (x, dst) in dst_row.iter_mut().enumerate() {
            let mut acc = 0.0;
            for (k, &t) in taps.iter().enumerate() {
                let sx = symmetric(x as isize + k as isize - radius, w);
                acc += src_row[sx] * t;
            }
            *dst = acc;
        }
    }

    let mut out = ImageF32::new(w, h);
    for y in 0..h {
        let dst_row = out.row_mut(y);
        for (k, &t) in taps.iter().enumerate() {
            let sy = symmetric(y as isize + k as isize - radius, h);
            let src_row = horiz.row(sy);
            for (dst, &v) in dst_row.iter_mut().zip(src_row) {
                *dst += v * t;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_repeats_edge() {
        assert_eq!(symmetric(-1, 4), 0);
        assert_eq!(symmetric(-2, 4), 1);
        assert_eq!(symmetric(4, 4), 3);
        assert_eq!(symmetric(5, 4), 2);
        assert_eq!(symmetric(-1, 1), 0);
        assert_eq!(symmetric(1, 1), 0);
    }

    #[test]
    fn box_filter_matches_direct_3x3_mean() {
        let mut img = ImageF32::new(5, 4);
        for (i, v) in img.data.iter_mut().enumerate() {
            *v = (i * 7 % 11) as f32;
        }
        let out = apply(&BOX_3TAP, &img);
        for y in 0..4isize {
            for x in 0..5isize {
                let mut sum = 0.0;
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        sum += img.get(symmetric(x + dx, 5), symmetric(y + dy, 4));
                    }
                }
                let got = out.get(x as usize, y as usize);
                assert!((got - sum / 9.0).abs() < 1e-4, "({x},{y}) {got} vs {}", sum / 9.0);
            }
        }
    }
}
