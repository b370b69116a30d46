//! Second-derivative (Laplacian) response and its variance as a blur measure.
//!
//! - Convolves the 4-neighbour kernel `[[0,1,0],[1,-4,1],[0,1,0]]`.
//! - Borders reflect without repeating the edge sample (`dcb|abcd|cba`).
//! - Flat content gives a zero response everywhere; fine texture gives large
//!   positive and negative responses and therefore a large variance.
//!
//! Complexity: O(W·H) per region; one float buffer.
use crate::image::{ImageF32, ImageView, ImageViewMut};

type Kernel3 = [[f32; 3]; 3];

const LAPLACIAN_KERNEL: Kernel3 = [[0.0, 1.0, 0.0], [1.0, -4.0, 1.0], [0.0, 1.0, 0.0]];

/// Reflect index `i` into `[0, n)` without duplicating the border sample.
#[inline]
fn reflect101(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let last = n as isize - 1;
    let mut i = i;
    if i < 0 {
        i = -i;
    }
    if i > last {
        i = 2 * last - i;
    }
    i.clamp(0, last) as usize
}

/// Per-pixel Laplacian of a single-channel image.
pub fn laplacian(l: &ImageF32) -> ImageF32 {
    let (w, h) = (l.w, l.h);
    let mut out = ImageF32::new(w, h);
    if w == 0 || h == 0 {
        return out;
    }
    for y in 0..h {
        let yi = y as isize;
        let rows = [
            l.row(reflect101(yi - 1, h)),
            l.row(y),
            l.row(reflect101(yi + 1, h)),
        ];
        let dst = out.row_mut(y);
        for (x, px) in dst.iter_mut().enumerate() {
            let xi = x as isize;
            let x_idx = [reflect101(xi - 1, w), x, reflect101(xi + 1, w)];
            let mut sum = 0.0;
            for (row, k_row) in rows.iter().zip(LAPLACIAN_KERNEL.iter()) {
                sum += row[x_idx[0]] * k_row[0] + row[x_idx[1]] * k_row[1] + row[x_idx[2]] * k_row[2];
            }
            *px = sum;
        }
    }
    out
}

/// Population variance of the Laplacian response; higher means sharper.
pub fn laplacian_variance(l: &ImageF32) -> f64 {
    laplacian(l).mean_variance().1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflect101_mirrors_without_edge_repeat() {
        assert_eq!(reflect101(-1, 5), 1);
        assert_eq!(reflect101(5, 5), 3);
        assert_eq!(reflect101(2, 5), 2);
        assert_eq!(reflect101(-1, 1), 0);
    }

    #[test]
    fn flat_image_has_zero_variance() {
        let mut img = ImageF32::new(16, 12);
        img.data.iter_mut().for_each(|v| *v = 128.0);
        assert_eq!(laplacian_variance(&img), 0.0);
    }

    #[test]
    fn single_spike_response() {
        let mut img = ImageF32::new(5, 5);
        img.set(2, 2, 1.0);
        let lap = laplacian(&img);
        assert_eq!(lap.get(2, 2), -4.0);
        assert_eq!(lap.get(1, 2), 1.0);
        assert_eq!(lap.get(2, 1), 1.0);
        assert_eq!(lap.get(0, 0), 0.0);
    }

    #[test]
    fn checkerboard_is_sharper_than_ramp() {
        let mut checker = ImageF32::new(16, 16);
        let mut ramp = ImageF32::new(16, 16);
        for y in 0..16 {
            for x in 0..16 {
                checker.set(x, y, if (x + y) % 2 == 0 { 0.0 } else { 255.0 });
                ramp.set(x, y, (x * 16) as f32);
            }
        }
        assert!(laplacian_variance(&checker) > laplacian_variance(&ramp));
    }
}
