//! Grid partitioning of an image into non-overlapping rectangular regions.
//!
//! Each axis is cut into `divisions` bands of `floor(len / divisions)`
//! pixels; the last band absorbs the remainder so the grid always covers the
//! full image. An axis shorter than `divisions` collapses to a single band.
use serde::Serialize;

/// Default number of bands per axis (a 4×4 grid).
pub const DEFAULT_DIVISIONS: usize = 4;

/// Half-open pixel bounds `[row_start, row_end) × [col_start, col_end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
}

impl Region {
    #[inline]
    pub const fn new(row_start: usize, row_end: usize, col_start: usize, col_end: usize) -> Self {
        Self {
            row_start,
            row_end,
            col_start,
            col_end,
        }
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.row_end.saturating_sub(self.row_start)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.col_end.saturating_sub(self.col_start)
    }

    /// True when the two rectangles share at least one pixel.
    pub fn overlaps(&self, other: &Region) -> bool {
        self.row_start < other.row_end
            && other.row_start < self.row_end
            && self.col_start < other.col_end
            && other.col_start < self.col_end
    }
}

/// Split a `height × width` image into a row-major grid of regions.
pub fn partition(height: usize, width: usize, divisions: usize) -> Vec<Region> {
    let rows = axis_bands(height, divisions);
    let cols = axis_bands(width, divisions);
    let mut regions = Vec::with_capacity(rows.len() * cols.len());
    for &(r0, r1) in &rows {
        for &(c0, c1) in &cols {
            regions.push(Region::new(r0, r1, c0, c1));
        }
    }
    regions
}

fn axis_bands(len: usize, divisions: usize) -> Vec<(usize, usize)> {
    if len == 0 {
        return Vec::new();
    }
    let divisions = divisions.max(1);
    let step = len / divisions;
    if step == 0 {
        return vec![(0, len)];
    }
    let mut bands = Vec::with_capacity(divisions);
    let mut start = 0;
    while start + step <= len && bands.len() < divisions {
        let mut end = start + step;
        // last band takes whatever the integer step left over
        if bands.len() + 1 == divisions {
            end = len;
        }
        bands.push((start, end));
        start = end;
    }
    bands
}
