use std::collections::VecDeque;

use ndarray::Array2;

use crate::cancel::CancelToken;
use crate::error::Result;

/// The largest bright connected region of a binary mask.
#[derive(Clone, Debug)]
pub struct BrightRegion {
    /// Number of pixels in the region.
    pub area: usize,
    /// Geometric centre (column).
    pub center_x: f64,
    /// Geometric centre (row).
    pub center_y: f64,
}

impl BrightRegion {
    /// Radius of a disc with the same area.
    pub fn equivalent_radius(&self) -> f64 {
        (self.area as f64 / std::f64::consts::PI).sqrt()
    }
}

/// Morphological opening with a 3x3 square: drops isolated hot pixels and
/// thin noise while keeping the outline of large regions.
pub fn open_3x3(mask: &Array2<bool>, cancel: &CancelToken) -> Result<Array2<bool>> {
    let eroded = neighbourhood_filter(mask, true, cancel)?;
    neighbourhood_filter(&eroded, false, cancel)
}

/// 3x3 erosion (`all == true`) or dilation (`all == false`).
/// Out-of-bounds neighbours count as background.
fn neighbourhood_filter(mask: &Array2<bool>, all: bool, cancel: &CancelToken) -> Result<Array2<bool>> {
    let (h, w) = mask.dim();
    let lit = |row: usize, col: usize, (dr, dc): (isize, isize)| {
        let r = row as isize + dr;
        let c = col as isize + dc;
        r >= 0 && c >= 0 && (r as usize) < h && (c as usize) < w && mask[[r as usize, c as usize]]
    };

    let mut result = Array2::from_elem((h, w), false);
    for row in 0..h {
        cancel.checkpoint_row(row)?;
        for col in 0..w {
            let mut neighbours =
                (-1..=1_isize).flat_map(|dr| (-1..=1_isize).map(move |dc| (dr, dc)));
            result[[row, col]] = if all {
                neighbours.all(|d| lit(row, col, d))
            } else {
                neighbours.any(|d| lit(row, col, d))
            };
        }
    }
    Ok(result)
}

/// Find the largest 4-connected foreground region using breadth-first fill.
pub fn largest_region(mask: &Array2<bool>, cancel: &CancelToken) -> Result<Option<BrightRegion>> {
    let (h, w) = mask.dim();
    let mut visited = Array2::from_elem((h, w), false);
    let mut queue = VecDeque::new();
    let mut best: Option<BrightRegion> = None;

    for ((start_row, start_col), &lit) in mask.indexed_iter() {
        if start_col == 0 {
            cancel.checkpoint_row(start_row)?;
        }
        if !lit || visited[[start_row, start_col]] {
            continue;
        }

        visited[[start_row, start_col]] = true;
        queue.push_back((start_row, start_col));

        let mut area = 0usize;
        let (mut sum_row, mut sum_col) = (0.0f64, 0.0f64);

        while let Some((row, col)) = queue.pop_front() {
            area += 1;
            sum_row += row as f64;
            sum_col += col as f64;

            let neighbours = [
                (row.wrapping_sub(1), col),
                (row + 1, col),
                (row, col.wrapping_sub(1)),
                (row, col + 1),
            ];
            for (r, c) in neighbours {
                if r < h && c < w && mask[[r, c]] && !visited[[r, c]] {
                    visited[[r, c]] = true;
                    queue.push_back((r, c));
                }
            }
        }

        if best.as_ref().map_or(true, |b| area > b.area) {
            best = Some(BrightRegion {
                area,
                center_x: sum_col / area as f64,
                center_y: sum_row / area as f64,
            });
        }
    }

    Ok(best)
}
