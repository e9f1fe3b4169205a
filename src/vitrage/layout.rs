use crate::vitrage::model::{Grid, PixelRect};
use serde::{Deserialize, Serialize};

/// Bounding box the grid is fitted and centered into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn sized(width: f64, height: f64) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    /// Real-world size of a column or row no segment gives a dimension for.
    pub default_cell_size: f64,
    /// Lower bound on any scaled column width or row height.
    pub min_cell_pixels: f64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            default_cell_size: 100.0,
            min_cell_pixels: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutMetrics {
    pub scale: f64,
    pub total_real_width: f64,
    pub total_real_height: f64,
    pub col_widths: Vec<f64>,
    pub row_heights: Vec<f64>,
}

/// Recompute every visible segment's pixel geometry from the real-world
/// dimensions in `grid`, shrinking to fit `viewport` and centering.
///
/// Pure with respect to the segment structure: running it twice on an
/// unchanged grid yields identical geometry.
pub fn compute_layout(grid: &mut Grid, viewport: Viewport, params: &LayoutParams) -> LayoutMetrics {
    let rows = grid.rows();
    let cols = grid.cols();
    let profile = grid.profile_width;
    let default_size = sanitize_size(params.default_cell_size).unwrap_or(100.0);

    let mut real_cols = vec![default_size; cols];
    let mut real_rows = vec![default_size; rows];
    // Later segments overwrite the slots of earlier ones.
    for seg in grid.visible_segments() {
        let (Some(w), Some(h)) = (
            seg.real_width.and_then(sanitize_size),
            seg.real_height.and_then(sanitize_size),
        ) else {
            continue;
        };
        let per_col = w / seg.col_span as f64;
        let per_row = h / seg.row_span as f64;
        for slot in real_cols.iter_mut().skip(seg.col).take(seg.col_span) {
            *slot = per_col;
        }
        for slot in real_rows.iter_mut().skip(seg.row).take(seg.row_span) {
            *slot = per_row;
        }
    }

    let total_real_width: f64 = real_cols.iter().sum();
    let total_real_height: f64 = real_rows.iter().sum();

    let available_width = viewport.width - (cols as f64 + 1.0) * profile;
    let available_height = viewport.height - (rows as f64 + 1.0) * profile;
    let scale = fit_ratio(available_width, total_real_width)
        .min(fit_ratio(available_height, total_real_height))
        .min(1.0)
        .max(0.0);

    let min_px = params.min_cell_pixels.max(0.0);
    let col_widths: Vec<f64> = real_cols.iter().map(|w| (w * scale).max(min_px)).collect();
    let row_heights: Vec<f64> = real_rows.iter().map(|h| (h * scale).max(min_px)).collect();

    let grid_width = col_widths.iter().sum::<f64>() + (cols as f64 + 1.0) * profile;
    let grid_height = row_heights.iter().sum::<f64>() + (rows as f64 + 1.0) * profile;
    let origin_x = viewport.x + (viewport.width - grid_width) / 2.0;
    let origin_y = viewport.y + (viewport.height - grid_height) / 2.0;

    let col_starts = cumulative_starts(origin_x, &col_widths, profile);
    let row_starts = cumulative_starts(origin_y, &row_heights, profile);

    for seg in grid.segments_mut() {
        if seg.merged {
            seg.rect = PixelRect::default();
            continue;
        }
        let (Some(&x), Some(&y)) = (col_starts.get(seg.col), row_starts.get(seg.row)) else {
            seg.rect = PixelRect::default();
            continue;
        };
        let width = spanned_extent(&col_widths, seg.col, seg.col_span, profile);
        let height = spanned_extent(&row_heights, seg.row, seg.row_span, profile);
        seg.rect = PixelRect::new(x, y, width, height);
    }

    grid.origin = (origin_x, origin_y);
    grid.total_width = grid_width;
    grid.total_height = grid_height;
    grid.scale = scale;

    tracing::debug!(
        rows,
        cols,
        scale,
        total_real_width,
        total_real_height,
        grid_width,
        grid_height,
        "computed vitrage layout"
    );

    LayoutMetrics {
        scale,
        total_real_width,
        total_real_height,
        col_widths,
        row_heights,
    }
}

fn sanitize_size(value: f64) -> Option<f64> {
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Ratio that fits `total` into `available`. A degenerate total leaves the
/// axis unscaled.
fn fit_ratio(available: f64, total: f64) -> f64 {
    if total > 0.0 {
        available / total
    } else {
        1.0
    }
}

/// Start coordinate of each track, with one profile before the first track
/// and one between neighbours.
fn cumulative_starts(origin: f64, sizes: &[f64], profile: f64) -> Vec<f64> {
    let mut starts = Vec::with_capacity(sizes.len());
    let mut cursor = origin + profile;
    for size in sizes {
        starts.push(cursor);
        cursor += size + profile;
    }
    starts
}

fn spanned_extent(sizes: &[f64], start: usize, span: usize, profile: f64) -> f64 {
    let tracks: f64 = sizes.iter().skip(start).take(span).sum();
    tracks + span.saturating_sub(1) as f64 * profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vitrage::merge::{merge, MergeSnapshots};
    use crate::vitrage::model::SegmentId;

    fn params() -> LayoutParams {
        LayoutParams::default()
    }

    #[test]
    fn default_grid_fits_without_magnification() {
        let mut grid = Grid::new(2, 3, 10.0);
        let metrics = compute_layout(&mut grid, Viewport::sized(800.0, 600.0), &params());

        assert_eq!(metrics.scale, 1.0);
        assert_eq!(grid.visible_segments().count(), 6);
        for seg in grid.visible_segments() {
            assert_eq!(seg.rect.width, 100.0);
            assert_eq!(seg.rect.height, 100.0);
        }
        assert_eq!(grid.total_width, 340.0);
        assert_eq!(grid.total_height, 230.0);
        assert_eq!(grid.origin, (230.0, 185.0));
    }

    #[test]
    fn large_real_sizes_shrink_to_the_tighter_axis() {
        let mut grid = Grid::new(1, 2, 10.0);
        for col in 0..2 {
            let seg = grid.segment_mut(SegmentId::new(0, col)).expect("segment");
            seg.real_width = Some(1000.0);
            seg.real_height = Some(1000.0);
        }
        let metrics = compute_layout(&mut grid, Viewport::sized(830.0, 600.0), &params());

        // width: (830 - 30) / 2000 = 0.4, height: (600 - 20) / 1000 = 0.58
        assert!((metrics.scale - 0.4).abs() < 1e-12);
        let left = grid.segment(SegmentId::new(0, 0)).expect("left").rect;
        let right = grid.segment(SegmentId::new(0, 1)).expect("right").rect;
        assert!((left.width - 400.0).abs() < 1e-9);
        assert!((right.x - (left.right() + 10.0)).abs() < 1e-9);
        assert!(grid.total_width <= 830.0 + 1e-9);
    }

    #[test]
    fn compound_segment_absorbs_internal_profiles() {
        let mut grid = Grid::new(2, 2, 10.0);
        let mut snaps = MergeSnapshots::default();
        let selection = [SegmentId::new(0, 0), SegmentId::new(0, 1)];
        merge(&mut grid, &mut snaps, &selection, 100.0).expect("merge");

        compute_layout(&mut grid, Viewport::sized(800.0, 600.0), &params());

        let anchor = grid.segment(SegmentId::new(0, 0)).expect("anchor");
        assert_eq!(anchor.rect.width, 210.0);
        let absorbed = grid.segment(SegmentId::new(0, 1)).expect("absorbed");
        assert_eq!(absorbed.rect, PixelRect::default());
    }

    #[test]
    fn segments_without_both_dimensions_keep_default_tracks() {
        let mut grid = Grid::new(1, 2, 10.0);
        grid.segment_mut(SegmentId::new(0, 0))
            .expect("segment")
            .real_width = Some(400.0);
        let metrics = compute_layout(&mut grid, Viewport::sized(800.0, 600.0), &params());
        assert_eq!(metrics.col_widths, vec![100.0, 100.0]);
    }

    #[test]
    fn later_segments_overwrite_shared_tracks() {
        let mut grid = Grid::new(2, 1, 10.0);
        for (row, width) in [(0, 300.0), (1, 500.0)] {
            let seg = grid.segment_mut(SegmentId::new(row, 0)).expect("segment");
            seg.real_width = Some(width);
            seg.real_height = Some(100.0);
        }
        let metrics = compute_layout(&mut grid, Viewport::sized(2000.0, 2000.0), &params());
        assert_eq!(metrics.total_real_width, 500.0);
    }

    #[test]
    fn cramped_viewport_clamps_to_minimum_cell_size() {
        let mut grid = Grid::new(2, 2, 10.0);
        let metrics = compute_layout(&mut grid, Viewport::sized(20.0, 20.0), &params());
        assert_eq!(metrics.scale, 0.0);
        for seg in grid.visible_segments() {
            assert!(seg.rect.width >= 4.0 && seg.rect.height >= 4.0);
            assert!(seg.rect.x.is_finite() && seg.rect.y.is_finite());
        }
    }

    #[test]
    fn degenerate_default_size_still_lays_out() {
        let mut grid = Grid::new(1, 1, 0.0);
        let metrics = compute_layout(
            &mut grid,
            Viewport::sized(100.0, 100.0),
            &LayoutParams {
                default_cell_size: 0.0,
                min_cell_pixels: 0.0,
            },
        );
        assert!(metrics.scale.is_finite());
        assert!(grid.segments()[0].rect.width.is_finite());
    }

    #[test]
    fn viewport_offset_moves_the_centered_grid() {
        let mut grid = Grid::new(1, 1, 10.0);
        let viewport = Viewport {
            x: 50.0,
            y: 20.0,
            width: 200.0,
            height: 200.0,
        };
        compute_layout(&mut grid, viewport, &params());
        // grid is 120 wide: (200 - 120) / 2 + 50 + profile
        assert_eq!(grid.segments()[0].rect.x, 100.0);
        assert_eq!(grid.segments()[0].rect.y, 70.0);
    }
}
