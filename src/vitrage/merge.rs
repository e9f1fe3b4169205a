use crate::vitrage::model::{Grid, PixelRect, Segment, SegmentId};
use std::collections::{HashMap, HashSet};

/// Rectangle of cells a valid selection covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRegion {
    pub anchor: SegmentId,
    pub row_span: usize,
    pub col_span: usize,
}

impl MergeRegion {
    pub fn cells(&self) -> impl Iterator<Item = SegmentId> + '_ {
        let anchor = self.anchor;
        (anchor.row..anchor.row + self.row_span).flat_map(move |row| {
            (anchor.col..anchor.col + self.col_span).map(move |col| SegmentId::new(row, col))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeRejection {
    TooFewSegments,
    UnknownSegment(SegmentId),
    AlreadyAbsorbed(SegmentId),
    NotRectangular,
}

impl std::fmt::Display for MergeRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeRejection::TooFewSegments => write!(f, "select at least two segments to merge"),
            MergeRejection::UnknownSegment(id) => write!(f, "segment {id} does not exist"),
            MergeRejection::AlreadyAbsorbed(id) => {
                write!(f, "segment {id} is already part of a merged segment")
            }
            MergeRejection::NotRectangular => {
                write!(f, "segments must be contiguous and rectangular")
            }
        }
    }
}

impl std::error::Error for MergeRejection {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitRejection {
    NothingSelected,
    MultipleSelected,
    NotCompound(SegmentId),
    MissingSnapshot(SegmentId),
}

impl std::fmt::Display for SplitRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitRejection::NothingSelected => write!(f, "select a merged segment to split"),
            SplitRejection::MultipleSelected => write!(f, "select exactly one segment to split"),
            SplitRejection::NotCompound(id) => write!(f, "segment {id} is not a merged segment"),
            SplitRejection::MissingSnapshot(id) => {
                write!(f, "segment {id} has no recorded merge to undo")
            }
        }
    }
}

impl std::error::Error for SplitRejection {}

/// Pre-merge records of every cell in a merged rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeSnapshot {
    pub anchor: SegmentId,
    pub cells: Vec<Segment>,
}

/// Side table of merge snapshots keyed by anchor id. Each anchor keeps a
/// stack so nested merges sharing an anchor unwind in reverse order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergeSnapshots {
    by_anchor: HashMap<SegmentId, Vec<MergeSnapshot>>,
}

impl MergeSnapshots {
    pub fn push(&mut self, snapshot: MergeSnapshot) {
        self.by_anchor
            .entry(snapshot.anchor)
            .or_default()
            .push(snapshot);
    }

    pub fn latest(&self, anchor: SegmentId) -> Option<&MergeSnapshot> {
        self.by_anchor.get(&anchor).and_then(|stack| stack.last())
    }

    pub fn pop(&mut self, anchor: SegmentId) -> Option<MergeSnapshot> {
        let stack = self.by_anchor.get_mut(&anchor)?;
        let snapshot = stack.pop();
        if stack.is_empty() {
            self.by_anchor.remove(&anchor);
        }
        snapshot
    }

    pub fn contains(&self, anchor: SegmentId) -> bool {
        self.latest(anchor).is_some()
    }

    pub fn len(&self) -> usize {
        self.by_anchor.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_anchor.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_anchor.clear();
    }
}

/// Validate a merge selection and resolve the rectangle it covers.
///
/// Coverage is counted over every cell each selected segment spans, so an
/// existing compound anchor can be folded into a larger merge. The selection
/// is accepted only when the covered cell count equals the bounding
/// rectangle's area and every cell of that rectangle is covered exactly once.
pub fn check_merge(grid: &Grid, selection: &[SegmentId]) -> Result<MergeRegion, MergeRejection> {
    if selection.len() < 2 {
        return Err(MergeRejection::TooFewSegments);
    }

    let mut selected = Vec::with_capacity(selection.len());
    for &id in selection {
        let seg = grid
            .segment(id)
            .ok_or(MergeRejection::UnknownSegment(id))?;
        if seg.merged {
            return Err(MergeRejection::AlreadyAbsorbed(id));
        }
        if seg.row_span == 0 || seg.col_span == 0 {
            return Err(MergeRejection::NotRectangular);
        }
        selected.push(seg);
    }

    let min_row = selected.iter().map(|s| s.row).min().unwrap_or(0);
    let min_col = selected.iter().map(|s| s.col).min().unwrap_or(0);
    let max_row = selected
        .iter()
        .map(|s| s.row + s.row_span - 1)
        .max()
        .unwrap_or(0);
    let max_col = selected
        .iter()
        .map(|s| s.col + s.col_span - 1)
        .max()
        .unwrap_or(0);
    let row_span = max_row - min_row + 1;
    let col_span = max_col - min_col + 1;

    let covered_count: usize = selected.iter().map(|s| s.row_span * s.col_span).sum();
    if covered_count != row_span * col_span {
        return Err(MergeRejection::NotRectangular);
    }

    let mut covered = HashSet::with_capacity(covered_count);
    for seg in &selected {
        for cell in seg.covered_cells() {
            if !covered.insert(cell) {
                return Err(MergeRejection::NotRectangular);
            }
        }
    }

    let region = MergeRegion {
        anchor: SegmentId::new(min_row, min_col),
        row_span,
        col_span,
    };
    if region.cells().any(|cell| !covered.contains(&cell)) {
        return Err(MergeRejection::NotRectangular);
    }
    Ok(region)
}

/// Whether `selection` forms a contiguous rectangle that can be merged.
pub fn can_merge(grid: &Grid, selection: &[SegmentId]) -> bool {
    check_merge(grid, selection).is_ok()
}

/// Fuse the selected segments into one compound segment anchored at the
/// top-left cell and record a snapshot so [`split`] can undo it.
///
/// Pixel geometry is not touched; callers re-run the layout pass afterwards.
pub fn merge(
    grid: &mut Grid,
    snapshots: &mut MergeSnapshots,
    selection: &[SegmentId],
    default_cell_size: f64,
) -> Result<SegmentId, MergeRejection> {
    let region = check_merge(grid, selection)?;
    let anchor = region.anchor;

    let cells: Vec<Segment> = region
        .cells()
        .filter_map(|cell| grid.segment(cell).cloned())
        .collect();

    let selected: Vec<&Segment> = selection.iter().filter_map(|&id| grid.segment(id)).collect();
    let real_width = aggregate_real(
        &selected,
        |s| s.row == anchor.row,
        |s| (s.real_width, s.col_span),
        region.col_span,
        default_cell_size,
    );
    let real_height = aggregate_real(
        &selected,
        |s| s.col == anchor.col,
        |s| (s.real_height, s.row_span),
        region.row_span,
        default_cell_size,
    );

    let members: Vec<SegmentId> = region.cells().filter(|&cell| cell != anchor).collect();
    for &member in &members {
        if let Some(seg) = grid.segment_mut(member) {
            seg.merged = true;
            seg.row_span = 1;
            seg.col_span = 1;
            seg.merged_with.clear();
            seg.rect = PixelRect::default();
        }
    }
    if let Some(seg) = grid.segment_mut(anchor) {
        seg.row_span = region.row_span;
        seg.col_span = region.col_span;
        seg.merged = false;
        seg.merged_with = members;
        seg.real_width = Some(real_width);
        seg.real_height = Some(real_height);
    }

    snapshots.push(MergeSnapshot { anchor, cells });
    tracing::debug!(
        anchor = %anchor,
        row_span = region.row_span,
        col_span = region.col_span,
        real_width,
        real_height,
        "merged segments"
    );
    Ok(anchor)
}

/// Sum one axis along the selection's leading edge when any selected segment
/// carries that dimension, otherwise fall back to the default size per cell.
///
/// The gate looks at every selected segment but only edge members are summed,
/// so a value held solely by an interior or trailing member is dropped and
/// each edge cell contributes `default_cell_size × span`.
fn aggregate_real(
    selected: &[&Segment],
    on_edge: impl Fn(&Segment) -> bool,
    value: impl Fn(&Segment) -> (Option<f64>, usize),
    region_span: usize,
    default_cell_size: f64,
) -> f64 {
    let has_real = selected.iter().any(|s| value(*s).0.is_some());
    if !has_real {
        return default_cell_size * region_span as f64;
    }
    selected
        .iter()
        .filter(|s| on_edge(**s))
        .map(|s| {
            let (real, span) = value(*s);
            real.unwrap_or(default_cell_size * span as f64)
        })
        .sum()
}

/// Undo the most recent merge anchored at the single selected segment,
/// restoring every affected cell's pre-merge record verbatim.
pub fn split(
    grid: &mut Grid,
    snapshots: &mut MergeSnapshots,
    selection: &[SegmentId],
) -> Result<SegmentId, SplitRejection> {
    let anchor = match selection {
        [] => return Err(SplitRejection::NothingSelected),
        [id] => *id,
        _ => return Err(SplitRejection::MultipleSelected),
    };
    let is_compound = grid
        .segment(anchor)
        .map(|seg| !seg.merged && !seg.merged_with.is_empty())
        .unwrap_or(false);
    if !is_compound {
        return Err(SplitRejection::NotCompound(anchor));
    }
    let snapshot = snapshots
        .pop(anchor)
        .ok_or(SplitRejection::MissingSnapshot(anchor))?;

    for mut cell in snapshot.cells {
        cell.rect = PixelRect::default();
        if let Some(seg) = grid.segment_mut(cell.id) {
            *seg = cell;
        }
    }
    tracing::debug!(anchor = %anchor, "split merged segment");
    Ok(anchor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vitrage::model::FillType;

    fn ids(cells: &[(usize, usize)]) -> Vec<SegmentId> {
        cells.iter().map(|&(r, c)| SegmentId::new(r, c)).collect()
    }

    fn set_real(grid: &mut Grid, row: usize, col: usize, w: f64, h: f64) {
        let seg = grid.segment_mut(SegmentId::new(row, col)).expect("segment");
        seg.real_width = Some(w);
        seg.real_height = Some(h);
    }

    #[test]
    fn rejects_empty_and_singleton_selections() {
        let grid = Grid::new(2, 2, 10.0);
        assert!(!can_merge(&grid, &[]));
        assert!(!can_merge(&grid, &ids(&[(0, 0)])));
        assert_eq!(
            check_merge(&grid, &ids(&[(0, 0)])),
            Err(MergeRejection::TooFewSegments)
        );
    }

    #[test]
    fn rejects_l_shaped_selection() {
        let grid = Grid::new(2, 2, 10.0);
        assert!(!can_merge(&grid, &ids(&[(0, 0), (0, 1), (1, 0)])));
    }

    #[test]
    fn rejects_gapped_row() {
        let grid = Grid::new(1, 3, 10.0);
        assert_eq!(
            check_merge(&grid, &ids(&[(0, 0), (0, 2)])),
            Err(MergeRejection::NotRectangular)
        );
    }

    #[test]
    fn rejects_duplicate_ids_even_when_count_matches() {
        let grid = Grid::new(1, 2, 10.0);
        assert!(!can_merge(&grid, &ids(&[(0, 0), (0, 0)])));
    }

    #[test]
    fn rejects_unknown_and_absorbed_segments() {
        let mut grid = Grid::new(2, 2, 10.0);
        assert_eq!(
            check_merge(&grid, &ids(&[(0, 0), (5, 5)])),
            Err(MergeRejection::UnknownSegment(SegmentId::new(5, 5)))
        );

        let mut snaps = MergeSnapshots::default();
        merge(&mut grid, &mut snaps, &ids(&[(0, 0), (0, 1)]), 100.0).expect("merge");
        assert_eq!(
            check_merge(&grid, &ids(&[(0, 1), (1, 1)])),
            Err(MergeRejection::AlreadyAbsorbed(SegmentId::new(0, 1)))
        );
    }

    #[test]
    fn column_merge_sums_heights_and_keeps_top_width() {
        let mut grid = Grid::new(2, 2, 10.0);
        set_real(&mut grid, 0, 0, 1200.0, 1500.0);
        set_real(&mut grid, 1, 0, 1200.0, 800.0);
        let mut snaps = MergeSnapshots::default();

        let anchor = merge(&mut grid, &mut snaps, &ids(&[(1, 0), (0, 0)]), 100.0).expect("merge");

        assert_eq!(anchor, SegmentId::new(0, 0));
        let seg = grid.segment(anchor).expect("anchor");
        assert_eq!((seg.row_span, seg.col_span), (2, 1));
        assert_eq!(seg.real_width, Some(1200.0));
        assert_eq!(seg.real_height, Some(2300.0));
        assert_eq!(seg.merged_with, ids(&[(1, 0)]));
        assert!(grid.segment(SegmentId::new(1, 0)).expect("member").merged);
        assert!(grid.check_invariants().is_empty());
    }

    #[test]
    fn merge_without_real_dimensions_falls_back_to_default_per_cell() {
        let mut grid = Grid::new(2, 3, 10.0);
        let mut snaps = MergeSnapshots::default();
        let selection = ids(&[(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]);

        merge(&mut grid, &mut snaps, &selection, 100.0).expect("merge");

        let seg = grid.segment(SegmentId::new(0, 0)).expect("anchor");
        assert_eq!(seg.real_width, Some(300.0));
        assert_eq!(seg.real_height, Some(200.0));
    }

    #[test]
    fn split_restores_pre_merge_records() {
        let mut grid = Grid::new(2, 2, 10.0);
        set_real(&mut grid, 0, 0, 700.0, 900.0);
        if let Some(seg) = grid.segment_mut(SegmentId::new(0, 1)) {
            seg.fill_type = FillType::Door;
            seg.label = "D1".into();
            seg.formula = Some("w*h".into());
        }
        let before = grid.clone();
        let mut snaps = MergeSnapshots::default();

        let anchor = merge(&mut grid, &mut snaps, &ids(&[(0, 0), (0, 1)]), 100.0).expect("merge");
        assert_eq!(split(&mut grid, &mut snaps, &[anchor]), Ok(anchor));

        assert_eq!(grid.segments(), before.segments());
        assert!(snaps.is_empty());
    }

    #[test]
    fn nested_merges_unwind_in_reverse_order() {
        let mut grid = Grid::new(2, 2, 10.0);
        let pristine = grid.clone();
        let mut snaps = MergeSnapshots::default();

        merge(&mut grid, &mut snaps, &ids(&[(0, 0), (1, 0)]), 100.0).expect("inner");
        let after_inner = grid.clone();
        merge(&mut grid, &mut snaps, &ids(&[(0, 0), (0, 1), (1, 1)]), 100.0).expect("outer");

        let anchor = grid.segment(SegmentId::new(0, 0)).expect("anchor");
        assert_eq!((anchor.row_span, anchor.col_span), (2, 2));
        assert_eq!(snaps.len(), 2);
        assert!(grid.check_invariants().is_empty());

        split(&mut grid, &mut snaps, &ids(&[(0, 0)])).expect("outer split");
        assert_eq!(grid.segments(), after_inner.segments());
        split(&mut grid, &mut snaps, &ids(&[(0, 0)])).expect("inner split");
        assert_eq!(grid.segments(), pristine.segments());
    }

    #[test]
    fn split_rejects_bad_targets_without_mutation() {
        let mut grid = Grid::new(2, 2, 10.0);
        let mut snaps = MergeSnapshots::default();
        let before = grid.clone();

        assert_eq!(
            split(&mut grid, &mut snaps, &[]),
            Err(SplitRejection::NothingSelected)
        );
        assert_eq!(
            split(&mut grid, &mut snaps, &ids(&[(0, 0), (0, 1)])),
            Err(SplitRejection::MultipleSelected)
        );
        assert_eq!(
            split(&mut grid, &mut snaps, &ids(&[(0, 0)])),
            Err(SplitRejection::NotCompound(SegmentId::new(0, 0)))
        );
        assert_eq!(grid, before);
    }

    #[test]
    fn zero_span_segments_are_rejected() {
        let mut grid = Grid::new(2, 2, 10.0);
        if let Some(seg) = grid.segment_mut(SegmentId::new(1, 0)) {
            seg.row_span = 0;
        }
        assert_eq!(
            check_merge(&grid, &ids(&[(0, 0), (1, 0)])),
            Err(MergeRejection::NotRectangular)
        );
    }

    #[test]
    fn rejection_messages_are_user_facing() {
        assert_eq!(
            MergeRejection::NotRectangular.to_string(),
            "segments must be contiguous and rectangular"
        );
        assert_eq!(
            SplitRejection::MultipleSelected.to_string(),
            "select exactly one segment to split"
        );
    }
}
