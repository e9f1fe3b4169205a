use serde::{Deserialize, Serialize};

/// Identifier of a segment, derived from the top-left cell it occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId {
    pub row: usize,
    pub col: usize,
}

impl SegmentId {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl std::fmt::Display for SegmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.row, self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillType {
    Glass,
    VentGrille,
    SandwichPanel,
    Casement,
    Door,
    Empty,
}

impl Default for FillType {
    fn default() -> Self {
        FillType::Glass
    }
}

impl FillType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FillType::Glass => "glass",
            FillType::VentGrille => "vent_grille",
            FillType::SandwichPanel => "sandwich_panel",
            FillType::Casement => "casement",
            FillType::Door => "door",
            FillType::Empty => "empty",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Width,
    Height,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Inclusive on all four edges.
    pub fn contains(&self, point: (f64, f64)) -> bool {
        point.0 >= self.x && point.0 <= self.right() && point.1 >= self.y && point.1 <= self.bottom()
    }

    /// True when the interiors intersect. Shared edges do not count.
    pub fn overlaps(&self, other: &PixelRect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    pub row: usize,
    pub col: usize,
    pub row_span: usize,
    pub col_span: usize,
    /// Absorbed into a compound segment; not rendered or hit-tested.
    #[serde(default)]
    pub merged: bool,
    #[serde(default)]
    pub merged_with: Vec<SegmentId>,
    #[serde(default)]
    pub real_width: Option<f64>,
    #[serde(default)]
    pub real_height: Option<f64>,
    #[serde(default)]
    pub fill_type: FillType,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub formula: Option<String>,
    /// Derived by the layout pass, never authoritative.
    #[serde(default)]
    pub rect: PixelRect,
}

impl Segment {
    pub fn new(row: usize, col: usize) -> Self {
        Self {
            id: SegmentId::new(row, col),
            row,
            col,
            row_span: 1,
            col_span: 1,
            merged: false,
            merged_with: Vec::new(),
            real_width: None,
            real_height: None,
            fill_type: FillType::default(),
            label: String::new(),
            formula: None,
            rect: PixelRect::default(),
        }
    }

    pub fn is_compound(&self) -> bool {
        self.row_span > 1 || self.col_span > 1
    }

    pub fn is_visible(&self) -> bool {
        !self.merged
    }

    pub fn has_real_dimensions(&self) -> bool {
        self.real_width.is_some() && self.real_height.is_some()
    }

    pub fn real(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::Width => self.real_width,
            Axis::Height => self.real_height,
        }
    }

    pub fn span(&self, axis: Axis) -> usize {
        match axis {
            Axis::Width => self.col_span,
            Axis::Height => self.row_span,
        }
    }

    /// Every cell covered by this segment's span, anchor first.
    pub fn covered_cells(&self) -> impl Iterator<Item = SegmentId> + '_ {
        (self.row..self.row + self.row_span).flat_map(move |row| {
            (self.col..self.col + self.col_span).map(move |col| SegmentId::new(row, col))
        })
    }
}

/// Grids read from outside are only accepted when [`Grid::check_invariants`]
/// finds nothing wrong.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GridRecord")]
pub struct Grid {
    rows: usize,
    cols: usize,
    segments: Vec<Segment>,
    pub profile_width: f64,
    pub origin: (f64, f64),
    pub total_width: f64,
    pub total_height: f64,
    pub scale: f64,
}

#[derive(Deserialize)]
struct GridRecord {
    rows: usize,
    cols: usize,
    segments: Vec<Segment>,
    profile_width: f64,
    origin: (f64, f64),
    total_width: f64,
    total_height: f64,
    scale: f64,
}

impl TryFrom<GridRecord> for Grid {
    type Error = String;

    fn try_from(record: GridRecord) -> Result<Self, Self::Error> {
        let grid = Grid {
            rows: record.rows,
            cols: record.cols,
            segments: record.segments,
            profile_width: record.profile_width,
            origin: record.origin,
            total_width: record.total_width,
            total_height: record.total_height,
            scale: record.scale,
        };
        let problems = grid.check_invariants();
        if problems.is_empty() {
            Ok(grid)
        } else {
            Err(format!("malformed grid: {}", problems.join("; ")))
        }
    }
}

impl Grid {
    /// Create a `rows × cols` grid of independent segments. Zero dimensions are
    /// bumped to one.
    pub fn new(rows: usize, cols: usize, profile_width: f64) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        let segments = (0..rows)
            .flat_map(|row| (0..cols).map(move |col| Segment::new(row, col)))
            .collect();
        Self {
            rows,
            cols,
            segments,
            profile_width: profile_width.max(0.0),
            origin: (0.0, 0.0),
            total_width: 0.0,
            total_height: 0.0,
            scale: 1.0,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub(crate) fn segments_mut(&mut self) -> &mut [Segment] {
        &mut self.segments
    }

    /// Segments that are rendered and hit-tested: independent cells and
    /// compound anchors.
    pub fn visible_segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(|s| s.is_visible())
    }

    pub fn contains_cell(&self, id: SegmentId) -> bool {
        id.row < self.rows && id.col < self.cols
    }

    fn index_of(&self, id: SegmentId) -> Option<usize> {
        self.contains_cell(id).then(|| id.row * self.cols + id.col)
    }

    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.index_of(id).and_then(|idx| self.segments.get(idx))
    }

    pub fn segment_mut(&mut self, id: SegmentId) -> Option<&mut Segment> {
        let idx = self.index_of(id)?;
        self.segments.get_mut(idx)
    }

    /// List every violation of the structural invariants. An empty list means
    /// the grid is well formed.
    pub fn check_invariants(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.segments.len() != self.rows * self.cols {
            problems.push(format!(
                "expected {} segments, found {}",
                self.rows * self.cols,
                self.segments.len()
            ));
            return problems;
        }

        let mut owner: Vec<Option<SegmentId>> = vec![None; self.segments.len()];
        for (idx, seg) in self.segments.iter().enumerate() {
            let expected = SegmentId::new(idx / self.cols, idx % self.cols);
            if seg.id != expected || seg.row != expected.row || seg.col != expected.col {
                problems.push(format!("segment at slot {expected} carries id {}", seg.id));
            }
            if seg.row_span == 0 || seg.col_span == 0 {
                problems.push(format!("segment {} has a zero span", seg.id));
                continue;
            }
            if seg.merged {
                continue;
            }
            if seg.row + seg.row_span > self.rows || seg.col + seg.col_span > self.cols {
                problems.push(format!("segment {} spans outside the grid", seg.id));
                continue;
            }
            for cell in seg.covered_cells() {
                let slot = cell.row * self.cols + cell.col;
                if let Some(prev) = owner[slot] {
                    problems.push(format!("cell {cell} covered by both {prev} and {}", seg.id));
                }
                owner[slot] = Some(seg.id);
                if cell != seg.id {
                    if !self.segments[slot].merged {
                        problems.push(format!("cell {cell} inside {} is not absorbed", seg.id));
                    }
                    if !seg.merged_with.contains(&cell) {
                        problems.push(format!("cell {cell} missing from {} members", seg.id));
                    }
                }
            }
            let members = seg.row_span * seg.col_span - 1;
            if seg.merged_with.len() != members {
                problems.push(format!(
                    "segment {} lists {} members for a {}x{} span",
                    seg.id,
                    seg.merged_with.len(),
                    seg.row_span,
                    seg.col_span
                ));
            }
        }

        for (slot, covered) in owner.iter().enumerate() {
            if covered.is_none() {
                problems.push(format!(
                    "cell {} is not covered by any segment",
                    SegmentId::new(slot / self.cols, slot % self.cols)
                ));
            }
        }
        problems
    }
}
