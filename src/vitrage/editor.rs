use crate::vitrage::model::{Axis, Grid, Segment, SegmentId};
use crate::vitrage::state::{can_transition, EditPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKey {
    Char(char),
    Backspace,
    Enter,
    Escape,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DimensionRejection {
    Empty,
    NotANumber(String),
    NotPositive,
    UnknownSegment(SegmentId),
}

impl std::fmt::Display for DimensionRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DimensionRejection::Empty => write!(f, "enter a size in millimetres"),
            DimensionRejection::NotANumber(text) => write!(f, "'{text}' is not a number"),
            DimensionRejection::NotPositive => write!(f, "size must be greater than zero"),
            DimensionRejection::UnknownSegment(id) => write!(f, "segment {id} cannot be resized"),
        }
    }
}

impl std::error::Error for DimensionRejection {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimensionEdit {
    pub segment: SegmentId,
    pub axis: Axis,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    /// Nothing to apply; the editor is idle or still collecting input.
    Pending,
    Committed(DimensionEdit),
    Cancelled,
    /// Enter was pressed on an unparseable value; the editor stays open.
    Rejected(DimensionRejection),
}

/// Inline numeric editor opened from a dimension label.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionEditor {
    phase: EditPhase,
    target: Option<(SegmentId, Axis)>,
    buffer: String,
}

impl Default for DimensionEditor {
    fn default() -> Self {
        Self {
            phase: EditPhase::Idle,
            target: None,
            buffer: String::new(),
        }
    }
}

impl DimensionEditor {
    pub fn phase(&self) -> EditPhase {
        self.phase
    }

    pub fn target(&self) -> Option<(SegmentId, Axis)> {
        self.target
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Open the editor on one axis of `segment`, seeded with its current value.
    /// Re-targets if an edit is already open; the previous text is dropped.
    pub fn begin(&mut self, segment: &Segment, axis: Axis) {
        self.transition(EditPhase::Editing);
        self.target = Some((segment.id, axis));
        self.buffer = segment.real(axis).map(format_dimension).unwrap_or_default();
    }

    pub fn handle_key(&mut self, key: EditKey) -> EditOutcome {
        if !self.phase.is_editing() {
            return EditOutcome::Pending;
        }
        match key {
            EditKey::Char(ch) => {
                if ch.is_ascii_digit() || matches!(ch, '.' | ',') {
                    self.buffer.push(ch);
                }
                EditOutcome::Pending
            }
            EditKey::Backspace => {
                self.buffer.pop();
                EditOutcome::Pending
            }
            EditKey::Enter => match parse_dimension(&self.buffer) {
                Ok(value) => self.commit(value),
                Err(err) => EditOutcome::Rejected(err),
            },
            EditKey::Escape => self.cancel(),
        }
    }

    /// Focus loss commits a valid value and silently cancels otherwise.
    pub fn focus_lost(&mut self) -> EditOutcome {
        if !self.phase.is_editing() {
            return EditOutcome::Pending;
        }
        match parse_dimension(&self.buffer) {
            Ok(value) => self.commit(value),
            Err(_) => self.cancel(),
        }
    }

    /// Drop any open edit without applying it.
    pub fn reset(&mut self) {
        if self.phase.is_editing() {
            let _ = self.cancel();
        }
    }

    fn commit(&mut self, value: f64) -> EditOutcome {
        let Some((segment, axis)) = self.target else {
            return self.cancel();
        };
        self.finish(EditPhase::Committed);
        EditOutcome::Committed(DimensionEdit {
            segment,
            axis,
            value,
        })
    }

    fn cancel(&mut self) -> EditOutcome {
        self.finish(EditPhase::Cancelled);
        EditOutcome::Cancelled
    }

    fn finish(&mut self, outcome: EditPhase) {
        self.transition(outcome);
        self.transition(outcome.settled());
        self.target = None;
        self.buffer.clear();
    }

    fn transition(&mut self, to: EditPhase) {
        debug_assert!(
            can_transition(self.phase, to),
            "invalid edit transition {:?} -> {:?}",
            self.phase,
            to
        );
        self.phase = to;
    }
}

/// Parse a millimetre value, accepting a comma as decimal separator.
pub fn parse_dimension(text: &str) -> Result<f64, DimensionRejection> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(DimensionRejection::Empty);
    }
    let value: f64 = trimmed
        .replace(',', ".")
        .parse()
        .map_err(|_| DimensionRejection::NotANumber(trimmed.to_string()))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(DimensionRejection::NotPositive);
    }
    Ok(value)
}

pub fn format_dimension(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// Write a real dimension to every visible segment crossing the grid line of
/// `id`: its column range for widths, its row range for heights.
///
/// `value` covers the edited segment's whole span. A segment crossing the same
/// line with a different span receives the same per-track share times its own
/// span, so every writer of the edited tracks agrees and the value survives
/// layout. Segments gaining one axis while lacking the other get the default
/// size on the missing axis so they take part in layout. Returns how many
/// segments were updated.
pub fn set_real_dimension(
    grid: &mut Grid,
    id: SegmentId,
    axis: Axis,
    value: f64,
    default_cell_size: f64,
) -> Result<usize, DimensionRejection> {
    if !value.is_finite() || value <= 0.0 {
        return Err(DimensionRejection::NotPositive);
    }
    let (start, span) = grid
        .segment(id)
        .filter(|seg| seg.is_visible())
        .map(|seg| match axis {
            Axis::Width => (seg.col, seg.col_span),
            Axis::Height => (seg.row, seg.row_span),
        })
        .ok_or(DimensionRejection::UnknownSegment(id))?;
    let per_track = value / span as f64;

    let mut updated = 0;
    for seg in grid.segments_mut() {
        if seg.merged {
            continue;
        }
        let (seg_start, seg_span) = match axis {
            Axis::Width => (seg.col, seg.col_span),
            Axis::Height => (seg.row, seg.row_span),
        };
        if seg_start >= start + span || start >= seg_start + seg_span {
            continue;
        }
        let share = if seg_span == span {
            value
        } else {
            per_track * seg_span as f64
        };
        match axis {
            Axis::Width => {
                seg.real_width = Some(share);
                if seg.real_height.is_none() {
                    seg.real_height = Some(default_cell_size * seg.row_span as f64);
                }
            }
            Axis::Height => {
                seg.real_height = Some(share);
                if seg.real_width.is_none() {
                    seg.real_width = Some(default_cell_size * seg.col_span as f64);
                }
            }
        }
        updated += 1;
    }
    tracing::debug!(segment = %id, ?axis, value, updated, "set real dimension");
    Ok(updated)
}
