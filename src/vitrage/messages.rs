use crate::vitrage::editor::DimensionRejection;
use crate::vitrage::merge::{MergeRejection, SplitRejection};
use crate::vitrage::model::{Axis, SegmentId};

/// User-facing result of an editing command.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionMessage {
    Merged { anchor: SegmentId },
    Split { anchor: SegmentId },
    DimensionApplied { axis: Axis, value: f64, updated: usize },
    MergeRejected(MergeRejection),
    SplitRejected(SplitRejection),
    DimensionRejected(DimensionRejection),
    UnknownSegment(SegmentId),
}

impl SessionMessage {
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            SessionMessage::MergeRejected(_)
                | SessionMessage::SplitRejected(_)
                | SessionMessage::DimensionRejected(_)
                | SessionMessage::UnknownSegment(_)
        )
    }
}

impl std::fmt::Display for SessionMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionMessage::Merged { anchor } => write!(f, "segments merged into {anchor}"),
            SessionMessage::Split { anchor } => write!(f, "segment {anchor} split"),
            SessionMessage::DimensionApplied {
                axis,
                value,
                updated,
            } => {
                let name = match axis {
                    Axis::Width => "width",
                    Axis::Height => "height",
                };
                write!(f, "{name} set to {value} mm on {updated} segment(s)")
            }
            SessionMessage::MergeRejected(err) => write!(f, "{err}"),
            SessionMessage::SplitRejected(err) => write!(f, "{err}"),
            SessionMessage::DimensionRejected(err) => write!(f, "{err}"),
            SessionMessage::UnknownSegment(id) => write!(f, "segment {id} cannot be edited"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOutcome {
    EditorOpened { segment: SegmentId, axis: Axis },
    Selected(SegmentId),
    SelectionToggled(SegmentId),
    Missed,
}
