#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditPhase {
    Idle,
    Editing,
    Committed,
    Cancelled,
}

impl EditPhase {
    pub fn is_editing(self) -> bool {
        matches!(self, Self::Editing)
    }

    /// Committed and cancelled edits settle straight back to idle.
    pub fn settled(self) -> Self {
        match self {
            Self::Committed | Self::Cancelled => Self::Idle,
            other => other,
        }
    }
}

pub fn can_transition(from: EditPhase, to: EditPhase) -> bool {
    matches!(
        (from, to),
        (EditPhase::Idle, EditPhase::Editing)
            | (EditPhase::Editing, EditPhase::Committed)
            | (EditPhase::Editing, EditPhase::Cancelled)
            | (EditPhase::Committed, EditPhase::Idle)
            | (EditPhase::Cancelled, EditPhase::Idle)
    ) || from == to
}
