use crate::vitrage::editor::{set_real_dimension, DimensionEditor, EditKey, EditOutcome};
use crate::vitrage::hit_test::{find_dimension_hotspot_at, find_segment_at};
use crate::vitrage::layout::{compute_layout, LayoutMetrics, Viewport};
use crate::vitrage::merge::{merge, split, MergeSnapshots};
use crate::vitrage::messages::{PointerOutcome, SessionMessage};
use crate::vitrage::model::{Axis, FillType, Grid, Segment, SegmentId};
use crate::vitrage::settings::LayoutSettings;

#[derive(Debug, Clone, PartialEq)]
pub enum GridCommand {
    SetFillType { segment: SegmentId, fill_type: FillType },
    SetLabel { segment: SegmentId, label: String },
    SetFormula { segment: SegmentId, formula: Option<String> },
    SetRealDimension { segment: SegmentId, axis: Axis, value: f64 },
    Merge,
    Split,
    ToggleSelection(SegmentId),
    ClearSelection,
    SetMergeMode(bool),
    Resize(Viewport),
}

/// One vitrage being configured: the grid, its merge history and the
/// interaction state around it. Every structural or dimensional change is
/// followed by a fresh layout pass.
#[derive(Debug, Clone)]
pub struct EditorSession {
    grid: Grid,
    snapshots: MergeSnapshots,
    selection: Vec<SegmentId>,
    merge_mode: bool,
    viewport: Viewport,
    settings: LayoutSettings,
    editor: DimensionEditor,
    metrics: LayoutMetrics,
    last_message: Option<SessionMessage>,
}

impl EditorSession {
    pub fn new(rows: usize, cols: usize, mut settings: LayoutSettings) -> Self {
        settings.sanitize();
        let viewport = settings.viewport();
        let mut grid = Grid::new(rows, cols, settings.profile_width);
        let metrics = compute_layout(&mut grid, viewport, &settings.layout_params());
        tracing::debug!(rows = grid.rows(), cols = grid.cols(), "vitrage session created");
        Self {
            grid,
            snapshots: MergeSnapshots::default(),
            selection: Vec::new(),
            merge_mode: false,
            viewport,
            settings,
            editor: DimensionEditor::default(),
            metrics,
            last_message: None,
        }
    }

    /// Abandon the current configuration and start over with a fresh grid.
    pub fn reset(&mut self, rows: usize, cols: usize) {
        self.editor.reset();
        self.grid = Grid::new(rows, cols, self.settings.profile_width);
        self.snapshots.clear();
        self.selection.clear();
        self.merge_mode = false;
        self.last_message = None;
        self.relayout();
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn snapshots(&self) -> &MergeSnapshots {
        &self.snapshots
    }

    pub fn selection(&self) -> &[SegmentId] {
        &self.selection
    }

    pub fn merge_mode(&self) -> bool {
        self.merge_mode
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    pub fn editor(&self) -> &DimensionEditor {
        &self.editor
    }

    pub fn metrics(&self) -> &LayoutMetrics {
        &self.metrics
    }

    pub fn last_message(&self) -> Option<&SessionMessage> {
        self.last_message.as_ref()
    }

    pub fn apply(&mut self, command: GridCommand) -> Option<SessionMessage> {
        let message = match command {
            GridCommand::SetFillType { segment, fill_type } => {
                self.edit_segment(segment, |seg| seg.fill_type = fill_type)
            }
            GridCommand::SetLabel { segment, label } => {
                self.edit_segment(segment, |seg| seg.label = label)
            }
            GridCommand::SetFormula { segment, formula } => {
                self.edit_segment(segment, |seg| seg.formula = formula)
            }
            GridCommand::SetRealDimension {
                segment,
                axis,
                value,
            } => self.set_dimension(segment, axis, value),
            GridCommand::Merge => self.merge_selection(),
            GridCommand::Split => self.split_selection(),
            GridCommand::ToggleSelection(id) => {
                self.toggle_selection(id);
                None
            }
            GridCommand::ClearSelection => {
                self.selection.clear();
                None
            }
            GridCommand::SetMergeMode(enabled) => {
                self.merge_mode = enabled;
                self.selection.clear();
                None
            }
            GridCommand::Resize(viewport) => {
                self.viewport = viewport;
                self.relayout();
                None
            }
        };
        self.record(message)
    }

    /// Resolve a pointer press: a dimension label opens the inline editor,
    /// otherwise the segment under the pointer is selected (or toggled while
    /// merge selection is active). An open edit loses focus first.
    pub fn pointer_down(&mut self, point: (f64, f64)) -> PointerOutcome {
        if self.editor.phase().is_editing() {
            let outcome = self.editor.focus_lost();
            self.apply_edit_outcome(outcome);
        }

        if let Some(hit) = find_dimension_hotspot_at(&self.grid, point, self.settings.hotspot) {
            let segment = hit.segment.id;
            let axis = hit.axis;
            self.editor.begin(hit.segment, axis);
            return PointerOutcome::EditorOpened { segment, axis };
        }

        let Some(id) = find_segment_at(&self.grid, point).map(|seg| seg.id) else {
            if !self.merge_mode {
                self.selection.clear();
            }
            return PointerOutcome::Missed;
        };
        if self.merge_mode {
            self.toggle_selection(id);
            PointerOutcome::SelectionToggled(id)
        } else {
            self.selection = vec![id];
            PointerOutcome::Selected(id)
        }
    }

    pub fn key(&mut self, key: EditKey) -> Option<SessionMessage> {
        let outcome = self.editor.handle_key(key);
        self.apply_edit_outcome(outcome)
    }

    pub fn focus_lost(&mut self) -> Option<SessionMessage> {
        let outcome = self.editor.focus_lost();
        self.apply_edit_outcome(outcome)
    }

    fn apply_edit_outcome(&mut self, outcome: EditOutcome) -> Option<SessionMessage> {
        let message = match outcome {
            EditOutcome::Pending | EditOutcome::Cancelled => None,
            EditOutcome::Committed(edit) => self.set_dimension(edit.segment, edit.axis, edit.value),
            EditOutcome::Rejected(err) => Some(SessionMessage::DimensionRejected(err)),
        };
        self.record(message)
    }

    fn edit_segment(
        &mut self,
        id: SegmentId,
        edit: impl FnOnce(&mut Segment),
    ) -> Option<SessionMessage> {
        match self.grid.segment_mut(id).filter(|seg| seg.is_visible()) {
            Some(seg) => {
                edit(seg);
                None
            }
            None => Some(SessionMessage::UnknownSegment(id)),
        }
    }

    fn set_dimension(&mut self, id: SegmentId, axis: Axis, value: f64) -> Option<SessionMessage> {
        match set_real_dimension(
            &mut self.grid,
            id,
            axis,
            value,
            self.settings.default_cell_size,
        ) {
            Ok(updated) => {
                self.relayout();
                Some(SessionMessage::DimensionApplied {
                    axis,
                    value,
                    updated,
                })
            }
            Err(err) => Some(SessionMessage::DimensionRejected(err)),
        }
    }

    fn merge_selection(&mut self) -> Option<SessionMessage> {
        match merge(
            &mut self.grid,
            &mut self.snapshots,
            &self.selection,
            self.settings.default_cell_size,
        ) {
            Ok(anchor) => {
                self.selection.clear();
                self.merge_mode = false;
                self.relayout();
                Some(SessionMessage::Merged { anchor })
            }
            Err(err) => Some(SessionMessage::MergeRejected(err)),
        }
    }

    fn split_selection(&mut self) -> Option<SessionMessage> {
        match split(&mut self.grid, &mut self.snapshots, &self.selection) {
            Ok(anchor) => {
                self.selection.clear();
                self.relayout();
                Some(SessionMessage::Split { anchor })
            }
            Err(err) => Some(SessionMessage::SplitRejected(err)),
        }
    }

    fn toggle_selection(&mut self, id: SegmentId) {
        if let Some(pos) = self.selection.iter().position(|&selected| selected == id) {
            self.selection.remove(pos);
            return;
        }
        if self.grid.segment(id).is_some_and(|seg| seg.is_visible()) {
            self.selection.push(id);
        }
    }

    fn relayout(&mut self) {
        self.metrics = compute_layout(&mut self.grid, self.viewport, &self.settings.layout_params());
    }

    fn record(&mut self, message: Option<SessionMessage>) -> Option<SessionMessage> {
        if let Some(message) = &message {
            if message.is_rejection() {
                tracing::debug!(%message, "grid edit rejected");
            }
            self.last_message = Some(message.clone());
        }
        message
    }
}
