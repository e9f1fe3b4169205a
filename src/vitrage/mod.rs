pub mod editor;
pub mod layout;
pub mod merge;
pub mod messages;
pub mod model;
pub mod session;
pub mod settings;
pub mod settings_store;
pub mod state;

pub use layout::{compute_layout, LayoutMetrics, LayoutParams, Viewport};
pub use merge::{can_merge, merge, split, MergeSnapshots};
pub use model::{Axis, FillType, Grid, PixelRect, Segment, SegmentId};
pub use session::{EditorSession, GridCommand};
