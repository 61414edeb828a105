//! Configuration authoring: reordering field components within and across
//! step buckets.

pub mod editor;
pub mod reorder;

pub use editor::{LayoutEditor, ReorderOutcome};
pub use reorder::{DropTarget, ReorderGesture, ReorderOperation, plan};
