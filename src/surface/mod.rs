pub mod snapshot;

use crate::domain::{Annotation, Record};

pub type RowId = usize;

/// The host inbox as the engine sees it.
///
/// Rows come and go between passes; a `RowId` is only meaningful within the
/// pass that obtained it.
pub trait InboxSurface {
    fn row_ids(&self) -> Vec<RowId>;

    /// Extracts the row's text fields. `None` if the row vanished.
    fn record(&self, row: RowId) -> Option<Record>;

    /// Annotations inside the row's label cell when it has one, else on the row itself.
    fn annotations(&self, row: RowId) -> Vec<Annotation>;

    /// Attaches into the same scope `annotations` reads from.
    fn attach(&mut self, row: RowId, annotation: Annotation);

    /// Removes every engine-managed annotation on every row; returns how many went.
    fn clear_managed(&mut self) -> usize;
}
