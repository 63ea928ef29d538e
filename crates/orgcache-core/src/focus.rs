//! What to mark stale when the organization view regains focus.

use tracing::debug;

use crate::cache::Section;

/// Invalidates only the tab the user is looking at when the view is
/// (re-)entered. Other tabs keep their cache and refetch on their own
/// schedule when selected.
#[derive(Debug, Clone, Copy, Default)]
pub struct FocusInvalidationPolicy;

impl FocusInvalidationPolicy {
    /// Sections to mark stale on focus while `active` is selected
    pub fn sections_to_invalidate(&self, active: Section) -> Vec<Section> {
        debug!(section = %active, "View focused");
        vec![active]
    }
}
