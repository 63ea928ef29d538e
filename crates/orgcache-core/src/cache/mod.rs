//! In-memory section caches for the organization view.
//!
//! Each tab (members, assets, reports) owns one `SectionCache`, a small
//! state machine that decides when the remote source must be hit. Nothing
//! here survives a process restart.

pub mod section;
pub mod state;

pub use section::Section;
pub use state::{SectionCache, SectionPhase, SectionSnapshot};
