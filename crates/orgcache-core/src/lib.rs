//! orgcache-core - lazy, tab-scoped synchronization for one organization view.
//!
//! An `OrganizationSession` holds the organization snapshot and one cache per
//! tab (members, assets, reports). Tabs load on first view, are refetched only
//! after invalidation, and share in-flight requests. Loading the assets tab also
//! builds an RFID tag index by fanning out over asset attributes.
//!
//! Remote access goes through the `RemoteDataSource` trait; `ApiClient` is the
//! HTTP implementation.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod focus;
pub mod models;
pub mod rfid;
pub mod session;
pub mod utils;

#[cfg(test)]
mod testing;

pub use api::{ApiClient, ApiError, RemoteDataSource, ReportUpload};
pub use cache::{Section, SectionPhase, SectionSnapshot};
pub use config::Config;
pub use error::SyncError;
pub use focus::FocusInvalidationPolicy;
pub use rfid::{RfidIndex, RfidIndexBuilder};
pub use session::{AssetsSection, OrganizationSession, SectionData, SessionOptions};
