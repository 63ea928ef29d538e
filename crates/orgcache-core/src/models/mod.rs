//! Data models for organization entities.
//!
//! This module contains the data structures exchanged with the remote API
//! and held by the section caches:
//!
//! - `Organization`, `Member`, `MemberRole`: the organization and its people
//! - `Asset`, `AssetType`, `NewAsset`: inventory items and the create input
//! - `Attribute`, `AttributeValue`: per-asset attribute data (RFID tags live here)
//! - `RfidRecord`: derived RFID tag → asset entry
//! - `Report`: uploaded CSV report metadata

pub mod asset;
pub mod organization;
pub mod report;
pub mod rfid;

pub use asset::{Asset, AssetType, Attribute, AttributeValue, NewAsset, RFID_ATTRIBUTE_TYPE};
pub use organization::{Member, MemberRole, Organization};
pub use report::{sort_newest_first, Report};
pub use rfid::RfidRecord;
