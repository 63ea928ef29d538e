use serde::{Deserialize, Serialize};

/// Derived index entry mapping an RFID tag to the asset carrying it.
/// Never persisted; rebuilt whenever the asset list is refetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct RfidRecord {
    #[serde(rename = "assetId")]
    pub asset_id: String,
    #[serde(rename = "assetName")]
    pub asset_name: String,
    #[serde(rename = "rfidTag")]
    pub rfid_tag: String,
}
