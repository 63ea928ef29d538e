use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Attribute type that marks an RFID tag attribute
pub const RFID_ATTRIBUTE_TYPE: &str = "rfid";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Unique,
    Replicable,
}

impl AssetType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "unique" => Some(AssetType::Unique),
            "replicable" => Some(AssetType::Replicable),
            _ => None,
        }
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetType::Unique => write!(f, "unique"),
            AssetType::Replicable => write!(f, "replicable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Asset {
    pub id: String,
    #[serde(rename = "organizationId")]
    pub organization_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub quantity: u32,
    #[serde(rename = "trashBin", default)]
    pub trash_bin: bool,
}

impl Asset {
    pub fn is_active(&self) -> bool {
        !self.trash_bin
    }
}

/// Input for the asset creation flow (`POST /assets`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NewAsset {
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub description: String,
    pub quantity: i64,
    #[serde(rename = "organizationId")]
    pub organization_id: String,
}

impl NewAsset {
    /// Check the input before it is allowed anywhere near the network.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.name.trim().is_empty() {
            return Err(SyncError::Validation("name must not be empty".to_string()));
        }
        if self.description.trim().is_empty() {
            return Err(SyncError::Validation(
                "description must not be empty".to_string(),
            ));
        }
        if self.quantity <= 0 {
            return Err(SyncError::Validation(format!(
                "quantity must be positive, got {}",
                self.quantity
            )));
        }
        Ok(())
    }
}

/// One value of an attribute, bound to a single asset instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct AttributeValue {
    #[serde(rename = "assetInstanceId")]
    pub asset_instance_id: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Attribute {
    pub id: String,
    #[serde(rename = "organizationId")]
    pub organization_id: String,
    #[serde(rename = "assetId", default)]
    pub asset_id: Option<String>,
    #[serde(rename = "type")]
    pub attribute_type: String,
    #[serde(default)]
    pub values: Vec<AttributeValue>,
}

impl Attribute {
    pub fn is_rfid_for(&self, organization_id: &str) -> bool {
        self.attribute_type == RFID_ATTRIBUTE_TYPE && self.organization_id == organization_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_asset(name: &str, description: &str, quantity: i64) -> NewAsset {
        NewAsset {
            name: name.to_string(),
            asset_type: AssetType::Unique,
            description: description.to_string(),
            quantity,
            organization_id: "org1".to_string(),
        }
    }

    #[test]
    fn test_validate_accepts_complete_input() {
        assert!(new_asset("Box", "Cardboard box", 1).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        assert!(matches!(
            new_asset("", "desc", 1).validate(),
            Err(SyncError::Validation(_))
        ));
        assert!(matches!(
            new_asset("Box", "   ", 1).validate(),
            Err(SyncError::Validation(_))
        ));
        assert!(matches!(
            new_asset("Box", "desc", 0).validate(),
            Err(SyncError::Validation(_))
        ));
        assert!(matches!(
            new_asset("Box", "desc", -3).validate(),
            Err(SyncError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_asset() {
        let json = r#"{"id":"a1","organizationId":"org1","name":"Box","description":"","type":"replicable","quantity":3,"trashBin":true}"#;
        let asset: Asset = serde_json::from_str(json).expect("asset json");
        assert_eq!(asset.asset_type, AssetType::Replicable);
        assert!(!asset.is_active());
    }

    #[test]
    fn test_new_asset_wire_format() {
        let body = serde_json::to_value(new_asset("Box", "desc", 2)).expect("serialize");
        assert_eq!(body["type"], "unique");
        assert_eq!(body["organizationId"], "org1");
        assert_eq!(body["quantity"], 2);
    }

    #[test]
    fn test_attribute_is_rfid_for() {
        let attr = Attribute {
            id: "at1".to_string(),
            organization_id: "org1".to_string(),
            asset_id: Some("a1".to_string()),
            attribute_type: "rfid".to_string(),
            values: vec![],
        };
        assert!(attr.is_rfid_for("org1"));
        assert!(!attr.is_rfid_for("org2"));
    }

    #[test]
    fn test_asset_type_parse() {
        assert_eq!(AssetType::parse("Unique"), Some(AssetType::Unique));
        assert_eq!(AssetType::parse("replicable"), Some(AssetType::Replicable));
        assert_eq!(AssetType::parse("other"), None);
    }
}
