//! RFID tag index built by fanning out over asset attributes.
//!
//! The build is a three-stage pipeline run per active asset:
//!
//! 1. fetch the asset's attributes and keep the RFID ones owned by the organization
//! 2. fetch each attribute's value set
//! 3. pick the value bound to the asset's own instance id
//!
//! A failure in any stage is recorded against that asset (or attribute) and the
//! build carries on. The index is always rebuilt from scratch.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::api::RemoteDataSource;
use crate::error::SyncError;
use crate::models::{Asset, Attribute, AttributeValue, RfidRecord};

/// Default number of assets indexed concurrently.
/// Keeps the N×M request fan-out from flooding the API.
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 4;

/// Result of one index build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RfidIndex {
    pub records: Vec<RfidRecord>,
    /// Contained `SyncError::PartialIndex` failures, one per failed step
    pub failures: Vec<SyncError>,
}

impl RfidIndex {
    /// True when every asset and attribute was fetched successfully
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn tag_for(&self, asset_id: &str) -> Option<&str> {
        self.records
            .iter()
            .find(|r| r.asset_id == asset_id)
            .map(|r| r.rfid_tag.as_str())
    }
}

/// Everything learned about a single asset
#[derive(Default)]
struct AssetOutcome {
    records: Vec<RfidRecord>,
    failures: Vec<SyncError>,
}

#[derive(Clone)]
pub struct RfidIndexBuilder {
    source: Arc<dyn RemoteDataSource>,
    max_concurrent: usize,
}

impl RfidIndexBuilder {
    pub fn new(source: Arc<dyn RemoteDataSource>, max_concurrent: usize) -> Self {
        Self {
            source,
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Build the index for `assets` of `organization_id`. Never fails as a whole.
    pub async fn build(&self, organization_id: &str, assets: &[Asset]) -> RfidIndex {
        debug!(
            organization_id,
            assets = assets.len(),
            max_concurrent = self.max_concurrent,
            "Building RFID index"
        );

        let active: Vec<Asset> = assets
            .iter()
            .filter(|asset| {
                if asset.trash_bin {
                    debug!(asset_id = %asset.id, "Skipping trashed asset");
                }
                !asset.trash_bin
            })
            .cloned()
            .collect();

        let lookups = active.into_iter().map(|asset| {
            let builder = self.clone();
            let organization_id = organization_id.to_string();
            async move { builder.index_asset(&organization_id, &asset).await }
        });
        let outcomes: Vec<AssetOutcome> = stream::iter(lookups)
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        let mut index = RfidIndex::default();
        for outcome in outcomes {
            index.records.extend(outcome.records);
            index.failures.extend(outcome.failures);
        }

        info!(
            organization_id,
            records = index.records.len(),
            failures = index.failures.len(),
            "RFID index built"
        );
        index
    }

    async fn index_asset(&self, organization_id: &str, asset: &Asset) -> AssetOutcome {
        let mut outcome = AssetOutcome::default();

        let attributes = match self.source.fetch_asset_attributes(&asset.id).await {
            Ok(attributes) => attributes,
            Err(e) => {
                warn!(asset_id = %asset.id, error = %e, "Failed to fetch asset attributes");
                outcome.failures.push(SyncError::PartialIndex {
                    asset_id: asset.id.clone(),
                    attribute_id: None,
                    cause: e.to_string(),
                });
                return outcome;
            }
        };

        let rfid_attributes: Vec<Attribute> = attributes
            .into_iter()
            .filter(|attribute| attribute.is_rfid_for(organization_id))
            .collect();

        for attribute in rfid_attributes {
            match self.source.fetch_attribute_values(&attribute.id).await {
                Ok(values) => {
                    if let Some(found) = value_for_instance(&values, &asset.id) {
                        outcome.records.push(RfidRecord {
                            asset_id: asset.id.clone(),
                            asset_name: asset.name.clone(),
                            rfid_tag: found.value.clone(),
                        });
                    } else {
                        debug!(
                            asset_id = %asset.id,
                            attribute_id = %attribute.id,
                            "RFID attribute has no value for this asset"
                        );
                    }
                }
                Err(e) => {
                    warn!(
                        asset_id = %asset.id,
                        attribute_id = %attribute.id,
                        error = %e,
                        "Failed to fetch attribute values"
                    );
                    outcome.failures.push(SyncError::PartialIndex {
                        asset_id: asset.id.clone(),
                        attribute_id: Some(attribute.id.clone()),
                        cause: e.to_string(),
                    });
                }
            }
        }

        outcome
    }
}

/// First value bound to `asset_id`. Later duplicates are ignored.
fn value_for_instance<'a>(values: &'a [AttributeValue], asset_id: &str) -> Option<&'a AttributeValue> {
    values.iter().find(|v| v.asset_instance_id == asset_id)
}
