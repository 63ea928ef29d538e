use async_trait::async_trait;

use crate::error::SyncError;
use crate::models::{Asset, Attribute, AttributeValue, Member, NewAsset, Organization, Report};

/// Typed read boundary to the remote organization service.
///
/// Implementations do no caching and no retrying. Every failure comes back
/// as a `SyncError`, and the caller decides what to do with it.
#[async_trait]
pub trait RemoteDataSource: Send + Sync {
    /// Fetch organization metadata. Fails with `NotFound` when the id does not resolve.
    async fn fetch_organization(&self, organization_id: &str) -> Result<Organization, SyncError>;

    /// Fetch the members of an organization.
    async fn fetch_members(&self, organization_id: &str) -> Result<Vec<Member>, SyncError>;

    /// Fetch the assets of an organization, trashed assets excluded.
    async fn fetch_active_assets(&self, organization_id: &str) -> Result<Vec<Asset>, SyncError>;

    /// Fetch the report metadata of an organization.
    async fn fetch_reports(&self, organization_id: &str) -> Result<Vec<Report>, SyncError>;

    /// Fetch the attributes attached to one asset.
    async fn fetch_asset_attributes(&self, asset_id: &str) -> Result<Vec<Attribute>, SyncError>;

    /// Fetch the value set of one attribute.
    async fn fetch_attribute_values(
        &self,
        attribute_id: &str,
    ) -> Result<Vec<AttributeValue>, SyncError>;

    /// Create an asset. Rejects non-positive quantities without a request.
    async fn create_asset(&self, input: &NewAsset) -> Result<Asset, SyncError>;
}
