//! In-memory `RemoteDataSource` used by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::Notify;

use crate::api::RemoteDataSource;
use crate::error::SyncError;
use crate::models::{
    Asset, AssetType, Attribute, AttributeValue, Member, MemberRole, NewAsset, Organization,
    Report,
};

#[derive(Default)]
pub struct FakeSource {
    organizations: Mutex<HashMap<String, Organization>>,
    members: Mutex<HashMap<String, Vec<Member>>>,
    assets: Mutex<HashMap<String, Vec<Asset>>>,
    reports: Mutex<HashMap<String, Vec<Report>>>,
    attributes: Mutex<HashMap<String, Vec<Attribute>>>,
    values: Mutex<HashMap<String, Vec<AttributeValue>>>,
    failing: Mutex<HashSet<String>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    calls: Mutex<Vec<String>>,
    attribute_fetches_running: AtomicUsize,
    max_attribute_fetches_running: AtomicUsize,
}

pub fn organization(id: &str) -> Organization {
    Organization {
        id: id.to_string(),
        name: format!("Organization {}", id),
        description: None,
        slug: Some(id.to_string()),
    }
}

pub fn member(id: &str, role: MemberRole) -> Member {
    Member {
        id: id.to_string(),
        first_name: "First".to_string(),
        last_name: id.to_string(),
        email: format!("{}@example.com", id),
        role,
    }
}

pub fn asset(id: &str, organization_id: &str, name: &str, trash_bin: bool) -> Asset {
    Asset {
        id: id.to_string(),
        organization_id: organization_id.to_string(),
        name: name.to_string(),
        description: String::new(),
        asset_type: AssetType::Unique,
        quantity: 1,
        trash_bin,
    }
}

pub fn rfid_attribute(id: &str, organization_id: &str, asset_id: &str) -> Attribute {
    Attribute {
        id: id.to_string(),
        organization_id: organization_id.to_string(),
        asset_id: Some(asset_id.to_string()),
        attribute_type: "rfid".to_string(),
        values: vec![],
    }
}

pub fn value(asset_instance_id: &str, value: &str) -> AttributeValue {
    AttributeValue {
        asset_instance_id: asset_instance_id.to_string(),
        value: value.to_string(),
    }
}

pub fn report(id: &str, organization_id: &str, day: u32) -> Report {
    let at = Utc
        .with_ymd_and_hms(2024, 5, day, 9, 30, 0)
        .single()
        .expect("valid date");
    Report {
        id: id.to_string(),
        author_id: "u1".to_string(),
        organization_id: organization_id.to_string(),
        title: format!("Report {}", id),
        file_url: format!("reports/{}.csv", id),
        created_at: at,
        updated_at: at,
    }
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_organization(self, org: Organization) -> Self {
        self.organizations.lock().expect("lock").insert(org.id.clone(), org);
        self
    }

    pub fn with_members(self, organization_id: &str, members: Vec<Member>) -> Self {
        self.members
            .lock()
            .expect("lock")
            .insert(organization_id.to_string(), members);
        self
    }

    pub fn with_assets(self, organization_id: &str, assets: Vec<Asset>) -> Self {
        self.set_assets(organization_id, assets);
        self
    }

    pub fn set_assets(&self, organization_id: &str, assets: Vec<Asset>) {
        self.assets
            .lock()
            .expect("lock")
            .insert(organization_id.to_string(), assets);
    }

    pub fn with_reports(self, organization_id: &str, reports: Vec<Report>) -> Self {
        self.reports
            .lock()
            .expect("lock")
            .insert(organization_id.to_string(), reports);
        self
    }

    pub fn with_attributes(self, asset_id: &str, attributes: Vec<Attribute>) -> Self {
        self.attributes
            .lock()
            .expect("lock")
            .insert(asset_id.to_string(), attributes);
        self
    }

    pub fn with_values(self, attribute_id: &str, values: Vec<AttributeValue>) -> Self {
        self.values
            .lock()
            .expect("lock")
            .insert(attribute_id.to_string(), values);
        self
    }

    /// Make the call identified by `key` (e.g. `"attributes:a1"`) fail.
    pub fn failing(self, key: &str) -> Self {
        self.fail(key);
        self
    }

    pub fn fail(&self, key: &str) {
        self.failing.lock().expect("lock").insert(key.to_string());
    }

    pub fn heal(&self, key: &str) {
        self.failing.lock().expect("lock").remove(key);
    }

    /// Hold the call identified by `key` until the returned `Notify` fires.
    pub fn gate(&self, key: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .expect("lock")
            .insert(key.to_string(), Arc::clone(&notify));
        notify
    }

    pub fn calls(&self, key: &str) -> usize {
        self.calls
            .lock()
            .expect("lock")
            .iter()
            .filter(|c| c.as_str() == key)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().expect("lock").len()
    }

    pub fn max_attribute_fetches_running(&self) -> usize {
        self.max_attribute_fetches_running.load(Ordering::SeqCst)
    }

    async fn enter(&self, key: String) -> Result<(), SyncError> {
        self.calls.lock().expect("lock").push(key.clone());
        let gate = self.gates.lock().expect("lock").remove(&key);
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.failing.lock().expect("lock").contains(&key) {
            return Err(SyncError::remote(format!("{} unavailable", key)));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteDataSource for FakeSource {
    async fn fetch_organization(&self, organization_id: &str) -> Result<Organization, SyncError> {
        self.enter(format!("organization:{}", organization_id)).await?;
        self.organizations
            .lock()
            .expect("lock")
            .get(organization_id)
            .cloned()
            .ok_or_else(|| SyncError::NotFound(organization_id.to_string()))
    }

    async fn fetch_members(&self, organization_id: &str) -> Result<Vec<Member>, SyncError> {
        self.enter(format!("members:{}", organization_id)).await?;
        Ok(self
            .members
            .lock()
            .expect("lock")
            .get(organization_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_active_assets(&self, organization_id: &str) -> Result<Vec<Asset>, SyncError> {
        self.enter(format!("assets:{}", organization_id)).await?;
        Ok(self
            .assets
            .lock()
            .expect("lock")
            .get(organization_id)
            .map(|assets| assets.iter().filter(|a| a.is_active()).cloned().collect())
            .unwrap_or_default())
    }

    async fn fetch_reports(&self, organization_id: &str) -> Result<Vec<Report>, SyncError> {
        self.enter(format!("reports:{}", organization_id)).await?;
        Ok(self
            .reports
            .lock()
            .expect("lock")
            .get(organization_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_asset_attributes(&self, asset_id: &str) -> Result<Vec<Attribute>, SyncError> {
        let running = self.attribute_fetches_running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_attribute_fetches_running
            .fetch_max(running, Ordering::SeqCst);
        tokio::task::yield_now().await;
        let entered = self.enter(format!("attributes:{}", asset_id)).await;
        tokio::task::yield_now().await;
        self.attribute_fetches_running.fetch_sub(1, Ordering::SeqCst);
        entered?;

        Ok(self
            .attributes
            .lock()
            .expect("lock")
            .get(asset_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_attribute_values(
        &self,
        attribute_id: &str,
    ) -> Result<Vec<AttributeValue>, SyncError> {
        self.enter(format!("values:{}", attribute_id)).await?;
        Ok(self
            .values
            .lock()
            .expect("lock")
            .get(attribute_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_asset(&self, input: &NewAsset) -> Result<Asset, SyncError> {
        self.enter(format!("create:{}", input.organization_id)).await?;
        let created = Asset {
            id: format!("new-{}", input.name.to_lowercase()),
            organization_id: input.organization_id.clone(),
            name: input.name.clone(),
            description: input.description.clone(),
            asset_type: input.asset_type,
            quantity: input.quantity.max(1) as u32,
            trash_bin: false,
        };
        self.assets
            .lock()
            .expect("lock")
            .entry(input.organization_id.clone())
            .or_default()
            .push(created.clone());
        Ok(created)
    }
}
