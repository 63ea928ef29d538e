//! Root controller for one organization view.
//!
//! `OrganizationSession` owns the organization snapshot and one cache per
//! section. The presentation layer selects tabs and calls
//! `ensure_section_loaded`; the session decides whether that means a fetch.
//!
//! All methods take `&self`, so a view can share the session behind an `Arc`
//! and issue loads concurrently. Switching organization resets every
//! section, and responses still in flight for the previous organization are
//! dropped when they land.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::api::RemoteDataSource;
use crate::cache::{Section, SectionCache, SectionPhase, SectionSnapshot};
use crate::error::SyncError;
use crate::focus::FocusInvalidationPolicy;
use crate::models::{sort_newest_first, Asset, Member, NewAsset, Organization, Report};
use crate::rfid::{RfidIndex, RfidIndexBuilder, DEFAULT_MAX_CONCURRENT_REQUESTS};

/// Tuning knobs for a session
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Upper bound on concurrent RFID attribute requests
    pub max_concurrent_requests: usize,
    /// Tab selected when the session starts
    pub initial_section: Section,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            initial_section: Section::Members,
        }
    }
}

/// Data held by the assets section
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetsSection {
    pub assets: Vec<Asset>,
    /// Built from `assets` by the same load
    pub rfid_index: RfidIndex,
}

/// Loaded data of any section
#[derive(Debug, Clone)]
pub enum SectionData {
    Members(Arc<Vec<Member>>),
    Assets(Arc<AssetsSection>),
    Reports(Arc<Vec<Report>>),
}

impl SectionData {
    pub fn section(&self) -> Section {
        match self {
            SectionData::Members(_) => Section::Members,
            SectionData::Assets(_) => Section::Assets,
            SectionData::Reports(_) => Section::Reports,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SectionData::Members(members) => members.len(),
            SectionData::Assets(section) => section.assets.len(),
            SectionData::Reports(reports) => reports.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Organization a load was resolved against
struct LoadScope {
    organization_id: String,
    epoch: u64,
}

#[derive(Default)]
struct OrganizationContext {
    id: Option<String>,
    organization: Option<Organization>,
    failure: Option<SyncError>,
    /// Bumped on every switch; responses for older epochs are ignored
    epoch: u64,
}

pub struct OrganizationSession {
    source: Arc<dyn RemoteDataSource>,
    rfid: RfidIndexBuilder,
    focus_policy: FocusInvalidationPolicy,
    context: Mutex<OrganizationContext>,
    active_section: Mutex<Section>,
    members: SectionCache<Vec<Member>>,
    assets: SectionCache<AssetsSection>,
    reports: SectionCache<Vec<Report>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl OrganizationSession {
    pub fn new(source: Arc<dyn RemoteDataSource>, options: SessionOptions) -> Self {
        Self {
            rfid: RfidIndexBuilder::new(Arc::clone(&source), options.max_concurrent_requests),
            source,
            focus_policy: FocusInvalidationPolicy,
            context: Mutex::new(OrganizationContext::default()),
            active_section: Mutex::new(options.initial_section),
            members: SectionCache::new(Section::Members),
            assets: SectionCache::new(Section::Assets),
            reports: SectionCache::new(Section::Reports),
        }
    }

    // =========================================================================
    // Organization
    // =========================================================================

    /// Make `organization_id` the session's organization and load its metadata.
    ///
    /// Every section goes back to `Idle` before the request is made. When the
    /// id does not resolve, section loads fail until another id is set.
    pub async fn set_active_organization(
        &self,
        organization_id: &str,
    ) -> Result<Organization, SyncError> {
        let epoch = {
            let mut context = lock(&self.context);
            context.epoch += 1;
            context.id = Some(organization_id.to_string());
            context.organization = None;
            context.failure = None;
            context.epoch
        };
        for section in Section::ALL {
            self.reset_section(section, epoch);
        }
        info!(organization_id, epoch, "Switching organization");

        let result = self.source.fetch_organization(organization_id).await;

        let mut context = lock(&self.context);
        if context.epoch != epoch {
            debug!(organization_id, epoch, "Discarding organization response for superseded switch");
            return result;
        }
        match result {
            Ok(ref organization) => {
                info!(organization_id, name = %organization.name, "Organization loaded");
                context.organization = Some(organization.clone());
            }
            Err(ref e) => {
                warn!(organization_id, error = %e, "Failed to load organization");
                context.failure = Some(e.clone());
            }
        }
        result
    }

    pub fn organization(&self) -> Option<Organization> {
        lock(&self.context).organization.clone()
    }

    pub fn organization_id(&self) -> Option<String> {
        lock(&self.context).id.clone()
    }

    /// Organization and epoch every section load is scoped to, read together
    fn resolve(&self) -> Result<LoadScope, SyncError> {
        let context = lock(&self.context);
        match (&context.id, &context.organization, &context.failure) {
            (Some(id), Some(_), _) => Ok(LoadScope {
                organization_id: id.clone(),
                epoch: context.epoch,
            }),
            (Some(id), None, Some(SyncError::NotFound(_))) => Err(SyncError::NotFound(id.clone())),
            (Some(_), None, Some(failure)) => Err(failure.clone()),
            _ => Err(SyncError::NoActiveOrganization),
        }
    }

    // =========================================================================
    // Tabs
    // =========================================================================

    /// Select a tab. Loading is left to `ensure_section_loaded`.
    pub fn select_tab(&self, section: Section) {
        *lock(&self.active_section) = section;
        debug!(section = %section, "Tab selected");
    }

    pub fn active_section(&self) -> Section {
        *lock(&self.active_section)
    }

    /// The view was (re-)entered: apply the focus policy.
    /// Returns the sections that were marked stale.
    pub fn on_focus(&self) -> Vec<Section> {
        self.focus_policy
            .sections_to_invalidate(self.active_section())
            .into_iter()
            .filter(|&section| self.invalidate(section))
            .collect()
    }

    pub fn invalidate(&self, section: Section) -> bool {
        match section {
            Section::Members => self.members.invalidate(),
            Section::Assets => self.assets.invalidate(),
            Section::Reports => self.reports.invalidate(),
        }
    }

    fn reset_section(&self, section: Section, epoch: u64) {
        match section {
            Section::Members => self.members.reset(epoch),
            Section::Assets => self.assets.reset(epoch),
            Section::Reports => self.reports.reset(epoch),
        }
    }

    pub fn phase(&self, section: Section) -> SectionPhase {
        match section {
            Section::Members => self.members.phase(),
            Section::Assets => self.assets.phase(),
            Section::Reports => self.reports.phase(),
        }
    }

    pub fn members(&self) -> SectionSnapshot<Vec<Member>> {
        self.members.snapshot()
    }

    pub fn assets(&self) -> SectionSnapshot<AssetsSection> {
        self.assets.snapshot()
    }

    pub fn reports(&self) -> SectionSnapshot<Vec<Report>> {
        self.reports.snapshot()
    }

    pub fn rfid_index(&self) -> Option<RfidIndex> {
        self.assets
            .snapshot()
            .data
            .map(|section| section.rfid_index.clone())
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Unified entry point used by the view when a tab becomes visible.
    pub async fn ensure_section_loaded(&self, section: Section) -> Result<SectionData, SyncError> {
        match section {
            Section::Members => self.ensure_members_loaded().await.map(SectionData::Members),
            Section::Assets => self.ensure_assets_loaded().await.map(SectionData::Assets),
            Section::Reports => self.ensure_reports_loaded().await.map(SectionData::Reports),
        }
    }

    pub async fn ensure_members_loaded(&self) -> Result<Arc<Vec<Member>>, SyncError> {
        let scope = self.resolve()?;
        self.load_members(scope).await
    }

    pub async fn ensure_reports_loaded(&self) -> Result<Arc<Vec<Report>>, SyncError> {
        let scope = self.resolve()?;
        self.load_reports(scope).await
    }

    /// Load the asset list together with its RFID index.
    ///
    /// The index is built inside the shared fetch, so every caller, joiners
    /// included, gets the asset list and its index from the same load.
    pub async fn ensure_assets_loaded(&self) -> Result<Arc<AssetsSection>, SyncError> {
        let scope = self.resolve()?;
        self.load_assets(scope).await
    }

    async fn load_members(&self, scope: LoadScope) -> Result<Arc<Vec<Member>>, SyncError> {
        let source = Arc::clone(&self.source);
        let LoadScope {
            organization_id,
            epoch,
        } = scope;

        self.members
            .ensure_loaded(epoch, move || async move {
                source.fetch_members(&organization_id).await
            })
            .await
    }

    async fn load_reports(&self, scope: LoadScope) -> Result<Arc<Vec<Report>>, SyncError> {
        let source = Arc::clone(&self.source);
        let LoadScope {
            organization_id,
            epoch,
        } = scope;

        self.reports
            .ensure_loaded(epoch, move || async move {
                let mut reports = source.fetch_reports(&organization_id).await?;
                sort_newest_first(&mut reports);
                Ok(reports)
            })
            .await
    }

    async fn load_assets(&self, scope: LoadScope) -> Result<Arc<AssetsSection>, SyncError> {
        let source = Arc::clone(&self.source);
        let rfid = self.rfid.clone();
        let LoadScope {
            organization_id,
            epoch,
        } = scope;

        self.assets
            .ensure_loaded(epoch, move || async move {
                let assets = source.fetch_active_assets(&organization_id).await?;
                let rfid_index = rfid.build(&organization_id, &assets).await;
                Ok(AssetsSection { assets, rfid_index })
            })
            .await
    }

    // =========================================================================
    // Asset creation
    // =========================================================================

    /// Create an asset for the active organization and refresh the assets tab.
    ///
    /// Input is validated before anything is sent. A failed refresh after a
    /// successful create is logged and leaves the assets tab stale.
    pub async fn create_asset(&self, mut input: NewAsset) -> Result<Asset, SyncError> {
        input.validate()?;
        input.organization_id = self.resolve()?.organization_id;

        let asset = self.source.create_asset(&input).await?;
        info!(asset_id = %asset.id, name = %asset.name, "Asset created");

        if let Err(e) = self.refresh_after_asset_created().await {
            warn!(error = %e, "Failed to refresh assets after create");
        }
        Ok(asset)
    }

    /// Force the assets tab (and its RFID index) to reflect a new asset.
    pub async fn refresh_after_asset_created(&self) -> Result<Arc<AssetsSection>, SyncError> {
        // A fetch already in flight may predate the new asset; let it land first.
        if self.assets.phase() == SectionPhase::Loading {
            if let Err(e) = self.ensure_assets_loaded().await {
                debug!(error = %e, "In-flight assets fetch failed before refresh");
            }
        }
        self.assets.invalidate();
        self.ensure_assets_loaded().await
    }
}
