//! API client for communicating with the organization REST API.
//!
//! This module provides the `ApiClient` struct, the production
//! `RemoteDataSource`, plus the report download/upload flows that go
//! through presigned storage URLs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SyncError;
use crate::models::{Asset, Attribute, AttributeValue, Member, NewAsset, Organization, Report};

use super::{ApiError, RemoteDataSource};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Content type used when uploading CSV reports to storage
const CSV_CONTENT_TYPE: &str = "text/csv";

/// Response envelope used by every JSON endpoint
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    message: Option<String>,
    data: T,
}

#[derive(Debug, Deserialize)]
struct AssetDetail {
    #[serde(default)]
    attributes: Vec<Attribute>,
}

#[derive(Debug, Deserialize)]
struct AttributeDetail {
    #[serde(default)]
    values: Vec<AttributeValue>,
}

#[derive(Debug, Deserialize)]
struct PresignedDownload {
    url: String,
}

#[derive(Debug, Deserialize)]
struct PresignedUpload {
    url: String,
    key: String,
}

#[derive(Debug, Serialize)]
struct UploadRequest<'a> {
    filename: &'a str,
}

#[derive(Debug, Serialize)]
struct RegisterReport<'a> {
    #[serde(rename = "authorId")]
    author_id: &'a str,
    #[serde(rename = "organizationId")]
    organization_id: &'a str,
    title: &'a str,
    key: &'a str,
}

/// A CSV report ready to be pushed to storage and registered
#[derive(Debug, Clone)]
pub struct ReportUpload {
    pub author_id: String,
    pub organization_id: String,
    pub title: String,
    pub filename: String,
    pub csv: String,
}

/// API client for the organization service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client for the given base URL
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL plus `segments`, each percent-encoded as a single path segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Send a request and unwrap the `{message, data}` envelope of the reply
    async fn send_enveloped<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &str,
    ) -> Result<T, ApiError> {
        let response = self
            .authorized(request)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;
        let response = Self::check_response(response).await?;

        let text = response.text().await?;
        let envelope: Envelope<T> = serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!(
                "Failed to parse response from {}: {} (starts with: {})",
                url,
                e,
                preview(&text)
            ))
        })?;

        if let Some(message) = envelope.message {
            debug!(url = url, message = %message, "API message");
        }
        Ok(envelope.data)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        debug!(url = %url, "GET");
        self.send_enveloped(self.client.get(url.clone()), url.as_str()).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        debug!(url = %url, "POST");
        self.send_enveloped(self.client.post(url.clone()).json(body), url.as_str()).await
    }

    // ===== Report Transfer =====

    /// Download a report's CSV text through its presigned URL.
    pub async fn fetch_report_csv(&self, key: &str) -> Result<String, SyncError> {
        let url = self.endpoint(&["reports", "download"])?;
        debug!(url = %url, key = key, "Requesting report download URL");
        let presigned: PresignedDownload = self
            .send_enveloped(self.client.get(url.clone()).query(&[("key", key)]), url.as_str())
            .await?;

        // Presigned URLs carry their own credentials; no auth header here.
        let response = self
            .client
            .get(&presigned.url)
            .send()
            .await
            .map_err(ApiError::from)?;
        let response = Self::check_response(response).await?;
        let csv = response.text().await.map_err(ApiError::from)?;
        debug!(key = key, bytes = csv.len(), "Report downloaded");
        Ok(csv)
    }

    /// Push a CSV report to storage and register its metadata.
    pub async fn upload_report(&self, upload: &ReportUpload) -> Result<Report, SyncError> {
        let presigned: PresignedUpload = self
            .post(
                &["reports", "upload"],
                &UploadRequest {
                    filename: &upload.filename,
                },
            )
            .await?;

        let response = self
            .client
            .put(&presigned.url)
            .header(header::CONTENT_TYPE, CSV_CONTENT_TYPE)
            .body(upload.csv.clone())
            .send()
            .await
            .map_err(ApiError::from)?;
        Self::check_response(response).await?;
        debug!(key = %presigned.key, bytes = upload.csv.len(), "Report file stored");

        let report: Report = self
            .post(
                &["reports"],
                &RegisterReport {
                    author_id: &upload.author_id,
                    organization_id: &upload.organization_id,
                    title: &upload.title,
                    key: &presigned.key,
                },
            )
            .await?;
        Ok(report)
    }
}

/// First couple hundred bytes of a body, cut on a char boundary
fn preview(text: &str) -> &str {
    let mut end = text.len().min(200);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[async_trait]
impl RemoteDataSource for ApiClient {
    async fn fetch_organization(&self, organization_id: &str) -> Result<Organization, SyncError> {
        self.get(&["organizations", organization_id])
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    SyncError::NotFound(organization_id.to_string())
                } else {
                    e.into()
                }
            })
    }

    async fn fetch_members(&self, organization_id: &str) -> Result<Vec<Member>, SyncError> {
        let members: Vec<Member> = self
            .get(&["organizations", organization_id, "members"])
            .await?;
        debug!(count = members.len(), "Members fetched");
        Ok(members)
    }

    async fn fetch_active_assets(&self, organization_id: &str) -> Result<Vec<Asset>, SyncError> {
        let assets: Vec<Asset> = self
            .get(&["organizations", organization_id, "assets"])
            .await?;
        let total = assets.len();
        let active: Vec<Asset> = assets.into_iter().filter(Asset::is_active).collect();
        debug!(count = active.len(), trashed = total - active.len(), "Assets fetched");
        Ok(active)
    }

    async fn fetch_reports(&self, organization_id: &str) -> Result<Vec<Report>, SyncError> {
        let reports: Vec<Report> = self
            .get(&["organizations", organization_id, "reports"])
            .await?;
        debug!(count = reports.len(), "Reports fetched");
        Ok(reports)
    }

    async fn fetch_asset_attributes(&self, asset_id: &str) -> Result<Vec<Attribute>, SyncError> {
        let detail: AssetDetail = self.get(&["assets", asset_id]).await?;
        Ok(detail.attributes)
    }

    async fn fetch_attribute_values(
        &self,
        attribute_id: &str,
    ) -> Result<Vec<AttributeValue>, SyncError> {
        let detail: AttributeDetail = self.get(&["attributes", attribute_id]).await?;
        Ok(detail.values)
    }

    async fn create_asset(&self, input: &NewAsset) -> Result<Asset, SyncError> {
        if input.quantity <= 0 {
            warn!(quantity = input.quantity, "Refusing to create asset with non-positive quantity");
            return Err(SyncError::Validation(format!(
                "quantity must be positive, got {}",
                input.quantity
            )));
        }
        let asset: Asset = self.post(&["assets"], input).await?;
        debug!(asset_id = %asset.id, "Asset created");
        Ok(asset)
    }
}

// ============================================================================
// Tests
// ============================================================================
