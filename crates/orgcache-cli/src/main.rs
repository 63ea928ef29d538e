//! orgcache - browse an organization's members, assets and reports from the terminal.
//!
//! Usage:
//!   orgcache use <org-id>
//!   orgcache show [members|assets|reports]
//!   orgcache create-asset <name> <unique|replicable> <quantity> <description>
//!   orgcache report <key>
//!   orgcache upload-report <author-id> <title> <file.csv>

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use orgcache_core::models::{AssetType, NewAsset};
use orgcache_core::utils::parse_csv;
use orgcache_core::{
    ApiClient, Config, OrganizationSession, ReportUpload, Section, SectionData, SyncError,
};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ============================================================================
// Constants
// ============================================================================

const DEFAULT_API_URL: &str = "http://localhost:3000/api";

const ENV_API_URL: &str = "ORGCACHE_API_URL";
const ENV_TOKEN: &str = "ORGCACHE_TOKEN";
const ENV_ORGANIZATION_ID: &str = "ORGCACHE_ORGANIZATION_ID";

const USAGE: &str = "\
Usage:
  orgcache use <org-id>
  orgcache show [members|assets|reports]
  orgcache create-asset <name> <unique|replicable> <quantity> <description>
  orgcache report <key>
  orgcache upload-report <author-id> <title> <file.csv>";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // RUST_LOG controls the level (e.g. RUST_LOG=orgcache_core=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let mut config = Config::load().context("Failed to load config")?;
    debug!(?config, "Config loaded");

    match args.as_slice() {
        ["use", organization_id] => use_organization(&mut config, organization_id),
        ["show"] => show(&config, Section::Members).await,
        ["show", section] => {
            let section = Section::parse(section)
                .with_context(|| format!("Unknown section '{}'", section))?;
            show(&config, section).await
        }
        ["create-asset", name, asset_type, quantity, description] => {
            create_asset(&config, name, asset_type, quantity, description).await
        }
        ["report", key] => download_report(&config, key).await,
        ["upload-report", author_id, title, file] => {
            upload_report(&config, author_id, title, Path::new(file)).await
        }
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

// ============================================================================
// Setup
// ============================================================================

fn api_client(config: &Config) -> Result<ApiClient> {
    let base_url = std::env::var(ENV_API_URL)
        .ok()
        .or_else(|| config.api_base_url.clone())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    let mut client = match config.request_timeout_secs {
        Some(secs) => ApiClient::with_timeout(&base_url, Duration::from_secs(secs))?,
        None => ApiClient::new(&base_url)?,
    };
    if let Ok(token) = std::env::var(ENV_TOKEN) {
        client.set_token(token);
    }
    debug!(base_url = %client.base_url(), "API client ready");
    Ok(client)
}

fn organization_id(config: &Config) -> Result<String> {
    std::env::var(ENV_ORGANIZATION_ID)
        .ok()
        .or_else(|| config.organization_id.clone())
        .context("No active organization. Run `orgcache use <org-id>` first")
}

async fn open_session(config: &Config, section: Section) -> Result<OrganizationSession> {
    let client = api_client(config)?;
    let session = OrganizationSession::new(Arc::new(client), config.session_options(section));

    let organization_id = organization_id(config)?;
    let organization = session
        .set_active_organization(&organization_id)
        .await
        .with_context(|| format!("Could not open organization {}", organization_id))?;
    println!("{} ({})", organization.name, organization.id);
    Ok(session)
}

// ============================================================================
// Commands
// ============================================================================

fn use_organization(config: &mut Config, organization_id: &str) -> Result<()> {
    config.organization_id = Some(organization_id.to_string());
    config.save().context("Failed to save config")?;
    info!(organization_id, "Active organization saved");
    println!("Active organization: {}", organization_id);
    Ok(())
}

async fn show(config: &Config, section: Section) -> Result<()> {
    let session = open_session(config, section).await?;
    session.select_tab(section);

    let data = session.ensure_section_loaded(session.active_section()).await?;
    println!("== {} ({}) ==", data.section().title(), data.len());
    print_section(&data);
    Ok(())
}

fn print_section(data: &SectionData) {
    if data.is_empty() {
        println!("(no {})", data.section().title().to_lowercase());
        return;
    }
    match data {
        SectionData::Members(members) => {
            for member in members.iter() {
                println!("{:<30} {:<35} {}", member.full_name(), member.email, member.role);
            }
        }
        SectionData::Assets(section) => {
            for asset in &section.assets {
                let tag = section.rfid_index.tag_for(&asset.id).unwrap_or("-");
                println!(
                    "{:<30} {:<10} {:>5}  rfid: {}",
                    asset.name, asset.asset_type, asset.quantity, tag
                );
            }
            let index = &section.rfid_index;
            if !index.is_complete() {
                eprintln!("RFID index incomplete ({} lookups failed):", index.failures.len());
                for failure in &index.failures {
                    eprintln!("  {}", failure);
                }
            }
        }
        SectionData::Reports(reports) => {
            for report in reports.iter() {
                println!("{}  {:<40} {}", report.created_display(), report.title, report.file_url);
            }
        }
    }
}

async fn create_asset(
    config: &Config,
    name: &str,
    asset_type: &str,
    quantity: &str,
    description: &str,
) -> Result<()> {
    let asset_type = AssetType::parse(asset_type)
        .with_context(|| format!("Asset type must be 'unique' or 'replicable', got '{}'", asset_type))?;
    let quantity: i64 = quantity
        .parse()
        .with_context(|| format!("Quantity must be a whole number, got '{}'", quantity))?;

    let session = open_session(config, Section::Assets).await?;
    let created = session
        .create_asset(NewAsset {
            name: name.to_string(),
            asset_type,
            description: description.to_string(),
            quantity,
            organization_id: String::new(),
        })
        .await;

    let created = match created {
        Ok(asset) => asset,
        Err(SyncError::Validation(message)) => bail!("Invalid asset: {}", message),
        Err(e) => return Err(e.into()),
    };
    println!("Created asset {} ({})", created.name, created.id);

    if let Some(section) = session.assets().data {
        print_section(&SectionData::Assets(section));
    }
    Ok(())
}

async fn download_report(config: &Config, key: &str) -> Result<()> {
    let client = api_client(config)?;
    let csv = client
        .fetch_report_csv(key)
        .await
        .with_context(|| format!("Failed to download report {}", key))?;

    for row in parse_csv(&csv) {
        println!("{}", row.join(" | "));
    }
    Ok(())
}

async fn upload_report(config: &Config, author_id: &str, title: &str, file: &Path) -> Result<()> {
    let csv = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let filename = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .context("Report path has no file name")?;

    let client = api_client(config)?;
    let report = client
        .upload_report(&ReportUpload {
            author_id: author_id.to_string(),
            organization_id: organization_id(config)?,
            title: title.to_string(),
            filename,
            csv,
        })
        .await
        .context("Failed to upload report")?;

    println!("Uploaded report {} ({})", report.title, report.id);
    Ok(())
}
