//! Branch dataset loading from JSON or CSV files.
//!
//! Both formats share one flat record layout:
//! `id, name, latitude, longitude, type, address, status, created_at, updated_at`.
//! `status` defaults to `ACTIVE`; missing timestamps default to load time.

use crate::domain::model::{Branch, BranchId, BranchStatus, BranchType, GeoPoint};
use crate::utils::error::{LocatorError, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct BranchRecord {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "type")]
    pub branch_type: BranchType,
    #[serde(default)]
    pub address: String,
    #[serde(default = "default_status")]
    pub status: BranchStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_status() -> BranchStatus {
    BranchStatus::Active
}

impl TryFrom<BranchRecord> for Branch {
    type Error = LocatorError;

    fn try_from(record: BranchRecord) -> Result<Self> {
        let location = GeoPoint::new(record.latitude, record.longitude)?;
        let created_at = record.created_at.unwrap_or_else(Utc::now);
        let updated_at = record.updated_at.unwrap_or(created_at);
        Ok(Branch {
            id: BranchId::new(record.id),
            name: record.name,
            location,
            branch_type: record.branch_type,
            address: record.address,
            status: record.status,
            created_at,
            updated_at,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Json,
    Csv,
}

impl DataFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("json") => Ok(DataFormat::Json),
            Some("csv") => Ok(DataFormat::Csv),
            _ => Err(LocatorError::InvalidConfigValueError {
                field: "data".to_string(),
                value: path.display().to_string(),
                reason: "Unsupported file extension. Allowed extensions: json, csv".to_string(),
            }),
        }
    }
}

pub fn load_branches<P: AsRef<Path>>(path: P) -> Result<Vec<Branch>> {
    let path = path.as_ref();
    let format = DataFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)?;
    let branches = parse_branches(&content, format)?;
    tracing::info!("Loaded {} branches from {}", branches.len(), path.display());
    Ok(branches)
}

pub fn parse_branches(content: &str, format: DataFormat) -> Result<Vec<Branch>> {
    let records: Vec<BranchRecord> = match format {
        DataFormat::Json => serde_json::from_str(content)?,
        DataFormat::Csv => {
            let mut reader = csv::ReaderBuilder::new()
                .trim(csv::Trim::All)
                .from_reader(content.as_bytes());
            reader
                .deserialize()
                .collect::<std::result::Result<Vec<BranchRecord>, csv::Error>>()?
        }
    };

    records.into_iter().map(Branch::try_from).collect()
}
