use crate::utils::error::{LocatorError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A WGS84 coordinate in decimal degrees.
///
/// Construction validates the latitude and longitude bounds, so any `GeoPoint`
/// in hand is known to be on the globe. Equality is bitwise on both components.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        // NaN fails both range checks
        let lat_ok = (-90.0..=90.0).contains(&latitude);
        let lon_ok = (-180.0..=180.0).contains(&longitude);
        if !lat_ok || !lon_ok {
            return Err(LocatorError::InvalidCoordinate {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl PartialEq for GeoPoint {
    fn eq(&self, other: &Self) -> bool {
        self.latitude.to_bits() == other.latitude.to_bits()
            && self.longitude.to_bits() == other.longitude.to_bits()
    }
}

impl Eq for GeoPoint {}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

impl<'de> Deserialize<'de> for GeoPoint {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            latitude: f64,
            longitude: f64,
        }

        let raw = Raw::deserialize(deserializer)?;
        GeoPoint::new(raw.latitude, raw.longitude).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchId(String);

impl BranchId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BranchType {
    Traditional,
    Premium,
    AtmOnly,
    Express,
    Digital,
}

impl BranchType {
    pub const ALL: [BranchType; 5] = [
        BranchType::Traditional,
        BranchType::Premium,
        BranchType::AtmOnly,
        BranchType::Express,
        BranchType::Digital,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BranchType::Traditional => "TRADITIONAL",
            BranchType::Premium => "PREMIUM",
            BranchType::AtmOnly => "ATM_ONLY",
            BranchType::Express => "EXPRESS",
            BranchType::Digital => "DIGITAL",
        }
    }
}

impl fmt::Display for BranchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BranchType {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRADITIONAL" => Ok(BranchType::Traditional),
            "PREMIUM" => Ok(BranchType::Premium),
            "ATM_ONLY" => Ok(BranchType::AtmOnly),
            "EXPRESS" => Ok(BranchType::Express),
            "DIGITAL" => Ok(BranchType::Digital),
            other => Err(LocatorError::invalid_query(format!(
                "unknown branch type '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BranchStatus {
    Active,
    TemporarilyClosed,
    PermanentlyClosed,
    Planned,
    UnderMaintenance,
}

impl BranchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BranchStatus::Active => "ACTIVE",
            BranchStatus::TemporarilyClosed => "TEMPORARILY_CLOSED",
            BranchStatus::PermanentlyClosed => "PERMANENTLY_CLOSED",
            BranchStatus::Planned => "PLANNED",
            BranchStatus::UnderMaintenance => "UNDER_MAINTENANCE",
        }
    }
}

impl fmt::Display for BranchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BranchStatus {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(BranchStatus::Active),
            "TEMPORARILY_CLOSED" => Ok(BranchStatus::TemporarilyClosed),
            "PERMANENTLY_CLOSED" => Ok(BranchStatus::PermanentlyClosed),
            "PLANNED" => Ok(BranchStatus::Planned),
            "UNDER_MAINTENANCE" => Ok(BranchStatus::UnderMaintenance),
            other => Err(LocatorError::invalid_query(format!(
                "unknown branch status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub id: BranchId,
    pub name: String,
    pub location: GeoPoint,
    #[serde(rename = "type")]
    pub branch_type: BranchType,
    pub address: String,
    pub status: BranchStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceResult {
    pub branch: Branch,
    pub distance_km: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearing_degrees: Option<f64>,
}

/// Axis-aligned box in latitude/longitude space. Boxes spanning the
/// antimeridian are not representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub north_east: GeoPoint,
    pub south_west: GeoPoint,
}

impl BoundingBox {
    pub fn new(north_east: GeoPoint, south_west: GeoPoint) -> Result<Self> {
        if north_east.latitude() < south_west.latitude() {
            return Err(LocatorError::invalid_query(format!(
                "bounding box north-east corner {} is south of south-west corner {}",
                north_east, south_west
            )));
        }
        if north_east.longitude() < south_west.longitude() {
            return Err(LocatorError::invalid_query(format!(
                "bounding box north-east corner {} is west of south-west corner {}",
                north_east, south_west
            )));
        }
        Ok(Self {
            north_east,
            south_west,
        })
    }
}

/// Caller-supplied status eligibility predicate. Defaults to active-only.
#[derive(Clone)]
pub struct StatusFilter {
    predicate: Arc<dyn Fn(BranchStatus) -> bool + Send + Sync>,
    active_only: bool,
}

impl StatusFilter {
    pub fn active_only() -> Self {
        Self {
            predicate: Arc::new(|status| status == BranchStatus::Active),
            active_only: true,
        }
    }

    pub fn any() -> Self {
        Self::custom(|_| true)
    }

    pub fn one_of(statuses: impl IntoIterator<Item = BranchStatus>) -> Self {
        let allowed: HashSet<BranchStatus> = statuses.into_iter().collect();
        Self::custom(move |status| allowed.contains(&status))
    }

    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(BranchStatus) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            active_only: false,
        }
    }

    pub fn allows(&self, status: BranchStatus) -> bool {
        (self.predicate)(status)
    }

    /// True for the stock active-only filter, which lets the storage
    /// collaborator serve the unrestricted scan from its active set.
    pub fn is_active_only(&self) -> bool {
        self.active_only
    }
}

impl Default for StatusFilter {
    fn default() -> Self {
        Self::active_only()
    }
}

impl fmt::Debug for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.active_only {
            f.write_str("StatusFilter(ActiveOnly)")
        } else {
            f.write_str("StatusFilter(Custom)")
        }
    }
}

/// Compound search request. Absent filters do not restrict the result.
#[derive(Debug, Clone)]
pub struct BranchQuery {
    pub origin: GeoPoint,
    pub radius_km: Option<f64>,
    pub types: Option<HashSet<BranchType>>,
    pub bounding_box: Option<BoundingBox>,
    pub limit: usize,
    pub status_filter: StatusFilter,
}

impl BranchQuery {
    pub fn new(origin: GeoPoint, limit: usize) -> Self {
        Self {
            origin,
            radius_km: None,
            types: None,
            bounding_box: None,
            limit,
            status_filter: StatusFilter::default(),
        }
    }

    pub fn with_radius(mut self, radius_km: f64) -> Self {
        self.radius_km = Some(radius_km);
        self
    }

    pub fn with_types(mut self, types: impl IntoIterator<Item = BranchType>) -> Self {
        self.types = Some(types.into_iter().collect());
        self
    }

    pub fn with_bounding_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = Some(bounding_box);
        self
    }

    pub fn with_status_filter(mut self, status_filter: StatusFilter) -> Self {
        self.status_filter = status_filter;
        self
    }
}
