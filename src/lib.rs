pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use crate::adapters::{cache::CachedBranchStore, memory::InMemoryBranchStore};
pub use crate::config::toml_config::EngineConfig;
pub use crate::core::repository::BranchRepository;
pub use crate::domain::model::{
    BoundingBox, Branch, BranchId, BranchQuery, BranchStatus, BranchType, DistanceResult,
    GeoPoint, StatusFilter,
};
pub use crate::domain::ports::{BranchStore, SearchSettings};
pub use crate::utils::error::{LocatorError, Result};
