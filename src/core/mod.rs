pub mod geodesy;
pub mod predicate;
pub mod ranking;
pub mod repository;

pub use crate::domain::model::{Branch, BranchQuery, DistanceResult, GeoPoint};
pub use crate::domain::ports::{BranchStore, SearchSettings};
pub use crate::utils::error::Result;
