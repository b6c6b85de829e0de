pub mod toml_config;

#[cfg(feature = "cli")]
use crate::domain::model::{BranchStatus, BranchType};
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "branch-locator")]
#[command(about = "Find branches, ATMs and kiosks near a coordinate")]
pub struct CliConfig {
    /// Branch dataset (JSON array or CSV with a header row)
    #[arg(long, env = "BRANCH_LOCATOR_DATA")]
    pub data: Option<String>,

    /// Engine settings in TOML
    #[arg(long)]
    pub config: Option<String>,

    /// Statuses treated as eligible (default: ACTIVE)
    #[arg(long, value_delimiter = ',')]
    pub status: Vec<BranchStatus>,

    /// Attach the bearing from the origin to every result
    #[arg(long)]
    pub bearing: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Nearest eligible branches, closest first
    Nearest {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, default_value = "5")]
        limit: usize,
        #[arg(long, value_delimiter = ',')]
        types: Vec<BranchType>,
    },
    /// Eligible branches within a radius, closest first
    Radius {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long)]
        radius_km: f64,
        #[arg(long, value_delimiter = ',')]
        types: Vec<BranchType>,
        #[arg(long, default_value = "100")]
        limit: usize,
    },
    /// Eligible branches inside a latitude/longitude rectangle
    Box {
        #[arg(long, allow_hyphen_values = true)]
        ne_lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        ne_lon: f64,
        #[arg(long, allow_hyphen_values = true)]
        sw_lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        sw_lon: f64,
    },
    /// Great-circle distance and bearing between two points
    Distance {
        #[arg(long, allow_hyphen_values = true)]
        from_lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        from_lon: f64,
        #[arg(long, allow_hyphen_values = true)]
        to_lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        to_lon: f64,
    },
}

#[cfg(feature = "cli")]
impl Command {
    pub fn needs_data(&self) -> bool {
        !matches!(self, Command::Distance { .. })
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(data) = &self.data {
            validation::validate_path("data", data)?;
        }
        if let Some(config) = &self.config {
            validation::validate_path("config", config)?;
        }
        Ok(())
    }
}
