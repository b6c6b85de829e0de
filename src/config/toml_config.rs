use crate::domain::ports::SearchSettings;
use crate::utils::error::{LocatorError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_MAX_RESULTS: usize = 100;
pub const DEFAULT_SEARCH_RADIUS_KM: f64 = 25.0;
pub const DEFAULT_WIDENING_FACTOR: f64 = 4.0;
pub const DEFAULT_MAX_WIDENING_STEPS: u32 = 3;

/// Upper bound on widening steps; past this a full scan is cheaper anyway.
const MAX_WIDENING_STEPS_LIMIT: u32 = 16;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub data: Option<DataConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_results: usize,
    pub default_search_radius_km: f64,
    pub widening_factor: f64,
    pub max_widening_steps: u32,
    pub include_bearing: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            default_search_radius_km: DEFAULT_SEARCH_RADIUS_KM,
            widening_factor: DEFAULT_WIDENING_FACTOR,
            max_widening_steps: DEFAULT_MAX_WIDENING_STEPS,
            include_bearing: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path of a JSON or CSV branch file.
    pub path: String,
    /// Put a snapshot cache in front of the loaded store.
    pub cache: Option<bool>,
}

impl EngineConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LocatorError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| LocatorError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${BRANCH_DATA})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LocatorError::ConfigValidationError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_positive_number("search.max_results", self.search.max_results, 1)?;
        validation::validate_finite_above(
            "search.default_search_radius_km",
            self.search.default_search_radius_km,
            0.0,
        )?;
        validation::validate_finite_above("search.widening_factor", self.search.widening_factor, 1.0)?;
        validation::validate_range(
            "search.max_widening_steps",
            self.search.max_widening_steps,
            0,
            MAX_WIDENING_STEPS_LIMIT,
        )?;

        if let Some(data) = &self.data {
            validation::validate_path("data.path", &data.path)?;
        }

        Ok(())
    }

    pub fn data_path(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.path.as_str())
    }

    pub fn cache_enabled(&self) -> bool {
        self.data.as_ref().and_then(|d| d.cache).unwrap_or(false)
    }
}

impl SearchSettings for EngineConfig {
    fn max_results(&self) -> usize {
        self.search.max_results
    }

    fn default_search_radius_km(&self) -> f64 {
        self.search.default_search_radius_km
    }

    fn widening_factor(&self) -> f64 {
        self.search.widening_factor
    }

    fn max_widening_steps(&self) -> u32 {
        self.search.max_widening_steps
    }

    fn include_bearing(&self) -> bool {
        self.search.include_bearing
    }
}

impl Validate for EngineConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config.max_results(), 100);
        assert_eq!(config.default_search_radius_km(), DEFAULT_SEARCH_RADIUS_KM);
        assert!(!config.include_bearing());
        assert!(config.data_path().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_search_section() {
        let toml_content = r#"
[search]
max_results = 20
default_search_radius_km = 5.0
include_bearing = true

[data]
path = "branches.csv"
cache = true
"#;

        let config = EngineConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.max_results(), 20);
        assert_eq!(config.default_search_radius_km(), 5.0);
        assert_eq!(config.widening_factor(), DEFAULT_WIDENING_FACTOR);
        assert!(config.include_bearing());
        assert_eq!(config.data_path(), Some("branches.csv"));
        assert!(config.cache_enabled());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("BRANCH_LOCATOR_TEST_DATA", "/srv/branches.json");

        let toml_content = r#"
[data]
path = "${BRANCH_LOCATOR_TEST_DATA}"
"#;

        let config = EngineConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.data_path(), Some("/srv/branches.json"));

        std::env::remove_var("BRANCH_LOCATOR_TEST_DATA");
    }

    #[test]
    fn test_config_validation() {
        for bad in [
            "[search]\nmax_results = 0",
            "[search]\ndefault_search_radius_km = -3.0",
            "[search]\nwidening_factor = 1.0",
            "[search]\nmax_widening_steps = 99",
            "[data]\npath = \"\"",
        ] {
            let config = EngineConfig::from_toml_str(bad).unwrap();
            assert!(config.validate().is_err(), "accepted: {}", bad);
        }
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = EngineConfig::from_toml_str("[search\nmax_results = ").unwrap_err();
        assert!(matches!(err, LocatorError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[search]\nmax_widening_steps = 5\n")
            .unwrap();

        let config = EngineConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.max_widening_steps(), 5);
    }
}
