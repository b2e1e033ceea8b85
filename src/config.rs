use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::planning::{check_budget, DEFAULT_RISK_BUDGET, DEFAULT_SCRAP_THRESHOLD};
use crate::{Error, Result};

fn default_risk_budget() -> f64 {
    DEFAULT_RISK_BUDGET
}

fn default_scrap_threshold() -> f64 {
    DEFAULT_SCRAP_THRESHOLD
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Risk inventory at which forward work is blocked.
    #[serde(default = "default_risk_budget")]
    pub risk_budget: f64,
    /// Volatility at which a plan change scraps downstream work.
    #[serde(default = "default_scrap_threshold")]
    pub scrap_threshold: f64,
    pub store_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            risk_budget: DEFAULT_RISK_BUDGET,
            scrap_threshold: DEFAULT_SCRAP_THRESHOLD,
            store_path: None,
        }
    }
}

impl Config {
    pub fn gantry_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".gantry"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::gantry_dir()?.join("gantry.toml"))
    }

    /// Where the task file lives: `store_path` if set, else `~/.gantry/tasks.json`.
    pub fn effective_store_path(&self) -> Result<PathBuf> {
        match &self.store_path {
            Some(path) => Ok(expand_tilde(path)),
            None => Ok(Self::gantry_dir()?.join("tasks.json")),
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Config::load");
        if !path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&fs::read_to_string(path)?)?;
        config.validate()?;
        debug!(
            risk_budget = config.risk_budget,
            scrap_threshold = config.scrap_threshold,
            store_path = ?config.store_path,
            "Config loaded"
        );
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                debug!(dir = %dir.display(), "Creating config directory");
                fs::create_dir_all(dir)?;
            }
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        debug!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Check value ranges. Run again after applying command line overrides.
    pub fn validate(&self) -> Result<()> {
        check_budget(self.risk_budget)?;
        if !(0.0..=1.0).contains(&self.scrap_threshold) {
            return Err(Error::Validation(format!(
                "scrap_threshold must be between 0.0 and 1.0, got {}",
                self.scrap_threshold
            )));
        }
        Ok(())
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
