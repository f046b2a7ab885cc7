use anyhow::{Context, Result};
use chrono_tz::Tz;
use myoldtimer_core::time::parse_timezone;
use myoldtimer_core::WarningConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::{default_data_dir, ensure_myoldtimer_home};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub clock: ClockSection,
    #[serde(default)]
    pub warning: WarningSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageSection {
    /// Directory holding one JSON document per storage key (default: `<home>/data`)
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockSection {
    /// IANA timezone used to decide what "today" is
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for ClockSection {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarningSection {
    /// Days before a time-based due date that count as "due soon"
    #[serde(default = "default_time_days")]
    pub time_days: i64,
    /// Fraction of the mileage interval before the due reading that counts as "due soon"
    #[serde(default = "default_mileage_ratio")]
    pub mileage_ratio: f64,
}

fn default_time_days() -> i64 {
    WarningConfig::default().time_days
}

fn default_mileage_ratio() -> f64 {
    WarningConfig::default().mileage_ratio
}

impl Default for WarningSection {
    fn default() -> Self {
        Self {
            time_days: default_time_days(),
            mileage_ratio: default_mileage_ratio(),
        }
    }
}

impl Config {
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir(),
        }
    }

    pub fn timezone(&self) -> Result<Tz> {
        parse_timezone(&self.clock.timezone).context("config [clock] timezone")
    }

    pub fn warning(&self) -> Result<WarningConfig> {
        let w = &self.warning;
        if w.time_days < 0 {
            anyhow::bail!("config [warning] time_days must be >= 0");
        }
        if !w.mileage_ratio.is_finite() || !(0.0..=1.0).contains(&w.mileage_ratio) {
            anyhow::bail!("config [warning] mileage_ratio must be between 0 and 1");
        }
        Ok(WarningConfig {
            time_days: w.time_days,
            mileage_ratio: w.mileage_ratio,
        })
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_myoldtimer_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).context("parse config.toml")
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn show_config() -> Result<()> {
    let p = config_path()?;
    let cfg = load_config_from(&p)?;
    println!("# {}{}", p.display(), if p.exists() { "" } else { " (defaults)" });
    print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
    println!("# data_dir = {}", cfg.data_dir()?.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = load_config_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg.clock.timezone, "UTC");
        assert_eq!(cfg.warning().unwrap(), WarningConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let p = dir.path().join("config.toml");
        let body = "[clock]\ntimezone = \"Europe/Vienna\"\n\n[warning]\ntime_days = 14\n";
        fs::write(&p, body).unwrap();
        let cfg = load_config_from(&p).unwrap();
        assert!(cfg.timezone().is_ok());
        let w = cfg.warning().unwrap();
        assert_eq!(w.time_days, 14);
        assert_eq!(w.mileage_ratio, 0.1);
        assert!(cfg.storage.data_dir.is_none());
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut cfg = Config::default();
        cfg.clock.timezone = "Nowhere/City".to_string();
        assert!(cfg.timezone().is_err());
        cfg.warning.mileage_ratio = 1.5;
        assert!(cfg.warning().is_err());
    }
}
