use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$MYOLDTIMER_HOME`, or `~/.myoldtimer`.
pub fn myoldtimer_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("MYOLDTIMER_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".myoldtimer"))
}

pub fn ensure_myoldtimer_home() -> Result<PathBuf> {
    let dir = myoldtimer_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn default_data_dir() -> Result<PathBuf> {
    Ok(myoldtimer_home()?.join("data"))
}
