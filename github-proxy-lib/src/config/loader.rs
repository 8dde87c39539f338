use std::fs;
use std::path::Path;

use super::{validate, Config};
use crate::error::{ProxyError, Result};

/// Read and validate a configuration file.
pub fn load_from_path<P: AsRef<Path>>(p: P) -> Result<Config> {
    let cfg = read_from_path(p)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Read a configuration file without validating it, so callers can apply
/// overrides first.
pub fn read_from_path<P: AsRef<Path>>(p: P) -> Result<Config> {
    let txt = fs::read_to_string(p)
        .map_err(|e| ProxyError::Config(format!("Failed to read config file: {e}")))?;
    parse_config(&txt)
}

pub fn parse_config(txt: &str) -> Result<Config> {
    toml::from_str(txt).map_err(|e| ProxyError::Config(format!("Failed to parse config: {e}")))
}
