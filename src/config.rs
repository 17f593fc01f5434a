//! Runtime configuration for the demo tooling.

use crate::finder::params::FinderParams;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Deterministic synthetic event description consumed by the demo binary.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticEventConfig {
    /// Generated tracks as (azimuth rad, polar rad) pairs.
    pub tracks: Vec<(f64, f64)>,
    /// Hits per generated track.
    pub hits_per_track: usize,
    /// Additional isolated hits placed on a fixed angular fan.
    pub noise_hits: usize,
}

impl Default for SyntheticEventConfig {
    fn default() -> Self {
        Self {
            tracks: vec![(0.8, 1.2), (2.9, 1.9)],
            hits_per_track: 10,
            noise_hits: 12,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub report_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub event: SyntheticEventConfig,
    pub finder_params: FinderParams,
    pub output: OutputConfig,
}

pub fn load_config(path: &Path) -> Result<RuntimeConfig, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config: RuntimeConfig = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    Ok(config)
}

pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    let serialized = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize output: {e}"))?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    fs::write(path, serialized).map_err(|e| format!("Failed to write {}: {e}", path.display()))
}
