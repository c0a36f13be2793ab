//! Per-stage configuration.
//!
//! One JSON document keyed by stage (`stage_1`..`stage_N`):
//!
//! ```json
//! {
//!   "stage_1": {
//!     "player": { "hp": 100, "mp": 50 },
//!     "stage": { "background": "assets/images/stages/stage_1.png", "goal_x": 1180.0 }
//!   }
//! }
//! ```
//!
//! `player` is required; `stage` and each of its fields fall back to defaults.
//! The file is read again every time a stage is constructed rather than cached
//! for the whole session.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::stage::StageId;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("config file {path} has no entry for '{key}'")]
    MissingStage { path: PathBuf, key: String },
    #[error("config validation failed for '{key}': {reason}")]
    Invalid { key: String, reason: String },
}

/// Player starting stats for a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PlayerStats {
    pub hp: u32,
    pub mp: u32,
}

/// Stage layout parameters consumed by the concrete stage implementation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StageLayout {
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default = "default_goal_x")]
    pub goal_x: f32,
    #[serde(default = "default_floor_y")]
    pub floor_y: f32,
}

impl Default for StageLayout {
    fn default() -> Self {
        Self {
            background: None,
            goal_x: default_goal_x(),
            floor_y: default_floor_y(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StageConfig {
    pub player: PlayerStats,
    #[serde(default)]
    pub stage: StageLayout,
}

/// Read the whole configuration document.
pub fn load_config_file(path: &Path) -> Result<HashMap<String, StageConfig>, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Read the configuration entry for one stage.
pub fn load_stage_config(path: &Path, stage: StageId) -> Result<StageConfig, ConfigError> {
    let key = stage.key();
    let mut stages = load_config_file(path)?;
    let config = stages
        .remove(key)
        .ok_or_else(|| ConfigError::MissingStage {
            path: path.to_path_buf(),
            key: key.to_string(),
        })?;
    validate_stage_config(key, &config)?;
    Ok(config)
}

fn validate_stage_config(key: &str, config: &StageConfig) -> Result<(), ConfigError> {
    if config.player.hp == 0 {
        return Err(ConfigError::Invalid {
            key: key.to_string(),
            reason: "player.hp must be > 0".to_string(),
        });
    }
    if !config.stage.goal_x.is_finite() || config.stage.goal_x <= 0.0 {
        return Err(ConfigError::Invalid {
            key: key.to_string(),
            reason: format!("stage.goal_x must be > 0, got {}", config.stage.goal_x),
        });
    }
    Ok(())
}

const fn default_goal_x() -> f32 {
    1180.0
}

const fn default_floor_y() -> f32 {
    350.0
}
