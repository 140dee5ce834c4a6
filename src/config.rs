//! Configuration
//!
//! Every section has defaults, so a YAML file only needs the keys it changes.

use crate::error::MentorResult;
use crate::layout::{LayoutConfig, ViewportConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Mentorship API endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub mentors_path: String,
    pub mentees_path: String,
    pub tags_path: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            mentors_path: "/api/mentors".to_string(),
            mentees_path: "/api/mentees".to_string(),
            tags_path: "/api/tags/assign".to_string(),
            timeout_secs: 15,
        }
    }
}

impl ApiConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Refresh behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Background refresh period in seconds. `None` disables polling.
    pub poll_interval_secs: Option<u64>,
    /// Shared marker file for cross-process change notification.
    /// `None` keeps notifications inside the current process.
    pub marker_path: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: Some(60),
            marker_path: None,
        }
    }
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub sync: SyncConfig,
    pub layout: LayoutConfig,
    pub viewport: ViewportConfig,
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> MentorResult<Self> {
        let mut config: Config = serde_yaml::from_str(yaml)?;
        config.viewport = config.viewport.normalized();
        Ok(config)
    }

    /// Load from a YAML file
    pub fn load(path: impl AsRef<Path>) -> MentorResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}
