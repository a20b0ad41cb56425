use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::BotError;
use crate::release::version::IncrementPolicy;

pub const PENDING_LABEL: &str = "createrelease:pending";
pub const MERGED_LABEL: &str = "createrelease:merged";
pub const TAGGER_NAME: &str = "Create Release Action";
pub const TAGGER_EMAIL: &str = "githubaction@github.com";
pub const RELEASE_NAME_PREFIX: &str = "Release ";
pub const RELEASE_COMMENT_PREFIX: &str = "Release is at:";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub labels: LabelsConfig,
    pub tagger: TaggerConfig,
    pub release: ReleaseConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelsConfig {
    /// Marks a pull request that should be released once merged.
    pub pending: String,
    /// Replaces `pending` once the release sequence has started.
    pub merged: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggerConfig {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseConfig {
    pub name_prefix: String,
    pub comment_prefix: String,
    pub increment: IncrementPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        LabelsConfig {
            pending: PENDING_LABEL.to_string(),
            merged: MERGED_LABEL.to_string(),
        }
    }
}

impl Default for TaggerConfig {
    fn default() -> Self {
        TaggerConfig {
            name: TAGGER_NAME.to_string(),
            email: TAGGER_EMAIL.to_string(),
        }
    }
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        ReleaseConfig {
            name_prefix: RELEASE_NAME_PREFIX.to_string(),
            comment_prefix: RELEASE_COMMENT_PREFIX.to_string(),
            increment: IncrementPolicy::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl BotConfig {
    pub fn load(path: &Path) -> Result<Self, BotError> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))
            .map_err(|e| BotError::Config(format!("{:#}", e)))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, BotError> {
        let config: BotConfig = toml::from_str(content)
            .map_err(|e| BotError::Config(format!("invalid config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), BotError> {
        if self.labels.pending.trim().is_empty() || self.labels.merged.trim().is_empty() {
            return Err(BotError::Config("label names must not be empty".to_string()));
        }
        if self.labels.pending == self.labels.merged {
            return Err(BotError::Config(format!(
                "pending and merged labels must differ (both `{}`)",
                self.labels.pending
            )));
        }
        if self.http.timeout_secs == 0 {
            return Err(BotError::Config("http.timeout_secs must be positive".to_string()));
        }
        Ok(())
    }
}
