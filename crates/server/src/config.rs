//! Runtime configuration, read from a JSON file.
//!
//! Every field has a default, so a missing file or a partial one is valid.
//! Units follow the server tick model: regeneration frequency is in minutes,
//! the crack interval in seconds.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::render::HOST_VERSION;

/// Length of one server tick. Crack intervals are never shorter than this.
pub const TICK: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Damage at or above which a struck block is destroyed.
    pub max_damage: f32,
    pub regen: RegenConfig,
    #[serde(rename = "blockcracks")]
    pub block_cracks: BlockCracksConfig,
    /// Version identifier probed to pick a crack renderer.
    pub host_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegenConfig {
    /// Minutes between regeneration sweeps. Zero or negative disables them.
    pub frequency: i64,
    /// Damage removed from each untouched block per sweep.
    pub amount: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockCracksConfig {
    pub enabled: bool,
    /// Seconds between crack sweeps.
    pub interval: i64,
    /// Observers further than this many blocks away see no cracks.
    pub view_distance: f64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            max_damage: 10.0,
            regen: RegenConfig::default(),
            block_cracks: BlockCracksConfig::default(),
            host_version: HOST_VERSION.to_string(),
        }
    }
}

impl Default for RegenConfig {
    fn default() -> Self {
        Self {
            frequency: 5,
            amount: 1.0,
        }
    }
}

impl Default for BlockCracksConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: 1,
            view_distance: 64.0,
        }
    }
}

impl BreakerConfig {
    /// Load from `path`, falling back to defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("loading config {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).context("parsing config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.max_damage.is_finite() && self.max_damage > 0.0) {
            bail!("max_damage must be positive, got {}", self.max_damage);
        }
        if !(self.regen.amount.is_finite() && self.regen.amount >= 0.0) {
            bail!("regen.amount must be zero or positive, got {}", self.regen.amount);
        }
        if !(self.block_cracks.view_distance.is_finite() && self.block_cracks.view_distance > 0.0) {
            bail!(
                "blockcracks.view_distance must be positive, got {}",
                self.block_cracks.view_distance
            );
        }
        Ok(())
    }

    /// Period of the regeneration sweep, or `None` if it is disabled.
    pub fn regen_period(&self) -> Option<Duration> {
        (self.regen.frequency > 0)
            .then(|| Duration::from_secs((self.regen.frequency as u64).saturating_mul(60)))
    }

    /// Period of the crack sweep, or `None` if cracks are disabled.
    pub fn crack_period(&self) -> Option<Duration> {
        if !self.block_cracks.enabled {
            return None;
        }
        let secs = self.block_cracks.interval.max(0) as u64;
        Some(Duration::from_secs(secs).max(TICK))
    }
}
