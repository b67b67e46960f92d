use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Longest accepted scoring window, in days.
pub const MAX_CUTOFF_DAYS: u32 = 100 * 365;

/// Engine configuration, loaded from `.invitelist/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub worklist: WorklistConfig,
    #[serde(default)]
    pub lists: ListConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorklistConfig {
    /// Maximum number of pages across all sources of one worklist.
    #[serde(default = "default_articles_limit")]
    pub articles_limit: usize,
}

impl Default for WorklistConfig {
    fn default() -> Self {
        Self {
            articles_limit: default_articles_limit(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListConfig {
    /// Maximum byte length of a trimmed list name.
    #[serde(default = "default_name_max_bytes")]
    pub name_max_bytes: usize,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            name_max_bytes: default_name_max_bytes(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Revisions older than this many days are ignored.
    #[serde(default = "default_cutoff_days")]
    pub cutoff_days: u32,
    /// Pages fetched per revision batch within one source.
    #[serde(default = "default_pages_per_batch")]
    pub pages_per_batch: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            cutoff_days: default_cutoff_days(),
            pages_per_batch: default_pages_per_batch(),
        }
    }
}

impl EngineConfig {
    /// Reject values that would make the engine unusable.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first zero-valued limit, or a cutoff
    /// longer than [`MAX_CUTOFF_DAYS`].
    pub fn validate(&self) -> Result<()> {
        if self.worklist.articles_limit == 0 {
            bail!("worklist.articles_limit must be greater than zero");
        }
        if self.lists.name_max_bytes == 0 {
            bail!("lists.name_max_bytes must be greater than zero");
        }
        if self.scoring.cutoff_days == 0 {
            bail!("scoring.cutoff_days must be greater than zero");
        }
        if self.scoring.cutoff_days > MAX_CUTOFF_DAYS {
            bail!(
                "scoring.cutoff_days must be at most {MAX_CUTOFF_DAYS}, got {}",
                self.scoring.cutoff_days
            );
        }
        if self.scoring.pages_per_batch == 0 {
            bail!("scoring.pages_per_batch must be greater than zero");
        }
        Ok(())
    }
}

/// Load `<root>/.invitelist/config.toml`, falling back to defaults when the
/// file does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read, parsed, or
/// validated.
pub fn load_config(root: &Path) -> Result<EngineConfig> {
    let path = root.join(".invitelist/config.toml");
    if !path.exists() {
        return Ok(EngineConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<EngineConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config {}", path.display()))?;
    Ok(config)
}

const fn default_articles_limit() -> usize {
    300
}

const fn default_name_max_bytes() -> usize {
    255
}

const fn default_cutoff_days() -> u32 {
    3 * 365
}

const fn default_pages_per_batch() -> usize {
    100
}
