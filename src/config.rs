use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::workspace::{DEFAULT_BRANCH_CANDIDATES, DEFAULT_COMMIT_MESSAGE};

#[derive(Debug, Default, Deserialize)]
pub struct MinimalConfig {
    pub default_branches: Option<Vec<String>>,
    pub commit_message: Option<String>,
}

impl MinimalConfig {
    pub fn default_branch_candidates(&self) -> Vec<String> {
        match &self.default_branches {
            Some(branches) if !branches.is_empty() => branches.clone(),
            _ => DEFAULT_BRANCH_CANDIDATES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn default_commit_message(&self) -> &str {
        self.commit_message.as_deref().unwrap_or(DEFAULT_COMMIT_MESSAGE)
    }
}

pub async fn load_minimal_config(root: &Path) -> Result<MinimalConfig> {
    let path = root.join(".swaship.toml");
    if !path.exists() {
        return Ok(MinimalConfig::default());
    }
    let content = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let cfg: MinimalConfig =
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(cfg)
}
