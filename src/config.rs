//! Split configuration
//!
//! Configuration arrives from three places, in priority order: an explicit
//! YAML file (`--config`), command-line flags, and interactive prompts with
//! recommendations derived from the size of the change. The engine itself
//! only reads `max_files_per_partition` and `max_partitions`; the branch
//! executor reads the rest.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("max files per partition must be between 1 and 1000, got {0}")]
    MaxFilesOutOfRange(usize),

    #[error("max partitions must be between 1 and 100, got {0}")]
    MaxPartitionsOutOfRange(usize),

    #[error("branch prefix cannot be empty")]
    EmptyPrefix,

    #[error("branch prefix too long: {0} characters (max 50)")]
    PrefixTooLong(usize),

    #[error("branch prefix contains invalid characters: {0}")]
    InvalidPrefix(String),

    #[error("target branch cannot be empty")]
    EmptyTargetBranch,
}

/// Characters git refuses in branch names
const INVALID_BRANCH_CHARS: &[char] = &[' ', '\t', '~', '^', ':', '?', '*', '[', '\\'];

/// Configuration for one split run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SplitConfig {
    /// Upper bound on changed files per partition
    pub max_files_per_partition: usize,

    /// Partition budget; the plan may exceed it to stay exhaustive
    pub max_partitions: usize,

    /// Prefix for generated branch names
    pub branch_prefix: String,

    /// Branch the partitions will eventually merge into
    pub target_branch: String,

    /// Push created branches to origin
    pub push: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            max_files_per_partition: 15,
            max_partitions: 8,
            branch_prefix: "pr-split".to_string(),
            target_branch: "main".to_string(),
            push: true,
        }
    }
}

impl SplitConfig {
    /// Loads configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: SplitConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Checks value bounds and branch-token legality
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_files_per_partition == 0 || self.max_files_per_partition > 1000 {
            return Err(ConfigError::MaxFilesOutOfRange(self.max_files_per_partition));
        }
        if self.max_partitions == 0 || self.max_partitions > 100 {
            return Err(ConfigError::MaxPartitionsOutOfRange(self.max_partitions));
        }
        if self.branch_prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        if self.branch_prefix.len() > 50 {
            return Err(ConfigError::PrefixTooLong(self.branch_prefix.len()));
        }
        if self.branch_prefix.contains(INVALID_BRANCH_CHARS) {
            return Err(ConfigError::InvalidPrefix(self.branch_prefix.clone()));
        }
        if self.target_branch.is_empty() {
            return Err(ConfigError::EmptyTargetBranch);
        }
        Ok(())
    }

    /// Advertised capacity: partitions × files per partition
    pub fn capacity(&self) -> usize {
        self.max_partitions * self.max_files_per_partition
    }
}

/// Recommended settings for a change of a given size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recommendations {
    pub max_files_per_partition: usize,
    pub max_partitions: usize,
    pub total_capacity: usize,
}

/// Derives recommendations from the estimated changed-file count
pub fn recommend(estimated_files: usize) -> Recommendations {
    let defaults = SplitConfig::default();

    let max_files_per_partition = if estimated_files > 500 {
        25
    } else {
        defaults.max_files_per_partition
    };

    let max_partitions = (estimated_files / defaults.max_files_per_partition + 1)
        .max(defaults.max_partitions)
        .min(50);

    Recommendations {
        max_files_per_partition,
        max_partitions,
        total_capacity: max_partitions * max_files_per_partition,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SplitConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_files_per_partition, 15);
        assert_eq!(config.max_partitions, 8);
        assert_eq!(config.capacity(), 120);
    }

    #[test]
    fn bounds_are_enforced() {
        let mut config = SplitConfig {
            max_files_per_partition: 0,
            ..SplitConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MaxFilesOutOfRange(0))
        ));

        config.max_files_per_partition = 1001;
        assert!(config.validate().is_err());

        config.max_files_per_partition = 15;
        config.max_partitions = 101;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MaxPartitionsOutOfRange(101))
        ));
    }

    #[test]
    fn prefix_rules() {
        let mut config = SplitConfig {
            branch_prefix: String::new(),
            ..SplitConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptyPrefix)));

        config.branch_prefix = "has space".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPrefix(_))));

        config.branch_prefix = "bad~char".to_string();
        assert!(config.validate().is_err());

        config.branch_prefix = "p".repeat(51);
        assert!(matches!(config.validate(), Err(ConfigError::PrefixTooLong(51))));

        config.branch_prefix = "feature/split".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_yaml_config() {
        let yaml = r#"
max-files-per-partition: 20
max-partitions: 10
branch-prefix: my-split
target-branch: develop
"#;

        let config: SplitConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.max_files_per_partition, 20);
        assert_eq!(config.max_partitions, 10);
        assert_eq!(config.branch_prefix, "my-split");
        assert_eq!(config.target_branch, "develop");
        assert!(config.push);
    }

    #[test]
    fn partial_yaml_uses_defaults() {
        let config: SplitConfig = serde_yaml::from_str("branch-prefix: x\n").unwrap();
        assert_eq!(config.max_files_per_partition, 15);
        assert_eq!(config.branch_prefix, "x");
    }

    #[test]
    fn load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("split.yaml");
        fs::write(&path, "max-partitions: 0\n").unwrap();

        assert!(SplitConfig::load(&path).is_err());
    }

    #[test]
    fn recommendations_scale_with_file_count() {
        let small = recommend(20);
        assert_eq!(small.max_files_per_partition, 15);
        assert_eq!(small.max_partitions, 8);

        let medium = recommend(200);
        assert_eq!(medium.max_partitions, 14);

        let large = recommend(600);
        assert_eq!(large.max_files_per_partition, 25);
        assert_eq!(large.max_partitions, 41);

        let huge = recommend(10_000);
        assert_eq!(huge.max_partitions, 50);
    }
}
