//! Partition and plan value types
//!
//! A `Partition` maps 1-to-1 onto a downstream branch. Partitions are
//! immutable once emitted by the assembler; ids are dense, 1-based, and
//! reflect emission order, so a partition's prerequisites always carry
//! strictly smaller ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::change::FileChange;

/// A group of changed files destined for one branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partition {
    /// 1-based id, assigned in emission order
    pub id: usize,

    /// Branch-name slug, `[a-z0-9][a-z0-9-]*`, at most 30 chars
    pub name: String,

    /// Human-readable summary
    pub description: String,

    /// The changed files allocated here, sorted by path
    pub files: Vec<FileChange>,

    /// Ids of earlier partitions this one depends on, ascending
    pub prerequisites: Vec<usize>,

    /// True when the user approved exceeding the size bound for a
    /// circular group
    #[serde(default)]
    pub oversize_approved: bool,
}

impl Partition {
    /// Iterates over the member file paths
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.path.as_str())
    }

    /// Number of files in the partition
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The branch name the executor will create for this partition
    pub fn branch_name(&self, prefix: &str) -> String {
        format!("{}-{}-{}", prefix, self.id, self.name)
    }
}

/// Summary facts about a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanMetadata {
    pub total_files: usize,
    pub total_partitions: usize,
    pub max_files_per_partition: usize,
    pub created_at: DateTime<Utc>,
}

/// The complete, ordered partitioning of a change set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub partitions: Vec<Partition>,
    pub metadata: PlanMetadata,
}

impl Plan {
    /// Total number of changed files across all partitions
    pub fn file_count(&self) -> usize {
        self.partitions.iter().map(Partition::len).sum()
    }

    /// Looks up a partition by id
    pub fn partition(&self, id: usize) -> Option<&Partition> {
        self.partitions.iter().find(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::change::ChangeType;

    fn partition(id: usize, paths: &[&str]) -> Partition {
        Partition {
            id,
            name: format!("part-{}", id),
            description: format!("Part {}", id),
            files: paths
                .iter()
                .map(|p| FileChange::changed(*p, ChangeType::Modify))
                .collect(),
            prerequisites: vec![],
            oversize_approved: false,
        }
    }

    #[test]
    fn branch_name_combines_prefix_id_and_slug() {
        let p = partition(3, &["a.ts"]);
        assert_eq!(p.branch_name("pr-split"), "pr-split-3-part-3");
    }

    #[test]
    fn plan_file_count_sums_partitions() {
        let plan = Plan {
            partitions: vec![partition(1, &["a", "b"]), partition(2, &["c"])],
            metadata: PlanMetadata {
                total_files: 3,
                total_partitions: 2,
                max_files_per_partition: 15,
                created_at: Utc::now(),
            },
        };

        assert_eq!(plan.file_count(), 3);
        assert_eq!(plan.partition(2).unwrap().len(), 1);
        assert!(plan.partition(9).is_none());
    }

    #[test]
    fn serde_roundtrip() {
        let plan = Plan {
            partitions: vec![partition(1, &["a.ts"])],
            metadata: PlanMetadata {
                total_files: 1,
                total_partitions: 1,
                max_files_per_partition: 15,
                created_at: Utc::now(),
            },
        };

        let json = serde_json::to_string(&plan).unwrap();
        assert!(json.contains("\"maxFilesPerPartition\":15"));

        let parsed: Plan = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, plan);
    }
}
