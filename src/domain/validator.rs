//! Plan validation
//!
//! Re-checks the assembled plan against the contract the executor relies
//! on: every changed file in exactly one partition, size bounds honoured
//! (unless the user approved an oversize circular group), prerequisites
//! strictly earlier, and every dependency edge pointing at an earlier
//! partition. A Fail here after assembly indicates an assembler bug.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::change::{Dependency, FileChange};
use super::partition::Plan;

/// Outcome class of one validation check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValidationStatus {
    Pass,
    Warn,
    Fail,
}

/// Which contract a check covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationKind {
    Exhaustiveness,
    Duplication,
    NonEmpty,
    SizeBound,
    Prerequisites,
    Ordering,
}

impl ValidationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationKind::Exhaustiveness => "EXHAUSTIVENESS",
            ValidationKind::Duplication => "DUPLICATION",
            ValidationKind::NonEmpty => "NON_EMPTY",
            ValidationKind::SizeBound => "SIZE_BOUND",
            ValidationKind::Prerequisites => "PREREQUISITES",
            ValidationKind::Ordering => "ORDERING",
        }
    }
}

/// Result of a single check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub kind: ValidationKind,
    pub status: ValidationStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl ValidationResult {
    fn pass(kind: ValidationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: ValidationStatus::Pass,
            message: message.into(),
            details: vec![],
        }
    }

    fn warn(kind: ValidationKind, message: impl Into<String>, details: Vec<String>) -> Self {
        Self {
            kind,
            status: ValidationStatus::Warn,
            message: message.into(),
            details,
        }
    }

    fn fail(kind: ValidationKind, message: impl Into<String>, details: Vec<String>) -> Self {
        Self {
            kind,
            status: ValidationStatus::Fail,
            message: message.into(),
            details,
        }
    }
}

/// The full set of check results for one plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub results: Vec<ValidationResult>,
}

impl ValidationReport {
    /// True when no check failed; warnings do not block
    pub fn all_passed(&self) -> bool {
        self.results
            .iter()
            .all(|r| r.status != ValidationStatus::Fail)
    }

    pub fn has_warnings(&self) -> bool {
        self.results
            .iter()
            .any(|r| r.status == ValidationStatus::Warn)
    }

    pub fn counts(&self) -> (usize, usize, usize) {
        let mut pass = 0;
        let mut warn = 0;
        let mut fail = 0;
        for result in &self.results {
            match result.status {
                ValidationStatus::Pass => pass += 1,
                ValidationStatus::Warn => warn += 1,
                ValidationStatus::Fail => fail += 1,
            }
        }
        (pass, warn, fail)
    }
}

/// Validates a plan against the original change set and edges
pub fn validate_plan(
    plan: &Plan,
    changes: &[FileChange],
    dependencies: &[Dependency],
) -> ValidationReport {
    let results = vec![
        check_exhaustiveness(plan, changes),
        check_duplication(plan),
        check_non_empty(plan),
        check_size_bound(plan),
        check_prerequisites(plan),
        check_ordering(plan, dependencies),
    ];

    ValidationReport { results }
}

/// Every changed file appears in some partition
fn check_exhaustiveness(plan: &Plan, changes: &[FileChange]) -> ValidationResult {
    let planned: BTreeMap<&str, usize> = owner_map(plan);

    let missing: Vec<String> = changes
        .iter()
        .filter(|c| c.is_changed && !planned.contains_key(c.path.as_str()))
        .map(|c| c.path.clone())
        .collect();

    if missing.is_empty() {
        ValidationResult::pass(
            ValidationKind::Exhaustiveness,
            format!("all {} changed files are partitioned", planned.len()),
        )
    } else {
        ValidationResult::fail(
            ValidationKind::Exhaustiveness,
            format!("{} changed files missing from the plan", missing.len()),
            missing,
        )
    }
}

/// No path appears in more than one partition
fn check_duplication(plan: &Plan) -> ValidationResult {
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    let mut duplicates = Vec::new();

    for partition in &plan.partitions {
        for path in partition.paths() {
            if let Some(first) = seen.insert(path, partition.id) {
                duplicates.push(format!(
                    "{} appears in partitions {} and {}",
                    path, first, partition.id
                ));
            }
        }
    }

    if duplicates.is_empty() {
        ValidationResult::pass(ValidationKind::Duplication, "no file is partitioned twice")
    } else {
        ValidationResult::fail(
            ValidationKind::Duplication,
            format!("{} duplicated files", duplicates.len()),
            duplicates,
        )
    }
}

/// Every partition carries at least one changed file
fn check_non_empty(plan: &Plan) -> ValidationResult {
    let empty: Vec<String> = plan
        .partitions
        .iter()
        .filter(|p| !p.files.iter().any(|f| f.is_changed))
        .map(|p| format!("partition {} has no changed files", p.id))
        .collect();

    if empty.is_empty() {
        ValidationResult::pass(ValidationKind::NonEmpty, "no empty partitions")
    } else {
        ValidationResult::fail(
            ValidationKind::NonEmpty,
            format!("{} empty partitions", empty.len()),
            empty,
        )
    }
}

/// Partitions respect the size bound unless the user approved otherwise
fn check_size_bound(plan: &Plan) -> ValidationResult {
    let limit = plan.metadata.max_files_per_partition;
    let mut approved = Vec::new();
    let mut violations = Vec::new();

    for partition in &plan.partitions {
        if partition.len() > limit {
            let note = format!(
                "partition {} has {} files (limit {})",
                partition.id,
                partition.len(),
                limit
            );
            if partition.oversize_approved {
                approved.push(note);
            } else {
                violations.push(note);
            }
        }
    }

    if !violations.is_empty() {
        ValidationResult::fail(
            ValidationKind::SizeBound,
            format!("{} partitions exceed the size limit", violations.len()),
            violations,
        )
    } else if !approved.is_empty() {
        ValidationResult::warn(
            ValidationKind::SizeBound,
            format!("{} user-approved oversize partitions", approved.len()),
            approved,
        )
    } else {
        ValidationResult::pass(
            ValidationKind::SizeBound,
            format!("all partitions within {} files", limit),
        )
    }
}

/// Prerequisite ids exist and are strictly smaller
fn check_prerequisites(plan: &Plan) -> ValidationResult {
    let ids: Vec<usize> = plan.partitions.iter().map(|p| p.id).collect();
    let mut issues = Vec::new();

    for partition in &plan.partitions {
        for &prereq in &partition.prerequisites {
            if prereq >= partition.id {
                issues.push(format!(
                    "partition {} depends on later partition {}",
                    partition.id, prereq
                ));
            } else if !ids.contains(&prereq) {
                issues.push(format!(
                    "partition {} depends on missing partition {}",
                    partition.id, prereq
                ));
            }
        }
    }

    if issues.is_empty() {
        ValidationResult::pass(
            ValidationKind::Prerequisites,
            "all prerequisites point at earlier partitions",
        )
    } else {
        ValidationResult::fail(
            ValidationKind::Prerequisites,
            format!("{} prerequisite violations", issues.len()),
            issues,
        )
    }
}

/// Every live edge crosses from a later partition into an earlier one
fn check_ordering(plan: &Plan, dependencies: &[Dependency]) -> ValidationResult {
    let owner = owner_map(plan);
    let mut issues = Vec::new();

    for dep in dependencies {
        let (Some(&from_id), Some(&to_id)) =
            (owner.get(dep.from.as_str()), owner.get(dep.to.as_str()))
        else {
            continue;
        };

        if from_id != to_id && to_id > from_id {
            issues.push(format!(
                "{} (partition {}) depends on {} (partition {})",
                dep.from, from_id, dep.to, to_id
            ));
        }
    }

    if issues.is_empty() {
        ValidationResult::pass(
            ValidationKind::Ordering,
            "all dependencies point at earlier partitions",
        )
    } else {
        ValidationResult::fail(
            ValidationKind::Ordering,
            format!("{} edges violate partition order", issues.len()),
            issues,
        )
    }
}

fn owner_map(plan: &Plan) -> BTreeMap<&str, usize> {
    let mut owner = BTreeMap::new();
    for partition in &plan.partitions {
        for path in partition.paths() {
            owner.entry(path).or_insert(partition.id);
        }
    }
    owner
}
