use lfs_audit_classifier::FileClass;
use lfs_audit_rules::{Rule, RuleKind};
use serde::Serialize;
use std::path::PathBuf;

/// A file handed over by repository discovery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FileInput {
    pub absolute_path: PathBuf,
    /// Forward-slash path relative to the repository root.
    pub relative_path: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentClass {
    Text,
    Binary,
    /// Governed by a rule that is neither text nor LFS.
    Ignored,
}

/// Consistency outcome for one file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Verdict {
    pub file: FileInput,
    pub consistent: bool,
    /// The governing rule routes the file through LFS.
    pub tracked: bool,
    pub content: ContentClass,
    /// Size reached the oversize threshold.
    pub oversize: bool,
}

impl Verdict {
    /// The decision table.
    ///
    /// | content | rule        | tracked | consistent  |
    /// |---------|-------------|---------|-------------|
    /// | text    | none / text | no      | not oversize|
    /// | text    | lfs         | yes     | oversize    |
    /// | binary  | none / text | no      | no          |
    /// | binary  | lfs         | yes     | yes         |
    /// | any     | other kind  | no      | yes         |
    pub fn decide(
        file: FileInput,
        class: FileClass,
        rule: Option<&Rule>,
        oversize_bytes: u64,
    ) -> Self {
        let oversize = file.size_bytes >= oversize_bytes;
        let kind = rule.map(Rule::kind);
        let (tracked, consistent, content) = match (class, kind) {
            (FileClass::Text, None | Some(RuleKind::Text)) => (false, !oversize, ContentClass::Text),
            (FileClass::Text, Some(RuleKind::Lfs)) => (true, oversize, ContentClass::Text),
            (FileClass::Binary, None | Some(RuleKind::Text)) => {
                (false, false, ContentClass::Binary)
            }
            (FileClass::Binary, Some(RuleKind::Lfs)) => (true, true, ContentClass::Binary),
            (_, Some(RuleKind::Comment | RuleKind::Unknown)) => {
                (false, true, ContentClass::Ignored)
            }
        };
        Self {
            file,
            consistent,
            tracked,
            content,
            oversize,
        }
    }

    pub fn is_mismatch(&self) -> bool {
        !self.consistent
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Analysed(Verdict),
    /// The file vanished or could not be read while being analysed.
    Failed { path: PathBuf },
}

impl FileOutcome {
    /// Failures count as mismatches.
    pub fn is_problem(&self) -> bool {
        match self {
            FileOutcome::Analysed(verdict) => verdict.is_mismatch(),
            FileOutcome::Failed { .. } => true,
        }
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        match self {
            FileOutcome::Analysed(verdict) => Some(verdict),
            FileOutcome::Failed { .. } => None,
        }
    }
}

/// A pipeline result tagged with its input's position in scan order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    pub scan_index: usize,
    pub outcome: FileOutcome,
}

/// Everything the pipeline produced for one repository, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct AnalysisReport {
    records: Vec<Record>,
}

impl AnalysisReport {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Records in the order workers finished them.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn in_scan_order(&self) -> Vec<&Record> {
        let mut ordered: Vec<&Record> = self.records.iter().collect();
        ordered.sort_by_key(|record| record.scan_index);
        ordered
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Inconsistent verdicts plus failures.
    pub fn problem_count(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.outcome.is_problem())
            .count()
    }

    pub fn failure_count(&self) -> usize {
        self.records
            .iter()
            .filter(|record| matches!(record.outcome, FileOutcome::Failed { .. }))
            .count()
    }

    pub fn mismatches(&self) -> impl Iterator<Item = &Verdict> {
        self.in_scan_order()
            .into_iter()
            .filter_map(|record| record.outcome.verdict())
            .filter(|verdict| verdict.is_mismatch())
    }
}
