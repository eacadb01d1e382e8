use lfs_audit_rules::RuleSet;
use std::path::Path;

use crate::config::AuditContext;
use crate::discovery::RepositoryScan;
use crate::pipeline;
use crate::reconcile::{self, Decider, ReconcileOutcome};
use crate::verdict::{AnalysisReport, FileInput};

/// One repository's rules, files and latest analysis.
///
/// Sessions share nothing with each other, so several can be analysed on
/// different threads.
#[derive(Debug)]
pub struct RepositorySession {
    rules: RuleSet,
    files: Vec<FileInput>,
    report: AnalysisReport,
}

impl RepositorySession {
    pub fn new(rules: RuleSet, files: Vec<FileInput>) -> Self {
        Self {
            rules,
            files,
            report: AnalysisReport::default(),
        }
    }

    /// Load the repository's attributes file and take ownership of its files.
    pub fn from_scan(scan: RepositoryScan) -> Self {
        let rules = RuleSet::load(&scan.root);
        Self::new(rules, scan.files)
    }

    pub fn root(&self) -> &Path {
        self.rules.root()
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn files(&self) -> &[FileInput] {
        &self.files
    }

    pub fn report(&self) -> &AnalysisReport {
        &self.report
    }

    /// Run the pipeline over every file, replacing the previous report.
    pub fn analyse(&mut self, context: &AuditContext) -> &AnalysisReport {
        self.report = pipeline::analyse(&self.files, &self.rules, context);
        &self.report
    }

    /// Mismatches plus failures in the latest report.
    pub fn problem_count(&self) -> usize {
        self.report.problem_count()
    }

    pub fn reconcile(&self, dry_run: bool, decider: &mut dyn Decider) -> ReconcileOutcome {
        reconcile::reconcile(&self.rules, &self.report, dry_run, decider)
    }
}
