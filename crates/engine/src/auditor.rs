use lfs_audit_rules::SaveOutcome;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::{AuditConfig, AuditContext};
use crate::discovery::discover_repositories;
use crate::error::Result;
use crate::reconcile::{Decider, ReconcileOutcome, ReconcileStatus};
use crate::session::RepositorySession;
use crate::verdict::{FileOutcome, Verdict};

/// Presentation hooks called during the final phase of a run.
pub trait Reporter {
    /// Called once per repository with its analysis, before any repair.
    fn present(&mut self, session: &RepositorySession, config: &AuditConfig);

    fn reconciled(&mut self, _session: &RepositorySession, _outcome: &ReconcileOutcome) {}

    fn finished(&mut self, _summary: &RunSummary) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn present(&mut self, _session: &RepositorySession, _config: &AuditConfig) {}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositorySummary {
    pub root: PathBuf,
    pub files: usize,
    /// Problems left after any repair: mismatches plus failures.
    pub mismatches: usize,
    pub failures: usize,
    /// Rule changes applied by the reconciler.
    pub repaired: usize,
    pub saved: bool,
    pub reconcile: ReconcileStatus,
    pub problems: Vec<Verdict>,
    pub unreadable: Vec<PathBuf>,
}

impl RepositorySummary {
    fn new(session: &RepositorySession, outcome: &ReconcileOutcome) -> Self {
        let report = session.report();
        let mut problems = Vec::new();
        let mut unreadable = Vec::new();
        for record in report.in_scan_order() {
            match &record.outcome {
                FileOutcome::Analysed(verdict) if verdict.is_mismatch() => {
                    problems.push(verdict.clone());
                }
                FileOutcome::Analysed(_) => {}
                FileOutcome::Failed { path } => unreadable.push(path.clone()),
            }
        }
        Self {
            root: session.root().to_path_buf(),
            files: session.files().len(),
            mismatches: report.problem_count(),
            failures: report.failure_count(),
            repaired: outcome.applied,
            saved: matches!(outcome.saved, Some(SaveOutcome::Saved { .. })),
            reconcile: outcome.status,
            problems,
            unreadable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub base: PathBuf,
    pub repositories: Vec<RepositorySummary>,
    /// Every repository ended without problems.
    pub success: bool,
}

impl RunSummary {
    pub fn total_problems(&self) -> usize {
        self.repositories.iter().map(|repo| repo.mismatches).sum()
    }
}

/// Runs the three phases over every repository below a base directory:
/// scan, analyse, then present and reconcile.
pub struct Auditor<'a> {
    context: &'a AuditContext,
}

impl<'a> Auditor<'a> {
    pub fn new(context: &'a AuditContext) -> Self {
        Self { context }
    }

    pub fn run(
        &self,
        base: impl AsRef<Path>,
        decider: &mut dyn Decider,
        reporter: &mut dyn Reporter,
    ) -> Result<RunSummary> {
        let base = base.as_ref();
        let started = Instant::now();
        let config = self.context.config();

        log::info!("Scanning {}", base.display());
        let scans = discover_repositories(base)?;
        if scans.is_empty() {
            log::warn!("No git repositories found: {}", base.display());
            let summary = RunSummary {
                base: base.to_path_buf(),
                repositories: Vec::new(),
                success: true,
            };
            reporter.finished(&summary);
            return Ok(summary);
        }
        log::info!(
            "Scan finished: {} repositories ({:.2} s)",
            scans.len(),
            started.elapsed().as_secs_f64()
        );

        let mut sessions: Vec<RepositorySession> =
            scans.into_iter().map(RepositorySession::from_scan).collect();
        for session in &mut sessions {
            session.analyse(self.context);
        }
        log::info!(
            "Analysis finished ({:.2} s)",
            started.elapsed().as_secs_f64()
        );

        let mut repositories = Vec::with_capacity(sessions.len());
        for session in &mut sessions {
            reporter.present(session, config);
            let outcome = session.reconcile(config.dry_run, decider);
            reporter.reconciled(session, &outcome);
            if matches!(outcome.saved, Some(SaveOutcome::Saved { .. })) {
                log::debug!("Re-analysing {} after repair", session.root().display());
                session.analyse(self.context);
            }
            repositories.push(RepositorySummary::new(session, &outcome));
        }

        let summary = RunSummary {
            base: base.to_path_buf(),
            success: repositories.iter().all(|repo| repo.mismatches == 0),
            repositories,
        };
        if summary.success {
            log::info!("Finished: no problems detected");
        } else {
            log::warn!(
                "Finished: {} problems detected. Please check the repositories again.",
                summary.total_problems()
            );
        }
        reporter.finished(&summary);
        Ok(summary)
    }
}
