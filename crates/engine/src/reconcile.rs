use lfs_audit_rules::{file_extension, Rule, RuleSet, SaveOutcome};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::path::Path;

use crate::verdict::{AnalysisReport, Verdict};

/// One corrective step offered for a mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairAction {
    /// Drop the LFS rule that currently governs the file.
    RemoveRule,
    AddByExtension,
    AddByFileName,
    AddByPath,
    Skip,
    /// Stop walking the remaining mismatches of this repository.
    Abort,
}

impl RepairAction {
    pub const fn label(self) -> &'static str {
        match self {
            RepairAction::RemoveRule => "remove the LFS rule",
            RepairAction::AddByExtension => "track by extension",
            RepairAction::AddByFileName => "track by file name",
            RepairAction::AddByPath => "track by path",
            RepairAction::Skip => "skip",
            RepairAction::Abort => "abort",
        }
    }
}

impl fmt::Display for RepairAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Actions available for a mismatch given the rule that governs it *now*.
///
/// `None` when nothing applies any more: a tracked file whose rule has since
/// been removed, or an untracked file that some rule now matches.
pub fn available_actions(verdict: &Verdict, current: Option<&Rule>) -> Option<Vec<RepairAction>> {
    if verdict.consistent {
        return None;
    }
    match (verdict.tracked, current) {
        (true, Some(_)) => Some(vec![
            RepairAction::RemoveRule,
            RepairAction::Skip,
            RepairAction::Abort,
        ]),
        (false, None) => {
            let mut actions = Vec::with_capacity(5);
            let name = verdict
                .file
                .absolute_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            if file_extension(&name).is_some() {
                actions.push(RepairAction::AddByExtension);
            }
            actions.extend([
                RepairAction::AddByFileName,
                RepairAction::AddByPath,
                RepairAction::Skip,
                RepairAction::Abort,
            ]);
            Some(actions)
        }
        _ => None,
    }
}

/// Source of the reconciler's answers.
pub trait Decider {
    /// The single up-front "attempt automatic repair?" question, asked only
    /// when at least one verdict is inconsistent.
    fn confirm_repair(&mut self, repository: &Path, problems: usize) -> bool;

    /// Pick one of `actions` (never empty) for `verdict`.
    fn choose(
        &mut self,
        verdict: &Verdict,
        current: Option<&Rule>,
        actions: &[RepairAction],
    ) -> RepairAction;
}

/// Accepts the repair and always takes the first offered action.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoDecider;

impl Decider for AutoDecider {
    fn confirm_repair(&mut self, _repository: &Path, _problems: usize) -> bool {
        true
    }

    fn choose(
        &mut self,
        _verdict: &Verdict,
        _current: Option<&Rule>,
        actions: &[RepairAction],
    ) -> RepairAction {
        actions.first().copied().unwrap_or(RepairAction::Skip)
    }
}

/// Replays canned answers; once they run out every mismatch is skipped.
#[derive(Debug, Default, Clone)]
pub struct ScriptedDecider {
    confirm: bool,
    answers: VecDeque<RepairAction>,
    offered: Vec<Vec<RepairAction>>,
    confirmations: usize,
}

impl ScriptedDecider {
    pub fn new(confirm: bool, answers: impl IntoIterator<Item = RepairAction>) -> Self {
        Self {
            confirm,
            answers: answers.into_iter().collect(),
            offered: Vec::new(),
            confirmations: 0,
        }
    }

    /// Action sets offered so far, in order.
    pub fn offered(&self) -> &[Vec<RepairAction>] {
        &self.offered
    }

    /// How often the up-front repair question was asked.
    pub fn confirmations(&self) -> usize {
        self.confirmations
    }
}

impl Decider for ScriptedDecider {
    fn confirm_repair(&mut self, _repository: &Path, _problems: usize) -> bool {
        self.confirmations += 1;
        self.confirm
    }

    fn choose(
        &mut self,
        _verdict: &Verdict,
        _current: Option<&Rule>,
        actions: &[RepairAction],
    ) -> RepairAction {
        self.offered.push(actions.to_vec());
        self.answers.pop_front().unwrap_or(RepairAction::Skip)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileStatus {
    NothingToDo,
    DryRun,
    Declined,
    Completed,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub status: ReconcileStatus,
    /// Mutations accepted and applied to the rule set.
    pub applied: usize,
    pub saved: Option<SaveOutcome>,
    /// Set when the rules were changed in memory but could not be written.
    pub save_error: Option<String>,
}

impl ReconcileOutcome {
    fn skipped(status: ReconcileStatus) -> Self {
        Self {
            status,
            applied: 0,
            saved: None,
            save_error: None,
        }
    }
}

/// Walk the mismatches of one repository in scan order and apply the
/// decider's choices to `rules`; persist once at the end if anything changed.
pub fn reconcile(
    rules: &RuleSet,
    report: &AnalysisReport,
    dry_run: bool,
    decider: &mut dyn Decider,
) -> ReconcileOutcome {
    // Failure markers count as problems but offer nothing to repair.
    let problems = report.mismatches().count();
    if problems == 0 {
        return ReconcileOutcome::skipped(ReconcileStatus::NothingToDo);
    }
    if dry_run {
        log::info!("Dry run: no changes are made to {}", rules.root().display());
        return ReconcileOutcome::skipped(ReconcileStatus::DryRun);
    }
    if !decider.confirm_repair(rules.root(), problems) {
        return ReconcileOutcome::skipped(ReconcileStatus::Declined);
    }

    let mut applied = 0;
    let mut status = ReconcileStatus::Completed;
    for verdict in report.mismatches() {
        let current = rules.latest_match(&verdict.file.absolute_path);
        let Some(actions) = available_actions(verdict, current.as_ref()) else {
            log::debug!(
                "Already resolved: {}",
                verdict.file.absolute_path.display()
            );
            continue;
        };

        let mut choice = decider.choose(verdict, current.as_ref(), &actions);
        if !actions.contains(&choice) {
            log::warn!("Action '{choice}' was not offered; skipping");
            choice = RepairAction::Skip;
        }

        if choice == RepairAction::Abort {
            status = ReconcileStatus::Aborted;
            break;
        }
        if apply(rules, verdict, current.as_ref(), choice) {
            applied += 1;
        }
    }

    let mut outcome = ReconcileOutcome {
        status,
        applied,
        saved: None,
        save_error: None,
    };
    if applied == 0 {
        return outcome;
    }

    match rules.save() {
        Ok(saved) => {
            if let SaveOutcome::Saved { path, .. } = &saved {
                log::info!(
                    "Saved {} ({applied} rules changed). Please check the repository again.",
                    path.display()
                );
            }
            outcome.saved = Some(saved);
        }
        Err(err) => {
            log::error!(
                "Unable to save {}: {err}. Changes were not written; re-run the audit.",
                rules.attributes_path().display()
            );
            outcome.save_error = Some(err.to_string());
        }
    }
    outcome
}

fn apply(rules: &RuleSet, verdict: &Verdict, current: Option<&Rule>, action: RepairAction) -> bool {
    let path = verdict.file.absolute_path.as_path();
    let result = match (action, current) {
        (RepairAction::RemoveRule, Some(rule)) => rules.remove(rule.pattern()),
        (RepairAction::AddByExtension, _) => rules.append_extension(path),
        (RepairAction::AddByFileName, _) => rules.append_file_name(path),
        (RepairAction::AddByPath, _) => rules.append_path(path),
        _ => return false,
    };
    match result {
        Ok(rule) => {
            let verb = if action == RepairAction::RemoveRule {
                "Removed"
            } else {
                "Added"
            };
            log::info!("{verb}: {}", rule.raw_line());
            true
        }
        Err(err) => {
            log::error!("Unable to {action} for {}: {err}", path.display());
            false
        }
    }
}
