use dialoguer::{Confirm, Select};
use lfs_audit_engine::{Decider, RepairAction, Verdict};
use lfs_audit_rules::Rule;
use std::path::Path;

use crate::presenter::type_label;

/// Asks on the terminal. Any prompt failure (no terminal, closed input)
/// declines the repair or aborts the walk.
pub(crate) struct PromptDecider;

impl Decider for PromptDecider {
    fn confirm_repair(&mut self, repository: &Path, problems: usize) -> bool {
        let prompt = format!(
            "{problems} problems in {}. Try to repair the attributes file?",
            repository.display()
        );
        match Confirm::new().with_prompt(prompt).default(false).interact() {
            Ok(answer) => answer,
            Err(err) => {
                log::warn!("Unable to prompt for repair: {err}");
                false
            }
        }
    }

    fn choose(
        &mut self,
        verdict: &Verdict,
        current: Option<&Rule>,
        actions: &[RepairAction],
    ) -> RepairAction {
        let mut prompt = format!(
            "{} [{}]",
            verdict.file.absolute_path.display(),
            type_label(verdict).trim_end()
        );
        if let Some(rule) = current {
            prompt.push_str(&format!(" governed by '{}'", rule.raw_line()));
        }

        let labels: Vec<&str> = actions.iter().map(|action| action.label()).collect();
        match Select::new()
            .with_prompt(prompt)
            .items(&labels)
            .default(0)
            .interact()
        {
            Ok(index) => actions.get(index).copied().unwrap_or(RepairAction::Skip),
            Err(err) => {
                log::warn!("Unable to prompt for an action: {err}");
                RepairAction::Abort
            }
        }
    }
}

/// Declines every repair; used for machine-readable runs.
pub(crate) struct DeclineDecider;

impl Decider for DeclineDecider {
    fn confirm_repair(&mut self, _repository: &Path, _problems: usize) -> bool {
        false
    }

    fn choose(
        &mut self,
        _verdict: &Verdict,
        _current: Option<&Rule>,
        _actions: &[RepairAction],
    ) -> RepairAction {
        RepairAction::Skip
    }
}
