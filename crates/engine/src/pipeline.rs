//! Fixed-size worker pool over a closed, pre-filled queue.
//!
//! ```text
//!   files ──> [job queue, closed] ──> worker 1..N ──> [result channel] ──> collector
//!                                      │    ▲
//!                                      ▼    │
//!                               RuleSet (mutex)  + own Classifier
//! ```
//!
//! Workers interleave freely, so the report is in arrival order. Every input
//! yields exactly one record before [`analyse`] returns.

use crossbeam_channel::{Receiver, Sender};
use lfs_audit_classifier::Classifier;
use lfs_audit_rules::RuleSet;
use std::fs;
use std::thread;
use std::time::Instant;

use crate::config::AuditContext;
use crate::verdict::{AnalysisReport, FileInput, FileOutcome, Record, Verdict};

type Job<'a> = (usize, &'a FileInput);

pub fn analyse(files: &[FileInput], rules: &RuleSet, context: &AuditContext) -> AnalysisReport {
    if files.is_empty() {
        return AnalysisReport::default();
    }

    let workers = context.config().worker_count();
    let oversize_bytes = context.config().oversize_bytes;
    let started = Instant::now();

    let (job_tx, job_rx) = crossbeam_channel::bounded(files.len());
    for job in files.iter().enumerate() {
        job_tx
            .send(job)
            .unwrap_or_else(|_| unreachable!("job queue receiver is held locally"));
    }
    drop(job_tx);

    let (result_tx, result_rx) = crossbeam_channel::unbounded();
    let records = thread::scope(|scope| {
        for _ in 0..workers {
            let jobs = job_rx.clone();
            let results = result_tx.clone();
            let classifier = context.classifier();
            scope.spawn(move || run_worker(jobs, results, rules, classifier, oversize_bytes));
        }
        drop(result_tx);
        result_rx.iter().collect::<Vec<_>>()
    });

    log::debug!(
        "Analysed {} files in {} with {workers} workers ({} ms)",
        records.len(),
        rules.root().display(),
        started.elapsed().as_millis()
    );
    AnalysisReport::new(records)
}

fn run_worker(
    jobs: Receiver<Job<'_>>,
    results: Sender<Record>,
    rules: &RuleSet,
    mut classifier: Classifier,
    oversize_bytes: u64,
) {
    for (scan_index, file) in jobs.iter() {
        let outcome = evaluate(file, rules, &mut classifier, oversize_bytes);
        if results.send(Record { scan_index, outcome }).is_err() {
            break;
        }
    }
}

/// Rule lookup and classification for one file.
pub fn evaluate(
    file: &FileInput,
    rules: &RuleSet,
    classifier: &mut Classifier,
    oversize_bytes: u64,
) -> FileOutcome {
    let failed = || FileOutcome::Failed {
        path: file.absolute_path.clone(),
    };

    match fs::metadata(&file.absolute_path) {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => {
            log::warn!("Not a regular file: {}", file.absolute_path.display());
            return failed();
        }
        Err(err) => {
            log::warn!("Unable to analyse {}: {err}", file.absolute_path.display());
            return failed();
        }
    }

    let rule = rules.latest_match(&file.absolute_path);
    match classifier.try_classify(&file.absolute_path) {
        Ok(class) => FileOutcome::Analysed(Verdict::decide(
            file.clone(),
            class,
            rule.as_ref(),
            oversize_bytes,
        )),
        Err(err) => {
            log::warn!("Unable to analyse: {err}");
            failed()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuditConfig;
    use crate::verdict::ContentClass;
    use lfs_audit_classifier::Algorithm;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::collections::HashMap;
    use std::path::Path;
    use tempfile::tempdir;

    fn input(root: &Path, relative: &str, contents: &[u8]) -> FileInput {
        let absolute_path = root.join(relative);
        if let Some(parent) = absolute_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&absolute_path, contents).unwrap();
        FileInput {
            absolute_path,
            relative_path: relative.to_string(),
            size_bytes: contents.len() as u64,
        }
    }

    fn context(threads: usize) -> AuditContext {
        AuditContext::new(AuditConfig {
            threads,
            oversize_bytes: 64,
            use_extension_shortcut: false,
            algorithm: Algorithm::BomBased,
            ..AuditConfig::default()
        })
    }

    fn fixture(root: &Path) -> Vec<FileInput> {
        let mut files = Vec::new();
        for i in 0..25 {
            files.push(input(root, &format!("src/file{i}.txt"), b"plain text\n"));
            files.push(input(root, &format!("art/img{i}.png"), &[0x89, b'P', b'N', b'G', 0, 0]));
        }
        files.push(input(root, "big/log.txt", &[b'x'; 100]));
        files.push(input(root, "lfs/notes.txt", b"small"));
        files
    }

    #[test]
    fn every_input_yields_one_record() {
        let dir = tempdir().unwrap();
        let files = fixture(dir.path());
        let rules = RuleSet::parse(dir.path(), "*.png filter=lfs diff=lfs merge=lfs -text\n");
        let report = analyse(&files, &rules, &context(4));

        assert_eq!(report.len(), files.len());
        let mut indices: Vec<usize> = report.records().iter().map(|r| r.scan_index).collect();
        indices.sort_unstable();
        assert_eq!(indices, (0..files.len()).collect::<Vec<_>>());
        assert_eq!(report.problem_count(), 1);
        let mismatch = report.mismatches().next().unwrap();
        assert_eq!(mismatch.file.relative_path, "big/log.txt");
        assert!(mismatch.oversize);
    }

    #[test]
    fn vanished_file_becomes_failure() {
        let dir = tempdir().unwrap();
        let mut files = fixture(dir.path());
        let gone = input(dir.path(), "gone.bin", b"\0\0");
        fs::remove_file(&gone.absolute_path).unwrap();
        files.push(gone.clone());

        let rules = RuleSet::parse(dir.path(), "*.png filter=lfs diff=lfs merge=lfs -text\n");
        let report = analyse(&files, &rules, &context(3));
        assert_eq!(report.len(), files.len());
        assert_eq!(report.failure_count(), 1);
        let failed = report
            .in_scan_order()
            .last()
            .map(|record| record.outcome.clone())
            .unwrap();
        assert_eq!(
            failed,
            FileOutcome::Failed {
                path: gone.absolute_path
            }
        );
    }

    #[test]
    fn lfs_rule_on_small_text_is_mismatch() {
        let dir = tempdir().unwrap();
        let file = input(dir.path(), "lfs/notes.txt", b"small");
        let rules = RuleSet::parse(dir.path(), "lfs/** filter=lfs diff=lfs merge=lfs -text\n");
        let mut classifier = context(1).classifier();
        let outcome = evaluate(&file, &rules, &mut classifier, 64);
        let verdict = outcome.verdict().unwrap();
        assert!(verdict.tracked);
        assert!(!verdict.consistent);
        assert_eq!(verdict.content, ContentClass::Text);
    }

    #[test]
    fn empty_input_returns_empty_report() {
        let rules = RuleSet::parse("/repo", "");
        assert!(analyse(&[], &rules, &context(4)).is_empty());
    }

    fn multiset(report: &AnalysisReport) -> HashMap<Record, usize> {
        let mut counts = HashMap::new();
        for record in report.records() {
            *counts.entry(record.clone()).or_insert(0) += 1;
        }
        counts
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn worker_count_does_not_change_results(threads in 1usize..=10) {
            let dir = tempdir().unwrap();
            let files = fixture(dir.path());
            let rules = RuleSet::parse(dir.path(), "*.png filter=lfs diff=lfs merge=lfs -text\n");
            let baseline = analyse(&files, &rules, &context(1));
            let report = analyse(&files, &rules, &context(threads));
            prop_assert_eq!(multiset(&report), multiset(&baseline));
        }
    }
}
