use console::{style, Color, StyledObject};
use lfs_audit_engine::{
    AuditConfig, ContentClass, FileOutcome, ReconcileOutcome, ReconcileStatus, Reporter,
    RepositorySession, Verdict,
};
use std::io::{self, Write};

const RULER: &str =
    "----------------------------------------------------------------------------------------------------";
const HEADER: &str = " OK | TRK | TYPE | FILENAME (size)";
const MIB: f64 = 1024.0 * 1024.0;

/// Prints one table per repository.
pub(crate) struct TablePresenter<W: Write> {
    out: W,
    colored: bool,
}

impl TablePresenter<io::Stdout> {
    pub(crate) fn stdout() -> Self {
        Self::new(io::stdout(), console::colors_enabled())
    }
}

impl<W: Write> TablePresenter<W> {
    pub(crate) fn new(out: W, colored: bool) -> Self {
        Self { out, colored }
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> W {
        self.out
    }

    fn paint<D>(&self, value: D, color: Color) -> StyledObject<D> {
        style(value).fg(color).force_styling(self.colored)
    }

    fn line(&mut self, text: impl std::fmt::Display) {
        if let Err(err) = writeln!(self.out, "{text}") {
            if err.kind() != io::ErrorKind::BrokenPipe {
                log::debug!("Failed to write report line: {err}");
            }
        }
    }

    fn flush(&mut self) {
        if let Err(err) = self.out.flush() {
            if err.kind() != io::ErrorKind::BrokenPipe {
                log::debug!("Failed to flush report: {err}");
            }
        }
    }

    fn render(&mut self, session: &RepositorySession, verbose: bool) {
        let report = session.report();
        let problems = report.problem_count();
        if problems == 0 {
            let line = format!("- Repository '{}': no problems", session.root().display());
            let painted = self.paint(line, Color::Green);
            self.line(painted);
            return;
        }

        self.line(RULER);
        self.line(format!("Repo: {}", session.root().display()));
        self.line(RULER);
        self.line(HEADER);
        self.line(RULER);
        for record in report.in_scan_order() {
            match &record.outcome {
                FileOutcome::Failed { path } => {
                    let line = format!("ERR | unable to analyse file: {}", path.display());
                    let painted = self.paint(line, Color::Red);
                    self.line(painted);
                }
                FileOutcome::Analysed(verdict) if verdict.consistent => {
                    if verbose {
                        self.line(row(" OK", verdict));
                    }
                }
                FileOutcome::Analysed(verdict) => {
                    let painted = self.paint(row("ERR", verdict), Color::Yellow);
                    self.line(painted);
                }
            }
        }
        self.line(RULER);
        self.line(HEADER);
        self.line(RULER);
        self.line("");
        let summary = format!("{problems} problems detected");
        let painted = self.paint(summary, Color::Yellow);
        self.line(painted);
    }
}

impl<W: Write> Reporter for TablePresenter<W> {
    fn present(&mut self, session: &RepositorySession, config: &AuditConfig) {
        self.render(session, config.verbose);
        self.flush();
    }

    fn reconciled(&mut self, session: &RepositorySession, outcome: &ReconcileOutcome) {
        if outcome.status == ReconcileStatus::Aborted {
            let line = format!("Repair aborted for {}", session.root().display());
            let painted = self.paint(line, Color::Yellow);
            self.line(painted);
        }
        if outcome.save_error.is_some() {
            let line = format!(
                "{} could not be written",
                session.rules().attributes_path().display()
            );
            let painted = self.paint(line, Color::Red);
            self.line(painted);
        }
    }
}

fn row(status: &str, verdict: &Verdict) -> String {
    let tracked = if verdict.tracked { "TRK" } else { "---" };
    format!(
        "{status} | {tracked} | {} | {} ({:.2} MiB)",
        type_label(verdict),
        verdict.file.absolute_path.display(),
        verdict.file.size_bytes as f64 / MIB
    )
}

pub(crate) fn type_label(verdict: &Verdict) -> &'static str {
    match verdict.content {
        ContentClass::Text if verdict.oversize => "OVSZ",
        ContentClass::Text => "TEXT",
        ContentClass::Binary => "BIN ",
        ContentClass::Ignored => "IGN ",
    }
}
