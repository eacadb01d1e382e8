use anyhow::Result;
use clap::Parser;
use lfs_audit_engine::{
    AuditConfig, AuditContext, Auditor, AutoDecider, Decider, EngineError, NoopReporter, Reporter,
    RunSummary,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

mod flags;
mod presenter;
mod prompt;

use flags::{AlgorithmFlag, ExtensionPresetFlag};
use presenter::TablePresenter;
use prompt::{DeclineDecider, PromptDecider};

/// Exit status when at least one repository still has problems.
pub const EXIT_PROBLEMS: u8 = 1;
/// Exit status for unexpected failures (clap uses 2 for usage errors).
pub const EXIT_INTERNAL: u8 = 3;

fn print_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "lfs-audit")]
#[command(
    about = "Check that Git LFS attribute rules match what files actually contain",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Repository, or a folder containing repositories
    #[arg(value_name = "DIRECTORY")]
    path: Option<PathBuf>,

    /// Same as the positional DIRECTORY
    #[arg(short, long, conflicts_with = "path")]
    directory: Option<PathBuf>,

    /// Text files of at least this many bytes belong in LFS
    #[arg(long, value_name = "BYTES")]
    oversize: Option<u64>,

    /// Number of leading bytes inspected per file
    #[arg(long, value_name = "BYTES")]
    check_bytes: Option<usize>,

    /// Worker threads per repository (clamped to 1..=10)
    #[arg(long, value_name = "N")]
    threads: Option<usize>,

    /// Text/binary detection strategy
    #[arg(long, value_enum)]
    algorithm: Option<AlgorithmFlag>,

    /// Known text/binary extensions used before reading content
    #[arg(long, value_enum)]
    extension_preset: Option<ExtensionPresetFlag>,

    /// Always inspect content, even for known extensions
    #[arg(long)]
    no_extension_shortcut: bool,

    /// Report only; never change an attributes file
    #[arg(long, visible_alias = "simulation")]
    dry_run: bool,

    /// Enable verbose logging and list consistent files too
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print a JSON run summary on stdout; never prompts or repairs
    #[arg(long, conflicts_with = "yes")]
    json: bool,

    /// Repair without asking, taking the first offered action
    #[arg(short = 'y', long)]
    yes: bool,
}

impl Cli {
    fn base_directory(&self) -> PathBuf {
        self.directory
            .clone()
            .or_else(|| self.path.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Environment-backed defaults with command-line overrides on top.
    fn config(&self) -> AuditConfig {
        let mut config = AuditConfig::from_env();
        if let Some(bytes) = self.oversize {
            config.oversize_bytes = bytes;
        }
        if let Some(bytes) = self.check_bytes {
            config.analyse_bytes = bytes;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(algorithm) = self.algorithm {
            config.algorithm = algorithm.as_domain();
        }
        if let Some(preset) = self.extension_preset {
            config.extension_preset = preset.as_domain();
        }
        if self.no_extension_shortcut {
            config.use_extension_shortcut = false;
        }
        config.dry_run = self.dry_run;
        config.verbose = self.verbose;
        config
    }
}

pub fn main_entry() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet || cli.json {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = cli.config();
    log::debug!(
        "Configuration: {} threads, {} algorithm, {} preset, oversize {} bytes",
        config.worker_count(),
        config.algorithm.as_str(),
        config.extension_preset.as_str(),
        config.oversize_bytes
    );
    let context = AuditContext::new(config);

    let mut decider: Box<dyn Decider> = if cli.json {
        Box::new(DeclineDecider)
    } else if cli.yes {
        Box::new(AutoDecider)
    } else {
        Box::new(PromptDecider)
    };
    let mut reporter: Box<dyn Reporter> = if cli.json {
        Box::new(NoopReporter)
    } else {
        Box::new(TablePresenter::stdout())
    };

    let base = cli.base_directory();
    let summary = match Auditor::new(&context).run(&base, decider.as_mut(), reporter.as_mut()) {
        Ok(summary) => summary,
        Err(err @ (EngineError::RootNotFound(_) | EngineError::NotADirectory(_))) => {
            log::error!("{err}. No repositories found.");
            return Ok(ExitCode::from(EXIT_PROBLEMS));
        }
        Err(err) => return Err(err.into()),
    };

    if cli.json {
        print_stdout(&serde_json::to_string_pretty(&summary)?)?;
    }
    Ok(exit_code(&summary))
}

fn exit_code(summary: &RunSummary) -> ExitCode {
    if summary.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_PROBLEMS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lfs_audit_classifier::{Algorithm, ExtensionPreset};

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "lfs-audit",
            "--threads",
            "7",
            "--oversize",
            "1024",
            "--check-bytes",
            "512",
            "--algorithm",
            "simple",
            "--extension-preset",
            "unity-project",
            "--no-extension-shortcut",
            "--simulation",
            "repo",
        ]);
        let config = cli.config();
        assert_eq!(config.threads, 7);
        assert_eq!(config.oversize_bytes, 1024);
        assert_eq!(config.analyse_bytes, 512);
        assert_eq!(config.algorithm, Algorithm::Simple);
        assert_eq!(config.extension_preset, ExtensionPreset::UnityProject);
        assert!(!config.use_extension_shortcut);
        assert!(config.dry_run);
        assert_eq!(cli.base_directory(), PathBuf::from("repo"));
    }

    #[test]
    fn directory_flag_and_default() {
        let cli = Cli::parse_from(["lfs-audit", "-d", "work"]);
        assert_eq!(cli.base_directory(), PathBuf::from("work"));
        let cli = Cli::parse_from(["lfs-audit"]);
        assert_eq!(cli.base_directory(), PathBuf::from("."));
    }

    #[test]
    fn conflicting_flags_are_rejected() {
        assert!(Cli::try_parse_from(["lfs-audit", "a", "-d", "b"]).is_err());
        assert!(Cli::try_parse_from(["lfs-audit", "--json", "--yes"]).is_err());
        assert!(Cli::try_parse_from(["lfs-audit", "--threads", "many"]).is_err());
    }
}
