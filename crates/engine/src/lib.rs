//! # LFS Audit Engine
//!
//! Finds repositories, checks every file against its `.gitattributes`, and
//! repairs the rules on request.
//!
//! ## Phases
//!
//! ```text
//! base directory
//!     │
//!     ├──> Discovery (one RepositoryScan per .git root)
//!     │
//!     ├──> Pipeline (worker pool per repository)
//!     │      └─> AnalysisReport: one Verdict or failure per file
//!     │
//!     └──> Reconciler (Decider picks a RepairAction per mismatch)
//!            └─> RuleSet saved, repository re-analysed
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use lfs_audit_engine::{AuditConfig, AuditContext, Auditor, AutoDecider, NoopReporter};
//!
//! let context = AuditContext::new(AuditConfig::from_env());
//! let summary = Auditor::new(&context)
//!     .run("/path/to/repos", &mut AutoDecider, &mut NoopReporter)
//!     .unwrap();
//! println!("{} problems", summary.total_problems());
//! ```

mod auditor;
mod config;
mod discovery;
mod error;
mod pipeline;
mod reconcile;
mod session;
mod verdict;

pub use auditor::{Auditor, NoopReporter, Reporter, RepositorySummary, RunSummary};
pub use config::{
    AuditConfig, AuditContext, DEFAULT_OVERSIZE_BYTES, DEFAULT_THREADS, ENV_ANALYSE_BYTES,
    ENV_OVERSIZE_BYTES, ENV_THREADS, MAX_THREADS, MIN_THREADS,
};
pub use discovery::{discover_repositories, scan_repository, RepositoryScan};
pub use error::{EngineError, Result};
pub use pipeline::{analyse, evaluate};
pub use reconcile::{
    available_actions, reconcile, AutoDecider, Decider, ReconcileOutcome, ReconcileStatus,
    RepairAction, ScriptedDecider,
};
pub use session::RepositorySession;
pub use verdict::{AnalysisReport, ContentClass, FileInput, FileOutcome, Record, Verdict};
