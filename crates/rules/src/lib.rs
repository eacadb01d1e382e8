//! # LFS Audit Rules
//!
//! Reads a repository's `.gitattributes`, answers which line governs a path,
//! and writes the file back after mutations.
//!
//! ## Grammar
//!
//! ```text
//! PATTERN filter=lfs diff=lfs merge=lfs -text [#comment]   -> Lfs
//! PATTERN text [#comment]                                  -> Text
//! #...                                                     -> Comment
//! anything else                                            -> Unknown (kept verbatim)
//! ```
//!
//! When several rules match a path, the one written last wins.
//!
//! ## Example
//!
//! ```no_run
//! use lfs_audit_rules::RuleSet;
//! use std::path::Path;
//!
//! let rules = RuleSet::load("/path/to/repo");
//! if let Some(rule) = rules.latest_match(Path::new("/path/to/repo/art/logo.png")) {
//!     println!("governed by: {}", rule.raw_line());
//! }
//! ```

mod error;
mod glob;
mod rule;
mod rule_set;

pub use error::{Result, RuleError};
pub use glob::PatternMatcher;
pub use rule::{Rule, RuleKind, LFS_ATTRIBUTES};
pub use rule_set::{file_extension, RuleSet, SaveOutcome, ATTRIBUTES_FILE_NAME};
