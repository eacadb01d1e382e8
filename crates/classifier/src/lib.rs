//! # LFS Audit Classifier
//!
//! Decides whether a file is text or binary from a bounded prefix of its bytes.
//!
//! Two strategies are available through [`Algorithm`]:
//!
//! - `Simple`: any NUL or non-whitespace control byte means binary.
//! - `BomBased`: byte-order marks, strict UTF-8 validation, then a
//!   printable-byte heuristic.
//!
//! Both can be short-circuited by an [`ExtensionPreset`].

mod bom;
mod classifier;
mod error;
mod preset;
mod simple;

pub use bom::{detect_bom, is_valid_utf8, Bom};
pub use classifier::{Algorithm, Classifier, FileClass, DEFAULT_ANALYSE_BYTES};
pub use error::{ClassifierError, Result};
pub use preset::{ExtensionPreset, ExtensionSets};
