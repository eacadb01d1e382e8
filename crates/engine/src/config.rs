use lfs_audit_classifier::{
    Algorithm, Classifier, ExtensionPreset, ExtensionSets, DEFAULT_ANALYSE_BYTES,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DEFAULT_OVERSIZE_BYTES: u64 = 5 * 1024 * 1024;
pub const DEFAULT_THREADS: usize = 4;
pub const MIN_THREADS: usize = 1;
pub const MAX_THREADS: usize = 10;

pub const ENV_THREADS: &str = "LFS_AUDIT_THREADS";
pub const ENV_OVERSIZE_BYTES: &str = "LFS_AUDIT_OVERSIZE_BYTES";
pub const ENV_ANALYSE_BYTES: &str = "LFS_AUDIT_ANALYSE_BYTES";

/// Resolved run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Text files at or above this size are expected to live in LFS.
    pub oversize_bytes: u64,
    /// Prefix length inspected by the classifier.
    pub analyse_bytes: usize,
    /// Requested worker count; see [`AuditConfig::worker_count`].
    pub threads: usize,
    pub algorithm: Algorithm,
    pub extension_preset: ExtensionPreset,
    pub use_extension_shortcut: bool,
    pub dry_run: bool,
    pub verbose: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            oversize_bytes: DEFAULT_OVERSIZE_BYTES,
            analyse_bytes: DEFAULT_ANALYSE_BYTES,
            threads: DEFAULT_THREADS,
            algorithm: Algorithm::default(),
            extension_preset: ExtensionPreset::default(),
            use_extension_shortcut: true,
            dry_run: false,
            verbose: false,
        }
    }
}

impl AuditConfig {
    /// Defaults overlaid with `LFS_AUDIT_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            threads: parse_or(env_value(ENV_THREADS).as_deref(), defaults.threads),
            oversize_bytes: parse_or(
                env_value(ENV_OVERSIZE_BYTES).as_deref(),
                defaults.oversize_bytes,
            ),
            analyse_bytes: parse_or(
                env_value(ENV_ANALYSE_BYTES).as_deref(),
                defaults.analyse_bytes,
            ),
            ..defaults
        }
    }

    pub fn worker_count(&self) -> usize {
        self.threads.clamp(MIN_THREADS, MAX_THREADS)
    }
}

/// Dependencies built once per run and shared by reference.
#[derive(Debug, Clone)]
pub struct AuditContext {
    config: AuditConfig,
    extensions: Option<Arc<ExtensionSets>>,
}

impl AuditContext {
    pub fn new(config: AuditConfig) -> Self {
        let extensions = config
            .use_extension_shortcut
            .then(|| Arc::new(config.extension_preset.extensions()));
        Self { config, extensions }
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// A fresh classifier with its own scratch buffer.
    pub fn classifier(&self) -> Classifier {
        Classifier::new(
            self.config.algorithm,
            self.extensions.clone(),
            self.config.analyse_bytes,
        )
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn parse_or<T: std::str::FromStr>(raw: Option<&str>, default_value: T) -> T {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn worker_count_is_clamped() {
        let mut config = AuditConfig::default();
        assert_eq!(config.worker_count(), 4);
        config.threads = 0;
        assert_eq!(config.worker_count(), 1);
        config.threads = 64;
        assert_eq!(config.worker_count(), 10);
        config.threads = 7;
        assert_eq!(config.worker_count(), 7);
    }

    #[test]
    fn parse_or_falls_back_on_blank_or_garbage() {
        assert_eq!(parse_or::<usize>(None, 4), 4);
        assert_eq!(parse_or::<usize>(Some(""), 4), 4);
        assert_eq!(parse_or::<usize>(Some("   "), 4), 4);
        assert_eq!(parse_or::<usize>(Some("abc"), 4), 4);
        assert_eq!(parse_or::<usize>(Some(" 8 "), 4), 8);
        assert_eq!(parse_or::<u64>(Some("1048576"), 1), 1_048_576);
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = AuditConfig::default();
        assert_eq!(config.oversize_bytes, 5 * 1024 * 1024);
        assert_eq!(config.analyse_bytes, 8 * 1024);
        assert_eq!(config.algorithm, Algorithm::BomBased);
        assert_eq!(config.extension_preset, ExtensionPreset::Simple);
        assert!(config.use_extension_shortcut);
        assert!(!config.dry_run);
    }

    #[test]
    fn shortcut_switch_controls_extension_sets() {
        let with = AuditContext::new(AuditConfig::default());
        assert!(with.extensions.is_some());
        let without = AuditContext::new(AuditConfig {
            use_extension_shortcut: false,
            ..AuditConfig::default()
        });
        assert!(without.extensions.is_none());
    }
}
