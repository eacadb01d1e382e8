use clap::ValueEnum;
use lfs_audit_classifier::{Algorithm, ExtensionPreset};

#[derive(Copy, Clone, Debug, ValueEnum)]
pub(crate) enum AlgorithmFlag {
    Simple,
    BomBased,
}

impl AlgorithmFlag {
    pub(crate) const fn as_domain(self) -> Algorithm {
        match self {
            AlgorithmFlag::Simple => Algorithm::Simple,
            AlgorithmFlag::BomBased => Algorithm::BomBased,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub(crate) enum ExtensionPresetFlag {
    Simple,
    UnityProject,
}

impl ExtensionPresetFlag {
    pub(crate) const fn as_domain(self) -> ExtensionPreset {
        match self {
            ExtensionPresetFlag::Simple => ExtensionPreset::Simple,
            ExtensionPresetFlag::UnityProject => ExtensionPreset::UnityProject,
        }
    }
}
