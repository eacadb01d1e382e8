use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::sync::Arc;

use crate::error::{ClassifierError, Result};
use crate::preset::ExtensionSets;
use crate::{bom, simple};

pub const DEFAULT_ANALYSE_BYTES: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileClass {
    Text,
    Binary,
}

/// Byte-inspection strategy, chosen once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    /// Control-byte scan; misreads UTF-16/UTF-32 as binary.
    Simple,
    /// BOM detection, strict UTF-8 validation, then a printable-byte heuristic.
    #[default]
    BomBased,
}

impl Algorithm {
    pub const fn as_str(self) -> &'static str {
        match self {
            Algorithm::Simple => "simple",
            Algorithm::BomBased => "bom-based",
        }
    }

    pub fn classify_bytes(self, prefix: &[u8]) -> FileClass {
        match self {
            Algorithm::Simple => simple::classify(prefix),
            Algorithm::BomBased => bom::classify(prefix),
        }
    }
}

/// Classifies files by their first `analyse_bytes` bytes.
///
/// Owns its scratch buffer, so classification takes `&mut self`: give every
/// worker thread its own instance.
#[derive(Debug)]
pub struct Classifier {
    algorithm: Algorithm,
    extensions: Option<Arc<ExtensionSets>>,
    buffer: Vec<u8>,
}

impl Classifier {
    pub fn new(
        algorithm: Algorithm,
        extensions: Option<Arc<ExtensionSets>>,
        analyse_bytes: usize,
    ) -> Self {
        Self {
            algorithm,
            extensions,
            buffer: vec![0; analyse_bytes.max(1)],
        }
    }

    /// Never fails: a file that cannot be read is reported as binary.
    pub fn classify(&mut self, path: &Path) -> FileClass {
        self.try_classify(path).unwrap_or_else(|err| {
            log::debug!("{err}; treating as binary");
            FileClass::Binary
        })
    }

    /// Like [`Classifier::classify`], but surfaces read failures.
    pub fn try_classify(&mut self, path: &Path) -> Result<FileClass> {
        if let Some(class) = self
            .extensions
            .as_ref()
            .and_then(|sets| sets.lookup(path))
        {
            return Ok(class);
        }

        let len = read_prefix(path, &mut self.buffer).map_err(|source| ClassifierError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.algorithm.classify_bytes(&self.buffer[..len]))
    }
}

/// Fill `buf` from the start of the file; short only at end of file.
fn read_prefix(path: &Path, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut file = File::open(path)?;
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExtensionPreset;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_binary() {
        let dir = tempdir().unwrap();
        let mut classifier = Classifier::new(Algorithm::BomBased, None, 64);
        let missing = dir.path().join("gone.txt");
        assert_eq!(classifier.classify(&missing), FileClass::Binary);
        assert!(classifier.try_classify(&missing).is_err());
    }

    #[test]
    fn only_the_prefix_is_inspected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.dat");
        let mut bytes = vec![b'a'; 16];
        bytes.extend_from_slice(&[0, 1, 2, 3]);
        fs::write(&path, &bytes).unwrap();

        let mut short = Classifier::new(Algorithm::Simple, None, 16);
        let mut long = Classifier::new(Algorithm::Simple, None, 64);
        assert_eq!(short.classify(&path), FileClass::Text);
        assert_eq!(long.classify(&path), FileClass::Binary);
    }

    #[test]
    fn extension_shortcut_wins_over_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fake.png");
        fs::write(&path, b"just text").unwrap();
        let sets = Arc::new(ExtensionPreset::Simple.extensions());

        let mut with_sets = Classifier::new(Algorithm::BomBased, Some(sets), 64);
        let mut without = Classifier::new(Algorithm::BomBased, None, 64);
        assert_eq!(with_sets.classify(&path), FileClass::Binary);
        assert_eq!(without.classify(&path), FileClass::Text);

        // no read needed when the extension decides
        assert_eq!(
            with_sets.classify(&dir.path().join("absent.png")),
            FileClass::Binary
        );
    }

    #[test]
    fn strategies_disagree_on_wide_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wide.dat");
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend("hello".encode_utf16().flat_map(u16::to_le_bytes));
        fs::write(&path, &bytes).unwrap();

        let mut simple = Classifier::new(Algorithm::Simple, None, 64);
        let mut bom = Classifier::new(Algorithm::BomBased, None, 64);
        assert_eq!(simple.classify(&path), FileClass::Binary);
        assert_eq!(bom.classify(&path), FileClass::Text);
    }

    #[test]
    fn zero_budget_is_clamped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("one.dat");
        fs::write(&path, [0u8]).unwrap();
        let mut classifier = Classifier::new(Algorithm::Simple, None, 0);
        assert_eq!(classifier.classify(&path), FileClass::Binary);
    }
}
