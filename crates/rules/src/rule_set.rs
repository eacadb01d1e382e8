use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{Result, RuleError};
use crate::glob::normalize_separators;
use crate::rule::Rule;

pub const ATTRIBUTES_FILE_NAME: &str = ".gitattributes";

/// Result of [`RuleSet::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing was mutated since load (or since the last save).
    Unchanged,
    Saved { path: PathBuf, lines: usize },
}

#[derive(Debug, Default)]
struct State {
    rules: Vec<Rule>,
    modified: bool,
}

/// Ordered rules of one repository's attributes file.
///
/// Every query, mutation and save goes through one mutex, so a `&RuleSet` can
/// be shared between pipeline workers and the reconciler.
#[derive(Debug)]
pub struct RuleSet {
    root: PathBuf,
    state: Mutex<State>,
}

impl RuleSet {
    /// Load `<root>/.gitattributes`. A missing or unreadable file is not an
    /// error: the set simply starts empty.
    pub fn load(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            log::error!("Repository directory not found: {}", root.display());
            return Self::from_rules(root, Vec::new());
        }

        let path = root.join(ATTRIBUTES_FILE_NAME);
        if !path.is_file() {
            log::warn!("File {ATTRIBUTES_FILE_NAME} not found: {}", root.display());
            return Self::from_rules(root, Vec::new());
        }

        match fs::read(&path) {
            Ok(bytes) => Self::parse(root, &String::from_utf8_lossy(&bytes)),
            Err(err) => {
                log::error!("Unable to read {}: {err}", path.display());
                Self::from_rules(root, Vec::new())
            }
        }
    }

    pub fn parse(root: impl AsRef<Path>, contents: &str) -> Self {
        let rules = contents.lines().map(Rule::parse).collect();
        Self::from_rules(root.as_ref().to_path_buf(), rules)
    }

    fn from_rules(root: PathBuf, rules: Vec<Rule>) -> Self {
        Self {
            root,
            state: Mutex::new(State {
                rules,
                modified: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn attributes_path(&self) -> PathBuf {
        self.root.join(ATTRIBUTES_FILE_NAME)
    }

    pub fn len(&self) -> usize {
        self.lock().rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().rules.is_empty()
    }

    pub fn is_modified(&self) -> bool {
        self.lock().modified
    }

    /// Snapshot of the rules in file order.
    pub fn rules(&self) -> Vec<Rule> {
        self.lock().rules.clone()
    }

    /// The governing rule for `path`: the *last* matching rule in file order.
    /// `None` when the path is outside the repository or nothing matches.
    pub fn latest_match(&self, path: &Path) -> Option<Rule> {
        let relative = self.relative_path(path)?;
        self.latest_match_relative(&relative)
    }

    pub fn latest_match_relative(&self, relative_path: &str) -> Option<Rule> {
        let state = self.lock();
        state
            .rules
            .iter()
            .rev()
            .find(|rule| rule.is_match(relative_path))
            .cloned()
    }

    /// Append `*<ext> filter=lfs ...` for the file's extension.
    pub fn append_extension(&self, path: &Path) -> Result<Rule> {
        let name = file_name(path).ok_or_else(|| RuleError::MissingExtension(path.into()))?;
        let extension =
            file_extension(&name).ok_or_else(|| RuleError::MissingExtension(path.into()))?;
        self.append(Rule::lfs(&format!("*{extension}")))
    }

    /// Append a rule for the bare file name.
    pub fn append_file_name(&self, path: &Path) -> Result<Rule> {
        if self.relative_path(path).is_none() {
            return Err(RuleError::OutsideRepository(path.into()));
        }
        let name = file_name(path).ok_or_else(|| RuleError::EmptyPattern(path.into()))?;
        self.append(Rule::lfs(&name))
    }

    /// Append a rule for the repository-relative path.
    pub fn append_path(&self, path: &Path) -> Result<Rule> {
        let relative = self
            .relative_path(path)
            .ok_or_else(|| RuleError::OutsideRepository(path.into()))?;
        if relative.trim().is_empty() {
            return Err(RuleError::EmptyPattern(path.into()));
        }
        self.append(Rule::lfs(&relative))
    }

    fn append(&self, rule: Rule) -> Result<Rule> {
        let mut state = self.lock();
        log::debug!("Appending rule to {}: {}", self.root.display(), rule.raw_line());
        state.rules.push(rule.clone());
        state.modified = true;
        Ok(rule)
    }

    /// Remove the first rule whose pattern text equals `pattern` exactly.
    /// This is string equality, not glob matching.
    pub fn remove(&self, pattern: &str) -> Result<Rule> {
        if pattern.trim().is_empty() {
            return Err(RuleError::EmptyRemovalPattern);
        }
        let mut state = self.lock();
        let Some(index) = state.rules.iter().position(|rule| rule.pattern() == pattern) else {
            log::debug!("Pattern not found in {}: {pattern}", self.root.display());
            return Err(RuleError::PatternNotFound(pattern.to_string()));
        };
        let removed = state.rules.remove(index);
        state.modified = true;
        log::debug!("Removed rule from {}: {}", self.root.display(), removed.raw_line());
        Ok(removed)
    }

    /// The file contents a save would write: raw lines in current order.
    pub fn render(&self) -> String {
        render_lines(&self.lock().rules)
    }

    /// Write the rules back if anything was mutated.
    pub fn save(&self) -> Result<SaveOutcome> {
        let mut state = self.lock();
        if !state.modified {
            return Ok(SaveOutcome::Unchanged);
        }
        let outcome = self.write(&state.rules)?;
        state.modified = false;
        Ok(outcome)
    }

    /// Write the rules back unconditionally.
    pub fn force_save(&self) -> Result<SaveOutcome> {
        let mut state = self.lock();
        let outcome = self.write(&state.rules)?;
        state.modified = false;
        Ok(outcome)
    }

    fn write(&self, rules: &[Rule]) -> Result<SaveOutcome> {
        if !self.root.is_dir() {
            return Err(RuleError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("repository directory not found: {}", self.root.display()),
            )));
        }
        let path = self.attributes_path();
        fs::write(&path, render_lines(rules))?;
        log::debug!("Wrote {} lines to {}", rules.len(), path.display());
        Ok(SaveOutcome::Saved {
            path,
            lines: rules.len(),
        })
    }

    /// Forward-slash path relative to the repository root, or `None` when
    /// `path` is not inside it.
    pub fn relative_path(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        Some(normalize_separators(&relative.to_string_lossy()))
    }
}

fn render_lines(rules: &[Rule]) -> String {
    let mut out = String::new();
    for rule in rules {
        out.push_str(rule.raw_line());
        out.push('\n');
    }
    out
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}

/// Extension of a file name including the leading dot (`.png`).
///
/// Unlike [`Path::extension`], dot-files count as pure extensions
/// (`.gitignore` yields `.gitignore`). A trailing dot yields `None`.
pub fn file_extension(name: &str) -> Option<&str> {
    let index = name.rfind('.')?;
    let extension = &name[index..];
    (extension.len() > 1).then_some(extension)
}
