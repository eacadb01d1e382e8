use regex::{Regex, RegexBuilder};

use crate::error::{Result, RuleError};

/// Compiled form of an attributes pattern.
///
/// Patterns without a slash are tested against the final path segment only;
/// patterns with a slash are tested against the whole repository-relative path.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    regex: Regex,
    whole_path: bool,
}

impl PatternMatcher {
    pub fn new(pattern: &str) -> Result<Self> {
        let normalized = normalize_separators(pattern);
        let whole_path = normalized.contains('/');
        let regex = RegexBuilder::new(&translate(&normalized))
            .case_insensitive(true)
            .build()
            .map_err(|source| RuleError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self { regex, whole_path })
    }

    pub fn is_match(&self, relative_path: &str) -> bool {
        let normalized = normalize_separators(relative_path);
        let target = if self.whole_path {
            normalized.as_str()
        } else {
            normalized.rsplit('/').next().unwrap_or_default()
        };
        self.regex.is_match(target)
    }
}

pub(crate) fn normalize_separators(value: &str) -> String {
    value.replace('\\', "/")
}

/// `**` spans separators, `*` and `?` stay inside one segment, the rest is literal.
fn translate(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    out.push('^');
    let mut chars = pattern.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                out.push_str(".*");
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            other => {
                let mut buf = [0u8; 4];
                out.push_str(&regex::escape(other.encode_utf8(&mut buf)));
            }
        }
    }
    out.push('$');
    out
}
