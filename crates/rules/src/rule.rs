use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::glob::PatternMatcher;

/// Attribute suffix written for every rule this crate appends.
pub const LFS_ATTRIBUTES: &str = "filter=lfs diff=lfs merge=lfs -text";

static TEXT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^([^#]*?)\s+text\s*(#.*)?$").unwrap_or_else(|err| unreachable!("{err}"))
});

static LFS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^([^#]*?)filter\s*=\s*lfs\s+diff\s*=\s*lfs\s+merge\s*=\s*lfs\s+-text\s*(#.*)?$",
    )
    .unwrap_or_else(|err| unreachable!("{err}"))
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Lfs,
    Text,
    Comment,
    Unknown,
}

impl RuleKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            RuleKind::Lfs => "lfs",
            RuleKind::Text => "text",
            RuleKind::Comment => "comment",
            RuleKind::Unknown => "unknown",
        }
    }
}

/// One line of an attributes file.
#[derive(Debug, Clone)]
pub struct Rule {
    kind: RuleKind,
    pattern: String,
    raw_line: String,
    matcher: Option<PatternMatcher>,
}

impl Rule {
    /// Classify a single line. Never fails: anything unrecognised is kept as
    /// [`RuleKind::Unknown`] so it survives a save untouched.
    pub fn parse(line: &str) -> Self {
        if line.trim().is_empty() {
            return Self::opaque(RuleKind::Unknown, line);
        }
        if line.trim_start().starts_with('#') {
            return Self::opaque(RuleKind::Comment, line);
        }
        Self::declaration(&TEXT_LINE, RuleKind::Text, line)
            .or_else(|| Self::declaration(&LFS_LINE, RuleKind::Lfs, line))
            .unwrap_or_else(|| Self::opaque(RuleKind::Unknown, line))
    }

    /// A new LFS rule with the canonical attribute suffix.
    pub fn lfs(pattern: &str) -> Self {
        let raw_line = format!("{pattern} {LFS_ATTRIBUTES}");
        Self::with_pattern(RuleKind::Lfs, pattern.to_string(), raw_line)
    }

    fn declaration(regex: &Regex, kind: RuleKind, line: &str) -> Option<Self> {
        let captures = regex.captures(line)?;
        let pattern = captures.get(1).map_or("", |m| m.as_str()).trim();
        if pattern.is_empty() {
            return None;
        }
        Some(Self::with_pattern(
            kind,
            pattern.to_string(),
            line.to_string(),
        ))
    }

    fn with_pattern(kind: RuleKind, pattern: String, raw_line: String) -> Self {
        match PatternMatcher::new(&pattern) {
            Ok(matcher) => Self {
                kind,
                pattern,
                raw_line,
                matcher: Some(matcher),
            },
            Err(err) => {
                log::warn!("Keeping unmatchable attributes line '{raw_line}': {err}");
                Self::opaque(RuleKind::Unknown, &raw_line)
            }
        }
    }

    fn opaque(kind: RuleKind, line: &str) -> Self {
        Self {
            kind,
            pattern: String::new(),
            raw_line: line.to_string(),
            matcher: None,
        }
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    /// Empty for comment and unknown lines.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn raw_line(&self) -> &str {
        &self.raw_line
    }

    /// Comment and unknown lines never match.
    pub fn is_match(&self, relative_path: &str) -> bool {
        match (&self.kind, &self.matcher) {
            (RuleKind::Lfs | RuleKind::Text, Some(matcher)) => matcher.is_match(relative_path),
            _ => false,
        }
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.pattern == other.pattern
            && self.raw_line == other.raw_line
    }
}

impl Eq for Rule {}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {}",
            self.pattern,
            self.kind.as_str(),
            self.raw_line
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_lfs_declaration_with_trailing_comment() {
        let rule = Rule::parse("*.psd filter=lfs diff=lfs merge=lfs -text # photoshop");
        assert_eq!(rule.kind(), RuleKind::Lfs);
        assert_eq!(rule.pattern(), "*.psd");
        assert_eq!(
            rule.raw_line(),
            "*.psd filter=lfs diff=lfs merge=lfs -text # photoshop"
        );
    }

    #[test]
    fn comment_ending_in_text_keeps_lfs_kind() {
        let rule = Rule::parse("*.pdf filter=lfs diff=lfs merge=lfs -text # binary, not text");
        assert_eq!(rule.kind(), RuleKind::Lfs);
        assert_eq!(rule.pattern(), "*.pdf");

        let rule = Rule::parse("*.md text # not filter=lfs diff=lfs merge=lfs -text");
        assert_eq!(rule.kind(), RuleKind::Text);
        assert_eq!(rule.pattern(), "*.md");
    }

    #[test]
    fn lfs_markers_are_case_insensitive_and_whitespace_tolerant() {
        let rule = Rule::parse("Assets/**  FILTER = lfs   Diff=LFS merge=lfs\t-TEXT");
        assert_eq!(rule.kind(), RuleKind::Lfs);
        assert_eq!(rule.pattern(), "Assets/**");
    }

    #[test]
    fn parses_text_declaration() {
        let rule = Rule::parse("*.cs\t\ttext");
        assert_eq!(rule.kind(), RuleKind::Text);
        assert_eq!(rule.pattern(), "*.cs");

        let commented = Rule::parse("*.md TEXT #docs text");
        assert_eq!(commented.kind(), RuleKind::Text);
        assert_eq!(commented.pattern(), "*.md");
    }

    #[test]
    fn text_keyword_needs_leading_whitespace_and_clean_tail() {
        assert_eq!(Rule::parse("*.txt text eol=lf").kind(), RuleKind::Unknown);
        assert_eq!(Rule::parse("*.md textual").kind(), RuleKind::Unknown);
        assert_eq!(Rule::parse("text").kind(), RuleKind::Unknown);
    }

    #[test]
    fn comments_and_unknown_lines_never_match() {
        let comment = Rule::parse("# *.png filter=lfs diff=lfs merge=lfs -text");
        assert_eq!(comment.kind(), RuleKind::Comment);
        assert_eq!(comment.pattern(), "");
        assert!(!comment.is_match("a.png"));

        let unknown = Rule::parse("*.png binary");
        assert_eq!(unknown.kind(), RuleKind::Unknown);
        assert!(!unknown.is_match("a.png"));

        let blank = Rule::parse("   ");
        assert_eq!(blank.kind(), RuleKind::Unknown);
        assert_eq!(blank.raw_line(), "   ");
    }

    #[test]
    fn appended_rule_uses_canonical_line() {
        let rule = Rule::lfs("*.bin");
        assert_eq!(rule.raw_line(), "*.bin filter=lfs diff=lfs merge=lfs -text");
        assert_eq!(Rule::parse(rule.raw_line()), rule);
    }
}
