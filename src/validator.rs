//! Line-oriented syntax checks that run before any translation.
//!
//! Each physical line is checked independently against a fixed list of
//! defect categories. The first defect on the first offending line wins;
//! nothing past it is examined.

use std::fmt;

use thiserror::Error;

const BLOCK_KEYWORDS: [&str; 5] = ["for", "while", "if", "elif", "else"];

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DefectKind {
    #[error("Missing colon (:) at end of line")]
    MissingColon,
    #[error("Missing closing parenthesis )")]
    MissingClosingParen,
    #[error("Missing opening parenthesis (")]
    MissingOpeningParen,
    #[error("Missing closing bracket ]")]
    MissingClosingBracket,
    #[error("Missing opening bracket [")]
    MissingOpeningBracket,
    #[error("Unmatched single quote (')")]
    UnmatchedSingleQuote,
    #[error("Unmatched double quote (\")")]
    UnmatchedDoubleQuote,
    #[error("Invalid range() syntax - did you mean to close the parenthesis before the colon?")]
    InvalidRange,
}

/// A static defect found on a 1-based source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntaxDefect {
    pub line: usize,
    pub kind: DefectKind,
}

impl fmt::Display for SyntaxDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Syntax error on line {}: {}", self.line, self.kind)
    }
}

impl std::error::Error for SyntaxDefect {}

/// Returns `true` for lines both the validator and the translator ignore.
pub(crate) fn is_skipped(trimmed: &str) -> bool {
    trimmed.is_empty() || trimmed.starts_with('#')
}

pub fn validate(source: &str) -> Result<(), SyntaxDefect> {
    for (index, line) in source.split('\n').enumerate() {
        let trimmed = line.trim();
        if is_skipped(trimmed) {
            continue;
        }
        if let Some(kind) = check_line(line, trimmed) {
            let defect = SyntaxDefect {
                line: index + 1,
                kind,
            };
            tracing::debug!(line = defect.line, "validation rejected source: {}", defect.kind);
            return Err(defect);
        }
    }
    Ok(())
}

fn check_line(line: &str, trimmed: &str) -> Option<DefectKind> {
    if opens_block(trimmed) && !trimmed.ends_with(':') {
        return Some(DefectKind::MissingColon);
    }

    if let Some(kind) = check_balance(
        line,
        ('(', ')'),
        DefectKind::MissingClosingParen,
        DefectKind::MissingOpeningParen,
    ) {
        return Some(kind);
    }

    if let Some(kind) = check_balance(
        line,
        ('[', ']'),
        DefectKind::MissingClosingBracket,
        DefectKind::MissingOpeningBracket,
    ) {
        return Some(kind);
    }

    if count(line, '\'') % 2 != 0 {
        return Some(DefectKind::UnmatchedSingleQuote);
    }
    if count(line, '"') % 2 != 0 {
        return Some(DefectKind::UnmatchedDoubleQuote);
    }

    if has_unclosed_range_colon(line) {
        return Some(DefectKind::InvalidRange);
    }

    None
}

/// A block keyword followed by whitespace. A bare `else:` has no operand and
/// never matches.
fn opens_block(trimmed: &str) -> bool {
    BLOCK_KEYWORDS.iter().any(|keyword| {
        trimmed
            .strip_prefix(keyword)
            .and_then(|rest| rest.chars().next())
            .is_some_and(char::is_whitespace)
    })
}

fn check_balance(
    line: &str,
    (open, close): (char, char),
    missing_close: DefectKind,
    missing_open: DefectKind,
) -> Option<DefectKind> {
    let opens = count(line, open);
    let closes = count(line, close);
    match opens.cmp(&closes) {
        std::cmp::Ordering::Equal => None,
        std::cmp::Ordering::Greater => Some(missing_close),
        std::cmp::Ordering::Less => Some(missing_open),
    }
}

fn count(line: &str, needle: char) -> usize {
    line.chars().filter(|&c| c == needle).count()
}

/// Looks for `range(` followed by a `:` before any `)`, where that colon is
/// not itself followed (after optional whitespace) by `)`.
fn has_unclosed_range_colon(line: &str) -> bool {
    line.match_indices("range(").any(|(position, matched)| {
        let after_open = &line[position + matched.len()..];
        let arguments = after_open
            .find(')')
            .map_or(after_open, |end| &after_open[..end]);
        arguments
            .match_indices(':')
            .any(|(colon, _)| !after_open[colon + 1..].trim_start().starts_with(')'))
    })
}
