//! Configuration errors for tagmark
//!
//! Setup-time failures raised while building a [`Dictionary`](super::Dictionary)
//! or a [`Warnings`](super::Warnings) collector. A failed registration leaves
//! everything registered before it untouched.
//!
//! Run-time problems found while tokenizing or parsing are never errors; they
//! are recorded as [`Warning`](super::Warning)s instead.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of configuration failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigIssue {
    /// The leading byte is already claimed by a tag, the escape trigger or
    /// the attribute trigger
    DuplicateTagId,
    /// Tag sequence is empty or longer than four bytes
    InvalidTagSeqLen,
    /// Tag sequence (or a partner symbol) contains non-ASCII bytes
    InvalidTagSeq,
    /// A symbol is an ASCII control character or whitespace
    UnprintableChar,
    /// Greed code out of range, or a greedy Closing tag
    InvalidGreedLevel,
    /// Rule code out of range, or a rule paired with an incompatible greed
    InvalidRule,
    /// A rule was set on a multi-byte or non-Universal tag
    RuleInapplicable,
    /// The open/close partner combination names no tag kind
    AmbiguousTagType,
    /// Tag name is empty or longer than 20 code points
    InvalidTagNameLen,
    /// Attribute symbols collide with each other or with the escape trigger
    InvalidAttrSymbol,
    /// A dictionary limit is negative
    NegativeLimit,
    /// A warnings collector capacity is negative
    NegativeWarningsCap,
    /// An escape trigger is already installed
    DuplicateEscapeTrigger,
    /// An attribute signature is already installed
    DuplicateAttrSignature,
}

impl ConfigIssue {
    /// Stable kebab-case name of the issue
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigIssue::DuplicateTagId => "duplicate-tag-id",
            ConfigIssue::InvalidTagSeqLen => "invalid-tag-seq-len",
            ConfigIssue::InvalidTagSeq => "invalid-tag-seq",
            ConfigIssue::UnprintableChar => "unprintable-char",
            ConfigIssue::InvalidGreedLevel => "invalid-greed-level",
            ConfigIssue::InvalidRule => "invalid-rule",
            ConfigIssue::RuleInapplicable => "rule-inapplicable",
            ConfigIssue::AmbiguousTagType => "ambiguous-tag-type",
            ConfigIssue::InvalidTagNameLen => "invalid-tag-name-len",
            ConfigIssue::InvalidAttrSymbol => "invalid-attr-symbol",
            ConfigIssue::NegativeLimit => "negative-limit",
            ConfigIssue::NegativeWarningsCap => "negative-warnings-cap",
            ConfigIssue::DuplicateEscapeTrigger => "duplicate-escape-trigger",
            ConfigIssue::DuplicateAttrSignature => "duplicate-attr-signature",
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected configuration call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// What went wrong
    pub issue: ConfigIssue,
    /// Human-readable detail naming the offending value
    pub detail: String,
}

impl ConfigError {
    /// Create a new configuration error
    pub fn new(issue: ConfigIssue, detail: impl Into<String>) -> Self {
        Self {
            issue,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.issue, self.detail)
    }
}

impl std::error::Error for ConfigError {}

/// Render a byte for diagnostics: printable ASCII as itself, anything else
/// as an escaped hex code.
pub(crate) fn describe_byte(b: u8) -> String {
    if b.is_ascii_graphic() {
        format!("'{}'", b as char)
    } else {
        format!("0x{:02X}", b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ConfigError::new(ConfigIssue::DuplicateTagId, "'*' is already claimed");
        assert_eq!(err.to_string(), "duplicate-tag-id: '*' is already claimed");
    }

    #[test]
    fn test_describe_byte() {
        assert_eq!(describe_byte(b'*'), "'*'");
        assert_eq!(describe_byte(b' '), "0x20");
        assert_eq!(describe_byte(0x07), "0x07");
    }
}
