//! Tag value types
//!
//! A [`Tag`] describes one grammar symbol of a [`Dictionary`](super::Dictionary):
//! the byte sequence that triggers it, how far it reaches for its closing
//! sequence ([`Greed`]), an optional disambiguation [`Rule`], and its
//! open/close partners. Tags are immutable once built; all validation happens
//! in [`Tag::new`].

use super::error::{describe_byte, ConfigError, ConfigIssue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of a tag sequence in bytes
pub const MAX_TAG_SEQ_LEN: usize = 4;

/// Maximum length of a tag name in code points
pub const MAX_TAG_NAME_LEN: usize = 20;

/// Closing-search policy of a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Greed {
    /// The trigger stands alone; closing is left to the parser
    #[default]
    NonGreedy = 0,
    /// Spans to the closing sequence; degrades to text when there is none
    Greedy = 1,
    /// Spans to the closing sequence, or to end of input when there is none
    Grasping = 2,
}

impl TryFrom<u8> for Greed {
    type Error = ConfigError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Greed::NonGreedy),
            1 => Ok(Greed::Greedy),
            2 => Ok(Greed::Grasping),
            _ => Err(ConfigError::new(
                ConfigIssue::InvalidGreedLevel,
                format!("greed code {} is out of range", code),
            )),
        }
    }
}

/// Disambiguation rule for single-byte Universal tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// No extra check
    #[default]
    #[serde(rename = "na")]
    NotApplicable = 0,
    /// Only a real tag when not buried inside a word
    InfraWord = 1,
    /// Opening run length must be matched exactly by the closing run
    TagVsContent = 2,
}

impl TryFrom<u8> for Rule {
    type Error = ConfigError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Rule::NotApplicable),
            1 => Ok(Rule::InfraWord),
            2 => Ok(Rule::TagVsContent),
            _ => Err(ConfigError::new(
                ConfigIssue::InvalidRule,
                format!("rule code {} is out of range", code),
            )),
        }
    }
}

/// Structural kind of a tag, derived from its partner ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    /// Opens and closes itself (`*bold*`)
    Universal,
    /// Opens, closed by a partner (`[`)
    Opening,
    /// Closes a partner (`]`)
    Closing,
}

/// One to four printable ASCII bytes; the first byte is the dispatch key
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TagSequence {
    bytes: [u8; MAX_TAG_SEQ_LEN],
    len: u8,
}

impl TagSequence {
    /// Validate and build a sequence from a string
    pub fn new(seq: &str) -> Result<Self, ConfigError> {
        Self::from_bytes(seq.as_bytes())
    }

    /// Validate and build a sequence from raw bytes
    pub fn from_bytes(seq: &[u8]) -> Result<Self, ConfigError> {
        if seq.is_empty() || seq.len() > MAX_TAG_SEQ_LEN {
            return Err(ConfigError::new(
                ConfigIssue::InvalidTagSeqLen,
                format!(
                    "sequence length {} is outside 1..={}",
                    seq.len(),
                    MAX_TAG_SEQ_LEN
                ),
            ));
        }

        let mut bytes = [0u8; MAX_TAG_SEQ_LEN];
        for (slot, &b) in bytes.iter_mut().zip(seq) {
            check_symbol(b)?;
            *slot = b;
        }

        Ok(Self {
            bytes,
            len: seq.len() as u8,
        })
    }

    /// The dispatch byte
    #[inline]
    pub fn id(&self) -> u8 {
        self.bytes[0]
    }

    /// Number of bytes in the sequence (1–4)
    #[inline]
    pub fn width(&self) -> usize {
        self.len as usize
    }

    /// The sequence bytes
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// The sequence as text
    pub fn as_str(&self) -> &str {
        // Validated as ASCII on construction
        std::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }
}

impl fmt::Debug for TagSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TagSequence({:?})", self.as_str())
    }
}

impl fmt::Display for TagSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check that a byte can act as a markup symbol
pub(crate) fn check_symbol(b: u8) -> Result<(), ConfigError> {
    if !b.is_ascii() {
        return Err(ConfigError::new(
            ConfigIssue::InvalidTagSeq,
            format!("{} is not an ASCII byte", describe_byte(b)),
        ));
    }
    if !b.is_ascii_graphic() {
        return Err(ConfigError::new(
            ConfigIssue::UnprintableChar,
            format!("{} is not printable", describe_byte(b)),
        ));
    }
    Ok(())
}

/// A grammar symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    name: String,
    seq: TagSequence,
    greed: Greed,
    rule: Rule,
    open_id: u8,
    close_id: u8,
}

impl Tag {
    /// Validate and build a tag
    ///
    /// `open_id`/`close_id` select the kind: both equal to the sequence id
    /// makes a Universal tag, `open_id == 0` with a `close_id` makes an
    /// Opening tag, `close_id == 0` with an `open_id` makes a Closing tag.
    pub fn new(
        name: &str,
        seq: TagSequence,
        greed: Greed,
        rule: Rule,
        open_id: u8,
        close_id: u8,
    ) -> Result<Self, ConfigError> {
        let name_len = name.chars().count();
        if name_len == 0 || name_len > MAX_TAG_NAME_LEN {
            return Err(ConfigError::new(
                ConfigIssue::InvalidTagNameLen,
                format!(
                    "tag name {:?} has {} code points, expected 1..={}",
                    name, name_len, MAX_TAG_NAME_LEN
                ),
            ));
        }

        let kind = classify(seq.id(), open_id, close_id).ok_or_else(|| {
            ConfigError::new(
                ConfigIssue::AmbiguousTagType,
                format!(
                    "tag {:?} ({}) has open {} and close {}",
                    name,
                    seq,
                    describe_byte(open_id),
                    describe_byte(close_id)
                ),
            )
        })?;

        if kind == TagKind::Closing && greed != Greed::NonGreedy {
            return Err(ConfigError::new(
                ConfigIssue::InvalidGreedLevel,
                format!("closing tag {:?} must be non-greedy", name),
            ));
        }

        if rule != Rule::NotApplicable {
            if kind != TagKind::Universal || seq.width() != 1 {
                return Err(ConfigError::new(
                    ConfigIssue::RuleInapplicable,
                    format!(
                        "rule {:?} needs a single-byte universal tag, {:?} is not one",
                        rule, name
                    ),
                ));
            }
            let legal = match rule {
                Rule::InfraWord => greed == Greed::NonGreedy,
                Rule::TagVsContent => greed != Greed::NonGreedy,
                Rule::NotApplicable => true,
            };
            if !legal {
                return Err(ConfigError::new(
                    ConfigIssue::InvalidRule,
                    format!("rule {:?} cannot be combined with {:?}", rule, greed),
                ));
            }
        }

        Ok(Self {
            name: name.to_string(),
            seq,
            greed,
            rule,
            open_id,
            close_id,
        })
    }

    /// Tag name
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Trigger sequence
    #[inline]
    pub fn seq(&self) -> &TagSequence {
        &self.seq
    }

    /// Dispatch byte
    #[inline]
    pub fn id(&self) -> u8 {
        self.seq.id()
    }

    /// Closing-search policy
    #[inline]
    pub fn greed(&self) -> Greed {
        self.greed
    }

    /// Disambiguation rule
    #[inline]
    pub fn rule(&self) -> Rule {
        self.rule
    }

    /// Id of the opening partner (Closing tags), own id (Universal) or 0
    #[inline]
    pub fn open_id(&self) -> u8 {
        self.open_id
    }

    /// Id of the closing partner (Opening tags), own id (Universal) or 0
    #[inline]
    pub fn close_id(&self) -> u8 {
        self.close_id
    }

    /// Structural kind
    pub fn kind(&self) -> TagKind {
        // Construction rejected every other combination
        classify(self.id(), self.open_id, self.close_id).unwrap_or(TagKind::Universal)
    }

    /// True for Greedy and Grasping tags
    #[inline]
    pub fn is_greedy(&self) -> bool {
        self.greed != Greed::NonGreedy
    }
}

fn classify(id: u8, open_id: u8, close_id: u8) -> Option<TagKind> {
    match (open_id, close_id) {
        (o, c) if o == id && c == id => Some(TagKind::Universal),
        (0, c) if c != 0 => Some(TagKind::Opening),
        (o, 0) if o != 0 => Some(TagKind::Closing),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(s: &str) -> TagSequence {
        TagSequence::new(s).unwrap()
    }

    #[test]
    fn test_sequence_bounds() {
        assert_eq!(seq("$$").id(), b'$');
        assert_eq!(seq("$$").width(), 2);
        assert_eq!(seq("[[[[").as_str(), "[[[[");

        let err = TagSequence::new("").unwrap_err();
        assert_eq!(err.issue, ConfigIssue::InvalidTagSeqLen);
        let err = TagSequence::new("*****").unwrap_err();
        assert_eq!(err.issue, ConfigIssue::InvalidTagSeqLen);
    }

    #[test]
    fn test_sequence_symbols() {
        assert_eq!(
            TagSequence::new("a b").unwrap_err().issue,
            ConfigIssue::UnprintableChar
        );
        assert_eq!(
            TagSequence::from_bytes(&[b'*', 0x09]).unwrap_err().issue,
            ConfigIssue::UnprintableChar
        );
        assert_eq!(
            TagSequence::new("é").unwrap_err().issue,
            ConfigIssue::InvalidTagSeq
        );
    }

    #[test]
    fn test_kinds() {
        let t = Tag::new("bold", seq("*"), Greed::NonGreedy, Rule::NotApplicable, b'*', b'*')
            .unwrap();
        assert_eq!(t.kind(), TagKind::Universal);

        let t = Tag::new("open", seq("["), Greed::NonGreedy, Rule::NotApplicable, 0, b']')
            .unwrap();
        assert_eq!(t.kind(), TagKind::Opening);

        let t = Tag::new("close", seq("]"), Greed::NonGreedy, Rule::NotApplicable, b'[', 0)
            .unwrap();
        assert_eq!(t.kind(), TagKind::Closing);

        let err = Tag::new("both", seq("|"), Greed::NonGreedy, Rule::NotApplicable, b'(', b')')
            .unwrap_err();
        assert_eq!(err.issue, ConfigIssue::AmbiguousTagType);

        let err = Tag::new("none", seq("|"), Greed::NonGreedy, Rule::NotApplicable, 0, 0)
            .unwrap_err();
        assert_eq!(err.issue, ConfigIssue::AmbiguousTagType);
    }

    #[test]
    fn test_name_length() {
        let ok = "a".repeat(MAX_TAG_NAME_LEN);
        assert!(Tag::new(&ok, seq("*"), Greed::NonGreedy, Rule::NotApplicable, b'*', b'*').is_ok());

        // Counted in code points, not bytes
        let wide = "é".repeat(MAX_TAG_NAME_LEN);
        assert!(Tag::new(&wide, seq("*"), Greed::NonGreedy, Rule::NotApplicable, b'*', b'*').is_ok());

        let long = "a".repeat(MAX_TAG_NAME_LEN + 1);
        let err = Tag::new(&long, seq("*"), Greed::NonGreedy, Rule::NotApplicable, b'*', b'*')
            .unwrap_err();
        assert_eq!(err.issue, ConfigIssue::InvalidTagNameLen);

        let err = Tag::new("", seq("*"), Greed::NonGreedy, Rule::NotApplicable, b'*', b'*')
            .unwrap_err();
        assert_eq!(err.issue, ConfigIssue::InvalidTagNameLen);
    }

    #[test]
    fn test_rule_legality() {
        let err = Tag::new("code", seq("``"), Greed::Greedy, Rule::TagVsContent, b'`', b'`')
            .unwrap_err();
        assert_eq!(err.issue, ConfigIssue::RuleInapplicable);

        let err = Tag::new("open", seq("["), Greed::NonGreedy, Rule::InfraWord, 0, b']')
            .unwrap_err();
        assert_eq!(err.issue, ConfigIssue::RuleInapplicable);

        let err = Tag::new("em", seq("_"), Greed::Greedy, Rule::InfraWord, b'_', b'_')
            .unwrap_err();
        assert_eq!(err.issue, ConfigIssue::InvalidRule);

        let err = Tag::new("code", seq("`"), Greed::NonGreedy, Rule::TagVsContent, b'`', b'`')
            .unwrap_err();
        assert_eq!(err.issue, ConfigIssue::InvalidRule);

        assert!(Tag::new("code", seq("`"), Greed::Grasping, Rule::TagVsContent, b'`', b'`').is_ok());
        assert!(Tag::new("em", seq("_"), Greed::NonGreedy, Rule::InfraWord, b'_', b'_').is_ok());
    }

    #[test]
    fn test_greedy_closing_rejected() {
        let err = Tag::new("close", seq("]"), Greed::Greedy, Rule::NotApplicable, b'[', 0)
            .unwrap_err();
        assert_eq!(err.issue, ConfigIssue::InvalidGreedLevel);
    }

    #[test]
    fn test_codes() {
        assert_eq!(Greed::try_from(2).unwrap(), Greed::Grasping);
        assert_eq!(
            Greed::try_from(3).unwrap_err().issue,
            ConfigIssue::InvalidGreedLevel
        );
        assert_eq!(Rule::try_from(1).unwrap(), Rule::InfraWord);
        assert_eq!(Rule::try_from(9).unwrap_err().issue, ConfigIssue::InvalidRule);
    }
}
