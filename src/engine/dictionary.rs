//! The tag dictionary
//!
//! A [`Dictionary`] maps every byte to at most one compiled [`Action`]: a tag,
//! the escape trigger or the attribute trigger. It is configured once and is
//! read-only afterwards, so one dictionary can serve any number of
//! concurrent tokenize/parse calls.
//!
//! # Example
//!
//! ```
//! use tagmark::{Dictionary, Greed, Limits, Rule};
//!
//! let mut dict = Dictionary::new(Limits::default());
//! dict.add_universal_tag("bold", "*", Greed::NonGreedy, Rule::NotApplicable)
//!     .unwrap();
//! dict.add_tag("link", "[", Greed::NonGreedy, Rule::NotApplicable, 0, b']')
//!     .unwrap();
//! dict.add_tag("link_end", "]", Greed::NonGreedy, Rule::NotApplicable, b'[', 0)
//!     .unwrap();
//! dict.set_escape_trigger(b'\\').unwrap();
//!
//! assert_eq!(dict.tag(b'*').unwrap().name(), "bold");
//! assert!(dict.is_special(b'\\'));
//! ```

use super::action::Action;
use super::error::{describe_byte, ConfigError, ConfigIssue};
use super::tag::{check_symbol, Greed, Rule, Tag, TagSequence};

/// Default maximum attribute key length in bytes
pub const DEFAULT_MAX_ATTR_KEY_LEN: usize = 32;

/// Default maximum attribute payload length in bytes
pub const DEFAULT_MAX_ATTR_PAYLOAD_LEN: usize = 2048;

/// Default maximum opening run length for TagVsContent tags
pub const DEFAULT_MAX_OPENING_RUN: usize = 16;

/// Default maximum number of nested open tags
///
/// Serialized trees of this depth still load back through `serde_json`,
/// which rejects nesting beyond 128 levels.
pub const DEFAULT_MAX_DEPTH: usize = 48;

/// Scan limits bounding the work done per trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum attribute key length in bytes
    pub max_attr_key_len: usize,

    /// Maximum attribute payload length in bytes
    pub max_attr_payload_len: usize,

    /// Maximum counted length of an opening run
    pub max_opening_run: usize,

    /// Maximum number of nested open tags; deeper tags become text
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_attr_key_len: DEFAULT_MAX_ATTR_KEY_LEN,
            max_attr_payload_len: DEFAULT_MAX_ATTR_PAYLOAD_LEN,
            max_opening_run: DEFAULT_MAX_OPENING_RUN,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Limits {
    /// Create limits from signed values, rejecting negatives
    pub fn new(
        max_attr_key_len: i64,
        max_attr_payload_len: i64,
        max_opening_run: i64,
        max_depth: i64,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            max_attr_key_len: non_negative("max_attr_key_len", max_attr_key_len)?,
            max_attr_payload_len: non_negative("max_attr_payload_len", max_attr_payload_len)?,
            max_opening_run: non_negative("max_opening_run", max_opening_run)?,
            max_depth: non_negative("max_depth", max_depth)?,
        })
    }

    /// Set the maximum attribute key length
    pub fn with_max_attr_key_len(mut self, len: usize) -> Self {
        self.max_attr_key_len = len;
        self
    }

    /// Set the maximum attribute payload length
    pub fn with_max_attr_payload_len(mut self, len: usize) -> Self {
        self.max_attr_payload_len = len;
        self
    }

    /// Set the maximum opening run length
    pub fn with_max_opening_run(mut self, len: usize) -> Self {
        self.max_opening_run = len;
        self
    }

    /// Set the maximum nesting depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

fn non_negative(name: &str, value: i64) -> Result<usize, ConfigError> {
    usize::try_from(value).map_err(|_| {
        ConfigError::new(
            ConfigIssue::NegativeLimit,
            format!("{} is {}", name, value),
        )
    })
}

/// Attribute syntax: `trigger key payload_start payload payload_end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrSignature {
    /// Byte that starts an attribute
    pub trigger: u8,
    /// Byte that ends the key and opens the payload
    pub payload_start: u8,
    /// Byte that closes the payload
    pub payload_end: u8,
}

/// Byte-indexed table of compiled actions
#[derive(Debug, Clone)]
pub struct Dictionary {
    limits: Limits,
    actions: Box<[Option<Action>; 256]>,
    escape: Option<u8>,
    attribute: Option<AttrSignature>,
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new(Limits::default())
    }
}

impl Dictionary {
    /// Create an empty dictionary
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            actions: Box::new(std::array::from_fn(|_| None)),
            escape: None,
            attribute: None,
        }
    }

    /// Register a tag, returning its id
    ///
    /// The kind follows from the partners: `open_id == close_id == id` is
    /// Universal, `(0, close)` is Opening, `(open, 0)` is Closing.
    pub fn add_tag(
        &mut self,
        name: &str,
        seq: &str,
        greed: Greed,
        rule: Rule,
        open_id: u8,
        close_id: u8,
    ) -> Result<u8, ConfigError> {
        let seq = TagSequence::new(seq)?;
        let tag = Tag::new(name, seq, greed, rule, open_id, close_id)?;
        for partner in [open_id, close_id] {
            if partner != 0 {
                check_symbol(partner)?;
            }
        }

        let id = tag.id();
        self.claim(id)?;
        self.actions[id as usize] = Some(Action::for_tag(tag));

        log_debug!("registered tag {:?} on {}", name, describe_byte(id));
        Ok(id)
    }

    /// Register a tag that opens and closes itself
    pub fn add_universal_tag(
        &mut self,
        name: &str,
        seq: &str,
        greed: Greed,
        rule: Rule,
    ) -> Result<u8, ConfigError> {
        let id = TagSequence::new(seq)?.id();
        self.add_tag(name, seq, greed, rule, id, id)
    }

    /// Register a tag closed by the tag on `close_id`
    pub fn add_opening_tag(
        &mut self,
        name: &str,
        seq: &str,
        greed: Greed,
        close_id: u8,
    ) -> Result<u8, ConfigError> {
        self.add_tag(name, seq, greed, Rule::NotApplicable, 0, close_id)
    }

    /// Register a tag closing the tag on `open_id`
    pub fn add_closing_tag(
        &mut self,
        name: &str,
        seq: &str,
        open_id: u8,
    ) -> Result<u8, ConfigError> {
        self.add_tag(name, seq, Greed::NonGreedy, Rule::NotApplicable, open_id, 0)
    }

    /// Install the escape trigger
    pub fn set_escape_trigger(&mut self, trigger: u8) -> Result<(), ConfigError> {
        if let Some(existing) = self.escape {
            return Err(ConfigError::new(
                ConfigIssue::DuplicateEscapeTrigger,
                format!("escape trigger is already {}", describe_byte(existing)),
            ));
        }
        check_symbol(trigger)?;
        if let Some(sig) = self.attribute {
            if trigger == sig.payload_start || trigger == sig.payload_end {
                return Err(ConfigError::new(
                    ConfigIssue::InvalidAttrSymbol,
                    format!(
                        "escape {} collides with an attribute payload symbol",
                        describe_byte(trigger)
                    ),
                ));
            }
        }
        self.claim(trigger)?;

        self.actions[trigger as usize] = Some(Action::for_escape());
        self.escape = Some(trigger);
        log_debug!("escape trigger set to {}", describe_byte(trigger));
        Ok(())
    }

    /// Install the attribute signature
    pub fn set_attribute_signature(
        &mut self,
        trigger: u8,
        payload_start: u8,
        payload_end: u8,
    ) -> Result<(), ConfigError> {
        if self.attribute.is_some() {
            return Err(ConfigError::new(
                ConfigIssue::DuplicateAttrSignature,
                "attribute signature is already set",
            ));
        }

        for symbol in [trigger, payload_start, payload_end] {
            if check_symbol(symbol).is_err() {
                return Err(ConfigError::new(
                    ConfigIssue::InvalidAttrSymbol,
                    format!("{} is not a printable ASCII symbol", describe_byte(symbol)),
                ));
            }
        }
        if trigger == payload_start || trigger == payload_end {
            return Err(ConfigError::new(
                ConfigIssue::InvalidAttrSymbol,
                format!(
                    "trigger {} doubles as a payload symbol",
                    describe_byte(trigger)
                ),
            ));
        }
        if let Some(escape) = self.escape {
            if escape == payload_start || escape == payload_end {
                return Err(ConfigError::new(
                    ConfigIssue::InvalidAttrSymbol,
                    format!(
                        "payload symbol {} is the escape trigger",
                        describe_byte(escape)
                    ),
                ));
            }
        }
        self.claim(trigger)?;

        self.actions[trigger as usize] = Some(Action::for_attribute());
        self.attribute = Some(AttrSignature {
            trigger,
            payload_start,
            payload_end,
        });
        log_debug!("attribute trigger set to {}", describe_byte(trigger));
        Ok(())
    }

    fn claim(&self, id: u8) -> Result<(), ConfigError> {
        match &self.actions[id as usize] {
            None => Ok(()),
            Some(action) => {
                let owner = match action.tag() {
                    Some(tag) => format!("tag {:?}", tag.name()),
                    None if self.escape == Some(id) => "the escape trigger".to_string(),
                    None => "the attribute trigger".to_string(),
                };
                Err(ConfigError::new(
                    ConfigIssue::DuplicateTagId,
                    format!("{} is already claimed by {}", describe_byte(id), owner),
                ))
            }
        }
    }

    /// Tag registered on `id`
    #[inline]
    pub fn tag(&self, id: u8) -> Option<&Tag> {
        self.actions[id as usize].as_ref().and_then(Action::tag)
    }

    /// Action installed on `id`
    #[inline]
    pub fn action(&self, id: u8) -> Option<&Action> {
        self.actions[id as usize].as_ref()
    }

    /// Escape trigger, if any
    #[inline]
    pub fn escape_trigger(&self) -> Option<u8> {
        self.escape
    }

    /// Attribute signature, if any
    #[inline]
    pub fn attribute_signature(&self) -> Option<AttrSignature> {
        self.attribute
    }

    /// Scan limits
    #[inline]
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// True if `b` has meaning to the tokenizer
    #[inline]
    pub fn is_special(&self, b: u8) -> bool {
        self.actions[b as usize].is_some()
            || self
                .attribute
                .is_some_and(|sig| b == sig.payload_start || b == sig.payload_end)
    }

    /// Registered tags in byte order
    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.actions
            .iter()
            .filter_map(|slot| slot.as_ref().and_then(Action::tag))
    }

    /// Find a tag by name
    pub fn tag_by_name(&self, name: &str) -> Option<&Tag> {
        self.tags().find(|tag| tag.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tag::TagKind;

    #[test]
    fn test_register_and_lookup() {
        let mut dict = Dictionary::default();
        let id = dict
            .add_universal_tag("math", "$$", Greed::NonGreedy, Rule::NotApplicable)
            .unwrap();
        assert_eq!(id, b'$');
        assert_eq!(dict.tag(b'$').unwrap().seq().as_str(), "$$");
        assert_eq!(dict.tag(b'$').unwrap().kind(), TagKind::Universal);
        assert!(dict.tag(b'*').is_none());
        assert!(dict.is_special(b'$'));
        assert!(!dict.is_special(b'a'));
    }

    #[test]
    fn test_duplicate_id_leaves_table_untouched() {
        let mut dict = Dictionary::default();
        dict.add_universal_tag("bold", "*", Greed::NonGreedy, Rule::NotApplicable)
            .unwrap();
        let err = dict
            .add_universal_tag("strong", "**", Greed::Greedy, Rule::NotApplicable)
            .unwrap_err();
        assert_eq!(err.issue, ConfigIssue::DuplicateTagId);
        assert_eq!(dict.tag(b'*').unwrap().name(), "bold");
        assert_eq!(dict.tag(b'*').unwrap().greed(), Greed::NonGreedy);
    }

    #[test]
    fn test_escape_trigger() {
        let mut dict = Dictionary::default();
        dict.add_universal_tag("bold", "*", Greed::NonGreedy, Rule::NotApplicable)
            .unwrap();
        assert_eq!(
            dict.set_escape_trigger(b'*').unwrap_err().issue,
            ConfigIssue::DuplicateTagId
        );
        assert_eq!(
            dict.set_escape_trigger(b' ').unwrap_err().issue,
            ConfigIssue::UnprintableChar
        );
        dict.set_escape_trigger(b'\\').unwrap();
        assert_eq!(dict.escape_trigger(), Some(b'\\'));
        assert!(dict.tag(b'\\').is_none());
        assert_eq!(
            dict.set_escape_trigger(b'~').unwrap_err().issue,
            ConfigIssue::DuplicateEscapeTrigger
        );
        assert_eq!(
            dict.add_universal_tag("x", "\\", Greed::NonGreedy, Rule::NotApplicable)
                .unwrap_err()
                .issue,
            ConfigIssue::DuplicateTagId
        );
    }

    #[test]
    fn test_attribute_signature() {
        let mut dict = Dictionary::default();
        dict.set_escape_trigger(b'\\').unwrap();

        let invalid = [
            (b'!', b'!', b'}'),
            (b'!', b'{', b'!'),
            (b'!', b'\\', b'}'),
            (b'!', b'{', b'\\'),
            (b'!', b' ', b'}'),
            (0x7F, b'{', b'}'),
        ];
        for (t, s, e) in invalid {
            let err = dict.set_attribute_signature(t, s, e).unwrap_err();
            assert_eq!(err.issue, ConfigIssue::InvalidAttrSymbol);
        }
        assert_eq!(
            dict.set_attribute_signature(b'\\', b'{', b'}')
                .unwrap_err()
                .issue,
            ConfigIssue::DuplicateTagId
        );

        dict.set_attribute_signature(b'!', b'{', b'}').unwrap();
        assert!(dict.is_special(b'{'));
        assert!(dict.is_special(b'}'));
        assert_eq!(
            dict.set_attribute_signature(b'@', b'(', b')')
                .unwrap_err()
                .issue,
            ConfigIssue::DuplicateAttrSignature
        );
    }

    #[test]
    fn test_escape_after_attribute() {
        let mut dict = Dictionary::default();
        dict.set_attribute_signature(b'!', b'{', b'}').unwrap();
        assert_eq!(
            dict.set_escape_trigger(b'}').unwrap_err().issue,
            ConfigIssue::InvalidAttrSymbol
        );
        assert!(dict.escape_trigger().is_none());
    }

    #[test]
    fn test_partner_symbols() {
        let mut dict = Dictionary::default();
        let err = dict.add_opening_tag("open", "[", Greed::NonGreedy, 0x01).unwrap_err();
        assert_eq!(err.issue, ConfigIssue::UnprintableChar);
        assert!(dict.tag(b'[').is_none());
    }

    #[test]
    fn test_limits() {
        let limits = Limits::new(1, 2, 3, 4).unwrap();
        assert_eq!(limits.max_opening_run, 3);
        assert_eq!(limits.max_depth, 4);
        let err = Limits::new(1, -2, 3, 4).unwrap_err();
        assert_eq!(err.issue, ConfigIssue::NegativeLimit);
        assert_eq!(Limits::default().max_attr_payload_len, 2048);
    }

    #[test]
    fn test_tags_iterator() {
        let mut dict = Dictionary::default();
        dict.add_opening_tag("open", "[", Greed::NonGreedy, b']').unwrap();
        dict.add_closing_tag("close", "]", b'[').unwrap();
        dict.set_escape_trigger(b'\\').unwrap();

        let names: Vec<_> = dict.tags().map(Tag::name).collect();
        assert_eq!(names, ["open", "close"]);
        assert_eq!(dict.tag_by_name("close").unwrap().id(), b']');
    }

    #[test]
    fn test_dictionary_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Dictionary>();
    }
}
