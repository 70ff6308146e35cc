//! Dictionary configuration loaded from JSON
//!
//! A [`MarkupConfig`] describes a whole dictionary plus the warnings
//! collector to use with it, so a grammar can ship as data:
//!
//! ```json
//! {
//!   "limits": { "max_attr_key_len": 32 },
//!   "escape": "\\",
//!   "attribute": { "trigger": "!", "payload_start": "{", "payload_end": "}" },
//!   "tags": [
//!     { "name": "bold", "seq": "*" },
//!     { "name": "code", "seq": "`", "greed": "greedy", "rule": "tag_vs_content" },
//!     { "name": "link", "seq": "[", "close": "]" },
//!     { "name": "link_end", "seq": "]", "open": "[" }
//!   ],
//!   "warnings": { "policy": "truncate", "capacity": 64 }
//! }
//! ```
//!
//! Tags with neither `open` nor `close` are Universal.

use super::dictionary::{
    Dictionary, Limits, DEFAULT_MAX_ATTR_KEY_LEN, DEFAULT_MAX_ATTR_PAYLOAD_LEN, DEFAULT_MAX_DEPTH,
    DEFAULT_MAX_OPENING_RUN,
};
use super::error::{ConfigError, ConfigIssue};
use super::tag::{Greed, Rule};
use super::warnings::{OverflowPolicy, Warnings};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default capacity of the configured warnings collector
pub const DEFAULT_WARNINGS_CAPACITY: i64 = 64;

/// Whole configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupConfig {
    /// Scan limits
    pub limits: LimitsConfig,
    /// Escape trigger
    pub escape: Option<char>,
    /// Attribute syntax
    pub attribute: Option<AttributeConfig>,
    /// Tags, registered in order
    pub tags: Vec<TagConfig>,
    /// Warnings collector settings
    pub warnings: WarningsConfig,
}

/// Scan limits; negative values fail with `NegativeLimit`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum attribute key length in bytes
    pub max_attr_key_len: i64,
    /// Maximum attribute payload length in bytes
    pub max_attr_payload_len: i64,
    /// Maximum opening run length
    pub max_opening_run: i64,
    /// Maximum nesting depth
    pub max_depth: i64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_attr_key_len: DEFAULT_MAX_ATTR_KEY_LEN as i64,
            max_attr_payload_len: DEFAULT_MAX_ATTR_PAYLOAD_LEN as i64,
            max_opening_run: DEFAULT_MAX_OPENING_RUN as i64,
            max_depth: DEFAULT_MAX_DEPTH as i64,
        }
    }
}

/// Attribute syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeConfig {
    /// Byte that starts an attribute
    pub trigger: char,
    /// Byte that opens the payload
    pub payload_start: char,
    /// Byte that closes the payload
    pub payload_end: char,
}

/// One tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagConfig {
    /// Tag name
    pub name: String,
    /// Trigger sequence
    pub seq: String,
    /// Closing-search policy
    #[serde(default)]
    pub greed: Greed,
    /// Disambiguation rule
    #[serde(default)]
    pub rule: Rule,
    /// Opening partner (Closing tags)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<char>,
    /// Closing partner (Opening tags)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close: Option<char>,
}

/// Warnings collector settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarningsConfig {
    /// Overflow policy
    pub policy: OverflowPolicy,
    /// Capacity
    pub capacity: i64,
}

impl Default for WarningsConfig {
    fn default() -> Self {
        Self {
            policy: OverflowPolicy::Truncate,
            capacity: DEFAULT_WARNINGS_CAPACITY,
        }
    }
}

/// Failure to load a configuration
#[derive(Debug)]
pub enum LoadError {
    /// Malformed JSON
    Json(serde_json::Error),
    /// Well-formed but rejected by the dictionary
    Config(ConfigError),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Json(e) => write!(f, "invalid configuration JSON: {}", e),
            LoadError::Config(e) => write!(f, "invalid configuration: {}", e),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Json(e) => Some(e),
            LoadError::Config(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(e: serde_json::Error) -> Self {
        LoadError::Json(e)
    }
}

impl From<ConfigError> for LoadError {
    fn from(e: ConfigError) -> Self {
        LoadError::Config(e)
    }
}

/// A configured symbol must be a single ASCII byte
fn symbol(c: char) -> Result<u8, ConfigError> {
    u8::try_from(c)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| {
            ConfigError::new(
                ConfigIssue::InvalidTagSeq,
                format!("{:?} is not an ASCII symbol", c),
            )
        })
}

impl MarkupConfig {
    /// Parse a configuration from JSON
    #[inline]
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Serialize the configuration to JSON
    #[inline]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Build the dictionary described by this configuration
    ///
    /// The escape trigger is installed first, then the attribute signature,
    /// then the tags in order. The first rejected entry aborts the build.
    pub fn build_dictionary(&self) -> Result<Dictionary, ConfigError> {
        let limits = Limits::new(
            self.limits.max_attr_key_len,
            self.limits.max_attr_payload_len,
            self.limits.max_opening_run,
            self.limits.max_depth,
        )?;
        let mut dict = Dictionary::new(limits);

        if let Some(escape) = self.escape {
            dict.set_escape_trigger(symbol(escape)?)?;
        }

        if let Some(attr) = &self.attribute {
            let attr_symbol = |c: char| {
                symbol(c).map_err(|e| ConfigError::new(ConfigIssue::InvalidAttrSymbol, e.detail))
            };
            dict.set_attribute_signature(
                attr_symbol(attr.trigger)?,
                attr_symbol(attr.payload_start)?,
                attr_symbol(attr.payload_end)?,
            )?;
        }

        for tag in &self.tags {
            let id = tag.seq.bytes().next().unwrap_or(0);
            let (open_id, close_id) = match (tag.open, tag.close) {
                (None, None) => (id, id),
                (open, close) => (
                    open.map(symbol).transpose()?.unwrap_or(0),
                    close.map(symbol).transpose()?.unwrap_or(0),
                ),
            };
            dict.add_tag(&tag.name, &tag.seq, tag.greed, tag.rule, open_id, close_id)?;
        }

        Ok(dict)
    }

    /// Create the warnings collector described by this configuration
    pub fn new_warnings(&self) -> Result<Warnings, ConfigError> {
        Warnings::new(self.warnings.policy, self.warnings.capacity)
    }
}

impl Dictionary {
    /// Build a dictionary from a configuration
    pub fn from_config(config: &MarkupConfig) -> Result<Self, ConfigError> {
        config.build_dictionary()
    }

    /// Build a dictionary from a JSON configuration
    pub fn from_json(s: &str) -> Result<Self, LoadError> {
        let config = MarkupConfig::from_json(s)?;
        Ok(config.build_dictionary()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tag::TagKind;

    const SAMPLE: &str = r#"{
        "escape": "\\",
        "attribute": { "trigger": "!", "payload_start": "{", "payload_end": "}" },
        "tags": [
            { "name": "bold", "seq": "*" },
            { "name": "code", "seq": "`", "greed": "greedy", "rule": "tag_vs_content" },
            { "name": "link", "seq": "[", "close": "]" },
            { "name": "link_end", "seq": "]", "open": "[" }
        ],
        "warnings": { "policy": "drop", "capacity": 2 }
    }"#;

    #[test]
    fn test_build_from_json() {
        let config = MarkupConfig::from_json(SAMPLE).unwrap();
        let dict = config.build_dictionary().unwrap();

        assert_eq!(dict.escape_trigger(), Some(b'\\'));
        assert_eq!(dict.attribute_signature().unwrap().payload_end, b'}');
        assert_eq!(dict.tag(b'*').unwrap().kind(), TagKind::Universal);
        assert_eq!(dict.tag(b'`').unwrap().rule(), Rule::TagVsContent);
        assert_eq!(dict.tag(b'[').unwrap().kind(), TagKind::Opening);
        assert_eq!(dict.tag(b']').unwrap().kind(), TagKind::Closing);
        assert_eq!(dict.limits(), &Limits::default());

        let warnings = config.new_warnings().unwrap();
        assert_eq!(warnings.policy(), OverflowPolicy::Drop);
        assert_eq!(warnings.capacity(), 2);
    }

    #[test]
    fn test_defaults() {
        let config = MarkupConfig::from_json("{}").unwrap();
        assert_eq!(config.warnings.policy, OverflowPolicy::Truncate);
        assert_eq!(config.warnings.capacity, DEFAULT_WARNINGS_CAPACITY);
        assert!(config.build_dictionary().unwrap().tags().next().is_none());
    }

    #[test]
    fn test_rejections() {
        let err = Dictionary::from_json(r#"{ "limits": { "max_opening_run": -1 } }"#).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Config(ConfigError { issue: ConfigIssue::NegativeLimit, .. })
        ));

        let err = Dictionary::from_json(r#"{ "tags": [ { "name": "x", "seq": "" } ] }"#)
            .unwrap_err();
        assert!(matches!(
            err,
            LoadError::Config(ConfigError { issue: ConfigIssue::InvalidTagSeqLen, .. })
        ));

        let err = Dictionary::from_json(
            r#"{ "attribute": { "trigger": "é", "payload_start": "{", "payload_end": "}" } }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            LoadError::Config(ConfigError { issue: ConfigIssue::InvalidAttrSymbol, .. })
        ));

        let err = Dictionary::from_json("{ tags: }").unwrap_err();
        assert!(matches!(err, LoadError::Json(_)));
        assert!(err.to_string().starts_with("invalid configuration JSON"));
    }

    #[test]
    fn test_negative_warnings_capacity() {
        let config =
            MarkupConfig::from_json(r#"{ "warnings": { "policy": "no_cap", "capacity": -5 } }"#)
                .unwrap();
        assert_eq!(
            config.new_warnings().unwrap_err().issue,
            ConfigIssue::NegativeWarningsCap
        );
    }
}
