//! Run-time warnings
//!
//! Tokenizing and parsing never fail. Every recovery decision is recorded as
//! a [`Warning`] in a caller-supplied [`Warnings`] collector, which bounds its
//! own memory according to an [`OverflowPolicy`].
//!
//! Warnings carry only plain data (issue, position and the trigger bytes
//! involved); human-readable messages are formatted on demand by the
//! serializer, so warnings that get dropped never cost an allocation.

use super::error::{ConfigError, ConfigIssue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of run-time warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Issue {
    /// Input ended in the middle of a sequence, escape or attribute
    UnexpectedEol,
    /// A multi-byte sequence diverged from the registered bytes
    UnexpectedSymbol,
    /// A tag was never closed
    UnclosedTag,
    /// A closing tag appeared with nothing open
    MisplacedClosingTag,
    /// A closing tag does not close the innermost open tag
    OpenCloseTagMismatch,
    /// An opening tag is already open further up
    DuplicateNestedTag,
    /// An escape precedes a byte that needs no escaping
    RedundantEscape,
    /// No payload start symbol within the key length limit
    AttrKeyTooLong,
    /// No payload end symbol within the payload length limit
    AttrPayloadTooLong,
    /// The attribute payload is empty
    EmptyAttrPayload,
    /// Input ended inside an attribute payload
    UnclosedAttrPayload,
    /// A tag would nest deeper than the configured limit
    NestingTooDeep,
    /// Marker inserted when a truncating collector runs full
    WarningsTruncated,
}

impl Issue {
    /// Stable kebab-case name of the issue
    pub fn as_str(&self) -> &'static str {
        match self {
            Issue::UnexpectedEol => "unexpected-eol",
            Issue::UnexpectedSymbol => "unexpected-symbol",
            Issue::UnclosedTag => "unclosed-tag",
            Issue::MisplacedClosingTag => "misplaced-closing-tag",
            Issue::OpenCloseTagMismatch => "open-close-tag-mismatch",
            Issue::DuplicateNestedTag => "duplicate-nested-tag",
            Issue::RedundantEscape => "redundant-escape",
            Issue::AttrKeyTooLong => "attr-key-too-long",
            Issue::AttrPayloadTooLong => "attr-payload-too-long",
            Issue::EmptyAttrPayload => "empty-attr-payload",
            Issue::UnclosedAttrPayload => "unclosed-attr-payload",
            Issue::NestingTooDeep => "nesting-too-deep",
            Issue::WarningsTruncated => "warnings-truncated",
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded warning
///
/// `tag_id`, `expected` and `got` are zero when they do not apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Warning {
    /// What happened
    pub issue: Issue,
    /// Byte offset in the input
    pub pos: usize,
    /// Trigger byte of the tag involved
    pub tag_id: u8,
    /// Byte that was expected
    pub expected: u8,
    /// Byte that was found
    pub got: u8,
}

impl Warning {
    /// Create a warning with no context bytes
    #[inline]
    pub fn new(issue: Issue, pos: usize) -> Self {
        Self {
            issue,
            pos,
            tag_id: 0,
            expected: 0,
            got: 0,
        }
    }

    /// Set the tag involved
    #[inline]
    pub fn with_tag(mut self, tag_id: u8) -> Self {
        self.tag_id = tag_id;
        self
    }

    /// Set the expected byte
    #[inline]
    pub fn with_expected(mut self, expected: u8) -> Self {
        self.expected = expected;
        self
    }

    /// Set the byte actually found
    #[inline]
    pub fn with_got(mut self, got: u8) -> Self {
        self.got = got;
        self
    }
}

/// What a [`Warnings`] collector does once it reaches its capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Unbounded; capacity is only a preallocation hint
    NoCap,
    /// Record nothing
    NoRecord,
    /// Keep the first `capacity` warnings, remember where dropping started
    Drop,
    /// Keep `capacity - 1` warnings plus a truncation marker, count drops
    #[default]
    Truncate,
}

/// Bounded warnings collector
#[derive(Debug, Clone)]
pub struct Warnings {
    policy: OverflowPolicy,
    capacity: usize,
    list: Vec<Warning>,
    overflow: bool,
    dropped: usize,
    first_drop: Option<usize>,
}

impl Warnings {
    /// Create a collector, rejecting a negative capacity
    pub fn new(policy: OverflowPolicy, capacity: i64) -> Result<Self, ConfigError> {
        let capacity = usize::try_from(capacity).map_err(|_| {
            ConfigError::new(
                ConfigIssue::NegativeWarningsCap,
                format!("warnings capacity {} is negative", capacity),
            )
        })?;
        Ok(Self::with_capacity(policy, capacity))
    }

    /// Create a collector from an unsigned capacity
    pub fn with_capacity(policy: OverflowPolicy, capacity: usize) -> Self {
        let reserve = match policy {
            OverflowPolicy::NoRecord => 0,
            // Avoid reserving a huge hint up front
            _ => capacity.min(1024),
        };
        Self {
            policy,
            capacity,
            list: Vec::with_capacity(reserve),
            overflow: false,
            dropped: 0,
            first_drop: None,
        }
    }

    /// Record a warning according to the overflow policy
    pub fn add(&mut self, warning: Warning) {
        match self.policy {
            OverflowPolicy::NoCap => self.list.push(warning),
            OverflowPolicy::NoRecord => {}
            OverflowPolicy::Drop => {
                if self.list.len() < self.capacity {
                    self.list.push(warning);
                } else if !self.overflow {
                    self.overflow = true;
                    self.first_drop = Some(warning.pos);
                }
            }
            OverflowPolicy::Truncate => {
                if self.overflow {
                    self.dropped += 1;
                } else if self.list.len() + 1 < self.capacity {
                    self.list.push(warning);
                } else {
                    self.overflow = true;
                    self.dropped = 1;
                    self.first_drop = Some(warning.pos);
                    if self.capacity > 0 {
                        self.list
                            .push(Warning::new(Issue::WarningsTruncated, warning.pos));
                    }
                }
            }
        }
    }

    /// Recorded warnings in insertion order
    #[inline]
    pub fn list(&self) -> &[Warning] {
        &self.list
    }

    /// True once a warning has been turned away
    #[inline]
    pub fn is_overflow(&self) -> bool {
        self.overflow
    }

    /// Number of warnings turned away (counted by [`OverflowPolicy::Truncate`] only)
    #[inline]
    pub fn dropped_count(&self) -> usize {
        self.dropped
    }

    /// Position of the first warning turned away
    #[inline]
    pub fn first_drop_pos(&self) -> Option<usize> {
        self.first_drop
    }

    /// Number of recorded warnings
    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// True if nothing was recorded
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Forget everything, keeping policy and capacity
    pub fn clear(&mut self) {
        self.list.clear();
        self.overflow = false;
        self.dropped = 0;
        self.first_drop = None;
    }

    /// Overflow policy
    #[inline]
    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Configured capacity
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for Warnings {
    fn default() -> Self {
        Self::with_capacity(OverflowPolicy::NoCap, 0)
    }
}
