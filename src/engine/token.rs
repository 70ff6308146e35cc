//! Tokens produced by the tokenizer

use std::ops::Range;

/// Half-open byte range `[start, end)` into the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// First byte
    pub start: usize,
    /// One past the last byte
    pub end: usize,
}

impl Span {
    /// Create a new span
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start {} past end {}", start, end);
        Self { start, end }
    }

    /// Zero-width span at `at`
    #[inline]
    pub fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }

    /// Length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True for zero-width spans
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// As a `Range` for slicing
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// True if `other` lies entirely within this span
    #[inline]
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// The covered text, or `""` if the span does not fall on char boundaries
    #[inline]
    pub fn slice<'a>(&self, input: &'a str) -> &'a str {
        input.get(self.range()).unwrap_or("")
    }
}

/// Kind of token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    /// Plain text
    Text,
    /// A tag trigger, or a whole greedy tag
    Tag,
    /// Escape trigger plus the escaped code point
    Escape,
    /// Attribute with an empty key
    AttrFlag,
    /// Attribute with a key and a payload
    AttrKv,
}

/// One token
///
/// `pos..pos + width` is the raw input the token covers; tokens of one
/// tokenize call tile the input exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Kind of token
    pub token_type: TokenType,
    /// Trigger byte (0 for text)
    pub trigger: u8,
    /// Start offset
    pub pos: usize,
    /// Raw width in bytes
    pub width: usize,
    /// Content: the whole text, the inner part of a greedy tag, the escaped
    /// code point or the attribute payload
    pub payload: Span,
    /// Attribute key (AttrKv only)
    pub attr_key: Option<Span>,
}

impl Token {
    /// Text token over `span`
    #[inline]
    pub fn text(span: Span) -> Self {
        Self {
            token_type: TokenType::Text,
            trigger: 0,
            pos: span.start,
            width: span.len(),
            payload: span,
            attr_key: None,
        }
    }

    /// Tag token; `payload` is empty at the end of the trigger for non-greedy tags
    #[inline]
    pub fn tag(trigger: u8, pos: usize, width: usize, payload: Span) -> Self {
        Self {
            token_type: TokenType::Tag,
            trigger,
            pos,
            width,
            payload,
            attr_key: None,
        }
    }

    /// Escape token
    #[inline]
    pub fn escape(trigger: u8, pos: usize, payload: Span) -> Self {
        Self {
            token_type: TokenType::Escape,
            trigger,
            pos,
            width: payload.end - pos,
            payload,
            attr_key: None,
        }
    }

    /// Attribute token with an empty key
    #[inline]
    pub fn attr_flag(trigger: u8, pos: usize, width: usize, payload: Span) -> Self {
        Self {
            token_type: TokenType::AttrFlag,
            trigger,
            pos,
            width,
            payload,
            attr_key: None,
        }
    }

    /// Attribute token with a key
    #[inline]
    pub fn attr_kv(trigger: u8, pos: usize, width: usize, key: Span, payload: Span) -> Self {
        Self {
            token_type: TokenType::AttrKv,
            trigger,
            pos,
            width,
            payload,
            attr_key: Some(key),
        }
    }

    /// Raw span the token covers
    #[inline]
    pub fn raw(&self) -> Span {
        Span::new(self.pos, self.pos + self.width)
    }

    /// End offset of the raw span
    #[inline]
    pub fn end(&self) -> usize {
        self.pos + self.width
    }

    /// True for both attribute kinds
    #[inline]
    pub fn is_attribute(&self) -> bool {
        matches!(self.token_type, TokenType::AttrFlag | TokenType::AttrKv)
    }
}
