//! Markup engine
//!
//! # Module Organization
//!
//! ## Configuration
//! - [`tag`] - Tag value types and their validation
//! - [`dictionary`] - Byte-indexed table of compiled actions
//! - [`config`] - JSON-loadable dictionary configuration
//! - [`error`] - Configuration errors
//!
//! ## Scanning
//! - [`action`] - Compiled step plans run per trigger byte
//! - [`token`] - Tokens and byte spans
//! - [`tokenizer`] - Single-pass tokenizer
//!
//! ## Tree Building
//! - [`ast`] - Arena-backed node tree
//! - [`parser`] - Stack-based parser with structural recovery
//! - [`parallel`] - Batch parsing over one shared dictionary
//!
//! ## Diagnostics
//! - [`warnings`] - Bounded run-time warnings collector
//! - [`serialize`] - Owned tree and warning messages
//! - [`source_location`] - Line/column positions
//! - [`debug`] - Tree printer

// ============================================================================
// Logging
// ============================================================================

/// Debug-level log, compiled out without the `logging` feature
#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

/// Trace-level log, compiled out without the `logging` feature
#[cfg(not(feature = "logging"))]
macro_rules! log_trace {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "logging")]
macro_rules! log_trace {
    ($($arg:tt)*) => { log::trace!($($arg)*) };
}

// ============================================================================
// Module Declarations
// ============================================================================

pub mod action;
pub mod ast;
pub mod config;
pub mod debug;
pub mod dictionary;
pub mod error;
pub mod parser;
pub mod serialize;
pub mod source_location;
pub mod tag;
pub mod token;
pub mod tokenizer;
pub mod warnings;

// Batch parsing (always available, uses rayon when the feature is enabled)
pub mod parallel;

// ============================================================================
// Configuration
// ============================================================================

pub use config::{
    AttributeConfig, LimitsConfig, LoadError, MarkupConfig, TagConfig, WarningsConfig,
};
pub use dictionary::{AttrSignature, Dictionary, Limits};
pub use error::{ConfigError, ConfigIssue};
pub use tag::{Greed, Rule, Tag, TagKind, TagSequence};

// ============================================================================
// Scanning
// ============================================================================

pub use action::{Action, ActionContext, ActionResult, ActionTarget, Bounds, Flow, Step};
pub use token::{Span, Token, TokenType};
pub use tokenizer::{tokenize, Tokenizer};

// ============================================================================
// Tree Building
// ============================================================================

pub use ast::{AttrRange, Attribute, Ast, Node, NodeType};
pub use parallel::{parse_batch, ParseOutcome};
pub use parser::{parse, MarkupParser};

// ============================================================================
// Diagnostics
// ============================================================================

pub use debug::TreePrinter;
pub use serialize::{SerializableAst, SerializableAttribute, SerializableNode, SerializableWarning};
pub use source_location::{LineIndex, SourcePosition};
pub use warnings::{Issue, OverflowPolicy, Warning, Warnings};
