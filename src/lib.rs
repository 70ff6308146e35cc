//! Tagmark - Configurable Single-Pass Markup Engine
//!
//! Turns untrusted user text plus a runtime-defined tag grammar into an
//! arena-backed tree. It provides:
//! - A byte-indexed [`Dictionary`] of tags, an escape trigger and attributes
//! - A tokenizer driven by step plans compiled once per tag
//! - A stack-based parser that recovers from every structural problem
//! - A bounded [`Warnings`] collector instead of parse errors
//! - Owned, serde-serializable trees and human-readable warning messages
//! - JSON-loadable dictionary configuration
//!
//! Tokenizing and parsing are total: any input yields a complete tree.
//!
//! ## Quick Start
//!
//! ```rust
//! use tagmark::{parse, Dictionary, Greed, Limits, OverflowPolicy, Rule, Warnings};
//!
//! let mut dict = Dictionary::new(Limits::default());
//! dict.add_universal_tag("bold", "*", Greed::NonGreedy, Rule::NotApplicable)
//!     .unwrap();
//! dict.add_universal_tag("code", "`", Greed::Greedy, Rule::TagVsContent)
//!     .unwrap();
//!
//! let mut warnings = Warnings::new(OverflowPolicy::Truncate, 16).unwrap();
//! let ast = parse("*hello* `world`", &dict, &mut warnings);
//!
//! let tree = ast.serialize(&warnings).tree;
//! assert_eq!(tree.children[0].name, "bold");
//! assert_eq!(tree.children[2].children[0].content, "world");
//! assert!(warnings.is_empty());
//! ```
//!
//! ## Loading a Dictionary from JSON
//!
//! ```rust
//! use tagmark::Dictionary;
//!
//! let dict = Dictionary::from_json(r#"{
//!     "escape": "\\",
//!     "tags": [ { "name": "bold", "seq": "*" } ]
//! }"#).unwrap();
//! assert!(dict.tag(b'*').is_some());
//! ```
//!
//! ## Feature Flags
//!
//! - `logging` - Enable debug logging using the `log` crate
//! - `parallel` - Parse batches on the rayon thread pool

// Lint configuration for production quality
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all)]
#![allow(clippy::new_without_default)]

// Prelude module for convenient imports
pub mod prelude;

// Markup engine
pub mod engine;

/// Re-export commonly used types for convenience
pub use engine::{
    parse, parse_batch, tokenize, Ast, AttrSignature, Attribute, ConfigError, ConfigIssue,
    Dictionary, Greed, Issue, Limits, LoadError, MarkupConfig, MarkupParser, Node, NodeType,
    OverflowPolicy, ParseOutcome, Rule, SerializableAst, SerializableNode, SerializableWarning,
    SourcePosition, Span, Tag, TagKind, Token, TokenType, TreePrinter, Warning, Warnings,
};
