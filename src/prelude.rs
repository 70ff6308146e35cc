//! Prelude module for convenient imports
//!
//! ```
//! use tagmark::prelude::*;
//!
//! let mut dict = Dictionary::new(Limits::default());
//! dict.add_universal_tag("bold", "*", Greed::NonGreedy, Rule::NotApplicable)
//!     .unwrap();
//! let mut warnings = Warnings::default();
//! let ast = parse("*x*", &dict, &mut warnings);
//! assert_eq!(ast.root().child_count, 1);
//! ```

// ============================================================================
// Configuration
// ============================================================================

pub use crate::engine::{
    ConfigError, ConfigIssue, Dictionary, Greed, Limits, LoadError, MarkupConfig, Rule,
};

// ============================================================================
// Tokenizing and Parsing
// ============================================================================

pub use crate::engine::{parse, tokenize, Ast, MarkupParser, NodeType, Span, Token, TokenType};

// ============================================================================
// Diagnostics
// ============================================================================

pub use crate::engine::{Issue, OverflowPolicy, SerializableAst, TreePrinter, Warning, Warnings};
