//! Human-readable tree dumps
//!
//! ```
//! use tagmark::{parse, Dictionary, Greed, Rule, TreePrinter, Warnings};
//!
//! let mut dict = Dictionary::default();
//! dict.add_universal_tag("bold", "*", Greed::NonGreedy, Rule::NotApplicable)
//!     .unwrap();
//! let mut warnings = Warnings::default();
//! let ast = parse("a *b*", &dict, &mut warnings);
//!
//! let dump = TreePrinter::new().print(&ast);
//! assert!(dump.contains("bold 2..5"));
//! ```

use super::ast::{Ast, NodeType, ROOT};
use std::fmt::Write;

/// Indented tree printer
pub struct TreePrinter {
    /// Indentation string
    indent: String,
    /// Maximum depth to print
    max_depth: Option<usize>,
    /// Print attributes under their node
    attributes: bool,
}

impl TreePrinter {
    /// Create a new tree printer
    pub fn new() -> Self {
        Self {
            indent: "  ".to_string(),
            max_depth: None,
            attributes: true,
        }
    }

    /// Set the indentation string
    pub fn indent(mut self, indent: &str) -> Self {
        self.indent = indent.to_string();
        self
    }

    /// Set the maximum depth to print
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Show or hide attributes
    pub fn attributes(mut self, show: bool) -> Self {
        self.attributes = show;
        self
    }

    /// Render the whole tree
    pub fn print(&self, ast: &Ast<'_>) -> String {
        let mut output = String::new();
        let mut stack = vec![(ROOT, 0usize)];
        // indents[d] is the prefix at depth d, built once per depth
        let mut indents = vec![String::new()];

        while let Some((idx, depth)) = stack.pop() {
            while indents.len() <= depth + 1 {
                let next = format!("{}{}", indents[indents.len() - 1], self.indent);
                indents.push(next);
            }
            let indent = indents[depth].as_str();
            let nested = indents[depth + 1].as_str();

            if self.max_depth.is_some_and(|max| depth > max) {
                let _ = writeln!(output, "{}...", indent);
                continue;
            }

            let node = ast.node(idx);
            let span = node.span;
            let _ = match node.node_type {
                NodeType::Root => writeln!(output, "{}root {}..{}", indent, span.start, span.end),
                NodeType::Text => writeln!(
                    output,
                    "{}text {:?} @ {}..{}",
                    indent,
                    ast.text(span),
                    span.start,
                    span.end
                ),
                NodeType::Tag => writeln!(
                    output,
                    "{}{} {}..{}",
                    indent,
                    ast.tag_name(idx).unwrap_or("?"),
                    span.start,
                    span.end
                ),
            };

            if self.attributes {
                for attr in ast.attributes_of(idx) {
                    let _ = if attr.is_flag {
                        writeln!(output, "{}@{{{}}}", nested, ast.text(attr.payload))
                    } else {
                        writeln!(
                            output,
                            "{}@{}={:?}",
                            nested,
                            ast.text(attr.name),
                            ast.text(attr.payload)
                        )
                    };
                }
            }

            // Reverse so the first child is printed first
            let children: Vec<usize> = ast.children(idx).collect();
            stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
        }

        output
    }
}

impl Default for TreePrinter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dictionary::Dictionary;
    use crate::engine::parser::parse;
    use crate::engine::tag::{Greed, Rule};
    use crate::engine::warnings::Warnings;

    fn dict() -> Dictionary {
        let mut dict = Dictionary::default();
        dict.add_universal_tag("bold", "*", Greed::NonGreedy, Rule::NotApplicable)
            .unwrap();
        dict.add_universal_tag("em", "_", Greed::NonGreedy, Rule::NotApplicable)
            .unwrap();
        dict.set_attribute_signature(b'!', b'{', b'}').unwrap();
        dict
    }

    #[test]
    fn test_print_order_and_indent() {
        let dict = dict();
        let mut warnings = Warnings::default();
        let ast = parse("*a _b_*!k{v}", &dict, &mut warnings);

        let dump = TreePrinter::new().indent("-").print(&ast);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(
            lines,
            [
                "root 0..12",
                "-bold 0..7",
                "--@k=\"v\"",
                "--text \"a \" @ 1..3",
                "--em 3..6",
                "---text \"b\" @ 4..5",
            ]
        );
    }

    #[test]
    fn test_deep_tree_indent() {
        let mut dict = Dictionary::default();
        dict.add_universal_tag("bold", "*", Greed::NonGreedy, Rule::NotApplicable)
            .unwrap();
        dict.add_universal_tag("strike", "~", Greed::NonGreedy, Rule::NotApplicable)
            .unwrap();
        let mut warnings = Warnings::default();
        let input = "*~".repeat(20);
        let ast = parse(&input, &dict, &mut warnings);

        let dump = TreePrinter::new().indent("-").print(&ast);
        for (depth, line) in dump.lines().enumerate() {
            let dashes = line.len() - line.trim_start_matches('-').len();
            assert_eq!(dashes, depth);
        }
        assert_eq!(dump.lines().count(), 41);
    }

    #[test]
    fn test_max_depth() {
        let dict = dict();
        let mut warnings = Warnings::default();
        let ast = parse("*_x_*", &dict, &mut warnings);

        let dump = TreePrinter::new().max_depth(1).attributes(false).print(&ast);
        assert_eq!(dump.lines().last(), Some("    ..."));
        assert!(!dump.contains("text"));
    }
}
