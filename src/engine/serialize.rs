//! Self-contained tree and warning values
//!
//! The index-based [`Ast`] borrows its input and dictionary. Serializing it
//! produces owned, nested values that can be handed to other layers or
//! written out as JSON. Warning messages are formatted here and nowhere
//! else, so the scanning path never allocates for diagnostics.

use super::ast::{Ast, NodeType};
use super::dictionary::Dictionary;
use super::error::describe_byte;
use super::source_location::LineIndex;
use super::warnings::{Issue, Warning, Warnings};
use serde::{Deserialize, Serialize};

/// A serialized parse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableAst {
    /// Root of the tree
    pub tree: SerializableNode,
    /// Input length in bytes
    pub text_length: usize,
    /// Recorded warnings with messages
    pub warnings: Vec<SerializableWarning>,
}

/// A serialized node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableNode {
    /// Tag name, or `root` / `text`
    pub name: String,
    /// Kind of node
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Covered input
    pub content: String,
    /// Children in order
    pub children: Vec<SerializableNode>,
    /// Attached attributes
    pub attributes: Vec<SerializableAttribute>,
    /// Index of the node in the arena
    pub id: usize,
}

impl Drop for SerializableNode {
    // Descendants are detached onto a heap stack; drop depth stays constant
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// A serialized attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableAttribute {
    /// Key (empty for flags)
    pub name: String,
    /// Payload
    pub payload: String,
    /// True when the key is empty
    pub is_flag: bool,
}

/// A serialized warning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableWarning {
    /// Kebab-case issue name
    pub issue: String,
    /// Byte offset
    pub pos: usize,
    /// Line (1-based)
    pub line: usize,
    /// Column in code points (1-based)
    pub column: usize,
    /// Human-readable message
    pub message: String,
}

impl SerializableAst {
    /// Serialize to compact JSON
    #[inline]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to indented JSON
    #[inline]
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON
    #[inline]
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl Ast<'_> {
    /// Serialize the tree together with the warnings recorded for it
    pub fn serialize(&self, warnings: &Warnings) -> SerializableAst {
        let index = LineIndex::new(self.input());
        let dict = self.dictionary();
        let dropped = warnings.dropped_count();

        SerializableAst {
            tree: self.to_tree(),
            text_length: self.input().len(),
            warnings: warnings
                .list()
                .iter()
                .map(|warning| {
                    let pos = index.position(warning.pos);
                    SerializableWarning {
                        issue: warning.issue.as_str().to_string(),
                        pos: warning.pos,
                        line: pos.line,
                        column: pos.column,
                        message: message(dict, warning, dropped),
                    }
                })
                .collect(),
        }
    }

    /// Serialize the tree alone
    pub fn to_tree(&self) -> SerializableNode {
        // Children always sit after their parent in the arena, so building
        // from the back finds every child already converted
        let nodes = self.nodes();
        let mut built: Vec<Option<SerializableNode>> = vec![None; nodes.len()];

        for idx in (0..nodes.len()).rev() {
            let node = &nodes[idx];
            let children = self
                .children(idx)
                .filter_map(|child| built[child].take())
                .collect();
            let attributes = self
                .attributes_of(idx)
                .iter()
                .map(|attr| SerializableAttribute {
                    name: self.text(attr.name).to_string(),
                    payload: self.text(attr.payload).to_string(),
                    is_flag: attr.is_flag,
                })
                .collect();
            let name = match node.node_type {
                NodeType::Root => "root",
                NodeType::Text => "text",
                NodeType::Tag => self.tag_name(idx).unwrap_or("tag"),
            };

            built[idx] = Some(SerializableNode {
                name: name.to_string(),
                node_type: node.node_type,
                content: self.text(node.span).to_string(),
                children,
                attributes,
                id: idx,
            });
        }

        built
            .first_mut()
            .and_then(Option::take)
            .unwrap_or_else(|| SerializableNode {
                name: "root".to_string(),
                node_type: NodeType::Root,
                content: String::new(),
                children: Vec::new(),
                attributes: Vec::new(),
                id: 0,
            })
    }
}

fn label(dict: &Dictionary, id: u8) -> String {
    match dict.tag(id) {
        Some(tag) => format!("tag {:?}", tag.name()),
        None => describe_byte(id),
    }
}

/// Human-readable message for `warning`
///
/// `dropped` is the number of warnings a truncating collector turned away.
pub fn message(dict: &Dictionary, warning: &Warning, dropped: usize) -> String {
    let limits = dict.limits();
    match warning.issue {
        Issue::UnexpectedEol => format!(
            "input ended inside {}",
            label(dict, warning.tag_id)
        ),
        Issue::UnexpectedSymbol => format!(
            "{} expected {} but found {}",
            label(dict, warning.tag_id),
            describe_byte(warning.expected),
            describe_byte(warning.got)
        ),
        Issue::UnclosedTag => format!("{} is never closed", label(dict, warning.tag_id)),
        Issue::MisplacedClosingTag => {
            format!("{} has nothing to close", label(dict, warning.tag_id))
        }
        Issue::OpenCloseTagMismatch => format!(
            "{} does not close the innermost tag, which expects {}",
            label(dict, warning.tag_id),
            label(dict, warning.expected)
        ),
        Issue::DuplicateNestedTag => {
            format!("{} is already open", label(dict, warning.tag_id))
        }
        Issue::RedundantEscape => "escaped character needs no escaping".to_string(),
        Issue::AttrKeyTooLong => format!(
            "attribute key is longer than {} bytes",
            limits.max_attr_key_len
        ),
        Issue::AttrPayloadTooLong => format!(
            "attribute payload is longer than {} bytes",
            limits.max_attr_payload_len
        ),
        Issue::EmptyAttrPayload => "attribute payload is empty".to_string(),
        Issue::UnclosedAttrPayload => "attribute payload is never closed".to_string(),
        Issue::NestingTooDeep => format!(
            "{} would nest deeper than {} tags",
            label(dict, warning.tag_id),
            limits.max_depth
        ),
        Issue::WarningsTruncated => format!("{} further warnings were dropped", dropped),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dictionary::Limits;
    use crate::engine::parser::parse;
    use crate::engine::tag::{Greed, Rule};
    use crate::engine::warnings::OverflowPolicy;

    fn dict() -> Dictionary {
        let mut dict = Dictionary::new(Limits::default());
        dict.add_universal_tag("bold", "*", Greed::NonGreedy, Rule::NotApplicable)
            .unwrap();
        dict.set_attribute_signature(b'!', b'{', b'}').unwrap();
        dict
    }

    #[test]
    fn test_tree_shape() {
        let dict = dict();
        let mut warnings = Warnings::with_capacity(OverflowPolicy::NoCap, 4);
        let ast = parse("a *b*!k{v}", &dict, &mut warnings);
        let out = ast.serialize(&warnings);

        assert_eq!(out.text_length, 10);
        assert_eq!(out.tree.node_type, NodeType::Root);
        assert_eq!(out.tree.children.len(), 2);

        let bold = &out.tree.children[1];
        assert_eq!(bold.name, "bold");
        assert_eq!(bold.content, "*b*");
        assert_eq!(bold.children[0].content, "b");
        assert_eq!(bold.attributes[0].name, "k");
        assert_eq!(bold.attributes[0].payload, "v");
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_warning_messages() {
        let dict = dict();
        let mut warnings = Warnings::with_capacity(OverflowPolicy::NoCap, 4);
        let ast = parse("x\n*open", &dict, &mut warnings);
        let out = ast.serialize(&warnings);

        assert_eq!(out.warnings.len(), 1);
        let w = &out.warnings[0];
        assert_eq!(w.issue, "unclosed-tag");
        assert_eq!((w.pos, w.line, w.column), (2, 2, 1));
        assert_eq!(w.message, "tag \"bold\" is never closed");
    }

    #[test]
    fn test_truncation_message() {
        let dict = dict();
        let marker = Warning::new(Issue::WarningsTruncated, 0);
        assert_eq!(message(&dict, &marker, 3), "3 further warnings were dropped");

        let w = Warning::new(Issue::UnexpectedEol, 0).with_tag(b'!');
        assert_eq!(message(&dict, &w, 0), "input ended inside '!'");
    }

    #[test]
    fn test_json_round_trip() {
        let dict = dict();
        let mut warnings = Warnings::with_capacity(OverflowPolicy::NoCap, 4);
        let ast = parse("*a*", &dict, &mut warnings);
        let out = ast.serialize(&warnings);

        let json = out.to_json().unwrap();
        assert!(json.contains("\"type\":\"tag\""));
        assert_eq!(SerializableAst::from_json(&json).unwrap(), out);
    }
}
