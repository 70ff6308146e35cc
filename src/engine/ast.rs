//! Arena-backed markup tree
//!
//! All nodes of one parse live in a single `Vec<Node>` and refer to each
//! other by index. Children form a singly linked list through
//! `first_child`/`next_sibling`, with `last_child` kept for O(1) appends.
//! Attributes live in a second arena; each node owns one contiguous run of
//! it described by an [`AttrRange`].
//!
//! Node 0 is always the root. Nodes are never removed or moved, so an index
//! stays valid for the lifetime of the [`Ast`].

use super::dictionary::Dictionary;
use super::token::Span;
use serde::{Deserialize, Serialize};

/// Index of the root node
pub const ROOT: usize = 0;

/// Kind of node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// The whole input
    Root,
    /// Literal text
    Text,
    /// A tag and its content
    Tag,
}

/// Contiguous run in the attribute arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttrRange {
    /// First attribute
    pub start: usize,
    /// Number of attributes
    pub len: usize,
}

impl AttrRange {
    /// One past the last attribute
    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// An attribute attached to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    /// Key (empty for flags)
    pub name: Span,
    /// Payload
    pub payload: Span,
    /// True when the key is empty
    pub is_flag: bool,
}

/// One tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
    /// Kind of node
    pub node_type: NodeType,
    /// Trigger byte (tags only)
    pub tag_id: u8,
    /// Covered input
    pub span: Span,
    /// First child
    pub first_child: Option<usize>,
    /// Last child
    pub last_child: Option<usize>,
    /// Next sibling
    pub next_sibling: Option<usize>,
    /// Number of children
    pub child_count: usize,
    /// Attached attributes
    pub attributes: AttrRange,
}

impl Node {
    fn new(node_type: NodeType, tag_id: u8, span: Span) -> Self {
        Self {
            node_type,
            tag_id,
            span,
            first_child: None,
            last_child: None,
            next_sibling: None,
            child_count: 0,
            attributes: AttrRange::default(),
        }
    }

    /// Root node over `span`
    pub fn root(span: Span) -> Self {
        Self::new(NodeType::Root, 0, span)
    }

    /// Text node over `span`
    pub fn text(span: Span) -> Self {
        Self::new(NodeType::Text, 0, span)
    }

    /// Tag node for `tag_id` over `span`
    pub fn tag(tag_id: u8, span: Span) -> Self {
        Self::new(NodeType::Tag, tag_id, span)
    }
}

/// The parse tree of one input
#[derive(Debug, Clone)]
pub struct Ast<'a> {
    input: &'a str,
    dict: &'a Dictionary,
    nodes: Vec<Node>,
    attributes: Vec<Attribute>,
}

impl<'a> Ast<'a> {
    /// Create a tree holding only the root
    pub fn new(input: &'a str, dict: &'a Dictionary) -> Self {
        Self::with_capacity(input, dict, 1)
    }

    /// Create a tree with room for `capacity` nodes
    pub fn with_capacity(input: &'a str, dict: &'a Dictionary, capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity.max(1));
        nodes.push(Node::root(Span::new(0, input.len())));
        Self {
            input,
            dict,
            nodes,
            attributes: Vec::new(),
        }
    }

    /// Append `node` as the last child of `parent`, returning its index
    pub fn append_node(&mut self, parent: usize, node: Node) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(node);

        let previous = self.nodes[parent].last_child;
        match previous {
            Some(prev) => self.nodes[prev].next_sibling = Some(idx),
            None => self.nodes[parent].first_child = Some(idx),
        }
        let parent_node = &mut self.nodes[parent];
        parent_node.last_child = Some(idx);
        parent_node.child_count += 1;
        idx
    }

    /// Attach `attr` to `node`
    pub fn append_attribute(&mut self, node: usize, attr: Attribute) {
        let tail = self.attributes.len();
        let range = self.nodes[node].attributes;

        if range.len == 0 {
            self.nodes[node].attributes.start = tail;
        } else if range.end() != tail {
            // Another node attached attributes since; move this run to the tail
            self.attributes.extend_from_within(range.start..range.end());
            self.nodes[node].attributes.start = tail;
        }

        self.attributes.push(attr);
        self.nodes[node].attributes.len += 1;
    }

    /// Node at `idx`
    #[inline]
    pub fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, idx: usize) -> &mut Node {
        &mut self.nodes[idx]
    }

    /// All nodes in creation order
    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Root node
    #[inline]
    pub fn root(&self) -> &Node {
        &self.nodes[ROOT]
    }

    /// Whole attribute arena
    #[inline]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Attributes attached to `idx`
    pub fn attributes_of(&self, idx: usize) -> &[Attribute] {
        let range = self.nodes[idx].attributes;
        &self.attributes[range.start..range.end()]
    }

    /// Children of `idx` in order
    pub fn children(&self, idx: usize) -> Children<'_, 'a> {
        Children {
            ast: self,
            next: self.nodes[idx].first_child,
        }
    }

    /// Input text covered by `span`
    #[inline]
    pub fn text(&self, span: Span) -> &'a str {
        span.slice(self.input)
    }

    /// The parsed input
    #[inline]
    pub fn input(&self) -> &'a str {
        self.input
    }

    /// The dictionary used for parsing
    #[inline]
    pub fn dictionary(&self) -> &'a Dictionary {
        self.dict
    }

    /// Name of the tag at `idx`, if it is a tag node
    pub fn tag_name(&self, idx: usize) -> Option<&'a str> {
        let node = &self.nodes[idx];
        match node.node_type {
            NodeType::Tag => self.dict.tag(node.tag_id).map(|tag| tag.name()),
            _ => None,
        }
    }

    /// Number of nodes, root included
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the root exists from construction
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Iterator over the children of one node
pub struct Children<'t, 'a> {
    ast: &'t Ast<'a>,
    next: Option<usize>,
}

impl Iterator for Children<'_, '_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        self.next = self.ast.nodes[current].next_sibling;
        Some(current)
    }
}
