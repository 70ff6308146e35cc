//! Stack-based markup parser
//!
//! Turns a token stream into an [`Ast`] in a single pass without
//! backtracking. Nesting is tracked with three depth-parallel stacks:
//!
//! - `breadcrumbs`: node index of every open ancestor, root first
//! - `tag_stack`: trigger byte of every open ancestor
//! - `cum_width`: bytes consumed so far at each depth
//!
//! A tag's span end is its start plus the width accumulated at its depth,
//! so no second pass over the tree is needed. Structural problems never
//! abort the parse; they are recorded as warnings and the offending token
//! is either folded into the text or absorbed.
//!
//! At most [`Limits::max_depth`](super::Limits::max_depth) tags are open at
//! once. A tag that would nest deeper is kept as text, and so is the
//! closing tag that would have matched it.

use super::ast::{Ast, Attribute, Node, NodeType, ROOT};
use super::dictionary::Dictionary;
use super::tag::{Tag, TagKind};
use super::token::{Span, Token, TokenType};
use super::tokenizer::tokenize;
use super::warnings::{Issue, Warning, Warnings};

/// Tokenize and parse `input`
pub fn parse<'a>(input: &'a str, dict: &'a Dictionary, warnings: &mut Warnings) -> Ast<'a> {
    MarkupParser::new(dict, input).parse(warnings)
}

/// Parser bound to one dictionary and input
pub struct MarkupParser<'a> {
    dict: &'a Dictionary,
    input: &'a str,
}

impl<'a> MarkupParser<'a> {
    /// Create a parser
    pub fn new(dict: &'a Dictionary, input: &'a str) -> Self {
        Self { dict, input }
    }

    /// Tokenize the input and build the tree
    pub fn parse(&self, warnings: &mut Warnings) -> Ast<'a> {
        let tokens = tokenize(self.dict, self.input, warnings);
        self.parse_tokens(&tokens, warnings)
    }

    /// Build the tree from an existing token stream over the same input
    pub fn parse_tokens(&self, tokens: &[Token], warnings: &mut Warnings) -> Ast<'a> {
        log_debug!("parsing {} tokens", tokens.len());

        let mut builder = TreeBuilder::new(self.dict, self.input, tokens.len(), warnings);
        for token in tokens {
            builder.feed(token);
        }
        let ast = builder.finish();

        log_debug!("parsed into {} nodes", ast.len());
        ast
    }
}

struct TreeBuilder<'p, 'a> {
    ast: Ast<'a>,
    dict: &'a Dictionary,
    warnings: &'p mut Warnings,
    breadcrumbs: Vec<usize>,
    tag_stack: Vec<u8>,
    cum_width: Vec<usize>,
    opened: [u32; 256],
    skip: [u32; 256],
    literal: [u32; 256],
    last_node: usize,
}

impl<'p, 'a> TreeBuilder<'p, 'a> {
    fn new(
        dict: &'a Dictionary,
        input: &'a str,
        token_count: usize,
        warnings: &'p mut Warnings,
    ) -> Self {
        Self {
            ast: Ast::with_capacity(input, dict, token_count + 1),
            dict,
            warnings,
            breadcrumbs: vec![ROOT],
            tag_stack: vec![0],
            cum_width: vec![0],
            opened: [0; 256],
            skip: [0; 256],
            literal: [0; 256],
            last_node: ROOT,
        }
    }

    #[inline]
    fn parent(&self) -> usize {
        self.breadcrumbs.last().copied().unwrap_or(ROOT)
    }

    #[inline]
    fn depth(&self) -> usize {
        self.tag_stack.len() - 1
    }

    #[inline]
    fn grow(&mut self, width: usize) {
        if let Some(total) = self.cum_width.last_mut() {
            *total += width;
        }
    }

    fn feed(&mut self, token: &Token) {
        let dict = self.dict;
        match token.token_type {
            TokenType::Text => self.append_text(token.raw(), token.width),
            TokenType::Escape => self.append_text(token.payload, token.width),
            TokenType::AttrFlag | TokenType::AttrKv => self.attach_attribute(token),
            TokenType::Tag => match dict.tag(token.trigger) {
                Some(tag) => self.feed_tag(tag, token),
                None => self.append_text(token.raw(), token.width),
            },
        }
    }

    fn feed_tag(&mut self, tag: &Tag, token: &Token) {
        if tag.is_greedy() {
            self.append_greedy(tag, token);
            return;
        }

        let id = tag.id();
        match tag.kind() {
            TagKind::Universal => {
                if self.depth() > 0 && self.tag_stack.last() == Some(&id) {
                    self.close(token);
                } else {
                    self.open(tag, token);
                }
            }
            TagKind::Opening => {
                if self.opened[id as usize] > 0 {
                    self.warnings
                        .add(Warning::new(Issue::DuplicateNestedTag, token.pos).with_tag(id));
                    self.skip[tag.close_id() as usize] += 1;
                    log_trace!("duplicate {:?} at {} absorbed", tag.name(), token.pos);
                    self.grow(token.width);
                } else {
                    self.open(tag, token);
                }
            }
            TagKind::Closing => self.feed_closing(tag, token),
        }
    }

    fn feed_closing(&mut self, tag: &Tag, token: &Token) {
        let id = tag.id();

        if self.skip[id as usize] > 0 {
            self.skip[id as usize] -= 1;
            self.grow(token.width);
            return;
        }

        if self.literal[id as usize] > 0 {
            self.literal[id as usize] -= 1;
            self.append_text(token.raw(), token.width);
            return;
        }

        if self.depth() == 0 {
            self.warnings
                .add(Warning::new(Issue::MisplacedClosingTag, token.pos).with_tag(id));
            self.append_text(token.raw(), token.width);
            return;
        }

        let innermost = self.tag_stack.last().copied().unwrap_or(0);
        let expected = self
            .dict
            .tag(innermost)
            .map(Tag::close_id)
            .unwrap_or(0);
        if expected != id {
            self.warnings.add(
                Warning::new(Issue::OpenCloseTagMismatch, token.pos)
                    .with_tag(id)
                    .with_expected(expected)
                    .with_got(id),
            );
            log_trace!("closing {:?} at {} kept as text", tag.name(), token.pos);
            self.append_text(token.raw(), token.width);
            return;
        }

        self.close(token);
    }

    fn append_text(&mut self, span: Span, width: usize) {
        let parent = self.parent();

        // Adjacent text merges into the previous text node
        let merged = self.ast.node(parent).last_child.filter(|&last| {
            let node = self.ast.node(last);
            node.node_type == NodeType::Text
                && node.attributes.len == 0
                && node.span.end == span.start
        });

        self.last_node = match merged {
            Some(last) => {
                self.ast.node_mut(last).span.end = span.end;
                last
            }
            None => self.ast.append_node(parent, Node::text(span)),
        };
        self.grow(width);
    }

    /// Keep `token` as text if opening `tag` would exceed the depth limit
    fn at_depth_limit(&mut self, tag: &Tag, token: &Token) -> bool {
        let limit = self.dict.limits().max_depth;
        if self.depth() < limit {
            return false;
        }

        let id = tag.id();
        self.warnings
            .add(Warning::new(Issue::NestingTooDeep, token.pos).with_tag(id));
        if tag.kind() == TagKind::Opening && !tag.is_greedy() {
            self.literal[tag.close_id() as usize] += 1;
        }
        log_trace!("{:?} at {} exceeds depth {}, kept as text", tag.name(), token.pos, limit);
        self.append_text(token.raw(), token.width);
        true
    }

    fn append_greedy(&mut self, tag: &Tag, token: &Token) {
        if self.at_depth_limit(tag, token) {
            return;
        }
        let parent = self.parent();
        let tag = self
            .ast
            .append_node(parent, Node::tag(token.trigger, token.raw()));
        self.ast.append_node(tag, Node::text(token.payload));
        self.last_node = tag;
        self.grow(token.width);
    }

    fn attach_attribute(&mut self, token: &Token) {
        let attr = Attribute {
            name: token.attr_key.unwrap_or(Span::empty(token.pos + 1)),
            payload: token.payload,
            is_flag: token.token_type == TokenType::AttrFlag,
        };
        self.ast.append_attribute(self.last_node, attr);
        self.grow(token.width);
    }

    fn open(&mut self, tag: &Tag, token: &Token) {
        if self.at_depth_limit(tag, token) {
            return;
        }
        let parent = self.parent();
        let idx = self
            .ast
            .append_node(parent, Node::tag(token.trigger, token.raw()));

        self.breadcrumbs.push(idx);
        self.tag_stack.push(token.trigger);
        self.cum_width.push(token.width);
        self.opened[token.trigger as usize] += 1;
        self.last_node = idx;
    }

    fn close(&mut self, token: &Token) {
        let (Some(idx), Some(id), Some(width)) = (
            self.breadcrumbs.pop(),
            self.tag_stack.pop(),
            self.cum_width.pop(),
        ) else {
            return;
        };
        self.end_node(idx, id, width + token.width);
        self.last_node = idx;
    }

    fn end_node(&mut self, idx: usize, id: u8, total: usize) {
        let node = self.ast.node_mut(idx);
        node.span.end = node.span.start + total;
        self.opened[id as usize] = self.opened[id as usize].saturating_sub(1);
        self.grow(total);
    }

    fn finish(mut self) -> Ast<'a> {
        while self.depth() > 0 {
            let (Some(idx), Some(id), Some(width)) = (
                self.breadcrumbs.pop(),
                self.tag_stack.pop(),
                self.cum_width.pop(),
            ) else {
                break;
            };
            let start = self.ast.node(idx).span.start;
            self.warnings
                .add(Warning::new(Issue::UnclosedTag, start).with_tag(id));
            log_trace!("force-closing {:?} opened at {}", id as char, start);
            self.end_node(idx, id, width);
        }

        let total = self.cum_width.first().copied().unwrap_or(0);
        self.ast.node_mut(ROOT).span = Span::new(0, total);
        self.ast
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dictionary::Limits;
    use crate::engine::tag::{Greed, Rule};
    use crate::engine::warnings::OverflowPolicy;

    fn bbcode() -> Dictionary {
        let mut dict = Dictionary::new(Limits::default());
        dict.add_universal_tag("bold", "*", Greed::NonGreedy, Rule::NotApplicable)
            .unwrap();
        dict.add_opening_tag("open", "[", Greed::NonGreedy, b']').unwrap();
        dict.add_closing_tag("close", "]", b'[').unwrap();
        dict
    }

    fn warnings() -> Warnings {
        Warnings::with_capacity(OverflowPolicy::NoCap, 8)
    }

    fn issues(w: &Warnings) -> Vec<Issue> {
        w.list().iter().map(|w| w.issue).collect()
    }

    #[test]
    fn test_simple_tree() {
        let dict = bbcode();
        let mut w = warnings();
        let ast = parse("a*b*c", &dict, &mut w);

        let kids: Vec<_> = ast.children(ROOT).collect();
        assert_eq!(kids.len(), 3);
        let bold = ast.node(kids[1]);
        assert_eq!(bold.node_type, NodeType::Tag);
        assert_eq!(bold.span, Span::new(1, 4));
        assert_eq!(ast.root().span, Span::new(0, 5));
        assert!(w.is_empty());
    }

    #[test]
    fn test_unclosed_is_force_closed() {
        let dict = bbcode();
        let mut w = warnings();
        let ast = parse("x[a*b", &dict, &mut w);

        assert_eq!(issues(&w), [Issue::UnclosedTag, Issue::UnclosedTag]);
        // Innermost first
        assert_eq!(w.list()[0].tag_id, b'*');
        assert_eq!(w.list()[0].pos, 3);
        assert_eq!(w.list()[1].tag_id, b'[');

        let open = ast.children(ROOT).nth(1).unwrap();
        assert_eq!(ast.node(open).span, Span::new(1, 5));
    }

    #[test]
    fn test_duplicate_nested_opening() {
        let dict = bbcode();
        let mut w = warnings();
        let ast = parse("[a[b]c]", &dict, &mut w);

        assert_eq!(issues(&w), [Issue::DuplicateNestedTag]);
        let open = ast.children(ROOT).next().unwrap();
        assert_eq!(ast.node(open).span, Span::new(0, 7));
        assert_eq!(ast.root().child_count, 1);
    }

    #[test]
    fn test_mismatch_becomes_text() {
        let dict = bbcode();
        let mut w = warnings();
        let ast = parse("*a]b*", &dict, &mut w);

        assert_eq!(issues(&w), [Issue::OpenCloseTagMismatch]);
        let warning = w.list()[0];
        assert_eq!((warning.expected, warning.got), (b'*', b']'));

        let bold = ast.children(ROOT).next().unwrap();
        let text: Vec<_> = ast
            .children(bold)
            .map(|i| ast.text(ast.node(i).span))
            .collect();
        assert_eq!(text, ["a]b"]);
    }

    #[test]
    fn test_greedy_unit() {
        let mut dict = Dictionary::new(Limits::default());
        dict.add_universal_tag("spoiler", "||", Greed::Greedy, Rule::NotApplicable)
            .unwrap();
        let mut w = warnings();
        let ast = parse("a||b||", &dict, &mut w);

        let spoiler = ast.children(ROOT).nth(1).unwrap();
        assert_eq!(ast.node(spoiler).span, Span::new(1, 6));
        let inner = ast.children(spoiler).next().unwrap();
        assert_eq!(ast.text(ast.node(inner).span), "b");
        assert_eq!(ast.node(spoiler).child_count, 1);
    }

    #[test]
    fn test_attributes_attach_to_previous_node() {
        let mut dict = bbcode();
        dict.set_attribute_signature(b'!', b'{', b'}').unwrap();
        let input = "*a*!k{v}!{f}";
        let mut w = warnings();
        let ast = parse(input, &dict, &mut w);

        let bold = ast.children(ROOT).next().unwrap();
        let attrs = ast.attributes_of(bold);
        assert_eq!(attrs.len(), 2);
        assert_eq!(ast.text(attrs[0].name), "k");
        assert_eq!(ast.text(attrs[0].payload), "v");
        assert!(!attrs[0].is_flag);
        assert!(attrs[1].is_flag);
        assert_eq!(ast.root().span.end, input.len());
    }

    #[test]
    fn test_escape_becomes_text() {
        let mut dict = bbcode();
        dict.set_escape_trigger(b'\\').unwrap();
        let mut w = warnings();
        let ast = parse("a\\*b", &dict, &mut w);

        let texts: Vec<_> = ast
            .children(ROOT)
            .map(|i| ast.text(ast.node(i).span))
            .collect();
        assert_eq!(texts, ["a", "*b"]);
        assert!(w.is_empty());
    }

    #[test]
    fn test_depth_limit_keeps_tags_as_text() {
        let mut dict = Dictionary::new(Limits::default().with_max_depth(2));
        dict.add_universal_tag("bold", "*", Greed::NonGreedy, Rule::NotApplicable)
            .unwrap();
        dict.add_universal_tag("strike", "~", Greed::NonGreedy, Rule::NotApplicable)
            .unwrap();
        dict.add_opening_tag("open", "[", Greed::NonGreedy, b']').unwrap();
        dict.add_closing_tag("close", "]", b'[').unwrap();

        let mut w = warnings();
        let ast = parse("*~[a]~*", &dict, &mut w);

        assert_eq!(issues(&w), [Issue::NestingTooDeep]);
        assert_eq!(w.list()[0].pos, 2);
        let bold = ast.children(ROOT).next().unwrap();
        let strike = ast.children(bold).next().unwrap();
        let texts: Vec<_> = ast
            .children(strike)
            .map(|i| ast.text(ast.node(i).span))
            .collect();
        // The matching close stays text without a mismatch warning
        assert_eq!(texts, ["[a]"]);
        assert_eq!(ast.node(bold).span, Span::new(0, 7));
    }

    #[test]
    fn test_depth_limit_applies_to_greedy_units() {
        let mut dict = Dictionary::new(Limits::default().with_max_depth(1));
        dict.add_universal_tag("bold", "*", Greed::NonGreedy, Rule::NotApplicable)
            .unwrap();
        dict.add_universal_tag("code", "`", Greed::Greedy, Rule::TagVsContent)
            .unwrap();

        let mut w = warnings();
        let ast = parse("`x` *`y`*", &dict, &mut w);

        assert_eq!(issues(&w), [Issue::NestingTooDeep]);
        assert_eq!(ast.nodes().iter().filter(|n| n.node_type == NodeType::Tag).count(), 2);
    }

    #[test]
    fn test_parse_tokens() {
        let dict = bbcode();
        let input = "*x*";
        let mut w = warnings();
        let tokens = tokenize(&dict, input, &mut w);
        let ast = MarkupParser::new(&dict, input).parse_tokens(&tokens, &mut w);
        assert_eq!(ast.len(), 3);
    }
}
