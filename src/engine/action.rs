//! Compiled actions
//!
//! Every claimed byte of a [`Dictionary`] holds an [`Action`]: a fixed plan of
//! [`Step`]s compiled once at registration. The tokenizer invokes the action
//! whenever it meets that byte; the steps run in order over a per-invocation
//! [`ActionContext`] until one of them resolves the call.
//!
//! There are two kinds of step:
//!
//! - [`Step::Mutate`] narrows the [`Bounds`] or records a warning and always
//!   hands over to the next step.
//! - [`Step::Resolve`] may finish the call by emitting a token or skipping
//!   bytes as text, or hand over with [`Flow::Continue`].
//!
//! A plan that finishes without resolving degrades the trigger byte to text.

use super::dictionary::Dictionary;
use super::tag::{Greed, Rule, Tag, TagKind};
use super::token::{Span, Token};
use super::warnings::{Issue, Warning, Warnings};
use hashbrown::HashMap;
use memchr::{memchr, memchr2, memmem};
use std::fmt;

/// Whether a resolving step finished the call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Hand over to the next step
    Continue,
    /// Token, stride and skip are final
    Done,
}

/// One step of an action plan
#[derive(Clone, Copy)]
pub enum Step {
    /// Updates the context and defers
    Mutate(&'static str, fn(&mut ActionContext<'_>)),
    /// Updates the context and may finish the call
    Resolve(&'static str, fn(&mut ActionContext<'_>) -> Flow),
}

impl Step {
    /// Name of the step
    pub fn name(&self) -> &'static str {
        match self {
            Step::Mutate(name, _) | Step::Resolve(name, _) => name,
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Mutate(name, _) => write!(f, "Mutate({})", name),
            Step::Resolve(name, _) => write!(f, "Resolve({})", name),
        }
    }
}

/// Extent of the construct being recognized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounds {
    /// Whole raw extent found so far
    pub raw: Span,
    /// Content between the delimiters
    pub inner: Span,
    /// Width of the opening delimiter
    pub open_len: usize,
    /// Closing delimiter, once found
    pub close: Option<Span>,
    /// Attribute key
    pub key: Option<Span>,
}

/// Per-invocation state shared by the steps of a plan
pub struct ActionContext<'c> {
    /// Tag the action belongs to (tag actions only)
    pub tag: Option<&'c Tag>,
    /// Dictionary the action was installed in
    pub dict: &'c Dictionary,
    /// Whole input
    pub input: &'c str,
    /// Offset of the trigger byte
    pub idx: usize,
    /// Warnings sink
    pub warnings: &'c mut Warnings,
    /// Closing searches already known to fail
    pub misses: &'c mut MissCache,
    /// Extent found so far
    pub bounds: Bounds,
    /// Token to emit
    pub token: Option<Token>,
    /// Bytes consumed
    pub stride: usize,
    /// Absorb `stride` bytes into the surrounding text instead of emitting
    pub skip: bool,
}

impl<'c> ActionContext<'c> {
    #[inline]
    fn bytes(&self) -> &'c [u8] {
        self.input.as_bytes()
    }

    #[inline]
    fn trigger(&self) -> u8 {
        self.bytes()[self.idx]
    }

    #[inline]
    fn warn(&mut self, warning: Warning) {
        self.warnings.add(warning);
    }

    /// Finish with a token covering `idx..idx + token.width`
    fn resolve_token(&mut self, token: Token) -> Flow {
        self.stride = token.width;
        self.skip = false;
        self.token = Some(token);
        Flow::Done
    }

    /// Finish by absorbing `n` bytes into the surrounding text
    fn resolve_skip(&mut self, n: usize) -> Flow {
        self.stride = n.max(1);
        self.skip = true;
        self.token = None;
        Flow::Done
    }
}

/// Outcome of one action invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionResult {
    /// Token to append (None when skipping)
    pub token: Option<Token>,
    /// Bytes consumed, at least one
    pub stride: usize,
    /// Treat the consumed bytes as text
    pub skip: bool,
}

/// What an action recognizes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionTarget {
    /// A registered tag
    Tag(Tag),
    /// The escape trigger
    Escape,
    /// The attribute trigger
    Attribute,
}

/// A compiled action bound to one trigger byte
#[derive(Debug, Clone)]
pub struct Action {
    target: ActionTarget,
    plan: Vec<Step>,
}

impl Action {
    /// Compile the plan for a tag
    pub fn for_tag(tag: Tag) -> Self {
        let mut plan = Vec::with_capacity(4);

        match tag.rule() {
            Rule::InfraWord => plan.push(Step::Resolve("check_infra_word", check_infra_word)),
            Rule::TagVsContent => {
                plan.push(Step::Mutate("measure_opening_run", measure_opening_run))
            }
            Rule::NotApplicable => {}
        }
        if tag.rule() != Rule::TagVsContent {
            plan.push(Step::Resolve("verify_sequence", verify_sequence));
        }

        match tag.greed() {
            Greed::NonGreedy => plan.push(Step::Resolve("emit_trigger", emit_trigger)),
            Greed::Greedy | Greed::Grasping => {
                if tag.rule() == Rule::TagVsContent {
                    plan.push(Step::Mutate("find_matching_run", find_matching_run));
                } else {
                    plan.push(Step::Mutate("find_closing_sequence", find_closing_sequence));
                }
                plan.push(Step::Resolve("emit_spanning", emit_spanning));
            }
        }

        Self {
            target: ActionTarget::Tag(tag),
            plan,
        }
    }

    /// Compile the plan for the escape trigger
    pub fn for_escape() -> Self {
        Self {
            target: ActionTarget::Escape,
            plan: vec![Step::Resolve("emit_escape", emit_escape)],
        }
    }

    /// Compile the plan for the attribute trigger
    pub fn for_attribute() -> Self {
        Self {
            target: ActionTarget::Attribute,
            plan: vec![
                Step::Resolve("scan_attr_key", scan_attr_key),
                Step::Resolve("scan_attr_payload", scan_attr_payload),
                Step::Resolve("emit_attribute", emit_attribute),
            ],
        }
    }

    /// What the action recognizes
    #[inline]
    pub fn target(&self) -> &ActionTarget {
        &self.target
    }

    /// The tag, for tag actions
    #[inline]
    pub fn tag(&self) -> Option<&Tag> {
        match &self.target {
            ActionTarget::Tag(tag) => Some(tag),
            _ => None,
        }
    }

    /// The compiled plan
    #[inline]
    pub fn plan(&self) -> &[Step] {
        &self.plan
    }

    /// Run the plan at `idx`, which must hold this action's trigger byte
    pub fn invoke(
        &self,
        dict: &Dictionary,
        input: &str,
        idx: usize,
        warnings: &mut Warnings,
        misses: &mut MissCache,
    ) -> ActionResult {
        let mut ctx = ActionContext {
            tag: self.tag(),
            dict,
            input,
            idx,
            warnings,
            misses,
            bounds: Bounds::default(),
            token: None,
            stride: 1,
            skip: true,
        };

        for step in &self.plan {
            match step {
                Step::Mutate(_, mutate) => mutate(&mut ctx),
                Step::Resolve(_, resolve) => {
                    if resolve(&mut ctx) == Flow::Done {
                        break;
                    }
                }
            }
        }

        ActionResult {
            token: ctx.token,
            stride: ctx.stride.max(1),
            skip: ctx.skip || ctx.token.is_none(),
        }
    }
}

/// Key of a closing search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MissKey {
    /// Closing sequence of the tag with this id
    Sequence(u8),
    /// Run of exactly this many trigger bytes
    Run(u8, usize),
}

/// Closing searches proven to fail from some offset onwards
///
/// A search that finds nothing from offset `s` finds nothing from any later
/// offset either, so only the smallest failing start is kept per key. Used
/// for the duration of one tokenize call.
#[derive(Debug, Clone, Default)]
pub struct MissCache {
    misses: HashMap<MissKey, usize>,
}

impl MissCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// True if a search for `key` starting at `from` is known to fail
    #[inline]
    pub fn is_known_miss(&self, key: MissKey, from: usize) -> bool {
        self.misses.get(&key).is_some_and(|&start| start <= from)
    }

    /// Remember that a search for `key` starting at `from` failed
    pub fn record(&mut self, key: MissKey, from: usize) {
        self.misses
            .entry(key)
            .and_modify(|start| *start = (*start).min(from))
            .or_insert(from);
    }
}

// ============================================================================
// Tag steps
// ============================================================================

fn is_wordish(c: char, trigger: u8) -> bool {
    c.is_alphanumeric() || c.is_ascii_punctuation() || c == trigger as char
}

fn check_infra_word(ctx: &mut ActionContext<'_>) -> Flow {
    let trigger = ctx.trigger();
    let before = ctx.input[..ctx.idx].chars().next_back();
    let after = ctx.input[ctx.idx + 1..].chars().next();

    let buried = match (before, after) {
        (Some(b), Some(a)) => is_wordish(b, trigger) && is_wordish(a, trigger),
        _ => false,
    };
    if buried {
        log_trace!("infra-word trigger {:?} at {} is text", trigger as char, ctx.idx);
        return ctx.resolve_skip(1);
    }
    Flow::Continue
}

fn measure_opening_run(ctx: &mut ActionContext<'_>) {
    let trigger = ctx.trigger();
    let run = ctx.bytes()[ctx.idx..]
        .iter()
        .take_while(|&&b| b == trigger)
        .count();
    let cap = ctx.dict.limits().max_opening_run.max(1);
    let open_len = run.min(cap);

    // Bytes of an over-long run past the cap are content, but never part
    // of the closing run
    ctx.bounds.open_len = open_len;
    ctx.bounds.raw = Span::new(ctx.idx, ctx.idx + run);
    ctx.bounds.inner = Span::empty(ctx.idx + open_len);
}

fn verify_sequence(ctx: &mut ActionContext<'_>) -> Flow {
    let Some(tag) = ctx.tag else {
        return ctx.resolve_skip(1);
    };
    let expected = tag.seq().as_bytes();
    let rest = &ctx.bytes()[ctx.idx..];

    let matched = expected
        .iter()
        .zip(rest)
        .take_while(|(e, g)| e == g)
        .count();

    if matched == expected.len() {
        let end = ctx.idx + matched;
        ctx.bounds.open_len = matched;
        ctx.bounds.raw = Span::new(ctx.idx, end);
        ctx.bounds.inner = Span::empty(end);
        return Flow::Continue;
    }

    let id = tag.id();
    let divergence = ctx.idx + matched;
    if divergence >= ctx.input.len() {
        ctx.warn(
            Warning::new(Issue::UnexpectedEol, divergence)
                .with_tag(id)
                .with_expected(expected[matched]),
        );
    } else {
        ctx.warn(
            Warning::new(Issue::UnexpectedSymbol, divergence)
                .with_tag(id)
                .with_expected(expected[matched])
                .with_got(rest[matched]),
        );
    }
    log_trace!(
        "sequence {:?} diverged at {}, prefix becomes text",
        tag.seq().as_str(),
        divergence
    );

    // Sequences are ASCII, so the prefix ends on a char boundary
    ctx.resolve_token(Token::text(Span::new(ctx.idx, divergence)))
}

fn emit_trigger(ctx: &mut ActionContext<'_>) -> Flow {
    let trigger = ctx.trigger();
    let open_len = ctx.bounds.open_len.max(1);
    let end = ctx.idx + open_len;
    ctx.resolve_token(Token::tag(trigger, ctx.idx, open_len, Span::empty(end)))
}

fn find_closing_sequence(ctx: &mut ActionContext<'_>) {
    let Some(tag) = ctx.tag else {
        return;
    };
    let closing = match tag.kind() {
        TagKind::Universal => Some(tag.seq()),
        TagKind::Opening => ctx.dict.tag(tag.close_id()).map(|partner| partner.seq()),
        TagKind::Closing => None,
    };
    let Some(closing) = closing else {
        return;
    };

    let from = ctx.idx + ctx.bounds.open_len;
    let key = MissKey::Sequence(tag.id());
    if ctx.misses.is_known_miss(key, from) {
        return;
    }

    match memmem::find(&ctx.bytes()[from..], closing.as_bytes()) {
        Some(offset) => {
            let start = from + offset;
            let end = start + closing.width();
            ctx.bounds.close = Some(Span::new(start, end));
            ctx.bounds.inner = Span::new(from, start);
            ctx.bounds.raw = Span::new(ctx.idx, end);
        }
        None => ctx.misses.record(key, from),
    }
}

fn find_matching_run(ctx: &mut ActionContext<'_>) {
    let trigger = ctx.trigger();
    let open_len = ctx.bounds.open_len;
    let from = ctx.bounds.raw.end;
    let key = MissKey::Run(trigger, open_len);

    // `from` always sits right after a maximal run, so every run seen from
    // here is complete
    if ctx.misses.is_known_miss(key, from) {
        return;
    }

    let bytes = ctx.bytes();
    let mut pos = from;
    while let Some(offset) = memchr(trigger, &bytes[pos..]) {
        let start = pos + offset;
        let run = bytes[start..].iter().take_while(|&&b| b == trigger).count();
        let end = start + run;
        if run == open_len {
            ctx.bounds.close = Some(Span::new(start, end));
            ctx.bounds.inner = Span::new(ctx.bounds.inner.start, start);
            ctx.bounds.raw = Span::new(ctx.idx, end);
            return;
        }
        pos = end;
    }

    ctx.misses.record(key, from);
}

fn emit_spanning(ctx: &mut ActionContext<'_>) -> Flow {
    let trigger = ctx.trigger();
    let open_len = ctx.bounds.open_len.max(1);

    if ctx.bounds.close.is_some() {
        let raw = ctx.bounds.raw;
        return ctx.resolve_token(Token::tag(trigger, ctx.idx, raw.len(), ctx.bounds.inner));
    }

    ctx.warn(Warning::new(Issue::UnclosedTag, ctx.idx).with_tag(trigger));

    let greed = ctx.tag.map(|tag| tag.greed()).unwrap_or_default();
    if greed == Greed::Grasping {
        let len = ctx.input.len();
        let inner = Span::new(ctx.idx + open_len, len);
        log_trace!("grasping tag at {} runs to end of input", ctx.idx);
        return ctx.resolve_token(Token::tag(trigger, ctx.idx, len - ctx.idx, inner));
    }

    log_trace!("greedy tag at {} has no closing, degrading to text", ctx.idx);
    ctx.resolve_skip(ctx.bounds.raw.len().max(open_len))
}

// ============================================================================
// Escape steps
// ============================================================================

fn emit_escape(ctx: &mut ActionContext<'_>) -> Flow {
    let trigger = ctx.trigger();
    let start = ctx.idx + 1;

    let Some(escaped) = ctx.input[start..].chars().next() else {
        ctx.warn(Warning::new(Issue::UnexpectedEol, ctx.idx).with_tag(trigger));
        return ctx.resolve_skip(1);
    };

    let special = escaped.is_ascii() && ctx.dict.is_special(escaped as u8);
    if !special {
        ctx.warn(Warning::new(Issue::RedundantEscape, ctx.idx).with_tag(trigger));
    }

    let payload = Span::new(start, start + escaped.len_utf8());
    ctx.resolve_token(Token::escape(trigger, ctx.idx, payload))
}

// ============================================================================
// Attribute steps
// ============================================================================

fn scan_attr_key(ctx: &mut ActionContext<'_>) -> Flow {
    let trigger = ctx.trigger();
    let Some(sig) = ctx.dict.attribute_signature() else {
        return ctx.resolve_skip(1);
    };

    let bytes = ctx.bytes();
    let key_start = ctx.idx + 1;
    let wanted_end = key_start + ctx.dict.limits().max_attr_key_len + 1;
    let window_end = wanted_end.min(bytes.len());

    match memchr(sig.payload_start, &bytes[key_start..window_end]) {
        Some(offset) => {
            ctx.bounds.key = Some(Span::new(key_start, key_start + offset));
            Flow::Continue
        }
        None => {
            let issue = if wanted_end > bytes.len() {
                Issue::UnexpectedEol
            } else {
                Issue::AttrKeyTooLong
            };
            ctx.warn(Warning::new(issue, ctx.idx).with_tag(trigger));
            ctx.resolve_skip(1)
        }
    }
}

fn scan_attr_payload(ctx: &mut ActionContext<'_>) -> Flow {
    let trigger = ctx.trigger();
    let (Some(sig), Some(key)) = (ctx.dict.attribute_signature(), ctx.bounds.key) else {
        return ctx.resolve_skip(1);
    };

    let bytes = ctx.bytes();
    let payload_start = key.end + 1;
    let wanted_end = payload_start + ctx.dict.limits().max_attr_payload_len + 1;
    let window_end = wanted_end.min(bytes.len());
    let escape = ctx.dict.escape_trigger();

    let mut pos = payload_start;
    let mut closing = None;
    let mut hit_eol = false;
    while pos < window_end {
        let window = &bytes[pos..window_end];
        let found = match escape {
            Some(esc) => memchr2(sig.payload_end, esc, window),
            None => memchr(sig.payload_end, window),
        };
        let Some(offset) = found else {
            break;
        };
        let at = pos + offset;
        if bytes[at] == sig.payload_end {
            closing = Some(at);
            break;
        }
        // Escaped char never closes the payload
        match ctx.input[at + 1..].chars().next() {
            Some(c) => pos = at + 1 + c.len_utf8(),
            None => {
                hit_eol = true;
                break;
            }
        }
    }

    let Some(close) = closing else {
        let issue = if hit_eol || wanted_end > bytes.len() {
            Issue::UnclosedAttrPayload
        } else {
            Issue::AttrPayloadTooLong
        };
        ctx.warn(Warning::new(issue, ctx.idx).with_tag(trigger));
        return ctx.resolve_skip(1);
    };

    if close == payload_start {
        ctx.warn(Warning::new(Issue::EmptyAttrPayload, ctx.idx).with_tag(trigger));
        return ctx.resolve_skip(1);
    }

    ctx.bounds.inner = Span::new(payload_start, close);
    ctx.bounds.raw = Span::new(ctx.idx, close + 1);
    Flow::Continue
}

fn emit_attribute(ctx: &mut ActionContext<'_>) -> Flow {
    let trigger = ctx.trigger();
    let Some(key) = ctx.bounds.key else {
        return ctx.resolve_skip(1);
    };
    let width = ctx.bounds.raw.len();
    let payload = ctx.bounds.inner;

    let token = if key.is_empty() {
        Token::attr_flag(trigger, ctx.idx, width, payload)
    } else {
        Token::attr_kv(trigger, ctx.idx, width, key, payload)
    };
    ctx.resolve_token(token)
}
