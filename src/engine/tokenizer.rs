//! Single-pass tokenizer
//!
//! Bytes without an action accumulate into a pending text run. On a claimed
//! byte the tokenizer invokes its [`Action`](super::Action): a skipping result
//! folds the consumed bytes into the pending run, any other result flushes
//! the run as a `Text` token and appends the action's token.
//!
//! Tokens tile the input: concatenating their raw spans reproduces it.

use super::action::MissCache;
use super::dictionary::Dictionary;
use super::token::{Span, Token};
use super::warnings::Warnings;

/// Tokenize `input` with `dict`, recording recoveries in `warnings`
pub fn tokenize(dict: &Dictionary, input: &str, warnings: &mut Warnings) -> Vec<Token> {
    Tokenizer::new(dict, input).run(warnings)
}

/// Tokenizer over one input
pub struct Tokenizer<'a> {
    dict: &'a Dictionary,
    input: &'a str,
    misses: MissCache,
}

impl<'a> Tokenizer<'a> {
    /// Create a tokenizer
    pub fn new(dict: &'a Dictionary, input: &'a str) -> Self {
        Self {
            dict,
            input,
            misses: MissCache::new(),
        }
    }

    /// Produce the token stream
    pub fn run(mut self, warnings: &mut Warnings) -> Vec<Token> {
        let bytes = self.input.as_bytes();
        let len = bytes.len();
        let mut tokens = Vec::with_capacity(len / 8 + 1);
        let mut text_start = 0;
        let mut pos = 0;

        log_debug!("tokenizing {} bytes", len);

        while pos < len {
            let Some(action) = self.dict.action(bytes[pos]) else {
                pos += 1;
                continue;
            };

            let result = action.invoke(self.dict, self.input, pos, warnings, &mut self.misses);
            let next = (pos + result.stride).min(len);

            match result.token {
                Some(token) if !result.skip => {
                    if text_start < pos {
                        tokens.push(Token::text(Span::new(text_start, pos)));
                    }
                    tokens.push(token);
                    text_start = next;
                }
                _ => {}
            }
            pos = next;
        }

        if text_start < len {
            tokens.push(Token::text(Span::new(text_start, len)));
        }

        log_debug!(
            "tokenized into {} tokens, {} warnings",
            tokens.len(),
            warnings.len()
        );
        tokens
    }
}
