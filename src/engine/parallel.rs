//! Batch parsing
//!
//! Parses many independent inputs against one shared [`Dictionary`]. With the
//! `parallel` feature the inputs are spread over the rayon thread pool;
//! without it they are parsed one after another. Either way each input gets
//! its own tree and warnings collector, and results keep the input order.
//!
//! ```toml
//! [dependencies]
//! tagmark = { version = "0.1", features = ["parallel"] }
//! ```

use super::ast::Ast;
use super::dictionary::Dictionary;
use super::parser::parse;
use super::warnings::{OverflowPolicy, Warnings};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Tree and warnings of one input
#[derive(Debug, Clone)]
pub struct ParseOutcome<'a> {
    /// The parse tree
    pub ast: Ast<'a>,
    /// Warnings recorded while parsing
    pub warnings: Warnings,
}

fn parse_one<'a>(
    dict: &'a Dictionary,
    input: &'a str,
    policy: OverflowPolicy,
    capacity: usize,
) -> ParseOutcome<'a> {
    let mut warnings = Warnings::with_capacity(policy, capacity);
    let ast = parse(input, dict, &mut warnings);
    ParseOutcome { ast, warnings }
}

/// Parse every input, one collector per input
#[cfg(feature = "parallel")]
pub fn parse_batch<'a>(
    dict: &'a Dictionary,
    inputs: &[&'a str],
    policy: OverflowPolicy,
    capacity: usize,
) -> Vec<ParseOutcome<'a>> {
    log_debug!("parsing batch of {} inputs in parallel", inputs.len());
    inputs
        .par_iter()
        .map(|&input| parse_one(dict, input, policy, capacity))
        .collect()
}

/// Parse every input, one collector per input
#[cfg(not(feature = "parallel"))]
pub fn parse_batch<'a>(
    dict: &'a Dictionary,
    inputs: &[&'a str],
    policy: OverflowPolicy,
    capacity: usize,
) -> Vec<ParseOutcome<'a>> {
    log_debug!("parsing batch of {} inputs", inputs.len());
    inputs
        .iter()
        .map(|&input| parse_one(dict, input, policy, capacity))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tag::{Greed, Rule};
    use crate::engine::warnings::Issue;

    #[test]
    fn test_batch_keeps_order() {
        let mut dict = Dictionary::default();
        dict.add_universal_tag("bold", "*", Greed::NonGreedy, Rule::NotApplicable)
            .unwrap();

        let inputs = ["*a*", "plain", "*open", ""];
        let outcomes = parse_batch(&dict, &inputs, OverflowPolicy::NoCap, 4);

        assert_eq!(outcomes.len(), inputs.len());
        for (outcome, input) in outcomes.iter().zip(inputs) {
            assert_eq!(outcome.ast.input(), input);
        }
        assert!(outcomes[0].warnings.is_empty());
        assert_eq!(outcomes[2].warnings.list()[0].issue, Issue::UnclosedTag);
        assert_eq!(outcomes[3].ast.len(), 1);
    }
}
