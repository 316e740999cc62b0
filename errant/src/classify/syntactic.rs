//! Classification of edits by the classes of their syntactic heads, e. g. `R:NOUN->VERB`.

use std::ops::Range;

use crate::types::{Edit, ErrorType, Operation, Sentence, Token};

/// The depth of the token at `index` in the dependency tree, 1 for the root.
fn depth(sentence: &Sentence, index: usize) -> usize {
    let mut current = index;
    let mut depth = 1;

    // a malformed parse can contain cycles
    while sentence.head(current) != current && depth <= sentence.len() {
        current = sentence.head(current);
        depth += 1;
    }

    depth
}

/// The index of the token in `range` closest to the root of the dependency tree, the first
/// one if several are equally close. `None` for an empty range.
pub fn highest_token(sentence: &Sentence, range: Range<usize>) -> Option<usize> {
    range.min_by_key(|&i| depth(sentence, i))
}

/// Assigns error types of the form `<operation>:<orig class>-><cor class>`, where the classes
/// are those of the highest token on each side and `None` stands for an empty side.
#[derive(Debug, Clone, Default)]
pub struct SyntacticClassifier;

impl SyntacticClassifier {
    fn head_class(sentence: &Sentence, range: Range<usize>) -> &'static str {
        highest_token(sentence, range).map_or("None", |i| sentence[i].pos().as_str())
    }

    /// Returns the error type of the edit. Does not modify the edit.
    pub fn classify(&self, edit: &Edit, orig: &Sentence, cor: &Sentence) -> ErrorType {
        let mut o_span = edit.o_span().clone();
        let mut c_span = edit.c_span().clone();

        loop {
            let o_toks = &orig[o_span.clone()];
            let c_toks = &cor[c_span.clone()];

            if o_toks.iter().map(Token::text).eq(c_toks.iter().map(Token::text)) {
                return ErrorType::unknown();
            }

            match (o_toks.last(), c_toks.last()) {
                (Some(o), Some(c))
                    if o.lower() == c.lower() && (o_toks.len() > 1 || c_toks.len() > 1) =>
                {
                    o_span.end -= 1;
                    c_span.end -= 1;
                }
                _ => break,
            }
        }

        let operation = if edit.o_span().is_empty() {
            Operation::Missing
        } else if edit.c_span().is_empty() {
            Operation::Unnecessary
        } else {
            Operation::Replacement
        };

        let category = format!(
            "{}->{}",
            Self::head_class(orig, o_span),
            Self::head_class(cor, c_span)
        );

        ErrorType::new(operation, &category)
    }
}
