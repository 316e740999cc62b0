//! Automatic annotation of grammatical edits between an original and a corrected sentence.
//! # Overview
//!
//! errant has the following core abstractions:
//! - An [Alignment][align::Alignment] computing the minimum-cost sequence of primitive
//!   operations (match, substitute, insert, delete, transpose) between two annotated sentences.
//! - A [Merger][merge::Merger] turning primitive operations into linguistically coherent [Edit][types::Edit]s.
//! - A [Classifier][classify::Classifier] assigning every edit an [ErrorType][types::ErrorType] such as `R:VERB:SVA`.
//! - An [Annotator][annotator::Annotator] tying the three together.
//!
//! Tokenization, tagging and parsing are not done here: sentences are built from [Token][types::Token]s
//! produced by an external parser.
//!
//! # Examples
//!
//! Annotate a sentence pair:
//!
//! ```
//! use errant::{lang::en, merge::MergePolicy, resources::Dictionary, types::{Pos, Sentence, Token}};
//!
//! let annotator = en::annotator(vec!["He", "go", "goes"].into_iter().collect::<Dictionary>());
//!
//! let orig = Sentence::new(vec![
//!     Token::new("He", Pos::Pron, "PRP", "he", "nsubj", 1),
//!     Token::new("go", Pos::Verb, "VBP", "go", "ROOT", 1),
//! ])?;
//! let cor = Sentence::new(vec![
//!     Token::new("He", Pos::Pron, "PRP", "he", "nsubj", 1),
//!     Token::new("goes", Pos::Verb, "VBZ", "go", "ROOT", 1),
//! ])?;
//!
//! let edits = annotator.annotate(&orig, &cor, false, MergePolicy::Rules);
//! assert_eq!(edits.len(), 1);
//! assert_eq!(edits[0].to_m2(0), "A 1 2|||R:VERB:SVA|||goes|||REQUIRED|||-NONE-|||0");
//! # Ok::<(), errant::Error>(())
//! ```

// #![warn(missing_docs)]
use std::io;

use thiserror::Error;

pub mod align;
pub mod annotator;
pub mod classify;
pub mod compare;
#[macro_use]
pub mod lang;
pub mod m2;
pub mod merge;
pub mod resources;
pub mod types;
pub(crate) mod utils;

pub use annotator::Annotator;

#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    /// (De)serialization error. Can have occured during deserialization or during serialization.
    #[error(transparent)]
    Serialization(#[from] bincode::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("span {start}..{end} is out of bounds for the {side} sentence of length {len}")]
    InvalidSpan {
        side: &'static str,
        start: usize,
        end: usize,
        len: usize,
    },
    #[error("token {index} has head {head} outside of a sentence of length {len}")]
    InvalidHead {
        index: usize,
        head: usize,
        len: usize,
    },
    #[error("unknown merge policy '{0}', expected one of: rules, all-split, all-merge, all-equal")]
    UnknownMergePolicy(String),
    #[error("unknown classifier '{0}', expected one of: errant, sercl")]
    UnknownClassifierMode(String),
    #[error("unknown part-of-speech tag '{0}'")]
    UnknownPos(String),
    #[error("invalid error type '{0}'")]
    InvalidErrorType(String),
    #[error("M2 parse error on line {line}: {reason}")]
    M2Parse { line: usize, reason: String },
    #[error("no parse for sentence '{0}'")]
    MissingParse(String),
    #[error("hypothesis has {hypothesis} sentences but reference has {reference}")]
    SentenceCountMismatch { hypothesis: usize, reference: usize },
}
