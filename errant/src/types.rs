//! Fundamental types: tokens and sentences produced by an external parser, edits and their error types.

use serde::{Deserialize, Serialize};
use std::{
    convert::TryFrom,
    fmt,
    ops::{Deref, Range},
    str::FromStr,
};

use crate::Error;

/// A coarse part-of-speech class.
/// Parsing accepts Universal Dependencies names and normalizes `ADP` to [Pos::Prep],
/// `PROPN` to [Pos::Noun] and `CCONJ` / `SCONJ` to [Pos::Conj].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
#[allow(missing_docs)]
pub enum Pos {
    Adj,
    Adv,
    Noun,
    Verb,
    Det,
    Pron,
    Part,
    Prep,
    Punct,
    Conj,
    Intj,
    Num,
    Sym,
    X,
    Space,
    Aux,
}

impl Pos {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pos::Adj => "ADJ",
            Pos::Adv => "ADV",
            Pos::Noun => "NOUN",
            Pos::Verb => "VERB",
            Pos::Det => "DET",
            Pos::Pron => "PRON",
            Pos::Part => "PART",
            Pos::Prep => "PREP",
            Pos::Punct => "PUNCT",
            Pos::Conj => "CONJ",
            Pos::Intj => "INTJ",
            Pos::Num => "NUM",
            Pos::Sym => "SYM",
            Pos::X => "X",
            Pos::Space => "SPACE",
            Pos::Aux => "AUX",
        }
    }
}

impl FromStr for Pos {
    type Err = Error;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        Ok(match string {
            "ADJ" => Pos::Adj,
            "ADV" => Pos::Adv,
            "NOUN" | "PROPN" => Pos::Noun,
            "VERB" => Pos::Verb,
            "DET" => Pos::Det,
            "PRON" => Pos::Pron,
            "PART" => Pos::Part,
            "PREP" | "ADP" => Pos::Prep,
            "PUNCT" => Pos::Punct,
            "CONJ" | "CCONJ" | "SCONJ" => Pos::Conj,
            "INTJ" => Pos::Intj,
            "NUM" => Pos::Num,
            "SYM" => Pos::Sym,
            "X" => Pos::X,
            "SPACE" => Pos::Space,
            "AUX" => Pos::Aux,
            x => return Err(Error::UnknownPos(x.to_string())),
        })
    }
}

impl TryFrom<String> for Pos {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Pos> for String {
    fn from(pos: Pos) -> Self {
        pos.as_str().to_string()
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize)]
struct TokenData {
    text: String,
    pos: Pos,
    tag: String,
    lemma: String,
    dep: String,
    head: usize,
}

/// A token as analyzed by an external parser.
/// The head is an index into the sentence the token belongs to, the root points at itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TokenData", into = "TokenData")]
pub struct Token {
    text: String,
    lower: String,
    pos: Pos,
    tag: String,
    lemma: String,
    dep: String,
    head: usize,
}

impl From<TokenData> for Token {
    fn from(data: TokenData) -> Self {
        Token::new(
            data.text, data.pos, data.tag, data.lemma, data.dep, data.head,
        )
    }
}

impl From<Token> for TokenData {
    fn from(token: Token) -> Self {
        TokenData {
            text: token.text,
            pos: token.pos,
            tag: token.tag,
            lemma: token.lemma,
            dep: token.dep,
            head: token.head,
        }
    }
}

impl Token {
    pub fn new<S: Into<String>>(
        text: S,
        pos: Pos,
        tag: S,
        lemma: S,
        dep: S,
        head: usize,
    ) -> Self {
        let text = text.into();

        Token {
            lower: text.to_lowercase(),
            text,
            pos,
            tag: tag.into(),
            lemma: lemma.into(),
            dep: dep.into(),
            head,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn lower(&self) -> &str {
        &self.lower
    }

    /// The coarse part-of-speech as assigned by the parser.
    pub fn pos(&self) -> Pos {
        self.pos
    }

    /// The fine-grained tag, e. g. "VBZ".
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn lemma(&self) -> &str {
        &self.lemma
    }

    pub fn dep(&self) -> &str {
        &self.dep
    }

    pub fn head(&self) -> usize {
        self.head
    }
}

/// An ordered sequence of tokens with valid head references.
/// Dereferences to a slice of tokens, so it can be indexed and sliced like one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Token>", into = "Vec<Token>")]
pub struct Sentence {
    tokens: Vec<Token>,
}

impl Sentence {
    /// Creates a new sentence. Fails if a token's head does not point into the sentence.
    pub fn new(tokens: Vec<Token>) -> Result<Self, Error> {
        let len = tokens.len();

        if let Some((index, token)) = tokens.iter().enumerate().find(|(_, x)| x.head >= len) {
            return Err(Error::InvalidHead {
                index,
                head: token.head,
                len,
            });
        }

        Ok(Sentence { tokens })
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// The index of the syntactic head of the token at `index`.
    pub fn head(&self, index: usize) -> usize {
        self.tokens[index].head
    }

    /// Indices of the syntactic children of the token at `index`, in sentence order.
    pub fn children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.tokens
            .iter()
            .enumerate()
            .filter(move |(i, token)| token.head == index && *i != index)
            .map(|(i, _)| i)
    }

    /// The token texts of the given range joined by spaces.
    pub fn span_text(&self, range: Range<usize>) -> String {
        self.tokens[range]
            .iter()
            .map(|x| x.text())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn text(&self) -> String {
        self.span_text(0..self.len())
    }
}

impl Deref for Sentence {
    type Target = [Token];

    fn deref(&self) -> &Self::Target {
        &self.tokens
    }
}

impl TryFrom<Vec<Token>> for Sentence {
    type Error = Error;

    fn try_from(tokens: Vec<Token>) -> Result<Self, Self::Error> {
        Sentence::new(tokens)
    }
}

impl From<Sentence> for Vec<Token> {
    fn from(sentence: Sentence) -> Self {
        sentence.tokens
    }
}

/// The operation of an error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Operation {
    /// A token is missing in the original: `M`.
    Missing,
    /// A token in the original is unnecessary: `U`.
    Unnecessary,
    /// Tokens in the original have to be replaced: `R`.
    Replacement,
    /// An edit which was detected but not corrected: `UNK`.
    Unknown,
    /// No edit at all: `noop`. Only appears in M2 data.
    Noop,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Missing => "M",
            Operation::Unnecessary => "U",
            Operation::Replacement => "R",
            Operation::Unknown => "UNK",
            Operation::Noop => "noop",
        }
    }
}

/// An error type like `R:VERB:SVA`, consisting of an operation, an optional category
/// and an optional subcategory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ErrorType {
    operation: Operation,
    category: Option<String>,
    subcategory: Option<String>,
}

impl ErrorType {
    /// Creates an error type from an operation and a category string which may contain a subcategory
    /// separated by a colon, e. g. "VERB:SVA".
    pub fn new(operation: Operation, category: &str) -> Self {
        let mut parts = category.splitn(2, ':');
        let category = parts.next().filter(|x| !x.is_empty()).map(String::from);
        let subcategory = parts.next().filter(|x| !x.is_empty()).map(String::from);

        ErrorType {
            operation,
            category,
            subcategory,
        }
    }

    pub fn unknown() -> Self {
        ErrorType {
            operation: Operation::Unknown,
            category: None,
            subcategory: None,
        }
    }

    pub fn noop() -> Self {
        ErrorType {
            operation: Operation::Noop,
            category: None,
            subcategory: None,
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn subcategory(&self) -> Option<&str> {
        self.subcategory.as_deref()
    }

    /// The category including the subcategory, e. g. "VERB:SVA". Empty for `UNK` and `noop`.
    pub fn full_category(&self) -> String {
        match (&self.category, &self.subcategory) {
            (Some(category), Some(subcategory)) => format!("{}:{}", category, subcategory),
            (Some(category), None) => category.clone(),
            _ => String::new(),
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operation.as_str())?;

        if let Some(category) = &self.category {
            write!(f, ":{}", category)?;
        }
        if let Some(subcategory) = &self.subcategory {
            write!(f, ":{}", subcategory)?;
        }

        Ok(())
    }
}

impl FromStr for ErrorType {
    type Err = Error;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        match string {
            "UNK" => return Ok(ErrorType::unknown()),
            "noop" => return Ok(ErrorType::noop()),
            _ => {}
        }

        let (operation, category) = match string.split_at(string.find(':').unwrap_or(0)) {
            ("M", category) => (Operation::Missing, category),
            ("U", category) => (Operation::Unnecessary, category),
            ("R", category) => (Operation::Replacement, category),
            _ => return Err(Error::InvalidErrorType(string.to_string())),
        };

        let category = &category[1..];
        if category.is_empty() {
            return Err(Error::InvalidErrorType(string.to_string()));
        }

        Ok(ErrorType::new(operation, category))
    }
}

/// An edit between an original and a corrected sentence.
/// Spans are half-open token ranges; the error type is unset until the edit is classified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edit {
    o_span: Range<usize>,
    c_span: Range<usize>,
    c_str: String,
    error_type: Option<ErrorType>,
}

fn check_span(side: &'static str, span: &Range<usize>, len: usize) -> Result<(), Error> {
    if span.start > span.end || span.end > len {
        return Err(Error::InvalidSpan {
            side,
            start: span.start,
            end: span.end,
            len,
        });
    }

    Ok(())
}

impl Edit {
    /// Creates a new, unclassified edit. Fails if a span is out of bounds of its sentence.
    pub fn new(
        orig: &Sentence,
        cor: &Sentence,
        o_span: Range<usize>,
        c_span: Range<usize>,
    ) -> Result<Self, Error> {
        check_span("original", &o_span, orig.len())?;
        check_span("corrected", &c_span, cor.len())?;

        Ok(Edit::spanning(cor, o_span, c_span))
    }

    /// Creates an edit from spans which are known to be valid.
    pub(crate) fn spanning(cor: &Sentence, o_span: Range<usize>, c_span: Range<usize>) -> Self {
        Edit {
            c_str: cor.span_text(c_span.clone()),
            o_span,
            c_span,
            error_type: None,
        }
    }

    pub fn o_span(&self) -> &Range<usize> {
        &self.o_span
    }

    pub fn c_span(&self) -> &Range<usize> {
        &self.c_span
    }

    /// The corrected tokens joined by spaces.
    pub fn c_str(&self) -> &str {
        &self.c_str
    }

    /// Replaces the corrected text, e. g. with the pseudo-correction of an edit which only
    /// marks a detected error.
    pub fn set_c_str<S: Into<String>>(&mut self, c_str: S) {
        self.c_str = c_str.into();
    }

    pub fn o_tokens<'s>(&self, orig: &'s Sentence) -> &'s [Token] {
        &orig[self.o_span.clone()]
    }

    pub fn c_tokens<'s>(&self, cor: &'s Sentence) -> &'s [Token] {
        &cor[self.c_span.clone()]
    }

    pub fn error_type(&self) -> Option<&ErrorType> {
        self.error_type.as_ref()
    }

    pub fn set_error_type(&mut self, error_type: ErrorType) {
        self.error_type = Some(error_type);
    }

    /// Removes tokens with the same text from the start, then from the end of both sides,
    /// e. g. `[a b -> a c]` becomes `[b -> c]`. Returns `None` if nothing is left on either side.
    pub fn minimise(mut self, orig: &Sentence, cor: &Sentence) -> Option<Self> {
        while !self.o_span.is_empty()
            && !self.c_span.is_empty()
            && orig[self.o_span.start].text() == cor[self.c_span.start].text()
        {
            self.o_span.start += 1;
            self.c_span.start += 1;
        }

        while !self.o_span.is_empty()
            && !self.c_span.is_empty()
            && orig[self.o_span.end - 1].text() == cor[self.c_span.end - 1].text()
        {
            self.o_span.end -= 1;
            self.c_span.end -= 1;
        }

        if self.o_span.is_empty() && self.c_span.is_empty() {
            return None;
        }

        self.c_str = cor.span_text(self.c_span.clone());
        Some(self)
    }

    /// Formats the edit as an M2 annotation line of the given annotator.
    /// Unclassified edits are written with the type `NA`.
    pub fn to_m2(&self, annotator: usize) -> String {
        let error_type = self
            .error_type
            .as_ref()
            .map_or_else(|| "NA".to_string(), |x| x.to_string());

        format!(
            "A {} {}|||{}|||{}|||REQUIRED|||-NONE-|||{}",
            self.o_span.start, self.o_span.end, error_type, self.c_str, annotator
        )
    }
}

impl fmt::Display for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{} -> {}..{} {:?}",
            self.o_span.start, self.o_span.end, self.c_span.start, self.c_span.end, self.c_str
        )?;

        if let Some(error_type) = &self.error_type {
            write!(f, " ({})", error_type)?;
        }

        Ok(())
    }
}
