//! Evaluation of hypothesis edits against reference edits in M2 format.
//!
//! For every sentence, the hypothesis annotator and reference annotator which maximise the
//! cumulative F-score are chosen. Edits are compared by their original span and, depending on
//! the [Mode], their correction and error type.

use indexmap::IndexMap;
use log::debug;
use std::{
    collections::{BTreeMap, HashSet},
    fmt,
    ops::AddAssign,
};

use crate::{
    m2::{M2Block, M2Edit},
    Error,
};

/// What has to match for a hypothesis edit to count as a true positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Span and correction.
    SpanCorrection,
    /// Span, correction and error type.
    TypedSpanCorrection,
    /// Span only.
    SpanDetection,
    /// Every token of the span on its own. Insertions count as an edit of the following token.
    TokenDetection,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::SpanCorrection
    }
}

impl Mode {
    pub fn title(&self) -> &'static str {
        match self {
            Mode::SpanCorrection => " Span-Based Correction ",
            Mode::TypedSpanCorrection => " Span-Based Correction + Classification ",
            Mode::SpanDetection => " Span-Based Detection ",
            Mode::TokenDetection => " Token-Based Detection ",
        }
    }

    fn is_detection(&self) -> bool {
        matches!(self, Mode::SpanDetection | Mode::TokenDetection)
    }
}

/// The granularity of the per-category results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryLevel {
    /// `M`, `U` and `R` only.
    Operation,
    /// The category without operation, e. g. `NOUN:NUM`.
    Category,
    /// The full error type, e. g. `R:NOUN:NUM`.
    Full,
}

impl CategoryLevel {
    /// The level from its number (1, 2 or 3).
    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(CategoryLevel::Operation),
            2 => Some(CategoryLevel::Category),
            3 => Some(CategoryLevel::Full),
            _ => None,
        }
    }

    fn apply<'a>(&self, category: &'a str) -> &'a str {
        if category == "UNK" {
            return category;
        }

        match self {
            CategoryLevel::Operation => category.get(..1).unwrap_or(category),
            CategoryLevel::Category => category.get(2..).unwrap_or(""),
            CategoryLevel::Full => category,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompareOptions {
    pub beta: f64,
    pub mode: Mode,
    /// Only evaluate edits with at most one token on both sides.
    pub single: bool,
    /// Only evaluate edits with at least two tokens on one side.
    pub multi: bool,
    /// Error types to ignore.
    pub filter: HashSet<String>,
}

impl Default for CompareOptions {
    fn default() -> Self {
        CompareOptions {
            beta: 0.5,
            mode: Mode::default(),
            single: false,
            multi: false,
            filter: HashSet::new(),
        }
    }
}

/// True positive, false positive and false negative counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub tp: usize,
    pub fp: usize,
    pub fn_: usize,
}

impl Counts {
    pub fn new(tp: usize, fp: usize, fn_: usize) -> Self {
        Counts { tp, fp, fn_ }
    }

    /// Precision, recall and F-score.
    pub fn scores(&self, beta: f64) -> (f64, f64, f64) {
        compute_f(self.tp, self.fp, self.fn_, beta)
    }
}

impl AddAssign for Counts {
    fn add_assign(&mut self, other: Self) {
        self.tp += other.tp;
        self.fp += other.fp;
        self.fn_ += other.fn_;
    }
}

fn round4(x: f64) -> f64 {
    (x * 10_000.).round() / 10_000.
}

/// Computes precision, recall and F-beta, rounded to four decimals.
/// Precision (recall) is 1 if there are no false positives (negatives).
pub fn compute_f(tp: usize, fp: usize, fn_: usize, beta: f64) -> (f64, f64, f64) {
    let p = if fp > 0 {
        tp as f64 / (tp + fp) as f64
    } else {
        1.
    };
    let r = if fn_ > 0 {
        tp as f64 / (tp + fn_) as f64
    } else {
        1.
    };
    let f = if p + r > 0. {
        (1. + beta * beta) * p * r / (beta * beta * p + r)
    } else {
        0.
    };

    (round4(p), round4(r), round4(f))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EditKey {
    start: i64,
    end: i64,
    category: Option<String>,
    correction: Option<String>,
}

impl EditKey {
    fn span(start: i64, end: i64) -> Self {
        EditKey {
            start,
            end,
            category: None,
            correction: None,
        }
    }
}

type Annotations = IndexMap<EditKey, Vec<String>>;

fn is_kept(edit: &M2Edit, options: &CompareOptions) -> bool {
    let o_len = edit.o_span.as_ref().map_or(0, |x| x.len());
    let c_len = edit.correction.split_whitespace().count();

    if !options.mode.is_detection() && edit.error_type == "UNK" {
        return false;
    }
    if options.single && (o_len >= 2 || c_len >= 2) {
        return false;
    }
    if options.multi && o_len < 2 && c_len < 2 {
        return false;
    }

    !options.filter.contains(&edit.error_type)
}

/// The edits of every annotator of a block, keyed according to the mode.
fn extract(block: &M2Block, options: &CompareOptions) -> IndexMap<usize, Annotations> {
    let noop = M2Edit {
        o_span: None,
        error_type: "noop".to_string(),
        correction: "-NONE-".to_string(),
        annotator: 0,
    };
    let edits: Vec<&M2Edit> = if block.edits.is_empty() {
        vec![&noop]
    } else {
        block.edits.iter().collect()
    };

    let mut annotators: IndexMap<usize, Annotations> = IndexMap::new();

    for edit in edits {
        let annotations = annotators.entry(edit.annotator).or_default();

        if !is_kept(edit, options) {
            continue;
        }

        let (start, end) = match &edit.o_span {
            Some(span) => (span.start as i64, span.end as i64),
            None => (-1, -1),
        };
        let category = edit.error_type.clone();

        let keys = match options.mode {
            Mode::TokenDetection => {
                if start == -1 {
                    vec![EditKey::span(start, start)]
                } else if start == end {
                    vec![EditKey::span(start, start + 1)]
                } else {
                    (start..end).map(|i| EditKey::span(i, i + 1)).collect()
                }
            }
            Mode::SpanDetection => vec![EditKey::span(start, end)],
            Mode::SpanCorrection => vec![EditKey {
                correction: Some(edit.correction.clone()),
                ..EditKey::span(start, end)
            }],
            Mode::TypedSpanCorrection => vec![EditKey {
                category: Some(category.clone()),
                correction: Some(edit.correction.clone()),
                ..EditKey::span(start, end)
            }],
        };

        for key in keys {
            annotations.entry(key).or_default().push(category.clone());
        }
    }

    annotators
}

/// Compares the edits of one hypothesis annotator with one reference annotator.
/// True positives are counted with the category of the reference.
fn compare_edits(hyp: &Annotations, reference: &Annotations) -> (Counts, BTreeMap<String, Counts>) {
    let mut counts = Counts::default();
    let mut categories: BTreeMap<String, Counts> = BTreeMap::new();
    let is_noop = |x: &[String]| x.first().map_or(false, |x| x == "noop");

    for (key, h_cats) in hyp {
        if is_noop(h_cats) {
            continue;
        }

        match reference.get(key) {
            Some(r_cats) => {
                for cat in r_cats {
                    counts.tp += 1;
                    categories.entry(cat.clone()).or_default().tp += 1;
                }
            }
            None => {
                for cat in h_cats {
                    counts.fp += 1;
                    categories.entry(cat.clone()).or_default().fp += 1;
                }
            }
        }
    }

    for (key, r_cats) in reference {
        if is_noop(r_cats) || hyp.contains_key(key) {
            continue;
        }

        for cat in r_cats {
            counts.fn_ += 1;
            categories.entry(cat.clone()).or_default().fn_ += 1;
        }
    }

    (counts, categories)
}

/// The annotators chosen for a sentence and their counts.
#[derive(Debug, Clone, PartialEq)]
pub struct SentenceResult {
    pub hypothesis: usize,
    pub reference: usize,
    pub counts: Counts,
    pub categories: BTreeMap<String, Counts>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub counts: Counts,
    /// Counts per full error type.
    pub categories: BTreeMap<String, Counts>,
    pub sentences: Vec<SentenceResult>,
}

impl Evaluation {
    /// The per-category counts at the given granularity.
    pub fn categories_at(&self, level: CategoryLevel) -> BTreeMap<String, Counts> {
        let mut output: BTreeMap<String, Counts> = BTreeMap::new();

        for (category, counts) in &self.categories {
            *output
                .entry(level.apply(category).to_string())
                .or_default() += *counts;
        }

        output
    }

    /// Formats the results as tables: one with per-category results if a level is given,
    /// one with the overall result.
    pub fn report(&self, mode: Mode, beta: f64, level: Option<CategoryLevel>) -> Report<'_> {
        Report {
            evaluation: self,
            mode,
            beta,
            level,
        }
    }
}

/// The result tables of an [Evaluation], written through [Display][fmt::Display].
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    evaluation: &'a Evaluation,
    mode: Mode,
    beta: f64,
    level: Option<CategoryLevel>,
}

impl<'a> fmt::Display for Report<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = self.mode.title();
        let beta = self.beta;

        if let Some(level) = self.level {
            writeln!(f)?;
            writeln!(f, "{:=^66}", title)?;
            writeln!(
                f,
                "{:<14} {:<8} {:<8} {:<8} {:<8} {:<8} F{}",
                "Category", "TP", "FP", "FN", "P", "R", beta
            )?;

            for (category, counts) in self.evaluation.categories_at(level) {
                let (p, r, score) = counts.scores(beta);
                writeln!(
                    f,
                    "{:<14} {:<8} {:<8} {:<8} {:<8} {:<8} {}",
                    category,
                    counts.tp,
                    counts.fp,
                    counts.fn_,
                    format_score(p),
                    format_score(r),
                    format_score(score)
                )?;
            }
        }

        let counts = &self.evaluation.counts;
        let (p, r, score) = counts.scores(beta);
        writeln!(f)?;
        writeln!(f, "{:=^46}", title)?;
        writeln!(f, "TP\tFP\tFN\tPrec\tRec\tF{}", beta)?;
        writeln!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}",
            counts.tp,
            counts.fp,
            counts.fn_,
            format_score(p),
            format_score(r),
            format_score(score)
        )?;
        writeln!(f, "{:=^46}", "")
    }
}

/// Formats a score with at least one decimal, e. g. `1.0` or `0.6667`.
fn format_score(x: f64) -> String {
    if x.fract() == 0. {
        format!("{:.1}", x)
    } else {
        x.to_string()
    }
}

/// Evaluates the hypothesis blocks against the reference blocks of the same sentences.
pub fn compare(
    hypothesis: &[M2Block],
    reference: &[M2Block],
    options: &CompareOptions,
) -> Result<Evaluation, Error> {
    if hypothesis.len() != reference.len() {
        return Err(Error::SentenceCountMismatch {
            hypothesis: hypothesis.len(),
            reference: reference.len(),
        });
    }

    let mut total = Counts::default();
    let mut categories: BTreeMap<String, Counts> = BTreeMap::new();
    let mut sentences = Vec::with_capacity(hypothesis.len());

    for (i, (hyp_block, ref_block)) in hypothesis.iter().zip(reference).enumerate() {
        let hyp_annotators = extract(hyp_block, options);
        let ref_annotators = extract(ref_block, options);

        let mut best: Option<(f64, SentenceResult)> = None;

        for (hyp_id, hyp) in &hyp_annotators {
            for (ref_id, annotations) in &ref_annotators {
                let (counts, cats) = compare_edits(hyp, annotations);

                let mut cumulative = total;
                cumulative += counts;
                let (_, _, f) = cumulative.scores(options.beta);

                let is_better = match &best {
                    None => true,
                    Some((best_f, chosen)) => {
                        let b = chosen.counts;
                        f > *best_f
                            || (f == *best_f && counts.tp > b.tp)
                            || (f == *best_f && counts.tp == b.tp && counts.fp < b.fp)
                            || (f == *best_f
                                && counts.tp == b.tp
                                && counts.fp == b.fp
                                && counts.fn_ < b.fn_)
                    }
                };

                if is_better {
                    best = Some((
                        f,
                        SentenceResult {
                            hypothesis: *hyp_id,
                            reference: *ref_id,
                            counts,
                            categories: cats,
                        },
                    ));
                }
            }
        }

        if let Some((_, result)) = best {
            debug!(
                "sentence {}: hypothesis {} and reference {} chosen with {:?}",
                i, result.hypothesis, result.reference, result.counts
            );

            total += result.counts;
            for (category, counts) in &result.categories {
                *categories.entry(category.clone()).or_default() += *counts;
            }
            sentences.push(result);
        }
    }

    Ok(Evaluation {
        counts: total,
        categories,
        sentences,
    })
}
