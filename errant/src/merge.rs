//! Merging of the primitive operations of an alignment into edits.
//!
//! The linguistic [MergePolicy::Rules] policy drops matches, keeps every transposition as its own edit
//! and decides for each run of substitutions, insertions and deletions which operations belong together
//! by an ordered list of rules. The first rule which fires for a window of the run splits the run
//! around the window and the parts before and after it are processed recursively.

use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use std::{cmp::Reverse, collections::HashSet, fmt, ops::Range, str::FromStr};

use crate::{
    align::{AlignOp, Alignment, OpKind},
    types::{Edit, Pos, Sentence, Token},
    utils, Error,
};

/// How primitive operations are merged into edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergePolicy {
    /// Linguistically motivated merging.
    Rules,
    /// Every non-match operation is its own edit.
    AllSplit,
    /// Every run of adjacent non-match operations is one edit.
    AllMerge,
    /// Every run of adjacent operations of the same kind is one edit.
    AllEqual,
}

impl Default for MergePolicy {
    fn default() -> Self {
        MergePolicy::Rules
    }
}

impl FromStr for MergePolicy {
    type Err = Error;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        Ok(match string {
            "rules" => MergePolicy::Rules,
            "all-split" => MergePolicy::AllSplit,
            "all-merge" => MergePolicy::AllMerge,
            "all-equal" => MergePolicy::AllEqual,
            x => return Err(Error::UnknownMergePolicy(x.to_string())),
        })
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MergePolicy::Rules => "rules",
            MergePolicy::AllSplit => "all-split",
            MergePolicy::AllMerge => "all-merge",
            MergePolicy::AllEqual => "all-equal",
        })
    }
}

/// Language-specific options for the merging rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MergerLangOptions {
    /// The fine tag of possessive suffixes like "'s".
    pub possessive_tag: String,
    /// Classes of content words. A run containing content words is merged if no rule fires.
    pub open_pos: HashSet<Pos>,
    /// Windows consisting only of these classes are merged if the sides differ in length.
    pub verbal_pos: HashSet<Pos>,
    pub determiner_pos: Pos,
    /// Chars which are ignored when comparing the concatenated sides of a window.
    pub ignored_chars: Vec<char>,
    /// Substitutions at the boundary of a window whose char similarity exceeds this are split off.
    pub similarity_threshold: f64,
}

/// A token range on both sides.
type Spans = (Range<usize>, Range<usize>);

fn op_spans(op: &AlignOp) -> Spans {
    (op.o_span(), op.c_span())
}

/// Merges a sequence of adjacent operations into one span pair.
fn merge_ops(seq: &[AlignOp]) -> Option<Spans> {
    let (first, last) = (seq.first()?, seq.last()?);
    Some((first.o_start..last.o_end, first.c_start..last.c_end))
}

/// What to do with a run of operations once a rule fired on the window `start..=end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    /// Merge the last two operations of the window.
    MergeLastPair,
    /// Merge the whole window.
    MergeWindow,
    /// Split the run after the first operation of the window.
    SplitAfterStart,
    /// Split off the last operation of the run.
    SplitLast,
}

/// A window `start..=end` of a run of operations which contains at least one substitution.
struct Window<'a> {
    options: &'a MergerLangOptions,
    seq: &'a [AlignOp],
    start: usize,
    end: usize,
    o: &'a [Token],
    c: &'a [Token],
    pos_set: HashSet<Pos>,
}

impl<'a> Window<'a> {
    fn kind(&self, index: usize) -> OpKind {
        self.seq[index].kind
    }

    fn len(&self) -> usize {
        self.end - self.start + 1
    }
}

struct MergeRule {
    name: &'static str,
    apply: fn(&Window) -> Option<Action>,
}

fn is_punct(token: &Token) -> bool {
    token.pos() == Pos::Punct || utils::punctuation_chars().contains(token.text())
}

fn last(tokens: &[Token]) -> &Token {
    &tokens[tokens.len() - 1]
}

/// [friends -> friend 's]
fn possessive_suffix(window: &Window) -> Option<Action> {
    let tag = window.options.possessive_tag.as_str();

    if last(window.o).tag() == tag || last(window.c).tag() == tag {
        Some(Action::MergeLastPair)
    } else {
        None
    }
}

/// [Cat -> The big cat], [, we -> . We]
fn case_change(window: &Window) -> Option<Action> {
    let (o, c) = (window.o, window.c);

    if last(o).lower() != last(c).lower() {
        return None;
    }

    if window.start == 0
        && ((o.len() == 1 && utils::starts_uppercase(c[0].text()))
            || (c.len() == 1 && utils::starts_uppercase(o[0].text())))
    {
        return Some(Action::MergeWindow);
    }

    if (o.len() > 1 && is_punct(&o[o.len() - 2])) || (c.len() > 1 && is_punct(&c[c.len() - 2])) {
        return Some(Action::MergeLastPair);
    }

    None
}

/// [acat -> a cat], [sub - way -> subway]
fn whitespace(window: &Window) -> Option<Action> {
    let join = |tokens: &[Token]| -> String {
        tokens
            .iter()
            .flat_map(|x| x.lower().chars())
            .filter(|x| !window.options.ignored_chars.contains(x))
            .collect()
    };

    if join(window.o) == join(window.c) {
        Some(Action::MergeWindow)
    } else {
        None
    }
}

/// [to eat -> eating], [watch -> look at]
fn same_pos(window: &Window) -> Option<Action> {
    if window.o.len() != window.c.len()
        && (window.pos_set.len() == 1 || window.pos_set.is_subset(&window.options.verbal_pos))
    {
        Some(Action::MergeWindow)
    } else {
        None
    }
}

fn adjacent_substitutions(window: &Window) -> Option<Action> {
    if window.len() <= 2 && window.o.len() == 2 && window.c.len() == 2 {
        Some(Action::SplitAfterStart)
    } else {
        None
    }
}

fn similar_substitution(window: &Window) -> Option<Action> {
    if window.len() > 2 {
        return None;
    }

    let (o, c) = (window.o, window.c);
    let threshold = window.options.similarity_threshold;

    if (window.kind(window.start) == OpKind::Substitute
        && utils::char_ratio(o[0].text(), c[0].text()) > threshold)
        || (window.kind(window.end) == OpKind::Substitute
            && utils::char_ratio(last(o).text(), last(c).text()) > threshold)
    {
        Some(Action::SplitAfterStart)
    } else {
        None
    }
}

fn final_determiner(window: &Window) -> Option<Action> {
    if window.len() > 2 || window.end != window.seq.len() - 1 {
        return None;
    }

    let det = window.options.determiner_pos;
    let kind = window.kind(window.end);

    if (matches!(kind, OpKind::Delete | OpKind::Substitute) && last(window.o).pos() == det)
        || (matches!(kind, OpKind::Insert | OpKind::Substitute) && last(window.c).pos() == det)
    {
        Some(Action::SplitLast)
    } else {
        None
    }
}

/// The rules in the order they are tested. The last three only apply to windows of at most two operations.
const RULES: &[MergeRule] = &[
    MergeRule {
        name: "possessive_suffix",
        apply: possessive_suffix,
    },
    MergeRule {
        name: "case_change",
        apply: case_change,
    },
    MergeRule {
        name: "whitespace",
        apply: whitespace,
    },
    MergeRule {
        name: "same_pos",
        apply: same_pos,
    },
    MergeRule {
        name: "adjacent_substitutions",
        apply: adjacent_substitutions,
    },
    MergeRule {
        name: "similar_substitution",
        apply: similar_substitution,
    },
    MergeRule {
        name: "final_determiner",
        apply: final_determiner,
    },
];

/// Merges the operations of an [Alignment] into [Edit]s.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Merger {
    options: MergerLangOptions,
}

impl Merger {
    pub fn new(options: MergerLangOptions) -> Self {
        Merger { options }
    }

    pub fn options(&self) -> &MergerLangOptions {
        &self.options
    }

    /// Creates the unclassified edits of the alignment with the given policy, from left to right.
    pub fn merge(&self, alignment: &Alignment, policy: MergePolicy) -> Vec<Edit> {
        let seq = alignment.align_seq();

        let spans: Vec<Spans> = match policy {
            MergePolicy::Rules => self.rule_spans(alignment),
            MergePolicy::AllSplit => seq
                .iter()
                .filter(|x| x.kind != OpKind::Match)
                .map(op_spans)
                .collect(),
            MergePolicy::AllMerge => seq
                .iter()
                .group_by(|x| x.kind == OpKind::Match)
                .into_iter()
                .filter(|(is_match, _)| !is_match)
                .filter_map(|(_, group)| merge_ops(&group.copied().collect::<Vec<_>>()))
                .collect(),
            MergePolicy::AllEqual => seq
                .iter()
                .group_by(|x| x.kind)
                .into_iter()
                .filter(|(kind, _)| *kind != OpKind::Match)
                .filter_map(|(_, group)| merge_ops(&group.copied().collect::<Vec<_>>()))
                .collect(),
        };

        spans
            .into_iter()
            .map(|(o_span, c_span)| Edit::spanning(alignment.cor(), o_span, c_span))
            .collect()
    }

    fn rule_spans(&self, alignment: &Alignment) -> Vec<Spans> {
        #[derive(PartialEq)]
        enum Group {
            Match,
            Transpose,
            Other,
        }

        let mut spans = Vec::new();

        for (group, ops) in &alignment.align_seq().iter().group_by(|x| match x.kind {
            OpKind::Match => Group::Match,
            OpKind::Transpose(_) => Group::Transpose,
            _ => Group::Other,
        }) {
            match group {
                Group::Match => {}
                Group::Transpose => spans.extend(ops.map(op_spans)),
                Group::Other => {
                    let ops: Vec<_> = ops.copied().collect();
                    spans.extend(self.process_seq(&ops, alignment.orig(), alignment.cor()));
                }
            }
        }

        spans
    }

    /// Merges or splits a run of substitutions, insertions and deletions.
    fn process_seq(&self, seq: &[AlignOp], orig: &Sentence, cor: &Sentence) -> Vec<Spans> {
        if seq.len() <= 1 {
            return seq.iter().map(op_spans).collect();
        }

        if seq.iter().all(|x| x.kind == OpKind::Delete)
            || seq.iter().all(|x| x.kind == OpKind::Insert)
        {
            return merge_ops(seq).into_iter().collect();
        }

        let mut content = false;

        // largest windows first, ties from left to right
        let mut windows: Vec<(usize, usize)> = (0..seq.len()).tuple_combinations().collect();
        windows.sort_by_key(|(start, end)| Reverse(end - start));

        for (start, end) in windows {
            if !seq[start..=end]
                .iter()
                .any(|x| x.kind == OpKind::Substitute)
            {
                continue;
            }

            let o = &orig[seq[start].o_start..seq[end].o_end];
            let c = &cor[seq[start].c_start..seq[end].c_end];

            let window = Window {
                options: &self.options,
                seq,
                start,
                end,
                o,
                c,
                pos_set: o.iter().chain(c.iter()).map(|x| x.pos()).collect(),
            };

            if let Some((rule, action)) = RULES
                .iter()
                .find_map(|rule| (rule.apply)(&window).map(|action| (rule, action)))
            {
                debug!(
                    "merge rule {} fired on operations {}..={}: {:?}",
                    rule.name, start, end, action
                );
                return self.apply(action, seq, start, end, orig, cor);
            }

            if !window.pos_set.is_disjoint(&self.options.open_pos) {
                content = true;
            }
        }

        if content {
            merge_ops(seq).into_iter().collect()
        } else {
            seq.iter().map(op_spans).collect()
        }
    }

    fn apply(
        &self,
        action: Action,
        seq: &[AlignOp],
        start: usize,
        end: usize,
        orig: &Sentence,
        cor: &Sentence,
    ) -> Vec<Spans> {
        let mut spans = Vec::new();

        match action {
            Action::MergeLastPair => {
                spans.extend(self.process_seq(&seq[..end - 1], orig, cor));
                spans.extend(merge_ops(&seq[end - 1..=end]));
                spans.extend(self.process_seq(&seq[end + 1..], orig, cor));
            }
            Action::MergeWindow => {
                spans.extend(self.process_seq(&seq[..start], orig, cor));
                spans.extend(merge_ops(&seq[start..=end]));
                spans.extend(self.process_seq(&seq[end + 1..], orig, cor));
            }
            Action::SplitAfterStart => {
                spans.extend(self.process_seq(&seq[..=start], orig, cor));
                spans.extend(self.process_seq(&seq[start + 1..], orig, cor));
            }
            Action::SplitLast => {
                let n = seq.len();
                spans.extend(self.process_seq(&seq[..n - 1], orig, cor));
                spans.push(op_spans(&seq[n - 1]));
            }
        }

        spans
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{align::LinguisticCosts, types::Sentence};

    fn options() -> MergerLangOptions {
        MergerLangOptions {
            possessive_tag: "POS".into(),
            open_pos: [Pos::Adj, Pos::Aux, Pos::Adv, Pos::Noun, Pos::Verb]
                .iter()
                .copied()
                .collect(),
            verbal_pos: [Pos::Aux, Pos::Part, Pos::Verb].iter().copied().collect(),
            determiner_pos: Pos::Det,
            ignored_chars: vec!['\'', '-'],
            similarity_threshold: 0.75,
        }
    }

    fn sentence(tokens: &[(&str, Pos, &str)]) -> Sentence {
        Sentence::new(
            tokens
                .iter()
                .map(|(text, pos, tag)| Token::new(*text, *pos, *tag, *text, "dep", 0))
                .collect(),
        )
        .unwrap()
    }

    fn spans(orig: &Sentence, cor: &Sentence, policy: MergePolicy) -> Vec<(Range<usize>, Range<usize>)> {
        let alignment = Alignment::new(orig, cor, &LinguisticCosts::default());

        Merger::new(options())
            .merge(&alignment, policy)
            .into_iter()
            .map(|x| (x.o_span().clone(), x.c_span().clone()))
            .collect()
    }

    /// Chains operations of the given kinds, starting at the beginning of both sentences.
    fn ops(kinds: &[OpKind]) -> Vec<AlignOp> {
        let (mut i, mut j) = (0, 0);

        kinds
            .iter()
            .map(|&kind| {
                let (o_len, c_len) = match kind {
                    OpKind::Match | OpKind::Substitute => (1, 1),
                    OpKind::Insert => (0, 1),
                    OpKind::Delete => (1, 0),
                    OpKind::Transpose(k) => (k, k),
                };
                let op = AlignOp {
                    kind,
                    o_start: i,
                    o_end: i + o_len,
                    c_start: j,
                    c_end: j + c_len,
                };
                i += o_len;
                j += c_len;
                op
            })
            .collect()
    }

    fn process(orig: &Sentence, cor: &Sentence, kinds: &[OpKind]) -> Vec<Spans> {
        Merger::new(options()).process_seq(&ops(kinds), orig, cor)
    }

    use OpKind::{Delete as D, Insert as I, Substitute as S};

    #[test]
    fn same_pos_runs_are_merged() {
        // [house -> home place]
        let orig = sentence(&[("house", Pos::Noun, "NN")]);
        let cor = sentence(&[("home", Pos::Noun, "NN"), ("place", Pos::Noun, "NN")]);
        assert_eq!(process(&orig, &cor, &[S, I]), vec![(0..1, 0..2)]);

        // [to eat -> eating]
        let orig = sentence(&[("to", Pos::Part, "TO"), ("eat", Pos::Verb, "VB")]);
        let cor = sentence(&[("eating", Pos::Verb, "VBG")]);
        assert_eq!(process(&orig, &cor, &[D, S]), vec![(0..2, 0..1)]);
    }

    #[test]
    fn case_change_after_punctuation_is_merged() {
        // [dogs , we -> cats . We]
        let orig = sentence(&[
            ("dogs", Pos::Noun, "NNS"),
            (",", Pos::Punct, ","),
            ("we", Pos::Pron, "PRP"),
        ]);
        let cor = sentence(&[
            ("cats", Pos::Noun, "NNS"),
            (".", Pos::Punct, "."),
            ("We", Pos::Pron, "PRP"),
        ]);

        assert_eq!(
            process(&orig, &cor, &[S, S, S]),
            vec![(0..1, 0..1), (1..3, 1..3)]
        );
    }

    #[test]
    fn adjacent_substitutions_are_split() {
        let orig = sentence(&[
            ("the", Pos::Det, "DT"),
            ("big", Pos::Adj, "JJ"),
            ("dog", Pos::Noun, "NN"),
        ]);
        let cor = sentence(&[
            ("a", Pos::Det, "DT"),
            ("small", Pos::Adj, "JJ"),
            ("cat", Pos::Noun, "NN"),
        ]);

        assert_eq!(
            process(&orig, &cor, &[S, S, S]),
            vec![(0..1, 0..1), (1..2, 1..2), (2..3, 2..3)]
        );
    }

    #[test]
    fn similar_substitutions_are_split_above_threshold() {
        // char ratio of [color -> colour] is 10 / 11
        let orig = sentence(&[("color", Pos::Noun, "NN")]);
        let cor = sentence(&[("colour", Pos::Noun, "NN"), ("red", Pos::Adj, "JJ")]);
        assert_eq!(
            process(&orig, &cor, &[S, I]),
            vec![(0..1, 0..1), (1..1, 1..2)]
        );

        // char ratio of [form -> farm] is exactly 0.75, so the content words are merged
        let orig = sentence(&[("form", Pos::Noun, "NN")]);
        let cor = sentence(&[("farm", Pos::Noun, "NN"), ("red", Pos::Adj, "JJ")]);
        assert_eq!(utils::char_ratio("form", "farm"), 0.75);
        assert_eq!(process(&orig, &cor, &[S, I]), vec![(0..1, 0..2)]);
    }

    #[test]
    fn final_determiners_are_split() {
        // [eat -> ate the]
        let orig = sentence(&[("eat", Pos::Verb, "VB")]);
        let cor = sentence(&[("ate", Pos::Verb, "VBD"), ("the", Pos::Det, "DT")]);

        assert_eq!(
            process(&orig, &cor, &[S, I]),
            vec![(0..1, 0..1), (1..1, 1..2)]
        );
    }

    #[test]
    fn runs_without_content_words_are_split() {
        // [of to -> in]
        let orig = sentence(&[("of", Pos::Prep, "IN"), ("to", Pos::Part, "TO")]);
        let cor = sentence(&[("in", Pos::Prep, "IN")]);

        assert_eq!(
            process(&orig, &cor, &[S, D]),
            vec![(0..1, 0..1), (1..2, 1..1)]
        );
    }

    #[test]
    fn policy_names() {
        assert_eq!("all-split".parse::<MergePolicy>().unwrap(), MergePolicy::AllSplit);
        assert_eq!(MergePolicy::AllEqual.to_string(), "all-equal");
        assert!(matches!(
            "everything".parse::<MergePolicy>(),
            Err(Error::UnknownMergePolicy(_))
        ));
    }

    #[test]
    fn whitespace_is_merged() {
        let orig = sentence(&[("cat", Pos::Noun, "NN"), ("s", Pos::Noun, "NNS")]);
        let cor = sentence(&[("cats", Pos::Noun, "NNS")]);

        assert_eq!(spans(&orig, &cor, MergePolicy::Rules), vec![(0..2, 0..1)]);
    }

    #[test]
    fn possessive_suffix_is_merged() {
        let orig = sentence(&[("friends", Pos::Noun, "NNS")]);
        let cor = sentence(&[("friend", Pos::Noun, "NN"), ("'s", Pos::Part, "POS")]);

        assert_eq!(spans(&orig, &cor, MergePolicy::Rules), vec![(0..1, 0..2)]);
    }

    #[test]
    fn case_change_at_start_is_merged() {
        let orig = sentence(&[("Cat", Pos::Noun, "NN"), ("sat", Pos::Verb, "VBD")]);
        let cor = sentence(&[
            ("The", Pos::Det, "DT"),
            ("cat", Pos::Noun, "NN"),
            ("sat", Pos::Verb, "VBD"),
        ]);

        assert_eq!(spans(&orig, &cor, MergePolicy::Rules), vec![(0..1, 0..2)]);
    }

    #[test]
    fn transpositions_stay_alone() {
        let orig = sentence(&[("A", Pos::Noun, "NN"), ("B", Pos::Noun, "NN")]);
        let cor = sentence(&[("B", Pos::Noun, "NN"), ("A", Pos::Noun, "NN")]);

        assert_eq!(spans(&orig, &cor, MergePolicy::Rules), vec![(0..2, 0..2)]);
    }

    #[test]
    fn pure_deletions_are_merged() {
        let orig = sentence(&[
            ("the", Pos::Det, "DT"),
            ("big", Pos::Adj, "JJ"),
            ("dog", Pos::Noun, "NN"),
        ]);
        let cor = sentence(&[("dog", Pos::Noun, "NN")]);

        assert_eq!(spans(&orig, &cor, MergePolicy::Rules), vec![(0..2, 0..0)]);
        assert_eq!(
            spans(&orig, &cor, MergePolicy::AllSplit),
            vec![(0..1, 0..0), (1..2, 0..0)]
        );
    }

    #[test]
    fn alternate_policies() {
        let orig = sentence(&[
            ("a", Pos::Det, "DT"),
            ("b", Pos::Noun, "NN"),
            ("c", Pos::Noun, "NN"),
            ("d", Pos::Noun, "NN"),
        ]);
        let cor = sentence(&[("a", Pos::Det, "DT"), ("x", Pos::Noun, "NN")]);

        let alignment = Alignment::new(&orig, &cor, &LinguisticCosts::default());
        let n_changes = alignment
            .align_seq()
            .iter()
            .filter(|x| x.kind != OpKind::Match)
            .count();

        assert_eq!(spans(&orig, &cor, MergePolicy::AllSplit).len(), n_changes);
        assert_eq!(spans(&orig, &cor, MergePolicy::AllMerge), vec![(1..4, 1..2)]);
        assert!(spans(&orig, &cor, MergePolicy::AllEqual).len() >= 2);
    }
}
