//! Alignment of an original and a corrected sentence by a weighted edit distance which
//! also allows transpositions of runs of tokens.

use enum_dispatch::enum_dispatch;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, collections::VecDeque, fmt, ops::Range};

use crate::{
    types::{Pos, Sentence, Token},
    utils,
};

/// The costs of the operations of an alignment.
#[enum_dispatch]
pub trait Costs {
    fn insertion(&self, token: &Token) -> f64;

    fn deletion(&self, token: &Token) -> f64;

    fn substitution(&self, a: &Token, b: &Token) -> f64;

    /// The cost of transposing the run `a` into the run `b`.
    /// Both runs have the same length and contain the same tokens ignoring case.
    fn transposition(&self, a: &[Token], b: &[Token]) -> f64;
}

/// Costs which make substitutions of similar tokens cheap: tokens with the same lemma,
/// the same part-of-speech and similar characters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LinguisticCosts {
    /// Added if the lemmas differ.
    pub lemma_cost: f64,
    /// Added if the part-of-speech differs but both tokens are in an open class.
    pub open_pos_cost: f64,
    /// Added if the part-of-speech differs otherwise.
    pub pos_cost: f64,
    pub open_pos: HashSet<Pos>,
}

impl Default for LinguisticCosts {
    fn default() -> Self {
        LinguisticCosts {
            lemma_cost: 0.499,
            open_pos_cost: 0.25,
            pos_cost: 0.5,
            open_pos: [Pos::Adj, Pos::Adv, Pos::Noun, Pos::Verb]
                .iter()
                .copied()
                .collect(),
        }
    }
}

impl Costs for LinguisticCosts {
    fn insertion(&self, _token: &Token) -> f64 {
        1.
    }

    fn deletion(&self, _token: &Token) -> f64 {
        1.
    }

    fn substitution(&self, a: &Token, b: &Token) -> f64 {
        if a.lower() == b.lower() {
            return 0.;
        }

        let lemma_cost = if a.lemma() == b.lemma() {
            0.
        } else {
            self.lemma_cost
        };

        let pos_cost = if a.pos() == b.pos() {
            0.
        } else if self.open_pos.contains(&a.pos()) && self.open_pos.contains(&b.pos()) {
            self.open_pos_cost
        } else {
            self.pos_cost
        };

        let char_cost = 1. - utils::char_ratio(a.text(), b.text());

        lemma_cost + pos_cost + char_cost
    }

    fn transposition(&self, a: &[Token], _b: &[Token]) -> f64 {
        (a.len() - 1) as f64
    }
}

/// Plain Levenshtein costs: every operation costs one, transpositions are not allowed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct LevenshteinCosts;

impl Costs for LevenshteinCosts {
    fn insertion(&self, _token: &Token) -> f64 {
        1.
    }

    fn deletion(&self, _token: &Token) -> f64 {
        1.
    }

    fn substitution(&self, _a: &Token, _b: &Token) -> f64 {
        1.
    }

    fn transposition(&self, _a: &[Token], _b: &[Token]) -> f64 {
        f64::INFINITY
    }
}

/// The built-in cost policies.
#[enum_dispatch(Costs)]
#[derive(Debug, Clone, PartialEq)]
pub enum CostPolicy {
    LinguisticCosts,
    LevenshteinCosts,
}

/// A primitive operation of an alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Match,
    Substitute,
    Insert,
    Delete,
    /// A transposition of a run of the given number of tokens.
    Transpose(usize),
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpKind::Match => write!(f, "M"),
            OpKind::Substitute => write!(f, "S"),
            OpKind::Insert => write!(f, "I"),
            OpKind::Delete => write!(f, "D"),
            OpKind::Transpose(k) => write!(f, "T{}", k),
        }
    }
}

/// A primitive operation together with the token ranges it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlignOp {
    pub kind: OpKind,
    pub o_start: usize,
    pub o_end: usize,
    pub c_start: usize,
    pub c_end: usize,
}

impl AlignOp {
    /// The operation ending in the cell (i, j) of the alignment table.
    fn ending_at(kind: OpKind, i: usize, j: usize) -> Self {
        let (o_len, c_len) = match kind {
            OpKind::Match | OpKind::Substitute => (1, 1),
            OpKind::Insert => (0, 1),
            OpKind::Delete => (1, 0),
            OpKind::Transpose(k) => (k, k),
        };

        AlignOp {
            kind,
            o_start: i - o_len,
            o_end: i,
            c_start: j - c_len,
            c_end: j,
        }
    }

    pub fn o_span(&self) -> Range<usize> {
        self.o_start..self.o_end
    }

    pub fn c_span(&self) -> Range<usize> {
        self.c_start..self.c_end
    }
}

/// A cell of the alignment table: the minimal cost to align the prefixes and all operations
/// reaching this cost, in the order delete, insert, substitute, transpose.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub cost: f64,
    pub ops: Vec<OpKind>,
}

/// The order in which [Alignment::alignments] enumerates optimal paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    BreadthFirst,
    DepthFirst,
}

/// The alignment of an original and a corrected sentence.
#[derive(Debug, Clone)]
pub struct Alignment<'a> {
    orig: &'a Sentence,
    cor: &'a Sentence,
    cells: Vec<Vec<Cell>>,
    align_seq: Vec<AlignOp>,
}

fn same_multiset(a: &[Token], b: &[Token]) -> bool {
    let mut a: Vec<_> = a.iter().map(|x| x.lower()).collect();
    let mut b: Vec<_> = b.iter().map(|x| x.lower()).collect();
    a.sort_unstable();
    b.sort_unstable();

    a == b
}

impl<'a> Alignment<'a> {
    /// Aligns `orig` and `cor` with the given costs. Tokens only match if their text is exactly equal.
    pub fn new<C: Costs + ?Sized>(orig: &'a Sentence, cor: &'a Sentence, costs: &C) -> Self {
        let (m, n) = (orig.len(), cor.len());
        let mut cells = vec![vec![Cell::default(); n + 1]; m + 1];

        for i in 1..=m {
            cells[i][0] = Cell {
                cost: cells[i - 1][0].cost + costs.deletion(&orig[i - 1]),
                ops: vec![OpKind::Delete],
            };
        }
        for j in 1..=n {
            cells[0][j] = Cell {
                cost: cells[0][j - 1].cost + costs.insertion(&cor[j - 1]),
                ops: vec![OpKind::Insert],
            };
        }

        for i in 0..m {
            for j in 0..n {
                if orig[i].text() == cor[j].text() {
                    cells[i + 1][j + 1] = Cell {
                        cost: cells[i][j].cost,
                        ops: vec![OpKind::Match],
                    };
                    continue;
                }

                let del_cost = cells[i][j + 1].cost + costs.deletion(&orig[i]);
                let ins_cost = cells[i + 1][j].cost + costs.insertion(&cor[j]);
                let sub_cost = cells[i][j].cost + costs.substitution(&orig[i], &cor[j]);

                // walk the diagonal as long as it does not consist of matches
                let mut trans = None;
                let mut k = 1;
                while k <= i && k <= j && cells[i - k + 1][j - k + 1].cost != cells[i - k][j - k].cost
                {
                    let (o_run, c_run) = (&orig[i - k..=i], &cor[j - k..=j]);

                    if same_multiset(o_run, c_run) {
                        trans = Some((
                            cells[i - k][j - k].cost + costs.transposition(o_run, c_run),
                            k + 1,
                        ));
                        break;
                    }
                    k += 1;
                }
                let trans_cost = trans.map_or(f64::INFINITY, |(cost, _)| cost);

                let cost = del_cost.min(ins_cost).min(sub_cost).min(trans_cost);
                let mut ops = Vec::new();

                if del_cost == cost {
                    ops.push(OpKind::Delete);
                }
                if ins_cost == cost {
                    ops.push(OpKind::Insert);
                }
                if sub_cost == cost {
                    ops.push(OpKind::Substitute);
                }
                if let Some((trans_cost, len)) = trans {
                    if trans_cost == cost {
                        ops.push(OpKind::Transpose(len));
                    }
                }

                cells[i + 1][j + 1] = Cell { cost, ops };
            }
        }

        let mut alignment = Alignment {
            orig,
            cor,
            cells,
            align_seq: Vec::new(),
        };
        alignment.align_seq = alignment.cheapest_align_seq();
        alignment
    }

    /// Follows the preferred operation of each cell back to the origin.
    /// Ties are broken by preferring transpositions, then substitutions, then insertions, then deletions.
    fn cheapest_align_seq(&self) -> Vec<AlignOp> {
        let (mut i, mut j) = (self.orig.len(), self.cor.len());
        let mut align_seq = Vec::new();

        while i + j != 0 {
            let kind = *self.cells[i][j]
                .ops
                .last()
                .expect("every cell except the origin has an operation");
            let op = AlignOp::ending_at(kind, i, j);

            i = op.o_start;
            j = op.c_start;
            align_seq.push(op);
        }

        align_seq.reverse();
        align_seq
    }

    pub fn orig(&self) -> &'a Sentence {
        self.orig
    }

    pub fn cor(&self) -> &'a Sentence {
        self.cor
    }

    /// The total cost of the alignment.
    pub fn cost(&self) -> f64 {
        self.cells[self.orig.len()][self.cor.len()].cost
    }

    /// The alignment table with `orig.len() + 1` rows and `cor.len() + 1` columns.
    pub fn cells(&self) -> &[Vec<Cell>] {
        &self.cells
    }

    /// The cheapest sequence of operations from left to right. Its spans tile both sentences.
    pub fn align_seq(&self) -> &[AlignOp] {
        &self.align_seq
    }

    /// Iterates over all optimal sequences of operations.
    /// The first sequence in depth-first order is the [align_seq][Alignment::align_seq].
    pub fn alignments(&self, traversal: Traversal) -> Alignments<'_, 'a> {
        let mut frontier = VecDeque::new();
        frontier.push_back((self.orig.len(), self.cor.len(), Vec::new()));

        Alignments {
            alignment: self,
            traversal,
            frontier,
        }
    }

    /// The average number of occurences of each non-match operation over all optimal sequences.
    /// The number of optimal sequences can grow exponentially with the sentence length.
    pub fn op_counts(&self) -> IndexMap<OpKind, f64> {
        let mut counts: IndexMap<OpKind, f64> = IndexMap::new();
        let mut n_paths = 0usize;

        for path in self.alignments(Traversal::BreadthFirst) {
            n_paths += 1;

            for op in path.iter().filter(|x| x.kind != OpKind::Match) {
                *counts.entry(op.kind).or_insert(0.) += 1.;
            }
        }

        for count in counts.values_mut() {
            *count /= n_paths as f64;
        }

        counts
    }
}

/// Iterator over the optimal operation sequences of an [Alignment].
pub struct Alignments<'t, 'a> {
    alignment: &'t Alignment<'a>,
    traversal: Traversal,
    frontier: VecDeque<(usize, usize, Vec<AlignOp>)>,
}

impl<'t, 'a> Iterator for Alignments<'t, 'a> {
    type Item = Vec<AlignOp>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (i, j, path) = match self.traversal {
                Traversal::BreadthFirst => self.frontier.pop_front()?,
                Traversal::DepthFirst => self.frontier.pop_back()?,
            };

            if i + j == 0 {
                let mut path = path;
                path.reverse();
                return Some(path);
            }

            for kind in &self.alignment.cells[i][j].ops {
                let op = AlignOp::ending_at(*kind, i, j);

                let mut next = path.clone();
                next.push(op);
                self.frontier.push_back((op.o_start, op.c_start, next));
            }
        }
    }
}

impl<'a> fmt::Display for Alignment<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Orig: {}", self.orig.text())?;
        writeln!(f, "Cor: {}", self.cor.text())?;

        writeln!(f, "Cost Matrix:")?;
        for row in &self.cells {
            let costs: Vec<_> = row.iter().map(|x| format!("{:.3}", x.cost)).collect();
            writeln!(f, "[{}]", costs.join(", "))?;
        }

        writeln!(f, "Operation Matrix:")?;
        for row in &self.cells {
            let ops: Vec<_> = row
                .iter()
                .map(|x| {
                    if x.ops.is_empty() {
                        "O".to_string()
                    } else {
                        x.ops.iter().map(|op| op.to_string()).collect::<Vec<_>>().join("|")
                    }
                })
                .collect();
            writeln!(f, "[{}]", ops.join(", "))?;
        }

        let seq: Vec<_> = self.align_seq.iter().map(|x| x.kind.to_string()).collect();
        write!(f, "Best alignment: [{}]", seq.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(words: &[(&str, Pos, &str)]) -> Sentence {
        Sentence::new(
            words
                .iter()
                .map(|(text, pos, lemma)| Token::new(*text, *pos, "XX", *lemma, "dep", 0))
                .collect(),
        )
        .unwrap()
    }

    fn words(words: &[&str]) -> Sentence {
        sentence(
            &words
                .iter()
                .map(|x| (*x, Pos::Noun, *x))
                .collect::<Vec<_>>(),
        )
    }

    fn kinds(alignment: &Alignment) -> Vec<String> {
        alignment
            .align_seq()
            .iter()
            .map(|x| x.kind.to_string())
            .collect()
    }

    #[test]
    fn identical_sentences_only_match() {
        let orig = words(&["a", "cat"]);
        let alignment = Alignment::new(&orig, &orig, &LinguisticCosts::default());

        assert_eq!(alignment.cost(), 0.);
        assert_eq!(kinds(&alignment), vec!["M", "M"]);
    }

    #[test]
    fn transposition_of_two_tokens() {
        let orig = words(&["A", "B"]);
        let cor = words(&["B", "A"]);
        let alignment = Alignment::new(&orig, &cor, &LinguisticCosts::default());

        assert_eq!(alignment.cost(), 1.);
        assert_eq!(kinds(&alignment), vec!["T2"]);
        assert_eq!(
            alignment.align_seq()[0],
            AlignOp {
                kind: OpKind::Transpose(2),
                o_start: 0,
                o_end: 2,
                c_start: 0,
                c_end: 2
            }
        );
    }

    #[test]
    fn transposition_walk_passes_cheaper_diagonal_cells() {
        // the diagonal cost falls after the T2 of [Yq the -> the Yq]
        let orig = words(&["B", "Yq", "the", "A"]);
        let cor = words(&["A", "A", "the", "Yq", "B"]);
        let alignment = Alignment::new(&orig, &cor, &LinguisticCosts::default());

        assert_eq!(alignment.cost(), 4.);
        assert_eq!(kinds(&alignment), vec!["I", "T4"]);
    }

    #[test]
    fn levenshtein_never_transposes() {
        let orig = words(&["A", "B"]);
        let cor = words(&["B", "A"]);
        let alignment = Alignment::new(&orig, &cor, &CostPolicy::from(LevenshteinCosts));

        assert_eq!(alignment.cost(), 2.);
        assert!(alignment
            .align_seq()
            .iter()
            .all(|x| !matches!(x.kind, OpKind::Transpose(_))));
    }

    #[test]
    fn empty_sides_degenerate() {
        let empty = words(&[]);
        let cor = words(&["the", "cat"]);

        let alignment = Alignment::new(&empty, &cor, &LinguisticCosts::default());
        assert_eq!(kinds(&alignment), vec!["I", "I"]);

        let alignment = Alignment::new(&cor, &empty, &LinguisticCosts::default());
        assert_eq!(kinds(&alignment), vec!["D", "D"]);

        let alignment = Alignment::new(&empty, &empty, &LinguisticCosts::default());
        assert!(alignment.align_seq().is_empty());
        assert_eq!(alignment.alignments(Traversal::BreadthFirst).count(), 1);
    }

    #[test]
    fn substitution_cost_is_linguistic() {
        let costs = LinguisticCosts::default();
        let go = Token::new("go", Pos::Verb, "VBP", "go", "ROOT", 0);
        let goes = Token::new("goes", Pos::Verb, "VBZ", "go", "ROOT", 0);
        let cat = Token::new("Cat", Pos::Noun, "NN", "cat", "ROOT", 0);
        let cat_lower = Token::new("cat", Pos::Noun, "NN", "cat", "ROOT", 0);

        assert_eq!(costs.substitution(&cat, &cat_lower), 0.);
        assert!((costs.substitution(&go, &goes) - (1. - 4. / 6.)).abs() < 1e-9);
        assert!(costs.substitution(&go, &cat) < 2.);
    }

    #[test]
    fn ties_are_all_recorded() {
        let orig = words(&["a"]);
        let cor = words(&["b"]);
        let alignment = Alignment::new(&orig, &cor, &LevenshteinCosts);

        // deleting then inserting costs as much as substituting
        let paths: Vec<_> = alignment.alignments(Traversal::BreadthFirst).collect();
        assert_eq!(paths.len(), 1);
        assert_eq!(alignment.cells()[1][1].ops, vec![OpKind::Substitute]);

        let orig = words(&["a", "b"]);
        let cor = words(&["c"]);
        let alignment = Alignment::new(&orig, &cor, &LevenshteinCosts);
        assert_eq!(alignment.cost(), 2.);
        assert!(alignment.alignments(Traversal::BreadthFirst).count() > 1);
    }

    #[test]
    fn depth_first_starts_with_cheapest_sequence() {
        let orig = words(&["x", "a", "b", "y"]);
        let cor = words(&["z", "b", "a", "w"]);
        let alignment = Alignment::new(&orig, &cor, &LevenshteinCosts);

        let first = alignment
            .alignments(Traversal::DepthFirst)
            .next()
            .unwrap();
        assert_eq!(first, alignment.align_seq());
    }

    #[test]
    fn op_counts_average_over_paths() {
        let orig = words(&["a", "b"]);
        let cor = words(&["c"]);
        let alignment = Alignment::new(&orig, &cor, &LevenshteinCosts);

        let counts = alignment.op_counts();
        assert_eq!(counts[&OpKind::Substitute], 1.);
        assert_eq!(counts[&OpKind::Delete], 1.);
    }

    #[test]
    fn display_shows_best_alignment() {
        let orig = words(&["A", "B"]);
        let cor = words(&["B", "A"]);
        let alignment = Alignment::new(&orig, &cor, &LinguisticCosts::default());

        assert!(alignment.to_string().ends_with("Best alignment: [T2]"));
    }
}
