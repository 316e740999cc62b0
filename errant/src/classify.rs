//! Classification of edits into error types like `R:VERB:SVA` by an ordered cascade of rules
//! over part-of-speech tags, dependency labels, lemmas and spelling.

use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, HashSet},
    fmt,
    ops::Range,
    str::FromStr,
};

use crate::{
    lang::en::LancasterStemmer,
    resources::{Dictionary, TagMap},
    types::{Edit, ErrorType, Operation, Pos, Sentence, Token},
    utils, Error,
};

mod syntactic;

pub use syntactic::{highest_token, SyntacticClassifier};

/// Which classifier assigns error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassifierMode {
    /// The rule cascade of [Classifier], e. g. `R:VERB:SVA`.
    Errant,
    /// The head classes of [SyntacticClassifier], e. g. `R:VERB->NOUN`.
    Syntactic,
}

impl Default for ClassifierMode {
    fn default() -> Self {
        ClassifierMode::Errant
    }
}

impl FromStr for ClassifierMode {
    type Err = Error;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        Ok(match string {
            "errant" => ClassifierMode::Errant,
            "sercl" => ClassifierMode::Syntactic,
            x => return Err(Error::UnknownClassifierMode(x.to_string())),
        })
    }
}

impl fmt::Display for ClassifierMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ClassifierMode::Errant => "errant",
            ClassifierMode::Syntactic => "sercl",
        })
    }
}

/// Language-specific constants of the classification rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifierLangOptions {
    /// The fine tag of possessive suffixes like "'s".
    pub possessive_tag: String,
    /// Clitic forms of contractions, e. g. "n't".
    pub contractions: HashSet<String>,
    /// Stems of contracted auxiliaries mapped to their full form, e. g. "wo" -> "will".
    pub aux_contractions: HashMap<String, String>,
    pub infinitive_marker: String,
    pub preposition_dep: String,
    /// The prefix shared by all auxiliary dependency labels.
    pub aux_dep_prefix: String,
    pub aux_deps: HashSet<String>,
    /// Dependency labels which determine the category of an edit.
    pub dep_map: HashMap<String, Pos>,
    pub open_pos: HashSet<Pos>,
    /// Classes which are too uninformative to be a category.
    pub rare_pos: HashSet<Pos>,
    /// The only past tense forms which show subject-verb agreement.
    pub past_tense_agreement: HashSet<String>,
    pub adjective_deps: HashSet<String>,
    pub particle_deps: HashSet<String>,
    /// Dependency labels of the corrected side which make a determiner / pronoun edit a pronoun edit.
    pub pronoun_deps: HashSet<String>,
    pub possessive_dep: String,
    /// Fine tags of gerunds and participles.
    pub verb_form_tags: HashSet<String>,
    pub past_tense_tags: HashSet<String>,
    pub third_person_tags: HashSet<String>,
    pub plural_noun_tags: HashSet<String>,
    pub comparative_markers: HashSet<String>,
    /// Unknown words whose char similarity to the correction exceeds this are spelling errors.
    pub spelling_ratio: f64,
}

/// One side of an edit: a token range of a sentence.
#[derive(Clone)]
struct Side<'a> {
    sentence: &'a Sentence,
    range: Range<usize>,
}

impl<'a> Side<'a> {
    fn tokens(&self) -> &'a [Token] {
        &self.sentence[self.range.clone()]
    }

    fn first(&self) -> &'a Token {
        &self.sentence[self.range.start]
    }

    fn last(&self) -> &'a Token {
        &self.sentence[self.range.end - 1]
    }

    fn len(&self) -> usize {
        self.range.len()
    }
}

/// Assigns error types to edits.
#[derive(Debug, Clone)]
pub struct Classifier {
    dictionary: Dictionary,
    tag_map: TagMap,
    stemmer: LancasterStemmer,
    options: ClassifierLangOptions,
}

impl Classifier {
    pub fn new(
        dictionary: Dictionary,
        tag_map: TagMap,
        stemmer: LancasterStemmer,
        options: ClassifierLangOptions,
    ) -> Self {
        Classifier {
            dictionary,
            tag_map,
            stemmer,
            options,
        }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn tag_map(&self) -> &TagMap {
        &self.tag_map
    }

    pub fn options(&self) -> &ClassifierLangOptions {
        &self.options
    }

    /// The coarse class of a token used for classification: looked up from its fine tag,
    /// falling back to the class assigned by the parser.
    fn pos(&self, token: &Token) -> Pos {
        self.tag_map.get(token.tag()).unwrap_or_else(|| token.pos())
    }

    fn info<'a>(&self, side: &Side<'a>) -> (Vec<Pos>, Vec<&'a str>) {
        side.tokens()
            .iter()
            .map(|x| (self.pos(x), x.dep()))
            .unzip()
    }

    fn is_aux(&self, token: &Token) -> bool {
        token.dep().starts_with(self.options.aux_dep_prefix.as_str())
    }

    /// Returns the error type of the edit. Does not modify the edit.
    pub fn classify(&self, edit: &Edit, orig: &Sentence, cor: &Sentence) -> ErrorType {
        let mut o = Side {
            sentence: orig,
            range: edit.o_span().clone(),
        };
        let mut c = Side {
            sentence: cor,
            range: edit.c_span().clone(),
        };

        loop {
            match (o.range.is_empty(), c.range.is_empty()) {
                (true, true) => return ErrorType::unknown(),
                (true, false) => return ErrorType::new(Operation::Missing, self.one_sided(&c)),
                (false, true) => {
                    return ErrorType::new(Operation::Unnecessary, self.one_sided(&o))
                }
                (false, false) => {
                    let same_text = o.tokens().len() == c.tokens().len()
                        && o.tokens()
                            .iter()
                            .zip(c.tokens())
                            .all(|(a, b)| a.text() == b.text());

                    if same_text {
                        return ErrorType::unknown();
                    }

                    // classify [Doctor -> The doctor] as [ -> The]
                    if o.last().lower() == c.last().lower() && (o.len() > 1 || c.len() > 1) {
                        o.range.end -= 1;
                        c.range.end -= 1;
                        continue;
                    }

                    return ErrorType::new(Operation::Replacement, self.two_sided(&o, &c));
                }
            }
        }
    }

    /// The category of an edit where only one side has tokens.
    fn one_sided(&self, side: &Side) -> &'static str {
        let options = &self.options;

        if side.len() == 1 {
            let token = side.first();

            if token.tag() == options.possessive_tag {
                return "NOUN:POSS";
            }
            if options.contractions.contains(token.lower()) {
                return "CONTR";
            }
            if token.lower() == options.infinitive_marker
                && token.pos() == Pos::Part
                && token.dep() != options.preposition_dep
            {
                return "VERB:FORM";
            }
        }

        let (pos, deps) = self.info(side);
        let pos_set: HashSet<Pos> = pos.iter().copied().collect();
        let dep_set: HashSet<&str> = deps.iter().copied().collect();

        if dep_set.iter().all(|x| options.aux_deps.contains(*x)) {
            return "VERB:TENSE";
        }
        if pos_set.len() == 1 && !options.rare_pos.contains(&pos[0]) {
            return pos[0].as_str();
        }
        if dep_set.len() == 1 {
            if let Some(pos) = options.dep_map.get(deps[0]) {
                return pos.as_str();
            }
        }
        if pos_set == [Pos::Part, Pos::Verb].iter().copied().collect::<HashSet<_>>() {
            return "VERB";
        }

        "OTHER"
    }

    /// The category of an edit with tokens on both sides.
    fn two_sided(&self, o: &Side, c: &Side) -> &'static str {
        let options = &self.options;

        let o_lower: Vec<_> = o.tokens().iter().map(|x| x.lower()).collect();
        let c_lower: Vec<_> = c.tokens().iter().map(|x| x.lower()).collect();

        if o_lower.concat() == c_lower.concat() {
            return "ORTH";
        }

        let mut o_sorted = o_lower.clone();
        let mut c_sorted = c_lower.clone();
        o_sorted.sort_unstable();
        c_sorted.sort_unstable();
        if o_sorted == c_sorted {
            return "WO";
        }

        let (o_pos, o_dep) = self.info(o);
        let (c_pos, c_dep) = self.info(c);

        if o.len() == 1 && c.len() == 1 {
            if let Some(category) = self.one_to_one(o, c) {
                return category;
            }
        }

        let all_pos: HashSet<Pos> = o_pos.iter().chain(c_pos.iter()).copied().collect();
        let all_deps: HashSet<&str> = o_dep.iter().chain(c_dep.iter()).copied().collect();
        let same_last_lemma = o.last().lemma() == c.last().lemma();

        if all_deps.iter().all(|x| options.aux_deps.contains(*x)) {
            return "VERB:TENSE";
        }
        if all_pos.len() == 1 {
            // [eat -> has eaten]
            if o_pos[0] == Pos::Verb && same_last_lemma {
                return "VERB:TENSE";
            } else if !options.rare_pos.contains(&o_pos[0]) {
                return o_pos[0].as_str();
            }
        }
        if all_deps.len() == 1 {
            if let Some(pos) = options.dep_map.get(o_dep[0]) {
                return pos.as_str();
            }
        }
        // [to eat -> eating], [look at -> see]
        if all_pos == [Pos::Part, Pos::Verb].iter().copied().collect::<HashSet<_>>() {
            return if same_last_lemma { "VERB:FORM" } else { "VERB" };
        }
        // [friends -> friend 's]
        if (o_pos == [Pos::Noun, Pos::Part] || c_pos == [Pos::Noun, Pos::Part])
            && o.first().lemma() == c.first().lemma()
        {
            return "NOUN:POSS";
        }
        // [more free -> freer]
        if (options.comparative_markers.contains(o.first().lower())
            || options.comparative_markers.contains(c.first().lower()))
            && same_last_lemma
            && o.len() <= 2
            && c.len() <= 2
        {
            return "ADJ:FORM";
        }

        "OTHER"
    }

    /// The category of a replacement of a single token by a single token.
    /// Returns `None` if the edit should be treated like a multi-token replacement.
    fn one_to_one(&self, o: &Side, c: &Side) -> Option<&'static str> {
        let options = &self.options;
        let (o_tok, c_tok) = (o.first(), c.first());
        let (o_pos, c_pos) = (self.pos(o_tok), self.pos(c_tok));
        let (o_dep, c_dep) = (o_tok.dep(), c_tok.dep());

        // special cases
        if o_tok.tag() == options.possessive_tag || c_tok.tag() == options.possessive_tag {
            return Some("NOUN:POSS");
        }
        if (options.contractions.contains(o_tok.lower())
            || options.contractions.contains(c_tok.lower()))
            && o_pos == c_pos
        {
            return Some("CONTR");
        }
        let aux_contraction = |a: &Token, b: &Token| {
            options
                .aux_contractions
                .get(a.lower())
                .map_or(false, |full| full == b.lower())
        };
        if aux_contraction(o_tok, c_tok) || aux_contraction(c_tok, o_tok) {
            return Some("CONTR");
        }
        if options.aux_contractions.contains_key(o_tok.lower())
            || options.aux_contractions.contains_key(c_tok.lower())
        {
            return Some("VERB:TENSE");
        }
        if o_tok.lower() != c_tok.lower()
            && options.past_tense_agreement.contains(o_tok.lower())
            && options.past_tense_agreement.contains(c_tok.lower())
        {
            return Some("VERB:SVA");
        }

        // spelling and inflection
        if utils::is_alphabetic(o_tok.text())
            && !self.dictionary.contains(o_tok.text())
            && !self.dictionary.contains(o_tok.lower())
        {
            return Some(if o_tok.lemma() == c_tok.lemma() {
                match (o_pos, c_pos) {
                    (Pos::Noun, Pos::Noun) => "NOUN:INFL",
                    (Pos::Verb, Pos::Verb) => "VERB:INFL",
                    _ => "MORPH",
                }
            } else if utils::char_ratio(o_tok.text(), c_tok.text()) > options.spelling_ratio {
                "SPELL"
            } else if o_pos == c_pos && !options.rare_pos.contains(&o_pos) {
                o_pos.as_str()
            } else {
                "OTHER"
            });
        }

        let both_open = options.open_pos.contains(&o_pos) && options.open_pos.contains(&c_pos);

        // morphology
        if o_tok.lemma() == c_tok.lemma() && both_open {
            if o_pos == c_pos {
                match o_pos {
                    Pos::Adj => return Some("ADJ:FORM"),
                    Pos::Noun => return Some("NOUN:NUM"),
                    Pos::Verb => {
                        if let Some(category) = self.verb_category(o, c) {
                            return Some(category);
                        }
                    }
                    _ => {}
                }
            }

            if options.adjective_deps.contains(o_dep) && options.adjective_deps.contains(c_dep) {
                return Some("ADJ:FORM");
            }
            // [musical -> musicals]
            if o_pos == Pos::Adj && options.plural_noun_tags.contains(c_tok.tag()) {
                return Some("NOUN:NUM");
            }
            if options.verb_form_tags.contains(c_tok.tag()) {
                return Some("VERB:FORM");
            }
            if options.past_tense_tags.contains(c_tok.tag()) {
                return Some("VERB:TENSE");
            }
            if options.third_person_tags.contains(c_tok.tag()) {
                return Some("VERB:SVA");
            }
            return Some("MORPH");
        }

        // derivational morphology
        if both_open && self.stemmer.stem(o_tok.text()) == self.stemmer.stem(c_tok.text()) {
            return Some("MORPH");
        }

        // general
        if self.is_aux(o_tok) && self.is_aux(c_tok) {
            return Some("VERB:TENSE");
        }
        if o_pos == c_pos && !options.rare_pos.contains(&o_pos) {
            return Some(o_pos.as_str());
        }
        if o_dep == c_dep {
            if let Some(pos) = options.dep_map.get(o_dep) {
                return Some(pos.as_str());
            }
        }
        let pos_pair: HashSet<Pos> = [o_pos, c_pos].iter().copied().collect();
        let dep_pair: HashSet<&str> = [o_dep, c_dep].iter().copied().collect();
        if pos_pair == [Pos::Part, Pos::Prep].iter().copied().collect::<HashSet<_>>()
            || dep_pair
                == options
                    .particle_deps
                    .iter()
                    .map(String::as_str)
                    .collect::<HashSet<_>>()
        {
            return Some("PART");
        }
        if pos_pair == [Pos::Det, Pos::Pron].iter().copied().collect::<HashSet<_>>() {
            // determiners cannot be subjects or objects
            if options.pronoun_deps.contains(c_dep) {
                return Some("PRON");
            }
            if c_dep == options.possessive_dep {
                return Some("DET");
            }
            return None;
        }

        Some("OTHER")
    }

    /// The category of a replacement of a verb by a verb with the same lemma.
    fn verb_category(&self, o: &Side, c: &Side) -> Option<&'static str> {
        let options = &self.options;
        let (o_tok, c_tok) = (o.first(), c.first());
        let either_tag = |tags: &HashSet<String>| tags.contains(o_tok.tag()) || tags.contains(c_tok.tag());

        if self.preceded_by_aux(o, c) {
            Some("VERB:FORM")
        } else if either_tag(&options.verb_form_tags) {
            Some("VERB:FORM")
        } else if either_tag(&options.past_tense_tags) {
            Some("VERB:TENSE")
        } else if either_tag(&options.third_person_tags) {
            Some("VERB:SVA")
        } else if self.is_aux(o_tok) && self.is_aux(c_tok) {
            Some("VERB:TENSE")
        } else {
            None
        }
    }

    fn first_aux<'a>(&self, sentence: &'a Sentence, head: usize) -> Option<&'a Token> {
        sentence
            .children(head)
            .map(|i| &sentence[i])
            .find(|x| self.is_aux(x))
    }

    /// Whether neither verb can carry tense or agreement because an auxiliary precedes it:
    /// for auxiliaries, whether neither is the first auxiliary of its head;
    /// for main verbs, whether both have an auxiliary dependent.
    fn preceded_by_aux(&self, o: &Side, c: &Side) -> bool {
        let (o_index, c_index) = (o.range.start, c.range.start);
        let (o_tok, c_tok) = (o.first(), c.first());

        if self.is_aux(o_tok) && self.is_aux(c_tok) {
            let o_first = self.first_aux(o.sentence, o.sentence.head(o_index));
            let c_first = self.first_aux(c.sentence, c.sentence.head(c_index));

            match (o_first, c_first) {
                (Some(o_aux), Some(c_aux)) => {
                    o_aux.text() != o_tok.text() && c_aux.text() != c_tok.text()
                }
                _ => false,
            }
        } else {
            let has_aux = |side: &Side, index: usize| {
                side.sentence
                    .children(index)
                    .any(|i| self.options.aux_deps.contains(side.sentence[i].dep()))
            };

            has_aux(o, o_index) && has_aux(c, c_index)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::en;

    fn token(text: &str, tag: &str, lemma: &str, dep: &str, head: usize) -> Token {
        let pos = en::tag_map().get(tag).unwrap_or(Pos::X);
        Token::new(text, pos, tag, lemma, dep, head)
    }

    fn english(words: &[&str]) -> Classifier {
        en::classifier(words.iter().copied().collect())
    }

    fn classify(
        classifier: &Classifier,
        orig: &Sentence,
        cor: &Sentence,
        o_span: Range<usize>,
        c_span: Range<usize>,
    ) -> String {
        let edit = Edit::new(orig, cor, o_span, c_span).unwrap();
        classifier.classify(&edit, orig, cor).to_string()
    }

    #[test]
    fn subject_verb_agreement() {
        let orig = Sentence::new(vec![
            token("He", "PRP", "he", "nsubj", 1),
            token("go", "VBP", "go", "ROOT", 1),
        ])
        .unwrap();
        let cor = Sentence::new(vec![
            token("He", "PRP", "he", "nsubj", 1),
            token("goes", "VBZ", "go", "ROOT", 1),
        ])
        .unwrap();

        let classifier = english(&["he", "go", "goes"]);
        assert_eq!(classify(&classifier, &orig, &cor, 1..2, 1..2), "R:VERB:SVA");
    }

    #[test]
    fn spelling_and_inflection() {
        let orig = Sentence::new(vec![token("catt", "NN", "catt", "ROOT", 0)]).unwrap();
        let cor = Sentence::new(vec![token("cat", "NN", "cat", "ROOT", 0)]).unwrap();
        let classifier = english(&["cat"]);

        assert_eq!(classify(&classifier, &orig, &cor, 0..1, 0..1), "R:SPELL");

        let orig = Sentence::new(vec![token("getted", "VBD", "get", "ROOT", 0)]).unwrap();
        let cor = Sentence::new(vec![token("got", "VBD", "get", "ROOT", 0)]).unwrap();

        assert_eq!(classify(&classifier, &orig, &cor, 0..1, 0..1), "R:VERB:INFL");
    }

    #[test]
    fn missing_and_unnecessary() {
        let empty = Sentence::new(vec![]).unwrap();
        let the = Sentence::new(vec![token("the", "DT", "the", "det", 0)]).unwrap();
        let classifier = english(&[]);

        assert_eq!(classify(&classifier, &empty, &the, 0..0, 0..1), "M:DET");
        assert_eq!(classify(&classifier, &the, &empty, 0..1, 0..0), "U:DET");
        assert_eq!(classify(&classifier, &empty, &empty, 0..0, 0..0), "UNK");

        let orig = Sentence::new(vec![
            token("the", "DT", "the", "det", 2),
            token("big", "JJ", "big", "amod", 2),
            token("dog", "NN", "dog", "ROOT", 2),
        ])
        .unwrap();
        let cor = Sentence::new(vec![token("dog", "NN", "dog", "ROOT", 0)]).unwrap();

        assert_eq!(classify(&classifier, &orig, &cor, 0..2, 0..0), "U:OTHER");
    }

    #[test]
    fn orthography_and_word_order() {
        let orig = Sentence::new(vec![
            token("cat", "NN", "cat", "ROOT", 0),
            token("s", "NNS", "s", "dep", 0),
        ])
        .unwrap();
        let cor = Sentence::new(vec![token("cats", "NNS", "cat", "ROOT", 0)]).unwrap();
        let classifier = english(&[]);

        assert_eq!(classify(&classifier, &orig, &cor, 0..2, 0..1), "R:ORTH");

        let orig = Sentence::new(vec![
            token("only", "RB", "only", "advmod", 1),
            token("eat", "VBP", "eat", "ROOT", 1),
        ])
        .unwrap();
        let cor = Sentence::new(vec![
            token("eat", "VBP", "eat", "ROOT", 0),
            token("only", "RB", "only", "advmod", 0),
        ])
        .unwrap();

        assert_eq!(classify(&classifier, &orig, &cor, 0..2, 0..2), "R:WO");
    }

    #[test]
    fn trailing_case_change_is_ignored() {
        let orig = Sentence::new(vec![token("Doctor", "NN", "doctor", "ROOT", 0)]).unwrap();
        let cor = Sentence::new(vec![
            token("The", "DT", "the", "det", 1),
            token("doctor", "NN", "doctor", "ROOT", 1),
        ])
        .unwrap();
        let classifier = english(&[]);

        assert_eq!(classify(&classifier, &orig, &cor, 0..1, 0..2), "M:DET");
    }

    #[test]
    fn auxiliaries() {
        let orig = Sentence::new(vec![
            token("I", "PRP", "I", "nsubj", 2),
            token("has", "VBZ", "have", "aux", 2),
            token("eaten", "VBN", "eat", "ROOT", 2),
        ])
        .unwrap();
        let cor = Sentence::new(vec![
            token("I", "PRP", "I", "nsubj", 2),
            token("had", "VBD", "have", "aux", 2),
            token("eaten", "VBN", "eat", "ROOT", 2),
        ])
        .unwrap();
        let classifier = english(&["has", "had"]);

        assert_eq!(classify(&classifier, &orig, &cor, 1..2, 1..2), "R:VERB:TENSE");

        // the first auxiliary of the chain carries the tense
        let orig = Sentence::new(vec![
            token("I", "PRP", "I", "nsubj", 3),
            token("have", "VBP", "have", "aux", 3),
            token("be", "VB", "be", "aux", 3),
            token("eating", "VBG", "eat", "ROOT", 3),
        ])
        .unwrap();
        let cor = Sentence::new(vec![
            token("I", "PRP", "I", "nsubj", 3),
            token("have", "VBP", "have", "aux", 3),
            token("been", "VBN", "be", "aux", 3),
            token("eating", "VBG", "eat", "ROOT", 3),
        ])
        .unwrap();
        let classifier = english(&["be", "been"]);

        assert_eq!(classify(&classifier, &orig, &cor, 2..3, 2..3), "R:VERB:FORM");
    }

    #[test]
    fn contractions() {
        let orig = Sentence::new(vec![token("wo", "MD", "will", "aux", 0)]).unwrap();
        let cor = Sentence::new(vec![token("will", "MD", "will", "aux", 0)]).unwrap();
        let classifier = english(&["wo", "will"]);

        assert_eq!(classify(&classifier, &orig, &cor, 0..1, 0..1), "R:CONTR");

        let empty = Sentence::new(vec![]).unwrap();
        let nt = Sentence::new(vec![token("n't", "RB", "not", "neg", 0)]).unwrap();
        assert_eq!(classify(&classifier, &empty, &nt, 0..0, 0..1), "M:CONTR");
    }

    #[test]
    fn determiner_and_pronoun() {
        let orig = Sentence::new(vec![token("this", "DT", "this", "nsubj", 0)]).unwrap();
        let cor = Sentence::new(vec![token("it", "PRP", "it", "nsubj", 0)]).unwrap();
        let classifier = english(&["this", "it"]);

        assert_eq!(classify(&classifier, &orig, &cor, 0..1, 0..1), "R:PRON");

        let cor = Sentence::new(vec![token("it", "PRP", "it", "attr", 0)]).unwrap();
        assert_eq!(classify(&classifier, &orig, &cor, 0..1, 0..1), "R:OTHER");
    }

    #[test]
    fn possessive_multi_token() {
        let orig = Sentence::new(vec![token("friends", "NNS", "friend", "ROOT", 0)]).unwrap();
        let cor = Sentence::new(vec![
            token("friend", "NN", "friend", "ROOT", 0),
            token("'s", "POS", "'s", "case", 0),
        ])
        .unwrap();
        let classifier = english(&["friends", "friend"]);

        assert_eq!(classify(&classifier, &orig, &cor, 0..1, 0..2), "R:NOUN:POSS");
    }

    #[test]
    fn one_sided_special_cases() {
        let empty = Sentence::new(vec![]).unwrap();
        let classifier = english(&[]);

        // infinitival "to" is checked before the auxiliary label
        let to = Sentence::new(vec![token("to", "TO", "to", "aux", 0)]).unwrap();
        assert_eq!(classify(&classifier, &empty, &to, 0..0, 0..1), "M:VERB:FORM");

        // mixed classes sharing a dependency label
        let cor = Sentence::new(vec![
            token("more", "JJR", "more", "advmod", 1),
            token("quickly", "RB", "quickly", "advmod", 1),
        ])
        .unwrap();
        assert_eq!(classify(&classifier, &empty, &cor, 0..0, 0..2), "M:ADV");

        let cor = Sentence::new(vec![
            token("big", "JJ", "big", "amod", 1),
            token("so", "RB", "so", "amod", 1),
        ])
        .unwrap();
        assert_eq!(classify(&classifier, &empty, &cor, 0..0, 0..2), "M:ADJ");
    }

    #[test]
    fn particles() {
        let orig = Sentence::new(vec![token("at", "IN", "at", "prep", 0)]).unwrap();
        let cor = Sentence::new(vec![token("to", "TO", "to", "aux", 0)]).unwrap();
        let classifier = english(&["at", "to"]);

        assert_eq!(classify(&classifier, &orig, &cor, 0..1, 0..1), "R:PART");
    }

    #[test]
    fn inflectional_morphology() {
        let classifier = english(&["cat", "big", "quick"]);

        let orig = Sentence::new(vec![token("cat", "NN", "cat", "nsubj", 0)]).unwrap();
        let cor = Sentence::new(vec![token("cats", "NNS", "cat", "nsubj", 0)]).unwrap();
        assert_eq!(classify(&classifier, &orig, &cor, 0..1, 0..1), "R:NOUN:NUM");

        let orig = Sentence::new(vec![token("big", "JJ", "big", "acomp", 0)]).unwrap();
        let cor = Sentence::new(vec![token("bigger", "JJR", "big", "acomp", 0)]).unwrap();
        assert_eq!(classify(&classifier, &orig, &cor, 0..1, 0..1), "R:ADJ:FORM");
    }

    #[test]
    fn derivational_morphology() {
        let classifier = english(&["quick"]);
        assert_eq!(
            classifier.stemmer.stem("quick"),
            classifier.stemmer.stem("quickly")
        );

        let orig = Sentence::new(vec![token("quick", "JJ", "quick", "acomp", 0)]).unwrap();
        let cor = Sentence::new(vec![token("quickly", "RB", "quickly", "advmod", 0)]).unwrap();
        assert_eq!(classify(&classifier, &orig, &cor, 0..1, 0..1), "R:MORPH");
    }

    #[test]
    fn multi_token_forms() {
        let classifier = english(&[]);

        // [to eat -> eating]
        let orig = Sentence::new(vec![
            token("to", "TO", "to", "aux", 1),
            token("eat", "VB", "eat", "xcomp", 1),
        ])
        .unwrap();
        let cor = Sentence::new(vec![token("eating", "VBG", "eat", "xcomp", 0)]).unwrap();
        assert_eq!(classify(&classifier, &orig, &cor, 0..2, 0..1), "R:VERB:FORM");

        // [more free -> freer]
        let orig = Sentence::new(vec![
            token("more", "RBR", "more", "advmod", 1),
            token("free", "JJ", "free", "acomp", 1),
        ])
        .unwrap();
        let cor = Sentence::new(vec![token("freer", "JJR", "free", "acomp", 0)]).unwrap();
        assert_eq!(classify(&classifier, &orig, &cor, 0..2, 0..1), "R:ADJ:FORM");
    }

    #[test]
    fn contracted_auxiliary_with_other_verb() {
        let orig = Sentence::new(vec![token("ca", "MD", "can", "aux", 0)]).unwrap();
        let cor = Sentence::new(vec![token("could", "MD", "could", "aux", 0)]).unwrap();
        let classifier = english(&["ca", "could"]);

        assert_eq!(classify(&classifier, &orig, &cor, 0..1, 0..1), "R:VERB:TENSE");
    }
}
