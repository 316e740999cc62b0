//! The Lancaster (Paice/Husk) stemmer.
//!
//! Rules are written as `<reversed ending>[*]<number of chars to remove>[chars to append]<> or .>`.
//! A `*` marks a rule which only applies to a word which has not been stemmed yet,
//! `>` continues stemming after the rule was applied and `.` stops.

use log::warn;
use std::collections::HashMap;

const DEFAULT_RULES: &[&str] = &[
    "ai*2.", "a*1.", "bb1.", "city3s.", "ci2>", "cn1t>", "dd1.", "dei3y>", "deec2ss.", "dee1.",
    "de2>", "dooh4>", "e1>", "feil1v.", "fi2>", "gni3>", "gai3y.", "ga2>", "gg1.", "ht*2.",
    "hsiug5ct.", "hsi3>", "i*1.", "i1y>", "ji1d.", "juf1s.", "ju1d.", "jo1d.", "jeh1r.",
    "jrev1t.", "jsim2t.", "jn1d.", "j1s.", "lbaifi6.", "lbai4y.", "lba3>", "lbi3.", "lib2l>",
    "lc1.", "lufi4y.", "luf3>", "lu2.", "lai3>", "lau3>", "la2>", "ll1.", "mui3.", "mu*2.",
    "msi3>", "mm1.", "nois4j>", "noix4ct.", "noi3>", "nai3>", "na2>", "nee0.", "ne2>", "nn1.",
    "pihs4>", "pp1.", "re2>", "rae0.", "ra2.", "ro2>", "ru2>", "rr1.", "rt1>", "rei3y>",
    "sei3y>", "sis2.", "si2>", "ssen4>", "ss0.", "suo3>", "su*2.", "s*1>", "s0.", "tacilp4y.",
    "ta2>", "tnem4>", "tne3>", "tna3>", "tpir2b.", "tpro2b.", "tcud1.", "tpmus2.", "tpec2iv.",
    "tulo2v.", "tsis0.", "tsi3>", "tt1.", "uqi3.", "ugo1.", "vis3j>", "vie0.", "vi2>", "ylb1>",
    "yli3y>", "ylp0.", "yl2>", "ygo1.", "yhp1.", "ymo1.", "ypo1.", "yti3>", "yte3>", "ytl2.",
    "yrtsi5.", "yra3>", "yro3>", "yfi3.", "ycn2t>", "yca3>", "zi2>", "zy1s.",
];

#[derive(Debug, Clone, PartialEq)]
struct Rule {
    ending: Vec<char>,
    intact: bool,
    remove: usize,
    append: String,
    stop: bool,
}

impl Rule {
    fn parse(rule: &str) -> Option<Self> {
        let ending: String = rule.chars().take_while(|c| c.is_ascii_lowercase()).collect();
        let rest = &rule[ending.len()..];

        let (intact, rest) = match rest.strip_prefix('*') {
            Some(rest) => (true, rest),
            None => (false, rest),
        };

        let mut chars = rest.chars();
        let remove = chars.next()?.to_digit(10)? as usize;
        let rest = chars.as_str();

        let append: String = rest.chars().take_while(|c| c.is_ascii_lowercase()).collect();
        let stop = match &rest[append.len()..] {
            "." => true,
            ">" | "" => false,
            _ => return None,
        };

        if ending.is_empty() {
            return None;
        }

        Some(Rule {
            ending: ending.chars().rev().collect(),
            intact,
            remove,
            append,
            stop,
        })
    }
}

fn is_vowel(c: char) -> bool {
    "aeiouy".contains(c)
}

/// Whether enough of the word is left to remove `remove` chars from it.
fn is_acceptable(word: &[char], remove: usize) -> bool {
    match word.first() {
        Some(&first) if is_vowel(first) => word.len() >= remove + 2,
        Some(_) => word.len() >= remove + 3 && (is_vowel(word[1]) || is_vowel(word[2])),
        None => false,
    }
}

/// A Lancaster stemmer with rules indexed by the last letter of their ending.
#[derive(Debug, Clone)]
pub struct LancasterStemmer {
    rules: HashMap<char, Vec<Rule>>,
}

impl Default for LancasterStemmer {
    fn default() -> Self {
        LancasterStemmer::from_rules(DEFAULT_RULES)
    }
}

impl LancasterStemmer {
    /// Creates a stemmer from a custom rule table. Malformed rules are skipped.
    pub fn from_rules<S: AsRef<str>>(rules: &[S]) -> Self {
        let mut map: HashMap<char, Vec<Rule>> = HashMap::new();

        for rule in rules {
            let rule = rule.as_ref();

            match Rule::parse(rule) {
                Some(parsed) => map
                    .entry(*parsed.ending.last().expect("rule endings are not empty"))
                    .or_default()
                    .push(parsed),
                None => warn!("skipping invalid stemmer rule '{}'", rule),
            }
        }

        LancasterStemmer { rules: map }
    }

    pub fn stem(&self, word: &str) -> String {
        let intact: Vec<char> = word.to_lowercase().chars().collect();
        let mut word = intact.clone();

        loop {
            let n_letters = word.iter().take_while(|c| c.is_alphabetic()).count();
            if n_letters == 0 {
                break;
            }

            let rules = match self.rules.get(&word[n_letters - 1]) {
                Some(rules) => rules,
                None => break,
            };

            let applied = rules.iter().find(|rule| {
                word.ends_with(&rule.ending)
                    && (!rule.intact || word == intact)
                    && is_acceptable(&word, rule.remove)
            });

            match applied {
                Some(rule) => {
                    word.truncate(word.len() - rule.remove);
                    word.extend(rule.append.chars());

                    if rule.stop {
                        break;
                    }
                }
                None => break,
            }
        }

        word.into_iter().collect()
    }
}
