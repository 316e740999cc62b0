use super::ERROR_MSG;
use lazy_static::lazy_static;

use crate::{
    align::LinguisticCosts,
    annotator::Annotator,
    classify::{Classifier, ClassifierLangOptions},
    merge::{Merger, MergerLangOptions},
    resources::{Dictionary, TagMap},
};

mod lancaster;

pub use lancaster::LancasterStemmer;

pub fn costs() -> LinguisticCosts {
    lang_options!(LinguisticCosts, "en", "aligner")
}

pub fn merger() -> Merger {
    Merger::new(lang_options!(MergerLangOptions, "en", "merger"))
}

lazy_static! {
    static ref TAG_MAP: TagMap =
        TagMap::from_table(include_str!("../../configs/en/tag_map.tsv").as_bytes())
            .expect(ERROR_MSG);
}

/// The conversion table from Penn Treebank tags to universal part-of-speech classes.
pub fn tag_map() -> TagMap {
    TAG_MAP.clone()
}

pub fn classifier(dictionary: Dictionary) -> Classifier {
    classifier_with_tag_map(dictionary, tag_map())
}

pub fn classifier_with_tag_map(dictionary: Dictionary, tag_map: TagMap) -> Classifier {
    Classifier::new(
        dictionary,
        tag_map,
        LancasterStemmer::default(),
        lang_options!(ClassifierLangOptions, "en", "classifier"),
    )
}

/// An annotator for English with the given spelling dictionary.
pub fn annotator(dictionary: Dictionary) -> Annotator {
    Annotator::new(costs(), merger(), classifier(dictionary))
}

/// An annotator for English with the given spelling dictionary and a custom tag map.
pub fn annotator_with_tag_map(dictionary: Dictionary, tag_map: TagMap) -> Annotator {
    Annotator::new(
        costs(),
        merger(),
        classifier_with_tag_map(dictionary, tag_map),
    )
}
