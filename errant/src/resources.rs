//! Read-only lookup resources used by the classifier: a spelling dictionary and a map
//! from fine-grained tags to coarse part-of-speech classes.

use fs_err::File;
use log::{debug, warn};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    collections::{HashMap, HashSet},
    io::{BufRead, BufReader, Read, Write},
    iter::FromIterator,
    path::Path,
};

use crate::{types::Pos, Error};

/// A resource which can be stored in and loaded from a binary.
pub trait Resource: Serialize + DeserializeOwned {
    fn name() -> &'static str;

    /// Loads the resource from a binary at the given path.
    fn new<P: AsRef<Path>>(p: P) -> Result<Self, Error> {
        debug!("loading {} from {}", Self::name(), p.as_ref().display());
        let reader = BufReader::new(File::open(p.as_ref())?);
        Self::from_reader(reader)
    }

    fn from_reader<R: Read>(reader: R) -> Result<Self, Error> {
        Ok(bincode::deserialize_from(reader)?)
    }

    fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error> {
        Ok(bincode::serialize_into(writer, self)?)
    }
}

/// Whether the path points to a resource binary rather than a text file.
fn is_binary(p: &Path) -> bool {
    p.extension().map_or(false, |x| x == "bin")
}

/// A set of correctly spelled surface forms.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Dictionary {
    words: HashSet<String>,
}

impl Resource for Dictionary {
    fn name() -> &'static str {
        "dictionary"
    }
}

impl Dictionary {
    /// Reads a word list with one word per line, e. g. a Hunspell word list.
    pub fn from_word_list<R: Read>(reader: R) -> Result<Self, Error> {
        let mut words = HashSet::new();

        for line in BufReader::new(reader).lines() {
            let line = line?;
            let word = line.trim();

            if !word.is_empty() {
                words.insert(word.to_string());
            }
        }

        Ok(Dictionary { words })
    }

    /// Reads a word list with one word per line from the given path.
    pub fn from_word_list_path<P: AsRef<Path>>(p: P) -> Result<Self, Error> {
        Self::from_word_list(File::open(p.as_ref())?)
    }

    /// Loads a dictionary binary if the path ends with `.bin`, a word list otherwise.
    pub fn load<P: AsRef<Path>>(p: P) -> Result<Self, Error> {
        if is_binary(p.as_ref()) {
            Self::new(p)
        } else {
            Self::from_word_list_path(p)
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Dictionary {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Dictionary {
            words: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// A map from fine-grained tags (e. g. "VBZ") to coarse part-of-speech classes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TagMap {
    map: HashMap<String, Pos>,
}

impl Resource for TagMap {
    fn name() -> &'static str {
        "tag_map"
    }
}

impl TagMap {
    /// Reads a tab-separated conversion table with lines of the form `<tag>\t<coarse tag>`.
    /// Coarse tags are normalized (e. g. `ADP` to `PREP`) and the tags of the
    /// parser which are missing from the standard table are added.
    pub fn from_table<R: Read>(reader: R) -> Result<Self, Error> {
        let mut map: HashMap<String, Pos> = HashMap::new();

        for line in BufReader::new(reader).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let mut parts = line.split('\t');
            match (parts.next(), parts.next()) {
                (Some(tag), Some(pos)) => {
                    map.insert(tag.trim().to_string(), pos.trim().parse::<Pos>()?);
                }
                _ => warn!("skipping malformed tag map line '{}'", line),
            }
        }

        for (tag, pos) in &[
            ("\"\"", Pos::Punct),
            ("SP", Pos::Space),
            ("_SP", Pos::Space),
            ("BES", Pos::Verb),
            ("HVS", Pos::Verb),
            ("ADD", Pos::X),
            ("GW", Pos::X),
            ("NFP", Pos::X),
            ("XX", Pos::X),
        ] {
            map.insert((*tag).to_string(), *pos);
        }

        Ok(TagMap { map })
    }

    /// Reads a conversion table from the given path, see [from_table][TagMap::from_table].
    pub fn from_table_path<P: AsRef<Path>>(p: P) -> Result<Self, Error> {
        Self::from_table(File::open(p.as_ref())?)
    }

    /// Loads a tag map binary if the path ends with `.bin`, a conversion table otherwise.
    pub fn load<P: AsRef<Path>>(p: P) -> Result<Self, Error> {
        if is_binary(p.as_ref()) {
            Self::new(p)
        } else {
            Self::from_table_path(p)
        }
    }

    pub fn get(&self, tag: &str) -> Option<Pos> {
        self.map.get(tag).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl FromIterator<(String, Pos)> for TagMap {
    fn from_iter<T: IntoIterator<Item = (String, Pos)>>(iter: T) -> Self {
        TagMap {
            map: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dictionary_from_word_list() {
        let dictionary = Dictionary::from_word_list("cat\n  dog \n\nhouse\n".as_bytes()).unwrap();

        assert_eq!(dictionary.len(), 3);
        assert!(dictionary.contains("dog"));
        assert!(!dictionary.contains("Dog"));
    }

    #[test]
    fn tag_map_normalizes_and_adds_extras() {
        let tag_map = TagMap::from_table("IN\tADP\nNNP\tPROPN\nCC\tCCONJ\nVBZ\tVERB\n".as_bytes())
            .unwrap();

        assert_eq!(tag_map.get("IN"), Some(Pos::Prep));
        assert_eq!(tag_map.get("NNP"), Some(Pos::Noun));
        assert_eq!(tag_map.get("CC"), Some(Pos::Conj));
        assert_eq!(tag_map.get("VBZ"), Some(Pos::Verb));
        assert_eq!(tag_map.get("_SP"), Some(Pos::Space));
        assert_eq!(tag_map.get("HVS"), Some(Pos::Verb));
        assert_eq!(tag_map.get("FOO"), None);
        assert_eq!(tag_map.get(""), None);
    }

    #[test]
    fn tag_map_rejects_unknown_coarse_tag() {
        assert!(TagMap::from_table("NN\tFOO\n".as_bytes()).is_err());
    }

    #[test]
    fn resources_roundtrip_through_binary() {
        let dictionary: Dictionary = vec!["a", "b"].into_iter().collect();

        let mut bytes = Vec::new();
        dictionary.to_writer(&mut bytes).unwrap();

        assert_eq!(Dictionary::from_reader(bytes.as_slice()).unwrap(), dictionary);
    }

    #[test]
    fn load_by_extension() {
        let dir = std::env::temp_dir();
        let table = dir.join("errant_load_by_extension.tsv");
        let binary = dir.join("errant_load_by_extension.bin");

        fs_err::write(&table, "NN\tNOUN\n").unwrap();
        let tag_map = TagMap::load(&table).unwrap();
        assert_eq!(tag_map.get("NN"), Some(Pos::Noun));

        tag_map.to_writer(File::create(&binary).unwrap()).unwrap();
        assert_eq!(TagMap::load(&binary).unwrap(), tag_map);

        let dictionary: Dictionary = vec!["cat"].into_iter().collect();
        dictionary.to_writer(File::create(&binary).unwrap()).unwrap();
        assert_eq!(Dictionary::load(&binary).unwrap(), dictionary);

        fs_err::write(&table, "cat\n").unwrap();
        assert_eq!(Dictionary::load(&table).unwrap(), dictionary);
    }
}
