use clap::Parser;
use errant::{
    classify::ClassifierMode,
    lang::en,
    m2::{self, Reannotation},
    merge::MergePolicy,
    resources::{Dictionary, TagMap},
    types::Sentence,
    Error,
};
use fs_err::File;
use log::info;
use std::{
    collections::HashMap,
    io::{BufRead, BufReader, BufWriter},
};

/// Extracts and / or classifies the edits of an M2 file again.
#[derive(Parser)]
#[clap(version = "0.1.0")]
struct Opts {
    /// The M2 file.
    m2: String,
    /// Parses of the original and all corrected sentences. Every line is a JSON array of tokens.
    #[clap(long)]
    parsed: String,
    #[clap(long)]
    out: String,
    /// Extract edits automatically.
    #[clap(long, conflicts_with = "gold", required_unless_present = "gold")]
    auto: bool,
    /// Use the existing edit alignments.
    #[clap(long)]
    gold: bool,
    /// Do not minimise edit spans (gold only).
    #[clap(long)]
    no_min: bool,
    /// Keep the existing error types (gold only).
    #[clap(long)]
    old_cats: bool,
    /// Align using standard Levenshtein (auto only).
    #[clap(long)]
    lev: bool,
    /// The merging strategy: rules, all-split, all-merge or all-equal (auto only).
    #[clap(long, default_value = "rules")]
    merge: MergePolicy,
    /// The classifier of error types: errant or sercl.
    #[clap(long, default_value = "errant")]
    annotator: ClassifierMode,
    /// A word list with one word per line to check spelling against, or a dictionary binary (`.bin`).
    #[clap(long)]
    dictionary: Option<String>,
    /// A tab-separated table of `<tag>\t<coarse tag>` lines, or a tag map binary (`.bin`),
    /// to use instead of the built-in table.
    #[clap(long)]
    tag_map: Option<String>,
}

fn main() -> Result<(), Error> {
    env_logger::init();
    let opts = Opts::parse();

    let dictionary = match &opts.dictionary {
        Some(path) => Dictionary::load(path)?,
        None => Dictionary::default(),
    };
    let annotator = match &opts.tag_map {
        Some(path) => en::annotator_with_tag_map(dictionary, TagMap::load(path)?),
        None => en::annotator(dictionary),
    }
    .with_mode(opts.annotator);

    let mode = if opts.auto {
        Reannotation::Auto {
            lev: opts.lev,
            policy: opts.merge,
        }
    } else {
        Reannotation::Gold {
            minimise: !opts.no_min,
            keep_types: opts.old_cats,
        }
    };

    let mut parses = HashMap::new();
    for line in BufReader::new(File::open(&opts.parsed)?).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let sentence: Sentence = serde_json::from_str(&line)?;
        parses.insert(sentence.text(), sentence);
    }
    info!("loaded {} parsed sentences", parses.len());

    let mut parse = |tokens: &[String]| -> Result<Sentence, Error> {
        let text = tokens.join(" ");
        parses
            .get(&text)
            .cloned()
            .ok_or(Error::MissingParse(text))
    };

    let blocks = m2::parse_m2(File::open(&opts.m2)?)?;
    let mut writer = BufWriter::new(File::create(&opts.out)?);

    for block in &blocks {
        let orig = parse(&block.tokens)?;
        let annotations = m2::reannotate(&annotator, block, &orig, mode, &mut parse)?;
        m2::write_block(&mut writer, &orig, &annotations)?;
    }

    info!("wrote {} sentences to {}", blocks.len(), opts.out);
    Ok(())
}
