use clap::Parser;
use errant::{
    classify::ClassifierMode,
    lang::en,
    m2,
    merge::MergePolicy,
    resources::{Dictionary, TagMap},
    types::Sentence,
    Error,
};
use fs_err::File;
use log::info;
use std::io::{BufRead, BufReader, BufWriter, Lines};

/// Aligns parsed parallel sentences and writes the classified edits in M2 format.
/// Every line of the input files is a JSON array of tokens.
#[derive(Parser)]
#[clap(version = "0.1.0")]
struct Opts {
    /// The original sentences.
    #[clap(long)]
    orig: String,
    /// One or more files with corrected sentences.
    #[clap(long, required = true, multiple_values = true)]
    cor: Vec<String>,
    #[clap(long)]
    out: String,
    /// Align using standard Levenshtein.
    #[clap(long)]
    lev: bool,
    /// The merging strategy: rules, all-split, all-merge or all-equal.
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

fn next_line(lines: &mut Lines<BufReader<File>>) -> Result<Option<String>, Error> {
    Ok(lines.next().transpose()?)
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

    let mut orig_lines = BufReader::new(File::open(&opts.orig)?).lines();
    let mut cor_lines = opts
        .cor
        .iter()
        .map(|path| -> Result<_, Error> { Ok(BufReader::new(File::open(path)?).lines()) })
        .collect::<Result<Vec<_>, Error>>()?;
    let mut writer = BufWriter::new(File::create(&opts.out)?);
    let mut n_sentences = 0;

    while let Some(orig_line) = next_line(&mut orig_lines)? {
        let mut cor_sentences = Vec::with_capacity(cor_lines.len());
        for lines in cor_lines.iter_mut() {
            cor_sentences.push(next_line(lines)?.unwrap_or_default());
        }

        if orig_line.trim().is_empty() {
            continue;
        }
        let orig: Sentence = serde_json::from_str(&orig_line)?;

        let mut annotations = Vec::with_capacity(cor_sentences.len());
        for (id, cor_line) in cor_sentences.iter().enumerate() {
            let cor: Sentence = if cor_line.trim().is_empty() {
                Sentence::default()
            } else {
                serde_json::from_str(cor_line)?
            };

            let edits = if orig.text() == cor.text() {
                Vec::new()
            } else {
                annotator.annotate(&orig, &cor, opts.lev, opts.merge)
            };
            annotations.push((id, edits));
        }

        m2::write_block(&mut writer, &orig, &annotations)?;
        n_sentences += 1;
    }

    info!("wrote {} sentences to {}", n_sentences, opts.out);
    Ok(())
}
