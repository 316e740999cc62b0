use clap::Parser;
use errant::{
    compare::{compare, CategoryLevel, CompareOptions, Mode},
    m2::parse_m2,
    Error,
};
use fs_err::File;

/// Compares hypothesis and reference M2 files and prints precision, recall and F-score.
#[derive(Parser)]
#[clap(version = "0.1.0")]
struct Opts {
    /// The hypothesis M2 file.
    #[clap(long)]
    hyp: String,
    /// The reference M2 file.
    #[clap(long = "ref")]
    reference: String,
    /// The beta of the F-score.
    #[clap(long, short, default_value = "0.5")]
    beta: f64,
    /// Show error category scores: 1 (M, U, R), 2 (categories without operation), 3 (full types).
    #[clap(long, short)]
    cat: Option<u8>,
    /// Evaluate detection in terms of spans.
    #[clap(long, conflicts_with_all = &["dt", "cse"])]
    ds: bool,
    /// Evaluate detection in terms of tokens.
    #[clap(long, conflicts_with = "cse")]
    dt: bool,
    /// Evaluate correction in terms of spans and error types.
    #[clap(long)]
    cse: bool,
    /// Only evaluate single token edits.
    #[clap(long, conflicts_with = "multi")]
    single: bool,
    /// Only evaluate multi token edits.
    #[clap(long)]
    multi: bool,
    /// Error types to ignore.
    #[clap(long, multiple_values = true)]
    filt: Vec<String>,
    /// Print the chosen annotators and counts of every sentence.
    #[clap(long, short)]
    verbose: bool,
}

fn main() -> Result<(), Error> {
    env_logger::init();
    let opts = Opts::parse();

    let mode = if opts.dt {
        Mode::TokenDetection
    } else if opts.ds {
        Mode::SpanDetection
    } else if opts.cse {
        Mode::TypedSpanCorrection
    } else {
        Mode::SpanCorrection
    };
    let options = CompareOptions {
        beta: opts.beta,
        mode,
        single: opts.single,
        multi: opts.multi,
        filter: opts.filt.iter().cloned().collect(),
    };

    let hypothesis = parse_m2(File::open(&opts.hyp)?)?;
    let reference = parse_m2(File::open(&opts.reference)?)?;

    let evaluation = compare(&hypothesis, &reference, &options)?;

    if opts.verbose {
        for (i, sentence) in evaluation.sentences.iter().enumerate() {
            println!("{:-^40}", "");
            println!(
                "^^ HYP {}, REF {} chosen for sentence {}",
                sentence.hypothesis, sentence.reference, i
            );
            println!("Local results:");
            println!("{:>10}{:>5}{:>5}{:>5}", "Category", "TP", "FP", "FN");
            for (category, counts) in &sentence.categories {
                println!(
                    "{:>10}{:>5}{:>5}{:>5}",
                    category, counts.tp, counts.fp, counts.fn_
                );
            }
        }
    }

    print!(
        "{}",
        evaluation.report(mode, opts.beta, opts.cat.and_then(CategoryLevel::from_number))
    );
    Ok(())
}
