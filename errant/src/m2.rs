//! Reading and writing of the M2 format.
//!
//! An M2 block consists of a line `S <tokens>` with the original sentence, followed by one line
//! `A <start> <end>|||<type>|||<correction>|||REQUIRED|||-NONE-|||<annotator>` per edit.
//! Blocks are separated by blank lines.

use log::warn;
use std::{
    io::{BufRead, BufReader, Read, Write},
    ops::Range,
};

use crate::{
    annotator::{Annotator, ImportedEdit},
    merge::MergePolicy,
    types::{Edit, ErrorType, Sentence},
    Error,
};

/// Error types of edits which mark a detected error without a correction.
const DETECTION_TYPES: &[&str] = &["Um", "UNK"];

/// The edit line of an annotator who made no edits.
pub fn noop_edit(annotator: usize) -> String {
    format!(
        "A -1 -1|||noop|||-NONE-|||REQUIRED|||-NONE-|||{}",
        annotator
    )
}

/// Writes the block of an original sentence and the edits of each annotator.
/// Annotators without edits get a noop edit.
pub fn write_block<W: Write>(
    writer: &mut W,
    orig: &Sentence,
    annotations: &[(usize, Vec<Edit>)],
) -> Result<(), Error> {
    writeln!(writer, "S {}", orig.text())?;

    for (annotator, edits) in annotations {
        if edits.is_empty() {
            writeln!(writer, "{}", noop_edit(*annotator))?;
        }

        for edit in edits {
            writeln!(writer, "{}", edit.to_m2(*annotator))?;
        }
    }

    writeln!(writer)?;
    Ok(())
}

/// One edit line of an M2 block.
#[derive(Debug, Clone, PartialEq)]
pub struct M2Edit {
    /// The original span. `None` for `-1 -1`, i. e. noop edits.
    pub o_span: Option<Range<usize>>,
    /// The raw error type. Kept as a string since M2 files contain types like `Um`.
    pub error_type: String,
    pub correction: String,
    pub annotator: usize,
}

impl M2Edit {
    fn parse(line: &str, line_number: usize) -> Result<Self, Error> {
        let error = |reason: &str| Error::M2Parse {
            line: line_number,
            reason: reason.to_string(),
        };

        let fields: Vec<&str> = line.split("|||").collect();
        if fields.len() < 3 {
            return Err(error("expected at least three fields separated by '|||'"));
        }

        let span: Vec<&str> = fields[0]
            .strip_prefix("A ")
            .ok_or_else(|| error("edit lines must start with 'A '"))?
            .split_whitespace()
            .collect();

        let o_span = match span.as_slice() {
            ["-1", "-1"] => None,
            [start, end] => {
                let start: usize = start.parse().map_err(|_| error("invalid start offset"))?;
                let end: usize = end.parse().map_err(|_| error("invalid end offset"))?;
                if start > end {
                    return Err(error("start offset is after end offset"));
                }
                Some(start..end)
            }
            _ => return Err(error("expected a start and an end offset")),
        };

        let annotator = match fields.last() {
            Some(id) if fields.len() > 3 => id
                .trim()
                .parse()
                .map_err(|_| error("invalid annotator id"))?,
            _ => 0,
        };

        Ok(M2Edit {
            o_span,
            error_type: fields[1].to_string(),
            correction: fields[2].to_string(),
            annotator,
        })
    }

    pub fn is_noop(&self) -> bool {
        self.o_span.is_none() || self.error_type == "noop"
    }

    /// Whether the edit only marks an error without a correction.
    pub fn is_detection(&self) -> bool {
        DETECTION_TYPES.contains(&self.error_type.as_str())
    }

    /// The correction tokens. `-NONE-` denotes an empty correction.
    pub fn correction_tokens(&self) -> Vec<&str> {
        if self.correction == "-NONE-" {
            Vec::new()
        } else {
            self.correction.split_whitespace().collect()
        }
    }

    pub fn to_line(&self) -> String {
        let (start, end) = match &self.o_span {
            Some(span) => (span.start as i64, span.end as i64),
            None => (-1, -1),
        };

        format!(
            "A {} {}|||{}|||{}|||REQUIRED|||-NONE-|||{}",
            start, end, self.error_type, self.correction, self.annotator
        )
    }
}

/// An edit of an [M2Block] with its span in the corrected sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectedEdit {
    pub o_span: Range<usize>,
    pub c_span: Range<usize>,
    pub error_type: String,
    pub correction: String,
}

/// An original sentence and the edits of all annotators.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct M2Block {
    pub tokens: Vec<String>,
    pub edits: Vec<M2Edit>,
}

impl M2Block {
    /// Parses a block. `first_line` is the line number of the first line, used in errors.
    pub fn parse(block: &str, first_line: usize) -> Result<Self, Error> {
        let mut lines = block.lines().filter(|x| !x.trim().is_empty());

        let tokens = match lines.next() {
            Some(line) if line == "S" || line.starts_with("S ") => {
                line[1..].split_whitespace().map(String::from).collect()
            }
            _ => {
                return Err(Error::M2Parse {
                    line: first_line,
                    reason: "blocks must start with an 'S' line".to_string(),
                })
            }
        };

        let edits = lines
            .enumerate()
            .map(|(i, line)| M2Edit::parse(line, first_line + i + 1))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(M2Block { tokens, edits })
    }

    /// The ids of all annotators in this block, sorted and deduplicated.
    pub fn annotators(&self) -> Vec<usize> {
        let mut annotators: Vec<_> = self.edits.iter().map(|x| x.annotator).collect();
        annotators.sort_unstable();
        annotators.dedup();
        annotators
    }

    pub fn edits_of(&self, annotator: usize) -> impl Iterator<Item = &M2Edit> {
        self.edits.iter().filter(move |x| x.annotator == annotator)
    }

    /// Applies the edits of an annotator to the original tokens. Returns the corrected tokens
    /// and the edits with their corrected spans. Noop edits are skipped; detection edits keep their
    /// pseudo-correction but leave the original tokens unchanged.
    pub fn corrected(&self, annotator: usize) -> Result<(Vec<String>, Vec<CorrectedEdit>), Error> {
        let mut edits: Vec<(&M2Edit, Range<usize>)> = self
            .edits_of(annotator)
            .filter_map(|x| x.o_span.clone().map(|span| (x, span)))
            .filter(|(x, _)| x.error_type != "noop")
            .collect();
        edits.sort_by_key(|(_, span)| (span.start, span.end));

        let mut cor = self.tokens.clone();
        let mut corrected = Vec::with_capacity(edits.len());
        let mut offset: isize = 0;

        for (edit, o_span) in edits {
            if o_span.end > self.tokens.len() {
                return Err(Error::InvalidSpan {
                    side: "original",
                    start: o_span.start,
                    end: o_span.end,
                    len: self.tokens.len(),
                });
            }

            let replacement: Vec<String> = if edit.is_detection() {
                self.tokens[o_span.clone()].to_vec()
            } else {
                edit.correction_tokens()
                    .into_iter()
                    .map(String::from)
                    .collect()
            };

            let start = o_span.start as isize + offset;
            let end = o_span.end as isize + offset;
            if start < 0 || end < start || end as usize > cor.len() {
                warn!("skipping overlapping edit '{}'", edit.to_line());
                continue;
            }
            let (start, end) = (start as usize, end as usize);

            let c_span = start..start + replacement.len();
            offset += replacement.len() as isize - o_span.len() as isize;
            cor.splice(start..end, replacement);

            corrected.push(CorrectedEdit {
                o_span,
                c_span,
                error_type: edit.error_type.clone(),
                correction: edit.correction.clone(),
            });
        }

        Ok((cor, corrected))
    }
}

/// How the edits of an M2 block are annotated again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reannotation {
    /// Edits are extracted anew from the corrected sentence. Only detection edits are kept.
    Auto { lev: bool, policy: MergePolicy },
    /// The existing edit spans are kept, optionally minimised. Existing error types are kept
    /// instead of classifying the edits again if `keep_types` is set.
    Gold { minimise: bool, keep_types: bool },
}

/// Annotates the edits of every annotator of a block again. `orig` is the parse of the block's
/// original tokens; `parse` is called with the corrected tokens of each annotator.
///
/// Detection edits are never minimised and get the type `UNK`, keeping their pseudo-correction.
/// In auto mode they are merged into the extracted edits, ordered by their original span.
/// Annotators whose first edit is a noop get no edits.
pub fn reannotate<F>(
    annotator: &Annotator,
    block: &M2Block,
    orig: &Sentence,
    mode: Reannotation,
    mut parse: F,
) -> Result<Vec<(usize, Vec<Edit>)>, Error>
where
    F: FnMut(&[String]) -> Result<Sentence, Error>,
{
    let mut annotations = Vec::new();

    for id in block.annotators() {
        if block.edits_of(id).next().map_or(true, M2Edit::is_noop) {
            annotations.push((id, Vec::new()));
            continue;
        }

        let (cor_tokens, gold_edits) = block.corrected(id)?;
        let cor = parse(&cor_tokens)?;
        let mut edits = Vec::with_capacity(gold_edits.len());

        for gold in gold_edits {
            let imported = ImportedEdit::new(gold.o_span.clone(), gold.c_span.clone());

            if DETECTION_TYPES.contains(&gold.error_type.as_str()) {
                let imported = imported.with_error_type(ErrorType::unknown());
                if let Some(mut edit) = annotator.import_edit(orig, &cor, imported, false, true)? {
                    edit.set_c_str(gold.correction.trim());
                    edits.push(edit);
                }
            } else if let Reannotation::Gold {
                minimise,
                keep_types,
            } = mode
            {
                let imported = match gold.error_type.parse() {
                    Ok(error_type) => imported.with_error_type(error_type),
                    Err(_) => imported,
                };
                if let Some(edit) =
                    annotator.import_edit(orig, &cor, imported, minimise, keep_types)?
                {
                    edits.push(edit);
                }
            }
        }

        if let Reannotation::Auto { lev, policy } = mode {
            edits.extend(annotator.annotate(orig, &cor, lev, policy));
            edits.sort_by_key(|x| (x.o_span().start, x.o_span().end));
        }

        annotations.push((id, edits));
    }

    Ok(annotations)
}

/// Reads all blocks of an M2 file.
pub fn parse_m2<R: Read>(reader: R) -> Result<Vec<M2Block>, Error> {
    let mut blocks = Vec::new();
    let mut current = String::new();
    let mut first_line = 1;

    for (i, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;

        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(M2Block::parse(&current, first_line)?);
                current.clear();
            }
            first_line = i + 2;
        } else {
            current.push_str(&line);
            current.push('\n');
        }
    }

    if !current.is_empty() {
        blocks.push(M2Block::parse(&current, first_line)?);
    }

    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        lang::en,
        resources::Dictionary,
        types::{Pos, Token},
    };

    const M2: &str = "S This are a sentence .
A 1 2|||R:VERB:SVA|||is|||REQUIRED|||-NONE-|||0
A 3 3|||M:ADJ|||good|||REQUIRED|||-NONE-|||0
A -1 -1|||noop|||-NONE-|||REQUIRED|||-NONE-|||1

S Fine .
A -1 -1|||noop|||-NONE-|||REQUIRED|||-NONE-|||0
";

    #[test]
    fn parses_blocks() {
        let blocks = parse_m2(M2.as_bytes()).unwrap();

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].tokens, vec!["This", "are", "a", "sentence", "."]);
        assert_eq!(blocks[0].annotators(), vec![0, 1]);
        assert_eq!(blocks[0].edits[0].o_span, Some(1..2));
        assert!(blocks[0].edits[2].is_noop());
        assert_eq!(blocks[1].edits[0].to_line(), noop_edit(0));
    }

    #[test]
    fn applies_edits() {
        let blocks = parse_m2(M2.as_bytes()).unwrap();
        let (cor, edits) = blocks[0].corrected(0).unwrap();

        assert_eq!(cor, vec!["This", "is", "a", "good", "sentence", "."]);
        assert_eq!(edits[1].o_span, 3..3);
        assert_eq!(edits[1].c_span, 3..4);

        let (cor, edits) = blocks[0].corrected(1).unwrap();
        assert_eq!(cor, blocks[0].tokens);
        assert!(edits.is_empty());
    }

    #[test]
    fn detection_edits_are_not_applied() {
        let block = M2Block::parse(
            "S a b c\nA 1 2|||Um|||x|||REQUIRED|||-NONE-|||0\nA 2 3|||U:NOUN|||-NONE-|||0",
            1,
        )
        .unwrap();
        let (cor, edits) = block.corrected(0).unwrap();

        assert_eq!(cor, vec!["a", "b"]);
        assert_eq!(edits[0].c_span, 1..2);
        assert_eq!(edits[0].correction, "x");
        assert_eq!(edits[1].c_span, 2..2);
    }

    fn parse(tokens: &[String]) -> Result<Sentence, Error> {
        Sentence::new(
            tokens
                .iter()
                .map(|x| Token::new(x.as_str(), Pos::Noun, "NN", x.as_str(), "dep", 0))
                .collect(),
        )
    }

    const REANNOTATED: &str = "S This are a sentence .
A 0 2|||R:VERB:SVA|||This is|||REQUIRED|||-NONE-|||0
A 3 4|||Um|||phrase|||REQUIRED|||-NONE-|||0
A -1 -1|||noop|||-NONE-|||REQUIRED|||-NONE-|||1
";

    #[test]
    fn reannotates_gold_edits() {
        let annotator = en::annotator(Dictionary::default());
        let block = M2Block::parse(REANNOTATED, 1).unwrap();
        let orig = parse(&block.tokens).unwrap();

        let mode = Reannotation::Gold {
            minimise: true,
            keep_types: true,
        };
        let annotations = reannotate(&annotator, &block, &orig, mode, parse).unwrap();

        assert_eq!(annotations.len(), 2);
        let (id, edits) = &annotations[0];
        assert_eq!(*id, 0);
        assert_eq!(
            edits.iter().map(|x| x.to_m2(0)).collect::<Vec<_>>(),
            vec![
                "A 1 2|||R:VERB:SVA|||is|||REQUIRED|||-NONE-|||0",
                "A 3 4|||UNK|||phrase|||REQUIRED|||-NONE-|||0",
            ]
        );
        assert_eq!(annotations[1], (1, Vec::new()));

        let mode = Reannotation::Gold {
            minimise: false,
            keep_types: true,
        };
        let annotations = reannotate(&annotator, &block, &orig, mode, parse).unwrap();
        assert_eq!(annotations[0].1[0].o_span(), &(0..2));
        assert_eq!(annotations[0].1[0].c_str(), "This is");
    }

    #[test]
    fn reannotates_automatically() {
        let annotator = en::annotator(Dictionary::default());
        let block = M2Block::parse(REANNOTATED, 1).unwrap();
        let orig = parse(&block.tokens).unwrap();

        let mode = Reannotation::Auto {
            lev: false,
            policy: MergePolicy::Rules,
        };
        let annotations = reannotate(&annotator, &block, &orig, mode, parse).unwrap();

        let edits = &annotations[0].1;
        assert_eq!(edits.len(), 2);
        assert_eq!(edits[0].o_span(), &(1..2));
        assert_eq!(edits[0].c_str(), "is");
        assert_ne!(edits[0].error_type(), Some(&ErrorType::unknown()));
        assert_eq!(edits[1].o_span(), &(3..4));
        assert_eq!(edits[1].error_type(), Some(&ErrorType::unknown()));

        let mut write_output = Vec::new();
        write_block(&mut write_output, &orig, &annotations).unwrap();
        assert!(String::from_utf8(write_output)
            .unwrap()
            .ends_with(&format!("{}\n\n", noop_edit(1))));
    }

    #[test]
    fn missing_parses_are_errors() {
        let annotator = en::annotator(Dictionary::default());
        let block = M2Block::parse(REANNOTATED, 1).unwrap();
        let orig = parse(&block.tokens).unwrap();

        let result = reannotate(
            &annotator,
            &block,
            &orig,
            Reannotation::Auto {
                lev: true,
                policy: MergePolicy::AllSplit,
            },
            |tokens: &[String]| Err(Error::MissingParse(tokens.join(" "))),
        );

        assert!(matches!(result, Err(Error::MissingParse(x)) if x == "This is a sentence ."));
    }

    #[test]
    fn reports_line_of_malformed_edit() {
        let error = parse_m2("S a\nA 0 1|||R:NOUN|||b|||REQUIRED|||-NONE-|||0\n\nS b\nA x 1|||U|||".as_bytes())
            .unwrap_err();

        match error {
            Error::M2Parse { line, .. } => assert_eq!(line, 5),
            x => panic!("unexpected error {:?}", x),
        }
        assert!(M2Block::parse("A 0 1|||R:NOUN|||b", 1).is_err());
    }

    #[test]
    fn writes_blocks() {
        let orig = Sentence::new(vec![]).unwrap();
        let mut output = Vec::new();

        write_block(&mut output, &orig, &[(0, Vec::new())]).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            format!("S \n{}\n\n", noop_edit(0))
        );
    }
}
