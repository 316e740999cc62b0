//! Ties alignment, merging and classification together.

use log::debug;
use std::ops::Range;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{
    align::{Alignment, CostPolicy, LevenshteinCosts, LinguisticCosts},
    classify::{Classifier, ClassifierMode, SyntacticClassifier},
    merge::{MergePolicy, Merger},
    types::{Edit, ErrorType, Sentence},
    utils::parallelism::MaybeParallelRefIterator,
    Error,
};

/// An edit given by its spans, e. g. from a gold-standard annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedEdit {
    pub o_span: Range<usize>,
    pub c_span: Range<usize>,
    /// The existing error type, if any.
    pub error_type: Option<ErrorType>,
}

impl ImportedEdit {
    pub fn new(o_span: Range<usize>, c_span: Range<usize>) -> Self {
        ImportedEdit {
            o_span,
            c_span,
            error_type: None,
        }
    }

    pub fn with_error_type(mut self, error_type: ErrorType) -> Self {
        self.error_type = Some(error_type);
        self
    }
}

/// Extracts and classifies the edits between original and corrected sentences.
#[derive(Debug, Clone)]
pub struct Annotator {
    costs: LinguisticCosts,
    merger: Merger,
    classifier: Classifier,
    syntactic: SyntacticClassifier,
    mode: ClassifierMode,
}

impl Annotator {
    pub fn new(costs: LinguisticCosts, merger: Merger, classifier: Classifier) -> Self {
        Annotator {
            costs,
            merger,
            classifier,
            syntactic: SyntacticClassifier,
            mode: ClassifierMode::default(),
        }
    }

    /// Selects the classifier used for all edits of this annotator.
    pub fn with_mode(mut self, mode: ClassifierMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> ClassifierMode {
        self.mode
    }

    pub fn costs(&self) -> &LinguisticCosts {
        &self.costs
    }

    pub fn merger(&self) -> &Merger {
        &self.merger
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Aligns the sentences with the linguistic costs or, if `lev` is set, with plain Levenshtein costs.
    pub fn align<'a>(&self, orig: &'a Sentence, cor: &'a Sentence, lev: bool) -> Alignment<'a> {
        let costs: CostPolicy = if lev {
            LevenshteinCosts.into()
        } else {
            self.costs.clone().into()
        };

        Alignment::new(orig, cor, &costs)
    }

    pub fn merge(&self, alignment: &Alignment, policy: MergePolicy) -> Vec<Edit> {
        self.merger.merge(alignment, policy)
    }

    /// Sets the error type of the edit with the classifier of the selected [ClassifierMode].
    pub fn classify(&self, edit: &mut Edit, orig: &Sentence, cor: &Sentence) {
        let error_type = match self.mode {
            ClassifierMode::Errant => self.classifier.classify(edit, orig, cor),
            ClassifierMode::Syntactic => self.syntactic.classify(edit, orig, cor),
        };
        edit.set_error_type(error_type);
    }

    /// Computes the classified edits which turn `orig` into `cor`, from left to right.
    pub fn annotate(
        &self,
        orig: &Sentence,
        cor: &Sentence,
        lev: bool,
        policy: MergePolicy,
    ) -> Vec<Edit> {
        let alignment = self.align(orig, cor, lev);
        let mut edits = self.merge(&alignment, policy);

        for edit in edits.iter_mut() {
            self.classify(edit, orig, cor);
        }

        debug!("found {} edits with policy {}", edits.len(), policy);
        edits
    }

    /// Like [annotate][Annotator::annotate], with the merge policy given by its name
    /// (`rules`, `all-split`, `all-merge` or `all-equal`).
    pub fn annotate_str(
        &self,
        orig: &Sentence,
        cor: &Sentence,
        lev: bool,
        policy: &str,
    ) -> Result<Vec<Edit>, Error> {
        Ok(self.annotate(orig, cor, lev, policy.parse()?))
    }

    /// Annotates many independent sentence pairs. Runs in parallel if the `parallel` feature is enabled.
    pub fn annotate_batch(
        &self,
        pairs: &[(Sentence, Sentence)],
        lev: bool,
        policy: MergePolicy,
    ) -> Vec<Vec<Edit>> {
        pairs
            .maybe_par_iter()
            .map(|(orig, cor)| self.annotate(orig, cor, lev, policy))
            .collect()
    }

    /// Turns an externally given edit into an [Edit]. If `minimise` is set, tokens shared at the
    /// start and end of both sides are removed and `Ok(None)` is returned if nothing is left.
    /// The edit is classified unless `keep_type` is set and it already has an error type.
    pub fn import_edit(
        &self,
        orig: &Sentence,
        cor: &Sentence,
        edit: ImportedEdit,
        minimise: bool,
        keep_type: bool,
    ) -> Result<Option<Edit>, Error> {
        let ImportedEdit {
            o_span,
            c_span,
            error_type,
        } = edit;

        let mut imported = Edit::new(orig, cor, o_span, c_span)?;

        if minimise {
            imported = match imported.minimise(orig, cor) {
                Some(edit) => edit,
                None => return Ok(None),
            };
        }

        match error_type {
            Some(error_type) if keep_type => imported.set_error_type(error_type),
            _ => self.classify(&mut imported, orig, cor),
        }

        Ok(Some(imported))
    }
}
