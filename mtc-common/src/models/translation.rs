//! Whole-segment translation result types

use super::word_graph::{TranslationSources, WordAlignmentMatrix};
use std::ops::Range;

/// One phrase-level unit of a translation result
#[derive(Debug, Clone, PartialEq)]
pub struct Phrase {
    /// Half-open range into the source tokens covered by this phrase
    pub source_range: Range<usize>,
    /// Cumulative cut point into the target tokens: this phrase produced
    /// target tokens up to (excluding) this index
    pub target_cut: usize,
    /// Phrase-level confidence, when the engine reports one
    pub confidence: Option<f64>,
}

/// A complete translation of one source segment
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TranslationResult {
    /// Detokenized translation text
    pub translation: String,
    /// Source-language tokens, in order
    pub source_tokens: Vec<String>,
    /// Produced target tokens, in order
    pub target_tokens: Vec<String>,
    /// One confidence per target token
    pub confidences: Vec<f64>,
    /// One origin flag set per target token
    pub sources: Vec<TranslationSources>,
    /// Alignment over the whole result, source-length × target-length
    pub alignment: WordAlignmentMatrix,
    /// Phrase segmentation, in order
    pub phrases: Vec<Phrase>,
}
