//! Wire DTOs and the codec that reconstructs domain objects from them
//!
//! Everything here is pure: no I/O, no state, and no panics for
//! well-formed wire input. Absent optional fields fall back to the
//! empty/zero form — a missing `sources` list means no origin flags, an
//! empty `alignment` list means an all-false matrix.

use crate::models::{
    BuildJob, BuildProvenance, EngineStats, Phrase, TranslationRange, TranslationResult,
    TranslationSources, WordAlignmentMatrix, WordGraph, WordGraphArc,
};
use crate::models::build::BuildState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reference to another resource on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDto {
    pub id: String,
    #[serde(default)]
    pub href: Option<String>,
}

/// Wire form of a build observation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildDto {
    pub id: String,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub engine: Option<ResourceDto>,
    #[serde(default)]
    pub revision: i64,
    #[serde(default)]
    pub percent_completed: f64,
    #[serde(default)]
    pub message: Option<String>,
    pub state: BuildState,
    #[serde(default)]
    pub queue_depth: i64,
    #[serde(default)]
    pub additional_info: Option<BuildAdditionalInfoDto>,
}

/// Wire form of build provenance metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildAdditionalInfoDto {
    #[serde(default)]
    pub date_requested: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_finished: Option<DateTime<Utc>>,
    #[serde(default)]
    pub requested_by_user_id: Option<String>,
    #[serde(default)]
    pub translation_scripture_ranges: Vec<TranslationRange>,
    #[serde(default)]
    pub training_scripture_ranges: Vec<TranslationRange>,
}

/// Wire form of an engine resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineDto {
    pub id: String,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub source_language_tag: Option<String>,
    #[serde(default)]
    pub target_language_tag: Option<String>,
    #[serde(default)]
    pub is_shared: bool,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub trained_segment_count: u32,
}

/// Single-origin tag as enumerated on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranslationSourceDto {
    Primary,
    Secondary,
    Human,
}

impl From<TranslationSourceDto> for TranslationSources {
    fn from(source: TranslationSourceDto) -> Self {
        match source {
            TranslationSourceDto::Primary => TranslationSources::SMT,
            TranslationSourceDto::Secondary => TranslationSources::TRANSFER,
            TranslationSourceDto::Human => TranslationSources::PREFIX,
        }
    }
}

/// Wire form of one alignment pair
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignedWordPairDto {
    pub source_index: usize,
    pub target_index: usize,
}

/// Wire form of a word-graph arc
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordGraphArcDto {
    pub prev_state: u32,
    pub next_state: u32,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub target_tokens: Vec<String>,
    #[serde(default)]
    pub confidences: Vec<f64>,
    pub source_segment_start: usize,
    pub source_segment_end: usize,
    #[serde(default)]
    pub alignment: Vec<AlignedWordPairDto>,
    #[serde(default)]
    pub sources: Vec<Vec<TranslationSourceDto>>,
}

/// Wire form of a word graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordGraphDto {
    #[serde(default)]
    pub source_tokens: Vec<String>,
    #[serde(default)]
    pub initial_state_score: f64,
    #[serde(default)]
    pub final_states: Vec<u32>,
    #[serde(default)]
    pub arcs: Vec<WordGraphArcDto>,
}

/// Wire form of one result phrase
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhraseDto {
    pub source_segment_start: usize,
    pub source_segment_end: usize,
    pub target_segment_cut: usize,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Wire form of a whole-segment translation result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResultDto {
    #[serde(default)]
    pub translation: String,
    #[serde(default)]
    pub source_tokens: Vec<String>,
    #[serde(default)]
    pub target_tokens: Vec<String>,
    #[serde(default)]
    pub confidences: Vec<f64>,
    #[serde(default)]
    pub sources: Vec<Vec<TranslationSourceDto>>,
    #[serde(default)]
    pub alignment: Vec<AlignedWordPairDto>,
    #[serde(default)]
    pub phrases: Vec<PhraseDto>,
}

/// OR-fold a wire source list into one flag set per target token.
/// Tokens beyond the end of the wire list get the zero value.
fn fold_sources(sources: &[Vec<TranslationSourceDto>], token_count: usize) -> Vec<TranslationSources> {
    (0..token_count)
        .map(|i| {
            sources
                .get(i)
                .map(|tags| {
                    tags.iter()
                        .fold(TranslationSources::NONE, |acc, &tag| acc | tag.into())
                })
                .unwrap_or(TranslationSources::NONE)
        })
        .collect()
}

/// Reconstruct a word graph from its wire form
///
/// Each arc's alignment matrix is dimensioned by the arc-local source
/// slice (`source_segment_end - source_segment_start`) and the arc's
/// target token count.
pub fn to_word_graph(dto: &WordGraphDto) -> WordGraph {
    let arcs = dto
        .arcs
        .iter()
        .map(|arc| {
            let source_len = arc.source_segment_end.saturating_sub(arc.source_segment_start);
            let alignment = WordAlignmentMatrix::from_pairs(
                source_len,
                arc.target_tokens.len(),
                arc.alignment.iter().map(|p| (p.source_index, p.target_index)),
            );
            WordGraphArc {
                prev_state: arc.prev_state,
                next_state: arc.next_state,
                score: arc.score,
                target_tokens: arc.target_tokens.clone(),
                confidences: arc.confidences.clone(),
                source_range: arc.source_segment_start..arc.source_segment_end,
                alignment,
                sources: fold_sources(&arc.sources, arc.target_tokens.len()),
            }
        })
        .collect();

    WordGraph {
        source_tokens: dto.source_tokens.clone(),
        initial_state_score: dto.initial_state_score,
        final_states: dto.final_states.iter().copied().collect(),
        arcs,
    }
}

/// Reconstruct a whole-segment translation result from its wire form
///
/// The alignment matrix is dimensioned by the full source token count and
/// the result's target token count. When the DTO carries no source tokens
/// of its own, `source_tokens` supplies them.
pub fn to_translation_result(dto: &TranslationResultDto, source_tokens: Vec<String>) -> TranslationResult {
    let source_tokens = if dto.source_tokens.is_empty() {
        source_tokens
    } else {
        dto.source_tokens.clone()
    };
    let alignment = WordAlignmentMatrix::from_pairs(
        source_tokens.len(),
        dto.target_tokens.len(),
        dto.alignment.iter().map(|p| (p.source_index, p.target_index)),
    );
    let phrases = dto
        .phrases
        .iter()
        .map(|phrase| Phrase {
            source_range: phrase.source_segment_start..phrase.source_segment_end,
            target_cut: phrase.target_segment_cut,
            confidence: phrase.confidence,
        })
        .collect();

    TranslationResult {
        translation: dto.translation.clone(),
        sources: fold_sources(&dto.sources, dto.target_tokens.len()),
        target_tokens: dto.target_tokens.clone(),
        confidences: dto.confidences.clone(),
        source_tokens,
        alignment,
        phrases,
    }
}

/// Reconstruct a build observation from its wire form
pub fn to_build_job(dto: BuildDto) -> BuildJob {
    BuildJob {
        id: dto.id,
        href: dto.href,
        engine_id: dto.engine.map(|e| e.id),
        revision: dto.revision,
        percent_completed: dto.percent_completed,
        message: dto.message.unwrap_or_default(),
        state: dto.state,
        queue_depth: dto.queue_depth,
        additional_info: dto.additional_info.map(|info| BuildProvenance {
            date_requested: info.date_requested,
            date_finished: info.date_finished,
            requested_by: info.requested_by_user_id,
            translation_ranges: info.translation_scripture_ranges,
            training_ranges: info.training_scripture_ranges,
        }),
    }
}

impl From<BuildDto> for BuildJob {
    fn from(dto: BuildDto) -> Self {
        to_build_job(dto)
    }
}

/// Extract the engine statistics from an engine resource, unmodified
pub fn to_engine_stats(dto: &EngineDto) -> EngineStats {
    EngineStats {
        confidence: dto.confidence,
        trained_segment_count: dto.trained_segment_count,
    }
}
