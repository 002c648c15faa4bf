//! Interactive translation operations against the remote engine

use crate::api::MachineApi;
use crate::notify::Notifier;
use crate::services::word_graph::WordGraphService;
use mtc_common::dto;
use mtc_common::models::{EngineStats, TranslationResult, WordGraph};
use mtc_common::Result;
use std::sync::Arc;

/// Per-project interactive translation surface: translate, suggest,
/// train, and engine statistics
pub struct InteractiveTranslator {
    api: Arc<MachineApi>,
    project_id: String,
    word_graphs: WordGraphService,
}

impl InteractiveTranslator {
    pub fn new(
        api: Arc<MachineApi>,
        notifier: Arc<dyn Notifier>,
        project_id: impl Into<String>,
    ) -> Self {
        let project_id = project_id.into();
        let word_graphs = WordGraphService::new(Arc::clone(&api), notifier, project_id.clone());
        Self {
            api,
            project_id,
            word_graphs,
        }
    }

    /// Translate one source segment
    pub async fn translate(&self, segment: &str) -> Result<TranslationResult> {
        let result_dto = self.api.translate(&self.project_id, segment).await?;
        // Engines that return no source tokens get a whitespace
        // tokenization of the request segment for the alignment dimensions
        let source_tokens = segment.split_whitespace().map(str::to_string).collect();
        Ok(dto::to_translation_result(&result_dto, source_tokens))
    }

    /// Word-graph suggestions for one source segment; degraded failures
    /// resolve to an empty graph (see `WordGraphService`)
    pub async fn word_graph(&self, segment: &str) -> WordGraph {
        self.word_graphs.get_word_graph(segment).await
    }

    /// Train the engine on one confirmed segment pair
    ///
    /// A write path: failures propagate to the caller.
    pub async fn train_segment(
        &self,
        source_segment: &str,
        target_segment: &str,
        sentence_start: bool,
    ) -> Result<()> {
        self.api
            .train_segment(
                &self.project_id,
                source_segment,
                target_segment,
                sentence_start,
            )
            .await?;
        tracing::debug!(project_id = %self.project_id, "segment trained");
        Ok(())
    }

    /// Engine confidence and trained-segment count, unmodified
    pub async fn stats(&self) -> Result<EngineStats> {
        let engine_dto = self.api.get_engine(&self.project_id).await?;
        Ok(dto::to_engine_stats(&engine_dto))
    }
}
