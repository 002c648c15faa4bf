//! Typed client over the remote translation service's wire endpoints
//!
//! Thin request/response mapping only: path construction, body shaping,
//! and DTO deserialization. Retry, degradation, and notification policy
//! live in the services, not here.

use crate::transport::Transport;
use chrono::{DateTime, SecondsFormat, Utc};
use mtc_common::dto::{BuildDto, EngineDto, TranslationResultDto, WordGraphDto};
use mtc_common::models::BuildConfig;
use mtc_common::{Error, Result};
use serde_json::Value;
use std::sync::Arc;

/// Typed wrapper over the wire endpoints
pub struct MachineApi {
    transport: Arc<dyn Transport>,
}

impl MachineApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    fn deserialize<T: serde::de::DeserializeOwned>(data: Option<Value>) -> Result<T> {
        let value = data.ok_or_else(|| Error::Network("response body missing".to_string()))?;
        Ok(serde_json::from_value(value)?)
    }

    /// GET `translation/engines/project:{projectId}`
    pub async fn get_engine(&self, project_id: &str) -> Result<EngineDto> {
        let response = self
            .transport
            .get(&format!("translation/engines/project:{}", project_id))
            .await?;
        Self::deserialize(response.data)
    }

    /// POST `translation/engines/project:{projectId}/actions/translate`
    pub async fn translate(&self, project_id: &str, segment: &str) -> Result<TranslationResultDto> {
        let response = self
            .transport
            .post(
                &format!("translation/engines/project:{}/actions/translate", project_id),
                Some(Value::String(segment.to_string())),
            )
            .await?;
        Self::deserialize(response.data)
    }

    /// POST `translation/engines/project:{projectId}/actions/getWordGraph`
    pub async fn get_word_graph(&self, project_id: &str, segment: &str) -> Result<WordGraphDto> {
        let response = self
            .transport
            .post(
                &format!(
                    "translation/engines/project:{}/actions/getWordGraph",
                    project_id
                ),
                Some(Value::String(segment.to_string())),
            )
            .await?;
        Self::deserialize(response.data)
    }

    /// POST `translation/engines/project:{projectId}/actions/trainSegment`
    pub async fn train_segment(
        &self,
        project_id: &str,
        source_segment: &str,
        target_segment: &str,
        sentence_start: bool,
    ) -> Result<()> {
        self.transport
            .post(
                &format!(
                    "translation/engines/project:{}/actions/trainSegment",
                    project_id
                ),
                Some(serde_json::json!({
                    "sourceSegment": source_segment,
                    "targetSegment": target_segment,
                    "sentenceStart": sentence_start,
                })),
            )
            .await?;
        Ok(())
    }

    /// POST `translation/pretranslations` with the build configuration
    pub async fn start_build(&self, config: &BuildConfig) -> Result<BuildDto> {
        let response = self
            .transport
            .post(
                "translation/pretranslations",
                Some(serde_json::to_value(config)?),
            )
            .await?;
        Self::deserialize(response.data)
    }

    /// POST `translation/pretranslations/cancel` with the JSON-quoted
    /// project id as the body
    pub async fn cancel_build(&self, project_id: &str) -> Result<()> {
        self.transport
            .post(
                "translation/pretranslations/cancel",
                Some(Value::String(project_id.to_string())),
            )
            .await?;
        Ok(())
    }

    /// GET `translation/builds/id:{id}`, either as an initial
    /// `?pretranslate=true` status fetch or with a `?minRevision={n}`
    /// polling cursor
    pub async fn get_build(&self, id: &str, min_revision: Option<i64>) -> Result<BuildDto> {
        let path = match min_revision {
            Some(revision) => format!("translation/builds/id:{}?minRevision={}", id, revision),
            None => format!("translation/builds/id:{}?pretranslate=true", id),
        };
        let response = self.transport.get(&path).await?;
        Self::deserialize(response.data)
    }

    /// GET `translation/engines/project:{projectId}/actions/getLastCompletedPreTranslationBuild`
    pub async fn get_last_completed_build(&self, project_id: &str) -> Result<BuildDto> {
        let response = self
            .transport
            .get(&format!(
                "translation/engines/project:{}/actions/getLastCompletedPreTranslationBuild",
                project_id
            ))
            .await?;
        Self::deserialize(response.data)
    }

    /// GET `translation/builds/project:{projectId}?pretranslate=true`
    pub async fn get_build_history(&self, project_id: &str) -> Result<Vec<BuildDto>> {
        let response = self
            .transport
            .get(&format!(
                "translation/builds/project:{}?pretranslate=true",
                project_id
            ))
            .await?;
        Self::deserialize(response.data)
    }

    /// GET `translation/engines/project:{projectId}/actions/pretranslate/{book}_{chapter}`
    ///
    /// Chapter 0 requests the whole book. `timestamp` pins the generated
    /// text to a completed build's generation time; without it the latest
    /// available text is returned.
    pub async fn get_pretranslation_text(
        &self,
        project_id: &str,
        book: &str,
        chapter: u32,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<String> {
        let mut path = format!(
            "translation/engines/project:{}/actions/pretranslate/{}_{}",
            project_id, book, chapter
        );
        if let Some(timestamp) = timestamp {
            path.push_str(&format!(
                "?timestamp={}",
                timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
            ));
        }
        let response = self.transport.get(&path).await?;
        Self::deserialize(response.data)
    }
}
