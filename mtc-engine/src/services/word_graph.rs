//! Single-flight word-graph request coordinator
//!
//! The interactive editor issues word-graph lookups in rapid succession as
//! the user pauses on different segments. Two rules keep that cheap and
//! correct:
//!
//! 1. Identical concurrent requests (same exact segment string) share one
//!    remote call; the entry is dropped the instant the call settles.
//! 2. Remote calls for *different* segments go through one strict FIFO
//!    queue per coordinator instance, so a lookup can never overtake an
//!    older pending lookup relative to intervening trainSegment calls.
//!
//! Results are deliberately never cached across calls: interactive
//! training mutates engine state between requests, so a settled segment's
//! next request always goes back to the engine.
//!
//! The queue is per coordinator instance, never process-wide — different
//! projects/engines must not serialize against each other.

use crate::api::MachineApi;
use crate::notify::{Notice, Notifier};
use futures::future::{BoxFuture, FutureExt, Shared};
use mtc_common::dto;
use mtc_common::models::WordGraph;
use mtc_common::Error;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

type SharedWordGraph = Shared<BoxFuture<'static, WordGraph>>;

struct QueuedRequest {
    segment: String,
    done: oneshot::Sender<WordGraph>,
}

/// De-duplicates and serializes concurrent word-graph lookups against the
/// remote engine
pub struct WordGraphService {
    pending: Arc<Mutex<HashMap<String, SharedWordGraph>>>,
    queue_tx: mpsc::UnboundedSender<QueuedRequest>,
}

impl WordGraphService {
    /// Spawns the per-instance FIFO worker; must be called inside a tokio
    /// runtime
    pub fn new(
        api: Arc<MachineApi>,
        notifier: Arc<dyn Notifier>,
        project_id: impl Into<String>,
    ) -> Self {
        let pending = Arc::new(Mutex::new(HashMap::new()));
        let (queue_tx, mut queue_rx) = mpsc::unbounded_channel::<QueuedRequest>();

        let worker_pending = Arc::clone(&pending);
        let project_id = project_id.into();
        tokio::spawn(async move {
            // One request at a time, in enqueue order
            while let Some(request) = queue_rx.recv().await {
                let graph =
                    fetch_word_graph(&api, notifier.as_ref(), &project_id, &request.segment).await;
                worker_pending.lock().unwrap().remove(&request.segment);
                let _ = request.done.send(graph);
            }
        });

        Self { pending, queue_tx }
    }

    /// Get the word graph for one source segment
    ///
    /// Never fails: remote failures degrade to an empty graph plus a
    /// side-channel notice, so the editor UI keeps working.
    pub async fn get_word_graph(&self, segment: &str) -> WordGraph {
        let shared = {
            let mut pending = self.pending.lock().unwrap();
            if let Some(existing) = pending.get(segment) {
                tracing::debug!(segment_len = segment.len(), "joining in-flight word-graph request");
                existing.clone()
            } else {
                let (done_tx, done_rx) = oneshot::channel();
                let shared: SharedWordGraph =
                    async move { done_rx.await.unwrap_or_default() }.boxed().shared();
                pending.insert(segment.to_string(), shared.clone());

                // Enqueue position is claimed here, under the map lock, so
                // request order equals remote call order
                let enqueued = self.queue_tx.send(QueuedRequest {
                    segment: segment.to_string(),
                    done: done_tx,
                });
                if enqueued.is_err() {
                    tracing::warn!("word-graph worker gone; returning empty graph");
                    pending.remove(segment);
                }
                shared
            }
        };
        shared.await
    }

    /// Number of segments with an in-flight request (test hook)
    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }
}

async fn fetch_word_graph(
    api: &MachineApi,
    notifier: &dyn Notifier,
    project_id: &str,
    segment: &str,
) -> WordGraph {
    match api.get_word_graph(project_id, segment).await {
        Ok(graph_dto) => dto::to_word_graph(&graph_dto),
        Err(Error::Http {
            status: status @ (403 | 404 | 409),
            ..
        }) => {
            tracing::info!(status, "engine cannot serve suggestions; retraining needed");
            notifier.notify(
                Notice::error(
                    "The translation engine needs to be retrained before it can offer suggestions.",
                )
                .with_action("Retrain", format!("/projects/{}/train", project_id)),
            );
            WordGraph::default()
        }
        Err(e) => {
            tracing::warn!(error = %e, "word-graph request failed");
            notifier.notify(Notice::error(
                "Translation suggestions are temporarily unavailable.",
            ));
            WordGraph::default()
        }
    }
}
