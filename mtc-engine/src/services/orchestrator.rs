//! Build orchestration
//!
//! One-call "ensure a build is running, or resume watching the one that
//! is", plus cancel and the informational history queries.
//!
//! Error policy is deliberately asymmetric: status, history, and cancel
//! idempotency are advisory and never block the UI (they degrade to
//! empty results plus a side-channel notice), while a failed *start* and
//! a *Faulted* build are the two events a user must be told about
//! unambiguously, so those propagate.

use crate::api::MachineApi;
use crate::notify::{ConnectivityProbe, Notice, Notifier};
use crate::services::build_poller::{BuildPoller, BuildProgressStream};
use mtc_common::models::{BuildConfig, BuildJob, BuildState, START_ACTIVE_STATES};
use mtc_common::{Error, Result};
use std::sync::Arc;

/// Composes status fetch, build start, and polling for one project
pub struct BuildOrchestrator {
    api: Arc<MachineApi>,
    poller: BuildPoller,
    notifier: Arc<dyn Notifier>,
    connectivity: Arc<dyn ConnectivityProbe>,
    project_id: String,
    start_states: Vec<BuildState>,
}

impl BuildOrchestrator {
    pub fn new(
        api: Arc<MachineApi>,
        poller: BuildPoller,
        notifier: Arc<dyn Notifier>,
        connectivity: Arc<dyn ConnectivityProbe>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            api,
            poller,
            notifier,
            connectivity,
            project_id: project_id.into(),
            start_states: START_ACTIVE_STATES.to_vec(),
        }
    }

    /// Override the states in which an existing build is resumed instead
    /// of starting a new one
    pub fn with_start_states(mut self, states: Vec<BuildState>) -> Self {
        self.start_states = states;
        self
    }

    /// Resume watching the active build, or start a new one
    ///
    /// A start is issued if and only if the current status is unknown or
    /// already terminal. A failed start propagates to the caller — the one
    /// place a raw error is allowed through.
    pub async fn start_build_or_get_active_build(
        &self,
        config: &BuildConfig,
    ) -> Result<BuildProgressStream> {
        if let Some(job) = self.current_build().await {
            if self.start_states.contains(&job.state) {
                tracing::info!(
                    project_id = %self.project_id,
                    build_id = %job.id,
                    state = ?job.state,
                    "resuming active build"
                );
                return Ok(self.poller.watch(job));
            }
        }

        let build_dto = self.api.start_build(config).await?;
        let job = BuildJob::from(build_dto);
        tracing::info!(project_id = %self.project_id, build_id = %job.id, "build started");
        Ok(self.poller.watch(job))
    }

    /// Current build status, or None when no build is visible
    ///
    /// Best-effort: offline and 403/404 fold to None, and any other
    /// failure raises a notice and also resolves to None.
    pub async fn current_build(&self) -> Option<BuildJob> {
        match self.poller.current_build(&self.project_id).await {
            Ok(job) => job,
            Err(e) => {
                tracing::warn!(project_id = %self.project_id, error = %e, "build status unavailable");
                self.notifier
                    .notify(Notice::error("Build status is temporarily unavailable."));
                None
            }
        }
    }

    /// Watch an already-fetched build observation
    pub fn watch(&self, build: BuildJob) -> BuildProgressStream {
        self.poller.watch(build)
    }

    /// Cancel the project's running build
    ///
    /// 404 means there was nothing to cancel and counts as success; any
    /// other failure propagates.
    pub async fn cancel_build(&self) -> Result<()> {
        match self.api.cancel_build(&self.project_id).await {
            Ok(()) => Ok(()),
            Err(Error::Http { status: 404, .. }) => {
                tracing::debug!(project_id = %self.project_id, "no build to cancel");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Most recently completed generation build, or None
    pub async fn last_completed_build(&self) -> Option<BuildJob> {
        if !self.connectivity.is_online() {
            return None;
        }
        match self.api.get_last_completed_build(&self.project_id).await {
            Ok(dto) => Some(BuildJob::from(dto)),
            Err(Error::Http {
                status: 403 | 404, ..
            }) => None,
            Err(e) => {
                tracing::warn!(project_id = %self.project_id, error = %e, "last completed build unavailable");
                self.notifier
                    .notify(Notice::error("Build history is temporarily unavailable."));
                None
            }
        }
    }

    /// All generation builds recorded for the project, oldest first as
    /// reported by the server; empty when none are visible
    pub async fn build_history(&self) -> Vec<BuildJob> {
        if !self.connectivity.is_online() {
            return Vec::new();
        }
        match self.api.get_build_history(&self.project_id).await {
            Ok(dtos) => dtos.into_iter().map(BuildJob::from).collect(),
            Err(Error::Http {
                status: 403 | 404, ..
            }) => Vec::new(),
            Err(e) => {
                tracing::warn!(project_id = %self.project_id, error = %e, "build history unavailable");
                self.notifier
                    .notify(Notice::error("Build history is temporarily unavailable."));
                Vec::new()
            }
        }
    }
}
