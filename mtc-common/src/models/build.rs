//! Build job lifecycle model
//!
//! A build progresses through:
//! Queued → Pending → Active → Finishing → {Completed | Faulted | Canceled}
//!
//! The first four states are non-terminal; the last three are terminal.
//! Once a terminal state has been observed for a build id, no non-terminal
//! state is observed for that id again — a new build gets a new id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Remote build lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildState {
    /// Accepted by the server, waiting for a worker
    Queued,
    /// Worker assigned, not yet running
    Pending,
    /// Training / drafting in progress
    Active,
    /// Producing final output
    Finishing,
    /// Finished successfully
    Completed,
    /// Finished with an error; the build message is actionable
    Faulted,
    /// Canceled by a user
    Canceled,
}

impl BuildState {
    /// True for states after which no further transition occurs
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BuildState::Completed | BuildState::Faulted | BuildState::Canceled
        )
    }

    /// True while the build is still making progress (Finishing included)
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }
}

/// States in which an existing build is resumed instead of starting a new
/// one. Finishing is deliberately absent: a build that is already writing
/// its output cannot absorb a new request.
pub const START_ACTIVE_STATES: [BuildState; 3] =
    [BuildState::Queued, BuildState::Pending, BuildState::Active];

/// One observation of a remote build
///
/// Immutable per revision: a new revision is a new value, not a mutation.
/// The client never constructs one locally except as a polling placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildJob {
    /// Server-assigned build identifier
    pub id: String,
    /// Resource location of this build
    pub href: Option<String>,
    /// Identifier of the engine that owns this build
    pub engine_id: Option<String>,
    /// Monotonically increasing revision, used as the polling cursor
    pub revision: i64,
    /// Completion fraction, 0.0–1.0
    pub percent_completed: f64,
    /// Human-readable status message
    pub message: String,
    /// Lifecycle state
    pub state: BuildState,
    /// Position in the server's work queue
    pub queue_depth: i64,
    /// Free-form provenance recorded by the server
    pub additional_info: Option<BuildProvenance>,
}

/// Provenance metadata attached to a build by the server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildProvenance {
    /// When the build was requested
    pub date_requested: Option<DateTime<Utc>>,
    /// When generation finished (completed builds only)
    pub date_finished: Option<DateTime<Utc>>,
    /// User who requested the build
    pub requested_by: Option<String>,
    /// Ranges drafted by this build, per source project
    pub translation_ranges: Vec<TranslationRange>,
    /// Ranges used as training data, per source project
    pub training_ranges: Vec<TranslationRange>,
}

/// A per-project range of source material, e.g. `"GEN;EXO"`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRange {
    pub project_id: String,
    pub scripture_range: String,
}

/// Configuration submitted when starting a build
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub training_ranges: Vec<TranslationRange>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub translation_ranges: Vec<TranslationRange>,
    #[serde(default)]
    pub fast_training: bool,
}

/// Engine statistics reported by the remote service
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Overall engine confidence, 0.0–1.0
    pub confidence: f64,
    /// Number of segments the engine has been trained on
    pub trained_segment_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_and_active_partition_the_states() {
        let all = [
            BuildState::Queued,
            BuildState::Pending,
            BuildState::Active,
            BuildState::Finishing,
            BuildState::Completed,
            BuildState::Faulted,
            BuildState::Canceled,
        ];
        for state in all {
            assert_ne!(state.is_terminal(), state.is_active());
        }
        assert!(BuildState::Finishing.is_active());
        assert!(BuildState::Canceled.is_terminal());
    }

    #[test]
    fn finishing_is_not_a_start_active_state() {
        assert!(!START_ACTIVE_STATES.contains(&BuildState::Finishing));
        assert!(START_ACTIVE_STATES.contains(&BuildState::Queued));
    }

    #[test]
    fn build_state_serializes_as_wire_name() {
        assert_eq!(
            serde_json::to_string(&BuildState::Canceled).unwrap(),
            "\"Canceled\""
        );
        let state: BuildState = serde_json::from_str("\"Finishing\"").unwrap();
        assert_eq!(state, BuildState::Finishing);
    }

    #[test]
    fn build_config_serializes_camel_case() {
        let config = BuildConfig {
            project_id: "project01".to_string(),
            fast_training: true,
            ..Default::default()
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["projectId"], "project01");
        assert_eq!(json["fastTraining"], true);
        assert!(json.get("trainingRanges").is_none());
    }
}
