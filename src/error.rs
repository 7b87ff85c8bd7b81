//! Crate-level error types for remote calls, listener workflows, and action
//! decoding.

use std::error::Error as StdError;

/// A failed remote API call.
///
/// Network, authorization, and decoding failures all surface as this one
/// type. Implementations of
/// [`RemoteApi`](crate::RemoteApi) may attach the underlying cause as the
/// error source.
#[derive(Debug, thiserror::Error)]
#[error("remote call failed: {message}")]
pub struct RemoteError {
    /// Human-readable description, e.g. `"503 service unavailable"`.
    message: String,
    /// Underlying transport or decoding error, if any.
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl RemoteError {
    /// A failure described only by `message`, with no underlying cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying transport or decoding error.
    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The failure description, without the `remote call failed:` prefix
    /// added by `Display`.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Error returned by one iteration of a command listener.
///
/// Each variant names the workflow step that failed. The listener loop logs
/// and swallows these; they never reach the dashboard state.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// The admin-data fetch failed.
    #[error("failed to retrieve dashboard data: {0}")]
    AdminData(#[source] RemoteError),

    /// The storm simulation call failed.
    #[error("failed to retrieve recommendations from simulating storm: {0}")]
    SimulateStorm(#[source] RemoteError),

    /// Step one of the acknowledge workflow failed; no refresh was attempted.
    #[error("failed to acknowledge recommendation {recommendation_id}: {source}")]
    Acknowledge {
        recommendation_id: String,
        source: RemoteError,
    },

    /// The acknowledge succeeded but the recommendation refresh failed.
    #[error("failed to refresh recommendations after acknowledging {recommendation_id}: {source}")]
    Recommendations {
        recommendation_id: String,
        source: RemoteError,
    },

    /// A listener was handed an action outside its family.
    #[error("listener `{listener}` cannot handle {label}")]
    UnexpectedAction {
        listener: &'static str,
        label: &'static str,
    },
}

impl WorkflowError {
    /// The remote failure behind this error, if any.
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            WorkflowError::AdminData(e) | WorkflowError::SimulateStorm(e) => Some(e),
            WorkflowError::Acknowledge { source, .. }
            | WorkflowError::Recommendations { source, .. } => Some(source),
            WorkflowError::UnexpectedAction { .. } => None,
        }
    }
}

/// Error returned when decoding an action from its JSON wire form fails.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// The input is not valid JSON, or a payload failed to serialize.
    #[error("invalid action JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The object has no string `type` field.
    #[error("action has no `type` label")]
    MissingLabel,

    /// The `type` field names no known action.
    #[error("unknown action label: {0}")]
    UnknownLabel(String),

    /// The payload does not match the shape the action requires.
    #[error("invalid payload for {label}: {source}")]
    Payload {
        label: &'static str,
        source: serde_json::Error,
    },
}
