//! Command listeners: long-lived tasks that turn command actions into remote
//! calls and publish the results back onto the bus.
//!
//! Each listener owns one command family. Its loop waits for the next
//! matching action, reads the session token, runs its workflow, and either
//! publishes the result or logs the failure and moves on. The next action is
//! only taken once the current workflow has settled, so at most one remote
//! call per family is in flight. Different families run concurrently.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::Instrument;

use crate::action::{Action, ActionKind};
use crate::api::RemoteApi;
use crate::bus::{Bus, Subscription};
use crate::error::WorkflowError;
use crate::session::SessionProvider;

/// One command family's side-effecting workflow.
///
/// # Contract
///
/// - [`handle`](CommandListener::handle) receives only actions of
///   [`KIND`](CommandListener::KIND) when driven by the listener loop.
/// - On success it returns the result action to publish. On failure nothing
///   is published; the error is reported and the loop keeps serving.
#[async_trait]
pub trait CommandListener: Send + Sync + 'static {
    /// Name used in log fields and failure reports.
    const NAME: &'static str;

    /// The command kind this listener consumes.
    const KIND: ActionKind;

    /// Run the workflow for one command using `token` for every remote call.
    async fn handle(&self, action: Action, token: &str) -> Result<Action, WorkflowError>;
}

/// A swallowed listener failure, reported on the dashboard's diagnostic
/// channel.
#[derive(Debug, Clone)]
pub struct ListenerFailure {
    pub listener: &'static str,
    pub error: Arc<WorkflowError>,
}

/// `GET_ADMIN_DATA` → `get_admin_data` → `ADMIN_DATA_RECEIVED`.
pub struct AdminDataListener {
    api: Arc<dyn RemoteApi>,
}

impl AdminDataListener {
    pub fn new(api: Arc<dyn RemoteApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl CommandListener for AdminDataListener {
    const NAME: &'static str = "admin-data";
    const KIND: ActionKind = ActionKind::GetAdminData;

    async fn handle(&self, action: Action, token: &str) -> Result<Action, WorkflowError> {
        let guid = match action {
            Action::GetAdminData { guid } => guid,
            other => return Err(unexpected::<Self>(&other)),
        };
        tracing::debug!(guid = guid.as_deref().unwrap_or(""), "fetching admin data");

        let data = self
            .api
            .get_admin_data(token)
            .await
            .map_err(WorkflowError::AdminData)?;
        Ok(Action::AdminDataReceived(data))
    }
}

/// `SIMULATE_STORM` → `simulate_storm` → `STORM_RECEIVED`.
pub struct StormListener {
    api: Arc<dyn RemoteApi>,
}

impl StormListener {
    pub fn new(api: Arc<dyn RemoteApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl CommandListener for StormListener {
    const NAME: &'static str = "simulate-storm";
    const KIND: ActionKind = ActionKind::SimulateStorm;

    async fn handle(&self, action: Action, token: &str) -> Result<Action, WorkflowError> {
        if !matches!(action, Action::SimulateStorm) {
            return Err(unexpected::<Self>(&action));
        }

        let record = self
            .api
            .simulate_storm(token)
            .await
            .map_err(WorkflowError::SimulateStorm)?;
        Ok(Action::StormReceived(record))
    }
}

/// `ACKNOWLEDGE_RECOMMENDATION` → `post_acknowledge_recommendation`, then
/// `get_recommendations` → `RECOMMENDATIONS_RECEIVED`.
///
/// The refresh only runs if the acknowledge succeeded. Either failure aborts
/// the iteration with nothing published.
pub struct AcknowledgeListener {
    api: Arc<dyn RemoteApi>,
}

impl AcknowledgeListener {
    pub fn new(api: Arc<dyn RemoteApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl CommandListener for AcknowledgeListener {
    const NAME: &'static str = "acknowledge-recommendation";
    const KIND: ActionKind = ActionKind::AcknowledgeRecommendation;

    async fn handle(&self, action: Action, token: &str) -> Result<Action, WorkflowError> {
        let recommendation_id = match action {
            Action::AcknowledgeRecommendation { recommendation_id } => recommendation_id,
            other => return Err(unexpected::<Self>(&other)),
        };

        let response = match self
            .api
            .post_acknowledge_recommendation(token, &recommendation_id)
            .await
        {
            Ok(response) => response,
            Err(source) => {
                return Err(WorkflowError::Acknowledge {
                    recommendation_id,
                    source,
                });
            }
        };
        tracing::debug!(%recommendation_id, %response, "recommendation acknowledged");

        match self.api.get_recommendations(token).await {
            Ok(recommendations) => {
                tracing::debug!(count = recommendations.len(), "recommendations refreshed");
                Ok(Action::RecommendationsReceived(recommendations))
            }
            Err(source) => Err(WorkflowError::Recommendations {
                recommendation_id,
                source,
            }),
        }
    }
}

fn unexpected<L: CommandListener>(action: &Action) -> WorkflowError {
    WorkflowError::UnexpectedAction {
        listener: L::NAME,
        label: action.label(),
    }
}

/// Drive `listener` for as long as its subscription stays open.
///
/// # Arguments
///
/// * `listener` - The workflow to run for each command.
/// * `subscription` - Queue of commands of `L::KIND`, created before the
///   task was spawned so no early command is missed.
/// * `bus` - Where result actions are published.
/// * `session` - Read once per iteration for the token.
/// * `failures` - Diagnostic channel; sends are lossy and never block.
pub(crate) async fn run_listener<L: CommandListener>(
    listener: L,
    mut subscription: Subscription,
    bus: Bus,
    session: Arc<dyn SessionProvider>,
    failures: broadcast::Sender<ListenerFailure>,
) {
    tracing::debug!(listener = L::NAME, label = L::KIND.label(), "listener started");

    while let Some(action) = subscription.next().await {
        let span = tracing::info_span!("listener", listener = L::NAME, label = action.label());
        let token = session.token();

        match listener.handle(action, &token).instrument(span).await {
            Ok(result) => bus.publish(result),
            Err(e) => {
                tracing::error!(listener = L::NAME, error = %e, "command failed");
                // No receivers is the normal case.
                let _ = failures.send(ListenerFailure {
                    listener: L::NAME,
                    error: Arc::new(e),
                });
            }
        }
    }

    tracing::info!(listener = L::NAME, "listener stopped");
}
