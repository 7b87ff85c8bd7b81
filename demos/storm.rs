//! Self-contained walk through the dashboard core against an in-memory
//! backend: load admin data, select a marker, simulate a storm, and
//! acknowledge one of its recommendations.
//!
//! Run with: `cargo run --example storm`
//!
//! Set `RUST_LOG=dashfold=debug` to see every published action.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dashfold::{
    Action, ActionKind, AdminData, Dashboard, DashboardConfig, DashboardState, Recommendation,
    RemoteApi, RemoteError, SharedToken, WeatherRecord, decode_response,
};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

/// Serves canned JSON bodies and tracks which recommendations are still
/// open, so an acknowledge is visible in the next refresh.
struct DemoBackend {
    open: Mutex<Vec<Value>>,
}

impl DemoBackend {
    fn new() -> Self {
        Self {
            open: Mutex::new(vec![
                json!({"recommendationId": "rec-1", "action": "reroute ship-7 via north channel"}),
                json!({"recommendationId": "rec-2", "action": "restock dc-3 with water"}),
            ]),
        }
    }

    fn check(token: &str) -> Result<(), RemoteError> {
        if token.is_empty() {
            return Err(RemoteError::new("401 unauthorized"));
        }
        Ok(())
    }

    fn open_recommendations(&self) -> Result<Vec<Value>, RemoteError> {
        self.open
            .lock()
            .map(|open| open.clone())
            .map_err(|_| RemoteError::new("backend state poisoned"))
    }
}

#[async_trait]
impl RemoteApi for DemoBackend {
    async fn get_admin_data(&self, token: &str) -> Result<AdminData, RemoteError> {
        Self::check(token)?;
        decode_response(
            "admin data",
            json!({
                "shipments": [{"id": "ship-7", "status": "at sea"}],
                "retailers": [{"id": "ret-1", "name": "Harbor Foods"}],
                "distribution-centers": [{"id": "dc-3", "city": "Rotterdam"}],
            }),
        )
    }

    async fn simulate_storm(&self, token: &str) -> Result<WeatherRecord, RemoteError> {
        Self::check(token)?;
        let recommendations = self.open_recommendations()?;
        decode_response(
            "storm",
            json!({
                "id": "storm-1",
                "event": "hurricane",
                "recommendations": recommendations,
            }),
        )
    }

    async fn post_acknowledge_recommendation(
        &self,
        token: &str,
        recommendation_id: &str,
    ) -> Result<Value, RemoteError> {
        Self::check(token)?;
        let mut open = self
            .open
            .lock()
            .map_err(|_| RemoteError::new("backend state poisoned"))?;
        open.retain(|r| r["recommendationId"] != recommendation_id);
        Ok(json!({"status": "acknowledged", "recommendationId": recommendation_id}))
    }

    async fn get_recommendations(&self, token: &str) -> Result<Vec<Recommendation>, RemoteError> {
        Self::check(token)?;
        let open = self.open_recommendations()?;
        decode_response("recommendations", Value::Array(open))
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let dashboard = Dashboard::builder(
        Arc::new(DemoBackend::new()),
        Arc::new(SharedToken::new("demo-token")),
    )
    .config(DashboardConfig {
        failure_buffer: 16,
        ..DashboardConfig::default()
    })
    .start();
    let mut state = dashboard.watch_state();
    // Audit trail of acknowledged ids, next to the listener that acts on them.
    let mut acks = dashboard.bus().subscribe(ActionKind::AcknowledgeRecommendation);

    dashboard.dispatch(Action::get_admin_data("operator-1"));
    state.wait_for(|s| !s.shipments.is_empty()).await?;

    dashboard.dispatch(Action::select_marker("ship", json!({"id": "ship-7"})));

    dashboard.dispatch(Action::simulate_storm());
    state.wait_for(|s| s.recommendations().len() == 2).await?;
    print_state("after storm", &dashboard.state())?;

    // Wire form, the way a front end would send it.
    let ack = Action::from_json(
        r#"{"type":"Dashboard/ACKNOWLEDGE_RECOMMENDATION","payload":{"recommendationId":"rec-1"}}"#,
    )?;
    dashboard.dispatch(ack);
    state.wait_for(|s| s.recommendations().len() == 1).await?;

    let final_state = dashboard.state();
    print_state("after acknowledge", &final_state)?;

    while let Some(action) = acks.try_next() {
        if let Action::AcknowledgeRecommendation { recommendation_id } = action {
            println!("acknowledged {recommendation_id}");
        }
    }

    assert_eq!(final_state.info_box.kind, "ship");
    assert_eq!(final_state.recommendations()[0].id(), Some("rec-2"));
    println!("all assertions passed");

    Ok(())
}

fn print_state(title: &str, state: &DashboardState) -> Result<(), serde_json::Error> {
    println!("--- {title} ---");
    println!("{}", serde_json::to_string_pretty(state)?);
    Ok(())
}
