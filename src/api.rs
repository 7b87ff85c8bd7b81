//! Boundary to the remote dashboard API.
//!
//! The transport behind these calls lives outside this crate. Listeners only
//! see the [`RemoteApi`] trait, so an HTTP client, a demo backend, or a test
//! double can be plugged in without touching the workflows.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::RemoteError;
use crate::state::{AdminData, Recommendation, WeatherRecord};

/// The four token-authenticated operations the dashboard consumes.
///
/// No retry or timeout is applied by callers: a call that never settles
/// stalls only the listener that issued it.
#[async_trait]
pub trait RemoteApi: Send + Sync + 'static {
    /// Fetch the admin data set (shipments, retailers, distribution centers).
    async fn get_admin_data(&self, token: &str) -> Result<AdminData, RemoteError>;

    /// Run a storm simulation and return the resulting weather record.
    async fn simulate_storm(&self, token: &str) -> Result<WeatherRecord, RemoteError>;

    /// Acknowledge one recommendation. The response body is not interpreted.
    async fn post_acknowledge_recommendation(
        &self,
        token: &str,
        recommendation_id: &str,
    ) -> Result<Value, RemoteError>;

    /// Fetch the authoritative recommendation list.
    async fn get_recommendations(&self, token: &str) -> Result<Vec<Recommendation>, RemoteError>;
}

/// Decode a JSON response body into a typed payload.
///
/// Helper for transport implementations; a malformed body is reported as a
/// [`RemoteError`] like any other remote failure.
///
/// # Errors
///
/// Returns [`RemoteError`] carrying the `serde_json` error as its source.
pub fn decode_response<T: DeserializeOwned>(operation: &str, body: Value) -> Result<T, RemoteError> {
    serde_json::from_value(body)
        .map_err(|e| RemoteError::with_source(format!("malformed {operation} response"), e))
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    /// A canned API that records every call and fails the operations it is
    /// told to fail.
    #[derive(Default)]
    pub(crate) struct StubApi {
        pub fail_admin: bool,
        pub fail_storm: bool,
        pub fail_ack: bool,
        pub fail_recommendations: bool,
        pub calls: Mutex<Vec<String>>,
    }

    impl StubApi {
        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl RemoteApi for StubApi {
        async fn get_admin_data(&self, token: &str) -> Result<AdminData, RemoteError> {
            self.record(format!("get_admin_data:{token}"));
            if self.fail_admin {
                return Err(RemoteError::new("admin unavailable"));
            }
            decode_response("admin data", json!({"shipments": [{"id": "s1"}]}))
        }

        async fn simulate_storm(&self, token: &str) -> Result<WeatherRecord, RemoteError> {
            self.record(format!("simulate_storm:{token}"));
            if self.fail_storm {
                return Err(RemoteError::new("storm unavailable"));
            }
            decode_response("storm", json!({"id": "storm1"}))
        }

        async fn post_acknowledge_recommendation(
            &self,
            token: &str,
            recommendation_id: &str,
        ) -> Result<Value, RemoteError> {
            self.record(format!("acknowledge:{token}:{recommendation_id}"));
            if self.fail_ack {
                return Err(RemoteError::new("acknowledge rejected"));
            }
            Ok(json!({"acknowledged": recommendation_id}))
        }

        async fn get_recommendations(
            &self,
            token: &str,
        ) -> Result<Vec<Recommendation>, RemoteError> {
            self.record(format!("get_recommendations:{token}"));
            if self.fail_recommendations {
                return Err(RemoteError::new("recommendations unavailable"));
            }
            decode_response("recommendations", json!([{"recommendationId": "r2"}]))
        }
    }
}
