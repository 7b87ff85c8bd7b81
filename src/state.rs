//! Dashboard state shape: the marker detail panel, the map collections, and
//! the current weather record with its recommendations.
//!
//! Every type here serializes with the key names the dashboard front end
//! reads (`infoBox`, `distribution-centers`, `recommendationId`, ...), so a
//! state snapshot can be handed to the rendering layer as JSON unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `InfoBox::kind` value meaning "no marker selected".
pub const HIDDEN_INFO_BOX: &str = "hidden";

/// Detail panel for the currently selected map marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoBox {
    /// Marker category (e.g. `"ship"`, `"retailer"`), or [`HIDDEN_INFO_BOX`].
    #[serde(rename = "type")]
    pub kind: String,
    /// Opaque marker details shown in the panel. Missing on input means `{}`.
    #[serde(default = "empty_object")]
    pub data: Value,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

impl InfoBox {
    /// Build an info box for a marker of `kind` carrying `data`.
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }

    /// Returns `true` when no marker is selected.
    pub fn is_hidden(&self) -> bool {
        self.kind == HIDDEN_INFO_BOX
    }
}

impl Default for InfoBox {
    fn default() -> Self {
        Self {
            kind: HIDDEN_INFO_BOX.to_owned(),
            data: empty_object(),
        }
    }
}

/// A single recommendation attached to the current weather record.
///
/// The body is opaque to this crate apart from its `recommendationId`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recommendation {
    pub fields: Map<String, Value>,
}

impl Recommendation {
    /// The `recommendationId` field, if present and a string.
    pub fn id(&self) -> Option<&str> {
        self.fields.get("recommendationId").and_then(Value::as_str)
    }
}

/// Result of a storm simulation.
///
/// Opaque apart from the optional `recommendations` list, which is replaced
/// wholesale whenever the recommendations are re-fetched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<Recommendation>>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Response of the admin-data call.
///
/// Every field is optional: only keys present in the response are overlaid
/// onto [`DashboardState`]. A key sent as JSON `null` counts as absent.
/// Unrecognized keys land in `extra` and are overlaid as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminData {
    #[serde(rename = "infoBox", default, skip_serializing_if = "Option::is_none")]
    pub info_box: Option<InfoBox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipments: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retailers: Option<Vec<Value>>,
    #[serde(
        rename = "distribution-centers",
        alias = "distributionCenters",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub distribution_centers: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<Vec<WeatherRecord>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The dashboard's application state.
///
/// Only ever replaced through [`fold`](crate::fold); the bus hands out
/// `Arc` snapshots so readers can compare versions with `Arc::ptr_eq`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardState {
    #[serde(rename = "infoBox", default)]
    pub info_box: InfoBox,
    #[serde(default)]
    pub shipments: Vec<Value>,
    #[serde(default)]
    pub retailers: Vec<Value>,
    #[serde(
        rename = "distribution-centers",
        alias = "distributionCenters",
        default
    )]
    pub distribution_centers: Vec<Value>,
    /// Holds at most one record: the latest storm simulation.
    #[serde(default)]
    pub weather: Vec<WeatherRecord>,
    /// Top-level keys overlaid by admin data that have no typed field.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DashboardState {
    /// The current weather record, if a storm has been simulated.
    pub fn current_weather(&self) -> Option<&WeatherRecord> {
        self.weather.first()
    }

    /// Recommendations of the current weather record, or an empty slice.
    pub fn recommendations(&self) -> &[Recommendation] {
        self.current_weather()
            .and_then(|w| w.recommendations.as_deref())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_state_matches_initial_shape() {
        let value = serde_json::to_value(DashboardState::default()).unwrap();
        assert_eq!(
            value,
            json!({
                "infoBox": {"type": "hidden", "data": {}},
                "shipments": [],
                "retailers": [],
                "distribution-centers": [],
                "weather": [],
            })
        );
    }

    #[test]
    fn default_info_box_is_hidden() {
        assert!(InfoBox::default().is_hidden());
        assert!(!InfoBox::new("ship", json!({"id": 1})).is_hidden());
    }

    #[test]
    fn info_box_without_data_gets_empty_object() {
        let info_box: InfoBox = serde_json::from_value(json!({"type": "ship"})).unwrap();
        assert_eq!(info_box, InfoBox::new("ship", json!({})));
    }

    #[test]
    fn weather_record_keeps_opaque_fields_and_recommendations() {
        let record: WeatherRecord = serde_json::from_value(json!({
            "id": "storm1",
            "severity": 3,
            "recommendations": [{"recommendationId": "r1"}],
        }))
        .unwrap();

        assert_eq!(record.fields["id"], "storm1");
        assert_eq!(record.fields["severity"], 3);
        let recs = record.recommendations.as_deref().unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].id(), Some("r1"));
        assert!(!record.fields.contains_key("recommendations"));
    }

    #[test]
    fn weather_record_without_recommendations_omits_key() {
        let record: WeatherRecord = serde_json::from_value(json!({"id": "storm1"})).unwrap();
        assert_eq!(record.recommendations, None);
        assert_eq!(serde_json::to_value(&record).unwrap(), json!({"id": "storm1"}));
    }

    #[test]
    fn admin_data_accepts_camel_case_distribution_centers() {
        let data: AdminData = serde_json::from_value(json!({
            "distributionCenters": [{"id": "dc1"}],
            "region": "north",
        }))
        .unwrap();

        assert_eq!(data.distribution_centers, Some(vec![json!({"id": "dc1"})]));
        assert_eq!(data.shipments, None);
        assert_eq!(data.extra.get("region"), Some(&json!("north")));
    }

    #[test]
    fn recommendations_empty_without_weather() {
        let state = DashboardState::default();
        assert!(state.current_weather().is_none());
        assert!(state.recommendations().is_empty());
    }
}
