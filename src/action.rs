//! Action vocabulary: the commands published by the UI and the result
//! messages published by the listeners.
//!
//! Actions travel on the [`Bus`](crate::Bus) as typed values. Their wire
//! form, used when the UI layer hands actions over as JSON, is adjacently
//! tagged: `{"type": "Dashboard/<LABEL>", "payload": ...}`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ActionError;
use crate::state::{AdminData, InfoBox, Recommendation, WeatherRecord};

/// Namespace prefix shared by every wire label.
pub const LABEL_NAMESPACE: &str = "Dashboard/";

/// Misspelled acknowledge label still emitted by older front ends.
const LEGACY_ACKNOWLEDGE_LABEL: &str = "Dashboard/ACKNOWLEDGE_RECOMMENDATAION";

/// A one-shot message published onto the bus.
///
/// The first four variants are commands published by the UI; the
/// `*Received` variants are results published by the listeners. Of the
/// commands, only `SelectMarker` changes state when folded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Action {
    /// Show the detail panel for a map marker.
    #[serde(rename = "Dashboard/SELECT_MARKER")]
    SelectMarker(InfoBox),

    /// Fetch the admin data set. `guid` is carried but not used downstream.
    #[serde(rename = "Dashboard/GET_ADMIN_DATA")]
    GetAdminData { guid: Option<String> },

    /// Run a storm simulation.
    #[serde(rename = "Dashboard/SIMULATE_STORM")]
    SimulateStorm,

    /// Acknowledge a recommendation, then refresh the recommendation list.
    #[serde(
        rename = "Dashboard/ACKNOWLEDGE_RECOMMENDATION",
        alias = "Dashboard/ACKNOWLEDGE_RECOMMENDATAION"
    )]
    AcknowledgeRecommendation {
        #[serde(rename = "recommendationId")]
        recommendation_id: String,
    },

    /// Admin data returned by the remote API.
    #[serde(rename = "Dashboard/ADMIN_DATA_RECEIVED")]
    AdminDataReceived(AdminData),

    /// Storm simulation result returned by the remote API.
    #[serde(rename = "Dashboard/STORM_RECEIVED")]
    StormReceived(WeatherRecord),

    /// Refreshed recommendation list returned by the remote API.
    #[serde(rename = "Dashboard/RECOMMENDATIONS_RECEIVED")]
    RecommendationsReceived(Vec<Recommendation>),
}

/// Fieldless label of an [`Action`], used to subscribe to one family.
///
/// Each variant mirrors the [`Action`] variant of the same name. The bus
/// routes on this value, so a subscriber never has to inspect payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// `SELECT_MARKER` command.
    SelectMarker,
    /// `GET_ADMIN_DATA` command, consumed by the admin-data listener.
    GetAdminData,
    /// `SIMULATE_STORM` command, consumed by the storm listener.
    SimulateStorm,
    /// `ACKNOWLEDGE_RECOMMENDATION` command, consumed by the acknowledge
    /// listener.
    AcknowledgeRecommendation,
    /// `ADMIN_DATA_RECEIVED` result.
    AdminDataReceived,
    /// `STORM_RECEIVED` result.
    StormReceived,
    /// `RECOMMENDATIONS_RECEIVED` result.
    RecommendationsReceived,
}

impl ActionKind {
    /// Every kind, in declaration order.
    pub const ALL: [ActionKind; 7] = [
        ActionKind::SelectMarker,
        ActionKind::GetAdminData,
        ActionKind::SimulateStorm,
        ActionKind::AcknowledgeRecommendation,
        ActionKind::AdminDataReceived,
        ActionKind::StormReceived,
        ActionKind::RecommendationsReceived,
    ];

    /// Bare label, e.g. `"GET_ADMIN_DATA"`.
    pub fn label(self) -> &'static str {
        match self {
            ActionKind::SelectMarker => "SELECT_MARKER",
            ActionKind::GetAdminData => "GET_ADMIN_DATA",
            ActionKind::SimulateStorm => "SIMULATE_STORM",
            ActionKind::AcknowledgeRecommendation => "ACKNOWLEDGE_RECOMMENDATION",
            ActionKind::AdminDataReceived => "ADMIN_DATA_RECEIVED",
            ActionKind::StormReceived => "STORM_RECEIVED",
            ActionKind::RecommendationsReceived => "RECOMMENDATIONS_RECEIVED",
        }
    }

    /// Namespaced label used in the wire form, e.g. `"Dashboard/GET_ADMIN_DATA"`.
    pub fn wire_label(self) -> &'static str {
        match self {
            ActionKind::SelectMarker => "Dashboard/SELECT_MARKER",
            ActionKind::GetAdminData => "Dashboard/GET_ADMIN_DATA",
            ActionKind::SimulateStorm => "Dashboard/SIMULATE_STORM",
            ActionKind::AcknowledgeRecommendation => "Dashboard/ACKNOWLEDGE_RECOMMENDATION",
            ActionKind::AdminDataReceived => "Dashboard/ADMIN_DATA_RECEIVED",
            ActionKind::StormReceived => "Dashboard/STORM_RECEIVED",
            ActionKind::RecommendationsReceived => "Dashboard/RECOMMENDATIONS_RECEIVED",
        }
    }

    /// Resolve a wire label (or a bare label) to its kind.
    pub fn from_label(label: &str) -> Option<ActionKind> {
        if label == LEGACY_ACKNOWLEDGE_LABEL {
            return Some(ActionKind::AcknowledgeRecommendation);
        }
        let bare = label.strip_prefix(LABEL_NAMESPACE).unwrap_or(label);
        ActionKind::ALL.into_iter().find(|k| k.label() == bare)
    }

    /// Returns `true` for kinds the UI publishes, `false` for the results
    /// published by listeners.
    ///
    /// `SELECT_MARKER` is the one command that changes state when folded and
    /// the one no listener consumes.
    pub fn is_command(self) -> bool {
        matches!(
            self,
            ActionKind::SelectMarker
                | ActionKind::GetAdminData
                | ActionKind::SimulateStorm
                | ActionKind::AcknowledgeRecommendation
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Action {
    /// Select a map marker of `kind`, showing `data` in the info box.
    pub fn select_marker(kind: impl Into<String>, data: Value) -> Self {
        Action::SelectMarker(InfoBox::new(kind, data))
    }

    /// Request the admin data set.
    pub fn get_admin_data(guid: impl Into<String>) -> Self {
        Action::GetAdminData {
            guid: Some(guid.into()),
        }
    }

    /// Wrap an admin-data response for publishing.
    pub fn admin_data_received(payload: AdminData) -> Self {
        Action::AdminDataReceived(payload)
    }

    /// Request a storm simulation.
    pub fn simulate_storm() -> Self {
        Action::SimulateStorm
    }

    /// Wrap a storm simulation result for publishing.
    ///
    /// Folding it replaces the whole `weather` collection with this record.
    pub fn storm_received(payload: WeatherRecord) -> Self {
        Action::StormReceived(payload)
    }

    /// Wrap a refreshed recommendation list for publishing.
    ///
    /// Folding it replaces the recommendations of the current weather record.
    pub fn recommendations_received(payload: Vec<Recommendation>) -> Self {
        Action::RecommendationsReceived(payload)
    }

    /// Acknowledge the recommendation identified by `recommendation_id`.
    pub fn acknowledge_recommendation(recommendation_id: impl Into<String>) -> Self {
        Action::AcknowledgeRecommendation {
            recommendation_id: recommendation_id.into(),
        }
    }

    /// The [`ActionKind`] this action is routed under.
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::SelectMarker(_) => ActionKind::SelectMarker,
            Action::GetAdminData { .. } => ActionKind::GetAdminData,
            Action::SimulateStorm => ActionKind::SimulateStorm,
            Action::AcknowledgeRecommendation { .. } => ActionKind::AcknowledgeRecommendation,
            Action::AdminDataReceived(_) => ActionKind::AdminDataReceived,
            Action::StormReceived(_) => ActionKind::StormReceived,
            Action::RecommendationsReceived(_) => ActionKind::RecommendationsReceived,
        }
    }

    /// Bare label of this action's kind.
    pub fn label(&self) -> &'static str {
        self.kind().label()
    }

    /// Decode an action from its JSON wire form.
    ///
    /// # Errors
    ///
    /// * [`ActionError::MissingLabel`] -- the object has no string `type`.
    /// * [`ActionError::UnknownLabel`] -- `type` names no known action.
    /// * [`ActionError::Payload`] -- the payload does not fit the action.
    /// * [`ActionError::Json`] -- the input is not valid JSON.
    pub fn from_json(input: &str) -> Result<Self, ActionError> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_value(value)
    }

    /// Decode an action from an already-parsed JSON value.
    ///
    /// `GET_ADMIN_DATA` is also accepted in its flat form, with `guid` next to
    /// `type` and no `payload`, or with neither.
    ///
    /// # Errors
    ///
    /// Same as [`from_json`](Action::from_json), minus [`ActionError::Json`].
    pub fn from_value(mut value: Value) -> Result<Self, ActionError> {
        let label = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(ActionError::MissingLabel)?;
        // Bare labels are a bus-side convenience; the wire is always namespaced.
        let kind = label
            .starts_with(LABEL_NAMESPACE)
            .then(|| ActionKind::from_label(label))
            .flatten()
            .ok_or_else(|| ActionError::UnknownLabel(label.into()))?;

        if kind == ActionKind::GetAdminData {
            lift_guid(&mut value);
        }
        serde_json::from_value(value).map_err(|source| ActionError::Payload {
            label: kind.label(),
            source,
        })
    }

    /// Encode this action in its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Json`] if a payload cannot be serialized.
    pub fn to_json(&self) -> Result<String, ActionError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Move a top-level `guid` into a `payload` object, unless the action
/// already carries one.
fn lift_guid(value: &mut Value) {
    let Some(object) = value.as_object_mut() else {
        return;
    };
    if object.contains_key("payload") {
        return;
    }
    let mut payload = Map::new();
    if let Some(guid) = object.remove("guid") {
        payload.insert("guid".to_owned(), guid);
    }
    object.insert("payload".to_owned(), Value::Object(payload));
}
