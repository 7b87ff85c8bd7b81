//! The dashboard's pure state transition function.

use std::sync::Arc;

use crate::action::Action;
use crate::state::{AdminData, DashboardState, Recommendation};

/// Fold one action into the dashboard state, producing the next state.
///
/// # Contract
///
/// - Pure and total: no I/O, never panics, the same inputs always produce an
///   equal output.
/// - Never mutates `state`. Handled actions return a freshly allocated
///   state; everything else (the command actions) returns the same `Arc`,
///   so callers detect "no change" with [`Arc::ptr_eq`].
///
/// | Action | Effect |
/// |---|---|
/// | `SelectMarker` | replace `info_box` |
/// | `AdminDataReceived` | overlay the keys present in the payload |
/// | `StormReceived` | `weather` becomes `[payload]` |
/// | `RecommendationsReceived` | replace `weather[0].recommendations` |
pub fn fold(state: &Arc<DashboardState>, action: &Action) -> Arc<DashboardState> {
    match action {
        Action::SelectMarker(info_box) => {
            let mut next = DashboardState::clone(state);
            next.info_box = info_box.clone();
            Arc::new(next)
        }
        Action::AdminDataReceived(data) => Arc::new(overlay(state, data)),
        Action::StormReceived(record) => {
            let mut next = DashboardState::clone(state);
            next.weather = vec![record.clone()];
            Arc::new(next)
        }
        Action::RecommendationsReceived(recommendations) => {
            replace_recommendations(state, recommendations)
        }
        Action::GetAdminData { .. }
        | Action::SimulateStorm
        | Action::AcknowledgeRecommendation { .. } => Arc::clone(state),
    }
}

/// Shallow merge: each key present in `data` replaces the state's value.
fn overlay(state: &DashboardState, data: &AdminData) -> DashboardState {
    let mut next = state.clone();
    if let Some(info_box) = &data.info_box {
        next.info_box = info_box.clone();
    }
    if let Some(shipments) = &data.shipments {
        next.shipments = shipments.clone();
    }
    if let Some(retailers) = &data.retailers {
        next.retailers = retailers.clone();
    }
    if let Some(centers) = &data.distribution_centers {
        next.distribution_centers = centers.clone();
    }
    if let Some(weather) = &data.weather {
        next.weather = weather.clone();
    }
    for (key, value) in &data.extra {
        next.extra.insert(key.clone(), value.clone());
    }
    next
}

/// Structural copy of the state with a new recommendation list on the
/// current weather record. The input state and its weather vector are left
/// untouched.
fn replace_recommendations(
    state: &Arc<DashboardState>,
    recommendations: &[Recommendation],
) -> Arc<DashboardState> {
    if state.weather.is_empty() {
        tracing::warn!(
            count = recommendations.len(),
            "recommendations received with no current weather record, ignoring"
        );
        return Arc::clone(state);
    }

    let mut next = DashboardState::clone(state);
    next.weather[0].recommendations = Some(recommendations.to_vec());
    Arc::new(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{InfoBox, WeatherRecord};
    use serde_json::{Value, json};

    fn weather(value: Value) -> WeatherRecord {
        serde_json::from_value(value).unwrap()
    }

    fn recommendation(value: Value) -> Recommendation {
        serde_json::from_value(value).unwrap()
    }

    fn populated() -> Arc<DashboardState> {
        Arc::new(DashboardState {
            info_box: InfoBox::new("retailer", json!({"id": 9})),
            shipments: vec![json!({"id": "s1"})],
            retailers: vec![json!({"id": "ret1"})],
            distribution_centers: vec![json!({"id": "dc1"})],
            weather: vec![weather(json!({
                "id": "storm1",
                "recommendations": [{"recommendationId": "r1"}],
            }))],
            ..DashboardState::default()
        })
    }

    #[test]
    fn command_actions_return_same_reference() {
        let state = populated();
        for action in [
            Action::get_admin_data("g"),
            Action::simulate_storm(),
            Action::acknowledge_recommendation("r1"),
        ] {
            let next = fold(&state, &action);
            assert!(Arc::ptr_eq(&state, &next), "{} changed state", action.label());
        }
    }

    #[test]
    fn select_marker_replaces_info_box_only() {
        let state = populated();
        let next = fold(&state, &Action::select_marker("ship", json!({"id": 1})));

        assert_eq!(next.info_box, InfoBox::new("ship", json!({"id": 1})));
        assert_eq!(next.shipments, state.shipments);
        assert_eq!(next.retailers, state.retailers);
        assert_eq!(next.distribution_centers, state.distribution_centers);
        assert_eq!(next.weather, state.weather);
        assert!(!Arc::ptr_eq(&state, &next));
    }

    #[test]
    fn admin_data_overlays_present_keys() {
        let state = populated();
        let data: AdminData = serde_json::from_value(json!({
            "shipments": [{"id": "s2"}, {"id": "s3"}],
            "retailers": [],
        }))
        .unwrap();

        let next = fold(&state, &Action::admin_data_received(data));

        assert_eq!(next.shipments, vec![json!({"id": "s2"}), json!({"id": "s3"})]);
        assert!(next.retailers.is_empty());
        assert_eq!(next.info_box, state.info_box);
        assert_eq!(next.weather, state.weather);
        assert_eq!(next.distribution_centers, state.distribution_centers);
    }

    #[test]
    fn admin_data_overlays_unknown_keys_into_extra() {
        let state = Arc::new(DashboardState::default());
        let data: AdminData = serde_json::from_value(json!({"fleetSize": 12})).unwrap();

        let next = fold(&state, &Action::admin_data_received(data));

        assert_eq!(next.extra.get("fleetSize"), Some(&json!(12)));
        let value = serde_json::to_value(&*next).unwrap();
        assert_eq!(value["fleetSize"], 12);
    }

    #[test]
    fn storm_replaces_weather() {
        let state = Arc::new(DashboardState::default());
        let first = fold(&state, &Action::storm_received(weather(json!({"id": "storm1"}))));
        let second = fold(&first, &Action::storm_received(weather(json!({"id": "storm2"}))));

        assert_eq!(second.weather, vec![weather(json!({"id": "storm2"}))]);
        assert_eq!(first.weather, vec![weather(json!({"id": "storm1"}))]);
    }

    #[test]
    fn recommendations_replace_current_list() {
        let state = populated();
        let refreshed = vec![recommendation(json!({"recommendationId": "r2"}))];

        let next = fold(&state, &Action::recommendations_received(refreshed.clone()));

        assert_eq!(next.recommendations(), refreshed.as_slice());
        assert_eq!(next.weather[0].fields["id"], "storm1");
    }

    #[test]
    fn recommendations_do_not_mutate_prior_state() {
        let state = populated();
        let before = DashboardState::clone(&state);

        let next = fold(
            &state,
            &Action::recommendations_received(vec![recommendation(json!({"recommendationId": "r2"}))]),
        );

        assert_eq!(*state, before, "prior state must be left untouched");
        assert!(!Arc::ptr_eq(&state, &next));
        assert_eq!(state.recommendations()[0].id(), Some("r1"));
    }

    #[test]
    fn recommendations_without_weather_is_a_no_op() {
        let state = Arc::new(DashboardState::default());
        let next = fold(&state, &Action::recommendations_received(vec![]));
        assert!(Arc::ptr_eq(&state, &next));
    }

    #[test]
    fn folding_a_sequence() {
        let actions = [
            Action::select_marker("ship", json!({"id": 1})),
            Action::storm_received(weather(json!({"id": "storm1"}))),
            Action::recommendations_received(vec![recommendation(
                json!({"recommendationId": "r1"}),
            )]),
            Action::simulate_storm(),
        ];
        let final_state = actions
            .iter()
            .fold(Arc::new(DashboardState::default()), |state, action| {
                fold(&state, action)
            });

        assert_eq!(final_state.info_box.kind, "ship");
        assert_eq!(final_state.recommendations()[0].id(), Some("r1"));
    }
}
