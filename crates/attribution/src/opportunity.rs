//! Opportunity aggregation — runs the model library against one
//! opportunity's touchpoints and assembles a single `AttributionResult`.

use dealtrace_core::types::{Opportunity, Touchpoint};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::models::{self, CreditMap, ModelKind};

/// Per-model credit distributions for one opportunity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelBreakdown {
    pub first_touch: CreditMap,
    pub last_touch: CreditMap,
    pub linear: CreditMap,
    pub time_decay: CreditMap,
    pub u_shaped: CreditMap,
    pub w_shaped: CreditMap,
}

impl ModelBreakdown {
    pub fn model(&self, kind: ModelKind) -> &CreditMap {
        match kind {
            ModelKind::FirstTouch => &self.first_touch,
            ModelKind::LastTouch => &self.last_touch,
            ModelKind::Linear => &self.linear,
            ModelKind::TimeDecay => &self.time_decay,
            ModelKind::UShaped => &self.u_shaped,
            ModelKind::WShaped => &self.w_shaped,
        }
    }
}

/// Attribution of one opportunity's value across its touchpoints, under
/// every model. Derived per request, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributionResult {
    pub opportunity_id: Uuid,
    pub opportunity_name: String,
    pub total_value: f64,
    pub touchpoints: Vec<Touchpoint>,
    pub attribution: ModelBreakdown,
}

/// Sort touchpoints ascending by timestamp (stable, so recorded order
/// breaks ties), run all six models, and assemble the result. An empty
/// touchpoint list yields empty maps; callers aggregating sums must skip
/// such opportunities.
pub fn build_attribution_result(opportunity: &Opportunity, half_life_days: f64) -> AttributionResult {
    let mut touchpoints = opportunity.touchpoints.clone();
    touchpoints.sort_by_key(|t| t.timestamp);

    let attribution = ModelBreakdown {
        first_touch: checked(models::first_touch(&touchpoints), ModelKind::FirstTouch, opportunity.id),
        last_touch: checked(models::last_touch(&touchpoints), ModelKind::LastTouch, opportunity.id),
        linear: checked(models::linear(&touchpoints), ModelKind::Linear, opportunity.id),
        time_decay: checked(
            models::time_decay(&touchpoints, half_life_days),
            ModelKind::TimeDecay,
            opportunity.id,
        ),
        u_shaped: checked(models::u_shaped(&touchpoints), ModelKind::UShaped, opportunity.id),
        w_shaped: checked(models::w_shaped(&touchpoints), ModelKind::WShaped, opportunity.id),
    };

    AttributionResult {
        opportunity_id: opportunity.id,
        opportunity_name: opportunity.name.clone(),
        total_value: opportunity.total_value,
        touchpoints,
        attribution,
    }
}

/// Enforce the sum-to-100 invariant on a freshly computed distribution.
/// A violation is a model-library bug: tests fail on it loudly, production
/// renormalizes and logs instead of failing the whole request.
fn checked(mut credits: CreditMap, kind: ModelKind, opportunity_id: Uuid) -> CreditMap {
    if !models::sums_to_100(&credits) {
        warn!(
            %opportunity_id,
            model = ?kind,
            total = models::distribution_total(&credits),
            "Attribution distribution violated the sum-to-100 invariant, renormalizing"
        );
        metrics::counter!("attribution.invariant_violations").increment(1);
        models::renormalize(&mut credits);
    }
    credits
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use dealtrace_core::types::TouchpointType;

    fn base_time() -> DateTime<Utc> {
        "2024-03-01T09:00:00Z".parse().unwrap()
    }

    fn opportunity(n: usize) -> Opportunity {
        let id = Uuid::new_v4();
        Opportunity {
            id,
            name: "Acme renewal".to_string(),
            total_value: 50_000.0,
            touchpoints: (0..n)
                .map(|i| Touchpoint {
                    id: Uuid::new_v4(),
                    opportunity_id: id,
                    touchpoint_type: TouchpointType::Call,
                    timestamp: base_time() + Duration::days(i as i64),
                    description: format!("call {}", i),
                })
                .collect(),
        }
    }

    #[test]
    fn test_result_covers_all_models() {
        let opp = opportunity(5);
        let result = build_attribution_result(&opp, 7.0);

        assert_eq!(result.opportunity_id, opp.id);
        assert_eq!(result.total_value, 50_000.0);
        assert_eq!(result.touchpoints.len(), 5);
        for kind in [
            ModelKind::FirstTouch,
            ModelKind::LastTouch,
            ModelKind::Linear,
            ModelKind::TimeDecay,
            ModelKind::UShaped,
            ModelKind::WShaped,
        ] {
            let credits = result.attribution.model(kind);
            assert_eq!(credits.len(), 5);
            assert!(models::sums_to_100(credits), "model {:?}", kind);
        }
    }

    #[test]
    fn test_unsorted_input_is_sorted_before_attribution() {
        let mut opp = opportunity(4);
        opp.touchpoints.reverse();
        let earliest = opp.touchpoints[3].id;
        let latest = opp.touchpoints[0].id;

        let result = build_attribution_result(&opp, 7.0);
        assert_eq!(result.touchpoints[0].id, earliest);
        assert_eq!(result.attribution.first_touch[&earliest], 100.0);
        assert_eq!(result.attribution.last_touch[&latest], 100.0);
    }

    #[test]
    fn test_empty_touchpoints_yield_empty_maps() {
        let opp = opportunity(0);
        let result = build_attribution_result(&opp, 7.0);
        assert!(result.attribution.first_touch.is_empty());
        assert!(result.attribution.linear.is_empty());
        assert!(result.attribution.w_shaped.is_empty());
        assert!(result.touchpoints.is_empty());
    }

    #[test]
    fn test_idempotent_on_same_snapshot() {
        let opp = opportunity(6);
        let first = build_attribution_result(&opp, 7.0);
        let second = build_attribution_result(&opp, 7.0);
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let opp = opportunity(2);
        let value = serde_json::to_value(build_attribution_result(&opp, 7.0)).unwrap();
        assert!(value.get("opportunityId").is_some());
        assert!(value.get("totalValue").is_some());
        let attribution = value.get("attribution").unwrap();
        for field in ["firstTouch", "lastTouch", "linear", "timeDecay", "uShaped", "wShaped"] {
            assert!(attribution.get(field).is_some(), "missing {}", field);
        }
    }
}
