//! Summary aggregation — folds per-opportunity attribution into rollups
//! keyed by touchpoint type.

use std::collections::{BTreeMap, BTreeSet};

use dealtrace_core::types::TouchpointType;
use serde::{Deserialize, Serialize};

use crate::models::ModelKind;
use crate::opportunity::AttributionResult;

/// One summary row: attributed dollars for a touchpoint type.
///
/// The model fields are attribution quantities and sum correctly across
/// types per opportunity; `total_value` is "total deal value touched by
/// this type", added once per opportunity, and is informational only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRollup {
    pub count: u64,
    pub total_value: f64,
    pub linear: f64,
    pub time_decay: f64,
    pub u_shaped: f64,
    pub w_shaped: f64,
}

impl TypeRollup {
    fn model_mut(&mut self, kind: ModelKind) -> Option<&mut f64> {
        match kind {
            ModelKind::Linear => Some(&mut self.linear),
            ModelKind::TimeDecay => Some(&mut self.time_decay),
            ModelKind::UShaped => Some(&mut self.u_shaped),
            ModelKind::WShaped => Some(&mut self.w_shaped),
            ModelKind::FirstTouch | ModelKind::LastTouch => None,
        }
    }

    pub fn model(&self, kind: ModelKind) -> Option<f64> {
        match kind {
            ModelKind::Linear => Some(self.linear),
            ModelKind::TimeDecay => Some(self.time_decay),
            ModelKind::UShaped => Some(self.u_shaped),
            ModelKind::WShaped => Some(self.w_shaped),
            ModelKind::FirstTouch | ModelKind::LastTouch => None,
        }
    }
}

/// Cross-opportunity rollup keyed by touchpoint type. Serializes as a
/// plain JSON object; `BTreeMap` keeps the key order stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributionSummary {
    pub types: BTreeMap<TouchpointType, TypeRollup>,
}

/// Fold detail results into per-type rollups. Opportunities with zero
/// touchpoints are skipped entirely; they earn no credit and no row. A
/// sequential fold is the sole accumulation point, so no locking is needed
/// however the detail results were produced.
pub fn build_summary(
    results: &[AttributionResult],
    model_filter: Option<ModelKind>,
) -> AttributionSummary {
    let mut summary = AttributionSummary::default();

    for result in results {
        if result.touchpoints.is_empty() {
            continue;
        }

        for touchpoint in &result.touchpoints {
            let row = summary.types.entry(touchpoint.touchpoint_type).or_default();
            row.count += 1;

            for kind in ModelKind::SUMMARY_MODELS {
                if model_filter.is_some_and(|f| f != kind) {
                    continue;
                }
                let credit = result
                    .attribution
                    .model(kind)
                    .get(&touchpoint.id)
                    .copied()
                    .unwrap_or(0.0);
                if let Some(cell) = row.model_mut(kind) {
                    *cell += credit / 100.0 * result.total_value;
                }
            }
        }

        // Deal value counts once per opportunity for every type it touches,
        // never once per touchpoint.
        let touched: BTreeSet<TouchpointType> = result
            .touchpoints
            .iter()
            .map(|t| t.touchpoint_type)
            .collect();
        for touchpoint_type in touched {
            if let Some(row) = summary.types.get_mut(&touchpoint_type) {
                row.total_value += result.total_value;
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SUM_TOLERANCE;
    use crate::opportunity::build_attribution_result;
    use chrono::{DateTime, Duration, Utc};
    use dealtrace_core::types::{Opportunity, Touchpoint};
    use uuid::Uuid;

    fn base_time() -> DateTime<Utc> {
        "2024-03-01T09:00:00Z".parse().unwrap()
    }

    fn opportunity(name: &str, value: f64, types: &[TouchpointType]) -> Opportunity {
        let id = Uuid::new_v4();
        Opportunity {
            id,
            name: name.to_string(),
            total_value: value,
            touchpoints: types
                .iter()
                .enumerate()
                .map(|(i, &touchpoint_type)| Touchpoint {
                    id: Uuid::new_v4(),
                    opportunity_id: id,
                    touchpoint_type,
                    timestamp: base_time() + Duration::days(i as i64),
                    description: format!("touch {}", i),
                })
                .collect(),
        }
    }

    fn results(opportunities: &[Opportunity]) -> Vec<AttributionResult> {
        opportunities
            .iter()
            .map(|o| build_attribution_result(o, 7.0))
            .collect()
    }

    #[test]
    fn test_summary_two_opportunity_rollup() {
        // O1 (value 1000, 2 EMAIL touchpoints), O2 (value 500, 1 CALL):
        // linear rollup is {EMAIL: {count: 2, totalValue: 1000, linear: 1000},
        //                   CALL:  {count: 1, totalValue: 500,  linear: 500}}.
        let opportunities = [
            opportunity("O1", 1000.0, &[TouchpointType::Email, TouchpointType::Email]),
            opportunity("O2", 500.0, &[TouchpointType::Call]),
        ];
        let summary = build_summary(&results(&opportunities), None);

        let email = &summary.types[&TouchpointType::Email];
        assert_eq!(email.count, 2);
        assert_eq!(email.total_value, 1000.0);
        assert!((email.linear - 1000.0).abs() < SUM_TOLERANCE);

        let call = &summary.types[&TouchpointType::Call];
        assert_eq!(call.count, 1);
        assert_eq!(call.total_value, 500.0);
        assert!((call.linear - 500.0).abs() < SUM_TOLERANCE);
    }

    #[test]
    fn test_cross_type_sums_reproduce_total_value() {
        // Credit always totals 100% per opportunity per model, so summing a
        // model column across types must reproduce the summed deal values.
        let opportunities = [
            opportunity(
                "mixed",
                40_000.0,
                &[
                    TouchpointType::Email,
                    TouchpointType::Call,
                    TouchpointType::Meeting,
                    TouchpointType::Email,
                    TouchpointType::QuoteSent,
                ],
            ),
            opportunity(
                "small",
                5_000.0,
                &[TouchpointType::Demo, TouchpointType::Call],
            ),
        ];
        let summary = build_summary(&results(&opportunities), None);

        for kind in ModelKind::SUMMARY_MODELS {
            let across_types: f64 = summary
                .types
                .values()
                .map(|row| row.model(kind).unwrap_or(0.0))
                .sum();
            assert!(
                (across_types - 45_000.0).abs() < 1.0,
                "model {:?} sums to {}",
                kind,
                across_types
            );
        }
    }

    #[test]
    fn test_total_value_counted_once_per_opportunity() {
        // Three EMAIL touchpoints on one opportunity must not triple-count
        // the deal value in the EMAIL row.
        let opportunities = [opportunity(
            "emails",
            9_000.0,
            &[
                TouchpointType::Email,
                TouchpointType::Email,
                TouchpointType::Email,
            ],
        )];
        let summary = build_summary(&results(&opportunities), None);

        let email = &summary.types[&TouchpointType::Email];
        assert_eq!(email.count, 3);
        assert_eq!(email.total_value, 9_000.0);
    }

    #[test]
    fn test_empty_opportunities_excluded() {
        let opportunities = [
            opportunity("empty", 99_000.0, &[]),
            opportunity("real", 1_000.0, &[TouchpointType::Note]),
        ];
        let summary = build_summary(&results(&opportunities), None);

        assert_eq!(summary.types.len(), 1);
        let note = &summary.types[&TouchpointType::Note];
        assert_eq!(note.total_value, 1_000.0);
        assert!((note.linear - 1_000.0).abs() < SUM_TOLERANCE);
    }

    #[test]
    fn test_model_filter_zeroes_other_columns() {
        let opportunities = [opportunity(
            "filtered",
            10_000.0,
            &[TouchpointType::Call, TouchpointType::Call],
        )];
        let summary = build_summary(&results(&opportunities), Some(ModelKind::TimeDecay));

        let call = &summary.types[&TouchpointType::Call];
        assert!((call.time_decay - 10_000.0).abs() < SUM_TOLERANCE);
        assert_eq!(call.linear, 0.0);
        assert_eq!(call.u_shaped, 0.0);
        assert_eq!(call.w_shaped, 0.0);
        // Count and touched value are unaffected by the filter.
        assert_eq!(call.count, 2);
        assert_eq!(call.total_value, 10_000.0);
    }

    #[test]
    fn test_summary_serializes_keyed_by_type() {
        let opportunities = [opportunity(
            "wire",
            2_000.0,
            &[TouchpointType::Email, TouchpointType::QuoteSent],
        )];
        let summary = build_summary(&results(&opportunities), None);
        let value = serde_json::to_value(&summary).unwrap();

        let email = value.get("EMAIL").expect("EMAIL row");
        assert!(email.get("count").is_some());
        assert!(email.get("totalValue").is_some());
        assert!(email.get("timeDecay").is_some());
        assert!(value.get("QUOTE_SENT").is_some());
    }
}
