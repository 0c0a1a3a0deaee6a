//! Attribution engine — concurrent per-opportunity collection, detail
//! assembly, and summary rollup.

use std::sync::Arc;

use dealtrace_core::config::AttributionConfig;
use dealtrace_core::error::DealTraceError;
use dealtrace_core::types::DateRange;
use tokio::task::JoinSet;
use tracing::warn;

use crate::collector::OpportunityStore;
use crate::models::ModelKind;
use crate::opportunity::{build_attribution_result, AttributionResult};
use crate::summary::{build_summary, AttributionSummary};

/// Stateless computation front for the attribution core. Every request is
/// computed fresh from immutable snapshots fetched through the store.
pub struct AttributionEngine {
    store: Arc<dyn OpportunityStore>,
    half_life_days: f64,
}

impl AttributionEngine {
    pub fn new(store: Arc<dyn OpportunityStore>, config: &AttributionConfig) -> Self {
        Self {
            store,
            half_life_days: config.half_life_days,
        }
    }

    /// Detail mode: one `AttributionResult` per visible opportunity.
    ///
    /// Fetches run as one task per opportunity with no ordering requirement.
    /// A slow or failed fetch excludes that opportunity and never aborts or
    /// corrupts the rest of the batch.
    pub async fn detail(&self, range: DateRange) -> Result<Vec<AttributionResult>, DealTraceError> {
        let ids = self.store.opportunity_ids().await?;

        let mut tasks = JoinSet::new();
        for id in ids {
            let store = Arc::clone(&self.store);
            tasks.spawn(async move { (id, store.fetch_opportunity(id, &range).await) });
        }

        let mut results = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(opportunity))) => {
                    results.push(build_attribution_result(&opportunity, self.half_life_days));
                }
                Ok((id, Err(e))) => {
                    warn!(opportunity_id = %id, error = %e, "Excluding opportunity from attribution batch");
                    metrics::counter!("attribution.opportunities_excluded").increment(1);
                }
                Err(e) => {
                    warn!(error = %e, "Attribution fetch task panicked or was cancelled");
                    metrics::counter!("attribution.opportunities_excluded").increment(1);
                }
            }
        }

        // Gathering is unordered; sort for a deterministic response.
        results.sort_by(|a, b| {
            b.total_value
                .partial_cmp(&a.total_value)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.opportunity_name.cmp(&b.opportunity_name))
        });
        Ok(results)
    }

    /// Summary mode: detail results folded into per-type rollups through a
    /// single sequential pass.
    pub async fn summary(
        &self,
        range: DateRange,
        model_filter: Option<ModelKind>,
    ) -> Result<AttributionSummary, DealTraceError> {
        let results = self.detail(range).await?;
        Ok(build_summary(&results, model_filter))
    }
}
