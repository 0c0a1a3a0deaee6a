//! Touchpoint collection — the read contract against the pipeline record
//! store.

use async_trait::async_trait;
use dealtrace_core::error::StoreError;
use dealtrace_core::types::{DateRange, Opportunity};
use uuid::Uuid;

/// Read-side capability contract for the opportunity/touchpoint store.
///
/// Implementations return the caller's already-scoped visible set; the
/// attribution core performs no authorization logic of its own, and never
/// probes for schema availability: a call either yields data or a typed
/// `StoreError`.
#[async_trait]
pub trait OpportunityStore: Send + Sync + 'static {
    /// Ids of every visible opportunity.
    async fn opportunity_ids(&self) -> Result<Vec<Uuid>, StoreError>;

    /// Fetch one opportunity with its touchpoints filtered to the inclusive
    /// date range. Filtering away every touchpoint yields an opportunity
    /// with an empty list, not an error: it stays enumerable, it just earns
    /// no credit.
    async fn fetch_opportunity(
        &self,
        id: Uuid,
        range: &DateRange,
    ) -> Result<Opportunity, StoreError>;
}
