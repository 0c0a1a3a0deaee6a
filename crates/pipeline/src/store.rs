//! In-memory pipeline store backed by DashMap.
//!
//! Production: replace with the tenant-scoped CRM read API behind the same
//! `OpportunityStore` trait. This provides the same surface for development
//! and testing.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use dealtrace_attribution::OpportunityStore;
use dealtrace_core::error::StoreError;
use dealtrace_core::types::{DateRange, Opportunity, Touchpoint, TouchpointType};
use tracing::info;
use uuid::Uuid;

/// Thread-safe in-memory store of opportunities and their touchpoints.
pub struct PipelineStore {
    opportunities: DashMap<Uuid, Opportunity>,
}

impl PipelineStore {
    pub fn new() -> Self {
        Self {
            opportunities: DashMap::new(),
        }
    }

    /// A store pre-populated with demo opportunities for development.
    pub fn with_demo_data() -> Self {
        let store = Self::new();
        store.seed_demo_data();
        info!(
            opportunities = store.opportunities.len(),
            "Pipeline store initialized (in-memory, development mode)"
        );
        store
    }

    /// Record an opportunity. Touchpoints are kept in recorded order;
    /// sorting is the aggregator's concern.
    pub fn insert_opportunity(&self, opportunity: Opportunity) {
        self.opportunities.insert(opportunity.id, opportunity);
    }

    /// Append a touchpoint to an existing opportunity.
    pub fn record_touchpoint(&self, touchpoint: Touchpoint) -> Result<(), StoreError> {
        let mut entry = self
            .opportunities
            .get_mut(&touchpoint.opportunity_id)
            .ok_or(StoreError::NotFound(touchpoint.opportunity_id))?;
        entry.value_mut().touchpoints.push(touchpoint);
        Ok(())
    }

    pub fn opportunity_count(&self) -> usize {
        self.opportunities.len()
    }

    // ─── Demo Data ─────────────────────────────────────────────────────────

    fn seed_demo_data(&self) {
        let anchor = Utc::now();
        let deals: [(&str, f64, &[(TouchpointType, i64, &str)]); 5] = [
            (
                "Northwind Analytics - Enterprise",
                120_000.0,
                &[
                    (TouchpointType::Email, 42, "Outbound intro to VP Data"),
                    (TouchpointType::Call, 38, "Discovery call"),
                    (TouchpointType::Meeting, 30, "Technical deep dive"),
                    (TouchpointType::Demo, 21, "Platform demo for analysts"),
                    (TouchpointType::QuoteSent, 9, "Enterprise tier quote"),
                    (TouchpointType::Call, 3, "Procurement follow-up"),
                ],
            ),
            (
                "Fabrikam Renewal FY24",
                45_000.0,
                &[
                    (TouchpointType::Email, 25, "Renewal notice"),
                    (TouchpointType::Meeting, 14, "QBR with champion"),
                    (TouchpointType::QuoteSent, 6, "Renewal quote, 3-year term"),
                ],
            ),
            (
                "Contoso Pilot Expansion",
                68_000.0,
                &[
                    (TouchpointType::Call, 55, "Pilot kickoff"),
                    (TouchpointType::Task, 47, "Sandbox provisioning"),
                    (TouchpointType::Note, 40, "Champion moved to new org"),
                    (TouchpointType::Meeting, 28, "Expansion scoping"),
                    (TouchpointType::Demo, 16, "Rollout walkthrough"),
                    (TouchpointType::QuoteSent, 8, "Expansion quote"),
                    (TouchpointType::Call, 2, "Verbal commit"),
                ],
            ),
            (
                "Tailspin Starter",
                9_500.0,
                &[
                    (TouchpointType::Email, 12, "Inbound trial signup"),
                    (TouchpointType::Call, 5, "Trial check-in"),
                ],
            ),
            // Dormant deal: no recent touchpoints, enumerable but earns no
            // credit inside typical query windows.
            (
                "Wingtip Toys - Stalled",
                15_000.0,
                &[(TouchpointType::Email, 200, "Last contact before freeze")],
            ),
        ];

        for (name, value, touches) in deals {
            let id = Uuid::new_v4();
            let touchpoints = touches
                .iter()
                .map(|(touchpoint_type, days_ago, description)| Touchpoint {
                    id: Uuid::new_v4(),
                    opportunity_id: id,
                    touchpoint_type: *touchpoint_type,
                    timestamp: anchor - Duration::days(*days_ago),
                    description: (*description).to_string(),
                })
                .collect();
            self.opportunities.insert(
                id,
                Opportunity {
                    id,
                    name: name.to_string(),
                    total_value: value,
                    touchpoints,
                },
            );
        }
    }
}

impl Default for PipelineStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OpportunityStore for PipelineStore {
    async fn opportunity_ids(&self) -> Result<Vec<Uuid>, StoreError> {
        Ok(self.opportunities.iter().map(|r| *r.key()).collect())
    }

    async fn fetch_opportunity(
        &self,
        id: Uuid,
        range: &DateRange,
    ) -> Result<Opportunity, StoreError> {
        let mut opportunity = self
            .opportunities
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or(StoreError::NotFound(id))?;
        opportunity
            .touchpoints
            .retain(|t| range.contains(t.timestamp));
        Ok(opportunity)
    }
}
