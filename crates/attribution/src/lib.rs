//! Multi-touch revenue attribution — the model library, per-opportunity
//! result assembly, and cross-opportunity summary rollups.

pub mod collector;
pub mod engine;
pub mod models;
pub mod opportunity;
pub mod summary;

pub use collector::OpportunityStore;
pub use engine::AttributionEngine;
pub use models::{CreditMap, ModelKind};
pub use opportunity::{build_attribution_result, AttributionResult, ModelBreakdown};
pub use summary::{build_summary, AttributionSummary, TypeRollup};
