use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DealTraceError;

/// Kind of recorded interaction against an opportunity.
///
/// `Ord` so summary rows keyed by type serialize in a stable order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TouchpointType {
    Email,
    Call,
    Meeting,
    Task,
    Note,
    QuoteSent,
    Demo,
}

/// A single recorded interaction with a sales opportunity.
/// Immutable once recorded; ordered by `timestamp`, ties broken by the
/// order the store returned them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Touchpoint {
    pub id: Uuid,
    pub opportunity_id: Uuid,
    #[serde(rename = "type")]
    pub touchpoint_type: TouchpointType,
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

/// A sales opportunity and the touchpoints recorded against it.
/// `total_value` is the monetized credit pool the models distribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: Uuid,
    pub name: String,
    pub total_value: f64,
    pub touchpoints: Vec<Touchpoint>,
}

/// Inclusive date window over which touchpoints are considered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Build a range from ISO calendar dates, spanning start-of-day to
    /// end-of-day UTC. Rejects unparsable dates and `start > end` before
    /// any fetch happens.
    pub fn from_iso_dates(start: &str, end: &str) -> Result<Self, DealTraceError> {
        let start_date = parse_iso_date(start)?;
        let end_date = parse_iso_date(end)?;
        if start_date > end_date {
            return Err(DealTraceError::InvalidRange(format!(
                "startDate {} is after endDate {}",
                start, end
            )));
        }
        let start = start_date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| DealTraceError::InvalidRange(format!("invalid start date: {}", start)))?
            .and_utc();
        let end = end_date
            .and_hms_opt(23, 59, 59)
            .ok_or_else(|| DealTraceError::InvalidRange(format!("invalid end date: {}", end)))?
            .and_utc();
        Ok(Self { start, end })
    }

    /// Inclusive at both endpoints.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }
}

fn parse_iso_date(raw: &str) -> Result<NaiveDate, DealTraceError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| DealTraceError::InvalidRange(format!("unparsable date '{}': {}", raw, e)))
}
