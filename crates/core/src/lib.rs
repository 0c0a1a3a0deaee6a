pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{DealTraceError, DealTraceResult, StoreError};
pub use types::{DateRange, Opportunity, Touchpoint, TouchpointType};
