//! DealTrace API server — the HTTP boundary over the attribution core.

pub mod auth;
pub mod rest;
pub mod server;

pub use server::ApiServer;
