//! Program Director (tubeloop-pd) library
//!
//! Video selection service for the tubeloop kiosk: aggregates candidates
//! from the configured channels through a provider fallback chain, applies
//! the eligibility filter pipeline, and serves one weighted-random choice
//! per request over HTTP.

pub mod api;
pub mod providers;
pub mod selector;

pub use api::server::{build_router, AppContext};
pub use selector::engine::SelectionEngine;
