//! Selection engine: candidate aggregation, filtering, and weighted choice

pub mod cache;
pub mod engine;
pub mod filter;

pub use cache::CandidateCache;
pub use engine::SelectionEngine;
