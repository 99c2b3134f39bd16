//! Shared types and utilities for the tubeloop kiosk services
//!
//! Used by both the program director (`tubeloop-pd`, video selection) and
//! the video player (`tubeloop-vp`, playback orchestration). Holds the
//! error type, the data model, the persisted document store, and the event
//! types exchanged with the kiosk display page.

pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod history;
pub mod model;
pub mod storage;

pub use error::{Error, Result};
