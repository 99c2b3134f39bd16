//! HTTP API for the program director

pub mod handlers;
pub mod server;
