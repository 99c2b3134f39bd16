//! HTTP API and kiosk page serving

mod handlers;
mod server;

pub use server::{build_router, run, AppContext};
