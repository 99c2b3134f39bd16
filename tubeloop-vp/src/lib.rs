// Video Player - kiosk playback orchestrator
//
// Drives continuous playback on an unattended display. The policy lives
// server-side in the orchestrator state machine; the kiosk page is a thin
// bridge that hosts the embedded player, receives commands over SSE, and
// posts player events back.

pub mod api;
pub mod client;
pub mod orchestrator;
pub mod player;
pub mod sse;

pub use client::{PdClient, SelectionApi};
pub use orchestrator::{Orchestrator, OrchestratorEvent, OrchestratorHandle, OrchestratorSettings};
pub use player::{BridgePlayer, EmbedPlayer};
pub use sse::KioskBroadcaster;
