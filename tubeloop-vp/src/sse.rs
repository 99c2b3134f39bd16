//! SSE broadcaster carrying player commands to the kiosk page

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};

use tubeloop_common::events::KioskEvent;

/// Fans kiosk commands out to every connected page.
///
/// Sends are lossy: a kiosk with no page attached (or a page that lagged
/// behind the buffer) simply misses the event, and the page resynchronizes
/// from `/status` when it reconnects.
#[derive(Clone)]
pub struct KioskBroadcaster {
    tx: broadcast::Sender<KioskEvent>,
}

impl KioskBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        info!("kiosk broadcaster initialized with capacity {}", capacity);
        Self { tx }
    }

    /// Broadcast an event, ignoring if no pages are connected
    pub fn send(&self, event: KioskEvent) {
        let _ = self.tx.send(event);
    }

    /// Get current number of connected pages
    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Create an SSE stream for a newly connected page
    pub fn subscribe_stream(&self) -> impl Stream<Item = Result<Event, Infallible>> {
        let rx = self.tx.subscribe();
        let stream = BroadcastStream::new(rx);

        stream.filter_map(|result| async move {
            match result {
                Ok(kiosk_event) => {
                    let event = Event::default().json_data(&kiosk_event).ok();
                    event.map(Ok)
                }
                Err(e) => {
                    // BroadcastStream wraps RecvError, just log and continue
                    warn!("kiosk SSE client error: {:?}", e);
                    None
                }
            }
        })
    }

    /// Handler body for GET /events
    pub fn handle_sse_connection(&self) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
        info!(
            "kiosk page connected, total clients: {}",
            self.client_count()
        );

        Sse::new(self.subscribe_stream()).keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(30))
                .text("keep-alive"),
        )
    }
}
