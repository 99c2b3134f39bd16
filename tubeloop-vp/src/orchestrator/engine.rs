//! Event loop driving continuous kiosk playback
//!
//! The orchestrator owns all playback policy: when to fetch the next item,
//! when to prefetch the one after it, when to give up on a stuck player.
//! Everything arrives as an [`OrchestratorEvent`] on a single channel, so
//! state transitions never race each other.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use tubeloop_common::clock::Clock;
use tubeloop_common::events::{KioskEvent, PlayerEvent};
use tubeloop_common::model::NextVideo;

use crate::client::SelectionApi;
use crate::player::EmbedPlayer;
use crate::sse::KioskBroadcaster;

use super::state::{KioskState, OrchestratorSettings};

/// Everything the orchestrator reacts to.
///
/// Timer events carry the playing-item generation they were armed for.
/// Cancelling a timer task cannot retract an event it already queued, so
/// the generation tag is what actually prevents a stale delivery from
/// acting on the item loaded after it.
#[derive(Debug, Clone)]
pub enum OrchestratorEvent {
    /// Start the playback loop (sent once at boot).
    Begin,
    /// An event relayed from the embedded player.
    Player(PlayerEvent),
    /// The prefetch timer fired.
    PrefetchDue { epoch: u64 },
    /// The duration poll timer fired.
    DurationPoll { epoch: u64 },
    /// The current item has been playing too long.
    SafetyExpired { epoch: u64 },
    /// A fetch retry is due.
    FetchRetry,
    /// Operator asked to skip the current item.
    Skip,
    /// Tear everything down.
    Shutdown,
}

/// One-shot timer that delivers an event back onto the orchestrator channel.
///
/// Re-arming cancels the previous shot, so each timer has at most one
/// delivery pending.
struct Timer {
    handle: Option<JoinHandle<()>>,
}

impl Timer {
    fn idle() -> Self {
        Self { handle: None }
    }

    fn arm(
        &mut self,
        tx: &UnboundedSender<OrchestratorEvent>,
        delay: Duration,
        event: OrchestratorEvent,
    ) {
        self.cancel();
        let tx = tx.clone();
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(event);
        }));
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Cloneable front door to a running orchestrator.
#[derive(Clone)]
pub struct OrchestratorHandle {
    tx: UnboundedSender<OrchestratorEvent>,
    status: Arc<RwLock<String>>,
}

impl OrchestratorHandle {
    pub fn send(&self, event: OrchestratorEvent) {
        // A closed channel means the loop already shut down
        let _ = self.tx.send(event);
    }

    pub fn begin(&self) {
        self.send(OrchestratorEvent::Begin);
    }

    pub fn skip(&self) {
        self.send(OrchestratorEvent::Skip);
    }

    pub fn player_event(&self, event: PlayerEvent) {
        self.send(OrchestratorEvent::Player(event));
    }

    pub fn shutdown(&self) {
        self.send(OrchestratorEvent::Shutdown);
    }

    /// Latest human-readable status line.
    pub fn status(&self) -> String {
        self.status
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

pub struct Orchestrator {
    player: Arc<dyn EmbedPlayer>,
    selection: Arc<dyn SelectionApi>,
    broadcaster: KioskBroadcaster,
    clock: Arc<dyn Clock>,
    settings: OrchestratorSettings,

    state: KioskState,
    upcoming: Option<NextVideo>,
    last_prefetch_attempt_ms: Option<i64>,
    /// Playing-item generation, incremented on every load. Timer events
    /// tagged with an older value are dropped.
    epoch: u64,

    prefetch_timer: Timer,
    safety_timer: Timer,
    poll_timer: Timer,
    retry_timer: Timer,

    status: Arc<RwLock<String>>,
    tx: UnboundedSender<OrchestratorEvent>,
    rx: UnboundedReceiver<OrchestratorEvent>,
}

impl Orchestrator {
    pub fn new(
        player: Arc<dyn EmbedPlayer>,
        selection: Arc<dyn SelectionApi>,
        broadcaster: KioskBroadcaster,
        clock: Arc<dyn Clock>,
        settings: OrchestratorSettings,
    ) -> (Self, OrchestratorHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let status = Arc::new(RwLock::new("Idle".to_string()));
        let handle = OrchestratorHandle {
            tx: tx.clone(),
            status: Arc::clone(&status),
        };
        let orchestrator = Self {
            player,
            selection,
            broadcaster,
            clock,
            settings,
            state: KioskState::Idle,
            upcoming: None,
            last_prefetch_attempt_ms: None,
            epoch: 0,
            prefetch_timer: Timer::idle(),
            safety_timer: Timer::idle(),
            poll_timer: Timer::idle(),
            retry_timer: Timer::idle(),
            status,
            tx,
            rx,
        };
        (orchestrator, handle)
    }

    /// Run until a `Shutdown` event arrives or every handle is dropped.
    pub async fn run(mut self) {
        info!("playback orchestrator started");
        while let Some(event) = self.rx.recv().await {
            if !self.handle_event(event).await {
                break;
            }
        }
        info!("playback orchestrator stopped");
    }

    /// Returns false once the loop should exit.
    async fn handle_event(&mut self, event: OrchestratorEvent) -> bool {
        debug!(?event, "orchestrator event");
        match event {
            OrchestratorEvent::Begin => self.await_next().await,
            OrchestratorEvent::FetchRetry => {
                if !self.state.is_playing() {
                    self.await_next().await;
                }
            }
            OrchestratorEvent::Player(PlayerEvent::Ready { .. }) => self.on_ready(),
            OrchestratorEvent::Player(PlayerEvent::Playing { .. }) => {
                if self.state.is_playing() {
                    self.schedule_prefetch();
                }
            }
            OrchestratorEvent::Player(PlayerEvent::Ended) => self.on_ended().await,
            OrchestratorEvent::Player(PlayerEvent::PlayerError { code }) => {
                self.on_error(code).await;
            }
            OrchestratorEvent::PrefetchDue { epoch } => {
                if epoch == self.epoch {
                    self.prefetch().await;
                } else {
                    debug!("stale prefetch event dropped");
                }
            }
            OrchestratorEvent::DurationPoll { epoch } => {
                if epoch == self.epoch && self.state.is_playing() && self.upcoming.is_none() {
                    self.schedule_prefetch();
                }
            }
            OrchestratorEvent::SafetyExpired { epoch } => {
                if epoch != self.epoch {
                    debug!("stale safety event dropped");
                } else if let KioskState::Playing { video } = &self.state {
                    warn!(
                        video = %video.video_id,
                        "safety timer expired, forcing a skip"
                    );
                    self.force_skip().await;
                }
            }
            OrchestratorEvent::Skip => {
                if self.state.is_playing() {
                    info!("skip requested");
                    self.force_skip().await;
                }
            }
            OrchestratorEvent::Shutdown => {
                self.clear_video_timers();
                self.retry_timer.cancel();
                self.player.destroy();
                self.set_status("Shutting down");
                return false;
            }
        }
        true
    }

    /// Fetch the next item and start playing it, or schedule a retry.
    async fn await_next(&mut self) {
        self.state = KioskState::AwaitingNext;
        self.set_status("Fetching next video...");
        match self.selection.next_video().await {
            Ok(Some(video)) => self.start_playing(video),
            Ok(None) => {
                let secs = self.settings.retry_interval.as_secs();
                self.set_status(format!("No video available. Retrying in {}s", secs));
                self.retry_timer.arm(
                    &self.tx,
                    self.settings.retry_interval,
                    OrchestratorEvent::FetchRetry,
                );
            }
            Err(e) => {
                warn!("next-video fetch failed: {}", e);
                let secs = self.settings.retry_interval.as_secs();
                self.set_status(format!("Selection failed. Retrying in {}s", secs));
                self.retry_timer.arm(
                    &self.tx,
                    self.settings.retry_interval,
                    OrchestratorEvent::FetchRetry,
                );
            }
        }
    }

    fn start_playing(&mut self, video: NextVideo) {
        self.clear_video_timers();
        self.epoch = self.epoch.wrapping_add(1);
        info!(video = %video.video_id, title = %video.title, "loading video");
        self.set_status(format!("Loading: {}", video.title));
        self.broadcaster.send(KioskEvent::NowPlaying {
            video_id: video.video_id.clone(),
            title: video.title.clone(),
        });
        self.player.load(&video);
        self.state = KioskState::Playing { video };
    }

    /// The player reported the item is cued up and starting.
    fn on_ready(&mut self) {
        let title = match &self.state {
            KioskState::Playing { video } => video.title.clone(),
            _ => return,
        };
        self.set_status(format!("Playing: {}", title));
        self.safety_timer.arm(
            &self.tx,
            self.settings.max_video_duration,
            OrchestratorEvent::SafetyExpired { epoch: self.epoch },
        );
        self.schedule_prefetch();
    }

    /// Decide when the upcoming slot should be filled for the current item.
    fn schedule_prefetch(&mut self) {
        if self.upcoming.is_some() {
            self.prefetch_timer.cancel();
            self.poll_timer.cancel();
            return;
        }
        let lead = self.settings.preload_lead_secs as f64;
        match self.player.duration() {
            None => {
                // No duration yet (metadata pending or a live stream);
                // check again shortly
                self.poll_timer.arm(
                    &self.tx,
                    self.settings.duration_poll,
                    OrchestratorEvent::DurationPoll { epoch: self.epoch },
                );
            }
            Some(duration) if duration <= lead + 1.0 => {
                self.prefetch_timer.arm(
                    &self.tx,
                    self.settings.short_item_fire,
                    OrchestratorEvent::PrefetchDue { epoch: self.epoch },
                );
            }
            Some(duration) => {
                let delay = Duration::from_secs_f64(duration - lead)
                    .max(self.settings.min_fire);
                self.prefetch_timer.arm(
                    &self.tx,
                    delay,
                    OrchestratorEvent::PrefetchDue { epoch: self.epoch },
                );
            }
        }
    }

    /// Fill the upcoming slot. Attempts inside the debounce window are
    /// dropped outright, not queued.
    async fn prefetch(&mut self) {
        let now = self.clock.now_ms();
        if let Some(last) = self.last_prefetch_attempt_ms {
            if now - last < self.settings.prefetch_debounce_ms {
                debug!("prefetch attempt inside debounce window, dropped");
                return;
            }
        }

        // No-op attempts (slot full, nothing playing) must not restart
        // the debounce window
        if self.upcoming.is_some() {
            return;
        }
        let current_id = match self.state.current_video_id() {
            Some(id) => id.to_string(),
            None => return,
        };
        self.last_prefetch_attempt_ms = Some(now);

        match self.selection.next_video().await {
            Ok(Some(next)) if next.video_id != current_id => {
                info!(video = %next.video_id, "prefetched upcoming video");
                self.set_status(format!("Up next: {}", next.title));
                self.upcoming = Some(next);
            }
            Ok(Some(_)) => {
                // Selection handed back the item already on screen; ask
                // again once the debounce window has passed
                debug!("prefetch returned the current video, retrying");
                self.prefetch_timer.arm(
                    &self.tx,
                    Duration::from_millis(self.settings.prefetch_debounce_ms as u64),
                    OrchestratorEvent::PrefetchDue { epoch: self.epoch },
                );
            }
            Ok(None) => {
                let secs = self.settings.retry_interval.as_secs();
                self.set_status(format!("Nothing to prefetch. Retrying in {}s", secs));
                self.prefetch_timer.arm(
                    &self.tx,
                    self.settings.retry_interval,
                    OrchestratorEvent::PrefetchDue { epoch: self.epoch },
                );
            }
            Err(e) => {
                warn!("prefetch failed: {}", e);
                let secs = self.settings.retry_interval.as_secs();
                self.set_status(format!("Prefetch failed. Retrying in {}s", secs));
                self.prefetch_timer.arm(
                    &self.tx,
                    self.settings.retry_interval,
                    OrchestratorEvent::PrefetchDue { epoch: self.epoch },
                );
            }
        }
    }

    /// Natural end of the current item.
    async fn on_ended(&mut self) {
        let video = match std::mem::replace(&mut self.state, KioskState::Idle) {
            KioskState::Playing { video } => video,
            other => {
                self.state = other;
                return;
            }
        };
        info!(video = %video.video_id, "video ended");
        self.clear_video_timers();
        self.mark_played(&video.video_id).await;
        self.advance().await;
    }

    /// The embed player faulted on the current item.
    ///
    /// The item is NOT marked played: an embed error says nothing about
    /// whether anyone watched it, and it stays eligible for later picks.
    async fn on_error(&mut self, code: Option<i32>) {
        let video = match std::mem::replace(&mut self.state, KioskState::Idle) {
            KioskState::Playing { video } => video,
            other => {
                self.state = other;
                return;
            }
        };
        warn!(video = %video.video_id, ?code, "embed player error");
        self.set_status(format!("Player error on: {}", video.title));
        self.clear_video_timers();
        self.player.destroy();
        self.advance().await;
    }

    /// Forcibly end the current item (operator skip or safety expiry).
    /// A forced skip counts as played so the item is not picked again soon.
    async fn force_skip(&mut self) {
        let video = match std::mem::replace(&mut self.state, KioskState::Idle) {
            KioskState::Playing { video } => video,
            other => {
                self.state = other;
                return;
            }
        };
        self.clear_video_timers();
        self.player.stop();
        self.player.destroy();
        self.mark_played(&video.video_id).await;
        self.advance().await;
    }

    /// Move to the next item, consuming the upcoming slot if it is filled.
    async fn advance(&mut self) {
        if let Some(next) = self.upcoming.take() {
            self.start_playing(next);
        } else {
            self.await_next().await;
        }
    }

    async fn mark_played(&self, video_id: &str) {
        if let Err(e) = self.selection.mark_played(video_id).await {
            // History is best-effort; losing one mark only risks an
            // early repeat
            warn!(video = %video_id, "failed to report played: {}", e);
        }
    }

    fn clear_video_timers(&mut self) {
        self.prefetch_timer.cancel();
        self.safety_timer.cancel();
        self.poll_timer.cancel();
    }

    fn set_status(&self, message: impl Into<String>) {
        let message = message.into();
        debug!(status = %message);
        if let Ok(mut guard) = self.status.write() {
            *guard = message.clone();
        }
        self.broadcaster.send(KioskEvent::Status { message });
    }
}
