//! Playback orchestrator behavior tests
//!
//! All tests run on a paused tokio clock so the prefetch, retry, and
//! safety timers can be driven deterministically. The wall clock used for
//! prefetch debouncing is a ManualClock advanced by hand.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use tubeloop_common::clock::ManualClock;
use tubeloop_common::events::PlayerEvent;
use tubeloop_common::model::NextVideo;
use tubeloop_common::{Error, Result};
use tubeloop_vp::orchestrator::OrchestratorEvent;
use tubeloop_vp::{
    EmbedPlayer, KioskBroadcaster, Orchestrator, OrchestratorHandle, OrchestratorSettings,
    SelectionApi,
};

const NOW_MS: i64 = 1_700_000_000_000;

fn nv(id: &str) -> NextVideo {
    NextVideo {
        video_id: id.to_string(),
        title: format!("Video {}", id),
        channel_id: "UCtest".to_string(),
        published: None,
        duration_seconds: Some(120),
        view_count: None,
        embeddable: Some(true),
    }
}

#[derive(Default)]
struct FakePlayer {
    loads: Mutex<Vec<String>>,
    stops: AtomicUsize,
    destroys: AtomicUsize,
    duration: Mutex<Option<f64>>,
}

impl FakePlayer {
    fn set_duration(&self, seconds: Option<f64>) {
        if let Ok(mut guard) = self.duration.lock() {
            *guard = seconds;
        }
    }

    fn loads(&self) -> Vec<String> {
        self.loads.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

impl EmbedPlayer for FakePlayer {
    fn load(&self, video: &NextVideo) {
        if let Ok(mut guard) = self.loads.lock() {
            guard.push(video.video_id.clone());
        }
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn destroy(&self) {
        self.destroys.fetch_add(1, Ordering::SeqCst);
    }

    fn duration(&self) -> Option<f64> {
        self.duration.lock().ok().and_then(|g| *g)
    }
}

struct FakeSelection {
    responses: Mutex<VecDeque<Option<NextVideo>>>,
    next_calls: AtomicUsize,
    failing: AtomicBool,
    played: Mutex<Vec<String>>,
}

impl FakeSelection {
    fn new(responses: Vec<Option<NextVideo>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            next_calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            played: Mutex::new(Vec::new()),
        }
    }

    fn next_calls(&self) -> usize {
        self.next_calls.load(Ordering::SeqCst)
    }

    fn played(&self) -> Vec<String> {
        self.played.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SelectionApi for FakeSelection {
    async fn next_video(&self) -> Result<Option<NextVideo>> {
        self.next_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Http("program director unreachable".to_string()));
        }
        let next = self
            .responses
            .lock()
            .map_err(|_| Error::Internal("lock poisoned".to_string()))?
            .pop_front()
            .flatten();
        Ok(next)
    }

    async fn mark_played(&self, video_id: &str) -> Result<()> {
        self.played
            .lock()
            .map_err(|_| Error::Internal("lock poisoned".to_string()))?
            .push(video_id.to_string());
        Ok(())
    }
}

struct Kiosk {
    handle: OrchestratorHandle,
    player: Arc<FakePlayer>,
    selection: Arc<FakeSelection>,
    clock: Arc<ManualClock>,
}

fn spawn_kiosk(responses: Vec<Option<NextVideo>>) -> Kiosk {
    let player = Arc::new(FakePlayer::default());
    let selection = Arc::new(FakeSelection::new(responses));
    let clock = Arc::new(ManualClock::new(NOW_MS));
    let (orchestrator, handle) = Orchestrator::new(
        Arc::clone(&player) as Arc<dyn EmbedPlayer>,
        Arc::clone(&selection) as Arc<dyn SelectionApi>,
        KioskBroadcaster::new(16),
        Arc::clone(&clock) as Arc<dyn tubeloop_common::clock::Clock>,
        OrchestratorSettings::default(),
    );
    tokio::spawn(orchestrator.run());
    Kiosk {
        handle,
        player,
        selection,
        clock,
    }
}

/// Let queued events drain without advancing the paused clock.
async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn plays_first_video_and_marks_it_on_end() {
    let kiosk = spawn_kiosk(vec![Some(nv("aaa")), Some(nv("bbb"))]);
    kiosk.handle.begin();
    settle().await;

    assert_eq!(kiosk.player.loads(), vec!["aaa"]);

    kiosk.player.set_duration(Some(120.0));
    kiosk.handle.player_event(PlayerEvent::Ready {
        duration: Some(120.0),
    });
    settle().await;
    assert!(kiosk.handle.status().contains("Playing"));

    kiosk.handle.player_event(PlayerEvent::Ended);
    settle().await;

    assert_eq!(kiosk.selection.played(), vec!["aaa"]);
    assert_eq!(kiosk.player.loads(), vec!["aaa", "bbb"]);
}

#[tokio::test(start_paused = true)]
async fn prefetch_attempts_inside_the_debounce_window_are_dropped() {
    let kiosk = spawn_kiosk(vec![Some(nv("aaa"))]);
    kiosk.handle.begin();
    settle().await;
    assert_eq!(kiosk.selection.next_calls(), 1);

    // Two due events at the same wall-clock instant: only the first may
    // reach selection
    kiosk.handle.send(OrchestratorEvent::PrefetchDue { epoch: 1 });
    kiosk.handle.send(OrchestratorEvent::PrefetchDue { epoch: 1 });
    settle().await;
    assert_eq!(kiosk.selection.next_calls(), 2);

    // Once the window passes, the next attempt goes through
    kiosk.clock.advance(2001);
    kiosk.handle.send(OrchestratorEvent::PrefetchDue { epoch: 1 });
    settle().await;
    assert_eq!(kiosk.selection.next_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn upcoming_video_is_consumed_without_a_fresh_fetch() {
    let kiosk = spawn_kiosk(vec![Some(nv("aaa")), Some(nv("bbb"))]);
    kiosk.handle.begin();
    settle().await;

    kiosk.player.set_duration(Some(100.0));
    kiosk.handle.player_event(PlayerEvent::Ready {
        duration: Some(100.0),
    });
    settle().await;

    kiosk.handle.send(OrchestratorEvent::PrefetchDue { epoch: 1 });
    settle().await;
    assert_eq!(kiosk.selection.next_calls(), 2);
    assert!(kiosk.handle.status().contains("Up next"));

    // A second prefetch with the slot filled never reaches selection
    kiosk.clock.advance(5000);
    kiosk.handle.send(OrchestratorEvent::PrefetchDue { epoch: 1 });
    settle().await;
    assert_eq!(kiosk.selection.next_calls(), 2);

    kiosk.handle.player_event(PlayerEvent::Ended);
    settle().await;

    // The ended item is recorded and the slot plays with no extra fetch
    assert_eq!(kiosk.selection.played(), vec!["aaa"]);
    assert_eq!(kiosk.player.loads(), vec!["aaa", "bbb"]);
    assert_eq!(kiosk.selection.next_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn player_error_advances_without_marking_played() {
    let kiosk = spawn_kiosk(vec![Some(nv("aaa")), Some(nv("bbb"))]);
    kiosk.handle.begin();
    settle().await;

    kiosk.handle.player_event(PlayerEvent::PlayerError { code: Some(101) });
    settle().await;

    // The faulted item stays out of history and the player was rebuilt
    assert!(kiosk.selection.played().is_empty());
    assert!(kiosk.player.destroys.load(Ordering::SeqCst) >= 1);
    assert_eq!(kiosk.player.loads(), vec!["aaa", "bbb"]);
}

#[tokio::test(start_paused = true)]
async fn safety_timer_forces_a_skip_and_marks_played() {
    let kiosk = spawn_kiosk(vec![Some(nv("aaa")), None]);
    kiosk.handle.begin();
    settle().await;

    // No duration reported, so only the poll and safety timers are armed
    kiosk.handle.player_event(PlayerEvent::Ready { duration: None });
    settle().await;

    tokio::time::advance(Duration::from_secs(300)).await;
    settle().await;

    assert!(kiosk.player.stops.load(Ordering::SeqCst) >= 1);
    assert!(kiosk.player.destroys.load(Ordering::SeqCst) >= 1);
    assert_eq!(kiosk.selection.played(), vec!["aaa"]);
}

#[tokio::test(start_paused = true)]
async fn short_item_prefetches_right_away() {
    let kiosk = spawn_kiosk(vec![Some(nv("aaa")), Some(nv("bbb"))]);
    kiosk.handle.begin();
    settle().await;

    kiosk.player.set_duration(Some(5.0));
    kiosk.handle.player_event(PlayerEvent::Ready { duration: Some(5.0) });
    settle().await;
    assert_eq!(kiosk.selection.next_calls(), 1);

    // 5s is inside the preload lead, so the prefetch fires at the short
    // fuse rather than duration minus lead
    tokio::time::advance(Duration::from_millis(500)).await;
    settle().await;
    assert_eq!(kiosk.selection.next_calls(), 2);
    assert!(kiosk.handle.status().contains("Up next"));
}

#[tokio::test(start_paused = true)]
async fn empty_pool_schedules_a_fetch_retry() {
    let kiosk = spawn_kiosk(vec![None, Some(nv("aaa"))]);
    kiosk.handle.begin();
    settle().await;

    assert!(kiosk.player.loads().is_empty());
    assert!(kiosk.handle.status().contains("Retrying"));

    tokio::time::advance(Duration::from_secs(10)).await;
    settle().await;
    assert_eq!(kiosk.player.loads(), vec!["aaa"]);
}

#[tokio::test(start_paused = true)]
async fn selection_failure_schedules_a_fetch_retry() {
    let kiosk = spawn_kiosk(vec![Some(nv("aaa"))]);
    kiosk.selection.failing.store(true, Ordering::SeqCst);
    kiosk.handle.begin();
    settle().await;

    assert!(kiosk.player.loads().is_empty());
    assert!(kiosk.handle.status().contains("Retrying"));

    kiosk.selection.failing.store(false, Ordering::SeqCst);
    tokio::time::advance(Duration::from_secs(10)).await;
    settle().await;
    assert_eq!(kiosk.player.loads(), vec!["aaa"]);
}

#[tokio::test(start_paused = true)]
async fn prefetch_of_the_current_video_is_retried() {
    let kiosk = spawn_kiosk(vec![Some(nv("aaa")), Some(nv("aaa")), Some(nv("bbb"))]);
    kiosk.handle.begin();
    settle().await;

    kiosk.handle.send(OrchestratorEvent::PrefetchDue { epoch: 1 });
    settle().await;
    // Selection handed back the on-screen item; the slot stays empty
    assert_eq!(kiosk.selection.next_calls(), 2);
    assert!(!kiosk.handle.status().contains("Up next"));

    kiosk.clock.advance(2500);
    tokio::time::advance(Duration::from_millis(2000)).await;
    settle().await;
    assert_eq!(kiosk.selection.next_calls(), 3);
    assert!(kiosk.handle.status().contains("Up next"));
}

#[tokio::test(start_paused = true)]
async fn stale_safety_event_does_not_skip_the_next_video() {
    let kiosk = spawn_kiosk(vec![Some(nv("aaa")), Some(nv("bbb"))]);
    kiosk.handle.begin();
    settle().await;

    kiosk.player.set_duration(Some(100.0));
    kiosk.handle.player_event(PlayerEvent::Ready {
        duration: Some(100.0),
    });
    settle().await;

    kiosk.handle.send(OrchestratorEvent::PrefetchDue { epoch: 1 });
    settle().await;
    assert!(kiosk.handle.status().contains("Up next"));

    // The safety timer for "aaa" delivers in the same instant "aaa" ends:
    // the queued event must not act on "bbb", which starts in between
    kiosk.handle.player_event(PlayerEvent::Ended);
    kiosk.handle.send(OrchestratorEvent::SafetyExpired { epoch: 1 });
    settle().await;

    assert_eq!(kiosk.selection.played(), vec!["aaa"]);
    assert_eq!(kiosk.player.loads(), vec!["aaa", "bbb"]);
    assert_eq!(kiosk.player.stops.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn full_slot_attempt_leaves_the_debounce_window_alone() {
    let kiosk = spawn_kiosk(vec![Some(nv("aaa")), Some(nv("bbb")), Some(nv("ccc"))]);
    kiosk.handle.begin();
    settle().await;

    kiosk.handle.send(OrchestratorEvent::PrefetchDue { epoch: 1 });
    settle().await;
    assert_eq!(kiosk.selection.next_calls(), 2);

    // Slot is full: this attempt is a no-op and must not count as one for
    // debouncing purposes
    kiosk.clock.advance(2001);
    kiosk.handle.send(OrchestratorEvent::PrefetchDue { epoch: 1 });
    settle().await;
    assert_eq!(kiosk.selection.next_calls(), 2);

    // "bbb" starts; its first prefetch is already outside the window that
    // the real attempt opened, so it goes straight through
    kiosk.handle.player_event(PlayerEvent::Ended);
    settle().await;
    kiosk.handle.send(OrchestratorEvent::PrefetchDue { epoch: 2 });
    settle().await;
    assert_eq!(kiosk.selection.next_calls(), 3);
    assert!(kiosk.handle.status().contains("Up next"));
}

#[tokio::test(start_paused = true)]
async fn operator_skip_marks_played_and_advances() {
    let kiosk = spawn_kiosk(vec![Some(nv("aaa")), Some(nv("bbb"))]);
    kiosk.handle.begin();
    settle().await;

    kiosk.handle.skip();
    settle().await;

    assert_eq!(kiosk.selection.played(), vec!["aaa"]);
    assert!(kiosk.player.stops.load(Ordering::SeqCst) >= 1);
    assert_eq!(kiosk.player.loads(), vec!["aaa", "bbb"]);
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_pending_timers() {
    let kiosk = spawn_kiosk(vec![Some(nv("aaa")), Some(nv("bbb"))]);
    kiosk.handle.begin();
    settle().await;

    kiosk.player.set_duration(Some(60.0));
    kiosk.handle.player_event(PlayerEvent::Ready {
        duration: Some(60.0),
    });
    settle().await;

    kiosk.handle.shutdown();
    settle().await;
    assert!(kiosk.player.destroys.load(Ordering::SeqCst) >= 1);

    // Neither the prefetch timer (52s out) nor the safety timer fires
    tokio::time::advance(Duration::from_secs(600)).await;
    settle().await;
    assert_eq!(kiosk.selection.next_calls(), 1);
    assert_eq!(kiosk.selection.played(), Vec::<String>::new());
}
