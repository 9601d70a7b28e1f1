//! Reading sessions
//!
//! A reading session drives one [`ScrollController`] for a song opened in
//! full-screen reading view. While scrolling, a ticker task runs one frame
//! per display refresh and publishes the resulting offset on a watch
//! channel, which the SSE endpoint forwards to the client.
//!
//! Every state change cancels the running ticker first.

use capo_common::autoscroll::{
    FrameHandle, FrameOutcome, ScrollController, ScrollSnapshot, StartOutcome, ToggleOutcome,
};
use capo_common::time::millis_since;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex, RwLock};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

/// ~60 Hz
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReadingStatus {
    Paused,
    Scrolling,
    /// End reached; the view returns to static display
    Finished,
    Closed,
}

/// One message on a session's update channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingUpdate {
    pub status: ReadingStatus,
    #[serde(flatten)]
    pub snapshot: ScrollSnapshot,
}

pub struct ReadingSession {
    pub id: Uuid,
    pub song_id: Uuid,
    pub owner_id: Uuid,
    origin: Instant,
    controller: Arc<Mutex<ScrollController>>,
    ticker: Mutex<Option<CancellationToken>>,
    updates: Arc<watch::Sender<ReadingUpdate>>,
}

impl ReadingSession {
    pub fn new(owner_id: Uuid, song_id: Uuid, max_offset: f64, tempo: u32) -> Self {
        let controller = ScrollController::new(max_offset, tempo);
        let (updates, _) = watch::channel(ReadingUpdate {
            status: ReadingStatus::Paused,
            snapshot: controller.snapshot(),
        });

        Self {
            id: Uuid::new_v4(),
            song_id,
            owner_id,
            origin: Instant::now(),
            controller: Arc::new(Mutex::new(controller)),
            ticker: Mutex::new(None),
            updates: Arc::new(updates),
        }
    }

    fn now(&self) -> f64 {
        millis_since(self.origin)
    }

    pub fn subscribe(&self) -> watch::Receiver<ReadingUpdate> {
        self.updates.subscribe()
    }

    /// Latest published update
    pub fn current(&self) -> ReadingUpdate {
        *self.updates.borrow()
    }

    fn publish(&self, status: ReadingStatus, snapshot: ScrollSnapshot) -> ReadingUpdate {
        let update = ReadingUpdate { status, snapshot };
        self.updates.send_replace(update);
        update
    }

    /// Play/pause
    pub async fn toggle(&self) -> ReadingUpdate {
        let mut ticker = self.ticker.lock().await;
        stop_ticker(&mut ticker);

        let mut controller = self.controller.lock().await;
        let status = match controller.toggle(self.now()) {
            ToggleOutcome::Paused => ReadingStatus::Paused,
            ToggleOutcome::Resumed(handle) => {
                *ticker = Some(self.spawn_ticker(handle));
                ReadingStatus::Scrolling
            }
            ToggleOutcome::NothingToScroll => ReadingStatus::Finished,
        };

        debug!(session_id = %self.id, ?status, "Reading toggled");
        self.publish(status, controller.snapshot())
    }

    /// Change tempo, keeping the viewport where it is
    pub async fn set_tempo(&self, tempo: u32) -> ReadingUpdate {
        let mut ticker = self.ticker.lock().await;
        stop_ticker(&mut ticker);

        let mut controller = self.controller.lock().await;
        let status = match controller.set_tempo(tempo, self.now()) {
            None => ReadingStatus::Paused,
            Some(StartOutcome::Scheduled(handle)) => {
                *ticker = Some(self.spawn_ticker(handle));
                ReadingStatus::Scrolling
            }
            Some(StartOutcome::NothingToScroll) => ReadingStatus::Finished,
        };

        debug!(session_id = %self.id, tempo = controller.tempo(), "Reading tempo changed");
        self.publish(status, controller.snapshot())
    }

    /// Stop for good; subscribers see `Closed`
    pub async fn close(&self) {
        let mut ticker = self.ticker.lock().await;
        stop_ticker(&mut ticker);

        let mut controller = self.controller.lock().await;
        controller.teardown();
        self.publish(ReadingStatus::Closed, controller.snapshot());
    }

    fn spawn_ticker(&self, first: FrameHandle) -> CancellationToken {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let controller = Arc::clone(&self.controller);
        let updates = Arc::clone(&self.updates);
        let origin = self.origin;
        let session_id = self.id;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(FRAME_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut handle = first;

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = interval.tick() => {
                        let mut controller = controller.lock().await;
                        match controller.frame(handle, millis_since(origin)) {
                            FrameOutcome::Scrolled { next, .. } => {
                                handle = next;
                                updates.send_replace(ReadingUpdate {
                                    status: ReadingStatus::Scrolling,
                                    snapshot: controller.snapshot(),
                                });
                            }
                            FrameOutcome::Finished => {
                                debug!(session_id = %session_id, "Reading finished");
                                updates.send_replace(ReadingUpdate {
                                    status: ReadingStatus::Finished,
                                    snapshot: controller.snapshot(),
                                });
                                break;
                            }
                            FrameOutcome::Stale => break,
                        }
                    }
                }
            }
        });

        token
    }
}

fn stop_ticker(ticker: &mut Option<CancellationToken>) {
    if let Some(token) = ticker.take() {
        token.cancel();
    }
}

/// Open reading sessions, one per user
#[derive(Clone, Default)]
pub struct ReadingRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<ReadingSession>>>>,
}

impl ReadingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session, closing the owner's previous one (song switched)
    pub async fn open(&self, session: ReadingSession) -> Arc<ReadingSession> {
        let session = Arc::new(session);
        let previous = {
            let mut sessions = self.sessions.write().await;
            let stale: Vec<Uuid> = sessions
                .values()
                .filter(|s| s.owner_id == session.owner_id)
                .map(|s| s.id)
                .collect();
            let previous: Vec<Arc<ReadingSession>> =
                stale.iter().filter_map(|id| sessions.remove(id)).collect();
            sessions.insert(session.id, Arc::clone(&session));
            previous
        };

        for old in previous {
            old.close().await;
        }

        info!(session_id = %session.id, song_id = %session.song_id, "Reading session opened");
        session
    }

    /// Session `id` if it belongs to `owner_id`
    pub async fn get(&self, owner_id: Uuid, id: Uuid) -> Option<Arc<ReadingSession>> {
        self.sessions
            .read()
            .await
            .get(&id)
            .filter(|s| s.owner_id == owner_id)
            .cloned()
    }

    /// Remove and tear down; false when there is no such session for the owner
    pub async fn close(&self, owner_id: Uuid, id: Uuid) -> bool {
        let removed = {
            let mut sessions = self.sessions.write().await;
            match sessions.get(&id) {
                Some(s) if s.owner_id == owner_id => sessions.remove(&id),
                _ => None,
            }
        };

        match removed {
            Some(session) => {
                session.close().await;
                info!(session_id = %id, "Reading session closed");
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
