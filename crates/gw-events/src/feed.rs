//! Tenant-scoped activity feed.
//!
//! Each subscriber gets its own poll loop. A tick fetches the newest window of
//! events for the tenant, emits it as one snapshot and sleeps. There is no
//! cursor, so consecutive snapshots overlap and bursts larger than the window
//! between two ticks are not all seen.

use crate::ids::TeamId;
use crate::types::FeedEntry;
use futures::Stream;
use serde::Serialize;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};

pub const DEFAULT_WINDOW: u32 = 10;
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_FAILURES: u32 = 3;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("event store unavailable: {message}")]
    StoreUnavailable { message: String },
}

/// Read side of the event store as seen by the feed.
pub trait FeedSource: Send + Sync + 'static {
    /// Newest-first events whose server belongs to `team_id`, at most `limit`.
    fn recent(&self, team_id: &TeamId, limit: u32) -> Result<Vec<FeedEntry>, FeedError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedConfig {
    pub window: u32,
    pub interval: Duration,
    /// Consecutive failed fetches tolerated before the stream terminates.
    pub max_failures: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            interval: DEFAULT_INTERVAL,
            max_failures: DEFAULT_MAX_FAILURES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedMessage {
    Snapshot { events: Vec<FeedEntry> },
    Terminated { reason: String },
}

pub struct Feed<S> {
    source: Arc<S>,
    team_id: TeamId,
    config: FeedConfig,
}

impl<S: FeedSource> Feed<S> {
    pub fn new(source: Arc<S>, team_id: TeamId, config: FeedConfig) -> Self {
        Self {
            source,
            team_id,
            config,
        }
    }

    /// Runs one fetch and applies the tenant filter and ordering.
    pub fn snapshot(&self) -> Result<Vec<FeedEntry>, FeedError> {
        let mut entries = self.source.recent(&self.team_id, self.config.window)?;
        entries.retain(|entry| entry.team_id == self.team_id);
        entries.sort_by(|a, b| b.event.created_at.cmp(&a.event.created_at));
        entries.truncate(self.config.window as usize);
        Ok(entries)
    }

    /// Spawns the poll loop. Dropping the returned subscription stops it.
    pub fn subscribe(self) -> FeedSubscription {
        let (sender, receiver) = mpsc::channel(1);
        let token = CancellationToken::new();
        let loop_token = token.clone();
        tokio::spawn(async move { self.run(sender, loop_token).await });
        FeedSubscription {
            receiver,
            _guard: token.drop_guard(),
        }
    }

    async fn run(self, sender: mpsc::Sender<FeedMessage>, token: CancellationToken) {
        let mut failures = 0u32;
        tracing::debug!(team_id = %self.team_id, "feed started");
        loop {
            if token.is_cancelled() || sender.is_closed() {
                break;
            }
            match self.snapshot() {
                Ok(events) => {
                    failures = 0;
                    let message = FeedMessage::Snapshot { events };
                    if !deliver(&sender, &token, message).await {
                        break;
                    }
                }
                Err(err) => {
                    failures += 1;
                    tracing::warn!(
                        team_id = %self.team_id,
                        attempt = failures,
                        error = %err,
                        "feed fetch failed"
                    );
                    if failures >= self.config.max_failures {
                        let message = FeedMessage::Terminated {
                            reason: err.to_string(),
                        };
                        deliver(&sender, &token, message).await;
                        break;
                    }
                }
            }
            tokio::select! {
                () = token.cancelled() => break,
                () = tokio::time::sleep(self.config.interval) => {}
            }
        }
        tracing::debug!(team_id = %self.team_id, "feed stopped");
    }
}

async fn deliver(
    sender: &mpsc::Sender<FeedMessage>,
    token: &CancellationToken,
    message: FeedMessage,
) -> bool {
    tokio::select! {
        result = sender.send(message) => result.is_ok(),
        () = token.cancelled() => false,
    }
}

/// Receiving half of one feed. Cancels its poll loop when dropped.
pub struct FeedSubscription {
    receiver: mpsc::Receiver<FeedMessage>,
    _guard: DropGuard,
}

impl Stream for FeedSubscription {
    type Item = FeedMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
