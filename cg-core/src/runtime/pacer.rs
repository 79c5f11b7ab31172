//! Shared timeline of one play session.
//!
//! Every suspendable operation gets a [`Pacer`] and advances with a [`Ticker`].
//! A ticker yields once per animation tick and reports the seconds that passed
//! while playback was not paused; cancellation of the session scope ends it.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

use crate::event::EventHub;
use crate::runtime::flags::PlaybackFlags;

/// Result of a suspendable operation. Cancellation is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Cancelled,
}

impl Outcome {
    pub fn is_cancelled(self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    /// Cancelled if either side was cancelled.
    pub fn and(self, other: Outcome) -> Outcome {
        if self.is_cancelled() || other.is_cancelled() {
            Outcome::Cancelled
        } else {
            Outcome::Completed
        }
    }
}

#[derive(Clone)]
pub struct Pacer {
    scope: CancellationToken,
    flags: Arc<PlaybackFlags>,
    events: EventHub,
    tick: Duration,
}

impl Pacer {
    pub fn new(scope: CancellationToken, flags: Arc<PlaybackFlags>, events: EventHub, tick: Duration) -> Self {
        Self { scope, flags, events, tick }
    }

    pub fn is_cancelled(&self) -> bool {
        self.scope.is_cancelled()
    }

    pub fn flags(&self) -> &Arc<PlaybackFlags> {
        &self.flags
    }

    pub fn events(&self) -> &EventHub {
        &self.events
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Resolves once the session scope is cancelled.
    pub async fn cancelled(&self) {
        self.scope.cancelled().await
    }

    /// A ticker whose delta clock starts now.
    pub fn ticker(&self) -> Ticker {
        Ticker {
            pacer: self.clone(),
            last: Instant::now(),
        }
    }
}

pub struct Ticker {
    pacer: Pacer,
    last: Instant,
}

impl Ticker {
    /// Waits for the next unpaused tick.
    ///
    /// Returns the seconds elapsed since the previous one, excluding paused
    /// time, or `None` once the session is cancelled.
    pub async fn tick(&mut self) -> Option<f32> {
        loop {
            tokio::select! {
                biased;
                _ = self.pacer.scope.cancelled() => return None,
                _ = sleep(self.pacer.tick) => {}
            }

            let now = Instant::now();
            if self.pacer.flags.is_paused() {
                // 暂停期间不累计时间，恢复后不会跳变
                self.last = now;
                continue;
            }

            let dt = now.duration_since(self.last).as_secs_f32();
            self.last = now;
            return Some(dt);
        }
    }
}
