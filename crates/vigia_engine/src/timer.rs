//! Periodic poll trigger.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Marker delivered on every scheduled poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick;

/// Restartable periodic trigger.
///
/// The first tick fires one full period after (re)start, matching a freshly
/// armed interval timer; immediate checks are the caller's business. Missed
/// ticks are skipped rather than bunched, so a laptop waking from sleep
/// gets one poll, not a burst.
pub struct PollTimer {
    tick_tx: mpsc::Sender<Tick>,
    cancel: Option<CancellationToken>,
}

impl PollTimer {
    pub fn new(tick_tx: mpsc::Sender<Tick>) -> Self {
        Self {
            tick_tx,
            cancel: None,
        }
    }

    /// Start the timer, replacing any previous schedule.
    pub fn restart(&mut self, period: Duration) {
        self.stop();
        let token = CancellationToken::new();
        let ticker_token = token.clone();
        let tx = self.tick_tx.clone();
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker_token.cancelled() => break,
                    _ = ticker.tick() => {
                        if tx.send(Tick).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });
        self.cancel = Some(token);
    }

    pub fn stop(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.cancel.is_some()
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
