use std::fmt;
use std::time::Duration;

use crate::view_model::{QueueState, WatchViewModel};

/// Identifier of a located queue-page instance.
pub type PageId = u64;

/// Poll period used when no persisted setting exists.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(180);

/// Longest accepted poll period. Bounds timer deadline arithmetic.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Two-state guard for the "page unavailable" popup.
///
/// `Armed -> Suppressed` fires the popup as a side effect; `Suppressed ->
/// Armed` happens silently when the page is found again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertArm {
    Armed,
    Suppressed,
}

/// Process-wide poll state, owned by the coordinator and mutated only
/// through [`crate::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchState {
    last_document_count: u32,
    monitored_page: Option<PageId>,
    enabled: bool,
    poll_interval: Duration,
    unavailable_alert: AlertArm,
    checking: bool,
}

impl Default for WatchState {
    fn default() -> Self {
        Self::new(true, DEFAULT_POLL_INTERVAL)
    }
}

impl WatchState {
    /// State at process start, seeded from persisted settings.
    pub fn new(enabled: bool, poll_interval: Duration) -> Self {
        Self {
            last_document_count: 0,
            monitored_page: None,
            enabled,
            poll_interval,
            unavailable_alert: AlertArm::Armed,
            checking: false,
        }
    }

    pub fn view(&self) -> WatchViewModel {
        WatchViewModel {
            queue_state: QueueState::from_count(self.last_document_count),
            document_count: self.last_document_count,
            monitored_page: self.monitored_page,
            enabled: self.enabled,
            poll_interval: self.poll_interval,
            checking: self.checking,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn checking(&self) -> bool {
        self.checking
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn last_document_count(&self) -> u32 {
        self.last_document_count
    }

    pub fn monitored_page(&self) -> Option<PageId> {
        self.monitored_page
    }

    pub fn unavailable_alert(&self) -> AlertArm {
        self.unavailable_alert
    }

    pub(crate) fn begin_check(&mut self) {
        self.checking = true;
    }

    pub(crate) fn finish_check(&mut self) {
        self.checking = false;
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn set_poll_interval(&mut self, period: Duration) {
        self.poll_interval = period;
    }

    pub(crate) fn set_monitored_page(&mut self, page: Option<PageId>) {
        self.monitored_page = page;
    }

    pub(crate) fn record_count(&mut self, count: u32) {
        self.last_document_count = count;
    }

    pub(crate) fn reset_baseline(&mut self) {
        self.last_document_count = 0;
    }

    pub(crate) fn suppress_unavailable_alert(&mut self) {
        self.unavailable_alert = AlertArm::Suppressed;
    }

    pub(crate) fn rearm_unavailable_alert(&mut self) {
        self.unavailable_alert = AlertArm::Armed;
    }
}

/// Rejected refresh period: not a positive number of seconds the timer
/// can run at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidInterval;

impl fmt::Display for InvalidInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "refresh interval must be a positive number of seconds within the supported range"
        )
    }
}

impl std::error::Error for InvalidInterval {}

/// Validate a user-supplied refresh period in seconds.
///
/// The wire protocol inherits loose numeric input; anything that does not
/// convert to a period in `(0, MAX_POLL_INTERVAL]` is rejected, leaving
/// the running timer untouched. Total over all of `f64`, NaN and
/// overflowing values included.
pub fn validate_refresh_seconds(seconds: f64) -> Result<Duration, InvalidInterval> {
    if seconds <= 0.0 {
        return Err(InvalidInterval);
    }
    let period = Duration::try_from_secs_f64(seconds).map_err(|_| InvalidInterval)?;
    if period.is_zero() || period > MAX_POLL_INTERVAL {
        return Err(InvalidInterval);
    }
    Ok(period)
}
