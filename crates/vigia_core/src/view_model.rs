use std::time::Duration;

use crate::PageId;

/// Queue occupancy as the popup surface reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    Empty,
    NotEmpty,
}

impl QueueState {
    pub fn from_count(count: u32) -> Self {
        if count > 0 {
            Self::NotEmpty
        } else {
            Self::Empty
        }
    }
}

/// Read-only snapshot of [`crate::WatchState`] for protocol consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchViewModel {
    pub queue_state: QueueState,
    pub document_count: u32,
    pub monitored_page: Option<PageId>,
    pub enabled: bool,
    pub poll_interval: Duration,
    pub checking: bool,
}
