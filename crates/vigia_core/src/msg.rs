use std::time::Duration;

use crate::PageId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Scheduler tick requesting a poll.
    PollTick,
    /// Probe finished: page located (or not) with a fresh document count.
    ProbeCompleted { page: Option<PageId>, count: u32 },
    /// Probe crashed before producing a report; only releases the guard.
    ProbeAborted,
    /// User toggled polling on or off.
    SetEnabled(bool),
    /// User changed the poll interval (already validated).
    SetInterval(Duration),
}
