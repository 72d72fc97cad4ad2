use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Launch one asynchronous page probe.
    StartProbe,
    /// Surface a popup to the user.
    Notify(Notification),
    /// (Re)start the periodic poll timer at the given period.
    StartTimer(Duration),
    /// Cancel the periodic poll timer.
    StopTimer,
}

/// What a popup is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// The queue grew to `count` documents.
    NewDocuments { count: u32 },
    /// The monitored page is not open / not reachable.
    PageUnavailable,
}
