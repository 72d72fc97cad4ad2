//! Vigia engine: page probing, notification, and control plumbing.
mod decode;
mod extract;
mod fetch;
mod locate;
mod notify;
mod persist;
mod probe;
mod protocol;
mod timer;
mod types;

pub use decode::{decode_page, DecodeError, DecodedPage};
pub use extract::{has_queue_view_marker, QueueExtractor, TableRowExtractor};
pub use fetch::{FetchSettings, HttpQueueHost, QueueHost};
pub use locate::{page_id, select_candidate, TargetPage};
pub use notify::{
    detect_backend, DesktopNotifier, Notifier, NotifyError, PopupBackend, PopupKind, PopupSize,
};
pub use persist::{write_atomic, PersistError};
pub use probe::{run_probe, ProbeContext};
pub use protocol::{coerce_seconds, Request, Response, DEFAULT_REFRESH_SECONDS};
pub use timer::{PollTimer, Tick};
pub use types::{
    HostError, HostFailure, PageId, PageRef, ProbeReport, QueueSnapshot, QueueState,
};
