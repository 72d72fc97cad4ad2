//! Vigia core: pure poll state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, Notification};
pub use msg::Msg;
pub use state::{
    validate_refresh_seconds, AlertArm, InvalidInterval, PageId, WatchState,
    DEFAULT_POLL_INTERVAL, MAX_POLL_INTERVAL,
};
pub use update::update;
pub use view_model::{QueueState, WatchViewModel};
