//! Pool sensor polling and the append-only status log.

mod error;
mod poller;
mod source;
mod status_log;

pub use error::RemoteFetchError;
pub use poller::{
    DevicePoller, PollerConfig, PollerHandle, PollerState, PollerStats, RetryPolicy, TickOutcome,
};
pub use source::{HttpStatusSource, StatusSource, parse_status_body};
pub use status_log::StatusLog;
