//! Console and file logging on top of [`tracing`], plus the per-entry
//! summary printed at the end of a command.

mod logger;
mod subscriber;
mod types;

pub use logger::Logger;
pub use subscriber::{init_subscriber, log_file_path};
pub use types::{Log, Outcome, SummaryEntry};
