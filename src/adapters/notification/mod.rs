//! Notification dispatcher adapters.

mod log_dispatcher;
mod recording_dispatcher;

pub use log_dispatcher::LogNotificationDispatcher;
pub use recording_dispatcher::RecordingNotificationDispatcher;
