//! Notification delivery
//!
//! Human-facing messages are serialized through a single output backend,
//! off the decision pipeline's calling path.

pub mod backend;
mod dispatcher;
mod types;

pub use backend::{
    backend_from_config, ConsoleBackend, DisabledBackend, NotificationBackend, SpeechCommandBackend,
};
pub use dispatcher::{DispatcherState, DispatcherStats, NotificationDispatcher};
pub use types::{Emotion, NotificationTask, VoiceProfile};
