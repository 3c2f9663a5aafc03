use crate::core::snapshot::InProgress;
use crate::core::state::IdleReason;

/// Things the widget reports to whoever is watching it.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    Started { polling: bool },
    Polled {
        processing_state: String,
        in_progress: InProgress,
    },
    NoData,
    PollFailed(String),
    Idle(IdleReason),
    Stopped,
}
