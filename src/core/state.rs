#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetState {
    Uninitialized,
    Polling,
    Idle,
}

/// Why the widget went idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleReason {
    /// The first snapshot already said the job was done.
    FinishedBeforeStart,
    /// A poll reported the job as no longer running.
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    InProgress,
    Completed,
    NoData,
}
