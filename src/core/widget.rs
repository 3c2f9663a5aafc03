//! The status poller/renderer.
//!
//! One widget instance owns the snapshot pair, the board and two recurring
//! timers: a status timer that polls the server and a refresh timer that
//! re-renders the board from whatever snapshot was last published. The two
//! run independently; a poll publishes current and previous together, so a
//! render never sees half of an update.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::board::{StatusBoard, CURRENT_STATUS, INITIATE_ANOTHER};
use crate::core::endpoints::Endpoints;
use crate::core::error::StatusError;
use crate::core::event::WidgetEvent;
use crate::core::render::render_fields;
use crate::core::snapshot::{SnapshotPair, StatusSnapshot};
use crate::core::source::StatusSource;
use crate::core::state::{IdleReason, PollOutcome, WidgetState};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
pub const DEFAULT_RENDER_INTERVAL: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone)]
pub struct WidgetConfig {
    pub endpoints: Endpoints,
    pub poll_interval: Duration,
    pub render_interval: Duration,
}

impl WidgetConfig {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            endpoints,
            poll_interval: DEFAULT_POLL_INTERVAL,
            render_interval: DEFAULT_RENDER_INTERVAL,
        }
    }
}

/// A recurring task and the token that ends it.
struct Timer {
    cancel: CancellationToken,
    _task: JoinHandle<()>,
}

impl Timer {
    /// First tick fires one `period` after spawning. Cancellation is only
    /// seen between ticks, so a tick already running finishes.
    fn spawn<F, Fut>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => tick().await,
                }
            }
        });
        Self {
            cancel,
            _task: task,
        }
    }
}

#[derive(Default)]
struct Timers {
    status: Option<Timer>,
    refresh: Option<Timer>,
}

impl Timers {
    fn active(&self) -> usize {
        usize::from(self.status.is_some()) + usize::from(self.refresh.is_some())
    }

    /// Cancels whatever is still running; returns how many timers that was.
    fn cancel_all(&mut self) -> usize {
        let mut cancelled = 0;
        for timer in [self.status.take(), self.refresh.take()].into_iter().flatten() {
            timer.cancel.cancel();
            cancelled += 1;
        }
        cancelled
    }
}

struct Shared<S, B> {
    config: WidgetConfig,
    source: S,
    board: Mutex<B>,
    snapshots: watch::Sender<SnapshotPair>,
    state: Mutex<WidgetState>,
    timers: Mutex<Timers>,
    render_passes: AtomicU64,
    events: Option<mpsc::UnboundedSender<WidgetEvent>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct StatusWidget<S, B> {
    shared: Arc<Shared<S, B>>,
}

impl<S, B> Clone for StatusWidget<S, B> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S, B> StatusWidget<S, B>
where
    S: StatusSource,
    B: StatusBoard + Send + 'static,
{
    /// `events`, when given, receives every state change.
    pub fn new(
        config: WidgetConfig,
        source: S,
        board: B,
        events: Option<mpsc::UnboundedSender<WidgetEvent>>,
    ) -> Self {
        let (snapshots, _) = watch::channel(SnapshotPair::default());
        Self {
            shared: Arc::new(Shared {
                config,
                source,
                board: Mutex::new(board),
                snapshots,
                state: Mutex::new(WidgetState::Uninitialized),
                timers: Mutex::new(Timers::default()),
                render_passes: AtomicU64::new(0),
                events,
            }),
        }
    }

    /// Fetches the first snapshot, then either goes straight to idle (the job
    /// had already finished) or starts the status and refresh timers.
    pub async fn start(&self) -> Result<WidgetState, StatusError> {
        {
            let mut state = lock(&self.shared.state);
            if *state != WidgetState::Uninitialized {
                return Err(StatusError::AlreadyStarted);
            }
            *state = WidgetState::Polling;
        }
        lock(&self.shared.board).hide(INITIATE_ANOTHER);

        let initial = match self.shared.source.fetch_status().await {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!(event = "status.start.fetch_failed", error = %err);
                self.emit(WidgetEvent::PollFailed(err.to_string()));
                None
            }
        };

        let finished = matches!(&initial, Some(Some(snapshot)) if snapshot.finished());
        if let Some(snapshot) = initial {
            self.publish(snapshot);
        }

        if finished {
            info!(event = "status.start.already_finished");
            self.emit(WidgetEvent::Started { polling: false });
            lock(&self.shared.board).set_icon(&self.shared.config.endpoints.completion_icon());
            self.enter_idle(IdleReason::FinishedBeforeStart);
            return Ok(WidgetState::Idle);
        }

        let state = lock(&self.shared.state);
        if *state != WidgetState::Polling {
            // stopped while the first fetch was in flight
            return Ok(*state);
        }
        self.spawn_timers();
        drop(state);

        info!(
            event = "status.start.polling",
            poll_ms = self.shared.config.poll_interval.as_millis() as u64,
            render_ms = self.shared.config.render_interval.as_millis() as u64
        );
        self.emit(WidgetEvent::Started { polling: true });
        Ok(WidgetState::Polling)
    }

    /// One poll of the status endpoint. Errors leave the snapshots alone.
    pub async fn poll_once(&self) -> Result<PollOutcome, StatusError> {
        let next = self.shared.source.fetch_status().await?;
        let complete = next.as_ref().map(StatusSnapshot::is_complete);
        self.publish(next);

        let outcome = match complete {
            Some(true) => {
                self.enter_idle(IdleReason::Completed);
                PollOutcome::Completed
            }
            Some(false) => PollOutcome::InProgress,
            None => PollOutcome::NoData,
        };
        Ok(outcome)
    }

    /// One render pass over the latest published snapshot. The snapshot is
    /// read under the board lock.
    pub fn render_once(&self) -> bool {
        let mut board = lock(&self.shared.board);
        let current = self.shared.snapshots.borrow().current.clone();
        let rendered = render_fields(&mut *board, current.as_deref());
        drop(board);
        if rendered {
            self.shared.render_passes.fetch_add(1, Ordering::Relaxed);
        }
        rendered
    }

    /// Stops both timers, renders one final time and offers to start another
    /// export. Safe to call repeatedly; returns how many timers it cancelled.
    pub fn enter_idle(&self, reason: IdleReason) -> usize {
        let was = std::mem::replace(&mut *lock(&self.shared.state), WidgetState::Idle);
        let cancelled = lock(&self.shared.timers).cancel_all();

        self.render_once();
        lock(&self.shared.board).show(INITIATE_ANOTHER, false);

        if was != WidgetState::Idle {
            info!(event = "status.widget.idle", reason = ?reason, cancelled);
            self.emit(WidgetEvent::Idle(reason));
        }
        cancelled
    }

    /// Cancels both timers without rendering.
    pub fn stop(&self) -> usize {
        let was = std::mem::replace(&mut *lock(&self.shared.state), WidgetState::Idle);
        let cancelled = lock(&self.shared.timers).cancel_all();
        if was == WidgetState::Polling {
            info!(event = "status.widget.stopped", cancelled);
            self.emit(WidgetEvent::Stopped);
        }
        cancelled
    }

    pub fn state(&self) -> WidgetState {
        *lock(&self.shared.state)
    }

    pub fn active_timers(&self) -> usize {
        lock(&self.shared.timers).active()
    }

    pub fn render_passes(&self) -> u64 {
        self.shared.render_passes.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    pub fn snapshots(&self) -> SnapshotPair {
        self.shared.snapshots.borrow().clone()
    }

    pub fn with_board<R>(&self, read: impl FnOnce(&B) -> R) -> R {
        read(&*lock(&self.shared.board))
    }

    pub fn source(&self) -> &S {
        &self.shared.source
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.shared.config
    }

    /// Shifts current to previous in one step, then writes the processing
    /// state; with no data, reveals the "start another" link instead.
    fn publish(&self, next: Option<StatusSnapshot>) {
        let event = match &next {
            Some(snapshot) => WidgetEvent::Polled {
                processing_state: snapshot.processing_state.clone(),
                in_progress: snapshot.in_progress.clone(),
            },
            None => WidgetEvent::NoData,
        };
        self.shared.snapshots.send_modify(|pair| pair.shift(next));

        {
            let mut board = lock(&self.shared.board);
            match &event {
                WidgetEvent::Polled {
                    processing_state, ..
                } => board.set_text(CURRENT_STATUS, processing_state),
                _ => {
                    warn!(event = "status.poll.no_data");
                    board.show(INITIATE_ANOTHER, false);
                }
            }
        }
        self.emit(event);
    }

    fn spawn_timers(&self) {
        let mut timers = lock(&self.shared.timers);

        let poller = self.clone();
        timers.status = Some(Timer::spawn(self.shared.config.poll_interval, move || {
            let widget = poller.clone();
            async move { widget.poll_tick().await }
        }));

        let renderer = self.clone();
        timers.refresh = Some(Timer::spawn(self.shared.config.render_interval, move || {
            let widget = renderer.clone();
            async move {
                widget.render_once();
            }
        }));
    }

    async fn poll_tick(&self) {
        match self.poll_once().await {
            Ok(outcome) => debug!(event = "status.poll.completed", outcome = ?outcome),
            Err(err) => {
                warn!(event = "status.poll.failed", error = %err);
                self.emit(WidgetEvent::PollFailed(err.to_string()));
            }
        }
    }

    fn emit(&self, event: WidgetEvent) {
        if let Some(events) = &self.shared.events {
            let _ = events.send(event);
        }
    }
}
