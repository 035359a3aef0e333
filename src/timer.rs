//! Foreground countdown-timer service.
//!
//! An actor task owns the whole state machine (`Stopped`, `Running`,
//! `Paused`); actions arrive over a single `mpsc` channel, so delivery is
//! serialized and the service is the one source of truth for current state.
//! While running, a 1-second tick increments the elapsed counter, refreshes
//! the persistent notification, and re-broadcasts state. The 1-second sleep
//! granularity bounds cancellation latency; no harder preemption is needed.
//!
//! One boolean survives the process: the persisted running flag. It is a
//! hint, not ground truth (a killed process cannot run its teardown path),
//! so attach-time readers must reconcile it against actual service liveness
//! via [`TimerHandle::reconcile_persisted_flag`].

use crate::db::{DbPool, get_state_flag, set_state_flag};
use crate::errors::Result;
use crate::notify::Notifier;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, broadcast, mpsc};
use tracing::{debug, info, warn};

/// App-state key for the persisted running flag.
const TIMER_RUNNING_KEY: &str = "timer_is_running";

/// Delay between the final stop broadcast and service teardown, so
/// listeners observe the state change before the task exits.
const STOP_GRACE: Duration = Duration::from_millis(100);

/// Buffer for state broadcasts; slow receivers see `Lagged`, never block
/// the service.
const BROADCAST_CAPACITY: usize = 64;

/// Control actions accepted by the timer service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    Start,
    Pause,
    Resume,
    Stop,
}

/// State change broadcast to any listening observer. `is_running` is true
/// only while actively counting: a paused timer reports `false`, which is
/// what play/pause mirroring keys off. The persisted flag is coarser and
/// stays set until STOP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerUpdate {
    pub elapsed_seconds: u64,
    pub is_running: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Stopped,
    Running,
    Paused,
}

/// Formats elapsed seconds as `HH:MM:SS`.
#[must_use]
pub fn format_elapsed(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Reads the persisted running flag. Treat as a hint only; see the module
/// docs.
///
/// # Errors
///
/// Returns `Error::Database` on store access failures.
pub async fn is_flag_running(pool: &DbPool) -> Result<bool> {
    get_state_flag(pool, TIMER_RUNNING_KEY).await
}

struct TimerService {
    pool: DbPool,
    notifier: Arc<dyn Notifier>,
    updates: broadcast::Sender<TimerUpdate>,
    actions: mpsc::Receiver<TimerAction>,
    state: TimerState,
    elapsed_seconds: u64,
}

impl TimerService {
    async fn persist_running(&self, running: bool) {
        if let Err(e) = set_state_flag(&self.pool, TIMER_RUNNING_KEY, running).await {
            warn!("Failed to persist timer running flag: {}", e);
        }
    }

    fn broadcast(&self) {
        // A send error only means there are zero receivers right now.
        let _ = self.updates.send(TimerUpdate {
            elapsed_seconds: self.elapsed_seconds,
            is_running: self.state == TimerState::Running,
        });
    }

    async fn start(&mut self) {
        if self.state != TimerState::Stopped {
            debug!("Timer already running; START ignored");
            return;
        }
        info!("Starting timer");
        self.state = TimerState::Running;
        self.elapsed_seconds = 0;
        self.persist_running(true).await;
        self.notifier.show_timer(0);
        self.broadcast();
    }

    fn pause(&mut self) {
        if self.state != TimerState::Running {
            debug!("Timer not running; PAUSE ignored");
            return;
        }
        info!("Pausing timer at {} seconds", self.elapsed_seconds);
        self.state = TimerState::Paused;
        self.notifier.update_timer(self.elapsed_seconds, true);
        self.broadcast();
    }

    fn resume(&mut self) {
        if self.state != TimerState::Paused {
            debug!("Timer not paused; RESUME ignored");
            return;
        }
        info!("Resuming timer from {} seconds", self.elapsed_seconds);
        self.state = TimerState::Running;
        self.notifier.update_timer(self.elapsed_seconds, false);
        self.broadcast();
    }

    /// Returns true when the service task should exit.
    async fn stop(&mut self) -> bool {
        info!("Stopping timer");
        self.state = TimerState::Stopped;
        self.persist_running(false).await;
        self.broadcast();
        // Let the final broadcast be observed before teardown.
        tokio::time::sleep(STOP_GRACE).await;
        self.notifier.clear_timer();
        true
    }

    fn tick(&mut self) {
        self.elapsed_seconds += 1;
        self.notifier.update_timer(self.elapsed_seconds, false);
        self.broadcast();
    }

    async fn apply(&mut self, action: TimerAction) -> bool {
        debug!("Timer action: {:?}", action);
        match action {
            TimerAction::Start => {
                self.start().await;
                false
            }
            TimerAction::Pause => {
                self.pause();
                false
            }
            TimerAction::Resume => {
                self.resume();
                false
            }
            TimerAction::Stop => self.stop().await,
        }
    }

    async fn run(mut self) {
        debug!("Timer service task started");
        loop {
            if self.state == TimerState::Running {
                tokio::select! {
                    action = self.actions.recv() => match action {
                        Some(action) => {
                            if self.apply(action).await {
                                return;
                            }
                        }
                        None => break,
                    },
                    () = tokio::time::sleep(Duration::from_secs(1)) => self.tick(),
                }
            } else {
                match self.actions.recv().await {
                    Some(action) => {
                        if self.apply(action).await {
                            return;
                        }
                    }
                    None => break,
                }
            }
        }

        // Teardown without an explicit stop (daemon shutting down): make a
        // best effort to never leave the persisted flag stuck on "running".
        if self.state != TimerState::Stopped {
            info!("Timer service torn down while active; forcing Stopped");
            self.state = TimerState::Stopped;
            self.persist_running(false).await;
            self.broadcast();
            self.notifier.clear_timer();
        }
        debug!("Timer service task ended");
    }
}

/// Cloneable front end to the timer service.
///
/// The service task tears itself down shortly after a stop; the next
/// `start` spawns a fresh one.
#[derive(Clone)]
pub struct TimerHandle {
    pool: DbPool,
    notifier: Arc<dyn Notifier>,
    updates: broadcast::Sender<TimerUpdate>,
    actions: Arc<Mutex<Option<mpsc::Sender<TimerAction>>>>,
}

impl TimerHandle {
    /// Creates a handle with no live service; the first `start` spawns it.
    #[must_use]
    pub fn new(pool: DbPool, notifier: Arc<dyn Notifier>) -> Self {
        let (updates, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            pool,
            notifier,
            updates,
            actions: Arc::new(Mutex::new(None)),
        }
    }

    /// Subscribes to timer state broadcasts.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TimerUpdate> {
        self.updates.subscribe()
    }

    fn spawn_service(&self) -> mpsc::Sender<TimerAction> {
        let (tx, rx) = mpsc::channel(8);
        let service = TimerService {
            pool: Arc::clone(&self.pool),
            notifier: Arc::clone(&self.notifier),
            updates: self.updates.clone(),
            actions: rx,
            state: TimerState::Stopped,
            elapsed_seconds: 0,
        };
        // Detached on purpose; the action channel is the lifecycle handle.
        let _ = tokio::spawn(service.run());
        tx
    }

    /// Starts the timer, spawning a fresh service task if none is alive.
    /// A START while already running is a no-op inside the service.
    pub async fn start(&self) {
        let mut slot = self.actions.lock().await;
        loop {
            let sender = match slot.as_ref() {
                Some(sender) if !sender.is_closed() => sender.clone(),
                _ => {
                    let sender = self.spawn_service();
                    *slot = Some(sender.clone());
                    sender
                }
            };
            if sender.send(TimerAction::Start).await.is_ok() {
                return;
            }
            // The service exited between the liveness check and the send
            // (stop grace elapsed); respawn and retry.
            *slot = None;
        }
    }

    async fn send_if_alive(&self, action: TimerAction) {
        let slot = self.actions.lock().await;
        if let Some(sender) = slot.as_ref()
            && sender.send(action).await.is_ok()
        {
            return;
        }
        debug!("Timer service not alive; {:?} ignored", action);
    }

    /// Pauses a running timer; no-op otherwise.
    pub async fn pause(&self) {
        self.send_if_alive(TimerAction::Pause).await;
    }

    /// Resumes a paused timer; no-op otherwise.
    pub async fn resume(&self) {
        self.send_if_alive(TimerAction::Resume).await;
    }

    /// Stops the timer and tears the service task down after a short grace
    /// delay.
    pub async fn stop(&self) {
        self.send_if_alive(TimerAction::Stop).await;
    }

    /// Whether a service task is currently alive (running or paused).
    pub async fn is_alive(&self) -> bool {
        let slot = self.actions.lock().await;
        slot.as_ref().is_some_and(|sender| !sender.is_closed())
    }

    /// Reconciles the persisted running flag against actual service
    /// liveness, returning the reconciled value. Called when a UI attaches:
    /// a flag left `true` by an abnormal termination is corrected to
    /// `false` here.
    ///
    /// # Errors
    ///
    /// Returns `Error::Database` on store access failures.
    pub async fn reconcile_persisted_flag(&self) -> Result<bool> {
        let alive = self.is_alive().await;
        let flagged = is_flag_running(&self.pool).await?;
        if flagged && !alive {
            info!("Persisted timer flag was stale (no live service); resetting");
            set_state_flag(&self.pool, TIMER_RUNNING_KEY, false).await?;
            return Ok(false);
        }
        Ok(flagged)
    }
}
