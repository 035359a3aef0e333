//! Notification surface.
//!
//! Two logically distinct channels: one-shot "new project" alerts posted by
//! the periodic checker, and the persistent timer readout that stays visible
//! (and keeps offering pause/resume/stop) while the timer service is alive.
//! The daemon renders both on its terminal through `tracing`; tests swap in
//! a recording fake.

use crate::models::Project;
use crate::timer::format_elapsed;
use tracing::info;

/// Sink for user-visible notifications.
///
/// Implementations must be cheap and non-blocking; callers invoke these from
/// async tasks without awaiting.
pub trait Notifier: Send + Sync {
    /// Posts a one-shot alert announcing a newly detected project.
    fn notify_new_project(&self, project: &Project);

    /// Shows the persistent timer notification at the given elapsed time.
    fn show_timer(&self, elapsed_seconds: u64);

    /// Updates the persistent timer notification. `paused` selects which
    /// inline actions the surface offers (Resume vs. Pause, plus Stop).
    fn update_timer(&self, elapsed_seconds: u64, paused: bool);

    /// Removes the persistent timer notification.
    fn clear_timer(&self);
}

/// Renders notifications as log lines on the daemon's terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_new_project(&self, project: &Project) {
        info!(
            "New government project available: '{}' (location: {})",
            project.name, project.location
        );
    }

    fn show_timer(&self, elapsed_seconds: u64) {
        info!(
            "Timer {} [actions: pause, stop]",
            format_elapsed(elapsed_seconds)
        );
    }

    fn update_timer(&self, elapsed_seconds: u64, paused: bool) {
        if paused {
            info!(
                "Timer {} (paused) [actions: resume, stop]",
                format_elapsed(elapsed_seconds)
            );
        } else {
            info!(
                "Timer {} [actions: pause, stop]",
                format_elapsed(elapsed_seconds)
            );
        }
    }

    fn clear_timer(&self) {
        info!("Timer notification removed");
    }
}
