use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};

/// Time between countdown ticks.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

/// One elapsed unit, tagged with the timer that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
}

/// Handle to a periodic tick task.
///
/// The first tick arrives one `period` after start. Dropping the handle aborts
/// the task, so at most one tick source lives as long as a single handle does.
#[derive(Debug)]
pub struct CountdownTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

impl CountdownTimer {
    /// Spawn the tick task on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn start(generation: u64, period: Duration, ticks: UnboundedSender<Tick>) -> Self {
        let first = Instant::now() + period;
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(first, period);
            loop {
                interval.tick().await;
                if ticks.send(Tick { generation }).is_err() {
                    break;
                }
            }
        });
        Self { generation, handle }
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
