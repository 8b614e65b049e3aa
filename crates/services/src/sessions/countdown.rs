use std::ops::ControlFlow;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::service::QuestionTicket;

/// Cadence of countdown ticks.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Per-question timer task.
///
/// Calls `on_tick` once per period until it returns `Break`. Cancelling or
/// dropping the handle aborts the task; any tick already waiting on the
/// session lock is rejected by its stale ticket.
#[derive(Debug)]
pub struct Countdown {
    ticket: QuestionTicket,
    task: JoinHandle<()>,
}

impl Countdown {
    pub fn start<F>(runtime: &Handle, ticket: QuestionTicket, period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut(QuestionTicket) -> ControlFlow<()> + Send + 'static,
    {
        let first = Instant::now() + period;
        let task = runtime.spawn(async move {
            let mut interval = time::interval_at(first, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if on_tick(ticket).is_break() {
                    break;
                }
            }
        });
        Self { ticket, task }
    }

    #[must_use]
    pub fn ticket(&self) -> QuestionTicket {
        self.ticket
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.task.abort();
    }
}
