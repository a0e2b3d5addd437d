//! Elapsed-time text for visitor presence, corrected for client clock skew.
//!
//! The elapsed value is computed against the server's clock: the signed
//! offset (`server_now - local_now`) is applied to the local clock before
//! differencing, so a client with a skewed clock still shows the wait time
//! the server sees.

use chrono::{DateTime, Duration as TimeDelta, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, Instrument};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;
const MONTH: i64 = 30 * DAY;
// The year unit is twelve display months, so the months-to-years handoff
// has no gap that would floor to zero years.
const YEAR: i64 = 12 * MONTH;

/// Render elapsed time since `created_at` as compact text (`45s`, `3m`,
/// `1h`, `2d`, `1w`, `6mo`, `1y`).
///
/// Always floors to the unit, never rounds. Thresholds are exclusive upper
/// bounds: under a minute → seconds, under an hour → minutes, under a day →
/// hours, under a week → days, under four weeks → weeks, under twelve
/// months → months, else years.
#[must_use]
pub fn format_elapsed(
    created_at: DateTime<Utc>,
    local_now: DateTime<Utc>,
    server_offset: TimeDelta,
) -> String {
    let corrected_now = local_now + server_offset;
    let secs = (corrected_now - created_at).num_seconds().max(0);

    if secs < MINUTE {
        format!("{secs}s")
    } else if secs < HOUR {
        format!("{}m", secs / MINUTE)
    } else if secs < DAY {
        format!("{}h", secs / HOUR)
    } else if secs < WEEK {
        format!("{}d", secs / DAY)
    } else if secs < 4 * WEEK {
        format!("{}w", secs / WEEK)
    } else if secs < YEAR {
        format!("{}mo", secs / MONTH)
    } else {
        format!("{}y", secs / YEAR)
    }
}

/// Builder for the background clock that recomputes the presence text on a
/// fixed tick.
pub struct DurationClock {
    created_at: DateTime<Utc>,
    server_offset: TimeDelta,
    tick: std::time::Duration,
    cancel: CancellationToken,
}

impl DurationClock {
    /// Construct a clock for one visitor's presence display.
    #[must_use]
    pub fn new(
        created_at: DateTime<Utc>,
        server_offset: TimeDelta,
        tick: std::time::Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            created_at,
            server_offset,
            tick,
            cancel,
        }
    }

    /// Spawn the recompute loop and return a handle publishing the text.
    #[must_use]
    pub fn spawn(self) -> ClockHandle {
        let initial = format_elapsed(self.created_at, Utc::now(), self.server_offset);
        let (text_tx, text_rx) = watch::channel(initial);
        let cancel_for_handle = self.cancel.clone();

        let task_handle = tokio::spawn(
            Self::run(
                self.created_at,
                self.server_offset,
                self.tick,
                text_tx,
                self.cancel,
            )
            .instrument(info_span!("duration_clock")),
        );

        ClockHandle {
            text_rx,
            join_handle: Some(task_handle),
            cancel: cancel_for_handle,
        }
    }

    async fn run(
        created_at: DateTime<Utc>,
        server_offset: TimeDelta,
        tick: std::time::Duration,
        text_tx: watch::Sender<String>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("duration clock cancelled");
                    return;
                }
                () = tokio::time::sleep(tick) => {}
            }

            let _ = text_tx.send(format_elapsed(created_at, Utc::now(), server_offset));
        }
    }
}

/// Handle returned from [`DurationClock::spawn`].
pub struct ClockHandle {
    text_rx: watch::Receiver<String>,
    join_handle: Option<JoinHandle<()>>,
    /// Cancelled when the handle is dropped.
    cancel: CancellationToken,
}

impl Drop for ClockHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl ClockHandle {
    /// Latest rendered presence text.
    #[must_use]
    pub fn text(&self) -> String {
        self.text_rx.borrow().clone()
    }

    /// Subscribe to text updates.
    #[must_use]
    pub fn updates(&self) -> watch::Receiver<String> {
        self.text_rx.clone()
    }

    /// Signal the loop to stop and wait for it to exit.
    pub async fn await_completion(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.join_handle.take() {
            let _ = handle.await;
        }
    }
}
