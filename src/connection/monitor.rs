//! Connection resilience monitor.
//!
//! Tracks true reachability, distinct from the browser's online/offline
//! signal: an "offline" signal is trusted immediately, but an "online"
//! signal is only believed after an active reachability probe succeeds —
//! captive portals and proxy failures make the browser events unreliable
//! on their own.
//!
//! Signals flow in through a [`MonitorHandle`]; the current
//! [`ConnectionPhase`] is published on a `tokio::sync::watch` channel and
//! recovery events are delivered via `tokio::sync::mpsc` so the session can
//! react (resync the visitor queue).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};

use crate::connection::probe::Reachability;
use crate::models::connection::ConnectionPhase;

/// Browser-reported network signals fed into the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkSignal {
    /// Browser believes the network came back.
    Online,
    /// Browser reported the network as gone.
    Offline,
}

/// Events emitted by the monitor for session handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Reachability was confirmed after a confirmed-offline stretch; the
    /// queue owner must request a fresh snapshot.
    ResyncRequired,
}

const SIGNAL_CAPACITY: usize = 16;

/// Builder for the background reachability monitor.
///
/// Call [`spawn`](Self::spawn) to start the loop.
pub struct ConnectionMonitor {
    probe: Arc<dyn Reachability>,
    retry_interval: Duration,
    event_tx: mpsc::Sender<ConnectionEvent>,
    cancel: CancellationToken,
}

impl ConnectionMonitor {
    /// Construct a new monitor (does not start the loop yet).
    #[must_use]
    pub fn new(
        probe: Arc<dyn Reachability>,
        retry_interval: Duration,
        event_tx: mpsc::Sender<ConnectionEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            probe,
            retry_interval,
            event_tx,
            cancel,
        }
    }

    /// Spawn the background loop and return a handle for feeding signals
    /// and observing the phase.
    #[must_use]
    pub fn spawn(self) -> MonitorHandle {
        let (signal_tx, signal_rx) = mpsc::channel(SIGNAL_CAPACITY);
        let (phase_tx, phase_rx) = watch::channel(ConnectionPhase::Online);
        let cancel_for_handle = self.cancel.clone();

        let task_handle = tokio::spawn(
            Self::run(
                self.probe,
                self.retry_interval,
                signal_rx,
                phase_tx,
                self.event_tx,
                self.cancel,
            )
            .instrument(info_span!("connection_monitor")),
        );

        MonitorHandle {
            signal_tx,
            phase_rx,
            join_handle: Some(task_handle),
            cancel: cancel_for_handle,
        }
    }

    /// Core signal loop.
    async fn run(
        probe: Arc<dyn Reachability>,
        retry_interval: Duration,
        mut signal_rx: mpsc::Receiver<NetworkSignal>,
        phase_tx: watch::Sender<ConnectionPhase>,
        event_tx: mpsc::Sender<ConnectionEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            let signal = tokio::select! {
                () = cancel.cancelled() => {
                    debug!("connection monitor cancelled");
                    return;
                }
                signal = signal_rx.recv() => {
                    let Some(signal) = signal else { return };
                    signal
                }
            };

            match signal {
                NetworkSignal::Offline => {
                    // The browser's offline signal is authoritative. No probe
                    // is in flight here, so nothing to cancel.
                    info!("offline signal; connection confirmed offline");
                    let _ = phase_tx.send(ConnectionPhase::ConfirmedOffline);
                }
                NetworkSignal::Online => {
                    Self::probe_until_resolved(
                        &probe,
                        retry_interval,
                        &mut signal_rx,
                        &phase_tx,
                        &event_tx,
                        &cancel,
                    )
                    .await;
                }
            }
        }
    }

    /// Probe after an online signal, retrying at the fixed interval until
    /// success or a fresh offline signal cancels the attempt.
    async fn probe_until_resolved(
        probe: &Arc<dyn Reachability>,
        retry_interval: Duration,
        signal_rx: &mut mpsc::Receiver<NetworkSignal>,
        phase_tx: &watch::Sender<ConnectionPhase>,
        event_tx: &mpsc::Sender<ConnectionEvent>,
        cancel: &CancellationToken,
    ) {
        // A recovery only requires a resync if the session actually lost its
        // snapshot stream, i.e. the previous stretch reached confirmed-offline.
        let was_confirmed_offline =
            *phase_tx.borrow() == ConnectionPhase::ConfirmedOffline;

        if was_confirmed_offline {
            let _ = phase_tx.send(ConnectionPhase::SuspectedOffline);
        }

        loop {
            // Run the probe, but let a fresh offline signal cancel it so a
            // slow success cannot race a real disconnect into false recovery.
            let reachable = tokio::select! {
                () = cancel.cancelled() => return,
                reachable = probe.check() => reachable,
                signal = signal_rx.recv() => {
                    match signal {
                        Some(NetworkSignal::Offline) => {
                            info!("offline signal during probe; recovery abandoned");
                            let _ = phase_tx.send(ConnectionPhase::ConfirmedOffline);
                            return;
                        }
                        // Duplicate online signal: restart the probe.
                        Some(NetworkSignal::Online) => continue,
                        None => return,
                    }
                }
            };

            if reachable {
                info!(resync = was_confirmed_offline, "reachability confirmed; back online");
                let _ = phase_tx.send(ConnectionPhase::Online);
                if was_confirmed_offline {
                    let _ = event_tx.send(ConnectionEvent::ResyncRequired).await;
                }
                return;
            }

            // A failed probe is evidence of lost reachability even when the
            // stretch started from Online (spurious browser signal).
            let _ = phase_tx.send(ConnectionPhase::SuspectedOffline);
            debug!(retry = ?retry_interval, "probe failed; retry scheduled");

            // Wait out the retry interval, still interruptible by signals.
            tokio::select! {
                () = cancel.cancelled() => return,
                () = tokio::time::sleep(retry_interval) => {}
                signal = signal_rx.recv() => {
                    match signal {
                        Some(NetworkSignal::Offline) => {
                            info!("offline signal during retry wait; retry cancelled");
                            let _ = phase_tx.send(ConnectionPhase::ConfirmedOffline);
                            return;
                        }
                        Some(NetworkSignal::Online) => {}
                        None => return,
                    }
                }
            }
        }
    }
}

/// Handle returned from [`ConnectionMonitor::spawn`].
pub struct MonitorHandle {
    signal_tx: mpsc::Sender<NetworkSignal>,
    phase_rx: watch::Receiver<ConnectionPhase>,
    join_handle: Option<JoinHandle<()>>,
    /// Cancelled when the handle is dropped.
    cancel: CancellationToken,
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl MonitorHandle {
    /// Feed a browser network signal into the monitor.
    pub async fn signal(&self, signal: NetworkSignal) {
        let _ = self.signal_tx.send(signal).await;
    }

    /// Current connection phase.
    #[must_use]
    pub fn phase(&self) -> ConnectionPhase {
        *self.phase_rx.borrow()
    }

    /// Subscribe to phase changes (drives the offline indicator).
    #[must_use]
    pub fn phase_updates(&self) -> watch::Receiver<ConnectionPhase> {
        self.phase_rx.clone()
    }

    /// Signal the background loop to stop and wait for it to exit.
    pub async fn await_completion(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.join_handle.take() {
            let _ = handle.await;
        }
    }
}
