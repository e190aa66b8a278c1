//! Connectivity monitoring use case

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::ports::ConnectivityProbe;

/// Debounced connectivity state derived from a periodic probe.
///
/// A state flip is committed only if a re-probe after the debounce
/// window agrees, so a flapping link cannot thrash the sync engine.
/// Consumers watch the channel; the value is a hint, not ground
/// truth, and sync failures remain the authoritative signal.
pub struct NetworkMonitor {
    state: watch::Receiver<bool>,
    task: JoinHandle<()>,
}

impl NetworkMonitor {
    /// Spawn the monitor loop. The state starts offline and corrects
    /// itself after the first probe.
    pub fn spawn<P>(probe: P, poll_interval: Duration, debounce: Duration) -> Self
    where
        P: ConnectivityProbe + 'static,
    {
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            monitor_loop(probe, tx, poll_interval, debounce).await;
        });
        Self { state: rx, task }
    }

    /// Get the current debounced state
    pub fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    /// Subscribe to state flips
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.clone()
    }
}

impl Drop for NetworkMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn monitor_loop<P: ConnectivityProbe>(
    probe: P,
    tx: watch::Sender<bool>,
    poll_interval: Duration,
    debounce: Duration,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    loop {
        ticker.tick().await;
        let observed = probe.check().await;
        let current = *tx.borrow();
        if observed == current {
            continue;
        }

        // Hold the flip until a re-probe after the window agrees;
        // a blip that reverts within the window is dropped entirely
        tokio::time::sleep(debounce).await;
        let settled = probe.check().await;
        if settled != current && tx.send(settled).is_err() {
            return;
        }
        ticker.reset();
    }
}
