use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::state::SharedState;

/// Periodically evict workspaces idle longer than the configured limit,
/// until shutdown is signaled.
pub fn spawn(state: SharedState, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    let max_idle = state.config.session_idle;
    let period = (max_idle / 4).clamp(Duration::from_secs(1), Duration::from_secs(300));

    tokio::spawn(async move {
        tracing::debug!(?period, "Workspace sweeper started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            state.workspaces.cleanup(max_idle);

            tokio::select! {
                _ = tokio::time::sleep(period) => {}
                _ = shutdown.changed() => {}
            }
        }

        tracing::debug!("Workspace sweeper stopped");
    })
}
