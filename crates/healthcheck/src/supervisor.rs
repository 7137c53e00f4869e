//! Worker supervision.
//!
//! Every worker runs inside a supervision loop on its own task. A worker that
//! returns has stopped cleanly and is never restarted. A worker that panics is
//! restarted fresh (status `Unknown`, zero failures) on the same mailbox, as
//! long as it has not crashed `max_restarts` times within `window`. Past that
//! budget the service is unregistered and the failure is logged.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::time::Instant;
use tokio_util::task::TaskTracker;
use tracing::{error, warn};

use crate::registry::Registry;
use crate::worker::{CheckWorker, WorkerHandle, WorkerMailbox};

/// Bound on crash-restarts of a single worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    pub max_restarts: u32,
    pub window: Duration,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self { max_restarts: 3, window: Duration::from_secs(5) }
    }
}

impl RestartPolicy {
    /// Never restart; a crash removes the service
    pub fn never() -> Self {
        Self { max_restarts: 0, window: Duration::ZERO }
    }
}

/// Run `worker` under supervision on `tracker`
///
/// `handle` must be the registration of this worker in `registry`; it is only
/// removed if it still points at this worker when the restart budget runs out.
pub(crate) fn spawn(
    tracker: &TaskTracker,
    worker: CheckWorker,
    mut mailbox: WorkerMailbox,
    handle: WorkerHandle,
    registry: Arc<Registry>,
    policy: RestartPolicy,
) {
    tracker.spawn(async move {
        let name = worker.config().name.clone();
        let mut crashes: VecDeque<Instant> = VecDeque::new();

        loop {
            let run = AssertUnwindSafe(worker.run(&mut mailbox)).catch_unwind().await;

            let Err(panic) = run else { break };

            let now = Instant::now();
            crashes.retain(|at| now.duration_since(*at) < policy.window);

            if crashes.len() >= policy.max_restarts as usize {
                error!(
                    service = %name,
                    reason = panic_message(panic.as_ref()),
                    "Worker crashed too often, removing service"
                );
                registry.unregister_if(&name, |current| current.same_worker(&handle)).await;
                break;
            }

            crashes.push_back(now);
            warn!(
                service = %name,
                reason = panic_message(panic.as_ref()),
                attempt = crashes.len(),
                "Worker crashed, restarting"
            );
        }
    });
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
