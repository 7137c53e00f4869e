/// Check worker module - one concurrent worker per monitored service
///
/// A worker:
/// - Owns the status state machine of its service
/// - Runs checks on a timer, or on demand, one at a time
/// - Reports every outcome to the shared metrics store
///
/// Other components only talk to a worker through its [`WorkerHandle`].
mod runner;
mod state;

pub use runner::CheckWorker;
pub use state::{ServiceStatus, StatusSnapshot, WorkerState};

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Messages answered by a worker, even while a check is in flight
#[derive(Debug)]
pub enum WorkerCommand {
    GetStatus(oneshot::Sender<StatusSnapshot>),
}

/// Receiving side of a worker's queues
///
/// Owned by the supervision task so that queued commands survive a worker
/// restart. Forced checks have their own queue, which the worker only reads
/// while no check is running, so at most `capacity` of them can be pending.
#[derive(Debug)]
pub struct WorkerMailbox {
    pub(crate) commands: mpsc::Receiver<WorkerCommand>,
    pub(crate) forced: mpsc::Receiver<()>,
    pub(crate) shutdown: CancellationToken,
}

/// Cloneable address of a worker
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    commands: mpsc::Sender<WorkerCommand>,
    forced: mpsc::Sender<()>,
    shutdown: CancellationToken,
}

impl WorkerHandle {
    /// Create a handle and the mailbox its worker will read
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn channel(capacity: usize, shutdown: CancellationToken) -> (Self, WorkerMailbox) {
        let (commands_tx, commands_rx) = mpsc::channel(capacity);
        let (forced_tx, forced_rx) = mpsc::channel(capacity);
        let handle = Self { commands: commands_tx, forced: forced_tx, shutdown: shutdown.clone() };
        (handle, WorkerMailbox { commands: commands_rx, forced: forced_rx, shutdown })
    }

    /// Current state of the worker, or `None` once the worker is gone
    pub async fn status(&self) -> Option<StatusSnapshot> {
        let (reply, response) = oneshot::channel();
        self.commands.send(WorkerCommand::GetStatus(reply)).await.ok()?;
        response.await.ok()
    }

    /// Queue an immediate check; returns `false` once the worker is gone
    ///
    /// Waits while the worker's forced-check queue is full.
    pub async fn force_check(&self) -> bool {
        self.forced.send(()).await.is_ok()
    }

    /// Ask the worker to stop
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Resolves once the worker's supervision has ended
    pub async fn stopped(&self) {
        self.commands.closed().await;
    }

    /// Whether both handles address the same worker
    pub fn same_worker(&self, other: &WorkerHandle) -> bool {
        self.commands.same_channel(&other.commands)
    }
}
