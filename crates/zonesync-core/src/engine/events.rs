//! Reconciliation events
//!
//! The engine never decides on its own how loudly to report progress. Every
//! step is handed to a [`ReconcileObserver`] injected at construction time:
//! [`TracingObserver`] turns events into log lines, [`ChannelObserver`]
//! forwards them to a bounded channel for a host to consume.

use std::fmt;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

use crate::record::ProviderRecord;

/// Category of a single provider operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Delete,
    Update,
    Add,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Delete => write!(f, "delete"),
            ChangeKind::Update => write!(f, "update"),
            ChangeKind::Add => write!(f, "add"),
        }
    }
}

/// Terminal state of a reconciliation call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReconcileState {
    /// Every planned operation succeeded
    Converged,
    /// An operation failed and every completed operation was undone
    RolledBack,
    /// An operation failed and a compensating operation failed too
    Degraded,
}

impl fmt::Display for ReconcileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileState::Converged => write!(f, "converged"),
            ReconcileState::RolledBack => write!(f, "rolled back"),
            ReconcileState::Degraded => write!(f, "degraded"),
        }
    }
}

/// Events emitted while operating on a zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileEvent {
    /// Current provider records were listed
    SnapshotFetched { zone: String, records: usize },

    /// A change plan was computed
    Planned {
        zone: String,
        deletions: usize,
        updates: usize,
        additions: usize,
    },

    /// A record was deleted
    Deleted { record: ProviderRecord },

    /// A record was changed in place
    Updated {
        before: ProviderRecord,
        after: ProviderRecord,
    },

    /// A record was created
    Added { record: ProviderRecord },

    /// A provider operation failed
    Failed { kind: ChangeKind, error: String },

    /// A completed operation of kind `undone` was reverted; `record` is the
    /// record the compensating call acted on
    Compensated {
        undone: ChangeKind,
        record: ProviderRecord,
    },

    /// A reconciliation call reached a terminal state
    Finished { zone: String, state: ReconcileState },
}

/// Receiver of reconciliation events
///
/// Called synchronously from the reconciliation task while the zone lock is
/// held, so implementations must not block.
pub trait ReconcileObserver: Send + Sync {
    fn on_event(&self, event: &ReconcileEvent);
}

/// Observer that logs every event through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ReconcileObserver for TracingObserver {
    fn on_event(&self, event: &ReconcileEvent) {
        match event {
            ReconcileEvent::SnapshotFetched { zone, records } => {
                debug!("Fetched {} record(s) for {}", records, zone);
            }
            ReconcileEvent::Planned {
                zone,
                deletions,
                updates,
                additions,
            } => {
                debug!(
                    "Planned {}: {} deletion(s), {} update(s), {} addition(s)",
                    zone, deletions, updates, additions
                );
            }
            ReconcileEvent::Deleted { record } => info!("Deleted {}", record),
            ReconcileEvent::Updated { before, after } => info!("Updated {} -> {}", before, after),
            ReconcileEvent::Added { record } => info!("Added {}", record),
            ReconcileEvent::Failed { kind, error } => warn!("Failed to {} record: {}", kind, error),
            ReconcileEvent::Compensated { undone, record } => {
                info!("Reverted {} of {}", undone, record);
            }
            ReconcileEvent::Finished { zone, state } => match state {
                ReconcileState::Converged => info!("{} converged", zone),
                ReconcileState::RolledBack => warn!("{} rolled back", zone),
                ReconcileState::Degraded => error!("{} left degraded after failed rollback", zone),
            },
        }
    }
}

/// Observer that forwards events to a bounded channel
///
/// When the channel is full, new events are dropped with a warning so a slow
/// consumer never stalls reconciliation.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::Sender<ReconcileEvent>,
}

impl ChannelObserver {
    /// Create an observer and the receiving end of its channel
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ReconcileEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl ReconcileObserver for ChannelObserver {
    fn on_event(&self, event: &ReconcileEvent) {
        match self.tx.try_send(event.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Event receiver dropped, discarding event");
            }
        }
    }
}
