//! Rollback of a partially executed plan
//!
//! Every completed operation gets one compensating call:
//!
//! | Completed   | Compensation                              |
//! |-------------|-------------------------------------------|
//! | deletion    | re-create the record from its old fields  |
//! | update      | update the record back to its old values  |
//! | addition    | delete the created record by its id       |
//!
//! Compensation walks the executed operations backwards: additions first,
//! then updates, then deletions, each list from last to first.

use tracing::{error, warn};

use crate::engine::events::{ChangeKind, ReconcileEvent, ReconcileObserver};
use crate::engine::execute::ExecutionFailure;
use crate::error::Error;
use crate::traits::ProviderTransport;

/// Undo what `failure` completed and return the error the caller should see
///
/// If every compensating call succeeds, the execution error is returned
/// unchanged. Otherwise the first compensation failure is returned as
/// [`Error::Compensation`], wrapping it; later compensations are not
/// attempted.
pub async fn compensate(
    transport: &dyn ProviderTransport,
    failure: ExecutionFailure,
    observer: &dyn ReconcileObserver,
) -> Error {
    let ExecutionFailure {
        executed,
        kind,
        error: original,
    } = failure;
    let total = executed.len();
    let mut undone = 0;

    warn!(
        "Rolling back {} completed operation(s) on {} after failed {}: {}",
        total, executed.zone, kind, original
    );

    for record in executed.added.iter().rev() {
        match transport.delete_record(record.id).await {
            Ok(()) => {
                undone += 1;
                observer.on_event(&ReconcileEvent::Compensated {
                    undone: ChangeKind::Add,
                    record: record.clone(),
                });
            }
            Err(e) => return degraded(original, e, undone, total),
        }
    }

    for update in executed.updated.iter().rev() {
        match transport.update_record(&update.before).await {
            Ok(restored) => {
                undone += 1;
                observer.on_event(&ReconcileEvent::Compensated {
                    undone: ChangeKind::Update,
                    record: restored,
                });
            }
            Err(e) => return degraded(original, e, undone, total),
        }
    }

    for record in executed.deleted.iter().rev() {
        match transport.add_record(&record.draft()).await {
            Ok(recreated) => {
                undone += 1;
                observer.on_event(&ReconcileEvent::Compensated {
                    undone: ChangeKind::Delete,
                    record: recreated,
                });
            }
            Err(e) => return degraded(original, e, undone, total),
        }
    }

    original
}

fn degraded(original: Error, source: Error, undone: usize, total: usize) -> Error {
    let remaining = total - undone;
    error!(
        "Rollback failed with {} operation(s) still applied: {}",
        remaining, source
    );
    Error::compensation(original, source, undone, remaining)
}
