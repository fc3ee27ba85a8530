//! Plan execution
//!
//! Applies a [`ChangePlan`] one record at a time: deletions, then updates,
//! then additions. The first failure stops execution and is returned with
//! the operations that had already completed, so they can be compensated.

use tracing::debug;

use crate::engine::events::{ChangeKind, ReconcileEvent, ReconcileObserver};
use crate::error::Error;
use crate::plan::{ChangePlan, RecordUpdate};
use crate::record::{ProviderRecord, ZoneRecord};
use crate::traits::ProviderTransport;

/// The operations of a plan that completed against the provider
///
/// Built incrementally, so it is exact even when execution stops midway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutedPlan {
    /// Zone the operations were applied to
    pub zone: String,
    /// Records that were deleted
    pub deleted: Vec<ProviderRecord>,
    /// Records that were changed; `after` is the record as the provider stored it
    pub updated: Vec<RecordUpdate>,
    /// Records that were created, with their provider-assigned identifiers
    pub added: Vec<ProviderRecord>,
}

impl ExecutedPlan {
    pub fn new(zone: impl Into<String>) -> Self {
        Self {
            zone: zone.into(),
            ..Default::default()
        }
    }

    /// Number of completed operations
    pub fn len(&self) -> usize {
        self.deleted.len() + self.updated.len() + self.added.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The records now in place because of this execution, in caller format
    ///
    /// Updated records come first, then added ones, each in plan order.
    pub fn after_records(&self) -> Vec<ZoneRecord> {
        self.updated
            .iter()
            .map(|u| ZoneRecord::from(&u.after))
            .chain(self.added.iter().map(ZoneRecord::from))
            .collect()
    }
}

/// A failed execution
#[derive(Debug)]
pub struct ExecutionFailure {
    /// What completed before the failure
    pub executed: ExecutedPlan,
    /// Category of the operation that failed
    pub kind: ChangeKind,
    /// The provider error, unchanged
    pub error: Error,
}

/// Apply `plan` through `transport`
///
/// No operation is retried. On the first error nothing further is attempted,
/// in that category or any later one.
pub async fn execute(
    transport: &dyn ProviderTransport,
    plan: &ChangePlan,
    observer: &dyn ReconcileObserver,
) -> Result<ExecutedPlan, ExecutionFailure> {
    let mut executed = ExecutedPlan::new(plan.zone.clone());

    for record in &plan.deletions {
        debug!("Deleting {}", record);
        if let Err(error) = transport.delete_record(record.id).await {
            return Err(fail(executed, ChangeKind::Delete, error, observer));
        }
        observer.on_event(&ReconcileEvent::Deleted {
            record: record.clone(),
        });
        executed.deleted.push(record.clone());
    }

    for update in &plan.updates {
        debug!("Updating {} -> {}", update.before, update.after);
        let after = match transport.update_record(&update.after).await {
            Ok(after) => after,
            Err(error) => return Err(fail(executed, ChangeKind::Update, error, observer)),
        };
        observer.on_event(&ReconcileEvent::Updated {
            before: update.before.clone(),
            after: after.clone(),
        });
        executed.updated.push(RecordUpdate {
            before: update.before.clone(),
            after,
        });
    }

    for draft in &plan.additions {
        debug!("Adding {}", draft);
        let created = match transport.add_record(draft).await {
            Ok(created) => created,
            Err(error) => return Err(fail(executed, ChangeKind::Add, error, observer)),
        };
        observer.on_event(&ReconcileEvent::Added {
            record: created.clone(),
        });
        executed.added.push(created);
    }

    Ok(executed)
}

fn fail(
    executed: ExecutedPlan,
    kind: ChangeKind,
    error: Error,
    observer: &dyn ReconcileObserver,
) -> ExecutionFailure {
    observer.on_event(&ReconcileEvent::Failed {
        kind,
        error: error.to_string(),
    });
    ExecutionFailure {
        executed,
        kind,
        error,
    }
}
