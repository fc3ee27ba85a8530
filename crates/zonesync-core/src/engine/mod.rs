//! Zone synchronization engine
//!
//! The SyncEngine is the host-facing handle for one set of provider
//! credentials. It is responsible for:
//! - Fetching a fresh snapshot of the zone for every call
//! - Planning the changes that converge the zone to the desired records
//! - Executing the plan in a fixed order
//! - Rolling back completed operations when one fails
//!
//! ## Architecture
//!
//! ```text
//!              desired records
//!                     │
//!                     ▼
//!            ┌────────────────┐   list    ┌───────────────────┐
//!            │   SyncEngine   │──────────▶│ ProviderTransport │
//!            │  (zone lock)   │◀──────────│                   │
//!            └────────────────┘  snapshot └───────────────────┘
//!                     │                             ▲
//!        plan()       ▼        execute()            │
//!   ┌──────────────────────────────────────┐        │
//!   │ deletions ─▶ updates ─▶ additions    │────────┤
//!   └──────────────────────────────────────┘        │
//!                     │ failure                     │
//!                     ▼                             │
//!            ┌────────────────┐   compensate        │
//!            │    rollback    │─────────────────────┘
//!            └────────────────┘
//! ```
//!
//! ## Call Flow
//!
//! 1. Acquire the zone lock (held until the call returns, on every path)
//! 2. List the zone and check every record belongs to it
//! 3. Plan; a planning error returns before any provider change
//! 4. Execute; on failure, compensate and return the resulting error
//! 5. Emit a `Finished` event with the terminal state

pub mod events;
pub mod execute;
pub mod rollback;

pub use events::{
    ChangeKind, ChannelObserver, ReconcileEvent, ReconcileObserver, ReconcileState,
    TracingObserver,
};
pub use execute::{ExecutedPlan, ExecutionFailure};

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info};

use crate::config::ZoneSyncConfig;
use crate::error::{Error, Result};
use crate::normalize::{clean_zone, require_zone};
use crate::plan::{self, ChangePlan};
use crate::record::{DesiredRecord, ProviderRecord, ZoneRecord};
use crate::registry::TransportRegistry;
use crate::traits::ProviderTransport;

/// Zone synchronization engine
///
/// Wraps one [`ProviderTransport`] together with the lock that serializes
/// every operation made through it.
///
/// ## Locking
///
/// Each public operation holds an internal `tokio::sync::Mutex` for its
/// whole duration, from the initial listing through compensation, so two
/// callers never act on interleaved snapshots. The lock is not reentrant:
/// an observer must not call back into the same engine.
pub struct SyncEngine {
    transport: Box<dyn ProviderTransport>,
    lock: Mutex<()>,
    observer: Arc<dyn ReconcileObserver>,
}

impl SyncEngine {
    /// Create an engine that reports through `tracing`
    pub fn new(transport: Box<dyn ProviderTransport>) -> Self {
        Self::with_observer(transport, Arc::new(TracingObserver))
    }

    /// Create an engine with a custom observer
    pub fn with_observer(
        transport: Box<dyn ProviderTransport>,
        observer: Arc<dyn ReconcileObserver>,
    ) -> Self {
        Self {
            transport,
            lock: Mutex::new(()),
            observer,
        }
    }

    /// Build an engine from configuration using a registry of transports
    ///
    /// Events are delivered through a [`ChannelObserver`] sized by
    /// `config.engine.event_channel_capacity`.
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields reconciliation events
    pub fn from_config(
        config: &ZoneSyncConfig,
        registry: &TransportRegistry,
    ) -> Result<(Self, mpsc::Receiver<ReconcileEvent>)> {
        config.validate()?;
        let transport = registry.create_transport(&config.provider)?;
        let (observer, rx) = ChannelObserver::new(config.engine.event_channel_capacity);

        Ok((Self::with_observer(transport, Arc::new(observer)), rx))
    }

    /// Name of the underlying transport
    pub fn transport_name(&self) -> &'static str {
        self.transport.transport_name()
    }

    /// List every record in `zone`
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if the zone is empty after cleaning
    /// - [`Error::Consistency`] if the provider returns a record of another zone
    pub async fn get_records(&self, zone: &str) -> Result<Vec<ZoneRecord>> {
        let zone = require_zone(zone)?;
        let _guard = self.lock.lock().await;

        let snapshot = self.snapshot(&zone).await?;
        Ok(snapshot.iter().map(ZoneRecord::from).collect())
    }

    /// Create `records` without looking at what the zone already holds
    ///
    /// Stops at the first failure. Records created before it stay in place.
    pub async fn append_records(
        &self,
        zone: &str,
        records: &[DesiredRecord],
    ) -> Result<Vec<ZoneRecord>> {
        let zone = require_zone(zone)?;
        let _guard = self.lock.lock().await;

        let mut created = Vec::with_capacity(records.len());
        for record in records {
            let draft = record.to_draft(&zone);
            match self.transport.add_record(&draft).await {
                Ok(added) => {
                    self.observer.on_event(&ReconcileEvent::Added {
                        record: added.clone(),
                    });
                    created.push(ZoneRecord::from(&added));
                }
                Err(e) => {
                    self.observer.on_event(&ReconcileEvent::Failed {
                        kind: ChangeKind::Add,
                        error: e.to_string(),
                    });
                    return Err(e);
                }
            }
        }

        info!("Appended {} record(s) to {}", created.len(), zone);
        Ok(created)
    }

    /// Converge `zone` to `records`
    ///
    /// Only the RRsets (name and type) named by `records` are touched. On
    /// success, returns the records that were updated or created; an already
    /// converged zone returns an empty list.
    ///
    /// # Errors
    ///
    /// - Planning errors before any provider change
    /// - The failing operation's error after a complete rollback
    /// - [`Error::Compensation`] if the rollback itself failed
    pub async fn set_records(
        &self,
        zone: &str,
        records: &[DesiredRecord],
    ) -> Result<Vec<ZoneRecord>> {
        let zone = require_zone(zone)?;
        let _guard = self.lock.lock().await;

        let plan = self.plan_locked(&zone, records).await?;
        if plan.is_empty() {
            debug!("{} already converged", zone);
            self.finish(&zone, ReconcileState::Converged);
            return Ok(Vec::new());
        }

        match execute::execute(self.transport.as_ref(), &plan, self.observer.as_ref()).await {
            Ok(executed) => {
                self.finish(&zone, ReconcileState::Converged);
                Ok(executed.after_records())
            }
            Err(failure) => {
                let error =
                    rollback::compensate(self.transport.as_ref(), failure, self.observer.as_ref())
                        .await;
                let state = if error.is_degraded() {
                    ReconcileState::Degraded
                } else {
                    ReconcileState::RolledBack
                };
                self.finish(&zone, state);
                Err(error)
            }
        }
    }

    /// Compute the plan `set_records` would execute, without executing it
    pub async fn plan(&self, zone: &str, records: &[DesiredRecord]) -> Result<ChangePlan> {
        let zone = require_zone(zone)?;
        let _guard = self.lock.lock().await;

        self.plan_locked(&zone, records).await
    }

    /// Delete every record of `zone` that fully matches one of `records`
    ///
    /// Unset fields act as wildcards. Returns the deleted records. Stops at
    /// the first failure; records deleted before it stay deleted.
    pub async fn delete_records(
        &self,
        zone: &str,
        records: &[DesiredRecord],
    ) -> Result<Vec<ZoneRecord>> {
        let zone = require_zone(zone)?;
        let _guard = self.lock.lock().await;

        let snapshot = self.snapshot(&zone).await?;
        let targets = plan::plan_removal(records, &snapshot)?;

        let mut deleted = Vec::with_capacity(targets.len());
        for record in targets {
            if let Err(e) = self.transport.delete_record(record.id).await {
                self.observer.on_event(&ReconcileEvent::Failed {
                    kind: ChangeKind::Delete,
                    error: e.to_string(),
                });
                return Err(e);
            }
            deleted.push(ZoneRecord::from(&record));
            self.observer.on_event(&ReconcileEvent::Deleted { record });
        }

        info!("Deleted {} record(s) from {}", deleted.len(), zone);
        Ok(deleted)
    }

    async fn plan_locked(&self, zone: &str, records: &[DesiredRecord]) -> Result<ChangePlan> {
        let snapshot = self.snapshot(zone).await?;
        let plan = plan::plan(zone, records, &snapshot)?;

        self.observer.on_event(&ReconcileEvent::Planned {
            zone: zone.to_string(),
            deletions: plan.deletions.len(),
            updates: plan.updates.len(),
            additions: plan.additions.len(),
        });
        Ok(plan)
    }

    // Caller must hold the lock.
    async fn snapshot(&self, zone: &str) -> Result<Vec<ProviderRecord>> {
        let records = self.transport.list_records(zone).await?;

        if let Some(foreign) = records
            .iter()
            .find(|r| !clean_zone(&r.zone).eq_ignore_ascii_case(zone))
        {
            return Err(Error::consistency(format!(
                "record {} belongs to zone '{}', expected '{}'",
                foreign.id, foreign.zone, zone
            )));
        }

        self.observer.on_event(&ReconcileEvent::SnapshotFetched {
            zone: zone.to_string(),
            records: records.len(),
        });
        Ok(records)
    }

    fn finish(&self, zone: &str, state: ReconcileState) {
        self.observer.on_event(&ReconcileEvent::Finished {
            zone: zone.to_string(),
            state,
        });
    }
}
