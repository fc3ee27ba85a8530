//! Diff planning
//!
//! Computes the changes that bring a provider snapshot in line with a set of
//! desired records. Planning is pure: the snapshot is fetched by the caller
//! beforehand and nothing here touches the provider.
//!
//! ## Algorithm
//!
//! 1. **Converged pairs**: each desired record (in input order) claims the
//!    first unclaimed snapshot record that fully matches it. Nothing is
//!    queued for the pair.
//! 2. **Updates and additions**: each remaining desired record takes the
//!    first unclaimed snapshot record of its RRset (same name and type) and
//!    queues an update of it. With no such record, an addition is queued.
//! 3. **Deletions**: every snapshot record still unclaimed that belongs to
//!    the RRset of some desired record is queued for deletion.
//!
//! Every desired record must name a concrete RRset: an unset name or type
//! would widen the RRset to every host or every type and is rejected.
//!
//! A snapshot record is claimed at most once, so no identifier is both
//! updated and deleted, and re-planning after a successful run yields an
//! empty plan.

use std::fmt;

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::matcher::match_record;
use crate::record::{DesiredRecord, ProviderRecord, RecordDraft};

/// An existing record and the values it should be changed to
///
/// `before` and `after` always share the same identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    pub before: ProviderRecord,
    pub after: ProviderRecord,
}

/// The changes needed to converge a zone
///
/// Each list preserves the order in which desired records were supplied.
/// Execution order across lists is fixed: deletions, updates, additions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangePlan {
    /// Zone the plan applies to
    pub zone: String,
    /// Snapshot records to remove
    pub deletions: Vec<ProviderRecord>,
    /// Snapshot records to change in place
    pub updates: Vec<RecordUpdate>,
    /// Records to create
    pub additions: Vec<RecordDraft>,
}

impl ChangePlan {
    /// Create an empty plan for `zone`
    pub fn new(zone: impl Into<String>) -> Self {
        Self {
            zone: zone.into(),
            ..Default::default()
        }
    }

    /// Whether the zone is already converged
    pub fn is_empty(&self) -> bool {
        self.deletions.is_empty() && self.updates.is_empty() && self.additions.is_empty()
    }

    /// Total number of provider operations
    pub fn len(&self) -> usize {
        self.deletions.len() + self.updates.len() + self.additions.len()
    }
}

impl fmt::Display for ChangePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} deletion(s), {} update(s), {} addition(s)",
            self.zone,
            self.deletions.len(),
            self.updates.len(),
            self.additions.len()
        )
    }
}

/// Plan the changes that make `snapshot` hold exactly `desired` for every
/// RRset the desired records touch
///
/// # Errors
///
/// Returns [`Error::Validation`] if a desired record leaves its name or type
/// unset, since it would not identify a single RRset.
pub fn plan(zone: &str, desired: &[DesiredRecord], snapshot: &[ProviderRecord]) -> Result<ChangePlan> {
    reject_unconstrained(desired)?;
    require_rrset(desired)?;

    let mut plan = ChangePlan::new(zone);
    let mut claimed = vec![false; snapshot.len()];
    let mut converged = vec![false; desired.len()];

    for (di, d) in desired.iter().enumerate() {
        let found = snapshot
            .iter()
            .enumerate()
            .find(|(pi, p)| !claimed[*pi] && match_record(d, p).all())
            .map(|(pi, _)| pi);

        if let Some(pi) = found {
            trace!("{} already converged as {}", d, snapshot[pi]);
            claimed[pi] = true;
            converged[di] = true;
        }
    }

    for (di, d) in desired.iter().enumerate() {
        if converged[di] {
            continue;
        }

        let found = snapshot
            .iter()
            .enumerate()
            .find(|(pi, p)| !claimed[*pi] && match_record(d, p).rrset())
            .map(|(pi, _)| pi);

        match found {
            Some(pi) => {
                claimed[pi] = true;
                let before = &snapshot[pi];
                let after = converge(d, before);
                trace!("Update {} -> {}", before, after);
                plan.updates.push(RecordUpdate {
                    before: before.clone(),
                    after,
                });
            }
            None => {
                let draft = d.to_draft(zone);
                trace!("Add {}", draft);
                plan.additions.push(draft);
            }
        }
    }

    for d in desired {
        for (pi, p) in snapshot.iter().enumerate() {
            if !claimed[pi] && match_record(d, p).rrset() {
                trace!("Delete stale {}", p);
                claimed[pi] = true;
                plan.deletions.push(p.clone());
            }
        }
    }

    debug!("Planned {}", plan);
    Ok(plan)
}

/// Select every snapshot record that fully matches one of `records`
///
/// Each snapshot record is selected at most once; order follows `records`.
///
/// # Errors
///
/// Returns [`Error::Validation`] for a record with no field set.
pub fn plan_removal(records: &[DesiredRecord], snapshot: &[ProviderRecord]) -> Result<Vec<ProviderRecord>> {
    reject_unconstrained(records)?;

    let mut selected = vec![false; snapshot.len()];
    let mut removals = Vec::new();
    for r in records {
        for (pi, p) in snapshot.iter().enumerate() {
            if !selected[pi] && match_record(r, p).all() {
                selected[pi] = true;
                removals.push(p.clone());
            }
        }
    }
    Ok(removals)
}

fn reject_unconstrained(records: &[DesiredRecord]) -> Result<()> {
    match records.iter().position(DesiredRecord::is_unconstrained) {
        Some(i) => Err(Error::validation(format!(
            "record #{} has no name, type, value or ttl and would match the whole zone",
            i
        ))),
        None => Ok(()),
    }
}

fn require_rrset(records: &[DesiredRecord]) -> Result<()> {
    for (i, r) in records.iter().enumerate() {
        if r.name.is_empty() {
            return Err(Error::validation(format!(
                "record #{} ({}) has no name; set needs a concrete RRset",
                i, r
            )));
        }
        if r.rtype.is_empty() {
            return Err(Error::validation(format!(
                "record #{} ({}) has no type; set needs a concrete RRset",
                i, r
            )));
        }
    }
    Ok(())
}

// Unset desired fields keep the provider's current value.
fn converge(desired: &DesiredRecord, before: &ProviderRecord) -> ProviderRecord {
    ProviderRecord {
        id: before.id,
        zone: before.zone.clone(),
        host: before.host.clone(),
        rtype: desired.rtype.to_ascii_uppercase(),
        data: if desired.value.is_empty() {
            before.data.clone()
        } else {
            desired.provider_data()
        },
        ttl: if desired.ttl.is_zero() {
            before.ttl
        } else {
            desired.ttl_secs()
        },
    }
}
