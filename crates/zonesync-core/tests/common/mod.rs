//! Test doubles and common utilities for contract tests
//!
//! `InMemoryTransport` keeps a zone in memory, logs every call and can be
//! told to fail specific calls. Clones share state, so a test can keep one
//! clone for inspection after handing another to the engine.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use zonesync_core::error::{Error, Result};
use zonesync_core::traits::ProviderTransport;
use zonesync_core::{
    DesiredRecord, ProviderRecord, ReconcileEvent, ReconcileObserver, ReconcileState, RecordDraft,
    RecordId,
};

pub const ZONE: &str = "example.com";

/// Kind of transport call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    List,
    Add,
    Update,
    Delete,
}

/// A logged transport call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(String),
    Add(RecordDraft),
    Update(ProviderRecord),
    Delete(RecordId),
}

impl Call {
    pub fn kind(&self) -> CallKind {
        match self {
            Call::List(_) => CallKind::List,
            Call::Add(_) => CallKind::Add,
            Call::Update(_) => CallKind::Update,
            Call::Delete(_) => CallKind::Delete,
        }
    }

    pub fn is_mutation(&self) -> bool {
        self.kind() != CallKind::List
    }
}

#[derive(Default)]
struct ZoneState {
    records: Vec<ProviderRecord>,
    next_id: u64,
    calls: Vec<Call>,
    counts: HashMap<CallKind, usize>,
    failures: Vec<(CallKind, usize)>,
}

/// In-memory provider with a call log and failure injection
#[derive(Clone)]
pub struct InMemoryTransport {
    state: Arc<Mutex<ZoneState>>,
    delay: Option<Duration>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ZoneState {
                next_id: 1,
                ..Default::default()
            })),
            delay: None,
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Seed the zone with `(host, type, data, ttl)` records; ids start at 1
    pub fn with_records(records: &[(&str, &str, &str, u32)]) -> Self {
        let transport = Self::new();
        for (host, rtype, data, ttl) in records {
            transport.insert(ZONE, host, rtype, data, *ttl);
        }
        transport
    }

    /// Sleep for `delay` inside every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Insert a record directly, bypassing the call log
    pub fn insert(&self, zone: &str, host: &str, rtype: &str, data: &str, ttl: u32) -> RecordId {
        let mut state = self.state.lock().unwrap();
        let id = RecordId(state.next_id);
        state.next_id += 1;
        state.records.push(ProviderRecord {
            id,
            zone: zone.to_string(),
            host: host.to_string(),
            rtype: rtype.to_string(),
            data: data.to_string(),
            ttl,
        });
        id
    }

    /// Make the `nth` (1-based) call of `kind` fail
    pub fn fail_nth(&self, kind: CallKind, nth: usize) {
        self.state.lock().unwrap().failures.push((kind, nth));
    }

    pub fn records(&self) -> Vec<ProviderRecord> {
        self.state.lock().unwrap().records.clone()
    }

    /// Records as a sorted multiset of (host, type, data, ttl)
    pub fn contents(&self) -> Vec<(String, String, String, u32)> {
        let mut contents: Vec<_> = self.records().iter().map(ProviderRecord::content_key).collect();
        contents.sort();
        contents
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn call_count(&self, kind: CallKind) -> usize {
        self.calls().iter().filter(|c| c.kind() == kind).count()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Highest number of calls observed running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self, call: Call) -> Result<()> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        let kind = call.kind();
        state.calls.push(call);
        let count = state.counts.entry(kind).or_insert(0);
        *count += 1;
        let nth = *count;

        if state.failures.contains(&(kind, nth)) {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::transport(
                "memory",
                format!("injected failure of {:?} #{}", kind, nth),
            ));
        }
        Ok(())
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ProviderTransport for InMemoryTransport {
    async fn list_records(&self, zone: &str) -> Result<Vec<ProviderRecord>> {
        self.enter(Call::List(zone.to_string())).await?;
        let records = self.records();
        self.leave();
        Ok(records)
    }

    async fn add_record(&self, draft: &RecordDraft) -> Result<ProviderRecord> {
        self.enter(Call::Add(draft.clone())).await?;
        let id = self.insert(&draft.zone, &draft.host, &draft.rtype, &draft.data, draft.ttl);
        let created = self.records().into_iter().find(|r| r.id == id);
        self.leave();
        created.ok_or_else(|| Error::transport("memory", "created record vanished"))
    }

    async fn update_record(&self, record: &ProviderRecord) -> Result<ProviderRecord> {
        self.enter(Call::Update(record.clone())).await?;
        let mut state = self.state.lock().unwrap();
        let result = match state.records.iter_mut().find(|r| r.id == record.id) {
            Some(stored) => {
                stored.host = record.host.clone();
                stored.rtype = record.rtype.clone();
                stored.data = record.data.clone();
                stored.ttl = record.ttl;
                Ok(stored.clone())
            }
            None => Err(Error::transport("memory", format!("no record {}", record.id))),
        };
        drop(state);
        self.leave();
        result
    }

    async fn delete_record(&self, id: RecordId) -> Result<()> {
        self.enter(Call::Delete(id)).await?;
        let mut state = self.state.lock().unwrap();
        let before = state.records.len();
        state.records.retain(|r| r.id != id);
        let removed = state.records.len() < before;
        drop(state);
        self.leave();
        if removed {
            Ok(())
        } else {
            Err(Error::transport("memory", format!("no record {}", id)))
        }
    }

    fn transport_name(&self) -> &'static str {
        "memory"
    }
}

/// Observer that keeps every event
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ReconcileEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<ReconcileEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Terminal states reported so far, in order
    pub fn finished_states(&self) -> Vec<ReconcileState> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ReconcileEvent::Finished { state, .. } => Some(state),
                _ => None,
            })
            .collect()
    }
}

impl ReconcileObserver for RecordingObserver {
    fn on_event(&self, event: &ReconcileEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Shorthand for a desired record with a TTL in seconds
pub fn desired(name: &str, rtype: &str, value: &str, ttl_secs: u64) -> DesiredRecord {
    DesiredRecord::new(name, rtype, value, Duration::from_secs(ttl_secs))
}
