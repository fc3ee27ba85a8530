//! Minimal embedding example for zonesync-core
//!
//! Drives a `SyncEngine` over an in-memory transport: converges a zone,
//! re-runs the same reconciliation as a no-op, then makes the provider fail
//! an addition and shows the rollback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use zonesync_core::traits::ProviderTransport;
use zonesync_core::{
    ChannelObserver, DesiredRecord, EngineConfig, Error, ProviderRecord, ReconcileEvent,
    RecordDraft, RecordId, Result, SyncEngine,
};

const ZONE: &str = "example.com";

/// Provider that keeps one zone in memory
struct EmbeddedTransport {
    records: Mutex<Vec<ProviderRecord>>,
    next_id: Mutex<u64>,
    fail_adds: Arc<AtomicBool>,
}

impl EmbeddedTransport {
    fn new(seed: &[(&str, &str, &str, u32)]) -> Self {
        let records = seed
            .iter()
            .enumerate()
            .map(|(i, (host, rtype, data, ttl))| ProviderRecord {
                id: RecordId(i as u64 + 1),
                zone: ZONE.to_string(),
                host: host.to_string(),
                rtype: rtype.to_string(),
                data: data.to_string(),
                ttl: *ttl,
            })
            .collect();

        Self {
            records: Mutex::new(records),
            next_id: Mutex::new(seed.len() as u64 + 1),
            fail_adds: Arc::new(AtomicBool::new(false)),
        }
    }

    fn records(&self) -> std::sync::MutexGuard<'_, Vec<ProviderRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl ProviderTransport for EmbeddedTransport {
    async fn list_records(&self, _zone: &str) -> Result<Vec<ProviderRecord>> {
        Ok(self.records().clone())
    }

    async fn add_record(&self, draft: &RecordDraft) -> Result<ProviderRecord> {
        if self.fail_adds.load(Ordering::SeqCst) {
            return Err(Error::transport("embedded", "provider rejected the record"));
        }

        let mut next_id = self.next_id.lock().unwrap_or_else(PoisonError::into_inner);
        let record = ProviderRecord {
            id: RecordId(*next_id),
            zone: draft.zone.clone(),
            host: draft.host.clone(),
            rtype: draft.rtype.clone(),
            data: draft.data.clone(),
            ttl: draft.ttl,
        };
        *next_id += 1;
        self.records().push(record.clone());
        Ok(record)
    }

    async fn update_record(&self, record: &ProviderRecord) -> Result<ProviderRecord> {
        let mut records = self.records();
        let stored = records
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| Error::transport("embedded", format!("no record {}", record.id)))?;
        *stored = record.clone();
        Ok(stored.clone())
    }

    async fn delete_record(&self, id: RecordId) -> Result<()> {
        self.records().retain(|r| r.id != id);
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "embedded"
    }
}

fn drain(rx: &mut mpsc::Receiver<ReconcileEvent>) {
    while let Ok(event) = rx.try_recv() {
        println!("   [Event] {:?}", event);
    }
}

async fn print_zone(engine: &SyncEngine) -> Result<()> {
    for r in engine.get_records(ZONE).await? {
        println!("   #{} {}", r.id, r.record);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    println!("=== Embedded zonesync-core Example ===\n");

    let transport = EmbeddedTransport::new(&[
        ("www", "A", "192.0.2.1", 3600),
        ("_acme-challenge", "TXT", "stale-token", 60),
        ("_acme-challenge", "TXT", "older-token", 60),
    ]);
    let fail_adds = Arc::clone(&transport.fail_adds);

    let (observer, mut events) = ChannelObserver::new(EngineConfig::default().event_channel_capacity);
    let engine = SyncEngine::with_observer(Box::new(transport), Arc::new(observer));

    println!("1. Initial zone:");
    print_zone(&engine).await?;
    drain(&mut events);

    let desired = vec![
        DesiredRecord::new("www", "A", "192.0.2.10", Duration::from_secs(3600)),
        DesiredRecord::new("_acme-challenge", "TXT", "fresh-token", Duration::from_secs(60)),
        DesiredRecord::new("@", "MX", "mail.example.com", Duration::from_secs(3600)).with_priority(10),
    ];

    println!("\n2. Converging...");
    let changed = engine.set_records(ZONE, &desired).await?;
    println!("   {} record(s) written", changed.len());
    drain(&mut events);
    print_zone(&engine).await?;
    drain(&mut events);

    println!("\n3. Running the same reconciliation again...");
    let changed = engine.set_records(ZONE, &desired).await?;
    println!("   {} record(s) written", changed.len());
    drain(&mut events);

    println!("\n4. Provider starts rejecting additions...");
    fail_adds.store(true, Ordering::SeqCst);
    let desired = vec![
        DesiredRecord::new("www", "A", "192.0.2.20", Duration::from_secs(3600)),
        DesiredRecord::new("api", "A", "192.0.2.30", Duration::from_secs(300)),
    ];
    match engine.set_records(ZONE, &desired).await {
        Ok(_) => println!("   unexpectedly succeeded"),
        Err(e) => println!("   failed: {} (degraded: {})", e, e.is_degraded()),
    }
    drain(&mut events);

    println!("\n5. Zone after rollback:");
    print_zone(&engine).await?;

    println!("\n=== Embedding Successful ===");
    println!("Key Points:");
    println!("- The engine owns ordering, matching and rollback");
    println!("- Progress is reported through an injected observer");
    println!("- No global state");

    Ok(())
}
