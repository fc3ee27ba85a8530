// # Provider Transport Trait
//
// Defines the four single-record calls the reconciliation core makes against
// a DNS provider API.
//
// ## Implementations
//
// - GleSYS: `zonesync-provider-glesys` crate
//
// ## Usage
//
// ```rust,ignore
// use zonesync_core::ProviderTransport;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let transport = /* ProviderTransport implementation */;
//
//     for record in transport.list_records("example.com").await? {
//         println!("{}", record);
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::record::{ProviderRecord, RecordDraft, RecordId};

/// Trait for provider transport implementations
///
/// A transport owns the wire format, authentication and HTTP plumbing of
/// one provider. Everything above it (matching, planning, ordering,
/// rollback, locking) is owned by [`SyncEngine`](crate::SyncEngine).
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// ## Allowed Capabilities
/// - Perform HTTP/HTTPS API calls to their endpoints only
/// - Parse provider-specific responses
/// - Return success or failure
///
/// ## Forbidden Capabilities
/// - Retry or back off (a failure must surface immediately so the engine
///   can compensate)
/// - Cache records between calls (the provider is the only source of truth)
/// - Batch or reorder calls
///
/// Every call is single-shot: one request, one record.
#[async_trait]
pub trait ProviderTransport: Send + Sync {
    /// List every record in a zone
    ///
    /// # Parameters
    ///
    /// - `zone`: Cleaned zone name (e.g. "example.com")
    async fn list_records(&self, zone: &str) -> Result<Vec<ProviderRecord>, crate::Error>;

    /// Create a record
    ///
    /// # Returns
    ///
    /// - `Ok(ProviderRecord)`: The created record with its assigned identifier
    /// - `Err(Error)`: If the call failed
    async fn add_record(&self, draft: &RecordDraft) -> Result<ProviderRecord, crate::Error>;

    /// Replace host, type, data and TTL of the record with `record.id`
    ///
    /// # Returns
    ///
    /// - `Ok(ProviderRecord)`: The record as stored after the update
    /// - `Err(Error)`: If the call failed
    async fn update_record(&self, record: &ProviderRecord) -> Result<ProviderRecord, crate::Error>;

    /// Delete the record with identifier `id`
    async fn delete_record(&self, id: RecordId) -> Result<(), crate::Error>;

    /// Get the transport name (for logging/debugging)
    ///
    /// # Returns
    ///
    /// A static string identifying the provider (e.g., "glesys")
    fn transport_name(&self) -> &'static str;
}

/// Helper trait for constructing transports from configuration
pub trait TransportFactory: Send + Sync {
    /// Create a ProviderTransport instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Configuration specific to this provider
    ///
    /// # Returns
    ///
    /// A boxed ProviderTransport trait object
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn ProviderTransport>, crate::Error>;
}
