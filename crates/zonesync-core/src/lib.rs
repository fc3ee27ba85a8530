// # zonesync-core
//
// Core library for reconciling desired DNS records against the records a
// provider actually holds.
//
// ## Architecture Overview
//
// - **ProviderTransport**: Trait for the four single-record provider calls
// - **matcher**: Field-wise comparison where unset desired fields are wildcards
// - **plan**: Pure diff of desired records against a fresh provider snapshot
// - **SyncEngine**: Lock-guarded handle executing plans with rollback
// - **TransportRegistry**: Plugin-based registry for provider transports
//
// ## Design Principles
//
// 1. **Provider is the source of truth**: every call lists the zone again, nothing is cached
// 2. **All-or-nothing calls**: a failed step undoes the completed ones
// 3. **Plugin-Based**: transports are registered dynamically, no hard-coded if-else
// 4. **Library-First**: all functionality can be used as a library
// 5. **Injected reporting**: progress goes to an observer, not process-wide flags

pub mod config;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod normalize;
pub mod plan;
pub mod record;
pub mod registry;
pub mod traits;

// Re-export core types for convenience
pub use config::{EngineConfig, ProviderConfig, ZoneSyncConfig};
pub use engine::{
    ChangeKind, ChannelObserver, ExecutedPlan, ExecutionFailure, ReconcileEvent,
    ReconcileObserver, ReconcileState, SyncEngine, TracingObserver,
};
pub use error::{Error, Result};
pub use matcher::{MatchResult, match_record};
pub use plan::{ChangePlan, RecordUpdate};
pub use record::{DesiredRecord, ProviderRecord, RecordDraft, RecordId, ZoneRecord};
pub use registry::TransportRegistry;
pub use traits::{ProviderTransport, TransportFactory};
