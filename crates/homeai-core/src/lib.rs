// homeai-core: Device aggregation layer between homeai-api and consumers (CLI).

pub mod adapter;
pub mod aggregator;
pub mod assistant;
pub mod config;
pub mod connection;
pub mod convert;
pub mod demo;
pub mod error;
pub mod hub;
pub mod intent;
pub mod model;
pub mod router;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use adapter::{AdapterSet, DeviceAdapter, HassAdapter, MqttAdapter, SmartThingsAdapter};
pub use aggregator::Aggregator;
pub use assistant::{Assistant, CompletionBackend, OpenAiBackend};
pub use config::{
    AdapterSettings, CompletionSettings, HassSettings, HubConfig, MqttSettings,
    SmartThingsSettings, TlsVerification,
};
pub use connection::ConnectionManager;
pub use error::CoreError;
pub use hub::HomeHub;
pub use intent::{IntentParser, KeywordIntentParser};
pub use router::CommandRouter;
pub use store::{Catalog, CatalogOrigin, DeviceStore, SourceOutcome, SourceReport};
pub use stream::{CatalogStream, DeviceFilter};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    ActionParams, ActionVerb, ChatMessage, ChatRole, Device, DeviceAction, DeviceId, DeviceRoute,
    DeviceState, DeviceType, FirmwareFamily, Integration,
};
