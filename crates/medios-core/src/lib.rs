pub mod activity;
pub mod api;
pub mod config;
pub mod error;
pub mod news;
pub mod oracle;
pub mod prompt;
pub mod query;
pub mod shape;
pub mod sources;
pub mod transport;
pub mod types;

pub use api::MediaAssistant;
pub use config::{AssistantConfig, NewsConfig, OracleConfig, SourceMode, SourcesConfig};
pub use error::{BuildError, MediosError, QueryError, QueryErrorKind, Result, UpstreamError};
pub use news::NewsClient;
pub use oracle::{GeminiOracle, Oracle};
pub use prompt::{build, IntentKind, PromptIntent, QueryRequest};
pub use query::{
    Payload, PendingQuery, QueryExecutor, QueryResult, QuerySlot, SlotRegistry, Ticket,
    DEFAULT_SLOT_CAPACITY,
};
pub use shape::{Field, ResponseShape, ShapeError};
pub use sources::{
    ChannelFeedSource, ChannelList, MetricsSource, OracleChannelFeed, OracleTranscription,
    RemoteJsonSource, StaticMetrics, TranscriptionSource,
};
pub use transport::{HttpTransport, RawResponse, RelayTransport, Transport};
pub use types::*;
