/// Ports: traits over the bus for code that should not depend on `PubSub`.
pub mod application;
/// Bus settings loading.
pub mod config;
/// Common error types: registration, publishing, topic validation.
pub mod error;
/// Flexible logging (formatting, filters, file sink).
pub mod logging;
/// Pub/Sub: PubSub, Producer, Subscriber, topic matching.
pub mod pubsub;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Ports over the bus.
pub use application::{ProducerPort, PubSubPort};
/// config
pub use config::{Settings, SettingsError};
/// Operation errors and result types.
pub use error::{
    ErrorExt, LogLevel, PublishError, RegistrationError, StatusCode, TopicError, TryRecvError,
};
/// Logging setup.
pub use logging::{init_logging, LogFormat, LoggingConfig, LoggingError, LoggingHandle};
/// Pub/Sub API.
pub use pubsub::{
    is_pattern, match_topic, validate_topic, BusStats, Message, Producer, PubSub, StatsSnapshot,
    Subscriber, TextMessage, MAX_CAPACITY,
};
