pub mod pubsub_port;

pub use pubsub_port::{ProducerPort, PubSubPort};
