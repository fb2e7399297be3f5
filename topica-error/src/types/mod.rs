pub mod pubsub;
pub mod topic;

// Публичный экспорт всех типов ошибок из вложенных модулей.
pub use pubsub::*;
pub use topic::*;
