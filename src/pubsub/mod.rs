//! Подсистема Publish–Subscribe (pub/sub).
//!
//! Модуль реализует внутрипроцессную шину с топиками и шаблонами подписок:
//!
//! - `topic`: валидация топиков и сопоставление топика с шаблоном.
//! - `channel` (частично приватный): канал топика с очередью и
//!   broadcast-циклом, дескриптор [`Producer`].
//! - `subscription`: подписка и её воркер доставки, дескриптор
//!   [`Subscriber`].
//! - `registry`: [`PubSub`], связывающий продюсеров и подписки в обе стороны.
//! - `message`: трейт [`Message`] для публикуемых значений.
//! - `stats`: счётчики шины.

mod channel;
pub mod message;
pub mod registry;
pub mod stats;
pub mod subscription;
pub mod topic;

pub(crate) use channel::Channel;
pub use channel::{Producer, MAX_CAPACITY};
pub use message::*;
pub use registry::*;
pub use stats::*;
pub use subscription::*;
pub use topic::*;
