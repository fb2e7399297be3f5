use std::fmt;

use thiserror::Error;

use crate::{ErrorExt, StatusCode, TopicError};

/// Ошибки регистрации и снятия продюсеров.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// Топик не прошёл валидацию.
    #[error(transparent)]
    Topic(#[from] TopicError),

    /// Для топика уже зарегистрирован продюсер.
    #[error("producer for topic '{0}' already registered")]
    DuplicateTopic(String),

    /// Для топика нет зарегистрированного продюсера.
    #[error("no producer registered for topic '{0}'")]
    UnknownTopic(String),

    /// Ёмкость очереди вне допустимого диапазона: нулевая очередь не примет
    /// ни одного сообщения, а слишком большую не поддерживает tokio.
    #[error("queue capacity {capacity} for topic '{topic}' must be between 1 and {max}")]
    InvalidCapacity {
        topic: String,
        capacity: usize,
        max: usize,
    },
}

/// Ошибки публикации сообщения.
///
/// Отклонённое сообщение возвращается вызывающей стороне внутри ошибки, его
/// можно забрать через [`PublishError::into_message`] и повторить попытку.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError<M> {
    /// Очередь топика заполнена.
    #[error("publisher queue for topic '{topic}' is full; failed to publish message {message}; please try again")]
    QueueFull { topic: String, message: M },

    /// Канал топика закрыт.
    #[error("channel for topic '{topic}' is closed; failed to publish message {message}")]
    Closed { topic: String, message: M },
}

/// Ошибка неблокирующего чтения из подписки.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TryRecvError {
    /// Нет доступных сообщений.
    #[error("no messages available")]
    Empty,

    /// Доставка завершена, новых сообщений не будет.
    #[error("subscription is closed")]
    Closed,
}

impl<M> PublishError<M> {
    /// Топик, в который не удалось опубликовать сообщение.
    pub fn topic(&self) -> &str {
        match self {
            Self::QueueFull { topic, .. } | Self::Closed { topic, .. } => topic,
        }
    }

    /// Ссылка на отклонённое сообщение.
    pub fn message(&self) -> &M {
        match self {
            Self::QueueFull { message, .. } | Self::Closed { message, .. } => message,
        }
    }

    /// Забирает отклонённое сообщение.
    pub fn into_message(self) -> M {
        match self {
            Self::QueueFull { message, .. } | Self::Closed { message, .. } => message,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, Self::QueueFull { .. })
    }
}

impl ErrorExt for RegistrationError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Topic(err) => err.status_code(),
            Self::DuplicateTopic(_) => StatusCode::DuplicateTopic,
            Self::UnknownTopic(_) => StatusCode::UnknownTopic,
            Self::InvalidCapacity { .. } => StatusCode::InvalidCapacity,
        }
    }
}

impl<M> ErrorExt for PublishError<M>
where
    M: fmt::Debug + fmt::Display + Send + Sync + 'static,
{
    fn status_code(&self) -> StatusCode {
        match self {
            Self::QueueFull { .. } => StatusCode::QueueFull,
            Self::Closed { .. } => StatusCode::ChannelClosed,
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::QueueFull { topic, .. } => format!("Queue for topic {topic} is full"),
            Self::Closed { topic, .. } => format!("Topic {topic} is closed"),
        }
    }
}

impl ErrorExt for TryRecvError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Empty => StatusCode::Empty,
            Self::Closed => StatusCode::SubscriberGone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_error_display() {
        assert_eq!(
            RegistrationError::DuplicateTopic("a.b".into()).to_string(),
            "producer for topic 'a.b' already registered"
        );
        assert_eq!(
            RegistrationError::from(TopicError::Empty).to_string(),
            "topic cannot be empty"
        );
    }

    /// Тест проверяет, что ошибка топика сохраняет свой статус внутри
    /// `RegistrationError`.
    #[test]
    fn test_registration_error_status_codes() {
        assert_eq!(
            RegistrationError::from(TopicError::Empty).status_code(),
            StatusCode::EmptyTopic
        );
        assert_eq!(
            RegistrationError::DuplicateTopic("x".into()).status_code(),
            StatusCode::DuplicateTopic
        );
        let err = RegistrationError::InvalidCapacity {
            topic: "x".into(),
            capacity: 0,
            max: 8,
        };
        assert_eq!(err.status_code(), StatusCode::InvalidCapacity);
        assert_eq!(
            err.to_string(),
            "queue capacity 0 for topic 'x' must be between 1 and 8"
        );
    }

    /// Тест проверяет, что отклонённое сообщение можно забрать из ошибки.
    #[test]
    fn test_publish_error_returns_message() {
        let err = PublishError::QueueFull {
            topic: "a.b.c".to_string(),
            message: "hello".to_string(),
        };
        assert!(err.is_full());
        assert_eq!(err.topic(), "a.b.c");
        assert_eq!(err.message(), "hello");
        assert!(err.to_string().contains("failed to publish message hello"));
        assert!(err.status_code().is_retryable());
        assert_eq!(err.into_message(), "hello");
    }

    #[test]
    fn test_publish_error_closed() {
        let err = PublishError::Closed {
            topic: "t".to_string(),
            message: 7u32,
        };
        assert!(!err.is_full());
        assert_eq!(err.status_code(), StatusCode::ChannelClosed);
        assert_eq!(err.client_message(), "Topic t is closed");
    }

    #[test]
    fn test_try_recv_error_display() {
        assert_eq!(TryRecvError::Empty.to_string(), "no messages available");
        assert_eq!(TryRecvError::Closed.status_code(), StatusCode::SubscriberGone);
    }
}
