use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибки валидации имени топика.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopicError {
    /// Топик нулевой длины.
    #[error("topic cannot be empty")]
    Empty,

    /// Символ вне допустимого набора `[0-9A-Za-z/.-]`.
    #[error("invalid topic '{topic}': unexpected character {character:?} at position {position}")]
    InvalidCharacter {
        topic: String,
        character: char,
        position: usize,
    },
}

impl ErrorExt for TopicError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Empty => StatusCode::EmptyTopic,
            Self::InvalidCharacter { .. } => StatusCode::InvalidTopic,
        }
    }
}
