use std::fmt;

use num_enum::TryFromPrimitive;
#[cfg(feature = "serde_repr")]
use serde_repr::{Deserialize_repr, Serialize_repr};
#[cfg(feature = "strum")]
use strum_macros::{AsRefStr, EnumIter};

/// Коды статуса для категоризации ошибок шины.
///
/// # Диапазоны:
/// - 2xxx: Ошибки топиков и регистрации
/// - 4xxx: Ограничения ёмкости
/// - 6xxx: Жизненный цикл каналов и подписок
///
/// # Реализация:
/// - `num_enum::TryFromPrimitive` даёт нативную реализацию `TryFrom<u32>`.
/// - опционально: `strum` для `AsRefStr`/`EnumIter` (feature = "strum").
/// - опционально: `serde_repr` для сериализации в виде числового значения
///   (feature = "serde_repr").
#[cfg_attr(feature = "strum", derive(AsRefStr, EnumIter))]
#[cfg_attr(feature = "serde_repr", derive(Serialize_repr, Deserialize_repr))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
#[non_exhaustive]
pub enum StatusCode {
    // === 2xxx: Топики и регистрация ===
    EmptyTopic = 2000,
    InvalidTopic = 2001,
    DuplicateTopic = 2002,
    UnknownTopic = 2003,

    // === 4xxx: Ёмкость ===
    QueueFull = 4000,
    InvalidCapacity = 4001,

    // === 6xxx: Жизненный цикл ===
    ChannelClosed = 6000,
    SubscriberGone = 6001,
    Empty = 6002,
}

/// Уровень, с которым шина логирует ошибку.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl StatusCode {
    /// Числовое представление кода статуса.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Возвращает `true`, если операцию имеет смысл повторить позже без
    /// изменения аргументов.
    ///
    /// Переполненная очередь освобождается по мере работы broadcast-цикла,
    /// поэтому `QueueFull` повторяем, а ошибки топика нет.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::QueueFull)
    }

    /// Рекомендуемый уровень логирования для данного кода.
    ///
    /// Переполнение и закрытый канал видны в `warn`: это потерянная
    /// публикация. Ошибки аргументов остаются на `info`/`debug`, их и так
    /// получает вызывающая сторона.
    pub fn log_level(&self) -> LogLevel {
        match self {
            Self::Empty => LogLevel::Trace,
            Self::DuplicateTopic | Self::UnknownTopic => LogLevel::Debug,
            Self::EmptyTopic | Self::InvalidTopic | Self::InvalidCapacity => LogLevel::Info,
            Self::QueueFull | Self::ChannelClosed | Self::SubscriberGone => LogLevel::Warn,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для StatusCode
////////////////////////////////////////////////////////////////////////////////

impl fmt::Display for StatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        #[cfg(feature = "strum")]
        {
            write!(f, "{} ({})", self.as_ref(), self.code())
        }
        #[cfg(not(feature = "strum"))]
        {
            write!(f, "{:?} ({})", self, self.code())
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
