use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{logging::LoggingConfig, pubsub::MAX_CAPACITY};

/// Ёмкость очереди топика по умолчанию.
pub const DEFAULT_CAPACITY: usize = 1000;
/// Ёмкость буфера доставки одного подписчика по умолчанию.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 16;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("`{field}` = {value} is out of range 1..={max}")]
    OutOfRange {
        field: &'static str,
        value: usize,
        max: usize,
    },
}

/// Настройки шины.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Ёмкость очереди для `register_producer_default`.
    pub default_capacity: usize,
    /// Сколько доставленных, но не прочитанных сообщений держит подписчик.
    pub subscriber_buffer: usize,
    pub logging: LoggingConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_capacity: DEFAULT_CAPACITY,
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
            logging: LoggingConfig::default(),
        }
    }
}

impl Settings {
    /// Загружает `topica.toml` (если есть) и переменные `TOPICA_*`.
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from(None)
    }

    /// Как [`Settings::load`], но с явным путём к файлу конфигурации.
    ///
    /// Вложенные ключи в окружении разделяются `__`:
    /// `TOPICA_LOGGING__FORMAT=json`.
    pub fn load_from(path: Option<&Path>) -> Result<Self, SettingsError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("topica").required(false),
        };

        let cfg = Config::builder()
            // Добавляем значения по умолчанию
            .set_default("default_capacity", DEFAULT_CAPACITY as u64)?
            .set_default("subscriber_buffer", DEFAULT_SUBSCRIBER_BUFFER as u64)?
            .add_source(file)
            // Добавляем переменные окружения с префиксом TOPICA_
            .add_source(
                Environment::with_prefix("TOPICA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = cfg.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Обе ёмкости должны лежать в `1..=MAX_CAPACITY`.
    pub fn validate(&self) -> Result<(), SettingsError> {
        for (field, value) in [
            ("default_capacity", self.default_capacity),
            ("subscriber_buffer", self.subscriber_buffer),
        ] {
            if !(1..=MAX_CAPACITY).contains(&value) {
                return Err(SettingsError::OutOfRange {
                    field,
                    value,
                    max: MAX_CAPACITY,
                });
            }
        }
        Ok(())
    }
}
