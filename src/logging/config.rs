use std::{path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};

use super::LoggingError;

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Формат вывода событий.
#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(LoggingError::InvalidFormat(other.to_string())),
        }
    }
}

/// Период ротации файлового лога.
#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    Hourly,
    #[default]
    Daily,
    Never,
}

/// Настройки файлового синка.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileConfig {
    pub dir: PathBuf,
    pub prefix: String,
    pub rotation: Rotation,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            prefix: "topica.log".to_string(),
            rotation: Rotation::default(),
        }
    }
}

/// Конфигурация логирования.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Уровень (`info`) или полная директива `EnvFilter` (`topica=debug,warn`).
    pub level: String,
    pub format: LogFormat,
    pub with_ansi: bool,
    pub with_target: bool,
    pub with_thread_ids: bool,
    /// Файловый синк; при `None` пишем только в консоль.
    pub file: Option<FileConfig>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            with_ansi: true,
            with_target: true,
            with_thread_ids: false,
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Переопределения из окружения: `TOPICA_LOG_LEVEL`, `TOPICA_LOG_FORMAT`,
    /// `TOPICA_LOG_DIR`.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("TOPICA_LOG_LEVEL") {
            self.level = level;
        }
        if let Some(format) = std::env::var("TOPICA_LOG_FORMAT")
            .ok()
            .and_then(|f| f.parse().ok())
        {
            self.format = format;
        }
        if let Ok(dir) = std::env::var("TOPICA_LOG_DIR") {
            self.file.get_or_insert_with(FileConfig::default).dir = PathBuf::from(dir);
        }
    }

    pub fn validate(&self) -> Result<(), LoggingError> {
        let level = self.level.trim();
        if level.is_empty() {
            return Err(LoggingError::InvalidLevel(self.level.clone()));
        }
        // полные директивы проверит EnvFilter
        if !level.contains('=') && !level.contains(',') {
            let lower = level.to_ascii_lowercase();
            if !LEVELS.contains(&lower.as_str()) {
                return Err(LoggingError::InvalidLevel(self.level.clone()));
            }
        }
        if let Some(file) = &self.file {
            if file.prefix.is_empty() {
                return Err(LoggingError::InvalidFile("empty file prefix".to_string()));
            }
        }
        Ok(())
    }

    pub fn build_filter_directive(&self) -> String {
        self.level.trim().to_ascii_lowercase()
    }

    /// Создаёт каталог файлового лога, если он включён.
    pub fn ensure_log_dir(&self) -> Result<(), LoggingError> {
        if let Some(file) = &self.file {
            std::fs::create_dir_all(&file.dir)?;
        }
        Ok(())
    }
}
