pub mod config;
mod filters;
mod formatter;
pub mod handle;

use std::io;

pub use config::{FileConfig, LogFormat, LoggingConfig, Rotation};
pub use handle::LoggingHandle;
use thiserror::Error;
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::{
    layer::{Layered, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

type Subscriber = Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<Subscriber> + Send + Sync>;

/// Ошибки настройки логирования.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log level '{0}'")]
    InvalidLevel(String),

    #[error("invalid log format '{0}' (expected compact, pretty or json)")]
    InvalidFormat(String),

    #[error("invalid file sink configuration: {0}")]
    InvalidFile(String),

    #[error("log directory error: {0}")]
    Io(#[from] io::Error),

    #[error("global subscriber already installed: {0}")]
    AlreadyInitialized(String),
}

/// Инициализация логирования с конфигурацией.
///
/// Возвращает [`LoggingHandle`], который нужно держать до завершения
/// процесса, если включён файловый синк.
pub fn init_logging(mut config: LoggingConfig) -> Result<LoggingHandle, LoggingError> {
    config.apply_env_overrides();
    config.validate()?;
    config.ensure_log_dir()?;

    let env_filter = filters::build_filter_from_config(&config);
    let mut layers: Vec<BoxedLayer> = Vec::new();

    // Console layer
    layers.push(formatter::build_formatter_from_config(
        &config,
        io::stdout,
        config.with_ansi,
    ));

    // File layer
    let file_guard = match &config.file {
        Some(file) => {
            let appender = file_appender(file);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(formatter::build_formatter_from_config(
                &config, writer, false,
            ));
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_level = %config.level,
        format = ?config.format,
        file_enabled = config.file.is_some(),
        "Logging system initialized"
    );

    Ok(LoggingHandle::new(file_guard))
}

fn file_appender(file: &FileConfig) -> RollingFileAppender {
    match file.rotation {
        Rotation::Hourly => rolling::hourly(&file.dir, &file.prefix),
        Rotation::Daily => rolling::daily(&file.dir, &file.prefix),
        Rotation::Never => rolling::never(&file.dir, &file.prefix),
    }
}
