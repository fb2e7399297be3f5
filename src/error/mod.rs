//! Ошибки шины.
//!
//! Сами типы живут в крейте `topica-error`; здесь они переэкспортируются,
//! чтобы пользователям хватало зависимости на `topica`.

pub use topica_error::{
    ErrorExt, LogLevel, PublishError, RegistrationError, StatusCode, TopicError, TryRecvError,
};
use tracing::{debug, info, trace, warn};

/// Логирует отклонённую операцию над топиком с уровнем, который диктует
/// статус-код ошибки.
pub(crate) fn log_rejection<E: ErrorExt>(
    topic: &str,
    err: &E,
) {
    let status = err.status_code();
    let reason = err.client_message();
    match err.log_level() {
        LogLevel::Trace => trace!(topic, %status, reason = %reason, "operation rejected"),
        LogLevel::Debug => debug!(topic, %status, reason = %reason, "operation rejected"),
        LogLevel::Info => info!(topic, %status, reason = %reason, "operation rejected"),
        LogLevel::Warn => warn!(topic, %status, reason = %reason, "operation rejected"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::{fmt, prelude::*, registry::Registry};

    use super::*;

    fn capture(f: impl FnOnce()) -> String {
        let out = Arc::new(Mutex::new(Vec::new()));
        let sink = out.clone();
        let layer = fmt::layer()
            .with_writer(move || SharedBuf(sink.clone()))
            .with_ansi(false);
        tracing::subscriber::with_default(Registry::default().with(layer), f);
        let bytes = out.lock().unwrap();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for SharedBuf {
        fn write(
            &mut self,
            buf: &[u8],
        ) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Тест проверяет, что уровень события берётся из статус-кода ошибки.
    #[test]
    fn test_log_rejection_uses_status_level() {
        let full = PublishError::QueueFull {
            topic: "a.b".to_string(),
            message: "m".to_string(),
        };
        let out = capture(|| log_rejection("a.b", &full));
        assert!(out.contains("WARN"), "got: {out}");
        assert!(out.contains("Queue for topic a.b is full"), "got: {out}");

        let duplicate = RegistrationError::DuplicateTopic("a.b".to_string());
        let out = capture(|| log_rejection("a.b", &duplicate));
        assert!(out.contains("DEBUG"), "got: {out}");
        assert!(!out.contains("WARN"), "got: {out}");
    }
}
