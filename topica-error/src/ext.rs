use std::error::Error;

use crate::{LogLevel, StatusCode};

/// Расширение для ошибок шины.
///
/// Даёт статус-код, по которому вызывающая сторона решает, повторять ли
/// операцию, и с каким уровнем ошибку стоит логировать.
pub trait ErrorExt: Error + Send + Sync + 'static {
    /// Статус ошибки.
    fn status_code(&self) -> StatusCode;

    /// Короткое сообщение для вызывающей стороны, без отклонённого payload'а.
    fn client_message(&self) -> String {
        self.to_string()
    }

    /// Рекомендуемый уровень логирования.
    fn log_level(&self) -> LogLevel {
        self.status_code().log_level()
    }
}
