use std::fmt;

/// Сообщение, которое продюсер публикует, а подписчик получает.
///
/// Содержимое для шины непрозрачно: `Display` используется только в логах и
/// текстах ошибок. `Clone` нужен для веерной рассылки: каждое присоединение
/// получает собственную копию, поэтому для тяжёлых payload'ов стоит
/// публиковать `Arc<T>`.
pub trait Message: fmt::Display + fmt::Debug + Clone + Send + Sync + 'static {}

impl<T> Message for T where T: fmt::Display + fmt::Debug + Clone + Send + Sync + 'static {}

/// Простое сообщение «топик + текст», удобное для демо и тестов.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMessage {
    pub topic: String,
    pub data: String,
}

impl TextMessage {
    pub fn new(
        topic: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            data: data.into(),
        }
    }
}

impl fmt::Display for TextMessage {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.data)
    }
}
