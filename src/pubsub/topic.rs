//! Валидация топиков и сопоставление топика с шаблоном.
//!
//! Топик это непустая строка из сегментов, разделённых одним из символов
//! [`DELIMITERS`]. Шаблон устроен так же, но любой сегмент может быть
//! [`WILDCARD`], который совпадает ровно с одним произвольным сегментом.

use crate::error::TopicError;

/// Допустимые разделители сегментов.
pub const DELIMITERS: [char; 3] = ['/', '.', '-'];

/// Сегмент шаблона, совпадающий с любым одним сегментом топика.
pub const WILDCARD: &str = "*";

#[inline]
fn is_delimiter(c: char) -> bool {
    DELIMITERS.contains(&c)
}

/// Разбивает строку на сегменты по всем разделителям.
///
/// Пустые сегменты сохраняются: `"a..b"` даёт `["a", "", "b"]`.
pub fn split_segments(s: &str) -> impl Iterator<Item = &str> + '_ {
    s.split(is_delimiter)
}

/// Проверяет имя топика.
///
/// Возвращает [`TopicError::Empty`] для пустой строки и
/// [`TopicError::InvalidCharacter`] для первого символа вне
/// `[0-9A-Za-z/.-]`.
pub fn validate_topic(topic: &str) -> Result<(), TopicError> {
    if topic.is_empty() {
        return Err(TopicError::Empty);
    }

    match topic
        .char_indices()
        .find(|&(_, c)| !(c.is_ascii_alphanumeric() || is_delimiter(c)))
    {
        Some((position, character)) => Err(TopicError::InvalidCharacter {
            topic: topic.to_string(),
            character,
            position,
        }),
        None => Ok(()),
    }
}

/// Сопоставляет топик с шаблоном.
///
/// Шаблон совпадает, только если число сегментов одинаково и каждый сегмент
/// шаблона равен `*` или соответствующему сегменту топика. Топик считается
/// валидным.
///
/// ```
/// use topica::match_topic;
///
/// assert!(match_topic("a.b.c", "a.b.c"));
/// assert!(match_topic("a.b.c", "a.*.c"));
/// assert!(match_topic("a.b.c", "a.*.*"));
/// assert!(!match_topic("a.b.c", "c.b.a"));
/// assert!(!match_topic("a.b.c", "a.*"));
/// ```
pub fn match_topic(
    topic: &str,
    pattern: &str,
) -> bool {
    let mut topic_segments = split_segments(topic);
    let mut pattern_segments = split_segments(pattern);

    loop {
        match (topic_segments.next(), pattern_segments.next()) {
            (None, None) => return true,
            (Some(t), Some(p)) => {
                if p != WILDCARD && p != t {
                    return false;
                }
            }
            // разное число сегментов
            _ => return false,
        }
    }
}

/// Содержит ли строка хотя бы один wildcard-сегмент.
pub fn is_pattern(s: &str) -> bool {
    split_segments(s).any(|segment| segment == WILDCARD)
}
