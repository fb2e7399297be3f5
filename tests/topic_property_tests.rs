//! Property-based tests для валидации топиков и сопоставления с шаблонами.

use proptest::prelude::*;
use topica::{match_topic, validate_topic, TopicError};

const PROPTEST_CASES: u32 = 1000;

fn segment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]{1,6}"
}

fn delimiter() -> impl Strategy<Value = char> {
    prop_oneof![Just('.'), Just('/'), Just('-')]
}

/// Валидный топик из 1..6 сегментов и список его сегментов.
fn topic() -> impl Strategy<Value = (String, Vec<String>)> {
    prop::collection::vec((segment(), delimiter()), 1..6).prop_map(|parts| {
        let segments: Vec<String> = parts.iter().map(|(s, _)| s.clone()).collect();
        let mut topic = String::new();
        for (i, (s, d)) in parts.iter().enumerate() {
            if i > 0 {
                topic.push(*d);
            }
            topic.push_str(s);
        }
        (topic, segments)
    })
}

fn join(segments: &[String]) -> String {
    segments.join(".")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(PROPTEST_CASES))]

    #[test]
    fn generated_topics_are_valid((topic, _) in topic()) {
        prop_assert!(validate_topic(&topic).is_ok());
    }

    /// Любой символ вне алфавита делает топик невалидным, и ошибка указывает
    /// на его байтовую позицию.
    #[test]
    fn foreign_character_is_reported(
        (topic, _) in topic(),
        bad in any::<char>().prop_filter("outside alphabet", |c| {
            !(c.is_ascii_alphanumeric() || matches!(c, '.' | '/' | '-'))
        }),
        at in any::<prop::sample::Index>(),
    ) {
        let boundaries: Vec<usize> = (0..=topic.len()).filter(|&i| topic.is_char_boundary(i)).collect();
        let position = boundaries[at.index(boundaries.len())];
        let mut broken = topic.clone();
        broken.insert(position, bad);

        prop_assert_eq!(
            validate_topic(&broken),
            Err(TopicError::InvalidCharacter { topic: broken.clone(), character: bad, position })
        );
    }

    #[test]
    fn topic_matches_itself((topic, _) in topic()) {
        prop_assert!(match_topic(&topic, &topic));
    }

    /// Замена любого набора сегментов на `*` сохраняет совпадение, причём
    /// разделители шаблона не обязаны совпадать с разделителями топика.
    #[test]
    fn wildcards_keep_match(
        (topic, segments) in topic(),
        mask in prop::collection::vec(any::<bool>(), 6),
    ) {
        let pattern: Vec<String> = segments
            .iter()
            .zip(mask)
            .map(|(s, wild)| if wild { "*".to_string() } else { s.clone() })
            .collect();
        prop_assert!(match_topic(&topic, &join(&pattern)));
    }

    /// Разное число сегментов никогда не совпадает, даже из одних `*`.
    #[test]
    fn segment_count_must_be_equal(
        (topic, segments) in topic(),
        extra in 1usize..3,
        shorter in any::<bool>(),
    ) {
        let count = if shorter && segments.len() > 1 {
            segments.len() - 1
        } else {
            segments.len() + extra
        };
        let pattern = vec!["*".to_string(); count];
        prop_assert!(!match_topic(&topic, &join(&pattern)));
    }

    /// Изменённый литеральный сегмент ломает совпадение.
    #[test]
    fn changed_literal_segment_breaks_match(
        (topic, segments) in topic(),
        at in any::<prop::sample::Index>(),
    ) {
        let mut pattern = segments.clone();
        let i = at.index(pattern.len());
        pattern[i].push('x');
        prop_assert!(!match_topic(&topic, &join(&pattern)));
    }
}
