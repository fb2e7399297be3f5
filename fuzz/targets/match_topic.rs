#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use topica::{match_topic, validate_topic, TopicError};

#[derive(Debug, Arbitrary)]
struct FuzzInput<'a> {
    topic: &'a str,
    pattern: &'a str,
}

fuzz_target!(|input: FuzzInput<'_>| {
    match validate_topic(input.topic) {
        Ok(()) => {
            assert!(match_topic(input.topic, input.topic));
        }
        Err(TopicError::Empty) => assert!(input.topic.is_empty()),
        Err(TopicError::InvalidCharacter { position, character, .. }) => {
            assert_eq!(input.topic[position..].chars().next(), Some(character));
        }
    }

    // сопоставление не паникует и симметрично по числу сегментов
    let matched = match_topic(input.topic, input.pattern);
    if matched {
        let count = |s: &str| s.split(['.', '/', '-']).count();
        assert_eq!(count(input.topic), count(input.pattern));
    }
});
