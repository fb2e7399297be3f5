//! Интерфейсы (порты) шины publish/subscribe.
//!
//! Код, которому нужна только регистрация топиков и подписка, зависит от
//! этих трейтов, а не от конкретного [`PubSub`]:
//! - `PubSubPort` регистрирует и снимает продюсеров и подписывается по шаблону;
//! - `ProducerPort` публикует в один топик.

use crate::{
    error::{PublishError, RegistrationError},
    pubsub::{Message, Producer, PubSub, Subscriber},
};

pub trait PubSubPort<M: Message> {
    type Producer: ProducerPort<M>;

    /// Зарегистрировать продюсера для топика.
    fn register_producer(
        &self,
        topic: &str,
        capacity: usize,
    ) -> Result<Self::Producer, RegistrationError>;
    /// Подписаться на все топики, совпадающие с шаблоном.
    fn subscribe(
        &self,
        pattern: &str,
    ) -> Subscriber<M>;
    /// Снять продюсера с топика.
    fn unregister_producer(
        &self,
        topic: &str,
    ) -> Result<(), RegistrationError>;
}

pub trait ProducerPort<M: Message> {
    /// Опубликовать сообщение без ожидания.
    fn publish(
        &self,
        message: M,
    ) -> Result<(), PublishError<M>>;
    /// Сколько подписок присоединено к топику.
    fn total_subscriptions(&self) -> usize;
}

impl<M: Message> PubSubPort<M> for PubSub<M> {
    type Producer = Producer<M>;

    fn register_producer(
        &self,
        topic: &str,
        capacity: usize,
    ) -> Result<Producer<M>, RegistrationError> {
        PubSub::register_producer(self, topic, capacity)
    }

    fn subscribe(
        &self,
        pattern: &str,
    ) -> Subscriber<M> {
        PubSub::subscribe(self, pattern)
    }

    fn unregister_producer(
        &self,
        topic: &str,
    ) -> Result<(), RegistrationError> {
        PubSub::unregister_producer(self, topic)
    }
}

impl<M: Message> ProducerPort<M> for Producer<M> {
    fn publish(
        &self,
        message: M,
    ) -> Result<(), PublishError<M>> {
        Producer::publish(self, message)
    }

    fn total_subscriptions(&self) -> usize {
        Producer::total_subscriptions(self)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;
    use crate::pubsub::TextMessage;

    /// Публикует `count` сообщений через порты, ничего не зная о реализации.
    fn fan_out<P: PubSubPort<TextMessage>>(
        port: &P,
        topic: &str,
        count: usize,
    ) -> P::Producer {
        let producer = port.register_producer(topic, count).unwrap();
        for i in 0..count {
            producer
                .publish(TextMessage::new(topic, format!("m{i}")))
                .unwrap();
        }
        producer
    }

    #[tokio::test]
    async fn test_ports_drive_the_bus() {
        let bus: PubSub<TextMessage> = PubSub::new();
        let mut sub = PubSubPort::subscribe(&bus, "jobs/*");

        let producer = fan_out(&bus, "jobs/build", 3);
        assert_eq!(ProducerPort::total_subscriptions(&producer), 1);

        for i in 0..3 {
            let msg = timeout(Duration::from_secs(1), sub.recv())
                .await
                .expect("timed out")
                .expect("closed");
            assert_eq!(msg.data, format!("m{i}"));
        }

        PubSubPort::unregister_producer(&bus, "jobs/build").unwrap();
        assert!(PubSubPort::unregister_producer(&bus, "jobs/build").is_err());
    }
}
