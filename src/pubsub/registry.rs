use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Weak,
    },
};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use super::{
    match_topic, validate_topic, BusStats, Channel, Message, Producer, Subscriber, Subscription,
    MAX_CAPACITY,
};
use crate::{
    config::Settings,
    error::{log_rejection, RegistrationError},
};

/// Состояние реестра под одним общим локом: топики и idle-подписки
/// меняются только вместе.
struct Registry<M> {
    /// Топик → канал. Ровно один канал на топик.
    channels: HashMap<Arc<str>, Arc<Channel<M>>>,
    /// Шаблон → подписка без единого присоединения. Не больше одной записи на
    /// буквальную строку шаблона.
    idle: HashMap<String, Weak<Subscription<M>>>,
}

/// Внутрипроцессная шина publish/subscribe.
///
/// Поддерживает:
/// - уникальные топики, каждый со своим продюсером и ограниченной очередью;
/// - подписки по шаблону с `*`, совпадающим ровно с одним сегментом;
/// - подписки, созданные раньше подходящего топика (idle), которые
///   присоединяются при его регистрации;
/// - статистику публикаций и доставки.
///
/// Задачи (broadcast-циклы каналов и воркеры доставки) запускаются на
/// рантайме, переданном при создании.
pub struct PubSub<M> {
    registry: Mutex<Registry<M>>,
    runtime: Handle,
    default_capacity: usize,
    subscriber_buffer: usize,
    next_subscription_id: AtomicU64,
    stats: Arc<BusStats>,
}

impl<M: Message> PubSub<M> {
    /// Создаёт шину с настройками по умолчанию на текущем tokio-рантайме.
    ///
    /// # Panics
    ///
    /// Паникует, если вызвана вне контекста tokio-рантайма.
    pub fn new() -> Self {
        Self::from_settings(&Settings::default())
    }

    /// Создаёт шину из настроек на текущем tokio-рантайме.
    ///
    /// # Panics
    ///
    /// Паникует, если вызвана вне контекста tokio-рантайма.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_runtime(Handle::current(), settings)
    }

    /// Создаёт шину, которая запускает свои задачи на переданном рантайме.
    pub fn with_runtime(
        runtime: Handle,
        settings: &Settings,
    ) -> Self {
        Self {
            registry: Mutex::new(Registry {
                channels: HashMap::new(),
                idle: HashMap::new(),
            }),
            runtime,
            default_capacity: settings.default_capacity,
            subscriber_buffer: settings.subscriber_buffer,
            next_subscription_id: AtomicU64::new(1),
            stats: Arc::new(BusStats::new()),
        }
    }

    /// Регистрирует продюсера для топика с очередью заданной ёмкости.
    ///
    /// Новый канал сразу получает:
    /// - подписки соседних каналов, чей шаблон совпадает с новым топиком
    ///   (каждую подписку ровно один раз);
    /// - idle-подписки, чей шаблон совпадает с новым топиком; они
    ///   удаляются из набора idle.
    ///
    /// Ёмкость должна быть в диапазоне `1..=MAX_CAPACITY`.
    ///
    /// Broadcast-цикл запускается в фоне, регистрация его не ждёт.
    pub fn register_producer(
        &self,
        topic: &str,
        capacity: usize,
    ) -> Result<Producer<M>, RegistrationError> {
        self.try_register(topic, capacity)
            .inspect_err(|err| log_rejection(topic, err))
    }

    fn try_register(
        &self,
        topic: &str,
        capacity: usize,
    ) -> Result<Producer<M>, RegistrationError> {
        validate_topic(topic)?;
        if !(1..=MAX_CAPACITY).contains(&capacity) {
            return Err(RegistrationError::InvalidCapacity {
                topic: topic.to_string(),
                capacity,
                max: MAX_CAPACITY,
            });
        }

        let mut registry = self.registry.lock();
        if registry.channels.contains_key(topic) {
            return Err(RegistrationError::DuplicateTopic(topic.to_string()));
        }

        let channel = Channel::spawn(Arc::from(topic), capacity, &self.runtime, self.stats.clone());
        let mut seen = HashSet::new();

        for sibling in registry.channels.values() {
            for subscription in sibling.live_subscriptions() {
                if seen.insert(subscription.id()) && match_topic(topic, subscription.pattern()) {
                    channel.attach(&subscription);
                }
            }
        }
        let cross_attached = channel.total_subscriptions();

        let mut resolved = 0usize;
        registry.idle.retain(|pattern, link| {
            let Some(subscription) = link.upgrade() else {
                return false;
            };
            if !match_topic(topic, pattern) {
                return true;
            }
            if seen.insert(subscription.id()) {
                channel.attach(&subscription);
                resolved += 1;
            }
            false
        });

        registry.channels.insert(channel.topic_arc(), channel.clone());
        info!(
            topic,
            capacity,
            cross_attached,
            idle_resolved = resolved,
            "registered producer"
        );
        Ok(Producer::new(channel))
    }

    /// Регистрирует продюсера с ёмкостью очереди из настроек.
    pub fn register_producer_default(
        &self,
        topic: &str,
    ) -> Result<Producer<M>, RegistrationError> {
        self.register_producer(topic, self.default_capacity)
    }

    /// Подписывается на все топики, совпадающие с шаблоном, включая
    /// зарегистрированные позже.
    ///
    /// Никогда не возвращает ошибку: если ни один топик не совпал, подписка
    /// становится idle и ждёт подходящей регистрации. Повторная idle-подписка
    /// с тем же буквальным шаблоном вытесняет предыдущую, и вытесненная уже
    /// ничего не получит.
    pub fn subscribe(
        &self,
        pattern: &str,
    ) -> Subscriber<M> {
        let id = self.next_subscription_id.fetch_add(1, Ordering::Relaxed);
        let (subscription, subscriber) = Subscription::spawn(
            id,
            pattern,
            self.subscriber_buffer,
            &self.runtime,
            self.stats.clone(),
        );

        let mut registry = self.registry.lock();
        let mut matched = 0usize;
        for channel in registry.channels.values() {
            // TODO: префиксное дерево сегментов вместо линейного прохода, если
            // топиков станут тысячи.
            if match_topic(channel.topic(), pattern) {
                channel.attach(&subscription);
                matched += 1;
            }
        }

        if matched == 0 {
            park_idle(&mut registry.idle, &subscription);
            debug!(pattern, subscription = id, "no matching topics; subscription is idle");
        } else {
            debug!(pattern, subscription = id, matched, "subscribed");
        }
        subscriber
    }

    /// Снимает продюсера с топика.
    ///
    /// Очередь закрывается (уже принятые сообщения ещё будут разосланы), топик
    /// освобождается для повторной регистрации, а подписки, у которых не
    /// осталось ни одного присоединения, возвращаются в набор idle.
    pub fn unregister_producer(
        &self,
        topic: &str,
    ) -> Result<(), RegistrationError> {
        let mut registry = self.registry.lock();
        let Some(channel) = registry.channels.remove(topic) else {
            let err = RegistrationError::UnknownTopic(topic.to_string());
            log_rejection(topic, &err);
            return Err(err);
        };

        channel.close();
        let orphans = channel.detach_all();
        for subscription in &orphans {
            park_idle(&mut registry.idle, subscription);
        }
        info!(topic, reparked = orphans.len(), "unregistered producer");
        Ok(())
    }

    /// Снимает все продюсеры. Подписчики остаются живы и ждут новых топиков.
    pub fn shutdown(&self) {
        let topics = self.topics();
        for topic in topics {
            // топик мог исчезнуть между снимком и вызовом
            let _ = self.unregister_producer(&topic);
        }
    }

    /// Дескриптор продюсера уже зарегистрированного топика.
    pub fn producer(
        &self,
        topic: &str,
    ) -> Option<Producer<M>> {
        self.registry
            .lock()
            .channels
            .get(topic)
            .cloned()
            .map(Producer::new)
    }

    pub fn contains_topic(
        &self,
        topic: &str,
    ) -> bool {
        self.registry.lock().channels.contains_key(topic)
    }

    /// Зарегистрированные топики в лексикографическом порядке.
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self
            .registry
            .lock()
            .channels
            .keys()
            .map(|topic| topic.to_string())
            .collect();
        topics.sort_unstable();
        topics
    }

    /// Шаблоны живых idle-подписок в лексикографическом порядке.
    pub fn idle_patterns(&self) -> Vec<String> {
        let mut patterns: Vec<String> = self
            .registry
            .lock()
            .idle
            .iter()
            .filter(|(_, link)| link.strong_count() > 0)
            .map(|(pattern, _)| pattern.clone())
            .collect();
        patterns.sort_unstable();
        patterns
    }

    pub fn default_capacity(&self) -> usize {
        self.default_capacity
    }

    pub fn stats(&self) -> &BusStats {
        &self.stats
    }
}

impl<M> Drop for PubSub<M> {
    /// Закрывает очереди всех топиков, чтобы broadcast-циклы дорассылали
    /// принятые сообщения и завершились.
    fn drop(&mut self) {
        for channel in self.registry.get_mut().channels.values() {
            channel.close();
        }
    }
}

impl<M: Message> Default for PubSub<M> {
    fn default() -> Self {
        Self::new()
    }
}

fn park_idle<M: Message>(
    idle: &mut HashMap<String, Weak<Subscription<M>>>,
    subscription: &Arc<Subscription<M>>,
) {
    let previous = idle.insert(
        subscription.pattern().to_string(),
        Arc::downgrade(subscription),
    );
    if previous.is_some_and(|link| link.strong_count() > 0) {
        warn!(
            pattern = subscription.pattern(),
            "idle subscription replaced by a newer one with the same pattern"
        );
    }
}
