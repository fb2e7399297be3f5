use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Weak,
};

use parking_lot::{Mutex, RwLock};
use tokio::{
    runtime::Handle,
    sync::{mpsc, Notify, Semaphore},
};
use tracing::{debug, info_span, trace, Instrument};

use super::{BusStats, Message, Subscription};
use crate::error::{log_rejection, PublishError};

type Links<M> = Arc<Vec<Weak<Subscription<M>>>>;

/// Наибольшая ёмкость очереди, которую поддерживает `tokio::sync::mpsc`.
pub const MAX_CAPACITY: usize = Semaphore::MAX_PERMITS;

/// Канал одного топика: ограниченная входная очередь, список присоединённых
/// подписок и broadcast-цикл, который разносит сообщения подписчикам.
///
/// Список подписок хранится как неизменяемый снимок за `RwLock`: цикл
/// клонирует `Arc` под read-локом и сразу отпускает его, присоединение
/// подменяет снимок под write-локом.
#[derive(Debug)]
pub(crate) struct Channel<M> {
    topic: Arc<str>,
    capacity: usize,
    tx: mpsc::Sender<M>,
    subscriptions: RwLock<Links<M>>,
    /// Снимок, снятый [`Channel::detach_all`]: по нему цикл дорассылает
    /// сообщения, принятые до закрытия.
    retired: Mutex<Option<Links<M>>>,
    closed: AtomicBool,
    shutdown: Notify,
    stats: Arc<BusStats>,
}

impl<M> Channel<M> {
    /// Закрывает очередь. Уже принятые сообщения будут разосланы, новые
    /// публикации отклоняются с [`PublishError::Closed`].
    ///
    /// Возвращает `false`, если канал уже был закрыт.
    pub(crate) fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.shutdown.notify_one();
        true
    }
}

impl<M: Message> Channel<M> {
    /// Создаёт канал и запускает его broadcast-цикл. Регистрация не ждёт,
    /// пока цикл фактически начнёт работу.
    pub(crate) fn spawn(
        topic: Arc<str>,
        capacity: usize,
        runtime: &Handle,
        stats: Arc<BusStats>,
    ) -> Arc<Self> {
        let (tx, rx) = mpsc::channel(capacity);
        let channel = Arc::new(Self {
            topic,
            capacity,
            tx,
            subscriptions: RwLock::new(Arc::new(Vec::new())),
            retired: Mutex::new(None),
            closed: AtomicBool::new(false),
            shutdown: Notify::new(),
            stats,
        });

        let span = info_span!("broadcast", topic = %channel.topic);
        runtime.spawn(channel.clone().run(rx).instrument(span));
        channel
    }

    pub(crate) fn topic(&self) -> &str {
        &self.topic
    }

    pub(crate) fn topic_arc(&self) -> Arc<str> {
        self.topic.clone()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Неблокирующая постановка сообщения в очередь.
    pub(crate) fn publish(
        &self,
        message: M,
    ) -> Result<(), PublishError<M>> {
        let result = if self.closed.load(Ordering::Acquire) {
            Err(PublishError::Closed {
                topic: self.topic.to_string(),
                message,
            })
        } else {
            match self.tx.try_reserve() {
                Ok(permit) => {
                    debug!(topic = %self.topic, message = %message, "publishing message");
                    permit.send(message);
                    Ok(())
                }
                Err(mpsc::error::TrySendError::Full(())) => Err(PublishError::QueueFull {
                    topic: self.topic.to_string(),
                    message,
                }),
                Err(mpsc::error::TrySendError::Closed(())) => Err(PublishError::Closed {
                    topic: self.topic.to_string(),
                    message,
                }),
            }
        };

        match &result {
            Ok(()) => self.stats.record_published(),
            Err(err) => {
                self.stats.record_rejected();
                log_rejection(&self.topic, err);
            }
        }
        result
    }

    /// Добавляет подписку в конец списка.
    ///
    /// Не идемпотентно: повторный вызов с той же подпиской даёт второе
    /// присоединение и, соответственно, вторую доставку каждого сообщения.
    pub(crate) fn attach(
        &self,
        subscription: &Arc<Subscription<M>>,
    ) {
        let mut links = self.subscriptions.write();
        Arc::make_mut(&mut links).push(Arc::downgrade(subscription));
        subscription.record_attach();
        trace!(topic = %self.topic, pattern = subscription.pattern(), "attached subscription");
    }

    /// Живые подписки в порядке присоединения (с повторами).
    pub(crate) fn live_subscriptions(&self) -> Vec<Arc<Subscription<M>>> {
        let links = self.subscriptions.read().clone();
        links.iter().filter_map(Weak::upgrade).collect()
    }

    pub(crate) fn total_subscriptions(&self) -> usize {
        self.subscriptions
            .read()
            .iter()
            .filter(|link| link.strong_count() > 0)
            .count()
    }

    /// Количество сообщений, ожидающих broadcast-цикла.
    pub(crate) fn len(&self) -> usize {
        self.capacity - self.tx.capacity()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Отсоединяет все подписки. Возвращает те, у которых не осталось ни
    /// одного присоединения.
    ///
    /// Сообщения, уже стоящие в очереди закрытого канала, всё равно дойдут до
    /// отсоединённых подписок.
    pub(crate) fn detach_all(&self) -> Vec<Arc<Subscription<M>>> {
        let links = {
            let mut current = self.subscriptions.write();
            let links = std::mem::take(&mut *current);
            *self.retired.lock() = Some(links.clone());
            links
        };

        let mut orphans = Vec::new();
        for subscription in links.iter().filter_map(Weak::upgrade) {
            if subscription.record_detach() {
                orphans.push(subscription);
            }
        }
        orphans
    }

    /// Снимок для финальной дорассылки: отсоединённые подписки, если канал
    /// уже сняли с реестра, иначе текущие.
    fn drain_links(&self) -> Links<M> {
        let current = self.subscriptions.read();
        match self.retired.lock().take() {
            Some(retired) => retired,
            None => current.clone(),
        }
    }

    async fn run(
        self: Arc<Self>,
        mut rx: mpsc::Receiver<M>,
    ) {
        debug!("broadcast loop started");
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.notified() => {
                    rx.close();
                    let links = self.drain_links();
                    while let Some(message) = rx.recv().await {
                        self.broadcast(&links, message);
                    }
                    break;
                }
                message = rx.recv() => match message {
                    Some(message) => {
                        let links = self.subscriptions.read().clone();
                        self.broadcast(&links, message);
                    }
                    None => break,
                },
            }
        }
        debug!("broadcast loop stopped");
    }

    fn broadcast(
        &self,
        links: &Links<M>,
        message: M,
    ) {
        debug!(
            message = %message,
            subscriptions = links.len(),
            "received message from producer"
        );

        let live: Vec<_> = links.iter().filter_map(Weak::upgrade).collect();
        let dead = links.len() - live.len();
        if dead > 0 {
            self.stats.record_dropped(dead as u64);
            self.prune();
        }

        for subscription in live {
            if !subscription.deliver(message.clone()) {
                self.stats.record_dropped(1);
            }
        }
    }

    /// Убирает ссылки на подписки, чьи потребители ушли.
    fn prune(&self) {
        let mut links = self.subscriptions.write();
        let before = links.len();
        Arc::make_mut(&mut links).retain(|link| link.strong_count() > 0);
        trace!(
            topic = %self.topic,
            pruned = before - links.len(),
            "pruned dead subscriptions"
        );
    }
}

/// Дескриптор продюсера, который возвращает регистрация топика.
///
/// Дешёво клонируется; все клоны пишут в одну очередь.
#[derive(Debug)]
pub struct Producer<M> {
    channel: Arc<Channel<M>>,
}

impl<M> Clone for Producer<M> {
    fn clone(&self) -> Self {
        Self {
            channel: self.channel.clone(),
        }
    }
}

impl<M: Message> Producer<M> {
    pub(crate) fn new(channel: Arc<Channel<M>>) -> Self {
        Self { channel }
    }

    /// Публикует сообщение, не блокируясь.
    ///
    /// Если очередь заполнена, сразу возвращает [`PublishError::QueueFull`]
    /// с отклонённым сообщением; повторную попытку делает сам продюсер.
    pub fn publish(
        &self,
        message: M,
    ) -> Result<(), PublishError<M>> {
        self.channel.publish(message)
    }

    pub fn topic(&self) -> &str {
        self.channel.topic()
    }

    pub fn capacity(&self) -> usize {
        self.channel.capacity()
    }

    /// Число присоединённых подписок (повторные присоединения считаются).
    pub fn total_subscriptions(&self) -> usize {
        self.channel.total_subscriptions()
    }

    /// Сообщения в очереди, ещё не разосланные подписчикам.
    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.channel.is_closed()
    }

    /// Закрывает очередь топика. Топик остаётся зарегистрированным, пока его
    /// не снимут через [`PubSub::unregister_producer`](super::PubSub::unregister_producer).
    pub fn close(&self) {
        self.channel.close();
    }
}
