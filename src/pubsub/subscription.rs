use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use tokio::{runtime::Handle, sync::mpsc};
use tracing::{debug, debug_span, warn, Instrument};

use super::{BusStats, Message, MAX_CAPACITY};
use crate::error::TryRecvError;

/// Подписка: шаблон и канал доставки, общий для всех каналов-топиков, к
/// которым она присоединена.
///
/// Единственный владелец: [`Subscriber`] на стороне потребителя. Каналы и
/// набор idle-подписок держат только `Weak`-ссылки, поэтому время жизни
/// подписки определяется потребителем, а не числом присоединений.
#[derive(Debug)]
pub struct Subscription<M> {
    id: u64,
    pattern: Arc<str>,
    /// Вход последовательной очереди доставки. Воркер перекладывает
    /// сообщения из неё в приёмник потребителя строго по порядку.
    queue: mpsc::UnboundedSender<M>,
    /// Число текущих присоединений к каналам (с учётом повторов).
    attachments: AtomicUsize,
}

impl<M: Message> Subscription<M> {
    /// Создаёт подписку и запускает её воркер доставки.
    ///
    /// `buffer`: ёмкость приёмника потребителя; пока он заполнен, сообщения
    /// копятся в очереди доставки этой подписки и не задерживают
    /// broadcast-циклы каналов. Значение приводится к `1..=MAX_CAPACITY`:
    /// подписка не может завершиться ошибкой.
    pub(crate) fn spawn(
        id: u64,
        pattern: &str,
        buffer: usize,
        runtime: &Handle,
        stats: Arc<BusStats>,
    ) -> (Arc<Self>, Subscriber<M>) {
        let pattern: Arc<str> = Arc::from(pattern);
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (sink_tx, sink_rx) = mpsc::channel(buffer.clamp(1, MAX_CAPACITY));

        let span = debug_span!("delivery", pattern = %pattern, subscription = id);
        runtime.spawn(run_delivery(queue_rx, sink_tx, stats).instrument(span));

        let subscription = Arc::new(Self {
            id,
            pattern,
            queue: queue_tx,
            attachments: AtomicUsize::new(0),
        });
        let subscriber = Subscriber {
            subscription: subscription.clone(),
            rx: sink_rx,
        };
        (subscription, subscriber)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn attachments(&self) -> usize {
        self.attachments.load(Ordering::Acquire)
    }

    /// Ставит сообщение в очередь доставки. Никогда не блокирует.
    ///
    /// Возвращает `false`, если воркер уже завершился (потребитель ушёл).
    pub(crate) fn deliver(
        &self,
        message: M,
    ) -> bool {
        self.queue.send(message).is_ok()
    }

    pub(crate) fn record_attach(&self) {
        self.attachments.fetch_add(1, Ordering::AcqRel);
    }

    /// Снимает одно присоединение. Возвращает `true`, если оно было
    /// последним и подписка снова стала idle.
    pub(crate) fn record_detach(&self) -> bool {
        self.attachments.fetch_sub(1, Ordering::AcqRel) == 1
    }
}

/// Воркер доставки одной подписки.
///
/// Перекладывает сообщения из очереди в приёмник потребителя по одному, так
/// что порядок, в котором broadcast-циклы отдали сообщения подписке,
/// сохраняется.
async fn run_delivery<M: Message>(
    mut queue: mpsc::UnboundedReceiver<M>,
    sink: mpsc::Sender<M>,
    stats: Arc<BusStats>,
) {
    while let Some(message) = queue.recv().await {
        debug!(message = %message, "sending message to subscription");
        if sink.send(message).await.is_err() {
            let pending = queue.len() as u64 + 1;
            stats.record_dropped(pending);
            warn!(pending, "subscriber dropped; discarding pending messages");
            return;
        }
        stats.record_delivered();
    }
    debug!("delivery queue closed");
}

/// Принимающая сторона подписки, которую получает потребитель.
///
/// Пока `Subscriber` жив, канал доставки не закрывается: если ни один топик
/// так и не совпадёт с шаблоном, [`Subscriber::recv`] просто не вернёт
/// ни одного сообщения. Отписка происходит автоматически при `Drop`.
#[derive(Debug)]
pub struct Subscriber<M> {
    subscription: Arc<Subscription<M>>,
    rx: mpsc::Receiver<M>,
}

impl<M: Message> Subscriber<M> {
    /// Асинхронно ожидает следующее сообщение.
    ///
    /// Возвращает `None` только после того, как доставка завершена.
    pub async fn recv(&mut self) -> Option<M> {
        self.rx.recv().await
    }

    /// Пытается получить сообщение без ожидания.
    pub fn try_recv(&mut self) -> Result<M, TryRecvError> {
        self.rx.try_recv().map_err(|err| match err {
            mpsc::error::TryRecvError::Empty => TryRecvError::Empty,
            mpsc::error::TryRecvError::Disconnected => TryRecvError::Closed,
        })
    }

    /// Шаблон, с которым создана подписка.
    pub fn pattern(&self) -> &str {
        self.subscription.pattern()
    }

    pub fn id(&self) -> u64 {
        self.subscription.id()
    }

    /// Число каналов (с учётом повторных присоединений), к которым сейчас
    /// присоединена подписка. `0` означает idle.
    pub fn attachments(&self) -> usize {
        self.subscription.attachments()
    }

    /// Количество сообщений, уже лежащих в приёмнике.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Явно отписаться. Аналогично `drop(self)`.
    pub fn unsubscribe(self) {
        // При drop каналы теряют последнюю сильную ссылку на подписку
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    fn spawn_subscription(
        pattern: &str,
        buffer: usize,
    ) -> (Arc<Subscription<String>>, Subscriber<String>, Arc<BusStats>) {
        let stats = Arc::new(BusStats::new());
        let (subscription, subscriber) =
            Subscription::spawn(1, pattern, buffer, &Handle::current(), stats.clone());
        (subscription, subscriber, stats)
    }

    /// Тест проверяет, что воркер сохраняет порядок сообщений, даже когда
    /// приёмник потребителя меньше числа сообщений.
    #[tokio::test]
    async fn test_delivery_preserves_order() {
        let (subscription, mut subscriber, stats) = spawn_subscription("a.*", 1);

        for i in 0..50 {
            assert!(subscription.deliver(format!("m{i}")));
        }

        for i in 0..50 {
            let msg = timeout(Duration::from_secs(1), subscriber.recv())
                .await
                .expect("timed out")
                .expect("closed");
            assert_eq!(msg, format!("m{i}"));
        }
        assert_eq!(stats.delivered(), 50);
    }

    #[tokio::test]
    async fn test_try_recv_empty() {
        let (_subscription, mut subscriber, _) = spawn_subscription("x", 4);
        assert_eq!(subscriber.try_recv(), Err(TryRecvError::Empty));
        assert!(subscriber.is_empty());
    }

    #[tokio::test]
    async fn test_attach_bookkeeping() {
        let (subscription, subscriber, _) = spawn_subscription("a.b", 4);
        assert_eq!(subscriber.attachments(), 0);

        subscription.record_attach();
        subscription.record_attach();
        assert_eq!(subscriber.attachments(), 2);

        assert!(!subscription.record_detach());
        assert!(subscription.record_detach());
        assert_eq!(subscriber.attachments(), 0);
        assert_eq!(subscriber.pattern(), "a.b");
    }

    /// Тест проверяет, что после ухода потребителя подписка освобождается, а
    /// недоставленные сообщения учитываются как отброшенные.
    #[tokio::test]
    async fn test_dropped_subscriber_releases_subscription() {
        let (subscription, subscriber, stats) = spawn_subscription("a", 1);
        let weak = Arc::downgrade(&subscription);

        subscriber.unsubscribe();
        assert!(subscription.deliver("late".to_string()));
        drop(subscription);

        assert!(weak.upgrade().is_none());

        timeout(Duration::from_secs(1), async {
            while stats.dropped() == 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("dropped counter never updated");
        assert_eq!(stats.delivered(), 0);
    }

    /// Тест проверяет, что буфер больше, чем допускает tokio, урезается, а не
    /// роняет подписку.
    #[tokio::test]
    async fn test_oversized_buffer_is_clamped() {
        let (subscription, mut subscriber, _stats) = spawn_subscription("a", usize::MAX);
        assert!(subscription.deliver("m".to_string()));

        let msg = timeout(Duration::from_secs(1), subscriber.recv())
            .await
            .expect("timed out")
            .expect("closed");
        assert_eq!(msg, "m");
    }
}
