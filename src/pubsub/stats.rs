use std::sync::atomic::{AtomicU64, Ordering};

/// Счётчики шины, общие для всех каналов одного [`PubSub`](super::PubSub).
#[derive(Debug, Default)]
pub struct BusStats {
    /// Сообщения, принятые в очередь канала.
    published: AtomicU64,
    /// Публикации, отклонённые из-за полной или закрытой очереди.
    rejected: AtomicU64,
    /// Сообщения, переданные в приёмник подписчика.
    delivered: AtomicU64,
    /// Сообщения, которые некому доставить (подписчик уже ушёл).
    dropped: AtomicU64,
}

/// Снимок счётчиков на момент вызова [`BusStats::snapshot`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub published: u64,
    pub rejected: u64,
    pub delivered: u64,
    pub dropped: u64,
}

impl BusStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(
        &self,
        count: u64,
    ) {
        self.dropped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            published: self.published(),
            rejected: self.rejected(),
            delivered: self.delivered(),
            dropped: self.dropped(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let stats = BusStats::new();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_record_and_snapshot() {
        let stats = BusStats::new();
        stats.record_published();
        stats.record_published();
        stats.record_rejected();
        stats.record_delivered();
        stats.record_dropped(3);

        assert_eq!(
            stats.snapshot(),
            StatsSnapshot {
                published: 2,
                rejected: 1,
                delivered: 1,
                dropped: 3,
            }
        );
    }
}
