//! Round notifications.
//!
//! Every completed round is published once as an `Arc<RoundUpdate>` to all
//! live subscriptions. A subscription only sees rounds that complete after it
//! was created; dropping it unsubscribes.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::warn;

use statuswatch_types::RoundUpdate;

/// Rounds buffered per subscriber before the slowest one starts skipping.
pub const DEFAULT_CAPACITY: usize = 16;

/// Publishing side of the round stream.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Arc<RoundUpdate>>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Deliver `update` to every live subscription; returns how many there were.
    pub fn publish(&self, update: Arc<RoundUpdate>) -> usize {
        // send only fails when nobody is listening
        self.tx.send(update).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Consuming side of the round stream.
#[derive(Debug)]
pub struct Subscription {
    rx: broadcast::Receiver<Arc<RoundUpdate>>,
}

impl Subscription {
    /// Wait for the next round.
    ///
    /// Returns `None` once the engine is gone. A subscriber that falls more
    /// than the channel capacity behind skips the oldest rounds.
    pub async fn recv(&mut self) -> Option<Arc<RoundUpdate>> {
        loop {
            match self.rx.recv().await {
                Ok(update) => return Some(update),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "subscriber lagged, skipping rounds");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next round if one is already waiting.
    pub fn try_recv(&mut self) -> Option<Arc<RoundUpdate>> {
        loop {
            match self.rx.try_recv() {
                Ok(update) => return Some(update),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "subscriber lagged, skipping rounds");
                }
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(round: u64) -> Arc<RoundUpdate> {
        Arc::new(RoundUpdate {
            round,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_fan_out() {
        let notifier = Notifier::default();
        let mut a = notifier.subscribe();
        let mut b = notifier.subscribe();

        assert_eq!(notifier.publish(update(1)), 2);
        assert_eq!(a.recv().await.unwrap().round, 1);
        assert_eq!(b.recv().await.unwrap().round, 1);
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_rounds() {
        let notifier = Notifier::default();
        let _early = notifier.subscribe();
        notifier.publish(update(1));

        let mut late = notifier.subscribe();
        assert!(late.try_recv().is_none());
        notifier.publish(update(2));
        assert_eq!(late.recv().await.unwrap().round, 2);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let notifier = Notifier::default();
        assert_eq!(notifier.publish(update(1)), 0);
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let notifier = Notifier::default();
        let sub = notifier.subscribe();
        assert_eq!(notifier.subscriber_count(), 1);
        drop(sub);
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[test]
    fn test_lagged_subscriber_skips_to_oldest_retained() {
        let notifier = Notifier::new(2);
        let mut sub = notifier.subscribe();
        for round in 1..=5 {
            notifier.publish(update(round));
        }
        assert_eq!(sub.try_recv().unwrap().round, 4);
        assert_eq!(sub.try_recv().unwrap().round, 5);
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_closed() {
        let notifier = Notifier::default();
        let mut sub = notifier.subscribe();
        drop(notifier);
        assert!(sub.recv().await.is_none());
    }
}
