use crate::pipeline::{SidedPosition, TrackingState};
use tokio::sync::broadcast;

/// One tick's worth of tracking output, as seen by presentation observers.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionUpdate {
    /// Monotonic tick counter, starting at 1.
    pub tick: u64,
    /// The sides that were observed this tick.
    pub positions: Vec<SidedPosition>,
    /// Paddle positions after applying `positions`.
    pub state: TrackingState,
}

/// Fans tracking updates out to any number of observers (paddles, particles, overlays).
///
/// Publishing never blocks. An observer that falls more than `capacity` updates
/// behind skips the oldest ones.
#[derive(Clone)]
pub struct PositionBus {
    pub updates_tx: broadcast::Sender<PositionUpdate>,
}

impl PositionBus {
    pub fn new(capacity: usize) -> Self {
        let (updates_tx, _) = broadcast::channel::<PositionUpdate>(capacity.max(1));
        Self { updates_tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PositionUpdate> {
        self.updates_tx.subscribe()
    }

    /// Sends `update` to every current subscriber and returns how many there were.
    pub fn publish(&self, update: PositionUpdate) -> usize {
        // An error only means nobody is listening right now.
        self.updates_tx.send(update).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::side_assigner::Side;
    use tokio::sync::broadcast::error::RecvError;

    fn update(tick: u64) -> PositionUpdate {
        PositionUpdate {
            tick,
            positions: vec![SidedPosition { side: Side::Left, x: 10, y: 20 }],
            state: TrackingState::new(20, 300),
        }
    }

    #[tokio::test]
    async fn subscribers_receive_updates() {
        let bus = PositionBus::new(4);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        assert_eq!(bus.publish(update(1)), 2);
        assert_eq!(first.recv().await.unwrap(), update(1));
        assert_eq!(second.recv().await.unwrap(), update(1));
    }

    #[tokio::test]
    async fn publishing_without_subscribers_is_harmless() {
        let bus = PositionBus::new(4);
        assert_eq!(bus.publish(update(1)), 0);
    }

    #[tokio::test]
    async fn slow_subscriber_lags_instead_of_blocking() {
        let bus = PositionBus::new(2);
        let mut slow = bus.subscribe();
        for tick in 1..=4 {
            bus.publish(update(tick));
        }

        assert!(matches!(slow.recv().await, Err(RecvError::Lagged(2))));
        assert_eq!(slow.recv().await.unwrap().tick, 3);
    }
}
