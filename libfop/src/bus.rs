//! In-process event plumbing
//!
//! Each field of play owns an [`InputSender`] queue carrying [`FopEvent`]
//! inputs to the state machine and an [`EventBus`] carrying [`UiEvent`]
//! outputs to displays.
//!
//! # Architecture
//!
//! Inputs have exactly one consumer, the platform's event loop, and none of
//! them may be lost: they travel over an unbounded `tokio::sync::mpsc`
//! queue and are applied in arrival order.
//!
//! Outputs fan out over `tokio::sync::broadcast`. Every subscriber gets its
//! own receiver, so a subscriber that lags, panics or is dropped in the
//! middle of a broadcast cannot affect the publisher or the other
//! subscribers.
//!
//! # Non-Blocking Behavior
//!
//! Neither side ever blocks the publisher. If a bus has no subscribers,
//! events are dropped immediately. A lagging display loses its oldest events
//! and is told how many it missed.
//!
//! # Example
//!
//! ```
//! use libfop::bus::{input_queue, EventBus};
//! use libfop::events::{FopEvent, FopEventKind};
//!
//! # async fn example() {
//! let (inputs, mut queue) = input_queue::<FopEvent>();
//! inputs.send(FopEvent::system(FopEventKind::IntermissionDone));
//! assert!(queue.recv().await.is_some());
//!
//! let bus: EventBus<String> = EventBus::new(64);
//! let mut display = bus.subscribe();
//! bus.emit("break done".to_string());
//!
//! if let Ok(event) = display.recv().await {
//!     println!("Received: {}", event);
//! }
//! # }
//! ```
//!
//! [`FopEvent`]: crate::events::FopEvent
//! [`UiEvent`]: crate::events::UiEvent

use tokio::sync::{broadcast, mpsc};
use tracing::debug;

/// Event receiver type alias
pub type EventReceiver<E> = broadcast::Receiver<E>;

/// Receiving end of an input queue.
pub type InputReceiver<E> = mpsc::UnboundedReceiver<E>;

/// Create a lossless single-consumer input queue.
pub fn input_queue<E>() -> (InputSender<E>, InputReceiver<E>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (InputSender { sender }, receiver)
}

/// Publishing side of an input queue; clones feed the same consumer.
#[derive(Debug)]
pub struct InputSender<E> {
    sender: mpsc::UnboundedSender<E>,
}

impl<E> Clone for InputSender<E> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<E> InputSender<E> {
    /// Queue an event for the consumer.
    ///
    /// Never blocks; returns `false` when the consumer is gone.
    pub fn send(&self, event: E) -> bool {
        match self.sender.send(event) {
            Ok(()) => true,
            Err(_) => {
                debug!("input dropped: queue closed");
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Publish/subscribe channel for one kind of event.
///
/// Cloning the bus clones the publishing side; all clones feed the same
/// subscribers.
#[derive(Debug)]
pub struct EventBus<E> {
    sender: broadcast::Sender<E>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<E: Clone> EventBus<E> {
    /// Create a new event bus with the specified capacity
    ///
    /// The capacity determines how many events can be buffered per subscriber
    /// before older events are dropped (if the subscriber is lagging).
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to events
    ///
    /// The receiver sees every event emitted after this call. Dropping it
    /// detaches the subscriber; this is safe at any time.
    pub fn subscribe(&self) -> EventReceiver<E> {
        self.sender.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Never blocks and never fails; returns how many subscribers the
    /// event was queued for.
    pub fn emit(&self, event: E) -> usize {
        match self.sender.send(event) {
            Ok(count) => count,
            Err(_) => {
                debug!("event dropped: no subscribers");
                0
            }
        }
    }

    /// Get the number of active subscribers
    ///
    /// Useful for diagnostics; do not use it for control flow.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::{RecvError, TryRecvError};

    #[tokio::test]
    async fn test_event_emission_and_subscription() {
        let bus: EventBus<u32> = EventBus::new(10);
        let mut receiver = bus.subscribe();

        assert_eq!(bus.emit(7), 1);

        assert_eq!(receiver.recv().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus: EventBus<String> = EventBus::new(10);
        let mut receiver1 = bus.subscribe();
        let mut receiver2 = bus.subscribe();

        bus.emit("down".to_string());

        assert_eq!(receiver1.recv().await.unwrap(), "down");
        assert_eq!(receiver2.recv().await.unwrap(), "down");
    }

    #[tokio::test]
    async fn test_no_subscribers() {
        let bus: EventBus<u32> = EventBus::new(10);

        // Emit with no subscribers - should not panic or block
        assert_eq!(bus.emit(1), 0);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscriber_count_follows_drops() {
        let bus: EventBus<u32> = EventBus::new(10);
        let receiver1 = bus.subscribe();
        let _receiver2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        drop(receiver1);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_clones_share_subscribers() {
        let bus: EventBus<u32> = EventBus::new(10);
        let publisher = bus.clone();
        let mut receiver = bus.subscribe();

        publisher.emit(3);
        assert_eq!(receiver.try_recv().unwrap(), 3);
        assert!(matches!(receiver.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_lagging_subscriber_is_told_what_it_missed() {
        let bus: EventBus<u32> = EventBus::new(2);
        let mut slow = bus.subscribe();
        let mut fast = bus.subscribe();

        for i in 0..4 {
            bus.emit(i);
            assert_eq!(fast.recv().await.unwrap(), i);
        }

        assert!(matches!(slow.recv().await, Err(RecvError::Lagged(2))));
        assert_eq!(slow.recv().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_input_queue_keeps_every_event() {
        let (inputs, mut queue) = input_queue::<u32>();
        let timer_side = inputs.clone();

        for i in 0..1000 {
            assert!(inputs.send(i));
        }
        timer_side.send(1000);

        for i in 0..=1000 {
            assert_eq!(queue.recv().await, Some(i));
        }
        assert!(queue.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_input_queue_reports_closed_consumer() {
        let (inputs, queue) = input_queue::<u32>();
        drop(queue);

        assert!(inputs.is_closed());
        assert!(!inputs.send(1));
    }
}
