//! Ordered notification delivery to any number of subscribers.
//!
//! Notifications can be *emitted* (delivered right away) or *scheduled*
//! (held until [`NotificationBus::flush_pending`] runs with at least one live
//! subscriber). Scheduling is what lets `Init` be raised during construction
//! while still reaching subscribers that register afterwards.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::events::Notification;

#[derive(Debug, Default)]
struct BusState {
    subscribers: Vec<mpsc::UnboundedSender<Notification>>,
    pending: Vec<Notification>,
}

/// A cloneable publish/subscribe handle.
///
/// Every subscriber sees every notification delivered after it subscribed,
/// in emission order. Subscribers whose receiver was dropped are pruned on
/// the next delivery.
///
/// # Examples
///
/// ```
/// use sw_watcher::{Notification, NotificationBus};
///
/// let bus = NotificationBus::new();
/// bus.schedule(Notification::Init);
///
/// // Subscribing after scheduling still observes Init.
/// let mut rx = bus.subscribe();
/// bus.flush_pending();
/// bus.emit(Notification::Update);
///
/// assert_eq!(rx.try_recv().unwrap(), Notification::Init);
/// assert_eq!(rx.try_recv().unwrap(), Notification::Update);
/// ```
#[derive(Debug, Clone, Default)]
pub struct NotificationBus {
    state: Arc<Mutex<BusState>>,
}

impl NotificationBus {
    /// Creates a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber.
    #[must_use]
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Notification> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state.lock().subscribers.push(tx);
        rx
    }

    /// Queues a notification for the next [`flush_pending`](Self::flush_pending).
    pub fn schedule(&self, notification: Notification) {
        self.state.lock().pending.push(notification);
    }

    /// Delivers every scheduled notification, in scheduling order.
    ///
    /// With no live subscriber the notifications stay scheduled, so the first
    /// subscriber to register still receives them.
    pub fn flush_pending(&self) {
        let mut state = self.state.lock();
        flush(&mut state);
    }

    /// Delivers a notification now, after anything still pending.
    ///
    /// A notification emitted while nobody is subscribed is dropped.
    pub fn emit(&self, notification: Notification) {
        let mut state = self.state.lock();
        flush(&mut state);
        deliver(&mut state.subscribers, &notification);
    }
}

fn flush(state: &mut BusState) {
    state.subscribers.retain(|tx| !tx.is_closed());
    if state.subscribers.is_empty() {
        return;
    }
    for notification in std::mem::take(&mut state.pending) {
        deliver(&mut state.subscribers, &notification);
    }
}

fn deliver(subscribers: &mut Vec<mpsc::UnboundedSender<Notification>>, notification: &Notification) {
    subscribers.retain(|tx| tx.send(notification.clone()).is_ok());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduled_notifications_wait_for_flush() {
        let bus = NotificationBus::new();
        let mut rx = bus.subscribe();

        bus.schedule(Notification::Init);
        assert!(rx.try_recv().is_err());

        bus.flush_pending();
        assert_eq!(rx.try_recv().expect("init"), Notification::Init);
    }

    #[test]
    fn test_emit_flushes_pending_first() {
        let bus = NotificationBus::new();
        let mut rx = bus.subscribe();

        bus.schedule(Notification::Init);
        bus.emit(Notification::Update);

        assert_eq!(rx.try_recv().expect("init"), Notification::Init);
        assert_eq!(rx.try_recv().expect("update"), Notification::Update);
    }

    #[test]
    fn test_every_subscriber_receives_notifications() {
        let bus = NotificationBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.clone().subscribe();

        bus.emit(Notification::Error("boom".into()));

        assert_eq!(first.try_recv().expect("first"), Notification::Error("boom".into()));
        assert_eq!(second.try_recv().expect("second"), Notification::Error("boom".into()));
    }

    #[test]
    fn test_dropped_subscribers_do_not_block_delivery() {
        let bus = NotificationBus::new();
        let rx = bus.subscribe();
        let mut kept = bus.subscribe();
        drop(rx);

        bus.emit(Notification::Update);
        assert_eq!(kept.try_recv().expect("update"), Notification::Update);
    }

    #[test]
    fn test_pending_waits_for_first_subscriber() {
        let bus = NotificationBus::new();
        bus.schedule(Notification::Init);

        // Nobody listening yet: Init must survive both a flush and an emit.
        bus.flush_pending();
        bus.emit(Notification::Update);

        let mut rx = bus.subscribe();
        bus.flush_pending();
        assert_eq!(rx.try_recv().expect("init"), Notification::Init);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_pending_ignores_closed_subscribers() {
        let bus = NotificationBus::new();
        drop(bus.subscribe());
        bus.schedule(Notification::Init);
        bus.flush_pending();

        let mut rx = bus.subscribe();
        bus.flush_pending();
        assert_eq!(rx.try_recv().expect("init"), Notification::Init);
    }

    #[test]
    fn test_late_subscriber_misses_earlier_emits() {
        let bus = NotificationBus::new();
        bus.emit(Notification::Update);
        let mut rx = bus.subscribe();
        assert!(rx.try_recv().is_err());
    }
}
