//! A single broadcast topic: a bounded fan-out queue per subscriber, all
//! guarded by one mutex (spec.md §4.5, §5's "Shared mutable state" list).
//! `subscribe` enqueues an initial `Snapshot` before any `Update` so a
//! newly-connected client always sees current state before deltas
//! (Testable property in §8: "SSE initial-snapshot-then-incremental").

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

#[derive(Debug, Clone)]
pub enum BroadcastEvent<T> {
    /// Sent once, immediately after subscribing.
    Snapshot(T),
    /// Sent on every subsequent publish.
    Update(T),
    /// The subscriber's queue overflowed and at least one update was
    /// dropped; the caller should treat its local view as stale and
    /// reissue a fresh subscription (or re-fetch a snapshot) on receipt.
    RefreshRequired,
}

struct SubscriberState<T> {
    queue: VecDeque<BroadcastEvent<T>>,
    notify: Arc<Notify>,
}

struct TopicState<T> {
    next_id: u64,
    subscribers: HashMap<u64, SubscriberState<T>>,
}

pub struct Topic<T> {
    state: Mutex<TopicState<T>>,
    capacity: usize,
}

impl<T: Clone> Topic<T> {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(TopicState { next_id: 0, subscribers: HashMap::new() }),
            capacity,
        })
    }

    /// Registers a subscriber and primes its queue with `snapshot`.
    pub fn subscribe(self: &Arc<Self>, snapshot: T) -> SubscriberHandle<T> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        let notify = Arc::new(Notify::new());
        let mut queue = VecDeque::with_capacity(1);
        queue.push_back(BroadcastEvent::Snapshot(snapshot));
        state.subscribers.insert(id, SubscriberState { queue, notify: notify.clone() });
        SubscriberHandle { id, notify, topic: self.clone() }
    }

    /// Fans `event` out to every live subscriber. Enqueue is non-blocking:
    /// a full queue drops its oldest entry and records a `RefreshRequired`
    /// marker in its place (§4.5: "bounded per-subscriber buffer; on
    /// overflow the slowest subscriber is dropped with a refresh required
    /// notice").
    pub fn publish(&self, event: T) {
        let mut state = self.state.lock().unwrap();
        for sub in state.subscribers.values_mut() {
            if sub.queue.len() >= self.capacity {
                sub.queue.pop_front();
                sub.queue.push_back(BroadcastEvent::RefreshRequired);
            }
            sub.queue.push_back(BroadcastEvent::Update(event.clone()));
            sub.notify.notify_one();
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.lock().unwrap().subscribers.len()
    }

    fn disconnect(&self, id: u64) {
        self.state.lock().unwrap().subscribers.remove(&id);
    }

    fn poll(&self, id: u64) -> Option<BroadcastEvent<T>> {
        self.state.lock().unwrap().subscribers.get_mut(&id).and_then(|sub| sub.queue.pop_front())
    }

    fn notify_handle(&self, id: u64) -> Option<Arc<Notify>> {
        self.state.lock().unwrap().subscribers.get(&id).map(|sub| sub.notify.clone())
    }
}

/// An open subscription to one [`Topic`]. Dropping it removes the
/// subscriber from the topic's set.
pub struct SubscriberHandle<T: Clone> {
    id: u64,
    notify: Arc<Notify>,
    topic: Arc<Topic<T>>,
}

impl<T: Clone> SubscriberHandle<T> {
    /// Waits for and returns the next queued event.
    pub async fn recv(&self) -> BroadcastEvent<T> {
        loop {
            if let Some(event) = self.topic.poll(self.id) {
                return event;
            }
            let notified = self.notify.notified();
            notified.await;
        }
    }
}

impl<T: Clone> Drop for SubscriberHandle<T> {
    fn drop(&mut self) {
        self.topic.disconnect(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribe_delivers_snapshot_before_updates() {
        let topic = Topic::new(4);
        let sub = topic.subscribe(0_i32);
        topic.publish(1);
        assert!(matches!(sub.recv().await, BroadcastEvent::Snapshot(0)));
        assert!(matches!(sub.recv().await, BroadcastEvent::Update(1)));
    }

    #[tokio::test]
    async fn overflow_drops_oldest_and_marks_refresh_required() {
        let topic = Topic::new(2);
        let sub = topic.subscribe(0_i32);
        // Queue already holds the Snapshot(0); publishing two more fills
        // it to capacity and the third forces a drop.
        topic.publish(1);
        topic.publish(2);
        topic.publish(3);
        assert!(matches!(sub.recv().await, BroadcastEvent::Snapshot(0)));
        assert!(matches!(sub.recv().await, BroadcastEvent::RefreshRequired));
        assert!(matches!(sub.recv().await, BroadcastEvent::Update(3)));
    }

    #[tokio::test]
    async fn dropping_handle_removes_subscriber() {
        let topic = Topic::new(4);
        let sub = topic.subscribe(0_i32);
        assert_eq!(topic.subscriber_count(), 1);
        drop(sub);
        assert_eq!(topic.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn multiple_subscribers_each_get_every_update() {
        let topic = Topic::new(4);
        let a = topic.subscribe(0_i32);
        let b = topic.subscribe(0_i32);
        topic.publish(5);
        assert!(matches!(a.recv().await, BroadcastEvent::Snapshot(0)));
        assert!(matches!(a.recv().await, BroadcastEvent::Update(5)));
        assert!(matches!(b.recv().await, BroadcastEvent::Snapshot(0)));
        assert!(matches!(b.recv().await, BroadcastEvent::Update(5)));
    }
}
