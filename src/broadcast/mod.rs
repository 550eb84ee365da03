// ==========================================
// MES Core - Broadcast Fabric, spec.md §4.5
// ==========================================
// Multi-subscriber fan-out: a Topic owns a set of subscriber queues,
// subscribe() creates one and returns it, disconnect() removes it. Queues
// are bounded per subscriber with drop-oldest on overflow (§4.5/§5); the
// subscriber set and every queue for one topic share a single mutex, per
// §5's "Shared mutable state" list, rather than one lock per queue.
// ==========================================

pub mod hub;
pub mod topic;

pub use hub::Hub;
pub use topic::{BroadcastEvent, SubscriberHandle, Topic};
