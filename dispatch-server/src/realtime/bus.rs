use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::Serialize;
use shared::message::{EventName, RealtimeEvent, Scope};
use tokio::sync::mpsc;

use crate::auth::CurrentUser;

/// Scopes a client is subscribed to: its user, its role and its branch
pub fn scopes_for(user: &CurrentUser) -> Vec<Scope> {
    let mut scopes = vec![Scope::user(user.id), Scope::role(user.role.clone())];
    if let Some(branch_id) = user.branch_id {
        scopes.push(Scope::branch(branch_id));
    }
    scopes
}

struct Connection {
    scopes: HashSet<Scope>,
    tx: mpsc::Sender<Arc<str>>,
}

struct BusInner {
    connections: DashMap<u64, Connection>,
    next_id: AtomicU64,
    buffer: usize,
}

/// Branch/role/user-scoped publish/subscribe hub
#[derive(Clone)]
pub struct RealtimeBus {
    inner: Arc<BusInner>,
}

impl fmt::Debug for RealtimeBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealtimeBus")
            .field("connections", &self.inner.connections.len())
            .field("buffer", &self.inner.buffer)
            .finish()
    }
}

impl RealtimeBus {
    /// `buffer` is the per-connection queue length
    pub fn new(buffer: usize) -> Self {
        Self {
            inner: Arc::new(BusInner {
                connections: DashMap::new(),
                next_id: AtomicU64::new(1),
                buffer: buffer.max(1),
            }),
        }
    }

    /// Register a connection for the given scopes
    pub fn subscribe(&self, scopes: Vec<Scope>) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.inner.buffer);
        let scopes: HashSet<Scope> = scopes.into_iter().collect();
        tracing::debug!(connection_id = id, scopes = ?scopes, "Real-time connection subscribed");
        self.inner.connections.insert(id, Connection { scopes, tx });
        Subscription {
            id,
            rx,
            bus: self.clone(),
        }
    }

    fn unsubscribe(&self, id: u64) {
        if self.inner.connections.remove(&id).is_some() {
            tracing::debug!(connection_id = id, "Real-time connection unsubscribed");
        }
    }

    /// Fan an event out to every connection holding at least one of `scopes`.
    ///
    /// A connection matching several scopes receives the event once.
    /// Returns the number of connections the event was queued for.
    pub fn publish(&self, event: &RealtimeEvent, scopes: &[Scope]) -> usize {
        if scopes.is_empty() {
            return 0;
        }
        let frame: Arc<str> = Arc::from(event.to_json());
        let mut delivered = 0;

        for entry in self.inner.connections.iter() {
            let conn = entry.value();
            if !scopes.iter().any(|s| conn.scopes.contains(s)) {
                continue;
            }
            match conn.tx.try_send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(
                        connection_id = *entry.key(),
                        event = %event.event,
                        "Real-time buffer full, event dropped"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }
        }

        tracing::trace!(event = %event.event, delivered, "Real-time event published");
        delivered
    }

    /// Build and publish an event from a payload
    pub fn emit<T: Serialize>(&self, name: EventName, data: &T, scopes: &[Scope]) -> usize {
        self.publish(&RealtimeEvent::new(name, data), scopes)
    }

    pub fn connection_count(&self) -> usize {
        self.inner.connections.len()
    }

    /// Drop connections whose receiver is gone; returns how many
    pub fn sweep_closed(&self) -> usize {
        let before = self.inner.connections.len();
        self.inner.connections.retain(|_, conn| !conn.tx.is_closed());
        before.saturating_sub(self.inner.connections.len())
    }
}

/// Receiving half of a connection; unsubscribes on drop
pub struct Subscription {
    id: u64,
    rx: mpsc::Receiver<Arc<str>>,
    bus: RealtimeBus,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Next serialized event, `None` once the bus is gone
    pub async fn recv(&mut self) -> Option<Arc<str>> {
        self.rx.recv().await
    }

    /// Non-blocking receive
    pub fn try_recv(&mut self) -> Option<Arc<str>> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(frame: Arc<str>) -> RealtimeEvent {
        serde_json::from_str(&frame).unwrap()
    }

    #[test]
    fn routes_by_scope() {
        let bus = RealtimeBus::new(8);
        let mut branch1 = bus.subscribe(vec![Scope::branch(1)]);
        let mut branch2 = bus.subscribe(vec![Scope::branch(2)]);
        let mut admin = bus.subscribe(vec![Scope::role("admin")]);

        let delivered = bus.emit(
            EventName::KitchenTicketCreated,
            &json!({"id": 1}),
            &[Scope::branch(1)],
        );
        assert_eq!(delivered, 1);
        assert_eq!(
            decode(branch1.try_recv().unwrap()).event,
            EventName::KitchenTicketCreated
        );
        assert!(branch2.try_recv().is_none());
        assert!(admin.try_recv().is_none());
    }

    #[test]
    fn overlapping_scopes_deliver_once() {
        let bus = RealtimeBus::new(8);
        let mut staff = bus.subscribe(vec![Scope::branch(1), Scope::role("staff")]);
        bus.emit(
            EventName::OrderCreated,
            &json!({}),
            &[Scope::branch(1), Scope::role("staff"), Scope::role("admin")],
        );
        assert!(staff.try_recv().is_some());
        assert!(staff.try_recv().is_none());
    }

    #[test]
    fn fifo_per_connection_and_drop_when_full() {
        let bus = RealtimeBus::new(2);
        let mut sub = bus.subscribe(vec![Scope::user(7)]);
        for n in 0..3 {
            bus.emit(EventName::OrderStatusUpdated, &json!({ "n": n }), &[Scope::user(7)]);
        }
        assert_eq!(decode(sub.try_recv().unwrap()).data["n"], 0);
        assert_eq!(decode(sub.try_recv().unwrap()).data["n"], 1);
        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let bus = RealtimeBus::new(4);
        let sub = bus.subscribe(vec![Scope::branch(1)]);
        assert_eq!(bus.connection_count(), 1);
        drop(sub);
        assert_eq!(bus.connection_count(), 0);
        assert_eq!(
            bus.emit(EventName::OrderCreated, &json!({}), &[Scope::branch(1)]),
            0
        );
    }

    #[test]
    fn user_scopes() {
        let user = CurrentUser {
            id: 5,
            username: "rider5".into(),
            role: "rider".into(),
            branch_id: Some(2),
            permissions: vec![],
        };
        assert_eq!(
            scopes_for(&user),
            vec![Scope::user(5), Scope::role("rider"), Scope::branch(2)]
        );
    }
}
