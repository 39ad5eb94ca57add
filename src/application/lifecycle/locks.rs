//! Per-room mutual exclusion
//!
//! Every operation that reads room/reservation state, checks an invariant
//! and commits holds the room's lock across all three steps, so two
//! confirmations for the same room cannot both pass the overlap check.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone, Default)]
pub struct RoomLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

pub type RoomGuard = OwnedMutexGuard<()>;

impl RoomLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, room_code: &str) -> RoomGuard {
        let lock = self
            .locks
            .entry(room_code.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_room_is_serialized() {
        let locks = RoomLocks::new();
        let guard = locks.acquire("A1").await;

        let other = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = other.acquire("A1").await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn different_rooms_do_not_contend() {
        let locks = RoomLocks::new();
        let _a = locks.acquire("A1").await;
        let _b = tokio::time::timeout(Duration::from_millis(50), locks.acquire("B2"))
            .await
            .expect("B2 lock should be free");
        assert_eq!(locks.len(), 2);
    }
}
