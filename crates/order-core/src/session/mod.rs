//! Per-session basket store.
//!
//! Each session owns its basket behind its own async mutex, so turns of one
//! conversation are serialized while different sessions never contend.
//! Entries exist only while a basket is non-empty or someone holds or waits
//! for its lock.

use dashmap::DashMap;
use order_types::{Basket, SessionId};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Store of in-progress baskets keyed by session.
#[derive(Debug, Default)]
pub struct SessionStore {
	baskets: DashMap<SessionId, Arc<Mutex<Basket>>>,
}

impl SessionStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Locks the basket of `session_id`, creating an empty one if absent.
	///
	/// The guard gives exclusive access until dropped. Other turns of the
	/// same session wait; other sessions are unaffected.
	pub async fn lock(&self, session_id: &SessionId) -> SessionGuard<'_> {
		let entry = self.baskets.entry(session_id.clone()).or_default().value().clone();
		SessionGuard {
			store: self,
			session_id: session_id.clone(),
			basket: entry.lock_owned().await,
		}
	}

	/// Like [`lock`](Self::lock) but never creates an entry.
	async fn lock_existing(&self, session_id: &SessionId) -> Option<SessionGuard<'_>> {
		let entry = self.baskets.get(session_id).map(|entry| entry.value().clone())?;
		Some(SessionGuard {
			store: self,
			session_id: session_id.clone(),
			basket: entry.lock_owned().await,
		})
	}

	/// Merges `items` into the session's basket and returns the result.
	pub async fn add_items(&self, session_id: &SessionId, items: &[(String, u32)]) -> Basket {
		let mut basket = self.lock(session_id).await;
		for (name, quantity) in items {
			basket.add(name, *quantity);
		}
		basket.clone()
	}

	/// Deletes the named entries and returns what is left.
	/// An unknown session yields an empty basket.
	pub async fn remove_items(&self, session_id: &SessionId, names: &[String]) -> Basket {
		let Some(mut basket) = self.lock_existing(session_id).await else {
			return Basket::new();
		};
		for name in names {
			basket.remove(name);
		}
		basket.clone()
	}

	/// Takes the whole basket out of the store.
	pub async fn drain(&self, session_id: &SessionId) -> Basket {
		match self.lock_existing(session_id).await {
			Some(mut basket) => basket.take(),
			None => Basket::new(),
		}
	}

	/// Copy of the current basket.
	pub async fn snapshot(&self, session_id: &SessionId) -> Basket {
		match self.lock_existing(session_id).await {
			Some(basket) => basket.clone(),
			None => Basket::new(),
		}
	}

	/// Number of sessions currently tracked.
	pub fn len(&self) -> usize {
		self.baskets.len()
	}

	pub fn is_empty(&self) -> bool {
		self.baskets.is_empty()
	}
}

/// Exclusive access to one session's basket.
///
/// On drop, an empty basket nobody else is waiting for is evicted from the
/// store.
pub struct SessionGuard<'a> {
	store: &'a SessionStore,
	session_id: SessionId,
	basket: OwnedMutexGuard<Basket>,
}

impl SessionGuard<'_> {
	pub fn session_id(&self) -> &SessionId {
		&self.session_id
	}
}

impl Deref for SessionGuard<'_> {
	type Target = Basket;

	fn deref(&self) -> &Basket {
		&self.basket
	}
}

impl DerefMut for SessionGuard<'_> {
	fn deref_mut(&mut self) -> &mut Basket {
		&mut self.basket
	}
}

impl Drop for SessionGuard<'_> {
	fn drop(&mut self) {
		if !self.basket.is_empty() {
			return;
		}
		// The map and this guard hold the only references; any waiter holds a
		// third. The check runs under the shard lock, so no waiter can appear
		// between it and the removal.
		let mutex = OwnedMutexGuard::mutex(&self.basket);
		self.store.baskets.remove_if(&self.session_id, |_, entry| {
			Arc::ptr_eq(entry, mutex) && Arc::strong_count(entry) <= 2
		});
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;

	fn items(pairs: &[(&str, u32)]) -> Vec<(String, u32)> {
		pairs.iter().map(|(n, q)| (n.to_string(), *q)).collect()
	}

	#[tokio::test]
	async fn test_add_accumulates() {
		let store = SessionStore::new();
		let session = SessionId::new("a");

		store.add_items(&session, &items(&[("Burger", 2)])).await;
		let basket = store.add_items(&session, &items(&[("Burger", 1)])).await;

		assert_eq!(basket.quantity_of("Burger"), Some(3));
		assert_eq!(store.snapshot(&session).await, basket);
	}

	#[tokio::test]
	async fn test_absent_session_remove_and_drain_do_not_create() {
		let store = SessionStore::new();
		let session = SessionId::new("ghost");

		assert!(store
			.remove_items(&session, &["Pizza".to_string()])
			.await
			.is_empty());
		assert!(store.drain(&session).await.is_empty());
		assert!(store.snapshot(&session).await.is_empty());
		assert!(store.is_empty());
	}

	#[tokio::test]
	async fn test_emptied_basket_is_evicted() {
		let store = SessionStore::new();
		let session = SessionId::new("a");

		store.add_items(&session, &items(&[("Naan", 1)])).await;
		assert_eq!(store.len(), 1);

		let remaining = store.remove_items(&session, &["Naan".to_string()]).await;
		assert!(remaining.is_empty());
		assert!(store.is_empty());

		store.add_items(&session, &items(&[("Lassi", 1)])).await;
		assert_eq!(store.drain(&session).await.quantity_of("Lassi"), Some(1));
		assert!(store.is_empty());
	}

	#[tokio::test]
	async fn test_sessions_are_independent() {
		let store = Arc::new(SessionStore::new());
		let a = SessionId::new("a");
		let b = SessionId::new("b");

		let tasks: Vec<_> = (0..20)
			.map(|i| {
				let store = store.clone();
				let session = if i % 2 == 0 { a.clone() } else { b.clone() };
				let name = if i % 2 == 0 { "Burger" } else { "Fries" };
				tokio::spawn(async move {
					store.add_items(&session, &items(&[(name, 1)])).await;
				})
			})
			.collect();
		for task in tasks {
			task.await.unwrap();
		}

		let basket_a = store.snapshot(&a).await;
		let basket_b = store.snapshot(&b).await;
		assert_eq!(basket_a.quantity_of("Burger"), Some(10));
		assert_eq!(basket_a.quantity_of("Fries"), None);
		assert_eq!(basket_b.quantity_of("Fries"), Some(10));
		assert_eq!(basket_b.quantity_of("Burger"), None);
	}

	#[tokio::test]
	async fn test_waiter_sees_basket_after_drain() {
		let store = Arc::new(SessionStore::new());
		let session = SessionId::new("a");
		store.add_items(&session, &items(&[("Burger", 1)])).await;

		let mut guard = store.lock(&session).await;

		// An add queued behind the guard must land in the live basket
		let waiter = {
			let store = store.clone();
			let session = session.clone();
			tokio::spawn(async move { store.add_items(&session, &items(&[("Fries", 2)])).await })
		};
		tokio::time::sleep(Duration::from_millis(20)).await;

		let drained = guard.take();
		drop(guard);
		assert_eq!(drained.quantity_of("Burger"), Some(1));

		let after = waiter.await.unwrap();
		assert_eq!(after.quantity_of("Fries"), Some(2));
		assert_eq!(after.quantity_of("Burger"), None);
		assert_eq!(store.snapshot(&session).await, after);
	}
}
