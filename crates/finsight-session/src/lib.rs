#![warn(missing_docs)]
//! # finsight-session
//!
//! ## Purpose
//! Holds the process-wide observable session value: the currently
//! authenticated user, or none.
//!
//! ## Responsibilities
//! - Provide a synchronous snapshot of the current user.
//! - Notify subscribers synchronously, in subscription order, on every
//!   replacement.
//! - Deliver the latest value immediately to late subscribers (replay-one);
//!   missed intermediate values are never buffered.
//!
//! ## Data flow
//! The auth layer calls [`SessionState::replace`] on login/logout/refresh;
//! any component needing to react to session changes subscribes.
//!
//! ## Ownership and lifetimes
//! The state owns the current user value; subscribers receive borrowed
//! views during notification and clone only what they keep.
//!
//! ## Error model
//! Replacement and subscription are infallible; a poisoned lock degrades to
//! a logged no-op rather than propagating panics across subscribers.
//!
//! ## Example
//! ```rust
//! use finsight_session::SessionState;
//! use finsight_core::User;
//!
//! let state = SessionState::new(None);
//! state.replace(Some(User { id: Some(7), ..User::default() }));
//! assert_eq!(state.current().and_then(|user| user.id), Some(7));
//! ```

use std::sync::Mutex;

use finsight_core::User;

/// Callback invoked with the new session value on every replacement.
///
/// Callbacks must not subscribe or unsubscribe from within a notification;
/// the subscriber list is locked while notifications run.
pub type SessionObserver = Box<dyn Fn(Option<&User>) + Send>;

/// Handle identifying one subscription for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

struct Subscribers {
    next_id: u64,
    observers: Vec<(u64, SessionObserver)>,
}

/// Observable current-user value with replay-one semantics.
pub struct SessionState {
    current: Mutex<Option<User>>,
    subscribers: Mutex<Subscribers>,
}

impl SessionState {
    /// Creates session state seeded with `initial` (typically the vault's
    /// cached user at startup).
    pub fn new(initial: Option<User>) -> Self {
        Self {
            current: Mutex::new(initial),
            subscribers: Mutex::new(Subscribers {
                next_id: 0,
                observers: Vec::new(),
            }),
        }
    }

    /// Returns a snapshot of the current session user.
    pub fn current(&self) -> Option<User> {
        match self.current.lock() {
            Ok(current) => current.clone(),
            Err(_) => {
                log::warn!("session state lock poisoned, reporting anonymous");
                None
            }
        }
    }

    /// Replaces the current value and notifies all subscribers synchronously,
    /// in subscription order. Last write wins.
    pub fn replace(&self, user: Option<User>) {
        match self.current.lock() {
            Ok(mut current) => *current = user.clone(),
            Err(_) => {
                log::warn!("session state lock poisoned, dropping replacement");
                return;
            }
        }

        let Ok(subscribers) = self.subscribers.lock() else {
            log::warn!("session subscriber list poisoned, skipping notification");
            return;
        };
        for (_, observer) in &subscribers.observers {
            observer(user.as_ref());
        }
    }

    /// Registers an observer and immediately delivers the latest value.
    pub fn subscribe(&self, observer: impl Fn(Option<&User>) + Send + 'static) -> SubscriptionId {
        let snapshot = self.current();
        observer(snapshot.as_ref());

        let Ok(mut subscribers) = self.subscribers.lock() else {
            log::warn!("session subscriber list poisoned, subscription inert");
            return SubscriptionId(u64::MAX);
        };
        let id = subscribers.next_id;
        subscribers.next_id += 1;
        subscribers.observers.push((id, Box::new(observer)));
        SubscriptionId(id)
    }

    /// Removes a subscription. Removing an unknown id is a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers
                .observers
                .retain(|(observer_id, _)| *observer_id != id.0);
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for replay and notification ordering.

    use std::sync::Arc;
    use std::sync::Mutex;

    use super::*;

    fn user(id: u64) -> User {
        User {
            id: Some(id),
            ..User::default()
        }
    }

    #[test]
    fn late_subscriber_receives_only_latest_value() {
        let state = SessionState::new(None);
        state.replace(Some(user(1)));
        state.replace(Some(user(2)));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        state.subscribe(move |value| {
            sink.lock()
                .expect("test sink lock")
                .push(value.and_then(|user| user.id));
        });

        assert_eq!(*seen.lock().expect("test sink lock"), vec![Some(2)]);
    }

    #[test]
    fn subscribers_notified_in_subscription_order() {
        let state = SessionState::new(None);
        let order = Arc::new(Mutex::new(Vec::new()));

        for label in ["first", "second", "third"] {
            let sink = Arc::clone(&order);
            state.subscribe(move |value| {
                if value.is_some() {
                    sink.lock().expect("test sink lock").push(label);
                }
            });
        }

        state.replace(Some(user(1)));
        assert_eq!(
            *order.lock().expect("test sink lock"),
            vec!["first", "second", "third"]
        );
    }

    #[test]
    fn unsubscribed_observer_stops_receiving() {
        let state = SessionState::new(None);
        let count = Arc::new(Mutex::new(0_u32));
        let sink = Arc::clone(&count);
        let id = state.subscribe(move |_| {
            *sink.lock().expect("test sink lock") += 1;
        });

        // Replay on subscribe counts once.
        state.unsubscribe(id);
        state.replace(Some(user(1)));
        assert_eq!(*count.lock().expect("test sink lock"), 1);
    }

    #[test]
    fn replace_none_reports_anonymous_snapshot() {
        let state = SessionState::new(Some(user(9)));
        state.replace(None);
        assert!(state.current().is_none());
    }
}
