//! Push-based state notification.
//!
//! A `Signal<T>` holds a current value and a list of listeners. Every `set`
//! stores the new value and then calls each listener synchronously, in
//! registration order, on the calling task. Listeners are not invoked on
//! registration; read `get()` for the current value.
//!
//! Listeners run with no internal lock held, so they may read the signal,
//! subscribe or unsubscribe from inside a callback.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// A registration list of listeners for events of type `E`.
pub struct Subscribers<E> {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(SubscriptionId, Listener<E>)>>,
}

impl<E> Subscribers<E> {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(listener)));
        id
    }

    /// Returns true if the listener was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn notify(&self, event: &E) {
        // Snapshot so callbacks run without the list locked
        let snapshot: Vec<Listener<E>> = self
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in snapshot {
            listener(event);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, Listener<E>)>> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<E> Default for Subscribers<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// A current value plus the listeners interested in its changes.
pub struct Signal<T> {
    value: RwLock<T>,
    subscribers: Subscribers<T>,
}

impl<T: Clone> Signal<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: RwLock::new(initial),
            subscribers: Subscribers::new(),
        }
    }

    pub fn get(&self) -> T {
        self.value
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Replace the value and notify every listener, even if it is unchanged.
    pub fn set(&self, value: T) {
        {
            let mut current = self.value.write().unwrap_or_else(|e| e.into_inner());
            *current = value.clone();
        }
        self.subscribers.notify(&value);
    }

    /// Apply `f` to the current value and publish the result.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut T),
    {
        let updated = {
            let mut current = self.value.write().unwrap_or_else(|e| e.into_inner());
            f(&mut current);
            current.clone()
        };
        self.subscribers.notify(&updated);
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }
}

impl<T: Clone + Default> Default for Signal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_get_and_set() {
        let signal = Signal::new(1);
        assert_eq!(signal.get(), 1);
        signal.set(5);
        assert_eq!(signal.get(), 5);
    }

    #[test]
    fn test_signal_notifies_in_order() {
        let signal = Signal::new(String::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&seen);
        signal.subscribe(move |v: &String| first.lock().unwrap().push(format!("a:{}", v)));
        let second = Arc::clone(&seen);
        signal.subscribe(move |v: &String| second.lock().unwrap().push(format!("b:{}", v)));

        signal.set("x".to_string());

        assert_eq!(*seen.lock().unwrap(), vec!["a:x", "b:x"]);
    }

    #[test]
    fn test_signal_not_invoked_on_subscribe() {
        let signal = Signal::new(false);
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        signal.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // Unchanged values are still delivered
        signal.set(false);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let signal = Signal::new(0);
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        let id = signal.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        signal.set(1);
        assert!(signal.unsubscribe(id));
        assert!(!signal.unsubscribe(id));
        signal.set(2);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_can_read_signal() {
        let signal = Arc::new(Signal::new(0));
        let observed = Arc::new(AtomicU64::new(0));

        let inner = Arc::clone(&signal);
        let out = Arc::clone(&observed);
        signal.subscribe(move |_| {
            out.store(inner.get() as u64, Ordering::SeqCst);
        });

        signal.update(|v| *v += 7);
        assert_eq!(observed.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn test_subscribers_len() {
        let subscribers: Subscribers<()> = Subscribers::new();
        assert!(subscribers.is_empty());
        let id = subscribers.subscribe(|_| {});
        assert_eq!(subscribers.len(), 1);
        subscribers.unsubscribe(id);
        assert!(subscribers.is_empty());
    }
}
