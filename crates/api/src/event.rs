//! Listener lists and disposal handles shared by providers, views and the controller.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Something holding resources that must be released explicitly.
pub trait Disposable: Send + Sync {
    fn dispose(&self);
}

struct Listeners<T> {
    next_id: AtomicU64,
    entries: Mutex<Vec<(u64, Listener<T>)>>,
}

impl<T> Listeners<T> {
    fn snapshot(&self) -> Vec<Listener<T>> {
        match self.entries.lock() {
            Ok(entries) => entries.iter().map(|(_, l)| l.clone()).collect(),
            Err(_) => Vec::new(),
        }
    }

    fn remove(&self, id: u64) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.retain(|(entry_id, _)| *entry_id != id);
        }
    }
}

/// Owner side of an event. Only the owner fires; everybody else subscribes
/// through the [`Event`] handle.
pub struct EventEmitter<T> {
    listeners: Arc<Listeners<T>>,
}

impl<T: 'static> EventEmitter<T> {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Listeners {
                next_id: AtomicU64::new(0),
                entries: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Subscription handle. Every call returns a handle to the same listener list.
    pub fn event(&self) -> Event<T> {
        Event {
            listeners: self.listeners.clone(),
        }
    }

    /// Calls every listener registered at the time of the call.
    pub fn fire(&self, value: &T) {
        for listener in self.listeners.snapshot() {
            listener(value);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .entries
            .lock()
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    /// Drops all listeners.
    pub fn dispose(&self) {
        if let Ok(mut entries) = self.listeners.entries.lock() {
            entries.clear();
        }
    }
}

impl<T: 'static> Default for EventEmitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscriber side of an [`EventEmitter`].
pub struct Event<T> {
    listeners: Arc<Listeners<T>>,
}

impl<T: 'static> Event<T> {
    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = self.listeners.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut entries) = self.listeners.entries.lock() {
            entries.push((id, Arc::new(listener)));
        }
        let listeners: Arc<dyn Remove> = self.listeners.clone();
        Subscription {
            target: Mutex::new(Some((Arc::downgrade(&listeners), id))),
        }
    }

    /// True when both handles were obtained from the same emitter.
    pub fn same_as(&self, other: &Event<T>) -> bool {
        Arc::ptr_eq(&self.listeners, &other.listeners)
    }
}

impl<T> Clone for Event<T> {
    fn clone(&self) -> Self {
        Self {
            listeners: self.listeners.clone(),
        }
    }
}

impl<T> fmt::Debug for Event<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Event({:p})", Arc::as_ptr(&self.listeners))
    }
}

trait Remove: Send + Sync {
    fn remove(&self, id: u64);
}

impl<T> Remove for Listeners<T> {
    fn remove(&self, id: u64) {
        Listeners::remove(self, id)
    }
}

/// Registration of one listener. Unregisters on `dispose` or when dropped.
pub struct Subscription {
    target: Mutex<Option<(Weak<dyn Remove>, u64)>>,
}

impl Disposable for Subscription {
    fn dispose(&self) {
        let target = match self.target.lock() {
            Ok(mut target) => target.take(),
            Err(_) => None,
        };
        if let Some((listeners, id)) = target {
            if let Some(listeners) = listeners.upgrade() {
                listeners.remove(id);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Ordered bag of disposables released together.
#[derive(Default)]
pub struct DisposableStore {
    items: Mutex<Vec<Box<dyn Disposable>>>,
}

impl DisposableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, item: impl Disposable + 'static) {
        self.add_boxed(Box::new(item));
    }

    pub fn add_boxed(&self, item: Box<dyn Disposable>) {
        if let Ok(mut items) = self.items.lock() {
            items.push(item);
        }
    }

    pub fn len(&self) -> usize {
        self.items.lock().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Disposable for DisposableStore {
    fn dispose(&self) {
        let items = match self.items.lock() {
            Ok(mut items) => std::mem::take(&mut *items),
            Err(_) => Vec::new(),
        };
        for item in items {
            item.dispose();
        }
    }
}

impl<D: Disposable + ?Sized> Disposable for Arc<D> {
    fn dispose(&self) {
        (**self).dispose()
    }
}

impl<D: Disposable + ?Sized> Disposable for Box<D> {
    fn dispose(&self) {
        (**self).dispose()
    }
}
