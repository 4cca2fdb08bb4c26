//! Observable values and event emitters.
//!
//! The engine reacts to conditions it does not own: "is the app visible",
//! "is narration playing", "did the user touch the screen". Those arrive as
//! [`Property`] (a value with change notification) and [`Emitter`] (a stream
//! of events with no stored value).
//!
//! Both are single-threaded handles (`Rc` inside); cloning a handle shares the
//! same underlying value and listener list. Every subscription returns a
//! [`ListenerId`] that must be handed back to unsubscribe, so a listener is
//! never leaked when the thing it observes is dropped from a set.
//!
//! Listeners run synchronously inside [`Property::set`] / [`Emitter::emit`].
//! The listener list is snapshotted before dispatch, so a listener may add or
//! remove listeners (including itself) while running. A listener removed
//! during dispatch is not called afterwards.
//!
//! ```rust
//! use sonance_core::Property;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let narrating = Property::new(false);
//! let seen = Rc::new(Cell::new(0));
//! let seen_in_listener = Rc::clone(&seen);
//! let id = narrating.lazy_link(move |_new, _old| seen_in_listener.set(seen_in_listener.get() + 1));
//!
//! narrating.set(true);
//! narrating.set(true); // unchanged, no notification
//! assert_eq!(seen.get(), 1);
//!
//! assert!(narrating.unlink(id));
//! narrating.set(false);
//! assert_eq!(seen.get(), 1);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Handle returned by a subscription, used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListenerId({})", self.0)
    }
}

struct ListenerList<F: ?Sized> {
    next_id: u64,
    entries: Vec<(ListenerId, Rc<F>)>,
}

impl<F: ?Sized> ListenerList<F> {
    fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    fn add(&mut self, listener: Rc<F>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    fn contains(&self, id: ListenerId) -> bool {
        self.entries.iter().any(|(entry_id, _)| *entry_id == id)
    }

    fn snapshot(&self) -> Vec<(ListenerId, Rc<F>)> {
        self.entries.clone()
    }
}

type EmitterListener<T> = dyn Fn(&T);

/// A stream of events without a stored value.
pub struct Emitter<T> {
    listeners: Rc<RefCell<ListenerList<EmitterListener<T>>>>,
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self {
            listeners: Rc::clone(&self.listeners),
        }
    }
}

impl<T: 'static> Emitter<T> {
    /// Creates an emitter with no listeners.
    pub fn new() -> Self {
        Self {
            listeners: Rc::new(RefCell::new(ListenerList::new())),
        }
    }

    /// Subscribes `listener`; it runs on every [`emit`](Self::emit) until removed.
    pub fn add_listener(&self, listener: impl Fn(&T) + 'static) -> ListenerId {
        self.listeners.borrow_mut().add(Rc::new(listener))
    }

    /// Unsubscribes a listener. Returns `false` if it was not subscribed.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.borrow_mut().remove(id)
    }

    /// Whether `id` is currently subscribed.
    pub fn has_listener(&self, id: ListenerId) -> bool {
        self.listeners.borrow().contains(id)
    }

    /// Number of subscribed listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().entries.len()
    }

    /// Delivers `event` to every subscribed listener, in subscription order.
    pub fn emit(&self, event: &T) {
        let snapshot = self.listeners.borrow().snapshot();
        for (id, listener) in snapshot {
            if self.has_listener(id) {
                listener(event);
            }
        }
    }

    /// Whether two handles refer to the same emitter.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.listeners, &other.listeners)
    }
}

impl<T: 'static> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.listeners.borrow().entries.len())
            .finish()
    }
}

type PropertyListener<T> = dyn Fn(&T, &T);

struct PropertyInner<T> {
    value: RefCell<T>,
    listeners: RefCell<ListenerList<PropertyListener<T>>>,
}

/// An observable value.
///
/// Listeners receive `(new, old)` whenever [`set`](Self::set) changes the
/// value. Setting an equal value is silent.
pub struct Property<T> {
    inner: Rc<PropertyInner<T>>,
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Property<T> {
    /// Creates a property holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(PropertyInner {
                value: RefCell::new(value),
                listeners: RefCell::new(ListenerList::new()),
            }),
        }
    }

    /// Returns a copy of the current value.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Stores `value` and notifies listeners if it differs from the old value.
    pub fn set(&self, value: T) {
        let old = {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return;
            }
            std::mem::replace(&mut *current, value.clone())
        };
        self.notify(&value, &old);
    }

    /// Subscribes `listener` and immediately calls it with the current value
    /// (passed as both new and old).
    pub fn link(&self, listener: impl Fn(&T, &T) + 'static) -> ListenerId {
        let current = self.get();
        listener(&current, &current);
        self.lazy_link(listener)
    }

    /// Subscribes `listener` without calling it.
    pub fn lazy_link(&self, listener: impl Fn(&T, &T) + 'static) -> ListenerId {
        self.inner.listeners.borrow_mut().add(Rc::new(listener))
    }

    /// Unsubscribes a listener. Returns `false` if it was not subscribed.
    pub fn unlink(&self, id: ListenerId) -> bool {
        self.inner.listeners.borrow_mut().remove(id)
    }

    /// Whether `id` is currently subscribed.
    pub fn has_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.borrow().contains(id)
    }

    /// Number of subscribed listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().entries.len()
    }

    /// Whether two handles refer to the same property.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn notify(&self, new: &T, old: &T) {
        let snapshot = self.inner.listeners.borrow().snapshot();
        for (id, listener) in snapshot {
            if self.has_listener(id) {
                listener(new, old);
            }
        }
    }
}

impl<T: Clone + PartialEq + Default + 'static> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("value", &*self.inner.value.borrow())
            .field("listeners", &self.inner.listeners.borrow().entries.len())
            .finish()
    }
}
