//! Single-threaded notification signals with explicit subscription handles.
//!
//! [`Signal::subscribe`] returns a [`Subscription`]. Dropping the subscription,
//! or calling [`Subscription::cancel`], removes the callback, so a node that
//! stores its subscriptions unsubscribes itself when it is freed.
//!
//! Emission is re-entrancy safe: callbacks may subscribe or cancel (including
//! themselves) while the signal is being emitted. A listener cancelled before
//! its turn is not called.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<T> = Box<dyn FnMut(&T)>;

struct Listener<T> {
    id: u64,
    callback: Option<Callback<T>>,
}

struct SignalInner<T> {
    next_id: u64,
    listeners: Vec<Listener<T>>,
}

/// A list of callbacks invoked with a shared payload.
pub struct Signal<T> {
    inner: Rc<RefCell<SignalInner<T>>>,
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Signal<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SignalInner {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Registers `callback`; it stays registered as long as the returned
    /// [`Subscription`] is alive.
    #[must_use = "dropping the subscription immediately unsubscribes the callback"]
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&T) + 'static,
    {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.listeners.push(Listener {
                id,
                callback: Some(Box::new(callback)),
            });
            id
        };

        let weak: Weak<RefCell<SignalInner<T>>> = Rc::downgrade(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.borrow_mut().listeners.retain(|listener| listener.id != id);
                }
            })),
        }
    }

    /// Invokes every listener registered at the time of the call.
    pub fn emit(&self, payload: &T) {
        let ids: Vec<u64> = self.inner.borrow().listeners.iter().map(|l| l.id).collect();
        for id in ids {
            let callback = {
                let mut inner = self.inner.borrow_mut();
                inner
                    .listeners
                    .iter_mut()
                    .find(|l| l.id == id)
                    .and_then(|l| l.callback.take())
            };
            let Some(mut callback) = callback else {
                continue;
            };
            callback(payload);
            // Put it back unless the listener was cancelled during its own call.
            let mut inner = self.inner.borrow_mut();
            if let Some(listener) = inner.listeners.iter_mut().find(|l| l.id == id) {
                listener.callback = Some(callback);
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.inner.borrow().listeners.len())
            .finish()
    }
}

/// Keeps a callback registered; cancels it on drop.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Removes the callback now.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_reaches_every_listener_in_order() {
        let signal = Signal::<u32>::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l1 = log.clone();
        let _a = signal.subscribe(move |v| l1.borrow_mut().push(("a", *v)));
        let l2 = log.clone();
        let _b = signal.subscribe(move |v| l2.borrow_mut().push(("b", *v)));

        signal.emit(&7);
        assert_eq!(*log.borrow(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let signal = Signal::<()>::new();
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        let sub = signal.subscribe(move |_| *h.borrow_mut() += 1);

        signal.emit(&());
        drop(sub);
        signal.emit(&());

        assert_eq!(*hits.borrow(), 1);
        assert_eq!(signal.listener_count(), 0);
    }

    #[test]
    fn test_cancel_is_explicit_unsubscribe() {
        let signal = Signal::<()>::new();
        let sub = signal.subscribe(|_| panic!("cancelled listener must not run"));
        sub.cancel();
        signal.emit(&());
    }

    #[test]
    fn test_listener_cancelled_mid_emission_is_skipped() {
        let signal = Signal::<()>::new();
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let hits = Rc::new(RefCell::new(Vec::new()));

        let v = victim.clone();
        let h1 = hits.clone();
        let _first = signal.subscribe(move |_| {
            h1.borrow_mut().push("first");
            v.borrow_mut().take();
        });
        let h2 = hits.clone();
        *victim.borrow_mut() = Some(signal.subscribe(move |_| h2.borrow_mut().push("second")));

        signal.emit(&());
        assert_eq!(*hits.borrow(), vec!["first"]);
    }

    #[test]
    fn test_subscription_outliving_signal_is_harmless() {
        let signal = Signal::<()>::new();
        let sub = signal.subscribe(|_| {});
        drop(signal);
        drop(sub);
    }
}
