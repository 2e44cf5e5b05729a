//! Minimal single-threaded observable values.
//!
//! An [`Observable`] always holds a current value. Subscribers are called
//! once with that value when they subscribe and again after every
//! [`publish`](Observable::publish). [`combine_latest`] derives a new
//! observable from two sources.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

type Observer<T> = Rc<dyn Fn(&T)>;

struct Inner<T> {
    value: RefCell<T>,
    observers: RefCell<Vec<(u64, Observer<T>)>>,
    next_id: Cell<u64>,
    /// Subscriptions to upstream sources, kept alive as long as this value is.
    upstream: RefCell<Vec<Subscription>>,
}

pub struct Observable<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> Observable<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Rc::new(Inner {
                value: RefCell::new(initial),
                observers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
                upstream: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Clone of the current value.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replace the current value and notify every subscriber.
    pub fn publish(&self, value: T) {
        let snapshot = value.clone();
        *self.inner.value.borrow_mut() = value;

        let observers: Vec<Observer<T>> = self
            .inner
            .observers
            .borrow()
            .iter()
            .map(|(_, observer)| Rc::clone(observer))
            .collect();
        for observer in observers {
            observer(&snapshot);
        }
    }

    /// Call `f` with the current value now and after every publish.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription {
        let current = self.get();
        f(&current);
        self.attach(f)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.observers.borrow().len()
    }

    fn attach(&self, f: impl Fn(&T) + 'static) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.observers.borrow_mut().push((id, Rc::new(f)));

        let weak: Weak<Inner<T>> = Rc::downgrade(&self.inner);
        Subscription {
            detach: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.observers.borrow_mut().retain(|(oid, _)| *oid != id);
                }
            })),
        }
    }

    fn downgrade(&self) -> Weak<Inner<T>> {
        Rc::downgrade(&self.inner)
    }

    fn upgrade(weak: &Weak<Inner<T>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }
}

/// Handle to an active subscription. Dropping it detaches the subscriber.
pub struct Subscription {
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.run_detach();
    }

    fn run_detach(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_detach();
    }
}

/// Derive an observable that recomputes `combine` whenever `a` or `b` publishes.
///
/// The derived observable holds its upstream subscriptions; once every clone
/// of it is dropped the sources forget about it.
pub fn combine_latest<A, B, C, F>(a: &Observable<A>, b: &Observable<B>, combine: F) -> Observable<C>
where
    A: Clone + 'static,
    B: Clone + 'static,
    C: Clone + 'static,
    F: Fn(&A, &B) -> C + 'static,
{
    let output = a.with(|a_val| b.with(|b_val| Observable::new(combine(a_val, b_val))));

    let recompute: Rc<dyn Fn()> = {
        let (a_weak, b_weak, out_weak) = (a.downgrade(), b.downgrade(), output.downgrade());
        Rc::new(move || {
            let (Some(a), Some(b), Some(out)) = (
                Observable::upgrade(&a_weak),
                Observable::upgrade(&b_weak),
                Observable::upgrade(&out_weak),
            ) else {
                return;
            };
            let value = a.with(|a_val| b.with(|b_val| combine(a_val, b_val)));
            out.publish(value);
        })
    };

    let on_a = Rc::clone(&recompute);
    let sub_a = a.attach(move |_| on_a());
    let sub_b = b.attach(move |_| recompute());
    output.inner.upstream.borrow_mut().extend([sub_a, sub_b]);

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_receives_current_then_updates() {
        let obs = Observable::new(1);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        let _sub = obs.subscribe(move |v| log.borrow_mut().push(*v));
        obs.publish(2);
        obs.publish(3);
        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
        assert_eq!(obs.get(), 3);
    }

    #[test]
    fn dropping_subscription_detaches() {
        let obs = Observable::new(0);
        let seen = Rc::new(Cell::new(0));
        let count = seen.clone();
        let sub = obs.subscribe(move |_| count.set(count.get() + 1));
        assert_eq!(obs.subscriber_count(), 1);
        drop(sub);
        assert_eq!(obs.subscriber_count(), 0);
        obs.publish(5);
        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn unsubscribe_detaches() {
        let obs = Observable::new(0);
        let sub = obs.subscribe(|_| {});
        sub.unsubscribe();
        assert_eq!(obs.subscriber_count(), 0);
    }

    #[test]
    fn combine_latest_recomputes_on_either_source() {
        let a = Observable::new(vec![1, 2]);
        let b = Observable::new(String::from("x"));
        let combined = combine_latest(&a, &b, |a, b| format!("{}{}", a.len(), b));
        assert_eq!(combined.get(), "2x");

        a.publish(vec![1, 2, 3]);
        assert_eq!(combined.get(), "3x");

        b.publish("y".into());
        assert_eq!(combined.get(), "3y");
    }

    #[test]
    fn dropping_combined_releases_sources() {
        let a = Observable::new(1);
        let b = Observable::new(2);
        let combined = combine_latest(&a, &b, |a, b| a + b);
        assert_eq!(a.subscriber_count(), 1);
        assert_eq!(b.subscriber_count(), 1);
        drop(combined);
        assert_eq!(a.subscriber_count(), 0);
        assert_eq!(b.subscriber_count(), 0);
    }

    #[test]
    fn subscriber_may_read_source_during_publish() {
        let obs = Observable::new(1);
        let reader = obs.clone();
        let seen = Rc::new(Cell::new(0));
        let out = seen.clone();
        let _sub = obs.subscribe(move |_| out.set(reader.get()));
        obs.publish(9);
        assert_eq!(seen.get(), 9);
    }
}
