use std::fmt;
use std::rc::Rc;

/// Identifier handed out by the registry, sequential from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionId(pub u32);

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Address identity of an owner object.
///
/// Two keys are equal only when they were taken from the same `Rc`
/// allocation. Callbacks bound to an owner keep a strong reference to it, so
/// the address cannot be recycled while an entry still refers to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerKey(usize);

impl OwnerKey {
    pub fn of<T: ?Sized>(owner: &Rc<T>) -> Self {
        Self(Rc::as_ptr(owner).cast::<()>() as usize)
    }
}

/// A zero-argument callable exposed to the console.
///
/// Equality is identity: a clone compares equal to its source, while two
/// callbacks built from the same closure or method do not.
#[derive(Clone)]
pub struct Callback {
    func: Rc<dyn Fn()>,
    owner: Option<OwnerKey>,
}

impl Callback {
    /// Wrap a free-standing callable with no owner.
    pub fn new(func: impl Fn() + 'static) -> Self {
        Self {
            func: Rc::new(func),
            owner: None,
        }
    }

    /// Bind an instance method to `owner`.
    pub fn bound<T: 'static>(owner: &Rc<T>, method: fn(&T)) -> Self {
        let target = Rc::clone(owner);
        Self {
            func: Rc::new(move || method(&target)),
            owner: Some(OwnerKey::of(owner)),
        }
    }

    pub fn owner(&self) -> Option<OwnerKey> {
        self.owner
    }

    pub fn is_bound_to(&self, owner: OwnerKey) -> bool {
        self.owner == Some(owner)
    }

    pub fn call(&self) {
        (self.func)();
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}

impl Eq for Callback {}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("func", &Rc::as_ptr(&self.func).cast::<()>())
            .field("owner", &self.owner)
            .finish()
    }
}

/// A named, invokable entry in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub(crate) id: ActionId,
    pub(crate) name: String,
    pub(crate) callback: Callback,
    pub(crate) requires_confirmation: bool,
    pub(crate) group: Option<String>,
}

impl Action {
    pub fn new(
        id: ActionId,
        name: impl Into<String>,
        callback: Callback,
        requires_confirmation: bool,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            callback,
            requires_confirmation,
            group: None,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn id(&self) -> ActionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn callback(&self) -> &Callback {
        &self.callback
    }

    pub fn requires_confirmation(&self) -> bool {
        self.requires_confirmation
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn owner(&self) -> Option<OwnerKey> {
        self.callback.owner()
    }

    /// Run the callable, ignoring the confirmation flag.
    pub fn invoke(&self) {
        self.callback.call();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Counter {
        hits: Cell<u32>,
    }

    impl Counter {
        fn bump(&self) {
            self.hits.set(self.hits.get() + 1);
        }
    }

    #[test]
    fn clones_are_equal_separate_callbacks_are_not() {
        let a = Callback::new(|| {});
        let b = Callback::new(|| {});
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn bound_callback_invokes_method_on_owner() {
        let owner = Rc::new(Counter { hits: Cell::new(0) });
        let cb = Callback::bound(&owner, Counter::bump);
        cb.call();
        cb.call();
        assert_eq!(owner.hits.get(), 2);
        assert!(cb.is_bound_to(OwnerKey::of(&owner)));
    }

    #[test]
    fn owner_key_distinguishes_instances() {
        let a = Rc::new(Counter { hits: Cell::new(0) });
        let b = Rc::new(Counter { hits: Cell::new(0) });
        assert_eq!(OwnerKey::of(&a), OwnerKey::of(&a.clone()));
        assert_ne!(OwnerKey::of(&a), OwnerKey::of(&b));
    }

    #[test]
    fn unbound_callback_has_no_owner() {
        let cb = Callback::new(|| {});
        assert!(cb.owner().is_none());
    }

    #[test]
    fn action_id_display() {
        assert_eq!(ActionId(7).to_string(), "#7");
    }
}
