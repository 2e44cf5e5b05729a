//! The console registry: actions, variables, and the listener notified of
//! every change to either.
//!
//! [`Registry`] is a cheap handle; clones share the same entries. All
//! notifications are delivered synchronously on the calling thread after the
//! registry has released its internal borrow, so a listener or stream
//! subscriber may call straight back into the registry.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::action::{Action, ActionId, Callback, OwnerKey};
use crate::reactive::Observable;
use crate::target::{ConsoleTarget, Declarations, Invoker};
use crate::variable::{VarValue, Variable, VariableError, VariableId, VariableSpec};

/// Receiver of registry change notifications.
///
/// Every method has an empty default, so listeners implement only what they
/// care about.
pub trait RegistryListener {
    fn on_action_registered(&self, _registry: &Registry, _action: &Action) {}
    /// An existing action was replaced by a registration under the same name.
    fn on_action_changed(&self, _registry: &Registry, _action: &Action) {}
    fn on_action_unregistered(&self, _registry: &Registry, _action: &Action) {}
    fn on_actions_cleared(&self, _registry: &Registry) {}
    fn on_variable_registered(&self, _registry: &Registry, _variable: &Variable) {}
    fn on_variable_updated(&self, _registry: &Registry, _variable: &Variable) {}
    fn on_variable_unregistered(&self, _registry: &Registry, _variable: &Variable) {}
}

struct NoopListener;

impl RegistryListener for NoopListener {}

/// Failures when invoking actions or writing variables through the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryError {
    UnknownAction(String),
    ConfirmationRequired(String),
    Variable(VariableError),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAction(action) => write!(f, "unknown action: {action}"),
            Self::ConfirmationRequired(name) => {
                write!(f, "action {name} requires confirmation")
            }
            Self::Variable(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for RegistryError {}

impl From<VariableError> for RegistryError {
    fn from(err: VariableError) -> Self {
        Self::Variable(err)
    }
}

enum Notice {
    ActionRegistered(Action),
    ActionChanged(Action),
    ActionUnregistered(Action),
    ActionsCleared,
    VariableRegistered(Variable),
    VariableUpdated(Variable),
    VariableUnregistered(Variable),
}

impl Notice {
    fn touches_actions(&self) -> bool {
        matches!(
            self,
            Notice::ActionRegistered(_)
                | Notice::ActionChanged(_)
                | Notice::ActionUnregistered(_)
                | Notice::ActionsCleared
        )
    }
}

#[derive(Default)]
struct State {
    actions: Vec<Action>,
    variables: Vec<Variable>,
    next_action_id: u32,
    next_variable_id: u32,
}

struct Shared {
    state: RefCell<State>,
    listener: RefCell<Rc<dyn RegistryListener>>,
    actions_stream: Observable<Vec<Action>>,
    variables_stream: Observable<Vec<Variable>>,
}

#[derive(Clone)]
pub struct Registry {
    shared: Rc<Shared>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("Registry")
            .field("actions", &state.actions.len())
            .field("variables", &state.variables.len())
            .finish()
    }
}

impl Registry {
    /// A registry whose notifications go nowhere until a listener is set.
    pub fn new() -> Self {
        Self::with_listener(NoopListener)
    }

    pub fn with_listener(listener: impl RegistryListener + 'static) -> Self {
        Self {
            shared: Rc::new(Shared {
                state: RefCell::new(State::default()),
                listener: RefCell::new(Rc::new(listener)),
                actions_stream: Observable::new(Vec::new()),
                variables_stream: Observable::new(Vec::new()),
            }),
        }
    }

    /// Replace the listener. Only one listener is attached at a time.
    pub fn set_listener(&self, listener: impl RegistryListener + 'static) {
        *self.shared.listener.borrow_mut() = Rc::new(listener);
    }

    pub fn clear_listener(&self) {
        self.set_listener(NoopListener);
    }

    /// Full action list, re-emitted after every change.
    pub fn actions_stream(&self) -> Observable<Vec<Action>> {
        self.shared.actions_stream.clone()
    }

    /// Full variable list, re-emitted after every change.
    pub fn variables_stream(&self) -> Observable<Vec<Variable>> {
        self.shared.variables_stream.clone()
    }

    // ── Targets ──

    /// Register every supported member `T` declares, bound to `target`.
    ///
    /// Members declared as unsupported are skipped. The returned handle
    /// removes exactly the entries this call produced.
    pub fn register<T: ConsoleTarget>(&self, target: &Rc<T>) -> Registration {
        let decl = Declarations::<T>::collect();
        let owner = OwnerKey::of(target);

        for (name, signature) in &decl.unsupported {
            tracing::debug!(
                target_type = std::any::type_name::<T>(),
                member = %name,
                reason = %signature,
                "skipping unsupported console member"
            );
        }

        let mut registration = Registration::new(self);
        for action in decl.actions {
            let callback = match action.invoker {
                Invoker::Instance(method) => Callback::bound(target, method),
                Invoker::Static(func) => Callback::new(func),
            };
            let id = self.add_action(
                action.name,
                callback,
                action.requires_confirmation,
                action.group,
            );
            registration.actions.push(id);
        }
        for spec in decl.variables {
            registration.variables.push(self.add_variable(spec, Some(owner)));
        }

        tracing::debug!(
            target_type = std::any::type_name::<T>(),
            actions = registration.actions.len(),
            variables = registration.variables.len(),
            "registered console target"
        );
        registration
    }

    /// Remove every action and variable bound to `owner`.
    pub fn unregister_all<T: ?Sized>(&self, owner: &Rc<T>) -> usize {
        let key = OwnerKey::of(owner);
        let mut notices = Vec::new();
        {
            let mut state = self.shared.state.borrow_mut();
            let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut state.actions)
                .into_iter()
                .partition(|a| a.callback.is_bound_to(key));
            state.actions = kept;
            notices.extend(removed.into_iter().map(Notice::ActionUnregistered));

            let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut state.variables)
                .into_iter()
                .partition(|v| v.owner == Some(key));
            state.variables = kept;
            notices.extend(removed.into_iter().map(Notice::VariableUnregistered));
        }
        let count = notices.len();
        self.dispatch(notices);
        count
    }

    // ── Actions ──

    pub fn register_action(
        &self,
        name: impl Into<String>,
        callback: Callback,
        requires_confirmation: bool,
    ) -> Registration {
        let id = self.add_action(name.into(), callback, requires_confirmation, None);
        let mut registration = Registration::new(self);
        registration.actions.push(id);
        registration
    }

    pub fn register_action_in(
        &self,
        group: impl Into<String>,
        name: impl Into<String>,
        callback: Callback,
        requires_confirmation: bool,
    ) -> Registration {
        let id = self.add_action(
            name.into(),
            callback,
            requires_confirmation,
            Some(group.into()),
        );
        let mut registration = Registration::new(self);
        registration.actions.push(id);
        registration
    }

    /// Add an action, or replace the callable of the action already
    /// registered under `name` (which keeps its id).
    fn add_action(
        &self,
        name: String,
        callback: Callback,
        requires_confirmation: bool,
        group: Option<String>,
    ) -> ActionId {
        let (id, notice) = {
            let mut state = self.shared.state.borrow_mut();
            if let Some(existing) = state.actions.iter_mut().find(|a| a.name == name) {
                tracing::warn!(action = %name, id = %existing.id, "overriding console action");
                existing.callback = callback;
                existing.requires_confirmation = requires_confirmation;
                existing.group = group;
                (existing.id, Notice::ActionChanged(existing.clone()))
            } else {
                let id = ActionId(state.next_action_id);
                state.next_action_id += 1;
                let action = Action {
                    id,
                    name,
                    callback,
                    requires_confirmation,
                    group,
                };
                tracing::debug!(action = %action.name, %id, "registered console action");
                state.actions.push(action.clone());
                (id, Notice::ActionRegistered(action))
            }
        };
        self.dispatch(vec![notice]);
        id
    }

    pub fn unregister_action(&self, id: ActionId) -> bool {
        let removed = {
            let mut state = self.shared.state.borrow_mut();
            state
                .actions
                .iter()
                .position(|a| a.id == id)
                .map(|idx| state.actions.remove(idx))
        };
        match removed {
            Some(action) => {
                self.dispatch(vec![Notice::ActionUnregistered(action)]);
                true
            }
            None => false,
        }
    }

    /// Remove every action registered under `name`.
    pub fn unregister_action_by_name(&self, name: &str) -> usize {
        self.remove_actions_where(|a| a.name == name)
    }

    /// Remove every action whose callable is `callback`.
    pub fn unregister_action_by_callback(&self, callback: &Callback) -> usize {
        self.remove_actions_where(|a| &a.callback == callback)
    }

    fn remove_actions_where(&self, pred: impl Fn(&Action) -> bool) -> usize {
        let removed: Vec<Action> = {
            let mut state = self.shared.state.borrow_mut();
            let (removed, kept) = std::mem::take(&mut state.actions)
                .into_iter()
                .partition(|a| pred(a));
            state.actions = kept;
            removed
        };
        let count = removed.len();
        self.dispatch(removed.into_iter().map(Notice::ActionUnregistered).collect());
        count
    }

    /// Remove all actions, firing a single cleared notification.
    pub fn clear_actions(&self) {
        self.shared.state.borrow_mut().actions.clear();
        self.dispatch(vec![Notice::ActionsCleared]);
    }

    pub fn find_action(&self, id: ActionId) -> Option<Action> {
        let state = self.shared.state.borrow();
        state.actions.iter().find(|a| a.id == id).cloned()
    }

    pub fn find_action_by_name(&self, name: &str) -> Option<Action> {
        let state = self.shared.state.borrow();
        state.actions.iter().find(|a| a.name == name).cloned()
    }

    pub fn actions_owned_by<T: ?Sized>(&self, owner: &Rc<T>) -> Vec<Action> {
        let key = OwnerKey::of(owner);
        let state = self.shared.state.borrow();
        state
            .actions
            .iter()
            .filter(|a| a.callback.is_bound_to(key))
            .cloned()
            .collect()
    }

    /// Snapshot of all actions in registration order.
    pub fn actions(&self) -> Vec<Action> {
        self.shared.state.borrow().actions.clone()
    }

    pub fn action_count(&self) -> usize {
        self.shared.state.borrow().actions.len()
    }

    /// Invoke an action, refusing ones that require confirmation.
    pub fn invoke_action(&self, id: ActionId) -> Result<(), RegistryError> {
        self.invoke(id, false)
    }

    /// Invoke an action whether or not it requires confirmation.
    pub fn invoke_action_confirmed(&self, id: ActionId) -> Result<(), RegistryError> {
        self.invoke(id, true)
    }

    fn invoke(&self, id: ActionId, confirmed: bool) -> Result<(), RegistryError> {
        let action = self
            .find_action(id)
            .ok_or_else(|| RegistryError::UnknownAction(id.to_string()))?;
        if action.requires_confirmation && !confirmed {
            return Err(RegistryError::ConfirmationRequired(action.name));
        }
        tracing::info!(action = %action.name, %id, "invoking console action");
        action.invoke();
        Ok(())
    }

    // ── Variables ──

    pub fn register_variable(&self, name: impl Into<String>, value: VarValue) -> Registration {
        self.register_variable_with(VariableSpec::new(name, value))
    }

    pub fn register_variable_with(&self, spec: VariableSpec) -> Registration {
        let id = self.add_variable(spec, None);
        let mut registration = Registration::new(self);
        registration.variables.push(id);
        registration
    }

    fn add_variable(&self, spec: VariableSpec, owner: Option<OwnerKey>) -> VariableId {
        let (id, notice) = {
            let mut state = self.shared.state.borrow_mut();
            if let Some(existing) = state.variables.iter_mut().find(|v| v.name == spec.name) {
                tracing::warn!(
                    variable = %spec.name,
                    id = %existing.id,
                    "overriding console variable"
                );
                *existing = Variable::from_spec(existing.id, spec, owner);
                (existing.id, Notice::VariableUpdated(existing.clone()))
            } else {
                let id = VariableId(state.next_variable_id);
                state.next_variable_id += 1;
                let variable = Variable::from_spec(id, spec, owner);
                tracing::debug!(variable = %variable.name, %id, "registered console variable");
                state.variables.push(variable.clone());
                (id, Notice::VariableRegistered(variable))
            }
        };
        self.dispatch(vec![notice]);
        id
    }

    /// Store a new value. Returns whether the value changed; only a change
    /// notifies the listener.
    pub fn update_variable(&self, id: VariableId, value: VarValue) -> Result<bool, VariableError> {
        self.modify_variable(id, |v| v.set_value(value))
    }

    pub fn reset_variable(&self, id: VariableId) -> Result<bool, VariableError> {
        self.modify_variable(id, |v| Ok(v.reset()))
    }

    /// Parse console text into the variable named `name` and store it.
    ///
    /// This is the console write path, so read-only variables are refused.
    pub fn set_variable_from_str(
        &self,
        name: &str,
        input: &str,
    ) -> Result<Variable, VariableError> {
        let variable = self
            .find_variable_by_name(name)
            .ok_or_else(|| VariableError::UnknownVariable(name.to_string()))?;
        if variable.flags.read_only {
            return Err(VariableError::ReadOnly(variable.name));
        }
        let value = variable
            .value
            .parse_like(input)
            .ok_or_else(|| VariableError::Parse {
                name: variable.name.clone(),
                kind: variable.kind(),
                input: input.to_string(),
            })?;
        self.update_variable(variable.id, value)?;
        self.find_variable(variable.id)
            .ok_or(VariableError::UnknownVariable(variable.name))
    }

    fn modify_variable(
        &self,
        id: VariableId,
        op: impl FnOnce(&mut Variable) -> Result<bool, VariableError>,
    ) -> Result<bool, VariableError> {
        let updated = {
            let mut state = self.shared.state.borrow_mut();
            let variable = state
                .variables
                .iter_mut()
                .find(|v| v.id == id)
                .ok_or_else(|| VariableError::UnknownVariable(id.to_string()))?;
            if op(variable)? {
                Some(variable.clone())
            } else {
                None
            }
        };
        match updated {
            Some(variable) => {
                tracing::debug!(
                    variable = %variable.name,
                    value = %variable.value,
                    "console variable updated"
                );
                self.dispatch(vec![Notice::VariableUpdated(variable)]);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn unregister_variable(&self, id: VariableId) -> bool {
        self.remove_variables_where(|v| v.id == id) > 0
    }

    pub fn unregister_variable_by_name(&self, name: &str) -> usize {
        self.remove_variables_where(|v| v.name == name)
    }

    fn remove_variables_where(&self, pred: impl Fn(&Variable) -> bool) -> usize {
        let removed: Vec<Variable> = {
            let mut state = self.shared.state.borrow_mut();
            let (removed, kept) = std::mem::take(&mut state.variables)
                .into_iter()
                .partition(|v| pred(v));
            state.variables = kept;
            removed
        };
        let count = removed.len();
        self.dispatch(removed.into_iter().map(Notice::VariableUnregistered).collect());
        count
    }

    pub fn find_variable(&self, id: VariableId) -> Option<Variable> {
        let state = self.shared.state.borrow();
        state.variables.iter().find(|v| v.id == id).cloned()
    }

    pub fn find_variable_by_name(&self, name: &str) -> Option<Variable> {
        let state = self.shared.state.borrow();
        state.variables.iter().find(|v| v.name == name).cloned()
    }

    pub fn variables_owned_by<T: ?Sized>(&self, owner: &Rc<T>) -> Vec<Variable> {
        let key = OwnerKey::of(owner);
        let state = self.shared.state.borrow();
        state
            .variables
            .iter()
            .filter(|v| v.owner == Some(key))
            .cloned()
            .collect()
    }

    /// Snapshot of all variables in registration order.
    pub fn variables(&self) -> Vec<Variable> {
        self.shared.state.borrow().variables.clone()
    }

    pub fn variable_count(&self) -> usize {
        self.shared.state.borrow().variables.len()
    }

    // ── Notification ──

    fn dispatch(&self, notices: Vec<Notice>) {
        if notices.is_empty() {
            return;
        }

        let listener = Rc::clone(&self.shared.listener.borrow());
        let mut actions_changed = false;
        let mut variables_changed = false;

        for notice in &notices {
            if notice.touches_actions() {
                actions_changed = true;
            } else {
                variables_changed = true;
            }
            match notice {
                Notice::ActionRegistered(a) => listener.on_action_registered(self, a),
                Notice::ActionChanged(a) => listener.on_action_changed(self, a),
                Notice::ActionUnregistered(a) => listener.on_action_unregistered(self, a),
                Notice::ActionsCleared => listener.on_actions_cleared(self),
                Notice::VariableRegistered(v) => listener.on_variable_registered(self, v),
                Notice::VariableUpdated(v) => listener.on_variable_updated(self, v),
                Notice::VariableUnregistered(v) => listener.on_variable_unregistered(self, v),
            }
        }

        if actions_changed {
            self.shared.actions_stream.publish(self.actions());
        }
        if variables_changed {
            self.shared.variables_stream.publish(self.variables());
        }
    }
}

/// Handle returned by every registration call.
///
/// [`dispose`](Registration::dispose) reverses exactly that registration.
/// Dropping the handle leaves the entries registered.
#[derive(Debug)]
pub struct Registration {
    registry: Weak<Shared>,
    actions: Vec<ActionId>,
    variables: Vec<VariableId>,
}

impl Registration {
    fn new(registry: &Registry) -> Self {
        Self {
            registry: Rc::downgrade(&registry.shared),
            actions: Vec::new(),
            variables: Vec::new(),
        }
    }

    pub fn action_ids(&self) -> &[ActionId] {
        &self.actions
    }

    pub fn variable_ids(&self) -> &[VariableId] {
        &self.variables
    }

    /// Unregister the entries created by this registration that are still
    /// present. Returns how many were removed.
    pub fn dispose(self) -> usize {
        let Some(shared) = self.registry.upgrade() else {
            return 0;
        };
        let registry = Registry { shared };
        let removed_actions = self
            .actions
            .iter()
            .filter(|&&id| registry.unregister_action(id))
            .count();
        let removed_variables = self
            .variables
            .iter()
            .filter(|&&id| registry.unregister_variable(id))
            .count();
        removed_actions + removed_variables
    }
}
