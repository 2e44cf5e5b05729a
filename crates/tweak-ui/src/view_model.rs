//! The actions panel view model.
//!
//! [`ActionsViewModel`] follows the registry's action and variable streams and
//! rebuilds one flat list of rows whenever either changes: an `Actions`
//! section, then a `Variables` section, each clustered by group label.

use std::collections::HashSet;

use tweak_core::action::{Action, ActionId};
use tweak_core::group::by_group;
use tweak_core::reactive::{combine_latest, Observable};
use tweak_core::registry::Registry;
use tweak_core::variable::Variable;

use crate::list_item::{ListItem, RegistryEntry};

pub const ACTIONS_SECTION: &str = "Actions";
pub const VARIABLES_SECTION: &str = "Variables";

/// Presentation choices layered over the registry contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    collapsed: HashSet<String>,
    filter: String,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the given group keys collapsed.
    pub fn with_collapsed<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            collapsed: keys.into_iter().map(Into::into).collect(),
            filter: String::new(),
        }
    }

    pub fn is_collapsed(&self, key: &str) -> bool {
        self.collapsed.contains(key)
    }

    /// Flip a group's collapsed flag; returns the new flag.
    pub fn toggle(&mut self, key: &str) -> bool {
        if self.collapsed.remove(key) {
            false
        } else {
            self.collapsed.insert(key.to_string());
            true
        }
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn set_filter(&mut self, text: impl Into<String>) {
        self.filter = text.into().trim().to_lowercase();
    }

    fn matches(&self, name: &str) -> bool {
        self.filter.is_empty() || name.to_lowercase().contains(&self.filter)
    }
}

/// Build the panel rows for the given registry contents.
///
/// Each non-empty section gets a header followed by its entries: ungrouped
/// entries first without a sub-header, then one sub-header per group in the
/// order the group was first seen. Hidden variables are left out, as are
/// entries not matching the filter; a collapsed header hides everything
/// beneath it.
pub fn build_items(
    actions: &[Action],
    variables: &[Variable],
    state: &ViewState,
) -> Vec<ListItem> {
    let actions: Vec<RegistryEntry<'_>> = actions.iter().map(RegistryEntry::from).collect();
    let variables: Vec<RegistryEntry<'_>> = variables
        .iter()
        .filter(|v| !v.flags().hidden)
        .map(RegistryEntry::from)
        .collect();

    let mut output = Vec::new();
    push_section(ACTIONS_SECTION, &actions, state, &mut output);
    push_section(VARIABLES_SECTION, &variables, state, &mut output);
    output
}

fn push_section(
    title: &str,
    entries: &[RegistryEntry<'_>],
    state: &ViewState,
    output: &mut Vec<ListItem>,
) {
    let visible: Vec<RegistryEntry<'_>> = entries
        .iter()
        .copied()
        .filter(|entry| state.matches(entry.name()))
        .collect();
    if visible.is_empty() {
        return;
    }

    let collapsed = state.is_collapsed(title);
    output.push(ListItem::group(title, title, collapsed));
    if collapsed {
        return;
    }

    for (group, members) in by_group(&visible, |entry| entry.group()) {
        if let Some(group) = group {
            let key = format!("{}/{}", title, group);
            let collapsed = state.is_collapsed(&key);
            output.push(ListItem::group(key, group, collapsed));
            if collapsed {
                continue;
            }
        }
        output.extend(members.into_iter().map(|entry| ListItem::from_entry(*entry)));
    }
}

/// What activating a row did.
#[derive(Debug, Clone, PartialEq)]
pub enum Activation {
    Toggled { key: String, collapsed: bool },
    Ran(String),
    /// The action was not run; it needs [`ActionsViewModel::confirm`].
    NeedsConfirmation { id: ActionId, name: String },
    Updated { name: String, value: String },
    /// Only bool and choice variables change on activation.
    NotEditable(String),
    Failed(String),
    Nothing,
}

pub struct ActionsViewModel {
    registry: Registry,
    view_state: Observable<ViewState>,
    // keeps the combined registry streams alive for `items`
    _contents: Observable<(Vec<Action>, Vec<Variable>)>,
    items: Observable<Vec<ListItem>>,
}

impl ActionsViewModel {
    pub fn new(registry: &Registry) -> Self {
        Self::with_state(registry, ViewState::new())
    }

    pub fn with_state(registry: &Registry, state: ViewState) -> Self {
        let contents = combine_latest(
            &registry.actions_stream(),
            &registry.variables_stream(),
            |actions, variables| (actions.clone(), variables.clone()),
        );
        let view_state = Observable::new(state);
        let items = combine_latest(&contents, &view_state, |(actions, variables), state| {
            build_items(actions, variables, state)
        });
        Self {
            registry: registry.clone(),
            view_state,
            _contents: contents,
            items,
        }
    }

    /// The row list, republished after every registry or view change.
    pub fn items(&self) -> Observable<Vec<ListItem>> {
        self.items.clone()
    }

    pub fn current(&self) -> Vec<ListItem> {
        self.items.get()
    }

    pub fn len(&self) -> usize {
        self.items.with(Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn view_state(&self) -> ViewState {
        self.view_state.get()
    }

    /// Collapse or expand the group with `key`; returns the new flag.
    pub fn toggle_group(&self, key: &str) -> bool {
        let mut state = self.view_state.get();
        let collapsed = state.toggle(key);
        self.view_state.publish(state);
        collapsed
    }

    pub fn set_filter(&self, text: &str) {
        let mut state = self.view_state.get();
        state.set_filter(text);
        if state != self.view_state.get() {
            self.view_state.publish(state);
        }
    }

    /// Act on the row at `index`: headers toggle, actions run, bool and
    /// choice variables advance to their next value.
    pub fn activate(&self, index: usize) -> Activation {
        let Some(item) = self.items.with(|items| items.get(index).cloned()) else {
            return Activation::Nothing;
        };
        match item {
            ListItem::Group { key, .. } => {
                let collapsed = self.toggle_group(&key);
                Activation::Toggled { key, collapsed }
            }
            ListItem::Action(action) if action.requires_confirmation => {
                Activation::NeedsConfirmation {
                    id: action.id,
                    name: action.name,
                }
            }
            ListItem::Action(action) => match self.registry.invoke_action(action.id) {
                Ok(()) => Activation::Ran(action.name),
                Err(e) => Activation::Failed(e.to_string()),
            },
            ListItem::Variable(row) => {
                if row.read_only {
                    return Activation::NotEditable(row.name);
                }
                let Some(next) = self
                    .registry
                    .find_variable(row.id)
                    .and_then(|v| v.value().toggled())
                else {
                    return Activation::NotEditable(row.name);
                };
                let value = next.to_string();
                match self.registry.update_variable(row.id, next) {
                    Ok(_) => Activation::Updated { name: row.name, value },
                    Err(e) => Activation::Failed(e.to_string()),
                }
            }
        }
    }

    /// Run an action the user confirmed.
    pub fn confirm(&self, id: ActionId) -> Activation {
        match self.registry.invoke_action_confirmed(id) {
            Ok(()) => Activation::Ran(
                self.registry
                    .find_action(id)
                    .map(|a| a.name().to_string())
                    .unwrap_or_else(|| id.to_string()),
            ),
            Err(e) => Activation::Failed(e.to_string()),
        }
    }
}
