//! Display rows of the actions panel.

use tweak_core::action::{Action, ActionId};
use tweak_core::variable::{VarKind, Variable, VariableId};

#[derive(Debug, Clone, PartialEq)]
pub struct ActionItem {
    pub id: ActionId,
    pub name: String,
    pub requires_confirmation: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableItem {
    pub id: VariableId,
    pub name: String,
    /// Current value as the console prints it.
    pub value: String,
    pub kind: VarKind,
    pub is_default: bool,
    pub read_only: bool,
}

/// One row of the panel: a section or group header, or an entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ListItem {
    Group {
        /// `Actions`, `Variables`, or `<section>/<group>` for a sub-group.
        key: String,
        title: String,
        collapsed: bool,
    },
    Action(ActionItem),
    Variable(VariableItem),
}

/// A registry entry that can be shown as a row.
#[derive(Debug, Clone, Copy)]
pub enum RegistryEntry<'a> {
    Action(&'a Action),
    Variable(&'a Variable),
}

impl<'a> From<&'a Action> for RegistryEntry<'a> {
    fn from(action: &'a Action) -> Self {
        RegistryEntry::Action(action)
    }
}

impl<'a> From<&'a Variable> for RegistryEntry<'a> {
    fn from(variable: &'a Variable) -> Self {
        RegistryEntry::Variable(variable)
    }
}

impl RegistryEntry<'_> {
    pub fn name(&self) -> &str {
        match self {
            RegistryEntry::Action(a) => a.name(),
            RegistryEntry::Variable(v) => v.name(),
        }
    }

    pub fn group(&self) -> Option<&str> {
        match self {
            RegistryEntry::Action(a) => a.group(),
            RegistryEntry::Variable(v) => v.group(),
        }
    }
}

impl ListItem {
    pub fn group(key: impl Into<String>, title: impl Into<String>, collapsed: bool) -> Self {
        ListItem::Group {
            key: key.into(),
            title: title.into(),
            collapsed,
        }
    }

    /// Row for a registry entry. Every entry kind has a row kind, so adding a
    /// kind to [`RegistryEntry`] fails to compile here until it is handled.
    pub fn from_entry(entry: RegistryEntry<'_>) -> Self {
        match entry {
            RegistryEntry::Action(action) => ListItem::Action(ActionItem {
                id: action.id(),
                name: action.name().to_string(),
                requires_confirmation: action.requires_confirmation(),
            }),
            RegistryEntry::Variable(variable) => ListItem::Variable(VariableItem {
                id: variable.id(),
                name: variable.name().to_string(),
                value: variable.value().to_string(),
                kind: variable.kind(),
                is_default: variable.is_default(),
                read_only: variable.flags().read_only,
            }),
        }
    }

    /// Header title or entry name.
    pub fn title(&self) -> &str {
        match self {
            ListItem::Group { title, .. } => title,
            ListItem::Action(item) => &item.name,
            ListItem::Variable(item) => &item.name,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, ListItem::Group { .. })
    }
}
