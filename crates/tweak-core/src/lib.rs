//! Core of the tweak debug console.
//!
//! This crate holds everything that does not draw to a terminal: the
//! [`registry::Registry`] of actions and variables, the explicit
//! [`target::ConsoleTarget`] declarations used to register a whole object,
//! observable streams the overlay subscribes to, the drop-down console's
//! input state, its command set, and the logging subsystem.

pub mod action;
pub mod command;
pub mod console;
pub mod group;
pub mod logging;
pub mod reactive;
pub mod registry;
pub mod target;
pub mod variable;

pub use action::{Action, ActionId, Callback, OwnerKey};
pub use registry::{Registration, Registry, RegistryError, RegistryListener};
pub use target::{ConsoleTarget, Declarations, Signature};
pub use variable::{VarKind, VarValue, Variable, VariableError, VariableId, VariableSpec};
