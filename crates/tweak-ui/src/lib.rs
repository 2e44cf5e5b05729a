//! Terminal presentation of the tweak console.
//!
//! The [`view_model`] turns registry contents into panel rows; the remaining
//! modules draw them, together with the console log and input line, using
//! [`ratatui`]. State lives in [`tweak_core`]; this crate only reads it.

pub mod console;
pub mod layout;
pub mod list_item;
pub mod panel;
pub mod shell;
pub mod view_model;

pub use list_item::ListItem;
pub use view_model::{build_items, Activation, ActionsViewModel, ViewState};
