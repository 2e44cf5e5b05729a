//! Explicit declaration of console members on an owner type.
//!
//! A type implementing [`ConsoleTarget`] lists the methods and variables it
//! exposes. [`Registry::register`](crate::registry::Registry::register) walks
//! the declarations in order and registers every supported member, bound to
//! the given instance.
//!
//! ```rust,ignore
//! struct Arena { enemies: Cell<u32> }
//!
//! impl Arena {
//!     fn spawn_enemy(&self) { self.enemies.set(self.enemies.get() + 1) }
//!     fn reset() {}
//! }
//!
//! impl ConsoleTarget for Arena {
//!     fn declare(decl: &mut Declarations<Self>) {
//!         decl.method("spawn_enemy", Arena::spawn_enemy).group("Enemies");
//!         decl.static_action("Reset", Arena::reset).requires_confirmation();
//!         decl.variable(VariableSpec::new("speed", VarValue::Float(5.0)).range(0.0, 20.0));
//!     }
//! }
//! ```

use std::fmt;

use crate::variable::VariableSpec;

/// A type whose members can be registered with the console in one call.
pub trait ConsoleTarget: Sized + 'static {
    fn declare(decl: &mut Declarations<Self>);
}

/// Why a declared member cannot be invoked from the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signature {
    /// The member takes this many arguments.
    Arguments(usize),
    /// The member returns a value of the named type.
    Returns(&'static str),
    /// The member is a coroutine / generator rather than a plain call.
    Coroutine,
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signature::Arguments(1) => write!(f, "takes 1 argument"),
            Signature::Arguments(n) => write!(f, "takes {n} arguments"),
            Signature::Returns(ty) => write!(f, "returns {ty}"),
            Signature::Coroutine => write!(f, "is a coroutine"),
        }
    }
}

pub(crate) enum Invoker<T> {
    Instance(fn(&T)),
    Static(fn()),
}

/// One declared action, adjustable through chained setters.
pub struct ActionDecl<T> {
    pub(crate) name: String,
    pub(crate) invoker: Invoker<T>,
    pub(crate) requires_confirmation: bool,
    pub(crate) group: Option<String>,
}

impl<T> ActionDecl<T> {
    pub fn requires_confirmation(&mut self) -> &mut Self {
        self.requires_confirmation = true;
        self
    }

    pub fn group(&mut self, group: impl Into<String>) -> &mut Self {
        self.group = Some(group.into());
        self
    }
}

/// Declarations collected from [`ConsoleTarget::declare`].
pub struct Declarations<T> {
    pub(crate) actions: Vec<ActionDecl<T>>,
    pub(crate) variables: Vec<VariableSpec>,
    pub(crate) unsupported: Vec<(String, Signature)>,
}

impl<T> Default for Declarations<T> {
    fn default() -> Self {
        Self {
            actions: Vec::new(),
            variables: Vec::new(),
            unsupported: Vec::new(),
        }
    }
}

impl<T: ConsoleTarget> Declarations<T> {
    pub(crate) fn collect() -> Self {
        let mut decl = Self::default();
        T::declare(&mut decl);
        decl
    }
}

impl<T> Declarations<T> {
    /// Instance action shown as `name`.
    pub fn action(&mut self, name: impl Into<String>, method: fn(&T)) -> &mut ActionDecl<T> {
        self.push(name.into(), Invoker::Instance(method))
    }

    /// Instance action named after a method identifier (`spawn_enemy` becomes
    /// `Spawn Enemy`).
    pub fn method(&mut self, ident: &str, method: fn(&T)) -> &mut ActionDecl<T> {
        self.push(display_name(ident), Invoker::Instance(method))
    }

    /// Action that does not need the instance.
    pub fn static_action(&mut self, name: impl Into<String>, func: fn()) -> &mut ActionDecl<T> {
        self.push(name.into(), Invoker::Static(func))
    }

    pub fn variable(&mut self, spec: VariableSpec) {
        self.variables.push(spec);
    }

    /// Record a member that exists on the target but cannot be called from
    /// the console. It is reported at registration time and never registered.
    pub fn unsupported(&mut self, name: impl Into<String>, signature: Signature) {
        self.unsupported.push((name.into(), signature));
    }

    fn push(&mut self, name: String, invoker: Invoker<T>) -> &mut ActionDecl<T> {
        let idx = self.actions.len();
        self.actions.push(ActionDecl {
            name,
            invoker,
            requires_confirmation: false,
            group: None,
        });
        &mut self.actions[idx]
    }
}

/// Turn a method identifier into a display label.
///
/// Underscores separate words, and so does every lower-to-upper case change:
/// `public_action`, `PublicAction` and `publicAction` all become
/// `Public Action`.
pub fn display_name(ident: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in ident.chars() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
