//! Live-tunable console variables.
//!
//! A variable keeps its current value next to the value it was registered
//! with, so it can always be reset. Numeric variables may carry a [`Range`];
//! updates outside of it are clamped rather than rejected.

use std::fmt;

use serde::Serialize;

use crate::action::OwnerKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct VariableId(pub u32);

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// Value kind of a variable. A variable never changes kind after registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VarKind {
    Bool,
    Int,
    Float,
    Text,
    Choice,
}

impl VarKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            VarKind::Bool => "bool",
            VarKind::Int => "int",
            VarKind::Float => "float",
            VarKind::Text => "text",
            VarKind::Choice => "choice",
        }
    }
}

impl fmt::Display for VarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Runtime value of a variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum VarValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Text(String),
    /// One of a fixed list of options.
    Choice {
        selected: String,
        options: Vec<String>,
    },
}

impl VarValue {
    pub fn choice<S: Into<String>>(
        selected: impl Into<String>,
        options: impl IntoIterator<Item = S>,
    ) -> Self {
        VarValue::Choice {
            selected: selected.into(),
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    pub fn kind(&self) -> VarKind {
        match self {
            VarValue::Bool(_) => VarKind::Bool,
            VarValue::Int(_) => VarKind::Int,
            VarValue::Float(_) => VarKind::Float,
            VarValue::Text(_) => VarKind::Text,
            VarValue::Choice { .. } => VarKind::Choice,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            VarValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            VarValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view of int and float values.
    pub fn as_float(&self) -> Option<f32> {
        match self {
            VarValue::Int(v) => Some(*v as f32),
            VarValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Text of text values and the selected option of choices.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            VarValue::Text(v) => Some(v),
            VarValue::Choice { selected, .. } => Some(selected),
            _ => None,
        }
    }

    /// Parse console input into a value of the same kind as `self`.
    ///
    /// Choices keep their option list; the input must name one of the
    /// options (case-insensitive) and is normalized to its spelling.
    pub fn parse_like(&self, input: &str) -> Option<VarValue> {
        let input = input.trim();
        match self {
            VarValue::Bool(_) => match input.to_ascii_lowercase().as_str() {
                "true" | "1" | "on" | "yes" => Some(VarValue::Bool(true)),
                "false" | "0" | "off" | "no" => Some(VarValue::Bool(false)),
                _ => None,
            },
            VarValue::Int(_) => input.parse().ok().map(VarValue::Int),
            VarValue::Float(_) => input
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .map(VarValue::Float),
            VarValue::Text(_) => Some(VarValue::Text(input.to_string())),
            VarValue::Choice { options, .. } => options
                .iter()
                .find(|opt| opt.eq_ignore_ascii_case(input))
                .map(|opt| VarValue::Choice {
                    selected: opt.clone(),
                    options: options.clone(),
                }),
        }
    }

    /// Value a console toggle moves to: bools flip, choices advance to the
    /// next option (wrapping). Other kinds have no toggle.
    pub fn toggled(&self) -> Option<VarValue> {
        match self {
            VarValue::Bool(v) => Some(VarValue::Bool(!v)),
            VarValue::Choice { selected, options } if !options.is_empty() => {
                let idx = options.iter().position(|o| o == selected).unwrap_or(0);
                Some(VarValue::Choice {
                    selected: options[(idx + 1) % options.len()].clone(),
                    options: options.clone(),
                })
            }
            _ => None,
        }
    }
}

impl fmt::Display for VarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarValue::Bool(v) => write!(f, "{v}"),
            VarValue::Int(v) => write!(f, "{v}"),
            VarValue::Float(v) => write!(f, "{v}"),
            VarValue::Text(v) => write!(f, "{v:?}"),
            VarValue::Choice { selected, .. } => write!(f, "{selected}"),
        }
    }
}

/// Inclusive numeric bounds for int and float variables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Range {
    pub min: f32,
    pub max: f32,
}

impl Range {
    pub fn new(min: f32, max: f32) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn clamp(&self, value: f32) -> f32 {
        // NaN bounds are ignored rather than panicking like f32::clamp
        value.max(self.min).min(self.max)
    }

    /// Whole-number bounds inside the range, for int variables.
    fn int_bounds(&self) -> (i32, i32) {
        let lo = self.min.ceil() as i32;
        let hi = self.max.floor() as i32;
        (lo, hi.max(lo))
    }

    fn apply(&self, value: VarValue) -> VarValue {
        match value {
            VarValue::Int(v) => {
                let (lo, hi) = self.int_bounds();
                VarValue::Int(v.clamp(lo, hi))
            }
            VarValue::Float(v) => VarValue::Float(self.clamp(v)),
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VarFlags {
    /// Not listed in the overlay.
    pub hidden: bool,
    /// Console commands may read but not write the value.
    pub read_only: bool,
}

/// Everything needed to register a variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSpec {
    pub(crate) name: String,
    pub(crate) value: VarValue,
    pub(crate) group: Option<String>,
    pub(crate) range: Option<Range>,
    pub(crate) flags: VarFlags,
}

impl VariableSpec {
    pub fn new(name: impl Into<String>, value: VarValue) -> Self {
        Self {
            name: name.into(),
            value,
            group: None,
            range: None,
            flags: VarFlags::default(),
        }
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Clamp values to `min..=max`. Non-finite bounds leave the variable
    /// unbounded.
    pub fn range(mut self, min: f32, max: f32) -> Self {
        if min.is_finite() && max.is_finite() {
            self.range = Some(Range::new(min, max));
        } else {
            tracing::warn!(variable = %self.name, min, max, "ignoring non-finite range");
            self.range = None;
        }
        self
    }

    pub fn hidden(mut self) -> Self {
        self.flags.hidden = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.flags.read_only = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A registered variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variable {
    pub(crate) id: VariableId,
    pub(crate) name: String,
    pub(crate) value: VarValue,
    pub(crate) default: VarValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) range: Option<Range>,
    #[serde(skip)]
    pub(crate) flags: VarFlags,
    #[serde(skip)]
    pub(crate) owner: Option<OwnerKey>,
}

impl Variable {
    pub(crate) fn from_spec(id: VariableId, spec: VariableSpec, owner: Option<OwnerKey>) -> Self {
        let value = match spec.range {
            Some(range) => range.apply(spec.value),
            None => spec.value,
        };
        Self {
            id,
            name: spec.name,
            default: value.clone(),
            value,
            group: spec.group,
            range: spec.range,
            flags: spec.flags,
            owner,
        }
    }

    pub fn id(&self) -> VariableId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &VarValue {
        &self.value
    }

    pub fn default_value(&self) -> &VarValue {
        &self.default
    }

    pub fn kind(&self) -> VarKind {
        self.value.kind()
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn range(&self) -> Option<Range> {
        self.range
    }

    pub fn flags(&self) -> VarFlags {
        self.flags
    }

    pub fn owner(&self) -> Option<OwnerKey> {
        self.owner
    }

    pub fn is_default(&self) -> bool {
        self.value == self.default
    }

    /// Store a new value. Returns whether the stored value changed.
    pub(crate) fn set_value(&mut self, value: VarValue) -> Result<bool, VariableError> {
        if value.kind() != self.kind() {
            return Err(VariableError::KindMismatch {
                name: self.name.clone(),
                expected: self.kind(),
                found: value.kind(),
            });
        }

        let value = match (&self.value, value) {
            (VarValue::Choice { options, .. }, VarValue::Choice { selected, .. }) => {
                if !options.contains(&selected) {
                    return Err(VariableError::InvalidChoice {
                        name: self.name.clone(),
                        value: selected,
                    });
                }
                VarValue::Choice {
                    selected,
                    options: options.clone(),
                }
            }
            (_, value) => match self.range {
                Some(range) => range.apply(value),
                None => value,
            },
        };

        if value == self.value {
            return Ok(false);
        }
        self.value = value;
        Ok(true)
    }

    pub(crate) fn reset(&mut self) -> bool {
        if self.is_default() {
            return false;
        }
        self.value = self.default.clone();
        true
    }
}

/// Failures when reading or writing variables.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableError {
    UnknownVariable(String),
    KindMismatch {
        name: String,
        expected: VarKind,
        found: VarKind,
    },
    InvalidChoice {
        name: String,
        value: String,
    },
    ReadOnly(String),
    Parse {
        name: String,
        kind: VarKind,
        input: String,
    },
}

impl fmt::Display for VariableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownVariable(name) => write!(f, "unknown variable: {name}"),
            Self::KindMismatch {
                name,
                expected,
                found,
            } => write!(f, "variable {name} holds {expected}, got {found}"),
            Self::InvalidChoice { name, value } => {
                write!(f, "{value:?} is not an option of variable {name}")
            }
            Self::ReadOnly(name) => write!(f, "variable {name} is read-only"),
            Self::Parse { name, kind, input } => {
                write!(f, "cannot parse {input:?} as {kind} for variable {name}")
            }
        }
    }
}

impl std::error::Error for VariableError {}
