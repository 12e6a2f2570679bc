use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{DashError, DashResult};

/// Value held by one widget.
///
/// Deserialized untagged so browser payloads (`true`, `3`, `0.5`, `"head"`)
/// map directly onto a variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl InputValue {
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Integer view; integral floats are accepted.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Float(value) if value.is_finite() && value.fract() == 0.0 => Some(*value as i64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Float(_) => "number",
            Self::Text(_) => "text",
        }
    }
}

impl fmt::Display for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<bool> for InputValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for InputValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<usize> for InputValue {
    fn from(value: usize) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for InputValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for InputValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// One entry offered by a select or radio widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub value: InputValue,
    pub label: String,
}

impl Choice {
    #[must_use]
    pub fn new(value: impl Into<InputValue>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// Choice whose label is its own text value.
    #[must_use]
    pub fn plain(value: &str) -> Self {
        Self::new(value, value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WidgetKind {
    Select {
        choices: Vec<Choice>,
        /// Values accepted even when a rule narrowed the offered choices.
        #[serde(skip_serializing_if = "Option::is_none", default)]
        domain: Option<Vec<InputValue>>,
    },
    Radio {
        choices: Vec<Choice>,
    },
    Slider {
        min: f64,
        max: f64,
        step: f64,
    },
    Numeric {
        min: i64,
        max: i64,
    },
    Switch,
    Text,
    /// Button; its value counts presses.
    Action,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub key: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: WidgetKind,
    pub value: InputValue,
}

impl Widget {
    #[must_use]
    pub fn select(
        key: impl Into<String>,
        label: impl Into<String>,
        choices: Vec<Choice>,
        selected: impl Into<InputValue>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind: WidgetKind::Select {
                choices,
                domain: None,
            },
            value: selected.into(),
        }
    }

    #[must_use]
    pub fn radio(
        key: impl Into<String>,
        label: impl Into<String>,
        choices: Vec<Choice>,
        selected: impl Into<InputValue>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind: WidgetKind::Radio { choices },
            value: selected.into(),
        }
    }

    #[must_use]
    pub fn slider(
        key: impl Into<String>,
        label: impl Into<String>,
        (min, max, step): (f64, f64, f64),
        value: f64,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind: WidgetKind::Slider { min, max, step },
            value: InputValue::Float(value),
        }
    }

    #[must_use]
    pub fn numeric(
        key: impl Into<String>,
        label: impl Into<String>,
        (min, max): (i64, i64),
        value: i64,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind: WidgetKind::Numeric { min, max },
            value: InputValue::Int(value),
        }
    }

    #[must_use]
    pub fn switch(key: impl Into<String>, label: impl Into<String>, value: bool) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind: WidgetKind::Switch,
            value: InputValue::Bool(value),
        }
    }

    #[must_use]
    pub fn text(key: impl Into<String>, label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind: WidgetKind::Text,
            value: InputValue::Text(value.into()),
        }
    }

    #[must_use]
    pub fn action(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind: WidgetKind::Action,
            value: InputValue::Int(0),
        }
    }

    /// Accepts every value of `domain` while offering a narrower choice set.
    #[must_use]
    pub fn with_domain(mut self, values: Vec<InputValue>) -> Self {
        if let WidgetKind::Select { domain, .. } = &mut self.kind {
            *domain = Some(values);
        }
        self
    }

    #[must_use]
    pub fn choices(&self) -> Option<&[Choice]> {
        match &self.kind {
            WidgetKind::Select { choices, .. } | WidgetKind::Radio { choices } => Some(choices),
            _ => None,
        }
    }

    /// Checks `value` against the widget and returns its normalized form.
    pub fn validate(&self, value: InputValue) -> DashResult<InputValue> {
        let reject = |reason: String| DashError::invalid_input(&self.key, reason);
        match &self.kind {
            WidgetKind::Select { choices, domain } => {
                let accepted = match domain {
                    Some(domain) => domain
                        .iter()
                        .find(|candidate| same_choice(candidate, &value))
                        .cloned(),
                    None => choices
                        .iter()
                        .find(|choice| same_choice(&choice.value, &value))
                        .map(|choice| choice.value.clone()),
                };
                accepted.ok_or_else(|| reject(format!("`{value}` is not an offered choice")))
            }
            WidgetKind::Radio { choices } => choices
                .iter()
                .find(|choice| same_choice(&choice.value, &value))
                .map(|choice| choice.value.clone())
                .ok_or_else(|| reject(format!("`{value}` is not an offered choice"))),
            WidgetKind::Slider { min, max, .. } => {
                let number = value
                    .as_float()
                    .filter(|number| number.is_finite())
                    .ok_or_else(|| reject(format!("expected a number, got {}", value.type_name())))?;
                if number < *min || number > *max {
                    return Err(reject(format!("{number} is outside [{min}, {max}]")));
                }
                Ok(InputValue::Float(number))
            }
            WidgetKind::Numeric { min, max } => {
                let number = value
                    .as_int()
                    .ok_or_else(|| reject(format!("expected an integer, got {value}")))?;
                if number < *min || number > *max {
                    return Err(reject(format!("{number} is outside [{min}, {max}]")));
                }
                Ok(InputValue::Int(number))
            }
            WidgetKind::Switch => value
                .as_bool()
                .map(InputValue::Bool)
                .ok_or_else(|| reject(format!("expected a bool, got {}", value.type_name()))),
            WidgetKind::Text => match value {
                InputValue::Text(text) => Ok(InputValue::Text(text)),
                other => Ok(InputValue::Text(other.to_string())),
            },
            WidgetKind::Action => Err(reject("actions are pressed, not set".to_owned())),
        }
    }
}

fn same_choice(choice: &InputValue, value: &InputValue) -> bool {
    match choice {
        InputValue::Int(_) => choice.as_int().is_some() && choice.as_int() == value.as_int(),
        InputValue::Float(number) => value.as_float() == Some(*number),
        _ => choice == value,
    }
}

/// Current widget values of one session, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WidgetStore {
    widgets: IndexMap<String, Widget>,
}

impl WidgetStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, widget: Widget) -> DashResult<()> {
        if self.widgets.contains_key(&widget.key) {
            return Err(DashError::Configuration(format!(
                "input `{}` is declared more than once",
                widget.key
            )));
        }
        let initial = widget.value.clone();
        if !matches!(widget.kind, WidgetKind::Action) {
            widget.validate(initial)?;
        }
        self.widgets.insert(widget.key.clone(), widget);
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.widgets.contains_key(key)
    }

    pub fn get(&self, key: &str) -> DashResult<&Widget> {
        self.widgets
            .get(key)
            .ok_or_else(|| DashError::UnknownInput(key.to_owned()))
    }

    pub fn value(&self, key: &str) -> DashResult<&InputValue> {
        self.get(key).map(|widget| &widget.value)
    }

    /// Validates and stores `value`; returns whether the stored value changed.
    pub fn set(&mut self, key: &str, value: InputValue) -> DashResult<bool> {
        let widget = self
            .widgets
            .get_mut(key)
            .ok_or_else(|| DashError::UnknownInput(key.to_owned()))?;
        let value = widget.validate(value)?;
        if widget.value == value {
            return Ok(false);
        }
        widget.value = value;
        Ok(true)
    }

    /// Replaces the offered choices and the selection; returns whether the
    /// choice set changed.
    pub(crate) fn set_choices(
        &mut self,
        key: &str,
        choices: Vec<Choice>,
        selected: InputValue,
    ) -> DashResult<bool> {
        let widget = self
            .widgets
            .get_mut(key)
            .ok_or_else(|| DashError::UnknownInput(key.to_owned()))?;
        let changed = match &mut widget.kind {
            WidgetKind::Select { choices: current, .. } | WidgetKind::Radio { choices: current } => {
                let changed = *current != choices;
                *current = choices;
                changed
            }
            _ => {
                return Err(DashError::Configuration(format!(
                    "input `{key}` does not offer choices"
                )))
            }
        };
        widget.value = selected;
        Ok(changed)
    }

    /// Increments an action counter and returns the new count.
    pub fn press(&mut self, key: &str) -> DashResult<i64> {
        let widget = self
            .widgets
            .get_mut(key)
            .ok_or_else(|| DashError::UnknownInput(key.to_owned()))?;
        if !matches!(widget.kind, WidgetKind::Action) {
            return Err(DashError::invalid_input(key, "only actions can be pressed"));
        }
        let count = widget.value.as_int().unwrap_or(0) + 1;
        widget.value = InputValue::Int(count);
        Ok(count)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Widget> {
        self.widgets.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }
}
