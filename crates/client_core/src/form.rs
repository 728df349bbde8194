//! Form schema and immutable form values.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use shared::{domain::Record, error::ClientError};

use crate::currency::CurrencyFormatter;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Text,
    /// ISO `YYYY-MM-DD`.
    Date,
    /// Held as the grouped display string, sent as an integer.
    Currency,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub label: Option<String>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            label: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSchema {
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl FormSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn kind_of(&self, name: &str) -> FieldKind {
        self.field(name).map(|f| f.kind).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Date(String),
    Currency(String),
}

impl FieldValue {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(s) | Self::Date(s) | Self::Currency(s) => s,
        }
    }

    /// Interprets raw user input according to the field kind. Currency input is reformatted
    /// into its grouped display form.
    pub fn from_input(kind: FieldKind, raw: &str, fmt: &CurrencyFormatter) -> Self {
        match kind {
            FieldKind::Text => Self::Text(raw.to_string()),
            FieldKind::Date => Self::Date(raw.trim().to_string()),
            FieldKind::Currency => Self::Currency(fmt.normalize(raw)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    fields: BTreeMap<String, FieldValue>,
}

impl FormValues {
    /// Blank form: text empty, currency `0`, dates set to `today`.
    pub fn defaults(schema: &FormSchema, today: NaiveDate, fmt: &CurrencyFormatter) -> Self {
        let fields = schema
            .fields
            .iter()
            .map(|spec| {
                let value = match spec.kind {
                    FieldKind::Text => FieldValue::Text(String::new()),
                    FieldKind::Date => FieldValue::Date(today.format(DATE_FORMAT).to_string()),
                    FieldKind::Currency => FieldValue::Currency(fmt.format(0)),
                };
                (spec.name.clone(), value)
            })
            .collect();
        Self { fields }
    }

    /// Pre-fills from an existing record, converting raw amounts to display strings.
    pub fn from_record(schema: &FormSchema, record: &Record, fmt: &CurrencyFormatter) -> Self {
        let fields = schema
            .fields
            .iter()
            .map(|spec| {
                let shown = record.display_field(&spec.name);
                let value = match spec.kind {
                    FieldKind::Text => FieldValue::Text(shown),
                    FieldKind::Date => FieldValue::Date(date_prefix(&shown)),
                    FieldKind::Currency => {
                        FieldValue::Currency(fmt.format(amount_of(record.get(&spec.name), fmt)))
                    }
                };
                (spec.name.clone(), value)
            })
            .collect();
        Self { fields }
    }

    pub fn with_field(&self, name: impl Into<String>, value: FieldValue) -> Self {
        let mut fields = self.fields.clone();
        fields.insert(name.into(), value);
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn validate(&self, schema: &FormSchema) -> Result<(), ClientError> {
        for spec in &schema.fields {
            let value = self.fields.get(&spec.name).map(FieldValue::as_str).unwrap_or("");
            if spec.required && value.trim().is_empty() {
                return Err(ClientError::validation(format!("{} is required", spec.label())));
            }
            if spec.kind == FieldKind::Date
                && !value.trim().is_empty()
                && NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).is_err()
            {
                return Err(ClientError::validation(format!(
                    "{} must be a date in YYYY-MM-DD format",
                    spec.label()
                )));
            }
        }
        Ok(())
    }

    /// JSON body for create/update. Currency strings become integers here and nowhere else.
    pub fn to_payload(&self, fmt: &CurrencyFormatter) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|(name, value)| {
                let json = match value {
                    FieldValue::Text(s) => Value::String(s.clone()),
                    FieldValue::Date(s) if s.trim().is_empty() => Value::Null,
                    FieldValue::Date(s) => Value::String(s.trim().to_string()),
                    FieldValue::Currency(s) => Value::Number(Number::from(fmt.parse(s))),
                };
                (name.clone(), json)
            })
            .collect()
    }
}

fn date_prefix(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.get(..10) {
        Some(prefix) if NaiveDate::parse_from_str(prefix, DATE_FORMAT).is_ok() => {
            prefix.to_string()
        }
        _ => trimmed.to_string(),
    }
}

/// Amount stored on a record: integer, decimal (`"250000.00"`) or already-grouped string
/// (`"250.000"`). A string shaped like a grouped amount is always read as one.
fn amount_of(raw: Option<&Value>, fmt: &CurrencyFormatter) -> u64 {
    match raw {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .unwrap_or(0),
        Some(Value::String(s)) if is_grouped(s.trim(), fmt.separator()) => fmt.parse(s),
        Some(Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(f) if f >= 0.0 && f.is_finite() => f.round() as u64,
            _ => fmt.parse(s),
        },
        _ => 0,
    }
}

/// `1-3 digits` followed by one or more `separator + 3 digits` groups.
fn is_grouped(s: &str, separator: char) -> bool {
    let mut groups = s.split(separator);
    let head_ok = groups
        .next()
        .is_some_and(|g| (1..=3).contains(&g.len()) && g.bytes().all(|b| b.is_ascii_digit()));
    let mut tail = groups.peekable();
    head_ok
        && tail.peek().is_some()
        && tail.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
