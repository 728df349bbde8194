use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(RecordId);

/// Field name the remote collections use for their numeric identifier.
pub const RECORD_ID_FIELD: &str = "id";

/// One remote entity as returned by the API. Field names and values are owned by the server;
/// the client only interprets `id` and whatever a form schema asks for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub Map<String, Value>);

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn id(&self) -> Option<RecordId> {
        match self.0.get(RECORD_ID_FIELD)? {
            Value::Number(n) => n.as_i64().map(RecordId),
            Value::String(s) => s.trim().parse().ok().map(RecordId),
            _ => None,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Plain-text rendering of a field for tables and prompts.
    pub fn display_field(&self, field: &str) -> String {
        match self.0.get(field) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

impl From<Map<String, Value>> for Record {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

/// Page coordinates of a list controller. `number` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub number: u32,
    pub size: u32,
    pub total_pages: u32,
}

impl Page {
    pub fn first(size: u32) -> Self {
        Self {
            number: 1,
            size: size.max(1),
            total_pages: 1,
        }
    }

    pub fn contains(&self, number: u32) -> bool {
        (1..=self.total_pages).contains(&number)
    }
}
