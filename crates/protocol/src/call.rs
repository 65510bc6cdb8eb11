//! The dialect-neutral description of one remote call.

use {
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
};

use crate::{Error, Result};

// ── Meta directives ──────────────────────────────────────────────────────────

/// One sort directive. On the wire this is either `"field"` or
/// `["field", "method"]`; a leading `!` on the field means descending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SortRule {
    Field(String),
    WithMethod(String, String),
}

impl SortRule {
    /// Field name as given, including any `!` prefix.
    #[must_use]
    pub fn raw_field(&self) -> &str {
        match self {
            Self::Field(field) | Self::WithMethod(field, _) => field,
        }
    }

    /// Field name with the descending marker stripped.
    #[must_use]
    pub fn column(&self) -> &str {
        let raw = self.raw_field();
        raw.strip_prefix('!').unwrap_or(raw)
    }

    #[must_use]
    pub fn is_descending(&self) -> bool {
        self.raw_field().starts_with('!')
    }

    #[must_use]
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Field(_) => None,
            Self::WithMethod(_, method) => Some(method),
        }
    }
}

impl From<&str> for SortRule {
    fn from(field: &str) -> Self {
        Self::Field(field.to_string())
    }
}

/// `[field, operator, argument]` filter triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRule(pub String, pub String, pub Value);

impl FilterRule {
    pub fn new(field: impl Into<String>, operator: impl Into<String>, arg: impl Into<Value>) -> Self {
        Self(field.into(), operator.into(), arg.into())
    }

    #[must_use]
    pub fn field(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn operator(&self) -> &str {
        &self.1
    }

    #[must_use]
    pub fn argument(&self) -> &Value {
        &self.2
    }
}

/// Paging request. `start_record` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginate {
    #[serde(default)]
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_record: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i64>,
}

impl Paginate {
    /// Paging switched off but remembering a page size for later.
    #[must_use]
    pub fn disabled(page_size: i64) -> Self {
        Self {
            enabled: false,
            start_page: Some(0),
            start_record: Some(0),
            page_size: Some(page_size),
        }
    }
}

/// Sort, filter and paging directives for a call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestMeta {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<FilterRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paginate: Option<Paginate>,
}

impl RequestMeta {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sort.is_empty() && self.filter.is_empty() && self.paginate.is_none()
    }
}

// ── Analytics ────────────────────────────────────────────────────────────────

/// Free-form analytics attached to a call. Updates merge key by key and never
/// remove anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Analytics {
    values: Map<String, Value>,
}

impl Analytics {
    #[must_use]
    pub fn new(options: Option<Map<String, Value>>) -> Self {
        Self {
            values: options.unwrap_or_default(),
        }
    }

    pub fn update(&mut self, options: Option<Map<String, Value>>) {
        for (key, value) in options.unwrap_or_default() {
            self.values.insert(key, value);
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    #[must_use]
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Compact JSON text, as sent in `api.analytics`.
    #[must_use]
    pub fn serialize(&self) -> String {
        Value::Object(self.values.clone()).to_string()
    }
}

// ── Descriptor ───────────────────────────────────────────────────────────────

/// Everything a dialect needs to serialize one call. Built by a request
/// builder and consumed by exactly one adapter invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallDescriptor {
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    pub func: String,
    #[serde(default)]
    pub args: Map<String, Value>,
    #[serde(default, skip_serializing_if = "RequestMeta::is_empty")]
    pub meta: RequestMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analytics: Option<Analytics>,
    #[serde(default)]
    pub json: bool,
    /// Dialect of a payload nested inside this call's response, decided when
    /// the call is built.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested_dialect: Option<crate::DialectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<Vec<CallDescriptor>>,
}

impl CallDescriptor {
    pub fn new(version: u32, module: Option<String>, func: impl Into<String>) -> Self {
        Self {
            version,
            module,
            func: func.into(),
            args: Map::new(),
            meta: RequestMeta::default(),
            analytics: None,
            json: false,
            nested_dialect: None,
            batch: None,
        }
    }

    /// A batch of independent sub-calls sent as one request.
    #[must_use]
    pub fn batch(version: u32, calls: Vec<CallDescriptor>) -> Self {
        let mut call = Self::new(version, None, "");
        call.batch = Some(calls);
        call
    }

    #[must_use]
    pub fn is_batch(&self) -> bool {
        self.batch.is_some()
    }

    /// Module name, treating an empty string as absent.
    #[must_use]
    pub fn module_name(&self) -> Option<&str> {
        self.module.as_deref().filter(|m| !m.is_empty())
    }

    /// Checks the descriptor can be handed to an adapter.
    pub fn validate(&self) -> Result<()> {
        match &self.batch {
            Some(calls) => calls.iter().try_for_each(Self::validate),
            None if self.func.is_empty() => Err(Error::MissingFunction),
            None => Ok(()),
        }
    }
}
