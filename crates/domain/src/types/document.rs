//! ERP document model
//!
//! The ERP is document-oriented: every record is a typed document with a
//! server-assigned `name` (primary key), a lifecycle state (`docstatus`)
//! and an opaque modification stamp used for optimistic concurrency. Field
//! sets differ per doctype and evolve server-side, so everything beyond
//! the identity envelope is kept in an open field map.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{ErpError, Result};

/// Document types managed by the payroll bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocType {
    Company,
    Employee,
    #[serde(rename = "Salary Component")]
    SalaryComponent,
    #[serde(rename = "Salary Structure")]
    SalaryStructure,
    #[serde(rename = "Salary Structure Assignment")]
    SalaryStructureAssignment,
    #[serde(rename = "Salary Slip")]
    SalarySlip,
}

impl DocType {
    /// The doctype name as the ERP spells it (spaces included).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Company => "Company",
            Self::Employee => "Employee",
            Self::SalaryComponent => "Salary Component",
            Self::SalaryStructure => "Salary Structure",
            Self::SalaryStructureAssignment => "Salary Structure Assignment",
            Self::SalarySlip => "Salary Slip",
        }
    }

    /// Parse an ERP doctype name back into the enum.
    #[must_use]
    pub fn from_erp_name(name: &str) -> Option<Self> {
        match name {
            "Company" => Some(Self::Company),
            "Employee" => Some(Self::Employee),
            "Salary Component" => Some(Self::SalaryComponent),
            "Salary Structure" => Some(Self::SalaryStructure),
            "Salary Structure Assignment" => Some(Self::SalaryStructureAssignment),
            "Salary Slip" => Some(Self::SalarySlip),
            _ => None,
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document lifecycle state.
///
/// Drafts are mutable. Submitted documents are finalized and only accept
/// `cancel`. Cancelled documents are immutable terminal records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocStatus {
    #[default]
    Draft,
    Submitted,
    Cancelled,
}

impl DocStatus {
    /// Wire representation (0/1/2).
    #[must_use]
    pub const fn as_int(self) -> i64 {
        match self {
            Self::Draft => 0,
            Self::Submitted => 1,
            Self::Cancelled => 2,
        }
    }

    #[must_use]
    pub const fn from_int(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Draft),
            1 => Some(Self::Submitted),
            2 => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Parse from a JSON value; the ERP emits integers but some list
    /// endpoints stringify them.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().and_then(Self::from_int),
            Value::String(s) => s.trim().parse::<i64>().ok().and_then(Self::from_int),
            _ => None,
        }
    }
}

impl fmt::Display for DocStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Draft => "Draft",
            Self::Submitted => "Submitted",
            Self::Cancelled => "Cancelled",
        };
        f.write_str(label)
    }
}

/// A single ERP document: identity envelope plus an open field map.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub doctype: DocType,
    /// Server-assigned primary key. `None` until the document is inserted.
    pub name: Option<String>,
    pub docstatus: DocStatus,
    /// Opaque modification stamp; echoed back so the ERP can detect
    /// concurrent edits. Never parsed or compared locally.
    pub modified: Option<String>,
    /// All remaining fields, untyped.
    pub fields: Map<String, Value>,
}

impl Document {
    /// New unsaved draft with an empty field map.
    #[must_use]
    pub fn new(doctype: DocType) -> Self {
        Self { doctype, name: None, docstatus: DocStatus::Draft, modified: None, fields: Map::new() }
    }

    /// Minimal reference to an existing document (doctype + name only).
    ///
    /// Lifecycle calls start from such a reference and only widen to the
    /// full document when a conflict forces a re-fetch.
    #[must_use]
    pub fn reference(doctype: DocType, name: impl Into<String>) -> Self {
        Self {
            doctype,
            name: Some(name.into()),
            docstatus: DocStatus::Draft,
            modified: None,
            fields: Map::new(),
        }
    }

    /// Builder-style field assignment.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn set_field(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    #[must_use]
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Numeric field value, coercing numeric-looking strings.
    #[must_use]
    pub fn f64_field(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(coerce_f64)
    }

    /// Child-table rows under `key`. Missing or non-array fields read as
    /// an empty table.
    #[must_use]
    pub fn rows(&self, key: &str) -> &[Value] {
        self.fields.get(key).and_then(Value::as_array).map_or(&[], Vec::as_slice)
    }

    /// Decode a JSON object returned by the ERP into a document of a known
    /// doctype.
    ///
    /// List endpoints return rows without a `doctype` key, which is why the
    /// caller supplies it. `docstatus` defaults to draft when the response
    /// omits it (partial field selections do).
    pub fn from_value(doctype: DocType, value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(ErpError::Internal(format!(
                "expected JSON object for {doctype} document, got {}",
                json_kind(&value)
            )));
        };

        map.remove("doctype");
        let name = map.remove("name").and_then(|v| match v {
            Value::String(s) => Some(s),
            _ => None,
        });
        let docstatus = map
            .remove("docstatus")
            .as_ref()
            .and_then(DocStatus::from_value)
            .unwrap_or_default();
        let modified = map.remove("modified").and_then(|v| match v {
            Value::String(s) => Some(s),
            _ => None,
        });

        Ok(Self { doctype, name, docstatus, modified, fields: map })
    }

    /// Encode as the JSON object the ERP expects.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = Map::with_capacity(self.fields.len() + 4);
        map.insert("doctype".to_string(), Value::String(self.doctype.as_str().to_string()));
        if let Some(name) = &self.name {
            map.insert("name".to_string(), Value::String(name.clone()));
        }
        map.insert("docstatus".to_string(), Value::from(self.docstatus.as_int()));
        if let Some(modified) = &self.modified {
            map.insert("modified".to_string(), Value::String(modified.clone()));
        }
        for (key, value) in &self.fields {
            map.insert(key.clone(), value.clone());
        }
        Value::Object(map)
    }
}

/// Coerce a JSON value to `f64`, accepting numeric strings.
///
/// Payroll amounts frequently round-trip through spreadsheet exports and
/// arrive as `"1000.50"` rather than `1000.5`.
#[must_use]
pub fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
