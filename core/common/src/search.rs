//! Search request parameters and search response types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::types::as_integer;
use crate::{Error, Result};

/// Form field names understood by the search endpoint.
pub mod keys {
    pub const OPERATION: &str = "operation";
    pub const PROPERTY_TYPE: &str = "propertyType";
    pub const CENTER: &str = "center";
    pub const DISTANCE: &str = "distance";
    pub const LOCATION_ID: &str = "locationId";
    pub const LOCALE: &str = "locale";
    pub const MAX_ITEMS: &str = "maxItems";
    pub const NUM_PAGE: &str = "numPage";
}

/// Scalar value of a search form field.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl ParamValue {
    /// Text sent on the wire for this value.
    pub fn to_form_value(&self) -> String {
        match self {
            ParamValue::Text(s) => s.clone(),
            ParamValue::Int(n) => n.to_string(),
            ParamValue::Float(f) => f.to_string(),
            ParamValue::Bool(true) => "true".to_string(),
            ParamValue::Bool(false) => "false".to_string(),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_form_value())
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(value as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

/// Ordered search parameters.
///
/// Keys are unique. Setting an existing key replaces its value in place, so
/// the field keeps its original position in the encoded form. A key set to
/// `None` is remembered but never sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchParams {
    entries: Vec<(String, Option<ParamValue>)>,
}

impl SearchParams {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create parameters for the given operation (`sale`, `rent`) and property type.
    pub fn listing(operation: impl Into<String>, property_type: impl Into<String>) -> Self {
        let mut params = Self::new();
        params.set(keys::OPERATION, operation.into());
        params.set(keys::PROPERTY_TYPE, property_type.into());
        params
    }

    /// Set a key, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> &mut Self {
        self.put(key.into(), Some(value.into()))
    }

    /// Set a key to an optional value. `None` keeps the key out of the request.
    pub fn set_opt<V: Into<ParamValue>>(
        &mut self,
        key: impl Into<String>,
        value: Option<V>,
    ) -> &mut Self {
        self.put(key.into(), value.map(Into::into))
    }

    fn put(&mut self, key: String, value: Option<ParamValue>) -> &mut Self {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    /// Merge caller-supplied filters.
    ///
    /// Filters are applied last and overwrite built-in keys of the same name.
    pub fn extend_filters<I, K, V>(&mut self, filters: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParamValue>,
    {
        for (key, value) in filters {
            self.set(key, value);
        }
        self
    }

    /// Value currently set for `key`.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_ref())
    }

    /// Fields that will be sent, in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| (k.as_str(), v)))
    }
}

/// Raw search response with typed accessors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchResult(Map<String, Value>);

impl SearchResult {
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Listings on this page (or across all fetched pages).
    pub fn element_list(&self) -> &[Value] {
        self.0
            .get("elementList")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Page count reported by the provider. Defaults to 1 when absent.
    ///
    /// # Errors
    /// - `InvalidResponse` if the field is present but not an integer
    pub fn total_pages(&self) -> Result<i64> {
        match self.0.get("totalPages") {
            None | Some(Value::Null) => Ok(1),
            Some(value) => as_integer(value).ok_or_else(|| {
                Error::InvalidResponse(format!("totalPages is not an integer: {}", value))
            }),
        }
    }

    pub fn total(&self) -> Option<&Value> {
        self.0.get("total")
    }

    pub fn summary(&self) -> Option<&Value> {
        self.0.get("summary")
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Take the listings out of this result, leaving an empty list behind.
    pub fn take_elements(&mut self) -> Vec<Value> {
        match self.0.get_mut("elementList") {
            Some(Value::Array(items)) => std::mem::take(items),
            _ => Vec::new(),
        }
    }

    /// Replace the listings and the page count.
    pub fn set_pages(&mut self, elements: Vec<Value>, total_pages: i64) {
        self.0
            .insert("elementList".to_string(), Value::Array(elements));
        self.0
            .insert("totalPages".to_string(), Value::from(total_pages));
    }
}
