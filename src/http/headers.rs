//! Ordered header container.
//!
//! Headers keep insertion order and look names up case-insensitively.
//! Values that contain commas are split into their segments, so list-style
//! headers such as `Accept` read back as sequences while ordinary headers
//! stay plain strings.

use std::fmt;

use thiserror::Error;

/// A header that cannot be put on the wire as-is.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    #[error("invalid header name {0:?}")]
    InvalidName(String),
    #[error("invalid value for header {0:?}")]
    InvalidValue(String),
}

/// RFC 9110 `token`: one or more tchars.
pub fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b))
}

fn is_field_value(s: &str) -> bool {
    !s.bytes().any(|b| matches!(b, b'\r' | b'\n' | b'\0'))
}

/// A single header value: either the raw string or its comma-separated
/// segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Single(String),
    Multi(Vec<String>),
}

impl HeaderValue {
    /// Builds a value from raw header text, splitting on commas when asked
    /// and when there is more than one segment.
    pub fn parse(raw: &str, split: bool) -> Self {
        if split && raw.contains(',') {
            HeaderValue::Multi(raw.split(',').map(str::to_string).collect())
        } else {
            HeaderValue::Single(raw.to_string())
        }
    }

    pub fn as_single(&self) -> Option<&str> {
        match self {
            HeaderValue::Single(v) => Some(v),
            HeaderValue::Multi(_) => None,
        }
    }

    pub fn as_multi(&self) -> Option<&[String]> {
        match self {
            HeaderValue::Single(_) => None,
            HeaderValue::Multi(v) => Some(v),
        }
    }

    /// Renders the value back to the single string written on the wire.
    ///
    /// Segments are rejoined with the same bare comma they were split on,
    /// so collapsing a parsed value reproduces the original text.
    pub fn collapse(&self) -> String {
        match self {
            HeaderValue::Single(v) => v.clone(),
            HeaderValue::Multi(v) => v.join(","),
        }
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.collapse())
    }
}

impl PartialEq<&str> for HeaderValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_single() == Some(*other)
    }
}

/// Ordered mapping of header name to value.
///
/// Setting a name that already exists replaces its value in place, keeping
/// the original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, HeaderValue)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `name -> value`, overwriting any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl AsRef<str>) {
        let value = HeaderValue::parse(value.as_ref(), true);
        self.insert(name.into(), value);
    }

    /// Same as [`Headers::set`]. Values are replaced, not accumulated.
    pub fn append(&mut self, name: impl Into<String>, value: impl AsRef<str>) {
        self.set(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.position(name).map(|i| &self.entries[i].1)
    }

    /// Convenience lookup that returns the collapsed wire form.
    pub fn get_str(&self, name: &str) -> Option<String> {
        self.get(name).map(HeaderValue::collapse)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Bulk population from raw `(name, value)` pairs.
    ///
    /// With `split` enabled, multi-segment values are stored as sequences.
    /// Later pairs overwrite earlier ones with the same name.
    pub fn populate<I, K, V>(&mut self, entries: I, split: bool)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        for (name, value) in entries {
            let value = HeaderValue::parse(value.as_ref(), split);
            self.insert(name.into(), value);
        }
    }

    /// Flattens every entry to a transmissible `(name, value)` string pair.
    pub fn collapse(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.collapse()))
            .collect()
    }

    /// Checks every name is a token and no value can break the header
    /// line it is written on.
    pub fn validate(&self) -> Result<(), HeaderError> {
        for (name, value) in &self.entries {
            if !is_token(name) {
                return Err(HeaderError::InvalidName(name.clone()));
            }
            let valid = match value {
                HeaderValue::Single(v) => is_field_value(v),
                HeaderValue::Multi(parts) => parts.iter().all(|v| is_field_value(v)),
            };
            if !valid {
                return Err(HeaderError::InvalidValue(name.clone()));
            }
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, name: String, value: HeaderValue) {
        match self.position(&name) {
            Some(i) => self.entries[i] = (name, value),
            None => self.entries.push((name, value)),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: AsRef<str>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        headers.populate(iter, true);
        headers
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Headers
where
    K: Into<String>,
    V: AsRef<str>,
{
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}
