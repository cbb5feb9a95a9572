//! Query objects for the persistence gateway
//!
//! A [`Filter`] selects documents in a collection. It is small on purpose: the
//! entity validators only need equality lookups combined with `and` / `or`, plus
//! "not equal" to exclude the record being updated from uniqueness checks.
//!
//! # Example
//! ```rust,ignore
//! // name = "Place" OR address = "55 Wellesley St E"
//! let unique = Filter::eq("name", "Place").or(Filter::eq("address", "55 Wellesley St E"));
//! ```

use serde_json::{Map, Value};
use std::fmt;

/// A stored document: a JSON object without any storage-assigned id
pub type Document = Map<String, Value>;

/// Document selection criteria
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document
    All,
    /// Field equals value
    Eq(String, Value),
    /// Field is absent or differs from value
    Ne(String, Value),
    /// Every sub-filter matches
    And(Vec<Filter>),
    /// At least one sub-filter matches
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Filter::Eq(field.to_string(), value.into())
    }

    pub fn ne(field: &str, value: impl Into<Value>) -> Self {
        Filter::Ne(field.to_string(), value.into())
    }

    pub fn and(self, other: Filter) -> Self {
        match self {
            Filter::And(mut filters) => {
                filters.push(other);
                Filter::And(filters)
            }
            first => Filter::And(vec![first, other]),
        }
    }

    pub fn or(self, other: Filter) -> Self {
        match self {
            Filter::Or(mut filters) => {
                filters.push(other);
                Filter::Or(filters)
            }
            first => Filter::Or(vec![first, other]),
        }
    }

    /// Evaluate the filter against a document
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, value) => doc.get(field) == Some(value),
            Filter::Ne(field, value) => doc.get(field) != Some(value),
            Filter::And(filters) => filters.iter().all(|f| f.matches(doc)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(doc)),
        }
    }
}

fn write_group(f: &mut fmt::Formatter<'_>, filters: &[Filter], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, filter) in filters.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", sep)?;
        }
        write!(f, "{}", filter)?;
    }
    write!(f, ")")
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => write!(f, "*"),
            Filter::Eq(field, value) => write!(f, "{} = {}", field, value),
            Filter::Ne(field, value) => write!(f, "{} != {}", field, value),
            Filter::And(filters) => write_group(f, filters, "and"),
            Filter::Or(filters) => write_group(f, filters, "or"),
        }
    }
}
