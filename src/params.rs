use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use url::form_urlencoded;

/// One query-parameter value.
///
/// Jira's query strings are not plain form encoding: arrays are comma-joined,
/// dates travel as ISO-8601, object values as their JSON text, and a handful
/// of characters the API accepts literally are left unescaped. A
/// [`fragment`](QueryValue::fragment) supplies a complete, pre-built query
/// fragment verbatim.
#[derive(Clone)]
pub enum QueryValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Array(Vec<String>),
    Date(DateTime<Utc>),
    Object(Value),
    Fragment(Arc<dyn Fn() -> String + Send + Sync>),
    Null,
}

impl QueryValue {
    /// A producer of a raw query fragment, spliced into the query string
    /// unescaped and without a `key=` prefix. An empty result contributes
    /// nothing.
    pub fn fragment(produce: impl Fn() -> String + Send + Sync + 'static) -> Self {
        QueryValue::Fragment(Arc::new(produce))
    }
}

impl fmt::Debug for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::String(v) => f.debug_tuple("String").field(v).finish(),
            QueryValue::Int(v) => f.debug_tuple("Int").field(v).finish(),
            QueryValue::Float(v) => f.debug_tuple("Float").field(v).finish(),
            QueryValue::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            QueryValue::Array(v) => f.debug_tuple("Array").field(v).finish(),
            QueryValue::Date(v) => f.debug_tuple("Date").field(v).finish(),
            QueryValue::Object(v) => f.debug_tuple("Object").field(v).finish(),
            QueryValue::Fragment(_) => f.write_str("Fragment(..)"),
            QueryValue::Null => f.write_str("Null"),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::String(value.to_owned())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::String(value)
    }
}

impl From<i32> for QueryValue {
    fn from(value: i32) -> Self {
        QueryValue::Int(value.into())
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Int(value)
    }
}

impl From<u32> for QueryValue {
    fn from(value: u32) -> Self {
        QueryValue::Int(value.into())
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        QueryValue::Float(value)
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Bool(value)
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(value: Vec<String>) -> Self {
        QueryValue::Array(value)
    }
}

impl From<Vec<&str>> for QueryValue {
    fn from(value: Vec<&str>) -> Self {
        QueryValue::Array(value.into_iter().map(str::to_owned).collect())
    }
}

impl From<DateTime<Utc>> for QueryValue {
    fn from(value: DateTime<Utc>) -> Self {
        QueryValue::Date(value)
    }
}

impl From<Value> for QueryValue {
    fn from(value: Value) -> Self {
        QueryValue::Object(value)
    }
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(QueryValue::Null)
    }
}

/// Insertion-ordered query parameters for one request.
#[derive(Clone, Debug, Default)]
pub struct QueryParams(Vec<(String, QueryValue)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
        self.0.push((key.into(), value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serialize into a query string. Null entries are skipped; entries join
    /// with `&` in insertion order.
    pub fn to_query_string(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        for (key, value) in &self.0 {
            match value {
                QueryValue::Null => continue,
                QueryValue::Fragment(produce) => {
                    let part = produce();
                    if !part.is_empty() {
                        parts.push(part);
                    }
                }
                QueryValue::Array(items) => parts.push(pair(key, &items.join(","))),
                QueryValue::Date(date) => parts.push(pair(
                    key,
                    &date.to_rfc3339_opts(SecondsFormat::Millis, true),
                )),
                QueryValue::Object(object) => parts.push(pair(key, &object.to_string())),
                QueryValue::String(v) => parts.push(pair(key, v)),
                QueryValue::Int(v) => parts.push(pair(key, &v.to_string())),
                QueryValue::Float(v) => parts.push(pair(key, &v.to_string())),
                QueryValue::Bool(v) => parts.push(pair(key, &v.to_string())),
            }
        }

        parts.join("&")
    }
}

fn pair(key: &str, value: &str) -> String {
    format!("{}={}", encode(key), encode(value))
}

/// Percent-encode, then restore the characters the Jira query parser accepts
/// literally. Space stays `+`.
fn encode(value: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(value.as_bytes()).collect();

    encoded
        .replace("%3A", ":")
        .replace("%24", "$")
        .replace("%2C", ",")
        .replace("%5B", "[")
        .replace("%5D", "]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_arrays_join_with_commas() {
        let mut params = QueryParams::new();
        params.push("fields", vec!["summary", "status"]);

        assert_eq!(params.to_query_string(), "fields=summary,status");
    }

    #[test]
    fn test_dates_encode_as_iso_8601() {
        let mut params = QueryParams::new();
        params.push("since", Utc.with_ymd_and_hms(2023, 3, 1, 10, 30, 0).unwrap());

        assert_eq!(params.to_query_string(), "since=2023-03-01T10:30:00.000Z");
    }

    #[test]
    fn test_objects_encode_as_json() {
        let mut params = QueryParams::new();
        params.push("filter", json!({"a": 1}));

        assert_eq!(params.to_query_string(), "filter=%7B%22a%22:1%7D");
    }

    #[test]
    fn test_null_entries_are_skipped() {
        let mut params = QueryParams::new();
        params.push("present", "yes");
        params.push("absent", Option::<&str>::None);

        assert_eq!(params.to_query_string(), "present=yes");
    }

    #[test]
    fn test_fragment_splices_raw_output() {
        let mut params = QueryParams::new();
        params.push("jql", QueryValue::fragment(|| "jql=order+by+created".to_owned()));

        assert_eq!(params.to_query_string(), "jql=order+by+created");
    }

    #[test]
    fn test_empty_fragment_contributes_nothing() {
        let mut params = QueryParams::new();
        params.push("first", "1");
        params.push("jql", QueryValue::fragment(String::new));
        params.push("last", "2");

        assert_eq!(params.to_query_string(), "first=1&last=2");
    }

    #[test]
    fn test_reserved_characters_stay_literal() {
        let mut params = QueryParams::new();
        params.push("jql", "created >= -30d AND labels in [a,b] AND cf:$x");

        assert_eq!(
            params.to_query_string(),
            "jql=created+%3E%3D+-30d+AND+labels+in+[a,b]+AND+cf:$x"
        );
    }

    #[test]
    fn test_entries_keep_insertion_order() {
        let mut params = QueryParams::new();
        params.push("startAt", 0);
        params.push("maxResults", 50);
        params.push("expand", "names");

        assert_eq!(
            params.to_query_string(),
            "startAt=0&maxResults=50&expand=names"
        );
    }

    #[test]
    fn test_scalar_conversions() {
        let mut params = QueryParams::new();
        params.push("flag", true);
        params.push("count", 3_i64);
        params.push("ratio", 0.5);

        assert_eq!(params.to_query_string(), "flag=true&count=3&ratio=0.5");
    }
}
