//! Query-string encoding shared by the dialects.

use {
    panelio_protocol::coerce,
    serde_json::{Map, Value},
};

/// Percent-encodes everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`, the
/// set browsers leave alone in URI components.
#[must_use]
pub fn encode_uri_component(input: &str) -> String {
    // `urlencoding` also escapes the five sub-delimiters below.
    urlencoding::encode(input)
        .replace("%21", "!")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
        .replace("%2A", "*")
}

/// `key=value` pairs joined with `&`, in insertion order. Null values are
/// dropped and arrays repeat their key once per element.
#[must_use]
pub fn make_query_string(params: &Map<String, Value>) -> String {
    let mut parts = Vec::with_capacity(params.len());
    for (key, value) in params {
        let key = encode_uri_component(key);
        match value {
            Value::Null => {},
            Value::Array(items) => {
                for item in items {
                    parts.push(format!("{key}={}", encode_uri_component(&coerce::display(item))));
                }
            },
            other => parts.push(format!("{key}={}", encode_uri_component(&coerce::display(other)))),
        }
    }
    parts.join("&")
}

/// Parameter name for rule `index` of `count`: bare when there is only one
/// rule, `_<index>`-suffixed otherwise.
#[must_use]
pub fn indexed_key(prefix: &str, name: &str, index: usize, count: usize) -> String {
    if count == 1 {
        format!("{prefix}{name}")
    } else {
        format!("{prefix}{name}_{index}")
    }
}

/// Array arguments in the form cPanel APIs expect: the first element under
/// the plain name, the rest as `name-1`, `name-2`, ...
#[must_use]
pub fn expand_arrays_for_cpanel_api(args: &Map<String, Value>) -> Map<String, Value> {
    let mut expanded = Map::with_capacity(args.len());
    for (key, value) in args {
        match value {
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    let name = if index == 0 {
                        key.clone()
                    } else {
                        format!("{key}-{index}")
                    };
                    expanded.insert(name, item.clone());
                }
            },
            other => {
                expanded.insert(key.clone(), other.clone());
            },
        }
    }
    expanded
}
