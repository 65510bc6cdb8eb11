//! Dialect-independent folding of a decoded response into a
//! [`NormalizedResponse`], driven by the adapter's extraction methods.

use {
    panelio_protocol::{Level, NormalizedResponse},
    serde_json::Value,
    tracing::debug,
};

use crate::WireAdapter;

/// Decodes `raw` as JSON and folds it. A body that is not JSON is folded as
/// null, so it always fails.
pub fn parse_raw<A: WireAdapter + ?Sized>(adapter: &A, raw: &str) -> NormalizedResponse {
    match serde_json::from_str::<Value>(raw) {
        Ok(response) => parse_value(adapter, response),
        Err(e) => {
            debug!(dialect = %adapter.dialect(), error = %e, "response body is not JSON");
            unparsable(adapter)
        },
    }
}

/// Failed response for a body that could not be decoded. The first error the
/// adapter reports for a null response wins over the "could not be parsed"
/// text.
pub fn unparsable<A: WireAdapter + ?Sized>(adapter: &A) -> NormalizedResponse {
    let mut parsed = parse_value(adapter, Value::Null);
    if parsed.errors().next().is_none() {
        parsed.error = Some(adapter.messages().unparsable_response.clone());
    }
    parsed
}

/// Non-empty list or text.
fn has_length(value: &Value) -> bool {
    match value {
        Value::Array(items) => !items.is_empty(),
        Value::String(text) => !text.is_empty(),
        _ => false,
    }
}

/// Folds an already decoded response. Batch envelopes get one parsed entry per
/// element of their data array.
pub fn parse_value<A: WireAdapter + ?Sized>(adapter: &A, response: Value) -> NormalizedResponse {
    let data = adapter.get_data(&response);
    let meta = adapter.get_meta(&response);
    let messages = adapter.find_messages(&response);
    let status = adapter.find_status(&response);

    let error = messages
        .iter()
        .find(|m| m.level == Level::Error)
        .map(|m| m.content.clone())
        .or_else(|| (!status).then(|| adapter.messages().unspecified_failure.clone()));

    let warnings = response.get("warnings").filter(|w| has_length(w)).cloned();

    let is_batch = adapter.is_batch_response(&response);
    let batch = match (&data, is_batch) {
        (Value::Array(items), true) => items.iter().map(|item| parse_value(adapter, item.clone())).collect(),
        _ => Vec::new(),
    };

    NormalizedResponse {
        status,
        data,
        messages,
        meta,
        error,
        warnings,
        is_batch,
        batch,
        messages_are_html: adapter.escapes_messages(),
        raw: response,
    }
}
