//! cPanel UAPI dialect.

use {
    panelio_config::Messages,
    panelio_protocol::{
        CallDescriptor, DialectId, FilterMeta, Level, Message, NormalizedResponse, PaginateMeta, ResponseMeta, Result,
        coerce,
    },
    serde_json::{Value, json},
    tracing::{debug, trace},
};

use crate::{
    QueryParams, WireAdapter, envelope,
    query::{encode_uri_component, expand_arrays_for_cpanel_api, indexed_key},
};

const PREFIX: &str = "api.";

/// Module and func UAPI batches run through.
const BATCH_MODULE: &str = "Batch";
const BATCH_FUNC: &str = "strict";

const FOLDED_META_KEYS: &[&str] = &["filter", "paginate"];

#[derive(Debug, Clone, Default)]
pub struct UapiAdapter {
    messages: Messages,
}

impl UapiAdapter {
    #[must_use]
    pub fn new(messages: Messages) -> Self {
        Self { messages }
    }

    /// Failed envelope standing in for a missing or malformed UAPI result.
    pub(crate) fn failure_envelope(&self) -> Value {
        json!({
            "messages": null,
            "errors": [self.messages.unknown_error],
            "metadata": {},
            "data": null,
            "warnings": null,
            "status": 0,
        })
    }

    fn assemble_batch(&self, calls: &[CallDescriptor]) -> Result<QueryParams> {
        let mut commands = Vec::with_capacity(calls.len());
        for call in calls {
            let mut call = call.clone();
            call.args = expand_arrays_for_cpanel_api(&call.args);
            let params = self.build_query(&call)?;
            let module = call.module.clone().unwrap_or_default();
            commands.push(Value::String(serde_json::to_string(&json!([module, call.func, params]))?));
        }

        let mut params = QueryParams::new();
        params.insert("command".into(), Value::Array(commands));
        Ok(params)
    }

    /// One entry holding every line of `value`, or the unknown-error text when
    /// the server sent an empty list.
    fn collapse(&self, level: Level, value: &Value) -> Message {
        let text = match value {
            Value::Array(items) if !items.is_empty() => items
                .iter()
                .map(|item| match item {
                    Value::Null => String::new(),
                    other => coerce::display(other),
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Value::String(text) if !text.is_empty() => text.clone(),
            _ => return Message::new(level, self.messages.unknown_error.clone()),
        };
        Message::new(level, escape_html(&text))
    }
}

/// Escapes the five HTML-significant characters.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Stamps module and func on a decoded response, since UAPI does not echo
/// them. Batch sub-responses are stamped from their own sub-calls.
fn stamp_call(response: Value, call: &CallDescriptor) -> Value {
    let Value::Object(mut map) = response else {
        return response;
    };
    match &call.batch {
        Some(calls) => {
            map.insert("module".into(), json!(BATCH_MODULE));
            map.insert("func".into(), json!(BATCH_FUNC));
            if let Some(Value::Array(items)) = map.get_mut("data") {
                for (item, sub_call) in items.iter_mut().zip(calls) {
                    *item = stamp_call(item.take(), sub_call);
                }
            }
        },
        None => {
            map.insert("module".into(), json!(call.module));
            map.insert("func".into(), json!(call.func));
        },
    }
    Value::Object(map)
}

impl WireAdapter for UapiAdapter {
    fn dialect(&self) -> DialectId {
        DialectId::Uapi
    }

    fn messages(&self) -> &Messages {
        &self.messages
    }

    fn build_query(&self, call: &CallDescriptor) -> Result<QueryParams> {
        call.validate()?;
        if let Some(calls) = &call.batch {
            return self.assemble_batch(calls);
        }

        let mut params = call.args.clone();

        let sorts = call.meta.sort.len();
        for (index, rule) in call.meta.sort.iter().enumerate() {
            if let Some(method) = rule.method() {
                params.insert(indexed_key(PREFIX, "sort_method", index, sorts), json!(method));
            }
            if rule.is_descending() {
                params.insert(indexed_key(PREFIX, "sort_reverse", index, sorts), json!(1));
            }
            params.insert(indexed_key(PREFIX, "sort_column", index, sorts), json!(rule.column()));
        }

        let filters = call.meta.filter.len();
        for (index, rule) in call.meta.filter.iter().enumerate() {
            params.insert(indexed_key(PREFIX, "filter_column", index, filters), json!(rule.field()));
            params.insert(indexed_key(PREFIX, "filter_type", index, filters), json!(rule.operator()));
            params.insert(indexed_key(PREFIX, "filter_term", index, filters), rule.argument().clone());
        }

        if let Some(paginate) = &call.meta.paginate
            && paginate.enabled
        {
            if let Some(start) = paginate.start_record {
                params.insert("api.paginate_start".into(), json!(start));
            }
            if let Some(size) = paginate.page_size {
                params.insert("api.paginate_size".into(), json!(size));
            }
        }

        if let Some(analytics) = &call.analytics {
            params.insert("api.analytics".into(), json!(analytics.serialize()));
        }

        trace!(module = ?call.module, func = %call.func, params = params.len(), "built UAPI query");
        Ok(params)
    }

    fn get_url(&self, token: &str, call: &CallDescriptor) -> String {
        let (module, func) = if call.is_batch() {
            (BATCH_MODULE, BATCH_FUNC)
        } else {
            (call.module.as_deref().unwrap_or_default(), call.func.as_str())
        };
        format!("{token}/execute/{}/{}", encode_uri_component(module), encode_uri_component(func))
    }

    fn parse_response(&self, raw: &str, call: &CallDescriptor) -> NormalizedResponse {
        match serde_json::from_str::<Value>(raw) {
            Ok(response) => envelope::parse_value(self, stamp_call(response, call)),
            Err(e) => {
                debug!(func = %call.func, error = %e, "UAPI response body is not JSON");
                envelope::unparsable(self)
            },
        }
    }

    fn find_status(&self, response: &Value) -> bool {
        if !coerce::is_truthy(response) {
            return false;
        }
        match response.get("status") {
            Some(status) => coerce::is_perl_true(status),
            None => {
                debug!("UAPI response has no status field");
                false
            },
        }
    }

    fn find_messages(&self, response: &Value) -> Vec<Message> {
        if !coerce::is_truthy(response) {
            return vec![Message::error(self.messages.unknown_error.clone())];
        }
        if let Some(errors) = response.get("errors").filter(|e| coerce::is_truthy(e)) {
            return vec![self.collapse(Level::Error, errors)];
        }
        if let Some(messages) = response.get("messages").filter(|m| coerce::is_truthy(m)) {
            return vec![self.collapse(Level::Info, messages)];
        }
        Vec::new()
    }

    fn get_data(&self, response: &Value) -> Value {
        response.get("data").cloned().unwrap_or(Value::Null)
    }

    fn get_meta(&self, response: &Value) -> ResponseMeta {
        let mut meta = ResponseMeta::default();
        let Some(metadata) = response.get("metadata").and_then(Value::as_object) else {
            return meta;
        };

        if let Some(paginate) = metadata.get("paginate").filter(|p| !p.is_null()) {
            meta.paginate = PaginateMeta {
                is_paged: true,
                total_records: coerce::count(paginate.get("total_results")),
                current_record: coerce::count(paginate.get("start_result")),
                total_pages: coerce::count(paginate.get("total_pages")),
                current_page: coerce::count(paginate.get("current_page")),
                page_size: coerce::count(paginate.get("results_per_page")),
            };
        }

        if metadata.get("filter").is_some_and(|f| !f.is_null()) {
            meta.filter = FilterMeta {
                is_filtered: true,
                records_before_filter: Some(coerce::count(metadata.get("records_before_filter"))),
                ..FilterMeta::default()
            };
        }

        for (key, value) in metadata {
            if !FOLDED_META_KEYS.contains(&key.as_str()) {
                meta.extra.insert(key.clone(), value.clone());
            }
        }
        meta
    }

    fn is_batch_response(&self, response: &Value) -> bool {
        response.get("module").and_then(Value::as_str) == Some(BATCH_MODULE)
            && response.get("func").and_then(Value::as_str) == Some(BATCH_FUNC)
    }

    fn escapes_messages(&self) -> bool {
        true
    }
}
