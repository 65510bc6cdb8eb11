//! WHM API v1 dialect.

use {
    panelio_config::Messages,
    panelio_protocol::{
        CallDescriptor, DialectId, FilterMeta, Level, Message, NormalizedResponse, PaginateMeta, ResponseMeta,
        Result, WHM_V1_VERSION, coerce,
    },
    serde_json::{Value, json},
    tracing::{debug, trace, warn},
};

use crate::{
    QueryParams, UapiAdapter, WireAdapter, envelope,
    fieldspec::fieldspec,
    query::{encode_uri_component, make_query_string},
};

/// Func name WHM reports for, and expects on, batch calls.
const BATCH_FUNC: &str = "batch";

/// Metadata keys folded into the normalized meta instead of copied through.
const FOLDED_META_KEYS: &[&str] = &["chunk", "filter"];

/// Extras key for a server `paginate` block, which would otherwise collide
/// with the normalized paging meta.
const RENAMED_PAGINATE_KEY: &str = "metadata_paginate";

#[derive(Debug, Clone, Default)]
pub struct WhmV1Adapter {
    messages: Messages,
    /// Parses payloads nested in passthrough calls.
    nested: UapiAdapter,
}

impl WhmV1Adapter {
    #[must_use]
    pub fn new(messages: Messages) -> Self {
        Self {
            nested: UapiAdapter::new(messages.clone()),
            messages,
        }
    }

    fn assemble_batch(&self, calls: &[CallDescriptor]) -> Result<QueryParams> {
        let mut commands = Vec::with_capacity(calls.len());
        for call in calls {
            let params = self.build_query(call)?;
            commands.push(Value::String(format!(
                "{}?{}",
                encode_uri_component(wire_func(call)),
                make_query_string(&params)
            )));
        }

        let mut params = QueryParams::new();
        params.insert("api.version".into(), json!(WHM_V1_VERSION));
        params.insert("command".into(), Value::Array(commands));
        Ok(params)
    }

    fn output_messages(output: &Value) -> Vec<Message> {
        let mut messages = Vec::new();
        for (key, level) in [("warnings", Level::Warn), ("messages", Level::Info)] {
            let Some(current) = output.get(key).filter(|v| coerce::is_truthy(v)) else {
                continue;
            };
            match current {
                Value::String(text) => messages.extend(text.split('\n').map(|line| Message::new(level, line))),
                Value::Array(items) => messages.extend(items.iter().map(|item| Message::new(level, coerce::display(item)))),
                other => warn!(key, value = %other, "ignoring WHM output messages of unexpected type"),
            }
        }
        messages
    }
}

fn wire_func(call: &CallDescriptor) -> &str {
    if call.is_batch() {
        BATCH_FUNC
    } else {
        &call.func
    }
}

/// Unwraps single-key list envelopes such as `{"acct": [...]}`.
///
/// An object whose only value is an array becomes that array; one whose only
/// value is falsy, or an empty object, becomes an empty array. Anything else
/// is returned unchanged.
#[must_use]
pub fn reduce_list_data(data: Value) -> Value {
    let Value::Object(map) = data else {
        return data;
    };
    if map.is_empty() {
        return Value::Array(Vec::new());
    }
    if map.len() != 1 {
        return Value::Object(map);
    }
    match map.values().next() {
        Some(Value::Array(items)) => Value::Array(items.clone()),
        Some(inner) if !coerce::is_truthy(inner) => Value::Array(Vec::new()),
        _ => Value::Object(map),
    }
}

impl WireAdapter for WhmV1Adapter {
    fn dialect(&self) -> DialectId {
        DialectId::WhmV1
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
        params.insert("api.version".into(), json!(WHM_V1_VERSION));

        // Rules are written last to first; WHM ranks them by fieldspec.
        if !call.meta.sort.is_empty() {
            params.insert("api.sort.enable".into(), json!(1));
        }
        for (index, rule) in call.meta.sort.iter().enumerate().rev() {
            let prefix = format!("api.sort.{}", fieldspec(index));
            if let Some(method) = rule.method() {
                params.insert(format!("{prefix}.method"), json!(method));
            }
            if rule.is_descending() {
                params.insert(format!("{prefix}.reverse"), json!(1));
            }
            params.insert(format!("{prefix}.field"), json!(rule.column()));
        }

        if !call.meta.filter.is_empty() {
            params.insert("api.filter.enable".into(), json!(1));
            params.insert("api.filter.verbose".into(), json!(1));
            for (index, rule) in call.meta.filter.iter().enumerate().rev() {
                let prefix = format!("api.filter.{}", fieldspec(index));
                params.insert(format!("{prefix}.field"), json!(rule.field()));
                params.insert(format!("{prefix}.type"), json!(rule.operator()));
                params.insert(format!("{prefix}.arg0"), rule.argument().clone());
            }
        }

        if let Some(paginate) = &call.meta.paginate
            && paginate.enabled
        {
            params.insert("api.chunk.enable".into(), json!(1));
            params.insert("api.chunk.verbose".into(), json!(1));
            if let Some(start) = paginate.start_record {
                params.insert("api.chunk.start".into(), json!(start));
            }
            if let Some(size) = paginate.page_size {
                params.insert("api.chunk.size".into(), json!(size));
            }
        }

        trace!(func = %call.func, params = params.len(), "built WHM v1 query");
        Ok(params)
    }

    fn get_url(&self, token: &str, call: &CallDescriptor) -> String {
        let prefix = call
            .module_name()
            .filter(|_| !call.is_batch())
            .map(|module| format!("{}_", module.to_lowercase()))
            .unwrap_or_default();
        format!("{token}/json-api/{}", encode_uri_component(&format!("{prefix}{}", wire_func(call))))
    }

    fn parse_response(&self, raw: &str, call: &CallDescriptor) -> NormalizedResponse {
        if call.nested_dialect != Some(DialectId::Uapi) {
            return envelope::parse_raw(self, raw);
        }

        let nested = serde_json::from_str::<Value>(raw)
            .ok()
            .and_then(|mut response| response.get_mut("result").map(Value::take))
            .filter(Value::is_object);
        let nested = match nested {
            Some(result) => result,
            None => {
                debug!(func = %call.func, "passthrough response has no UAPI result");
                self.nested.failure_envelope()
            },
        };
        envelope::parse_value(&self.nested, nested)
    }

    fn find_status(&self, response: &Value) -> bool {
        response
            .pointer("/metadata/result")
            .and_then(coerce::parse_int)
            == Some(1)
    }

    fn find_messages(&self, response: &Value) -> Vec<Message> {
        let Some(metadata) = response.get("metadata").filter(|m| m.is_object()) else {
            return vec![Message::error(self.messages.unknown_error.clone())];
        };

        let mut messages = match metadata.get("output") {
            Some(output) if output.is_object() => Self::output_messages(output),
            _ => Vec::new(),
        };

        let succeeded = metadata.get("result").is_some_and(|result| coerce::display(result) == "1");
        if !succeeded {
            let reason = metadata
                .get("reason")
                .filter(|r| coerce::is_truthy(r))
                .map(coerce::display)
                .unwrap_or_else(|| self.messages.unknown_error.clone());
            messages.insert(0, Message::error(reason));
        }
        messages
    }

    fn get_data(&self, response: &Value) -> Value {
        let mut payload = reduce_list_data(response.get("data").cloned().unwrap_or(Value::Null));
        if self.is_batch_response(response)
            && let Some(items) = payload.as_array_mut()
        {
            for item in items {
                if let Some(data) = item.get_mut("data") {
                    *data = reduce_list_data(data.take());
                }
            }
        }
        payload
    }

    fn get_meta(&self, response: &Value) -> ResponseMeta {
        let mut meta = ResponseMeta::default();
        let Some(metadata) = response.get("metadata").and_then(Value::as_object) else {
            return meta;
        };

        if let Some(chunk) = metadata.get("chunk").filter(|c| !c.is_null()) {
            meta.paginate = PaginateMeta {
                is_paged: true,
                total_records: coerce::count(chunk.get("records")),
                current_record: coerce::count(chunk.get("start")),
                total_pages: coerce::count(chunk.get("chunks")),
                current_page: coerce::count(chunk.get("current")),
                page_size: coerce::count(chunk.get("size")),
            };
        }

        if let Some(filter) = metadata.get("filter").filter(|f| !f.is_null()) {
            let mut filters = filter.clone();
            let records_filtered = coerce::count(filters.get("filtered"));
            if let Some(map) = filters.as_object_mut() {
                map.shift_remove("filtered");
            }
            meta.filter = FilterMeta {
                is_filtered: true,
                records_before_filter: None,
                records_filtered,
                filters: Some(filters),
            };
        }

        for (key, value) in metadata {
            match key.as_str() {
                "paginate" => {
                    meta.extra.insert(RENAMED_PAGINATE_KEY.into(), value.clone());
                },
                key if FOLDED_META_KEYS.contains(&key) => {},
                key => {
                    meta.extra.insert(key.into(), value.clone());
                },
            }
        }
        meta
    }

    fn is_batch_response(&self, response: &Value) -> bool {
        response
            .pointer("/metadata/command")
            .and_then(Value::as_str)
            == Some(BATCH_FUNC)
    }
}
