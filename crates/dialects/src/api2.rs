//! cPanel API2 dialect, tunneled through the `/json-api/cpanel` endpoint.

use {
    panelio_config::Messages,
    panelio_protocol::{
        API2_VERSION, CallDescriptor, DialectId, Error, FilterMeta, Message, NormalizedResponse, PaginateMeta,
        ResponseMeta, Result, coerce,
    },
    serde_json::{Value, json},
    tracing::trace,
};

use crate::{QueryParams, WireAdapter, envelope, query::indexed_key, uapi::escape_html};

const PREFIX: &str = "api2_";

const FOLDED_META_KEYS: &[&str] = &["filter", "paginate"];

#[derive(Debug, Clone, Default)]
pub struct Api2Adapter {
    messages: Messages,
}

impl Api2Adapter {
    #[must_use]
    pub fn new(messages: Messages) -> Self {
        Self { messages }
    }

    fn unknown_error(&self) -> Message {
        Message::error(self.messages.unknown_error.clone())
    }
}

/// The `cpanelresult` envelope, when it is present and truthy.
fn cpanelresult(response: &Value) -> Option<&Value> {
    response.get("cpanelresult").filter(|r| coerce::is_truthy(r))
}

/// First data row, when it is truthy. Some functions report their outcome
/// there instead of in the envelope.
fn first_row(result: &Value) -> Option<&Value> {
    result
        .get("data")
        .and_then(|data| data.get(0))
        .filter(|row| coerce::is_truthy(row))
}

/// `row.<key>`, falling back to `row.result.<key>`.
fn row_field<'a>(row: &'a Value, key: &str) -> Option<&'a Value> {
    row.get(key).or_else(|| row.get("result").and_then(|r| r.get(key)))
}

impl WireAdapter for Api2Adapter {
    fn dialect(&self) -> DialectId {
        DialectId::Api2
    }

    fn messages(&self) -> &Messages {
        &self.messages
    }

    fn build_query(&self, call: &CallDescriptor) -> Result<QueryParams> {
        call.validate()?;
        if call.is_batch() {
            return Err(Error::message("API2 does not support batch calls"));
        }

        let mut params = QueryParams::new();
        params.insert("cpanel_jsonapi_apiversion".into(), json!(API2_VERSION));
        params.insert("cpanel_jsonapi_module".into(), json!(call.module_name()));
        params.insert("cpanel_jsonapi_func".into(), json!(call.func));
        for (key, value) in &call.args {
            params.insert(key.clone(), value.clone());
        }

        let sorts = call.meta.sort.len();
        if sorts > 0 {
            params.insert("api2_sort".into(), json!(1));
        }
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
        if filters > 0 {
            params.insert("api2_filter".into(), json!(1));
        }
        for (index, rule) in call.meta.filter.iter().enumerate() {
            params.insert(indexed_key(PREFIX, "filter_column", index, filters), json!(rule.field()));
            params.insert(indexed_key(PREFIX, "filter_type", index, filters), json!(rule.operator()));
            params.insert(indexed_key(PREFIX, "filter_term", index, filters), rule.argument().clone());
        }

        if let Some(paginate) = &call.meta.paginate
            && paginate.enabled
        {
            params.insert("api2_paginate".into(), json!(1));
            if let Some(start) = paginate.start_record {
                params.insert("api2_paginate_start".into(), json!(start));
            }
            if let Some(size) = paginate.page_size {
                params.insert("api2_paginate_size".into(), json!(size));
            }
        }

        trace!(module = ?call.module, func = %call.func, params = params.len(), "built API2 query");
        Ok(params)
    }

    fn get_url(&self, token: &str, _call: &CallDescriptor) -> String {
        format!("{token}/json-api/cpanel")
    }

    fn parse_response(&self, raw: &str, _call: &CallDescriptor) -> NormalizedResponse {
        envelope::parse_raw(self, raw)
    }

    fn find_status(&self, response: &Value) -> bool {
        let Some(result) = cpanelresult(response) else {
            return false;
        };
        let error = result.get("error").is_some_and(coerce::is_truthy);

        let Some(event) = result.get("event").and_then(|e| e.get("result")).filter(|r| coerce::is_truthy(r))
        else {
            // Functions that fail without an event container.
            return !error;
        };

        let mut status = event.as_f64() == Some(1.0) && !error;
        if let Some(row_status) = first_row(result).and_then(|row| row_field(row, "status")) {
            status = coerce::is_truthy(row_status);
        }
        status
    }

    fn find_messages(&self, response: &Value) -> Vec<Message> {
        let Some(result) = cpanelresult(response) else {
            return vec![self.unknown_error()];
        };

        if let Some(error) = result.get("error") {
            if coerce::is_truthy(error) {
                return vec![Message::error(escape_html(&coerce::display(error)))];
            }
            return vec![self.unknown_error()];
        }

        // The row message is reported whatever the status says.
        match first_row(result).and_then(|row| row_field(row, "statusmsg")) {
            Some(msg) if coerce::is_truthy(msg) => vec![Message::error(escape_html(&coerce::display(msg)))],
            _ => Vec::new(),
        }
    }

    fn get_data(&self, response: &Value) -> Value {
        response
            .get("cpanelresult")
            .and_then(|r| r.get("data"))
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn get_meta(&self, response: &Value) -> ResponseMeta {
        let mut meta = ResponseMeta::default();
        let Some(result) = response.get("cpanelresult").and_then(Value::as_object) else {
            return meta;
        };

        if let Some(paginate) = result.get("paginate") {
            meta.paginate = PaginateMeta {
                is_paged: true,
                total_records: coerce::count(paginate.get("total_results")),
                current_record: coerce::count(paginate.get("start_result")),
                total_pages: coerce::count(paginate.get("total_pages")),
                current_page: coerce::count(paginate.get("current_page")),
                page_size: coerce::count(paginate.get("results_per_page")),
            };
        }

        if result.contains_key("filter") {
            meta.filter = FilterMeta {
                is_filtered: true,
                records_before_filter: Some(coerce::count(result.get("records_before_filter"))),
                ..FilterMeta::default()
            };
        }

        for (key, value) in result {
            if !FOLDED_META_KEYS.contains(&key.as_str()) {
                meta.extra.insert(key.clone(), value.clone());
            }
        }
        meta
    }

    fn is_batch_response(&self, _response: &Value) -> bool {
        false
    }

    fn escapes_messages(&self) -> bool {
        true
    }
}
