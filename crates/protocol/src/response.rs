//! The dialect-neutral shape every parsed response is folded into.

use {
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub level: Level,
    pub content: String,
}

impl Message {
    pub fn new(level: Level, content: impl Into<String>) -> Self {
        Self {
            level,
            content: content.into(),
        }
    }

    pub fn info(content: impl Into<String>) -> Self {
        Self::new(Level::Info, content)
    }

    pub fn warn(content: impl Into<String>) -> Self {
        Self::new(Level::Warn, content)
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::new(Level::Error, content)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginateMeta {
    pub is_paged: bool,
    pub total_records: u64,
    pub current_record: u64,
    pub total_pages: u64,
    pub current_page: u64,
    pub page_size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterMeta {
    pub is_filtered: bool,
    /// Not every dialect reports this.
    pub records_before_filter: Option<u64>,
    pub records_filtered: u64,
    /// Filter description echoed by the server, minus the counters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Value>,
}

/// Normalized paging/filter state plus any dialect-specific metadata keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMeta {
    pub paginate: PaginateMeta,
    pub filter: FilterMeta,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of parsing one response (or one sub-response of a batch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedResponse {
    pub status: bool,
    pub data: Value,
    pub messages: Vec<Message>,
    pub meta: ResponseMeta,
    /// First error message, or a generic one when the call failed silently.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Top-level warnings some dialects report outside the message list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Value>,
    pub is_batch: bool,
    /// One parsed envelope per sub-call, in request order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub batch: Vec<NormalizedResponse>,
    pub messages_are_html: bool,
    #[serde(default)]
    pub raw: Value,
}

impl NormalizedResponse {
    /// Messages at error level, in order.
    pub fn errors(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.level == Level::Error)
    }

    pub fn warning_messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.level == Level::Warn)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn level_serializes_lowercase() {
        let msg = Message::warn("disk almost full");
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"level": "warn", "content": "disk almost full"})
        );
    }

    #[test]
    fn meta_extras_are_flattened() {
        let mut meta = ResponseMeta::default();
        meta.extra.insert("command".into(), json!("listaccts"));
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["command"], "listaccts");
        assert_eq!(json["paginate"]["is_paged"], false);
        assert_eq!(json["filter"]["records_filtered"], 0);
    }

    #[test]
    fn errors_iterates_only_error_level() {
        let response = NormalizedResponse {
            status: false,
            data: Value::Null,
            messages: vec![Message::error("boom"), Message::warn("a"), Message::info("b")],
            meta: ResponseMeta::default(),
            error: Some("boom".into()),
            warnings: None,
            is_batch: false,
            batch: Vec::new(),
            messages_are_html: false,
            raw: Value::Null,
        };
        let errors: Vec<_> = response.errors().map(|m| m.content.as_str()).collect();
        assert_eq!(errors, ["boom"]);
        assert_eq!(response.warning_messages().count(), 1);
    }
}
