//! Wire dialects: each turns a [`CallDescriptor`] into flat query parameters
//! for one backend API family and folds that family's response envelope into
//! a [`NormalizedResponse`].
//!
//! Dialects:
//! - [`WhmV1Adapter`]: WHM API v1 (`/json-api/...`)
//! - [`UapiAdapter`]: cPanel UAPI (`/execute/...`), also used for payloads
//!   nested in WHM passthrough calls
//! - [`Api2Adapter`]: cPanel API2 (`/json-api/cpanel`)

pub mod api2;
pub mod envelope;
pub mod fieldspec;
pub mod query;
pub mod uapi;
pub mod whm_v1;

use {
    panelio_config::Messages,
    panelio_protocol::{CallDescriptor, DialectId, Message, NormalizedResponse, ResponseMeta, Result},
    serde_json::{Map, Value},
};

pub use {api2::Api2Adapter, uapi::UapiAdapter, whm_v1::WhmV1Adapter};

/// Flat, insertion-ordered request parameters.
pub type QueryParams = Map<String, Value>;

/// One backend dialect.
///
/// The extraction methods (`find_*`, `get_*`, `is_batch_response`) run on
/// untrusted server output and must never panic; they fall back to empty or
/// failed values instead.
pub trait WireAdapter: Send + Sync {
    fn dialect(&self) -> DialectId;

    /// Generic texts used when the server supplies none.
    fn messages(&self) -> &Messages;

    /// Wire parameters for `call`. Fails only on caller mistakes, such as a
    /// missing function name.
    fn build_query(&self, call: &CallDescriptor) -> Result<QueryParams>;

    /// Endpoint path for `call`, prefixed with the session security token.
    fn get_url(&self, token: &str, call: &CallDescriptor) -> String;

    /// Parses a raw response body for `call`.
    fn parse_response(&self, raw: &str, call: &CallDescriptor) -> NormalizedResponse;

    fn find_status(&self, response: &Value) -> bool;

    fn find_messages(&self, response: &Value) -> Vec<Message>;

    fn get_data(&self, response: &Value) -> Value;

    fn get_meta(&self, response: &Value) -> ResponseMeta;

    fn is_batch_response(&self, response: &Value) -> bool;

    /// Whether [`Self::find_messages`] HTML-escapes message content.
    fn escapes_messages(&self) -> bool {
        false
    }
}

/// Adapter for `dialect`, sharing one set of generic messages.
#[must_use]
pub fn adapter_for(dialect: DialectId, messages: Messages) -> Box<dyn WireAdapter> {
    match dialect {
        DialectId::WhmV1 => Box::new(WhmV1Adapter::new(messages)),
        DialectId::Uapi => Box::new(UapiAdapter::new(messages)),
        DialectId::Api2 => Box::new(Api2Adapter::new(messages)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_for_matches_dialect() {
        for dialect in [DialectId::WhmV1, DialectId::Uapi, DialectId::Api2] {
            assert_eq!(adapter_for(dialect, Messages::default()).dialect(), dialect);
        }
    }

    #[test]
    fn only_cpanel_dialects_escape_messages() {
        assert!(!adapter_for(DialectId::WhmV1, Messages::default()).escapes_messages());
        assert!(adapter_for(DialectId::Uapi, Messages::default()).escapes_messages());
        assert!(adapter_for(DialectId::Api2, Messages::default()).escapes_messages());
    }
}
