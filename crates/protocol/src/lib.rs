//! Call and response definitions shared by the request builders and the
//! wire dialects.
//!
//! A call travels through three shapes:
//! - [`CallDescriptor`]: what the caller asked for, dialect-neutral
//! - `QueryParams`: flat wire parameters produced by a dialect
//! - [`NormalizedResponse`]: what came back, dialect-neutral

pub mod call;
pub mod coerce;
pub mod error;
pub mod response;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use {
    call::{Analytics, CallDescriptor, FilterRule, Paginate, RequestMeta, SortRule},
    error::{Error, ErrorKind, Result},
    response::{FilterMeta, Level, Message, NormalizedResponse, PaginateMeta, ResponseMeta},
};

// ── Constants ────────────────────────────────────────────────────────────────

pub const WHM_V1_VERSION: u32 = 1;
pub const API2_VERSION: u32 = 2;
pub const UAPI_VERSION: u32 = 3;
pub const DEFAULT_PAGE_SIZE: i64 = 10;
/// Page size sentinel meaning "show everything"; disables paging.
pub const PAGE_SIZE_ALL: i64 = -1;
/// Seed for auto-numbered argument suffixes.
pub const AUTO_SUFFIX_SEED: u32 = 1;

/// WHM v1 function that proxies a call into a cPanel account.
pub const PASSTHROUGH_FUNC: &str = "cpanel";
/// Argument of the passthrough function naming the nested API version.
pub const PASSTHROUGH_VERSION_ARG: &str = "cpanel_jsonapi_apiversion";

// ── Error codes ──────────────────────────────────────────────────────────────

pub mod error_codes {
    pub const ARGS_NOT_MAPPING: &str = "ARGS_NOT_MAPPING";
    pub const MISSING_FUNCTION: &str = "MISSING_FUNCTION";
    pub const PROTOCOL_ERROR: &str = "PROTOCOL_ERROR";
    pub const INTERNAL: &str = "INTERNAL";
}

// ── Dialects ─────────────────────────────────────────────────────────────────

/// Backend API families a call can be serialized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialectId {
    /// WHM API v1 (`/json-api/<func>`).
    WhmV1,
    /// cPanel UAPI (`/execute/<Module>/<func>`).
    Uapi,
    /// cPanel API2, tunneled through `/json-api/cpanel`.
    Api2,
}

impl DialectId {
    /// API version number the dialect expects on the wire.
    #[must_use]
    pub fn version(self) -> u32 {
        match self {
            Self::WhmV1 => WHM_V1_VERSION,
            Self::Uapi => UAPI_VERSION,
            Self::Api2 => API2_VERSION,
        }
    }

    /// Dialect for an API version number, if one is known.
    #[must_use]
    pub fn from_version(version: u32) -> Option<Self> {
        match version {
            WHM_V1_VERSION => Some(Self::WhmV1),
            UAPI_VERSION => Some(Self::Uapi),
            API2_VERSION => Some(Self::Api2),
            _ => None,
        }
    }
}

impl fmt::Display for DialectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WhmV1 => f.write_str("whm_v1"),
            Self::Uapi => f.write_str("uapi"),
            Self::Api2 => f.write_str("api2"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn dialect_versions_round_trip() {
        for dialect in [DialectId::WhmV1, DialectId::Uapi, DialectId::Api2] {
            assert_eq!(DialectId::from_version(dialect.version()), Some(dialect));
        }
        assert_eq!(DialectId::from_version(4), None);
    }

    #[test]
    fn dialect_serializes_snake_case() {
        let json = serde_json::to_value(DialectId::WhmV1).unwrap();
        assert_eq!(json, "whm_v1");
        assert_eq!(DialectId::Uapi.to_string(), "uapi");
    }
}
