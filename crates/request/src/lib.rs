//! Fluent builders that collect a call's module, function, arguments and
//! sort/filter/paging directives, independent of the wire dialect that will
//! eventually serialize them.
//!
//! ```ignore
//! let mut request = RequestBuilder::whm_v1();
//! request
//!     .initialize("Mail", "list_lists", Some(json!({"domain": "x.com"})), None, InitOptions::default())?
//!     .add_filter("*", Some("contains"), "foo")
//!     .add_sorting("list", SortDirection::Ascending, None);
//! let call = request.get_run_arguments()?;
//! ```

pub mod auto_counter;
pub mod builder;

pub use {
    auto_counter::AutoCounter,
    builder::{InitOptions, RequestBuilder, SortDirection},
    panelio_protocol::{Error, Result},
};
