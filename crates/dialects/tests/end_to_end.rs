//! Builder to wire parameters to normalized response, for every dialect.
#![allow(clippy::unwrap_used)]

use serde_json::{Value, json};

use {
    panelio_config::Messages,
    panelio_dialects::{Api2Adapter, UapiAdapter, WhmV1Adapter, WireAdapter, adapter_for, query::make_query_string},
    panelio_protocol::{CallDescriptor, DialectId, WHM_V1_VERSION},
    panelio_request::{InitOptions, RequestBuilder, SortDirection},
};

#[test]
fn whm_mail_list_lists_query() {
    let mut builder = RequestBuilder::whm_v1();
    builder
        .initialize("Mail", "list_lists", Some(json!({"domain": "x.com"})), None, InitOptions::default())
        .unwrap();
    builder.add_filter("*", Some("contains"), "foo");
    builder.add_sorting("list", SortDirection::Ascending, None);

    let call = builder.get_run_arguments().unwrap();
    let adapter = WhmV1Adapter::default();
    let params = adapter.build_query(&call).unwrap();

    let expected = json!({
        "domain": "x.com",
        "api.version": 1,
        "api.sort.enable": 1,
        "api.sort.a.field": "list",
        "api.filter.enable": 1,
        "api.filter.verbose": 1,
        "api.filter.a.field": "*",
        "api.filter.a.type": "contains",
        "api.filter.a.arg0": "foo",
    });
    assert_eq!(Value::Object(params.clone()), expected);
    assert!(!params.keys().any(|k| k.starts_with("api.chunk")));
    assert_eq!(adapter.get_url("/cpsess42", &call), "/cpsess42/json-api/mail_list_lists");
    assert_eq!(
        make_query_string(&params),
        "domain=x.com&api.version=1&api.sort.enable=1&api.sort.a.field=list&api.filter.enable=1\
         &api.filter.verbose=1&api.filter.a.field=*&api.filter.a.type=contains&api.filter.a.arg0=foo"
    );
}

#[test]
fn whm_paged_listing_round_trip() {
    let mut builder = RequestBuilder::whm_v1();
    builder
        .initialize("", "listaccts", None, None, InitOptions::default())
        .unwrap();
    builder.add_paging(3, Some(25));
    builder.add_argument("search", "bob", false).unwrap();

    let call = builder.get_run_arguments().unwrap();
    let adapter = WhmV1Adapter::default();
    let params = adapter.build_query(&call).unwrap();
    assert_eq!(params["api.chunk.start"], json!(51));
    assert_eq!(params["api.chunk.size"], json!(25));

    let raw = json!({
        "metadata": {
            "result": 1,
            "command": "listaccts",
            "version": 1,
            "chunk": {"records": 60, "start": 51, "chunks": 3, "current": 3, "size": 25}
        },
        "data": {"acct": [{"user": "bob"}, {"user": "bobby"}]}
    })
    .to_string();
    let parsed = adapter.parse_response(&raw, &call);
    assert!(parsed.status);
    assert_eq!(parsed.error, None);
    assert_eq!(parsed.data, json!([{"user": "bob"}, {"user": "bobby"}]));
    assert!(parsed.meta.paginate.is_paged);
    assert_eq!(parsed.meta.paginate.current_page, 3);
    assert_eq!(parsed.meta.extra.get("version"), Some(&json!(1)));
}

#[test]
fn whm_batch_round_trip() {
    let mut first = RequestBuilder::whm_v1();
    first
        .initialize("", "listaccts", Some(json!({"search": "a&b"})), None, InitOptions::default())
        .unwrap();
    let mut second = RequestBuilder::whm_v1();
    second
        .initialize("", "version", None, None, InitOptions::default())
        .unwrap();

    let batch = CallDescriptor::batch(WHM_V1_VERSION, vec![
        first.get_run_arguments().unwrap(),
        second.get_run_arguments().unwrap(),
    ]);
    let adapter = adapter_for(DialectId::WhmV1, Messages::default());
    let params = adapter.build_query(&batch).unwrap();
    assert_eq!(
        params["command"],
        json!(["listaccts?search=a%26b&api.version=1", "version?api.version=1"])
    );
    assert_eq!(adapter.get_url("", &batch), "/json-api/batch");

    let raw = json!({
        "metadata": {"result": 1, "command": "batch"},
        "data": [
            {"metadata": {"result": 1, "command": "listaccts"}, "data": {"acct": []}},
            {"metadata": {"result": 0, "reason": "Nope."}}
        ]
    })
    .to_string();
    let parsed = adapter.parse_response(&raw, &batch);
    assert!(parsed.is_batch);
    assert!(parsed.status);
    assert_eq!(parsed.batch.len(), 2);
    assert!(parsed.batch[0].status);
    assert_eq!(parsed.batch[0].data, json!([]));
    assert!(!parsed.batch[1].status);
    assert_eq!(parsed.batch[1].error.as_deref(), Some("Nope."));
}

#[test]
fn whm_passthrough_to_uapi() {
    let mut builder = RequestBuilder::whm_v1();
    builder
        .initialize(
            "",
            "cpanel",
            Some(json!({
                "cpanel_jsonapi_user": "bob",
                "cpanel_jsonapi_module": "Email",
                "cpanel_jsonapi_func": "list_pops",
                "cpanel_jsonapi_apiversion": "3"
            })),
            None,
            InitOptions::default(),
        )
        .unwrap();

    let call = builder.get_run_arguments().unwrap();
    assert_eq!(call.nested_dialect, Some(DialectId::Uapi));

    let adapter = WhmV1Adapter::default();
    let raw = r#"{"result": {"status": 0, "errors": ["No <such> user"], "data": null}}"#;
    let parsed = adapter.parse_response(raw, &call);
    assert!(!parsed.status);
    assert!(parsed.messages_are_html);
    assert_eq!(parsed.error.as_deref(), Some("No &lt;such&gt; user"));
}

#[test]
fn uapi_listing_round_trip() {
    let mut builder = RequestBuilder::uapi();
    builder
        .initialize("Email", "list_pops", None, None, InitOptions::default())
        .unwrap();
    builder.add_sorting("email", SortDirection::Descending, None);
    builder.add_filter("domain", Some("eq"), "x.com");
    builder.add_paging(2, Some(10));
    builder.add_argument("email", "a@x.com", true).unwrap();
    builder.add_argument("email", "b@x.com", true).unwrap();

    let call = builder.get_run_arguments().unwrap();
    let adapter = UapiAdapter::default();
    let params = adapter.build_query(&call).unwrap();
    assert_eq!(params["email1"], json!("a@x.com"));
    assert_eq!(params["email2"], json!("b@x.com"));
    assert_eq!(params["api.sort_column"], json!("email"));
    assert_eq!(params["api.sort_reverse"], json!(1));
    assert_eq!(params["api.filter_term"], json!("x.com"));
    assert_eq!(params["api.paginate_start"], json!(11));
    assert_eq!(params["api.paginate_size"], json!(10));
    assert_eq!(adapter.get_url("/cpsess1", &call), "/cpsess1/execute/Email/list_pops");

    let raw = json!({
        "status": 1,
        "errors": null,
        "messages": null,
        "warnings": ["Quota almost reached"],
        "metadata": {
            "paginate": {"total_results": 12, "start_result": 11, "total_pages": 2, "current_page": 2, "results_per_page": 10},
            "transformed": 1
        },
        "data": [{"email": "z@x.com"}, {"email": "y@x.com"}]
    })
    .to_string();
    let parsed = adapter.parse_response(&raw, &call);
    assert!(parsed.status);
    assert_eq!(parsed.error, None);
    assert_eq!(parsed.data.as_array().unwrap().len(), 2);
    assert_eq!(parsed.meta.paginate.total_records, 12);
    assert_eq!(parsed.warnings, Some(json!(["Quota almost reached"])));
    assert_eq!(parsed.raw["func"], json!("list_pops"));
}

#[test]
fn api2_zone_edit_round_trip() {
    let mut builder = RequestBuilder::api2();
    builder
        .initialize("ZoneEdit", "fetchzone_records", Some(json!({"domain": "x.com"})), None, InitOptions::default())
        .unwrap();
    builder.add_sorting("line", SortDirection::Ascending, Some("numeric"));
    builder.add_paging(1, Some(20));

    let call = builder.get_run_arguments().unwrap();
    let adapter = Api2Adapter::default();
    let params = adapter.build_query(&call).unwrap();
    assert_eq!(
        make_query_string(&params),
        "cpanel_jsonapi_apiversion=2&cpanel_jsonapi_module=ZoneEdit&cpanel_jsonapi_func=fetchzone_records\
         &domain=x.com&api2_sort=1&api2_sort_method=numeric&api2_sort_column=line\
         &api2_paginate=1&api2_paginate_start=1&api2_paginate_size=20"
    );
    assert_eq!(adapter.get_url("/cpsess7", &call), "/cpsess7/json-api/cpanel");

    let raw = json!({
        "cpanelresult": {
            "event": {"result": 1},
            "module": "ZoneEdit",
            "func": "fetchzone_records",
            "paginate": {"total_results": 2, "start_result": 1, "total_pages": 1, "current_page": 1, "results_per_page": 20},
            "data": [{"line": 1, "type": "SOA"}, {"line": 2, "type": "NS"}]
        }
    })
    .to_string();
    let parsed = adapter.parse_response(&raw, &call);
    assert!(parsed.status);
    assert_eq!(parsed.error, None);
    assert!(parsed.messages.is_empty());
    assert_eq!(parsed.data.as_array().unwrap().len(), 2);
    assert_eq!(parsed.meta.paginate.total_records, 2);
    assert_eq!(parsed.meta.extra.get("func"), Some(&json!("fetchzone_records")));
}

#[test]
fn garbage_body_never_panics() {
    let call = RequestBuilder::uapi().get_run_arguments().unwrap();
    for dialect in [DialectId::WhmV1, DialectId::Uapi, DialectId::Api2] {
        let adapter = adapter_for(dialect, Messages::default());
        for raw in ["", "null", "[]", "42", "\"text\"", "{\"data\": {\"x\": []}}", "{"] {
            let parsed = adapter.parse_response(raw, &call);
            assert!(!parsed.status, "{dialect} accepted {raw:?}");
            assert!(parsed.error.is_some());
        }
    }
}
