//! Integration tests for paginated collections and per-type lookups.

mod common;

use common::{client, entry, investigation, MockTransport};
use serde_json::json;
use workbench_api::clients::HttpMethod;
use workbench_api::rest::{limit, ErrorKind, Filters, ResourceError};

const NEXT_PAGE: &str = "https://workbench.example.com/api/v2/investigations?page%5Bafter%5D=2";

// ============================================================================
// Pagination
// ============================================================================

#[tokio::test]
async fn test_two_pages_yield_primary_then_included_then_next_page() {
    let transport = MockTransport::new();
    transport
        .respond(
            200,
            json!({
                "data": [investigation("1", "one"), investigation("2", "two")],
                "included": [entry("organizations", "org-1", json!({"name": "Acme"}))],
                "links": {"next": NEXT_PAGE},
            }),
        )
        .respond(200, json!({"data": [investigation("3", "three")]}));
    let client = client(transport.clone());

    let mut all = client.resource("investigations").unwrap().all().unwrap();
    assert_eq!(transport.request_count(), 0);

    let mut seen = Vec::new();
    while let Some(record) = all.next().await.unwrap() {
        seen.push(format!("{}:{}", record.type_name(), record.id().unwrap()));
    }

    assert_eq!(
        seen,
        vec![
            "investigations:1",
            "investigations:2",
            "organizations:org-1",
            "investigations:3",
        ]
    );

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].http_method, HttpMethod::Get);
    assert_eq!(
        requests[0].path,
        "/api/v2/investigations?sort=%2Bcreated_at&sort=%2Bid"
    );
    assert_eq!(requests[1].path, NEXT_PAGE);
    assert_eq!(all.pages_fetched(), 2);
}

#[tokio::test]
async fn test_exhausted_collection_is_not_restarted() {
    let transport = MockTransport::new();
    transport.respond(200, json!({"data": [investigation("1", "one")]}));
    let client = client(transport.clone());

    let mut all = client.resource("investigations").unwrap().all().unwrap();
    assert!(all.next().await.unwrap().is_some());
    assert!(all.next().await.unwrap().is_none());
    assert!(all.next().await.unwrap().is_none());
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn test_single_object_page_is_one_record() {
    let transport = MockTransport::new();
    transport.respond(200, json!({"data": investigation("1", "one")}));
    let client = client(transport.clone());

    let records = client
        .resource("investigations")
        .unwrap()
        .all()
        .unwrap()
        .try_collect()
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_empty_page_ends_iteration() {
    let transport = MockTransport::new();
    transport.respond(200, json!({"data": [], "meta": {"page": {"total": 0}}}));
    let client = client(transport.clone());

    let records = client
        .resource("investigations")
        .unwrap()
        .all()
        .unwrap()
        .try_collect()
        .await
        .unwrap();

    assert!(records.is_empty());
}

#[tokio::test]
async fn test_unregistered_entry_type_is_a_lookup_error() {
    let transport = MockTransport::new();
    transport.respond(
        200,
        json!({"data": [entry("widgets", "w-1", json!({}))]}),
    );
    let client = client(transport.clone());

    let mut all = client.resource("investigations").unwrap().all().unwrap();
    let error = all.next().await.unwrap_err();

    assert!(matches!(
        error,
        ResourceError::UnknownType { ref type_name } if type_name == "widgets"
    ));
    assert_eq!(error.kind(), ErrorKind::Lookup);
}

#[tokio::test]
async fn test_page_fetch_failure_propagates() {
    let transport = MockTransport::new();
    transport.respond(403, json!({"errors": [{"title": "Forbidden"}]}));
    let client = client(transport.clone());

    let mut all = client.resource("investigations").unwrap().all().unwrap();
    let error = all.next().await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Transport);
    assert!(error.to_string().contains("Forbidden"));
}

// ============================================================================
// Count and one_or_none
// ============================================================================

#[tokio::test]
async fn test_count_probes_with_limit_zero() {
    let transport = MockTransport::new();
    transport.respond(200, json!({"data": [], "meta": {"page": {"total": 57}}}));
    let client = client(transport.clone());

    let mut open = client
        .resource("investigations")
        .unwrap()
        .filter_by(Filters::new().with("status", "OPEN"))
        .unwrap();

    assert_eq!(open.count().await.unwrap(), 57);
    assert_eq!(open.count().await.unwrap(), 57);

    assert_eq!(transport.request_count(), 1);
    assert_eq!(
        transport.last_request().path,
        "/api/v2/investigations?page%5Blimit%5D=0&filter%5Bstatus%5D=OPEN&sort=%2Bcreated_at&sort=%2Bid"
    );
}

#[tokio::test]
async fn test_count_reuses_total_from_fetched_page() {
    let transport = MockTransport::new();
    transport.respond(
        200,
        json!({
            "data": [investigation("1", "one")],
            "meta": {"page": {"total": 12}},
        }),
    );
    let client = client(transport.clone());

    let mut all = client.resource("investigations").unwrap().all().unwrap();
    all.next().await.unwrap();

    assert_eq!(all.count().await.unwrap(), 12);
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn test_count_without_total_is_malformed() {
    let transport = MockTransport::new();
    transport.respond(200, json!({"data": []}));
    let client = client(transport.clone());

    let error = client
        .resource("investigations")
        .unwrap()
        .count(Filters::new())
        .await
        .unwrap_err();

    assert!(matches!(error, ResourceError::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_one_or_none_consumes_one_record() {
    let transport = MockTransport::new();
    transport.respond(
        200,
        json!({"data": [investigation("1", "one"), investigation("2", "two")]}),
    );
    let client = client(transport.clone());

    let first = client
        .resource("investigations")
        .unwrap()
        .one_or_none([limit(1)], Filters::new().with("title", "one"))
        .await
        .unwrap();

    assert_eq!(first.unwrap().id(), Some("1"));
    assert_eq!(
        transport.last_request().path,
        "/api/v2/investigations?page%5Blimit%5D=1&filter%5Btitle%5D=one&sort=%2Bcreated_at&sort=%2Bid"
    );
}

#[tokio::test]
async fn test_one_or_none_without_matches() {
    let transport = MockTransport::new();
    transport.respond(200, json!({"data": []}));
    let client = client(transport.clone());

    let none = client
        .resource("investigations")
        .unwrap()
        .one_or_none([], Filters::new().with("status", "OPEN"))
        .await
        .unwrap();

    assert!(none.is_none());
}

// ============================================================================
// Lookup by id
// ============================================================================

#[tokio::test]
async fn test_get_by_id() {
    let transport = MockTransport::new();
    transport.respond(200, json!({"data": investigation("56f00b9b", "Phish")}));
    let client = client(transport.clone());

    let inv = client
        .resource("investigations")
        .unwrap()
        .get("56f00b9b")
        .await
        .unwrap();

    assert_eq!(inv.id(), Some("56f00b9b"));
    assert_eq!(transport.last_request().path, "/api/v2/investigations/56f00b9b");
}

#[tokio::test]
async fn test_get_missing_record_is_not_found() {
    let transport = MockTransport::new();
    transport.respond(404, json!({"errors": [{"detail": "Not found"}]}));
    let client = client(transport.clone());

    let error = client
        .resource("investigations")
        .unwrap()
        .get("nope")
        .await
        .unwrap_err();

    assert!(matches!(error, ResourceError::NotFound { ref id, .. } if id == "nope"));
    assert_eq!(error.kind(), ErrorKind::Lookup);
}

#[tokio::test]
async fn test_unknown_resource_type() {
    let transport = MockTransport::new();
    let client = client(transport);

    let error = client.resource("widgets").unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Lookup);
}
