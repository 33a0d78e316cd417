//! Fetch client behaviour against a mock WordPress REST server

use serde_json::{json, Value};
use sitekit_api::{ApiClient, ApiConfig, GetOptions, QueryParams, Route};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SETTINGS_PATH: &str = "/google-site-kit/v1/modules/adsense/data/settings";

fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(ApiConfig::default().with_base_url(server.uri())).unwrap()
}

#[tokio::test]
async fn get_is_memoized_by_signature() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SETTINGS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accountID": "pub-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let route = Route::new("modules", "adsense", "settings");

    let first: Value = client.get(&route, &QueryParams::new(), GetOptions::default()).await.unwrap();
    let second: Value = client.get(&route, &QueryParams::new(), GetOptions::default()).await.unwrap();

    assert_eq!(first, json!({"accountID": "pub-1"}));
    assert_eq!(first, second);
}

#[tokio::test]
async fn disabled_cache_fetches_every_time() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SETTINGS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.set_using_cache(false);
    let route = Route::new("modules", "adsense", "settings");

    for _ in 0..2 {
        let _: Value = client.get(&route, &QueryParams::new(), GetOptions::default()).await.unwrap();
    }
}

#[tokio::test]
async fn set_posts_wrapped_body_and_invalidates_reads() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SETTINGS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accountID": "old"})))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SETTINGS_PATH))
        .and(body_json(json!({"data": {"accountID": "new"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accountID": "new"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let route = Route::new("modules", "adsense", "settings");

    let _: Value = client.get(&route, &QueryParams::new(), GetOptions::default()).await.unwrap();
    let saved: Value = client.set(&route, &json!({"accountID": "new"})).await.unwrap();
    assert_eq!(saved["accountID"], "new");

    // Cache entry for the datapoint is gone, so this hits the server again.
    let _: Value = client.get(&route, &QueryParams::new(), GetOptions::default()).await.unwrap();
}

#[tokio::test]
async fn invalidate_cache_by_module_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let settings = Route::new("modules", "analytics", "settings");
    let report = Route::new("modules", "analytics", "report");
    let other = Route::new("modules", "analytics-4", "settings");

    for route in [&settings, &report, &other] {
        let _: Value = client.get(route, &QueryParams::new(), GetOptions::default()).await.unwrap();
    }
    assert_eq!(client.cache().len().await.unwrap(), 3);

    let removed = client.invalidate_cache("modules", Some("analytics"), None).await;
    assert_eq!(removed, 2);
    assert_eq!(client.cache().len().await.unwrap(), 1);
}

#[tokio::test]
async fn server_error_is_typed_and_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SETTINGS_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "code": "internal_server_error",
            "message": "Internal server error",
            "data": {"status": 500}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let route = Route::new("modules", "adsense", "settings");

    let error = client
        .get::<Value>(&route, &QueryParams::new(), GetOptions::default())
        .await
        .unwrap_err();
    assert_eq!(error.code, "internal_server_error");
    assert_eq!(error.message, "Internal server error");
    assert_eq!(error.status(), Some(500));

    // Failures are never cached.
    assert!(client.cache().is_empty().await.unwrap());
}

#[tokio::test]
async fn fetch_text_returns_raw_body_with_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .and(query_param("tagverify", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut query = QueryParams::new();
    query.insert("tagverify".into(), json!("1"));

    let body = client
        .fetch_text(&format!("{}/page", server.uri()), &query)
        .await
        .unwrap();
    assert_eq!(body, "<html></html>");
}
