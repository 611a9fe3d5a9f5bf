use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use cloud_transport::interceptor::{BearerAuth, from_fn};
use cloud_transport::{ApiClient, Config, Error, InterceptorChain, RequestDispatcher};
use reqwest::Method;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{CLIENT_ID, CLIENT_SECRET, TOKEN_PATH, cache_for, init_logging, token_mock, token_url};

fn config(server: &MockServer) -> Config {
    Config::new(server.uri(), token_url(server), CLIENT_ID, CLIENT_SECRET)
}

#[tokio::test]
async fn request_carries_bearer_static_headers_and_query() {
    init_logging();
    let server = MockServer::start().await;
    token_mock("tok-1", 3600).expect(1).mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/projects/p1/vpcs"))
        .and(header("authorization", "Bearer tok-1"))
        .and(header("x-tenant", "acme"))
        .and(header("x-call", "yes"))
        .and(query_param("filter", "name eq 'a b'"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(config(&server).with_header("X-Tenant", "acme")).unwrap();
    let query = BTreeMap::from([
        ("filter".to_string(), "name eq 'a b'".to_string()),
        ("limit".to_string(), "10".to_string()),
    ]);
    let headers = BTreeMap::from([("X-Call".to_string(), "yes".to_string())]);

    let resp = client
        .dispatcher()
        .dispatch(Method::GET, "/projects/p1/vpcs", None, &query, &headers)
        .await
        .expect("dispatch");
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn body_is_sent_as_json() {
    let server = MockServer::start().await;
    token_mock("tok-1", 3600).mount(&server).await;
    Mock::given(method("POST"))
        .and(path("/projects/p1/subnets"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"name": "edge", "cidr": "10.1.0.0/24"})))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(config(&server)).unwrap();
    let body = serde_json::to_vec(&json!({"name": "edge", "cidr": "10.1.0.0/24"})).unwrap();
    let resp = client
        .dispatcher()
        .dispatch(
            Method::POST,
            "/projects/p1/subnets",
            Some(body),
            &BTreeMap::new(),
            &BTreeMap::new(),
        )
        .await
        .expect("dispatch");
    assert_eq!(resp.status(), 202);
}

#[tokio::test]
async fn interceptor_failure_skips_network() {
    let server = MockServer::start().await;
    token_mock("tok-1", 3600).mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = ApiClient::builder(config(&server))
        .after_auth(from_fn("sign", |_, _| Err("missing signing key".into())))
        .build()
        .unwrap();

    let err = client
        .dispatcher()
        .dispatch(Method::GET, "/projects", None, &BTreeMap::new(), &BTreeMap::new())
        .await
        .expect_err("interceptor must abort");
    match err {
        Error::Interceptor { name, source, .. } => {
            assert_eq!(name, "sign");
            assert_eq!(source.to_string(), "missing signing key");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn credential_failure_skips_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = ApiClient::new(config(&server)).unwrap();
    let err = client
        .dispatcher()
        .dispatch(Method::GET, "/projects", None, &BTreeMap::new(), &BTreeMap::new())
        .await
        .expect_err("token failure must abort");
    assert!(err.is_credential_failure());
}

#[tokio::test]
async fn unreachable_api_is_transport_failure() {
    let server = MockServer::start().await;
    token_mock("tok-1", 3600).mount(&server).await;

    let cfg = Config::new("http://127.0.0.1:1", token_url(&server), CLIENT_ID, CLIENT_SECRET);
    let client = ApiClient::new(cfg).unwrap();
    let err = client
        .dispatcher()
        .dispatch(Method::GET, "/projects", None, &BTreeMap::new(), &BTreeMap::new())
        .await
        .expect_err("nothing listens on port 1");
    assert!(matches!(err, Error::Transport(ref e) if e.is_connect()));
}

#[tokio::test]
async fn token_is_reused_across_requests() {
    let server = MockServer::start().await;
    token_mock("tok-1", 3600).expect(1).mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/projects"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&server)
        .await;

    let client = ApiClient::new(config(&server)).unwrap();
    for _ in 0..3 {
        client
            .dispatcher()
            .dispatch(Method::GET, "/projects", None, &BTreeMap::new(), &BTreeMap::new())
            .await
            .expect("dispatch");
    }
}

#[tokio::test]
async fn client_timeout_is_transport_failure() {
    let server = MockServer::start().await;
    token_mock("tok-1", 3600).expect(1).mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let cfg = config(&server).with_request_timeout(Duration::from_millis(300));
    let client = ApiClient::new(cfg).unwrap();
    let err = client
        .dispatcher()
        .dispatch(Method::GET, "/projects", None, &BTreeMap::new(), &BTreeMap::new())
        .await
        .expect_err("api answers too late");
    assert!(matches!(err, Error::Transport(ref e) if e.is_timeout()), "{err:?}");
}

#[tokio::test]
async fn per_dispatcher_timeout_is_transport_failure() {
    let server = MockServer::start().await;
    token_mock("tok-1", 3600).mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let mut chain = InterceptorChain::new();
    BearerAuth.bind_to(&mut chain).unwrap();
    let dispatcher = RequestDispatcher::new(
        server.uri(),
        reqwest::Client::new(),
        Arc::new(cache_for(&server, Duration::from_secs(60))),
        chain,
    )
    .with_timeout(Duration::from_millis(300));

    let err = dispatcher
        .dispatch(Method::GET, "/projects", None, &BTreeMap::new(), &BTreeMap::new())
        .await
        .expect_err("api answers too late");
    assert!(matches!(err, Error::Transport(ref e) if e.is_timeout()), "{err:?}");
    assert!(dispatcher.credentials().is_valid().await);
}
