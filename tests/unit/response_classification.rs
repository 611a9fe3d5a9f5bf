use cloud_transport::{Error, Response};
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize, PartialEq)]
struct Subnet {
    id: String,
    cidr: String,
}

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

#[test]
fn created_with_body_populates_data() {
    let body = json!({"id": "sn-1", "cidr": "10.0.0.0/24"}).to_string().into_bytes();
    let resp = Response::<Subnet>::from_parts(StatusCode::CREATED, json_headers(), body).unwrap();

    assert!(resp.is_success());
    assert_eq!(
        resp.data(),
        Some(&Subnet {
            id: "sn-1".into(),
            cidr: "10.0.0.0/24".into()
        })
    );
    assert!(resp.error().is_none());
    assert_eq!(resp.headers()[CONTENT_TYPE], "application/json");
}

#[test]
fn not_found_with_problem_details_populates_error() {
    let body = json!({
        "type": "about:blank",
        "title": "Not Found",
        "status": 404,
        "detail": "subnet sn-9 does not exist",
        "instance": "/projects/p1/subnets/sn-9",
        "correlationId": "c-42"
    })
    .to_string()
    .into_bytes();
    let resp = Response::<Subnet>::from_parts(StatusCode::NOT_FOUND, json_headers(), body).unwrap();

    assert!(resp.is_error());
    assert!(resp.data().is_none());
    let problem = resp.error().expect("problem details");
    assert_eq!(problem.status, Some(404));
    assert_eq!(problem.detail.as_deref(), Some("subnet sn-9 does not exist"));
    assert_eq!(problem.extension("correlationId"), Some(&json!("c-42")));
}

#[test]
fn no_content_with_unit_type_is_successful() {
    let resp = Response::<()>::from_parts(StatusCode::NO_CONTENT, HeaderMap::new(), Vec::new()).unwrap();
    assert!(resp.is_success());
    assert!(resp.error().is_none());
    assert!(resp.raw_body().is_empty());
    assert_eq!(resp.into_result().unwrap(), Some(()));
}

#[test]
fn malformed_success_body_is_decode_error() {
    let err = Response::<Subnet>::from_parts(StatusCode::OK, json_headers(), b"{\"id\": 1".to_vec())
        .unwrap_err();
    match err {
        Error::Decode { status, .. } => assert_eq!(status, StatusCode::OK),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn non_json_error_body_keeps_raw_bytes() {
    let resp = Response::<Subnet>::from_parts(
        StatusCode::BAD_GATEWAY,
        HeaderMap::new(),
        b"<html>upstream down</html>".to_vec(),
    )
    .unwrap();
    assert!(resp.is_error());
    assert!(resp.error().is_none());
    assert!(resp.data().is_none());
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(resp.raw_body(), b"<html>upstream down</html>");
}

#[test]
fn empty_error_body_is_not_fatal() {
    let resp = Response::<Subnet>::from_parts(StatusCode::UNAUTHORIZED, HeaderMap::new(), Vec::new()).unwrap();
    assert!(resp.error().is_none());
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
