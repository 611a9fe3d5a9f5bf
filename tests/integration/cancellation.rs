use std::time::Duration;

use wiremock::MockServer;

use crate::common::{cache_for, delayed_token_mock};

#[tokio::test]
async fn abandoned_refresh_releases_the_lock() {
    let server = MockServer::start().await;
    delayed_token_mock("slow", 3600, Duration::from_secs(2))
        .mount(&server)
        .await;

    let cache = cache_for(&server, Duration::from_secs(60));

    let abandoned = tokio::time::timeout(Duration::from_millis(100), cache.get_token()).await;
    assert!(abandoned.is_err(), "refresh should still be in flight");

    let valid = tokio::time::timeout(Duration::from_millis(500), cache.is_valid())
        .await
        .expect("lock must be free after the refresh was dropped");
    assert!(!valid);

    tokio::time::timeout(Duration::from_millis(500), cache.clear())
        .await
        .expect("clear must not block");

    let token = tokio::time::timeout(Duration::from_secs(5), cache.get_token())
        .await
        .expect("later refresh completes")
        .expect("token");
    assert_eq!(token, "slow");
}
