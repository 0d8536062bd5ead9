//! Integration tests for the REST client against a mock log server

use logwatch::api::{download_log, ApiClient, ApiError, LogSource};
use logwatch::config::ServerConfig;
use serde_json::json;
use tokio_test::assert_ok;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(&ServerConfig {
        base_url: server.uri(),
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_list_logs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/listlogs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "log_id": "abc_1738254836",
                "server_instance_token": "abc",
                "log_start_time": "01/30/2025 - 16:33:56.470",
                "metadata": {
                    "server_instance_token": "abc",
                    "game_map": "de_dust2",
                    "steam_id": "[G:1:1234]",
                    "server_addr": "10.0.0.5:27015"
                },
                "last_activity": "01/30/2025 - 16:40:01.002"
            }
        ])))
        .mount(&server)
        .await;

    let logs = assert_ok!(client(&server).list_logs().await);
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].server_instance_token, "abc");
    assert_eq!(logs[0].metadata.game_map, "de_dust2");
    assert!(logs[0].last_activity_at().is_some());
}

#[tokio::test]
async fn test_fetch_log() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/logs/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string("line one\nline two\n"))
        .mount(&server)
        .await;

    let content = assert_ok!(client(&server).fetch_log("abc").await);
    assert_eq!(content, "line one\nline two\n");
}

#[tokio::test]
async fn test_missing_log_is_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/logs/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client(&server).fetch_log("missing").await.unwrap_err();
    match err {
        ApiError::Status { status, .. } => assert_eq!(status.as_u16(), 404),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_download_writes_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/logs/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string("round start\n"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("abc.log");
    let api = client(&server);
    let written = download_log(&api, "abc", Some(target.clone())).await.unwrap();

    assert_eq!(written, target);
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "round start\n");
}
