//! REST API tests against a spawned tallyd process.

mod common;

use common::TestServer;
use serde_json::{Value, json};

#[tokio::test]
async fn read_api_lifecycle() {
    let server = TestServer::spawn(17301)
        .await
        .expect("Failed to spawn test server");
    let client = reqwest::Client::new();

    // Nothing is enabled yet.
    let servers: Value = client
        .get(server.url("/servers"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(servers, json!([]));

    let response = client.get(server.url("/servers/g1")).send().await.unwrap();
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], 404);
    assert!(body["error"]["message"].is_string());

    // Enable through the admin API.
    let response = client
        .patch(server.url("/servers/g1"))
        .json(&json!({"channelId": "c1", "count": 41, "settings": {"oneByOne": true}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let summary: Value = response.json().await.unwrap();
    assert_eq!(summary, json!({"id": "g1", "count": 41, "previousUser": null}));

    let servers: Value = client
        .get(server.url("/servers"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(servers, json!([{"id": "g1", "count": 41}]));

    let page: Value = client
        .get(server.url("/servers/g1/users"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page, json!({"page": 1, "limit": 10, "total": 0, "users": []}));

    // Hidden guilds leave the public board.
    client
        .patch(server.url("/servers/g1"))
        .json(&json!({"settings": {"visibility": "unlisted"}}))
        .send()
        .await
        .unwrap();
    let servers: Value = client
        .get(server.url("/servers"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(servers, json!([]));
}

#[tokio::test]
async fn malformed_parameters_are_unprocessable() {
    let server = TestServer::spawn(17302)
        .await
        .expect("Failed to spawn test server");
    let client = reqwest::Client::new();

    client
        .patch(server.url("/servers/g2"))
        .json(&json!({"channelId": "c2"}))
        .send()
        .await
        .unwrap();

    for path in [
        "/servers/g2/users?sort=height",
        "/servers/g2/users?limit=0",
        "/servers/g2/history?since=yesterday",
        "/servers/g2?fields=nope",
    ] {
        let response = client.get(server.url(path)).send().await.unwrap();
        assert_eq!(response.status(), 422, "{}", path);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"]["code"], 422, "{}", path);
    }

    let response = client
        .patch(server.url("/servers/g2"))
        .json(&json!({"count": -5}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 422);

    let response = client
        .patch(server.url("/servers/g2"))
        .json(&json!({"colour": "blue"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 422);
}

#[tokio::test]
async fn metrics_are_exposed() {
    let server = TestServer::spawn(17303)
        .await
        .expect("Failed to spawn test server");
    let client = reqwest::Client::new();

    client.get(server.url("/servers")).send().await.unwrap();
    let text = client
        .get(server.url("/metrics"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(text.contains("tally_api_requests_total"));
    assert!(text.contains("route=\"/servers\""));
}
