use hw_tests::utils::{post_event, signature_for, test_config, TestServer};
use mockito::{Matcher, Server};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tempfile::TempDir;

fn push_body(branch: &str, added: &[&str]) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "ref": format!("refs/heads/{branch}"),
        "before": "0000000000000000000000000000000000000000",
        "after": "6113728f27ae82c7b1a177c8d03f9e96e0adf246",
        "commits": [{
            "id": "6113728f27ae82c7b1a177c8d03f9e96e0adf246",
            "message": "Update readme",
            "added": added,
            "removed": [],
            "modified": ["README.md"],
        }],
        "repository": {
            "name": "hello-world-node",
            "full_name": "octo-org/hello-world-node",
            "owner": { "login": "octo-org" },
        },
        "pusher": { "name": "octocat", "email": "octocat@github.com" },
    }))
    .unwrap()
}

#[tokio::test]
async fn test_signed_push_is_processed() -> eyre::Result<()> {
    let mut github = Server::new_async().await;
    let dispatch = github
        .mock("POST", "/repos/octo-org/hello-world-node/dispatches")
        .match_header("authorization", "Bearer ghp_integration")
        .match_body(Matcher::PartialJson(json!({
            "event_type": "ci-cd-trigger",
            "client_payload": { "branch": "main", "workflow": "production-deploy.yml" },
        })))
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let dir = TempDir::new()?;
    let server = TestServer::start(test_config(&dir, &github.url())).await?;

    let response = post_event(&server, "push", &push_body("main", &["src/index.js"]), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json::<Value>().await?, json!({ "status": "success", "event": "push" }));

    let lines = server.log_lines("push");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["event"], "push");
    assert_eq!(lines[0]["details"]["pusher"]["name"], "octocat");
    assert!(server.log_lines("security_alert").is_empty());
    dispatch.assert_async().await;

    let logs: Value = reqwest::get(server.url("/logs.json")).await?.json().await?;
    assert_eq!(logs.as_array().map(Vec::len), Some(1));
    assert_eq!(logs[0]["event"], "push");
    assert_eq!(logs[0]["message"], "push event occurred");

    server.stop().await
}

#[tokio::test]
async fn test_sensitive_push_writes_security_alert() -> eyre::Result<()> {
    let mut github = Server::new_async().await;
    let _dispatch = github
        .mock("POST", "/repos/octo-org/hello-world-node/dispatches")
        .with_status(204)
        .create_async()
        .await;

    let dir = TempDir::new()?;
    let server = TestServer::start(test_config(&dir, &github.url())).await?;

    let response =
        post_event(&server, "push", &push_body("feature-x", &[".env", "src/a.js"]), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let alerts = server.log_lines("security_alert");
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["details"]["branch"], "feature-x");
    assert_eq!(alerts[0]["details"]["detectedFiles"], json!([".env"]));

    server.stop().await
}

#[tokio::test]
async fn test_failed_ci_dispatch_is_a_server_error() -> eyre::Result<()> {
    let mut github = Server::new_async().await;
    let _dispatch = github
        .mock("POST", "/repos/octo-org/hello-world-node/dispatches")
        .with_status(401)
        .with_body(r#"{"message":"Bad credentials"}"#)
        .create_async()
        .await;

    let dir = TempDir::new()?;
    let server = TestServer::start(test_config(&dir, &github.url())).await?;

    let response = post_event(&server, "push", &push_body("main", &[]), None).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json().await?;
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("Bad credentials"));
    // The audit entry is not rolled back
    assert_eq!(server.log_lines("push").len(), 1);
    assert_eq!(server.log_lines("errors").len(), 1);

    server.stop().await
}

#[tokio::test]
async fn test_signature_failures_are_forbidden() -> eyre::Result<()> {
    let dir = TempDir::new()?;
    let server = TestServer::start(test_config(&dir, "http://127.0.0.1:9")).await?;
    let body = push_body("main", &[]);

    // Signature over different bytes
    let other = signature_for(b"{}");
    let response = post_event(&server, "push", &body, Some(&other)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        response.json::<Value>().await?,
        json!({ "status": "error", "message": "signature mismatch" })
    );

    // No signature header at all
    let response = reqwest::Client::new()
        .post(server.url("/webhook"))
        .header("x-github-event", "push")
        .body(body.clone())
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(response.json::<Value>().await?["message"], "signature missing");

    assert!(server.log_lines("push").is_empty());
    server.stop().await
}

#[tokio::test]
async fn test_missing_secret_rejects_everything() -> eyre::Result<()> {
    let dir = TempDir::new()?;
    let mut config = test_config(&dir, "http://127.0.0.1:9");
    config.webhook_secret = None;
    let server = TestServer::start(config).await?;

    let response = post_event(&server, "push", &push_body("main", &[]), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(response.json::<Value>().await?["message"], "webhook secret is not configured");

    server.stop().await
}

#[tokio::test]
async fn test_unhandled_events_are_bad_requests() -> eyre::Result<()> {
    let dir = TempDir::new()?;
    let server = TestServer::start(test_config(&dir, "http://127.0.0.1:9")).await?;

    let response = post_event(&server, "gollum", br#"{"pages":[]}"#, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>().await?,
        json!({ "status": "error", "message": "unhandled event type: gollum" })
    );

    let edited = serde_json::to_vec(&json!({
        "action": "edited",
        "repository": { "name": "foo-bar-node", "full_name": "octo-org/foo-bar-node" },
    }))?;
    let response = post_event(&server, "repository", &edited, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>().await?["message"], "unhandled repository action: edited");

    server.stop().await
}

#[tokio::test]
async fn test_invalid_payloads_are_bad_requests() -> eyre::Result<()> {
    let dir = TempDir::new()?;
    let server = TestServer::start(test_config(&dir, "http://127.0.0.1:9")).await?;

    let response = post_event(&server, "push", b"{not json", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_event(&server, "push", br#"{"ref":"refs/heads/main"}"#, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>().await?["message"], "invalid payload: after missing");

    let errors = server.log_lines("errors");
    assert_eq!(errors.len(), 1);

    server.stop().await
}

#[tokio::test]
async fn test_invalid_rename_is_corrected() -> eyre::Result<()> {
    let mut github = Server::new_async().await;
    let rename = github
        .mock("PATCH", "/repos/octo-org/my-repo-rust")
        .match_body(Matcher::Regex(r#"\{"name":"invalid-name-\d+"\}"#.to_string()))
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let dir = TempDir::new()?;
    let server = TestServer::start(test_config(&dir, &github.url())).await?;

    let body = serde_json::to_vec(&json!({
        "action": "renamed",
        "changes": { "repository": { "name": { "from": "my-repo-node" } } },
        "repository": {
            "name": "my-repo-rust",
            "full_name": "octo-org/my-repo-rust",
            "owner": { "login": "octo-org" },
        },
    }))?;
    let response = post_event(&server, "repository", &body, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.json::<Value>().await?,
        json!({ "status": "success", "event": "repository" })
    );

    rename.assert_async().await;
    assert_eq!(server.log_lines("repository_rename").len(), 1);

    server.stop().await
}

#[tokio::test]
async fn test_check_config_and_root() -> eyre::Result<()> {
    let dir = TempDir::new()?;
    let server = TestServer::start(test_config(&dir, "http://127.0.0.1:9")).await?;

    let response = reqwest::get(server.url("/check-config")).await?;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await?;
    assert_eq!(body["status"], "error");
    assert_eq!(body["missingConfigs"], json!(["SLACK_WEBHOOK_URL", "JIRA_API_KEY", "JIRA_URL"]));

    let response = reqwest::get(server.url("/")).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await?.contains("webhook"));

    // Nothing logged yet
    let logs: Value = reqwest::get(server.url("/logs.json")).await?.json().await?;
    assert_eq!(logs, json!([]));

    server.stop().await?;

    let mut config = test_config(&dir, "http://127.0.0.1:9");
    config.notifications.slack_webhook_url = Some("http://127.0.0.1:9/slack".into());
    config.ticketing.jira_api_key = Some("jira-key".into());
    config.ticketing.jira_url = Some("http://127.0.0.1:9/jira".into());
    let server = TestServer::start(config).await?;

    let response = reqwest::get(server.url("/check-config")).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json::<Value>().await?["status"], "success");

    server.stop().await
}

#[tokio::test]
async fn test_metrics_endpoint() -> eyre::Result<()> {
    let dir = TempDir::new()?;
    let server = TestServer::start(test_config(&dir, "http://127.0.0.1:9")).await?;

    post_event(&server, "gollum", b"{}", None).await;

    let text = reqwest::get(server.url("/metrics")).await?.text().await?;
    assert!(text.contains("hw_webhook_rejected_total"));

    server.stop().await
}
