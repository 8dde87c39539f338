use github_proxy_lib::{serve, ServerLimits};
use std::time::Duration;
use tokio::net::TcpListener;

mod helpers;
use helpers::{harness, inline_file, open_gate, FakeAuth, FakeContent, TestResult};

#[tokio::test]
async fn test_serves_over_tcp_and_stops_on_cancel() -> TestResult {
    let content = FakeContent::new().with_file(
        "octocat/Hello-World/index.html",
        inline_file("index.html", b"<h1>hi</h1>"),
    );
    let h = harness(FakeAuth::new(), content, open_gate());
    let shutdown = h.ctx.shutdown.clone();

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let limits = ServerLimits { max_connections: 8, shutdown_timeout: Duration::from_secs(1) };
    let server = tokio::spawn(serve(listener, h.ctx.clone(), limits));

    let resp = reqwest::get(format!("http://{addr}/octocat/Hello-World/index.html")).await?;
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert_eq!(
        resp.headers().get("content-type").and_then(|v| v.to_str().ok()),
        Some("text/html; charset=utf-8")
    );
    assert_eq!(resp.text().await?, "<h1>hi</h1>");

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/octocat/Hello-World/index.html"))
        .send()
        .await?;
    assert_eq!(resp.status(), reqwest::StatusCode::METHOD_NOT_ALLOWED);

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(3), server).await???;
    Ok(())
}
