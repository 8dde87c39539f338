use github_proxy_lib::config::{load_from_path, parse_config, read_from_path, validate, Config};
use github_proxy_lib::ProxyError;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

mod helpers;
use helpers::TestResult;

fn write_config(toml: &str) -> Result<NamedTempFile, std::io::Error> {
    let mut file = NamedTempFile::new()?;
    file.write_all(toml.as_bytes())?;
    Ok(file)
}

#[test]
fn test_loads_minimal_config_with_defaults() -> TestResult {
    let file = write_config(
        r#"
[github]
client_id = "Iv1.abc123"
installation_id = "4242"
"#,
    )?;

    let cfg = load_from_path(file.path())?;

    assert_eq!(cfg.listen.to_string(), "0.0.0.0:8080");
    assert_eq!(cfg.github.api_url, "https://api.github.com");
    assert!(cfg.github.private_key_path.is_none());
    assert_eq!(cfg.security.max_connections, 512);
    assert_eq!(cfg.security.rate_limit.client_burst, 8);
    assert_eq!(cfg.security.rate_limit.client_requests_per_minute, 60);
    assert_eq!(cfg.security.rate_limit.idle_ttl_secs, 1800);
    assert_eq!(cfg.security.rate_limit.sweep_interval_secs, 1800);
    assert_eq!(cfg.credential.safety_margin_secs, 180);
    assert_eq!(cfg.content.inline_threshold_bytes, 1024 * 1024);
    assert_eq!(cfg.timeout.upstream_ms, 10_000);
    assert_eq!(cfg.timeout.shutdown_secs, 5);
    assert_eq!(cfg.logging.level, "info");
    assert!(cfg.telemetry.metrics_port.is_none());
    Ok(())
}

#[test]
fn test_loads_full_config() -> TestResult {
    let file = write_config(
        r#"
listen = "127.0.0.1:9000"

[github]
api_url = "https://github.example.com/api/v3"
client_id = "Iv1.abc123"
installation_id = "4242"
private_key_path = "/etc/github-proxy/app.pem"

[credential]
safety_margin_secs = 300

[content]
inline_threshold_bytes = 65536

[security]
max_connections = 64

[security.rate_limit]
client_burst = 20
client_requests_per_minute = 120
idle_ttl_secs = 600
sweep_interval_secs = 60

[timeout]
upstream_ms = 2500
shutdown_secs = 15

[logging]
level = "debug"
show_target = true

[telemetry]
metrics_port = 9090
"#,
    )?;

    let cfg = load_from_path(file.path())?;

    assert_eq!(cfg.listen.port(), 9000);
    assert_eq!(cfg.github.api_url, "https://github.example.com/api/v3");
    assert_eq!(cfg.github.private_key_path, Some(PathBuf::from("/etc/github-proxy/app.pem")));
    assert_eq!(cfg.credential.safety_margin().as_secs(), 300);
    assert_eq!(cfg.content.inline_threshold_bytes, 65536);
    assert_eq!(cfg.security.max_connections, 64);
    assert_eq!(cfg.security.rate_limit.client_burst, 20);
    assert_eq!(cfg.security.rate_limit.sweep_interval().as_secs(), 60);
    assert_eq!(cfg.timeout.upstream().as_millis(), 2500);
    assert!(cfg.logging.show_target);
    assert_eq!(cfg.telemetry.metrics_port, Some(9090));
    Ok(())
}

#[test]
fn test_missing_identity_fails_validation() -> TestResult {
    let file = write_config("listen = \"127.0.0.1:9000\"\n")?;

    // Reading alone succeeds so CLI flags can fill the gaps.
    let mut cfg = read_from_path(file.path())?;
    assert!(matches!(validate(&cfg), Err(ProxyError::Config(_))));
    assert!(matches!(load_from_path(file.path()), Err(ProxyError::Config(_))));

    cfg.github.client_id = "Iv1.abc123".to_string();
    cfg.github.installation_id = "4242".to_string();
    validate(&cfg)?;
    Ok(())
}

#[test]
fn test_invalid_listen_address_is_rejected() {
    let result = parse_config("listen = \"not-an-address\"\n");
    assert!(matches!(result, Err(ProxyError::Config(_))));
}

#[test]
fn test_zero_rate_limits_are_rejected() {
    let mut cfg = Config::default();
    cfg.github.client_id = "Iv1.abc123".to_string();
    cfg.github.installation_id = "4242".to_string();
    cfg.security.rate_limit.client_burst = 0;
    assert!(validate(&cfg).is_err());

    cfg.security.rate_limit.client_burst = 8;
    cfg.security.rate_limit.client_requests_per_minute = 0;
    assert!(validate(&cfg).is_err());
}

#[test]
fn test_missing_file_is_config_error() {
    let result = load_from_path("/nonexistent/github-proxy.toml");
    assert!(matches!(result, Err(ProxyError::Config(_))));
}
