use github_proxy_lib::auth::AuthError;
use github_proxy_lib::CredentialCache;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;

mod helpers;
use helpers::{FakeAuth, TestResult, SAFETY_MARGIN};

#[tokio::test]
async fn test_cached_token_is_reused() -> TestResult {
    let auth = Arc::new(FakeAuth::new());
    let cache = CredentialCache::new(auth.clone(), SAFETY_MARGIN);

    let first = cache.get().await?;
    let second = cache.get().await?;

    assert_eq!(first, second);
    assert_eq!(auth.mints(), 1);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_gets_mint_once() -> TestResult {
    let auth = Arc::new(FakeAuth::new().with_delay(Duration::from_millis(50)));
    let cache = Arc::new(CredentialCache::new(auth.clone(), SAFETY_MARGIN));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get().await })
        })
        .collect();

    let mut tokens = Vec::with_capacity(handles.len());
    for handle in handles {
        tokens.push(handle.await??);
    }

    assert_eq!(auth.mints(), 1);
    assert!(tokens.iter().all(|t| t == &tokens[0]));
    Ok(())
}

#[tokio::test]
async fn test_failed_mint_leaves_cache_unchanged() -> TestResult {
    let auth = Arc::new(FakeAuth::failing());
    let cache = CredentialCache::new(auth.clone(), SAFETY_MARGIN);

    assert_eq!(cache.get().await, Err(AuthError::Status(401)));
    assert!(cache.current().is_none());
    assert!(!cache.is_valid());

    // No backoff: the next caller tries again straight away.
    assert!(cache.get().await.is_err());
    assert_eq!(auth.mints(), 2);
    Ok(())
}

#[tokio::test]
async fn test_returned_token_outlives_safety_margin() -> TestResult {
    let auth = Arc::new(FakeAuth::new());
    let cache = CredentialCache::new(auth, SAFETY_MARGIN);

    let token = cache.get().await?;
    let returned_at = OffsetDateTime::now_utc();
    let credential = cache.current().ok_or("credential missing after get")?;

    assert_eq!(credential.token(), token);
    assert!(credential.expires_at() - returned_at >= time::Duration::seconds(180));
    assert_eq!(credential.expires_at() - credential.effective_expiry(), time::Duration::seconds(180));
    assert!(cache.is_valid());
    Ok(())
}

#[tokio::test]
async fn test_token_inside_margin_is_renewed_on_next_get() -> TestResult {
    let auth = Arc::new(FakeAuth::new().with_ttl(time::Duration::minutes(2)));
    let cache = CredentialCache::new(auth.clone(), SAFETY_MARGIN);

    let first = cache.get().await?;
    assert!(!cache.is_valid());
    let second = cache.get().await?;

    assert_ne!(first, second);
    assert_eq!(auth.mints(), 2);
    Ok(())
}
