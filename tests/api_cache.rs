//! Integration tests for forecast cache behavior through the full `app()`,
//! with the synthetic trend source (`TRENDS_TEST_MODE=mock`).
//!
//! Covered (strict):
//! - MISS → HIT for the same keyword (via `X-Forecast-Cache` header)
//! - periods is not part of the cache key
//! - Expiration/TTL driven by `FORECAST_CACHE_TTL_MS` env (short TTL for determinism)
//! - no-data and upstream failures are never cached
//!
//! Endpoint: GET /forecast/{keyword}?periods=N

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use once_cell::sync::Lazy;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::sleep;
use tower::ServiceExt; // for oneshot

// --- Global serialization of tests that mutate env ---
static TEST_GUARD: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

fn guarded_lock<'a>() -> std::sync::MutexGuard<'a, ()> {
    match TEST_GUARD.lock() {
        Ok(g) => g,
        Err(poison) => poison.into_inner(),
    }
}

async fn build_app() -> Router {
    trend_forecaster::app()
        .await
        .expect("app() should build Router in tests")
}

/// Helper: GET /forecast/{keyword}. Returns (status, headers).
async fn get_forecast(app: &Router, keyword: &str, periods: u32) -> (StatusCode, HeaderMap) {
    let req = Request::builder()
        .method("GET")
        .uri(format!("/forecast/{keyword}?periods={periods}"))
        .body(Body::empty())
        .expect("request build");

    let resp = app.clone().oneshot(req).await.expect("router response");
    (resp.status(), resp.headers().clone())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CacheDetect {
    Hit,
    Miss,
}

fn header_cache_signal(headers: &HeaderMap) -> CacheDetect {
    let v = headers
        .get("X-Forecast-Cache")
        .expect("X-Forecast-Cache header must be present")
        .to_str()
        .expect("X-Forecast-Cache header must be valid ASCII")
        .trim()
        .to_ascii_uppercase();
    match v.as_str() {
        "HIT" => CacheDetect::Hit,
        "MISS" => CacheDetect::Miss,
        other => panic!("X-Forecast-Cache must be HIT or MISS, got: {other}"),
    }
}

/// Mock source, no throttle, and two special keywords.
fn set_common_env() {
    std::env::set_var("TRENDS_TEST_MODE", "mock");
    std::env::set_var("FORECAST_RETRY_BASE_MS", "0");
    std::env::set_var("TRENDS_MOCK_EMPTY", "zzqxv");
    std::env::set_var("TRENDS_MOCK_FAIL", "flaky");
    std::env::remove_var("FORECAST_CONFIG_PATH");
}

/// Sleep noticeably longer than TTL to avoid boundary flakes.
async fn sleep_over_ttl(ttl_ms: u64) {
    sleep(Duration::from_millis(ttl_ms.saturating_mul(5))).await;
}

fn unique_keyword(tag: &str) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_millis(0))
        .as_nanos();
    format!("{tag}-{now}")
}

// --- TESTS ---

#[tokio::test]
async fn cache_miss_then_hit_for_same_keyword() {
    let _lock = guarded_lock();
    set_common_env();
    std::env::set_var("FORECAST_CACHE_TTL_MS", "30000");

    let app = build_app().await;
    let kw = unique_keyword("miss-then-hit");

    let (s1, h1) = get_forecast(&app, &kw, 30).await;
    assert_eq!(s1, StatusCode::OK);
    assert_eq!(header_cache_signal(&h1), CacheDetect::Miss, "first request should be MISS");

    let (s2, h2) = get_forecast(&app, &kw, 30).await;
    assert_eq!(s2, StatusCode::OK);
    assert_eq!(header_cache_signal(&h2), CacheDetect::Hit, "second request should be HIT");
}

#[tokio::test]
async fn changing_periods_still_hits() {
    let _lock = guarded_lock();
    set_common_env();
    std::env::set_var("FORECAST_CACHE_TTL_MS", "30000");

    let app = build_app().await;
    let kw = unique_keyword("periods");

    let (_, h1) = get_forecast(&app, &kw, 30).await;
    assert_eq!(header_cache_signal(&h1), CacheDetect::Miss);

    let (_, h2) = get_forecast(&app, &kw, 90).await;
    assert_eq!(
        header_cache_signal(&h2),
        CacheDetect::Hit,
        "periods is not part of the cache key"
    );

    // a different keyword is its own entry
    let (_, h3) = get_forecast(&app, &format!("{kw}x"), 30).await;
    assert_eq!(header_cache_signal(&h3), CacheDetect::Miss);
}

#[tokio::test]
async fn cache_expires_after_ttl_and_turns_into_miss_again() {
    let _lock = guarded_lock();
    set_common_env();

    // Use a short TTL to prove expiration deterministically
    const TTL_MS: u64 = 50;
    std::env::set_var("FORECAST_CACHE_TTL_MS", TTL_MS.to_string());

    let app = build_app().await;
    let kw = unique_keyword("ttl-expiry");

    let (_, h1) = get_forecast(&app, &kw, 30).await;
    assert_eq!(header_cache_signal(&h1), CacheDetect::Miss, "first call should be MISS");

    let (_, h2) = get_forecast(&app, &kw, 30).await;
    assert_eq!(header_cache_signal(&h2), CacheDetect::Hit, "second immediate call should be HIT");

    // Wait well over TTL, then expect MISS again (absolute TTL, no sliding refresh)
    sleep_over_ttl(TTL_MS).await;

    let (_, h3) = get_forecast(&app, &kw, 30).await;
    assert_eq!(
        header_cache_signal(&h3),
        CacheDetect::Miss,
        "after TTL expiration, identical request must be MISS"
    );

    let (_, h4) = get_forecast(&app, &kw, 30).await;
    assert_eq!(
        header_cache_signal(&h4),
        CacheDetect::Hit,
        "immediately after refreshed compute, the next call must be HIT"
    );
}

#[tokio::test]
async fn failures_are_never_cached() {
    let _lock = guarded_lock();
    set_common_env();
    std::env::set_var("FORECAST_CACHE_TTL_MS", "30000");

    let app = build_app().await;

    for kw in ["zzqxv", "flaky"] {
        for _ in 0..2 {
            let (status, headers) = get_forecast(&app, kw, 30).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(
                header_cache_signal(&headers),
                CacheDetect::Miss,
                "'{kw}' must not be served from cache"
            );
        }
    }
}
