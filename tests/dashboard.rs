//! Dashboard router exercised in-process with `oneshot`.

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use hotel_prices::data::{SampleConfig, generate_series};
use hotel_prices::domain::OutlierConfig;
use hotel_prices::web::{DashboardState, router};

async fn fetch(uri: &str) -> (StatusCode, String) {
    let series = generate_series(&SampleConfig {
        days: 4 * 365,
        noise_std: 0.8,
        ..SampleConfig::default()
    })
    .unwrap();
    let state = Arc::new(DashboardState::new(series, &OutlierConfig::default()));
    let response = router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn serves_overlay_by_default() {
    let (status, body) = fetch("/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Year-over-Year Price Comparison (Overlay by Day of Year)"));
    assert!(body.matches("<svg").count() >= 3);
    assert!(body.contains("Price Volatility Comparison"));
}

#[tokio::test]
async fn empty_year_selection_renders_placeholder() {
    let (status, body) = fetch("/?view=weekly&submitted=1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Please select at least one year"));
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (status, _) = fetch("/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
