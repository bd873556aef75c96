//! Dashboard HTTP server.
//!
//! One route, `GET /`, rendered from state loaded once at startup and shared
//! read-only across requests.

pub mod page;

pub use page::*;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::domain::{OutlierConfig, PriceSeries};
use crate::error::AppError;
use crate::outliers::{OutlierReport, detect_outliers};

/// Data every request reads.
#[derive(Debug)]
pub struct DashboardState {
    pub series: PriceSeries,
    pub years: Vec<i32>,
    pub outliers: OutlierReport,
}

impl DashboardState {
    /// Run outlier detection once over the full series.
    pub fn new(series: PriceSeries, outlier_config: &OutlierConfig) -> Self {
        let outliers = detect_outliers(&series, outlier_config);
        let years = series.years();
        Self { series, years, outliers }
    }
}

pub fn router(state: Arc<DashboardState>) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn dashboard(State(state): State<Arc<DashboardState>>, Query(params): Query<Vec<(String, String)>>) -> Html<String> {
    let selection = Selection::from_query(&params, &state.years);
    tracing::debug!(years = ?selection.years, view = selection.view.key(), "rendering dashboard");
    Html(render_page(&state.series, &state.years, &state.outliers, &selection))
}

/// Bind `host:port` and serve until the process is stopped.
pub async fn serve(state: Arc<DashboardState>, host: &str, port: u16) -> Result<(), AppError> {
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| AppError::new(2, format!("Invalid listen address '{host}:{port}': {e}")))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::new(4, format!("Failed to bind {addr}: {e}")))?;

    tracing::info!(%addr, years = ?state.years, "dashboard listening on http://{addr}/");
    axum::serve(listener, router(state))
        .await
        .map_err(|e| AppError::new(4, format!("Server error: {e}")))
}
