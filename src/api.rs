// 🌐 REST API - the dashboard views as JSON
//
// Every handler locks the shared session, computes its view from scratch
// and wraps it in the common response envelope.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;

use crate::error::DashboardError;
use crate::maintenance::TicketId;
use crate::revenue::Period;
use crate::session::Dashboard;
use crate::stores::StoreId;
use crate::views::TicketView;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    dashboard: Arc<Mutex<Dashboard>>,
}

impl AppState {
    pub fn new(dashboard: Dashboard) -> Self {
        Self {
            dashboard: Arc::new(Mutex::new(dashboard)),
        }
    }

    /// Lock the session, recovering from a panicked handler.
    pub fn lock(&self) -> MutexGuard<'_, Dashboard> {
        self.dashboard.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Response {
        (
            StatusCode::OK,
            Json(Self {
                success: true,
                data: Some(data),
                error: None,
            }),
        )
            .into_response()
    }
}

fn error_response(err: DashboardError) -> Response {
    let status = match err {
        DashboardError::TicketNotFound(_) => StatusCode::NOT_FOUND,
        DashboardError::TicketAlreadyResolved(_) => StatusCode::CONFLICT,
        DashboardError::UnknownStore(_)
        | DashboardError::UnknownPeriod(_)
        | DashboardError::InvalidTicketId(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    tracing::warn!(%status, "Request failed: {}", err);
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(err.to_string()),
        }),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
struct OverviewQuery {
    period: Option<String>,
    store: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RevenueQuery {
    period: Option<String>,
}

fn parse_period(raw: Option<&str>) -> Result<Period, DashboardError> {
    raw.map_or(Ok(Period::Daily), |p| p.parse())
}

fn default_store(dashboard: &Dashboard, raw: Option<&str>) -> Result<StoreId, DashboardError> {
    match raw {
        Some(raw) => dashboard.resolve_store(raw),
        None => dashboard
            .catalog()
            .stores()
            .first()
            .cloned()
            .ok_or_else(|| DashboardError::UnknownStore(String::new())),
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    ApiResponse::ok("OK")
}

/// GET /api/stores - Configured stores and their products
async fn list_stores(State(state): State<AppState>) -> Response {
    let dashboard = state.lock();
    ApiResponse::ok(dashboard.catalog().summaries())
}

/// GET /api/overview?period=Weekly&store=ShopA - Revenue chart + product share
async fn overview(State(state): State<AppState>, Query(query): Query<OverviewQuery>) -> Response {
    let dashboard = state.lock();

    let period = match parse_period(query.period.as_deref()) {
        Ok(period) => period,
        Err(e) => return error_response(e),
    };
    let store = match default_store(&dashboard, query.store.as_deref()) {
        Ok(store) => store,
        Err(e) => return error_response(e),
    };

    ApiResponse::ok(dashboard.overview(period, &store))
}

/// GET /api/revenue?period=Monthly - Period-bucketed revenue per store
async fn revenue(State(state): State<AppState>, Query(query): Query<RevenueQuery>) -> Response {
    let dashboard = state.lock();

    match parse_period(query.period.as_deref()) {
        Ok(period) => ApiResponse::ok(dashboard.revenue(period)),
        Err(e) => error_response(e),
    }
}

/// GET /api/stores/:store/products - Product share for one store
async fn store_products(State(state): State<AppState>, Path(store): Path<String>) -> Response {
    let dashboard = state.lock();

    match dashboard.resolve_store(&store) {
        Ok(store) => ApiResponse::ok(dashboard.product_share(&store)),
        Err(e) => error_response(e),
    }
}

/// GET /api/stores/:store - Revenue records and utility usage for one store
async fn store_details(State(state): State<AppState>, Path(store): Path<String>) -> Response {
    let dashboard = state.lock();

    match dashboard.resolve_store(&store) {
        Ok(store) => ApiResponse::ok(dashboard.store_details(&store)),
        Err(e) => error_response(e),
    }
}

/// GET /api/maintenance/pending - Stores requiring attention
async fn pending_tickets(State(state): State<AppState>) -> Response {
    let dashboard = state.lock();
    ApiResponse::ok(dashboard.maintenance_alerts())
}

/// POST /api/maintenance/:id/resolve - Mark a ticket as done
async fn resolve_ticket(State(state): State<AppState>, Path(raw_id): Path<String>) -> Response {
    let id: TicketId = match raw_id.parse() {
        Ok(id) => id,
        Err(e) => return error_response(e),
    };
    let mut dashboard = state.lock();

    match dashboard.resolve_ticket(id) {
        Ok(ticket) => ApiResponse::ok(TicketView::new(id, &ticket)),
        Err(e) => error_response(e),
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/stores", get(list_stores))
        .route("/stores/:store", get(store_details))
        .route("/stores/:store/products", get(store_products))
        .route("/overview", get(overview))
        .route("/revenue", get(revenue))
        .route("/maintenance/pending", get(pending_tickets))
        .route("/maintenance/:id/resolve", post(resolve_ticket))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}
