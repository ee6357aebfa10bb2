// Expense Tracker - REST API with Axum

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::db::ExpenseContext;
use crate::expense::{Expense, NewExpense};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub expenses: ExpenseContext,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Expense {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Store(#[from] crate::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Store(e) => {
                error!(error = %e, "expense store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: crate::VERSION,
    })
}

/// GET /api/expenses - Get all expenses
async fn list_expenses(State(state): State<AppState>) -> Result<Json<Vec<Expense>>, ApiError> {
    let expenses = state.expenses.list()?;
    Ok(Json(expenses))
}

/// GET /api/expenses/:id - Get one expense
async fn get_expense(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Expense>, ApiError> {
    state
        .expenses
        .find(id)?
        .map(Json)
        .ok_or(ApiError::NotFound(id))
}

/// POST /api/expenses - Create an expense
async fn create_expense(
    State(state): State<AppState>,
    Json(payload): Json<NewExpense>,
) -> Result<impl IntoResponse, ApiError> {
    let expense = state.expenses.add(&payload)?;
    info!(id = expense.id, "created expense");

    let location = expense_location(expense.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(expense)))
}

/// Path at which a stored expense can be fetched.
pub fn expense_location(id: i64) -> String {
    format!("/api/expenses/{id}")
}

/// Build the application router, with every route under `/api`.
pub fn router(expenses: ExpenseContext) -> Router {
    let state = AppState { expenses };

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/expenses", get(list_expenses).post(create_expense))
        .route("/expenses/:id", get(get_expense))
        .with_state(state);

    Router::new().nest("/api", api_routes).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    )
}
