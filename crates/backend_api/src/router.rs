use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{handlers, repository::PlanRepository};

/// Create the main application router with all API endpoints
pub fn create_router(repo: Arc<dyn PlanRepository>) -> Router {
    // Create CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Allocation plan
        .route("/api/users/:user_id/plan", get(handlers::get_plan))
        .route(
            "/api/users/:user_id/plan/extra-payment",
            post(handlers::post_extra_payment),
        )
        .route(
            "/api/users/:user_id/plan/emergency-fund",
            post(handlers::post_emergency_fund),
        )
        .route(
            "/api/users/:user_id/plan/baseline",
            post(handlers::post_baseline),
        )
        // Bill payment toggles
        .route(
            "/api/users/:user_id/bill-payments/:payment_id",
            patch(handlers::patch_bill_payment),
        )
        // Debts
        .route(
            "/api/users/:user_id/debts",
            get(handlers::list_debts).post(handlers::create_debt),
        )
        .route("/api/users/:user_id/debts/:debt_id", get(handlers::get_debt))
        .route(
            "/api/users/:user_id/debts/:debt_id/payments",
            post(handlers::post_debt_payment),
        )
        .route(
            "/api/users/:user_id/debts/:debt_id/schedule",
            post(handlers::post_schedule),
        )
        // Bills
        .route(
            "/api/users/:user_id/bills",
            get(handlers::list_bills).post(handlers::create_bill),
        )
        // Savings goals
        .route(
            "/api/users/:user_id/goals",
            get(handlers::list_goals).post(handlers::create_goal),
        )
        // Add shared state
        .with_state(repo)
        // Add middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
