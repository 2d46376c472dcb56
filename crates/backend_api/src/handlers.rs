use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

use models::PaymentStatus;

use crate::repository::{
    CreateBillInput, CreateDebtInput, CreateGoalInput, DebtPaymentInput, PlanRepository,
    RegenerateScheduleInput,
};
use crate::Result;

pub type RepositoryState = Arc<dyn PlanRepository>;

#[derive(Debug, Deserialize)]
pub struct PlanQuery {
    pub date: Option<NaiveDate>,
}

/// GET /api/users/:user_id/plan
/// Returns the allocation plan for the period containing `date` (or today).
pub async fn get_plan(
    State(repo): State<RepositoryState>,
    Path(user_id): Path<String>,
    Query(query): Query<PlanQuery>,
) -> Result<impl IntoResponse> {
    let plan = repo.plan_for(&user_id, query.date).await?;
    Ok(Json(plan))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkPaymentRequest {
    pub status: PaymentStatus,
}

/// PATCH /api/users/:user_id/bill-payments/:payment_id
/// Toggles a bill payment between PAID and UNPAID, cascading into the debt
/// ledger for debt-linked bills.
pub async fn patch_bill_payment(
    State(repo): State<RepositoryState>,
    Path((user_id, payment_id)): Path<(String, String)>,
    Json(body): Json<MarkPaymentRequest>,
) -> Result<impl IntoResponse> {
    let result = repo.mark_payment(&user_id, &payment_id, body.status).await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraPaymentRequest {
    pub debt_id: String,
    pub amount: f64,
}

/// POST /api/users/:user_id/plan/extra-payment
/// Records the avalanche extra payment against a debt.
pub async fn post_extra_payment(
    State(repo): State<RepositoryState>,
    Path(user_id): Path<String>,
    Json(body): Json<ExtraPaymentRequest>,
) -> Result<impl IntoResponse> {
    let result = repo
        .record_extra_payment(&user_id, &body.debt_id, body.amount)
        .await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "newBalance": result.new_balance,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyFundRequest {
    pub amount: f64,
}

/// POST /api/users/:user_id/plan/emergency-fund
/// Adds to the emergency fund goal, creating it if absent.
pub async fn post_emergency_fund(
    State(repo): State<RepositoryState>,
    Path(user_id): Path<String>,
    Json(body): Json<EmergencyFundRequest>,
) -> Result<impl IntoResponse> {
    let new_amount = repo.update_emergency_fund(&user_id, body.amount).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "newAmount": new_amount,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineRequest {
    #[serde(default)]
    pub preserve_start_date: bool,
}

/// POST /api/users/:user_id/plan/baseline
/// Re-syncs the payoff baseline to the current debt total.
pub async fn post_baseline(
    State(repo): State<RepositoryState>,
    Path(user_id): Path<String>,
    Json(body): Json<BaselineRequest>,
) -> Result<impl IntoResponse> {
    let result = repo
        .recalculate_baseline(&user_id, body.preserve_start_date)
        .await?;
    Ok(Json(result))
}

/// GET /api/users/:user_id/debts
pub async fn list_debts(
    State(repo): State<RepositoryState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse> {
    let debts = repo.list_debts(&user_id).await?;
    Ok(Json(debts))
}

/// POST /api/users/:user_id/debts
pub async fn create_debt(
    State(repo): State<RepositoryState>,
    Path(user_id): Path<String>,
    Json(body): Json<CreateDebtInput>,
) -> Result<impl IntoResponse> {
    let debt = repo.create_debt(&user_id, body).await?;
    Ok(Json(debt))
}

/// GET /api/users/:user_id/debts/:debt_id
/// Returns the debt with its ledger, schedule, and payoff projection.
pub async fn get_debt(
    State(repo): State<RepositoryState>,
    Path((user_id, debt_id)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    let detail = repo.get_debt(&user_id, &debt_id).await?;
    Ok(Json(detail))
}

/// POST /api/users/:user_id/debts/:debt_id/payments
pub async fn post_debt_payment(
    State(repo): State<RepositoryState>,
    Path((user_id, debt_id)): Path<(String, String)>,
    Json(body): Json<DebtPaymentInput>,
) -> Result<impl IntoResponse> {
    let payment = repo.record_debt_payment(&user_id, &debt_id, body).await?;
    Ok(Json(payment))
}

/// POST /api/users/:user_id/debts/:debt_id/schedule
/// Regenerates a BNPL installment schedule from new terms.
pub async fn post_schedule(
    State(repo): State<RepositoryState>,
    Path((user_id, debt_id)): Path<(String, String)>,
    Json(body): Json<RegenerateScheduleInput>,
) -> Result<impl IntoResponse> {
    let debt = repo.regenerate_schedule(&user_id, &debt_id, body).await?;
    Ok(Json(debt))
}

/// GET /api/users/:user_id/bills
pub async fn list_bills(
    State(repo): State<RepositoryState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse> {
    let bills = repo.list_bills(&user_id).await?;
    Ok(Json(bills))
}

/// POST /api/users/:user_id/bills
pub async fn create_bill(
    State(repo): State<RepositoryState>,
    Path(user_id): Path<String>,
    Json(body): Json<CreateBillInput>,
) -> Result<impl IntoResponse> {
    let bill = repo.create_bill(&user_id, body).await?;
    Ok(Json(bill))
}

/// GET /api/users/:user_id/goals
pub async fn list_goals(
    State(repo): State<RepositoryState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse> {
    let goals = repo.list_goals(&user_id).await?;
    Ok(Json(goals))
}

/// POST /api/users/:user_id/goals
pub async fn create_goal(
    State(repo): State<RepositoryState>,
    Path(user_id): Path<String>,
    Json(body): Json<CreateGoalInput>,
) -> Result<impl IntoResponse> {
    let goal = repo.create_goal(&user_id, body).await?;
    Ok(Json(goal))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "paycheck-plan-api"
    }))
}
