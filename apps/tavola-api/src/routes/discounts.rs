//! # Discount Routes
//!
//! Handlers translate JSON to [`DiscountService`](tavola_db::DiscountService)
//! calls and back. Rules live in the service; nothing here decides
//! eligibility or amounts.
//!
//! Bodies are taken as `Result<Json<T>, JsonRejection>` so malformed input
//! still answers with the `{code, message}` error shape.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;
use tavola_core::{
    AppliedDiscount, BestDiscount, Discount, DiscountApplication, DiscountPatch, Eligibility,
    Money, NewDiscount, OrderContext, PromoCode,
};

type Body<T> = Result<Json<T>, JsonRejection>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestDiscountRequest {
    #[serde(flatten)]
    pub context: OrderContext,
    #[serde(default)]
    pub amount: Option<Money>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    #[serde(default)]
    pub amount: Option<Money>,
    #[serde(default)]
    pub customer_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    pub order_id: String,
    #[serde(default)]
    pub customer_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCodeRequest {
    pub customer_id: String,
}

#[derive(Debug, Serialize)]
pub struct PromoCodeResponse {
    pub code: String,
}

// =============================================================================
// CRUD
// =============================================================================

/// GET /discounts
pub async fn list_discounts(State(state): State<AppState>) -> Result<Json<Vec<Discount>>, ApiError> {
    Ok(Json(state.discounts.list_discounts().await?))
}

/// POST /discounts
pub async fn create_discount(
    State(state): State<AppState>,
    body: Body<NewDiscount>,
) -> Result<(StatusCode, Json<Discount>), ApiError> {
    let Json(input) = body?;
    let discount = state.discounts.create_discount(input).await?;
    Ok((StatusCode::CREATED, Json(discount)))
}

/// GET /discounts/{id}
pub async fn get_discount(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Discount>, ApiError> {
    Ok(Json(state.discounts.get_discount(&id).await?))
}

/// GET /discounts/code/{code}
pub async fn get_discount_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Discount>, ApiError> {
    Ok(Json(state.discounts.get_discount_by_code(&code).await?))
}

/// PATCH /discounts/{id}
pub async fn update_discount(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Body<DiscountPatch>,
) -> Result<Json<Discount>, ApiError> {
    let Json(patch) = body?;
    Ok(Json(state.discounts.update_discount(&id, patch).await?))
}

/// DELETE /discounts/{id}
pub async fn delete_discount(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.discounts.delete_discount(&id).await?;
    info!(id = %id, "Discount deleted via API");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Finding, judging, applying
// =============================================================================

/// POST /discounts/find
pub async fn find_discounts(
    State(state): State<AppState>,
    body: Body<OrderContext>,
) -> Result<Json<Vec<Discount>>, ApiError> {
    let Json(ctx) = body?;
    Ok(Json(state.discounts.find_for_order(&ctx).await?))
}

/// POST /discounts/best
pub async fn best_discount(
    State(state): State<AppState>,
    body: Body<BestDiscountRequest>,
) -> Result<Json<BestDiscount>, ApiError> {
    let Json(request) = body?;
    let best = state
        .discounts
        .best_discount(&request.context, request.amount)
        .await?;
    Ok(Json(best))
}

/// POST /discounts/{id}/validate
pub async fn validate_discount(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Body<ValidateRequest>,
) -> Result<Json<Eligibility>, ApiError> {
    let Json(request) = body?;
    let verdict = state
        .discounts
        .validate_discount(&id, request.amount, request.customer_id.as_deref())
        .await?;
    Ok(Json(verdict))
}

/// POST /discounts/{id}/apply
pub async fn apply_discount(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Body<ApplyRequest>,
) -> Result<Json<AppliedDiscount>, ApiError> {
    let Json(request) = body?;
    let applied = state
        .discounts
        .apply_discount(&request.order_id, &id, request.customer_id.as_deref())
        .await?;
    Ok(Json(applied))
}

/// GET /discounts/{id}/applications
pub async fn list_applications(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<DiscountApplication>>, ApiError> {
    Ok(Json(state.discounts.list_applications(&id).await?))
}

// =============================================================================
// Promo codes
// =============================================================================

/// POST /discounts/{id}/promo-codes
pub async fn generate_promo_code(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Body<PromoCodeRequest>,
) -> Result<Json<PromoCodeResponse>, ApiError> {
    let Json(request) = body?;
    let promo = state
        .discounts
        .generate_promo_code(&id, &request.customer_id)
        .await?;
    Ok(Json(PromoCodeResponse { code: promo.code }))
}

/// GET /discounts/{id}/promo-codes
pub async fn list_promo_codes(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<PromoCode>>, ApiError> {
    Ok(Json(state.discounts.list_promo_codes(&id).await?))
}
