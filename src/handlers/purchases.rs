// src/handlers/purchases.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        sections::{Compras, RequireSection},
        tenancy::CompanyContext,
    },
    models::purchases::{PaymentWeek, PaymentWeekPayload, Purchase, PurchasePayload, WeekDetail, WeekFilter, YearGroup},
};

#[utoipa::path(
    get,
    path = "/api/purchases/weeks",
    tag = "Purchases",
    responses((status = 200, description = "Semanas agrupadas por ano e mês, mais recentes primeiro", body = Vec<YearGroup>)),
    params(
        WeekFilter,
        ("x-company-id" = Uuid, Header, description = "ID da empresa ativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_weeks(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    _guard: RequireSection<Compras>,
    Query(filter): Query<WeekFilter>,
) -> Result<impl IntoResponse, AppError> {
    let groups = app_state.purchase_service.list_weeks(ctx.company_id, &filter).await?;
    Ok((StatusCode::OK, Json(groups)))
}

#[utoipa::path(
    post,
    path = "/api/purchases/weeks",
    tag = "Purchases",
    request_body = PaymentWeekPayload,
    responses(
        (status = 201, description = "Semana aberta (a data vira a segunda-feira)", body = PaymentWeek),
        (status = 409, description = "Semana já existe")
    ),
    params(("x-company-id" = Uuid, Header, description = "ID da empresa ativa")),
    security(("api_jwt" = []))
)]
pub async fn create_week(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    _guard: RequireSection<Compras>,
    Json(payload): Json<PaymentWeekPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let week = app_state.purchase_service.create_week(ctx.company_id, payload.date).await?;
    Ok((StatusCode::CREATED, Json(week)))
}

#[utoipa::path(
    get,
    path = "/api/purchases/weeks/{week_id}",
    tag = "Purchases",
    responses(
        (status = 200, description = "Compras da semana com o total", body = WeekDetail),
        (status = 404, description = "Semana não encontrada")
    ),
    params(
        ("week_id" = Uuid, Path, description = "ID da semana"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa ativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn week_detail(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    _guard: RequireSection<Compras>,
    Path(week_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = app_state.purchase_service.week_detail(ctx.company_id, week_id).await?;
    Ok((StatusCode::OK, Json(detail)))
}

#[utoipa::path(
    post,
    path = "/api/purchases",
    tag = "Purchases",
    request_body = PurchasePayload,
    responses(
        (status = 201, description = "Compra registrada", body = Purchase),
        (status = 400, description = "Semana, obra, rubro, subrubro ou fornecedor inválidos")
    ),
    params(("x-company-id" = Uuid, Header, description = "ID da empresa ativa")),
    security(("api_jwt" = []))
)]
pub async fn create_purchase(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    _guard: RequireSection<Compras>,
    Json(payload): Json<PurchasePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let purchase = app_state.purchase_service.create_purchase(ctx.company_id, payload).await?;
    Ok((StatusCode::CREATED, Json(purchase)))
}
