// src/handlers/budgets.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        sections::{Presupuestos, RequireSection},
        tenancy::CompanyContext,
    },
    models::budget::{Budget, BudgetBreakdown, BudgetItem, BudgetItemPayload, BudgetPayload, BudgetSummary},
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct BudgetFilter {
    /// `true` só ativos, `false` só inativos; ausente traz todos.
    pub active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct BreakdownFilter {
    /// Quebra por subrubro deste rubro.
    pub trade_id: Option<Uuid>,
}

#[utoipa::path(
    get,
    path = "/api/budgets",
    tag = "Budgets",
    responses((status = 200, description = "Presupuestos da empresa", body = Vec<Budget>)),
    params(
        BudgetFilter,
        ("x-company-id" = Uuid, Header, description = "ID da empresa ativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_budgets(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    _guard: RequireSection<Presupuestos>,
    Query(filter): Query<BudgetFilter>,
) -> Result<impl IntoResponse, AppError> {
    let budgets = app_state.budget_service.list_budgets(ctx.company_id, filter.active).await?;
    Ok((StatusCode::OK, Json(budgets)))
}

#[utoipa::path(
    post,
    path = "/api/budgets",
    tag = "Budgets",
    request_body = BudgetPayload,
    responses(
        (status = 201, description = "Presupuesto criado", body = Budget),
        (status = 400, description = "Obra, lote ou tipo de dólar inválidos")
    ),
    params(("x-company-id" = Uuid, Header, description = "ID da empresa ativa")),
    security(("api_jwt" = []))
)]
pub async fn create_budget(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    _guard: RequireSection<Presupuestos>,
    Json(payload): Json<BudgetPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let budget = app_state.budget_service.create_budget(ctx.company_id, payload).await?;
    Ok((StatusCode::CREATED, Json(budget)))
}

#[utoipa::path(
    get,
    path = "/api/budgets/{budget_id}",
    tag = "Budgets",
    responses(
        (status = 200, description = "Resumo com itens custeados e totais", body = BudgetSummary),
        (status = 404, description = "Presupuesto não encontrado")
    ),
    params(
        ("budget_id" = Uuid, Path, description = "ID do presupuesto"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa ativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn budget_summary(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    _guard: RequireSection<Presupuestos>,
    Path(budget_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let summary = app_state.budget_service.summary(ctx.company_id, budget_id).await?;
    Ok((StatusCode::OK, Json(summary)))
}

#[utoipa::path(
    post,
    path = "/api/budgets/{budget_id}/toggle",
    tag = "Budgets",
    responses(
        (status = 200, description = "Estado ativo invertido", body = Budget),
        (status = 404, description = "Presupuesto não encontrado")
    ),
    params(
        ("budget_id" = Uuid, Path, description = "ID do presupuesto"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa ativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn toggle_budget(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    _guard: RequireSection<Presupuestos>,
    Path(budget_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let budget = app_state.budget_service.toggle_active(ctx.company_id, budget_id).await?;
    Ok((StatusCode::OK, Json(budget)))
}

#[utoipa::path(
    post,
    path = "/api/budgets/{budget_id}/items",
    tag = "Budgets",
    request_body = BudgetItemPayload,
    responses(
        (status = 201, description = "Item adicionado", body = BudgetItem),
        (status = 400, description = "Tarefa de outro lote ou quantidade inválida"),
        (status = 404, description = "Presupuesto não encontrado")
    ),
    params(
        ("budget_id" = Uuid, Path, description = "ID do presupuesto"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa ativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_item(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    _guard: RequireSection<Presupuestos>,
    Path(budget_id): Path<Uuid>,
    Json(payload): Json<BudgetItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let item = app_state.budget_service.add_item(ctx.company_id, budget_id, payload).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[utoipa::path(
    delete,
    path = "/api/budgets/{budget_id}/items/{item_id}",
    tag = "Budgets",
    responses(
        (status = 204, description = "Item removido"),
        (status = 404, description = "Presupuesto ou item não encontrado")
    ),
    params(
        ("budget_id" = Uuid, Path, description = "ID do presupuesto"),
        ("item_id" = Uuid, Path, description = "ID do item"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa ativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_item(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    _guard: RequireSection<Presupuestos>,
    Path((budget_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    app_state.budget_service.delete_item(ctx.company_id, budget_id, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/budgets/{budget_id}/breakdown",
    tag = "Budgets",
    responses(
        (status = 200, description = "Quebra por rubro (ou por subrubro com tradeId)", body = BudgetBreakdown),
        (status = 404, description = "Presupuesto não encontrado")
    ),
    params(
        ("budget_id" = Uuid, Path, description = "ID do presupuesto"),
        BreakdownFilter,
        ("x-company-id" = Uuid, Header, description = "ID da empresa ativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn budget_breakdown(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    _guard: RequireSection<Presupuestos>,
    Path(budget_id): Path<Uuid>,
    Query(filter): Query<BreakdownFilter>,
) -> Result<impl IntoResponse, AppError> {
    let breakdown = app_state
        .budget_service
        .breakdown(ctx.company_id, budget_id, filter.trade_id)
        .await?;
    Ok((StatusCode::OK, Json(breakdown)))
}
