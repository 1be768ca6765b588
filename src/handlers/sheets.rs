// src/handlers/sheets.rs

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
    models::sheets::{MixtureDetail, Mixture, MixturePayload, PriceSheet, SheetKind, SheetLine, SheetLinePayload},
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct MixtureFilter {
    /// Só as mezclas vinculadas a esta hoja de materiais.
    pub sheet_id: Option<Uuid>,
}

// =============================================================================
//  1. HOJAS DE PRECIOS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/sheets/{kind}",
    tag = "Sheets",
    responses((status = 200, description = "Hojas do tipo pedido", body = Vec<PriceSheet>)),
    params(
        ("kind" = SheetKind, Path, description = "materials | labor | subcontracts"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa ativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_sheets(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    Path(kind): Path<SheetKind>,
) -> Result<impl IntoResponse, AppError> {
    let sheets = app_state.sheet_service.list_sheets(ctx.company_id, kind).await?;
    Ok((StatusCode::OK, Json(sheets)))
}

#[utoipa::path(
    get,
    path = "/api/sheets/{kind}/{sheet_id}/lines",
    tag = "Sheets",
    responses(
        (status = 200, description = "Linhas da hoja", body = Vec<SheetLine>),
        (status = 404, description = "Hoja não encontrada")
    ),
    params(
        ("kind" = SheetKind, Path, description = "materials | labor | subcontracts"),
        ("sheet_id" = Uuid, Path, description = "ID da hoja"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa ativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_lines(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    Path((kind, sheet_id)): Path<(SheetKind, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let lines = app_state.sheet_service.list_lines(ctx.company_id, kind, sheet_id).await?;
    Ok((StatusCode::OK, Json(lines)))
}

#[utoipa::path(
    put,
    path = "/api/sheets/{kind}/{sheet_id}/lines",
    tag = "Sheets",
    request_body = SheetLinePayload,
    responses(
        (status = 200, description = "Preço gravado; devolve a hoja atualizada", body = Vec<SheetLine>),
        (status = 400, description = "Recurso de outra empresa"),
        (status = 404, description = "Hoja não encontrada")
    ),
    params(
        ("kind" = SheetKind, Path, description = "materials | labor | subcontracts"),
        ("sheet_id" = Uuid, Path, description = "ID da hoja"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa ativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn upsert_line(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    _guard: RequireSection<Presupuestos>,
    Path((kind, sheet_id)): Path<(SheetKind, Uuid)>,
    Json(payload): Json<SheetLinePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let lines = app_state
        .sheet_service
        .upsert_line(ctx.company_id, kind, sheet_id, payload)
        .await?;
    Ok((StatusCode::OK, Json(lines)))
}

// =============================================================================
//  2. MEZCLAS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/mixtures",
    tag = "Sheets",
    responses((status = 200, description = "Mezclas da empresa", body = Vec<Mixture>)),
    params(
        MixtureFilter,
        ("x-company-id" = Uuid, Header, description = "ID da empresa ativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_mixtures(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    Query(filter): Query<MixtureFilter>,
) -> Result<impl IntoResponse, AppError> {
    let mixtures = app_state.sheet_service.list_mixtures(ctx.company_id, filter.sheet_id).await?;
    Ok((StatusCode::OK, Json(mixtures)))
}

#[utoipa::path(
    post,
    path = "/api/mixtures",
    tag = "Sheets",
    request_body = MixturePayload,
    responses(
        (status = 201, description = "Mezcla criada com os seus componentes", body = MixtureDetail),
        (status = 400, description = "Unidade, hoja ou material inválidos")
    ),
    params(("x-company-id" = Uuid, Header, description = "ID da empresa ativa")),
    security(("api_jwt" = []))
)]
pub async fn create_mixture(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    _guard: RequireSection<Presupuestos>,
    Json(payload): Json<MixturePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let detail = app_state.sheet_service.create_mixture(ctx.company_id, payload).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

#[utoipa::path(
    get,
    path = "/api/mixtures/{mixture_id}",
    tag = "Sheets",
    responses(
        (status = 200, description = "Mezcla com componentes e custo unitário", body = MixtureDetail),
        (status = 404, description = "Mezcla não encontrada")
    ),
    params(
        ("mixture_id" = Uuid, Path, description = "ID da mezcla"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa ativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_mixture(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    Path(mixture_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = app_state.sheet_service.get_mixture(ctx.company_id, mixture_id).await?;
    Ok((StatusCode::OK, Json(detail)))
}
