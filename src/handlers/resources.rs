// src/handlers/resources.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        sections::{Presupuestos, RequireSection},
        tenancy::CompanyContext,
    },
    models::resources::{
        BulkPricePayload, BulkPriceResult, Labor, LaborPayload, Material, MaterialPayload, Subcontract,
        SubcontractPayload,
    },
};

// --- Materiais ---

#[utoipa::path(
    get,
    path = "/api/resources/materials",
    tag = "Resources",
    responses((status = 200, description = "Materiais da empresa", body = Vec<Material>)),
    params(("x-company-id" = Uuid, Header, description = "ID da empresa ativa")),
    security(("api_jwt" = []))
)]
pub async fn list_materials(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
) -> Result<impl IntoResponse, AppError> {
    let materials = app_state.resource_service.list_materials(ctx.company_id).await?;
    Ok((StatusCode::OK, Json(materials)))
}

#[utoipa::path(
    post,
    path = "/api/resources/materials",
    tag = "Resources",
    request_body = MaterialPayload,
    responses(
        (status = 201, description = "Material criado", body = Material),
        (status = 400, description = "Categoria não pertence ao tipo informado")
    ),
    params(("x-company-id" = Uuid, Header, description = "ID da empresa ativa")),
    security(("api_jwt" = []))
)]
pub async fn create_material(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    _guard: RequireSection<Presupuestos>,
    Json(payload): Json<MaterialPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let material = app_state.resource_service.create_material(ctx.company_id, payload).await?;
    Ok((StatusCode::CREATED, Json(material)))
}

// --- Mão de obra ---

#[utoipa::path(
    get,
    path = "/api/resources/labor",
    tag = "Resources",
    responses((status = 200, description = "Mão de obra da empresa", body = Vec<Labor>)),
    params(("x-company-id" = Uuid, Header, description = "ID da empresa ativa")),
    security(("api_jwt" = []))
)]
pub async fn list_labor(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
) -> Result<impl IntoResponse, AppError> {
    let labor = app_state.resource_service.list_labor(ctx.company_id).await?;
    Ok((StatusCode::OK, Json(labor)))
}

#[utoipa::path(
    post,
    path = "/api/resources/labor",
    tag = "Resources",
    request_body = LaborPayload,
    responses(
        (status = 201, description = "Mão de obra criada", body = Labor),
        (status = 400, description = "Subrubro ou referência de equipo inválidos")
    ),
    params(("x-company-id" = Uuid, Header, description = "ID da empresa ativa")),
    security(("api_jwt" = []))
)]
pub async fn create_labor(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    _guard: RequireSection<Presupuestos>,
    Json(payload): Json<LaborPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let labor = app_state.resource_service.create_labor(ctx.company_id, payload).await?;
    Ok((StatusCode::CREATED, Json(labor)))
}

// --- Subcontratos ---

#[utoipa::path(
    get,
    path = "/api/resources/subcontracts",
    tag = "Resources",
    responses((status = 200, description = "Subcontratos da empresa", body = Vec<Subcontract>)),
    params(("x-company-id" = Uuid, Header, description = "ID da empresa ativa")),
    security(("api_jwt" = []))
)]
pub async fn list_subcontracts(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
) -> Result<impl IntoResponse, AppError> {
    let subcontracts = app_state.resource_service.list_subcontracts(ctx.company_id).await?;
    Ok((StatusCode::OK, Json(subcontracts)))
}

#[utoipa::path(
    post,
    path = "/api/resources/subcontracts",
    tag = "Resources",
    request_body = SubcontractPayload,
    responses((status = 201, description = "Subcontrato criado", body = Subcontract)),
    params(("x-company-id" = Uuid, Header, description = "ID da empresa ativa")),
    security(("api_jwt" = []))
)]
pub async fn create_subcontract(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    _guard: RequireSection<Presupuestos>,
    Json(payload): Json<SubcontractPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let subcontract = app_state.resource_service.create_subcontract(ctx.company_id, payload).await?;
    Ok((StatusCode::CREATED, Json(subcontract)))
}

// --- Reajuste em massa ---

#[utoipa::path(
    post,
    path = "/api/resources/bulk-price",
    tag = "Resources",
    request_body = BulkPricePayload,
    responses(
        (status = 200, description = "Preços reajustados", body = BulkPriceResult),
        (status = 400, description = "Percentual inválido")
    ),
    params(("x-company-id" = Uuid, Header, description = "ID da empresa ativa")),
    security(("api_jwt" = []))
)]
pub async fn bulk_update_prices(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    _guard: RequireSection<Presupuestos>,
    Json(payload): Json<BulkPricePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let result = app_state.resource_service.bulk_update_prices(ctx.company_id, payload).await?;
    Ok((StatusCode::OK, Json(result)))
}
