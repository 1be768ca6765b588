// src/handlers/catalog.rs

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
    models::catalog::{
        ChildCatalog, ChildEntry, ChildPayload, ExchangeRate, ExchangeRatePayload, NamePayload, NamedCatalog,
        NamedEntry, Project, ProjectPayload, Provider, ProviderPayload,
    },
};

// ---
// Filtros
// ---

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct ParentFilter {
    /// Filtra os itens de um único pai.
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct ExchangeRateFilter {
    pub exchange_type_id: Option<Uuid>,
}

// =============================================================================
//  1. CATÁLOGOS PLANOS (rubros, unidades, tipos de material, equipos, tipos de dólar)
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/catalog/{catalog}",
    tag = "Catalog",
    responses((status = 200, description = "Itens do catálogo, por nome", body = Vec<NamedEntry>)),
    params(
        ("catalog" = NamedCatalog, Path, description = "trades | units | material-types | crews | exchange-types"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa ativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_named(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    Path(catalog): Path<NamedCatalog>,
) -> Result<impl IntoResponse, AppError> {
    let entries = app_state.catalog_service.list_named(ctx.company_id, catalog).await?;
    Ok((StatusCode::OK, Json(entries)))
}

#[utoipa::path(
    post,
    path = "/api/catalog/{catalog}",
    tag = "Catalog",
    request_body = NamePayload,
    responses(
        (status = 201, description = "Item criado", body = NamedEntry),
        (status = 409, description = "Nome já existe nesta empresa")
    ),
    params(
        ("catalog" = NamedCatalog, Path, description = "trades | units | material-types | crews | exchange-types"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa ativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_named(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    _guard: RequireSection<Presupuestos>,
    Path(catalog): Path<NamedCatalog>,
    Json(payload): Json<NamePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let entry = app_state
        .catalog_service
        .create_named(ctx.company_id, catalog, payload.name.trim())
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

// =============================================================================
//  2. CATÁLOGOS FILHOS (subrubros, categorias de material, referências de equipo)
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/catalog/children/{catalog}",
    tag = "Catalog",
    responses((status = 200, description = "Itens do catálogo filho", body = Vec<ChildEntry>)),
    params(
        ("catalog" = ChildCatalog, Path, description = "sub-trades | material-categories | crew-refs"),
        ParentFilter,
        ("x-company-id" = Uuid, Header, description = "ID da empresa ativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_children(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    Path(catalog): Path<ChildCatalog>,
    Query(filter): Query<ParentFilter>,
) -> Result<impl IntoResponse, AppError> {
    let entries = app_state
        .catalog_service
        .list_children(ctx.company_id, catalog, filter.parent_id)
        .await?;
    Ok((StatusCode::OK, Json(entries)))
}

#[utoipa::path(
    post,
    path = "/api/catalog/children/{catalog}",
    tag = "Catalog",
    request_body = ChildPayload,
    responses(
        (status = 201, description = "Item criado", body = ChildEntry),
        (status = 400, description = "Pai inexistente ou de outra empresa"),
        (status = 409, description = "Nome já existe para este pai")
    ),
    params(
        ("catalog" = ChildCatalog, Path, description = "sub-trades | material-categories | crew-refs"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa ativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_child(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    _guard: RequireSection<Presupuestos>,
    Path(catalog): Path<ChildCatalog>,
    Json(payload): Json<ChildPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let entry = app_state.catalog_service.create_child(ctx.company_id, catalog, payload).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

// =============================================================================
//  3. FORNECEDORES, COTAÇÕES E OBRAS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/providers",
    tag = "Catalog",
    responses((status = 200, description = "Fornecedores da empresa", body = Vec<Provider>)),
    params(("x-company-id" = Uuid, Header, description = "ID da empresa ativa")),
    security(("api_jwt" = []))
)]
pub async fn list_providers(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
) -> Result<impl IntoResponse, AppError> {
    let providers = app_state.catalog_service.list_providers(ctx.company_id).await?;
    Ok((StatusCode::OK, Json(providers)))
}

#[utoipa::path(
    post,
    path = "/api/providers",
    tag = "Catalog",
    request_body = ProviderPayload,
    responses(
        (status = 201, description = "Fornecedor criado", body = Provider),
        (status = 409, description = "Fornecedor já existe")
    ),
    params(("x-company-id" = Uuid, Header, description = "ID da empresa ativa")),
    security(("api_jwt" = []))
)]
pub async fn create_provider(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    _guard: RequireSection<Presupuestos>,
    Json(payload): Json<ProviderPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let provider = app_state.catalog_service.create_provider(ctx.company_id, payload).await?;
    Ok((StatusCode::CREATED, Json(provider)))
}

#[utoipa::path(
    get,
    path = "/api/exchange-rates",
    tag = "Catalog",
    responses((status = 200, description = "Cotações, da mais recente para a mais antiga", body = Vec<ExchangeRate>)),
    params(
        ExchangeRateFilter,
        ("x-company-id" = Uuid, Header, description = "ID da empresa ativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_exchange_rates(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    Query(filter): Query<ExchangeRateFilter>,
) -> Result<impl IntoResponse, AppError> {
    let rates = app_state
        .catalog_service
        .list_exchange_rates(ctx.company_id, filter.exchange_type_id)
        .await?;
    Ok((StatusCode::OK, Json(rates)))
}

#[utoipa::path(
    post,
    path = "/api/exchange-rates",
    tag = "Catalog",
    request_body = ExchangeRatePayload,
    responses(
        (status = 201, description = "Cotação registrada", body = ExchangeRate),
        (status = 409, description = "Já existe cotação deste tipo na data")
    ),
    params(("x-company-id" = Uuid, Header, description = "ID da empresa ativa")),
    security(("api_jwt" = []))
)]
pub async fn create_exchange_rate(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    _guard: RequireSection<Presupuestos>,
    Json(payload): Json<ExchangeRatePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let rate = app_state.catalog_service.create_exchange_rate(ctx.company_id, payload).await?;
    Ok((StatusCode::CREATED, Json(rate)))
}

#[utoipa::path(
    get,
    path = "/api/projects",
    tag = "Catalog",
    responses((status = 200, description = "Obras da empresa", body = Vec<Project>)),
    params(("x-company-id" = Uuid, Header, description = "ID da empresa ativa")),
    security(("api_jwt" = []))
)]
pub async fn list_projects(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
) -> Result<impl IntoResponse, AppError> {
    let projects = app_state.catalog_service.list_projects(ctx.company_id).await?;
    Ok((StatusCode::OK, Json(projects)))
}

#[utoipa::path(
    post,
    path = "/api/projects",
    tag = "Catalog",
    request_body = ProjectPayload,
    responses(
        (status = 201, description = "Obra criada", body = Project),
        (status = 409, description = "Obra já existe")
    ),
    params(("x-company-id" = Uuid, Header, description = "ID da empresa ativa")),
    security(("api_jwt" = []))
)]
pub async fn create_project(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    _guard: RequireSection<Presupuestos>,
    Json(payload): Json<ProjectPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let project = app_state.catalog_service.create_project(ctx.company_id, payload).await?;
    Ok((StatusCode::CREATED, Json(project)))
}
