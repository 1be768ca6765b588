// src/handlers/tenancy.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, sections::RequireAdmin, tenancy::CompanyContext},
    models::tenancy::{AddMemberPayload, Company, CreateCompanyPayload, Membership, Section, UserCompany},
};

#[utoipa::path(
    post,
    path = "/api/companies",
    tag = "Tenancy",
    request_body = CreateCompanyPayload,
    responses(
        (status = 201, description = "Empresa criada com o Lote Inicial", body = Company),
        (status = 400, description = "Dados inválidos"),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_company(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateCompanyPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    // Quem cria vira o primeiro membro (admin)
    let company = app_state
        .tenant_service
        .create_company(&payload.name, Some(user.user_id))
        .await?;

    Ok((StatusCode::CREATED, Json(company)))
}

#[utoipa::path(
    get,
    path = "/api/companies",
    tag = "Tenancy",
    responses(
        (status = 200, description = "Empresas do usuário, com papel e seções", body = Vec<UserCompany>),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_my_companies(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let companies = app_state.tenant_service.list_user_companies(user.user_id).await?;
    Ok((StatusCode::OK, Json(companies)))
}

#[utoipa::path(
    post,
    path = "/api/companies/members",
    tag = "Tenancy",
    request_body = AddMemberPayload,
    responses(
        (status = 201, description = "Membro adicionado", body = Membership),
        (status = 403, description = "Apenas administradores"),
        (status = 409, description = "Usuário já é membro")
    ),
    params(("x-company-id" = Uuid, Header, description = "ID da empresa ativa")),
    security(("api_jwt" = []))
)]
pub async fn add_member(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    _admin: RequireAdmin,
    Json(payload): Json<AddMemberPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let membership = app_state.tenant_service.add_member(ctx.company_id, &payload).await?;
    Ok((StatusCode::CREATED, Json(membership)))
}

#[utoipa::path(
    get,
    path = "/api/sections",
    tag = "Tenancy",
    responses((status = 200, description = "Seções da aplicação", body = Vec<Section>)),
    security(("api_jwt" = []))
)]
pub async fn list_sections(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let sections = app_state.tenant_service.list_sections().await?;
    Ok((StatusCode::OK, Json(sections)))
}
