// src/handlers/payroll.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        sections::{RequireSection, Sueldos},
        tenancy::CompanyContext,
    },
    models::resources::Labor,
};

/// Tarifas de mão de obra por equipo, para a seção de sueldos.
#[utoipa::path(
    get,
    path = "/api/payroll/labor",
    tag = "Payroll",
    responses(
        (status = 200, description = "Tarifas de mão de obra da empresa", body = Vec<Labor>),
        (status = 403, description = "Sem acesso à seção de sueldos")
    ),
    params(("x-company-id" = Uuid, Header, description = "ID da empresa ativa")),
    security(("api_jwt" = []))
)]
pub async fn list_crew_rates(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    _guard: RequireSection<Sueldos>,
) -> Result<impl IntoResponse, AppError> {
    let labor = app_state.resource_service.list_labor(ctx.company_id).await?;
    Ok((StatusCode::OK, Json(labor)))
}
