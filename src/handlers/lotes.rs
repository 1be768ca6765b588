// src/handlers/lotes.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        sections::{Presupuestos, RequireSection},
        tenancy::CompanyContext,
    },
    models::lote::{CreateLotePayload, Lote, Task, TaskCost, TaskPayload, TaskResource, TaskResourcePayload},
};

// =============================================================================
//  1. LOTES
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/lotes",
    tag = "Lotes",
    responses((status = 200, description = "Lotes da empresa", body = Vec<Lote>)),
    params(("x-company-id" = Uuid, Header, description = "ID da empresa ativa")),
    security(("api_jwt" = []))
)]
pub async fn list_lotes(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
) -> Result<impl IntoResponse, AppError> {
    let lotes = app_state.lote_service.list_lotes(ctx.company_id).await?;
    Ok((StatusCode::OK, Json(lotes)))
}

#[utoipa::path(
    post,
    path = "/api/lotes",
    tag = "Lotes",
    request_body = CreateLotePayload,
    responses(
        (status = 201, description = "Lote criado com as três hojas, mezclas e tarefas copiadas", body = Lote),
        (status = 400, description = "Lote de origem inexistente"),
        (status = 409, description = "Já existe um lote com este nome"),
        (status = 503, description = "Falha ao criar o lote; nada foi gravado, tente de novo")
    ),
    params(("x-company-id" = Uuid, Header, description = "ID da empresa ativa")),
    security(("api_jwt" = []))
)]
pub async fn create_lote(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    _guard: RequireSection<Presupuestos>,
    Json(payload): Json<CreateLotePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let lote = app_state.lote_service.create_lote(ctx.company_id, &payload).await?;
    Ok((StatusCode::CREATED, Json(lote)))
}

#[utoipa::path(
    get,
    path = "/api/lotes/{lote_id}",
    tag = "Lotes",
    responses(
        (status = 200, description = "Lote", body = Lote),
        (status = 404, description = "Lote não encontrado")
    ),
    params(
        ("lote_id" = Uuid, Path, description = "ID do lote"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa ativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_lote(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    Path(lote_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let lote = app_state.lote_service.get_lote(ctx.company_id, lote_id).await?;
    Ok((StatusCode::OK, Json(lote)))
}

#[utoipa::path(
    get,
    path = "/api/lotes/{lote_id}/tasks",
    tag = "Lotes",
    responses((status = 200, description = "Tarefas do lote", body = Vec<Task>)),
    params(
        ("lote_id" = Uuid, Path, description = "ID do lote"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa ativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_tasks(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    Path(lote_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let tasks = app_state.lote_service.list_tasks(ctx.company_id, lote_id).await?;
    Ok((StatusCode::OK, Json(tasks)))
}

#[utoipa::path(
    get,
    path = "/api/lotes/{lote_id}/costs",
    tag = "Lotes",
    responses(
        (status = 200, description = "Custo de cada tarefa do lote", body = Vec<TaskCost>),
        (status = 404, description = "Lote não encontrado")
    ),
    params(
        ("lote_id" = Uuid, Path, description = "ID do lote"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa ativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn lote_costs(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    Path(lote_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let costs = app_state.costing_service.lote_task_costs(ctx.company_id, lote_id).await?;
    Ok((StatusCode::OK, Json(costs)))
}

// =============================================================================
//  2. TAREAS
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/tasks",
    tag = "Lotes",
    request_body = TaskPayload,
    responses(
        (status = 201, description = "Tarefa criada", body = Task),
        (status = 400, description = "Rubro, subrubro ou lote inválidos")
    ),
    params(("x-company-id" = Uuid, Header, description = "ID da empresa ativa")),
    security(("api_jwt" = []))
)]
pub async fn create_task(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    _guard: RequireSection<Presupuestos>,
    Json(payload): Json<TaskPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let task = app_state.lote_service.create_task(ctx.company_id, &payload).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

#[utoipa::path(
    post,
    path = "/api/tasks/{task_id}/resources",
    tag = "Lotes",
    request_body = TaskResourcePayload,
    responses(
        (status = 201, description = "Recurso vinculado à tarefa", body = TaskResource),
        (status = 400, description = "Exatamente um recurso, com quantidade positiva"),
        (status = 404, description = "Tarefa não encontrada")
    ),
    params(
        ("task_id" = Uuid, Path, description = "ID da tarefa"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa ativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_task_resource(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    _guard: RequireSection<Presupuestos>,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<TaskResourcePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let line = app_state
        .lote_service
        .add_task_resource(ctx.company_id, task_id, &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(line)))
}

#[utoipa::path(
    get,
    path = "/api/tasks/{task_id}/cost",
    tag = "Lotes",
    responses(
        (status = 200, description = "Custo detalhado da tarefa", body = TaskCost),
        (status = 404, description = "Tarefa não encontrada")
    ),
    params(
        ("task_id" = Uuid, Path, description = "ID da tarefa"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa ativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn task_cost(
    State(app_state): State<AppState>,
    ctx: CompanyContext,
    Path(task_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let cost = app_state.costing_service.task_cost(ctx.company_id, task_id).await?;
    Ok((StatusCode::OK, Json(cost)))
}
