// src/middleware/sections.rs

use std::marker::PhantomData;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{common::error::AppError, config::AppState, middleware::tenancy::CompanyContext};

/// 1. O que define uma seção
pub trait SectionDef: Send + Sync + 'static {
    fn code() -> &'static str;
}

/// 2. O guardião: exige acesso à seção `T` na empresa ativa. Admins passam sempre.
pub struct RequireSection<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireSection<T>
where
    T: SectionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = CompanyContext::from_request_parts(parts, state).await?;
        let app_state = AppState::from_ref(state);

        if app_state.tenant_repo.has_section(&ctx.membership, T::code()).await? {
            Ok(RequireSection(PhantomData))
        } else {
            Err(AppError::SectionForbidden(T::code()))
        }
    }
}

/// Operações restritas a administradores da empresa ativa.
pub struct RequireAdmin;

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = CompanyContext::from_request_parts(parts, state).await?;
        if ctx.membership.is_admin {
            Ok(RequireAdmin)
        } else {
            Err(AppError::AdminRequired)
        }
    }
}

// ---
// Seções
// ---

pub struct Presupuestos;
impl SectionDef for Presupuestos {
    fn code() -> &'static str { "presupuestos" }
}

pub struct Sueldos;
impl SectionDef for Sueldos {
    fn code() -> &'static str { "sueldos" }
}

pub struct Compras;
impl SectionDef for Compras {
    fn code() -> &'static str { "compras" }
}
