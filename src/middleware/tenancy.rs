// src/middleware/tenancy.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use uuid::Uuid;

use crate::{
    common::error::AppError, config::AppState, middleware::auth::AuthenticatedUser, models::tenancy::Membership,
};

// O nome do nosso cabeçalho HTTP customizado
pub const COMPANY_ID_HEADER: &str = "x-company-id";

/// Lê e valida o cabeçalho da empresa ativa.
pub fn parse_company_header(headers: &HeaderMap) -> Result<Uuid, AppError> {
    let value = headers
        .get(COMPANY_ID_HEADER)
        .ok_or(AppError::InvalidCompanyHeader("O cabeçalho x-company-id é obrigatório."))?;

    let value = value
        .to_str()
        .map_err(|_| AppError::InvalidCompanyHeader("Cabeçalho x-company-id contém caracteres inválidos."))?;

    Uuid::parse_str(value.trim())
        .map_err(|_| AppError::InvalidCompanyHeader("Cabeçalho x-company-id inválido (não é um UUID)."))
}

/// Empresa ativa da requisição, já conferida contra a associação do usuário.
#[derive(Debug, Clone)]
pub struct CompanyContext {
    pub company_id: Uuid,
    pub user_id: Uuid,
    pub membership: Membership,
}

impl<S> FromRequestParts<S> for CompanyContext
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<CompanyContext>() {
            return Ok(ctx.clone());
        }

        // 1. Usuário autenticado
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;

        // 2. Empresa pedida
        let company_id = parse_company_header(&parts.headers)?;

        // 3. Associação
        let app_state = AppState::from_ref(state);
        let membership = app_state
            .tenant_repo
            .find_membership(user.user_id, company_id)
            .await?
            .ok_or(AppError::NotAMember)?;

        let ctx = CompanyContext { company_id, user_id: user.user_id, membership };
        parts.extensions.insert(ctx.clone());
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: Option<&str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(v) = value {
            map.insert(COMPANY_ID_HEADER, HeaderValue::from_str(v).unwrap());
        }
        map
    }

    #[test]
    fn valid_header_is_parsed() {
        let id = Uuid::new_v4();
        assert_eq!(parse_company_header(&headers(Some(&id.to_string()))).unwrap(), id);
    }

    #[test]
    fn missing_header_is_rejected() {
        assert!(matches!(
            parse_company_header(&headers(None)),
            Err(AppError::InvalidCompanyHeader(_))
        ));
    }

    #[test]
    fn non_uuid_header_is_rejected() {
        assert!(matches!(
            parse_company_header(&headers(Some("empresa-1"))),
            Err(AppError::InvalidCompanyHeader(_))
        ));
    }
}
