// src/services/tenancy_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::TenantRepository,
    models::{
        lote::CreateLotePayload,
        tenancy::{AddMemberPayload, Company, Membership, Section, UserCompany},
    },
    services::lote_service::{INITIAL_LOTE_NAME, LoteService, LoteUnitOfWork, build_lote},
};

/// A primeira associação de uma empresa é sempre administradora.
pub(crate) fn member_is_admin(requested: bool, existing_members: i64) -> bool {
    requested || existing_members == 0
}

#[derive(Clone)]
pub struct TenantService {
    tenant_repo: TenantRepository,
    lote_service: LoteService,
    pool: PgPool,
}

impl TenantService {
    pub fn new(tenant_repo: TenantRepository, lote_service: LoteService, pool: PgPool) -> Self {
        Self { tenant_repo, lote_service, pool }
    }

    /// Cria a empresa com o seu "Lote Inicial" (três hojas vazias) e, se houver
    /// dono, a associação administradora. Tudo numa única transação.
    pub async fn create_company(&self, name: &str, owner_id: Option<Uuid>) -> Result<Company, AppError> {
        // 1. Inicia a unidade de trabalho
        let mut uow = self.lote_service.begin().await?;

        // 2. Empresa
        let company = self.tenant_repo.create_company(uow.conn(), name.trim()).await?;

        // 3. Dono como primeiro membro (admin)
        if let Some(user_id) = owner_id {
            self.tenant_repo.add_member(uow.conn(), company.id, user_id, true).await?;
        }

        // 4. Lote inicial
        let lote = build_lote(&mut uow, company.id, &CreateLotePayload::empty(INITIAL_LOTE_NAME)).await?;

        // 5. Commit
        uow.commit().await?;

        tracing::info!(company_id = %company.id, lote_id = %lote.id, "Empresa '{}' criada", company.name);
        Ok(company)
    }

    pub async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>, AppError> {
        self.tenant_repo.find_company_by_name(&self.pool, name).await
    }

    /// Associa um usuário à empresa e define as seções que ele pode ver.
    pub async fn add_member(&self, company_id: Uuid, payload: &AddMemberPayload) -> Result<Membership, AppError> {
        let mut tx = self.pool.begin().await?;

        let existing = self.tenant_repo.count_members(&mut *tx, company_id).await?;
        let is_admin = member_is_admin(payload.is_admin, existing);

        let membership = self
            .tenant_repo
            .add_member(&mut *tx, company_id, payload.user_id, is_admin)
            .await?;
        self.tenant_repo
            .replace_sections(&mut *tx, membership.id, &payload.sections)
            .await?;

        tx.commit().await?;

        tracing::info!(
            company_id = %company_id,
            user_id = %payload.user_id,
            is_admin,
            "Membro adicionado"
        );
        Ok(membership)
    }

    pub async fn list_user_companies(&self, user_id: Uuid) -> Result<Vec<UserCompany>, AppError> {
        self.tenant_repo.companies_for_user(user_id).await
    }

    pub async fn list_sections(&self) -> Result<Vec<Section>, AppError> {
        self.tenant_repo.list_sections().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_member_becomes_admin() {
        assert!(member_is_admin(false, 0));
        assert!(member_is_admin(true, 0));
        assert!(!member_is_admin(false, 3));
        assert!(member_is_admin(true, 3));
    }
}
