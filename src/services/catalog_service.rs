// src/services/catalog_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, validation::CompanyScope},
    db::{CatalogRepository, OwnedTable},
    models::catalog::{
        ChildCatalog, ChildEntry, ChildPayload, ExchangeRate, ExchangeRatePayload, NamedCatalog, NamedEntry, Project,
        ProjectPayload, Provider, ProviderPayload,
    },
};

#[derive(Clone)]
pub struct CatalogService {
    catalog_repo: CatalogRepository,
    pool: PgPool,
}

impl CatalogService {
    pub fn new(catalog_repo: CatalogRepository, pool: PgPool) -> Self {
        Self { catalog_repo, pool }
    }

    // --- Catálogos planos (rubros, unidades, tipos, equipos, tipos de dólar) ---

    pub async fn list_named(&self, company_id: Uuid, catalog: NamedCatalog) -> Result<Vec<NamedEntry>, AppError> {
        self.catalog_repo.list_named(&self.pool, company_id, catalog).await
    }

    pub async fn create_named(&self, company_id: Uuid, catalog: NamedCatalog, name: &str) -> Result<NamedEntry, AppError> {
        let entry = self.catalog_repo.create_named(&self.pool, company_id, catalog, name).await?;
        tracing::info!("{} '{}' criado(a)", catalog.label(), entry.name);
        Ok(entry)
    }

    // --- Catálogos filhos ---

    pub async fn list_children(
        &self,
        company_id: Uuid,
        catalog: ChildCatalog,
        parent_id: Option<Uuid>,
    ) -> Result<Vec<ChildEntry>, AppError> {
        self.catalog_repo.list_children(&self.pool, company_id, catalog, parent_id).await
    }

    pub async fn create_child(
        &self,
        company_id: Uuid,
        catalog: ChildCatalog,
        payload: ChildPayload,
    ) -> Result<ChildEntry, AppError> {
        // O pai precisa ser da mesma empresa
        let parent = self
            .catalog_repo
            .find_owner(OwnedTable::Named(catalog.parent()), payload.parent_id)
            .await?;
        let mut scope = CompanyScope::new(company_id);
        scope.owned("parentId", parent);
        scope.finish()?;

        let entry = self
            .catalog_repo
            .create_child(&self.pool, company_id, catalog, payload.parent_id, &payload.name)
            .await?;
        tracing::info!("{} '{}' criado(a)", catalog.label(), entry.name);
        Ok(entry)
    }

    // --- Proveedores ---

    pub async fn list_providers(&self, company_id: Uuid) -> Result<Vec<Provider>, AppError> {
        self.catalog_repo.list_providers(&self.pool, company_id).await
    }

    pub async fn create_provider(&self, company_id: Uuid, payload: ProviderPayload) -> Result<Provider, AppError> {
        self.catalog_repo.create_provider(&self.pool, company_id, &payload).await
    }

    // --- Cotizaciones ---

    pub async fn list_exchange_rates(
        &self,
        company_id: Uuid,
        exchange_type_id: Option<Uuid>,
    ) -> Result<Vec<ExchangeRate>, AppError> {
        self.catalog_repo
            .list_exchange_rates(&self.pool, company_id, exchange_type_id)
            .await
    }

    pub async fn create_exchange_rate(
        &self,
        company_id: Uuid,
        payload: ExchangeRatePayload,
    ) -> Result<ExchangeRate, AppError> {
        let exchange_type = self
            .catalog_repo
            .find_owner(OwnedTable::Named(NamedCatalog::ExchangeTypes), payload.exchange_type_id)
            .await?;
        let mut scope = CompanyScope::new(company_id);
        scope.owned("exchangeTypeId", exchange_type);
        scope.finish()?;

        self.catalog_repo
            .create_exchange_rate(&self.pool, company_id, payload.exchange_type_id, payload.rate_date, payload.value)
            .await
    }

    // --- Obras ---

    pub async fn list_projects(&self, company_id: Uuid) -> Result<Vec<Project>, AppError> {
        self.catalog_repo.list_projects(&self.pool, company_id).await
    }

    pub async fn create_project(&self, company_id: Uuid, payload: ProjectPayload) -> Result<Project, AppError> {
        self.catalog_repo.create_project(&self.pool, company_id, &payload).await
    }
}
