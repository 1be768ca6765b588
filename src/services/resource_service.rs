// src/services/resource_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        validation::{CATEGORY_NOT_IN_TYPE, CREW_REF_NOT_IN_CREW, CompanyScope, SUB_TRADE_NOT_IN_TRADE},
    },
    costing::percentage_factor,
    db::{CatalogRepository, OwnedTable, ResourceRepository},
    models::{
        catalog::{ChildCatalog, NamedCatalog},
        resources::{
            BulkPricePayload, BulkPriceResult, Labor, LaborPayload, Material, MaterialPayload, Subcontract,
            SubcontractPayload,
        },
    },
};

#[derive(Clone)]
pub struct ResourceService {
    resource_repo: ResourceRepository,
    catalog_repo: CatalogRepository,
    pool: PgPool,
}

impl ResourceService {
    pub fn new(resource_repo: ResourceRepository, catalog_repo: CatalogRepository, pool: PgPool) -> Self {
        Self { resource_repo, catalog_repo, pool }
    }

    async fn owner(&self, table: OwnedTable, id: Uuid) -> Result<Option<crate::common::validation::RefOwner>, AppError> {
        self.catalog_repo.find_owner(table, id).await
    }

    // --- Materiales ---

    pub async fn create_material(&self, company_id: Uuid, payload: MaterialPayload) -> Result<Material, AppError> {
        let provider = self.catalog_repo.find_owner_opt(OwnedTable::Provider, payload.provider_id).await?;
        let material_type = self
            .owner(OwnedTable::Named(NamedCatalog::MaterialTypes), payload.material_type_id)
            .await?;
        let category = self
            .owner(OwnedTable::Child(ChildCatalog::MaterialCategories), payload.category_id)
            .await?;
        let unit = self.owner(OwnedTable::Named(NamedCatalog::Units), payload.sale_unit_id).await?;

        let mut scope = CompanyScope::new(company_id);
        scope
            .owned_opt("providerId", payload.provider_id, provider)
            .owned("materialTypeId", material_type)
            .owned("categoryId", category)
            .owned("saleUnitId", unit)
            .belongs_to("categoryId", category, payload.material_type_id, CATEGORY_NOT_IN_TYPE);
        scope.finish()?;

        self.resource_repo.create_material(&self.pool, company_id, &payload).await
    }

    pub async fn list_materials(&self, company_id: Uuid) -> Result<Vec<Material>, AppError> {
        self.resource_repo.list_materials(&self.pool, company_id).await
    }

    // --- Mano de obra ---

    pub async fn create_labor(&self, company_id: Uuid, payload: LaborPayload) -> Result<Labor, AppError> {
        let trade = self.owner(OwnedTable::Named(NamedCatalog::Trades), payload.trade_id).await?;
        let sub_trade = self.owner(OwnedTable::Child(ChildCatalog::SubTrades), payload.sub_trade_id).await?;
        let crew = self.owner(OwnedTable::Named(NamedCatalog::Crews), payload.crew_id).await?;
        let crew_ref = self.owner(OwnedTable::Child(ChildCatalog::CrewRefs), payload.crew_ref_id).await?;
        let unit = self.owner(OwnedTable::Named(NamedCatalog::Units), payload.sale_unit_id).await?;

        let mut scope = CompanyScope::new(company_id);
        scope
            .owned("tradeId", trade)
            .owned("subTradeId", sub_trade)
            .owned("crewId", crew)
            .owned("crewRefId", crew_ref)
            .owned("saleUnitId", unit)
            .belongs_to("subTradeId", sub_trade, payload.trade_id, SUB_TRADE_NOT_IN_TRADE)
            .belongs_to("crewRefId", crew_ref, payload.crew_id, CREW_REF_NOT_IN_CREW);
        scope.finish()?;

        self.resource_repo.create_labor(&self.pool, company_id, &payload).await
    }

    pub async fn list_labor(&self, company_id: Uuid) -> Result<Vec<Labor>, AppError> {
        self.resource_repo.list_labor(&self.pool, company_id).await
    }

    // --- Subcontratos ---

    pub async fn create_subcontract(&self, company_id: Uuid, payload: SubcontractPayload) -> Result<Subcontract, AppError> {
        let trade = self.owner(OwnedTable::Named(NamedCatalog::Trades), payload.trade_id).await?;
        let sub_trade = self.owner(OwnedTable::Child(ChildCatalog::SubTrades), payload.sub_trade_id).await?;
        let provider = self.catalog_repo.find_owner_opt(OwnedTable::Provider, payload.provider_id).await?;
        let unit = self.owner(OwnedTable::Named(NamedCatalog::Units), payload.sale_unit_id).await?;

        let mut scope = CompanyScope::new(company_id);
        scope
            .owned("tradeId", trade)
            .owned("subTradeId", sub_trade)
            .owned_opt("providerId", payload.provider_id, provider)
            .owned("saleUnitId", unit)
            .belongs_to("subTradeId", sub_trade, payload.trade_id, SUB_TRADE_NOT_IN_TRADE);
        scope.finish()?;

        self.resource_repo.create_subcontract(&self.pool, company_id, &payload).await
    }

    pub async fn list_subcontracts(&self, company_id: Uuid) -> Result<Vec<Subcontract>, AppError> {
        self.resource_repo.list_subcontracts(&self.pool, company_id).await
    }

    // --- Reajuste em massa ---

    /// Aplica `preço × (1 + pct/100)` aos ids selecionados num único UPDATE.
    /// Ids de outra empresa são ignorados pelo próprio filtro.
    pub async fn bulk_update_prices(
        &self,
        company_id: Uuid,
        payload: BulkPricePayload,
    ) -> Result<BulkPriceResult, AppError> {
        let factor = percentage_factor(payload.percentage);
        let updated = self
            .resource_repo
            .bulk_update_prices(company_id, payload.table, &payload.ids, factor)
            .await?;

        tracing::info!(
            "Reajuste de {}% em {:?}: {} de {} registros",
            payload.percentage,
            payload.table,
            updated,
            payload.ids.len()
        );
        Ok(BulkPriceResult { updated })
    }
}
