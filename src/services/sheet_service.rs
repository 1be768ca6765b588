// src/services/sheet_service.rs

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, validation::CompanyScope},
    costing::SheetPrice,
    db::{CatalogRepository, MixtureRepository, OwnedTable, PriceSheetRepository},
    models::{
        catalog::NamedCatalog,
        sheets::{Mixture, MixtureDetail, MixturePayload, PriceSheet, SheetKind, SheetLine, SheetLinePayload},
    },
    services::costing_service::build_mixture_costs,
};

impl SheetKind {
    /// Tabela do recurso de uma linha, para checar o dono.
    fn owned_resource(&self) -> OwnedTable {
        match self {
            Self::Materials => OwnedTable::Material,
            Self::Labor => OwnedTable::Labor,
            Self::Subcontracts => OwnedTable::Subcontract,
        }
    }
}

#[derive(Clone)]
pub struct SheetService {
    sheet_repo: PriceSheetRepository,
    mixture_repo: MixtureRepository,
    catalog_repo: CatalogRepository,
    pool: PgPool,
}

impl SheetService {
    pub fn new(
        sheet_repo: PriceSheetRepository,
        mixture_repo: MixtureRepository,
        catalog_repo: CatalogRepository,
        pool: PgPool,
    ) -> Self {
        Self { sheet_repo, mixture_repo, catalog_repo, pool }
    }

    // =========================================================================
    //  HOJAS
    // =========================================================================

    pub async fn list_sheets(&self, company_id: Uuid, kind: SheetKind) -> Result<Vec<PriceSheet>, AppError> {
        self.sheet_repo.list_sheets(&self.pool, kind, company_id).await
    }

    async fn ensure_sheet(&self, company_id: Uuid, kind: SheetKind, sheet_id: Uuid) -> Result<(), AppError> {
        if self.sheet_repo.sheet_belongs_to(kind, sheet_id, company_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("Hoja de precios"))
        }
    }

    pub async fn list_lines(&self, company_id: Uuid, kind: SheetKind, sheet_id: Uuid) -> Result<Vec<SheetLine>, AppError> {
        self.ensure_sheet(company_id, kind, sheet_id).await?;
        self.sheet_repo.list_lines(&self.pool, kind, sheet_id).await
    }

    /// Grava o preço de um recurso da empresa na hoja e devolve a hoja atualizada.
    pub async fn upsert_line(
        &self,
        company_id: Uuid,
        kind: SheetKind,
        sheet_id: Uuid,
        payload: SheetLinePayload,
    ) -> Result<Vec<SheetLine>, AppError> {
        self.ensure_sheet(company_id, kind, sheet_id).await?;

        let resource = self.catalog_repo.find_owner(kind.owned_resource(), payload.resource_id).await?;
        let mut scope = CompanyScope::new(company_id);
        scope.owned("resourceId", resource);
        scope.finish()?;

        self.sheet_repo
            .upsert_line(
                &self.pool,
                kind,
                sheet_id,
                payload.resource_id,
                payload.qty_per_sale_unit,
                payload.sale_unit_price,
                payload.currency,
            )
            .await?;

        self.sheet_repo.list_lines(&self.pool, kind, sheet_id).await
    }

    // =========================================================================
    //  MEZCLAS
    // =========================================================================

    pub async fn create_mixture(&self, company_id: Uuid, payload: MixturePayload) -> Result<MixtureDetail, AppError> {
        // 1. Unidade, hoja e materiais da empresa ativa
        let unit = self
            .catalog_repo
            .find_owner(OwnedTable::Named(NamedCatalog::Units), payload.mixture_unit_id)
            .await?;
        let sheet = self
            .catalog_repo
            .find_owner_opt(OwnedTable::MaterialSheet, payload.sheet_id)
            .await?;

        let mut scope = CompanyScope::new(company_id);
        scope
            .owned("mixtureUnitId", unit)
            .owned_opt("sheetId", payload.sheet_id, sheet);
        for component in &payload.components {
            let material = self.catalog_repo.find_owner(OwnedTable::Material, component.material_id).await?;
            scope.owned("components", material);
        }
        scope.finish()?;

        // 2. Mistura e componentes numa transação
        let mut tx = self.pool.begin().await?;
        let mixture = self
            .mixture_repo
            .create_mixture(&mut *tx, company_id, payload.mixture_unit_id, payload.sheet_id, &payload.name)
            .await?;
        for component in &payload.components {
            self.mixture_repo
                .add_component(&mut *tx, mixture.id, component.material_id, component.quantity)
                .await?;
        }
        tx.commit().await?;

        tracing::info!("Mistura '{}' criada com {} componentes", mixture.name, payload.components.len());
        self.detail(mixture).await
    }

    pub async fn list_mixtures(&self, company_id: Uuid, sheet_id: Option<Uuid>) -> Result<Vec<Mixture>, AppError> {
        self.mixture_repo.list_mixtures(&self.pool, company_id, sheet_id).await
    }

    pub async fn get_mixture(&self, company_id: Uuid, mixture_id: Uuid) -> Result<MixtureDetail, AppError> {
        let mixture = self
            .mixture_repo
            .find_mixture(&self.pool, company_id, mixture_id)
            .await?
            .ok_or(AppError::NotFound("Mezcla"))?;
        self.detail(mixture).await
    }

    /// Custo unitário pela hoja vinculada ou, sem hoja, pelos preços vivos.
    async fn detail(&self, mixture: Mixture) -> Result<MixtureDetail, AppError> {
        let components = self.mixture_repo.list_components(&self.pool, mixture.id).await?;
        let rows = self.mixture_repo.component_prices(&self.pool, &[mixture.id]).await?;

        let bound: HashMap<Uuid, SheetPrice> = match mixture.sheet_id {
            Some(sheet_id) => self
                .sheet_repo
                .sheet_prices(&self.pool, SheetKind::Materials, sheet_id)
                .await?
                .into_iter()
                .map(|r| (r.resource_id, SheetPrice { sale_unit_price: r.sale_unit_price, currency: r.currency }))
                .collect(),
            None => HashMap::new(),
        };
        let unit_cost = build_mixture_costs(&rows, mixture.sheet_id.unwrap_or_default(), &bound)
            .get(&mixture.id)
            .map(|c| c.unit_cost)
            .unwrap_or(Decimal::ZERO);

        Ok(MixtureDetail { mixture, components, unit_cost })
    }
}
