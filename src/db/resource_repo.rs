// src/db/resource_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::on_conflict, error::AppError},
    models::resources::{Labor, LaborPayload, Material, MaterialPayload, PriceTable, Subcontract, SubcontractPayload},
};

const MATERIAL_COLUMNS: &str = "id, company_id, provider_id, material_type_id, category_id, sale_unit_id, \
     name, qty_per_sale_unit, sale_unit_price, currency";
const LABOR_COLUMNS: &str = "id, company_id, trade_id, sub_trade_id, crew_id, crew_ref_id, sale_unit_id, \
     task_name, qty_per_sale_unit, sale_unit_price";
const SUBCONTRACT_COLUMNS: &str = "id, company_id, trade_id, sub_trade_id, provider_id, sale_unit_id, \
     task_name, qty_per_sale_unit, sale_unit_price, currency";

impl PriceTable {
    /// SQL do reajuste. `$1` = fator, `$2` = empresa, `$3` = ids.
    /// Linhas de hoja só são afetadas se a hoja pertencer à empresa.
    fn bulk_update_sql(&self) -> String {
        let direct = |table: &str| {
            format!(
                "UPDATE {table} SET sale_unit_price = sale_unit_price * $1 \
                 WHERE company_id = $2 AND id = ANY($3)"
            )
        };
        let through_sheet = |lines: &str, sheets: &str| {
            format!(
                "UPDATE {lines} l SET sale_unit_price = l.sale_unit_price * $1 \
                 FROM {sheets} s \
                 WHERE l.sheet_id = s.id AND s.company_id = $2 AND l.id = ANY($3)"
            )
        };
        match self {
            Self::Materials => direct("materials"),
            Self::Labor => direct("labor"),
            Self::Subcontracts => direct("subcontracts"),
            Self::MaterialSheetLines => through_sheet("material_sheet_lines", "material_sheets"),
            Self::LaborSheetLines => through_sheet("labor_sheet_lines", "labor_sheets"),
            Self::SubcontractSheetLines => through_sheet("subcontract_sheet_lines", "subcontract_sheets"),
        }
    }
}

#[derive(Clone)]
pub struct ResourceRepository {
    pool: PgPool,
}

impl ResourceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  MATERIALES
    // =========================================================================

    pub async fn create_material<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        payload: &MaterialPayload,
    ) -> Result<Material, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO materials (
                company_id, provider_id, material_type_id, category_id, sale_unit_id,
                name, qty_per_sale_unit, sale_unit_price, currency
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {MATERIAL_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Material>(&sql)
            .bind(company_id)
            .bind(payload.provider_id)
            .bind(payload.material_type_id)
            .bind(payload.category_id)
            .bind(payload.sale_unit_id)
            .bind(payload.name.trim())
            .bind(payload.qty_per_sale_unit)
            .bind(payload.sale_unit_price)
            .bind(payload.currency)
            .fetch_one(executor)
            .await
            .map_err(on_conflict("Já existe um material com este nome para o proveedor."))
    }

    pub async fn list_materials<'e, E>(&self, executor: E, company_id: Uuid) -> Result<Vec<Material>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {MATERIAL_COLUMNS} FROM materials WHERE company_id = $1 ORDER BY name");
        let rows = sqlx::query_as::<_, Material>(&sql)
            .bind(company_id)
            .fetch_all(executor)
            .await?;

        Ok(rows)
    }

    // =========================================================================
    //  MANO DE OBRA
    // =========================================================================

    pub async fn create_labor<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        payload: &LaborPayload,
    ) -> Result<Labor, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO labor (
                company_id, trade_id, sub_trade_id, crew_id, crew_ref_id, sale_unit_id,
                task_name, qty_per_sale_unit, sale_unit_price
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {LABOR_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Labor>(&sql)
            .bind(company_id)
            .bind(payload.trade_id)
            .bind(payload.sub_trade_id)
            .bind(payload.crew_id)
            .bind(payload.crew_ref_id)
            .bind(payload.sale_unit_id)
            .bind(payload.task_name.trim())
            .bind(payload.qty_per_sale_unit)
            .bind(payload.sale_unit_price)
            .fetch_one(executor)
            .await
            .map_err(on_conflict("Esta tarefa de mão de obra já existe para o equipo."))
    }

    pub async fn list_labor<'e, E>(&self, executor: E, company_id: Uuid) -> Result<Vec<Labor>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {LABOR_COLUMNS} FROM labor WHERE company_id = $1 ORDER BY task_name");
        let rows = sqlx::query_as::<_, Labor>(&sql)
            .bind(company_id)
            .fetch_all(executor)
            .await?;

        Ok(rows)
    }

    // =========================================================================
    //  SUBCONTRATOS
    // =========================================================================

    pub async fn create_subcontract<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        payload: &SubcontractPayload,
    ) -> Result<Subcontract, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO subcontracts (
                company_id, trade_id, sub_trade_id, provider_id, sale_unit_id,
                task_name, qty_per_sale_unit, sale_unit_price, currency
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {SUBCONTRACT_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Subcontract>(&sql)
            .bind(company_id)
            .bind(payload.trade_id)
            .bind(payload.sub_trade_id)
            .bind(payload.provider_id)
            .bind(payload.sale_unit_id)
            .bind(payload.task_name.trim())
            .bind(payload.qty_per_sale_unit)
            .bind(payload.sale_unit_price)
            .bind(payload.currency)
            .fetch_one(executor)
            .await
            .map_err(on_conflict("Este subcontrato já existe para o subrubro."))
    }

    pub async fn list_subcontracts<'e, E>(&self, executor: E, company_id: Uuid) -> Result<Vec<Subcontract>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {SUBCONTRACT_COLUMNS} FROM subcontracts WHERE company_id = $1 ORDER BY task_name");
        let rows = sqlx::query_as::<_, Subcontract>(&sql)
            .bind(company_id)
            .fetch_all(executor)
            .await?;

        Ok(rows)
    }

    // =========================================================================
    //  REAJUSTE EM MASSA
    // =========================================================================

    /// Multiplica `sale_unit_price` por `factor` em uma única instrução.
    /// Devolve quantas linhas foram afetadas.
    pub async fn bulk_update_prices(
        &self,
        company_id: Uuid,
        table: PriceTable,
        ids: &[Uuid],
        factor: Decimal,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(&table.bulk_update_sql())
            .bind(factor)
            .bind(company_id)
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(on_conflict("Reajuste em massa rejeitado."))?;

        Ok(result.rows_affected())
    }
}
