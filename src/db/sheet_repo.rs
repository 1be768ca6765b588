// src/db/sheet_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, FromRow, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::on_conflict, error::AppError},
    costing::Currency,
    models::sheets::{PriceSheet, SheetKind, SheetLine},
};

/// Preço de um recurso dentro de uma hoja, no formato que o custeio consome.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct SheetPriceRow {
    pub resource_id: Uuid,
    pub sale_unit_price: Decimal,
    pub currency: Currency,
}

impl SheetKind {
    /// Coluna de moeda da linha; mão de obra é sempre ARS.
    fn currency_expr(&self, alias: &str) -> String {
        if self.has_currency() {
            format!("{alias}.currency")
        } else {
            "'ARS'::currency_code".to_string()
        }
    }

    fn resource_name_column(&self) -> &'static str {
        match self {
            Self::Materials => "name",
            Self::Labor | Self::Subcontracts => "task_name",
        }
    }

    /// Colunas gravadas numa linha de hoja, além de `sheet_id`.
    fn line_value_columns(&self) -> String {
        let base = format!("{}, qty_per_sale_unit, sale_unit_price", self.resource_column());
        if self.has_currency() { format!("{base}, currency") } else { base }
    }
}

#[derive(Clone)]
pub struct PriceSheetRepository {
    pool: PgPool,
}

impl PriceSheetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_sheet<'e, E>(
        &self,
        executor: E,
        kind: SheetKind,
        company_id: Uuid,
        name: &str,
        origin_id: Option<Uuid>,
    ) -> Result<PriceSheet, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO {} (company_id, name, origin_id)
            VALUES ($1, $2, $3)
            RETURNING id, company_id, name, origin_id, created_at
            "#,
            kind.sheet_table()
        );
        sqlx::query_as::<_, PriceSheet>(&sql)
            .bind(company_id)
            .bind(name)
            .bind(origin_id)
            .fetch_one(executor)
            .await
            .map_err(on_conflict("Já existe uma hoja de precios com este nome."))
    }

    pub async fn list_sheets<'e, E>(&self, executor: E, kind: SheetKind, company_id: Uuid) -> Result<Vec<PriceSheet>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT id, company_id, name, origin_id, created_at FROM {} WHERE company_id = $1 ORDER BY created_at DESC",
            kind.sheet_table()
        );
        let rows = sqlx::query_as::<_, PriceSheet>(&sql)
            .bind(company_id)
            .fetch_all(executor)
            .await?;

        Ok(rows)
    }

    /// Copia todas as linhas de uma hoja para outra do mesmo tipo.
    pub async fn copy_lines<'e, E>(&self, executor: E, kind: SheetKind, from: Uuid, to: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let columns = kind.line_value_columns();
        let sql = format!(
            "INSERT INTO {table} (sheet_id, {columns}) SELECT $2, {columns} FROM {table} WHERE sheet_id = $1",
            table = kind.line_table(),
        );
        let result = sqlx::query(&sql).bind(from).bind(to).execute(executor).await?;

        Ok(result.rows_affected())
    }

    /// Congela os preços atuais do catálogo da empresa numa hoja.
    pub async fn snapshot_live_prices<'e, E>(
        &self,
        executor: E,
        kind: SheetKind,
        company_id: Uuid,
        sheet_id: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let currency = if kind.has_currency() { ", currency" } else { "" };
        let sql = format!(
            r#"
            INSERT INTO {lines} (sheet_id, {columns})
            SELECT $1, id, qty_per_sale_unit, sale_unit_price{currency}
            FROM {resources} WHERE company_id = $2
            "#,
            lines = kind.line_table(),
            columns = kind.line_value_columns(),
            resources = kind.resource_table(),
        );
        let result = sqlx::query(&sql).bind(sheet_id).bind(company_id).execute(executor).await?;

        Ok(result.rows_affected())
    }

    /// Cria ou atualiza o preço de um recurso na hoja.
    pub async fn upsert_line<'e, E>(
        &self,
        executor: E,
        kind: SheetKind,
        sheet_id: Uuid,
        resource_id: Uuid,
        qty_per_sale_unit: Decimal,
        sale_unit_price: Decimal,
        currency: Currency,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (values, update_currency) = if kind.has_currency() {
            ("$1, $2, $3, $4, $5", ", currency = EXCLUDED.currency")
        } else {
            ("$1, $2, $3, $4", "")
        };
        let sql = format!(
            r#"
            INSERT INTO {table} (sheet_id, {columns}) VALUES ({values})
            ON CONFLICT (sheet_id, {col}) DO UPDATE SET
                qty_per_sale_unit = EXCLUDED.qty_per_sale_unit,
                sale_unit_price = EXCLUDED.sale_unit_price{update_currency}
            "#,
            table = kind.line_table(),
            columns = kind.line_value_columns(),
            col = kind.resource_column(),
        );

        let mut query = sqlx::query(&sql)
            .bind(sheet_id)
            .bind(resource_id)
            .bind(qty_per_sale_unit)
            .bind(sale_unit_price);
        if kind.has_currency() {
            query = query.bind(currency);
        }
        let result = query.execute(executor).await?;

        Ok(result.rows_affected())
    }

    pub async fn list_lines<'e, E>(&self, executor: E, kind: SheetKind, sheet_id: Uuid) -> Result<Vec<SheetLine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT l.id, l.sheet_id, l.{col} AS resource_id, r.{name} AS resource_name,
                   l.qty_per_sale_unit, l.sale_unit_price, {currency} AS currency
            FROM {lines} l
            JOIN {resources} r ON r.id = l.{col}
            WHERE l.sheet_id = $1
            ORDER BY r.{name}
            "#,
            col = kind.resource_column(),
            name = kind.resource_name_column(),
            currency = kind.currency_expr("l"),
            lines = kind.line_table(),
            resources = kind.resource_table(),
        );
        let rows = sqlx::query_as::<_, SheetLine>(&sql)
            .bind(sheet_id)
            .fetch_all(executor)
            .await?;

        Ok(rows)
    }

    /// Todos os preços de uma hoja, para montar o contexto de custeio.
    pub async fn sheet_prices<'e, E>(&self, executor: E, kind: SheetKind, sheet_id: Uuid) -> Result<Vec<SheetPriceRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {col} AS resource_id, sale_unit_price, {currency} AS currency FROM {lines} l WHERE l.sheet_id = $1",
            col = kind.resource_column(),
            currency = kind.currency_expr("l"),
            lines = kind.line_table(),
        );
        let rows = sqlx::query_as::<_, SheetPriceRow>(&sql)
            .bind(sheet_id)
            .fetch_all(executor)
            .await?;

        Ok(rows)
    }

    /// Hoja pertence à empresa? Usado antes de editar linhas.
    pub async fn sheet_belongs_to(&self, kind: SheetKind, sheet_id: Uuid, company_id: Uuid) -> Result<bool, AppError> {
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1 AND company_id = $2)",
            kind.sheet_table()
        );
        let exists: bool = sqlx::query_scalar(&sql)
            .bind(sheet_id)
            .bind(company_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labor_lines_have_no_currency_column() {
        assert_eq!(SheetKind::Labor.line_value_columns(), "labor_id, qty_per_sale_unit, sale_unit_price");
        assert_eq!(SheetKind::Labor.currency_expr("l"), "'ARS'::currency_code");
        assert_eq!(
            SheetKind::Materials.line_value_columns(),
            "material_id, qty_per_sale_unit, sale_unit_price, currency"
        );
    }
}
