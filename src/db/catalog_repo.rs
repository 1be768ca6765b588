// src/db/catalog_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::on_conflict, error::AppError, validation::RefOwner},
    models::catalog::{
        ChildCatalog, ChildEntry, ExchangeRate, NamedCatalog, NamedEntry, Project, ProjectPayload, Provider,
        ProviderPayload,
    },
};

/// Tabelas cujas linhas podem ser referenciadas por outro registro.
/// Usadas para validar dono (empresa) e pai hierárquico antes de gravar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnedTable {
    Named(NamedCatalog),
    Child(ChildCatalog),
    Provider,
    Project,
    Material,
    Labor,
    Subcontract,
    Mixture,
    MaterialSheet,
    Lote,
    Task,
    Budget,
    PaymentWeek,
}

impl OwnedTable {
    fn owner_query(&self) -> String {
        let (table, parent) = match self {
            Self::Named(c) => (c.table(), None),
            Self::Child(c) => (c.table(), Some(c.parent_column())),
            Self::Provider => ("providers", None),
            Self::Project => ("projects", None),
            Self::Material => ("materials", None),
            Self::Labor => ("labor", None),
            Self::Subcontract => ("subcontracts", None),
            Self::Mixture => ("mixtures", None),
            Self::MaterialSheet => ("material_sheets", None),
            Self::Lote => ("lotes", None),
            Self::Task => ("tasks", Some("lote_id")),
            Self::Budget => ("budgets", None),
            Self::PaymentWeek => ("payment_weeks", None),
        };
        format!(
            "SELECT company_id, {} AS parent_id FROM {} WHERE id = $1",
            parent.unwrap_or("NULL::uuid"),
            table
        )
    }
}

#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Dono e pai de uma linha referenciada. `None` se o id não existir.
    pub async fn find_owner(&self, table: OwnedTable, id: Uuid) -> Result<Option<RefOwner>, AppError> {
        self.find_owner_in(&self.pool, table, id).await
    }

    /// Mesma consulta de `find_owner`, dentro de uma transação aberta.
    pub async fn find_owner_in<'e, E>(&self, executor: E, table: OwnedTable, id: Uuid) -> Result<Option<RefOwner>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let owner = sqlx::query_as::<_, RefOwner>(&table.owner_query())
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(owner)
    }

    pub async fn find_owner_opt(&self, table: OwnedTable, id: Option<Uuid>) -> Result<Option<RefOwner>, AppError> {
        match id {
            Some(id) => self.find_owner(table, id).await,
            None => Ok(None),
        }
    }

    // =========================================================================
    //  CATÁLOGOS PLANOS
    // =========================================================================

    pub async fn list_named<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        catalog: NamedCatalog,
    ) -> Result<Vec<NamedEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT id, company_id, name FROM {} WHERE company_id = $1 ORDER BY name",
            catalog.table()
        );
        let rows = sqlx::query_as::<_, NamedEntry>(&sql)
            .bind(company_id)
            .fetch_all(executor)
            .await?;

        Ok(rows)
    }

    pub async fn create_named<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        catalog: NamedCatalog,
        name: &str,
    ) -> Result<NamedEntry, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO {} (company_id, name) VALUES ($1, $2) RETURNING id, company_id, name",
            catalog.table()
        );
        sqlx::query_as::<_, NamedEntry>(&sql)
            .bind(company_id)
            .bind(name.trim())
            .fetch_one(executor)
            .await
            .map_err(on_conflict("Já existe um registro com este nome."))
    }

    /// Insere se não existir. Devolve a linha e se ela foi criada agora.
    pub async fn upsert_named(
        &self,
        conn: &mut sqlx::PgConnection,
        company_id: Uuid,
        catalog: NamedCatalog,
        name: &str,
    ) -> Result<(NamedEntry, bool), AppError> {
        let insert = format!(
            r#"
            INSERT INTO {} (company_id, name) VALUES ($1, $2)
            ON CONFLICT (company_id, name) DO NOTHING
            RETURNING id, company_id, name
            "#,
            catalog.table()
        );
        if let Some(created) = sqlx::query_as::<_, NamedEntry>(&insert)
            .bind(company_id)
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?
        {
            return Ok((created, true));
        }

        let select = format!(
            "SELECT id, company_id, name FROM {} WHERE company_id = $1 AND name = $2",
            catalog.table()
        );
        let existing = sqlx::query_as::<_, NamedEntry>(&select)
            .bind(company_id)
            .bind(name)
            .fetch_one(&mut *conn)
            .await?;

        Ok((existing, false))
    }

    // =========================================================================
    //  CATÁLOGOS FILHOS (subrubro, categoria, referência de equipo)
    // =========================================================================

    pub async fn list_children<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        catalog: ChildCatalog,
        parent_id: Option<Uuid>,
    ) -> Result<Vec<ChildEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT id, company_id, {col} AS parent_id, name FROM {table}
            WHERE company_id = $1 AND ($2::uuid IS NULL OR {col} = $2)
            ORDER BY name
            "#,
            col = catalog.parent_column(),
            table = catalog.table()
        );
        let rows = sqlx::query_as::<_, ChildEntry>(&sql)
            .bind(company_id)
            .bind(parent_id)
            .fetch_all(executor)
            .await?;

        Ok(rows)
    }

    pub async fn create_child<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        catalog: ChildCatalog,
        parent_id: Uuid,
        name: &str,
    ) -> Result<ChildEntry, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO {table} (company_id, {col}, name) VALUES ($1, $2, $3)
            RETURNING id, company_id, {col} AS parent_id, name
            "#,
            col = catalog.parent_column(),
            table = catalog.table()
        );
        sqlx::query_as::<_, ChildEntry>(&sql)
            .bind(company_id)
            .bind(parent_id)
            .bind(name.trim())
            .fetch_one(executor)
            .await
            .map_err(on_conflict("Já existe um registro com este nome para o mesmo pai."))
    }

    pub async fn upsert_child(
        &self,
        conn: &mut sqlx::PgConnection,
        company_id: Uuid,
        catalog: ChildCatalog,
        parent_id: Uuid,
        name: &str,
    ) -> Result<(ChildEntry, bool), AppError> {
        let insert = format!(
            r#"
            INSERT INTO {table} (company_id, {col}, name) VALUES ($1, $2, $3)
            ON CONFLICT (company_id, {col}, name) DO NOTHING
            RETURNING id, company_id, {col} AS parent_id, name
            "#,
            col = catalog.parent_column(),
            table = catalog.table()
        );
        if let Some(created) = sqlx::query_as::<_, ChildEntry>(&insert)
            .bind(company_id)
            .bind(parent_id)
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?
        {
            return Ok((created, true));
        }

        let select = format!(
            r#"
            SELECT id, company_id, {col} AS parent_id, name FROM {table}
            WHERE company_id = $1 AND {col} = $2 AND name = $3
            "#,
            col = catalog.parent_column(),
            table = catalog.table()
        );
        let existing = sqlx::query_as::<_, ChildEntry>(&select)
            .bind(company_id)
            .bind(parent_id)
            .bind(name)
            .fetch_one(&mut *conn)
            .await?;

        Ok((existing, false))
    }

    // =========================================================================
    //  PROVEEDORES
    // =========================================================================

    pub async fn list_providers<'e, E>(&self, executor: E, company_id: Uuid) -> Result<Vec<Provider>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, Provider>(
            r#"
            SELECT id, company_id, name, address, phone, email
            FROM providers WHERE company_id = $1 ORDER BY name
            "#,
        )
        .bind(company_id)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    pub async fn create_provider<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        payload: &ProviderPayload,
    ) -> Result<Provider, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Provider>(
            r#"
            INSERT INTO providers (company_id, name, address, phone, email)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, company_id, name, address, phone, email
            "#,
        )
        .bind(company_id)
        .bind(payload.name.trim())
        .bind(payload.address.as_deref())
        .bind(payload.phone.as_deref())
        .bind(payload.email.as_deref())
        .fetch_one(executor)
        .await
        .map_err(on_conflict("Já existe um proveedor com este nome."))
    }

    /// Cria o proveedor só pelo nome, se ainda não existir. Devolve `true` quando criou.
    pub async fn upsert_provider<'e, E>(&self, executor: E, company_id: Uuid, name: &str) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO providers (company_id, name) VALUES ($1, $2)
            ON CONFLICT (company_id, name) DO NOTHING
            "#,
        )
        .bind(company_id)
        .bind(name)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    //  COTIZACIONES
    // =========================================================================

    pub async fn create_exchange_rate<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        exchange_type_id: Uuid,
        rate_date: NaiveDate,
        value: Decimal,
    ) -> Result<ExchangeRate, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ExchangeRate>(
            r#"
            INSERT INTO exchange_rates (company_id, exchange_type_id, rate_date, value)
            VALUES ($1, $2, $3, $4)
            RETURNING id, company_id, exchange_type_id, rate_date, value
            "#,
        )
        .bind(company_id)
        .bind(exchange_type_id)
        .bind(rate_date)
        .bind(value)
        .fetch_one(executor)
        .await
        .map_err(on_conflict("Já existe uma cotação para este tipo e data."))
    }

    pub async fn list_exchange_rates<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        exchange_type_id: Option<Uuid>,
    ) -> Result<Vec<ExchangeRate>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, ExchangeRate>(
            r#"
            SELECT id, company_id, exchange_type_id, rate_date, value
            FROM exchange_rates
            WHERE company_id = $1 AND ($2::uuid IS NULL OR exchange_type_id = $2)
            ORDER BY rate_date DESC
            "#,
        )
        .bind(company_id)
        .bind(exchange_type_id)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    /// Cotação exata por (empresa, data, tipo). Sem tipo ou sem data, não há cotação.
    pub async fn find_rate<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        exchange_type_id: Option<Uuid>,
        rate_date: Option<NaiveDate>,
    ) -> Result<Option<Decimal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (Some(exchange_type_id), Some(rate_date)) = (exchange_type_id, rate_date) else {
            return Ok(None);
        };

        let value: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT value FROM exchange_rates
            WHERE company_id = $1 AND exchange_type_id = $2 AND rate_date = $3
            "#,
        )
        .bind(company_id)
        .bind(exchange_type_id)
        .bind(rate_date)
        .fetch_optional(executor)
        .await?;

        Ok(value)
    }

    // =========================================================================
    //  OBRAS
    // =========================================================================

    pub async fn list_projects<'e, E>(&self, executor: E, company_id: Uuid) -> Result<Vec<Project>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, company_id, name, address, floors, buildable_m2, sellable_m2, land_value
            FROM projects WHERE company_id = $1 ORDER BY name
            "#,
        )
        .bind(company_id)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    pub async fn create_project<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        payload: &ProjectPayload,
    ) -> Result<Project, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (company_id, name, address, floors, buildable_m2, sellable_m2, land_value)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, company_id, name, address, floors, buildable_m2, sellable_m2, land_value
            "#,
        )
        .bind(company_id)
        .bind(payload.name.trim())
        .bind(&payload.address)
        .bind(&payload.floors)
        .bind(payload.buildable_m2)
        .bind(payload.sellable_m2)
        .bind(payload.land_value)
        .fetch_one(executor)
        .await
        .map_err(on_conflict("Já existe uma obra com este nome."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_query_selects_parent_column_for_children() {
        let sql = OwnedTable::Child(ChildCatalog::SubTrades).owner_query();
        assert_eq!(sql, "SELECT company_id, trade_id AS parent_id FROM sub_trades WHERE id = $1");
    }

    #[test]
    fn owner_query_uses_null_parent_for_flat_tables() {
        let sql = OwnedTable::Named(NamedCatalog::Units).owner_query();
        assert_eq!(sql, "SELECT company_id, NULL::uuid AS parent_id FROM units WHERE id = $1");
    }
}
