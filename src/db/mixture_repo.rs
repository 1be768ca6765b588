// src/db/mixture_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, FromRow, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::on_conflict, error::AppError},
    models::sheets::{Mixture, MixtureComponentRow},
};

/// Componente com o preço vivo do material, para custear misturas sem hoja.
#[derive(Debug, Clone, FromRow)]
pub struct ComponentPriceRow {
    pub mixture_id: Uuid,
    pub sheet_id: Option<Uuid>,
    pub material_id: Option<Uuid>,
    pub quantity: Option<Decimal>,
    pub live_price: Option<Decimal>,
}

/// Mistura copiada para outra hoja: de onde veio e como se chama.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedMixture {
    pub source_id: Uuid,
    pub new_id: Uuid,
    pub name: String,
}

#[derive(Clone, Default)]
pub struct MixtureRepository;

impl MixtureRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create_mixture<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        mixture_unit_id: Uuid,
        sheet_id: Option<Uuid>,
        name: &str,
    ) -> Result<Mixture, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Mixture>(
            r#"
            INSERT INTO mixtures (company_id, mixture_unit_id, sheet_id, name)
            VALUES ($1, $2, $3, $4)
            RETURNING id, company_id, mixture_unit_id, sheet_id, name
            "#,
        )
        .bind(company_id)
        .bind(mixture_unit_id)
        .bind(sheet_id)
        .bind(name.trim())
        .fetch_one(executor)
        .await
        .map_err(on_conflict("Já existe uma mistura com este nome nesta hoja."))
    }

    pub async fn add_component<'e, E>(
        &self,
        executor: E,
        mixture_id: Uuid,
        material_id: Uuid,
        quantity: Decimal,
    ) -> Result<MixtureComponentRow, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, MixtureComponentRow>(
            r#"
            INSERT INTO mixture_components (mixture_id, material_id, quantity)
            VALUES ($1, $2, $3)
            RETURNING id, mixture_id, material_id, quantity
            "#,
        )
        .bind(mixture_id)
        .bind(material_id)
        .bind(quantity)
        .fetch_one(executor)
        .await
        .map_err(on_conflict("O material já faz parte da mistura."))
    }

    pub async fn find_mixture<'e, E>(&self, executor: E, company_id: Uuid, id: Uuid) -> Result<Option<Mixture>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mixture = sqlx::query_as::<_, Mixture>(
            "SELECT id, company_id, mixture_unit_id, sheet_id, name FROM mixtures WHERE company_id = $1 AND id = $2",
        )
        .bind(company_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(mixture)
    }

    pub async fn list_mixtures<'e, E>(&self, executor: E, company_id: Uuid, sheet_id: Option<Uuid>) -> Result<Vec<Mixture>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, Mixture>(
            r#"
            SELECT id, company_id, mixture_unit_id, sheet_id, name FROM mixtures
            WHERE company_id = $1 AND sheet_id IS NOT DISTINCT FROM $2
            ORDER BY name
            "#,
        )
        .bind(company_id)
        .bind(sheet_id)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    pub async fn list_components<'e, E>(&self, executor: E, mixture_id: Uuid) -> Result<Vec<MixtureComponentRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, MixtureComponentRow>(
            "SELECT id, mixture_id, material_id, quantity FROM mixture_components WHERE mixture_id = $1",
        )
        .bind(mixture_id)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    /// Componentes (com preço vivo) das misturas pedidas.
    /// Misturas sem componentes aparecem com colunas de componente nulas.
    pub async fn component_prices<'e, E>(&self, executor: E, mixture_ids: &[Uuid]) -> Result<Vec<ComponentPriceRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, ComponentPriceRow>(
            r#"
            SELECT m.id AS mixture_id, m.sheet_id, c.material_id, c.quantity, mat.sale_unit_price AS live_price
            FROM mixtures m
            LEFT JOIN mixture_components c ON c.mixture_id = m.id
            LEFT JOIN materials mat ON mat.id = c.material_id
            WHERE m.id = ANY($1)
            "#,
        )
        .bind(mixture_ids)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    /// Copia as misturas vinculadas a `from_sheet` (com os componentes) para `to_sheet`.
    pub async fn copy_mixtures(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        from_sheet: Uuid,
        to_sheet: Uuid,
    ) -> Result<Vec<CopiedMixture>, AppError> {
        let sources = self.list_mixtures(&mut *conn, company_id, Some(from_sheet)).await?;

        let mut copied = Vec::with_capacity(sources.len());
        for source in sources {
            let new_mixture = self
                .create_mixture(&mut *conn, company_id, source.mixture_unit_id, Some(to_sheet), &source.name)
                .await?;

            sqlx::query(
                r#"
                INSERT INTO mixture_components (mixture_id, material_id, quantity)
                SELECT $2, material_id, quantity FROM mixture_components WHERE mixture_id = $1
                "#,
            )
            .bind(source.id)
            .bind(new_mixture.id)
            .execute(&mut *conn)
            .await?;

            copied.push(CopiedMixture { source_id: source.id, new_id: new_mixture.id, name: new_mixture.name });
        }

        Ok(copied)
    }
}
