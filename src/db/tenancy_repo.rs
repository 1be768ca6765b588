// src/db/tenancy_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::db_utils::on_conflict;
use crate::common::error::AppError;
use crate::models::tenancy::{Company, Membership, Section, UserCompany};

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Busca a associação do usuário com a empresa.
    /// É a verificação de autorização mais importante: sem ela, nada é escopado.
    pub async fn find_membership(&self, user_id: Uuid, company_id: Uuid) -> Result<Option<Membership>, AppError> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT id, user_id, company_id, is_admin, created_at
            FROM memberships
            WHERE user_id = $1 AND company_id = $2
            "#,
        )
        .bind(user_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(membership)
    }

    /// Administradores acessam todas as seções.
    pub async fn has_section(&self, membership: &Membership, section_code: &str) -> Result<bool, AppError> {
        if membership.is_admin {
            return Ok(true);
        }

        let allowed: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM membership_sections
                WHERE membership_id = $1 AND section_code = $2
            )
            "#,
        )
        .bind(membership.id)
        .bind(section_code)
        .fetch_one(&self.pool)
        .await?;

        Ok(allowed)
    }

    pub async fn create_company<'e, E>(&self, executor: E, name: &str) -> Result<Company, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let company = sqlx::query_as::<_, Company>(
            "INSERT INTO companies (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(name)
        .fetch_one(executor)
        .await?;

        Ok(company)
    }

    /// Busca por nome, sem diferenciar maiúsculas nem espaços nas pontas.
    pub async fn find_company_by_name<'e, E>(&self, executor: E, name: &str) -> Result<Option<Company>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let company = sqlx::query_as::<_, Company>(
            r#"
            SELECT id, name, created_at FROM companies
            WHERE lower(trim(name)) = lower(trim($1))
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(executor)
        .await?;

        Ok(company)
    }

    pub async fn count_members<'e, E>(&self, executor: E, company_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM memberships WHERE company_id = $1")
            .bind(company_id)
            .fetch_one(executor)
            .await?;

        Ok(count)
    }

    pub async fn add_member<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        user_id: Uuid,
        is_admin: bool,
    ) -> Result<Membership, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships (user_id, company_id, is_admin)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, company_id, is_admin, created_at
            "#,
        )
        .bind(user_id)
        .bind(company_id)
        .bind(is_admin)
        .fetch_one(executor)
        .await
        .map_err(on_conflict("O usuário já é membro desta empresa."))
    }

    /// Substitui as seções liberadas para a associação.
    pub async fn replace_sections(
        &self,
        conn: &mut sqlx::PgConnection,
        membership_id: Uuid,
        section_codes: &[String],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM membership_sections WHERE membership_id = $1")
            .bind(membership_id)
            .execute(&mut *conn)
            .await?;

        // Códigos desconhecidos são ignorados pelo JOIN com a tabela de seções
        sqlx::query(
            r#"
            INSERT INTO membership_sections (membership_id, section_code)
            SELECT $1, s.code
            FROM sections s
            WHERE s.code = ANY($2)
            "#,
        )
        .bind(membership_id)
        .bind(section_codes)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn companies_for_user(&self, user_id: Uuid) -> Result<Vec<UserCompany>, AppError> {
        let companies = sqlx::query_as::<_, UserCompany>(
            r#"
            SELECT
                c.id AS company_id,
                c.name AS company_name,
                m.is_admin,
                CASE WHEN m.is_admin
                    THEN ARRAY(SELECT code FROM sections ORDER BY code)
                    ELSE ARRAY(
                        SELECT ms.section_code FROM membership_sections ms
                        WHERE ms.membership_id = m.id
                        ORDER BY ms.section_code
                    )
                END AS sections
            FROM memberships m
            JOIN companies c ON c.id = m.company_id
            WHERE m.user_id = $1
            ORDER BY c.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(companies)
    }

    pub async fn list_sections(&self) -> Result<Vec<Section>, AppError> {
        let sections = sqlx::query_as::<_, Section>("SELECT code, name FROM sections ORDER BY code")
            .fetch_all(&self.pool)
            .await?;

        Ok(sections)
    }
}
