// src/db/budget_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::on_conflict, error::AppError},
    models::budget::{Budget, BudgetItem, BudgetPayload},
};

const BUDGET_COLUMNS: &str = "id, company_id, project_id, lote_id, budget_date, instance, \
     exchange_type_id, exchange_date, active, created_at";

#[derive(Clone)]
pub struct BudgetRepository {
    pool: PgPool,
}

impl BudgetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_budget<'e, E>(&self, executor: E, company_id: Uuid, payload: &BudgetPayload) -> Result<Budget, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO budgets (
                company_id, project_id, lote_id, budget_date, instance, exchange_type_id, exchange_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {BUDGET_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Budget>(&sql)
            .bind(company_id)
            .bind(payload.project_id)
            .bind(payload.lote_id)
            .bind(payload.budget_date)
            .bind(payload.instance.trim())
            .bind(payload.exchange_type_id)
            .bind(payload.exchange_date)
            .fetch_one(executor)
            .await
            .map_err(on_conflict("Já existe um presupuesto com esta instância para a obra."))
    }

    pub async fn find_budget<'e, E>(&self, executor: E, company_id: Uuid, id: Uuid) -> Result<Option<Budget>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {BUDGET_COLUMNS} FROM budgets WHERE company_id = $1 AND id = $2");
        let budget = sqlx::query_as::<_, Budget>(&sql)
            .bind(company_id)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(budget)
    }

    /// Lista presupuestos; `active` filtra ativos/inativos, `None` traz todos.
    pub async fn list_budgets(&self, company_id: Uuid, active: Option<bool>) -> Result<Vec<Budget>, AppError> {
        let sql = format!(
            r#"
            SELECT {BUDGET_COLUMNS} FROM budgets
            WHERE company_id = $1 AND ($2::boolean IS NULL OR active = $2)
            ORDER BY budget_date DESC, instance
            "#
        );
        let rows = sqlx::query_as::<_, Budget>(&sql)
            .bind(company_id)
            .bind(active)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn toggle_active(&self, company_id: Uuid, id: Uuid) -> Result<Option<Budget>, AppError> {
        let sql = format!(
            "UPDATE budgets SET active = NOT active WHERE company_id = $1 AND id = $2 RETURNING {BUDGET_COLUMNS}"
        );
        let budget = sqlx::query_as::<_, Budget>(&sql)
            .bind(company_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(budget)
    }

    pub async fn add_item<'e, E>(&self, executor: E, budget_id: Uuid, task_id: Uuid, quantity: Decimal) -> Result<BudgetItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, BudgetItem>(
            r#"
            INSERT INTO budget_items (budget_id, task_id, quantity)
            VALUES ($1, $2, $3)
            RETURNING id, budget_id, task_id, quantity
            "#,
        )
        .bind(budget_id)
        .bind(task_id)
        .bind(quantity)
        .fetch_one(executor)
        .await
        .map_err(on_conflict("A tarefa já está no presupuesto."))
    }

    pub async fn list_items<'e, E>(&self, executor: E, budget_id: Uuid) -> Result<Vec<BudgetItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, BudgetItem>(
            r#"
            SELECT bi.id, bi.budget_id, bi.task_id, bi.quantity
            FROM budget_items bi
            JOIN tasks t ON t.id = bi.task_id
            JOIN trades tr ON tr.id = t.trade_id
            JOIN sub_trades st ON st.id = t.sub_trade_id
            WHERE bi.budget_id = $1
            ORDER BY tr.name, st.name, t.name
            "#,
        )
        .bind(budget_id)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    pub async fn delete_item(&self, budget_id: Uuid, item_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM budget_items WHERE budget_id = $1 AND id = $2")
            .bind(budget_id)
            .bind(item_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
