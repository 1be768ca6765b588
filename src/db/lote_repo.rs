// src/db/lote_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, FromRow, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::on_conflict, error::AppError},
    models::lote::{Lote, Task, TaskResource},
};

const LOTE_COLUMNS: &str = "id, company_id, name, material_sheet_id, labor_sheet_id, subcontract_sheet_id, \
     exchange_type_id, exchange_date, created_at";
const TASK_RESOURCE_COLUMNS: &str = "id, task_id, material_id, labor_id, subcontract_id, mixture_id, quantity";

/// Linha de tarefa com nome e unidade do recurso, para exibição e replicação.
#[derive(Debug, Clone, FromRow)]
pub struct TaskResourceDetail {
    #[sqlx(flatten)]
    pub line: TaskResource,
    pub resource_name: Option<String>,
    pub unit_name: Option<String>,
}

pub struct NewLote<'a> {
    pub name: &'a str,
    pub material_sheet_id: Uuid,
    pub labor_sheet_id: Uuid,
    pub subcontract_sheet_id: Uuid,
    pub exchange_type_id: Option<Uuid>,
    pub exchange_date: Option<NaiveDate>,
}

#[derive(Clone)]
pub struct LoteRepository {
    pool: PgPool,
}

impl LoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  LOTES
    // =========================================================================

    pub async fn insert_lote<'e, E>(&self, executor: E, company_id: Uuid, lote: &NewLote<'_>) -> Result<Lote, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO lotes (
                company_id, name, material_sheet_id, labor_sheet_id, subcontract_sheet_id,
                exchange_type_id, exchange_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {LOTE_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Lote>(&sql)
            .bind(company_id)
            .bind(lote.name)
            .bind(lote.material_sheet_id)
            .bind(lote.labor_sheet_id)
            .bind(lote.subcontract_sheet_id)
            .bind(lote.exchange_type_id)
            .bind(lote.exchange_date)
            .fetch_one(executor)
            .await
            .map_err(on_conflict("Já existe um lote com este nome."))
    }

    pub async fn find_lote<'e, E>(&self, executor: E, company_id: Uuid, id: Uuid) -> Result<Option<Lote>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {LOTE_COLUMNS} FROM lotes WHERE company_id = $1 AND id = $2");
        let lote = sqlx::query_as::<_, Lote>(&sql)
            .bind(company_id)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(lote)
    }

    pub async fn list_lotes(&self, company_id: Uuid) -> Result<Vec<Lote>, AppError> {
        let sql = format!("SELECT {LOTE_COLUMNS} FROM lotes WHERE company_id = $1 ORDER BY created_at DESC");
        let rows = sqlx::query_as::<_, Lote>(&sql)
            .bind(company_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    // =========================================================================
    //  TAREAS
    // =========================================================================

    pub async fn insert_task<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        lote_id: Uuid,
        trade_id: Uuid,
        sub_trade_id: Uuid,
        name: &str,
    ) -> Result<Task, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (company_id, lote_id, trade_id, sub_trade_id, name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, company_id, trade_id, sub_trade_id, lote_id, name
            "#,
        )
        .bind(company_id)
        .bind(lote_id)
        .bind(trade_id)
        .bind(sub_trade_id)
        .bind(name.trim())
        .fetch_one(executor)
        .await
        .map_err(on_conflict("Já existe uma tarefa com este nome no lote."))
    }

    pub async fn find_task<'e, E>(&self, executor: E, company_id: Uuid, id: Uuid) -> Result<Option<Task>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let task = sqlx::query_as::<_, Task>(
            "SELECT id, company_id, trade_id, sub_trade_id, lote_id, name FROM tasks WHERE company_id = $1 AND id = $2",
        )
        .bind(company_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(task)
    }

    pub async fn list_tasks<'e, E>(&self, executor: E, company_id: Uuid, lote_id: Uuid) -> Result<Vec<Task>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, Task>(
            r#"
            SELECT t.id, t.company_id, t.trade_id, t.sub_trade_id, t.lote_id, t.name
            FROM tasks t
            JOIN trades tr ON tr.id = t.trade_id
            JOIN sub_trades st ON st.id = t.sub_trade_id
            WHERE t.company_id = $1 AND t.lote_id = $2
            ORDER BY tr.name, st.name, t.name
            "#,
        )
        .bind(company_id)
        .bind(lote_id)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    pub async fn insert_task_resource<'e, E>(
        &self,
        executor: E,
        task_id: Uuid,
        material_id: Option<Uuid>,
        labor_id: Option<Uuid>,
        subcontract_id: Option<Uuid>,
        mixture_id: Option<Uuid>,
        quantity: Decimal,
    ) -> Result<TaskResource, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO task_resources (task_id, material_id, labor_id, subcontract_id, mixture_id, quantity)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {TASK_RESOURCE_COLUMNS}
            "#
        );
        sqlx::query_as::<_, TaskResource>(&sql)
            .bind(task_id)
            .bind(material_id)
            .bind(labor_id)
            .bind(subcontract_id)
            .bind(mixture_id)
            .bind(quantity)
            .fetch_one(executor)
            .await
            .map_err(on_conflict("Linha de tarefa duplicada."))
    }

    /// Linhas das tarefas pedidas, na ordem de inserção, com nome e unidade do recurso.
    pub async fn task_resources<'e, E>(&self, executor: E, task_ids: &[Uuid]) -> Result<Vec<TaskResourceDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, TaskResourceDetail>(
            r#"
            SELECT
                tr.id, tr.task_id, tr.material_id, tr.labor_id, tr.subcontract_id, tr.mixture_id, tr.quantity,
                COALESCE(mat.name, lab.task_name, sub.task_name, mix.name) AS resource_name,
                COALESCE(um.name, ul.name, us.name, ux.name) AS unit_name
            FROM task_resources tr
            LEFT JOIN materials mat ON mat.id = tr.material_id
            LEFT JOIN units um ON um.id = mat.sale_unit_id
            LEFT JOIN labor lab ON lab.id = tr.labor_id
            LEFT JOIN units ul ON ul.id = lab.sale_unit_id
            LEFT JOIN subcontracts sub ON sub.id = tr.subcontract_id
            LEFT JOIN units us ON us.id = sub.sale_unit_id
            LEFT JOIN mixtures mix ON mix.id = tr.mixture_id
            LEFT JOIN units ux ON ux.id = mix.mixture_unit_id
            WHERE tr.task_id = ANY($1)
            ORDER BY tr.task_id, tr.seq
            "#,
        )
        .bind(task_ids)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }
}
