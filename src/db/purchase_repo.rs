// src/db/purchase_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::on_conflict, error::AppError},
    models::purchases::{PaymentWeek, Purchase, PurchasePayload, PurchaseRow},
};

const PURCHASE_COLUMNS: &str = "id, week_id, project_id, trade_id, sub_trade_id, provider_id, item, \
     payment_method, total_amount, invoice_number, invoice_date, net_amount, iva_21, iva_105, \
     iibb_perception, amount_to_pay, notes, payment_percentage, status, is_subcontract";

#[derive(Clone)]
pub struct PurchaseRepository {
    pool: PgPool,
}

impl PurchaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  SEMANAS
    // =========================================================================

    pub async fn create_week<'e, E>(&self, executor: E, company_id: Uuid, monday: NaiveDate) -> Result<PaymentWeek, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, PaymentWeek>(
            r#"
            INSERT INTO payment_weeks (company_id, week_date) VALUES ($1, $2)
            RETURNING id, company_id, week_date
            "#,
        )
        .bind(company_id)
        .bind(monday)
        .fetch_one(executor)
        .await
        .map_err(on_conflict("Já existe uma semana de pagos para esta data."))
    }

    pub async fn list_weeks(&self, company_id: Uuid) -> Result<Vec<PaymentWeek>, AppError> {
        let rows = sqlx::query_as::<_, PaymentWeek>(
            "SELECT id, company_id, week_date FROM payment_weeks WHERE company_id = $1 ORDER BY week_date DESC",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn find_week(&self, company_id: Uuid, id: Uuid) -> Result<Option<PaymentWeek>, AppError> {
        let week = sqlx::query_as::<_, PaymentWeek>(
            "SELECT id, company_id, week_date FROM payment_weeks WHERE company_id = $1 AND id = $2",
        )
        .bind(company_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(week)
    }

    // =========================================================================
    //  COMPRAS
    // =========================================================================

    pub async fn create_purchase<'e, E>(&self, executor: E, p: &PurchasePayload) -> Result<Purchase, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO purchases (
                week_id, project_id, trade_id, sub_trade_id, provider_id, item,
                payment_method, total_amount, invoice_number, invoice_date, net_amount,
                iva_21, iva_105, iibb_perception, amount_to_pay, notes, payment_percentage,
                status, is_subcontract
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            RETURNING {PURCHASE_COLUMNS}
            "#
        );
        let purchase = sqlx::query_as::<_, Purchase>(&sql)
            .bind(p.week_id)
            .bind(p.project_id)
            .bind(p.trade_id)
            .bind(p.sub_trade_id)
            .bind(p.provider_id)
            .bind(p.item.trim())
            .bind(p.payment_method)
            .bind(p.total_amount)
            .bind(&p.invoice_number)
            .bind(p.invoice_date)
            .bind(p.net_amount)
            .bind(p.iva_21)
            .bind(p.iva_105)
            .bind(p.iibb_perception)
            .bind(p.amount_to_pay)
            .bind(&p.notes)
            .bind(p.payment_percentage)
            .bind(p.status)
            .bind(p.is_subcontract)
            .fetch_one(executor)
            .await?;

        Ok(purchase)
    }

    /// Compras da semana ordenadas por obra, rubro e subrubro.
    pub async fn list_purchases_for_week(&self, week_id: Uuid) -> Result<Vec<PurchaseRow>, AppError> {
        let rows = sqlx::query_as::<_, PurchaseRow>(
            r#"
            SELECT
                p.id, p.week_id, p.project_id, p.trade_id, p.sub_trade_id, p.provider_id, p.item,
                p.payment_method, p.total_amount, p.invoice_number, p.invoice_date, p.net_amount,
                p.iva_21, p.iva_105, p.iibb_perception, p.amount_to_pay, p.notes,
                p.payment_percentage, p.status, p.is_subcontract,
                o.name AS project_name,
                tr.name AS trade_name,
                st.name AS sub_trade_name,
                pr.name AS provider_name
            FROM purchases p
            JOIN projects o ON o.id = p.project_id
            JOIN trades tr ON tr.id = p.trade_id
            JOIN sub_trades st ON st.id = p.sub_trade_id
            JOIN providers pr ON pr.id = p.provider_id
            WHERE p.week_id = $1
            ORDER BY o.name, tr.name, st.name, p.item
            "#,
        )
        .bind(week_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
