// src/models/budget.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::costing::{BreakdownGroup, BudgetItemCost, ChartSlice};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    pub project_id: Uuid,
    pub lote_id: Uuid,
    pub budget_date: NaiveDate,
    #[schema(example = "Anteproyecto")]
    pub instance: String,
    pub exchange_type_id: Option<Uuid>,
    pub exchange_date: Option<NaiveDate>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BudgetItem {
    pub id: Uuid,
    pub budget_id: Uuid,
    pub task_id: Uuid,
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BudgetPayload {
    pub project_id: Uuid,
    pub lote_id: Uuid,
    pub budget_date: NaiveDate,
    #[validate(custom(function = "crate::models::catalog::validate_not_blank", message = "A instância é obrigatória."))]
    pub instance: String,
    pub exchange_type_id: Option<Uuid>,
    pub exchange_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BudgetItemPayload {
    pub task_id: Uuid,
    #[validate(custom(function = "crate::models::catalog::validate_positive"))]
    pub quantity: Decimal,
}

// ---
// Respostas de custeio
// ---
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BudgetItemView {
    pub id: Uuid,
    pub task_id: Uuid,
    pub task_name: String,
    pub trade_id: Uuid,
    pub sub_trade_id: Uuid,
    pub unit: String,
    #[serde(flatten)]
    pub cost: BudgetItemCost,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSummary {
    pub budget: Budget,
    pub exchange_rate: Option<Decimal>,
    pub items: Vec<BudgetItemView>,
    pub total_general: Decimal,
    /// `None` se qualquer item tiver total em USD desconhecido.
    pub total_usd: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BudgetBreakdown {
    pub budget_id: Uuid,
    /// Rubro filtrado, quando a quebra é por subrubro.
    pub trade_id: Option<Uuid>,
    pub groups: Vec<BreakdownGroup>,
    pub total_usd: Option<Decimal>,
    pub chart: Vec<ChartSlice>,
}
