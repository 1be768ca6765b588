// src/models/lote.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::costing::{CostBucket, Currency, ResourceRef};
use crate::models::sheets::SheetKind;

// ---
// 1. Lote: um conjunto versionado de três hojas de precios
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lote {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    #[schema(example = "Lote Marzo 2025")]
    pub name: String,
    pub material_sheet_id: Uuid,
    pub labor_sheet_id: Uuid,
    pub subcontract_sheet_id: Uuid,
    pub exchange_type_id: Option<Uuid>,
    pub exchange_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Lote {
    pub fn sheet_id(&self, kind: SheetKind) -> Uuid {
        match kind {
            SheetKind::Materials => self.material_sheet_id,
            SheetKind::Labor => self.labor_sheet_id,
            SheetKind::Subcontracts => self.subcontract_sheet_id,
        }
    }
}

/// De onde sai o conteúdo de cada hoja do novo lote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(tag = "source", content = "loteId", rename_all = "camelCase")]
pub enum SheetSource {
    /// Hoja vazia.
    #[default]
    Empty,
    /// Snapshot dos preços atuais do catálogo.
    Live,
    /// Cópia da hoja do mesmo tipo de outro lote.
    Lote(Uuid),
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLotePayload {
    #[validate(custom(function = "crate::models::catalog::validate_not_blank", message = "O nome do lote é obrigatório."))]
    pub name: String,
    #[serde(default)]
    pub materials_source: SheetSource,
    #[serde(default)]
    pub labor_source: SheetSource,
    #[serde(default)]
    pub subcontracts_source: SheetSource,
    /// Lote cujas misturas (vinculadas à sua hoja de materiais) serão copiadas.
    pub mixtures_from: Option<Uuid>,
    /// Lote cujo maestro de tarefas será replicado.
    pub tasks_from: Option<Uuid>,
    pub exchange_type_id: Option<Uuid>,
    pub exchange_date: Option<NaiveDate>,
}

impl CreateLotePayload {
    /// Lote com as três hojas vazias e sem cotação.
    pub fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            materials_source: SheetSource::Empty,
            labor_source: SheetSource::Empty,
            subcontracts_source: SheetSource::Empty,
            mixtures_from: None,
            tasks_from: None,
            exchange_type_id: None,
            exchange_date: None,
        }
    }

    pub fn source(&self, kind: SheetKind) -> SheetSource {
        match kind {
            SheetKind::Materials => self.materials_source,
            SheetKind::Labor => self.labor_source,
            SheetKind::Subcontracts => self.subcontracts_source,
        }
    }
}

// ---
// 2. Tarea e as suas linhas
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    pub trade_id: Uuid,
    pub sub_trade_id: Uuid,
    pub lote_id: Uuid,
    #[schema(example = "Contrapiso e=8cm")]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskResource {
    pub id: Uuid,
    pub task_id: Uuid,
    pub material_id: Option<Uuid>,
    pub labor_id: Option<Uuid>,
    pub subcontract_id: Option<Uuid>,
    pub mixture_id: Option<Uuid>,
    pub quantity: Decimal,
}

impl TaskResource {
    pub fn resource(&self) -> Option<ResourceRef> {
        ResourceRef::from_columns(self.material_id, self.labor_id, self.subcontract_id, self.mixture_id)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    pub trade_id: Uuid,
    pub sub_trade_id: Uuid,
    pub lote_id: Uuid,
    #[validate(custom(function = "crate::models::catalog::validate_not_blank", message = "O nome é obrigatório."))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskResourcePayload {
    pub material_id: Option<Uuid>,
    pub labor_id: Option<Uuid>,
    pub subcontract_id: Option<Uuid>,
    pub mixture_id: Option<Uuid>,
    pub quantity: Decimal,
}

// ---
// 3. Respostas de custeio
// ---
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskCostLine {
    pub id: Uuid,
    pub resource: ResourceRef,
    pub bucket: CostBucket,
    pub resource_name: String,
    pub unit: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub currency: Currency,
    pub total: Decimal,
    pub total_usd: Option<Decimal>,
    pub unit_price_usd: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskCost {
    pub task: Task,
    pub unit: String,
    pub lines: Vec<TaskCostLine>,
    pub total: Decimal,
    /// `None` quando alguma linha em ARS não tem cotação no lote.
    pub total_usd: Option<Decimal>,
    pub materials_mixtures: Decimal,
    pub labor_subcontracts: Decimal,
}
