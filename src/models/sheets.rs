// src/models/sheets.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::costing::Currency;

/// Os três tipos de hoja de precios. Cada um tem a sua tabela de cabeçalho e de linhas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum SheetKind {
    Materials,
    Labor,
    Subcontracts,
}

impl SheetKind {
    pub const ALL: [SheetKind; 3] = [SheetKind::Materials, SheetKind::Labor, SheetKind::Subcontracts];

    pub fn sheet_table(&self) -> &'static str {
        match self {
            Self::Materials => "material_sheets",
            Self::Labor => "labor_sheets",
            Self::Subcontracts => "subcontract_sheets",
        }
    }

    pub fn line_table(&self) -> &'static str {
        match self {
            Self::Materials => "material_sheet_lines",
            Self::Labor => "labor_sheet_lines",
            Self::Subcontracts => "subcontract_sheet_lines",
        }
    }

    /// Coluna da linha que aponta para o recurso.
    pub fn resource_column(&self) -> &'static str {
        match self {
            Self::Materials => "material_id",
            Self::Labor => "labor_id",
            Self::Subcontracts => "subcontract_id",
        }
    }

    /// Tabela do catálogo de onde saem os preços vivos.
    pub fn resource_table(&self) -> &'static str {
        match self {
            Self::Materials => "materials",
            Self::Labor => "labor",
            Self::Subcontracts => "subcontracts",
        }
    }

    /// Mão de obra não tem moeda: é sempre ARS.
    pub fn has_currency(&self) -> bool {
        !matches!(self, Self::Labor)
    }
}

// --- Cabeçalho da hoja (snapshot) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriceSheet {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    pub name: String,
    /// Hoja da qual esta foi copiada, se houver.
    pub origin_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

// --- Linha de hoja (qualquer tipo) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SheetLine {
    pub id: Uuid,
    pub sheet_id: Uuid,
    pub resource_id: Uuid,
    pub resource_name: String,
    pub qty_per_sale_unit: Decimal,
    pub sale_unit_price: Decimal,
    pub currency: Currency,
}

// ---
// Mezcla
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Mixture {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    pub mixture_unit_id: Uuid,
    /// Hoja de materiais vinculada (`None` = preços vivos do catálogo).
    pub sheet_id: Option<Uuid>,
    #[schema(example = "Mortero de asiento 1:3")]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MixtureComponentRow {
    pub id: Uuid,
    pub mixture_id: Uuid,
    pub material_id: Uuid,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MixtureDetail {
    #[serde(flatten)]
    pub mixture: Mixture,
    pub components: Vec<MixtureComponentRow>,
    pub unit_cost: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MixtureComponentPayload {
    pub material_id: Uuid,
    #[validate(custom(function = "crate::models::catalog::validate_positive"))]
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MixturePayload {
    #[validate(custom(function = "crate::models::catalog::validate_not_blank", message = "O nome é obrigatório."))]
    pub name: String,
    pub mixture_unit_id: Uuid,
    pub sheet_id: Option<Uuid>,
    #[validate(nested)]
    #[serde(default)]
    pub components: Vec<MixtureComponentPayload>,
}

// ---
// Linha de hoja (edição manual)
// ---
fn default_qty() -> Decimal {
    Decimal::ONE
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SheetLinePayload {
    pub resource_id: Uuid,
    #[serde(default = "default_qty")]
    #[validate(custom(function = "crate::models::catalog::validate_positive"))]
    pub qty_per_sale_unit: Decimal,
    #[validate(custom(function = "crate::models::catalog::validate_not_negative"))]
    pub sale_unit_price: Decimal,
    /// Ignorada para mão de obra.
    #[serde(default)]
    pub currency: Currency,
}
