// src/models/resources.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::costing::Currency;
use crate::models::catalog::{validate_not_negative, validate_positive};

// --- 1. Material ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    pub provider_id: Option<Uuid>,
    pub material_type_id: Uuid,
    pub category_id: Uuid,
    pub sale_unit_id: Uuid,
    #[schema(example = "Cemento Portland 50kg")]
    pub name: String,
    pub qty_per_sale_unit: Decimal,
    #[schema(example = "8500.00")]
    pub sale_unit_price: Decimal,
    pub currency: Currency,
}

// --- 2. Mão de obra (sempre em ARS) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Labor {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    pub trade_id: Uuid,
    pub sub_trade_id: Uuid,
    pub crew_id: Uuid,
    pub crew_ref_id: Uuid,
    pub sale_unit_id: Uuid,
    #[schema(example = "Levantar muro de ladrillo hueco")]
    pub task_name: String,
    pub qty_per_sale_unit: Decimal,
    pub sale_unit_price: Decimal,
}

// --- 3. Subcontrato ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subcontract {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    pub trade_id: Uuid,
    pub sub_trade_id: Uuid,
    pub provider_id: Option<Uuid>,
    pub sale_unit_id: Uuid,
    pub task_name: String,
    pub qty_per_sale_unit: Decimal,
    pub sale_unit_price: Decimal,
    pub currency: Currency,
}

fn default_qty() -> Decimal {
    Decimal::ONE
}

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaterialPayload {
    pub provider_id: Option<Uuid>,
    pub material_type_id: Uuid,
    pub category_id: Uuid,
    pub sale_unit_id: Uuid,
    #[validate(custom(function = "crate::models::catalog::validate_not_blank", message = "O nome é obrigatório."))]
    pub name: String,
    #[serde(default = "default_qty")]
    #[validate(custom(function = "validate_positive"))]
    pub qty_per_sale_unit: Decimal,
    #[validate(custom(function = "validate_not_negative"))]
    pub sale_unit_price: Decimal,
    #[serde(default)]
    pub currency: Currency,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LaborPayload {
    pub trade_id: Uuid,
    pub sub_trade_id: Uuid,
    pub crew_id: Uuid,
    pub crew_ref_id: Uuid,
    pub sale_unit_id: Uuid,
    #[validate(custom(function = "crate::models::catalog::validate_not_blank", message = "A tarefa é obrigatória."))]
    pub task_name: String,
    #[serde(default = "default_qty")]
    #[validate(custom(function = "validate_positive"))]
    pub qty_per_sale_unit: Decimal,
    #[validate(custom(function = "validate_not_negative"))]
    pub sale_unit_price: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubcontractPayload {
    pub trade_id: Uuid,
    pub sub_trade_id: Uuid,
    pub provider_id: Option<Uuid>,
    pub sale_unit_id: Uuid,
    #[validate(custom(function = "crate::models::catalog::validate_not_blank", message = "A tarefa é obrigatória."))]
    pub task_name: String,
    #[serde(default = "default_qty")]
    #[validate(custom(function = "validate_positive"))]
    pub qty_per_sale_unit: Decimal,
    #[validate(custom(function = "validate_not_negative"))]
    pub sale_unit_price: Decimal,
    #[serde(default)]
    pub currency: Currency,
}

/// Maior reajuste aceito numa só operação, em porcentagem.
pub const MAX_PERCENTAGE: Decimal = Decimal::ONE_THOUSAND;

/// Reajuste em massa: acima de -100% (preço continua positivo) e até `MAX_PERCENTAGE`.
fn validate_percentage(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= -Decimal::ONE_HUNDRED || *val > MAX_PERCENTAGE {
        let mut err = ValidationError::new("range");
        err.message = Some("O percentual deve ser maior que -100 e no máximo 1000.".into());
        return Err(err);
    }
    Ok(())
}

/// Alvos do reajuste percentual em massa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum PriceTable {
    Materials,
    Labor,
    Subcontracts,
    MaterialSheetLines,
    LaborSheetLines,
    SubcontractSheetLines,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkPricePayload {
    pub table: PriceTable,
    #[validate(length(min = 1, message = "Selecione ao menos um registro."))]
    pub ids: Vec<Uuid>,
    #[validate(custom(function = "validate_percentage"))]
    #[schema(example = "12.5")]
    pub percentage: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkPriceResult {
    pub updated: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bulk(percentage: Decimal) -> BulkPricePayload {
        BulkPricePayload { table: PriceTable::Materials, ids: vec![Uuid::new_v4()], percentage }
    }

    #[test]
    fn percentage_must_keep_prices_positive() {
        for pct in [dec!(-100), dec!(-150)] {
            let errors = bulk(pct).validate().unwrap_err();
            assert!(errors.field_errors().contains_key("percentage"), "{pct}");
        }
        assert!(bulk(dec!(-99.99)).validate().is_ok());
    }

    #[test]
    fn percentage_has_an_upper_bound() {
        assert!(bulk(MAX_PERCENTAGE).validate().is_ok());
        assert!(bulk(dec!(1000.01)).validate().is_err());
        assert!(bulk(dec!(12.5)).validate().is_ok());
    }

    #[test]
    fn empty_selection_is_rejected() {
        let payload = BulkPricePayload { ids: Vec::new(), ..bulk(dec!(5)) };
        assert!(payload.validate().unwrap_err().field_errors().contains_key("ids"));
    }
}
