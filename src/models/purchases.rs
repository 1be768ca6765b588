// src/models/purchases.rs

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::catalog::validate_not_negative;

// --- Enums ---
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "purchase_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "camelCase")]
pub enum PurchaseStatus {
    #[default]
    Pendiente,
    Pagado,
    Parcial,
    Cancelado,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_method", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "camelCase")]
pub enum PaymentMethod {
    Efectivo,
    #[default]
    Transferencia,
    Cheque,
    Tarjeta,
    Otro,
}

// ---
// Semana de pagos
// ---
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentWeek {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    /// Sempre uma segunda-feira.
    pub week_date: NaiveDate,
}

/// Normaliza qualquer data para a segunda-feira da sua semana.
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentWeekPayload {
    #[schema(example = "2025-03-12")]
    pub date: NaiveDate,
}

// ---
// Compra
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: Uuid,
    pub week_id: Uuid,
    pub project_id: Uuid,
    pub trade_id: Uuid,
    pub sub_trade_id: Uuid,
    pub provider_id: Uuid,
    pub item: String,
    pub payment_method: PaymentMethod,
    pub total_amount: Decimal,
    pub invoice_number: String,
    pub invoice_date: Option<NaiveDate>,
    pub net_amount: Option<Decimal>,
    pub iva_21: Decimal,
    pub iva_105: Decimal,
    pub iibb_perception: Decimal,
    pub amount_to_pay: Option<Decimal>,
    pub notes: String,
    pub payment_percentage: Option<Decimal>,
    pub status: PurchaseStatus,
    pub is_subcontract: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchasePayload {
    pub week_id: Uuid,
    pub project_id: Uuid,
    pub trade_id: Uuid,
    pub sub_trade_id: Uuid,
    pub provider_id: Uuid,
    #[validate(custom(function = "crate::models::catalog::validate_not_blank", message = "O item é obrigatório."))]
    pub item: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub total_amount: Decimal,
    #[serde(default)]
    pub invoice_number: String,
    pub invoice_date: Option<NaiveDate>,
    pub net_amount: Option<Decimal>,
    #[serde(default)]
    pub iva_21: Decimal,
    #[serde(default)]
    pub iva_105: Decimal,
    #[serde(default)]
    pub iibb_perception: Decimal,
    pub amount_to_pay: Option<Decimal>,
    #[serde(default)]
    pub notes: String,
    pub payment_percentage: Option<Decimal>,
    #[serde(default)]
    pub status: PurchaseStatus,
    #[serde(default)]
    pub is_subcontract: bool,
}

// ---
// Listagens
// ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRow {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub purchase: Purchase,
    pub project_name: String,
    pub trade_name: String,
    pub sub_trade_name: String,
    pub provider_name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeekDetail {
    pub week: PaymentWeek,
    pub purchases: Vec<PurchaseRow>,
    pub total: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct WeekFilter {
    pub year: Option<i32>,
    pub month: Option<u32>,
    /// Semana ISO do ano.
    pub week: Option<u32>,
}

impl WeekFilter {
    pub fn matches(&self, date: NaiveDate) -> bool {
        self.year.is_none_or(|y| date.year() == y)
            && self.month.is_none_or(|m| date.month() == m)
            && self.week.is_none_or(|w| date.iso_week().week() == w)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthGroup {
    pub month: u32,
    pub weeks: Vec<PaymentWeek>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct YearGroup {
    pub year: i32,
    pub months: Vec<MonthGroup>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monday_normalisation() {
        let wednesday = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();
        let monday = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2025, 3, 16).unwrap();

        assert_eq!(monday_of(wednesday), monday);
        assert_eq!(monday_of(monday), monday);
        assert_eq!(monday_of(sunday), monday);
    }

    #[test]
    fn monday_normalisation_crosses_month_boundary() {
        let saturday = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(monday_of(saturday), NaiveDate::from_ymd_opt(2025, 2, 24).unwrap());
    }

    #[test]
    fn week_filter_by_year_month_and_iso_week() {
        let monday = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

        assert!(WeekFilter::default().matches(monday));
        assert!(WeekFilter { year: Some(2025), month: Some(3), week: None }.matches(monday));
        assert!(WeekFilter { year: None, month: None, week: Some(11) }.matches(monday));
        assert!(!WeekFilter { year: Some(2024), month: None, week: None }.matches(monday));
        assert!(!WeekFilter { year: None, month: Some(4), week: None }.matches(monday));
    }
}
