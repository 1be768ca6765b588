// src/models/catalog.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// --- Catálogos planos (nome único por empresa) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NamedEntry {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    pub name: String,
}

// --- Entrada filha (subrubro, categoria, referência de equipo) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChildEntry {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    pub parent_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    pub exchange_type_id: Uuid,
    pub rate_date: NaiveDate,
    #[schema(example = "1050.5")]
    pub value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    #[schema(example = "Edificio Belgrano")]
    pub name: String,
    pub address: String,
    pub floors: String,
    pub buildable_m2: Option<Decimal>,
    pub sellable_m2: Option<Decimal>,
    pub land_value: Option<Decimal>,
}

/// Tabelas de catálogo plano. Cada variante sabe a sua tabela e o nome de exibição.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum NamedCatalog {
    Trades,
    Units,
    MaterialTypes,
    Crews,
    ExchangeTypes,
}

impl NamedCatalog {
    pub fn table(&self) -> &'static str {
        match self {
            Self::Trades => "trades",
            Self::Units => "units",
            Self::MaterialTypes => "material_types",
            Self::Crews => "crews",
            Self::ExchangeTypes => "exchange_types",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Trades => "Rubro",
            Self::Units => "Unidade",
            Self::MaterialTypes => "Tipo de material",
            Self::Crews => "Equipo",
            Self::ExchangeTypes => "Tipo de dólar",
        }
    }
}

/// Catálogos filhos: (tabela, coluna do pai, catálogo pai).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ChildCatalog {
    SubTrades,
    MaterialCategories,
    CrewRefs,
}

impl ChildCatalog {
    pub fn table(&self) -> &'static str {
        match self {
            Self::SubTrades => "sub_trades",
            Self::MaterialCategories => "material_categories",
            Self::CrewRefs => "crew_refs",
        }
    }

    pub fn parent_column(&self) -> &'static str {
        match self {
            Self::SubTrades => "trade_id",
            Self::MaterialCategories => "material_type_id",
            Self::CrewRefs => "crew_id",
        }
    }

    pub fn parent(&self) -> NamedCatalog {
        match self {
            Self::SubTrades => NamedCatalog::Trades,
            Self::MaterialCategories => NamedCatalog::MaterialTypes,
            Self::CrewRefs => NamedCatalog::Crews,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::SubTrades => "Subrubro",
            Self::MaterialCategories => "Categoria de material",
            Self::CrewRefs => "Referência de equipo",
        }
    }
}

// ---
// Payloads
// ---

pub(crate) fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

/// Texto obrigatório: só espaços conta como vazio.
pub(crate) fn validate_not_blank(val: &str) -> Result<(), ValidationError> {
    if val.trim().is_empty() {
        let mut err = ValidationError::new("length");
        err.message = Some("O campo é obrigatório.".into());
        return Err(err);
    }
    Ok(())
}

pub(crate) fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor deve ser maior que zero.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NamePayload {
    #[validate(custom(function = "validate_not_blank", message = "O nome é obrigatório."))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChildPayload {
    pub parent_id: Uuid,
    #[validate(custom(function = "validate_not_blank", message = "O nome é obrigatório."))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderPayload {
    #[validate(custom(function = "validate_not_blank", message = "O nome é obrigatório."))]
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRatePayload {
    pub exchange_type_id: Uuid,
    pub rate_date: NaiveDate,
    #[validate(custom(function = "validate_positive"))]
    pub value: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPayload {
    #[validate(custom(function = "validate_not_blank", message = "O nome é obrigatório."))]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub floors: String,
    pub buildable_m2: Option<Decimal>,
    pub sellable_m2: Option<Decimal>,
    pub land_value: Option<Decimal>,
}
