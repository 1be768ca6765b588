// src/costing/pricing.rs

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// --- Moeda ---
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "currency_code", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Ars,
    Usd,
}

/// O recurso referenciado por uma linha de tarefa. Sempre exatamente um.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum ResourceRef {
    Material(Uuid),
    Labor(Uuid),
    Subcontract(Uuid),
    Mixture(Uuid),
}

impl ResourceRef {
    /// Monta a referência a partir das quatro colunas anuláveis da linha.
    /// Devolve `None` se nenhuma ou mais de uma estiver preenchida.
    pub fn from_columns(
        material_id: Option<Uuid>,
        labor_id: Option<Uuid>,
        subcontract_id: Option<Uuid>,
        mixture_id: Option<Uuid>,
    ) -> Option<Self> {
        match (material_id, labor_id, subcontract_id, mixture_id) {
            (Some(id), None, None, None) => Some(Self::Material(id)),
            (None, Some(id), None, None) => Some(Self::Labor(id)),
            (None, None, Some(id), None) => Some(Self::Subcontract(id)),
            (None, None, None, Some(id)) => Some(Self::Mixture(id)),
            _ => None,
        }
    }

    /// Inverso de `from_columns`: (material, mão de obra, subcontrato, mistura).
    pub fn columns(&self) -> (Option<Uuid>, Option<Uuid>, Option<Uuid>, Option<Uuid>) {
        match *self {
            Self::Material(id) => (Some(id), None, None, None),
            Self::Labor(id) => (None, Some(id), None, None),
            Self::Subcontract(id) => (None, None, Some(id), None),
            Self::Mixture(id) => (None, None, None, Some(id)),
        }
    }

    pub fn bucket(&self) -> CostBucket {
        match self {
            Self::Material(_) | Self::Mixture(_) => CostBucket::MaterialsAndMixtures,
            Self::Labor(_) | Self::Subcontract(_) => CostBucket::LaborAndSubcontracts,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum CostBucket {
    MaterialsAndMixtures,
    LaborAndSubcontracts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLine {
    pub resource: ResourceRef,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetPrice {
    pub sale_unit_price: Decimal,
    pub currency: Currency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MixtureCost {
    /// Hoja de materiales à qual a mistura está vinculada (`None` = preços vivos).
    pub sheet_id: Option<Uuid>,
    pub unit_cost: Decimal,
}

// ---
// O "contexto de preços" de um Lote: as três hojas indexadas por recurso,
// as misturas conhecidas e a cotação do próprio lote.
// ---
#[derive(Debug, Clone, Default)]
pub struct LotePricing {
    pub material_sheet_id: Uuid,
    pub materials: HashMap<Uuid, SheetPrice>,
    pub labor: HashMap<Uuid, Decimal>,
    pub subcontracts: HashMap<Uuid, SheetPrice>,
    pub mixtures: HashMap<Uuid, MixtureCost>,
    pub exchange_rate: Option<Decimal>,
}

impl LotePricing {
    /// Preço unitário de um recurso dentro do lote. Linha ausente na hoja vale zero.
    /// Mistura só tem preço se estiver vinculada à hoja de materiais do lote.
    pub fn unit_price(&self, resource: ResourceRef) -> Decimal {
        match resource {
            ResourceRef::Material(id) => self
                .materials
                .get(&id)
                .map(|p| p.sale_unit_price)
                .unwrap_or(Decimal::ZERO),
            ResourceRef::Labor(id) => self.labor.get(&id).copied().unwrap_or(Decimal::ZERO),
            ResourceRef::Subcontract(id) => self
                .subcontracts
                .get(&id)
                .map(|p| p.sale_unit_price)
                .unwrap_or(Decimal::ZERO),
            ResourceRef::Mixture(id) => match self.mixtures.get(&id) {
                Some(m) if m.sheet_id == Some(self.material_sheet_id) => m.unit_cost,
                _ => Decimal::ZERO,
            },
        }
    }

    pub fn line_cost(&self, line: &ResourceLine) -> Decimal {
        line.quantity * self.unit_price(line.resource)
    }

    /// Moeda da linha: material e subcontrato seguem a hoja (ARS se ausente);
    /// mão de obra e mistura são sempre ARS.
    pub fn line_currency(&self, resource: ResourceRef) -> Currency {
        match resource {
            ResourceRef::Material(id) => self.materials.get(&id).map(|p| p.currency).unwrap_or_default(),
            ResourceRef::Subcontract(id) => self
                .subcontracts
                .get(&id)
                .map(|p| p.currency)
                .unwrap_or_default(),
            ResourceRef::Labor(_) | ResourceRef::Mixture(_) => Currency::Ars,
        }
    }

    /// Custo da linha em USD com uma cotação explícita.
    pub fn line_cost_usd_with_rate(&self, line: &ResourceLine, rate: Option<Decimal>) -> Option<Decimal> {
        to_usd(self.line_cost(line), self.line_currency(line.resource), rate)
    }

    /// Custo da linha em USD usando a cotação do próprio lote.
    pub fn line_cost_usd(&self, line: &ResourceLine) -> Option<Decimal> {
        self.line_cost_usd_with_rate(line, self.exchange_rate)
    }

    pub fn line_unit_price_usd(&self, line: &ResourceLine) -> Option<Decimal> {
        if line.quantity.is_zero() {
            return Some(Decimal::ZERO);
        }
        self.line_cost_usd(line).map(|usd| usd / line.quantity)
    }
}

/// Converte um valor para USD.
/// Zero é sempre zero; USD passa direto; ARS exige cotação positiva.
pub fn to_usd(amount: Decimal, currency: Currency, rate: Option<Decimal>) -> Option<Decimal> {
    if amount.is_zero() {
        return Some(Decimal::ZERO);
    }
    match currency {
        Currency::Usd => Some(amount),
        Currency::Ars => rate.filter(|r| *r > Decimal::ZERO).map(|r| amount / r),
    }
}
