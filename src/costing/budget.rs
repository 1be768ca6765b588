// src/costing/budget.rs

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::pricing::{CostBucket, LotePricing, ResourceLine};
use super::task::{bucket_total, bucket_total_usd};

/// Custos de uma linha de presupuesto (tarefa × quantidade).
/// Os valores em USD usam a cotação do presupuesto, não a do lote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BudgetItemCost {
    pub quantity: Decimal,
    pub total_materials_mixtures: Decimal,
    pub total_labor_subcontracts: Decimal,
    pub total_general: Decimal,
    pub total_materials_mixtures_usd: Option<Decimal>,
    pub total_labor_subcontracts_usd: Option<Decimal>,
    pub total_general_usd: Option<Decimal>,
}

impl BudgetItemCost {
    pub fn compute(
        pricing: &LotePricing,
        lines: &[ResourceLine],
        quantity: Decimal,
        budget_rate: Option<Decimal>,
    ) -> Self {
        let materials = quantity * bucket_total(pricing, lines, CostBucket::MaterialsAndMixtures);
        let labor = quantity * bucket_total(pricing, lines, CostBucket::LaborAndSubcontracts);

        let materials_usd =
            bucket_total_usd(pricing, lines, CostBucket::MaterialsAndMixtures, budget_rate, quantity);
        let labor_usd =
            bucket_total_usd(pricing, lines, CostBucket::LaborAndSubcontracts, budget_rate, quantity);

        Self {
            quantity,
            total_materials_mixtures: materials,
            total_labor_subcontracts: labor,
            total_general: materials + labor,
            total_materials_mixtures_usd: materials_usd,
            total_labor_subcontracts_usd: labor_usd,
            total_general_usd: materials_usd.zip(labor_usd).map(|(m, l)| m + l),
        }
    }
}

/// Total do presupuesto em USD: desconhecido se qualquer item for desconhecido.
pub fn budget_total_usd<I>(items: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Option<Decimal>>,
{
    items.into_iter().sum()
}

// ---
// Quebra por rubro / subrubro
// ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownGroup {
    pub id: Uuid,
    pub name: String,
    pub total_usd: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChartSlice {
    pub label: String,
    pub value: Decimal,
    pub percentage: Decimal,
}

/// Soma os itens por grupo. Sem cotação no presupuesto, todo grupo fica desconhecido;
/// com cotação, itens desconhecidos contam como zero.
///
/// `groups` define a ordem e inclui grupos sem itens.
pub fn group_totals(
    groups: &[(Uuid, String)],
    items: &[(Uuid, Option<Decimal>)],
    budget_has_rate: bool,
) -> Vec<BreakdownGroup> {
    groups
        .iter()
        .map(|(id, name)| {
            let total_usd = budget_has_rate.then(|| {
                items
                    .iter()
                    .filter(|(group, _)| group == id)
                    .map(|(_, usd)| usd.unwrap_or(Decimal::ZERO))
                    .sum()
            });
            BreakdownGroup { id: *id, name: name.clone(), total_usd }
        })
        .collect()
}

/// Fatias do gráfico: só grupos positivos, percentual com uma casa decimal.
pub fn chart_slices(groups: &[BreakdownGroup], whole: Option<Decimal>) -> Vec<ChartSlice> {
    let Some(whole) = whole.filter(|w| *w > Decimal::ZERO) else {
        return Vec::new();
    };

    groups
        .iter()
        .filter_map(|g| {
            let value = g.total_usd.unwrap_or(Decimal::ZERO);
            (value > Decimal::ZERO).then(|| ChartSlice {
                label: g.name.clone(),
                value,
                percentage: (value / whole * Decimal::ONE_HUNDRED).round_dp(1),
            })
        })
        .collect()
}

/// Total de um conjunto de grupos (ex.: todos os subrubros de um rubro).
pub fn groups_total(groups: &[BreakdownGroup], budget_has_rate: bool) -> Option<Decimal> {
    budget_has_rate.then(|| groups.iter().map(|g| g.total_usd.unwrap_or(Decimal::ZERO)).sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costing::{Currency, ResourceRef, SheetPrice};
    use rust_decimal_macros::dec;

    fn task() -> (LotePricing, Vec<ResourceLine>) {
        let brick = Uuid::new_v4();
        let mason = Uuid::new_v4();
        let mut pricing = LotePricing {
            material_sheet_id: Uuid::new_v4(),
            // A cotação do lote não participa dos totais do presupuesto.
            exchange_rate: Some(dec!(1)),
            ..Default::default()
        };
        pricing.materials.insert(brick, SheetPrice { sale_unit_price: dec!(20), currency: Currency::Ars });
        pricing.labor.insert(mason, dec!(80));
        let lines = vec![
            ResourceLine { resource: ResourceRef::Material(brick), quantity: dec!(5) },
            ResourceLine { resource: ResourceRef::Labor(mason), quantity: dec!(1) },
        ];
        (pricing, lines)
    }

    #[test]
    fn item_multiplies_buckets_by_quantity() {
        let (pricing, lines) = task();
        let cost = BudgetItemCost::compute(&pricing, &lines, dec!(10), Some(dec!(200)));

        assert_eq!(cost.total_materials_mixtures, dec!(1000));
        assert_eq!(cost.total_labor_subcontracts, dec!(800));
        assert_eq!(cost.total_general, dec!(1800));
        assert_eq!(cost.total_materials_mixtures_usd, Some(dec!(5)));
        assert_eq!(cost.total_labor_subcontracts_usd, Some(dec!(4)));
        assert_eq!(cost.total_general_usd, Some(dec!(9)));
    }

    #[test]
    fn item_usd_is_unknown_without_budget_rate() {
        let (pricing, lines) = task();
        let cost = BudgetItemCost::compute(&pricing, &lines, dec!(10), None);
        assert_eq!(cost.total_general, dec!(1800));
        assert_eq!(cost.total_general_usd, None);
    }

    #[test]
    fn budget_total_propagates_unknown() {
        assert_eq!(budget_total_usd([Some(dec!(1)), Some(dec!(2.5))]), Some(dec!(3.5)));
        assert_eq!(budget_total_usd([Some(dec!(1)), None]), None);
        assert_eq!(budget_total_usd(Vec::new()), Some(Decimal::ZERO));
    }

    #[test]
    fn breakdown_groups_and_chart() {
        let structure = Uuid::new_v4();
        let masonry = Uuid::new_v4();
        let painting = Uuid::new_v4();
        let groups = vec![
            (structure, "Estructura".to_string()),
            (masonry, "Albañilería".to_string()),
            (painting, "Pintura".to_string()),
        ];
        let items = vec![
            (structure, Some(dec!(60))),
            (masonry, Some(dec!(30))),
            (masonry, None),
            (structure, Some(dec!(10))),
        ];

        let totals = group_totals(&groups, &items, true);
        assert_eq!(totals[0].total_usd, Some(dec!(70)));
        assert_eq!(totals[1].total_usd, Some(dec!(30)));
        assert_eq!(totals[2].total_usd, Some(Decimal::ZERO));

        let slices = chart_slices(&totals, groups_total(&totals, true));
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].label, "Estructura");
        assert_eq!(slices[0].percentage, dec!(70.0));
        assert_eq!(slices[1].percentage, dec!(30.0));
    }

    #[test]
    fn breakdown_without_rate_is_unknown_and_has_no_chart() {
        let id = Uuid::new_v4();
        let totals = group_totals(&[(id, "Estructura".into())], &[(id, Some(dec!(5)))], false);
        assert_eq!(totals[0].total_usd, None);
        assert!(chart_slices(&totals, groups_total(&totals, false)).is_empty());
    }

    #[test]
    fn chart_percentage_rounds_to_one_decimal() {
        let groups = vec![
            BreakdownGroup { id: Uuid::new_v4(), name: "A".into(), total_usd: Some(dec!(1)) },
            BreakdownGroup { id: Uuid::new_v4(), name: "B".into(), total_usd: Some(dec!(2)) },
        ];
        let slices = chart_slices(&groups, Some(dec!(3)));
        assert_eq!(slices[0].percentage, dec!(33.3));
        assert_eq!(slices[1].percentage, dec!(66.7));
    }
}
