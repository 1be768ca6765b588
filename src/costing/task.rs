// src/costing/task.rs

use rust_decimal::Decimal;

use super::pricing::{CostBucket, LotePricing, ResourceLine};

/// Soma dos custos de todas as linhas da tarefa, na moeda de cada hoja.
pub fn task_total(pricing: &LotePricing, lines: &[ResourceLine]) -> Decimal {
    lines.iter().map(|l| pricing.line_cost(l)).sum()
}

/// Total em USD com a cotação do lote. Uma linha desconhecida torna o total desconhecido.
pub fn task_total_usd(pricing: &LotePricing, lines: &[ResourceLine]) -> Option<Decimal> {
    lines.iter().map(|l| pricing.line_cost_usd(l)).sum()
}

pub fn bucket_total(pricing: &LotePricing, lines: &[ResourceLine], bucket: CostBucket) -> Decimal {
    lines
        .iter()
        .filter(|l| l.resource.bucket() == bucket)
        .map(|l| pricing.line_cost(l))
        .sum()
}

/// Total do grupo em USD com uma cotação externa (a do presupuesto), multiplicado por `quantity`.
pub fn bucket_total_usd(
    pricing: &LotePricing,
    lines: &[ResourceLine],
    bucket: CostBucket,
    rate: Option<Decimal>,
    quantity: Decimal,
) -> Option<Decimal> {
    let unit: Option<Decimal> = lines
        .iter()
        .filter(|l| l.resource.bucket() == bucket)
        .map(|l| pricing.line_cost_usd_with_rate(l, rate))
        .sum();
    unit.map(|u| u * quantity)
}

/// Unidade da tarefa: a da primeira linha que tiver uma, senão "-".
pub fn task_unit<'a, I>(line_units: I) -> String
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    line_units
        .into_iter()
        .flatten()
        .next()
        .map(str::to_string)
        .unwrap_or_else(|| "-".to_string())
}
