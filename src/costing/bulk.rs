// src/costing/bulk.rs

use rust_decimal::Decimal;

/// Fator multiplicativo de um reajuste percentual: `1 + pct / 100`.
/// O mesmo fator é aplicado pelo `UPDATE` em massa no banco.
pub fn percentage_factor(percentage: Decimal) -> Decimal {
    Decimal::ONE + percentage / Decimal::ONE_HUNDRED
}

pub fn apply_percentage(price: Decimal, percentage: Decimal) -> Decimal {
    price * percentage_factor(percentage)
}
