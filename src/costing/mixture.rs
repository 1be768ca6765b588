// src/costing/mixture.rs

use std::collections::HashMap;

use rust_decimal::Decimal;
use uuid::Uuid;

use super::pricing::SheetPrice;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MixtureComponent {
    pub material_id: Uuid,
    pub quantity: Decimal,
    /// Preço vivo do material (catálogo), usado quando a mistura não tem hoja.
    pub live_price: Decimal,
}

/// Custo por unidade de mistura = Σ quantidade × preço unitário.
///
/// Com hoja vinculada, o preço vem da hoja (zero se o material não estiver nela).
/// Sem hoja, usa o preço vivo de cada material.
pub fn mixture_unit_cost(
    components: &[MixtureComponent],
    bound_sheet: Option<&HashMap<Uuid, SheetPrice>>,
) -> Decimal {
    components
        .iter()
        .map(|c| {
            let price = match bound_sheet {
                Some(sheet) => sheet
                    .get(&c.material_id)
                    .map(|p| p.sale_unit_price)
                    .unwrap_or(Decimal::ZERO),
                None => c.live_price,
            };
            c.quantity * price
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costing::Currency;
    use rust_decimal_macros::dec;

    #[test]
    fn bound_mixture_prices_from_its_sheet() {
        let sand = Uuid::new_v4();
        let cement = Uuid::new_v4();
        let components = [
            MixtureComponent { material_id: sand, quantity: dec!(0.5), live_price: dec!(999) },
            MixtureComponent { material_id: cement, quantity: dec!(2), live_price: dec!(999) },
        ];

        let mut sheet = HashMap::new();
        sheet.insert(sand, SheetPrice { sale_unit_price: dec!(10), currency: Currency::Ars });
        sheet.insert(cement, SheetPrice { sale_unit_price: dec!(7), currency: Currency::Ars });

        assert_eq!(mixture_unit_cost(&components, Some(&sheet)), dec!(19));
    }

    #[test]
    fn material_missing_from_bound_sheet_counts_as_zero() {
        let sand = Uuid::new_v4();
        let components = [MixtureComponent { material_id: sand, quantity: dec!(3), live_price: dec!(5) }];
        let sheet = HashMap::new();

        assert_eq!(mixture_unit_cost(&components, Some(&sheet)), Decimal::ZERO);
    }

    #[test]
    fn unbound_mixture_uses_live_prices() {
        let components = [
            MixtureComponent { material_id: Uuid::new_v4(), quantity: dec!(3), live_price: dec!(5) },
            MixtureComponent { material_id: Uuid::new_v4(), quantity: dec!(1.5), live_price: dec!(2) },
        ];

        assert_eq!(mixture_unit_cost(&components, None), dec!(18));
    }
}
