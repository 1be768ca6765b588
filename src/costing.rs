// src/costing.rs

// Núcleo de custeio: funções puras sobre hojas de precios já carregadas.
// Nada aqui acessa o banco; os serviços montam um `LotePricing` e chamam estas funções.

pub mod budget;
pub mod bulk;
pub mod mixture;
pub mod pricing;
pub mod task;

pub use budget::{BreakdownGroup, BudgetItemCost, ChartSlice};
pub use bulk::percentage_factor;
pub use mixture::{MixtureComponent, mixture_unit_cost};
pub use pricing::{CostBucket, Currency, LotePricing, MixtureCost, ResourceLine, ResourceRef, SheetPrice};
