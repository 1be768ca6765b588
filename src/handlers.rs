pub mod budgets;
pub mod catalog;
pub mod lotes;
pub mod payroll;
pub mod purchases;
pub mod resources;
pub mod sheets;
pub mod tenancy;
