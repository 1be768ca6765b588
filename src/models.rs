pub mod auth;
pub mod budget;
pub mod catalog;
pub mod lote;
pub mod purchases;
pub mod resources;
pub mod sheets;
pub mod tenancy;
