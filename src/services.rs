pub mod auth;
pub mod budget_service;
pub mod catalog_loader;
pub mod catalog_service;
pub mod costing_service;
pub mod lote_service;
pub mod purchase_service;
pub mod resource_service;
pub mod sheet_service;
pub mod tenancy_service;
