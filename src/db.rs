pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;
pub mod catalog_repo;
pub use catalog_repo::{CatalogRepository, OwnedTable};
pub mod resource_repo;
pub use resource_repo::ResourceRepository;
pub mod sheet_repo;
pub use sheet_repo::PriceSheetRepository;
pub mod mixture_repo;
pub use mixture_repo::MixtureRepository;
pub mod lote_repo;
pub use lote_repo::LoteRepository;
pub mod budget_repo;
pub use budget_repo::BudgetRepository;
pub mod purchase_repo;
pub use purchase_repo::PurchaseRepository;
