// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::costing;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Tenancy ---
        handlers::tenancy::create_company,
        handlers::tenancy::list_my_companies,
        handlers::tenancy::add_member,
        handlers::tenancy::list_sections,

        // --- Catalog ---
        handlers::catalog::list_named,
        handlers::catalog::create_named,
        handlers::catalog::list_children,
        handlers::catalog::create_child,
        handlers::catalog::list_providers,
        handlers::catalog::create_provider,
        handlers::catalog::list_exchange_rates,
        handlers::catalog::create_exchange_rate,
        handlers::catalog::list_projects,
        handlers::catalog::create_project,

        // --- Resources ---
        handlers::resources::list_materials,
        handlers::resources::create_material,
        handlers::resources::list_labor,
        handlers::resources::create_labor,
        handlers::resources::list_subcontracts,
        handlers::resources::create_subcontract,
        handlers::resources::bulk_update_prices,

        // --- Sheets ---
        handlers::sheets::list_sheets,
        handlers::sheets::list_lines,
        handlers::sheets::upsert_line,
        handlers::sheets::list_mixtures,
        handlers::sheets::create_mixture,
        handlers::sheets::get_mixture,

        // --- Lotes ---
        handlers::lotes::list_lotes,
        handlers::lotes::create_lote,
        handlers::lotes::get_lote,
        handlers::lotes::list_tasks,
        handlers::lotes::lote_costs,
        handlers::lotes::create_task,
        handlers::lotes::add_task_resource,
        handlers::lotes::task_cost,

        // --- Budgets ---
        handlers::budgets::list_budgets,
        handlers::budgets::create_budget,
        handlers::budgets::budget_summary,
        handlers::budgets::toggle_budget,
        handlers::budgets::add_item,
        handlers::budgets::delete_item,
        handlers::budgets::budget_breakdown,

        // --- Payroll ---
        handlers::payroll::list_crew_rates,

        // --- Purchases ---
        handlers::purchases::list_weeks,
        handlers::purchases::create_week,
        handlers::purchases::week_detail,
        handlers::purchases::create_purchase,
    ),
    components(
        schemas(
            // --- Custeio ---
            costing::Currency,
            costing::ResourceRef,
            costing::CostBucket,
            costing::BudgetItemCost,
            costing::BreakdownGroup,
            costing::ChartSlice,

            // --- Tenancy ---
            models::tenancy::Company,
            models::tenancy::Membership,
            models::tenancy::UserCompany,
            models::tenancy::Section,
            models::tenancy::CreateCompanyPayload,
            models::tenancy::AddMemberPayload,

            // --- Catalog ---
            models::catalog::NamedCatalog,
            models::catalog::ChildCatalog,
            models::catalog::NamedEntry,
            models::catalog::ChildEntry,
            models::catalog::Provider,
            models::catalog::ExchangeRate,
            models::catalog::Project,
            models::catalog::NamePayload,
            models::catalog::ChildPayload,
            models::catalog::ProviderPayload,
            models::catalog::ExchangeRatePayload,
            models::catalog::ProjectPayload,

            // --- Resources ---
            models::resources::Material,
            models::resources::Labor,
            models::resources::Subcontract,
            models::resources::MaterialPayload,
            models::resources::LaborPayload,
            models::resources::SubcontractPayload,
            models::resources::PriceTable,
            models::resources::BulkPricePayload,
            models::resources::BulkPriceResult,

            // --- Sheets ---
            models::sheets::SheetKind,
            models::sheets::PriceSheet,
            models::sheets::SheetLine,
            models::sheets::SheetLinePayload,
            models::sheets::Mixture,
            models::sheets::MixtureComponentRow,
            models::sheets::MixtureDetail,
            models::sheets::MixtureComponentPayload,
            models::sheets::MixturePayload,

            // --- Lotes ---
            models::lote::Lote,
            models::lote::SheetSource,
            models::lote::CreateLotePayload,
            models::lote::Task,
            models::lote::TaskResource,
            models::lote::TaskPayload,
            models::lote::TaskResourcePayload,
            models::lote::TaskCostLine,
            models::lote::TaskCost,

            // --- Budgets ---
            models::budget::Budget,
            models::budget::BudgetItem,
            models::budget::BudgetPayload,
            models::budget::BudgetItemPayload,
            models::budget::BudgetItemView,
            models::budget::BudgetSummary,
            models::budget::BudgetBreakdown,

            // --- Purchases ---
            models::purchases::PurchaseStatus,
            models::purchases::PaymentMethod,
            models::purchases::PaymentWeek,
            models::purchases::PaymentWeekPayload,
            models::purchases::Purchase,
            models::purchases::PurchasePayload,
            models::purchases::PurchaseRow,
            models::purchases::WeekDetail,
            models::purchases::MonthGroup,
            models::purchases::YearGroup,
        )
    ),
    tags(
        (name = "Tenancy", description = "Empresas, membros e seções"),
        (name = "Catalog", description = "Rubros, unidades, equipos, fornecedores, cotações e obras"),
        (name = "Resources", description = "Materiais, mão de obra e subcontratos"),
        (name = "Sheets", description = "Hojas de precios e mezclas"),
        (name = "Lotes", description = "Lotes, tarefas e custeio"),
        (name = "Budgets", description = "Presupuestos e quebras por rubro"),
        (name = "Payroll", description = "Consultas da seção de sueldos"),
        (name = "Purchases", description = "Semanas de pagamento e compras")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_company_header_and_bearer_scheme() {
        let doc = ApiDoc::openapi();

        let components = doc.components.as_ref().unwrap();
        assert!(components.security_schemes.contains_key("api_jwt"));

        assert!(doc.paths.paths.contains_key("/api/lotes"));
        assert!(doc.paths.paths.contains_key("/api/budgets/{budget_id}/breakdown"));
        assert!(doc.paths.paths.contains_key("/api/purchases/weeks"));
        assert!(doc.paths.paths.contains_key("/api/payroll/labor"));
    }
}
