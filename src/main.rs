//src/main.rs

use axum::{
    Router,
    routing::{delete, get, post},
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use presupuestos_backend::{
    config::{AppState, Config, connect},
    docs::ApiDoc,
    handlers,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // 1. Configuração e banco
    let config = Config::from_env()?;
    let db_pool = connect(&config.database_url, config.db_max_connections).await?;

    sqlx::migrate!().run(&db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app_state = AppState::new(db_pool, config.jwt_secret.clone());

    // 2. Rotas
    let company_routes = Router::new()
        .route("/", post(handlers::tenancy::create_company).get(handlers::tenancy::list_my_companies))
        .route("/members", post(handlers::tenancy::add_member));

    let catalog_routes = Router::new()
        .route(
            "/children/{catalog}",
            post(handlers::catalog::create_child).get(handlers::catalog::list_children),
        )
        .route(
            "/{catalog}",
            post(handlers::catalog::create_named).get(handlers::catalog::list_named),
        );

    let resource_routes = Router::new()
        .route(
            "/materials",
            post(handlers::resources::create_material).get(handlers::resources::list_materials),
        )
        .route(
            "/labor",
            post(handlers::resources::create_labor).get(handlers::resources::list_labor),
        )
        .route(
            "/subcontracts",
            post(handlers::resources::create_subcontract).get(handlers::resources::list_subcontracts),
        )
        .route("/bulk-price", post(handlers::resources::bulk_update_prices));

    let sheet_routes = Router::new()
        .route("/{kind}", get(handlers::sheets::list_sheets))
        .route(
            "/{kind}/{sheet_id}/lines",
            get(handlers::sheets::list_lines).put(handlers::sheets::upsert_line),
        );

    let mixture_routes = Router::new()
        .route("/", post(handlers::sheets::create_mixture).get(handlers::sheets::list_mixtures))
        .route("/{mixture_id}", get(handlers::sheets::get_mixture));

    let lote_routes = Router::new()
        .route("/", post(handlers::lotes::create_lote).get(handlers::lotes::list_lotes))
        .route("/{lote_id}", get(handlers::lotes::get_lote))
        .route("/{lote_id}/tasks", get(handlers::lotes::list_tasks))
        .route("/{lote_id}/costs", get(handlers::lotes::lote_costs));

    let task_routes = Router::new()
        .route("/", post(handlers::lotes::create_task))
        .route("/{task_id}/resources", post(handlers::lotes::add_task_resource))
        .route("/{task_id}/cost", get(handlers::lotes::task_cost));

    let budget_routes = Router::new()
        .route("/", post(handlers::budgets::create_budget).get(handlers::budgets::list_budgets))
        .route("/{budget_id}", get(handlers::budgets::budget_summary))
        .route("/{budget_id}/toggle", post(handlers::budgets::toggle_budget))
        .route("/{budget_id}/items", post(handlers::budgets::add_item))
        .route("/{budget_id}/items/{item_id}", delete(handlers::budgets::delete_item))
        .route("/{budget_id}/breakdown", get(handlers::budgets::budget_breakdown));

    let purchase_routes = Router::new()
        .route("/", post(handlers::purchases::create_purchase))
        .route(
            "/weeks",
            post(handlers::purchases::create_week).get(handlers::purchases::list_weeks),
        )
        .route("/weeks/{week_id}", get(handlers::purchases::week_detail));

    let payroll_routes = Router::new().route("/labor", get(handlers::payroll::list_crew_rates));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/sections", get(handlers::tenancy::list_sections))
        .route(
            "/api/providers",
            post(handlers::catalog::create_provider).get(handlers::catalog::list_providers),
        )
        .route(
            "/api/exchange-rates",
            post(handlers::catalog::create_exchange_rate).get(handlers::catalog::list_exchange_rates),
        )
        .route(
            "/api/projects",
            post(handlers::catalog::create_project).get(handlers::catalog::list_projects),
        )
        .nest("/api/companies", company_routes)
        .nest("/api/catalog", catalog_routes)
        .nest("/api/resources", resource_routes)
        .nest("/api/sheets", sheet_routes)
        .nest("/api/mixtures", mixture_routes)
        .nest("/api/lotes", lote_routes)
        .nest("/api/tasks", task_routes)
        .nest("/api/budgets", budget_routes)
        .nest("/api/purchases", purchase_routes)
        .nest("/api/payroll", payroll_routes)
        .with_state(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // 3. Servidor
    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
