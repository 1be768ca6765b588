// src/config.rs

use std::time::Duration;

use anyhow::Context;
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    db::{
        BudgetRepository, CatalogRepository, LoteRepository, MixtureRepository, PriceSheetRepository,
        PurchaseRepository, ResourceRepository, TenantRepository,
    },
    services::{
        auth::AuthService, budget_service::BudgetService, catalog_service::CatalogService,
        costing_service::CostingService, lote_service::LoteService, purchase_service::PurchaseService,
        resource_service::ResourceService, sheet_service::SheetService, tenancy_service::TenantService,
    },
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("DB_MAX_CONNECTIONS inválido: '{raw}'"))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self { database_url, jwt_secret, bind_addr, db_max_connections })
    }
}

pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect(database_url)
        .await
        .context("Falha ao conectar ao banco de dados")?;

    tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
    Ok(pool)
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub tenant_repo: TenantRepository,

    pub tenant_service: TenantService,
    pub catalog_service: CatalogService,
    pub resource_service: ResourceService,
    pub sheet_service: SheetService,
    pub lote_service: LoteService,
    pub costing_service: CostingService,
    pub budget_service: BudgetService,
    pub purchase_service: PurchaseService,
}

impl AppState {
    /// Monta o grafo de dependências sobre um pool já conectado.
    pub fn new(db_pool: PgPool, jwt_secret: String) -> Self {
        // --- Repositórios ---
        let tenant_repo = TenantRepository::new(db_pool.clone());
        let catalog_repo = CatalogRepository::new(db_pool.clone());
        let resource_repo = ResourceRepository::new(db_pool.clone());
        let sheet_repo = PriceSheetRepository::new(db_pool.clone());
        let mixture_repo = MixtureRepository::new();
        let lote_repo = LoteRepository::new(db_pool.clone());
        let budget_repo = BudgetRepository::new(db_pool.clone());
        let purchase_repo = PurchaseRepository::new(db_pool.clone());

        // --- Serviços ---
        let lote_service = LoteService::new(
            lote_repo.clone(),
            sheet_repo.clone(),
            mixture_repo.clone(),
            catalog_repo.clone(),
            db_pool.clone(),
        );
        let costing_service = CostingService::new(
            lote_repo,
            sheet_repo.clone(),
            mixture_repo.clone(),
            catalog_repo.clone(),
            db_pool.clone(),
        );

        Self {
            auth_service: AuthService::new(jwt_secret),
            tenant_service: TenantService::new(tenant_repo.clone(), lote_service.clone(), db_pool.clone()),
            catalog_service: CatalogService::new(catalog_repo.clone(), db_pool.clone()),
            resource_service: ResourceService::new(resource_repo, catalog_repo.clone(), db_pool.clone()),
            sheet_service: SheetService::new(sheet_repo, mixture_repo, catalog_repo.clone(), db_pool.clone()),
            budget_service: BudgetService::new(
                budget_repo,
                catalog_repo.clone(),
                costing_service.clone(),
                db_pool.clone(),
            ),
            purchase_service: PurchaseService::new(purchase_repo, catalog_repo, db_pool.clone()),
            lote_service,
            costing_service,
            tenant_repo,
            db_pool,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_vars_are_missing() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/presupuestos"),
            ("JWT_SECRET", "segredo"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.db_max_connections, 5);
    }

    #[test]
    fn explicit_values_win() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/x"),
            ("JWT_SECRET", "s"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("DB_MAX_CONNECTIONS", "20"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.db_max_connections, 20);
    }

    #[test]
    fn missing_required_vars_fail() {
        assert!(Config::from_lookup(lookup(&[("JWT_SECRET", "s")])).is_err());
        assert!(Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://db/x")])).is_err());
    }

    #[test]
    fn invalid_pool_size_fails() {
        let result = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/x"),
            ("JWT_SECRET", "s"),
            ("DB_MAX_CONNECTIONS", "muitas"),
        ]));
        assert!(result.is_err());
    }
}
