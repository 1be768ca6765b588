// src/bin/load_catalog.rs

// Carrega rubros, subrubros, tipos e categorias de material, equipos e
// fornecedores de um arquivo JSON para uma empresa.

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use presupuestos_backend::{
    config::connect,
    db::{CatalogRepository, LoteRepository, MixtureRepository, PriceSheetRepository, TenantRepository},
    services::{
        catalog_loader::{self, CatalogFile},
        lote_service::LoteService,
        tenancy_service::TenantService,
    },
};

#[derive(Parser, Debug)]
#[command(name = "load-catalog", about = "Carga de catálogos por nome (idempotente)")]
struct Args {
    /// Arquivo JSON com os catálogos
    file: PathBuf,

    /// Nome da empresa de destino
    #[arg(long, short = 'c')]
    company: String,

    /// Cria a empresa (com o Lote Inicial) se ela não existir
    #[arg(long)]
    create_company: bool,

    /// Só mostra o plano; não abre conexão com o banco
    #[arg(long)]
    dry_run: bool,

    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    dotenvy::dotenv().ok();
    let args = Args::parse();

    // 1. Lê e planeja
    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Falha ao ler {}", args.file.display()))?;
    let file: CatalogFile = serde_json::from_str(&raw).context("Arquivo de catálogo inválido")?;
    let plan = catalog_loader::plan(&file);

    if args.dry_run {
        for (catalog, name) in &plan.named {
            println!("{:<24} {}", catalog.label(), name);
        }
        for (catalog, parent, name) in &plan.children {
            println!("{:<24} {} > {}", catalog.label(), parent, name);
        }
        for name in &plan.providers {
            println!("{:<24} {}", "Fornecedor", name);
        }
        println!("{} linha(s) em branco ignorada(s)", plan.skipped);
        return Ok(());
    }

    // 2. Banco
    let Some(database_url) = args.database_url.as_deref() else {
        bail!("DATABASE_URL deve ser definida (ou use --database-url)");
    };
    let pool = connect(database_url, 2).await?;

    let catalog_repo = CatalogRepository::new(pool.clone());
    let lote_service = LoteService::new(
        LoteRepository::new(pool.clone()),
        PriceSheetRepository::new(pool.clone()),
        MixtureRepository::new(),
        catalog_repo.clone(),
        pool.clone(),
    );
    let tenant_service = TenantService::new(TenantRepository::new(pool.clone()), lote_service, pool.clone());

    // 3. Empresa
    let company = match tenant_service.find_company_by_name(&args.company).await? {
        Some(company) => company,
        None if args.create_company => tenant_service.create_company(&args.company, None).await?,
        None => bail!("Empresa '{}' não encontrada (use --create-company)", args.company),
    };

    // 4. Aplica numa transação
    let mut tx = pool.begin().await?;
    let report = catalog_loader::apply(&catalog_repo, &mut *tx, company.id, &plan).await?;
    tx.commit().await?;

    tracing::info!(company_id = %company.id, "Carga concluída para '{}'", company.name);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
