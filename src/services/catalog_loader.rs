// src/services/catalog_loader.rs

// Carga em massa de catálogos a partir de um arquivo JSON.
// Tudo é "upsert por nome" dentro da empresa: rodar duas vezes não duplica nada.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CatalogRepository,
    models::catalog::{ChildCatalog, NamedCatalog},
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildRow {
    pub name: String,
    /// Nome do pai (rubro, tipo de material ou equipo).
    pub parent: String,
}

/// Formato do arquivo de carga.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogFile {
    pub trades: Vec<String>,
    pub sub_trades: Vec<ChildRow>,
    pub material_types: Vec<String>,
    pub material_categories: Vec<ChildRow>,
    pub crews: Vec<String>,
    pub crew_refs: Vec<ChildRow>,
    pub providers: Vec<String>,
}

/// O que será gravado, já sem nomes em branco.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadPlan {
    pub named: Vec<(NamedCatalog, String)>,
    pub children: Vec<(ChildCatalog, String, String)>,
    pub providers: Vec<String>,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub created: usize,
    pub existing: usize,
    pub skipped: usize,
}

fn clean(name: &str) -> Option<String> {
    let trimmed = name.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Monta o plano de carga. Pais vêm antes dos filhos.
pub fn plan(file: &CatalogFile) -> LoadPlan {
    let mut plan = LoadPlan::default();

    let named = [
        (NamedCatalog::Trades, &file.trades),
        (NamedCatalog::MaterialTypes, &file.material_types),
        (NamedCatalog::Crews, &file.crews),
    ];
    for (catalog, names) in named {
        for name in names {
            match clean(name) {
                Some(n) => plan.named.push((catalog, n)),
                None => plan.skipped += 1,
            }
        }
    }

    let children = [
        (ChildCatalog::SubTrades, &file.sub_trades),
        (ChildCatalog::MaterialCategories, &file.material_categories),
        (ChildCatalog::CrewRefs, &file.crew_refs),
    ];
    for (catalog, rows) in children {
        for row in rows {
            match (clean(&row.parent), clean(&row.name)) {
                (Some(parent), Some(name)) => plan.children.push((catalog, parent, name)),
                _ => plan.skipped += 1,
            }
        }
    }

    for name in &file.providers {
        match clean(name) {
            Some(n) => plan.providers.push(n),
            None => plan.skipped += 1,
        }
    }

    plan
}

/// Executa o plano na conexão informada (normalmente uma transação).
pub async fn apply(
    repo: &CatalogRepository,
    conn: &mut PgConnection,
    company_id: Uuid,
    plan: &LoadPlan,
) -> Result<LoadReport, AppError> {
    let mut report = LoadReport { skipped: plan.skipped, ..Default::default() };
    let mut tally = |created: bool| {
        if created {
            report.created += 1;
        } else {
            report.existing += 1;
        }
    };

    // 1. Pais já existentes na empresa
    let mut parents: HashMap<(&'static str, String), Uuid> = HashMap::new();
    for catalog in [NamedCatalog::Trades, NamedCatalog::MaterialTypes, NamedCatalog::Crews] {
        for entry in repo.list_named(&mut *conn, company_id, catalog).await? {
            parents.insert((catalog.table(), entry.name), entry.id);
        }
    }

    // 2. Catálogos planos
    for (catalog, name) in &plan.named {
        let (entry, created) = repo.upsert_named(&mut *conn, company_id, *catalog, name).await?;
        tally(created);
        parents.insert((catalog.table(), entry.name), entry.id);
    }

    // 3. Filhos, pelo nome do pai
    let mut orphans = 0;
    for (catalog, parent, name) in &plan.children {
        let Some(parent_id) = parents.get(&(catalog.parent().table(), parent.clone())).copied() else {
            tracing::warn!("{} '{}' ignorado(a): pai '{}' desconhecido", catalog.label(), name, parent);
            orphans += 1;
            continue;
        };
        let (_, created) = repo.upsert_child(&mut *conn, company_id, *catalog, parent_id, name).await?;
        tally(created);
    }

    // 4. Proveedores
    for name in &plan.providers {
        let created = repo.upsert_provider(&mut *conn, company_id, name).await?;
        tally(created);
    }

    report.skipped += orphans;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CatalogFile {
        serde_json::from_str(
            r#"{
                "trades": ["Albañilería", "  ", "Pintura"],
                "subTrades": [
                    {"name": "Muros", "parent": "Albañilería"},
                    {"name": "", "parent": "Albañilería"},
                    {"name": "Látex", "parent": " Pintura "}
                ],
                "crews": ["Cuadrilla A"],
                "crewRefs": [{"name": "Oficial", "parent": ""}],
                "providers": ["Corralón Sur", ""]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn blank_names_are_skipped() {
        let plan = plan(&sample());

        assert_eq!(
            plan.named,
            vec![
                (NamedCatalog::Trades, "Albañilería".to_string()),
                (NamedCatalog::Trades, "Pintura".to_string()),
                (NamedCatalog::Crews, "Cuadrilla A".to_string()),
            ]
        );
        assert_eq!(plan.providers, vec!["Corralón Sur".to_string()]);
        // trade em branco, subrubro sem nome, ref sem pai, proveedor vazio
        assert_eq!(plan.skipped, 4);
    }

    #[test]
    fn children_keep_trimmed_parent_names() {
        let plan = plan(&sample());
        assert_eq!(
            plan.children,
            vec![
                (ChildCatalog::SubTrades, "Albañilería".to_string(), "Muros".to_string()),
                (ChildCatalog::SubTrades, "Pintura".to_string(), "Látex".to_string()),
            ]
        );
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let file: CatalogFile = serde_json::from_str(r#"{"providers": ["Ferretería"]}"#).unwrap();
        let plan = plan(&file);
        assert!(plan.named.is_empty());
        assert!(plan.children.is_empty());
        assert_eq!(plan.providers.len(), 1);
    }
}
