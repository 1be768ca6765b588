// src/services/costing_service.rs

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    costing::{
        CostBucket, LotePricing, MixtureComponent, MixtureCost, ResourceLine, ResourceRef, SheetPrice,
        mixture_unit_cost,
        task::{bucket_total, task_total, task_total_usd, task_unit},
    },
    db::{
        CatalogRepository, LoteRepository, MixtureRepository, PriceSheetRepository, lote_repo::TaskResourceDetail,
        mixture_repo::ComponentPriceRow, sheet_repo::SheetPriceRow,
    },
    models::{
        lote::{Lote, Task, TaskCost, TaskCostLine},
        sheets::SheetKind,
    },
    services::lote_service::group_by_task,
};

fn index_prices(rows: Vec<SheetPriceRow>) -> HashMap<Uuid, SheetPrice> {
    rows.into_iter()
        .map(|r| (r.resource_id, SheetPrice { sale_unit_price: r.sale_unit_price, currency: r.currency }))
        .collect()
}

/// Custo unitário das misturas vistas a partir de um lote.
/// Vinculadas à hoja de materiais do lote usam essa hoja; sem hoja, o preço vivo.
/// Vinculadas a outra hoja não são custeadas pelo lote.
pub(crate) fn build_mixture_costs(
    rows: &[ComponentPriceRow],
    material_sheet_id: Uuid,
    materials: &HashMap<Uuid, SheetPrice>,
) -> HashMap<Uuid, MixtureCost> {
    let mut grouped: HashMap<Uuid, (Option<Uuid>, Vec<MixtureComponent>)> = HashMap::new();
    for row in rows {
        let entry = grouped.entry(row.mixture_id).or_insert_with(|| (row.sheet_id, Vec::new()));
        if let (Some(material_id), Some(quantity)) = (row.material_id, row.quantity) {
            entry.1.push(MixtureComponent {
                material_id,
                quantity,
                live_price: row.live_price.unwrap_or(Decimal::ZERO),
            });
        }
    }

    grouped
        .into_iter()
        .map(|(id, (sheet_id, components))| {
            let unit_cost = match sheet_id {
                None => mixture_unit_cost(&components, None),
                Some(s) if s == material_sheet_id => mixture_unit_cost(&components, Some(materials)),
                Some(_) => Decimal::ZERO,
            };
            (id, MixtureCost { sheet_id, unit_cost })
        })
        .collect()
}

pub(crate) fn resource_lines(details: &[TaskResourceDetail]) -> Vec<ResourceLine> {
    details
        .iter()
        .filter_map(|d| d.line.resource().map(|resource| ResourceLine { resource, quantity: d.line.quantity }))
        .collect()
}

/// Monta o custo detalhado de uma tarefa a partir das suas linhas e do contexto do lote.
pub(crate) fn build_task_cost(task: Task, details: &[TaskResourceDetail], pricing: &LotePricing) -> TaskCost {
    let lines: Vec<TaskCostLine> = details
        .iter()
        .filter_map(|d| {
            let resource = d.line.resource()?;
            let line = ResourceLine { resource, quantity: d.line.quantity };
            Some(TaskCostLine {
                id: d.line.id,
                resource,
                bucket: resource.bucket(),
                resource_name: d.resource_name.clone().unwrap_or_default(),
                unit: d.unit_name.clone(),
                quantity: line.quantity,
                unit_price: pricing.unit_price(resource),
                currency: pricing.line_currency(resource),
                total: pricing.line_cost(&line),
                total_usd: pricing.line_cost_usd(&line),
                unit_price_usd: pricing.line_unit_price_usd(&line),
            })
        })
        .collect();

    let resource_lines = resource_lines(details);
    TaskCost {
        unit: task_unit(details.iter().map(|d| d.unit_name.as_deref())),
        total: task_total(pricing, &resource_lines),
        total_usd: task_total_usd(pricing, &resource_lines),
        materials_mixtures: bucket_total(pricing, &resource_lines, CostBucket::MaterialsAndMixtures),
        labor_subcontracts: bucket_total(pricing, &resource_lines, CostBucket::LaborAndSubcontracts),
        lines,
        task,
    }
}

#[derive(Clone)]
pub struct CostingService {
    lote_repo: LoteRepository,
    sheet_repo: PriceSheetRepository,
    mixture_repo: MixtureRepository,
    catalog_repo: CatalogRepository,
    pool: PgPool,
}

impl CostingService {
    pub fn new(
        lote_repo: LoteRepository,
        sheet_repo: PriceSheetRepository,
        mixture_repo: MixtureRepository,
        catalog_repo: CatalogRepository,
        pool: PgPool,
    ) -> Self {
        Self { lote_repo, sheet_repo, mixture_repo, catalog_repo, pool }
    }

    /// Carrega as três hojas do lote, as misturas usadas pelas linhas e a cotação do lote.
    pub async fn load_pricing(
        &self,
        company_id: Uuid,
        lote: &Lote,
        details: &[TaskResourceDetail],
    ) -> Result<LotePricing, AppError> {
        let materials = index_prices(
            self.sheet_repo
                .sheet_prices(&self.pool, SheetKind::Materials, lote.material_sheet_id)
                .await?,
        );
        let labor = self
            .sheet_repo
            .sheet_prices(&self.pool, SheetKind::Labor, lote.labor_sheet_id)
            .await?
            .into_iter()
            .map(|r| (r.resource_id, r.sale_unit_price))
            .collect();
        let subcontracts = index_prices(
            self.sheet_repo
                .sheet_prices(&self.pool, SheetKind::Subcontracts, lote.subcontract_sheet_id)
                .await?,
        );

        let mut mixture_ids: Vec<Uuid> = details
            .iter()
            .filter_map(|d| match d.line.resource() {
                Some(ResourceRef::Mixture(id)) => Some(id),
                _ => None,
            })
            .collect();
        mixture_ids.sort_unstable();
        mixture_ids.dedup();
        let component_rows = if mixture_ids.is_empty() {
            Vec::new()
        } else {
            self.mixture_repo.component_prices(&self.pool, &mixture_ids).await?
        };
        let mixtures = build_mixture_costs(&component_rows, lote.material_sheet_id, &materials);

        let exchange_rate = self
            .catalog_repo
            .find_rate(&self.pool, company_id, lote.exchange_type_id, lote.exchange_date)
            .await?;

        Ok(LotePricing {
            material_sheet_id: lote.material_sheet_id,
            materials,
            labor,
            subcontracts,
            mixtures,
            exchange_rate,
        })
    }

    async fn find_lote(&self, company_id: Uuid, lote_id: Uuid) -> Result<Lote, AppError> {
        self.lote_repo
            .find_lote(&self.pool, company_id, lote_id)
            .await?
            .ok_or(AppError::NotFound("Lote"))
    }

    /// Tarefas (ou só as pedidas) de um lote, com o contexto de preços já carregado.
    pub async fn lote_context(
        &self,
        company_id: Uuid,
        lote_id: Uuid,
    ) -> Result<(Vec<Task>, HashMap<Uuid, Vec<TaskResourceDetail>>, LotePricing), AppError> {
        let lote = self.find_lote(company_id, lote_id).await?;
        let tasks = self.lote_repo.list_tasks(&self.pool, company_id, lote_id).await?;
        let ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();
        let details = self.lote_repo.task_resources(&self.pool, &ids).await?;
        let pricing = self.load_pricing(company_id, &lote, &details).await?;

        Ok((tasks, group_by_task(details), pricing))
    }

    pub async fn task_cost(&self, company_id: Uuid, task_id: Uuid) -> Result<TaskCost, AppError> {
        let task = self
            .lote_repo
            .find_task(&self.pool, company_id, task_id)
            .await?
            .ok_or(AppError::NotFound("Tarea"))?;
        let lote = self.find_lote(company_id, task.lote_id).await?;
        let details = self.lote_repo.task_resources(&self.pool, &[task.id]).await?;
        let pricing = self.load_pricing(company_id, &lote, &details).await?;

        Ok(build_task_cost(task, &details, &pricing))
    }

    pub async fn lote_task_costs(&self, company_id: Uuid, lote_id: Uuid) -> Result<Vec<TaskCost>, AppError> {
        let (tasks, mut lines, pricing) = self.lote_context(company_id, lote_id).await?;

        Ok(tasks
            .into_iter()
            .map(|task| {
                let details = lines.remove(&task.id).unwrap_or_default();
                build_task_cost(task, &details, &pricing)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costing::Currency;
    use crate::models::lote::TaskResource;
    use rust_decimal_macros::dec;

    fn detail(task_id: Uuid, resource: ResourceRef, quantity: Decimal, name: &str, unit: Option<&str>) -> TaskResourceDetail {
        let (material_id, labor_id, subcontract_id, mixture_id) = resource.columns();
        TaskResourceDetail {
            line: TaskResource { id: Uuid::new_v4(), task_id, material_id, labor_id, subcontract_id, mixture_id, quantity },
            resource_name: Some(name.to_string()),
            unit_name: unit.map(str::to_string),
        }
    }

    fn component(mixture_id: Uuid, sheet_id: Option<Uuid>, material_id: Uuid, quantity: Decimal, live: Decimal) -> ComponentPriceRow {
        ComponentPriceRow {
            mixture_id,
            sheet_id,
            material_id: Some(material_id),
            quantity: Some(quantity),
            live_price: Some(live),
        }
    }

    #[test]
    fn mixture_costs_follow_their_binding() {
        let lote_sheet = Uuid::new_v4();
        let sand = Uuid::new_v4();
        let mut materials = HashMap::new();
        materials.insert(sand, SheetPrice { sale_unit_price: dec!(10), currency: Currency::Ars });

        let bound = Uuid::new_v4();
        let live = Uuid::new_v4();
        let foreign = Uuid::new_v4();
        let empty = Uuid::new_v4();
        let rows = vec![
            component(bound, Some(lote_sheet), sand, dec!(3), dec!(99)),
            component(live, None, sand, dec!(3), dec!(4)),
            component(foreign, Some(Uuid::new_v4()), sand, dec!(3), dec!(4)),
            ComponentPriceRow { mixture_id: empty, sheet_id: None, material_id: None, quantity: None, live_price: None },
        ];

        let costs = build_mixture_costs(&rows, lote_sheet, &materials);
        assert_eq!(costs[&bound].unit_cost, dec!(30));
        assert_eq!(costs[&live].unit_cost, dec!(12));
        assert_eq!(costs[&foreign].unit_cost, Decimal::ZERO);
        assert_eq!(costs[&empty].unit_cost, Decimal::ZERO);
        assert_eq!(costs[&live].sheet_id, None);
    }

    #[test]
    fn task_cost_lines_carry_names_units_and_totals() {
        let task = Task {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            trade_id: Uuid::new_v4(),
            sub_trade_id: Uuid::new_v4(),
            lote_id: Uuid::new_v4(),
            name: "Revoque grueso".into(),
        };
        let mason = Uuid::new_v4();
        let lime = Uuid::new_v4();
        let mut pricing = LotePricing { material_sheet_id: Uuid::new_v4(), exchange_rate: None, ..Default::default() };
        pricing.labor.insert(mason, dec!(400));
        pricing.materials.insert(lime, SheetPrice { sale_unit_price: dec!(5), currency: Currency::Usd });

        let details = vec![
            detail(task.id, ResourceRef::Labor(mason), dec!(0.5), "Oficial albañil", None),
            detail(task.id, ResourceRef::Material(lime), dec!(4), "Cal hidratada", Some("kg")),
        ];

        let cost = build_task_cost(task, &details, &pricing);
        assert_eq!(cost.unit, "kg");
        assert_eq!(cost.total, dec!(220));
        assert_eq!(cost.materials_mixtures, dec!(20));
        assert_eq!(cost.labor_subcontracts, dec!(200));
        // Linha em ARS sem cotação no lote
        assert_eq!(cost.total_usd, None);

        assert_eq!(cost.lines[0].resource_name, "Oficial albañil");
        assert_eq!(cost.lines[0].currency, Currency::Ars);
        assert_eq!(cost.lines[0].total_usd, None);
        assert_eq!(cost.lines[1].currency, Currency::Usd);
        assert_eq!(cost.lines[1].total_usd, Some(dec!(20)));
        assert_eq!(cost.lines[1].unit_price_usd, Some(dec!(5)));
    }
}
