// src/services/budget_service.rs

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        validation::{CompanyScope, field_error},
    },
    costing::{
        BudgetItemCost, LotePricing,
        budget::{budget_total_usd, chart_slices, group_totals, groups_total},
        task::task_unit,
    },
    db::{BudgetRepository, CatalogRepository, OwnedTable, lote_repo::TaskResourceDetail},
    models::{
        budget::{Budget, BudgetBreakdown, BudgetItem, BudgetItemPayload, BudgetItemView, BudgetPayload, BudgetSummary},
        catalog::{ChildCatalog, NamedCatalog},
        lote::Task,
    },
    services::costing_service::{CostingService, resource_lines},
};

/// Linhas do presupuesto com os totais calculados na cotação do presupuesto.
/// Itens cuja tarefa não está no lote são ignorados.
pub(crate) fn item_views(
    items: &[BudgetItem],
    tasks: &HashMap<Uuid, Task>,
    lines: &HashMap<Uuid, Vec<TaskResourceDetail>>,
    pricing: &LotePricing,
    budget_rate: Option<Decimal>,
) -> Vec<BudgetItemView> {
    items
        .iter()
        .filter_map(|item| {
            let task = tasks.get(&item.task_id)?;
            let details = lines.get(&task.id).map(Vec::as_slice).unwrap_or_default();
            Some(BudgetItemView {
                id: item.id,
                task_id: task.id,
                task_name: task.name.clone(),
                trade_id: task.trade_id,
                sub_trade_id: task.sub_trade_id,
                unit: task_unit(details.iter().map(|d| d.unit_name.as_deref())),
                cost: BudgetItemCost::compute(pricing, &resource_lines(details), item.quantity, budget_rate),
            })
        })
        .collect()
}

pub(crate) fn build_summary(budget: Budget, exchange_rate: Option<Decimal>, items: Vec<BudgetItemView>) -> BudgetSummary {
    BudgetSummary {
        total_general: items.iter().map(|i| i.cost.total_general).sum(),
        total_usd: budget_total_usd(items.iter().map(|i| i.cost.total_general_usd)),
        budget,
        exchange_rate,
        items,
    }
}

/// Quebra em USD por grupo (rubro, ou subrubro dentro de um rubro) e fatias do gráfico.
pub(crate) fn build_breakdown(
    budget_id: Uuid,
    trade_id: Option<Uuid>,
    groups: &[(Uuid, String)],
    items: &[BudgetItemView],
    has_rate: bool,
) -> BudgetBreakdown {
    let keyed: Vec<(Uuid, Option<Decimal>)> = items
        .iter()
        .filter(|i| trade_id.is_none_or(|t| i.trade_id == t))
        .map(|i| {
            let key = if trade_id.is_some() { i.sub_trade_id } else { i.trade_id };
            (key, i.cost.total_general_usd)
        })
        .collect();

    let groups = group_totals(groups, &keyed, has_rate);
    let total_usd = groups_total(&groups, has_rate);
    let chart = chart_slices(&groups, total_usd);

    BudgetBreakdown { budget_id, trade_id, groups, total_usd, chart }
}

#[derive(Clone)]
pub struct BudgetService {
    budget_repo: BudgetRepository,
    catalog_repo: CatalogRepository,
    costing: CostingService,
    pool: PgPool,
}

impl BudgetService {
    pub fn new(
        budget_repo: BudgetRepository,
        catalog_repo: CatalogRepository,
        costing: CostingService,
        pool: PgPool,
    ) -> Self {
        Self { budget_repo, catalog_repo, costing, pool }
    }

    pub async fn create_budget(&self, company_id: Uuid, payload: BudgetPayload) -> Result<Budget, AppError> {
        // 1. Referências da mesma empresa
        let project = self.catalog_repo.find_owner(OwnedTable::Project, payload.project_id).await?;
        let lote = self.catalog_repo.find_owner(OwnedTable::Lote, payload.lote_id).await?;
        let exchange_type = self
            .catalog_repo
            .find_owner_opt(OwnedTable::Named(NamedCatalog::ExchangeTypes), payload.exchange_type_id)
            .await?;

        let mut scope = CompanyScope::new(company_id);
        scope
            .owned("projectId", project)
            .owned("loteId", lote)
            .owned_opt("exchangeTypeId", payload.exchange_type_id, exchange_type);
        scope.finish()?;

        // 2. Grava
        let budget = self.budget_repo.create_budget(&self.pool, company_id, &payload).await?;
        tracing::info!("Presupuesto '{}' criado (obra {})", budget.instance, budget.project_id);
        Ok(budget)
    }

    pub async fn list_budgets(&self, company_id: Uuid, active: Option<bool>) -> Result<Vec<Budget>, AppError> {
        self.budget_repo.list_budgets(company_id, active).await
    }

    async fn get_budget(&self, company_id: Uuid, budget_id: Uuid) -> Result<Budget, AppError> {
        self.budget_repo
            .find_budget(&self.pool, company_id, budget_id)
            .await?
            .ok_or(AppError::NotFound("Presupuesto"))
    }

    pub async fn toggle_active(&self, company_id: Uuid, budget_id: Uuid) -> Result<Budget, AppError> {
        self.budget_repo
            .toggle_active(company_id, budget_id)
            .await?
            .ok_or(AppError::NotFound("Presupuesto"))
    }

    pub async fn add_item(
        &self,
        company_id: Uuid,
        budget_id: Uuid,
        payload: BudgetItemPayload,
    ) -> Result<BudgetItem, AppError> {
        let budget = self.get_budget(company_id, budget_id).await?;

        // A tarefa precisa ser do lote do presupuesto
        let task = self.catalog_repo.find_owner(OwnedTable::Task, payload.task_id).await?;
        let mut scope = CompanyScope::new(company_id);
        scope.owned("taskId", task);
        let mut errors = match scope.finish() {
            Ok(()) => validator::ValidationErrors::new(),
            Err(e) => e,
        };
        if let Some(owner) = task {
            if owner.company_id == company_id && owner.parent_id != Some(budget.lote_id) {
                errors.add(
                    "taskId",
                    field_error("lote_mismatch", "A tarefa não pertence ao lote do presupuesto."),
                );
            }
        }
        if !errors.is_empty() {
            return Err(AppError::ValidationError(errors));
        }

        self.budget_repo
            .add_item(&self.pool, budget.id, payload.task_id, payload.quantity)
            .await
    }

    pub async fn delete_item(&self, company_id: Uuid, budget_id: Uuid, item_id: Uuid) -> Result<(), AppError> {
        let budget = self.get_budget(company_id, budget_id).await?;
        match self.budget_repo.delete_item(budget.id, item_id).await? {
            0 => Err(AppError::NotFound("Item")),
            _ => Ok(()),
        }
    }

    async fn budget_rate(&self, company_id: Uuid, budget: &Budget) -> Result<Option<Decimal>, AppError> {
        self.catalog_repo
            .find_rate(&self.pool, company_id, budget.exchange_type_id, budget.exchange_date)
            .await
    }

    async fn load_items(
        &self,
        company_id: Uuid,
        budget: &Budget,
    ) -> Result<(Vec<BudgetItemView>, Vec<Task>, Option<Decimal>), AppError> {
        let (tasks, lines, pricing) = self.costing.lote_context(company_id, budget.lote_id).await?;
        let items = self.budget_repo.list_items(&self.pool, budget.id).await?;
        let rate = self.budget_rate(company_id, budget).await?;

        let by_id: HashMap<Uuid, Task> = tasks.iter().map(|t| (t.id, t.clone())).collect();
        let views = item_views(&items, &by_id, &lines, &pricing, rate);
        Ok((views, tasks, rate))
    }

    pub async fn summary(&self, company_id: Uuid, budget_id: Uuid) -> Result<BudgetSummary, AppError> {
        let budget = self.get_budget(company_id, budget_id).await?;
        let (items, _, rate) = self.load_items(company_id, &budget).await?;

        Ok(build_summary(budget, rate, items))
    }

    /// Sem `trade_id`: um grupo por rubro das tarefas do lote.
    /// Com `trade_id`: um grupo por subrubro daquele rubro.
    pub async fn breakdown(
        &self,
        company_id: Uuid,
        budget_id: Uuid,
        trade_id: Option<Uuid>,
    ) -> Result<BudgetBreakdown, AppError> {
        let budget = self.get_budget(company_id, budget_id).await?;
        let (items, tasks, rate) = self.load_items(company_id, &budget).await?;

        let groups: Vec<(Uuid, String)> = match trade_id {
            None => {
                let entries = self.catalog_repo.list_named(&self.pool, company_id, NamedCatalog::Trades).await?;
                entries
                    .into_iter()
                    .filter(|e| tasks.iter().any(|t| t.trade_id == e.id))
                    .map(|e| (e.id, e.name))
                    .collect()
            }
            Some(trade) => {
                let entries = self
                    .catalog_repo
                    .list_children(&self.pool, company_id, ChildCatalog::SubTrades, Some(trade))
                    .await?;
                entries
                    .into_iter()
                    .filter(|e| tasks.iter().any(|t| t.sub_trade_id == e.id))
                    .map(|e| (e.id, e.name))
                    .collect()
            }
        };

        Ok(build_breakdown(budget.id, trade_id, &groups, &items, rate.is_some()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costing::{ResourceRef, SheetPrice};
    use crate::models::lote::TaskResource;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;

    struct Fixture {
        pricing: LotePricing,
        tasks: HashMap<Uuid, Task>,
        lines: HashMap<Uuid, Vec<TaskResourceDetail>>,
        masonry: Uuid,
        paint: Uuid,
        walls: Uuid,
        plaster: Uuid,
    }

    fn task(trade_id: Uuid, sub_trade_id: Uuid, name: &str) -> Task {
        Task {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            trade_id,
            sub_trade_id,
            lote_id: Uuid::new_v4(),
            name: name.into(),
        }
    }

    fn labor_line(task_id: Uuid, labor_id: Uuid, quantity: Decimal, unit: &str) -> TaskResourceDetail {
        TaskResourceDetail {
            line: TaskResource {
                id: Uuid::new_v4(),
                task_id,
                material_id: None,
                labor_id: Some(labor_id),
                subcontract_id: None,
                mixture_id: None,
                quantity,
            },
            resource_name: Some("Oficial".into()),
            unit_name: Some(unit.into()),
        }
    }

    // Albañilería: muros (200 ARS) e revoques (100 ARS); Pintura: 50 USD
    fn fixture() -> Fixture {
        let masonry = Uuid::new_v4();
        let paint = Uuid::new_v4();
        let walls = Uuid::new_v4();
        let plaster = Uuid::new_v4();
        let coats = Uuid::new_v4();

        let mason = Uuid::new_v4();
        let painter = Uuid::new_v4();
        let mut pricing = LotePricing { material_sheet_id: Uuid::new_v4(), ..Default::default() };
        pricing.labor.insert(mason, dec!(100));
        pricing.subcontracts.insert(
            painter,
            SheetPrice { sale_unit_price: dec!(50), currency: crate::costing::Currency::Usd },
        );

        let wall_task = task(masonry, walls, "Muro 15");
        let plaster_task = task(masonry, plaster, "Revoque");
        let paint_task = task(paint, coats, "Látex");

        let mut lines = HashMap::new();
        lines.insert(wall_task.id, vec![labor_line(wall_task.id, mason, dec!(2), "m2")]);
        lines.insert(plaster_task.id, vec![labor_line(plaster_task.id, mason, dec!(1), "m2")]);
        let (m, l, s, x) = ResourceRef::Subcontract(painter).columns();
        lines.insert(
            paint_task.id,
            vec![TaskResourceDetail {
                line: TaskResource {
                    id: Uuid::new_v4(),
                    task_id: paint_task.id,
                    material_id: m,
                    labor_id: l,
                    subcontract_id: s,
                    mixture_id: x,
                    quantity: dec!(1),
                },
                resource_name: Some("Pintor".into()),
                unit_name: None,
            }],
        );

        let tasks = [wall_task, plaster_task, paint_task].into_iter().map(|t| (t.id, t)).collect();
        Fixture { pricing, tasks, lines, masonry, paint, walls, plaster }
    }

    fn items(f: &Fixture) -> Vec<BudgetItem> {
        let budget_id = Uuid::new_v4();
        f.tasks
            .values()
            .map(|t| BudgetItem { id: Uuid::new_v4(), budget_id, task_id: t.id, quantity: dec!(1) })
            .collect()
    }

    fn budget() -> Budget {
        Budget {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            lote_id: Uuid::new_v4(),
            budget_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            instance: "Licitación".into(),
            exchange_type_id: None,
            exchange_date: None,
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn items_use_the_budget_rate() {
        let f = fixture();
        let views = item_views(&items(&f), &f.tasks, &f.lines, &f.pricing, Some(dec!(10)));
        assert_eq!(views.len(), 3);

        let walls = views.iter().find(|v| v.sub_trade_id == f.walls).unwrap();
        assert_eq!(walls.unit, "m2");
        assert_eq!(walls.cost.total_general, dec!(200));
        assert_eq!(walls.cost.total_general_usd, Some(dec!(20)));

        let summary = build_summary(budget(), Some(dec!(10)), views);
        assert_eq!(summary.total_general, dec!(350));
        // 20 + 10 + 50
        assert_eq!(summary.total_usd, Some(dec!(80)));
    }

    #[test]
    fn summary_usd_is_unknown_without_budget_rate() {
        let f = fixture();
        let views = item_views(&items(&f), &f.tasks, &f.lines, &f.pricing, None);
        let summary = build_summary(budget(), None, views);
        assert_eq!(summary.total_general, dec!(350));
        assert_eq!(summary.total_usd, None);
    }

    #[test]
    fn items_for_unknown_tasks_are_skipped() {
        let f = fixture();
        let stray = BudgetItem { id: Uuid::new_v4(), budget_id: Uuid::new_v4(), task_id: Uuid::new_v4(), quantity: dec!(3) };
        assert!(item_views(&[stray], &f.tasks, &f.lines, &f.pricing, Some(dec!(10))).is_empty());
    }

    #[test]
    fn breakdown_by_trade_with_chart() {
        let f = fixture();
        let views = item_views(&items(&f), &f.tasks, &f.lines, &f.pricing, Some(dec!(10)));
        let groups = vec![(f.masonry, "Albañilería".to_string()), (f.paint, "Pintura".to_string())];

        let b = build_breakdown(Uuid::new_v4(), None, &groups, &views, true);
        assert_eq!(b.groups[0].total_usd, Some(dec!(30)));
        assert_eq!(b.groups[1].total_usd, Some(dec!(50)));
        assert_eq!(b.total_usd, Some(dec!(80)));
        assert_eq!(b.chart.len(), 2);
        assert_eq!(b.chart[0].percentage, dec!(37.5));
        assert_eq!(b.chart[1].percentage, dec!(62.5));
    }

    #[test]
    fn breakdown_by_sub_trade_only_counts_that_trade() {
        let f = fixture();
        let views = item_views(&items(&f), &f.tasks, &f.lines, &f.pricing, Some(dec!(10)));
        let groups = vec![(f.plaster, "Revoques".to_string()), (f.walls, "Muros".to_string())];

        let b = build_breakdown(Uuid::new_v4(), Some(f.masonry), &groups, &views, true);
        assert_eq!(b.trade_id, Some(f.masonry));
        assert_eq!(b.groups[0].total_usd, Some(dec!(10)));
        assert_eq!(b.groups[1].total_usd, Some(dec!(20)));
        assert_eq!(b.total_usd, Some(dec!(30)));
    }

    #[test]
    fn breakdown_without_rate_is_unknown_and_has_no_chart() {
        let f = fixture();
        let views = item_views(&items(&f), &f.tasks, &f.lines, &f.pricing, None);
        let groups = vec![(f.masonry, "Albañilería".to_string())];

        let b = build_breakdown(Uuid::new_v4(), None, &groups, &views, false);
        assert_eq!(b.groups[0].total_usd, None);
        assert_eq!(b.total_usd, None);
        assert!(b.chart.is_empty());
    }
}
