// src/services/purchase_service.rs

use chrono::Datelike;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        validation::{CompanyScope, SUB_TRADE_NOT_IN_TRADE},
    },
    db::{CatalogRepository, OwnedTable, PurchaseRepository},
    models::{
        catalog::{ChildCatalog, NamedCatalog},
        purchases::{MonthGroup, PaymentWeek, Purchase, PurchasePayload, WeekDetail, WeekFilter, YearGroup, monday_of},
    },
};

/// Agrupa semanas em ano → mês → semanas, tudo em ordem decrescente.
pub(crate) fn group_weeks(mut weeks: Vec<PaymentWeek>, filter: &WeekFilter) -> Vec<YearGroup> {
    weeks.retain(|w| filter.matches(w.week_date));
    weeks.sort_by(|a, b| b.week_date.cmp(&a.week_date));

    let mut years: Vec<YearGroup> = Vec::new();
    for week in weeks {
        let (year, month) = (week.week_date.year(), week.week_date.month());

        if years.last().is_none_or(|y| y.year != year) {
            years.push(YearGroup { year, months: Vec::new() });
        }
        let Some(current_year) = years.last_mut() else { continue };

        if current_year.months.last().is_none_or(|m| m.month != month) {
            current_year.months.push(MonthGroup { month, weeks: Vec::new() });
        }
        if let Some(current_month) = current_year.months.last_mut() {
            current_month.weeks.push(week);
        }
    }
    years
}

#[derive(Clone)]
pub struct PurchaseService {
    purchase_repo: PurchaseRepository,
    catalog_repo: CatalogRepository,
    pool: PgPool,
}

impl PurchaseService {
    pub fn new(purchase_repo: PurchaseRepository, catalog_repo: CatalogRepository, pool: PgPool) -> Self {
        Self { purchase_repo, catalog_repo, pool }
    }

    /// Cria a semana de pagos da segunda-feira correspondente à data informada.
    pub async fn create_week(&self, company_id: Uuid, date: chrono::NaiveDate) -> Result<PaymentWeek, AppError> {
        let monday = monday_of(date);
        let week = self.purchase_repo.create_week(&self.pool, company_id, monday).await?;
        tracing::info!("Semana de pagos {} criada", week.week_date);
        Ok(week)
    }

    pub async fn list_weeks(&self, company_id: Uuid, filter: &WeekFilter) -> Result<Vec<YearGroup>, AppError> {
        let weeks = self.purchase_repo.list_weeks(company_id).await?;
        Ok(group_weeks(weeks, filter))
    }

    pub async fn week_detail(&self, company_id: Uuid, week_id: Uuid) -> Result<WeekDetail, AppError> {
        let week = self
            .purchase_repo
            .find_week(company_id, week_id)
            .await?
            .ok_or(AppError::NotFound("Semana"))?;
        let purchases = self.purchase_repo.list_purchases_for_week(week.id).await?;
        let total = purchases.iter().map(|p| p.purchase.total_amount).sum();

        Ok(WeekDetail { week, purchases, total })
    }

    pub async fn create_purchase(&self, company_id: Uuid, payload: PurchasePayload) -> Result<Purchase, AppError> {
        // 1. Todas as referências na empresa ativa
        let week = self.catalog_repo.find_owner(OwnedTable::PaymentWeek, payload.week_id).await?;
        let project = self.catalog_repo.find_owner(OwnedTable::Project, payload.project_id).await?;
        let trade = self
            .catalog_repo
            .find_owner(OwnedTable::Named(NamedCatalog::Trades), payload.trade_id)
            .await?;
        let sub_trade = self
            .catalog_repo
            .find_owner(OwnedTable::Child(ChildCatalog::SubTrades), payload.sub_trade_id)
            .await?;
        let provider = self.catalog_repo.find_owner(OwnedTable::Provider, payload.provider_id).await?;

        // 2. Subrubro dentro do rubro
        let mut scope = CompanyScope::new(company_id);
        scope
            .owned("weekId", week)
            .owned("projectId", project)
            .owned("tradeId", trade)
            .owned("subTradeId", sub_trade)
            .owned("providerId", provider)
            .belongs_to("subTradeId", sub_trade, payload.trade_id, SUB_TRADE_NOT_IN_TRADE);
        scope.finish()?;

        // 3. Grava
        self.purchase_repo.create_purchase(&self.pool, &payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn week(y: i32, m: u32, d: u32) -> PaymentWeek {
        PaymentWeek {
            id: Uuid::new_v4(),
            company_id: Uuid::nil(),
            week_date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        }
    }

    #[test]
    fn weeks_are_grouped_descending() {
        let weeks = vec![
            week(2024, 12, 30),
            week(2025, 3, 3),
            week(2025, 3, 17),
            week(2025, 2, 24),
            week(2025, 3, 10),
        ];

        let groups = group_weeks(weeks, &WeekFilter::default());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].year, 2025);
        assert_eq!(groups[1].year, 2024);

        let months: Vec<u32> = groups[0].months.iter().map(|m| m.month).collect();
        assert_eq!(months, vec![3, 2]);

        let march: Vec<u32> = groups[0].months[0].weeks.iter().map(|w| w.week_date.day()).collect();
        assert_eq!(march, vec![17, 10, 3]);
    }

    #[test]
    fn filter_narrows_the_grouping() {
        let weeks = vec![week(2025, 3, 3), week(2025, 3, 10), week(2025, 2, 24), week(2024, 3, 4)];

        let march = group_weeks(weeks.clone(), &WeekFilter { year: Some(2025), month: Some(3), week: None });
        assert_eq!(march.len(), 1);
        assert_eq!(march[0].months.len(), 1);
        assert_eq!(march[0].months[0].weeks.len(), 2);

        // 2025-03-10 é a semana ISO 11
        let iso = group_weeks(weeks, &WeekFilter { year: Some(2025), month: None, week: Some(11) });
        assert_eq!(iso[0].months[0].weeks[0].week_date, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
    }

    #[test]
    fn empty_input_gives_no_groups() {
        assert!(group_weeks(Vec::new(), &WeekFilter::default()).is_empty());
    }
}
