// src/services/lote_service.rs

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::ValidationErrors;

use crate::{
    common::{
        error::AppError,
        validation::{CompanyScope, RefOwner, SUB_TRADE_NOT_IN_TRADE, field_error, validate_resource_line},
    },
    costing::ResourceRef,
    db::{
        CatalogRepository, LoteRepository, MixtureRepository, OwnedTable, PriceSheetRepository,
        lote_repo::{NewLote, TaskResourceDetail},
        mixture_repo::CopiedMixture,
    },
    models::{
        catalog::{ChildCatalog, NamedCatalog},
        lote::{CreateLotePayload, Lote, SheetSource, Task, TaskPayload, TaskResource, TaskResourcePayload},
        sheets::{PriceSheet, SheetKind},
    },
};

/// Lote criado junto com cada empresa nova.
pub const INITIAL_LOTE_NAME: &str = "Lote Inicial";

/// Tarefa de um lote com as suas linhas, na ordem de inserção.
#[derive(Debug, Clone)]
pub struct SourceTask {
    pub task: Task,
    pub lines: Vec<TaskResourceDetail>,
}

/// Agrupa linhas por tarefa preservando a ordem em que chegaram.
pub(crate) fn group_by_task(lines: Vec<TaskResourceDetail>) -> HashMap<Uuid, Vec<TaskResourceDetail>> {
    let mut grouped: HashMap<Uuid, Vec<TaskResourceDetail>> = HashMap::new();
    for line in lines {
        grouped.entry(line.line.task_id).or_default().push(line);
    }
    grouped
}

// ---
// Unidade de trabalho da criação de lote.
// Tudo o que a criação grava passa por aqui; só `commit` torna as escritas visíveis.
// ---
#[async_trait]
pub trait LoteUnitOfWork: Send {
    async fn find_lote(&mut self, company_id: Uuid, id: Uuid) -> Result<Option<Lote>, AppError>;

    async fn find_exchange_type_owner(&mut self, id: Uuid) -> Result<Option<RefOwner>, AppError>;

    async fn create_sheet(
        &mut self,
        kind: SheetKind,
        company_id: Uuid,
        name: &str,
        origin_id: Option<Uuid>,
    ) -> Result<PriceSheet, AppError>;

    async fn copy_sheet_lines(&mut self, kind: SheetKind, from: Uuid, to: Uuid) -> Result<u64, AppError>;

    async fn snapshot_live_prices(&mut self, kind: SheetKind, company_id: Uuid, sheet_id: Uuid) -> Result<u64, AppError>;

    async fn insert_lote(&mut self, company_id: Uuid, lote: &NewLote<'_>) -> Result<Lote, AppError>;

    async fn copy_mixtures(
        &mut self,
        company_id: Uuid,
        from_sheet: Uuid,
        to_sheet: Uuid,
    ) -> Result<Vec<CopiedMixture>, AppError>;

    async fn source_tasks(&mut self, company_id: Uuid, lote_id: Uuid) -> Result<Vec<SourceTask>, AppError>;

    async fn insert_task(&mut self, lote_id: Uuid, source: &Task) -> Result<Task, AppError>;

    async fn insert_task_resource(&mut self, task_id: Uuid, resource: ResourceRef, quantity: Decimal) -> Result<(), AppError>;

    async fn commit(self) -> Result<(), AppError>;
}

/// Implementação sobre uma transação do Postgres. Descartar sem `commit` faz rollback.
pub struct PgLoteUnitOfWork {
    tx: Transaction<'static, Postgres>,
    sheets: PriceSheetRepository,
    lotes: LoteRepository,
    mixtures: MixtureRepository,
    catalog: CatalogRepository,
}

impl PgLoteUnitOfWork {
    pub fn new(
        tx: Transaction<'static, Postgres>,
        sheets: PriceSheetRepository,
        lotes: LoteRepository,
        mixtures: MixtureRepository,
        catalog: CatalogRepository,
    ) -> Self {
        Self { tx, sheets, lotes, mixtures, catalog }
    }

    /// Conexão da transação, para gravar outros registros na mesma unidade.
    pub fn conn(&mut self) -> &mut PgConnection {
        &mut *self.tx
    }
}

#[async_trait]
impl LoteUnitOfWork for PgLoteUnitOfWork {
    async fn find_lote(&mut self, company_id: Uuid, id: Uuid) -> Result<Option<Lote>, AppError> {
        self.lotes.find_lote(&mut *self.tx, company_id, id).await
    }

    async fn find_exchange_type_owner(&mut self, id: Uuid) -> Result<Option<RefOwner>, AppError> {
        self.catalog
            .find_owner_in(&mut *self.tx, OwnedTable::Named(NamedCatalog::ExchangeTypes), id)
            .await
    }

    async fn create_sheet(
        &mut self,
        kind: SheetKind,
        company_id: Uuid,
        name: &str,
        origin_id: Option<Uuid>,
    ) -> Result<PriceSheet, AppError> {
        self.sheets.create_sheet(&mut *self.tx, kind, company_id, name, origin_id).await
    }

    async fn copy_sheet_lines(&mut self, kind: SheetKind, from: Uuid, to: Uuid) -> Result<u64, AppError> {
        self.sheets.copy_lines(&mut *self.tx, kind, from, to).await
    }

    async fn snapshot_live_prices(&mut self, kind: SheetKind, company_id: Uuid, sheet_id: Uuid) -> Result<u64, AppError> {
        self.sheets.snapshot_live_prices(&mut *self.tx, kind, company_id, sheet_id).await
    }

    async fn insert_lote(&mut self, company_id: Uuid, lote: &NewLote<'_>) -> Result<Lote, AppError> {
        self.lotes.insert_lote(&mut *self.tx, company_id, lote).await
    }

    async fn copy_mixtures(
        &mut self,
        company_id: Uuid,
        from_sheet: Uuid,
        to_sheet: Uuid,
    ) -> Result<Vec<CopiedMixture>, AppError> {
        self.mixtures.copy_mixtures(&mut *self.tx, company_id, from_sheet, to_sheet).await
    }

    async fn source_tasks(&mut self, company_id: Uuid, lote_id: Uuid) -> Result<Vec<SourceTask>, AppError> {
        let tasks = self.lotes.list_tasks(&mut *self.tx, company_id, lote_id).await?;
        let ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();
        let mut lines = group_by_task(self.lotes.task_resources(&mut *self.tx, &ids).await?);

        Ok(tasks
            .into_iter()
            .map(|task| SourceTask { lines: lines.remove(&task.id).unwrap_or_default(), task })
            .collect())
    }

    async fn insert_task(&mut self, lote_id: Uuid, source: &Task) -> Result<Task, AppError> {
        self.lotes
            .insert_task(&mut *self.tx, source.company_id, lote_id, source.trade_id, source.sub_trade_id, &source.name)
            .await
    }

    async fn insert_task_resource(&mut self, task_id: Uuid, resource: ResourceRef, quantity: Decimal) -> Result<(), AppError> {
        let (material, labor, subcontract, mixture) = resource.columns();
        self.lotes
            .insert_task_resource(&mut *self.tx, task_id, material, labor, subcontract, mixture, quantity)
            .await?;
        Ok(())
    }

    async fn commit(self) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }
}

// ---
// Orquestração
// ---

/// Carrega os lotes de origem citados no payload e confere o tipo de cambio.
/// Ausentes ou de outra empresa viram erro de validação por campo.
async fn resolve_sources<U: LoteUnitOfWork>(
    uow: &mut U,
    company_id: Uuid,
    payload: &CreateLotePayload,
) -> Result<HashMap<Uuid, Lote>, AppError> {
    let lote_of = |source: SheetSource| match source {
        SheetSource::Lote(id) => Some(id),
        SheetSource::Empty | SheetSource::Live => None,
    };
    let referenced = [
        ("materialsSource", lote_of(payload.materials_source)),
        ("laborSource", lote_of(payload.labor_source)),
        ("subcontractsSource", lote_of(payload.subcontracts_source)),
        ("mixturesFrom", payload.mixtures_from),
        ("tasksFrom", payload.tasks_from),
    ];

    let mut found = HashMap::new();
    let mut errors = ValidationErrors::new();
    for (field, id) in referenced {
        let Some(id) = id else { continue };
        if found.contains_key(&id) {
            continue;
        }
        match uow.find_lote(company_id, id).await? {
            Some(lote) => {
                found.insert(id, lote);
            }
            None => errors.add(field, field_error("not_found", "Lote de origem não encontrado.")),
        }
    }

    if let Some(id) = payload.exchange_type_id {
        match uow.find_exchange_type_owner(id).await? {
            Some(owner) if owner.company_id == company_id => {}
            Some(_) => errors.add(
                "exchangeTypeId",
                field_error("company_mismatch", "O registro não pertence à empresa ativa."),
            ),
            None => errors.add("exchangeTypeId", field_error("not_found", "Registro não encontrado.")),
        }
    }

    if errors.is_empty() { Ok(found) } else { Err(AppError::ValidationError(errors)) }
}

/// Troca a mistura de uma linha pela cópia com o mesmo nome no lote novo.
/// Sem correspondente, mantém a referência original.
fn rebind_mixture(resource: ResourceRef, name: Option<&str>, targets: &HashMap<&str, Uuid>) -> ResourceRef {
    let ResourceRef::Mixture(original) = resource else {
        return resource;
    };
    match name.and_then(|n| targets.get(n)) {
        Some(id) => ResourceRef::Mixture(*id),
        None => {
            tracing::warn!(mixture_id = %original, "Mistura sem cópia no lote novo; mantida a referência original");
            resource
        }
    }
}

/// Executa os passos da criação dentro da unidade de trabalho, sem confirmar.
/// Ordem: hoja de materiais, de mão de obra, de subcontratos, lote, misturas, tarefas.
pub async fn build_lote<U: LoteUnitOfWork>(
    uow: &mut U,
    company_id: Uuid,
    payload: &CreateLotePayload,
) -> Result<Lote, AppError> {
    let name = payload.name.trim();
    if name.is_empty() {
        let mut errors = ValidationErrors::new();
        errors.add("name", field_error("length", "O nome do lote é obrigatório."));
        return Err(AppError::ValidationError(errors));
    }
    let sources = resolve_sources(uow, company_id, payload).await?;
    let source_lote = |id: Uuid| sources.get(&id).ok_or(AppError::NotFound("Lote de origem"));

    // 1. As três hojas, com o nome do lote
    let mut sheet_ids = HashMap::new();
    for kind in SheetKind::ALL {
        let source = payload.source(kind);
        let origin = match source {
            SheetSource::Lote(id) => Some(source_lote(id)?.sheet_id(kind)),
            SheetSource::Empty | SheetSource::Live => None,
        };

        let sheet = uow.create_sheet(kind, company_id, name, origin).await?;
        let lines = match (source, origin) {
            (SheetSource::Live, _) => uow.snapshot_live_prices(kind, company_id, sheet.id).await?,
            (SheetSource::Lote(_), Some(from)) => uow.copy_sheet_lines(kind, from, sheet.id).await?,
            _ => 0,
        };
        tracing::debug!(?kind, sheet_id = %sheet.id, lines, "Hoja criada");
        sheet_ids.insert(kind, sheet.id);
    }
    let sheet_of = |kind: SheetKind| sheet_ids.get(&kind).copied().ok_or(AppError::NotFound("Hoja de precios"));

    // 2. O lote, apontando para as hojas novas
    let lote = uow
        .insert_lote(
            company_id,
            &NewLote {
                name,
                material_sheet_id: sheet_of(SheetKind::Materials)?,
                labor_sheet_id: sheet_of(SheetKind::Labor)?,
                subcontract_sheet_id: sheet_of(SheetKind::Subcontracts)?,
                exchange_type_id: payload.exchange_type_id,
                exchange_date: payload.exchange_date,
            },
        )
        .await?;

    // 3. Misturas vinculadas à hoja de materiais do lote de origem
    let copied = match payload.mixtures_from {
        Some(id) => {
            let from_sheet = source_lote(id)?.material_sheet_id;
            uow.copy_mixtures(company_id, from_sheet, lote.material_sheet_id).await?
        }
        None => Vec::new(),
    };

    // 4. Maestro de tarefas, religando misturas pelo nome
    if let Some(id) = payload.tasks_from {
        let targets: HashMap<&str, Uuid> = copied.iter().map(|m| (m.name.as_str(), m.new_id)).collect();
        for source in uow.source_tasks(company_id, source_lote(id)?.id).await? {
            let task = uow.insert_task(lote.id, &source.task).await?;
            for detail in &source.lines {
                let Some(resource) = detail.line.resource() else {
                    continue;
                };
                let resource = rebind_mixture(resource, detail.resource_name.as_deref(), &targets);
                uow.insert_task_resource(task.id, resource, detail.line.quantity).await?;
            }
        }
    }

    Ok(lote)
}

/// Falhas da criação viram um erro genérico e repetível; as de entrada passam como estão.
fn creation_failed(e: AppError) -> AppError {
    match e {
        AppError::ValidationError(_) | AppError::Conflict(_) => e,
        other => {
            tracing::error!(error = ?other, "Falha ao criar o lote; transação desfeita");
            AppError::LoteCreationFailed
        }
    }
}

/// Cria o lote e confirma. Qualquer falha descarta a unidade de trabalho inteira.
pub async fn create_lote_with<U: LoteUnitOfWork>(
    mut uow: U,
    company_id: Uuid,
    payload: &CreateLotePayload,
) -> Result<Lote, AppError> {
    let lote = build_lote(&mut uow, company_id, payload).await.map_err(creation_failed)?;
    uow.commit().await.map_err(creation_failed)?;

    tracing::info!(lote_id = %lote.id, company_id = %company_id, "Lote criado");
    Ok(lote)
}

#[derive(Clone)]
pub struct LoteService {
    lote_repo: LoteRepository,
    sheet_repo: PriceSheetRepository,
    mixture_repo: MixtureRepository,
    catalog_repo: CatalogRepository,
    pool: PgPool,
}

impl LoteService {
    pub fn new(
        lote_repo: LoteRepository,
        sheet_repo: PriceSheetRepository,
        mixture_repo: MixtureRepository,
        catalog_repo: CatalogRepository,
        pool: PgPool,
    ) -> Self {
        Self { lote_repo, sheet_repo, mixture_repo, catalog_repo, pool }
    }

    /// Abre uma unidade de trabalho transacional.
    pub async fn begin(&self) -> Result<PgLoteUnitOfWork, AppError> {
        let tx = self.pool.begin().await?;
        Ok(PgLoteUnitOfWork::new(
            tx,
            self.sheet_repo.clone(),
            self.lote_repo.clone(),
            self.mixture_repo.clone(),
            self.catalog_repo.clone(),
        ))
    }

    pub async fn create_lote(&self, company_id: Uuid, payload: &CreateLotePayload) -> Result<Lote, AppError> {
        let uow = self.begin().await.map_err(creation_failed)?;
        create_lote_with(uow, company_id, payload).await
    }

    pub async fn list_lotes(&self, company_id: Uuid) -> Result<Vec<Lote>, AppError> {
        self.lote_repo.list_lotes(company_id).await
    }

    pub async fn get_lote(&self, company_id: Uuid, id: Uuid) -> Result<Lote, AppError> {
        self.lote_repo
            .find_lote(&self.pool, company_id, id)
            .await?
            .ok_or(AppError::NotFound("Lote"))
    }

    // =========================================================================
    //  TAREAS
    // =========================================================================

    pub async fn create_task(&self, company_id: Uuid, payload: &TaskPayload) -> Result<Task, AppError> {
        let trade = self.catalog_repo.find_owner(OwnedTable::Named(NamedCatalog::Trades), payload.trade_id).await?;
        let sub_trade = self
            .catalog_repo
            .find_owner(OwnedTable::Child(ChildCatalog::SubTrades), payload.sub_trade_id)
            .await?;
        let lote = self.catalog_repo.find_owner(OwnedTable::Lote, payload.lote_id).await?;

        let mut scope = CompanyScope::new(company_id);
        scope
            .owned("tradeId", trade)
            .owned("subTradeId", sub_trade)
            .belongs_to("subTradeId", sub_trade, payload.trade_id, SUB_TRADE_NOT_IN_TRADE)
            .owned("loteId", lote);
        scope.finish()?;

        self.lote_repo
            .insert_task(&self.pool, company_id, payload.lote_id, payload.trade_id, payload.sub_trade_id, &payload.name)
            .await
    }

    pub async fn list_tasks(&self, company_id: Uuid, lote_id: Uuid) -> Result<Vec<Task>, AppError> {
        self.get_lote(company_id, lote_id).await?;
        self.lote_repo.list_tasks(&self.pool, company_id, lote_id).await
    }

    pub async fn add_task_resource(
        &self,
        company_id: Uuid,
        task_id: Uuid,
        payload: &TaskResourcePayload,
    ) -> Result<TaskResource, AppError> {
        self.lote_repo
            .find_task(&self.pool, company_id, task_id)
            .await?
            .ok_or(AppError::NotFound("Tarea"))?;

        let resource = validate_resource_line(
            payload.material_id,
            payload.labor_id,
            payload.subcontract_id,
            payload.mixture_id,
            payload.quantity,
        )?;

        let (field, table, id) = match resource {
            ResourceRef::Material(id) => ("materialId", OwnedTable::Material, id),
            ResourceRef::Labor(id) => ("laborId", OwnedTable::Labor, id),
            ResourceRef::Subcontract(id) => ("subcontractId", OwnedTable::Subcontract, id),
            ResourceRef::Mixture(id) => ("mixtureId", OwnedTable::Mixture, id),
        };
        let owner = self.catalog_repo.find_owner(table, id).await?;
        let mut scope = CompanyScope::new(company_id);
        scope.owned(field, owner);
        scope.finish()?;

        let (material, labor, subcontract, mixture) = resource.columns();
        self.lote_repo
            .insert_task_resource(&self.pool, task_id, material, labor, subcontract, mixture, payload.quantity)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, Default)]
    struct Store {
        lotes: Vec<Lote>,
        sheets: Vec<(SheetKind, PriceSheet)>,
        // (tipo, hoja, recurso)
        sheet_lines: Vec<(SheetKind, Uuid, Uuid)>,
        // (id, hoja, nome)
        mixtures: Vec<(Uuid, Uuid, String)>,
        tasks: Vec<SourceTask>,
    }

    /// Unidade de trabalho em memória: escreve numa cópia e só publica no `commit`.
    struct FakeUow {
        committed: Arc<Mutex<Store>>,
        staged: Store,
        live_catalog: Vec<(SheetKind, Uuid)>,
        // (tipo de cambio, empresa)
        exchange_types: Vec<(Uuid, Uuid)>,
        fail_on_sheet: Option<SheetKind>,
    }

    impl FakeUow {
        fn begin(committed: &Arc<Mutex<Store>>) -> Self {
            let staged = committed.lock().unwrap().clone();
            Self {
                committed: Arc::clone(committed),
                staged,
                live_catalog: Vec::new(),
                exchange_types: Vec::new(),
                fail_on_sheet: None,
            }
        }
    }

    fn detail(task_id: Uuid, resource: ResourceRef, quantity: Decimal, name: Option<&str>) -> TaskResourceDetail {
        let (material_id, labor_id, subcontract_id, mixture_id) = resource.columns();
        TaskResourceDetail {
            line: TaskResource { id: Uuid::new_v4(), task_id, material_id, labor_id, subcontract_id, mixture_id, quantity },
            resource_name: name.map(str::to_string),
            unit_name: None,
        }
    }

    #[async_trait]
    impl LoteUnitOfWork for FakeUow {
        async fn find_lote(&mut self, company_id: Uuid, id: Uuid) -> Result<Option<Lote>, AppError> {
            Ok(self.staged.lotes.iter().find(|l| l.id == id && l.company_id == company_id).cloned())
        }

        async fn find_exchange_type_owner(&mut self, id: Uuid) -> Result<Option<RefOwner>, AppError> {
            Ok(self
                .exchange_types
                .iter()
                .find(|(type_id, _)| *type_id == id)
                .map(|(_, company_id)| RefOwner { company_id: *company_id, parent_id: None }))
        }

        async fn create_sheet(
            &mut self,
            kind: SheetKind,
            company_id: Uuid,
            name: &str,
            origin_id: Option<Uuid>,
        ) -> Result<PriceSheet, AppError> {
            if self.fail_on_sheet == Some(kind) {
                return Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut));
            }
            let sheet = PriceSheet {
                id: Uuid::new_v4(),
                company_id,
                name: name.to_string(),
                origin_id,
                created_at: Utc::now(),
            };
            self.staged.sheets.push((kind, sheet.clone()));
            Ok(sheet)
        }

        async fn copy_sheet_lines(&mut self, kind: SheetKind, from: Uuid, to: Uuid) -> Result<u64, AppError> {
            let copies: Vec<_> = self
                .staged
                .sheet_lines
                .iter()
                .filter(|(k, sheet, _)| *k == kind && *sheet == from)
                .map(|(k, _, resource)| (*k, to, *resource))
                .collect();
            let count = copies.len() as u64;
            self.staged.sheet_lines.extend(copies);
            Ok(count)
        }

        async fn snapshot_live_prices(&mut self, kind: SheetKind, _company_id: Uuid, sheet_id: Uuid) -> Result<u64, AppError> {
            let lines: Vec<_> = self
                .live_catalog
                .iter()
                .filter(|(k, _)| *k == kind)
                .map(|(k, resource)| (*k, sheet_id, *resource))
                .collect();
            let count = lines.len() as u64;
            self.staged.sheet_lines.extend(lines);
            Ok(count)
        }

        async fn insert_lote(&mut self, company_id: Uuid, lote: &NewLote<'_>) -> Result<Lote, AppError> {
            let row = Lote {
                id: Uuid::new_v4(),
                company_id,
                name: lote.name.to_string(),
                material_sheet_id: lote.material_sheet_id,
                labor_sheet_id: lote.labor_sheet_id,
                subcontract_sheet_id: lote.subcontract_sheet_id,
                exchange_type_id: lote.exchange_type_id,
                exchange_date: lote.exchange_date,
                created_at: Utc::now(),
            };
            self.staged.lotes.push(row.clone());
            Ok(row)
        }

        async fn copy_mixtures(
            &mut self,
            _company_id: Uuid,
            from_sheet: Uuid,
            to_sheet: Uuid,
        ) -> Result<Vec<CopiedMixture>, AppError> {
            let sources: Vec<_> = self.staged.mixtures.iter().filter(|(_, s, _)| *s == from_sheet).cloned().collect();
            let mut copied = Vec::new();
            for (source_id, _, name) in sources {
                let new_id = Uuid::new_v4();
                self.staged.mixtures.push((new_id, to_sheet, name.clone()));
                copied.push(CopiedMixture { source_id, new_id, name });
            }
            Ok(copied)
        }

        async fn source_tasks(&mut self, company_id: Uuid, lote_id: Uuid) -> Result<Vec<SourceTask>, AppError> {
            Ok(self
                .staged
                .tasks
                .iter()
                .filter(|t| t.task.lote_id == lote_id && t.task.company_id == company_id)
                .cloned()
                .collect())
        }

        async fn insert_task(&mut self, lote_id: Uuid, source: &Task) -> Result<Task, AppError> {
            let task = Task { id: Uuid::new_v4(), lote_id, ..source.clone() };
            self.staged.tasks.push(SourceTask { task: task.clone(), lines: Vec::new() });
            Ok(task)
        }

        async fn insert_task_resource(&mut self, task_id: Uuid, resource: ResourceRef, quantity: Decimal) -> Result<(), AppError> {
            let task = self
                .staged
                .tasks
                .iter_mut()
                .find(|t| t.task.id == task_id)
                .ok_or(AppError::NotFound("Tarea"))?;
            task.lines.push(detail(task_id, resource, quantity, None));
            Ok(())
        }

        async fn commit(self) -> Result<(), AppError> {
            *self.committed.lock().unwrap() = self.staged;
            Ok(())
        }
    }

    struct Seed {
        company: Uuid,
        source: Lote,
        mortar: Uuid,
        orphan_mixture: Uuid,
        cement: Uuid,
    }

    // Lote de origem com hojas, uma mistura vinculada e uma tarefa de três linhas.
    fn seed(store: &mut Store) -> Seed {
        let company = Uuid::new_v4();
        let sheet = |kind: SheetKind| PriceSheet {
            id: Uuid::new_v4(),
            company_id: company,
            name: "Lote Marzo".into(),
            origin_id: None,
            created_at: Utc::now(),
        };
        let (mat, lab, sub) = (sheet(SheetKind::Materials), sheet(SheetKind::Labor), sheet(SheetKind::Subcontracts));
        let source = Lote {
            id: Uuid::new_v4(),
            company_id: company,
            name: "Lote Marzo".into(),
            material_sheet_id: mat.id,
            labor_sheet_id: lab.id,
            subcontract_sheet_id: sub.id,
            exchange_type_id: None,
            exchange_date: None,
            created_at: Utc::now(),
        };

        let cement = Uuid::new_v4();
        let sand = Uuid::new_v4();
        store.sheet_lines.push((SheetKind::Materials, mat.id, cement));
        store.sheet_lines.push((SheetKind::Materials, mat.id, sand));

        let mortar = Uuid::new_v4();
        store.mixtures.push((mortar, mat.id, "Mortero 1:3".into()));
        // Mistura de outra hoja: não é copiada
        let orphan_mixture = Uuid::new_v4();
        store.mixtures.push((orphan_mixture, Uuid::new_v4(), "Hormigón H21".into()));

        let task = Task {
            id: Uuid::new_v4(),
            company_id: company,
            trade_id: Uuid::new_v4(),
            sub_trade_id: Uuid::new_v4(),
            lote_id: source.id,
            name: "Contrapiso".into(),
        };
        let lines = vec![
            detail(task.id, ResourceRef::Material(cement), dec!(2), Some("Cemento")),
            detail(task.id, ResourceRef::Mixture(mortar), dec!(0.5), Some("Mortero 1:3")),
            detail(task.id, ResourceRef::Mixture(orphan_mixture), dec!(1), Some("Hormigón H21")),
        ];
        store.tasks.push(SourceTask { task, lines });

        store.sheets.extend([(SheetKind::Materials, mat), (SheetKind::Labor, lab), (SheetKind::Subcontracts, sub)]);
        store.lotes.push(source.clone());

        Seed { company, source, mortar, orphan_mixture, cement }
    }

    fn copy_everything(seed: &Seed) -> CreateLotePayload {
        CreateLotePayload {
            materials_source: SheetSource::Lote(seed.source.id),
            labor_source: SheetSource::Live,
            subcontracts_source: SheetSource::Empty,
            mixtures_from: Some(seed.source.id),
            tasks_from: Some(seed.source.id),
            ..CreateLotePayload::empty("Lote Abril")
        }
    }

    #[tokio::test]
    async fn creates_three_sheets_and_a_lote_that_references_them() {
        let committed = Arc::new(Mutex::new(Store::default()));
        let seed = seed(&mut committed.lock().unwrap());
        let mut uow = FakeUow::begin(&committed);
        let live_labor = Uuid::new_v4();
        uow.live_catalog.push((SheetKind::Labor, live_labor));

        let lote = create_lote_with(uow, seed.company, &copy_everything(&seed)).await.unwrap();

        let store = committed.lock().unwrap();
        let new_sheets: Vec<_> = store.sheets.iter().filter(|(_, s)| s.name == "Lote Abril").collect();
        assert_eq!(new_sheets.len(), 3);
        for (kind, sheet) in &new_sheets {
            assert_eq!(lote.sheet_id(*kind), sheet.id);
        }

        // Materiais copiados da hoja de origem, com origem registrada
        let (_, materials) = new_sheets.iter().find(|(k, _)| *k == SheetKind::Materials).unwrap();
        assert_eq!(materials.origin_id, Some(seed.source.material_sheet_id));
        let copied_lines = store.sheet_lines.iter().filter(|(_, s, _)| *s == materials.id).count();
        assert_eq!(copied_lines, 2);

        // Mão de obra: snapshot dos preços vivos; subcontratos: vazia
        assert!(store.sheet_lines.contains(&(SheetKind::Labor, lote.labor_sheet_id, live_labor)));
        assert!(!store.sheet_lines.iter().any(|(_, s, _)| *s == lote.subcontract_sheet_id));
        assert!(store.lotes.iter().any(|l| l.id == lote.id));
    }

    #[tokio::test]
    async fn replays_tasks_and_rebinds_mixtures_by_name() {
        let committed = Arc::new(Mutex::new(Store::default()));
        let seed = seed(&mut committed.lock().unwrap());

        let lote = create_lote_with(FakeUow::begin(&committed), seed.company, &copy_everything(&seed))
            .await
            .unwrap();

        let store = committed.lock().unwrap();
        let (copied_mortar, ..) = store
            .mixtures
            .iter()
            .find(|(_, sheet, name)| *sheet == lote.material_sheet_id && name == "Mortero 1:3")
            .expect("mistura copiada para a hoja nova");
        assert_ne!(*copied_mortar, seed.mortar);

        let replayed = store.tasks.iter().find(|t| t.task.lote_id == lote.id).expect("tarefa replicada");
        assert_eq!(replayed.task.name, "Contrapiso");
        let resources: Vec<_> = replayed.lines.iter().map(|d| d.line.resource().unwrap()).collect();
        assert_eq!(
            resources,
            vec![
                ResourceRef::Material(seed.cement),
                ResourceRef::Mixture(*copied_mortar),
                ResourceRef::Mixture(seed.orphan_mixture),
            ]
        );
        assert_eq!(replayed.lines[1].line.quantity, dec!(0.5));
    }

    #[tokio::test]
    async fn failure_at_labor_sheet_leaves_nothing_behind() {
        let committed = Arc::new(Mutex::new(Store::default()));
        let seed = seed(&mut committed.lock().unwrap());
        let before = committed.lock().unwrap().clone();

        let mut uow = FakeUow::begin(&committed);
        uow.fail_on_sheet = Some(SheetKind::Labor);

        let err = create_lote_with(uow, seed.company, &copy_everything(&seed)).await.unwrap_err();
        assert!(matches!(err, AppError::LoteCreationFailed));

        let after = committed.lock().unwrap();
        assert_eq!(after.sheets.len(), before.sheets.len());
        assert_eq!(after.lotes.len(), before.lotes.len());
        assert_eq!(after.mixtures.len(), before.mixtures.len());
        assert!(!after.sheets.iter().any(|(_, s)| s.name == "Lote Abril"));
    }

    #[tokio::test]
    async fn unknown_source_lote_is_a_field_error() {
        let committed = Arc::new(Mutex::new(Store::default()));
        let seed = seed(&mut committed.lock().unwrap());
        let payload = CreateLotePayload { tasks_from: Some(Uuid::new_v4()), ..CreateLotePayload::empty("Lote Abril") };

        let err = create_lote_with(FakeUow::begin(&committed), seed.company, &payload).await.unwrap_err();
        match err {
            AppError::ValidationError(errors) => assert!(errors.field_errors().contains_key("tasksFrom")),
            other => panic!("esperava erro de validação, veio {other:?}"),
        }
        assert_eq!(committed.lock().unwrap().lotes.len(), 1);
    }

    #[tokio::test]
    async fn exchange_type_of_another_company_is_a_field_error() {
        let committed = Arc::new(Mutex::new(Store::default()));
        let seed = seed(&mut committed.lock().unwrap());
        let foreign_type = Uuid::new_v4();
        let mut uow = FakeUow::begin(&committed);
        uow.exchange_types.push((foreign_type, Uuid::new_v4()));

        let payload = CreateLotePayload {
            exchange_type_id: Some(foreign_type),
            ..CreateLotePayload::empty("Lote Abril")
        };
        let err = create_lote_with(uow, seed.company, &payload).await.unwrap_err();
        match err {
            AppError::ValidationError(errors) => assert!(errors.field_errors().contains_key("exchangeTypeId")),
            other => panic!("esperava erro de validação, veio {other:?}"),
        }

        let store = committed.lock().unwrap();
        assert_eq!(store.lotes.len(), 1);
        assert!(!store.sheets.iter().any(|(_, s)| s.name == "Lote Abril"));
    }

    #[tokio::test]
    async fn blank_lote_name_is_rejected_before_any_write() {
        let committed = Arc::new(Mutex::new(Store::default()));
        let seed = seed(&mut committed.lock().unwrap());

        let err = create_lote_with(FakeUow::begin(&committed), seed.company, &CreateLotePayload::empty("   "))
            .await
            .unwrap_err();
        match err {
            AppError::ValidationError(errors) => assert!(errors.field_errors().contains_key("name")),
            other => panic!("esperava erro de validação, veio {other:?}"),
        }
        assert_eq!(committed.lock().unwrap().sheets.len(), 3);
    }

    #[tokio::test]
    async fn own_exchange_type_is_kept_on_the_lote() {
        let committed = Arc::new(Mutex::new(Store::default()));
        let seed = seed(&mut committed.lock().unwrap());
        let blue = Uuid::new_v4();
        let mut uow = FakeUow::begin(&committed);
        uow.exchange_types.push((blue, seed.company));

        let payload = CreateLotePayload { exchange_type_id: Some(blue), ..CreateLotePayload::empty("Lote Abril") };
        let lote = create_lote_with(uow, seed.company, &payload).await.unwrap();
        assert_eq!(lote.exchange_type_id, Some(blue));
    }

    #[test]
    fn rebind_keeps_non_mixture_lines() {
        let targets = HashMap::new();
        let labor = ResourceRef::Labor(Uuid::new_v4());
        assert_eq!(rebind_mixture(labor, Some("x"), &targets), labor);
    }

    #[test]
    fn group_by_task_preserves_line_order() {
        let task = Uuid::new_v4();
        let first = detail(task, ResourceRef::Labor(Uuid::new_v4()), dec!(1), None);
        let second = detail(task, ResourceRef::Labor(Uuid::new_v4()), dec!(2), None);
        let grouped = group_by_task(vec![first.clone(), second.clone()]);
        let lines = &grouped[&task];
        assert_eq!(lines[0].line.id, first.line.id);
        assert_eq!(lines[1].line.id, second.line.id);
    }
}
