// tests/database.rs
//
// Testes contra um PostgreSQL real. Rode com:
//   DATABASE_URL=postgres://... cargo test -- --ignored

use rust_decimal_macros::dec;
use sqlx::PgPool;
use uuid::Uuid;

use presupuestos_backend::{
    common::error::AppError,
    config::AppState,
    db::LoteRepository,
    models::{
        lote::{CreateLotePayload, SheetSource},
        tenancy::AddMemberPayload,
        resources::{BulkPricePayload, PriceTable},
    },
    services::lote_service::INITIAL_LOTE_NAME,
};

struct Fixture {
    state: AppState,
    company_id: Uuid,
    task_id: Uuid,
    material_id: Uuid,
    mixture_id: Uuid,
}

async fn insert_id(pool: &PgPool, sql: &str, binds: &[Uuid], name: &str) -> Uuid {
    let mut query = sqlx::query_scalar::<_, Uuid>(sql);
    for id in binds {
        query = query.bind(*id);
    }
    query.bind(name).fetch_one(pool).await.unwrap()
}

/// Empresa com Lote Inicial, um material, uma mezcla e uma tarefa sem linhas.
async fn fixture(pool: PgPool) -> Fixture {
    let state = AppState::new(pool.clone(), "segredo-de-teste".to_string());
    let company = state.tenant_service.create_company("Constructora Sur", None).await.unwrap();
    let c = company.id;

    let trade = insert_id(&pool, "INSERT INTO trades (company_id, name) VALUES ($1, $2) RETURNING id", &[c], "Albañilería").await;
    let sub_trade = insert_id(
        &pool,
        "INSERT INTO sub_trades (company_id, trade_id, name) VALUES ($1, $2, $3) RETURNING id",
        &[c, trade],
        "Muros",
    )
    .await;
    let unit = insert_id(&pool, "INSERT INTO units (company_id, name) VALUES ($1, $2) RETURNING id", &[c], "m3").await;
    let mtype = insert_id(&pool, "INSERT INTO material_types (company_id, name) VALUES ($1, $2) RETURNING id", &[c], "Áridos").await;
    let category = insert_id(
        &pool,
        "INSERT INTO material_categories (company_id, material_type_id, name) VALUES ($1, $2, $3) RETURNING id",
        &[c, mtype],
        "Arena",
    )
    .await;
    let material_id = insert_id(
        &pool,
        r#"INSERT INTO materials (company_id, material_type_id, category_id, sale_unit_id, name, sale_unit_price)
           VALUES ($1, $2, $3, $4, $5, 1000) RETURNING id"#,
        &[c, mtype, category, unit],
        "Arena fina",
    )
    .await;
    let mixture_id = insert_id(
        &pool,
        "INSERT INTO mixtures (company_id, mixture_unit_id, name) VALUES ($1, $2, $3) RETURNING id",
        &[c, unit],
        "Mortero 1:3",
    )
    .await;

    let lote = state
        .lote_service
        .list_lotes(c)
        .await
        .unwrap()
        .into_iter()
        .find(|l| l.name == INITIAL_LOTE_NAME)
        .unwrap();
    let task = LoteRepository::new(pool.clone())
        .insert_task(&pool, c, lote.id, trade, sub_trade, "Muro de ladrillo común")
        .await
        .unwrap();

    Fixture { state, company_id: c, task_id: task.id, material_id, mixture_id }
}

async fn count(pool: &PgPool, table: &str, company_id: Uuid) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table} WHERE company_id = $1"))
        .bind(company_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

// ---
// Linhas de tarefa
// ---

#[sqlx::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn task_line_with_two_resources_is_rejected_by_the_database(pool: PgPool) {
    let f = fixture(pool.clone()).await;

    let err = LoteRepository::new(pool.clone())
        .insert_task_resource(&pool, f.task_id, Some(f.material_id), None, None, Some(f.mixture_id), dec!(1))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ConstraintViolation(ref c) if c == "task_resource_exactly_one_resource"));
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn task_line_without_positive_quantity_is_rejected_by_the_database(pool: PgPool) {
    let f = fixture(pool.clone()).await;
    let repo = LoteRepository::new(pool.clone());

    for qty in [dec!(0), dec!(-2.5)] {
        let err = repo
            .insert_task_resource(&pool, f.task_id, Some(f.material_id), None, None, None, qty)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ConstraintViolation(ref c) if c == "task_resource_quantity_gt_zero"));
    }

    let line = repo
        .insert_task_resource(&pool, f.task_id, Some(f.material_id), None, None, None, dec!(0.35))
        .await
        .unwrap();
    assert_eq!(line.quantity, dec!(0.35));
}

// ---
// Seções
// ---

#[sqlx::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn purchases_member_has_no_payroll_section_but_admin_does(pool: PgPool) {
    let state = AppState::new(pool.clone(), "segredo-de-teste".to_string());
    let owner = Uuid::new_v4();
    let company = state.tenant_service.create_company("Obras Oeste", Some(owner)).await.unwrap();

    let buyer = state
        .tenant_service
        .add_member(
            company.id,
            &AddMemberPayload { user_id: Uuid::new_v4(), is_admin: false, sections: vec!["compras".into()] },
        )
        .await
        .unwrap();
    assert!(state.tenant_repo.has_section(&buyer, "compras").await.unwrap());
    assert!(!state.tenant_repo.has_section(&buyer, "sueldos").await.unwrap());

    let admin = state.tenant_repo.find_membership(owner, company.id).await.unwrap().unwrap();
    assert!(state.tenant_repo.has_section(&admin, "sueldos").await.unwrap());
}

// ---
// Criação de lote
// ---

#[sqlx::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn company_bootstrap_creates_initial_lote_with_three_sheets(pool: PgPool) {
    let state = AppState::new(pool.clone(), "segredo-de-teste".to_string());
    let owner = Uuid::new_v4();
    let company = state.tenant_service.create_company("Obras Norte", Some(owner)).await.unwrap();

    let lotes = state.lote_service.list_lotes(company.id).await.unwrap();
    assert_eq!(lotes.len(), 1);
    assert_eq!(lotes[0].name, INITIAL_LOTE_NAME);

    for table in ["material_sheets", "labor_sheets", "subcontract_sheets"] {
        assert_eq!(count(&pool, table, company.id).await, 1, "{table}");
    }

    let companies = state.tenant_service.list_user_companies(owner).await.unwrap();
    assert_eq!(companies.len(), 1);
    assert!(companies[0].is_admin);
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn new_lote_snapshots_live_prices_and_replays_tasks(pool: PgPool) {
    let f = fixture(pool.clone()).await;
    let repo = LoteRepository::new(pool.clone());
    repo.insert_task_resource(&pool, f.task_id, Some(f.material_id), None, None, None, dec!(2))
        .await
        .unwrap();
    let initial = f.state.lote_service.list_lotes(f.company_id).await.unwrap().remove(0);

    let mut payload = CreateLotePayload::empty("Marzo 2025");
    payload.materials_source = SheetSource::Live;
    payload.tasks_from = Some(initial.id);
    let lote = f.state.lote_service.create_lote(f.company_id, &payload).await.unwrap();

    // Os três ids de hoja apontam para hojas da empresa
    for (table, id) in [
        ("material_sheets", lote.material_sheet_id),
        ("labor_sheets", lote.labor_sheet_id),
        ("subcontract_sheets", lote.subcontract_sheet_id),
    ] {
        let exists: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS (SELECT 1 FROM {table} WHERE id = $1 AND company_id = $2)"
        ))
        .bind(id)
        .bind(f.company_id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert!(exists, "{table}");
    }

    // Custeio pelo snapshot: 2 x 1000
    let costs = f.state.costing_service.lote_task_costs(f.company_id, lote.id).await.unwrap();
    assert_eq!(costs.len(), 1);
    assert_eq!(costs[0].total, dec!(2000));
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn failed_lote_creation_leaves_no_rows_behind(pool: PgPool) {
    let f = fixture(pool.clone()).await;

    let before: Vec<i64> = {
        let mut v = Vec::new();
        for table in ["lotes", "material_sheets", "labor_sheets", "subcontract_sheets", "tasks"] {
            v.push(count(&pool, table, f.company_id).await);
        }
        v
    };

    // Origem inexistente: erro de validação antes de qualquer gravação
    let mut payload = CreateLotePayload::empty("Abril 2025");
    payload.labor_source = SheetSource::Lote(Uuid::new_v4());
    let err = f.state.lote_service.create_lote(f.company_id, &payload).await.unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    // Nome repetido: as hojas já criadas na transação somem no rollback
    let dup = CreateLotePayload::empty(INITIAL_LOTE_NAME);
    let err = f.state.lote_service.create_lote(f.company_id, &dup).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let mut after = Vec::new();
    for table in ["lotes", "material_sheets", "labor_sheets", "subcontract_sheets", "tasks"] {
        after.push(count(&pool, table, f.company_id).await);
    }
    assert_eq!(before, after);
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn lote_cannot_use_another_companys_exchange_type(pool: PgPool) {
    let f = fixture(pool.clone()).await;
    let other = f.state.tenant_service.create_company("Obras Norte", None).await.unwrap();
    let foreign_type = insert_id(
        &pool,
        "INSERT INTO exchange_types (company_id, name) VALUES ($1, $2) RETURNING id",
        &[other.id],
        "Dólar blue",
    )
    .await;
    let lotes_before = count(&pool, "lotes", f.company_id).await;

    let payload = CreateLotePayload { exchange_type_id: Some(foreign_type), ..CreateLotePayload::empty("Mayo 2025") };
    let err = f.state.lote_service.create_lote(f.company_id, &payload).await.unwrap_err();
    match err {
        AppError::ValidationError(errors) => assert!(errors.field_errors().contains_key("exchangeTypeId")),
        other => panic!("esperava erro de validação, veio {other:?}"),
    }
    assert_eq!(count(&pool, "lotes", f.company_id).await, lotes_before);

    // O tipo da própria empresa é aceito
    let own_type = insert_id(
        &pool,
        "INSERT INTO exchange_types (company_id, name) VALUES ($1, $2) RETURNING id",
        &[f.company_id],
        "Dólar oficial",
    )
    .await;
    let payload = CreateLotePayload { exchange_type_id: Some(own_type), ..CreateLotePayload::empty("Mayo 2025") };
    let lote = f.state.lote_service.create_lote(f.company_id, &payload).await.unwrap();
    assert_eq!(lote.exchange_type_id, Some(own_type));
}

// ---
// Reajuste em massa
// ---

#[sqlx::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn bulk_price_update_touches_only_selected_company_rows(pool: PgPool) {
    let f = fixture(pool.clone()).await;

    // Um id de outra empresa (inexistente aqui) não conta como afetado
    let payload = BulkPricePayload {
        table: PriceTable::Materials,
        ids: vec![f.material_id, Uuid::new_v4()],
        percentage: dec!(10),
    };
    let result = f.state.resource_service.bulk_update_prices(f.company_id, payload).await.unwrap();
    assert_eq!(result.updated, 1);

    let price: rust_decimal::Decimal = sqlx::query_scalar("SELECT sale_unit_price FROM materials WHERE id = $1")
        .bind(f.material_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(price, dec!(1100));
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn bulk_price_overflow_is_a_constraint_violation(pool: PgPool) {
    let f = fixture(pool.clone()).await;
    sqlx::query("UPDATE materials SET sale_unit_price = 10000000 WHERE id = $1")
        .bind(f.material_id)
        .execute(&pool)
        .await
        .unwrap();

    let payload = BulkPricePayload { table: PriceTable::Materials, ids: vec![f.material_id], percentage: dec!(1000) };
    let err = f.state.resource_service.bulk_update_prices(f.company_id, payload).await.unwrap_err();
    assert!(matches!(err, AppError::ConstraintViolation(ref c) if c == "numeric_value_out_of_range"));
}
