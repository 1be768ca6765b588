use crate::common::error::AppError;

// ---
// Tradução de violações de restrição do Postgres
// ---
/// SQLSTATE de valor fora da precisão da coluna `NUMERIC`.
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

/// Converte violações de unicidade em `Conflict` e violações de CHECK em
/// `ConstraintViolation`, assim como estouro numérico. O resto segue como erro de banco.
pub(crate) fn map_constraint_error(e: sqlx::Error, conflict_message: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::Conflict(conflict_message.to_string());
        }
        if db_err.is_check_violation() {
            let constraint = db_err.constraint().unwrap_or("check").to_string();
            return AppError::ConstraintViolation(constraint);
        }
        if db_err.code().as_deref() == Some(NUMERIC_VALUE_OUT_OF_RANGE) {
            return AppError::ConstraintViolation("numeric_value_out_of_range".to_string());
        }
    }
    AppError::DatabaseError(e)
}

/// Adapta `map_constraint_error` para uso direto em `.map_err(...)`.
pub(crate) fn on_conflict(message: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |e| map_constraint_error(e, message)
}
