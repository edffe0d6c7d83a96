use sqlx::PgPool;

pub type Db = PgPool;

/// True when `err` is a unique violation raised by the named constraint or
/// unique index.
pub fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    err.as_database_error()
        .map(|db_err| db_err.is_unique_violation() && db_err.constraint() == Some(constraint))
        .unwrap_or(false)
}
