use thiserror::Error;

/// Error taxonomy shared by every store operation. HTTP handlers map these
/// onto status codes; fan-out logs and swallows them.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation: {0}")]
    Validation(String),

    #[error("internal: {0}")]
    Internal(String),

    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// True when the underlying SQLite error is a UNIQUE / foreign-key
/// constraint violation, which the taxonomy reports as `Conflict`.
pub fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_violations_are_detected() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (x TEXT PRIMARY KEY)")
            .unwrap();
        conn.execute("INSERT INTO t (x) VALUES ('a')", []).unwrap();

        let err = conn
            .execute("INSERT INTO t (x) VALUES ('a')", [])
            .unwrap_err();
        assert!(is_constraint_violation(&err));

        let err = conn.execute("INSERT INTO nope (x) VALUES ('a')", []).unwrap_err();
        assert!(!is_constraint_violation(&err));
    }
}
