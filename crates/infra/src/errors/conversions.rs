//! Conversions from external infrastructure errors into domain errors.

use classline_domain::ClasslineError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can
/// be converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub ClasslineError);

impl From<InfraError> for ClasslineError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ClasslineError> for InfraError {
    fn from(value: ClasslineError) -> Self {
        InfraError(value)
    }
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → ClasslineError */
/* -------------------------------------------------------------------------- */

impl From<SqlError> for InfraError {
    fn from(err: SqlError) -> Self {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        let domain = match err {
            RE::SqliteFailure(code, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (code.code, code.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        ClasslineError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        ClasslineError::Database("database is locked".into())
                    }
                    // Unique and primary-key violations surface as conflicts
                    // so the synchronizer can resolve meeting record races.
                    (ErrorCode::ConstraintViolation, 2067) | (ErrorCode::ConstraintViolation, 1555) => {
                        ClasslineError::Conflict("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        ClasslineError::Database("foreign key constraint violation".into())
                    }
                    _ => ClasslineError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        code.code, code.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => {
                ClasslineError::NotFound("no rows returned by query".into())
            }
            RE::FromSqlConversionFailure(_, _, cause) => {
                ClasslineError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                ClasslineError::Database(format!("invalid column type: {ty}"))
            }
            other => ClasslineError::Database(other.to_string()),
        };

        InfraError(domain)
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → ClasslineError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(err: r2d2::Error) -> Self {
        InfraError(ClasslineError::Database(format!("connection pool error: {err}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ClasslineError */
/* -------------------------------------------------------------------------- */

impl From<HttpError> for InfraError {
    fn from(err: HttpError) -> Self {
        let domain = if err.is_timeout() || err.is_connect() || err.is_request() {
            ClasslineError::Provider(format!("http transport error: {err}"))
        } else if err.is_decode() {
            ClasslineError::Provider(format!("failed to decode provider response: {err}"))
        } else {
            ClasslineError::Provider(err.to_string())
        };

        InfraError(domain)
    }
}
