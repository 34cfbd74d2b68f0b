//! Conversions from external infrastructure errors into domain errors.

use daybook_domain::DaybookError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub DaybookError);

impl From<InfraError> for DaybookError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<DaybookError> for InfraError {
    fn from(value: DaybookError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoDaybookError {
    fn into_daybook(self) -> DaybookError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → DaybookError */
/* -------------------------------------------------------------------------- */

impl IntoDaybookError for SqlError {
    fn into_daybook(self) -> DaybookError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        DaybookError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        DaybookError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 1555 | 2067) => {
                        DaybookError::Database("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        DaybookError::Database("foreign key constraint violation".into())
                    }
                    _ => DaybookError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => DaybookError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                DaybookError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                DaybookError::Database(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => {
                DaybookError::Database("invalid UTF-8 returned from sqlite".into())
            }
            RE::InvalidParameterName(parameter_name) => {
                DaybookError::Database(format!("invalid parameter name: {parameter_name}"))
            }
            RE::InvalidPath(path) => DaybookError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            RE::InvalidQuery => DaybookError::Database("invalid SQL query".into()),
            other => DaybookError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_daybook())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → DaybookError */
/* -------------------------------------------------------------------------- */

impl IntoDaybookError for r2d2::Error {
    fn into_daybook(self) -> DaybookError {
        DaybookError::Database(format!("connection pool error: {self}"))
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(value.into_daybook())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → DaybookError */
/* -------------------------------------------------------------------------- */

impl IntoDaybookError for HttpError {
    fn into_daybook(self) -> DaybookError {
        if self.is_timeout() {
            return DaybookError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return DaybookError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                404 => DaybookError::NotFound(message),
                400..=499 => DaybookError::InvalidInput(message),
                _ => DaybookError::Network(message),
            };
        }

        DaybookError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_daybook())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
