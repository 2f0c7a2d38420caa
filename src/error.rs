//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Inconsistencies in the static entity catalog.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("unknown column: table {table} column {column}")]
    UnknownColumn { table: &'static str, column: String },
    #[error("duplicate path segment: {0}")]
    DuplicatePathSegment(String),
    #[error("catalog: {0}")]
    Invalid(String),
}

/// Invalid process settings read from the environment.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {var}: '{value}'")]
    Invalid { var: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("database: {0}")]
    Db(sqlx::Error),
    #[error("export: {0}")]
    Export(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn not_found(label: &str, id: i64) -> Self {
        AppError::NotFound(format!("{} {}", label, id))
    }
}

/// SQLite result code shared by every constraint failure; extended codes keep it in the low byte.
const SQLITE_CONSTRAINT: i32 = 19;
/// `SQLITE_CONSTRAINT_FOREIGNKEY` and `SQLITE_CONSTRAINT_TRIGGER` (raised for `ON DELETE RESTRICT`).
const FOREIGN_KEY_CODES: [i32; 2] = [787, 1811];

fn sqlite_code(code: Option<&str>) -> Option<i32> {
    code.and_then(|c| c.parse().ok())
}

fn is_constraint_code(code: i32) -> bool {
    code & 0xff == SQLITE_CONSTRAINT
}

/// Storage errors raised by a declared constraint become `ConstraintViolation`; the rest stay opaque.
impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            let code = sqlite_code(db.code().as_deref());
            if db.is_unique_violation() {
                return AppError::ConstraintViolation(format!("unique constraint: {}", db.message()));
            }
            if db.is_foreign_key_violation() || code.is_some_and(|c| FOREIGN_KEY_CODES.contains(&c)) {
                return AppError::ConstraintViolation(format!("foreign key constraint: {}", db.message()));
            }
            if code.is_some_and(is_constraint_code)
                || matches!(
                    db.kind(),
                    sqlx::error::ErrorKind::NotNullViolation | sqlx::error::ErrorKind::CheckViolation
                )
            {
                return AppError::ConstraintViolation(db.message().to_string());
            }
        }
        AppError::Db(e)
    }
}

impl From<zip::result::ZipError> for AppError {
    fn from(e: zip::result::ZipError) -> Self {
        AppError::Export(e.to_string())
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Schema(_) => (StatusCode::INTERNAL_SERVER_ERROR, "schema_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::ConstraintViolation(_) => (StatusCode::CONFLICT, "constraint_violation"),
            AppError::Db(e) => {
                if let sqlx::Error::RowNotFound = e {
                    (StatusCode::NOT_FOUND, "not_found")
                } else {
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
                }
            }
            AppError::Export(_) => (StatusCode::INTERNAL_SERVER_ERROR, "export_error"),
            AppError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}
