use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::ledger::LedgerError;
use crate::reports::ExportError;
use crate::scoring::MonthKeyError;
use crate::sync::{SheetError, SyncError};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Snapshot(serde_json::Error),
    Month(MonthKeyError),
    Ledger(LedgerError),
    Sync(SyncError),
    Gateway(SheetError),
    Export(ExportError),
    Auth(AuthError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Ledger(
                LedgerError::EmployeeNotFound(_)
                | LedgerError::CodeNotFound(_)
                | LedgerError::TierNotFound(_)
                | LedgerError::RecordNotFound(_),
            ) => StatusCode::NOT_FOUND,
            AppError::Ledger(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Month(_) | AppError::Snapshot(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Sync(_) | AppError::Gateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Export(ExportError::EmptyMonth(_)) => StatusCode::NOT_FOUND,
            AppError::Export(_)
            | AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Snapshot(err) => write!(f, "invalid snapshot: {}", err),
            AppError::Month(err) => write!(f, "{}", err),
            AppError::Ledger(err) => write!(f, "{}", err),
            AppError::Sync(err) => write!(f, "{}", err),
            AppError::Gateway(err) => write!(f, "sheet gateway error: {}", err),
            AppError::Export(err) => write!(f, "{}", err),
            AppError::Auth(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Snapshot(err) => Some(err),
            AppError::Month(err) => Some(err),
            AppError::Ledger(err) => Some(err),
            AppError::Sync(err) => Some(err),
            AppError::Gateway(err) => Some(err),
            AppError::Export(err) => Some(err),
            AppError::Auth(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Snapshot(value)
    }
}

impl From<MonthKeyError> for AppError {
    fn from(value: MonthKeyError) -> Self {
        Self::Month(value)
    }
}

impl From<LedgerError> for AppError {
    fn from(value: LedgerError) -> Self {
        Self::Ledger(value)
    }
}

impl From<SyncError> for AppError {
    fn from(value: SyncError) -> Self {
        Self::Sync(value)
    }
}

impl From<SheetError> for AppError {
    fn from(value: SheetError) -> Self {
        Self::Gateway(value)
    }
}

impl From<ExportError> for AppError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

impl From<AuthError> for AppError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}
