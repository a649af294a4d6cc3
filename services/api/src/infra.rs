use conduct_score::error::AppError;
use conduct_score::ledger::{Ledger, LedgerSnapshot};
use conduct_score::scoring::MonthKey;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn parse_month(raw: &str) -> Result<MonthKey, String> {
    MonthKey::parse(raw).map_err(|err| err.to_string())
}

/// Reads a ledger snapshot file (the JSON shape served by `GET /api/v1/ledger`'s
/// `ledger` field).
pub(crate) fn load_snapshot(path: &Path) -> Result<Ledger, AppError> {
    let raw = std::fs::read_to_string(path)?;
    let snapshot: LedgerSnapshot = serde_json::from_str(&raw)?;
    Ok(Ledger::from_snapshot(snapshot))
}
