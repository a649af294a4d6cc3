use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::Session;
use crate::error::AppError;
use crate::ledger::{
    ApprovalDecision, ApprovalRole, ApprovalSheet, DeductionRequest, LedgerSnapshot, SignOff,
};
use crate::reports::{
    export_file_name, DashboardSummary, EmployeeStatement, FinanceStatement, MonthlyReport,
};
use crate::scoring::{
    AppSettings, CodeId, DeductionCode, DeductionRecord, Employee, EmployeeId, IncentiveTier,
    MonthKey, RecordId, TierId,
};
use crate::sync::{BrandingTarget, ConductService, ImageUpload, SaveReport, SyncStatus};

type SharedService = State<Arc<ConductService>>;

/// Router exposing the ledger, sync, reports, portal, and approval endpoints.
pub fn ledger_router(service: Arc<ConductService>) -> Router {
    Router::new()
        .route("/api/v1/ledger", get(ledger_handler))
        .route("/api/v1/sync/refresh", post(refresh_handler))
        .route("/api/v1/sync/save", post(save_handler))
        .route("/api/v1/branding", post(branding_handler))
        .route("/api/v1/deductions", post(record_deduction_handler))
        .route("/api/v1/deductions/:record_id", delete(remove_record_handler))
        .route("/api/v1/employees", put(upsert_employee_handler))
        .route("/api/v1/employees/:employee_id", delete(remove_employee_handler))
        .route(
            "/api/v1/employees/:employee_id/eligibility",
            put(eligibility_handler),
        )
        .route("/api/v1/employees/:employee_id/score", get(monthly_score_handler))
        .route("/api/v1/codes", put(upsert_code_handler))
        .route("/api/v1/codes/:code_id", delete(remove_code_handler))
        .route("/api/v1/tiers", put(upsert_tier_handler))
        .route("/api/v1/tiers/:tier_id", delete(remove_tier_handler))
        .route("/api/v1/reports/dashboard", get(dashboard_handler))
        .route("/api/v1/reports/finance", get(finance_handler))
        .route("/api/v1/reports/export", get(export_handler))
        .route("/api/v1/reports/monthly", get(monthly_report_handler))
        .route("/api/v1/portal/:employee_id", get(portal_handler))
        .route("/api/v1/portal/:employee_id/sign-off", post(sign_off_handler))
        .route(
            "/api/v1/approvals/:month",
            get(approval_sheet_handler).put(sign_approval_handler),
        )
        .route("/api/v1/auth/login", post(login_handler))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct MonthQuery {
    #[serde(default)]
    pub(crate) month: Option<String>,
}

impl MonthQuery {
    /// Requested month, or the current local month when none was given.
    fn resolve(&self) -> Result<MonthKey, AppError> {
        match self.month.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Ok(MonthKey::parse(raw)?),
            _ => Ok(MonthKey::current_local()),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LedgerView {
    pub(crate) status: SyncStatus,
    pub(crate) ledger: LedgerSnapshot,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EligibilityUpdate {
    pub(crate) no_position_allowance: bool,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SignOffRequest {
    #[serde(default)]
    pub(crate) month: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApprovalRequest {
    pub(crate) role: ApprovalRole,
    #[serde(default)]
    pub(crate) date: Option<NaiveDate>,
    #[serde(default)]
    pub(crate) decision: Option<ApprovalDecision>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    pub(crate) username: String,
    pub(crate) password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BrandingRequest {
    pub(crate) target: BrandingTarget,
    pub(crate) file_name: String,
    pub(crate) mime_type: String,
    pub(crate) base64: String,
}

pub(crate) async fn ledger_handler(State(service): SharedService) -> Json<LedgerView> {
    Json(LedgerView {
        status: service.status(),
        ledger: service.ledger().into_snapshot(),
    })
}

pub(crate) async fn refresh_handler(
    State(service): SharedService,
) -> Result<Json<SyncStatus>, AppError> {
    let status = service.refresh(&MonthKey::current_local()).await?;
    Ok(Json(status))
}

pub(crate) async fn save_handler(
    State(service): SharedService,
) -> Result<Json<SaveReport>, AppError> {
    let report = service.save(Local::now().date_naive()).await?;
    Ok(Json(report))
}

pub(crate) async fn branding_handler(
    State(service): SharedService,
    Json(request): Json<BrandingRequest>,
) -> Result<Json<AppSettings>, AppError> {
    let upload = ImageUpload::new(request.base64, request.mime_type, request.file_name);
    let settings = service.upload_branding(request.target, upload).await?;
    Ok(Json(settings))
}

pub(crate) async fn record_deduction_handler(
    State(service): SharedService,
    Json(request): Json<DeductionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = service.record_deduction(request)?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub(crate) async fn remove_record_handler(
    State(service): SharedService,
    Path(record_id): Path<String>,
) -> Result<Json<DeductionRecord>, AppError> {
    let removed = service.remove_record(&RecordId::new(record_id))?;
    Ok(Json(removed))
}

pub(crate) async fn upsert_employee_handler(
    State(service): SharedService,
    Json(employee): Json<Employee>,
) -> Result<Json<Employee>, AppError> {
    Ok(Json(service.upsert_employee(employee)?))
}

pub(crate) async fn remove_employee_handler(
    State(service): SharedService,
    Path(employee_id): Path<String>,
) -> Result<StatusCode, AppError> {
    service.remove_employee(&EmployeeId::new(employee_id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn eligibility_handler(
    State(service): SharedService,
    Path(employee_id): Path<String>,
    Json(update): Json<EligibilityUpdate>,
) -> Result<Json<Employee>, AppError> {
    let employee = service.set_position_allowance_opt_out(
        &EmployeeId::new(employee_id),
        update.no_position_allowance,
    )?;
    Ok(Json(employee))
}

pub(crate) async fn monthly_score_handler(
    State(service): SharedService,
    Path(employee_id): Path<String>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Value>, AppError> {
    let month = query.resolve()?;
    let id = EmployeeId::new(employee_id);
    let score = service.monthly_score(&id, &month)?;
    Ok(Json(json!({
        "employee_id": id,
        "month": month,
        "score": score,
    })))
}

pub(crate) async fn upsert_code_handler(
    State(service): SharedService,
    Json(code): Json<DeductionCode>,
) -> Result<Json<DeductionCode>, AppError> {
    Ok(Json(service.upsert_code(code)?))
}

pub(crate) async fn remove_code_handler(
    State(service): SharedService,
    Path(code_id): Path<String>,
) -> Result<StatusCode, AppError> {
    service.remove_code(&CodeId::new(code_id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn upsert_tier_handler(
    State(service): SharedService,
    Json(tier): Json<IncentiveTier>,
) -> Result<Json<IncentiveTier>, AppError> {
    Ok(Json(service.upsert_tier(tier)?))
}

pub(crate) async fn remove_tier_handler(
    State(service): SharedService,
    Path(tier_id): Path<String>,
) -> Result<StatusCode, AppError> {
    service.remove_tier(&TierId::new(tier_id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn dashboard_handler(
    State(service): SharedService,
    Query(query): Query<MonthQuery>,
) -> Result<Json<DashboardSummary>, AppError> {
    Ok(Json(service.dashboard(&query.resolve()?)))
}

pub(crate) async fn finance_handler(
    State(service): SharedService,
    Query(query): Query<MonthQuery>,
) -> Result<Json<FinanceStatement>, AppError> {
    Ok(Json(service.finance_statement(&query.resolve()?)))
}

pub(crate) async fn export_handler(
    State(service): SharedService,
    Query(query): Query<MonthQuery>,
) -> Result<impl IntoResponse, AppError> {
    let month = query.resolve()?;
    let body = service.export_csv(&month)?;
    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", export_file_name(&month)),
        ),
    ];
    Ok((StatusCode::OK, headers, body))
}

pub(crate) async fn monthly_report_handler(
    State(service): SharedService,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthlyReport>, AppError> {
    Ok(Json(service.monthly_report(&query.resolve()?)))
}

pub(crate) async fn portal_handler(
    State(service): SharedService,
    Path(employee_id): Path<String>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<EmployeeStatement>, AppError> {
    let month = query.resolve()?;
    let statement = service.employee_statement(&EmployeeId::new(employee_id), &month)?;
    Ok(Json(statement))
}

pub(crate) async fn sign_off_handler(
    State(service): SharedService,
    Path(employee_id): Path<String>,
    Json(request): Json<SignOffRequest>,
) -> Result<impl IntoResponse, AppError> {
    let month = MonthQuery {
        month: request.month,
    }
    .resolve()?;
    let sign_off: SignOff = service.sign_off(&EmployeeId::new(employee_id), &month)?;
    Ok((StatusCode::CREATED, Json(sign_off)))
}

pub(crate) async fn approval_sheet_handler(
    State(service): SharedService,
    Path(month): Path<String>,
) -> Result<Json<ApprovalSheet>, AppError> {
    let month = MonthKey::parse(&month)?;
    Ok(Json(service.approval_sheet(&month)))
}

pub(crate) async fn sign_approval_handler(
    State(service): SharedService,
    Path(month): Path<String>,
    Json(request): Json<ApprovalRequest>,
) -> Result<Json<ApprovalSheet>, AppError> {
    let month = MonthKey::parse(&month)?;
    let sheet = service.sign_approval(&month, request.role, request.date, request.decision)?;
    Ok(Json(sheet))
}

pub(crate) async fn login_handler(
    State(service): SharedService,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Session>, AppError> {
    let session = service.authenticate(&request.username, &request.password)?;
    Ok(Json(session))
}
