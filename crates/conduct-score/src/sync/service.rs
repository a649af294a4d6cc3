use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::gateway::SheetGateway;
use super::wire::{ImageUpload, SaveAllPayload};
use super::SyncError;
use crate::auth::{self, AdminCredential, AuthError, Session};
use crate::ledger::{
    ApprovalDecision, ApprovalRole, ApprovalSheet, Collection, DeductionRequest, Ledger,
    LedgerError, SignOff, SignOffBook,
};
use crate::reports::{
    self, DashboardSummary, EmployeeStatement, ExportError, FinanceStatement, MonthlyReport,
};
use crate::scoring::{
    recalculate_monthly_score, AppSettings, CodeId, DeductionCode, DeductionOutcome,
    DeductionRecord, Employee, EmployeeId, IncentiveTier, MonthKey, RecordId, TierId,
};

/// Connection state shown next to the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    /// Set after a failed fetch; the cached ledger keeps serving until a sync succeeds.
    pub offline: bool,
    pub ledger_version: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// Result of pushing the ledger to the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    pub ledger_version: u64,
    /// Collections that went out as a placeholder row only.
    pub empty_collections: Vec<Collection>,
}

/// Where an uploaded image ends up in the settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", content = "role", rename_all = "snake_case")]
pub enum BrandingTarget {
    Logo,
    Signature(ApprovalRole),
}

impl BrandingTarget {
    fn apply(self, settings: &AppSettings, url: String) -> AppSettings {
        let mut settings = settings.clone();
        match self {
            BrandingTarget::Logo => settings.logo_url = Some(url),
            BrandingTarget::Signature(role) => {
                *role.master_signature_mut(&mut settings.master_signatures) = Some(url)
            }
        }
        settings
    }
}

#[derive(Debug, Default)]
struct ServiceState {
    ledger: Ledger,
    status: SyncStatus,
    sign_offs: SignOffBook,
    approvals: BTreeMap<MonthKey, ApprovalSheet>,
}

/// Holds the single writable ledger and mediates every read, write, and sync.
///
/// The lock is never held across an await: sync calls clone what they send, release
/// the lock, and swap the result in afterwards.
#[derive(Debug)]
pub struct ConductService {
    gateway: Arc<dyn SheetGateway>,
    admins: Vec<AdminCredential>,
    state: Mutex<ServiceState>,
}

impl ConductService {
    pub fn new(gateway: Arc<dyn SheetGateway>, admins: Vec<AdminCredential>) -> Self {
        Self::with_ledger(gateway, admins, Ledger::default())
    }

    /// Starts from an already loaded ledger, e.g. a snapshot file.
    pub fn with_ledger(
        gateway: Arc<dyn SheetGateway>,
        admins: Vec<AdminCredential>,
        ledger: Ledger,
    ) -> Self {
        let status = SyncStatus {
            ledger_version: ledger.version(),
            ..SyncStatus::default()
        };
        Self {
            gateway,
            admins,
            state: Mutex::new(ServiceState {
                ledger,
                status,
                ..ServiceState::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ServiceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn ledger(&self) -> Ledger {
        self.lock().ledger.clone()
    }

    pub fn status(&self) -> SyncStatus {
        self.lock().status.clone()
    }

    /// Pulls every collection from the sheet and re-derives scores for `month`.
    ///
    /// A failed fetch leaves the cached ledger untouched and switches to offline mode.
    pub async fn refresh(&self, month: &MonthKey) -> Result<SyncStatus, SyncError> {
        let fetched = self.gateway.fetch_snapshot().await;

        let mut state = self.lock();
        match fetched {
            Ok(remote) => {
                let merged = remote.merge_into(state.ledger.snapshot());
                state.ledger = state.ledger.replaced_with(merged).rescored_for(month);
                state.status = SyncStatus {
                    offline: false,
                    ledger_version: state.ledger.version(),
                    last_synced_at: Some(Utc::now()),
                };
                info!(
                    version = state.ledger.version(),
                    employees = state.ledger.employees().len(),
                    records = state.ledger.records().len(),
                    month = %month,
                    "ledger refreshed from sheet"
                );
                Ok(state.status.clone())
            }
            Err(err) => {
                state.status.offline = true;
                warn!(error = %err, version = state.ledger.version(), "sheet fetch failed; serving cached ledger");
                Err(SyncError::Fetch(err))
            }
        }
    }

    /// Pushes the full ledger. Empty collections are reported, never refused.
    pub async fn save(&self, today: NaiveDate) -> Result<SaveReport, SyncError> {
        let (payload, version, empty_collections) = {
            let state = self.lock();
            (
                SaveAllPayload::from_snapshot(state.ledger.snapshot(), today),
                state.ledger.version(),
                state.ledger.empty_collections(),
            )
        };

        for collection in &empty_collections {
            warn!(collection = collection.label(), "saving empty collection as placeholder row");
        }

        if let Err(err) = self.gateway.save_all(&payload).await {
            self.lock().status.offline = true;
            warn!(error = %err, version, "sheet save failed");
            return Err(SyncError::Save(err));
        }

        let mut state = self.lock();
        state.status.offline = false;
        state.status.last_synced_at = Some(Utc::now());
        info!(version, "ledger saved to sheet");

        Ok(SaveReport {
            ledger_version: version,
            empty_collections,
        })
    }

    /// Uploads an image and stores its URL as the logo or a master signature.
    pub async fn upload_branding(
        &self,
        target: BrandingTarget,
        upload: ImageUpload,
    ) -> Result<AppSettings, SyncError> {
        let url = self
            .gateway
            .upload_image(&upload)
            .await
            .map_err(SyncError::Upload)?;

        let mut state = self.lock();
        let settings = target.apply(state.ledger.settings(), url);
        state.ledger = state.ledger.with_settings(settings.clone());
        state.status.ledger_version = state.ledger.version();
        info!(?target, file = %upload.file_name, "branding image stored");
        Ok(settings)
    }

    /// Applies `change` to the current ledger and swaps in the version it returns.
    fn update<T>(
        &self,
        change: impl FnOnce(&Ledger) -> Result<(Ledger, T), LedgerError>,
    ) -> Result<T, LedgerError> {
        let mut state = self.lock();
        let (next, value) = change(&state.ledger)?;
        state.ledger = next;
        state.status.ledger_version = state.ledger.version();
        Ok(value)
    }

    pub fn record_deduction(&self, request: DeductionRequest) -> Result<DeductionOutcome, LedgerError> {
        let outcome = self.update(|ledger| ledger.apply_deduction(request, RecordId::generate()))?;
        info!(
            employee_id = %outcome.employee.id,
            code = %outcome.record.deduction_code_code,
            points = outcome.record.points,
            score = outcome.employee.score,
            carried_over = outcome.carried_over(),
            "deduction recorded"
        );
        Ok(outcome)
    }

    pub fn remove_record(&self, id: &RecordId) -> Result<DeductionRecord, LedgerError> {
        let removed = self.update(|ledger| ledger.remove_record(id))?;
        info!(record_id = %removed.id, employee_id = %removed.employee_id, "deduction record removed");
        Ok(removed)
    }

    pub fn upsert_employee(&self, employee: Employee) -> Result<Employee, LedgerError> {
        let stored = employee.clone();
        self.update(|ledger| Ok((ledger.upsert_employee(employee)?, ())))?;
        info!(employee_id = %stored.id, "employee saved");
        Ok(stored)
    }

    pub fn remove_employee(&self, id: &EmployeeId) -> Result<(), LedgerError> {
        self.update(|ledger| Ok((ledger.remove_employee(id)?, ())))?;
        info!(employee_id = %id, "employee removed");
        Ok(())
    }

    pub fn set_position_allowance_opt_out(
        &self,
        id: &EmployeeId,
        opted_out: bool,
    ) -> Result<Employee, LedgerError> {
        let employee = self.update(|ledger| {
            let next = ledger.set_position_allowance_opt_out(id, opted_out)?;
            let employee = next
                .employee(id)
                .cloned()
                .ok_or_else(|| LedgerError::EmployeeNotFound(id.clone()))?;
            Ok((next, employee))
        })?;
        info!(employee_id = %id, opted_out, "incentive eligibility changed");
        Ok(employee)
    }

    pub fn upsert_code(&self, code: DeductionCode) -> Result<DeductionCode, LedgerError> {
        let stored = code.clone();
        self.update(|ledger| Ok((ledger.upsert_code(code)?, ())))?;
        info!(code_id = %stored.id, points = stored.points, "deduction code saved");
        Ok(stored)
    }

    pub fn remove_code(&self, id: &CodeId) -> Result<(), LedgerError> {
        self.update(|ledger| Ok((ledger.remove_code(id)?, ())))?;
        info!(code_id = %id, "deduction code removed");
        Ok(())
    }

    pub fn upsert_tier(&self, tier: IncentiveTier) -> Result<IncentiveTier, LedgerError> {
        let stored = tier.clone();
        self.update(|ledger| Ok((ledger.upsert_tier(tier)?, ())))?;
        info!(tier_id = %stored.id, min = stored.min_score, max = stored.max_score, "incentive tier saved");
        Ok(stored)
    }

    pub fn remove_tier(&self, id: &TierId) -> Result<(), LedgerError> {
        self.update(|ledger| Ok((ledger.remove_tier(id)?, ())))?;
        info!(tier_id = %id, "incentive tier removed");
        Ok(())
    }

    /// Score `id` would hold for `month`, derived from the record log alone.
    pub fn monthly_score(&self, id: &EmployeeId, month: &MonthKey) -> Result<u8, LedgerError> {
        let state = self.lock();
        if state.ledger.employee(id).is_none() {
            return Err(LedgerError::EmployeeNotFound(id.clone()));
        }
        Ok(recalculate_monthly_score(id, state.ledger.records(), month))
    }

    pub fn dashboard(&self, month: &MonthKey) -> DashboardSummary {
        reports::dashboard(&self.lock().ledger, month)
    }

    pub fn finance_statement(&self, month: &MonthKey) -> FinanceStatement {
        reports::finance_statement(&self.lock().ledger, month)
    }

    pub fn export_csv(&self, month: &MonthKey) -> Result<Vec<u8>, ExportError> {
        reports::monthly_deductions_csv(&self.lock().ledger, month)
    }

    pub fn employee_statement(
        &self,
        id: &EmployeeId,
        month: &MonthKey,
    ) -> Result<EmployeeStatement, LedgerError> {
        let state = self.lock();
        let signed = state.sign_offs.find(id, month).cloned();
        reports::employee_statement(&state.ledger, id, month, signed)
    }

    /// Records the employee's acknowledgement of their monthly report, signed with the
    /// signature image stored on their profile.
    pub fn sign_off(&self, id: &EmployeeId, month: &MonthKey) -> Result<SignOff, LedgerError> {
        let mut state = self.lock();
        let employee = state
            .ledger
            .employee(id)
            .ok_or_else(|| LedgerError::EmployeeNotFound(id.clone()))?;
        let signature_image = employee
            .signature_url
            .clone()
            .ok_or_else(|| LedgerError::MissingEmployeeSignature(id.clone()))?;
        let sign_off = SignOff {
            employee_id: id.clone(),
            month: month.clone(),
            signature_image,
            signed_at: Utc::now(),
        };
        state.sign_offs.sign(sign_off.clone());
        info!(employee_id = %id, month = %month, "monthly report signed off");
        Ok(sign_off)
    }

    pub fn approval_sheet(&self, month: &MonthKey) -> ApprovalSheet {
        self.lock()
            .approvals
            .get(month)
            .cloned()
            .unwrap_or_else(|| ApprovalSheet::new(month.clone()))
    }

    /// Signs the month's approval form for `role` with that role's master signature.
    /// The date defaults to the first day of `month`.
    pub fn sign_approval(
        &self,
        month: &MonthKey,
        role: ApprovalRole,
        date: Option<NaiveDate>,
        decision: Option<ApprovalDecision>,
    ) -> Result<ApprovalSheet, LedgerError> {
        let mut state = self.lock();
        let signature = role
            .master_signature(&state.ledger.settings().master_signatures)
            .map(str::to_string)
            .ok_or(LedgerError::MissingMasterSignature(role))?;
        let sheet = state
            .approvals
            .entry(month.clone())
            .or_insert_with(|| ApprovalSheet::new(month.clone()));
        sheet.sign(role, signature, date.or_else(|| month.first_day()), decision);
        info!(month = %month, role = role.label(), complete = sheet.is_complete(), "approval signed");
        Ok(sheet.clone())
    }

    /// Approval roster for `month` with each employee's sign-off state.
    pub fn monthly_report(&self, month: &MonthKey) -> MonthlyReport {
        let state = self.lock();
        let approvals = state
            .approvals
            .get(month)
            .cloned()
            .unwrap_or_else(|| ApprovalSheet::new(month.clone()));
        reports::monthly_report(&state.ledger, month, &state.sign_offs, approvals)
    }

    pub fn authenticate(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        let state = self.lock();
        let result = auth::authenticate(&self.admins, state.ledger.employees(), username, password);
        if result.is_err() {
            warn!(username = username.trim(), "login rejected");
        }
        result
    }
}
