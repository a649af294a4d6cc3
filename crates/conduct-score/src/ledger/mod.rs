//! Versioned in-memory copy of the roster, catalog, record log, and tiers.
//!
//! A [`Ledger`] is never edited in place: every write returns the next version and
//! the caller swaps it in as the single authoritative copy.

mod signoff;

pub use signoff::{ApprovalDecision, ApprovalEntry, ApprovalRole, ApprovalSheet, SignOff, SignOffBook};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::scoring::{
    apply_deduction, rescore_employees, AppSettings, CodeId, DeductionCode, DeductionOutcome,
    DeductionRecord, Employee, EmployeeId, IncentiveTier, MonthKey, RecordDate, RecordId, TierId,
    FULL_SCORE,
};

/// Plain collections as exchanged with the sheet and snapshot files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LedgerSnapshot {
    pub employees: Vec<Employee>,
    pub deduction_codes: Vec<DeductionCode>,
    pub records: Vec<DeductionRecord>,
    pub incentive_tiers: Vec<IncentiveTier>,
    pub settings: AppSettings,
}

/// Collections that can be empty when pushing to the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Employees,
    DeductionCodes,
    IncentiveTiers,
    Records,
}

impl Collection {
    pub const fn label(self) -> &'static str {
        match self {
            Collection::Employees => "employees",
            Collection::DeductionCodes => "deduction codes",
            Collection::IncentiveTiers => "incentive tiers",
            Collection::Records => "deduction records",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("employee {0} not found")]
    EmployeeNotFound(EmployeeId),
    #[error("deduction code {0} not found")]
    CodeNotFound(CodeId),
    #[error("incentive tier {0} not found")]
    TierNotFound(TierId),
    #[error("deduction record {0} not found")]
    RecordNotFound(RecordId),
    #[error("incentive tier range {min_score}-{max_score} is invalid")]
    InvalidTierRange { min_score: u8, max_score: u8 },
    #[error("employee score {0} exceeds 100")]
    ScoreOutOfRange(u8),
    #[error("{0} id must not be empty")]
    MissingId(&'static str),
    #[error("employee {0} has no signature on file")]
    MissingEmployeeSignature(EmployeeId),
    #[error("no master signature uploaded for {}", .0.label())]
    MissingMasterSignature(ApprovalRole),
}

/// Admin request to record one incident.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeductionRequest {
    pub employee_id: EmployeeId,
    pub deduction_code_id: CodeId,
    pub date: NaiveDate,
    #[serde(default)]
    pub remark: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    version: u64,
    data: LedgerSnapshot,
}

impl Ledger {
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        Self {
            version: 0,
            data: snapshot,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn snapshot(&self) -> &LedgerSnapshot {
        &self.data
    }

    pub fn into_snapshot(self) -> LedgerSnapshot {
        self.data
    }

    pub fn employees(&self) -> &[Employee] {
        &self.data.employees
    }

    pub fn deduction_codes(&self) -> &[DeductionCode] {
        &self.data.deduction_codes
    }

    /// Record log, most recent first.
    pub fn records(&self) -> &[DeductionRecord] {
        &self.data.records
    }

    pub fn incentive_tiers(&self) -> &[IncentiveTier] {
        &self.data.incentive_tiers
    }

    pub fn settings(&self) -> &AppSettings {
        &self.data.settings
    }

    pub fn employee(&self, id: &EmployeeId) -> Option<&Employee> {
        self.data.employees.iter().find(|employee| &employee.id == id)
    }

    pub fn deduction_code(&self, id: &CodeId) -> Option<&DeductionCode> {
        self.data.deduction_codes.iter().find(|code| &code.id == id)
    }

    pub fn empty_collections(&self) -> Vec<Collection> {
        let mut empty = Vec::new();
        if self.data.employees.is_empty() {
            empty.push(Collection::Employees);
        }
        if self.data.deduction_codes.is_empty() {
            empty.push(Collection::DeductionCodes);
        }
        if self.data.incentive_tiers.is_empty() {
            empty.push(Collection::IncentiveTiers);
        }
        if self.data.records.is_empty() {
            empty.push(Collection::Records);
        }
        empty
    }

    fn next(&self, data: LedgerSnapshot) -> Self {
        Self {
            version: self.version + 1,
            data,
        }
    }

    /// Replaces every collection, e.g. after a fetch from the sheet.
    pub fn replaced_with(&self, data: LedgerSnapshot) -> Self {
        self.next(data)
    }

    /// Scores re-derived from the record log for `month`.
    pub fn rescored_for(&self, month: &MonthKey) -> Self {
        let mut data = self.data.clone();
        data.employees = rescore_employees(&data.employees, &data.records, month);
        self.next(data)
    }

    /// Records an incident against an employee. Fails without producing a new version
    /// when the employee or the code is unknown.
    pub fn apply_deduction(
        &self,
        request: DeductionRequest,
        record_id: RecordId,
    ) -> Result<(Self, DeductionOutcome), LedgerError> {
        let employee = self
            .employee(&request.employee_id)
            .ok_or_else(|| LedgerError::EmployeeNotFound(request.employee_id.clone()))?;
        let code = self
            .deduction_code(&request.deduction_code_id)
            .ok_or_else(|| LedgerError::CodeNotFound(request.deduction_code_id.clone()))?;

        let outcome = apply_deduction(
            employee,
            code,
            RecordDate::from(request.date),
            request.remark,
            record_id,
        );

        let mut data = self.data.clone();
        data.records.insert(0, outcome.record.clone());
        for existing in data.employees.iter_mut() {
            if existing.id == outcome.employee.id {
                *existing = outcome.employee.clone();
            }
        }

        Ok((self.next(data), outcome))
    }

    /// Removes a record. Scores are left alone until the next monthly recalculation.
    pub fn remove_record(&self, id: &RecordId) -> Result<(Self, DeductionRecord), LedgerError> {
        let position = self
            .data
            .records
            .iter()
            .position(|record| &record.id == id)
            .ok_or_else(|| LedgerError::RecordNotFound(id.clone()))?;
        let mut data = self.data.clone();
        let removed = data.records.remove(position);
        Ok((self.next(data), removed))
    }

    pub fn upsert_employee(&self, employee: Employee) -> Result<Self, LedgerError> {
        if employee.id.is_empty() {
            return Err(LedgerError::MissingId("employee"));
        }
        if employee.score > FULL_SCORE {
            return Err(LedgerError::ScoreOutOfRange(employee.score));
        }
        let mut data = self.data.clone();
        upsert(&mut data.employees, employee, |existing, new| existing.id == new.id);
        Ok(self.next(data))
    }

    pub fn remove_employee(&self, id: &EmployeeId) -> Result<Self, LedgerError> {
        let mut data = self.data.clone();
        if !remove(&mut data.employees, |employee| &employee.id == id) {
            return Err(LedgerError::EmployeeNotFound(id.clone()));
        }
        Ok(self.next(data))
    }

    /// Toggles the flag that opts an employee out of incentive payment.
    pub fn set_position_allowance_opt_out(
        &self,
        id: &EmployeeId,
        opted_out: bool,
    ) -> Result<Self, LedgerError> {
        let mut data = self.data.clone();
        let employee = data
            .employees
            .iter_mut()
            .find(|employee| &employee.id == id)
            .ok_or_else(|| LedgerError::EmployeeNotFound(id.clone()))?;
        employee.no_position_allowance = opted_out;
        Ok(self.next(data))
    }

    /// Adds or edits a catalog entry. Existing records keep the snapshot taken when
    /// they were written.
    pub fn upsert_code(&self, code: DeductionCode) -> Result<Self, LedgerError> {
        if code.id.is_empty() {
            return Err(LedgerError::MissingId("deduction code"));
        }
        let mut data = self.data.clone();
        upsert(&mut data.deduction_codes, code, |existing, new| existing.id == new.id);
        Ok(self.next(data))
    }

    pub fn remove_code(&self, id: &CodeId) -> Result<Self, LedgerError> {
        let mut data = self.data.clone();
        if !remove(&mut data.deduction_codes, |code| &code.id == id) {
            return Err(LedgerError::CodeNotFound(id.clone()));
        }
        Ok(self.next(data))
    }

    pub fn upsert_tier(&self, tier: IncentiveTier) -> Result<Self, LedgerError> {
        if tier.id.is_empty() {
            return Err(LedgerError::MissingId("incentive tier"));
        }
        if tier.min_score > tier.max_score || tier.max_score > FULL_SCORE {
            return Err(LedgerError::InvalidTierRange {
                min_score: tier.min_score,
                max_score: tier.max_score,
            });
        }
        let mut data = self.data.clone();
        upsert(&mut data.incentive_tiers, tier, |existing, new| existing.id == new.id);
        Ok(self.next(data))
    }

    pub fn remove_tier(&self, id: &TierId) -> Result<Self, LedgerError> {
        let mut data = self.data.clone();
        if !remove(&mut data.incentive_tiers, |tier| &tier.id == id) {
            return Err(LedgerError::TierNotFound(id.clone()));
        }
        Ok(self.next(data))
    }

    pub fn with_settings(&self, settings: AppSettings) -> Self {
        let mut data = self.data.clone();
        data.settings = settings;
        self.next(data)
    }
}

fn upsert<T>(items: &mut Vec<T>, item: T, same: impl Fn(&T, &T) -> bool) {
    match items.iter().position(|existing| same(existing, &item)) {
        Some(index) => items[index] = item,
        None => items.push(item),
    }
}

fn remove<T>(items: &mut Vec<T>, matches: impl Fn(&T) -> bool) -> bool {
    let before = items.len();
    items.retain(|item| !matches(item));
    items.len() != before
}
