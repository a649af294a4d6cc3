use serde::Serialize;

use super::finance::TierBand;
use crate::ledger::{Ledger, LedgerError, SignOff};
use crate::scoring::{
    matching_tier, month_deductions, records_in_month, resolve_incentive, DeductionRecord,
    EmployeeId, MonthKey,
};

/// What an employee sees after logging in.
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeStatement {
    pub employee_id: EmployeeId,
    pub full_name: String,
    pub position: String,
    pub department: String,
    pub month: MonthKey,
    pub score: u8,
    pub pending_deduction_points: u32,
    pub month_records: Vec<DeductionRecord>,
    pub total_deducted: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<TierBand>,
    pub incentive_amount: u32,
    pub ineligible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed_off: Option<SignOff>,
}

/// Tier and payout use the stored current score; the record list covers `month`.
pub fn employee_statement(
    ledger: &Ledger,
    employee_id: &EmployeeId,
    month: &MonthKey,
    signed_off: Option<SignOff>,
) -> Result<EmployeeStatement, LedgerError> {
    let employee = ledger
        .employee(employee_id)
        .ok_or_else(|| LedgerError::EmployeeNotFound(employee_id.clone()))?;
    let tiers = ledger.incentive_tiers();

    Ok(EmployeeStatement {
        employee_id: employee.id.clone(),
        full_name: employee.full_name(),
        position: employee.position.clone(),
        department: employee.department.clone(),
        month: month.clone(),
        score: employee.score,
        pending_deduction_points: employee.pending_deduction_points,
        month_records: records_in_month(&employee.id, ledger.records(), month)
            .cloned()
            .collect(),
        total_deducted: month_deductions(&employee.id, ledger.records(), month),
        tier: matching_tier(employee.score, tiers).map(TierBand::from),
        incentive_amount: resolve_incentive(
            employee.score,
            tiers,
            employee.no_position_allowance,
        ),
        ineligible: employee.no_position_allowance,
        signed_off,
    })
}
