use serde::Serialize;

use crate::ledger::Ledger;
use crate::scoring::{
    matching_tier, recalculate_monthly_score, records_in_month, resolve_incentive,
    DeductionRecord, EmployeeId, IncentiveTier, MonthKey,
};

/// Tier a score landed in, as printed next to the payout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierBand {
    pub name: String,
    pub min_score: u8,
    pub max_score: u8,
}

impl From<&IncentiveTier> for TierBand {
    fn from(tier: &IncentiveTier) -> Self {
        Self {
            name: tier.name.clone(),
            min_score: tier.min_score,
            max_score: tier.max_score,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FinanceLine {
    pub employee_id: EmployeeId,
    pub full_name: String,
    pub position: String,
    pub department: String,
    pub monthly_score: u8,
    pub deducted_points: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<TierBand>,
    pub calculated_incentive: u32,
    pub payable: u32,
    pub position_allowance: u32,
    /// Payable reaches the full position allowance.
    pub full_amount: bool,
    pub ineligible: bool,
    pub records: Vec<DeductionRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinanceStatement {
    pub month: MonthKey,
    pub lines: Vec<FinanceLine>,
    pub total_payable: u64,
    pub total_position_allowance: u64,
}

/// Payout sheet for `month`. Scores are recomputed from that month's records so past
/// months can be reviewed regardless of what is stored on each employee.
pub fn finance_statement(ledger: &Ledger, month: &MonthKey) -> FinanceStatement {
    let tiers = ledger.incentive_tiers();

    let lines: Vec<FinanceLine> = ledger
        .employees()
        .iter()
        .map(|employee| {
            let records: Vec<DeductionRecord> =
                records_in_month(&employee.id, ledger.records(), month)
                    .cloned()
                    .collect();
            let deducted_points = records.iter().map(|record| u64::from(record.points)).sum();
            let monthly_score = recalculate_monthly_score(&employee.id, ledger.records(), month);
            let calculated_incentive = resolve_incentive(monthly_score, tiers, false);
            let payable =
                resolve_incentive(monthly_score, tiers, employee.no_position_allowance);

            FinanceLine {
                employee_id: employee.id.clone(),
                full_name: employee.full_name(),
                position: employee.position.clone(),
                department: employee.department.clone(),
                monthly_score,
                deducted_points,
                tier: matching_tier(monthly_score, tiers).map(TierBand::from),
                calculated_incentive,
                payable,
                position_allowance: employee.position_allowance,
                full_amount: payable >= employee.position_allowance,
                ineligible: employee.no_position_allowance,
                records,
            }
        })
        .collect();

    let total_payable = lines.iter().map(|line| u64::from(line.payable)).sum();
    let total_position_allowance = lines
        .iter()
        .map(|line| u64::from(line.position_allowance))
        .sum();

    FinanceStatement {
        month: month.clone(),
        lines,
        total_payable,
        total_position_allowance,
    }
}
