use serde::Serialize;

use crate::ledger::Ledger;
use crate::scoring::{
    employee_incentive, grade_distribution, top_violations, DeductionRecord, EmployeeId,
    GradeBand, MonthKey, ViolationFrequency, FULL_SCORE,
};

const RECENT_RECORD_LIMIT: usize = 5;
const TOP_PERFORMER_LIMIT: usize = 5;
const LOW_PERFORMER_LIMIT: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct PerformerEntry {
    pub employee_id: EmployeeId,
    pub full_name: String,
    pub position: String,
    pub score: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub month: MonthKey,
    pub total_employees: usize,
    pub month_deduction_points: u64,
    pub estimated_incentive: u64,
    pub average_score: f32,
    pub grade_distribution: Vec<GradeBand>,
    pub top_violations: Vec<ViolationFrequency>,
    pub recent_records: Vec<DeductionRecord>,
    pub top_performers: Vec<PerformerEntry>,
    pub low_performers: Vec<PerformerEntry>,
}

/// Fleet overview built from stored scores, which the caller is expected to have
/// re-derived for the current month.
pub fn dashboard(ledger: &Ledger, month: &MonthKey) -> DashboardSummary {
    let employees = ledger.employees();
    let tiers = ledger.incentive_tiers();
    let total_employees = employees.len();

    let month_deduction_points = ledger
        .records()
        .iter()
        .filter(|record| record.date.in_month(month))
        .map(|record| u64::from(record.points))
        .sum();

    let estimated_incentive = employees
        .iter()
        .map(|employee| u64::from(employee_incentive(employee, tiers)))
        .sum();

    let average_score = if total_employees == 0 {
        0.0
    } else {
        let total: u64 = employees.iter().map(|employee| u64::from(employee.score)).sum();
        let raw = total as f32 / total_employees as f32;
        (raw * 10.0).round() / 10.0
    };

    let mut by_score_desc: Vec<_> = employees.iter().collect();
    by_score_desc.sort_by(|a, b| b.score.cmp(&a.score));
    let top_performers = by_score_desc
        .into_iter()
        .filter(|employee| employee.score == FULL_SCORE)
        .take(TOP_PERFORMER_LIMIT)
        .map(performer)
        .collect();

    let mut below_full: Vec<_> = employees
        .iter()
        .filter(|employee| employee.score < FULL_SCORE)
        .collect();
    below_full.sort_by(|a, b| a.score.cmp(&b.score));
    let low_performers = below_full
        .into_iter()
        .take(LOW_PERFORMER_LIMIT)
        .map(performer)
        .collect();

    DashboardSummary {
        month: month.clone(),
        total_employees,
        month_deduction_points,
        estimated_incentive,
        average_score,
        grade_distribution: grade_distribution(employees, tiers),
        top_violations: top_violations(ledger.records(), ledger.deduction_codes()),
        recent_records: ledger
            .records()
            .iter()
            .take(RECENT_RECORD_LIMIT)
            .cloned()
            .collect(),
        top_performers,
        low_performers,
    }
}

fn performer(employee: &crate::scoring::Employee) -> PerformerEntry {
    PerformerEntry {
        employee_id: employee.id.clone(),
        full_name: employee.full_name(),
        position: employee.position.clone(),
        score: employee.score,
    }
}
