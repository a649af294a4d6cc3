use super::domain::{DeductionRecord, Employee, EmployeeId, MonthKey, FULL_SCORE};

/// Records of `employee_id` dated within `month`.
pub fn records_in_month<'a>(
    employee_id: &'a EmployeeId,
    records: &'a [DeductionRecord],
    month: &'a MonthKey,
) -> impl Iterator<Item = &'a DeductionRecord> + 'a {
    records
        .iter()
        .filter(move |record| &record.employee_id == employee_id && record.date.in_month(month))
}

pub fn month_deductions(
    employee_id: &EmployeeId,
    records: &[DeductionRecord],
    month: &MonthKey,
) -> u64 {
    records_in_month(employee_id, records, month)
        .map(|record| u64::from(record.points))
        .sum()
}

/// Score for `month` derived only from that month's records. Any stored score is
/// ignored, which is what resets standings when a new month begins.
pub fn recalculate_monthly_score(
    employee_id: &EmployeeId,
    records: &[DeductionRecord],
    month: &MonthKey,
) -> u8 {
    let deducted = month_deductions(employee_id, records, month);
    u8::try_from(u64::from(FULL_SCORE).saturating_sub(deducted)).unwrap_or(0)
}

/// Re-derives every employee's score for `month`. Pending balances are kept as they are.
pub fn rescore_employees(
    employees: &[Employee],
    records: &[DeductionRecord],
    month: &MonthKey,
) -> Vec<Employee> {
    employees
        .iter()
        .map(|employee| Employee {
            score: recalculate_monthly_score(&employee.id, records, month),
            ..employee.clone()
        })
        .collect()
}
