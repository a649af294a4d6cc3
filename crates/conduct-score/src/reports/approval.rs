use std::cmp::Ordering;
use std::collections::HashSet;
use std::iter::Peekable;
use std::str::Chars;

use serde::Serialize;

use crate::ledger::{ApprovalSheet, Ledger, SignOffBook};
use crate::scoring::{matching_tier, resolve_incentive, EmployeeId, MonthKey};

/// Grade printed for a score that no tier covers.
pub const NO_GRADE: &str = "N/A";

#[derive(Debug, Clone, Serialize)]
pub struct RosterLine {
    pub employee_id: EmployeeId,
    pub full_name: String,
    pub position: String,
    pub department: String,
    pub score: u8,
    pub grade: String,
    /// Base position allowance the employee would receive at full score.
    pub projected_incentive: u32,
    /// Tier amount for the stored score, zero when the employee is opted out.
    pub actual_pay: u32,
    pub ineligible: bool,
    pub signed_off: bool,
}

/// Printed monthly incentive form: employee roster plus the management approval block.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyReport {
    pub month: MonthKey,
    pub roster: Vec<RosterLine>,
    pub total_projected: u64,
    pub total_actual: u64,
    pub signed_off_count: usize,
    pub approvals: ApprovalSheet,
}

/// Roster ordered by employee id, comparing digit runs by value so "9" sorts before "10".
pub fn monthly_report(
    ledger: &Ledger,
    month: &MonthKey,
    sign_offs: &SignOffBook,
    approvals: ApprovalSheet,
) -> MonthlyReport {
    let tiers = ledger.incentive_tiers();
    let signed: HashSet<&EmployeeId> = sign_offs
        .signed_for_month(month)
        .into_iter()
        .map(|sign_off| &sign_off.employee_id)
        .collect();

    let mut roster: Vec<RosterLine> = ledger
        .employees()
        .iter()
        .map(|employee| RosterLine {
            employee_id: employee.id.clone(),
            full_name: employee.full_name(),
            position: employee.position.clone(),
            department: employee.department.clone(),
            score: employee.score,
            grade: matching_tier(employee.score, tiers)
                .map(|tier| tier.name.clone())
                .unwrap_or_else(|| NO_GRADE.to_string()),
            projected_incentive: employee.position_allowance,
            actual_pay: resolve_incentive(employee.score, tiers, employee.no_position_allowance),
            ineligible: employee.no_position_allowance,
            signed_off: signed.contains(&employee.id),
        })
        .collect();
    roster.sort_by(|a, b| numeric_aware_cmp(a.employee_id.as_str(), b.employee_id.as_str()));

    MonthlyReport {
        month: month.clone(),
        total_projected: roster.iter().map(|line| u64::from(line.projected_incentive)).sum(),
        total_actual: roster.iter().map(|line| u64::from(line.actual_pay)).sum(),
        signed_off_count: roster.iter().filter(|line| line.signed_off).count(),
        roster,
        approvals,
    }
}

fn numeric_aware_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();
    loop {
        let order = match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                compare_digit_runs(&take_digits(&mut left), &take_digits(&mut right))
            }
            (Some(l), Some(r)) => {
                left.next();
                right.next();
                l.cmp(&r)
            }
        };
        if order != Ordering::Equal {
            return order;
        }
    }
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(digit) = chars.next_if(char::is_ascii_digit) {
        run.push(digit);
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
