use serde::Serialize;

use super::domain::{DeductionCode, DeductionRecord, Employee, RecordDate, RecordId};

/// Score and pending balance after absorbing a single deduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeductionEffect {
    pub score: u8,
    pub pending_deduction_points: u32,
    pub carried_over_points: u32,
}

/// Absorbs `cost` into `score`, flooring at zero and carrying the remainder into
/// the pending balance.
pub fn absorb(score: u8, pending_deduction_points: u32, cost: u32) -> DeductionEffect {
    let available = u32::from(score);
    if available >= cost {
        DeductionEffect {
            score: u8::try_from(available - cost).unwrap_or(0),
            pending_deduction_points,
            carried_over_points: 0,
        }
    } else {
        let carried_over_points = cost - available;
        DeductionEffect {
            score: 0,
            pending_deduction_points: pending_deduction_points.saturating_add(carried_over_points),
            carried_over_points,
        }
    }
}

/// Updated employee and the record produced by one deduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeductionOutcome {
    pub employee: Employee,
    pub record: DeductionRecord,
}

impl DeductionOutcome {
    pub fn carried_over(&self) -> u32 {
        self.record.carried_over_points
    }
}

/// Applies `code` to `employee`, snapshotting the code into the new record.
pub fn apply_deduction(
    employee: &Employee,
    code: &DeductionCode,
    date: RecordDate,
    remark: impl Into<String>,
    record_id: RecordId,
) -> DeductionOutcome {
    let cost = code.points;
    let effect = absorb(employee.score, employee.pending_deduction_points, cost);

    let record = DeductionRecord {
        id: record_id,
        employee_id: employee.id.clone(),
        deduction_code_id: code.id.clone(),
        deduction_code_code: code.code.clone(),
        deduction_description: code.description.clone(),
        date,
        points: cost,
        fine_amount: 0,
        remark: remark.into(),
        carried_over_points: effect.carried_over_points,
    };

    let employee = Employee {
        score: effect.score,
        pending_deduction_points: effect.pending_deduction_points,
        ..employee.clone()
    };

    DeductionOutcome { employee, record }
}
