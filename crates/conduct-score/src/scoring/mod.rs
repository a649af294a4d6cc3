//! Score and incentive engine: carry-over deductions, monthly recalculation from the
//! record log, and tier resolution. Everything here is pure and synchronous.

mod deduction;
pub mod domain;
mod incentive;
mod monthly;

pub use deduction::{absorb, apply_deduction, DeductionEffect, DeductionOutcome};
pub use domain::{
    AppSettings, CodeId, DeductionCode, DeductionRecord, Employee, EmployeeId, IncentiveTier,
    MasterSignatures, MonthKey, MonthKeyError, RecordDate, RecordId, TierId, FULL_SCORE,
};
pub use incentive::{
    employee_incentive, grade_distribution, matching_tier, resolve_incentive, top_violations,
    GradeBand, ViolationFrequency, TOP_VIOLATION_LIMIT,
};
pub use monthly::{month_deductions, recalculate_monthly_score, records_in_month, rescore_employees};
