//! Read-side views over a ledger: dashboard, payout sheet, employee portal, monthly
//! approval form, CSV export.

mod approval;
mod dashboard;
mod export;
mod finance;
mod portal;

pub use approval::{monthly_report, MonthlyReport, RosterLine, NO_GRADE};
pub use dashboard::{dashboard, DashboardSummary, PerformerEntry};
pub use export::{export_file_name, monthly_deductions_csv, ExportError};
pub use finance::{finance_statement, FinanceLine, FinanceStatement, TierBand};
pub use portal::{employee_statement, EmployeeStatement};
