use crate::infra::{load_snapshot, parse_month};
use clap::Args;
use conduct_score::error::AppError;
use conduct_score::ledger::{ApprovalSheet, SignOffBook};
use conduct_score::reports::{
    finance_statement, monthly_deductions_csv, monthly_report, FinanceStatement, MonthlyReport,
};
use conduct_score::scoring::MonthKey;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Ledger snapshot file (JSON)
    #[arg(long)]
    pub(crate) snapshot: PathBuf,
    /// Month to report (YYYY-MM). Defaults to the current local month.
    #[arg(long, value_parser = parse_month)]
    pub(crate) month: Option<MonthKey>,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// Ledger snapshot file (JSON)
    #[arg(long)]
    pub(crate) snapshot: PathBuf,
    /// Month to export (YYYY-MM)
    #[arg(long, value_parser = parse_month)]
    pub(crate) month: MonthKey,
    /// Destination CSV file
    #[arg(long)]
    pub(crate) out: PathBuf,
}

pub(crate) fn run_finance_report(args: ReportArgs) -> Result<(), AppError> {
    let ReportArgs { snapshot, month } = args;

    let ledger = load_snapshot(&snapshot)?;
    let month = month.unwrap_or_else(MonthKey::current_local);
    let statement = finance_statement(&ledger, &month);
    render_finance_statement(&statement);

    Ok(())
}

/// Snapshot files carry no sign-offs, so every employee shows as unsigned.
pub(crate) fn run_monthly_report(args: ReportArgs) -> Result<(), AppError> {
    let ReportArgs { snapshot, month } = args;

    let ledger = load_snapshot(&snapshot)?;
    let month = month.unwrap_or_else(MonthKey::current_local);
    let report = monthly_report(
        &ledger,
        &month,
        &SignOffBook::default(),
        ApprovalSheet::new(month.clone()),
    );
    render_monthly_report(&report);

    Ok(())
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let ExportArgs {
        snapshot,
        month,
        out,
    } = args;

    let ledger = load_snapshot(&snapshot)?;
    let csv = monthly_deductions_csv(&ledger, &month)?;
    std::fs::write(&out, csv)?;
    println!("Wrote deduction log for {} to {}", month, out.display());

    Ok(())
}

fn render_finance_statement(statement: &FinanceStatement) {
    println!("Incentive statement for {}", statement.month);
    println!(
        "{} employees | total payable {} | total position allowance {}",
        statement.lines.len(),
        statement.total_payable,
        statement.total_position_allowance
    );

    for line in &statement.lines {
        let tier = line
            .tier
            .as_ref()
            .map(|tier| format!("{} ({}-{})", tier.name, tier.min_score, tier.max_score))
            .unwrap_or_else(|| "no tier".to_string());
        let note = if line.ineligible {
            " [no position allowance]"
        } else if line.full_amount {
            ""
        } else {
            " [partial]"
        };
        println!(
            "- {} {} | score {} (-{} pts) | {} | payable {}{}",
            line.employee_id,
            line.full_name,
            line.monthly_score,
            line.deducted_points,
            tier,
            line.payable,
            note
        );
        for record in &line.records {
            println!(
                "    {} {} -{} {}",
                record.date, record.deduction_code_code, record.points, record.remark
            );
        }
    }
}

fn render_monthly_report(report: &MonthlyReport) {
    println!("Monthly incentive approval for {}", report.month);
    println!(
        "{} employees | projected {} | actual {} | signed off {}",
        report.roster.len(),
        report.total_projected,
        report.total_actual,
        report.signed_off_count
    );

    for line in &report.roster {
        println!(
            "- {} {} | {} | score {} | grade {} | projected {} | actual {}{}",
            line.employee_id,
            line.full_name,
            line.position,
            line.score,
            line.grade,
            line.projected_incentive,
            line.actual_pay,
            if line.signed_off { " [signed]" } else { "" }
        );
    }
}
