use crate::ledger::Ledger;
use crate::scoring::MonthKey;

/// Byte-order mark so spreadsheet apps open the export as UTF-8.
const UTF8_BOM: &str = "\u{feff}";

const HEADER: [&str; 9] = [
    "Date",
    "Employee ID",
    "Full Name",
    "Position",
    "Department",
    "Code",
    "Description",
    "Points Deducted",
    "Remark",
];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("no deductions recorded in {0}")]
    EmptyMonth(MonthKey),
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush CSV buffer: {0}")]
    Io(#[from] std::io::Error),
}

pub fn export_file_name(month: &MonthKey) -> String {
    format!("Deduction_Report_{month}.csv")
}

/// Deduction log for `month` as CSV, one row per record in log order.
pub fn monthly_deductions_csv(ledger: &Ledger, month: &MonthKey) -> Result<Vec<u8>, ExportError> {
    let records: Vec<_> = ledger
        .records()
        .iter()
        .filter(|record| record.date.in_month(month))
        .collect();
    if records.is_empty() {
        return Err(ExportError::EmptyMonth(month.clone()));
    }

    let mut writer = csv::Writer::from_writer(UTF8_BOM.as_bytes().to_vec());
    writer.write_record(HEADER)?;

    for record in records {
        let employee = ledger.employee(&record.employee_id);
        let full_name = employee
            .map(|employee| employee.full_name())
            .unwrap_or_else(|| "Unknown".to_string());
        let position = employee
            .map(|employee| employee.position.as_str())
            .filter(|value| !value.is_empty())
            .unwrap_or("-");
        let department = employee
            .map(|employee| employee.department.as_str())
            .filter(|value| !value.is_empty())
            .unwrap_or("-");

        writer.write_record([
            record.date.as_str(),
            record.employee_id.as_str(),
            full_name.as_str(),
            position,
            department,
            record.deduction_code_code.as_str(),
            record.deduction_description.as_str(),
            format!("-{}", record.points).as_str(),
            record.remark.as_str(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|err| ExportError::Io(err.into_error()))
}
