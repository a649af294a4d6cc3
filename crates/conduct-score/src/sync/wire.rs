//! Loosely typed shapes exchanged with the spreadsheet web app.
//!
//! Sheet cells come back as strings, numbers, booleans, or blanks regardless of the
//! column's meaning, so inbound rows are read as raw JSON values and normalized into
//! the strongly typed entities here, before anything reaches the engine.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::ledger::LedgerSnapshot;
use crate::scoring::{
    AppSettings, CodeId, DeductionCode, DeductionRecord, Employee, EmployeeId, IncentiveTier,
    MasterSignatures, RecordDate, RecordId, TierId, FULL_SCORE,
};

/// Id of the placeholder row that keeps column headers alive for empty sheets.
pub const PRESERVE_HEADER_ID: &str = "PRESERVE_HEADER";

fn coerce_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => String::new(),
    }
}

fn coerce_optional_text(value: &Value) -> Option<String> {
    let text = coerce_text(value);
    if text.trim().is_empty() {
        None
    } else {
        Some(text.trim().to_string())
    }
}

/// Non-numeric input becomes 0 and negatives clamp to 0. Fractions are truncated.
fn coerce_u32(value: &Value) -> u32 {
    let number = match value {
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        Value::String(text) => text.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };
    if number.is_finite() && number > 0.0 {
        number.min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

fn coerce_score(value: &Value) -> u8 {
    u8::try_from(coerce_u32(value).min(u32::from(FULL_SCORE))).unwrap_or(FULL_SCORE)
}

fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Value::String(text) => matches!(
            text.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "1"
        ),
        _ => false,
    }
}

fn is_placeholder(id: &Value) -> bool {
    coerce_text(id).trim() == PRESERVE_HEADER_ID
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawEmployee {
    pub id: Value,
    pub prefix: Value,
    pub first_name: Value,
    pub last_name: Value,
    pub position: Value,
    pub department: Value,
    pub score: Value,
    pub base_salary: Value,
    pub position_allowance: Value,
    pub avatar_url: Value,
    pub signature_url: Value,
    pub no_position_allowance: Value,
    pub pending_deduction_points: Value,
    pub password: Value,
}

impl RawEmployee {
    pub fn normalize(&self) -> Employee {
        Employee {
            id: EmployeeId::new(coerce_text(&self.id)),
            prefix: coerce_text(&self.prefix),
            first_name: coerce_text(&self.first_name),
            last_name: coerce_text(&self.last_name),
            position: coerce_text(&self.position),
            department: coerce_text(&self.department),
            base_salary: coerce_u32(&self.base_salary),
            position_allowance: coerce_u32(&self.position_allowance),
            score: coerce_score(&self.score),
            pending_deduction_points: coerce_u32(&self.pending_deduction_points),
            no_position_allowance: coerce_bool(&self.no_position_allowance),
            avatar_url: coerce_optional_text(&self.avatar_url),
            signature_url: coerce_optional_text(&self.signature_url),
            password: coerce_optional_text(&self.password),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawDeductionCode {
    pub id: Value,
    pub code: Value,
    pub category: Value,
    pub description: Value,
    pub points: Value,
}

impl RawDeductionCode {
    pub fn normalize(&self) -> DeductionCode {
        DeductionCode {
            id: CodeId::new(coerce_text(&self.id)),
            code: coerce_text(&self.code),
            category: coerce_text(&self.category),
            description: coerce_text(&self.description),
            points: coerce_u32(&self.points),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawDeductionRecord {
    pub id: Value,
    pub employee_id: Value,
    pub deduction_code_id: Value,
    pub deduction_code_code: Value,
    pub deduction_description: Value,
    pub date: Value,
    pub points: Value,
    pub fine_amount: Value,
    pub remark: Value,
    pub carried_over_points: Value,
}

impl RawDeductionRecord {
    pub fn normalize(&self) -> DeductionRecord {
        DeductionRecord {
            id: RecordId::new(coerce_text(&self.id)),
            employee_id: EmployeeId::new(coerce_text(&self.employee_id)),
            deduction_code_id: CodeId::new(coerce_text(&self.deduction_code_id)),
            deduction_code_code: coerce_text(&self.deduction_code_code),
            deduction_description: coerce_text(&self.deduction_description),
            date: RecordDate::normalize(&coerce_text(&self.date)),
            points: coerce_u32(&self.points),
            fine_amount: coerce_u32(&self.fine_amount),
            remark: coerce_text(&self.remark),
            carried_over_points: coerce_u32(&self.carried_over_points),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawIncentiveTier {
    pub id: Value,
    pub name: Value,
    pub min_score: Value,
    pub max_score: Value,
    pub amount: Value,
}

impl RawIncentiveTier {
    pub fn normalize(&self) -> IncentiveTier {
        IncentiveTier {
            id: TierId::new(coerce_text(&self.id)),
            name: coerce_text(&self.name),
            min_score: coerce_score(&self.min_score),
            max_score: coerce_score(&self.max_score),
            amount: coerce_u32(&self.amount),
        }
    }
}

/// Config cell as stored in the sheet. Any field may be blank or of the wrong type.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSettings {
    pub logo_url: Value,
    pub master_signatures: Value,
}

impl RawSettings {
    pub fn normalize(&self) -> AppSettings {
        let signatures = match &self.master_signatures {
            Value::Object(map) => normalize_signatures(map),
            _ => MasterSignatures::default(),
        };
        AppSettings {
            logo_url: coerce_optional_text(&self.logo_url),
            master_signatures: signatures,
        }
    }
}

fn normalize_signatures(map: &Map<String, Value>) -> MasterSignatures {
    let field = |key: &str| map.get(key).and_then(coerce_optional_text);
    MasterSignatures {
        supervisor: field("supervisor"),
        asst_manager: field("asstManager"),
        sr_manager: field("srManager"),
        hr_manager: field("hrManager"),
        evp_hr: field("evpHr"),
    }
}

/// Body returned by the sheet's GET endpoint. Missing collections keep the cached copy.
///
/// Rows and the config cell stay as raw JSON until [`RemoteSnapshot::merge_into`], so a
/// single malformed entry is skipped instead of failing the whole fetch.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteSnapshot {
    pub employees: Option<Value>,
    pub deduction_codes: Option<Value>,
    pub records: Option<Value>,
    pub incentive_tiers: Option<Value>,
    pub config: Option<Value>,
}

/// Rows of a collection cell, or `None` when it is absent or not an array.
fn collection_rows(cell: Option<Value>, collection: &'static str) -> Option<Vec<Value>> {
    match cell {
        Some(Value::Array(rows)) => Some(rows),
        None | Some(Value::Null) => None,
        Some(other) => {
            warn!(collection, cell = %other, "ignoring non-array collection; keeping cached rows");
            None
        }
    }
}

/// Keeps object rows that are not header placeholders; anything else is logged and dropped.
fn object_rows<T: DeserializeOwned>(rows: Vec<Value>, collection: &'static str) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| {
            if !row.is_object() {
                warn!(collection, row = %row, "skipping non-object sheet row");
                return None;
            }
            if row.get("id").map(is_placeholder).unwrap_or(false) {
                return None;
            }
            match serde_json::from_value::<T>(row) {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    warn!(collection, error = %err, "skipping unreadable sheet row");
                    None
                }
            }
        })
        .collect()
}

impl RemoteSnapshot {
    /// Normalizes every present collection onto `cached`, dropping placeholder rows.
    /// Scores are copied as stored; monthly recalculation is the caller's job.
    pub fn merge_into(self, cached: &LedgerSnapshot) -> LedgerSnapshot {
        let mut merged = cached.clone();
        if let Some(rows) = collection_rows(self.employees, "employees") {
            merged.employees = object_rows::<RawEmployee>(rows, "employees")
                .iter()
                .map(RawEmployee::normalize)
                .collect();
        }
        if let Some(rows) = collection_rows(self.deduction_codes, "deduction_codes") {
            merged.deduction_codes = object_rows::<RawDeductionCode>(rows, "deduction_codes")
                .iter()
                .map(RawDeductionCode::normalize)
                .collect();
        }
        if let Some(rows) = collection_rows(self.records, "records") {
            merged.records = object_rows::<RawDeductionRecord>(rows, "records")
                .iter()
                .map(RawDeductionRecord::normalize)
                .collect();
        }
        if let Some(rows) = collection_rows(self.incentive_tiers, "incentive_tiers") {
            merged.incentive_tiers = object_rows::<RawIncentiveTier>(rows, "incentive_tiers")
                .iter()
                .map(RawIncentiveTier::normalize)
                .collect();
        }
        match self.config {
            Some(config @ Value::Object(_)) => match serde_json::from_value::<RawSettings>(config) {
                Ok(raw) => merged.settings = raw.normalize(),
                Err(err) => warn!(error = %err, "ignoring unreadable config cell"),
            },
            None | Some(Value::Null) => {}
            Some(other) => warn!(config = %other, "ignoring non-object config cell"),
        }
        merged
    }
}

/// Full-replacement payload for the sheet's `saveAll` action.
#[derive(Debug, Clone, Serialize)]
pub struct SaveAllPayload {
    pub action: &'static str,
    pub data: SaveAllData,
}

/// Collections under the canonical sheet names plus the aliases older script
/// deployments read.
#[derive(Debug, Clone, Serialize)]
pub struct SaveAllData {
    #[serde(rename = "Employees")]
    pub employees_sheet: Vec<Employee>,
    #[serde(rename = "DeductionCodes")]
    pub codes_sheet: Vec<DeductionCode>,
    #[serde(rename = "Records")]
    pub records_sheet: Vec<DeductionRecord>,
    #[serde(rename = "IncentiveTiers")]
    pub tiers_sheet: Vec<IncentiveTier>,
    #[serde(rename = "Config")]
    pub config_sheet: AppSettings,
    pub employees: Vec<Employee>,
    #[serde(rename = "deductionCodes")]
    pub deduction_codes: Vec<DeductionCode>,
    pub records: Vec<DeductionRecord>,
    #[serde(rename = "incentiveTiers")]
    pub incentive_tiers: Vec<IncentiveTier>,
    pub config: AppSettings,
    pub codes: Vec<DeductionCode>,
    pub tiers: Vec<IncentiveTier>,
}

impl SaveAllPayload {
    /// Builds the payload, substituting a placeholder row for each empty collection.
    pub fn from_snapshot(snapshot: &LedgerSnapshot, today: chrono::NaiveDate) -> Self {
        let employees = non_empty(&snapshot.employees, placeholder_employee);
        let codes = non_empty(&snapshot.deduction_codes, placeholder_code);
        let records = non_empty(&snapshot.records, || placeholder_record(today));
        let tiers = non_empty(&snapshot.incentive_tiers, placeholder_tier);

        Self {
            action: "saveAll",
            data: SaveAllData {
                employees_sheet: employees.clone(),
                codes_sheet: codes.clone(),
                records_sheet: records.clone(),
                tiers_sheet: tiers.clone(),
                config_sheet: snapshot.settings.clone(),
                employees,
                deduction_codes: codes.clone(),
                records,
                incentive_tiers: tiers.clone(),
                config: snapshot.settings.clone(),
                codes,
                tiers,
            },
        }
    }
}

fn non_empty<T: Clone>(items: &[T], placeholder: impl FnOnce() -> T) -> Vec<T> {
    if items.is_empty() {
        vec![placeholder()]
    } else {
        items.to_vec()
    }
}

fn placeholder_employee() -> Employee {
    Employee {
        score: 0,
        ..Employee::new(PRESERVE_HEADER_ID, "", "")
    }
}

fn placeholder_code() -> DeductionCode {
    DeductionCode {
        id: CodeId::new(PRESERVE_HEADER_ID),
        code: String::new(),
        category: String::new(),
        description: String::new(),
        points: 0,
    }
}

fn placeholder_record(today: chrono::NaiveDate) -> DeductionRecord {
    DeductionRecord {
        id: RecordId::new(PRESERVE_HEADER_ID),
        employee_id: EmployeeId::new(""),
        deduction_code_id: CodeId::new(""),
        deduction_code_code: String::new(),
        deduction_description: String::new(),
        date: RecordDate::from(today),
        points: 0,
        fine_amount: 0,
        remark: String::new(),
        carried_over_points: 0,
    }
}

fn placeholder_tier() -> IncentiveTier {
    IncentiveTier {
        id: TierId::new(PRESERVE_HEADER_ID),
        name: String::new(),
        min_score: 0,
        max_score: 0,
        amount: 0,
    }
}

/// Body of the sheet's `uploadImage` action.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUpload {
    pub action: &'static str,
    /// Data URL or bare base64 content.
    pub base64: String,
    pub mime_type: String,
    pub file_name: String,
}

impl ImageUpload {
    pub fn new(base64: String, mime_type: String, file_name: String) -> Self {
        Self {
            action: "uploadImage",
            base64,
            mime_type,
            file_name,
        }
    }
}

/// Status envelope returned by POST actions.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl ActionResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}
