use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Every month starts from full marks.
pub const FULL_SCORE: u8 = 100;

macro_rules! trimmed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn new(raw: impl AsRef<str>) -> Self {
                Self(raw.as_ref().trim().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

trimmed_id!(
    /// Employee identifier. Ids arrive as numbers or padded strings from the sheet,
    /// so the value is always stored trimmed and compared as text.
    EmployeeId
);
trimmed_id!(
    /// Catalog identifier of a deduction code.
    CodeId
);
trimmed_id!(
    /// Opaque identifier of a deduction record.
    RecordId
);
trimmed_id!(
    /// Identifier of an incentive tier.
    TierId
);

static RECORD_SEQUENCE: AtomicU64 = AtomicU64::new(1);

impl RecordId {
    pub fn generate() -> Self {
        let sequence = RECORD_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self(format!("REC-{}-{sequence}", Utc::now().timestamp_millis()))
    }
}

/// Calendar month in `YYYY-MM` form, zero padded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a YYYY-MM month")]
pub struct MonthKeyError(pub String);

impl MonthKey {
    pub fn parse(raw: &str) -> Result<Self, MonthKeyError> {
        let trimmed = raw.trim();
        let well_formed = trimmed.len() == 7
            && NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d").is_ok();
        if well_formed {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(MonthKeyError(raw.to_string()))
        }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format("%Y-%m").to_string())
    }

    /// Month of the local wall-clock date, which is where incentive months roll over.
    pub fn current_local() -> Self {
        Self::from_date(Local::now().date_naive())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&format!("{}-01", self.0), "%Y-%m-%d").ok()
    }
}

impl TryFrom<String> for MonthKey {
    type Error = MonthKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MonthKey> for String {
    fn from(value: MonthKey) -> Self {
        value.0
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Calendar date of an incident as exchanged with the sheet (`YYYY-MM-DD`).
///
/// Month membership is a plain prefix test on this text, so a value that is not a
/// calendar date is retained but never falls into any month.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RecordDate(String);

impl RecordDate {
    /// Keeps the leading `YYYY-MM-DD` of dates and timestamps; other text is kept as-is.
    pub fn normalize(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.get(..10) {
            Some(head) if NaiveDate::parse_from_str(head, "%Y-%m-%d").is_ok() => {
                Self(head.to_string())
            }
            _ => Self(trimmed.to_string()),
        }
    }

    pub fn in_month(&self, month: &MonthKey) -> bool {
        self.0.starts_with(month.as_str())
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.0, "%Y-%m-%d").ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<NaiveDate> for RecordDate {
    fn from(value: NaiveDate) -> Self {
        Self(value.format("%Y-%m-%d").to_string())
    }
}

impl From<String> for RecordDate {
    fn from(value: String) -> Self {
        Self::normalize(&value)
    }
}

impl From<RecordDate> for String {
    fn from(value: RecordDate) -> Self {
        value.0
    }
}

impl fmt::Display for RecordDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Operator on the roster together with their live scoring state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EmployeeId,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub base_salary: u32,
    /// Full incentive the position is eligible for.
    #[serde(default)]
    pub position_allowance: u32,
    /// Standing for the active month, always within `0..=100`.
    pub score: u8,
    /// Deficit carried over from deductions larger than the score at the time.
    #[serde(default)]
    pub pending_deduction_points: u32,
    /// Opts the employee out of incentive payment regardless of score.
    #[serde(default)]
    pub no_position_allowance: bool,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub signature_url: Option<String>,
    /// Plaintext login password; absent means the id doubles as the password.
    #[serde(default)]
    pub password: Option<String>,
}

impl Employee {
    pub fn new(id: impl Into<EmployeeId>, first_name: &str, last_name: &str) -> Self {
        Self {
            id: id.into(),
            prefix: String::new(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            position: String::new(),
            department: String::new(),
            base_salary: 0,
            position_allowance: 0,
            score: FULL_SCORE,
            pending_deduction_points: 0,
            no_position_allowance: false,
            avatar_url: None,
            signature_url: None,
            password: None,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}{} {}", self.prefix, self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn login_password(&self) -> &str {
        match self.password.as_deref().map(str::trim) {
            Some(password) if !password.is_empty() => password,
            _ => self.id.as_str(),
        }
    }
}

/// Catalog entry describing a violation type and its point cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeductionCode {
    pub id: CodeId,
    pub code: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub points: u32,
}

/// One recorded incident. Records are appended or removed, never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeductionRecord {
    pub id: RecordId,
    pub employee_id: EmployeeId,
    pub deduction_code_id: CodeId,
    /// Code label as it read when the incident was recorded.
    pub deduction_code_code: String,
    pub deduction_description: String,
    pub date: RecordDate,
    pub points: u32,
    #[serde(default)]
    pub fine_amount: u32,
    #[serde(default)]
    pub remark: String,
    /// Points the score could not absorb and were pushed to the pending balance.
    #[serde(default)]
    pub carried_over_points: u32,
}

/// Score band mapped to an incentive payout. Bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncentiveTier {
    pub id: TierId,
    pub name: String,
    pub min_score: u8,
    pub max_score: u8,
    pub amount: u32,
}

impl IncentiveTier {
    pub fn covers(&self, score: u8) -> bool {
        self.min_score <= score && score <= self.max_score
    }
}

/// Signature images for the five approvers on the printed monthly form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MasterSignatures {
    pub supervisor: Option<String>,
    pub asst_manager: Option<String>,
    pub sr_manager: Option<String>,
    pub hr_manager: Option<String>,
    pub evp_hr: Option<String>,
}

/// Branding and signature settings stored alongside the collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub logo_url: Option<String>,
    pub master_signatures: MasterSignatures,
}
