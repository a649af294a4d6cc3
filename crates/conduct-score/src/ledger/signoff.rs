use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::{EmployeeId, MasterSignatures, MonthKey};

/// An employee's acknowledgement of their monthly report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignOff {
    pub employee_id: EmployeeId,
    pub month: MonthKey,
    pub signature_image: String,
    pub signed_at: DateTime<Utc>,
}

/// One sign-off per employee and month; signing again replaces the earlier one.
#[derive(Debug, Clone, Default)]
pub struct SignOffBook {
    entries: Vec<SignOff>,
}

impl SignOffBook {
    pub fn sign(&mut self, sign_off: SignOff) {
        self.entries.retain(|entry| {
            !(entry.employee_id == sign_off.employee_id && entry.month == sign_off.month)
        });
        self.entries.push(sign_off);
    }

    pub fn find(&self, employee_id: &EmployeeId, month: &MonthKey) -> Option<&SignOff> {
        self.entries
            .iter()
            .find(|entry| &entry.employee_id == employee_id && &entry.month == month)
    }

    pub fn signed_for_month(&self, month: &MonthKey) -> Vec<&SignOff> {
        self.entries
            .iter()
            .filter(|entry| &entry.month == month)
            .collect()
    }
}

/// Approvers on the printed monthly incentive form, in signing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalRole {
    Supervisor,
    AsstManager,
    SrManager,
    HrManager,
    EvpHr,
}

impl ApprovalRole {
    pub const fn ordered() -> [ApprovalRole; 5] {
        [
            ApprovalRole::Supervisor,
            ApprovalRole::AsstManager,
            ApprovalRole::SrManager,
            ApprovalRole::HrManager,
            ApprovalRole::EvpHr,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            ApprovalRole::Supervisor => "Supervisor",
            ApprovalRole::AsstManager => "Asst. Manager",
            ApprovalRole::SrManager => "Sr. Manager / Director / EVP Operation",
            ApprovalRole::HrManager => "HR Manager",
            ApprovalRole::EvpHr => "EVP - HR",
        }
    }

    /// Master signature image uploaded for this role, if any.
    pub fn master_signature(self, signatures: &MasterSignatures) -> Option<&str> {
        let slot = match self {
            ApprovalRole::Supervisor => &signatures.supervisor,
            ApprovalRole::AsstManager => &signatures.asst_manager,
            ApprovalRole::SrManager => &signatures.sr_manager,
            ApprovalRole::HrManager => &signatures.hr_manager,
            ApprovalRole::EvpHr => &signatures.evp_hr,
        };
        slot.as_deref()
    }

    pub fn master_signature_mut(self, signatures: &mut MasterSignatures) -> &mut Option<String> {
        match self {
            ApprovalRole::Supervisor => &mut signatures.supervisor,
            ApprovalRole::AsstManager => &mut signatures.asst_manager,
            ApprovalRole::SrManager => &mut signatures.sr_manager,
            ApprovalRole::HrManager => &mut signatures.hr_manager,
            ApprovalRole::EvpHr => &mut signatures.evp_hr,
        }
    }

    /// Supervisors and HR managers submit the form; the others approve or reject it.
    pub const fn is_requester(self) -> bool {
        matches!(self, ApprovalRole::Supervisor | ApprovalRole::HrManager)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalEntry {
    pub role: ApprovalRole,
    pub signature: Option<String>,
    pub date: Option<NaiveDate>,
    pub decision: Option<ApprovalDecision>,
}

impl ApprovalEntry {
    fn initial(role: ApprovalRole) -> Self {
        Self {
            role,
            signature: None,
            date: None,
            decision: if role.is_requester() {
                None
            } else {
                Some(ApprovalDecision::Approved)
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalSheet {
    pub month: MonthKey,
    pub entries: Vec<ApprovalEntry>,
}

impl ApprovalSheet {
    pub fn new(month: MonthKey) -> Self {
        Self {
            month,
            entries: ApprovalRole::ordered()
                .into_iter()
                .map(ApprovalEntry::initial)
                .collect(),
        }
    }

    pub fn entry(&self, role: ApprovalRole) -> Option<&ApprovalEntry> {
        self.entries.iter().find(|entry| entry.role == role)
    }

    /// Stores a signature for `role`. Approvers keep their current decision unless a new
    /// one is given; requesters never carry one.
    pub fn sign(
        &mut self,
        role: ApprovalRole,
        signature: String,
        date: Option<NaiveDate>,
        decision: Option<ApprovalDecision>,
    ) {
        if self.entry(role).is_none() {
            self.entries.push(ApprovalEntry::initial(role));
        }
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.role == role) {
            entry.signature = Some(signature);
            entry.date = date;
            if !role.is_requester() && decision.is_some() {
                entry.decision = decision;
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        ApprovalRole::ordered().into_iter().all(|role| {
            self.entry(role)
                .map(|entry| entry.signature.is_some())
                .unwrap_or(false)
        })
    }
}
