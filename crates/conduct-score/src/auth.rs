//! Login for the admin console and the employee portal.
//!
//! Passwords are compared as plain text, matching what the sheet stores.

use serde::{Deserialize, Serialize};

use crate::scoring::{Employee, EmployeeId};

/// One `username:password` admin login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCredential {
    pub username: String,
    pub password: String,
}

impl AdminCredential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Parses `user:password`. The password may itself contain `:`.
    pub fn parse(entry: &str) -> Option<Self> {
        let (username, password) = entry.trim().split_once(':')?;
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return None;
        }
        Some(Self::new(username, password))
    }

    /// Parses a comma-separated list; fails on the first malformed entry.
    pub fn parse_list(raw: &str) -> Result<Vec<Self>, String> {
        raw.split(',')
            .filter(|entry| !entry.trim().is_empty())
            .map(|entry| Self::parse(entry).ok_or_else(|| entry.trim().to_string()))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionRole {
    Admin,
    Employee,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub role: SessionRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<EmployeeId>,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,
}

/// Admin logins are checked first, then employee ids against their portal password.
pub fn authenticate(
    admins: &[AdminCredential],
    employees: &[Employee],
    username: &str,
    password: &str,
) -> Result<Session, AuthError> {
    let username = username.trim();

    if let Some(admin) = admins
        .iter()
        .find(|admin| admin.username == username && admin.password == password)
    {
        return Ok(Session {
            role: SessionRole::Admin,
            employee_id: None,
            display_name: admin.username.clone(),
        });
    }

    let id = EmployeeId::new(username);
    employees
        .iter()
        .find(|employee| employee.id == id && employee.login_password() == password)
        .map(|employee| Session {
            role: SessionRole::Employee,
            employee_id: Some(employee.id.clone()),
            display_name: employee.full_name(),
        })
        .ok_or(AuthError::InvalidCredentials)
}
