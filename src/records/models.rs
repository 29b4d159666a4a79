//! Record Models
//! Mission: Owned school records, their create payloads, and field validation

use crate::auth::IdentityToken;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A class taught under one identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRecord {
    pub id: Uuid,
    pub name: String,
    pub subject: String,
    pub user_id: IdentityToken,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherRecord {
    pub id: Uuid,
    pub name: String,
    pub subject: String,
    pub user_id: IdentityToken,
}

/// Student with a globally unique admission number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub id: Uuid,
    pub name: String,
    pub admission_no: String,
    #[serde(rename = "class")]
    pub class_label: String,
    pub attendance_percentage: f64,
    pub user_id: IdentityToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
        }
    }
}

impl FromStr for AttendanceStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Present" => Ok(AttendanceStatus::Present),
            "Absent" => Ok(AttendanceStatus::Absent),
            other => Err(ValidationError(format!(
                "status must be Present or Absent, got '{}'",
                other
            ))),
        }
    }
}

/// One attendance mark for one student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub student_id: Uuid,
    pub date: DateTime<Utc>,
    pub status: AttendanceStatus,
    pub user_id: IdentityToken,
}

/// Attendance listing row with the referenced student resolved.
///
/// `student` is `None` once the student has been deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceEntry {
    #[serde(flatten)]
    pub record: AttendanceRecord,
    pub student: Option<StudentRecord>,
}

/// Record counts shown on the dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub classes: i64,
    pub teachers: i64,
    pub students: i64,
    pub attendance: i64,
}

// ---------------------------------------------------------------------------
// Create payloads. Every field is optional so absence surfaces as a
// validation message instead of a deserialization failure.
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ClassDraft {
    pub name: Option<String>,
    pub subject: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TeacherDraft {
    pub name: Option<String>,
    pub subject: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDraft {
    pub name: Option<String>,
    pub admission_no: Option<String>,
    pub class: Option<String>,
    pub attendance_percentage: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceDraft {
    pub student_id: Option<String>,
    pub status: Option<String>,
    pub date: Option<String>,
}

/// A create payload field that is absent or malformed
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError(pub String);

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ValidationError {}

/// Non-blank, trimmed string field.
pub fn required_text(field: &str, value: Option<String>) -> Result<String, ValidationError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError(format!("{} is required", field))),
    }
}

/// Attendance percentage: number or numeric string in [0, 100].
/// Absent, null and empty values default to 0.
pub fn parse_percentage(value: Option<Value>) -> Result<f64, ValidationError> {
    let not_numeric = || ValidationError("attendancePercentage must be a number".to_string());

    let pct = match value {
        None | Some(Value::Null) => return Ok(0.0),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(not_numeric)?,
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| not_numeric())?,
        Some(_) => return Err(not_numeric()),
    };

    if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
        return Err(ValidationError(
            "attendancePercentage must be between 0 and 100".to_string(),
        ));
    }
    Ok(pct)
}

/// Optional RFC 3339 timestamp, defaulting to now.
pub fn parse_date(value: Option<String>) -> Result<DateTime<Utc>, ValidationError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(Utc::now()),
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|_| ValidationError(format!("date '{}' is not an RFC 3339 timestamp", raw))),
    }
}
