//! Record Storage
//! Mission: Generic create/list/delete over every record kind, always filtered by owner

use crate::auth::IdentityToken;
use crate::db::{is_unique_violation, Database};
use crate::records::kinds::{Deletable, OwnedRecord};
use crate::records::models::{DashboardSummary, ValidationError};
use rusqlite::params;
use std::fmt;
use tracing::{debug, info};
use uuid::Uuid;

/// Errors from record operations
#[derive(Debug)]
pub enum RecordError {
    Validation(String),
    /// Deliberately does not say whether the record exists.
    NotFoundOrUnauthorized,
    Internal(anyhow::Error),
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "Validation error: {}", msg),
            Self::NotFoundOrUnauthorized => write!(f, "Record not found or unauthorized"),
            Self::Internal(e) => write!(f, "Record store error: {}", e),
        }
    }
}

impl std::error::Error for RecordError {}

impl From<ValidationError> for RecordError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e.0)
    }
}

impl From<rusqlite::Error> for RecordError {
    fn from(e: rusqlite::Error) -> Self {
        if is_unique_violation(&e) {
            Self::Validation("a record with the same unique value already exists".to_string())
        } else {
            Self::Internal(e.into())
        }
    }
}

/// Ownership-filtered access to classes, teachers, students and attendance
pub struct RecordStore {
    db: Database,
}

impl RecordStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Every record of kind `T` owned by `owner`.
    pub fn list<T: OwnedRecord>(&self, owner: IdentityToken) -> Result<Vec<T::Listing>, RecordError> {
        let conn = self.db.lock();
        let rows = T::list(&conn, owner)?;
        debug!("Listed {} {} rows for {}", rows.len(), T::LABEL, owner);
        Ok(rows)
    }

    /// Validate, stamp with `owner`, and persist.
    pub fn create<T: OwnedRecord>(
        &self,
        owner: IdentityToken,
        draft: T::Draft,
    ) -> Result<T, RecordError> {
        let conn = self.db.lock();
        let record = T::from_draft(draft, owner, &conn)?;
        record.insert(&conn)?;
        info!("📝 Created {} {} for {}", T::LABEL, record.id(), owner);
        Ok(record)
    }

    /// Delete a record only when it exists and belongs to `owner`.
    ///
    /// Unparseable ids are reported exactly like missing ones.
    pub fn delete<T: Deletable>(&self, owner: IdentityToken, id: &str) -> Result<(), RecordError> {
        let id = Uuid::parse_str(id.trim()).map_err(|_| RecordError::NotFoundOrUnauthorized)?;

        let sql = format!("DELETE FROM {} WHERE id = ?1 AND user_id = ?2", T::TABLE);
        let rows_affected = self
            .db
            .lock()
            .execute(&sql, params![id.to_string(), owner.to_string()])?;

        if rows_affected == 0 {
            debug!("{} delete missed: {} for {}", T::LABEL, id, owner);
            return Err(RecordError::NotFoundOrUnauthorized);
        }

        info!("🗑️  Deleted {} {} for {}", T::LABEL, id, owner);
        Ok(())
    }

    /// Per-kind record counts for `owner`.
    pub fn summary(&self, owner: IdentityToken) -> Result<DashboardSummary, RecordError> {
        let conn = self.db.lock();
        let owner = owner.to_string();
        let count = |table: &str| -> rusqlite::Result<i64> {
            conn.query_row(
                &format!("SELECT COUNT(*) FROM {} WHERE user_id = ?1", table),
                params![owner],
                |row| row.get(0),
            )
        };

        Ok(DashboardSummary {
            classes: count("classes")?,
            teachers: count("teachers")?,
            students: count("students")?,
            attendance: count("attendance")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::models::{
        AttendanceDraft, AttendanceRecord, AttendanceStatus, ClassDraft, ClassRecord,
        StudentDraft, StudentRecord, TeacherDraft, TeacherRecord,
    };
    use serde_json::json;

    fn create_test_store() -> RecordStore {
        RecordStore::new(Database::in_memory().unwrap())
    }

    fn identity() -> IdentityToken {
        IdentityToken::new(Uuid::new_v4())
    }

    fn class_draft(name: &str, subject: &str) -> ClassDraft {
        ClassDraft {
            name: Some(name.to_string()),
            subject: Some(subject.to_string()),
        }
    }

    fn student_draft(name: &str, admission_no: &str, pct: serde_json::Value) -> StudentDraft {
        StudentDraft {
            name: Some(name.to_string()),
            admission_no: Some(admission_no.to_string()),
            class: Some("Nine".to_string()),
            attendance_percentage: Some(pct),
        }
    }

    #[test]
    fn test_records_partitioned_by_owner() {
        let store = create_test_store();
        let (a, b) = (identity(), identity());

        store
            .create::<ClassRecord>(a, class_draft("9A", "Maths"))
            .unwrap();
        store
            .create::<TeacherRecord>(
                a,
                TeacherDraft {
                    name: Some("Ms Doe".to_string()),
                    subject: Some("Maths".to_string()),
                },
            )
            .unwrap();

        assert_eq!(store.list::<ClassRecord>(a).unwrap().len(), 1);
        assert_eq!(store.list::<TeacherRecord>(a).unwrap().len(), 1);
        assert!(store.list::<ClassRecord>(b).unwrap().is_empty());
        assert!(store.list::<TeacherRecord>(b).unwrap().is_empty());
    }

    #[test]
    fn test_list_preserves_creation_order() {
        let store = create_test_store();
        let owner = identity();

        for name in ["9A", "9B", "9C"] {
            store
                .create::<ClassRecord>(owner, class_draft(name, "Maths"))
                .unwrap();
        }

        let names: Vec<String> = store
            .list::<ClassRecord>(owner)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["9A", "9B", "9C"]);
    }

    #[test]
    fn test_create_stamps_owner_and_fresh_id() {
        let store = create_test_store();
        let owner = identity();

        let first = store
            .create::<ClassRecord>(owner, class_draft("9A", "Maths"))
            .unwrap();
        let second = store
            .create::<ClassRecord>(owner, class_draft("9A", "Maths"))
            .unwrap();

        assert_eq!(first.user_id, owner);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_create_rejects_missing_fields() {
        let store = create_test_store();
        let owner = identity();

        let err = store
            .create::<ClassRecord>(
                owner,
                ClassDraft {
                    name: Some("9A".to_string()),
                    subject: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, RecordError::Validation(ref m) if m.contains("subject")));
        assert!(store.list::<ClassRecord>(owner).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_admission_number_rejected_across_owners() {
        let store = create_test_store();
        let (a, b) = (identity(), identity());

        let jon = store
            .create::<StudentRecord>(a, student_draft("Jon", "AMS001", json!(90)))
            .unwrap();
        assert_eq!(jon.user_id, a);
        assert_eq!(jon.attendance_percentage, 90.0);

        let same_owner = store.create::<StudentRecord>(a, student_draft("Jo", "AMS001", json!(10)));
        assert!(matches!(same_owner, Err(RecordError::Validation(_))));

        let other_owner =
            store.create::<StudentRecord>(b, student_draft("Jan", "AMS001", json!(10)));
        assert!(matches!(other_owner, Err(RecordError::Validation(_))));

        store
            .create::<StudentRecord>(a, student_draft("Ana", "AMS002", json!("75")))
            .unwrap();
        assert_eq!(store.list::<StudentRecord>(a).unwrap().len(), 2);
    }

    #[test]
    fn test_out_of_range_percentage_rejected() {
        let store = create_test_store();
        let owner = identity();

        for pct in [json!(-1), json!(101), json!("abc")] {
            let result =
                store.create::<StudentRecord>(owner, student_draft("Jon", "AMS001", pct));
            assert!(matches!(result, Err(RecordError::Validation(_))));
        }
        assert!(store.list::<StudentRecord>(owner).unwrap().is_empty());
    }

    #[test]
    fn test_delete_requires_ownership() {
        let store = create_test_store();
        let (a, b) = (identity(), identity());

        let class = store
            .create::<ClassRecord>(a, class_draft("9A", "Maths"))
            .unwrap();
        let id = class.id.to_string();

        let err = store.delete::<ClassRecord>(b, &id).unwrap_err();
        assert!(matches!(err, RecordError::NotFoundOrUnauthorized));
        assert_eq!(store.list::<ClassRecord>(a).unwrap().len(), 1);

        store.delete::<ClassRecord>(a, &id).unwrap();
        assert!(store.list::<ClassRecord>(a).unwrap().is_empty());

        // Second delete of the same record
        let err = store.delete::<ClassRecord>(a, &id).unwrap_err();
        assert!(matches!(err, RecordError::NotFoundOrUnauthorized));
    }

    #[test]
    fn test_delete_with_malformed_id_is_not_found() {
        let store = create_test_store();
        let err = store
            .delete::<StudentRecord>(identity(), "64b7f0c2e4b0a1a2b3c4d5e6")
            .unwrap_err();
        assert!(matches!(err, RecordError::NotFoundOrUnauthorized));
    }

    #[test]
    fn test_delete_is_scoped_to_kind() {
        let store = create_test_store();
        let owner = identity();

        let class = store
            .create::<ClassRecord>(owner, class_draft("9A", "Maths"))
            .unwrap();
        let err = store
            .delete::<TeacherRecord>(owner, &class.id.to_string())
            .unwrap_err();
        assert!(matches!(err, RecordError::NotFoundOrUnauthorized));
        assert_eq!(store.list::<ClassRecord>(owner).unwrap().len(), 1);
    }

    #[test]
    fn test_attendance_joins_student_and_tolerates_orphans() {
        let store = create_test_store();
        let owner = identity();

        let jon = store
            .create::<StudentRecord>(owner, student_draft("Jon", "AMS001", json!(90)))
            .unwrap();
        let mark = store
            .create::<AttendanceRecord>(
                owner,
                AttendanceDraft {
                    student_id: Some(jon.id.to_string()),
                    status: Some("Present".to_string()),
                    date: None,
                },
            )
            .unwrap();
        assert_eq!(mark.status, AttendanceStatus::Present);
        assert_eq!(mark.user_id, owner);

        let entries = store.list::<AttendanceRecord>(owner).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].record, mark);
        assert_eq!(entries[0].student.as_ref(), Some(&jon));

        // No cascade: the attendance row survives with an unresolved student.
        store
            .delete::<StudentRecord>(owner, &jon.id.to_string())
            .unwrap();
        let entries = store.list::<AttendanceRecord>(owner).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].student.is_none());
    }

    #[test]
    fn test_attendance_rejects_bad_status_and_foreign_students() {
        let store = create_test_store();
        let (a, b) = (identity(), identity());

        let jon = store
            .create::<StudentRecord>(a, student_draft("Jon", "AMS001", json!(90)))
            .unwrap();

        let bad_status = store.create::<AttendanceRecord>(
            a,
            AttendanceDraft {
                student_id: Some(jon.id.to_string()),
                status: Some("Late".to_string()),
                date: None,
            },
        );
        assert!(matches!(bad_status, Err(RecordError::Validation(_))));

        let foreign = store.create::<AttendanceRecord>(
            b,
            AttendanceDraft {
                student_id: Some(jon.id.to_string()),
                status: Some("Absent".to_string()),
                date: None,
            },
        );
        assert!(matches!(foreign, Err(RecordError::Validation(_))));

        let unknown = store.create::<AttendanceRecord>(
            a,
            AttendanceDraft {
                student_id: Some(Uuid::new_v4().to_string()),
                status: Some("Absent".to_string()),
                date: None,
            },
        );
        assert!(matches!(unknown, Err(RecordError::Validation(_))));

        assert!(store.list::<AttendanceRecord>(a).unwrap().is_empty());
        assert!(store.list::<AttendanceRecord>(b).unwrap().is_empty());
    }

    #[test]
    fn test_attendance_keeps_supplied_date() {
        let store = create_test_store();
        let owner = identity();
        let jon = store
            .create::<StudentRecord>(owner, student_draft("Jon", "AMS001", json!(90)))
            .unwrap();

        store
            .create::<AttendanceRecord>(
                owner,
                AttendanceDraft {
                    student_id: Some(jon.id.to_string()),
                    status: Some("Absent".to_string()),
                    date: Some("2025-02-03T09:00:00Z".to_string()),
                },
            )
            .unwrap();

        let entries = store.list::<AttendanceRecord>(owner).unwrap();
        assert_eq!(entries[0].record.date.to_rfc3339(), "2025-02-03T09:00:00+00:00");
    }

    #[test]
    fn test_summary_counts_only_owned_records() {
        let store = create_test_store();
        let (a, b) = (identity(), identity());

        store
            .create::<ClassRecord>(a, class_draft("9A", "Maths"))
            .unwrap();
        store
            .create::<ClassRecord>(a, class_draft("9B", "Physics"))
            .unwrap();
        store
            .create::<StudentRecord>(b, student_draft("Jon", "AMS001", json!(90)))
            .unwrap();

        let summary_a = store.summary(a).unwrap();
        assert_eq!(
            summary_a,
            DashboardSummary {
                classes: 2,
                teachers: 0,
                students: 0,
                attendance: 0,
            }
        );
        assert_eq!(store.summary(b).unwrap().students, 1);
    }
}
