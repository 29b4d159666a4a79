//! Record Kinds
//! Mission: The per-kind half of the ownership-filtered CRUD contract
//!
//! Each kind knows its table, how to validate a create payload into a stamped record,
//! how to insert it, and how to list an owner's rows. [`RecordStore`](super::RecordStore)
//! supplies the generic half: locking, ownership-checked delete, error mapping.

use crate::auth::IdentityToken;
use crate::db::uuid_column;
use crate::records::models::{
    parse_date, parse_percentage, required_text, AttendanceDraft, AttendanceEntry,
    AttendanceRecord, AttendanceStatus, ClassDraft, ClassRecord, StudentDraft, StudentRecord,
    TeacherDraft, TeacherRecord, ValidationError,
};
use crate::records::store::RecordError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

/// A record kind owned by exactly one identity.
pub trait OwnedRecord: Serialize + Send + Sync + Sized + 'static {
    /// Create payload as sent by the client
    type Draft: DeserializeOwned + Send + 'static;
    /// What a listing returns per row
    type Listing: Serialize + Send + 'static;

    /// Human-readable kind name used in messages
    const LABEL: &'static str;
    const TABLE: &'static str;

    fn id(&self) -> Uuid;

    /// Validate a payload into a record with a fresh id, stamped with `owner`.
    ///
    /// Runs under the store lock, so lookups here see the same state the insert will.
    fn from_draft(
        draft: Self::Draft,
        owner: IdentityToken,
        conn: &Connection,
    ) -> Result<Self, RecordError>;

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()>;

    /// All rows owned by `owner`, in creation order.
    fn list(conn: &Connection, owner: IdentityToken) -> rusqlite::Result<Vec<Self::Listing>>;
}

/// Kinds that support ownership-checked delete.
pub trait Deletable: OwnedRecord {}

fn owner_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<IdentityToken> {
    uuid_column(row, idx).map(IdentityToken::new)
}

fn query_owned<T>(
    conn: &Connection,
    sql: &str,
    owner: IdentityToken,
    map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
) -> rusqlite::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params![owner.to_string()], map)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Class
// ---------------------------------------------------------------------------

impl OwnedRecord for ClassRecord {
    type Draft = ClassDraft;
    type Listing = ClassRecord;

    const LABEL: &'static str = "Class";
    const TABLE: &'static str = "classes";

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_draft(
        draft: ClassDraft,
        owner: IdentityToken,
        _conn: &Connection,
    ) -> Result<Self, RecordError> {
        Ok(ClassRecord {
            id: Uuid::new_v4(),
            name: required_text("name", draft.name)?,
            subject: required_text("subject", draft.subject)?,
            user_id: owner,
        })
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO classes (id, name, subject, user_id) VALUES (?1, ?2, ?3, ?4)",
            params![
                self.id.to_string(),
                self.name,
                self.subject,
                self.user_id.to_string()
            ],
        )?;
        Ok(())
    }

    fn list(conn: &Connection, owner: IdentityToken) -> rusqlite::Result<Vec<ClassRecord>> {
        query_owned(
            conn,
            "SELECT id, name, subject, user_id FROM classes WHERE user_id = ?1 ORDER BY rowid",
            owner,
            |row| {
                Ok(ClassRecord {
                    id: uuid_column(row, 0)?,
                    name: row.get(1)?,
                    subject: row.get(2)?,
                    user_id: owner_column(row, 3)?,
                })
            },
        )
    }
}

impl Deletable for ClassRecord {}

// ---------------------------------------------------------------------------
// Teacher
// ---------------------------------------------------------------------------

impl OwnedRecord for TeacherRecord {
    type Draft = TeacherDraft;
    type Listing = TeacherRecord;

    const LABEL: &'static str = "Teacher";
    const TABLE: &'static str = "teachers";

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_draft(
        draft: TeacherDraft,
        owner: IdentityToken,
        _conn: &Connection,
    ) -> Result<Self, RecordError> {
        Ok(TeacherRecord {
            id: Uuid::new_v4(),
            name: required_text("name", draft.name)?,
            subject: required_text("subject", draft.subject)?,
            user_id: owner,
        })
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO teachers (id, name, subject, user_id) VALUES (?1, ?2, ?3, ?4)",
            params![
                self.id.to_string(),
                self.name,
                self.subject,
                self.user_id.to_string()
            ],
        )?;
        Ok(())
    }

    fn list(conn: &Connection, owner: IdentityToken) -> rusqlite::Result<Vec<TeacherRecord>> {
        query_owned(
            conn,
            "SELECT id, name, subject, user_id FROM teachers WHERE user_id = ?1 ORDER BY rowid",
            owner,
            |row| {
                Ok(TeacherRecord {
                    id: uuid_column(row, 0)?,
                    name: row.get(1)?,
                    subject: row.get(2)?,
                    user_id: owner_column(row, 3)?,
                })
            },
        )
    }
}

impl Deletable for TeacherRecord {}

// ---------------------------------------------------------------------------
// Student
// ---------------------------------------------------------------------------

fn student_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<StudentRecord> {
    Ok(StudentRecord {
        id: uuid_column(row, offset)?,
        name: row.get(offset + 1)?,
        admission_no: row.get(offset + 2)?,
        class_label: row.get(offset + 3)?,
        attendance_percentage: row.get(offset + 4)?,
        user_id: owner_column(row, offset + 5)?,
    })
}

impl OwnedRecord for StudentRecord {
    type Draft = StudentDraft;
    type Listing = StudentRecord;

    const LABEL: &'static str = "Student";
    const TABLE: &'static str = "students";

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_draft(
        draft: StudentDraft,
        owner: IdentityToken,
        conn: &Connection,
    ) -> Result<Self, RecordError> {
        let name = required_text("name", draft.name)?;
        let admission_no = required_text("admissionNo", draft.admission_no)?;
        let class_label = required_text("class", draft.class)?;
        let attendance_percentage = parse_percentage(draft.attendance_percentage)?;

        // Admission numbers are unique across every identity, not just the caller's.
        let taken = conn
            .query_row(
                "SELECT 1 FROM students WHERE admission_no = ?1",
                params![admission_no],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if taken {
            return Err(RecordError::Validation(format!(
                "admissionNo '{}' already exists",
                admission_no
            )));
        }

        Ok(StudentRecord {
            id: Uuid::new_v4(),
            name,
            admission_no,
            class_label,
            attendance_percentage,
            user_id: owner,
        })
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO students (id, name, admission_no, class_label, attendance_percentage, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                self.id.to_string(),
                self.name,
                self.admission_no,
                self.class_label,
                self.attendance_percentage,
                self.user_id.to_string()
            ],
        )?;
        Ok(())
    }

    fn list(conn: &Connection, owner: IdentityToken) -> rusqlite::Result<Vec<StudentRecord>> {
        query_owned(
            conn,
            "SELECT id, name, admission_no, class_label, attendance_percentage, user_id
             FROM students WHERE user_id = ?1 ORDER BY rowid",
            owner,
            |row| student_from_row(row, 0),
        )
    }
}

impl Deletable for StudentRecord {}

// ---------------------------------------------------------------------------
// Attendance (create + list only)
// ---------------------------------------------------------------------------

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn status_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<AttendanceStatus> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e: ValidationError| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

impl OwnedRecord for AttendanceRecord {
    type Draft = AttendanceDraft;
    type Listing = AttendanceEntry;

    const LABEL: &'static str = "Attendance";
    const TABLE: &'static str = "attendance";

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_draft(
        draft: AttendanceDraft,
        owner: IdentityToken,
        conn: &Connection,
    ) -> Result<Self, RecordError> {
        let raw_student = required_text("studentId", draft.student_id)?;
        let student_id = Uuid::parse_str(&raw_student).map_err(|_| {
            RecordError::Validation(format!(
                "studentId '{}' is not a valid identifier",
                raw_student
            ))
        })?;
        let status: AttendanceStatus = required_text("status", draft.status)?.parse()?;
        let date = parse_date(draft.date)?;

        let owned_student = conn
            .query_row(
                "SELECT 1 FROM students WHERE id = ?1 AND user_id = ?2",
                params![student_id.to_string(), owner.to_string()],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !owned_student {
            return Err(RecordError::Validation(format!(
                "studentId '{}' does not reference one of your students",
                student_id
            )));
        }

        Ok(AttendanceRecord {
            id: Uuid::new_v4(),
            student_id,
            date,
            status,
            user_id: owner,
        })
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO attendance (id, student_id, date, status, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                self.id.to_string(),
                self.student_id.to_string(),
                self.date.to_rfc3339(),
                self.status.as_str(),
                self.user_id.to_string()
            ],
        )?;
        Ok(())
    }

    fn list(conn: &Connection, owner: IdentityToken) -> rusqlite::Result<Vec<AttendanceEntry>> {
        // The join repeats the owner predicate so a student never leaks across identities.
        query_owned(
            conn,
            "SELECT a.id, a.student_id, a.date, a.status, a.user_id,
                    s.id, s.name, s.admission_no, s.class_label, s.attendance_percentage, s.user_id
             FROM attendance a
             LEFT JOIN students s ON s.id = a.student_id AND s.user_id = a.user_id
             WHERE a.user_id = ?1
             ORDER BY a.rowid",
            owner,
            |row| {
                let record = AttendanceRecord {
                    id: uuid_column(row, 0)?,
                    student_id: uuid_column(row, 1)?,
                    date: date_column(row, 2)?,
                    status: status_column(row, 3)?,
                    user_id: owner_column(row, 4)?,
                };
                let student = match row.get::<_, Option<String>>(5)? {
                    Some(_) => Some(student_from_row(row, 5)?),
                    None => None,
                };
                Ok(AttendanceEntry { record, student })
            },
        )
    }
}
