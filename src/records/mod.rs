//! Records Module
//! Mission: Classes, teachers, students and attendance, each scoped to one identity

pub mod api;
pub mod kinds;
pub mod models;
pub mod store;

pub use api::{records_router, RecordState};
pub use kinds::{Deletable, OwnedRecord};
pub use models::{
    AttendanceEntry, AttendanceRecord, AttendanceStatus, ClassRecord, DashboardSummary,
    StudentRecord, TeacherRecord,
};
pub use store::{RecordError, RecordStore};
