use crate::availability::WorkerAvailability;
use crate::slots::{Day, Priority, TimeSlot, check_hour};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkType {
    pub id: String,
    pub employer_id: String,
    pub name: String,
    pub hourly_wage: i64,
    pub is_active: bool,
    pub time_slots: Vec<TimeSlot>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct WorkTypeRow {
    pub id: String,
    pub employer_id: String,
    pub name: String,
    pub hourly_wage: i64,
    pub is_active: bool,
    pub time_slots: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<WorkTypeRow> for WorkType {
    fn from(row: WorkTypeRow) -> Self {
        let time_slots = serde_json::from_str(&row.time_slots).unwrap_or_else(|e| {
            tracing::warn!(work_type = %row.id, error = %e, "unreadable time slots, treating as empty");
            Vec::new()
        });
        WorkType {
            id: row.id,
            employer_id: row.employer_id,
            name: row.name,
            hourly_wage: row.hourly_wage,
            is_active: row.is_active,
            time_slots,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkType {
    pub name: String,
    #[serde(default)]
    pub hourly_wage: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub time_slots: Vec<TimeSlot>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkTypePatch {
    pub name: Option<String>,
    pub hourly_wage: Option<i64>,
    pub is_active: Option<bool>,
    pub time_slots: Option<Vec<TimeSlot>>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobPost {
    pub id: String,
    pub employer_id: String,
    pub title: String,
    pub description: Option<String>,
    pub work_type_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJobPost {
    pub title: String,
    pub description: Option<String>,
    pub work_type_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPostPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub work_type_id: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct AvailabilityRow {
    pub id: String,
    pub worker_id: String,
    pub day: i64,
    pub hour: i64,
    pub priority: i64,
}

impl AvailabilityRow {
    /// `None` for rows whose day, hour or priority is out of range.
    pub fn to_record(&self) -> Option<WorkerAvailability> {
        let parsed = Day::new(self.day).and_then(|day| {
            Ok(WorkerAvailability {
                day,
                hour: check_hour(self.hour)?,
                priority: Priority::try_from(self.priority)?,
            })
        });
        match parsed {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(row = %self.id, worker = %self.worker_id, error = %e, "skipping malformed availability row");
                None
            }
        }
    }
}
