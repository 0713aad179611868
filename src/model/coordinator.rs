use crate::model::content::Course;
use crate::model::profile::{Role, User};
use crate::progress::{CohortStats, ModuleOutline};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug)]
pub struct CohortStatsResponse {
    #[serde(flatten)]
    pub stats: CohortStats,
    pub course_active_lessons: usize,
}

#[derive(Deserialize, Serialize, Debug, PartialEq)]
pub struct StudentSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub progress: u8,
    pub points: u32,
    pub level: u32,
    pub completed_lessons: usize,
    pub last_access: Option<DateTime<Utc>>,
}

impl From<&User> for StudentSummary {
    fn from(user: &User) -> Self {
        StudentSummary {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            is_active: user.is_active,
            progress: user.progress,
            points: user.points,
            level: user.level,
            completed_lessons: user.completed_lessons.len(),
            last_access: user.last_access,
        }
    }
}

/// Editor view: the full tree, inactive content included, plus how it would
/// look to a student with nothing completed.
#[derive(Deserialize, Serialize, Debug)]
pub struct CourseAdminView {
    pub course: Course,
    pub outline_preview: Vec<ModuleOutline>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct CreatedId {
    pub id: String,
}
