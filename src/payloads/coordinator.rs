use crate::model::content::{CertificateConfig, MaterialKind};
use crate::model::profile::Role;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CoordinatorCourseParams {
    pub coordinator_id: String,
    pub course_id: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ListStudentsParams {
    pub coordinator_id: String,
    /// Case-insensitive match on name or email.
    pub search: Option<String>,
    #[serde(default)]
    pub only_active: bool,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CreateUserPayload {
    pub coordinator_id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    pub avatar_url: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SetUserActivePayload {
    pub coordinator_id: String,
    pub user_id: String,
    pub active: bool,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UpsertModulePayload {
    pub coordinator_id: String,
    pub course_id: String,
    /// Absent for a new module.
    pub module_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct DeleteModulePayload {
    pub coordinator_id: String,
    pub course_id: String,
    pub module_id: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MoveModulePayload {
    pub coordinator_id: String,
    pub course_id: String,
    pub from_index: usize,
    pub to_index: usize,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SetModuleActivePayload {
    pub coordinator_id: String,
    pub course_id: String,
    pub module_id: String,
    pub active: bool,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MaterialDraft {
    pub id: Option<String>,
    pub title: String,
    pub url: String,
    #[serde(rename = "type", default)]
    pub kind: MaterialKind,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct QuizOptionDraft {
    pub id: Option<String>,
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct QuizDraft {
    pub question: String,
    pub options: Vec<QuizOptionDraft>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UpsertLessonPayload {
    pub coordinator_id: String,
    pub course_id: String,
    pub module_id: String,
    /// Absent for a new lesson.
    pub lesson_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub video_id: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub materials: Vec<MaterialDraft>,
    pub quiz: QuizDraft,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct DeleteLessonPayload {
    pub coordinator_id: String,
    pub course_id: String,
    pub lesson_id: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MoveLessonPayload {
    pub coordinator_id: String,
    pub course_id: String,
    pub module_id: String,
    pub from_index: usize,
    pub to_index: usize,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SetLessonActivePayload {
    pub coordinator_id: String,
    pub course_id: String,
    pub lesson_id: String,
    pub active: bool,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SetCorrectOptionPayload {
    pub coordinator_id: String,
    pub course_id: String,
    pub lesson_id: String,
    pub option_id: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UpdateCertificatePayload {
    pub coordinator_id: String,
    pub course_id: String,
    pub certificate_config: CertificateConfig,
}
