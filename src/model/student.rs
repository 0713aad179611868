use crate::model::content::{CertificateConfig, Lesson, Material};
use crate::model::profile::User;
use crate::progress::{
    CompletedLessonSummary, LessonPosition, ModuleOutline, NavigationRejected, QuizOutcome,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether the store has caught up with a locally applied change.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum SyncStatus {
    Synced,
    /// The change is kept locally and retried on the next profile load.
    Failed(String),
    /// Nothing had to be written.
    Unchanged,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct CourseOutlineResponse {
    pub course_id: String,
    pub course_title: String,
    pub cover_url: Option<String>,
    pub modules: Vec<ModuleOutline>,
    pub resume_point: Option<LessonPosition>,
    pub progress: u8,
}

/// Quiz option as shown to students. The correct flag never leaves the server.
#[derive(Deserialize, Serialize, Debug, PartialEq)]
pub struct QuizOptionView {
    pub id: String,
    pub text: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct QuizView {
    pub id: String,
    pub question: String,
    pub options: Vec<QuizOptionView>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct LessonView {
    pub position: LessonPosition,
    pub id: String,
    pub module_title: String,
    pub title: String,
    pub description: String,
    pub video_id: String,
    pub duration: String,
    pub content: String,
    pub materials: Vec<Material>,
    pub quiz: QuizView,
    // calculated fields
    pub completed: bool,
    pub next_position: Option<LessonPosition>,
}

impl LessonView {
    pub fn new(
        position: LessonPosition,
        module_title: &str,
        lesson: &Lesson,
        completed: bool,
        next_position: Option<LessonPosition>,
    ) -> Self {
        LessonView {
            position,
            id: lesson.id.clone(),
            module_title: module_title.to_string(),
            title: lesson.title.clone(),
            description: lesson.description.clone(),
            video_id: lesson.video_id.clone(),
            duration: lesson.duration.clone(),
            content: lesson.content.clone(),
            materials: lesson.materials.clone(),
            quiz: QuizView {
                id: lesson.quiz.id.clone(),
                question: lesson.quiz.question.clone(),
                options: lesson
                    .quiz
                    .options
                    .iter()
                    .map(|o| QuizOptionView {
                        id: o.id.clone(),
                        text: o.text.clone(),
                    })
                    .collect(),
            },
            completed,
            next_position,
        }
    }
}

#[derive(Deserialize, Serialize, Debug)]
pub struct NavigationResponse {
    pub accepted: bool,
    pub position: Option<LessonPosition>,
    pub reason: Option<NavigationRejected>,
    pub message: Option<String>,
}

impl NavigationResponse {
    pub fn from_result(result: Result<LessonPosition, NavigationRejected>) -> Self {
        match result {
            Ok(position) => NavigationResponse {
                accepted: true,
                position: Some(position),
                reason: None,
                message: None,
            },
            Err(reason) => NavigationResponse {
                accepted: false,
                position: None,
                reason: Some(reason),
                message: Some(reason.to_string()),
            },
        }
    }
}

#[derive(Deserialize, Serialize, Debug)]
pub struct ResumePointResponse {
    pub position: Option<LessonPosition>,
    pub lesson_id: Option<String>,
    pub course_finished: bool,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct QuizAnswerResponse {
    pub outcome: QuizOutcome,
    pub lesson_completed: bool,
    pub points_awarded: u32,
    pub points: u32,
    pub level: u32,
    pub progress: u8,
    pub next_position: Option<LessonPosition>,
    pub certificate_available: bool,
    pub sync: SyncStatus,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct DashboardResponse {
    pub user_name: String,
    pub course_title: String,
    pub progress: u8,
    pub points: u32,
    pub level: u32,
    pub level_progress: f64,
    pub xp_to_next_level: u32,
    pub total_lessons: usize,
    pub completed_lessons: usize,
    pub badges: Vec<String>,
    pub resume_point: Option<LessonPosition>,
    pub certificate_available: bool,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct ModuleMaterialsResponse {
    pub module_id: String,
    pub module_title: String,
    pub materials: Vec<Material>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct ProfileResponse {
    pub user: User,
    pub level_progress: f64,
    pub recent_lessons: Vec<CompletedLessonSummary>,
    pub certificate_available: bool,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct CertificateResponse {
    pub student_name: String,
    pub course_title: String,
    pub completion_date: DateTime<Utc>,
    pub certificate_config: CertificateConfig,
}
