use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct CourseUserParams {
    pub course_id: String,
    pub user_id: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct GetLessonParams {
    pub course_id: String,
    pub user_id: String,
    pub module_index: usize,
    pub lesson_index: usize,
}

/// Used by both `navigate` and `next_lesson`; for the latter the indices are
/// the lesson the student is currently on.
#[derive(Serialize, Deserialize, Debug)]
pub struct NavigatePayload {
    pub course_id: String,
    pub user_id: String,
    pub module_index: usize,
    pub lesson_index: usize,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AnswerQuizPayload {
    pub course_id: String,
    pub user_id: String,
    pub lesson_id: String,
    pub option_id: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ModuleMaterialsParams {
    pub course_id: String,
    pub module_id: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UpdateProfilePayload {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}
