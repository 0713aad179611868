use super::{LessonPosition, ProgressionRules, is_completed};
use crate::model::content::{Course, Lesson, Module, Quiz};
use crate::model::profile::User;
use crate::progress::aggregator::{compute_level, course_progress_percent};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a student may not open a lesson.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NavigationRejected {
    LessonNotFound,
    LessonInactive,
    ModuleLocked,
    PreviousLessonIncomplete,
    PreviousModuleIncomplete,
}

impl fmt::Display for NavigationRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            NavigationRejected::LessonNotFound => "lesson not found",
            NavigationRejected::LessonInactive => "lesson is not available",
            NavigationRejected::ModuleLocked => "module is locked by the coordinator",
            NavigationRejected::PreviousLessonIncomplete => {
                "previous lesson incomplete: answer its quiz correctly first"
            }
            NavigationRejected::PreviousModuleIncomplete => {
                "previous module incomplete: finish all of its lessons first"
            }
        };
        f.write_str(message)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuizOutcome {
    Correct,
    Incorrect,
    /// The lesson was already passed; the question accepts no further picks.
    AlreadyAnswered,
    UnknownOption,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LessonCompletion {
    pub user: User,
    pub newly_completed: bool,
    pub points_awarded: u32,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct LessonOutline {
    pub lesson_index: usize,
    pub id: String,
    pub title: String,
    pub duration: String,
    pub is_active: bool,
    pub completed: bool,
    pub locked: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModuleOutline {
    pub module_index: usize,
    pub id: String,
    pub title: String,
    pub description: String,
    pub is_locked: bool,
    pub is_active: bool,
    pub lessons: Vec<LessonOutline>,
}

/// Active lessons in course order. Inactive modules and lessons never take part in sequencing.
pub(crate) fn active_positions(
    course: &Course,
) -> impl Iterator<Item = (LessonPosition, &Module, &Lesson)> {
    course
        .modules
        .iter()
        .enumerate()
        .filter(|(_, module)| module.is_active)
        .flat_map(|(m_idx, module)| {
            module
                .lessons
                .iter()
                .enumerate()
                .filter(|(_, lesson)| lesson.is_active)
                .map(move |(l_idx, lesson)| (LessonPosition::new(m_idx, l_idx), module, lesson))
        })
}

fn previous_active(course: &Course, target: LessonPosition) -> Option<(LessonPosition, &Lesson)> {
    active_positions(course)
        .take_while(|(pos, _, _)| *pos < target)
        .last()
        .map(|(pos, _, lesson)| (pos, lesson))
}

/// Decides whether the lesson at the given indices may be opened.
///
/// The prerequisite of a lesson is the nearest active lesson before it, which
/// may sit in an earlier module. A locked module blocks all of its lessons no
/// matter what has been completed.
pub fn request_navigation(
    course: &Course,
    completed: &[String],
    module_index: usize,
    lesson_index: usize,
) -> Result<LessonPosition, NavigationRejected> {
    let module = course
        .modules
        .get(module_index)
        .ok_or(NavigationRejected::LessonNotFound)?;
    let lesson = module
        .lessons
        .get(lesson_index)
        .ok_or(NavigationRejected::LessonNotFound)?;

    if !module.is_active || !lesson.is_active {
        return Err(NavigationRejected::LessonInactive);
    }
    if module.is_locked {
        return Err(NavigationRejected::ModuleLocked);
    }

    let target = LessonPosition::new(module_index, lesson_index);
    match previous_active(course, target) {
        None => Ok(target),
        Some((_, prev)) if is_completed(completed, &prev.id) => Ok(target),
        Some((prev_pos, _)) if prev_pos.module_index == module_index => {
            Err(NavigationRejected::PreviousLessonIncomplete)
        }
        Some(_) => Err(NavigationRejected::PreviousModuleIncomplete),
    }
}

pub fn is_lesson_unlocked(
    course: &Course,
    completed: &[String],
    module_index: usize,
    lesson_index: usize,
) -> bool {
    request_navigation(course, completed, module_index, lesson_index).is_ok()
}

/// First active lesson not yet completed. A finished course resumes at its
/// last active lesson; `None` means there is nothing to study.
pub fn find_resume_point(course: &Course, completed: &[String]) -> Option<LessonPosition> {
    let mut last = None;
    for (pos, _, lesson) in active_positions(course) {
        if !is_completed(completed, &lesson.id) {
            return Some(pos);
        }
        last = Some(pos);
    }
    last
}

/// The active lesson following `current`, crossing into later modules.
pub fn next_lesson_position(course: &Course, current: LessonPosition) -> Option<LessonPosition> {
    active_positions(course)
        .map(|(pos, _, _)| pos)
        .find(|pos| *pos > current)
}

pub fn is_certificate_available(course: &Course, completed: &[String]) -> bool {
    let Some(resume) = find_resume_point(course, completed) else {
        return false;
    };
    let Some((last, _, last_lesson)) = active_positions(course).last() else {
        return false;
    };
    resume == last && is_completed(completed, &last_lesson.id)
}

/// Records a lesson as passed. Calling it again for the same lesson is a no-op.
pub fn complete_lesson(
    user: &User,
    lesson_id: &str,
    course: &Course,
    rules: &ProgressionRules,
) -> LessonCompletion {
    if user.has_completed(lesson_id) {
        return LessonCompletion {
            user: user.clone(),
            newly_completed: false,
            points_awarded: 0,
        };
    }

    let mut updated = user.clone();
    updated.completed_lessons.push(lesson_id.to_string());
    updated.points = updated.points.saturating_add(rules.xp_per_lesson);
    refresh_derived(&mut updated, course, rules);

    LessonCompletion {
        user: updated,
        newly_completed: true,
        points_awarded: rules.xp_per_lesson,
    }
}

/// Rewrites the cached `progress` and `level` from the completion list and points.
pub fn refresh_derived(user: &mut User, course: &Course, rules: &ProgressionRules) {
    user.progress = course_progress_percent(course, &user.completed_lessons);
    user.level = compute_level(user.points, rules);
}

pub fn evaluate_quiz_answer(quiz: &Quiz, option_id: &str, already_completed: bool) -> QuizOutcome {
    if already_completed {
        return QuizOutcome::AlreadyAnswered;
    }
    if !quiz.options.iter().any(|o| o.id == option_id) {
        return QuizOutcome::UnknownOption;
    }
    match quiz.correct_option() {
        Some(correct) if correct.id == option_id => QuizOutcome::Correct,
        _ => QuizOutcome::Incorrect,
    }
}

/// Sidebar view of the course. Students get only active content; coordinators
/// previewing the course can ask for everything.
pub fn course_outline(
    course: &Course,
    completed: &[String],
    include_inactive: bool,
) -> Vec<ModuleOutline> {
    course
        .modules
        .iter()
        .enumerate()
        .filter(|(_, module)| include_inactive || module.is_active)
        .map(|(m_idx, module)| ModuleOutline {
            module_index: m_idx,
            id: module.id.clone(),
            title: module.title.clone(),
            description: module.description.clone(),
            is_locked: module.is_locked,
            is_active: module.is_active,
            lessons: module
                .lessons
                .iter()
                .enumerate()
                .filter(|(_, lesson)| include_inactive || lesson.is_active)
                .map(|(l_idx, lesson)| LessonOutline {
                    lesson_index: l_idx,
                    id: lesson.id.clone(),
                    title: lesson.title.clone(),
                    duration: lesson.duration.clone(),
                    is_active: lesson.is_active,
                    completed: is_completed(completed, &lesson.id),
                    locked: !is_lesson_unlocked(course, completed, m_idx, l_idx),
                })
                .collect(),
        })
        .collect()
}
