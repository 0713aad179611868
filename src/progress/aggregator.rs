use super::{ProgressionRules, is_completed};
use crate::model::content::{Course, Material, Module};
use crate::model::profile::User;
use crate::progress::engine::active_positions;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CourseTotals {
    pub total_active_lessons: usize,
    pub completed_active_lessons: usize,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CohortStats {
    pub total: usize,
    pub active: usize,
    pub avg_progress_percent: u32,
    pub total_xp: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CompletedLessonSummary {
    pub lesson_id: String,
    pub lesson_title: String,
    pub module_title: String,
}

/// Counts only lessons that are active inside an active module. Completions
/// that point at deactivated or deleted content drop out of both sides.
pub fn course_totals(course: &Course, completed: &[String]) -> CourseTotals {
    active_positions(course).fold(CourseTotals::default(), |mut totals, (_, _, lesson)| {
        totals.total_active_lessons += 1;
        if is_completed(completed, &lesson.id) {
            totals.completed_active_lessons += 1;
        }
        totals
    })
}

pub fn course_progress_percent(course: &Course, completed: &[String]) -> u8 {
    let totals = course_totals(course, completed);
    if totals.total_active_lessons == 0 {
        return 0;
    }
    let ratio = totals.completed_active_lessons as f64 / totals.total_active_lessons as f64;
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Level 1 at zero XP, one more level per `xp_per_level` points.
pub fn compute_level(points: u32, rules: &ProgressionRules) -> u32 {
    points / rules.level_step() + 1
}

/// How far the learner is into the current level, in `0.0..1.0`.
pub fn level_progress_fraction(points: u32, rules: &ProgressionRules) -> f64 {
    let step = rules.level_step();
    (points % step) as f64 / step as f64
}

pub fn aggregate_cohort_stats(users: &[User]) -> CohortStats {
    if users.is_empty() {
        return CohortStats::default();
    }

    let active = users.iter().filter(|u| u.is_active).count();
    let total_xp = users.iter().map(|u| u64::from(u.points)).sum();
    let progress_sum: u64 = users.iter().map(|u| u64::from(u.progress)).sum();
    let avg_progress_percent = (progress_sum as f64 / users.len() as f64).round() as u32;

    CohortStats {
        total: users.len(),
        active,
        avg_progress_percent,
        total_xp,
    }
}

/// Every material of every lesson in lesson order. Duplicates are kept.
pub fn collect_module_materials(module: &Module) -> Vec<Material> {
    module
        .lessons
        .iter()
        .flat_map(|lesson| lesson.materials.iter().cloned())
        .collect()
}

/// Completed lessons in course order, for the profile activity list.
pub fn completed_lesson_details(
    course: &Course,
    completed: &[String],
    limit: usize,
) -> Vec<CompletedLessonSummary> {
    course
        .modules
        .iter()
        .flat_map(|module| {
            module
                .lessons
                .iter()
                .filter(|lesson| is_completed(completed, &lesson.id))
                .map(move |lesson| CompletedLessonSummary {
                    lesson_id: lesson.id.clone(),
                    lesson_title: lesson.title.clone(),
                    module_title: module.title.clone(),
                })
        })
        .take(limit)
        .collect()
}
