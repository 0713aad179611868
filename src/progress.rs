//! Lesson progression and derived statistics.
//!
//! Everything in here is a pure function over a read-only course snapshot and
//! a completion list. Handlers and tests call these directly; nothing else in
//! the crate decides whether a lesson is open.

use serde::{Deserialize, Serialize};

mod aggregator;
mod engine;

pub use aggregator::{
    CohortStats, CompletedLessonSummary, CourseTotals, aggregate_cohort_stats,
    collect_module_materials, completed_lesson_details, compute_level, course_progress_percent,
    course_totals, level_progress_fraction,
};
pub use engine::{
    LessonCompletion, LessonOutline, ModuleOutline, NavigationRejected, QuizOutcome,
    complete_lesson, course_outline, evaluate_quiz_answer, find_resume_point,
    is_certificate_available, is_lesson_unlocked, next_lesson_position, refresh_derived,
    request_navigation,
};

pub const DEFAULT_XP_PER_LESSON: u32 = 50;
pub const DEFAULT_XP_PER_LEVEL: u32 = 400;

/// XP tuning. Levels advance one step every `xp_per_level` points.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressionRules {
    pub xp_per_lesson: u32,
    pub xp_per_level: u32,
}

impl Default for ProgressionRules {
    fn default() -> Self {
        ProgressionRules {
            xp_per_lesson: DEFAULT_XP_PER_LESSON,
            xp_per_level: DEFAULT_XP_PER_LEVEL,
        }
    }
}

impl ProgressionRules {
    // zero would make every level function divide by zero
    pub(crate) fn level_step(&self) -> u32 {
        self.xp_per_level.max(1)
    }
}

/// Coordinates of a lesson inside a course tree, ordered module-major.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LessonPosition {
    pub module_index: usize,
    pub lesson_index: usize,
}

impl LessonPosition {
    pub fn new(module_index: usize, lesson_index: usize) -> Self {
        LessonPosition {
            module_index,
            lesson_index,
        }
    }
}

pub(crate) fn is_completed(completed: &[String], lesson_id: &str) -> bool {
    completed.iter().any(|id| id == lesson_id)
}
