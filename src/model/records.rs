//! Row types for the relational store and their conversions to the content model.

use crate::model::content::{
    CertificateConfig, Course, Lesson, Material, MaterialKind, Module, Quiz, QuizOption,
};
use crate::model::profile::{Role, User};
use crate::schema::{courses, lessons, materials, modules, profiles, quiz_options, quizzes};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use tracing::warn;

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = courses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CourseRow {
    pub id: String,
    pub title: String,
    pub course_cover_url: Option<String>,
    pub certificate_config: JsonValue,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = modules)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ModuleRow {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub description: String,
    pub is_locked: bool,
    pub is_active: bool,
    pub order_index: i32,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = lessons)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct LessonRow {
    pub id: String,
    pub module_id: String,
    pub title: String,
    pub description: String,
    pub video_id: String,
    pub duration: String,
    pub content: String,
    pub is_active: bool,
    pub order_index: i32,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = materials)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MaterialRow {
    pub id: String,
    pub lesson_id: String,
    pub title: String,
    pub url: String,
    pub kind: String,
    pub order_index: i32,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = quizzes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct QuizRow {
    pub id: String,
    pub lesson_id: String,
    pub question: String,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = quiz_options)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct QuizOptionRow {
    pub id: String,
    pub quiz_id: String,
    pub text: String,
    pub is_correct: bool,
    pub order_index: i32,
}

#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct ProfileRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub progress: i32,
    pub points: i32,
    pub level: i32,
    pub badges: Vec<String>,
    pub completed_lessons: Vec<String>,
    pub last_access: Option<DateTime<Utc>>,
}

/// Clamps a count or index into the signed column range.
pub fn to_db_int<T: TryInto<i32>>(value: T) -> i32 {
    value.try_into().unwrap_or(i32::MAX)
}

fn from_db_int(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

impl ModuleRow {
    pub fn from_module(course_id: &str, module: &Module, order_index: usize) -> Self {
        ModuleRow {
            id: module.id.clone(),
            course_id: course_id.to_string(),
            title: module.title.clone(),
            description: module.description.clone(),
            is_locked: module.is_locked,
            is_active: module.is_active,
            order_index: to_db_int(order_index),
        }
    }
}

impl LessonRow {
    pub fn from_lesson(module_id: &str, lesson: &Lesson, order_index: usize) -> Self {
        LessonRow {
            id: lesson.id.clone(),
            module_id: module_id.to_string(),
            title: lesson.title.clone(),
            description: lesson.description.clone(),
            video_id: lesson.video_id.clone(),
            duration: lesson.duration.clone(),
            content: lesson.content.clone(),
            is_active: lesson.is_active,
            order_index: to_db_int(order_index),
        }
    }
}

impl MaterialRow {
    pub fn for_lesson(lesson: &Lesson) -> Vec<Self> {
        lesson
            .materials
            .iter()
            .enumerate()
            .map(|(idx, material)| MaterialRow {
                id: material.id.clone(),
                lesson_id: lesson.id.clone(),
                title: material.title.clone(),
                url: material.url.clone(),
                kind: material.kind.as_str().to_string(),
                order_index: to_db_int(idx),
            })
            .collect()
    }
}

impl QuizOptionRow {
    pub fn for_quiz(quiz: &Quiz) -> Vec<Self> {
        quiz.options
            .iter()
            .enumerate()
            .map(|(idx, option)| QuizOptionRow {
                id: option.id.clone(),
                quiz_id: quiz.id.clone(),
                text: option.text.clone(),
                is_correct: option.is_correct,
                order_index: to_db_int(idx),
            })
            .collect()
    }
}

impl From<&User> for ProfileRow {
    fn from(user: &User) -> Self {
        ProfileRow {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            avatar_url: user.avatar_url.clone(),
            role: user.role.as_str().to_string(),
            is_active: user.is_active,
            progress: i32::from(user.progress),
            points: to_db_int(user.points),
            level: to_db_int(user.level),
            badges: user.badges.clone(),
            completed_lessons: user.completed_lessons.clone(),
            last_access: user.last_access,
        }
    }
}

impl From<ProfileRow> for User {
    fn from(row: ProfileRow) -> Self {
        let role = row.role.parse().unwrap_or_else(|err| {
            warn!("Profile {} has {}; treating as student", row.id, err);
            Role::Student
        });
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            avatar_url: row.avatar_url,
            role,
            is_active: row.is_active,
            progress: u8::try_from(row.progress.clamp(0, 100)).unwrap_or(0),
            points: from_db_int(row.points),
            level: from_db_int(row.level).max(1),
            badges: row.badges,
            completed_lessons: row.completed_lessons,
            last_access: row.last_access,
        }
    }
}

/// Rows of one course, each list already sorted by its order index.
pub struct CourseRows {
    pub course: CourseRow,
    pub modules: Vec<ModuleRow>,
    pub lessons: Vec<LessonRow>,
    pub materials: Vec<MaterialRow>,
    pub quizzes: Vec<QuizRow>,
    pub options: Vec<QuizOptionRow>,
}

impl CourseRows {
    /// Builds the course tree. Missing children (no quiz, no materials) come
    /// back empty rather than failing the whole read.
    pub fn into_course(self) -> Course {
        let mut options_by_quiz: HashMap<String, Vec<QuizOption>> = HashMap::new();
        for row in self.options {
            options_by_quiz
                .entry(row.quiz_id)
                .or_default()
                .push(QuizOption {
                    id: row.id,
                    text: row.text,
                    is_correct: row.is_correct,
                });
        }

        let mut quiz_by_lesson: HashMap<String, Quiz> = HashMap::new();
        for row in self.quizzes {
            let options = options_by_quiz.remove(&row.id).unwrap_or_default();
            quiz_by_lesson.insert(
                row.lesson_id,
                Quiz {
                    id: row.id,
                    question: row.question,
                    options,
                },
            );
        }

        let mut materials_by_lesson: HashMap<String, Vec<Material>> = HashMap::new();
        for row in self.materials {
            materials_by_lesson
                .entry(row.lesson_id)
                .or_default()
                .push(Material {
                    id: row.id,
                    title: row.title,
                    url: row.url,
                    kind: MaterialKind::from_stored(&row.kind),
                });
        }

        let mut lessons_by_module: HashMap<String, Vec<Lesson>> = HashMap::new();
        for row in self.lessons {
            let quiz = quiz_by_lesson.remove(&row.id).unwrap_or_else(|| {
                warn!("Lesson {} has no quiz row", row.id);
                Quiz {
                    id: String::new(),
                    question: String::new(),
                    options: Vec::new(),
                }
            });
            let materials = materials_by_lesson.remove(&row.id).unwrap_or_default();
            lessons_by_module
                .entry(row.module_id)
                .or_default()
                .push(Lesson {
                    id: row.id,
                    title: row.title,
                    description: row.description,
                    video_id: row.video_id,
                    duration: row.duration,
                    content: row.content,
                    materials,
                    quiz,
                    is_active: row.is_active,
                });
        }

        let modules = self
            .modules
            .into_iter()
            .map(|row| Module {
                lessons: lessons_by_module.remove(&row.id).unwrap_or_default(),
                id: row.id,
                title: row.title,
                description: row.description,
                is_locked: row.is_locked,
                is_active: row.is_active,
            })
            .collect();

        let certificate_config =
            serde_json::from_value::<CertificateConfig>(self.course.certificate_config)
                .unwrap_or_else(|err| {
                    warn!(
                        "Course {} has an unreadable certificate config ({}); using defaults",
                        self.course.id, err
                    );
                    CertificateConfig::default()
                });

        Course {
            id: self.course.id,
            title: self.course.title,
            cover_url: self.course.course_cover_url,
            certificate_config,
            modules,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn option_row(id: &str, quiz_id: &str, correct: bool, order: i32) -> QuizOptionRow {
        QuizOptionRow {
            id: id.to_string(),
            quiz_id: quiz_id.to_string(),
            text: id.to_string(),
            is_correct: correct,
            order_index: order,
        }
    }

    #[test]
    fn rows_assemble_into_ordered_tree() {
        let rows = CourseRows {
            course: CourseRow {
                id: "c1".to_string(),
                title: "Course".to_string(),
                course_cover_url: None,
                certificate_config: json!({ "signerName": "Dr. Ada", "displaySeal": false }),
            },
            modules: vec![ModuleRow {
                id: "m1".to_string(),
                course_id: "c1".to_string(),
                title: "M1".to_string(),
                description: String::new(),
                is_locked: false,
                is_active: true,
                order_index: 0,
            }],
            lessons: vec![
                LessonRow::from_lesson(
                    "m1",
                    &Lesson {
                        id: "l1".to_string(),
                        title: "L1".to_string(),
                        description: String::new(),
                        video_id: String::new(),
                        duration: String::new(),
                        content: String::new(),
                        materials: Vec::new(),
                        quiz: Quiz {
                            id: String::new(),
                            question: String::new(),
                            options: Vec::new(),
                        },
                        is_active: true,
                    },
                    0,
                ),
            ],
            materials: vec![MaterialRow {
                id: "mat1".to_string(),
                lesson_id: "l1".to_string(),
                title: "Slides".to_string(),
                url: "https://files.example.com/slides.ppt".to_string(),
                kind: "ppt".to_string(),
                order_index: 0,
            }],
            quizzes: vec![QuizRow {
                id: "q1".to_string(),
                lesson_id: "l1".to_string(),
                question: "?".to_string(),
            }],
            options: vec![
                option_row("opt_1", "q1", false, 0),
                option_row("opt_2", "q1", true, 1),
            ],
        };

        let course = rows.into_course();
        let lesson = &course.modules[0].lessons[0];
        assert_eq!(lesson.quiz.id, "q1");
        assert_eq!(lesson.quiz.options.len(), 2);
        assert_eq!(lesson.materials[0].kind, MaterialKind::Ppt);
        assert_eq!(course.certificate_config.signer_name, "Dr. Ada");
        assert!(!course.certificate_config.display_seal);
        assert_eq!(course.certificate_config.title, "Certificate");
    }

    #[test]
    fn profile_row_clamps_out_of_range_values() {
        let row = ProfileRow {
            id: "u1".to_string(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            avatar_url: None,
            role: "superuser".to_string(),
            is_active: true,
            progress: 140,
            points: -5,
            level: 0,
            badges: Vec::new(),
            completed_lessons: Vec::new(),
            last_access: None,
        };
        let user = User::from(row);
        assert_eq!(user.role, Role::Student);
        assert_eq!(user.progress, 100);
        assert_eq!(user.points, 0);
        assert_eq!(user.level, 1);
    }
}
