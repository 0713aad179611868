#![allow(dead_code)]

use axum::Router;
pub(crate) use axum_test::TestServer;
use lightweight_elearning_server::init_test_router;
use lightweight_elearning_server::model::content::{
    CertificateConfig, Course, Lesson, Material, MaterialKind, Module, Quiz, QuizOption,
};
use lightweight_elearning_server::model::profile::{Role, User};
use lightweight_elearning_server::progress::ProgressionRules;
use lightweight_elearning_server::store::{ContentStore, MemoryStore};
use std::sync::Arc;

pub const INTRO_COURSE: &str = "intro";
pub const FULL_COURSE: &str = "full";
pub const COORDINATOR: &str = "coord";
pub const STUDENT: &str = "ana";
pub const FINISHED_STUDENT: &str = "bruno";
pub const INACTIVE_STUDENT: &str = "carla";

// test data builders

/// A lesson whose quiz has two options: `<id>_right` (correct) and `<id>_wrong`.
pub fn test_lesson(id: &str, active: bool) -> Lesson {
    Lesson {
        id: id.to_string(),
        title: format!("Lesson {}", id),
        description: format!("About {}", id),
        video_id: format!("video-{}", id),
        duration: "10 min".to_string(),
        content: String::new(),
        materials: vec![Material {
            id: format!("{}_notes", id),
            title: format!("Notes for {}", id),
            url: format!("https://files.example.com/{}.pdf", id),
            kind: MaterialKind::Pdf,
        }],
        quiz: Quiz {
            id: format!("{}_quiz", id),
            question: format!("Did you watch {}?", id),
            options: vec![
                QuizOption {
                    id: format!("{}_wrong", id),
                    text: "No".to_string(),
                    is_correct: false,
                },
                QuizOption {
                    id: format!("{}_right", id),
                    text: "Yes".to_string(),
                    is_correct: true,
                },
            ],
        },
        is_active: active,
    }
}

pub fn test_module(id: &str, lessons: Vec<Lesson>) -> Module {
    Module {
        id: id.to_string(),
        title: format!("Module {}", id),
        description: String::new(),
        is_locked: false,
        is_active: true,
        lessons,
    }
}

/// One module with two active lessons, L1 and L2.
pub fn intro_course() -> Course {
    Course {
        id: INTRO_COURSE.to_string(),
        title: "Introduction".to_string(),
        cover_url: None,
        certificate_config: CertificateConfig {
            signer_name: "Dr. Helena Costa".to_string(),
            institution_name: "Open Academy".to_string(),
            ..CertificateConfig::default()
        },
        modules: vec![test_module(
            "M1",
            vec![test_lesson("L1", true), test_lesson("L2", true)],
        )],
    }
}

/// Three modules: A (a1, a2 inactive, a3), B (b1, b2), C inactive (c1).
pub fn full_course() -> Course {
    let mut hidden = test_module("C", vec![test_lesson("c1", true)]);
    hidden.is_active = false;

    Course {
        id: FULL_COURSE.to_string(),
        title: "Full course".to_string(),
        cover_url: Some("https://files.example.com/cover.png".to_string()),
        certificate_config: CertificateConfig::default(),
        modules: vec![
            test_module(
                "A",
                vec![
                    test_lesson("a1", true),
                    test_lesson("a2", false),
                    test_lesson("a3", true),
                ],
            ),
            test_module("B", vec![test_lesson("b1", true), test_lesson("b2", true)]),
            hidden,
        ],
    }
}

pub fn test_users() -> Vec<User> {
    let coordinator = User::new(COORDINATOR, "Helena Costa", "helena@example.com", Role::Coordinator);
    let student = User::new(STUDENT, "Ana Lima", "ana@example.com", Role::Student);

    let mut finished = User::new(FINISHED_STUDENT, "Bruno Reis", "bruno@example.com", Role::Student);
    finished.completed_lessons = vec!["L1".to_string(), "L2".to_string()];
    finished.points = 100;
    finished.progress = 100;

    let mut inactive = User::new(INACTIVE_STUDENT, "Carla Dias", "carla@example.com", Role::Student);
    inactive.is_active = false;
    inactive.points = 300;
    inactive.progress = 40;

    vec![coordinator, student, finished, inactive]
}

// test infra setup

pub fn create_test_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new(
        vec![intro_course(), full_course()],
        test_users(),
    ))
}

pub async fn setup_test_environment() -> (TestServer, Arc<MemoryStore>) {
    setup_test_environment_with_rules(ProgressionRules::default()).await
}

pub async fn setup_test_environment_with_rules(
    rules: ProgressionRules,
) -> (TestServer, Arc<MemoryStore>) {
    let store = create_test_store();
    let app: Router = init_test_router(store.clone(), rules);
    let server = TestServer::new(app).expect("Failed to create TestServer");
    (server, store)
}

pub async fn stored_user(store: &MemoryStore, user_id: &str) -> User {
    store
        .load_user(user_id)
        .await
        .expect("user should exist in the test store")
}

pub async fn stored_course(store: &MemoryStore, course_id: &str) -> Course {
    store
        .load_course(course_id)
        .await
        .expect("course should exist in the test store")
}
