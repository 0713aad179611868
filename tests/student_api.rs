use axum::http::StatusCode;
use float_cmp::approx_eq;
use lightweight_elearning_server::model::student::{
    CertificateResponse, CourseOutlineResponse, DashboardResponse, LessonView,
    ModuleMaterialsResponse, NavigationResponse, ProfileResponse, QuizAnswerResponse,
    ResumePointResponse, SyncStatus,
};
use lightweight_elearning_server::model::profile::User;
use lightweight_elearning_server::payloads::student::{
    AnswerQuizPayload, NavigatePayload, UpdateProfilePayload,
};
use lightweight_elearning_server::progress::{
    LessonPosition, NavigationRejected, ProgressionRules, QuizOutcome,
};
use lightweight_elearning_server::response::ApiResponse;
use serde_json::Value;

mod helpers;
use helpers::{
    FINISHED_STUDENT, FULL_COURSE, INACTIVE_STUDENT, INTRO_COURSE, STUDENT, TestServer,
    setup_test_environment, setup_test_environment_with_rules, stored_user,
};

async fn answer(
    server: &TestServer,
    course_id: &str,
    user_id: &str,
    lesson_id: &str,
    option_id: &str,
) -> axum_test::TestResponse {
    let payload = AnswerQuizPayload {
        course_id: course_id.to_string(),
        user_id: user_id.to_string(),
        lesson_id: lesson_id.to_string(),
        option_id: option_id.to_string(),
    };
    server.post("/student/answer_quiz").json(&payload).await
}

async fn navigate(
    server: &TestServer,
    path: &str,
    course_id: &str,
    user_id: &str,
    module_index: usize,
    lesson_index: usize,
) -> NavigationResponse {
    let payload = NavigatePayload {
        course_id: course_id.to_string(),
        user_id: user_id.to_string(),
        module_index,
        lesson_index,
    };
    let response = server.post(path).json(&payload).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ApiResponse<NavigationResponse> = response.json();
    body.data.unwrap()
}

// answer_quiz / get_lesson: first lesson open, second unlocked by a correct answer

#[tokio::test]
async fn test_correct_answer_unlocks_next_lesson() {
    let (server, store) = setup_test_environment().await;

    let response = server
        .get(&format!(
            "/student/get_lesson?course_id={}&user_id={}&module_index=0&lesson_index=0",
            INTRO_COURSE, STUDENT
        ))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server
        .get(&format!(
            "/student/get_lesson?course_id={}&user_id={}&module_index=0&lesson_index=1",
            INTRO_COURSE, STUDENT
        ))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    let body: ApiResponse<Value> = response.json();
    assert!(body.status_message.contains("previous lesson incomplete"));

    let response = answer(&server, INTRO_COURSE, STUDENT, "L1", "L1_right").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let result = response.json::<ApiResponse<QuizAnswerResponse>>().data.unwrap();
    assert_eq!(result.outcome, QuizOutcome::Correct);
    assert!(result.lesson_completed);
    assert_eq!(result.points_awarded, 50);
    assert_eq!(result.points, 50);
    assert_eq!(result.progress, 50);
    assert_eq!(result.level, 1);
    assert_eq!(result.sync, SyncStatus::Synced);
    assert_eq!(result.next_position, Some(LessonPosition::new(0, 1)));
    assert!(!result.certificate_available);

    let response = server
        .get(&format!(
            "/student/get_lesson?course_id={}&user_id={}&module_index=0&lesson_index=1",
            INTRO_COURSE, STUDENT
        ))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let lesson = response.json::<ApiResponse<LessonView>>().data.unwrap();
    assert_eq!(lesson.id, "L2");
    assert!(!lesson.completed);
    assert_eq!(lesson.next_position, None);

    let user = stored_user(&store, STUDENT).await;
    assert_eq!(user.completed_lessons, vec!["L1"]);
    assert_eq!(user.points, 50);
    assert_eq!(user.progress, 50);
    assert!(user.last_access.is_some());
}

#[tokio::test]
async fn test_get_lesson_hides_correct_flag() {
    let (server, _store) = setup_test_environment().await;

    let response = server
        .get(&format!(
            "/student/get_lesson?course_id={}&user_id={}&module_index=0&lesson_index=0",
            INTRO_COURSE, STUDENT
        ))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    let options = body["data"]["quiz"]["options"].as_array().unwrap();
    assert_eq!(options.len(), 2);
    for option in options {
        assert!(option.get("is_correct").is_none());
        assert!(option.get("text").is_some());
    }
    assert_eq!(body["data"]["materials"][0]["type"], "pdf");
}

#[tokio::test]
async fn test_get_lesson_out_of_range_not_found() {
    let (server, store) = setup_test_environment().await;

    let response = server
        .get(&format!(
            "/student/get_lesson?course_id={}&user_id={}&module_index=7&lesson_index=0",
            INTRO_COURSE, STUDENT
        ))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    // the empty fallback course has no lessons either
    let response = server
        .get(&format!(
            "/student/get_lesson?course_id={}&user_id={}&module_index=0&lesson_index=0",
            FULL_COURSE, STUDENT
        ))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    store.set_fail_reads(true);
    let response = server
        .get(&format!(
            "/student/get_lesson?course_id={}&user_id={}&module_index=0&lesson_index=0",
            INTRO_COURSE, STUDENT
        ))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_wrong_answer_changes_nothing() {
    let (server, store) = setup_test_environment().await;

    let response = answer(&server, INTRO_COURSE, STUDENT, "L1", "L1_wrong").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let result = response.json::<ApiResponse<QuizAnswerResponse>>().data.unwrap();
    assert_eq!(result.outcome, QuizOutcome::Incorrect);
    assert!(!result.lesson_completed);
    assert_eq!(result.points_awarded, 0);
    assert_eq!(result.sync, SyncStatus::Unchanged);
    assert_eq!(result.next_position, None);

    // a retry with the right option still counts
    let response = answer(&server, INTRO_COURSE, STUDENT, "L1", "L1_right").await;
    let result = response.json::<ApiResponse<QuizAnswerResponse>>().data.unwrap();
    assert_eq!(result.outcome, QuizOutcome::Correct);

    let user = stored_user(&store, STUDENT).await;
    assert_eq!(user.points, 50);
}

#[tokio::test]
async fn test_answering_a_passed_lesson_awards_nothing() {
    let (server, store) = setup_test_environment().await;

    let response = answer(&server, INTRO_COURSE, FINISHED_STUDENT, "L1", "L1_right").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let result = response.json::<ApiResponse<QuizAnswerResponse>>().data.unwrap();
    assert_eq!(result.outcome, QuizOutcome::AlreadyAnswered);
    assert_eq!(result.points_awarded, 0);
    assert_eq!(result.points, 100);
    assert_eq!(result.sync, SyncStatus::Unchanged);

    let user = stored_user(&store, FINISHED_STUDENT).await;
    assert_eq!(user.completed_lessons, vec!["L1", "L2"]);
    assert_eq!(user.points, 100);
}

#[tokio::test]
async fn test_answering_locked_lesson_is_forbidden() {
    let (server, store) = setup_test_environment().await;

    let response = answer(&server, INTRO_COURSE, STUDENT, "L2", "L2_right").await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    let body: ApiResponse<Value> = response.json();
    assert_eq!(body.status_code, 403);
    assert!(body.data.is_none());
    assert!(stored_user(&store, STUDENT).await.completed_lessons.is_empty());
}

#[tokio::test]
async fn test_answer_with_foreign_option_is_bad_request() {
    let (server, _store) = setup_test_environment().await;

    let response = answer(&server, INTRO_COURSE, STUDENT, "L1", "L2_right").await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_answer_unknown_lesson_not_found() {
    let (server, _store) = setup_test_environment().await;

    let response = answer(&server, INTRO_COURSE, STUDENT, "nope", "nope_right").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

// get_resume_point / get_certificate: finished course

#[tokio::test]
async fn test_finished_course_resumes_at_last_lesson_and_issues_certificate() {
    let (server, _store) = setup_test_environment().await;

    let response = server
        .get(&format!(
            "/student/get_resume_point?course_id={}&user_id={}",
            INTRO_COURSE, FINISHED_STUDENT
        ))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let resume = response.json::<ApiResponse<ResumePointResponse>>().data.unwrap();
    assert_eq!(resume.position, Some(LessonPosition::new(0, 1)));
    assert_eq!(resume.lesson_id.as_deref(), Some("L2"));
    assert!(resume.course_finished);

    let response = server
        .get(&format!(
            "/student/get_certificate?course_id={}&user_id={}",
            INTRO_COURSE, FINISHED_STUDENT
        ))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let certificate = response.json::<ApiResponse<CertificateResponse>>().data.unwrap();
    assert_eq!(certificate.student_name, "Bruno Reis");
    assert_eq!(certificate.course_title, "Introduction");
    assert_eq!(certificate.certificate_config.signer_name, "Dr. Helena Costa");
    assert_eq!(certificate.certificate_config.title, "Certificate");
}

#[tokio::test]
async fn test_certificate_forbidden_before_course_is_finished() {
    let (server, _store) = setup_test_environment().await;

    let response = server
        .get(&format!(
            "/student/get_certificate?course_id={}&user_id={}",
            INTRO_COURSE, STUDENT
        ))
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    let body: ApiResponse<Value> = response.json();
    assert!(body.status_message.contains("not completed"));
}

#[tokio::test]
async fn test_resume_point_of_new_student_is_first_lesson() {
    let (server, _store) = setup_test_environment().await;

    let response = server
        .get(&format!(
            "/student/get_resume_point?course_id={}&user_id={}",
            FULL_COURSE, STUDENT
        ))
        .await;

    let resume = response.json::<ApiResponse<ResumePointResponse>>().data.unwrap();
    assert_eq!(resume.position, Some(LessonPosition::new(0, 0)));
    assert_eq!(resume.lesson_id.as_deref(), Some("a1"));
    assert!(!resume.course_finished);
}

// navigation

#[tokio::test]
async fn test_navigate_reports_why_a_lesson_is_locked() {
    let (server, _store) = setup_test_environment().await;
    let path = "/student/navigate";

    let accepted = navigate(&server, path, FULL_COURSE, STUDENT, 0, 0).await;
    assert!(accepted.accepted);
    assert_eq!(accepted.position, Some(LessonPosition::new(0, 0)));
    assert!(accepted.reason.is_none());

    let cases = [
        (0, 1, NavigationRejected::LessonInactive),
        (0, 2, NavigationRejected::PreviousLessonIncomplete),
        (1, 0, NavigationRejected::PreviousModuleIncomplete),
        (2, 0, NavigationRejected::LessonInactive),
        (7, 0, NavigationRejected::LessonNotFound),
        (0, 9, NavigationRejected::LessonNotFound),
    ];
    for (module_index, lesson_index, expected) in cases {
        let result = navigate(&server, path, FULL_COURSE, STUDENT, module_index, lesson_index).await;
        assert!(!result.accepted, "{}:{} should be refused", module_index, lesson_index);
        assert_eq!(result.position, None);
        assert_eq!(result.reason, Some(expected));
        assert!(result.message.is_some());
    }
}

#[tokio::test]
async fn test_inactive_lesson_is_skipped_in_the_unlock_chain() {
    let (server, _store) = setup_test_environment().await;

    let response = answer(&server, FULL_COURSE, STUDENT, "a1", "a1_right").await;
    let result = response.json::<ApiResponse<QuizAnswerResponse>>().data.unwrap();
    // a2 is inactive, so a3 follows a1
    assert_eq!(result.next_position, Some(LessonPosition::new(0, 2)));

    let result = navigate(&server, "/student/navigate", FULL_COURSE, STUDENT, 0, 2).await;
    assert!(result.accepted);

    let response = answer(&server, FULL_COURSE, STUDENT, "a3", "a3_right").await;
    let result = response.json::<ApiResponse<QuizAnswerResponse>>().data.unwrap();
    assert_eq!(result.next_position, Some(LessonPosition::new(1, 0)));
    assert_eq!(result.progress, 50);
}

#[tokio::test]
async fn test_next_lesson_crosses_module_boundary() {
    let (server, _store) = setup_test_environment().await;
    let path = "/student/next_lesson";

    let refused = navigate(&server, path, FULL_COURSE, STUDENT, 0, 0).await;
    assert!(!refused.accepted);
    assert_eq!(refused.reason, Some(NavigationRejected::PreviousLessonIncomplete));

    answer(&server, FULL_COURSE, STUDENT, "a1", "a1_right").await;
    answer(&server, FULL_COURSE, STUDENT, "a3", "a3_right").await;

    let next = navigate(&server, path, FULL_COURSE, STUDENT, 0, 2).await;
    assert!(next.accepted);
    assert_eq!(next.position, Some(LessonPosition::new(1, 0)));

    // b2 is the last active lesson; the inactive module after it is not a target
    let end = navigate(&server, path, FULL_COURSE, STUDENT, 1, 1).await;
    assert!(!end.accepted);
    assert_eq!(end.reason, Some(NavigationRejected::LessonNotFound));
}

#[tokio::test]
async fn test_course_outline_hides_inactive_content() {
    let (server, _store) = setup_test_environment().await;

    let response = server
        .get(&format!(
            "/student/get_course_outline?course_id={}&user_id={}",
            FULL_COURSE, STUDENT
        ))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ApiResponse<CourseOutlineResponse> = response.json();
    assert_eq!(body.status_message, "OK");
    let outline = body.data.unwrap();
    assert_eq!(outline.course_title, "Full course");
    assert_eq!(outline.progress, 0);
    assert_eq!(outline.resume_point, Some(LessonPosition::new(0, 0)));

    let module_ids: Vec<&str> = outline.modules.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(module_ids, vec!["A", "B"]);

    let first = &outline.modules[0];
    let lessons: Vec<(&str, usize, bool)> = first
        .lessons
        .iter()
        .map(|l| (l.id.as_str(), l.lesson_index, l.locked))
        .collect();
    assert_eq!(lessons, vec![("a1", 0, false), ("a3", 2, true)]);
}

// access

#[tokio::test]
async fn test_deactivated_student_is_forbidden() {
    let (server, _store) = setup_test_environment().await;

    let response = server
        .get(&format!(
            "/student/get_course_outline?course_id={}&user_id={}",
            INTRO_COURSE, INACTIVE_STUDENT
        ))
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_course_and_user_not_found() {
    let (server, _store) = setup_test_environment().await;

    let response = server
        .get(&format!(
            "/student/get_course_outline?course_id=missing&user_id={}",
            STUDENT
        ))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = server
        .get(&format!(
            "/student/get_course_outline?course_id={}&user_id=ghost",
            INTRO_COURSE
        ))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: ApiResponse<Value> = response.json();
    assert!(body.status_message.contains("ghost"));
}

// degraded store

#[tokio::test]
async fn test_outline_served_from_snapshot_when_store_fails() {
    let (server, store) = setup_test_environment().await;
    let url = format!(
        "/student/get_course_outline?course_id={}&user_id={}",
        FULL_COURSE, STUDENT
    );

    let fresh = server.get(&url).await.json::<ApiResponse<CourseOutlineResponse>>();

    store.set_fail_reads(true);
    let response = server.get(&url).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let stale: ApiResponse<CourseOutlineResponse> = response.json();
    assert!(stale.status_message.contains("snapshot"));
    let (fresh, stale) = (fresh.data.unwrap(), stale.data.unwrap());
    assert_eq!(stale.course_title, fresh.course_title);
    assert_eq!(stale.modules, fresh.modules);
}

#[tokio::test]
async fn test_empty_course_served_when_no_snapshot_exists() {
    let (server, store) = setup_test_environment().await;

    // caches the profile but not the course
    let payload = UpdateProfilePayload {
        user_id: STUDENT.to_string(),
        name: "Ana Lima".to_string(),
        email: "ana@example.com".to_string(),
        avatar_url: None,
    };
    let response = server.post("/student/update_profile").json(&payload).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    store.set_fail_reads(true);
    let response = server
        .get(&format!(
            "/student/get_course_outline?course_id={}&user_id={}",
            FULL_COURSE, STUDENT
        ))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let outline = response.json::<ApiResponse<CourseOutlineResponse>>().data.unwrap();
    assert_eq!(outline.course_id, FULL_COURSE);
    assert_eq!(outline.course_title, "Untitled course");
    assert!(outline.modules.is_empty());
    assert_eq!(outline.resume_point, None);
}

#[tokio::test]
async fn test_profile_unavailable_without_cache() {
    let (server, store) = setup_test_environment().await;
    store.set_fail_reads(true);

    let response = server
        .get(&format!(
            "/student/get_dashboard?course_id={}&user_id={}",
            INTRO_COURSE, STUDENT
        ))
        .await;

    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_failed_completion_write_is_kept_and_synced_later() {
    let (server, store) = setup_test_environment().await;
    store.set_fail_writes(true);

    let response = answer(&server, INTRO_COURSE, STUDENT, "L1", "L1_right").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let result = response.json::<ApiResponse<QuizAnswerResponse>>().data.unwrap();
    assert_eq!(result.outcome, QuizOutcome::Correct);
    assert!(result.lesson_completed);
    assert_eq!(result.points, 50);
    assert!(matches!(result.sync, SyncStatus::Failed(_)));
    assert!(stored_user(&store, STUDENT).await.completed_lessons.is_empty());

    // the local completion is what the student keeps seeing
    let response = server
        .get(&format!(
            "/student/get_lesson?course_id={}&user_id={}&module_index=0&lesson_index=1",
            INTRO_COURSE, STUDENT
        ))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    store.set_fail_writes(false);
    let response = server
        .get(&format!(
            "/student/get_dashboard?course_id={}&user_id={}",
            INTRO_COURSE, STUDENT
        ))
        .await;
    let dashboard = response.json::<ApiResponse<DashboardResponse>>().data.unwrap();
    assert_eq!(dashboard.completed_lessons, 1);
    assert_eq!(dashboard.points, 50);

    let user = stored_user(&store, STUDENT).await;
    assert_eq!(user.completed_lessons, vec!["L1"]);
    assert_eq!(user.points, 50);
    assert_eq!(user.progress, 50);
}

// dashboard, materials, profile

#[tokio::test]
async fn test_dashboard_follows_configured_xp_rules() {
    let rules = ProgressionRules {
        xp_per_lesson: 200,
        xp_per_level: 300,
    };
    let (server, _store) = setup_test_environment_with_rules(rules).await;

    answer(&server, INTRO_COURSE, STUDENT, "L1", "L1_right").await;
    let response = answer(&server, INTRO_COURSE, STUDENT, "L2", "L2_right").await;
    let result = response.json::<ApiResponse<QuizAnswerResponse>>().data.unwrap();
    assert_eq!(result.points, 400);
    assert_eq!(result.level, 2);
    assert!(result.certificate_available);

    let response = server
        .get(&format!(
            "/student/get_dashboard?course_id={}&user_id={}",
            INTRO_COURSE, STUDENT
        ))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let dashboard = response.json::<ApiResponse<DashboardResponse>>().data.unwrap();
    assert_eq!(dashboard.user_name, "Ana Lima");
    assert_eq!(dashboard.progress, 100);
    assert_eq!(dashboard.level, 2);
    assert_eq!(dashboard.xp_to_next_level, 200);
    assert!(approx_eq!(f64, dashboard.level_progress, 1.0 / 3.0, epsilon = 1e-9));
    assert_eq!(dashboard.total_lessons, 2);
    assert_eq!(dashboard.completed_lessons, 2);
    assert!(dashboard.certificate_available);
}

#[tokio::test]
async fn test_module_materials_lists_every_lesson_material() {
    let (server, _store) = setup_test_environment().await;

    let response = server
        .get(&format!(
            "/student/get_module_materials?course_id={}&module_id=A",
            FULL_COURSE
        ))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let materials = response.json::<ApiResponse<ModuleMaterialsResponse>>().data.unwrap();
    assert_eq!(materials.module_title, "Module A");
    let ids: Vec<&str> = materials.materials.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["a1_notes", "a2_notes", "a3_notes"]);

    let response = server
        .get(&format!(
            "/student/get_module_materials?course_id={}&module_id=C",
            FULL_COURSE
        ))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profile_lists_recent_lessons_and_level_progress() {
    let (server, _store) = setup_test_environment().await;

    let response = server
        .get(&format!(
            "/student/get_profile?course_id={}&user_id={}",
            INTRO_COURSE, FINISHED_STUDENT
        ))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let profile = response.json::<ApiResponse<ProfileResponse>>().data.unwrap();
    assert_eq!(profile.user.name, "Bruno Reis");
    assert_eq!(profile.user.progress, 100);
    assert_eq!(profile.user.level, 1);
    assert!(approx_eq!(f64, profile.level_progress, 0.25, epsilon = 1e-9));
    assert!(profile.certificate_available);
    let recent: Vec<&str> = profile
        .recent_lessons
        .iter()
        .map(|l| l.lesson_id.as_str())
        .collect();
    assert_eq!(recent, vec!["L1", "L2"]);
    assert_eq!(profile.recent_lessons[0].module_title, "Module M1");
}

#[tokio::test]
async fn test_update_profile_success() {
    let (server, store) = setup_test_environment().await;

    let payload = UpdateProfilePayload {
        user_id: STUDENT.to_string(),
        name: "  Ana Beatriz Lima ".to_string(),
        email: "ana.lima@example.com".to_string(),
        avatar_url: Some("https://files.example.com/ana.png".to_string()),
    };
    let response = server.post("/student/update_profile").json(&payload).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let user = response.json::<ApiResponse<User>>().data.unwrap();
    assert_eq!(user.name, "Ana Beatriz Lima");

    let stored = stored_user(&store, STUDENT).await;
    assert_eq!(stored.email, "ana.lima@example.com");
    assert_eq!(stored.avatar_url.as_deref(), Some("https://files.example.com/ana.png"));
}

#[tokio::test]
async fn test_update_profile_rejects_bad_input() {
    let (server, _store) = setup_test_environment().await;

    let bad_email = UpdateProfilePayload {
        user_id: STUDENT.to_string(),
        name: "Ana".to_string(),
        email: "not-an-email".to_string(),
        avatar_url: None,
    };
    let response = server.post("/student/update_profile").json(&bad_email).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let taken_email = UpdateProfilePayload {
        user_id: STUDENT.to_string(),
        name: "Ana".to_string(),
        email: "bruno@example.com".to_string(),
        avatar_url: None,
    };
    let response = server.post("/student/update_profile").json(&taken_email).await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
}
