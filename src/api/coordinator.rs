use super::helper::{self, respond};
use crate::AppState;
use crate::errors::AppError;
use crate::model::content::{Lesson, Material, Module, Quiz, QuizOption};
use crate::model::coordinator::{CohortStatsResponse, CourseAdminView, CreatedId, StudentSummary};
use crate::model::profile::{Role, User};
use crate::payloads::coordinator::{
    CoordinatorCourseParams, CreateUserPayload, DeleteLessonPayload, DeleteModulePayload,
    ListStudentsParams, MoveLessonPayload, MoveModulePayload, SetCorrectOptionPayload,
    SetLessonActivePayload, SetModuleActivePayload, SetUserActivePayload,
    UpdateCertificatePayload, UpsertLessonPayload, UpsertModulePayload,
};
use crate::progress::{aggregate_cohort_stats, course_outline, course_totals};
use crate::response::ApiResponse;
use axum::Json;
use axum::extract::{Query, State};
use tracing::{debug, info, instrument, warn};

/// Headline numbers for the admin panel: user count, active users, average
/// progress and the XP earned by everyone together.
///
/// Query Parameters:
/// * `coordinator_id`: The requesting coordinator.
/// * `course_id`: The course whose active lesson count is reported alongside.
///
/// Returns (wrapped in `ApiResponse`)
/// * `CohortStatsResponse` (200 OK).
/// * `403 Forbidden`: If the caller is not an active coordinator.
/// * `500 Internal Server Error`: If the users cannot be loaded.
#[instrument(skip(state, params))]
pub async fn get_cohort_stats(
    State(state): State<AppState>,
    Query(params): Query<CoordinatorCourseParams>,
) -> Result<ApiResponse<CohortStatsResponse>, AppError> {
    helper::check_coordinator(&state, &params.coordinator_id).await?;

    let read = helper::load_course(&state, &params.course_id).await?;
    let users = state.store.load_users().await?;
    let stats = aggregate_cohort_stats(&users);
    info!(
        "Cohort stats for course {}: {} users, {} active, avg {}%, {} XP",
        params.course_id, stats.total, stats.active, stats.avg_progress_percent, stats.total_xp
    );

    Ok(respond(
        CohortStatsResponse {
            stats,
            course_active_lessons: course_totals(&read.course, &[]).total_active_lessons,
        },
        read.stale,
    ))
}

/// Lists users, optionally narrowed by a search term and to active accounts.
#[instrument(skip(state, params))]
pub async fn list_students(
    State(state): State<AppState>,
    Query(params): Query<ListStudentsParams>,
) -> Result<ApiResponse<Vec<StudentSummary>>, AppError> {
    helper::check_coordinator(&state, &params.coordinator_id).await?;

    let needle = params
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let students: Vec<StudentSummary> = state
        .store
        .load_users()
        .await?
        .iter()
        .filter(|u| !params.only_active || u.is_active)
        .filter(|u| match &needle {
            Some(needle) => {
                u.name.to_lowercase().contains(needle) || u.email.to_lowercase().contains(needle)
            }
            None => true,
        })
        .map(StudentSummary::from)
        .collect();

    debug!("Listing {} users", students.len());
    Ok(ApiResponse::ok(students))
}

/// Registers a new user. The identity provider account is managed elsewhere.
///
/// Request Body: `CreateUserPayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `User`: The created profile (201 Created).
/// * `400 Bad Request`: If the name is empty or the email is malformed.
/// * `403 Forbidden`: If the caller is not an active coordinator.
/// * `409 Conflict`: If the email is already registered.
#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<ApiResponse<User>, AppError> {
    helper::check_coordinator(&state, &payload.coordinator_id).await?;
    debug!("Create user payload: {:?}", payload);

    let name = payload.name.trim();
    let email = payload.email.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name must not be empty.".to_string()));
    }
    if !helper::is_plausible_email(email) {
        return Err(AppError::BadRequest(format!("'{}' is not a valid email.", email)));
    }

    let mut user = User::new(&helper::new_id("u"), name, email, payload.role);
    user.avatar_url = payload.avatar_url.filter(|url| !url.trim().is_empty());

    state.store.create_user(&user).await?;
    info!(
        "Coordinator {} created {} {} ({})",
        payload.coordinator_id, user.role, user.id, user.email
    );
    Ok(ApiResponse::created(user))
}

/// Activates or deactivates a user. Deactivated students lose access to the
/// course but keep their progress. Coordinators cannot be deactivated here.
#[instrument(skip(state, payload))]
pub async fn set_user_active(
    State(state): State<AppState>,
    Json(payload): Json<SetUserActivePayload>,
) -> Result<ApiResponse<StudentSummary>, AppError> {
    helper::check_coordinator(&state, &payload.coordinator_id).await?;

    let remote = state.store.load_user(&payload.user_id).await?;
    // a completion the store never received must survive the toggle
    let mut user = match state.snapshots.pending_profile(&payload.user_id).await {
        Some(local) => helper::resync_profile(&state, &remote, &local, None).await,
        None => remote,
    };
    if !payload.active && user.role == Role::Coordinator {
        warn!(
            "Coordinator {} tried to deactivate coordinator {}",
            payload.coordinator_id, user.id
        );
        return Err(AppError::BadRequest(
            "Coordinator accounts cannot be deactivated.".to_string(),
        ));
    }

    if user.is_active != payload.active {
        user.is_active = payload.active;
        state.store.update_user(&user).await?;
        state.snapshots.remember_profile(&user).await;
        info!("User {} is now active={}", user.id, user.is_active);
    }
    Ok(ApiResponse::ok(StudentSummary::from(&user)))
}

/// The full course tree for the editor, inactive content included, with the
/// outline a student who has completed nothing would see.
#[instrument(skip(state, params))]
pub async fn get_course(
    State(state): State<AppState>,
    Query(params): Query<CoordinatorCourseParams>,
) -> Result<ApiResponse<CourseAdminView>, AppError> {
    helper::check_coordinator(&state, &params.coordinator_id).await?;

    let course = helper::load_course_for_edit(&state, &params.course_id).await?;
    let outline_preview = course_outline(&course, &[], true);
    Ok(ApiResponse::ok(CourseAdminView {
        course,
        outline_preview,
    }))
}

/// Creates a module at the end of the course, or edits an existing one.
///
/// Request Body: `UpsertModulePayload`; leave `module_id` out to create.
///
/// Returns (wrapped in `ApiResponse`)
/// * `CreatedId`: The module's ID (200 OK).
/// * `404 Not Found`: If the course does not exist.
/// * `409 Conflict`: If the module ID belongs to another course.
/// * `422 Unprocessable Entity`: If the title is empty.
#[instrument(skip(state, payload))]
pub async fn upsert_module(
    State(state): State<AppState>,
    Json(payload): Json<UpsertModulePayload>,
) -> Result<ApiResponse<CreatedId>, AppError> {
    helper::check_coordinator(&state, &payload.coordinator_id).await?;
    debug!("Upsert module payload: {:?}", payload);

    if payload.title.trim().is_empty() {
        return Err(AppError::UnprocessableEntity(
            "module title must not be empty".to_string(),
        ));
    }

    let course = helper::load_course_for_edit(&state, &payload.course_id).await?;
    let module_id = payload.module_id.unwrap_or_else(|| helper::new_id("m"));
    let existing = course.module_index(&module_id);
    let order_index = existing.unwrap_or(course.modules.len());

    let module = Module {
        id: module_id.clone(),
        title: payload.title.trim().to_string(),
        description: payload.description,
        is_locked: payload.is_locked,
        is_active: payload.is_active,
        lessons: existing
            .map(|idx| course.modules[idx].lessons.clone())
            .unwrap_or_default(),
    };
    state
        .store
        .upsert_module(&course.id, &module, order_index)
        .await?;

    info!(
        "Module {} {} in course {}",
        module_id,
        if existing.is_some() { "updated" } else { "created" },
        course.id
    );
    Ok(ApiResponse::ok(CreatedId { id: module_id }))
}

/// Deletes a module together with its lessons, materials and quizzes.
#[instrument(skip(state, payload))]
pub async fn delete_module(
    State(state): State<AppState>,
    Json(payload): Json<DeleteModulePayload>,
) -> Result<ApiResponse<bool>, AppError> {
    helper::check_coordinator(&state, &payload.coordinator_id).await?;

    let course = helper::load_course_for_edit(&state, &payload.course_id).await?;
    if course.module_index(&payload.module_id).is_none() {
        return Err(module_not_found(&payload.module_id, &course.id));
    }

    state.store.delete_module(&payload.module_id).await?;
    info!(
        "Module {} deleted from course {}",
        payload.module_id, course.id
    );
    Ok(ApiResponse::ok(true))
}

/// Moves a module to another slot; the modules in between shift by one.
///
/// Returns (wrapped in `ApiResponse`)
/// * `Vec<String>`: Module IDs in their new order (200 OK).
/// * `400 Bad Request`: If either index is out of range.
#[instrument(skip(state, payload))]
pub async fn move_module(
    State(state): State<AppState>,
    Json(payload): Json<MoveModulePayload>,
) -> Result<ApiResponse<Vec<String>>, AppError> {
    helper::check_coordinator(&state, &payload.coordinator_id).await?;

    let mut course = helper::load_course_for_edit(&state, &payload.course_id).await?;
    if !course.move_module(payload.from_index, payload.to_index) {
        warn!(
            "Module move {} -> {} out of range ({} modules)",
            payload.from_index,
            payload.to_index,
            course.modules.len()
        );
        return Err(AppError::BadRequest(format!(
            "Cannot move module from {} to {}: course has {} modules.",
            payload.from_index,
            payload.to_index,
            course.modules.len()
        )));
    }

    let order: Vec<String> = course.modules.iter().map(|m| m.id.clone()).collect();
    state.store.reorder_modules(&course.id, &order).await?;
    info!("Modules of course {} reordered: {:?}", course.id, order);
    Ok(ApiResponse::ok(order))
}

#[instrument(skip(state, payload))]
pub async fn set_module_active(
    State(state): State<AppState>,
    Json(payload): Json<SetModuleActivePayload>,
) -> Result<ApiResponse<bool>, AppError> {
    helper::check_coordinator(&state, &payload.coordinator_id).await?;

    let course = helper::load_course_for_edit(&state, &payload.course_id).await?;
    let idx = course
        .module_index(&payload.module_id)
        .ok_or_else(|| module_not_found(&payload.module_id, &course.id))?;

    let mut module = course.modules[idx].clone();
    module.is_active = payload.active;
    state.store.upsert_module(&course.id, &module, idx).await?;

    info!("Module {} is now active={}", module.id, module.is_active);
    Ok(ApiResponse::ok(module.is_active))
}

/// Creates or replaces a lesson, including its materials and quiz.
///
/// The lesson is validated first: non-empty title, at least two quiz options,
/// exactly one of them correct, and every material with a title and URL.
/// Missing IDs of the lesson, its quiz, options and materials are generated.
///
/// Request Body: `UpsertLessonPayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `CreatedId`: The lesson's ID (200 OK).
/// * `400 Bad Request`: If the lesson already lives in another module.
/// * `404 Not Found`: If the course or module does not exist.
/// * `409 Conflict`: If the lesson ID belongs to another course.
/// * `422 Unprocessable Entity`: If validation fails; the message lists every problem.
#[instrument(skip(state, payload), fields(course_id = %payload.course_id, module_id = %payload.module_id))]
pub async fn upsert_lesson(
    State(state): State<AppState>,
    Json(payload): Json<UpsertLessonPayload>,
) -> Result<ApiResponse<CreatedId>, AppError> {
    helper::check_coordinator(&state, &payload.coordinator_id).await?;
    debug!("Upsert lesson payload: {:?}", payload);

    let course = helper::load_course_for_edit(&state, &payload.course_id).await?;
    let m_idx = course
        .module_index(&payload.module_id)
        .ok_or_else(|| module_not_found(&payload.module_id, &course.id))?;
    let module = &course.modules[m_idx];

    let lesson_id = payload
        .lesson_id
        .clone()
        .unwrap_or_else(|| helper::new_id("l"));
    let existing = match course.locate_lesson(&lesson_id) {
        Some((owner, l_idx)) if owner == m_idx => Some(&module.lessons[l_idx]),
        Some((owner, _)) => {
            return Err(AppError::BadRequest(format!(
                "Lesson {} belongs to module {}, not {}.",
                lesson_id, course.modules[owner].id, module.id
            )));
        }
        None => None,
    };
    let order_index = module
        .lessons
        .iter()
        .position(|l| l.id == lesson_id)
        .unwrap_or(module.lessons.len());

    let lesson = build_lesson(lesson_id.clone(), existing, payload);
    lesson.validate()?;

    state
        .store
        .upsert_lesson(&module.id, &lesson, order_index)
        .await?;
    info!(
        "Lesson {} {} in module {}",
        lesson.id,
        if existing.is_some() { "updated" } else { "created" },
        module.id
    );
    Ok(ApiResponse::ok(CreatedId { id: lesson_id }))
}

/// Deletes a lesson with its materials and quiz.
#[instrument(skip(state, payload))]
pub async fn delete_lesson(
    State(state): State<AppState>,
    Json(payload): Json<DeleteLessonPayload>,
) -> Result<ApiResponse<bool>, AppError> {
    helper::check_coordinator(&state, &payload.coordinator_id).await?;

    let course = helper::load_course_for_edit(&state, &payload.course_id).await?;
    if course.locate_lesson(&payload.lesson_id).is_none() {
        return Err(lesson_not_found(&payload.lesson_id, &course.id));
    }

    state.store.delete_lesson(&payload.lesson_id).await?;
    info!("Lesson {} deleted", payload.lesson_id);
    Ok(ApiResponse::ok(true))
}

/// Moves a lesson within its module.
///
/// Returns (wrapped in `ApiResponse`)
/// * `Vec<String>`: Lesson IDs of the module in their new order (200 OK).
/// * `400 Bad Request`: If either index is out of range.
/// * `404 Not Found`: If the course or module does not exist.
#[instrument(skip(state, payload))]
pub async fn move_lesson(
    State(state): State<AppState>,
    Json(payload): Json<MoveLessonPayload>,
) -> Result<ApiResponse<Vec<String>>, AppError> {
    helper::check_coordinator(&state, &payload.coordinator_id).await?;

    let course = helper::load_course_for_edit(&state, &payload.course_id).await?;
    let m_idx = course
        .module_index(&payload.module_id)
        .ok_or_else(|| module_not_found(&payload.module_id, &course.id))?;

    let mut module = course.modules[m_idx].clone();
    if !module.move_lesson(payload.from_index, payload.to_index) {
        return Err(AppError::BadRequest(format!(
            "Cannot move lesson from {} to {}: module has {} lessons.",
            payload.from_index,
            payload.to_index,
            module.lessons.len()
        )));
    }

    let order: Vec<String> = module.lessons.iter().map(|l| l.id.clone()).collect();
    state.store.reorder_lessons(&module.id, &order).await?;
    info!("Lessons of module {} reordered: {:?}", module.id, order);
    Ok(ApiResponse::ok(order))
}

#[instrument(skip(state, payload))]
pub async fn set_lesson_active(
    State(state): State<AppState>,
    Json(payload): Json<SetLessonActivePayload>,
) -> Result<ApiResponse<bool>, AppError> {
    helper::check_coordinator(&state, &payload.coordinator_id).await?;

    let course = helper::load_course_for_edit(&state, &payload.course_id).await?;
    let (m_idx, l_idx) = course
        .locate_lesson(&payload.lesson_id)
        .ok_or_else(|| lesson_not_found(&payload.lesson_id, &course.id))?;

    let module = &course.modules[m_idx];
    let mut lesson = module.lessons[l_idx].clone();
    lesson.is_active = payload.active;
    state.store.upsert_lesson(&module.id, &lesson, l_idx).await?;

    info!("Lesson {} is now active={}", lesson.id, lesson.is_active);
    Ok(ApiResponse::ok(lesson.is_active))
}

/// Marks one quiz option as correct and clears the flag on all others.
///
/// Returns (wrapped in `ApiResponse`)
/// * `bool`: true (200 OK).
/// * `404 Not Found`: If the lesson or option does not exist.
#[instrument(skip(state, payload))]
pub async fn set_correct_option(
    State(state): State<AppState>,
    Json(payload): Json<SetCorrectOptionPayload>,
) -> Result<ApiResponse<bool>, AppError> {
    helper::check_coordinator(&state, &payload.coordinator_id).await?;

    let course = helper::load_course_for_edit(&state, &payload.course_id).await?;
    let (m_idx, l_idx) = course
        .locate_lesson(&payload.lesson_id)
        .ok_or_else(|| lesson_not_found(&payload.lesson_id, &course.id))?;

    let module = &course.modules[m_idx];
    let mut lesson = module.lessons[l_idx].clone();
    if !lesson.quiz.mark_correct(&payload.option_id) {
        warn!(
            "Option {} not found in quiz of lesson {}",
            payload.option_id, lesson.id
        );
        return Err(AppError::NotFound(format!(
            "Option with ID {} not found in lesson {}.",
            payload.option_id, lesson.id
        )));
    }

    state.store.upsert_lesson(&module.id, &lesson, l_idx).await?;
    info!(
        "Option {} is now the correct answer of lesson {}",
        payload.option_id, lesson.id
    );
    Ok(ApiResponse::ok(true))
}

#[instrument(skip(state, payload))]
pub async fn update_certificate(
    State(state): State<AppState>,
    Json(payload): Json<UpdateCertificatePayload>,
) -> Result<ApiResponse<bool>, AppError> {
    helper::check_coordinator(&state, &payload.coordinator_id).await?;
    debug!("Update certificate payload: {:?}", payload);

    state
        .store
        .update_certificate_config(&payload.course_id, &payload.certificate_config)
        .await?;
    info!("Certificate template of course {} updated", payload.course_id);
    Ok(ApiResponse::ok(true))
}

fn module_not_found(module_id: &str, course_id: &str) -> AppError {
    warn!("Module {} not found in course {}", module_id, course_id);
    AppError::NotFound(format!("Module with ID {} not found.", module_id))
}

fn lesson_not_found(lesson_id: &str, course_id: &str) -> AppError {
    warn!("Lesson {} not found in course {}", lesson_id, course_id);
    AppError::NotFound(format!("Lesson with ID {} not found.", lesson_id))
}

/// Turns an editor payload into a lesson, keeping the quiz ID of the lesson it replaces.
fn build_lesson(id: String, existing: Option<&Lesson>, payload: UpsertLessonPayload) -> Lesson {
    let quiz_id = existing
        .map(|l| l.quiz.id.clone())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| helper::new_id("q"));

    Lesson {
        id,
        title: payload.title.trim().to_string(),
        description: payload.description,
        video_id: payload.video_id.trim().to_string(),
        duration: payload.duration,
        content: payload.content,
        materials: payload
            .materials
            .into_iter()
            .map(|m| Material {
                id: m.id.unwrap_or_else(|| helper::new_id("mat")),
                title: m.title.trim().to_string(),
                url: m.url.trim().to_string(),
                kind: m.kind,
            })
            .collect(),
        quiz: Quiz {
            id: quiz_id,
            question: payload.quiz.question,
            options: payload
                .quiz
                .options
                .into_iter()
                .map(|o| QuizOption {
                    id: o.id.unwrap_or_else(|| helper::new_id("opt")),
                    text: o.text,
                    is_correct: o.is_correct,
                })
                .collect(),
        },
        is_active: payload.is_active,
    }
}
