use super::helper::{self, respond};
use crate::AppState;
use crate::errors::AppError;
use crate::model::profile::User;
use crate::model::student::{
    CertificateResponse, CourseOutlineResponse, DashboardResponse, LessonView,
    ModuleMaterialsResponse, NavigationResponse, ProfileResponse, QuizAnswerResponse,
    ResumePointResponse, SyncStatus,
};
use crate::payloads::student::{
    AnswerQuizPayload, CourseUserParams, GetLessonParams, ModuleMaterialsParams, NavigatePayload,
    UpdateProfilePayload,
};
use crate::progress::{
    LessonPosition, NavigationRejected, QuizOutcome, collect_module_materials, complete_lesson,
    completed_lesson_details, compute_level, course_outline, course_progress_percent,
    course_totals, evaluate_quiz_answer, find_resume_point, is_certificate_available,
    level_progress_fraction, next_lesson_position, refresh_derived, request_navigation,
};
use crate::response::ApiResponse;
use crate::store::StoreError;
use axum::Json;
use axum::extract::{Query, State};
use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

const RECENT_LESSONS_LIMIT: usize = 5;

/// Sidebar data for a student: every active module and lesson with its
/// completed/locked flags, the resume point and overall progress.
///
/// Query Parameters:
/// * `course_id`, `user_id`
///
/// Returns (wrapped in `ApiResponse`)
/// * `CourseOutlineResponse` (200 OK). When the store is unreachable the outline
///   is built from the last known course snapshot and the status message says so.
/// * `403 Forbidden`: If the user is deactivated.
/// * `404 Not Found`: If the course or user does not exist.
/// * `503 Service Unavailable`: If the profile cannot be read and none is cached.
#[instrument(skip(state, params))]
pub async fn get_course_outline(
    State(state): State<AppState>,
    Query(params): Query<CourseUserParams>,
) -> Result<ApiResponse<CourseOutlineResponse>, AppError> {
    info!(
        "Fetching course outline of course {} for user {}",
        params.course_id, params.user_id
    );

    let read = helper::load_course(&state, &params.course_id).await?;
    let user = helper::load_student(&state, &params.user_id, &read.course).await?;
    let course = &read.course;
    let completed = &user.completed_lessons;

    let response = CourseOutlineResponse {
        course_id: course.id.clone(),
        course_title: course.title.clone(),
        cover_url: course.cover_url.clone(),
        modules: course_outline(course, completed, false),
        resume_point: find_resume_point(course, completed),
        progress: course_progress_percent(course, completed),
    };

    debug!(
        "Outline has {} modules, resume point {:?}",
        response.modules.len(),
        response.resume_point
    );
    Ok(respond(response, read.stale))
}

/// Opens a lesson for viewing.
///
/// Quiz options are served without their correct flag.
///
/// Returns (wrapped in `ApiResponse`)
/// * `LessonView` (200 OK).
/// * `403 Forbidden`: If the lesson is locked; the message names the reason.
/// * `404 Not Found`: If the course, user or lesson does not exist.
#[instrument(skip(state, params))]
pub async fn get_lesson(
    State(state): State<AppState>,
    Query(params): Query<GetLessonParams>,
) -> Result<ApiResponse<LessonView>, AppError> {
    info!(
        "User {} opening lesson {}:{} of course {}",
        params.user_id, params.module_index, params.lesson_index, params.course_id
    );

    let read = helper::load_course(&state, &params.course_id).await?;
    let user = helper::load_student(&state, &params.user_id, &read.course).await?;
    let course = &read.course;

    let position = request_navigation(
        course,
        &user.completed_lessons,
        params.module_index,
        params.lesson_index,
    )
    .map_err(|reason| {
        warn!(
            "Lesson {}:{} refused for user {}: {}",
            params.module_index, params.lesson_index, params.user_id, reason
        );
        match reason {
            NavigationRejected::LessonNotFound => AppError::NotFound(format!(
                "Lesson {}:{} not found in course {}.",
                params.module_index, params.lesson_index, params.course_id
            )),
            _ => AppError::Forbidden(format!("Lesson is locked: {}", reason)),
        }
    })?;

    let module = &course.modules[position.module_index];
    let lesson = &module.lessons[position.lesson_index];
    let view = LessonView::new(
        position,
        &module.title,
        lesson,
        user.has_completed(&lesson.id),
        next_lesson_position(course, position),
    );

    Ok(respond(view, read.stale))
}

/// Asks whether the student may move to the given lesson.
///
/// Request Body: `NavigatePayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `NavigationResponse` (200 OK) with `accepted=false` and a reason when refused.
#[instrument(skip(state, payload))]
pub async fn navigate(
    State(state): State<AppState>,
    Json(payload): Json<NavigatePayload>,
) -> Result<ApiResponse<NavigationResponse>, AppError> {
    debug!("Navigate payload: {:?}", payload);

    let read = helper::load_course(&state, &payload.course_id).await?;
    let user = helper::load_student(&state, &payload.user_id, &read.course).await?;

    let result = request_navigation(
        &read.course,
        &user.completed_lessons,
        payload.module_index,
        payload.lesson_index,
    );
    if let Err(reason) = result {
        info!(
            "Navigation of user {} to {}:{} rejected: {}",
            payload.user_id, payload.module_index, payload.lesson_index, reason
        );
    }

    Ok(respond(NavigationResponse::from_result(result), read.stale))
}

/// Moves from the given lesson to the next active one, which may be in a
/// later module. The move is subject to the same gating as `navigate`.
///
/// Request Body: `NavigatePayload` holding the current position.
///
/// Returns (wrapped in `ApiResponse`)
/// * `NavigationResponse` (200 OK). At the end of the course the answer is
///   refused with `lesson_not_found`.
#[instrument(skip(state, payload))]
pub async fn next_lesson(
    State(state): State<AppState>,
    Json(payload): Json<NavigatePayload>,
) -> Result<ApiResponse<NavigationResponse>, AppError> {
    debug!("Next lesson payload: {:?}", payload);

    let read = helper::load_course(&state, &payload.course_id).await?;
    let user = helper::load_student(&state, &payload.user_id, &read.course).await?;

    let current = LessonPosition::new(payload.module_index, payload.lesson_index);
    let result = match next_lesson_position(&read.course, current) {
        Some(next) => request_navigation(
            &read.course,
            &user.completed_lessons,
            next.module_index,
            next.lesson_index,
        ),
        None => {
            info!("User {} is already at the last lesson", payload.user_id);
            Err(NavigationRejected::LessonNotFound)
        }
    };

    Ok(respond(NavigationResponse::from_result(result), read.stale))
}

/// Where the student should continue: the first active lesson not yet passed.
#[instrument(skip(state, params))]
pub async fn get_resume_point(
    State(state): State<AppState>,
    Query(params): Query<CourseUserParams>,
) -> Result<ApiResponse<ResumePointResponse>, AppError> {
    let read = helper::load_course(&state, &params.course_id).await?;
    let user = helper::load_student(&state, &params.user_id, &read.course).await?;
    let course = &read.course;

    let position = find_resume_point(course, &user.completed_lessons);
    let lesson_id = position
        .and_then(|p| course.lesson_at(p.module_index, p.lesson_index))
        .map(|l| l.id.clone());

    Ok(respond(
        ResumePointResponse {
            position,
            lesson_id,
            course_finished: is_certificate_available(course, &user.completed_lessons),
        },
        read.stale,
    ))
}

/// Submits an answer to a lesson's quiz. A correct answer completes the
/// lesson, awards XP and unlocks the next lesson.
///
/// The completion is applied locally first and then written to the store. A
/// failed write is reported in `sync` and retried on the next profile load;
/// the answer itself still counts.
///
/// Request Body: `AnswerQuizPayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `QuizAnswerResponse` (200 OK).
/// * `400 Bad Request`: If the option does not belong to the lesson's quiz.
/// * `403 Forbidden`: If the lesson is still locked for this user.
/// * `404 Not Found`: If the course, user or lesson does not exist.
#[instrument(skip(state, payload))]
pub async fn answer_quiz(
    State(state): State<AppState>,
    Json(payload): Json<AnswerQuizPayload>,
) -> Result<ApiResponse<QuizAnswerResponse>, AppError> {
    info!(
        "User {} answering quiz of lesson {} with option {}",
        payload.user_id, payload.lesson_id, payload.option_id
    );

    let read = helper::load_course(&state, &payload.course_id).await?;
    let course = &read.course;
    let user = helper::load_student(&state, &payload.user_id, course).await?;

    let (module_index, lesson_index) = course.locate_lesson(&payload.lesson_id).ok_or_else(|| {
        warn!(
            "Lesson {} not found in course {}",
            payload.lesson_id, payload.course_id
        );
        AppError::NotFound(format!("Lesson with ID {} not found.", payload.lesson_id))
    })?;
    let lesson = &course.modules[module_index].lessons[lesson_index];
    let position = LessonPosition::new(module_index, lesson_index);

    let already_completed = user.has_completed(&lesson.id);
    if !already_completed {
        request_navigation(course, &user.completed_lessons, module_index, lesson_index).map_err(
            |reason| {
                warn!(
                    "User {} answered quiz of locked lesson {}: {}",
                    payload.user_id, lesson.id, reason
                );
                AppError::Forbidden(format!("Lesson is locked: {}", reason))
            },
        )?;
    }

    let outcome = evaluate_quiz_answer(&lesson.quiz, &payload.option_id, already_completed);
    let (user, points_awarded, sync) = match outcome {
        QuizOutcome::UnknownOption => {
            warn!(
                "Option {} does not belong to quiz of lesson {}",
                payload.option_id, lesson.id
            );
            return Err(AppError::BadRequest(format!(
                "Option {} does not belong to the quiz of lesson {}.",
                payload.option_id, lesson.id
            )));
        }
        QuizOutcome::Correct => {
            let completion = complete_lesson(&user, &lesson.id, course, &state.rules);
            if completion.newly_completed {
                let sync = helper::persist_completion(&state, &completion.user, &lesson.id).await;
                (completion.user, completion.points_awarded, sync)
            } else {
                (completion.user, 0, SyncStatus::Unchanged)
            }
        }
        QuizOutcome::Incorrect | QuizOutcome::AlreadyAnswered => (user, 0, SyncStatus::Unchanged),
    };

    let lesson_completed = user.has_completed(&lesson.id);
    info!(
        "Quiz of lesson {} answered by user {}: {:?} (+{} XP)",
        lesson.id, user.id, outcome, points_awarded
    );

    let response = QuizAnswerResponse {
        outcome,
        lesson_completed,
        points_awarded,
        points: user.points,
        level: user.level,
        progress: user.progress,
        next_position: if lesson_completed {
            next_lesson_position(course, position)
        } else {
            None
        },
        certificate_available: is_certificate_available(course, &user.completed_lessons),
        sync,
    };
    Ok(respond(response, read.stale))
}

/// Dashboard figures for a student.
///
/// Progress counts active lessons only; level and XP figures follow the
/// configured level curve.
#[instrument(skip(state, params))]
pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(params): Query<CourseUserParams>,
) -> Result<ApiResponse<DashboardResponse>, AppError> {
    info!(
        "Fetching dashboard of user {} for course {}",
        params.user_id, params.course_id
    );

    let read = helper::load_course(&state, &params.course_id).await?;
    let user = helper::load_student(&state, &params.user_id, &read.course).await?;
    let course = &read.course;
    let completed = &user.completed_lessons;

    let totals = course_totals(course, completed);
    let step = state.rules.xp_per_level.max(1);

    let response = DashboardResponse {
        user_name: user.name.clone(),
        course_title: course.title.clone(),
        progress: course_progress_percent(course, completed),
        points: user.points,
        level: compute_level(user.points, &state.rules),
        level_progress: level_progress_fraction(user.points, &state.rules),
        xp_to_next_level: step - user.points % step,
        total_lessons: totals.total_active_lessons,
        completed_lessons: totals.completed_active_lessons,
        badges: user.badges.clone(),
        resume_point: find_resume_point(course, completed),
        certificate_available: is_certificate_available(course, completed),
    };
    Ok(respond(response, read.stale))
}

/// Lists every material attached to the lessons of one module.
///
/// Returns (wrapped in `ApiResponse`)
/// * `ModuleMaterialsResponse` (200 OK).
/// * `404 Not Found`: If the course or module does not exist or the module is inactive.
#[instrument(skip(state, params))]
pub async fn get_module_materials(
    State(state): State<AppState>,
    Query(params): Query<ModuleMaterialsParams>,
) -> Result<ApiResponse<ModuleMaterialsResponse>, AppError> {
    let read = helper::load_course(&state, &params.course_id).await?;

    let module = read
        .course
        .modules
        .iter()
        .find(|m| m.id == params.module_id && m.is_active)
        .ok_or_else(|| {
            warn!(
                "Module {} not found in course {}",
                params.module_id, params.course_id
            );
            AppError::NotFound(format!("Module with ID {} not found.", params.module_id))
        })?;

    let materials = collect_module_materials(module);
    debug!("Module {} has {} materials", module.id, materials.len());

    Ok(respond(
        ModuleMaterialsResponse {
            module_id: module.id.clone(),
            module_title: module.title.clone(),
            materials,
        },
        read.stale,
    ))
}

/// Profile screen: the user with derived figures recomputed against the
/// current course, plus the most recently listed completed lessons.
#[instrument(skip(state, params))]
pub async fn get_profile(
    State(state): State<AppState>,
    Query(params): Query<CourseUserParams>,
) -> Result<ApiResponse<ProfileResponse>, AppError> {
    let read = helper::load_course(&state, &params.course_id).await?;
    let course = &read.course;
    let mut user = helper::load_student(&state, &params.user_id, course).await?;
    refresh_derived(&mut user, course, &state.rules);

    let response = ProfileResponse {
        level_progress: level_progress_fraction(user.points, &state.rules),
        recent_lessons: completed_lesson_details(
            course,
            &user.completed_lessons,
            RECENT_LESSONS_LIMIT,
        ),
        certificate_available: is_certificate_available(course, &user.completed_lessons),
        user,
    };
    Ok(respond(response, read.stale))
}

/// Updates a user's own name, email and avatar.
///
/// Request Body: `UpdateProfilePayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `User`: The stored profile (200 OK).
/// * `400 Bad Request`: If the name is empty or the email is malformed.
/// * `404 Not Found`: If the user does not exist.
/// * `409 Conflict`: If the email belongs to another user.
/// * `503 Service Unavailable`: If the store cannot be reached.
#[instrument(skip(state, payload), fields(user_id = %payload.user_id))]
pub async fn update_profile(
    State(state): State<AppState>,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<ApiResponse<User>, AppError> {
    debug!("Update profile payload: {:?}", payload);

    let name = payload.name.trim();
    let email = payload.email.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name must not be empty.".to_string()));
    }
    if !helper::is_plausible_email(email) {
        return Err(AppError::BadRequest(format!("'{}' is not a valid email.", email)));
    }

    let remote = match state.store.load_user(&payload.user_id).await {
        Ok(user) => user,
        Err(StoreError::Backend(err)) => {
            error!("Cannot load user {} for a profile update: {}", payload.user_id, err);
            return Err(AppError::ServiceUnavailable(
                "Profile cannot be updated right now. Please try again later.".to_string(),
            ));
        }
        Err(err) => return Err(err.into()),
    };
    let mut user = match state.snapshots.pending_profile(&payload.user_id).await {
        Some(local) => helper::resync_profile(&state, &remote, &local, None).await,
        None => remote,
    };

    user.name = name.to_string();
    user.email = email.to_string();
    user.avatar_url = payload
        .avatar_url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty());

    state.store.update_user(&user).await?;
    state.snapshots.remember_profile(&user).await;

    info!("Profile of user {} updated", user.id);
    Ok(ApiResponse::ok(user))
}

/// Data for the certificate renderer. Only available once the last active
/// lesson of the course has been passed.
///
/// Returns (wrapped in `ApiResponse`)
/// * `CertificateResponse` (200 OK), dated with the time of the request.
/// * `403 Forbidden`: If the course is not finished yet.
/// * `404 Not Found`: If the course or user does not exist.
#[instrument(skip(state, params))]
pub async fn get_certificate(
    State(state): State<AppState>,
    Query(params): Query<CourseUserParams>,
) -> Result<ApiResponse<CertificateResponse>, AppError> {
    let read = helper::load_course(&state, &params.course_id).await?;
    let user = helper::load_student(&state, &params.user_id, &read.course).await?;
    let course = read.course;

    if !is_certificate_available(&course, &user.completed_lessons) {
        warn!(
            "User {} requested a certificate for unfinished course {}",
            params.user_id, params.course_id
        );
        return Err(AppError::Forbidden(
            "Certificate is not available: the course is not completed yet.".to_string(),
        ));
    }

    info!(
        "Issuing certificate of course {} for user {}",
        course.id, user.id
    );
    Ok(respond(
        CertificateResponse {
            student_name: user.name,
            course_title: course.title,
            completion_date: Utc::now(),
            certificate_config: course.certificate_config,
        },
        read.stale,
    ))
}
