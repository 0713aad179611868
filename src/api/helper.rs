use crate::AppState;
use crate::errors::AppError;
use crate::model::content::Course;
use crate::model::profile::User;
use crate::model::student::SyncStatus;
use crate::progress::{compute_level, refresh_derived};
use crate::response::ApiResponse;
use crate::store::snapshot::reconcile_profiles;
use crate::store::{CompletionRecord, StoreError};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub(super) const STALE_MESSAGE: &str = "OK (served from last known course snapshot)";

/// A course as read for students, possibly from the fallback path.
pub(super) struct CourseRead {
    pub course: Course,
    pub stale: bool,
}

/// Wraps `data` in a 200 response, flagging answers built on a fallback snapshot.
pub(super) fn respond<T: Serialize>(data: T, stale: bool) -> ApiResponse<T> {
    let response = ApiResponse::ok(data);
    if stale {
        response.with_message(STALE_MESSAGE)
    } else {
        response
    }
}

/// Loads a course, falling back to the last good snapshot and then to an
/// empty course when the store fails. A course that does not exist is a 404.
pub(super) async fn load_course(state: &AppState, course_id: &str) -> Result<CourseRead, AppError> {
    match state.store.load_course(course_id).await {
        Ok(course) => {
            state.snapshots.remember_course(&course).await;
            Ok(CourseRead {
                course,
                stale: false,
            })
        }
        Err(StoreError::NotFound(what)) => {
            warn!("Course {} not found ({})", course_id, what);
            state.snapshots.forget_course(course_id).await;
            Err(AppError::NotFound(format!(
                "Course with ID {} not found.",
                course_id
            )))
        }
        Err(err) => {
            error!("Failed to load course {}: {}", course_id, err);
            let course = match state.snapshots.last_known_course(course_id).await {
                Some(snapshot) => {
                    warn!("Serving last known snapshot of course {}", course_id);
                    snapshot
                }
                None => {
                    warn!("No snapshot of course {}; serving an empty course", course_id);
                    Course::empty(course_id)
                }
            };
            Ok(CourseRead {
                course,
                stale: true,
            })
        }
    }
}

/// Loads a course for editing. Edits are never applied to a fallback copy.
pub(super) async fn load_course_for_edit(
    state: &AppState,
    course_id: &str,
) -> Result<Course, AppError> {
    let course = state.store.load_course(course_id).await.map_err(|err| match err {
        StoreError::NotFound(_) => {
            AppError::NotFound(format!("Course with ID {} not found.", course_id))
        }
        other => AppError::from(other),
    })?;
    state.snapshots.remember_course(&course).await;
    Ok(course)
}

/// Loads a student's profile.
///
/// A profile still holding a completion the store never received is merged
/// with the remote copy and written back. When the store is down the cached
/// profile is served, and without one the call fails with 503.
pub(super) async fn load_student(
    state: &AppState,
    user_id: &str,
    course: &Course,
) -> Result<User, AppError> {
    let user = match state.store.load_user(user_id).await {
        Ok(remote) => match state.snapshots.pending_profile(user_id).await {
            Some(local) => resync_profile(state, &remote, &local, Some(course)).await,
            None => {
                state.snapshots.remember_profile(&remote).await;
                remote
            }
        },
        Err(StoreError::NotFound(_)) => {
            warn!("User {} not found", user_id);
            return Err(AppError::NotFound(format!(
                "User with ID {} not found.",
                user_id
            )));
        }
        Err(err) => {
            error!("Failed to load user {}: {}", user_id, err);
            match state.snapshots.last_known_profile(user_id).await {
                Some(cached) => {
                    warn!("Serving cached profile of user {}", user_id);
                    cached
                }
                None => {
                    return Err(AppError::ServiceUnavailable(
                        "Profile is temporarily unavailable. Please try again later.".to_string(),
                    ));
                }
            }
        }
    };

    if !user.is_active {
        warn!("Deactivated user {} tried to access course content", user_id);
        return Err(AppError::Forbidden(format!(
            "User with ID {} is deactivated.",
            user_id
        )));
    }
    Ok(user)
}

/// Merges a local profile that is ahead of the store into the remote one and
/// tries to write the result back. Without a course the cached progress is kept.
pub(super) async fn resync_profile(
    state: &AppState,
    remote: &User,
    local: &User,
    course: Option<&Course>,
) -> User {
    info!("Reconciling unsynced profile of user {}", remote.id);
    let mut merged = reconcile_profiles(remote, local);
    match course {
        Some(course) => refresh_derived(&mut merged, course, &state.rules),
        None => {
            merged.progress = remote.progress.max(local.progress);
            merged.level = compute_level(merged.points, &state.rules);
        }
    }

    match state.store.update_user(&merged).await {
        Ok(()) => {
            info!("Unsynced profile of user {} written back", merged.id);
            state.snapshots.remember_profile(&merged).await;
        }
        Err(err) => {
            warn!("Profile of user {} is still unsynced: {}", merged.id, err);
            state.snapshots.remember_unsynced_profile(&merged).await;
        }
    }
    merged
}

/// Records an already applied completion locally, then mirrors it to the store.
/// A failed write keeps the local copy and is reported, never rolled back.
pub(super) async fn persist_completion(state: &AppState, user: &User, lesson_id: &str) -> SyncStatus {
    state.snapshots.remember_unsynced_profile(user).await;

    let record = CompletionRecord::from_user(user, lesson_id);
    debug!("Persisting completion record: {:?}", record);
    match state.store.persist_lesson_completion(&record).await {
        Ok(()) => {
            state.snapshots.remember_profile(user).await;
            SyncStatus::Synced
        }
        Err(err) => {
            error!(
                "Failed to persist completion of lesson {} for user {}: {}",
                lesson_id, user.id, err
            );
            SyncStatus::Failed(format!("Progress saved locally but not yet on the server: {}", err))
        }
    }
}

/// Ensures the caller is an active coordinator.
pub(super) async fn check_coordinator(
    state: &AppState,
    coordinator_id: &str,
) -> Result<User, AppError> {
    let user = match state.store.load_user(coordinator_id).await {
        Ok(user) => user,
        Err(StoreError::NotFound(_)) => {
            warn!("Unknown coordinator {}", coordinator_id);
            return Err(AppError::Forbidden(format!(
                "User {} is not a coordinator.",
                coordinator_id
            )));
        }
        Err(err) => return Err(err.into()),
    };

    if !user.is_coordinator() || !user.is_active {
        warn!(
            "User {} (role {}, active {}) attempted a coordinator operation",
            coordinator_id, user.role, user.is_active
        );
        return Err(AppError::Forbidden(format!(
            "User {} is not an active coordinator.",
            coordinator_id
        )));
    }
    debug!("Coordinator {} verified", coordinator_id);
    Ok(user)
}

/// Fresh identifier such as `l_4f0c…`.
pub(super) fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

/// Loose shape check: something before the `@`, a dotted domain after it.
pub(super) fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}
