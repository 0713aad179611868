use crate::model::content::Course;
use crate::model::profile::User;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone)]
struct CachedProfile {
    user: User,
    pending_sync: bool,
}

/// Last known-good course trees and locally held profiles.
///
/// Courses are remembered after every successful read and served when the
/// store is unreachable. Profiles are remembered the same way, and also hold
/// optimistic completions whose remote write has not gone through yet.
#[derive(Default)]
pub struct SnapshotCache {
    courses: RwLock<HashMap<String, Course>>,
    profiles: RwLock<HashMap<String, CachedProfile>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn remember_course(&self, course: &Course) {
        self.courses
            .write()
            .await
            .insert(course.id.clone(), course.clone());
    }

    pub async fn last_known_course(&self, course_id: &str) -> Option<Course> {
        self.courses.read().await.get(course_id).cloned()
    }

    pub async fn forget_course(&self, course_id: &str) {
        self.courses.write().await.remove(course_id);
    }

    /// Stores a profile that matches what the store holds.
    pub async fn remember_profile(&self, user: &User) {
        self.profiles.write().await.insert(
            user.id.clone(),
            CachedProfile {
                user: user.clone(),
                pending_sync: false,
            },
        );
    }

    /// Stores a profile that is ahead of the store.
    pub async fn remember_unsynced_profile(&self, user: &User) {
        debug!("Caching unsynced profile for user_id: {}", user.id);
        self.profiles.write().await.insert(
            user.id.clone(),
            CachedProfile {
                user: user.clone(),
                pending_sync: true,
            },
        );
    }

    pub async fn last_known_profile(&self, user_id: &str) -> Option<User> {
        self.profiles
            .read()
            .await
            .get(user_id)
            .map(|cached| cached.user.clone())
    }

    /// The cached profile, only if it still carries changes the store has not seen.
    pub async fn pending_profile(&self, user_id: &str) -> Option<User> {
        self.profiles
            .read()
            .await
            .get(user_id)
            .filter(|cached| cached.pending_sync)
            .map(|cached| cached.user.clone())
    }
}

/// Merges a remote profile with a local one that is ahead of it.
///
/// Completions are append-only, so the union of both lists loses nothing;
/// points never go down. Derived fields must be recomputed by the caller.
pub fn reconcile_profiles(remote: &User, local: &User) -> User {
    let mut merged = remote.clone();
    for lesson_id in &local.completed_lessons {
        if !merged.has_completed(lesson_id) {
            merged.completed_lessons.push(lesson_id.clone());
        }
    }
    merged.points = remote.points.max(local.points);
    merged
}
