//! Boundary to the persistent course and profile store.
//!
//! The engine never talks to storage. Handlers read a snapshot through
//! [`ContentStore`], run the engine on it, and write the outcome back.

use crate::model::content::{CertificateConfig, Course, Lesson, Module};
use crate::model::profile::User;
use async_trait::async_trait;
use deadpool_diesel::InteractError;
use deadpool_diesel::postgres::PoolError;
use tracing::error;

pub mod memory;
pub mod postgres;
pub mod snapshot;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use snapshot::SnapshotCache;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid data: {0}")]
    Invalid(String),

    /// The store could not be reached or failed while executing.
    #[error("storage backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

impl From<PoolError> for StoreError {
    fn from(err: PoolError) -> Self {
        error!("Database pool error encountered: {:?}", err);
        StoreError::Backend(anyhow::Error::new(err).context("Database pool error"))
    }
}

impl From<InteractError> for StoreError {
    fn from(err: InteractError) -> Self {
        error!("Database interaction error encountered: {:?}", err);
        StoreError::Backend(anyhow::anyhow!("Database interaction error: {}", err))
    }
}

impl From<diesel::result::Error> for StoreError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error as DieselError};
        match err {
            DieselError::NotFound => StoreError::NotFound("database row".to_string()),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                StoreError::Conflict(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                StoreError::NotFound(info.message().to_string())
            }
            _ => {
                error!("Unhandled Diesel error encountered: {:?}", err);
                StoreError::Backend(anyhow::Error::new(err).context("Database query error"))
            }
        }
    }
}

/// Result of a lesson completion as it has to be mirrored remotely.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRecord {
    pub user_id: String,
    pub lesson_id: String,
    pub points: u32,
    pub progress: u8,
    pub level: u32,
    pub completed_lessons: Vec<String>,
}

impl CompletionRecord {
    pub fn from_user(user: &User, lesson_id: &str) -> Self {
        CompletionRecord {
            user_id: user.id.clone(),
            lesson_id: lesson_id.to_string(),
            points: user.points,
            progress: user.progress,
            level: user.level,
            completed_lessons: user.completed_lessons.clone(),
        }
    }
}

#[async_trait]
pub trait ContentStore: Send + Sync + 'static {
    // reads

    async fn load_course(&self, course_id: &str) -> Result<Course, StoreError>;

    async fn load_users(&self) -> Result<Vec<User>, StoreError>;

    async fn load_user(&self, user_id: &str) -> Result<User, StoreError>;

    // progress

    async fn persist_lesson_completion(&self, record: &CompletionRecord)
    -> Result<(), StoreError>;

    // content editing

    /// Rewrites module order so that `module_ids[i]` gets order index `i`.
    async fn reorder_modules(&self, course_id: &str, module_ids: &[String])
    -> Result<(), StoreError>;

    async fn reorder_lessons(&self, module_id: &str, lesson_ids: &[String])
    -> Result<(), StoreError>;

    /// Inserts or replaces a module's own fields. Its lessons are not touched.
    async fn upsert_module(
        &self,
        course_id: &str,
        module: &Module,
        order_index: usize,
    ) -> Result<(), StoreError>;

    /// Inserts or replaces a lesson together with its materials and quiz.
    async fn upsert_lesson(
        &self,
        module_id: &str,
        lesson: &Lesson,
        order_index: usize,
    ) -> Result<(), StoreError>;

    async fn delete_module(&self, module_id: &str) -> Result<(), StoreError>;

    async fn delete_lesson(&self, lesson_id: &str) -> Result<(), StoreError>;

    async fn update_certificate_config(
        &self,
        course_id: &str,
        config: &CertificateConfig,
    ) -> Result<(), StoreError>;

    // profiles

    async fn create_user(&self, user: &User) -> Result<(), StoreError>;

    /// Replaces the editable profile fields and progress of an existing user.
    async fn update_user(&self, user: &User) -> Result<(), StoreError>;
}
