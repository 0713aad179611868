use super::{CompletionRecord, ContentStore, StoreError};
use crate::model::content::{CertificateConfig, Course, Lesson, Module};
use crate::model::profile::User;
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct MemoryData {
    courses: HashMap<String, Course>,
    users: HashMap<String, User>,
}

/// Process-local store. Reads and writes can be made to fail on demand so the
/// fallback and optimistic-write paths can be driven without a database.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<MemoryData>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new(courses: Vec<Course>, users: Vec<User>) -> Self {
        let data = MemoryData {
            courses: courses.into_iter().map(|c| (c.id.clone(), c)).collect(),
            users: users.into_iter().map(|u| (u.id.clone(), u)).collect(),
        };
        MemoryStore {
            data: RwLock::new(data),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_read(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            debug!("Memory store configured to fail reads");
            return Err(StoreError::Backend(anyhow!("store unavailable (reads disabled)")));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            debug!("Memory store configured to fail writes");
            return Err(StoreError::Backend(anyhow!("store unavailable (writes disabled)")));
        }
        Ok(())
    }
}

impl MemoryData {
    fn course_mut(&mut self, course_id: &str) -> Result<&mut Course, StoreError> {
        self.courses
            .get_mut(course_id)
            .ok_or_else(|| StoreError::NotFound(format!("course {}", course_id)))
    }

    fn module_mut(&mut self, module_id: &str) -> Result<&mut Module, StoreError> {
        self.courses
            .values_mut()
            .flat_map(|c| c.modules.iter_mut())
            .find(|m| m.id == module_id)
            .ok_or_else(|| StoreError::NotFound(format!("module {}", module_id)))
    }
}

/// Reorders `items` to follow `ids`, which must name every item exactly once.
fn reorder_by_id<T>(
    items: &mut Vec<T>,
    ids: &[String],
    id_of: impl Fn(&T) -> &str,
) -> Result<(), StoreError> {
    let mut current: Vec<&str> = items.iter().map(&id_of).collect();
    let mut wanted: Vec<&str> = ids.iter().map(String::as_str).collect();
    current.sort_unstable();
    wanted.sort_unstable();
    if current != wanted {
        return Err(StoreError::Invalid(
            "new order must list every existing item exactly once".to_string(),
        ));
    }

    let mut remaining: Vec<Option<T>> = std::mem::take(items).into_iter().map(Some).collect();
    for id in ids {
        if let Some(slot) = remaining
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|item| id_of(item) == id.as_str()))
        {
            if let Some(item) = slot.take() {
                items.push(item);
            }
        }
    }
    Ok(())
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn load_course(&self, course_id: &str) -> Result<Course, StoreError> {
        self.check_read()?;
        self.data
            .read()
            .await
            .courses
            .get(course_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("course {}", course_id)))
    }

    async fn load_users(&self) -> Result<Vec<User>, StoreError> {
        self.check_read()?;
        let mut users: Vec<User> = self.data.read().await.users.values().cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn load_user(&self, user_id: &str) -> Result<User, StoreError> {
        self.check_read()?;
        self.data
            .read()
            .await
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user {}", user_id)))
    }

    async fn persist_lesson_completion(
        &self,
        record: &CompletionRecord,
    ) -> Result<(), StoreError> {
        self.check_write()?;
        let mut data = self.data.write().await;
        let user = data
            .users
            .get_mut(&record.user_id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", record.user_id)))?;
        user.completed_lessons = record.completed_lessons.clone();
        user.points = record.points;
        user.progress = record.progress;
        user.level = record.level;
        user.last_access = Some(Utc::now());
        Ok(())
    }

    async fn reorder_modules(
        &self,
        course_id: &str,
        module_ids: &[String],
    ) -> Result<(), StoreError> {
        self.check_write()?;
        let mut data = self.data.write().await;
        let course = data.course_mut(course_id)?;
        reorder_by_id(&mut course.modules, module_ids, |m| m.id.as_str())
    }

    async fn reorder_lessons(
        &self,
        module_id: &str,
        lesson_ids: &[String],
    ) -> Result<(), StoreError> {
        self.check_write()?;
        let mut data = self.data.write().await;
        let module = data.module_mut(module_id)?;
        reorder_by_id(&mut module.lessons, lesson_ids, |l| l.id.as_str())
    }

    async fn upsert_module(
        &self,
        course_id: &str,
        module: &Module,
        order_index: usize,
    ) -> Result<(), StoreError> {
        self.check_write()?;
        let mut data = self.data.write().await;
        if let Some(owner) = data
            .courses
            .values()
            .find(|c| c.id != course_id && c.modules.iter().any(|m| m.id == module.id))
        {
            return Err(StoreError::Conflict(format!(
                "module {} belongs to course {}",
                module.id, owner.id
            )));
        }
        let course = data.course_mut(course_id)?;
        match course.modules.iter_mut().find(|m| m.id == module.id) {
            Some(existing) => {
                existing.title = module.title.clone();
                existing.description = module.description.clone();
                existing.is_locked = module.is_locked;
                existing.is_active = module.is_active;
            }
            None => {
                let mut fresh = module.clone();
                fresh.lessons.clear();
                let at = order_index.min(course.modules.len());
                course.modules.insert(at, fresh);
            }
        }
        Ok(())
    }

    async fn upsert_lesson(
        &self,
        module_id: &str,
        lesson: &Lesson,
        order_index: usize,
    ) -> Result<(), StoreError> {
        self.check_write()?;
        let mut data = self.data.write().await;
        if let Some(owner) = data
            .courses
            .values()
            .flat_map(|c| c.modules.iter())
            .find(|m| m.id != module_id && m.lessons.iter().any(|l| l.id == lesson.id))
        {
            return Err(StoreError::Conflict(format!(
                "lesson {} belongs to module {}",
                lesson.id, owner.id
            )));
        }
        let module = data.module_mut(module_id)?;
        match module.lessons.iter_mut().find(|l| l.id == lesson.id) {
            Some(existing) => *existing = lesson.clone(),
            None => {
                let at = order_index.min(module.lessons.len());
                module.lessons.insert(at, lesson.clone());
            }
        }
        Ok(())
    }

    async fn delete_module(&self, module_id: &str) -> Result<(), StoreError> {
        self.check_write()?;
        let mut data = self.data.write().await;
        for course in data.courses.values_mut() {
            if let Some(idx) = course.modules.iter().position(|m| m.id == module_id) {
                course.modules.remove(idx);
                return Ok(());
            }
        }
        Err(StoreError::NotFound(format!("module {}", module_id)))
    }

    async fn delete_lesson(&self, lesson_id: &str) -> Result<(), StoreError> {
        self.check_write()?;
        let mut data = self.data.write().await;
        for module in data.courses.values_mut().flat_map(|c| c.modules.iter_mut()) {
            if let Some(idx) = module.lessons.iter().position(|l| l.id == lesson_id) {
                module.lessons.remove(idx);
                return Ok(());
            }
        }
        Err(StoreError::NotFound(format!("lesson {}", lesson_id)))
    }

    async fn update_certificate_config(
        &self,
        course_id: &str,
        config: &CertificateConfig,
    ) -> Result<(), StoreError> {
        self.check_write()?;
        let mut data = self.data.write().await;
        data.course_mut(course_id)?.certificate_config = config.clone();
        Ok(())
    }

    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        self.check_write()?;
        let mut data = self.data.write().await;
        if data.users.contains_key(&user.id) {
            return Err(StoreError::Conflict(format!("user {} already exists", user.id)));
        }
        if data.users.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(StoreError::Conflict(format!(
                "email {} is already registered",
                user.email
            )));
        }
        data.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        self.check_write()?;
        let mut data = self.data.write().await;
        if data
            .users
            .values()
            .any(|u| u.id != user.id && u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::Conflict(format!(
                "email {} is already registered",
                user.email
            )));
        }
        let existing = data
            .users
            .get_mut(&user.id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", user.id)))?;
        *existing = user.clone();
        Ok(())
    }
}
