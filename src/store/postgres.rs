use super::{CompletionRecord, ContentStore, StoreError};
use crate::model::content::{CertificateConfig, Course, Lesson, Module};
use crate::model::profile::User;
use crate::model::records::{
    to_db_int, CourseRow, CourseRows, LessonRow, MaterialRow, ModuleRow, ProfileRow,
    QuizOptionRow, QuizRow,
};
use crate::schema::{
    courses::dsl as courses_dsl, lessons::dsl as lessons_dsl, materials::dsl as materials_dsl,
    modules::dsl as modules_dsl, profiles::dsl as profiles_dsl,
    quiz_options::dsl as options_dsl, quizzes::dsl as quizzes_dsl,
};
use async_trait::async_trait;
use chrono::Utc;
use deadpool_diesel::postgres::Pool;
use diesel::{
    Connection, ExpressionMethods, OptionalExtension, PgConnection, QueryDsl, RunQueryDsl,
    SelectableHelper,
};
use tracing::{debug, error, info, instrument};

/// Course and profile store backed by PostgreSQL through a deadpool-diesel pool.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    pub fn new(pool: Pool) -> Self {
        PgStore { pool }
    }

    /// Runs `query` on a pooled connection.
    async fn run_query<T, F>(&self, query: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut PgConnection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.pool.get().await.map_err(|pool_err| {
            error!("Failed to get DB connection object from pool: {:?}", pool_err);
            StoreError::from(pool_err)
        })?;
        debug!("DB connection object obtained from pool for interaction");

        match conn.interact(query).await {
            Ok(result) => result,
            Err(interact_err) => Err(StoreError::from(interact_err)),
        }
    }
}

fn read_course(conn: &mut PgConnection, course_id: &str) -> Result<Course, StoreError> {
    let course = courses_dsl::courses
        .find(course_id)
        .select(CourseRow::as_select())
        .first::<CourseRow>(conn)
        .optional()?
        .ok_or_else(|| StoreError::NotFound(format!("course {}", course_id)))?;

    let modules = modules_dsl::modules
        .filter(modules_dsl::course_id.eq(course_id))
        .order((modules_dsl::order_index.asc(), modules_dsl::id.asc()))
        .select(ModuleRow::as_select())
        .load::<ModuleRow>(conn)?;
    let module_ids: Vec<String> = modules.iter().map(|m| m.id.clone()).collect();

    let lessons = lessons_dsl::lessons
        .filter(lessons_dsl::module_id.eq_any(&module_ids))
        .order((lessons_dsl::order_index.asc(), lessons_dsl::id.asc()))
        .select(LessonRow::as_select())
        .load::<LessonRow>(conn)?;
    let lesson_ids: Vec<String> = lessons.iter().map(|l| l.id.clone()).collect();

    let materials = materials_dsl::materials
        .filter(materials_dsl::lesson_id.eq_any(&lesson_ids))
        .order((materials_dsl::order_index.asc(), materials_dsl::id.asc()))
        .select(MaterialRow::as_select())
        .load::<MaterialRow>(conn)?;

    let quizzes = quizzes_dsl::quizzes
        .filter(quizzes_dsl::lesson_id.eq_any(&lesson_ids))
        .select(QuizRow::as_select())
        .load::<QuizRow>(conn)?;
    let quiz_ids: Vec<String> = quizzes.iter().map(|q| q.id.clone()).collect();

    let options = options_dsl::quiz_options
        .filter(options_dsl::quiz_id.eq_any(&quiz_ids))
        .order((options_dsl::order_index.asc(), options_dsl::id.asc()))
        .select(QuizOptionRow::as_select())
        .load::<QuizOptionRow>(conn)?;

    debug!(
        "Course {}: {} modules, {} lessons, {} quizzes",
        course_id,
        modules.len(),
        lessons.len(),
        quizzes.len()
    );

    Ok(CourseRows {
        course,
        modules,
        lessons,
        materials,
        quizzes,
        options,
    }
    .into_course())
}

fn replace_lesson_children(conn: &mut PgConnection, lesson: &Lesson) -> Result<(), StoreError> {
    diesel::delete(materials_dsl::materials.filter(materials_dsl::lesson_id.eq(&lesson.id)))
        .execute(conn)?;
    let material_rows = MaterialRow::for_lesson(lesson);
    if !material_rows.is_empty() {
        diesel::insert_into(materials_dsl::materials)
            .values(&material_rows)
            .execute(conn)?;
    }

    // Options go with the quiz through the cascade.
    diesel::delete(quizzes_dsl::quizzes.filter(quizzes_dsl::lesson_id.eq(&lesson.id)))
        .execute(conn)?;
    if lesson.quiz.id.is_empty() {
        return Ok(());
    }
    diesel::insert_into(quizzes_dsl::quizzes)
        .values(&QuizRow {
            id: lesson.quiz.id.clone(),
            lesson_id: lesson.id.clone(),
            question: lesson.quiz.question.clone(),
        })
        .execute(conn)?;
    let option_rows = QuizOptionRow::for_quiz(&lesson.quiz);
    if !option_rows.is_empty() {
        diesel::insert_into(options_dsl::quiz_options)
            .values(&option_rows)
            .execute(conn)?;
    }
    Ok(())
}

fn expect_rows(affected: usize, what: String) -> Result<(), StoreError> {
    if affected == 0 {
        Err(StoreError::NotFound(what))
    } else {
        Ok(())
    }
}

#[async_trait]
impl ContentStore for PgStore {
    #[instrument(skip(self))]
    async fn load_course(&self, course_id: &str) -> Result<Course, StoreError> {
        let course_id = course_id.to_string();
        self.run_query(move |conn| read_course(conn, &course_id)).await
    }

    #[instrument(skip(self))]
    async fn load_users(&self) -> Result<Vec<User>, StoreError> {
        let rows = self
            .run_query(|conn| {
                profiles_dsl::profiles
                    .order((profiles_dsl::name.asc(), profiles_dsl::id.asc()))
                    .select(ProfileRow::as_select())
                    .load::<ProfileRow>(conn)
                    .map_err(StoreError::from)
            })
            .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    #[instrument(skip(self))]
    async fn load_user(&self, user_id: &str) -> Result<User, StoreError> {
        let id = user_id.to_string();
        let row = self
            .run_query(move |conn| {
                profiles_dsl::profiles
                    .find(&id)
                    .select(ProfileRow::as_select())
                    .first::<ProfileRow>(conn)
                    .optional()
                    .map_err(StoreError::from)
            })
            .await?;
        row.map(User::from)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", user_id)))
    }

    #[instrument(skip(self, record), fields(user_id = %record.user_id, lesson_id = %record.lesson_id))]
    async fn persist_lesson_completion(
        &self,
        record: &CompletionRecord,
    ) -> Result<(), StoreError> {
        let record = record.clone();
        self.run_query(move |conn| {
            let affected = diesel::update(profiles_dsl::profiles.find(&record.user_id))
                .set((
                    profiles_dsl::completed_lessons.eq(&record.completed_lessons),
                    profiles_dsl::points.eq(to_db_int(record.points)),
                    profiles_dsl::progress.eq(i32::from(record.progress)),
                    profiles_dsl::level.eq(to_db_int(record.level)),
                    profiles_dsl::last_access.eq(Some(Utc::now())),
                ))
                .execute(conn)?;
            expect_rows(affected, format!("user {}", record.user_id))
        })
        .await?;
        info!("Persisted completion of a lesson");
        Ok(())
    }

    #[instrument(skip(self, module_ids))]
    async fn reorder_modules(
        &self,
        course_id: &str,
        module_ids: &[String],
    ) -> Result<(), StoreError> {
        let course_id = course_id.to_string();
        let module_ids = module_ids.to_vec();
        self.run_query(move |conn| {
            conn.transaction::<_, StoreError, _>(|tx| {
                for (idx, module_id) in module_ids.iter().enumerate() {
                    let affected = diesel::update(
                        modules_dsl::modules
                            .filter(modules_dsl::id.eq(module_id))
                            .filter(modules_dsl::course_id.eq(&course_id)),
                    )
                    .set(modules_dsl::order_index.eq(to_db_int(idx)))
                    .execute(tx)?;
                    expect_rows(affected, format!("module {} in course {}", module_id, course_id))?;
                }
                Ok(())
            })
        })
        .await
    }

    #[instrument(skip(self, lesson_ids))]
    async fn reorder_lessons(
        &self,
        module_id: &str,
        lesson_ids: &[String],
    ) -> Result<(), StoreError> {
        let module_id = module_id.to_string();
        let lesson_ids = lesson_ids.to_vec();
        self.run_query(move |conn| {
            conn.transaction::<_, StoreError, _>(|tx| {
                for (idx, lesson_id) in lesson_ids.iter().enumerate() {
                    let affected = diesel::update(
                        lessons_dsl::lessons
                            .filter(lessons_dsl::id.eq(lesson_id))
                            .filter(lessons_dsl::module_id.eq(&module_id)),
                    )
                    .set(lessons_dsl::order_index.eq(to_db_int(idx)))
                    .execute(tx)?;
                    expect_rows(affected, format!("lesson {} in module {}", lesson_id, module_id))?;
                }
                Ok(())
            })
        })
        .await
    }

    #[instrument(skip(self, module), fields(module_id = %module.id))]
    async fn upsert_module(
        &self,
        course_id: &str,
        module: &Module,
        order_index: usize,
    ) -> Result<(), StoreError> {
        let row = ModuleRow::from_module(course_id, module, order_index);
        self.run_query(move |conn| {
            conn.transaction::<_, StoreError, _>(|tx| {
                let owner: Option<String> = modules_dsl::modules
                    .find(&row.id)
                    .select(modules_dsl::course_id)
                    .first(tx)
                    .optional()?;
                if let Some(owner) = owner.filter(|owner| *owner != row.course_id) {
                    return Err(StoreError::Conflict(format!(
                        "module {} belongs to course {}",
                        row.id, owner
                    )));
                }

                diesel::insert_into(modules_dsl::modules)
                    .values(&row)
                    .on_conflict(modules_dsl::id)
                    .do_update()
                    .set((
                        modules_dsl::title.eq(&row.title),
                        modules_dsl::description.eq(&row.description),
                        modules_dsl::is_locked.eq(row.is_locked),
                        modules_dsl::is_active.eq(row.is_active),
                    ))
                    .execute(tx)?;
                Ok(())
            })
        })
        .await
    }

    #[instrument(skip(self, lesson), fields(lesson_id = %lesson.id))]
    async fn upsert_lesson(
        &self,
        module_id: &str,
        lesson: &Lesson,
        order_index: usize,
    ) -> Result<(), StoreError> {
        let lesson = lesson.clone();
        let row = LessonRow::from_lesson(module_id, &lesson, order_index);
        self.run_query(move |conn| {
            conn.transaction::<_, StoreError, _>(|tx| {
                let owner: Option<String> = lessons_dsl::lessons
                    .find(&row.id)
                    .select(lessons_dsl::module_id)
                    .first(tx)
                    .optional()?;
                if let Some(owner) = owner.filter(|owner| *owner != row.module_id) {
                    return Err(StoreError::Conflict(format!(
                        "lesson {} belongs to module {}",
                        row.id, owner
                    )));
                }

                diesel::insert_into(lessons_dsl::lessons)
                    .values(&row)
                    .on_conflict(lessons_dsl::id)
                    .do_update()
                    .set((
                        lessons_dsl::title.eq(&row.title),
                        lessons_dsl::description.eq(&row.description),
                        lessons_dsl::video_id.eq(&row.video_id),
                        lessons_dsl::duration.eq(&row.duration),
                        lessons_dsl::content.eq(&row.content),
                        lessons_dsl::is_active.eq(row.is_active),
                    ))
                    .execute(tx)?;
                replace_lesson_children(tx, &lesson)
            })
        })
        .await
    }

    #[instrument(skip(self))]
    async fn delete_module(&self, module_id: &str) -> Result<(), StoreError> {
        let module_id = module_id.to_string();
        self.run_query(move |conn| {
            let affected = diesel::delete(modules_dsl::modules.find(&module_id)).execute(conn)?;
            expect_rows(affected, format!("module {}", module_id))
        })
        .await
    }

    #[instrument(skip(self))]
    async fn delete_lesson(&self, lesson_id: &str) -> Result<(), StoreError> {
        let lesson_id = lesson_id.to_string();
        self.run_query(move |conn| {
            let affected = diesel::delete(lessons_dsl::lessons.find(&lesson_id)).execute(conn)?;
            expect_rows(affected, format!("lesson {}", lesson_id))
        })
        .await
    }

    #[instrument(skip(self, config))]
    async fn update_certificate_config(
        &self,
        course_id: &str,
        config: &CertificateConfig,
    ) -> Result<(), StoreError> {
        let course_id = course_id.to_string();
        let document = serde_json::to_value(config)
            .map_err(|e| StoreError::Invalid(format!("certificate config: {}", e)))?;
        self.run_query(move |conn| {
            let affected = diesel::update(courses_dsl::courses.find(&course_id))
                .set((
                    courses_dsl::certificate_config.eq(&document),
                    courses_dsl::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;
            expect_rows(affected, format!("course {}", course_id))
        })
        .await
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        let row = ProfileRow::from(user);
        self.run_query(move |conn| {
            diesel::insert_into(profiles_dsl::profiles)
                .values(&row)
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        let row = ProfileRow::from(user);
        self.run_query(move |conn| {
            let affected = diesel::update(profiles_dsl::profiles.find(&row.id))
                .set(&row)
                .execute(conn)?;
            expect_rows(affected, format!("user {}", row.id))
        })
        .await
    }
}
