// src/db/academic_repo.rs

use sqlx::{postgres::PgRow, types::Json, Executor, FromRow, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{conflict_on_unique, map_constraint_error},
        error::AppError,
        pagination::{Page, PageRequest},
        query::{fetch_page, push_scope, push_search, search_pattern, OrderBy},
    },
    models::academic::{
        CatalogFilter, ClassSection, ClassSectionSubjectTeacher, CreateCatalogEntryPayload,
        CreateTeacherPayload, CsstFilter, Subject, Teacher, TeacherFilter, TeacherSnapshot,
        UpdateTeacherPayload,
    },
};

pub const TEACHER_SORT_KEYS: &[(&str, &str)] = &[
    ("name", "name"),
    ("code", "code"),
    ("created_at", "created_at"),
];

pub const CATALOG_SORT_KEYS: &[(&str, &str)] = &[
    ("name", "name"),
    ("code", "code"),
    ("created_at", "created_at"),
];

pub const CSST_SORT_KEYS: &[(&str, &str)] = &[
    ("section", "section_name_snapshot"),
    ("subject", "subject_name_snapshot"),
    ("created_at", "created_at"),
];

// Turmas e disciplinas têm o mesmo formato; só muda a tabela.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Catalog {
    ClassSections,
    Subjects,
}

impl Catalog {
    fn table(self) -> &'static str {
        match self {
            Catalog::ClassSections => "class_sections",
            Catalog::Subjects => "subjects",
        }
    }

    pub fn resource(self) -> &'static str {
        match self {
            Catalog::ClassSections => "class_section",
            Catalog::Subjects => "subject",
        }
    }
}

#[derive(Clone)]
pub struct AcademicRepository {
    pool: PgPool,
}

impl AcademicRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  PROFESSORES
    // =========================================================================

    pub async fn create_teacher<'e, E>(
        &self,
        executor: E,
        masjid_id: Uuid,
        payload: &CreateTeacherPayload,
    ) -> Result<Teacher, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Teacher>(
            r#"
            INSERT INTO masjid_teachers (masjid_id, user_id, name, code, avatar_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(masjid_id)
        .bind(payload.user_id)
        .bind(payload.name.trim())
        .bind(payload.code.as_deref().map(str::trim))
        .bind(payload.avatar_url.as_deref())
        .fetch_one(executor)
        .await
        .map_err(|e| map_constraint_error(e, conflict_on_unique("teacher_code")))
    }

    pub async fn find_teacher(&self, masjid_id: Uuid, id: Uuid) -> Result<Option<Teacher>, AppError> {
        let teacher = sqlx::query_as::<_, Teacher>(
            "SELECT * FROM masjid_teachers WHERE masjid_id = $1 AND id = $2 AND deleted_at IS NULL",
        )
        .bind(masjid_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(teacher)
    }

    pub async fn lock_teacher<'e, E>(
        &self,
        executor: E,
        masjid_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Teacher>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let teacher = sqlx::query_as::<_, Teacher>(
            r#"
            SELECT * FROM masjid_teachers
            WHERE masjid_id = $1 AND id = $2 AND deleted_at IS NULL
            FOR UPDATE
            "#,
        )
        .bind(masjid_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(teacher)
    }

    pub async fn list_teachers(
        &self,
        masjid_id: Uuid,
        filter: &TeacherFilter,
        include_deleted: bool,
        order: OrderBy,
        request: PageRequest,
    ) -> Result<Page<Teacher>, AppError> {
        let pattern = search_pattern(filter.q.as_deref());

        let page = fetch_page(&self.pool, "masjid_teachers", order, request, |qb| {
            push_scope(qb, "masjid_id", masjid_id, include_deleted);
            if let Some(is_active) = filter.is_active {
                qb.push(" AND is_active = ");
                qb.push_bind(is_active);
            }
            if let Some(pattern) = &pattern {
                push_search(qb, &["name", "code"], pattern);
            }
        })
        .await?;
        Ok(page)
    }

    /// `name` só chega aqui como `Missing` ou `Value` (coluna NOT NULL).
    pub async fn update_teacher<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        changes: UpdateTeacherPayload,
    ) -> Result<Teacher, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (set_name, name) = changes.name.into_update();
        let (set_code, code) = changes.code.into_update();
        let (set_avatar, avatar_url) = changes.avatar_url.into_update();
        let (set_user, user_id) = changes.user_id.into_update();

        sqlx::query_as::<_, Teacher>(
            r#"
            UPDATE masjid_teachers SET
                name       = CASE WHEN $2 THEN $3 ELSE name END,
                code       = CASE WHEN $4 THEN $5 ELSE code END,
                avatar_url = CASE WHEN $6 THEN $7 ELSE avatar_url END,
                user_id    = CASE WHEN $8 THEN $9 ELSE user_id END,
                is_active  = COALESCE($10, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(set_name)
        .bind(name)
        .bind(set_code)
        .bind(code)
        .bind(set_avatar)
        .bind(avatar_url)
        .bind(set_user)
        .bind(user_id)
        .bind(changes.is_active)
        .fetch_one(executor)
        .await
        .map_err(|e| map_constraint_error(e, conflict_on_unique("teacher_code")))
    }

    pub async fn soft_delete_teacher<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE masjid_teachers SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Regrava o snapshot do professor em todos os CSST vivos dele.
    pub async fn refresh_teacher_snapshots<'e, E>(
        &self,
        executor: E,
        teacher_id: Uuid,
        snapshot: &TeacherSnapshot,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE class_section_subject_teachers
            SET teacher_snapshot = $2, updated_at = NOW()
            WHERE teacher_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(teacher_id)
        .bind(Json(snapshot))
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Professor removido: os CSST vivos ficam sem professor (e sem snapshot).
    pub async fn clear_teacher_assignments<'e, E>(
        &self,
        executor: E,
        teacher_id: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE class_section_subject_teachers
            SET teacher_id = NULL, teacher_snapshot = NULL, updated_at = NOW()
            WHERE teacher_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(teacher_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    // =========================================================================
    //  TURMAS E DISCIPLINAS
    // =========================================================================

    pub async fn create_catalog_entry<T>(
        &self,
        catalog: Catalog,
        masjid_id: Uuid,
        payload: &CreateCatalogEntryPayload,
    ) -> Result<T, AppError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql = format!(
            "INSERT INTO {} (masjid_id, name, code) VALUES ($1, $2, $3) RETURNING *",
            catalog.table()
        );
        sqlx::query_as::<_, T>(&sql)
            .bind(masjid_id)
            .bind(payload.name.trim())
            .bind(payload.code.trim())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_constraint_error(e, conflict_on_unique(catalog.resource())))
    }

    pub async fn find_catalog_entry<T>(
        &self,
        catalog: Catalog,
        masjid_id: Uuid,
        id: Uuid,
    ) -> Result<Option<T>, AppError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql = format!(
            "SELECT * FROM {} WHERE masjid_id = $1 AND id = $2 AND deleted_at IS NULL",
            catalog.table()
        );
        let row = sqlx::query_as::<_, T>(&sql)
            .bind(masjid_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn list_catalog<T>(
        &self,
        catalog: Catalog,
        masjid_id: Uuid,
        filter: &CatalogFilter,
        include_deleted: bool,
        order: OrderBy,
        request: PageRequest,
    ) -> Result<Page<T>, AppError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let pattern = search_pattern(filter.q.as_deref());

        let page = fetch_page(&self.pool, catalog.table(), order, request, |qb| {
            push_scope(qb, "masjid_id", masjid_id, include_deleted);
            if let Some(pattern) = &pattern {
                push_search(qb, &["name", "code"], pattern);
            }
        })
        .await?;
        Ok(page)
    }

    pub async fn soft_delete_catalog_entry(
        &self,
        catalog: Catalog,
        masjid_id: Uuid,
        id: Uuid,
    ) -> Result<bool, AppError> {
        let sql = format!(
            "UPDATE {} SET deleted_at = NOW(), updated_at = NOW() \
             WHERE masjid_id = $1 AND id = $2 AND deleted_at IS NULL",
            catalog.table()
        );
        let result = sqlx::query(&sql)
            .bind(masjid_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    //  CSST
    // =========================================================================

    /// Grava o mapeamento com os snapshots de turma, disciplina e professor.
    pub async fn create_csst(
        &self,
        section: &ClassSection,
        subject: &Subject,
        teacher: Option<&Teacher>,
        is_active: bool,
    ) -> Result<ClassSectionSubjectTeacher, AppError> {
        sqlx::query_as::<_, ClassSectionSubjectTeacher>(
            r#"
            INSERT INTO class_section_subject_teachers (
                masjid_id, class_section_id, subject_id, teacher_id, is_active,
                teacher_snapshot, section_name_snapshot, subject_name_snapshot, subject_code_snapshot
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(section.masjid_id)
        .bind(section.id)
        .bind(subject.id)
        .bind(teacher.map(|t| t.id))
        .bind(is_active)
        .bind(teacher.map(|t| Json(t.snapshot())))
        .bind(&section.name)
        .bind(&subject.name)
        .bind(&subject.code)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_constraint_error(e, conflict_on_unique("class_section_subject")))
    }

    pub async fn find_csst(
        &self,
        masjid_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ClassSectionSubjectTeacher>, AppError> {
        let row = sqlx::query_as::<_, ClassSectionSubjectTeacher>(
            r#"
            SELECT * FROM class_section_subject_teachers
            WHERE masjid_id = $1 AND id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(masjid_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn lock_csst<'e, E>(
        &self,
        executor: E,
        masjid_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ClassSectionSubjectTeacher>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, ClassSectionSubjectTeacher>(
            r#"
            SELECT * FROM class_section_subject_teachers
            WHERE masjid_id = $1 AND id = $2 AND deleted_at IS NULL
            FOR UPDATE
            "#,
        )
        .bind(masjid_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    pub async fn list_csst(
        &self,
        masjid_id: Uuid,
        filter: &CsstFilter,
        include_deleted: bool,
        order: OrderBy,
        request: PageRequest,
    ) -> Result<Page<ClassSectionSubjectTeacher>, AppError> {
        let pattern = search_pattern(filter.q.as_deref());

        let page = fetch_page(
            &self.pool,
            "class_section_subject_teachers",
            order,
            request,
            |qb| {
                push_scope(qb, "masjid_id", masjid_id, include_deleted);
                if let Some(section_id) = filter.class_section_id {
                    qb.push(" AND class_section_id = ");
                    qb.push_bind(section_id);
                }
                if let Some(subject_id) = filter.subject_id {
                    qb.push(" AND subject_id = ");
                    qb.push_bind(subject_id);
                }
                if let Some(teacher_id) = filter.teacher_id {
                    qb.push(" AND teacher_id = ");
                    qb.push_bind(teacher_id);
                }
                if let Some(is_active) = filter.is_active {
                    qb.push(" AND is_active = ");
                    qb.push_bind(is_active);
                }
                if let Some(pattern) = &pattern {
                    push_search(
                        qb,
                        &[
                            "section_name_snapshot",
                            "subject_name_snapshot",
                            "subject_code_snapshot",
                            "(teacher_snapshot->>'name')",
                        ],
                        pattern,
                    );
                }
            },
        )
        .await?;
        Ok(page)
    }

    /// Troca (ou remove) o professor junto com o snapshot, e/ou o `is_active`.
    pub async fn update_csst<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        teacher_change: Option<Option<&Teacher>>,
        is_active: Option<bool>,
    ) -> Result<ClassSectionSubjectTeacher, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let set_teacher = teacher_change.is_some();
        let teacher = teacher_change.flatten();

        let row = sqlx::query_as::<_, ClassSectionSubjectTeacher>(
            r#"
            UPDATE class_section_subject_teachers SET
                teacher_id       = CASE WHEN $2 THEN $3 ELSE teacher_id END,
                teacher_snapshot = CASE WHEN $2 THEN $4 ELSE teacher_snapshot END,
                is_active        = COALESCE($5, is_active),
                updated_at       = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(set_teacher)
        .bind(teacher.map(|t| t.id))
        .bind(teacher.map(|t| Json(t.snapshot())))
        .bind(is_active)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn soft_delete_csst(&self, masjid_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE class_section_subject_teachers SET deleted_at = NOW(), updated_at = NOW()
            WHERE masjid_id = $1 AND id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(masjid_id)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
