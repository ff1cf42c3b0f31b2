// src/services/academic_service.rs

use sqlx::PgPool;
use uuid::Uuid;
use validator::ValidateUrl;

use crate::{
    common::{
        db_utils::not_found,
        error::AppError,
        pagination::{Page, PageQuery, PageRequest, MAX_PAGE_SIZE},
        patch::Patch,
        query::OrderBy,
    },
    db::{
        academic_repo::{Catalog, CATALOG_SORT_KEYS, CSST_SORT_KEYS, TEACHER_SORT_KEYS},
        AcademicRepository,
    },
    models::academic::{
        CatalogFilter, ClassSection, ClassSectionSubjectTeacher, CreateCatalogEntryPayload,
        CreateCsstPayload, CreateTeacherPayload, CsstFilter, Subject, Teacher, TeacherFilter,
        UpdateCsstPayload, UpdateTeacherPayload,
    },
};

#[derive(Clone)]
pub struct AcademicService {
    pool: PgPool,
    repo: AcademicRepository,
}

impl AcademicService {
    pub fn new(pool: PgPool, repo: AcademicRepository) -> Self {
        Self { pool, repo }
    }

    // =========================================================================
    //  PROFESSORES
    // =========================================================================

    pub async fn list_teachers(
        &self,
        masjid_id: Uuid,
        filter: &TeacherFilter,
        query: &PageQuery,
    ) -> Result<(Page<Teacher>, PageRequest), AppError> {
        let request = query.resolve(MAX_PAGE_SIZE);
        let order = OrderBy::resolve(TEACHER_SORT_KEYS, query.sort_by.as_deref(), query.order.as_deref());
        let page = self
            .repo
            .list_teachers(masjid_id, filter, query.include_deleted, order, request)
            .await?;
        Ok((page, request))
    }

    pub async fn create_teacher(
        &self,
        masjid_id: Uuid,
        payload: &CreateTeacherPayload,
    ) -> Result<Teacher, AppError> {
        self.repo.create_teacher(&self.pool, masjid_id, payload).await
    }

    pub async fn get_teacher(&self, masjid_id: Uuid, id: Uuid) -> Result<Teacher, AppError> {
        self.repo
            .find_teacher(masjid_id, id)
            .await?
            .ok_or_else(|| not_found("teacher"))
    }

    /// Atualiza o professor e, na mesma transação, os snapshots dos CSST dele.
    pub async fn update_teacher(
        &self,
        masjid_id: Uuid,
        id: Uuid,
        payload: UpdateTeacherPayload,
    ) -> Result<Teacher, AppError> {
        let changes = normalize_teacher_changes(payload)?;
        let display_changed = !changes.name.is_missing()
            || !changes.code.is_missing()
            || !changes.avatar_url.is_missing();

        let mut tx = self.pool.begin().await?;

        self.repo
            .lock_teacher(&mut *tx, masjid_id, id)
            .await?
            .ok_or_else(|| not_found("teacher"))?;

        let teacher = self.repo.update_teacher(&mut *tx, id, changes).await?;

        if display_changed {
            let refreshed = self
                .repo
                .refresh_teacher_snapshots(&mut *tx, teacher.id, &teacher.snapshot())
                .await?;
            tracing::debug!("{} snapshots do professor {} atualizados", refreshed, teacher.id);
        }

        tx.commit().await?;
        Ok(teacher)
    }

    /// Remove o professor e desfaz as atribuições vivas dele.
    pub async fn delete_teacher(&self, masjid_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        self.repo
            .lock_teacher(&mut *tx, masjid_id, id)
            .await?
            .ok_or_else(|| not_found("teacher"))?;

        self.repo.soft_delete_teacher(&mut *tx, id).await?;
        let cleared = self.repo.clear_teacher_assignments(&mut *tx, id).await?;

        tx.commit().await?;

        if cleared > 0 {
            tracing::info!("Professor {} removido de {} atribuições", id, cleared);
        }
        Ok(())
    }

    // =========================================================================
    //  TURMAS E DISCIPLINAS
    // =========================================================================

    pub async fn list_class_sections(
        &self,
        masjid_id: Uuid,
        filter: &CatalogFilter,
        query: &PageQuery,
    ) -> Result<(Page<ClassSection>, PageRequest), AppError> {
        self.list_catalog(Catalog::ClassSections, masjid_id, filter, query).await
    }

    pub async fn list_subjects(
        &self,
        masjid_id: Uuid,
        filter: &CatalogFilter,
        query: &PageQuery,
    ) -> Result<(Page<Subject>, PageRequest), AppError> {
        self.list_catalog(Catalog::Subjects, masjid_id, filter, query).await
    }

    async fn list_catalog<T>(
        &self,
        catalog: Catalog,
        masjid_id: Uuid,
        filter: &CatalogFilter,
        query: &PageQuery,
    ) -> Result<(Page<T>, PageRequest), AppError>
    where
        T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
    {
        let request = query.resolve(MAX_PAGE_SIZE);
        let order = OrderBy::resolve(CATALOG_SORT_KEYS, query.sort_by.as_deref(), query.order.as_deref());
        let page = self
            .repo
            .list_catalog(catalog, masjid_id, filter, query.include_deleted, order, request)
            .await?;
        Ok((page, request))
    }

    pub async fn create_class_section(
        &self,
        masjid_id: Uuid,
        payload: &CreateCatalogEntryPayload,
    ) -> Result<ClassSection, AppError> {
        self.repo
            .create_catalog_entry(Catalog::ClassSections, masjid_id, payload)
            .await
    }

    pub async fn create_subject(
        &self,
        masjid_id: Uuid,
        payload: &CreateCatalogEntryPayload,
    ) -> Result<Subject, AppError> {
        self.repo
            .create_catalog_entry(Catalog::Subjects, masjid_id, payload)
            .await
    }

    pub async fn delete_catalog_entry(
        &self,
        catalog: Catalog,
        masjid_id: Uuid,
        id: Uuid,
    ) -> Result<(), AppError> {
        if !self.repo.soft_delete_catalog_entry(catalog, masjid_id, id).await? {
            return Err(not_found(catalog.resource()));
        }
        Ok(())
    }

    pub async fn find_class_section(
        &self,
        masjid_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ClassSection>, AppError> {
        self.repo
            .find_catalog_entry(Catalog::ClassSections, masjid_id, id)
            .await
    }

    // =========================================================================
    //  CSST
    // =========================================================================

    /// Turma, disciplina e professor precisam existir no mesmo masjid.
    pub async fn create_csst(
        &self,
        masjid_id: Uuid,
        payload: &CreateCsstPayload,
    ) -> Result<ClassSectionSubjectTeacher, AppError> {
        let section = self
            .find_class_section(masjid_id, payload.class_section_id)
            .await?
            .ok_or_else(|| not_found("class_section"))?;

        let subject: Subject = self
            .repo
            .find_catalog_entry(Catalog::Subjects, masjid_id, payload.subject_id)
            .await?
            .ok_or_else(|| not_found("subject"))?;

        let teacher = match payload.teacher_id {
            Some(teacher_id) => Some(self.get_teacher(masjid_id, teacher_id).await?),
            None => None,
        };

        self.repo
            .create_csst(&section, &subject, teacher.as_ref(), payload.is_active)
            .await
    }

    pub async fn list_csst(
        &self,
        masjid_id: Uuid,
        filter: &CsstFilter,
        query: &PageQuery,
    ) -> Result<(Page<ClassSectionSubjectTeacher>, PageRequest), AppError> {
        let request = query.resolve(MAX_PAGE_SIZE);
        let order = OrderBy::resolve(CSST_SORT_KEYS, query.sort_by.as_deref(), query.order.as_deref());
        let page = self
            .repo
            .list_csst(masjid_id, filter, query.include_deleted, order, request)
            .await?;
        Ok((page, request))
    }

    pub async fn get_csst(
        &self,
        masjid_id: Uuid,
        id: Uuid,
    ) -> Result<ClassSectionSubjectTeacher, AppError> {
        self.repo
            .find_csst(masjid_id, id)
            .await?
            .ok_or_else(|| not_found("class_section_subject_teacher"))
    }

    /// `teacher_id: null` remove o professor e o snapshot; um id novo regrava o snapshot.
    pub async fn update_csst(
        &self,
        masjid_id: Uuid,
        id: Uuid,
        payload: UpdateCsstPayload,
    ) -> Result<ClassSectionSubjectTeacher, AppError> {
        let teacher = match payload.teacher_id {
            Patch::Missing => None,
            Patch::Null => Some(None),
            Patch::Value(teacher_id) => Some(Some(self.get_teacher(masjid_id, teacher_id).await?)),
        };

        let mut tx = self.pool.begin().await?;

        self.repo
            .lock_csst(&mut *tx, masjid_id, id)
            .await?
            .ok_or_else(|| not_found("class_section_subject_teacher"))?;

        let updated = self
            .repo
            .update_csst(
                &mut *tx,
                id,
                teacher.as_ref().map(Option::as_ref),
                payload.is_active,
            )
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    pub async fn delete_csst(&self, masjid_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.repo.soft_delete_csst(masjid_id, id).await? {
            return Err(not_found("class_section_subject_teacher"));
        }
        Ok(())
    }
}

/// Aplica ao PATCH as regras do payload de criação.
fn normalize_teacher_changes(payload: UpdateTeacherPayload) -> Result<UpdateTeacherPayload, AppError> {
    let name = match payload.name.trimmed().max_chars("name", 120)?.require_value("name")? {
        Some(name) if name.is_empty() => return Err(AppError::InvalidParam("name".into())),
        Some(name) => Patch::Value(name),
        None => Patch::Missing,
    };
    let avatar_url = payload.avatar_url.blank_as_null();
    if let Some(url) = avatar_url.as_value() {
        if !url.validate_url() {
            return Err(AppError::InvalidParam("avatar_url".into()));
        }
    }
    Ok(UpdateTeacherPayload {
        name,
        code: payload.code.blank_as_null().max_chars("code", 30)?,
        avatar_url,
        ..payload
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_code_and_avatar_clear_the_columns() {
        let payload = UpdateTeacherPayload {
            code: Patch::Value("".into()),
            avatar_url: Patch::Value("   ".into()),
            ..UpdateTeacherPayload::default()
        };
        let changes = normalize_teacher_changes(payload).unwrap();
        assert_eq!(changes.code, Patch::Null);
        assert_eq!(changes.avatar_url, Patch::Null);
        assert!(changes.name.is_missing());
    }

    #[test]
    fn avatar_must_be_a_url() {
        let bad = UpdateTeacherPayload {
            avatar_url: Patch::Value("foto do ustadz".into()),
            ..UpdateTeacherPayload::default()
        };
        let err = normalize_teacher_changes(bad).unwrap_err();
        assert!(matches!(err, AppError::InvalidParam(ref f) if f == "avatar_url"));

        let good = UpdateTeacherPayload {
            avatar_url: Patch::Value("https://cdn.example.com/ustadz.png".into()),
            ..UpdateTeacherPayload::default()
        };
        assert!(normalize_teacher_changes(good).is_ok());
    }

    #[test]
    fn code_respects_the_create_limit() {
        let payload = UpdateTeacherPayload {
            code: Patch::Value("X".repeat(31)),
            ..UpdateTeacherPayload::default()
        };
        assert!(normalize_teacher_changes(payload).is_err());
    }
}
