// src/services/profile_service.rs

use std::sync::Arc;

use bytes::Bytes;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::not_found,
        error::AppError,
        pagination::{Page, PageQuery, PageRequest, MAX_PAGE_SIZE},
        query::OrderBy,
    },
    db::{
        profile_repo::{NewDocument, DOCUMENT_SORT_KEYS},
        ProfileRepository,
    },
    models::profile::{ProfileDocument, UpdateProfilePayload, UserProfile},
    services::storage::ObjectStorage,
};

/// Um arquivo recebido via multipart, ainda não gravado.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub doc_type: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Clone)]
pub struct ProfileService {
    repo: ProfileRepository,
    storage: Arc<dyn ObjectStorage>,
    max_upload_bytes: usize,
}

impl ProfileService {
    pub fn new(repo: ProfileRepository, storage: Arc<dyn ObjectStorage>, max_upload_bytes: usize) -> Self {
        Self {
            repo,
            storage,
            max_upload_bytes,
        }
    }

    /// Sem perfil gravado devolve um perfil vazio.
    pub async fn get_profile(&self, user_id: Uuid) -> Result<UserProfile, AppError> {
        Ok(self
            .repo
            .find_profile(user_id)
            .await?
            .unwrap_or_else(|| UserProfile::empty(user_id)))
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        payload: UpdateProfilePayload,
    ) -> Result<UserProfile, AppError> {
        let changes = UpdateProfilePayload {
            full_name: payload.full_name.trimmed(),
            gender: payload.gender.trimmed(),
            phone: payload.phone.trimmed(),
            ..payload
        };
        self.repo.patch_profile(user_id, changes).await
    }

    pub async fn list_documents(
        &self,
        user_id: Uuid,
        query: &PageQuery,
    ) -> Result<(Page<ProfileDocument>, PageRequest), AppError> {
        let request = query.resolve(MAX_PAGE_SIZE);
        let order = OrderBy::resolve(DOCUMENT_SORT_KEYS, query.sort_by.as_deref(), query.order.as_deref());
        let page = self
            .repo
            .list_documents(user_id, query.include_deleted, order, request)
            .await?;
        Ok((page, request))
    }

    /// Grava o arquivo no storage e depois a linha. Se a linha falhar, o arquivo é apagado.
    pub async fn upload_document(
        &self,
        user_id: Uuid,
        upload: DocumentUpload,
    ) -> Result<ProfileDocument, AppError> {
        let doc_type = upload.doc_type.trim();
        if doc_type.is_empty() {
            return Err(AppError::InvalidParam("doc_type".into()));
        }
        if upload.data.is_empty() {
            return Err(AppError::InvalidParam("file".into()));
        }
        if upload.data.len() > self.max_upload_bytes {
            return Err(AppError::InvalidParam(format!(
                "file > {} bytes",
                self.max_upload_bytes
            )));
        }

        let stored = self
            .storage
            .put(&format!("profiles/{user_id}"), &upload.file_name, upload.data)
            .await?;

        let created = self
            .repo
            .create_document(
                user_id,
                NewDocument {
                    doc_type,
                    file_name: &upload.file_name,
                    file_url: &stored.url,
                    file_key: &stored.key,
                    mime_type: upload.content_type.as_deref(),
                    size_bytes: stored.size_bytes,
                },
            )
            .await;

        match created {
            Ok(doc) => Ok(doc),
            Err(e) => {
                if let Err(cleanup) = self.storage.delete(&stored.key).await {
                    tracing::warn!("Arquivo órfão {} não removido: {}", stored.key, cleanup);
                }
                Err(e)
            }
        }
    }

    /// Soft delete; o arquivo continua no storage.
    pub async fn delete_document(&self, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.repo.soft_delete_document(user_id, id).await? {
            return Err(not_found("document"));
        }
        Ok(())
    }
}
