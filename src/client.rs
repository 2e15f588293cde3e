//! Google Drive API client for the files and permissions resources.

use std::io::Cursor;
use std::sync::Arc;

use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response};
use serde::Serialize;
use tokio_util::io::ReaderStream;
use tracing::{debug, trace};

use crate::auth::Authenticator;
use crate::config::{DriveConfig, ListParams, FILE_FIELDS, PERMISSION_FIELDS};
use crate::error::{DriveError, Result};
use crate::models::{
    ApiErrorResponse, FileListResponse, FileMetadata, FileRequest, MetadataUpdate, Permission,
    PermissionRequest,
};

/// File content to upload alongside metadata.
#[derive(Debug, Clone)]
pub struct Media {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl Media {
    /// Wrap `bytes` to be uploaded as `mime_type`.
    pub fn new(bytes: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Build a multipart upload body: JSON metadata first, then the content
    /// as a stream of known length.
    fn into_form<T: Serialize>(self, metadata: &T) -> Result<Form> {
        let metadata_part =
            Part::text(serde_json::to_string(metadata)?).mime_str("application/json")?;

        let len = self.bytes.len() as u64;
        let stream = ReaderStream::new(Cursor::new(self.bytes));
        let file_part =
            Part::stream_with_length(Body::wrap_stream(stream), len).mime_str(&self.mime_type)?;

        Ok(Form::new()
            .part("metadata", metadata_part)
            .part("file", file_part))
    }
}

/// Client for the Drive v3 REST API.
///
/// Cloning is cheap; clones share the HTTP connection pool and token cache.
#[derive(Clone)]
pub struct DriveClient {
    auth: Authenticator,
    http: Client,
    config: Arc<DriveConfig>,
}

impl DriveClient {
    /// Create a client against the production endpoints.
    pub fn new(auth: Authenticator) -> Self {
        Self {
            auth,
            http: Client::new(),
            config: Arc::new(DriveConfig::default()),
        }
    }

    /// Create a client with explicit settings.
    pub fn with_config(auth: Authenticator, config: DriveConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            auth,
            http: builder.build()?,
            config: Arc::new(config),
        })
    }

    /// Settings this client was built with.
    pub fn config(&self) -> &DriveConfig {
        &self.config
    }

    fn files_url(&self) -> String {
        format!("{}/files", self.config.api_base)
    }

    fn file_url(&self, file_id: &str) -> String {
        format!("{}/files/{}", self.config.api_base, file_id)
    }

    fn upload_url(&self, file_id: Option<&str>) -> String {
        match file_id {
            Some(id) => format!("{}/files/{}", self.config.upload_base, id),
            None => format!("{}/files", self.config.upload_base),
        }
    }

    /// Fetch one page of files.list.
    pub async fn list_page(&self, params: &ListParams) -> Result<FileListResponse> {
        let token = self.auth.access_token().await?;
        debug!(q = params.query.as_deref().unwrap_or(""), "files.list");

        let response = self
            .http
            .get(self.files_url())
            .bearer_auth(&token)
            .query(&params.to_pairs(&self.config))
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    /// Fetch every page of files.list, following `nextPageToken`.
    pub async fn list_all(&self, params: &ListParams) -> Result<Vec<FileMetadata>> {
        let mut all_files = Vec::new();
        let mut page_params = params.clone();

        loop {
            let page = self.list_page(&page_params).await?;
            all_files.extend(page.files);

            match page.next_page_token {
                Some(token) => page_params.page_token = Some(token),
                None => break,
            }
        }

        Ok(all_files)
    }

    /// First file matching `params`. Later pages are read while every page
    /// so far came back empty, since Drive may return an empty page that
    /// still carries a `nextPageToken`.
    pub async fn find_first(&self, params: &ListParams) -> Result<Option<FileMetadata>> {
        let mut page_params = params.clone();

        loop {
            let page = self.list_page(&page_params).await?;
            if let Some(found) = page.files.into_iter().next() {
                return Ok(Some(found));
            }

            match page.next_page_token {
                Some(token) => page_params.page_token = Some(token),
                None => return Ok(None),
            }
        }
    }

    /// files.create, as a plain metadata POST or a multipart upload when
    /// `media` is given.
    pub async fn create(&self, body: &FileRequest, media: Option<Media>) -> Result<FileMetadata> {
        let token = self.auth.access_token().await?;
        debug!(name = %body.name, parents = ?body.parents, with_media = media.is_some(), "files.create");

        let request = match media {
            None => self
                .http
                .post(self.files_url())
                .query(&[("fields", FILE_FIELDS)])
                .json(body),
            Some(media) => self
                .http
                .post(self.upload_url(None))
                .query(&[("uploadType", "multipart"), ("fields", FILE_FIELDS)])
                .multipart(media.into_form(body)?),
        };

        let response = request.bearer_auth(&token).send().await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// files.get with the given field projection.
    pub async fn get(&self, file_id: &str, fields: &str) -> Result<FileMetadata> {
        let token = self.auth.access_token().await?;
        debug!(file_id, "files.get");

        let response = self
            .http
            .get(self.file_url(file_id))
            .bearer_auth(&token)
            .query(&[("fields", fields)])
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    /// files.update; content is replaced only when `media` is given.
    pub async fn update(
        &self,
        file_id: &str,
        body: &MetadataUpdate,
        media: Option<Media>,
    ) -> Result<FileMetadata> {
        let token = self.auth.access_token().await?;
        debug!(file_id, with_media = media.is_some(), "files.update");

        let request = match media {
            None => self
                .http
                .patch(self.file_url(file_id))
                .query(&[("fields", FILE_FIELDS)])
                .json(body),
            Some(media) => self
                .http
                .patch(self.upload_url(Some(file_id)))
                .query(&[("uploadType", "multipart"), ("fields", FILE_FIELDS)])
                .multipart(media.into_form(body)?),
        };

        let response = request.bearer_auth(&token).send().await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// files.delete. Deletion is permanent and skips the trash.
    pub async fn delete(&self, file_id: &str) -> Result<()> {
        let token = self.auth.access_token().await?;
        debug!(file_id, "files.delete");

        let response = self
            .http
            .delete(self.file_url(file_id))
            .bearer_auth(&token)
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }

    /// files.export of a native document into `mime_type`.
    pub async fn export(&self, file_id: &str, mime_type: &str) -> Result<Vec<u8>> {
        let token = self.auth.access_token().await?;
        debug!(file_id, mime_type, "files.export");

        let response = self
            .http
            .get(format!("{}/export", self.file_url(file_id)))
            .bearer_auth(&token)
            .query(&[("mimeType", mime_type)])
            .send()
            .await?;

        read_chunks(check_status(response).await?).await
    }

    /// Raw content of a binary file (`alt=media`).
    pub async fn download_media(&self, file_id: &str) -> Result<Vec<u8>> {
        let token = self.auth.access_token().await?;
        debug!(file_id, "files.get alt=media");

        let response = self
            .http
            .get(self.file_url(file_id))
            .bearer_auth(&token)
            .query(&[("alt", "media")])
            .send()
            .await?;

        read_chunks(check_status(response).await?).await
    }

    /// permissions.create.
    pub async fn create_permission(
        &self,
        file_id: &str,
        body: &PermissionRequest,
        send_notification: bool,
        email_message: Option<&str>,
    ) -> Result<Permission> {
        let token = self.auth.access_token().await?;
        debug!(file_id, role = body.role.as_str(), "permissions.create");

        let mut query = vec![
            ("fields", PERMISSION_FIELDS.to_string()),
            ("sendNotificationEmail", send_notification.to_string()),
        ];
        if let Some(message) = email_message {
            query.push(("emailMessage", message.to_string()));
        }

        let response = self
            .http
            .post(format!("{}/permissions", self.file_url(file_id)))
            .bearer_auth(&token)
            .query(&query)
            .json(body)
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }
}

/// Turn a non-success response into `DriveError::ApiError`, preferring the
/// message from Google's error envelope.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_body = response.text().await.unwrap_or_default();
    if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&error_body) {
        return Err(DriveError::ApiError {
            status: api_error.error.code,
            message: api_error.error.message,
        });
    }

    Err(DriveError::ApiError {
        status: status.as_u16(),
        message: error_body,
    })
}

/// Drain a response body chunk by chunk into memory.
async fn read_chunks(response: Response) -> Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(response.content_length().unwrap_or(0) as usize);
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        trace!(bytes = chunk.len(), "received chunk");
        buffer.extend_from_slice(&chunk);
    }

    Ok(buffer)
}
