//! Operations on a single Drive file or folder.

use std::borrow::Cow;
use std::fmt;

use tracing::{debug, info};

use crate::client::{DriveClient, Media};
use crate::config::{ListParams, FILE_FIELDS};
use crate::error::Result;
use crate::mime::{self, types};
use crate::models::{FileMetadata, FileRequest, MetadataUpdate, Permission, PermissionGrant};
use crate::query::Query;

/// What to create when a lookup comes up empty.
#[derive(Debug, Clone, Default)]
pub struct NewFile {
    /// Explicit type; falls back to `metadata.mime_type`, then to a guess
    /// from the name.
    pub mime_type: Option<String>,
    pub content: Option<Vec<u8>>,
    /// Extra metadata. `name` is always overwritten by the name passed to
    /// [`DriveFile::create`].
    pub metadata: FileRequest,
}

impl NewFile {
    /// Template for a folder.
    pub fn folder() -> Self {
        Self {
            mime_type: Some(types::FOLDER.to_string()),
            ..Self::default()
        }
    }

    /// Upload `content` with the new file.
    pub fn with_content(mut self, content: impl Into<Vec<u8>>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Create with this type instead of guessing from the name.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Create inside the folder `parent_id`.
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.metadata.parents = vec![parent_id.into()];
        self
    }
}

/// Handle to one remote entity.
///
/// The handle owns the last metadata snapshot it fetched and, once content
/// has been uploaded or downloaded through it, a copy of that content.
pub struct DriveFile {
    client: DriveClient,
    metadata: FileMetadata,
    content: Option<Vec<u8>>,
}

impl fmt::Debug for DriveFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriveFile")
            .field("metadata", &self.metadata)
            .field("content_len", &self.content.as_ref().map(Vec::len))
            .finish()
    }
}

impl DriveFile {
    /// Wrap metadata obtained elsewhere, e.g. from a listing.
    pub fn from_metadata(client: DriveClient, metadata: FileMetadata) -> Self {
        Self {
            client,
            metadata,
            content: None,
        }
    }

    /// Fetch the full metadata of the file with `file_id`.
    pub async fn open(client: &DriveClient, file_id: &str) -> Result<Self> {
        let metadata = client.get(file_id, FILE_FIELDS).await?;
        Ok(Self::from_metadata(client.clone(), metadata))
    }

    /// Create a new file named `name`.
    pub async fn create(client: &DriveClient, name: &str, new: NewFile) -> Result<Self> {
        let NewFile {
            mime_type,
            content,
            mut metadata,
        } = new;

        let mime_type = mime_type
            .or_else(|| metadata.mime_type.take())
            .unwrap_or_else(|| mime::guess_type(name).to_string());

        metadata.name = name.to_string();
        metadata.mime_type = Some(mime_type.clone());

        let media = match content {
            Some(ref bytes) if !bytes.is_empty() => Some(Media::new(
                bytes.clone(),
                mime::media_type(name, &mime_type),
            )),
            _ => None,
        };

        let created = client.create(&metadata, media).await?;
        info!(id = %created.id, name, mime_type = %mime_type, "created");

        Ok(Self {
            client: client.clone(),
            metadata: created,
            content,
        })
    }

    /// Return the first file named `name` under the first parent in
    /// `new.metadata.parents` (or anywhere, when no parent is given), creating
    /// it from `new` if there is none.
    ///
    /// The lookup and the creation are separate calls: two callers racing on
    /// the same name can both create.
    pub async fn get_or_create(client: &DriveClient, name: &str, new: NewFile) -> Result<Self> {
        let parent_id = new.metadata.parents.first().map(String::as_str);
        let query = Query::lookup(name, parent_id, client.config().skip_trashed);

        if let Some(existing) = client.find_first(&ListParams::with_query(query)).await? {
            debug!(id = %existing.id, name, "found existing");
            return Ok(Self::from_metadata(client.clone(), existing));
        }

        Self::create(client, name, new).await
    }

    /// Drive id of the entity.
    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    /// Name from the last snapshot.
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// MIME type from the last snapshot.
    pub fn mime_type(&self) -> Option<&str> {
        self.metadata.mime_type.as_deref()
    }

    /// The last fetched metadata snapshot.
    pub fn metadata(&self) -> &FileMetadata {
        &self.metadata
    }

    /// Consume the handle, keeping its snapshot.
    pub fn into_metadata(self) -> FileMetadata {
        self.metadata
    }

    /// Content last uploaded or downloaded through this handle.
    pub fn content(&self) -> Option<&[u8]> {
        self.content.as_deref()
    }

    /// [`content`](Self::content) as text, with invalid UTF-8 replaced.
    pub fn content_text(&self) -> Option<Cow<'_, str>> {
        self.content.as_deref().map(String::from_utf8_lossy)
    }

    /// Export format [`download`](Self::download) uses when none is given.
    pub fn download_type(&self) -> &'static str {
        mime::download_type(self.mime_type().unwrap_or_default())
    }

    /// Replace the snapshot with freshly fetched full metadata.
    pub async fn refresh(&mut self) -> Result<&FileMetadata> {
        self.metadata = self.client.get(&self.metadata.id, FILE_FIELDS).await?;
        Ok(&self.metadata)
    }

    /// Share this file, then refresh so the snapshot lists the new permission.
    ///
    /// Fails with `InvalidParameter` before any remote call when the grant has
    /// no identity.
    pub async fn give_permission(&mut self, grant: &PermissionGrant) -> Result<Permission> {
        let request = grant.to_request()?;
        let message = grant.email_message.as_deref().filter(|m| !m.is_empty());

        let permission = self
            .client
            .create_permission(&self.metadata.id, &request, grant.send_notification, message)
            .await?;
        info!(
            id = %self.metadata.id,
            grantee = %grant.email,
            role = request.role.as_str(),
            "shared"
        );

        self.refresh().await?;
        Ok(permission)
    }

    /// Download the content into memory.
    ///
    /// With an explicit `mime_type`, or for a native document, the file is
    /// exported (to [`download_type`](Self::download_type) by default). Other
    /// files are fetched as-is.
    pub async fn download(&mut self, mime_type: Option<&str>) -> Result<&[u8]> {
        let bytes = match (mime_type, self.mime_type()) {
            (Some(target), _) => self.client.export(&self.metadata.id, target).await?,
            (None, Some(current)) if mime::is_native(current) => {
                self.client
                    .export(&self.metadata.id, mime::download_type(current))
                    .await?
            }
            _ => self.client.download_media(&self.metadata.id).await?,
        };

        debug!(id = %self.metadata.id, bytes = bytes.len(), "downloaded");
        Ok(self.content.insert(bytes).as_slice())
    }

    /// Permanently delete the remote file. The handle is left as it was.
    pub async fn delete(&self) -> Result<()> {
        self.client.delete(&self.metadata.id).await?;
        info!(id = %self.metadata.id, name = %self.metadata.name, "deleted");
        Ok(())
    }

    /// Merge `changes` into the snapshot, optionally replace the content, and
    /// push the result. On success the snapshot becomes the server's response;
    /// on failure it is left untouched.
    pub async fn update(
        &mut self,
        changes: &MetadataUpdate,
        content: Option<Vec<u8>>,
    ) -> Result<&FileMetadata> {
        let merged = self.metadata.merge(changes);
        let body = MetadataUpdate::from(&merged);

        let media = match content {
            Some(ref bytes) if !bytes.is_empty() => {
                let target = merged.mime_type.as_deref().unwrap_or(types::FILE);
                Some(Media::new(
                    bytes.clone(),
                    mime::media_type(&merged.name, target),
                ))
            }
            _ => None,
        };
        let replaced_content = media.is_some();

        let updated = self.client.update(&merged.id, &body, media).await?;

        if replaced_content {
            self.content = content;
        }
        self.metadata = updated;
        Ok(&self.metadata)
    }
}
