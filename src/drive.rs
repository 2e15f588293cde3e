//! Path-based access on top of [`DriveClient`].
//!
//! Drive addresses everything by opaque id and relates entities through
//! parent ids. [`Drive`] walks a path like `Reports/2024/summary.csv` one
//! segment at a time, looking each name up under the id found for the
//! previous segment.

use tracing::debug;

use crate::client::DriveClient;
use crate::config::ListParams;
use crate::error::Result;
use crate::file::{DriveFile, NewFile};
use crate::models::{FileMetadata, FileRequest, PermissionGrant};
use crate::path::DrivePath;
use crate::query::Query;

/// Settings for [`Drive::create_from_path`] that apply to the leaf.
#[derive(Debug, Clone, Default)]
pub struct PathOptions {
    pub content: Option<Vec<u8>>,
    pub mime_type: Option<String>,
    /// Extra metadata for the leaf. Parents given here win over the parent
    /// the path resolves to.
    pub metadata: FileRequest,
    /// Granted on every entity of the path, folders included.
    pub permissions: Vec<PermissionGrant>,
}

impl PathOptions {
    /// Upload `content` as the leaf's body when the leaf is created.
    pub fn with_content(mut self, content: impl Into<Vec<u8>>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Create the leaf with this type instead of guessing from its name.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Grant `grant` on every entity of the path.
    pub fn with_permission(mut self, grant: PermissionGrant) -> Self {
        self.permissions.push(grant);
        self
    }
}

/// Path-based view of a Drive.
pub struct Drive {
    client: DriveClient,
}

impl Drive {
    /// Create a path-based view over `client`.
    pub fn new(client: DriveClient) -> Self {
        Self { client }
    }

    /// The underlying API client.
    pub fn client(&self) -> &DriveClient {
        &self.client
    }

    /// List files, following every page. `fields` defaults to the listing
    /// projection.
    pub async fn list_files(&self, params: &ListParams) -> Result<Vec<FileMetadata>> {
        self.client.list_all(params).await
    }

    /// Find or create every entity named by `path` and return them in path
    /// order, folders first and the leaf last.
    ///
    /// Each segment is looked up by name under the previous segment before
    /// anything is created, so an existing chain is reused as-is. Nothing is
    /// rolled back if a later step fails, including a permission grant
    /// without an email address.
    pub async fn create_from_path(&self, path: &str, options: PathOptions) -> Result<Vec<DriveFile>> {
        let path = DrivePath::parse(path)?;
        let mut chain = Vec::with_capacity(path.depth());
        let mut parent_id: Option<String> = None;

        for folder in path.folders() {
            let mut new = NewFile::folder();
            if let Some(ref id) = parent_id {
                new = new.with_parent(id.clone());
            }

            let entry = DriveFile::get_or_create(&self.client, folder, new).await?;
            parent_id = Some(entry.id().to_string());
            chain.push(entry);
        }

        let PathOptions {
            content,
            mime_type,
            mut metadata,
            permissions,
        } = options;

        if metadata.parents.is_empty() {
            metadata.parents.extend(parent_id);
        }

        let leaf = NewFile {
            mime_type,
            content,
            metadata,
        };
        chain.push(DriveFile::get_or_create(&self.client, path.leaf(), leaf).await?);

        for grant in &permissions {
            grant.to_request()?;
            for entry in chain.iter_mut() {
                entry.give_permission(grant).await?;
            }
        }

        Ok(chain)
    }

    /// Every file named by `path`, without creating anything.
    ///
    /// Folders resolve to their first match. If any folder is missing the
    /// result is empty. Several files may share the leaf name, so all of them
    /// are returned.
    pub async fn get_from_path(&self, path: &str) -> Result<Vec<DriveFile>> {
        let path = DrivePath::parse(path)?;
        let mut parent_id: Option<String> = None;

        for folder in path.folders() {
            let found = self
                .client
                .find_first(&ListParams::with_query(self.lookup(folder, parent_id.as_deref())))
                .await?;

            match found {
                Some(found) => parent_id = Some(found.id),
                None => {
                    debug!(%path, missing = %folder, "path does not resolve");
                    return Ok(Vec::new());
                }
            }
        }

        let files = self
            .client
            .list_all(&ListParams::with_query(
                self.lookup(path.leaf(), parent_id.as_deref()),
            ))
            .await?;

        Ok(files
            .into_iter()
            .map(|meta| DriveFile::from_metadata(self.client.clone(), meta))
            .collect())
    }

    /// Delete every file `path` resolves to and return how many there were.
    pub async fn delete_path(&self, path: &str) -> Result<usize> {
        let files = self.get_from_path(path).await?;
        for file in &files {
            file.delete().await?;
        }
        Ok(files.len())
    }

    fn lookup(&self, name: &str, parent_id: Option<&str>) -> String {
        Query::lookup(name, parent_id, self.client.config().skip_trashed)
    }
}
