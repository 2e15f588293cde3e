//! Client configuration and field projection presets.

use std::time::Duration;

/// Base URL for Google Drive API v3.
pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Upload URL for Google Drive API.
pub const UPLOAD_API_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

/// Minimal projection used when listing.
pub const LIST_FIELDS: &str = "kind,nextPageToken,files(id,name,mimeType,parents)";

/// Full projection for a single file.
pub const FILE_FIELDS: &str = "appProperties,capabilities,contentHints,createdTime,description,\
explicitlyTrashed,fileExtension,folderColorRgb,fullFileExtension,headRevisionId,iconLink,id,\
imageMediaMetadata,isAppAuthorized,kind,lastModifyingUser,md5Checksum,mimeType,modifiedByMeTime,\
modifiedTime,name,originalFilename,ownedByMe,owners,parents,permissions,properties,quotaBytesUsed,\
shared,sharedWithMeTime,sharingUser,size,spaces,starred,thumbnailLink,trashed,version,\
videoMediaMetadata,viewedByMe,viewedByMeTime,viewersCanCopyContent,webContentLink,webViewLink,\
writersCanShare";

/// Full projection for a permission.
pub const PERMISSION_FIELDS: &str =
    "allowFileDiscovery,displayName,domain,emailAddress,id,kind,photoLink,role,type";

/// Settings shared by every call a [`DriveClient`](crate::DriveClient) makes.
#[derive(Debug, Clone)]
pub struct DriveConfig {
    pub api_base: String,
    pub upload_base: String,
    /// Append `trashed = false` to generated lookups.
    pub skip_trashed: bool,
    /// Page size sent with list calls; the server default when unset.
    pub page_size: Option<u32>,
    pub timeout: Option<Duration>,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            api_base: DRIVE_API_BASE.to_string(),
            upload_base: UPLOAD_API_BASE.to_string(),
            skip_trashed: true,
            page_size: None,
            timeout: None,
        }
    }
}

impl DriveConfig {
    /// Point both the metadata and upload endpoints at `base`, the way a
    /// local mock server or proxy exposes them.
    pub fn with_base_url(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            api_base: base.to_string(),
            upload_base: format!("{}/upload", base),
            ..Self::default()
        }
    }
}

/// Options recognised by the files.list endpoint.
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub query: Option<String>,
    pub fields: Option<String>,
    pub page_size: Option<u32>,
    pub page_token: Option<String>,
    pub order_by: Option<String>,
    pub spaces: Option<String>,
}

impl ListParams {
    /// List files matching the filter `query`.
    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Self::default()
        }
    }

    /// Flatten into request query pairs, applying config defaults.
    pub(crate) fn to_pairs(&self, config: &DriveConfig) -> Vec<(&'static str, String)> {
        let mut pairs = vec![(
            "fields",
            self.fields.clone().unwrap_or_else(|| LIST_FIELDS.to_string()),
        )];

        if let Some(ref q) = self.query {
            pairs.push(("q", q.clone()));
        }
        if let Some(size) = self.page_size.or(config.page_size) {
            pairs.push(("pageSize", size.to_string()));
        }
        if let Some(ref token) = self.page_token {
            pairs.push(("pageToken", token.clone()));
        }
        if let Some(ref order) = self.order_by {
            pairs.push(("orderBy", order.clone()));
        }
        if let Some(ref spaces) = self.spaces {
            pairs.push(("spaces", spaces.clone()));
        }

        pairs
    }
}
