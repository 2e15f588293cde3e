//! Data models for Google Drive API requests and responses.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DriveError, Result};

/// Last-fetched metadata for a file or folder in Google Drive.
///
/// Attributes outside the typed set are kept in `extra`, so a full
/// projection survives a round-trip through this struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    /// Empty when the requested projection leaves it out.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starred: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trashed: Option<bool>,
    #[serde(
        default,
        deserialize_with = "deserialize_size",
        skip_serializing_if = "Option::is_none"
    )]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_content_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5_checksum: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<Permission>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub properties: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub app_properties: HashMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// Drive sends int64 values as JSON strings.
fn deserialize_size<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Text(String),
        Number(u64),
    }

    match Option::<Size>::deserialize(deserializer)? {
        Some(Size::Text(s)) => s.parse::<u64>().map(Some).map_err(serde::de::Error::custom),
        Some(Size::Number(n)) => Ok(Some(n)),
        None => Ok(None),
    }
}

impl FileMetadata {
    /// A copy of this snapshot with `update` applied on top.
    pub fn merge(&self, update: &MetadataUpdate) -> FileMetadata {
        let mut merged = self.clone();

        if let Some(ref name) = update.name {
            merged.name = name.clone();
        }
        if let Some(ref mime_type) = update.mime_type {
            merged.mime_type = Some(mime_type.clone());
        }
        if let Some(ref description) = update.description {
            merged.description = Some(description.clone());
        }
        if let Some(starred) = update.starred {
            merged.starred = Some(starred);
        }
        if let Some(trashed) = update.trashed {
            merged.trashed = Some(trashed);
        }
        if let Some(ref properties) = update.properties {
            merged.properties.extend(properties.clone());
        }
        if let Some(ref app_properties) = update.app_properties {
            merged.app_properties.extend(app_properties.clone());
        }

        merged
    }

    /// Whether this entity is a Drive folder.
    pub fn is_folder(&self) -> bool {
        self.mime_type.as_deref() == Some(crate::mime::types::FOLDER)
    }
}

impl fmt::Display for FileMetadata {
    /// One tab-separated listing row: id, size, type, name.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = self.size.map_or_else(|| "-".to_string(), format_size);
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.id,
            size,
            self.mime_type.as_deref().unwrap_or("-"),
            self.name
        )
    }
}

/// Byte count with a binary unit, e.g. `1.50 KB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

/// Metadata body for files.create.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starred: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_properties: Option<HashMap<String, String>>,
}

/// Writable metadata fields for files.update. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starred: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trashed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_properties: Option<HashMap<String, String>>,
}

impl From<&FileMetadata> for MetadataUpdate {
    fn from(meta: &FileMetadata) -> Self {
        let non_empty = |map: &HashMap<String, String>| (!map.is_empty()).then(|| map.clone());

        Self {
            name: (!meta.name.is_empty()).then(|| meta.name.clone()),
            mime_type: meta.mime_type.clone(),
            description: meta.description.clone(),
            starred: meta.starred,
            trashed: meta.trashed,
            properties: non_empty(&meta.properties),
            app_properties: non_empty(&meta.app_properties),
        }
    }
}

/// A permission attached to a file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, rename = "type")]
    pub permission_type: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub photo_link: Option<String>,
    #[serde(default)]
    pub allow_file_discovery: Option<bool>,
}

/// Access level granted by a permission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionRole {
    #[default]
    Reader,
    Writer,
    Owner,
    Commenter,
}

impl PermissionRole {
    /// Wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionRole::Reader => "reader",
            PermissionRole::Writer => "writer",
            PermissionRole::Owner => "owner",
            PermissionRole::Commenter => "commenter",
        }
    }
}

impl FromStr for PermissionRole {
    type Err = DriveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "reader" => Ok(PermissionRole::Reader),
            "writer" => Ok(PermissionRole::Writer),
            "owner" => Ok(PermissionRole::Owner),
            "commenter" => Ok(PermissionRole::Commenter),
            other => Err(DriveError::invalid(format!("unknown role: {}", other))),
        }
    }
}

/// Kind of grantee a permission applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionType {
    #[default]
    User,
    Group,
    Domain,
    Anyone,
}

impl PermissionType {
    /// Wire name of the grantee type.
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionType::User => "user",
            PermissionType::Group => "group",
            PermissionType::Domain => "domain",
            PermissionType::Anyone => "anyone",
        }
    }
}

impl FromStr for PermissionType {
    type Err = DriveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(PermissionType::User),
            "group" => Ok(PermissionType::Group),
            "domain" => Ok(PermissionType::Domain),
            "anyone" => Ok(PermissionType::Anyone),
            other => Err(DriveError::invalid(format!("unknown grantee type: {}", other))),
        }
    }
}

/// A request to share a file with someone.
///
/// `email` names the grantee: an address for users and groups, a domain name
/// for [`PermissionType::Domain`]. It must never be empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PermissionGrant {
    pub email: String,
    pub role: PermissionRole,
    pub permission_type: PermissionType,
    pub send_notification: bool,
    pub email_message: Option<String>,
}

impl PermissionGrant {
    /// Reader access for the user `email`, without notification.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Self::default()
        }
    }

    /// Set the granted role.
    pub fn role(mut self, role: PermissionRole) -> Self {
        self.role = role;
        self
    }

    /// Set the grantee type.
    pub fn permission_type(mut self, permission_type: PermissionType) -> Self {
        self.permission_type = permission_type;
        self
    }

    /// Send a notification email, optionally with a custom message.
    pub fn notify(mut self, message: Option<String>) -> Self {
        self.send_notification = true;
        self.email_message = message;
        self
    }

    /// Build the permissions.create body, rejecting a missing identity.
    pub fn to_request(&self) -> Result<PermissionRequest> {
        let identity = self.email.trim();
        if identity.is_empty() {
            return Err(DriveError::invalid(
                "a permission grant needs an email address",
            ));
        }

        let (email_address, domain) = match self.permission_type {
            PermissionType::Domain => (None, Some(identity.to_string())),
            PermissionType::Anyone => (None, None),
            PermissionType::User | PermissionType::Group => (Some(identity.to_string()), None),
        };

        Ok(PermissionRequest {
            role: self.role,
            permission_type: self.permission_type,
            email_address,
            domain,
        })
    }
}

/// Body for permissions.create.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRequest {
    pub role: PermissionRole,
    #[serde(rename = "type")]
    pub permission_type: PermissionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// Response from the files.list API endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListResponse {
    #[serde(default)]
    pub files: Vec<FileMetadata>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Google API error response.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

/// Code and message inside the error envelope.
#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub code: u16,
    pub message: String,
}

/// Service account credentials from JSON file.
#[derive(Debug, Deserialize)]
pub struct ServiceAccountCredentials {
    pub client_email: String,
    pub private_key: String,
    pub token_uri: Option<String>,
}

/// OAuth2 token response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub expires_in: u64,
}
