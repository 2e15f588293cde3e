//! drivepath - Path-based access to Google Drive.
//!
//! Drive addresses files by opaque id. This library lets you address them by
//! slash-delimited path instead:
//! - Create a file and any missing folders above it in one call
//! - Find the files a path names without creating anything
//! - Download (exporting native documents), update, delete and share them
//!
//! # Example
//!
//! ```no_run
//! use drivepath::{Authenticator, Drive, DriveClient, PathOptions, PermissionGrant};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let auth = Authenticator::from_file("service-account.json")?;
//!     let drive = Drive::new(DriveClient::new(auth));
//!
//!     let options = PathOptions::default()
//!         .with_content("region,total\nnorth,12\n")
//!         .with_permission(PermissionGrant::new("team@example.com"));
//!     let chain = drive.create_from_path("Reports/2024/summary.csv", options).await?;
//!
//!     for entry in &chain {
//!         println!("{}", entry.metadata());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod drive;
pub mod error;
pub mod file;
pub mod logging;
pub mod mime;
pub mod models;
pub mod path;
pub mod query;

// Re-exports for convenience
pub use auth::Authenticator;
pub use client::{DriveClient, Media};
pub use config::{DriveConfig, ListParams};
pub use drive::{Drive, PathOptions};
pub use error::{DriveError, Result};
pub use file::{DriveFile, NewFile};
pub use models::{
    FileMetadata, FileRequest, MetadataUpdate, Permission, PermissionGrant, PermissionRole,
    PermissionType,
};
pub use path::DrivePath;
