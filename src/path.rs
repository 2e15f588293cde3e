//! Slash-delimited Drive paths.

use std::fmt;

use crate::error::{DriveError, Result};

/// A path such as `Reports/2024/summary.csv`: folder names followed by a leaf.
///
/// Empty segments (leading, trailing or doubled slashes) are dropped from the
/// folder list. The leaf may not be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrivePath {
    folders: Vec<String>,
    leaf: String,
}

impl DrivePath {
    /// Split `path` into folders and a leaf.
    pub fn parse(path: &str) -> Result<Self> {
        let mut segments: Vec<&str> = path.split('/').collect();

        let leaf = segments.pop().unwrap_or_default();
        if leaf.is_empty() {
            return Err(DriveError::invalid(format!(
                "path has no file name: {:?}",
                path
            )));
        }

        let folders = segments
            .into_iter()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            folders,
            leaf: leaf.to_string(),
        })
    }

    /// Folder names from the root down.
    pub fn folders(&self) -> &[String] {
        &self.folders
    }

    /// Final segment: the file or folder the path names.
    pub fn leaf(&self) -> &str {
        &self.leaf
    }

    /// Number of remote entities the path names (folders plus the leaf).
    pub fn depth(&self) -> usize {
        self.folders.len() + 1
    }

    /// Path of `name` inside this path, treating the leaf as a folder.
    pub fn join(&self, name: &str) -> Result<Self> {
        Self::parse(&format!("{}/{}", self, name))
    }
}

impl fmt::Display for DrivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for folder in &self.folders {
            write!(f, "{}/", folder)?;
        }
        write!(f, "{}", self.leaf)
    }
}
