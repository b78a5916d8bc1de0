//! Storage operation errors / 存储操作错误
//!
//! Every failure carries the path(s) involved and, when the backend reported
//! one, the backend's own message.

use std::fmt;

/// Which piece of metadata could not be retrieved / 无法获取的元数据类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKind {
    Metadata,
    MimeType,
    LastModified,
    FileSize,
    Visibility,
}

impl fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetadataKind::Metadata => "metadata",
            MetadataKind::MimeType => "mime_type",
            MetadataKind::LastModified => "last_modified",
            MetadataKind::FileSize => "file_size",
            MetadataKind::Visibility => "visibility",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Unable to write file at location: {location}. {reason}")]
    UnableToWriteFile { location: String, reason: String },

    #[error("Unable to read file from location: {location}. {reason}")]
    UnableToReadFile { location: String, reason: String },

    #[error("Unable to delete file located at: {location}. {reason}")]
    UnableToDeleteFile { location: String, reason: String },

    #[error("Unable to move file from {from} to {to}. {reason}")]
    UnableToMoveFile { from: String, to: String, reason: String },

    #[error("Unable to copy file from {from} to {to}. {reason}")]
    UnableToCopyFile { from: String, to: String, reason: String },

    #[error("Unable to retrieve the {kind} for file at location: {location}. {reason}")]
    UnableToRetrieveMetadata {
        location: String,
        kind: MetadataKind,
        reason: String,
    },

    #[error("Unable to set visibility for file {location}. {reason}")]
    UnableToSetVisibility { location: String, reason: String },

    #[error("Unable to check existence for: {location}. {reason}")]
    UnableToCheckExistence { location: String, reason: String },

    #[error("Unable to list contents of: {location}. {reason}")]
    UnableToListContents { location: String, reason: String },

    #[error("Unable to generate public url for file {location}. {reason}")]
    UnableToGenerateUrl { location: String, reason: String },

    #[error("Unable to generate temporary url for file {location}. {reason}")]
    UnableToGenerateTemporaryUrl { location: String, reason: String },
}

impl StorageError {
    pub fn write(location: &str, reason: impl fmt::Display) -> Self {
        Self::UnableToWriteFile { location: location.to_string(), reason: reason.to_string() }
    }

    pub fn read(location: &str, reason: impl fmt::Display) -> Self {
        Self::UnableToReadFile { location: location.to_string(), reason: reason.to_string() }
    }

    pub fn delete(location: &str, reason: impl fmt::Display) -> Self {
        Self::UnableToDeleteFile { location: location.to_string(), reason: reason.to_string() }
    }

    pub fn move_file(from: &str, to: &str, reason: impl fmt::Display) -> Self {
        Self::UnableToMoveFile {
            from: from.to_string(),
            to: to.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn copy_file(from: &str, to: &str, reason: impl fmt::Display) -> Self {
        Self::UnableToCopyFile {
            from: from.to_string(),
            to: to.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn metadata(location: &str, kind: MetadataKind, reason: impl fmt::Display) -> Self {
        Self::UnableToRetrieveMetadata {
            location: location.to_string(),
            kind,
            reason: reason.to_string(),
        }
    }

    /// Re-label a metadata failure with the field that was asked for / 按请求的字段重新标记
    pub fn with_metadata_kind(self, kind: MetadataKind) -> Self {
        match self {
            Self::UnableToRetrieveMetadata { location, reason, .. } => {
                Self::UnableToRetrieveMetadata { location, kind, reason }
            }
            other => other,
        }
    }

    pub fn set_visibility(location: &str) -> Self {
        Self::UnableToSetVisibility {
            location: location.to_string(),
            reason: "Adapter does not support visibility controls.".to_string(),
        }
    }

    pub fn existence(location: &str, reason: impl fmt::Display) -> Self {
        Self::UnableToCheckExistence { location: location.to_string(), reason: reason.to_string() }
    }

    pub fn list(location: &str, reason: impl fmt::Display) -> Self {
        Self::UnableToListContents { location: location.to_string(), reason: reason.to_string() }
    }

    pub fn url(location: &str, reason: impl fmt::Display) -> Self {
        Self::UnableToGenerateUrl { location: location.to_string(), reason: reason.to_string() }
    }

    pub fn temporary_url(location: &str, reason: impl fmt::Display) -> Self {
        Self::UnableToGenerateTemporaryUrl {
            location: location.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Path the failed operation targeted (source path for move/copy) / 失败操作的路径
    pub fn location(&self) -> &str {
        match self {
            Self::UnableToWriteFile { location, .. }
            | Self::UnableToReadFile { location, .. }
            | Self::UnableToDeleteFile { location, .. }
            | Self::UnableToRetrieveMetadata { location, .. }
            | Self::UnableToSetVisibility { location, .. }
            | Self::UnableToCheckExistence { location, .. }
            | Self::UnableToListContents { location, .. }
            | Self::UnableToGenerateUrl { location, .. }
            | Self::UnableToGenerateTemporaryUrl { location, .. } => location,
            Self::UnableToMoveFile { from, .. } | Self::UnableToCopyFile { from, .. } => from,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_metadata_kind() {
        let err = StorageError::metadata("a.txt", MetadataKind::Metadata, "no such file")
            .with_metadata_kind(MetadataKind::FileSize);
        match err {
            StorageError::UnableToRetrieveMetadata { location, kind, reason } => {
                assert_eq!(location, "a.txt");
                assert_eq!(kind, MetadataKind::FileSize);
                assert_eq!(reason, "no such file");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let err = StorageError::read("a.txt", "boom").with_metadata_kind(MetadataKind::MimeType);
        assert!(matches!(err, StorageError::UnableToReadFile { .. }));
    }

    #[test]
    fn test_messages_carry_paths_and_reason() {
        let err = StorageError::write("a/b.txt", "file exists");
        assert_eq!(err.to_string(), "Unable to write file at location: a/b.txt. file exists");

        let err = StorageError::move_file("a.txt", "b.txt", "no such file or directory");
        assert_eq!(err.location(), "a.txt");
        assert!(err.to_string().contains("from a.txt to b.txt"));

        let err = StorageError::metadata("c.png", MetadataKind::MimeType, "");
        assert!(err.to_string().contains("mime_type"));
    }
}
