//! Upload parts and download destinations carried by transfer tasks.
//!
//! These are plain descriptions; no file is touched until a
//! [`Transport`](crate::Transport) acts on them.

use bytes::Bytes;
use std::path::{Path, PathBuf};

/// Where a multipart part's content comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum FormDataProvider {
    /// In-memory bytes.
    Data(Bytes),
    /// Contents of a local file, read when the upload runs.
    File(PathBuf),
}

/// One part of a `multipart/form-data` body.
///
/// # Examples
///
/// ```
/// use moya::MultipartFormData;
///
/// let avatar = MultipartFormData::file("avatar", "/tmp/me.png")
///     .with_mime_type("image/png");
/// let caption = MultipartFormData::text("caption", "hello");
///
/// assert_eq!(avatar.file_name.as_deref(), Some("me.png"));
/// assert!(caption.file_name.is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MultipartFormData {
    /// The content source.
    pub provider: FormDataProvider,
    /// The form field name.
    pub name: String,
    /// File name reported in `Content-Disposition`.
    pub file_name: Option<String>,
    /// Part `Content-Type`.
    pub mime_type: Option<String>,
}

impl MultipartFormData {
    /// A part backed by in-memory bytes.
    pub fn data(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            provider: FormDataProvider::Data(data.into()),
            name: name.into(),
            file_name: None,
            mime_type: None,
        }
    }

    /// A plain text field.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        let value: String = value.into();
        Self::data(name, value)
    }

    /// A part backed by a local file. The file name defaults to the path's
    /// last component.
    pub fn file(name: impl Into<String>, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self {
            provider: FormDataProvider::File(path.to_path_buf()),
            name: name.into(),
            file_name: path
                .file_name()
                .map(|file_name| file_name.to_string_lossy().into_owned()),
            mime_type: None,
        }
    }

    /// Overrides the reported file name.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Sets the part content type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// How an existing destination is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadOptions {
    /// Create missing parent directories.
    pub create_intermediate_directories: bool,
    /// Replace a file already at the destination instead of failing.
    pub remove_previous_file: bool,
}

/// Where a downloaded body is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadDestination {
    /// Target file path.
    pub path: PathBuf,
    /// Handling for existing files and missing directories.
    pub options: DownloadOptions,
}

impl DownloadDestination {
    /// Writes to `path` with default options.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: DownloadOptions::default(),
        }
    }

    /// Creates missing parent directories before writing.
    pub fn create_intermediate_directories(mut self) -> Self {
        self.options.create_intermediate_directories = true;
        self
    }

    /// Replaces an existing file at the destination.
    pub fn remove_previous_file(mut self) -> Self {
        self.options.remove_previous_file = true;
        self
    }
}
