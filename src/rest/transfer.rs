//! Binary upload and download for `files` and `investigative_actions`.
//!
//! Only these two resource types carry binary content, so the capability is
//! expressed as two traits implemented by typed wrappers around
//! [`ResourceInstance`] rather than by every record.
//!
//! | Call | Request |
//! |---|---|
//! | [`Downloadable::download`] | `GET <prefix>/<type>/<id>/download?format=<fmt>` |
//! | [`Uploadable::upload`] on [`File`] | `POST <prefix>/files/<id>/upload` (octet-stream) |
//! | [`Uploadable::upload`] on [`InvestigativeAction`] | creates a linked `files` record, then uploads to it |
//!
//! # Example
//!
//! ```rust,ignore
//! use workbench_api::rest::{Downloadable, FileUpload, InvestigativeAction, Uploadable};
//!
//! let record = client.resource("investigative_actions")?.get(id).await?;
//! let mut action = InvestigativeAction::try_from(record)?;
//! let results = action.download(Some("json")).await?;
//!
//! let file = action
//!     .upload(FileUpload::new("notes.txt", b"triage notes".to_vec()).file_type("text/plain"))
//!     .await?;
//! ```

use std::ops::{Deref, DerefMut};

use serde_json::Value;

use crate::clients::{DataType, HttpRequest};
use crate::rest::{action_url, ResourceError, ResourceInstance, ResourceOperation};

/// Wire type of file records.
pub const FILES_TYPE: &str = "files";

/// Wire type of investigative action records.
pub const INVESTIGATIVE_ACTIONS_TYPE: &str = "investigative_actions";

/// Format requested when the caller does not name one.
pub const DEFAULT_DOWNLOAD_FORMAT: &str = "json";

/// Relationship names a file record may use to point at its action.
const ACTION_LINKS: [&str; 2] = ["investigative_action", "investigative_actions"];

/// Content to upload, with the metadata stored on the file record.
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    filename: String,
    content: Vec<u8>,
    file_type: Option<String>,
    file_meta: Option<Value>,
}

impl FileUpload {
    /// Creates an upload of `content` named `filename`.
    #[must_use]
    pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content,
            file_type: None,
            file_meta: None,
        }
    }

    /// Sets the file type recorded on the file record.
    #[must_use]
    pub fn file_type(mut self, file_type: impl Into<String>) -> Self {
        self.file_type = Some(file_type.into());
        self
    }

    /// Sets free-form metadata recorded on the file record.
    #[must_use]
    pub fn file_meta(mut self, meta: Value) -> Self {
        self.file_meta = Some(meta);
        self
    }

    /// Returns the file name.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Returns the content.
    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

/// A record whose content can be downloaded.
#[allow(async_fn_in_trait)]
pub trait Downloadable {
    /// Returns the underlying record.
    fn record(&self) -> &ResourceInstance;

    /// Downloads the record's content in `format` (default `json`).
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotPersisted`] for an unsaved record,
    /// [`ResourceError::Detached`] without a client, and any transport error.
    async fn download(&self, format: Option<&str>) -> Result<Vec<u8>, ResourceError> {
        let record = self.record();
        let id = record.to_relationship_ref()?.id;
        let client = record.client()?;
        let url = action_url(
            client.prefix(),
            record.type_name(),
            &id,
            ResourceOperation::Download,
        );
        let format = format.unwrap_or(DEFAULT_DOWNLOAD_FORMAT);

        tracing::debug!(type_name = record.type_name(), id = %id, format, "Downloading content");
        let request = HttpRequest::builder(ResourceOperation::Download.http_method(), url)
            .query_param("format", format)
            .build()?;
        let response = client.send(request).await?;
        Ok(response.bytes().to_vec())
    }
}

/// A record that accepts uploaded content.
#[allow(async_fn_in_trait)]
pub trait Uploadable {
    /// Uploads `file` and returns the file record holding it.
    ///
    /// # Errors
    ///
    /// Returns validation errors if the `files` schema lacks the needed
    /// fields, and any error from saving or sending.
    async fn upload(&mut self, file: FileUpload) -> Result<File, ResourceError>;
}

macro_rules! typed_record {
    ($(#[$meta:meta])* $name:ident, $type_name:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name(ResourceInstance);

        impl $name {
            /// Returns the wrapped record.
            #[must_use]
            pub fn into_inner(self) -> ResourceInstance {
                self.0
            }
        }

        impl TryFrom<ResourceInstance> for $name {
            type Error = ResourceError;

            fn try_from(record: ResourceInstance) -> Result<Self, Self::Error> {
                if record.type_name() == $type_name {
                    Ok(Self(record))
                } else {
                    Err(ResourceError::TypeMismatch {
                        expected: $type_name,
                        actual: record.type_name().to_string(),
                    })
                }
            }
        }

        impl Deref for $name {
            type Target = ResourceInstance;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl DerefMut for $name {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }

        impl Downloadable for $name {
            fn record(&self) -> &ResourceInstance {
                &self.0
            }
        }
    };
}

typed_record!(
    /// A `files` record.
    File,
    FILES_TYPE
);

typed_record!(
    /// An `investigative_actions` record.
    InvestigativeAction,
    INVESTIGATIVE_ACTIONS_TYPE
);

impl Uploadable for File {
    /// Saves the record first if it is new, filling in the file metadata,
    /// then sends the content.
    async fn upload(&mut self, file: FileUpload) -> Result<File, ResourceError> {
        let FileUpload {
            filename,
            content,
            file_type,
            file_meta,
        } = file;

        if self.is_new() {
            self.0.set("filename", filename)?;
            if let Some(file_type) = file_type {
                self.0.set("file_type", file_type)?;
            }
            if let Some(meta) = file_meta {
                self.0.set("file_meta", meta)?;
            }
            self.0.save().await?;
        }

        let id = self.0.to_relationship_ref()?.id;
        let client = self.0.client()?.clone();
        let url = action_url(client.prefix(), FILES_TYPE, &id, ResourceOperation::Upload);

        tracing::debug!(id = %id, bytes = content.len(), "Uploading file content");
        let request = HttpRequest::builder(ResourceOperation::Upload.http_method(), url)
            .body(content)
            .body_type(DataType::OctetStream)
            .build()?;
        client.send(request).await?;
        Ok(self.clone())
    }
}

impl Uploadable for InvestigativeAction {
    /// Creates a `files` record linked to this action and uploads to it.
    async fn upload(&mut self, file: FileUpload) -> Result<File, ResourceError> {
        let action = self.0.to_relationship_ref()?;
        let client = self.0.client()?.clone();
        let mut record = client.resource(FILES_TYPE)?.new_record();

        let link = ACTION_LINKS
            .into_iter()
            .find(|name| record.schema().has_relationship(name))
            .ok_or_else(|| ResourceError::NotARelationship {
                type_name: FILES_TYPE.to_string(),
                name: ACTION_LINKS[0].to_string(),
            })?;
        record.add_relationship(link, action)?;

        File(record).upload(file).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::ResourceSchema;
    use std::sync::Arc;

    fn record(type_name: &str) -> ResourceInstance {
        ResourceInstance::new(Arc::new(ResourceSchema::new(type_name)), None)
    }

    #[test]
    fn test_typed_records_check_type() {
        assert!(File::try_from(record("files")).is_ok());
        assert!(InvestigativeAction::try_from(record("investigative_actions")).is_ok());

        let error = File::try_from(record("comments")).unwrap_err();
        assert_eq!(error.to_string(), "Expected a files record, got comments");
    }

    #[test]
    fn test_file_upload_builder() {
        let upload = FileUpload::new("a.txt", b"abc".to_vec())
            .file_type("text/plain")
            .file_meta(serde_json::json!({"source": "triage"}));
        assert_eq!(upload.filename(), "a.txt");
        assert_eq!(upload.content(), b"abc");
        assert_eq!(upload.file_type.as_deref(), Some("text/plain"));
    }

    #[tokio::test]
    async fn test_download_requires_saved_record() {
        let file = File::try_from(record("files")).unwrap();
        let error = file.download(None).await.unwrap_err();
        assert!(matches!(error, ResourceError::NotPersisted { .. }));
    }
}
