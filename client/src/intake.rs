use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use uuid::Uuid;

use crate::transport::UploadPart;

/// Name sent for uploads whose original file name is unknown. The server
/// only treats a multipart part as a file when it carries a file name.
pub const DEFAULT_FILE_NAME: &str = "upload";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please select an image to analyze")]
    NoFile,
    #[error("Please select a valid image file")]
    NotAnImage(String),
}

/// A file as handed over by the host, before validation.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub name: Option<String>,
    pub mime_type: String,
    pub bytes: Bytes,
}

impl IncomingFile {
    pub fn new(
        name: Option<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            name,
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }
}

/// How the user handed over files. Only the first file is used.
#[derive(Debug, Clone)]
pub enum FileSource {
    Picked(Vec<IncomingFile>),
    Dropped(Vec<IncomingFile>),
}

impl FileSource {
    pub fn picked(file: IncomingFile) -> Self {
        FileSource::Picked(vec![file])
    }

    pub fn dropped(file: IncomingFile) -> Self {
        FileSource::Dropped(vec![file])
    }

    fn origin(&self) -> &'static str {
        match self {
            FileSource::Picked(_) => "picked",
            FileSource::Dropped(_) => "dropped",
        }
    }

    fn into_first(self) -> Option<IncomingFile> {
        match self {
            FileSource::Picked(files) | FileSource::Dropped(files) => files.into_iter().next(),
        }
    }
}

/// Tracks which preview handles are still alive.
#[derive(Debug, Clone, Default)]
pub struct PreviewStore {
    live: Arc<Mutex<HashSet<Uuid>>>,
}

impl PreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&self) -> PreviewHandle {
        let id = Uuid::new_v4();
        self.live().insert(id);
        PreviewHandle {
            id,
            uri: format!("preview:{}", id),
            store: self.clone(),
        }
    }

    pub fn is_live(&self, uri: &str) -> bool {
        uri.strip_prefix("preview:")
            .and_then(|id| Uuid::parse_str(id).ok())
            .is_some_and(|id| self.live().contains(&id))
    }

    pub fn live_count(&self) -> usize {
        self.live().len()
    }

    fn release(&self, id: Uuid) {
        self.live().remove(&id);
    }

    fn live(&self) -> MutexGuard<'_, HashSet<Uuid>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Local reference the host can render the selected image from. Released
/// when dropped.
#[derive(Debug)]
pub struct PreviewHandle {
    id: Uuid,
    uri: String,
    store: PreviewStore,
}

impl PreviewHandle {
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.store.release(self.id);
        log::debug!("Released preview {}", self.uri);
    }
}

/// A validated image waiting to be submitted.
#[derive(Debug)]
pub struct UploadCandidate {
    file_name: Option<String>,
    mime_type: String,
    bytes: Bytes,
    preview: PreviewHandle,
}

impl UploadCandidate {
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn preview(&self) -> &PreviewHandle {
        &self.preview
    }

    pub fn upload_part(&self) -> UploadPart {
        UploadPart {
            file_name: self
                .file_name
                .clone()
                .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string()),
            mime_type: self.mime_type.clone(),
            bytes: self.bytes.clone(),
        }
    }
}

/// Matches `image/<subtype>`, ignoring case and any parameters.
pub fn is_image_mime(mime_type: &str) -> bool {
    let essence = mime_type.split(';').next().unwrap_or_default().trim();
    match essence.split_once('/') {
        Some((top, sub)) => top.eq_ignore_ascii_case("image") && !sub.trim().is_empty(),
        None => false,
    }
}

pub fn accept(
    source: FileSource,
    previews: &PreviewStore,
) -> Result<UploadCandidate, ValidationError> {
    let origin = source.origin();
    let file = source.into_first().ok_or(ValidationError::NoFile)?;

    if !is_image_mime(&file.mime_type) {
        log::warn!(
            "Rejected {} file {:?} with type {:?}",
            origin,
            file.name.as_deref().unwrap_or(DEFAULT_FILE_NAME),
            file.mime_type
        );
        return Err(ValidationError::NotAnImage(file.mime_type));
    }

    let preview = previews.allocate();
    log::debug!(
        "Accepted {} image {:?} ({} bytes) as {}",
        origin,
        file.name.as_deref().unwrap_or(DEFAULT_FILE_NAME),
        file.bytes.len(),
        preview.uri()
    );

    Ok(UploadCandidate {
        file_name: file.name,
        mime_type: file.mime_type,
        bytes: file.bytes,
        preview,
    })
}
