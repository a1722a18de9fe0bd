use actix_multipart::Multipart;
use futures::{StreamExt, TryStreamExt};
use shared::UPLOAD_FIELD;

use crate::error::PredictError;

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub struct UploadedImage {
    pub filename: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    pub fn display_name(&self) -> &str {
        self.filename.as_deref().unwrap_or("<unnamed>")
    }
}

/// Reads the `file` field of the form. Other fields are skipped.
pub async fn read_image_field(mut payload: Multipart) -> Result<UploadedImage, PredictError> {
    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| PredictError::Multipart(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            while let Some(chunk) = field.next().await {
                chunk.map_err(|e| PredictError::Multipart(e.to_string()))?;
            }
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_owned);
        let content_type = field
            .content_type()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_default();

        if !content_type.starts_with("image/") {
            log::error!("Invalid file type: {:?}", content_type);
            return Err(PredictError::NotAnImage);
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| PredictError::Multipart(e.to_string()))?;
            if bytes.len() + chunk.len() > MAX_UPLOAD_BYTES {
                log::warn!("Upload exceeds {} bytes, rejecting", MAX_UPLOAD_BYTES);
                return Err(PredictError::TooLarge);
            }
            bytes.extend_from_slice(&chunk);
        }

        return Ok(UploadedImage {
            filename,
            content_type,
            bytes,
        });
    }

    Err(PredictError::MissingFile)
}
