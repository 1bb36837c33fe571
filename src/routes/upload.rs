use axum::body::Bytes;
use axum::http::HeaderMap;

use crate::error::AppError;
use crate::stores::properties::ImageFile;

pub const FILE_FIELD: &str = "file";

/// Pull the `file` part out of a multipart/form-data body.
pub async fn parse_image(headers: &HeaderMap, body: Bytes) -> Result<ImageFile, AppError> {
    let boundary = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| AppError::BadRequest("Missing multipart boundary".to_string()))?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Multipart error: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        // Keep the object path flat under the property's folder.
        let name = field
            .file_name()
            .and_then(|n| n.rsplit(['/', '\\']).next())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::BadRequest("File name is required".to_string()))?
            .to_string();
        let content_type = field.content_type().map(|m| m.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Field read error: {e}")))?;

        return Ok(ImageFile {
            name,
            content_type,
            data,
        });
    }

    Err(AppError::BadRequest(format!("Missing '{FILE_FIELD}' field")))
}
