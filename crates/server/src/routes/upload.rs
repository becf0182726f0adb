use axum::{
    extract::{Multipart, State},
    Extension, Json,
};

use crate::{error::AppError, integrations::UploadedFile, middleware::AuthSession, state::AppState};

pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024; // 10MB

pub const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];
pub const DOCUMENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
];

/// A file pulled out of a multipart body and checked against its magic bytes
#[derive(Debug)]
pub struct FilePart {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Trust the leading bytes, never the declared content type or extension
pub fn detect_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() < 4 {
        return None;
    }
    match bytes {
        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        // GIF: 47 49 46 38
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        // WebP: RIFF .... WEBP
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        // PDF: %PDF
        [0x25, 0x50, 0x44, 0x46, ..] => Some("application/pdf"),
        _ => None,
    }
}

/// Keep only the final path segment and a conservative character set
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or("");
    let cleaned: String = base
        .chars()
        .filter(|&c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Read the `file` field (or the first field carrying a file name)
pub async fn read_file(multipart: &mut Multipart, allowed: &[&str]) -> Result<FilePart, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!("Multipart error: {}", e);
        AppError::BadRequest("Invalid multipart data".to_string())
    })? {
        if field.name() != Some("file") && field.file_name().is_none() {
            continue;
        }

        let file_name = sanitize_filename(field.file_name().unwrap_or("upload"));
        let bytes = field
            .bytes()
            .await
            .map_err(|_| AppError::BadRequest("Failed to read file data".to_string()))?;

        if bytes.is_empty() {
            return Err(AppError::BadRequest("Empty file".to_string()));
        }
        if bytes.len() > MAX_FILE_SIZE {
            return Err(AppError::BadRequest("File too large. Maximum size is 10MB.".to_string()));
        }

        let content_type = detect_mime(&bytes)
            .filter(|mime| allowed.contains(mime))
            .ok_or_else(|| AppError::BadRequest("Unsupported file type".to_string()))?;

        return Ok(FilePart {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Err(AppError::BadRequest("No file provided".to_string()))
}

/// Forward a photo or document to Cloudinary
/// POST /utils/upload
pub async fn upload_file(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    mut multipart: Multipart,
) -> Result<Json<UploadedFile>, AppError> {
    let file = read_file(&mut multipart, DOCUMENT_TYPES).await?;
    let size = file.bytes.len();

    let uploaded = state
        .files
        .upload(&file.file_name, file.bytes, file.content_type)
        .await?;

    tracing::info!(
        "{} {} uploaded {} ({} bytes, {})",
        session.user_type,
        session.user_id,
        uploaded.public_id,
        size,
        file.content_type
    );
    Ok(Json(uploaded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_mime() {
        assert_eq!(detect_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(detect_mime(b"\x89PNG\r\n\x1a\n"), Some("image/png"));
        assert_eq!(detect_mime(b"GIF89a"), Some("image/gif"));
        assert_eq!(detect_mime(b"RIFF\x00\x00\x00\x00WEBPVP8 "), Some("image/webp"));
        assert_eq!(detect_mime(b"%PDF-1.7"), Some("application/pdf"));
        assert_eq!(detect_mime(b"MZ\x90\x00"), None);
        assert_eq!(detect_mime(b"ab"), None);
    }

    #[test]
    fn test_pdf_is_not_an_image() {
        let mime = detect_mime(b"%PDF-1.4").unwrap();
        assert!(DOCUMENT_TYPES.contains(&mime));
        assert!(!IMAGE_TYPES.contains(&mime));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\foto 1.jpg"), "foto1.jpg");
        assert_eq!(sanitize_filename(".hidden"), "hidden");
        assert_eq!(sanitize_filename("***"), "upload");
    }
}
