//! Stored attachments: allow-list validation, collision-free naming, disk IO

use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Largest accepted attachment.
pub const MAX_FILE_BYTES: usize = 100 * 1024 * 1024;

/// Extensions accepted regardless of declared content type.
const ALLOWED_EXTENSIONS: [&str; 25] = [
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "svg", "heic", "heif", "pdf", "doc", "docx",
    "txt", "odt", "mp3", "wav", "m4a", "ogg", "aac", "flac", "mp4", "webm", "mov", "avi", "mkv",
];

/// Content types accepted regardless of extension.
const ALLOWED_CONTENT_TYPES: [&str; 25] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/bmp",
    "image/svg+xml",
    "image/heic",
    "image/heif",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
    "application/vnd.oasis.opendocument.text",
    "audio/mpeg",
    "audio/wav",
    "audio/x-m4a",
    "audio/mp4",
    "audio/ogg",
    "audio/aac",
    "audio/flac",
    "video/mp4",
    "video/webm",
    "video/quicktime",
    "video/x-msvideo",
    "video/x-matroska",
];

/// Check an upload against the size ceiling and the allow-lists.
///
/// A file passes when either its extension or its declared content type
/// is allowed; rejection happens before anything touches disk.
pub fn validate(original_name: &str, content_type: Option<&str>, size: usize) -> Result<()> {
    if size > MAX_FILE_BYTES {
        return Err(Error::Validation(
            "Archivo demasiado grande (máximo 100MB)".to_string(),
        ));
    }

    let ext_ok = extension_of(original_name)
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false);
    let mime_ok = content_type
        .map(|ct| ALLOWED_CONTENT_TYPES.contains(&ct))
        .unwrap_or(false);

    if ext_ok || mime_ok {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "Tipo no permitido: {}. Usa imágenes, PDF, audio o video.",
            original_name
        )))
    }
}

/// Lowercased extension of the final path component, without the dot.
fn extension_of(name: &str) -> Option<String> {
    let base = final_component(name);
    let idx = base.rfind('.')?;
    if idx + 1 == base.len() {
        return None;
    }
    Some(base[idx + 1..].to_ascii_lowercase())
}

/// Strip any client-supplied directory part.
fn final_component(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// `<uuid>-<sanitized-base><ext>`: base limited to `[A-Za-z0-9_-]` and
/// 50 chars, extension preserved.
fn stored_filename(original_name: &str) -> String {
    let base = final_component(original_name);
    let (stem, ext) = match base.rfind('.') {
        Some(idx) => (&base[..idx], &base[idx..]),
        None => (base, ""),
    };
    let safe: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(50)
        .collect();
    format!("{}-{}{}", Uuid::new_v4(), safe, ext)
}

/// Disk-backed attachment store rooted at the uploads directory.
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub async fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Persist validated content under a fresh unique name and return
    /// the public path the mailbox item records.
    pub async fn store(&self, original_name: &str, content: &[u8]) -> Result<String> {
        let stored = stored_filename(original_name);
        let full_path = self.root.join(&stored);

        let mut file = File::create(&full_path).await?;
        file.write_all(content).await?;
        file.sync_all().await?;

        Ok(format!("/uploads/{}", stored))
    }

    /// Read a stored file back for serving. Returns `None` for unknown
    /// names and for anything that tries to escape the uploads root.
    pub async fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        if name.is_empty() || name.contains("..") || name.contains('/') || name.contains('\\') {
            return Ok(None);
        }

        match fs::read(self.root.join(name)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
