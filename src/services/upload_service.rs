//! Local disk storage for multipart uploads.
//!
//! Files land in a sub-folder of the upload directory chosen by the form
//! field name and are served back under `/Uploads`. Stored paths are the
//! public ones (`Uploads/Aadhar/<file>`), never absolute disk paths.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use axum::extract::Multipart;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::AppError;

/// URL prefix the upload directory is mounted at.
pub const PUBLIC_PREFIX: &str = "Uploads";

pub const AADHAR: &str = "aadhar";
pub const DRIVING_LICENSE: &str = "drivingLicense";
pub const ADDRESS_PROOF: &str = "addressProof";
pub const PROFILE_PICTURE: &str = "profilePicture";

/// Sub-folder for a form field; unknown fields go to the root.
pub fn folder_for(field: &str) -> &'static str {
    match field {
        AADHAR => "Aadhar",
        DRIVING_LICENSE => "DrivingLicense",
        ADDRESS_PROOF => "AddressProof",
        PROFILE_PICTURE => "ProfilePicture",
        _ => "",
    }
}

/// Reduce a client-supplied file name to a safe final component.
pub fn sanitize_file_name(name: &str) -> String {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

/// A file written to disk.
#[derive(Debug, Clone)]
pub struct SavedFile {
    pub field: String,
    /// Path as served, e.g. `Uploads/Aadhar/1700000000000-<uuid>-card.pdf`
    pub public_path: String,
    pub disk_path: PathBuf,
}

/// Files and text fields read from one multipart request.
#[derive(Debug, Default)]
pub struct UploadSet {
    pub files: Vec<SavedFile>,
    pub text: HashMap<String, String>,
}

impl UploadSet {
    pub fn file(&self, field: &str) -> Option<&SavedFile> {
        self.files.iter().find(|f| f.field == field)
    }

    pub fn path(&self, field: &str) -> Option<String> {
        self.file(field).map(|f| f.public_path.clone())
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.text
            .get(field)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Delete every file of this request.
    pub async fn discard(self) {
        for file in self.files {
            remove_file(&file.disk_path).await;
        }
    }
}

/// Write one file into the folder for `field`.
///
/// Every stored name is unique and the file is created exclusively, so an
/// upload never replaces another one on disk.
pub async fn store_file(
    upload_dir: &Path,
    field: &str,
    original_name: &str,
    bytes: &[u8],
) -> Result<SavedFile, AppError> {
    let folder = folder_for(field);
    let file_name = format!(
        "{}-{}-{}",
        chrono::Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        sanitize_file_name(original_name)
    );

    let dir = upload_dir.join(folder);
    tokio::fs::create_dir_all(&dir).await?;
    let disk_path = dir.join(&file_name);

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&disk_path)
        .await?;
    if let Err(e) = write_all(&mut file, bytes).await {
        drop(file);
        remove_file(&disk_path).await;
        return Err(e.into());
    }

    let public_path = if folder.is_empty() {
        format!("{}/{}", PUBLIC_PREFIX, file_name)
    } else {
        format!("{}/{}/{}", PUBLIC_PREFIX, folder, file_name)
    };

    tracing::debug!(field, path = %public_path, size = bytes.len(), "Upload stored");

    Ok(SavedFile {
        field: field.to_string(),
        public_path,
        disk_path,
    })
}

async fn write_all(file: &mut tokio::fs::File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes).await?;
    file.flush().await
}

/// Read a multipart body, storing at most one file per accepted field.
///
/// Fields outside `file_fields` and `text_fields` are skipped. If reading
/// fails part way, files already written are removed before returning.
pub async fn receive(
    upload_dir: &Path,
    mut multipart: Multipart,
    file_fields: &[&str],
    text_fields: &[&str],
) -> Result<UploadSet, AppError> {
    let mut set = UploadSet::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                set.discard().await;
                return Err(e.into());
            }
        };
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if file_fields.contains(&name.as_str()) {
            if set.file(&name).is_some() {
                set.discard().await;
                return Err(AppError::invalid(format!(
                    "Only one file is allowed for '{}'",
                    name
                )));
            }
            let original_name = field.file_name().unwrap_or("file").to_string();
            let bytes = match field.bytes().await {
                Ok(bytes) => bytes,
                Err(e) => {
                    set.discard().await;
                    return Err(e.into());
                }
            };
            if bytes.is_empty() {
                continue;
            }
            match store_file(upload_dir, &name, &original_name, &bytes).await {
                Ok(saved) => set.files.push(saved),
                Err(e) => {
                    set.discard().await;
                    return Err(e);
                }
            }
        } else if text_fields.contains(&name.as_str()) {
            match field.text().await {
                Ok(value) => {
                    set.text.insert(name, value);
                }
                Err(e) => {
                    set.discard().await;
                    return Err(e.into());
                }
            }
        }
    }

    Ok(set)
}

/// Disk location of a stored public path, if it points inside the upload directory.
pub fn disk_path_of(upload_dir: &Path, public_path: &str) -> Option<PathBuf> {
    let relative = public_path
        .trim_start_matches('/')
        .strip_prefix(PUBLIC_PREFIX)?
        .trim_start_matches('/');
    if relative.is_empty() || relative.split('/').any(|part| part == "..") {
        return None;
    }
    Some(upload_dir.join(relative))
}

/// Remove a previously stored file. Missing files are not an error.
pub async fn remove_stored(upload_dir: &Path, public_path: &str) {
    if let Some(path) = disk_path_of(upload_dir, public_path) {
        remove_file(&path).await;
    }
}

async fn remove_file(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove upload"),
    }
}
