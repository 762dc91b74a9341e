//! Bucket-style object storage on the local filesystem.
//!
//! Objects live at `<root>/<bucket>/<key>` where the key starts with the
//! owning user's id. Reads go through an authenticated download route
//! reachable under the configured public base URL.

use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub const REPORTS_BUCKET: &str = "checkup-reports";
pub const SELFIES_BUCKET: &str = "checkup-selfies";
pub const LICENSES_BUCKET: &str = "doctor-licenses";

const BUCKETS: &[&str] = &[REPORTS_BUCKET, SELFIES_BUCKET, LICENSES_BUCKET];

#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
    public_base_url: String,
}

/// A file received from a multipart form, not yet persisted.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Where an object ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
}

impl StoredObject {
    /// `bucket/key`, the form persisted in database rows.
    pub fn path(&self) -> String {
        format!("{}/{}", self.bucket, self.key)
    }
}

impl Storage {
    pub fn new(root: impl AsRef<Path>, public_base_url: &str) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            public_base_url: public_base_url.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `upload` under `<owner>/<uuid>-<sanitized name>` in `bucket`.
    pub async fn put(&self, bucket: &str, owner: Uuid, upload: &Upload) -> AppResult<StoredObject> {
        if upload.bytes.is_empty() {
            return Err(AppError::BadRequest(format!(
                "file {} is empty",
                upload.file_name
            )));
        }
        let key = format!("{}/{}-{}", owner, Uuid::new_v4(), sanitize(&upload.file_name));
        let path = self.root.join(bucket).join(&key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Internal(e.into()))?;
        }
        fs::write(&path, &upload.bytes)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        tracing::debug!(
            bucket,
            key = %key,
            bytes = upload.bytes.len(),
            content_type = upload.content_type.as_deref().unwrap_or("-"),
            "object stored"
        );
        Ok(StoredObject {
            bucket: bucket.to_string(),
            key,
        })
    }

    /// Best-effort delete; a missing object is not an error.
    pub async fn remove(&self, object: &StoredObject) {
        let path = self.root.join(&object.bucket).join(&object.key);
        if let Err(err) = fs::remove_file(&path).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(error = %err, path = %path.display(), "failed to remove object");
            }
        }
    }

    /// On-disk location of an existing key. Unknown buckets and keys that
    /// `put` could never have produced are `NotFound`.
    pub fn object_path(&self, bucket: &str, key: &str) -> AppResult<PathBuf> {
        if !BUCKETS.contains(&bucket) {
            return Err(AppError::NotFound);
        }
        let well_formed = key.split('/').count() == 2
            && key.split('/').all(|segment| !segment.is_empty() && sanitize(segment) == segment);
        if !well_formed || owner_of(key).is_none() {
            return Err(AppError::NotFound);
        }
        Ok(self.root.join(bucket).join(key))
    }

    pub fn public_url(&self, path: &str) -> String {
        match path.split_once('/') {
            Some((bucket, key)) => build_public_url(&self.public_base_url, bucket, key),
            None => build_public_url(&self.public_base_url, path, ""),
        }
    }
}

pub fn build_public_url(base: &str, bucket: &str, key: &str) -> String {
    let trimmed = base.trim_end_matches('/');
    if trimmed.contains("{bucket}") || trimmed.contains("{key}") {
        return trimmed.replace("{bucket}", bucket).replace("{key}", key);
    }
    format!("{}/{}/{}", trimmed, bucket, key)
}

/// The user id every key is prefixed with.
pub fn owner_of(key: &str) -> Option<Uuid> {
    key.split_once('/')
        .and_then(|(owner, _)| Uuid::parse_str(owner).ok())
}

/// Keep only characters that are safe in a single path segment.
pub fn sanitize(filename: &str) -> String {
    let cleaned: String = filename
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '_' || *c == '-')
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_separators_and_dots() {
        assert_eq!(sanitize("../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize("my selfie (1).JPG"), "myselfie1.JPG");
        assert_eq!(sanitize("///"), "upload");
    }

    #[test]
    fn public_url_supports_templates() {
        assert_eq!(
            build_public_url("http://cdn.local/files/", "b", "k.png"),
            "http://cdn.local/files/b/k.png"
        );
        assert_eq!(
            build_public_url("https://{bucket}.cdn.local/{key}", "b", "k.png"),
            "https://b.cdn.local/k.png"
        );
    }

    #[test]
    fn object_path_only_accepts_keys_put_would_write() {
        let storage = Storage::new("/srv/uploads", "http://localhost/api/files");
        let owner = Uuid::new_v4();
        let key = format!("{owner}/{}-face.jpg", Uuid::new_v4());

        let path = storage.object_path(SELFIES_BUCKET, &key).unwrap();
        assert_eq!(path, Path::new("/srv/uploads").join(SELFIES_BUCKET).join(&key));
        assert_eq!(owner_of(&key), Some(owner));

        for bad in [
            format!("{owner}/../../etc/passwd"),
            format!("{owner}/.hidden"),
            format!("{owner}/a/b.jpg"),
            "not-a-uuid/face.jpg".to_string(),
            format!("{owner}/"),
        ] {
            assert!(
                matches!(storage.object_path(SELFIES_BUCKET, &bad), Err(AppError::NotFound)),
                "{bad} should be refused"
            );
        }
        assert!(matches!(
            storage.object_path("somewhere-else", &key),
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn put_then_remove_round_trip() {
        let root = std::env::temp_dir().join(format!("store-test-{}", Uuid::new_v4()));
        let storage = Storage::new(&root, "http://localhost/files");
        let owner = Uuid::new_v4();
        let upload = Upload {
            file_name: "report.pdf".into(),
            content_type: Some("application/pdf".into()),
            bytes: b"%PDF".to_vec(),
        };

        let stored = storage.put(REPORTS_BUCKET, owner, &upload).await.unwrap();
        let on_disk = root.join(&stored.bucket).join(&stored.key);
        assert!(stored.key.starts_with(&owner.to_string()));
        assert!(stored.key.ends_with("report.pdf"));
        assert_eq!(std::fs::read(&on_disk).unwrap(), b"%PDF");

        storage.remove(&stored).await;
        assert!(!on_disk.exists());
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn empty_upload_is_rejected() {
        let storage = Storage::new(std::env::temp_dir(), "http://localhost/files");
        let upload = Upload {
            file_name: "empty.png".into(),
            content_type: None,
            bytes: Vec::new(),
        };
        let err = storage
            .put(SELFIES_BUCKET, Uuid::new_v4(), &upload)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
